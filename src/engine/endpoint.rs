use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const DEFAULT_DOWNLOAD_PATH: &str = "/stream-bytes/";
const DEFAULT_UPLOAD_PATH: &str = "/post";
const DEFAULT_PING_PATH: &str = "/get";

/// A test server: base address plus the three resources a session touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub base_url: String,
    /// Prefix of the sized GET resource; the byte count is appended.
    pub download_path: String,
    /// POST sink for upload bodies.
    pub upload_path: String,
    /// Small GET resource used for round-trip probes.
    pub ping_path: String,
}

impl Endpoint {
    pub fn new(
        base_url: impl Into<String>,
        download_path: impl Into<String>,
        upload_path: impl Into<String>,
        ping_path: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            download_path: download_path.into(),
            upload_path: upload_path.into(),
            ping_path: ping_path.into(),
        }
    }

    /// Built-in server list; the first entry is the fallback.
    pub fn defaults() -> Vec<Endpoint> {
        vec![
            Endpoint::new(
                "https://httpbin.org",
                DEFAULT_DOWNLOAD_PATH,
                DEFAULT_UPLOAD_PATH,
                DEFAULT_PING_PATH,
            ),
            Endpoint::new("https://www.google.com", "/", "/", "/"),
            Endpoint::new("https://www.cloudflare.com", "/", "/", "/"),
        ]
    }

    pub fn ping_url(&self) -> String {
        format!(
            "{}{}?cacheBust={}",
            self.base_url,
            self.ping_path,
            cache_bust()
        )
    }

    pub fn download_url(&self, bytes: u64, conn: u32) -> String {
        format!(
            "{}{}{}?conn={}&cacheBust={}",
            self.base_url,
            self.download_path,
            bytes,
            conn,
            cache_bust()
        )
    }

    pub fn upload_url(&self, conn: u32) -> String {
        format!(
            "{}{}?conn={}&cacheBust={}",
            self.base_url,
            self.upload_path,
            conn,
            cache_bust()
        )
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url)
    }
}

/// Accepts `URL` (httpbin-style paths) or `URL,download,upload,ping`.
impl FromStr for Endpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let base = parts[0];
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(format!("'{base}' is not an http(s) URL"));
        }
        match parts.as_slice() {
            [base] => Ok(Endpoint::new(
                *base,
                DEFAULT_DOWNLOAD_PATH,
                DEFAULT_UPLOAD_PATH,
                DEFAULT_PING_PATH,
            )),
            [base, download, upload, ping] => Ok(Endpoint::new(*base, *download, *upload, *ping)),
            _ => Err("Expected URL or URL,download-path,upload-path,ping-path".to_string()),
        }
    }
}

/// Per-request token that defeats intermediary caches.
fn cache_bust() -> String {
    format!("{:016x}", rand::random::<u64>())
}
