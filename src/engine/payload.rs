use bytes::Bytes;

/// Fill granularity for upload payloads.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Build an upload body of `size` bytes.
///
/// Each 64 KiB chunk holds a single random byte value; the server only cares
/// about the length, and chunked fill keeps generation cheap next to the
/// transfer itself.
pub fn generate_payload(size: usize) -> Bytes {
    let mut buf = vec![0u8; size];
    for chunk in buf.chunks_mut(CHUNK_SIZE) {
        chunk.fill(rand::random::<u8>());
    }
    Bytes::from(buf)
}
