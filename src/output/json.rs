use anyhow::Result;

use crate::engine::types::SessionReport;

pub fn print_json(report: &SessionReport) -> Result<()> {
    println!("{}", serde_json::to_string(report)?);
    Ok(())
}

pub fn print_json_pretty(report: &SessionReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::engine::test_support::report;
    use serde_json::Value;

    #[test]
    fn test_report_shape() {
        let value = serde_json::to_value(report()).unwrap();
        assert_eq!(value["results"]["download"], 62.5);
        assert_eq!(value["results"]["jitter"], 4.0);
        assert_eq!(value["quality"]["overall"], "Very Good");
        assert_eq!(value["quality"]["ping"]["label"], "Good");
        assert_eq!(value["endpoint"]["base_url"], "http://127.0.0.1:8080");
        assert_eq!(value["download"]["trials"].as_array().map(Vec::len), Some(2));
        assert!(matches!(value["timestamp"], Value::String(_)));
    }
}
