//! Output formatting for CLI

use serde::Serialize;

/// Output format options
pub enum OutputFormat {
    Text,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

/// Whether the selected format is JSON
pub fn is_json(format: &str) -> bool {
    matches!(OutputFormat::from(format), OutputFormat::Json)
}

/// Pretty JSON for machine-readable output
pub fn to_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

/// Current wall-clock time for progress lines
pub fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert!(is_json("json"));
        assert!(is_json("JSON"));
        assert!(!is_json("text"));
        assert!(!is_json("table"));
    }

    #[test]
    fn test_to_json() {
        let value = serde_json::json!({"written": 2});
        assert_eq!(to_json(&value), "{\n  \"written\": 2\n}");
    }
}
