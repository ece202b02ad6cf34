//! Output formatting shared by the reporting commands

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output format for command reports
///
/// `Plain` keeps the one-line-per-step operator output; the JSON variants
/// serialize the command's report object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// One line per step (default)
    #[default]
    Plain,
    /// Pretty table with borders
    Table,
    /// Markdown table format
    Markdown,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON with indentation
    JsonPretty,
}

impl OutputFormat {
    /// Check if this is a JSON variant
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json | Self::JsonPretty)
    }

    /// Get a list of all format names for help text
    pub fn all_names() -> &'static [&'static str] {
        &["plain", "table", "markdown", "json", "json-pretty"]
    }

    /// Serialize `value` according to a JSON variant
    pub fn to_json<T: Serialize>(&self, value: &T) -> serde_json::Result<String> {
        match self {
            Self::JsonPretty => serde_json::to_string_pretty(value),
            _ => serde_json::to_string(value),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Table => write!(f, "table"),
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
            Self::JsonPretty => write!(f, "json-pretty"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" | "text" => Ok(Self::Plain),
            "table" | "pretty" => Ok(Self::Table),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "json-pretty" | "jsonpretty" => Ok(Self::JsonPretty),
            _ => Err(format!(
                "Unknown output format '{}'. Valid formats: {}",
                s,
                Self::all_names().join(", ")
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!(
            "JSON-PRETTY".parse::<OutputFormat>().unwrap(),
            OutputFormat::JsonPretty
        );
        assert!("csv".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_display_round_trips_names() {
        for name in OutputFormat::all_names() {
            let format: OutputFormat = name.parse().unwrap();
            assert_eq!(format.to_string(), *name);
        }
    }

    #[test]
    fn test_to_json() {
        let value = serde_json::json!({"a": 1});
        assert_eq!(OutputFormat::Json.to_json(&value).unwrap(), r#"{"a":1}"#);
        assert!(OutputFormat::JsonPretty
            .to_json(&value)
            .unwrap()
            .contains('\n'));
    }
}
