//! The user-facing verdict produced by a policy gate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Selects how a result's extended payload is rendered later.
///
/// The pipeline only attaches the tag; rendering belongs to the report layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatterTag {
    /// No extended rendering
    #[default]
    Null,
    /// Visual progress filmstrip
    Speedline,
    /// Critical request chain tree
    CriticalRequestChains,
    /// User timing marks and measures
    UserTimings,
    /// Generic table
    Table,
    /// List of URLs
    UrlList,
    /// Screenshot thumbnails
    Thumbnails,
}

impl fmt::Display for FormatterTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormatterTag::Null => "null",
            FormatterTag::Speedline => "speedline",
            FormatterTag::CriticalRequestChains => "critical-request-chains",
            FormatterTag::UserTimings => "user-timings",
            FormatterTag::Table => "table",
            FormatterTag::UrlList => "url-list",
            FormatterTag::Thumbnails => "thumbnails",
        };
        f.write_str(name)
    }
}

/// A tagged payload: the formatter to use plus the domain data behind a
/// verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtendedInfo {
    /// How the value should be rendered
    pub formatter: FormatterTag,
    /// The metric the verdict was based on, keyed by name
    pub value: serde_json::Map<String, serde_json::Value>,
}

impl ExtendedInfo {
    /// Returns a numeric entry of `value`.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.value.get(key).and_then(serde_json::Value::as_f64)
    }
}

/// The outcome of evaluating one policy gate.
///
/// `raw_value` is the verdict. `debug_string` is present when the gate
/// explains a failure; consumers must not expect it on success.
///
/// # Examples
///
/// ```
/// use audit_pipeline::{AuditResult, ExtendedInfo, FormatterTag};
///
/// let result = AuditResult {
///     name: "load-fast-enough-for-pwa".into(),
///     category: "PWA".into(),
///     description: "Page load is fast enough on 3G".into(),
///     help_text: String::new(),
///     raw_value: true,
///     score: true,
///     display_value: "5,000 ms".into(),
///     debug_string: None,
///     extended_info: ExtendedInfo {
///         formatter: FormatterTag::Null,
///         value: serde_json::Map::new(),
///     },
/// };
///
/// let json = result.to_json().unwrap();
/// assert!(json.contains("\"rawValue\":true"));
/// assert!(!json.contains("debugString"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResult {
    /// Gate name, e.g. `load-fast-enough-for-pwa`
    pub name: String,
    /// Report category the gate belongs to
    pub category: String,
    /// Short description of what passing means
    pub description: String,
    /// Longer guidance shown alongside the verdict
    pub help_text: String,
    /// The verdict
    pub raw_value: bool,
    /// Score derived from the verdict
    pub score: bool,
    /// The observed metric formatted for display
    pub display_value: String,
    /// Why the gate failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_string: Option<String>,
    /// Tagged payload carrying the metric
    pub extended_info: ExtendedInfo,
}

impl AuditResult {
    /// Returns true if the gate passed.
    pub fn passed(&self) -> bool {
        self.raw_value
    }

    /// Serializes the result as compact JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Formats milliseconds with thousands separators, e.g. `15,000 ms`.
///
/// Values are rounded to the nearest 10 ms the way performance reports
/// usually display them.
pub(crate) fn format_ms(ms: f64) -> String {
    let rounded = (ms / 10.0).round() * 10.0;
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{} ms", grouped)
    } else {
        format!("{} ms", grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_ms_groups_thousands() {
        assert_eq!(format_ms(15000.0), "15,000 ms");
        assert_eq!(format_ms(5000.0), "5,000 ms");
        assert_eq!(format_ms(999.0), "1,000 ms");
        assert_eq!(format_ms(120.0), "120 ms");
        assert_eq!(format_ms(1234567.0), "1,234,570 ms");
        assert_eq!(format_ms(0.0), "0 ms");
    }

    #[test]
    fn formatter_tag_serializes_kebab_case() {
        let json = serde_json::to_string(&FormatterTag::CriticalRequestChains).unwrap();
        assert_eq!(json, "\"critical-request-chains\"");
        assert_eq!(FormatterTag::Null.to_string(), "null");
        assert_eq!(FormatterTag::default(), FormatterTag::Null);
    }

    #[test]
    fn extended_info_number_reads_floats() {
        let mut value = serde_json::Map::new();
        value.insert("timeToInteractive".into(), serde_json::json!(15000.0));
        let info = ExtendedInfo {
            formatter: FormatterTag::Null,
            value,
        };
        assert_eq!(info.number("timeToInteractive"), Some(15000.0));
        assert_eq!(info.number("missing"), None);
    }
}
