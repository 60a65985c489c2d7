use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::Error;

/// The input contract of a tool.
///
/// Models are unreliable producers of structured text, so implementations
/// should accept the common deviations (stray quotes, surrounding prose)
/// and only reject input they can't make sense of. The error returned
/// will be shown to the model, so make the reason actionable.
pub trait ToolInput: Sized + Send + 'static {
    /// Parses the raw action input text.
    fn parse(raw: &str) -> Result<Self, Error>;
}

/// Plain text input.
///
/// Surrounding whitespace and one pair of wrapping quotes are removed. If
/// the model sent a JSON object with a single string field instead (like
/// `{"company_name": "Tesla"}`), the field value is taken.
impl ToolInput for String {
    fn parse(raw: &str) -> Result<Self, Error> {
        let text = raw.trim();
        if text.starts_with('{') {
            if let Ok(Value::Object(map)) = serde_json::from_str(text) {
                if let (1, Some(Value::String(value))) =
                    (map.len(), map.values().next())
                {
                    return Ok(value.trim().to_owned());
                }
            }
        }
        Ok(strip_wrapping_quotes(text).to_owned())
    }
}

/// JSON input deserialized into `T`, parsed leniently.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T: DeserializeOwned + Send + 'static> ToolInput for Json<T> {
    fn parse(raw: &str) -> Result<Self, Error> {
        let value = parse_lenient_json(raw).ok_or_else(|| {
            Error::invalid_input().with_reason(
                r#"expected a JSON object, e.g. {"key": "value"}"#,
            )
        })?;
        serde_json::from_value(value)
            .map(Json)
            .map_err(|err| Error::invalid_input().with_reason(err.to_string()))
    }
}

/// Parses JSON the way a model tends to write it.
///
/// In order: the text as-is, the first balanced object embedded in the
/// text, that object with single quotes turned into double quotes, and
/// finally a scan for `key: value` pairs which yields a map of strings.
pub fn parse_lenient_json(raw: &str) -> Option<Value> {
    let raw = raw.trim();
    if let Ok(value) = serde_json::from_str(raw) {
        return Some(value);
    }

    if let Some(object) = first_balanced_object(raw) {
        if let Ok(value) = serde_json::from_str(object) {
            return Some(value);
        }
        if let Ok(value) = serde_json::from_str(&object.replace('\'', "\"")) {
            return Some(value);
        }
    }

    scan_key_value_pairs(raw)
}

fn strip_wrapping_quotes(text: &str) -> &str {
    for quote in ['"', '\'', '`'] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.trim();
        }
    }
    text
}

fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                in_string = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => in_string = Some(ch),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

static KEY_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?(\w+)["']?\s*:\s*["']?([^,}\n]+)"#)
        .expect("key/value pattern is valid")
});

fn scan_key_value_pairs(text: &str) -> Option<Value> {
    let mut map = Map::new();
    for caps in KEY_VALUE_RE.captures_iter(text) {
        let value = caps[2].trim().trim_matches(['"', '\'']).trim();
        map.insert(caps[1].to_owned(), Value::String(value.to_owned()));
    }
    if map.is_empty() {
        return None;
    }
    Some(Value::Object(map))
}
