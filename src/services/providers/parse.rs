use serde_json::{Map, Value};

use crate::models::{ContentKind, Suggestion};

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("response contains no JSON object")]
    NoJson,

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("missing required field \"{0}\"")]
    MissingField(&'static str),
}

/// Returns the JSON object embedded in `raw`, without fences or surrounding prose
pub fn strip_wrappers(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let body = extract_from_code_block(trimmed).unwrap_or(trimmed);

    let start = body.find('{')?;
    extract_balanced_object(body, start)
}

fn extract_from_code_block(s: &str) -> Option<&str> {
    let open = s.find("```")?;
    let after_fence = &s[open + 3..];
    // Skip an optional language tag such as "json"
    let content_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let content = &after_fence[content_start..];
    let close = content.find("```")?;
    Some(content[..close].trim())
}

fn extract_balanced_object(s: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, c) in s[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&s[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// First non-empty string among `keys`; arrays yield their first string element
fn string_field(object: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| match object.get(*key) {
            Some(Value::String(s)) => Some(s.trim().to_string()),
            Some(Value::Array(items)) => items
                .iter()
                .find_map(|v| v.as_str())
                .map(|s| s.trim().to_string()),
            _ => None,
        })
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// Builds the domain payload field by field
///
/// Each field takes the first non-empty string among its name and aliases, so
/// nulls, non-string values and repeated aliases leave it blank instead of
/// failing the whole response.
fn content_fields<T: ContentKind>(object: &Map<String, Value>) -> Result<T, ParseError> {
    let names = match serde_json::to_value(T::default())? {
        Value::Object(template) => template.into_iter().map(|(name, _)| name).collect(),
        _ => Vec::new(),
    };

    let mut fields = Map::new();
    for name in names {
        let mut keys = vec![name.as_str()];
        keys.extend(
            T::FIELD_ALIASES
                .iter()
                .filter(|(field, _)| *field == name)
                .map(|(_, alias)| *alias),
        );
        let value = string_field(object, &keys);
        fields.insert(name, Value::String(value));
    }

    Ok(serde_json::from_value(Value::Object(fields))?)
}

/// Parses a raw provider response into a Pending suggestion
///
/// Markdown fences and surrounding prose are stripped first. A reply without a
/// title or the domain's secondary field is an error.
pub fn parse_suggestion<T: ContentKind>(raw: &str) -> Result<Suggestion<T>, ParseError> {
    let json = strip_wrappers(raw).ok_or(ParseError::NoJson)?;
    let object: Map<String, Value> = serde_json::from_str(json)?;

    let title = string_field(&object, &["title", "name"]);
    if title.is_empty() {
        return Err(ParseError::MissingField("title"));
    }

    let genre = string_field(&object, &["primary_genre", "primaryGenre", "genre", "genres"]);
    let reasoning = string_field(&object, &["reasoning", "reason", "explanation"]);
    let content: T = content_fields(&object)?;

    if content.secondary().trim().is_empty() {
        return Err(ParseError::MissingField(T::SECONDARY_FIELD));
    }

    Ok(Suggestion::new(title, genre, reasoning, content))
}
