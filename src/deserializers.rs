use serde::{Deserialize, Deserializer};

// clients send category ids both as `4` and `"4"`; the store keeps the text form
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Str(s) => Ok(s),
        Raw::Int(n) => Ok(n.to_string()),
    }
}

/// Lenient `?page=` parsing: anything missing or non-numeric is page 1.
/// Numbers never fall back: negatives become page 0 and values past `usize`
/// saturate, so both stay out of range.
pub fn lenient_page<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.as_deref().map_or(1, page_number))
}

fn page_number(raw: &str) -> usize {
    let raw = raw.trim();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return 1;
    }
    if negative {
        return 0;
    }
    digits.parse().unwrap_or(usize::MAX)
}
