use std::str::FromStr;

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Parses a comma-separated list. Empty entries are skipped, and entries that fail to parse are returned in the
/// second element so that callers can report them.
pub fn parse_list<T: FromStr>(value: &str) -> (Vec<T>, Vec<String>) {
    let mut parsed = Vec::new();
    let mut rejected = Vec::new();
    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match item.parse::<T>() {
            Ok(v) => parsed.push(v),
            Err(_) => rejected.push(item.to_string()),
        }
    }
    (parsed, rejected)
}
