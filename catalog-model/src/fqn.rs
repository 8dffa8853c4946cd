//! Fully qualified names.
//!
//! An FQN is the container's FQN and the entity name joined with `.`.
//! A name that itself contains `.` is wrapped in double quotes so that
//! its dots are not read as separators.

const SEPARATOR: char = '.';
const QUOTE: char = '"';

/// Quotes `name` if it contains the separator.
pub fn quote_name(name: &str) -> String {
    if name.contains(SEPARATOR) && !(name.starts_with(QUOTE) && name.ends_with(QUOTE)) {
        format!("{QUOTE}{name}{QUOTE}")
    } else {
        name.to_string()
    }
}

/// Builds the FQN of `name` under `parent` (or a top-level FQN).
pub fn build(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) if !parent.is_empty() => format!("{parent}{SEPARATOR}{}", quote_name(name)),
        _ => quote_name(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_name_is_its_own_fqn() {
        assert_eq!(build(None, "svc-a"), "svc-a");
        assert_eq!(build(Some(""), "svc-a"), "svc-a");
    }

    #[test]
    fn child_is_joined_with_dot() {
        assert_eq!(build(Some("airflow"), "svc-a"), "airflow.svc-a");
    }

    #[test]
    fn dotted_name_is_quoted() {
        assert_eq!(build(Some("airflow"), "v1.ingest"), "airflow.\"v1.ingest\"");
        assert_eq!(quote_name("\"v1.ingest\""), "\"v1.ingest\"");
    }
}
