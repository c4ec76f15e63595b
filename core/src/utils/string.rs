//! String utility functions
//!
//! Naming conventions shared by the key factory and the ORM column mapping.

/// String utility functions
#[derive(Debug)]
pub struct StringUtils;

impl StringUtils {
    /// Truncate a string to a maximum count of characters with ellipsis
    pub fn truncate(s: &str, max_length: usize) -> String {
        match s.char_indices().nth(max_length) {
            Some((end, _)) => format!("{}...", &s[..end]),
            None => s.to_string(),
        }
    }

    /// Is the text a constant style name like `FIRST_NAME`
    pub fn is_constant_case(s: &str) -> bool {
        s.chars().any(|c| c.is_alphabetic())
            && s.chars()
                .all(|c| c.is_uppercase() || c.is_ascii_digit() || c == '_')
    }

    /// Convert a constant style name `FIRST_NAME` to `firstName`
    ///
    /// Other names are returned unchanged.
    pub fn constant_to_camel(s: &str) -> String {
        if !Self::is_constant_case(s) {
            return s.to_string();
        }

        let mut result = String::with_capacity(s.len());
        let mut capitalize_next = false;

        for c in s.chars() {
            if c == '_' {
                capitalize_next = !result.is_empty();
            } else if capitalize_next {
                result.push(c);
                capitalize_next = false;
            } else {
                result.extend(c.to_lowercase());
            }
        }

        result
    }

    /// Convert a camelCase string to snake_case, an upper case run is one word
    pub fn camel_to_snake(s: &str) -> String {
        let chars: Vec<char> = s.chars().collect();
        let mut result = String::with_capacity(s.len() + 4);

        for (i, c) in chars.iter().enumerate() {
            if c.is_uppercase() {
                let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
                let next_lower = chars.get(i + 1).map_or(false, |n| n.is_lowercase());
                let prev_upper = i > 0 && chars[i - 1].is_uppercase();
                if !result.is_empty() && !result.ends_with('_') && (prev_lower || (prev_upper && next_lower)) {
                    result.push('_');
                }
                result.extend(c.to_lowercase());
            } else {
                result.push(*c);
            }
        }

        result
    }

    /// Check if a string is a valid SQL or Rust identifier
    pub fn is_identifier(s: &str) -> bool {
        let mut chars = s.chars();

        // First character must be a letter or underscore
        match chars.next() {
            Some(c) if c.is_alphabetic() || c == '_' => {}
            _ => return false,
        }

        chars.all(|c| c.is_alphanumeric() || c == '_')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_truncate() {
        assert_eq!(StringUtils::truncate("Hello", 10), "Hello");
        assert_eq!(StringUtils::truncate("Hello, world!", 5), "Hello...");
        assert_eq!(StringUtils::truncate("", 5), "");
    }

    #[rstest]
    #[case("FIRST_NAME", "firstName")]
    #[case("ID", "id")]
    #[case("CASH_2", "cash2")]
    #[case("_PRIVATE", "private")]
    #[case("name", "name")]
    #[case("firstName", "firstName")]
    fn test_constant_to_camel(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(StringUtils::constant_to_camel(input), expected);
    }

    #[rstest]
    #[case("camelCase", "camel_case")]
    #[case("CamelCase", "camel_case")]
    #[case("simpleword", "simpleword")]
    #[case("ID", "id")]
    #[case("ABCWord", "abc_word")]
    #[case("firstName2", "first_name2")]
    fn test_camel_to_snake(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(StringUtils::camel_to_snake(input), expected);
    }

    #[test]
    fn test_is_identifier() {
        assert!(StringUtils::is_identifier("valid_identifier"));
        assert!(StringUtils::is_identifier("_valid"));
        assert!(StringUtils::is_identifier("valid123"));
        assert!(!StringUtils::is_identifier("123invalid"));
        assert!(!StringUtils::is_identifier("invalid-identifier"));
        assert!(!StringUtils::is_identifier(""));
    }
}
