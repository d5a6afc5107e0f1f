//! CSRF token discovery
//!
//! The server issues its token in the `csrftoken` cookie; pages rendered by
//! the server also embed it in a hidden `csrfmiddlewaretoken` form field,
//! which is used when the cookie is not readable.

use regex::Regex;
use std::sync::OnceLock;

/// Name of the cookie carrying the CSRF token
pub const CSRF_COOKIE: &str = "csrftoken";

/// Header every state-changing request must carry
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Name of the hidden form field carrying the CSRF token
pub const CSRF_FORM_FIELD: &str = "csrfmiddlewaretoken";

/// Find the CSRF token in a `Cookie` header value ("a=1; csrftoken=abc")
pub fn token_from_cookie_header(cookies: &str) -> Option<String> {
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == CSRF_COOKIE)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Extract the token from a hidden `csrfmiddlewaretoken` input in an HTML page
pub fn extract_form_token(html: &str) -> Option<String> {
    static INPUT_REGEX: OnceLock<Regex> = OnceLock::new();
    static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    static VALUE_REGEX: OnceLock<Regex> = OnceLock::new();

    let input = INPUT_REGEX
        .get_or_init(|| Regex::new(r"(?is)<input\b[^>]*>").expect("Failed to compile input regex"));
    let name = NAME_REGEX.get_or_init(|| {
        Regex::new(r#"(?i)\bname\s*=\s*["']csrfmiddlewaretoken["']"#)
            .expect("Failed to compile name regex")
    });
    let value = VALUE_REGEX.get_or_init(|| {
        Regex::new(r#"(?i)\bvalue\s*=\s*["']([^"']*)["']"#).expect("Failed to compile value regex")
    });

    input
        .find_iter(html)
        .map(|m| m.as_str())
        .filter(|tag| name.is_match(tag))
        .find_map(|tag| value.captures(tag).map(|c| c[1].to_string()))
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_from_cookie_header() {
        assert_eq!(
            token_from_cookie_header("sessionid=s1; csrftoken=abc123; theme=dark"),
            Some("abc123".to_string())
        );
        assert_eq!(token_from_cookie_header("csrftoken=xyz"), Some("xyz".to_string()));
    }

    #[test]
    fn test_token_from_cookie_header_missing() {
        assert_eq!(token_from_cookie_header("sessionid=s1"), None);
        assert_eq!(token_from_cookie_header(""), None);
        assert_eq!(token_from_cookie_header("csrftoken="), None);
        // Prefix match must not count
        assert_eq!(token_from_cookie_header("xcsrftoken=nope"), None);
    }

    #[test]
    fn test_extract_form_token() {
        let html = r#"
            <form method="post">
              <input type="text" name="label" value="AP Specialist">
              <input type="hidden" name="csrfmiddlewaretoken" value="f0rmT0ken">
            </form>
        "#;
        assert_eq!(extract_form_token(html), Some("f0rmT0ken".to_string()));
    }

    #[test]
    fn test_extract_form_token_attribute_order() {
        let html = r#"<INPUT value='tok2' type='hidden' name='csrfmiddlewaretoken'/>"#;
        assert_eq!(extract_form_token(html), Some("tok2".to_string()));
    }

    #[test]
    fn test_extract_form_token_absent() {
        assert_eq!(extract_form_token("<input name=\"label\" value=\"x\">"), None);
        assert_eq!(extract_form_token("<p>no form</p>"), None);
    }
}
