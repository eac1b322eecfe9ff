//! Query builder for `GET /api/search`.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::types::RegionCode;

pub const SEARCH_PATH: &str = "/api/search";
pub const PING_PATH: &str = "/api/ping";

/// Characters left unescaped in query values: ASCII alphanumerics and
/// `*-._`. Every other byte is percent-encoded, space included (`%20`, never
/// `+`).
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_');

/// What the user asked for: free text plus the marketplace to search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub region: RegionCode,
}

/// Canonical description of one search request.
///
/// Always a `GET` to [`SEARCH_PATH`] with exactly two parameters, `q` then
/// `ctry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    query: SearchQuery,
}

impl RequestDescriptor {
    #[must_use]
    pub fn method(&self) -> &'static str {
        "GET"
    }

    #[must_use]
    pub fn path(&self) -> &'static str {
        SEARCH_PATH
    }

    #[must_use]
    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    /// Query parameters in wire order, unencoded.
    #[must_use]
    pub fn params(&self) -> [(&'static str, &str); 2] {
        [
            ("q", self.query.text.as_str()),
            ("ctry", self.query.region.as_str()),
        ]
    }

    /// Path plus percent-encoded query string, e.g. `/api/search?q=usb%20c&ctry=CA`.
    #[must_use]
    pub fn path_and_query(&self) -> String {
        let query_string = self
            .params()
            .iter()
            .map(|(key, value)| format!("{key}={}", utf8_percent_encode(value, QUERY_VALUE)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{query_string}", self.path())
    }
}

impl std::fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method(), self.path_and_query())
    }
}

/// Builds the request for a search, or `None` when there is nothing to search.
///
/// Whitespace-only text yields `None`; callers must not issue a fetch in that
/// case. Non-empty text is sent as typed, without trimming.
#[must_use]
pub fn build_query(text: &str, region: &RegionCode) -> Option<RequestDescriptor> {
    if text.trim().is_empty() {
        return None;
    }

    Some(RequestDescriptor {
        query: SearchQuery {
            text: text.to_owned(),
            region: region.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ca() -> RegionCode {
        RegionCode::new("CA")
    }

    #[test]
    fn empty_text_builds_nothing() {
        assert!(build_query("", &ca()).is_none());
    }

    #[test]
    fn whitespace_text_builds_nothing() {
        assert!(build_query("   \t\n", &ca()).is_none());
    }

    #[test]
    fn builds_get_with_q_then_ctry() {
        let request = build_query("usb cable", &ca()).unwrap();
        assert_eq!(request.method(), "GET");
        assert_eq!(request.params(), [("q", "usb cable"), ("ctry", "CA")]);
        assert_eq!(request.path_and_query(), "/api/search?q=usb%20cable&ctry=CA");
    }

    #[test]
    fn text_is_not_trimmed() {
        let request = build_query("  lamp ", &ca()).unwrap();
        assert_eq!(request.query().text, "  lamp ");
        assert_eq!(request.path_and_query(), "/api/search?q=%20%20lamp%20&ctry=CA");
    }

    #[test]
    fn special_characters_are_percent_encoded() {
        let request = build_query("salt & pepper=50%", &RegionCode::new("US")).unwrap();
        assert_eq!(
            request.path_and_query(),
            "/api/search?q=salt%20%26%20pepper%3D50%25&ctry=US"
        );
    }

    #[test]
    fn only_unreserved_marks_pass_through() {
        let request = build_query("a*b-c.d_e~f+g h", &ca()).unwrap();
        assert_eq!(
            request.path_and_query(),
            "/api/search?q=a*b-c.d_e%7Ef%2Bg%20h&ctry=CA"
        );
    }

    #[test]
    fn unicode_is_utf8_percent_encoded() {
        let request = build_query("café", &ca()).unwrap();
        assert_eq!(request.path_and_query(), "/api/search?q=caf%C3%A9&ctry=CA");
    }

    #[test]
    fn unreserved_marks_pass_through() {
        let request = build_query("a-b_c.d*e", &ca()).unwrap();
        assert_eq!(request.path_and_query(), "/api/search?q=a-b_c.d*e&ctry=CA");
    }

    #[test]
    fn region_code_is_passed_through_opaquely() {
        let request = build_query("tea", &RegionCode::new("uk-test")).unwrap();
        assert_eq!(request.path_and_query(), "/api/search?q=tea&ctry=uk-test");
    }

    #[test]
    fn display_includes_method() {
        let request = build_query("tea", &ca()).unwrap();
        assert_eq!(request.to_string(), "GET /api/search?q=tea&ctry=CA");
    }
}
