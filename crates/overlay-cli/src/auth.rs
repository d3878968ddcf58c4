//! Token check for simulated feed clients.
//!
//! Clients present the token as `Authorization: Bearer <token>` or as a
//! form-encoded `token` query parameter; the header wins when both are set.

use url::form_urlencoded;

/// Token a connecting client presented, if any.
pub fn presented_token(authorization: Option<&str>, query: Option<&str>) -> Option<String> {
    if let Some(token) = authorization.and_then(|value| value.strip_prefix("Bearer ")) {
        return Some(token.trim().to_string());
    }
    form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
}

/// Whether a client may connect. Any client is accepted when no token is
/// configured.
pub fn is_authorized(expected: Option<&str>, presented: Option<&str>) -> bool {
    match expected {
        Some(token) => presented == Some(token),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn bearer_header_takes_precedence() {
        assert_eq!(
            presented_token(Some("Bearer abc "), Some("token=other")),
            Some("abc".to_string())
        );
        assert_eq!(presented_token(Some("Basic abc"), None), None);
    }

    #[test]
    fn query_token_is_form_decoded() {
        let token = "a+b/c=d e&f";
        let mut url = Url::parse("ws://127.0.0.1:9000/").unwrap();
        url.query_pairs_mut().append_pair("token", token);

        assert_eq!(presented_token(None, url.query()), Some(token.to_string()));
        assert_eq!(presented_token(None, Some("room=x&token=abc")), Some("abc".to_string()));
        assert_eq!(presented_token(None, Some("room=x")), None);
        assert_eq!(presented_token(None, None), None);
    }

    #[test]
    fn authorization_against_configured_token() {
        assert!(is_authorized(None, None));
        assert!(is_authorized(Some("s3cret"), Some("s3cret")));
        assert!(!is_authorized(Some("s3cret"), Some("S3CRET")));
        assert!(!is_authorized(Some("s3cret"), None));
    }
}
