use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};
use headers::{Cookie, HeaderMapExt};
use tracing::debug;

use super::{token::IssuedToken, types::AUTH_COOKIE_NAME};
use crate::shared::AppError;

/// Reads the session token out of the request's `Cookie` header
pub fn session_token(headers: &HeaderMap) -> Result<String, AppError> {
    if headers
        .get_all(COOKIE)
        .iter()
        .any(|value| value.to_str().is_err())
    {
        debug!("Cookie header contains non-visible characters");
        return Err(AppError::BadRequest("Unreadable cookie header".to_string()));
    }

    headers
        .typed_get::<Cookie>()
        .and_then(|cookie| cookie.get(AUTH_COOKIE_NAME).map(str::to_string))
        .ok_or(AppError::MissingCredential)
}

/// Builds the `Set-Cookie` value for a freshly issued token.
/// The cookie expires together with the token it carries.
pub fn session_cookie(issued: &IssuedToken) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{}={}; Expires={}; Path=/; HttpOnly",
        AUTH_COOKIE_NAME,
        issued.token,
        issued.expires_at.format("%a, %d %b %Y %H:%M:%S GMT")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn headers_with(values: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for value in values {
            headers.append(COOKIE, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[rstest]
    #[case(&["AuthToken=abc.def.ghi"], "abc.def.ghi")]
    #[case(&["theme=dark; AuthToken=abc.def.ghi; lang=en"], "abc.def.ghi")]
    #[case(&["theme=dark", "AuthToken=abc.def.ghi"], "abc.def.ghi")]
    #[case(&["AuthToken="], "")]
    fn test_session_token_found(#[case] values: &[&str], #[case] expected: &str) {
        let token = session_token(&headers_with(values)).unwrap();
        assert_eq!(token, expected);
    }

    #[rstest]
    #[case(&[])]
    #[case(&["theme=dark"])]
    #[case(&["authtoken=abc"])]
    fn test_session_token_missing(#[case] values: &[&str]) {
        let result = session_token(&headers_with(values));
        assert!(matches!(result, Err(AppError::MissingCredential)));
    }

    #[test]
    fn test_unreadable_cookie_header_is_bad_request() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_bytes(b"AuthToken=\xff\xfe").unwrap(),
        );
        let result = session_token(&headers);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let issued = IssuedToken {
            token: "abc.def.ghi".to_string(),
            expires_at: Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap(),
        };

        let value = session_cookie(&issued).unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            "AuthToken=abc.def.ghi; Expires=Tue, 02 Jan 2024 12:00:00 GMT; Path=/; HttpOnly"
        );
    }
}
