//! Session cookie handling.
//!
//! The guard only needs a stable key per browser session; this is the
//! smallest cookie mechanism that provides one.

use axum::http::{HeaderMap, header::COOKIE};
use guard_types::SessionId;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "sid";

/// Reads the session id from the request's `Cookie` headers.
pub fn session_id(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| SessionId::parse(value.trim()))
}

/// `Set-Cookie` value binding the browser to `session`.
pub fn session_cookie(session: &SessionId) -> String {
    format!("{SESSION_COOKIE}={session}; Path=/; HttpOnly; SameSite=Strict")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(cookies: &[&'static str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for cookie in cookies {
            headers.append(COOKIE, HeaderValue::from_static(cookie));
        }
        headers
    }

    const SID: &str = "6f1c0a52-3d4e-4b7a-9c1e-2f8d5a6b7c90";
    const OTHER_SID: &str = "0b9e8d7c-6a5f-4e3d-8c2b-1a0f9e8d7c6b";

    #[test]
    fn test_session_id_from_single_cookie() {
        assert_eq!(
            session_id(&headers(&["sid=6f1c0a52-3d4e-4b7a-9c1e-2f8d5a6b7c90"])),
            Some(SessionId::from(SID))
        );
    }

    #[test]
    fn test_session_id_among_other_cookies() {
        assert_eq!(
            session_id(&headers(&[
                "theme=dark; sid=6f1c0a52-3d4e-4b7a-9c1e-2f8d5a6b7c90; lang=en"
            ])),
            Some(SessionId::from(SID))
        );
        assert_eq!(
            session_id(&headers(&[
                "theme=dark",
                "sid=0b9e8d7c-6a5f-4e3d-8c2b-1a0f9e8d7c6b"
            ])),
            Some(SessionId::from(OTHER_SID))
        );
    }

    #[test]
    fn test_session_id_missing_or_empty() {
        assert_eq!(session_id(&HeaderMap::new()), None);
        assert_eq!(session_id(&headers(&["sid="])), None);
        assert_eq!(
            session_id(&headers(&["sidx=6f1c0a52-3d4e-4b7a-9c1e-2f8d5a6b7c90"])),
            None
        );
    }

    #[test]
    fn test_session_id_must_be_uuid() {
        assert_eq!(session_id(&headers(&["sid=abc"])), None);
        assert_eq!(session_id(&headers(&["sid=attacker-chosen-value"])), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie(&SessionId::from("abc"));
        assert!(cookie.starts_with("sid=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
    }
}
