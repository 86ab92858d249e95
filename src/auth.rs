//! Caller identity.
//!
//! The API Gateway in front of this function authenticates the user and
//! forwards the result in plain headers. Nothing here verifies them: the
//! function must only be reachable through that gateway.

use lambda_http::http::HeaderMap;
use lambda_http::Request;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "App-User-Id";
pub const USER_NAME_HEADER: &str = "App-User-Name";

/// Normalized caller identity returned by `caller_id()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    /// Display name, denormalized onto every note the caller writes.
    pub user_name: Option<String>,
    /// Bearer token from `Authorization`. Carried along, never checked here.
    pub id_token: Option<String>,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub fn caller_id(req: &Request) -> Option<Caller> {
    let headers = req.headers();
    let user_id = header_str(headers, USER_ID_HEADER)?.to_string();
    let user_name = header_str(headers, USER_NAME_HEADER).map(str::to_string);
    let id_token = header_str(headers, "authorization").map(|v| {
        v.strip_prefix("Bearer ")
            .unwrap_or(v)
            .trim()
            .to_string()
    });
    Some(Caller {
        user_id,
        user_name,
        id_token,
    })
}

/// Like `caller_id()`, for the handlers that cannot run without one.
pub fn require_auth(req: &Request) -> Result<Caller, ApiError> {
    caller_id(req).ok_or(ApiError::Unauthorized(USER_ID_HEADER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_http::Body;

    fn request(headers: &[(&str, &str)]) -> Request {
        let mut builder = lambda_http::http::Request::builder().uri("/notes");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(Body::Empty).unwrap()
    }

    #[test]
    fn reads_identity_headers() {
        let req = request(&[
            ("App-User-Id", "u1"),
            ("App-User-Name", "Una"),
            ("Authorization", "Bearer abc.def"),
        ]);
        let caller = caller_id(&req).unwrap();
        assert_eq!(caller.user_id, "u1");
        assert_eq!(caller.user_name.as_deref(), Some("Una"));
        assert_eq!(caller.id_token.as_deref(), Some("abc.def"));
    }

    #[test]
    fn header_names_are_case_insensitive() {
        let req = request(&[("app-user-id", "u2")]);
        let caller = caller_id(&req).unwrap();
        assert_eq!(caller.user_id, "u2");
        assert_eq!(caller.user_name, None);
        assert_eq!(caller.id_token, None);
    }

    #[test]
    fn missing_or_blank_user_is_rejected() {
        assert!(matches!(
            require_auth(&request(&[])),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(require_auth(&request(&[("App-User-Id", "  ")])).is_err());
    }
}
