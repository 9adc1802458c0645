//! Per-endpoint JSON body schemas.
//!
//! Bodies must be one JSON object of at most [`MAX_BODY_BYTES`] with no
//! unknown fields. Field rules are checked by direct access after decoding.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::protocol::response::{ApiError, ServiceCode, SubCode};
use crate::security::token::GRANT_TYPE;

pub const MAX_BODY_BYTES: usize = 1024 * 1024;
pub const TITLE_MAX_CHARS: usize = 256;
pub const DETAIL_MAX_CHARS: usize = 1024;

fn decode<'a, T: Deserialize<'a>>(body: &'a [u8], service: ServiceCode) -> Result<T, ApiError> {
    let is_object = body.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{');
    if body.len() > MAX_BODY_BYTES || !is_object {
        return Err(ApiError::bad_request(service));
    }
    serde_json::from_slice(body).map_err(|_| ApiError::bad_request(service))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenRequest {
    #[serde(rename = "grantType")]
    pub grant_type: Option<String>,
}

impl TokenRequest {
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        let service = ServiceCode::AccessToken;
        let request: TokenRequest = decode(body, service)?;
        match request.grant_type.as_deref() {
            None | Some("") => Err(ApiError::missing_field(service, "grantType")),
            Some(GRANT_TYPE) => Ok(request),
            Some(_) => Err(ApiError::new(
                StatusCode::BAD_REQUEST,
                service,
                SubCode::General,
                "Unsupported grantType",
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddTodoRequest {
    pub title: Option<String>,
    pub detail_todo: Option<String>,
}

/// A todo body that passed every field rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub detail: String,
}

impl AddTodoRequest {
    pub fn parse(body: &[u8]) -> Result<NewTodo, ApiError> {
        let service = ServiceCode::Todo;
        let request: AddTodoRequest = decode(body, service)?;

        let title = match request.title {
            Some(title) if !title.is_empty() => title,
            _ => return Err(ApiError::missing_field(service, "title")),
        };
        if title.chars().count() > TITLE_MAX_CHARS {
            return Err(length_error(service));
        }

        let detail = request.detail_todo.unwrap_or_default();
        if detail.chars().count() > DETAIL_MAX_CHARS {
            return Err(length_error(service));
        }

        Ok(NewTodo { title, detail })
    }
}

fn length_error(service: ServiceCode) -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        service,
        SubCode::InvalidFieldFormat,
        "Invalid Field Format. Length of field value",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_request_accepts_client_credentials() {
        let req = TokenRequest::parse(br#"{"grantType":"client_credentials"}"#).unwrap();
        assert_eq!(req.grant_type.as_deref(), Some(GRANT_TYPE));
    }

    #[test]
    fn token_request_failures() {
        let cases: [(&[u8], &str); 7] = [
            (br#"{"grantType":"password"}"#, "4007300"),
            (br#"{"grantType":""}"#, "4007302"),
            (br#"{}"#, "4007302"),
            (br#"{"grantType":"client_credentials","extra":1}"#, "4007300"),
            (br#"{"grantType":5}"#, "4007300"),
            (br#"[]"#, "4007300"),
            (b"", "4007300"),
        ];
        for (body, code) in cases {
            let err = TokenRequest::parse(body).unwrap_err();
            assert_eq!(err.response_code(), code, "body {:?}", String::from_utf8_lossy(body));
        }
    }

    #[test]
    fn token_request_rejects_trailing_documents() {
        let body = br#"{"grantType":"client_credentials"}{"grantType":"client_credentials"}"#;
        assert!(TokenRequest::parse(body).is_err());
    }

    #[test]
    fn oversized_body_is_bad_request() {
        let mut body = br#"{"title":""#.to_vec();
        body.extend(vec![b'a'; MAX_BODY_BYTES]);
        body.extend_from_slice(br#""}"#);
        let err = AddTodoRequest::parse(&body).unwrap_err();
        assert_eq!(err.response_code(), "4002400");
    }

    #[test]
    fn add_todo_without_detail() {
        let todo = AddTodoRequest::parse(br#"{"title":"Todos Without Detail"}"#).unwrap();
        assert_eq!(todo.title, "Todos Without Detail");
        assert_eq!(todo.detail, "");
    }

    #[test]
    fn add_todo_field_rules() {
        let long_title = format!(r#"{{"title":"{}"}}"#, "t".repeat(TITLE_MAX_CHARS + 1));
        let long_detail = format!(
            r#"{{"title":"ok","detail_todo":"{}"}}"#,
            "d".repeat(DETAIL_MAX_CHARS + 1)
        );
        let code = |body: &[u8]| AddTodoRequest::parse(body).unwrap_err().response_code();
        assert_eq!(code(long_title.as_bytes()), "4002401");
        assert_eq!(code(long_detail.as_bytes()), "4002401");
        assert_eq!(code(br#"{"title":""}"#), "4002402");
        assert_eq!(code(br#"{"detail_todo":"x"}"#), "4002402");
        assert_eq!(code(br#"{"title":"x","done":true}"#), "4002400");
        assert_eq!(code(br#"[{"title":"x"}]"#), "4002400");
    }

    #[test]
    fn title_length_counts_characters() {
        let title = "é".repeat(TITLE_MAX_CHARS);
        let body = format!(r#"{{"title":"{title}"}}"#);
        assert!(AddTodoRequest::parse(body.as_bytes()).is_ok());
    }
}
