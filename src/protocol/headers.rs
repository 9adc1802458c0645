//! Per-endpoint header schemas.
//!
//! Each endpoint declares its fields in order; the first violation wins.

use axum::http::HeaderMap;
use chrono::{DateTime, FixedOffset};

use crate::protocol::response::{ApiError, ServiceCode};

pub const CONTENT_TYPE_JSON: &str = "application/json";
/// `YYYY-MM-DDTHH:MM:SS±HH:MM`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";
pub const MAX_CLIENT_KEY_LEN: usize = 64;
const BEARER_PREFIX: &str = "Bearer ";

/// One header an endpoint requires.
#[derive(Debug, Clone, Copy)]
pub struct HeaderField {
    pub name: &'static str,
    /// Name used in error messages.
    pub label: &'static str,
    pub max_len: Option<usize>,
}

const CONTENT_TYPE: HeaderField = HeaderField {
    name: "content-type",
    label: "Content-Type",
    max_len: None,
};
const AUTHORIZATION: HeaderField = HeaderField {
    name: "authorization",
    label: "Authorization",
    max_len: None,
};
const CLIENT_KEY: HeaderField = HeaderField {
    name: "x-client-key",
    label: "X-CLIENT-KEY",
    max_len: Some(MAX_CLIENT_KEY_LEN),
};
const TIMESTAMP: HeaderField = HeaderField {
    name: "x-timestamp",
    label: "X-TIMESTAMP",
    max_len: None,
};
const SIGNATURE: HeaderField = HeaderField {
    name: "x-signature",
    label: "X-SIGNATURE",
    max_len: None,
};

pub const TOKEN_REQUEST_FIELDS: [HeaderField; 4] =
    [CONTENT_TYPE, CLIENT_KEY, TIMESTAMP, SIGNATURE];
pub const PROTECTED_CALL_FIELDS: [HeaderField; 5] =
    [CONTENT_TYPE, AUTHORIZATION, CLIENT_KEY, TIMESTAMP, SIGNATURE];

/// Pull every field of `schema` out of `headers`, in schema order.
///
/// An absent or empty header is missing. A value that is not visible ASCII
/// is present but badly formatted.
pub fn read_fields<const N: usize>(
    headers: &HeaderMap,
    schema: &[HeaderField; N],
    service: ServiceCode,
) -> Result<[String; N], ApiError> {
    let mut values: [String; N] = std::array::from_fn(|_| String::new());
    for (slot, field) in values.iter_mut().zip(schema) {
        let raw = headers
            .get(field.name)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::missing_field(service, field.label))?;
        let value = raw
            .to_str()
            .map_err(|_| ApiError::invalid_field(service, field.label))?;
        if let Some(max) = field.max_len {
            if value.chars().count() > max {
                return Err(ApiError::invalid_field(service, field.label));
            }
        }
        *slot = value.to_string();
    }
    Ok(values)
}

fn check_content_type(value: &str, service: ServiceCode) -> Result<(), ApiError> {
    if value == CONTENT_TYPE_JSON {
        Ok(())
    } else {
        Err(ApiError::invalid_field(service, CONTENT_TYPE.label))
    }
}

/// Byte layout of [`TIMESTAMP_FORMAT`]; `d` is a digit, `+` either sign.
const TIMESTAMP_SHAPE: &[u8; 25] = b"dddd-dd-ddTdd:dd:dd+dd:dd";

// chrono pads loosely and takes leap seconds; the wire format allows neither.
fn has_timestamp_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == TIMESTAMP_SHAPE.len()
        && bytes.iter().zip(TIMESTAMP_SHAPE).all(|(&b, &want)| match want {
            b'd' => b.is_ascii_digit(),
            b'+' => b == b'+' || b == b'-',
            _ => b == want,
        })
        && &bytes[17..19] < b"60".as_slice()
}

/// Validate the format of an `X-Timestamp` value. The parsed value is only
/// used for display; it never feeds server time.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    if !has_timestamp_shape(value) {
        return None;
    }
    DateTime::parse_from_str(value, TIMESTAMP_FORMAT).ok()
}

fn check_timestamp(value: &str, service: ServiceCode) -> Result<DateTime<FixedOffset>, ApiError> {
    parse_timestamp(value).ok_or_else(|| ApiError::invalid_field(service, TIMESTAMP.label))
}

/// Strip the `Bearer ` prefix; the remainder must not be blank.
pub fn bearer_token(authorization: &str) -> Option<&str> {
    authorization
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Headers of `POST /v1.0/access-token`.
#[derive(Debug, Clone)]
pub struct TokenRequestHeaders {
    pub client_key: String,
    pub timestamp: String,
    pub signature: String,
}

impl TokenRequestHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let service = ServiceCode::AccessToken;
        let [content_type, client_key, timestamp, signature] =
            read_fields(headers, &TOKEN_REQUEST_FIELDS, service)?;
        check_content_type(&content_type, service)?;
        check_timestamp(&timestamp, service)?;
        Ok(Self {
            client_key,
            timestamp,
            signature,
        })
    }
}

/// Headers every protected call must carry.
#[derive(Debug, Clone)]
pub struct ProtectedCallHeaders {
    /// Bearer token without its `Bearer ` prefix.
    pub token: String,
    pub client_key: String,
    pub timestamp: String,
    pub signed_at: DateTime<FixedOffset>,
    pub signature: String,
}

impl ProtectedCallHeaders {
    pub fn from_headers(headers: &HeaderMap, service: ServiceCode) -> Result<Self, ApiError> {
        let [content_type, authorization, client_key, timestamp, signature] =
            read_fields(headers, &PROTECTED_CALL_FIELDS, service)?;
        check_content_type(&content_type, service)?;
        let signed_at = check_timestamp(&timestamp, service)?;
        let token = bearer_token(&authorization)
            .ok_or_else(|| ApiError::invalid_field(service, AUTHORIZATION.label))?
            .to_string();
        Ok(Self {
            token,
            client_key,
            timestamp,
            signed_at,
            signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    fn token_headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (k, v) in pairs {
            headers.insert(*k, HeaderValue::from_str(v).unwrap());
        }
        headers
    }

    fn valid_token_pairs<'a>() -> Vec<(&'static str, &'a str)> {
        vec![
            ("content-type", "application/json"),
            ("x-client-key", "K1"),
            ("x-timestamp", "2024-01-01T10:00:00+07:00"),
            ("x-signature", "c2ln"),
        ]
    }

    fn code_for(pairs: &[(&'static str, &str)]) -> String {
        TokenRequestHeaders::from_headers(&token_headers(pairs))
            .unwrap_err()
            .response_code()
    }

    #[test]
    fn accepts_complete_token_headers() {
        let headers = token_headers(&valid_token_pairs());
        let parsed = TokenRequestHeaders::from_headers(&headers).unwrap();
        assert_eq!(parsed.client_key, "K1");
        assert_eq!(parsed.timestamp, "2024-01-01T10:00:00+07:00");
        assert_eq!(parsed.signature, "c2ln");
    }

    #[test]
    fn header_names_are_case_insensitive() {
        let mut headers = HeaderMap::new();
        for (name, value) in [
            ("Content-Type", "application/json"),
            ("X-CLIENT-KEY", "K1"),
            ("X-Timestamp", "2024-01-01T10:00:00-05:30"),
            ("X-SIGNATURE", "c2ln"),
        ] {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_static(value),
            );
        }
        assert!(TokenRequestHeaders::from_headers(&headers).is_ok());
    }

    #[test]
    fn missing_headers_report_subcode_02() {
        for name in ["content-type", "x-client-key", "x-timestamp", "x-signature"] {
            let pairs: Vec<_> = valid_token_pairs()
                .into_iter()
                .filter(|(k, _)| *k != name)
                .collect();
            assert_eq!(code_for(&pairs), "4007302", "missing {name}");
        }
    }

    #[test]
    fn empty_client_key_counts_as_missing() {
        let mut pairs = valid_token_pairs();
        pairs[1] = ("x-client-key", "");
        assert_eq!(code_for(&pairs), "4007302");
    }

    #[test]
    fn timestamp_accepts_both_offset_signs() {
        for ts in ["2024-01-01T10:00:00+07:00", "2024-12-31T23:59:59-05:30"] {
            let parsed = parse_timestamp(ts).unwrap();
            assert_eq!(parsed.format(TIMESTAMP_FORMAT).to_string(), ts);
        }
    }

    #[test]
    fn non_ascii_client_key_is_invalid_format() {
        let mut headers = token_headers(&valid_token_pairs());
        headers.insert(
            HeaderName::from_static("x-client-key"),
            HeaderValue::from_bytes(b"K\xff").unwrap(),
        );
        let err = TokenRequestHeaders::from_headers(&headers).unwrap_err();
        assert_eq!(err.response_code(), "4007301");
    }

    #[test]
    fn overlong_client_key_is_invalid_format() {
        let long = "K".repeat(MAX_CLIENT_KEY_LEN + 1);
        let mut pairs = valid_token_pairs();
        pairs[1] = ("x-client-key", long.as_str());
        let err = TokenRequestHeaders::from_headers(&token_headers(&pairs)).unwrap_err();
        assert_eq!(err.response_code(), "4007301");
        assert_eq!(err.message, "Invalid Field Format X-CLIENT-KEY");
    }

    #[test]
    fn content_type_must_be_exact() {
        let mut pairs = valid_token_pairs();
        pairs[0] = ("content-type", "application/json; charset=utf-8");
        assert_eq!(code_for(&pairs), "4007301");
        pairs[0] = ("content-type", "text/plain");
        assert_eq!(code_for(&pairs), "4007301");
    }

    #[test]
    fn timestamp_needs_numeric_offset() {
        for ts in [
            "2024-01-01T10:00:00",
            "2024-01-01 10:00:00+07:00",
            "yesterday",
            "2024-01-01T10:00:00Z",
            "2024-1-1T1:0:0+07:00",
            "2024-01-01T10:00:00+0700",
            "2024-01-01T10:00:60+07:00",
            "+2024-01-01T10:00:00+07:00",
            "2024-01-01T10:00:00+07:00 ",
        ] {
            let mut pairs = valid_token_pairs();
            pairs[2] = ("x-timestamp", ts);
            assert_eq!(code_for(&pairs), "4007301", "accepted {ts}");
        }
    }

    #[test]
    fn first_violation_in_field_order_wins() {
        // content-type is checked before the timestamp format
        let pairs = [
            ("content-type", "text/plain"),
            ("x-client-key", "K1"),
            ("x-timestamp", "bad"),
            ("x-signature", "c2ln"),
        ];
        let err = TokenRequestHeaders::from_headers(&token_headers(&pairs)).unwrap_err();
        assert_eq!(err.message, "Invalid Field Format Content-Type");
    }

    #[test]
    fn bearer_token_extraction() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Bearer   abc  "), Some("abc"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Basic abc"), None);
    }

    #[test]
    fn protected_call_headers_parse() {
        let headers = token_headers(&[
            ("content-type", "application/json"),
            ("authorization", "Bearer tok"),
            ("x-client-key", "K1"),
            ("x-timestamp", "2024-01-01T10:00:00+07:00"),
            ("x-signature", "c2ln"),
        ]);
        let parsed = ProtectedCallHeaders::from_headers(&headers, ServiceCode::Todo).unwrap();
        assert_eq!(parsed.token, "tok");
        assert_eq!(parsed.signed_at.offset().local_minus_utc(), 7 * 3600);
    }

    #[test]
    fn protected_call_rejects_non_bearer_authorization() {
        let headers = token_headers(&[
            ("content-type", "application/json"),
            ("authorization", "Bearer "),
            ("x-client-key", "K1"),
            ("x-timestamp", "2024-01-01T10:00:00+07:00"),
            ("x-signature", "c2ln"),
        ]);
        let err = ProtectedCallHeaders::from_headers(&headers, ServiceCode::Todo).unwrap_err();
        assert_eq!(err.response_code(), "4002401");
        assert_eq!(err.message, "Invalid Field Format Authorization");
    }
}
