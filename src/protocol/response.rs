//! Composite response codes: `HTTPStatus + ServiceCode + SubCode`,
//! e.g. `4017300` is HTTP 401, service 73, subcode 00.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCode {
    AccessToken,
    Todo,
}

impl ServiceCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceCode::AccessToken => "73",
            ServiceCode::Todo => "24",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubCode {
    General,
    InvalidFieldFormat,
    MissingMandatoryField,
}

impl SubCode {
    pub fn as_str(self) -> &'static str {
        match self {
            SubCode::General => "00",
            SubCode::InvalidFieldFormat => "01",
            SubCode::MissingMandatoryField => "02",
        }
    }
}

pub fn response_code(status: StatusCode, service: ServiceCode, sub: SubCode) -> String {
    format!("{}{}{}", status.as_u16(), service.as_str(), sub.as_str())
}

/// Body shared by every error response and the liveness probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub response_code: String,
    pub response_message: String,
}

/// A terminal, user-facing failure. The first failing check produces one and
/// the request stops there.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} ({status})")]
pub struct ApiError {
    pub status: StatusCode,
    pub service: ServiceCode,
    pub sub: SubCode,
    pub message: String,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        service: ServiceCode,
        sub: SubCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            service,
            sub,
            message: message.into(),
        }
    }

    pub fn bad_request(service: ServiceCode) -> Self {
        Self::new(StatusCode::BAD_REQUEST, service, SubCode::General, "Bad Request")
    }

    pub fn missing_field(service: ServiceCode, field: &str) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            service,
            SubCode::MissingMandatoryField,
            format!("Missing Mandatory Field {field}"),
        )
    }

    pub fn invalid_field(service: ServiceCode, field: &str) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            service,
            SubCode::InvalidFieldFormat,
            format!("Invalid Field Format {field}"),
        )
    }

    pub fn unauthorized(service: ServiceCode, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, service, SubCode::General, message)
    }

    /// The single outcome for every bearer-token failure.
    pub fn invalid_token(service: ServiceCode) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            service,
            SubCode::InvalidFieldFormat,
            "Unauthorized. Invalid Token",
        )
    }

    pub fn invalid_signature(service: ServiceCode) -> Self {
        Self::unauthorized(service, "Unauthorized. Invalid Signature")
    }

    pub fn not_found(service: ServiceCode) -> Self {
        Self::new(StatusCode::NOT_FOUND, service, SubCode::General, "No Data Found")
    }

    pub fn internal(service: ServiceCode) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            service,
            SubCode::General,
            "Error Internal Server",
        )
    }

    pub fn response_code(&self) -> String {
        response_code(self.status, self.service, self.sub)
    }

    pub fn to_message(&self) -> Message {
        Message {
            response_code: self.response_code(),
            response_message: self.message.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.to_message())).into_response()
    }
}

/// Success envelope: the composite code plus whatever payload the endpoint returns.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Success<T: Serialize> {
    pub response_code: String,
    pub response_message: String,
    #[serde(flatten)]
    pub payload: T,
}

impl<T: Serialize> Success<T> {
    pub fn new(service: ServiceCode, payload: T) -> Self {
        Self {
            response_code: response_code(StatusCode::OK, service, SubCode::General),
            response_message: "Success".to_string(),
            payload,
        }
    }
}

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
