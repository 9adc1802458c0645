//! The protected-call pipeline.
//!
//! headers → body → client key and bearer token → request signature.
//! The first failing stage produces the response; later stages never run.

use axum::http::HeaderMap;
use tracing::debug;

use crate::comms::local_api::AppState;
use crate::protocol::headers::ProtectedCallHeaders;
use crate::protocol::{ApiError, ServiceCode};
use crate::security::request_signer::verify_signature;
use crate::security::token::AccessClaims;
use crate::security::{AuthError, SignedRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Headers,
    Body,
    ClientKey,
    Token,
    Signature,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Headers => "headers",
            Stage::Body => "body",
            Stage::ClientKey => "client_key",
            Stage::Token => "token",
            Stage::Signature => "signature",
        }
    }
}

/// Everything a handler may rely on once a call passed every stage.
#[derive(Debug)]
pub struct AuthorizedCall<T> {
    pub headers: ProtectedCallHeaders,
    pub body: T,
    pub claims: AccessClaims,
}

/// The parts of the HTTP request the pipeline reads.
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    pub service: ServiceCode,
    pub method: &'a str,
    pub path: &'a str,
    pub headers: &'a HeaderMap,
    pub body: &'a [u8],
    pub request_id: Option<&'a str>,
}

pub fn authorize_call<T>(
    state: &AppState,
    call: CallContext<'_>,
    parse_body: impl FnOnce(&[u8]) -> Result<T, ApiError>,
) -> Result<AuthorizedCall<T>, ApiError> {
    run_stages(state, call, parse_body).map_err(|(stage, err)| {
        state
            .audit
            .call_rejected(call.request_id, stage.as_str(), &err.response_code());
        err
    })
}

fn run_stages<T>(
    state: &AppState,
    call: CallContext<'_>,
    parse_body: impl FnOnce(&[u8]) -> Result<T, ApiError>,
) -> Result<AuthorizedCall<T>, (Stage, ApiError)> {
    let service = call.service;
    let headers = ProtectedCallHeaders::from_headers(call.headers, service)
        .map_err(|e| (Stage::Headers, e))?;

    let body = parse_body(call.body).map_err(|e| (Stage::Body, e))?;

    if !state.client.matches_key(&headers.client_key) {
        state
            .audit
            .auth_failure(Some(&headers.client_key), call.request_id, "unknown client key");
        return Err((
            Stage::ClientKey,
            ApiError::unauthorized(service, "Unauthorized. Unknown Client"),
        ));
    }

    let claims = state.verifier.verify(&headers.token).map_err(|e| {
        state.audit.token_invalid(call.request_id, &e.to_string());
        (Stage::Token, ApiError::invalid_token(service))
    })?;

    let signed = SignedRequest {
        method: call.method,
        path: call.path,
        token: &headers.token,
        body: call.body,
        timestamp: &headers.timestamp,
    };
    verify_signature(state.client.shared_secret(), &signed, &headers.signature).map_err(|e| {
        let err = match e {
            AuthError::InvalidSignature => {
                state
                    .audit
                    .signature_invalid(Some(&headers.client_key), call.request_id);
                ApiError::invalid_signature(service)
            }
            AuthError::MalformedBody(_) => ApiError::bad_request(service),
            other => {
                state.audit.internal_error(call.request_id, &other.to_string());
                ApiError::internal(service)
            }
        };
        (Stage::Signature, err)
    })?;

    debug!(method = call.method, path = call.path, "protected call passed every stage");
    state.audit.call_authorized(
        &headers.client_key,
        call.request_id,
        call.method,
        call.path,
    );
    Ok(AuthorizedCall {
        headers,
        body,
        claims,
    })
}
