//! `POST /v1.0/access-token`

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use serde::Serialize;
use tracing::debug;

use crate::comms::correlation_id::request_id;
use crate::comms::local_api::SharedState;
use crate::protocol::body::TokenRequest;
use crate::protocol::headers::TokenRequestHeaders;
use crate::protocol::{ApiError, ServiceCode, Success};
use crate::security::token::TOKEN_TYPE;
use crate::security::AuthError;

const SERVICE: ServiceCode = ServiceCode::AccessToken;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPayload {
    pub access_token: String,
    pub token_type: String,
    /// Configured lifetime in seconds, as a string.
    pub expires_in: String,
}

pub async fn issue_token(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Success<TokenPayload>, ApiError> {
    let request_id = request_id(&headers);

    let fields = TokenRequestHeaders::from_headers(&headers)?;
    let body = body.map_err(|_| ApiError::bad_request(SERVICE))?;
    TokenRequest::parse(&body)?;

    state
        .issuer
        .authenticate_client(&fields.client_key, &fields.timestamp, &fields.signature)
        .map_err(|e| {
            let reason = e.to_string();
            state
                .audit
                .auth_failure(Some(&fields.client_key), request_id, &reason);
            match e {
                AuthError::UnknownClient => {
                    ApiError::unauthorized(SERVICE, "Unauthorized. Unknown Client")
                }
                _ => ApiError::unauthorized(SERVICE, "Unauthorized. Signature"),
            }
        })?;

    let issued = state.issuer.mint().map_err(|e| {
        state.audit.internal_error(request_id, &e.to_string());
        ApiError::internal(SERVICE)
    })?;
    state
        .audit
        .token_issued(&fields.client_key, request_id, issued.claims.exp);
    debug!(client_key = %fields.client_key, "access token issued");

    Ok(Success::new(
        SERVICE,
        TokenPayload {
            access_token: issued.access_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: state.issuer.expire_secs().to_string(),
        },
    ))
}
