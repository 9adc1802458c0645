//! Todo endpoints. Every call runs the protected-call pipeline first.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, Uri};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error};

use crate::comms::correlation_id::request_id;
use crate::comms::guard::{authorize_call, AuthorizedCall, CallContext};
use crate::comms::local_api::{AppState, SharedState};
use crate::protocol::body::AddTodoRequest;
use crate::protocol::{ApiError, ServiceCode, Success};
use crate::todos::Todo;

const SERVICE: ServiceCode = ServiceCode::Todo;

#[derive(Debug, Serialize)]
pub struct TodoPayload {
    pub todo: Todo,
}

#[derive(Debug, Serialize)]
pub struct TodoListPayload {
    pub todos: Vec<Todo>,
}

fn authorize<T>(
    state: &AppState,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
    parse_body: impl FnOnce(&[u8]) -> Result<T, ApiError>,
) -> Result<AuthorizedCall<T>, ApiError> {
    let request_id = request_id(headers);
    let body = body.map_err(|e| {
        debug!(error = %e, "request body could not be read");
        let err = ApiError::bad_request(SERVICE);
        state
            .audit
            .call_rejected(request_id, "body", &err.response_code());
        err
    })?;
    authorize_call(
        state,
        CallContext {
            service: SERVICE,
            method: method.as_str(),
            path: uri.path(),
            headers,
            body: &body,
            request_id,
        },
        parse_body,
    )
}

/// Reads carry no body schema; whatever arrived is still covered by the signature.
fn no_body(_: &[u8]) -> Result<(), ApiError> {
    Ok(())
}

fn repository_failure(state: &AppState, headers: &HeaderMap, err: anyhow::Error) -> ApiError {
    error!(error = %err, "todo repository failed");
    state
        .audit
        .internal_error(request_id(headers), &format!("{err:#}"));
    ApiError::internal(SERVICE)
}

pub async fn add_todo(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Success<TodoPayload>, ApiError> {
    let call = authorize(&state, &method, &uri, &headers, body, AddTodoRequest::parse)?;

    let todo = Todo::create(call.body, call.headers.signed_at, Utc::now());
    state
        .todos
        .insert(todo.clone())
        .await
        .map_err(|e| repository_failure(&state, &headers, e))?;
    debug!(id = %todo.id, "todo created");

    Ok(Success::new(SERVICE, TodoPayload { todo }))
}

pub async fn list_todos(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Success<TodoListPayload>, ApiError> {
    authorize(&state, &method, &uri, &headers, body, no_body)?;

    let todos = state
        .todos
        .list(None)
        .await
        .map_err(|e| repository_failure(&state, &headers, e))?;
    Ok(Success::new(SERVICE, TodoListPayload { todos }))
}

pub async fn get_todo(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Success<TodoListPayload>, ApiError> {
    authorize(&state, &method, &uri, &headers, body, no_body)?;

    let todos = state
        .todos
        .list(Some(&id))
        .await
        .map_err(|e| repository_failure(&state, &headers, e))?;
    if todos.is_empty() {
        return Err(ApiError::not_found(SERVICE));
    }
    Ok(Success::new(SERVICE, TodoListPayload { todos }))
}
