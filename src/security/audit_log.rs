use tracing::{error, info, warn};

#[derive(Debug, Clone, Default)]
pub struct AuditLogger;

impl AuditLogger {
    pub fn new() -> Self {
        Self
    }

    pub fn token_issued(&self, client_key: &str, request_id: Option<&str>, expires_at: i64) {
        info!(target: "audit", event = "token_issued", client_key, request_id = request_id.unwrap_or(""), expires_at);
    }

    pub fn auth_failure(&self, client_key: Option<&str>, request_id: Option<&str>, reason: &str) {
        warn!(target: "audit", event = "auth_failure", client_key = client_key.unwrap_or(""), request_id = request_id.unwrap_or(""), reason);
    }

    pub fn token_invalid(&self, request_id: Option<&str>, reason: &str) {
        warn!(target: "audit", event = "token_invalid", request_id = request_id.unwrap_or(""), reason);
    }

    pub fn signature_invalid(&self, client_key: Option<&str>, request_id: Option<&str>) {
        warn!(target: "audit", event = "signature_invalid", client_key = client_key.unwrap_or(""), request_id = request_id.unwrap_or(""));
    }

    pub fn call_rejected(&self, request_id: Option<&str>, stage: &str, response_code: &str) {
        info!(target: "audit", event = "call_rejected", request_id = request_id.unwrap_or(""), stage, response_code);
    }

    pub fn call_authorized(&self, client_key: &str, request_id: Option<&str>, method: &str, path: &str) {
        info!(target: "audit", event = "call_authorized", client_key, request_id = request_id.unwrap_or(""), method, path);
    }

    pub fn internal_error(&self, request_id: Option<&str>, error_msg: &str) {
        error!(target: "audit", event = "internal_error", request_id = request_id.unwrap_or(""), error = error_msg);
    }
}
