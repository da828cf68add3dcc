//! Transport-level errors of the MCP HTTP endpoint.
//!
//! These are the failures that never reach the protocol router: bad or
//! missing session ids, unparsable bodies, stream conflicts and auth
//! rejections. Each maps to an HTTP status plus a JSON-RPC error body with
//! a null id.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use podgate_types::jsonrpc::codes;
use podgate_types::JsonRpcResponse;

/// Error type for the Streamable HTTP transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Bad Request: No valid session ID provided")]
    MissingSession,

    #[error("Bad Request: Session not found: {0}")]
    UnknownSession(String),

    #[error("Bad Request: Session {0} is not active")]
    SessionNotActive(String),

    #[error("Bad Request: initialize must be sent as a request with an id")]
    NotInitialize,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid Request: {0}")]
    InvalidRequest(String),

    #[error("Conflict: Session {0} already has an open stream")]
    StreamConflict(String),

    #[error("Unauthorized: API key required")]
    Unauthorized,

    #[error("Forbidden: Invalid API key")]
    Forbidden,
}

impl TransportError {
    pub fn status(&self) -> StatusCode {
        match self {
            TransportError::MissingSession
            | TransportError::UnknownSession(_)
            | TransportError::SessionNotActive(_)
            | TransportError::NotInitialize
            | TransportError::ParseError(_)
            | TransportError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            TransportError::StreamConflict(_) => StatusCode::CONFLICT,
            TransportError::Unauthorized => StatusCode::UNAUTHORIZED,
            TransportError::Forbidden => StatusCode::FORBIDDEN,
        }
    }

    /// JSON-RPC error code carried in the body.
    pub fn code(&self) -> i32 {
        match self {
            TransportError::ParseError(_) => codes::PARSE_ERROR,
            TransportError::InvalidRequest(_) => codes::INVALID_REQUEST,
            TransportError::Unauthorized => codes::UNAUTHORIZED,
            TransportError::Forbidden => codes::FORBIDDEN,
            TransportError::MissingSession
            | TransportError::UnknownSession(_)
            | TransportError::SessionNotActive(_)
            | TransportError::NotInitialize
            | TransportError::StreamConflict(_) => codes::BAD_SESSION,
        }
    }
}

impl IntoResponse for TransportError {
    fn into_response(self) -> Response {
        let body = JsonRpcResponse::error(None, self.code(), self.to_string());
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_code_mapping() {
        let cases = [
            (TransportError::MissingSession, 400, codes::BAD_SESSION),
            (
                TransportError::UnknownSession("s".into()),
                400,
                codes::BAD_SESSION,
            ),
            (
                TransportError::ParseError("eof".into()),
                400,
                codes::PARSE_ERROR,
            ),
            (
                TransportError::InvalidRequest("no method".into()),
                400,
                codes::INVALID_REQUEST,
            ),
            (
                TransportError::StreamConflict("s".into()),
                409,
                codes::BAD_SESSION,
            ),
            (TransportError::Unauthorized, 401, codes::UNAUTHORIZED),
            (TransportError::Forbidden, 403, codes::FORBIDDEN),
        ];

        for (error, status, code) in cases {
            assert_eq!(error.status().as_u16(), status, "{}", error);
            assert_eq!(error.code(), code, "{}", error);
        }
    }

    #[test]
    fn test_response_status() {
        let response = TransportError::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
