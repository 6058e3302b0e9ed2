//! JSON envelopes and the HTTP mapping of service errors

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::{json, Value};

use crate::core::{AuthError, ServiceError};
use crate::db::StoreError;

const INTERNAL_MESSAGE: &str = "internal server error";

/// `{"ok": true, ...fields}`
pub fn ok(fields: Value) -> HttpResponse {
    HttpResponse::Ok().json(envelope(fields))
}

/// `201 {"ok": true, ...fields}`
pub fn created(fields: Value) -> HttpResponse {
    HttpResponse::Created().json(envelope(fields))
}

fn envelope(fields: Value) -> Value {
    let mut body = json!({ "ok": true });
    if let (Some(body), Value::Object(fields)) = (body.as_object_mut(), fields) {
        body.extend(fields);
    }
    body
}

impl ServiceError {
    /// Message safe to show a client; store internals stay in the logs
    fn public_message(&self) -> String {
        match self {
            ServiceError::Auth(AuthError::Signing(_) | AuthError::Hashing(_)) => {
                INTERNAL_MESSAGE.to_string()
            }
            ServiceError::Store(
                StoreError::Database(_) | StoreError::Blob(_) | StoreError::Unavailable(_),
            ) => INTERNAL_MESSAGE.to_string(),
            ServiceError::Incomplete { entity, id, .. } => {
                format!("{} {} was saved but the request did not complete", entity, id)
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Auth(err) => match err {
                AuthError::NoToken | AuthError::InvalidToken | AuthError::InvalidCredentials => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::Forbidden | AuthError::NotOwner => StatusCode::FORBIDDEN,
                AuthError::Signing(_) | AuthError::Hashing(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ServiceError::Store(err) => match err {
                StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                StoreError::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServiceError::Incomplete { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }

        let mut body = json!({ "ok": false, "error": self.public_message() });
        if let ServiceError::Incomplete { entity, id, .. } = self {
            body["entity"] = json!(entity);
            body["id"] = json!(id);
        }

        HttpResponse::build(status).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServiceError::from(AuthError::NoToken), StatusCode::UNAUTHORIZED),
            (AuthError::InvalidToken.into(), StatusCode::UNAUTHORIZED),
            (AuthError::InvalidCredentials.into(), StatusCode::UNAUTHORIZED),
            (AuthError::Forbidden.into(), StatusCode::FORBIDDEN),
            (AuthError::NotOwner.into(), StatusCode::FORBIDDEN),
            (StoreError::not_found("track", "t1").into(), StatusCode::NOT_FOUND),
            (StoreError::Conflict("email".into()).into(), StatusCode::CONFLICT),
            (StoreError::Blob("disk".into()).into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{}", err);
        }
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err = ServiceError::from(StoreError::Unavailable("pool timed out at 10.0.0.3".into()));
        assert_eq!(err.public_message(), INTERNAL_MESSAGE);

        let err = ServiceError::incomplete(
            "track",
            "t1",
            StoreError::Unavailable("secret".into()).into(),
        );
        assert!(err.public_message().contains("t1"));
        assert!(!err.public_message().contains("secret"));
    }

    #[test]
    fn test_envelope_merges_fields() {
        assert_eq!(
            envelope(json!({"tracks": []})),
            json!({"ok": true, "tracks": []})
        );
        assert_eq!(envelope(Value::Null), json!({"ok": true}));
    }
}
