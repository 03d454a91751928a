//! Decoding of the platform's response envelope.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::client::HttpResponse;
use switchboard_core::{ApiError, ApiResult, TransportError};

/// Extra information the platform attaches to some errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseParameters {
    /// The group has been migrated to a supergroup with this id.
    #[serde(default)]
    pub migrate_to_chat_id: Option<i64>,
    /// Seconds to wait before the request can be repeated.
    #[serde(default)]
    pub retry_after: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

/// Decodes a raw response into the call's `result` value.
///
/// Server-side HTTP failures (5xx) are reported as
/// [`TransportError::Status`]; everything else is expected to carry the
/// platform's JSON envelope.
pub fn decode_response(method: &str, response: &HttpResponse) -> ApiResult<Value> {
    if response.status >= 500 {
        return Err(TransportError::Status {
            method: method.to_string(),
            status: response.status,
        }
        .into());
    }

    let envelope: Envelope = serde_json::from_slice(&response.body)?;
    if envelope.ok {
        return Ok(envelope.result.unwrap_or(Value::Null));
    }

    let code = envelope.error_code.unwrap_or(i64::from(response.status));
    let description = envelope.description.unwrap_or_default();
    let parameters = envelope.parameters.unwrap_or_default();

    debug!(method = %method, code, description = %description, "API returned an error");

    let err = match code {
        400 => match parameters.migrate_to_chat_id {
            Some(migrate_to_chat_id) => ApiError::Migrate {
                migrate_to_chat_id,
                description,
            },
            None => ApiError::BadRequest(description),
        },
        401 => ApiError::Unauthorized(description),
        403 => ApiError::Forbidden(description),
        404 => ApiError::NotFound(description),
        409 => ApiError::Conflict(description),
        429 => ApiError::TooManyRequests {
            retry_after: parameters.retry_after.unwrap_or(0),
            description,
        },
        _ => ApiError::Other { code, description },
    };
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(status: u16, body: &str) -> ApiResult<Value> {
        decode_response("foo", &HttpResponse::new(status, body))
    }

    #[test]
    fn test_decode_ok() {
        let value = decode(200, r#"{"ok":true,"result":{"id":1,"is_bot":true}}"#).unwrap();
        assert_eq!(value, json!({"id": 1, "is_bot": true}));
    }

    #[test]
    fn test_decode_ok_without_result() {
        assert_eq!(decode(200, r#"{"ok":true}"#).unwrap(), Value::Null);
    }

    #[test]
    fn test_decode_platform_errors() {
        let err = decode(
            400,
            r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref d) if d.contains("chat not found")));

        let err = decode(401, r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#)
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));

        let err = decode(403, r#"{"ok":false,"error_code":403,"description":"Forbidden"}"#)
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let err = decode(409, r#"{"ok":false,"error_code":409,"description":"Conflict"}"#)
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let err = decode(418, r#"{"ok":false,"error_code":418,"description":"teapot"}"#)
            .unwrap_err();
        assert!(matches!(err, ApiError::Other { code: 418, .. }));
    }

    #[test]
    fn test_decode_too_many_requests() {
        let err = decode(
            429,
            r#"{"ok":false,"error_code":429,"description":"Too Many Requests","parameters":{"retry_after":7}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::TooManyRequests { retry_after: 7, .. }));
    }

    #[test]
    fn test_decode_migrate() {
        let err = decode(
            400,
            r#"{"ok":false,"error_code":400,"description":"migrated","parameters":{"migrate_to_chat_id":-100123}}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Migrate {
                migrate_to_chat_id: -100123,
                ..
            }
        ));
    }

    #[test]
    fn test_decode_server_error_is_transport_status() {
        let err = decode(502, "Bad Gateway").unwrap_err();
        assert!(matches!(
            err,
            ApiError::Transport(TransportError::Status { status: 502, .. })
        ));
    }

    #[test]
    fn test_decode_malformed_body() {
        let err = decode(200, "not json").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
