use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value};

/// Build the shared JSON error body: `{"kind", "message", ...extra}`.
///
/// `extra` must be a JSON object; its fields are merged next to `kind`/`message`
/// (e.g. `attempts_remaining`). Anything else is ignored.
pub fn error_response(
    status: StatusCode,
    kind: &str,
    message: &str,
    extra: Option<Value>,
) -> Response {
    let mut body = Map::new();
    body.insert("kind".to_owned(), Value::from(kind));
    body.insert("message".to_owned(), Value::from(message));
    if let Some(Value::Object(fields)) = extra {
        for (k, v) in fields {
            body.entry(k).or_insert(v);
        }
    }
    (status, axum::Json(Value::Object(body))).into_response()
}

/// Router fallback: unknown routes answer with the JSON error shape instead of an empty 404.
pub async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "NOT_FOUND", "not found", None)
}
