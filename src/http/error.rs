use crate::forms::FieldErrors;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;
use std::fmt;

pub fn ok(result: serde_json::Value) -> serde_json::Value {
    json!({
        "ok": true,
        "result": result
    })
}

pub fn err(
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "ok": false,
        "error": error,
    })
}

#[derive(Debug)]
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

pub type HandlerResult = Result<serde_json::Value, HandlerErr>;

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        HandlerErr {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Store failure under `code` (`db_query_failed`, `db_insert_failed`, ...).
    pub fn db(code: &'static str, e: impl fmt::Display) -> Self {
        HandlerErr::new(code, e.to_string())
    }

    /// File-system failure while reading or writing media.
    pub fn io(e: std::io::Error) -> Self {
        HandlerErr::new("io_failed", e.to_string())
    }

    pub fn not_found(what: &str) -> Self {
        HandlerErr::new("not_found", format!("{} not found", what))
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        HandlerErr::new("bad_params", message)
    }

    pub fn invalid_form(errors: &FieldErrors) -> Self {
        HandlerErr::new("invalid_form", "form has errors").with_details(errors.to_json())
    }

    pub fn status(&self) -> StatusCode {
        match self.code {
            "bad_params" | "invalid_form" | "invalid_credentials" => StatusCode::BAD_REQUEST,
            "login_required" => StatusCode::FORBIDDEN,
            "not_found" => StatusCode::NOT_FOUND,
            "payload_too_large" => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn response(self) -> HttpResponse {
        if self.status().is_server_error() {
            log::error!("{}: {}", self.code, self.message);
        }
        HttpResponse::build(self.status()).json(err(self.code, self.message, self.details))
    }
}

impl fmt::Display for HandlerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

pub fn respond(result: HandlerResult) -> HttpResponse {
    match result {
        Ok(v) => HttpResponse::Ok().json(ok(v)),
        Err(e) => e.response(),
    }
}
