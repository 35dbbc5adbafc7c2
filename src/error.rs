use actix_web::{
    error::{BlockingError, JsonPayloadError},
    http::StatusCode,
    HttpResponse, ResponseError,
};
use log::error;
use serde_json::{error::Category, json};
use thiserror::Error;
use uuid::Uuid;
use validator::{ValidationErrors, ValidationErrorsKind};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: `{0}`")]
    Io(#[from] std::io::Error),

    /// The data file exists but does not hold a JSON array of users.
    #[error("corrupt user file: `{0}`")]
    Corrupt(#[from] serde_json::Error),

    #[error("{0}")]
    Conflict(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", describe_validation(.0))]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("user {0} not found")]
    NotFound(Uuid),

    #[error("{0}")]
    Conflict(String),

    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    #[error(transparent)]
    Store(StoreError),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("blocking task failed: {0}")]
    Blocking(#[from] BlockingError),
}

/// Renders `field: code` pairs, sorted, nested fields dotted. Rejected
/// values are left out so a bad password never travels back.
pub fn describe_validation(errors: &ValidationErrors) -> String {
    let mut parts = Vec::new();
    collect_validation("", errors, &mut parts);
    parts.sort();
    parts.join("; ")
}

fn collect_validation(prefix: &str, errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                for err in errs {
                    out.push(format!("{}: {}", path, err.code));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_validation(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation(&format!("{}[{}]", path, index), nested, out);
                }
            }
        }
    }
}

/// Describes a rejected JSON body by position and kind only; serde's own
/// message quotes the offending token.
pub fn describe_json_error(err: &JsonPayloadError) -> String {
    match err {
        JsonPayloadError::Deserialize(e) => {
            let kind = match e.classify() {
                Category::Io => "unreadable",
                Category::Syntax => "malformed",
                Category::Data => "mistyped or missing field in",
                Category::Eof => "truncated",
            };
            format!(
                "{} JSON body at line {}, column {}",
                kind,
                e.line(),
                e.column()
            )
        }
        JsonPayloadError::ContentType => "expected an application/json body".to_string(),
        _ => "invalid JSON body".to_string(),
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Store(other),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            ApiError::Store(_) | ApiError::Hash(_) | ApiError::Blocking(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED {
            error!("Request failed: {}", self);
        }
        HttpResponse::build(status).json(json!({ "detail": self.to_string() }))
    }
}
