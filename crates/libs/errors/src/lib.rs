use std::{error::Error, fmt::Debug};

use actix_web::{HttpResponse, ResponseError};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde_json::json;
use thiserror::Error;

#[derive(Error)]
pub enum CustomError {
    #[error("Database Error: {0}")]
    DatabaseError(#[from] DbError),

    #[error("Validation Error: {0}")]
    ValidationError(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Authentication Error: {0}")]
    AuthenticationError(#[from] AuthError),

    #[error("Unexpected Error")]
    UnexpectedError(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection Error: {0}")]
    ConnectionError(String),

    #[error("Query Error: {0}")]
    QueryBuilderError(String),

    #[error("Insertion Error: {0}")]
    InsertionError(String),

    #[error("Updation Error: {0}")]
    UpdationError(String),

    #[error("Constraint Violation: {0}")]
    ConstraintViolation(String),

    #[error("Other Database Error: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Credentials: {0}")]
    MissingCredentials(String),

    #[error("JWT Authentication Error: {0}")]
    JwtAuthenticationError(String),

    #[error("Other Authentication Error: {0}")]
    OtherAuthenticationError(String),
}

/******************************************/
// Diesel error translation
/******************************************/
// Every record-lookup miss becomes NotFound so a stale id can never
// crash a request; everything else keeps its db-level category.
impl From<DieselError> for CustomError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => CustomError::NotFound("Record not found".to_string()),
            DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::ForeignKeyViolation,
                info,
            ) => CustomError::DatabaseError(DbError::ConstraintViolation(
                info.message().to_string(),
            )),
            DieselError::DatabaseError(_, info) => {
                CustomError::DatabaseError(DbError::QueryBuilderError(info.message().to_string()))
            }
            other => CustomError::DatabaseError(DbError::Other(other.to_string())),
        }
    }
}

impl ResponseError for CustomError {
    fn error_response(&self) -> HttpResponse {
        match self {
            CustomError::ValidationError(_) => {
                HttpResponse::BadRequest().json(json!({ "error": self.to_string() }))
            }
            CustomError::NotFound(_) => {
                HttpResponse::NotFound().json(json!({ "error": self.to_string() }))
            }
            CustomError::DatabaseError(_) => {
                HttpResponse::InternalServerError().json(json!({ "error": self.to_string() }))
            }
            CustomError::AuthenticationError(_) => {
                HttpResponse::Unauthorized().json(json!({ "error": self.to_string() }))
            }
            CustomError::UnexpectedError(_) => {
                HttpResponse::InternalServerError().json(json!({ "error": self.to_string() }))
            }
        }
    }
}

impl Debug for CustomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain(self, f)
    }
}

fn error_chain(
    source: &impl Error,
    f: &mut std::fmt::Formatter
) -> std::fmt::Result {
    writeln!(f, "{}", source)?;

    match source.source() {
        Some(next) => {
            write!(f, "Caused by: \n\t{:?}", next)?;
        },
        None => {}
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn lookup_miss_maps_to_not_found() {
        let err: CustomError = DieselError::NotFound.into();
        assert_eq!(err.error_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_error_maps_to_bad_request() {
        let err = CustomError::ValidationError("title is too short".to_string());
        assert_eq!(err.error_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn auth_error_maps_to_unauthorized() {
        let err = CustomError::AuthenticationError(AuthError::MissingCredentials(
            "no token".to_string(),
        ));
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn db_error_maps_to_internal_server_error() {
        let err = CustomError::DatabaseError(DbError::ConnectionError("pool".to_string()));
        assert_eq!(
            err.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
