use helpers::auth_jwt::auth::verify_jwt;
use lib_config::config::configuration::Settings;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::error::{ErrorInternalServerError, ErrorUnauthorized};
use actix_web::{web, Error, HttpMessage};
use actix_web_lab::middleware::Next;

/// Resolves the caller's identity from the Bearer token and stashes the
/// verified claims in request extensions. Requests that fail here never
/// reach a handler, so unauthenticated traffic never touches the store.
pub async fn identity_middleware(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let secret = req
        .app_data::<web::Data<Settings>>()
        .ok_or_else(|| ErrorInternalServerError("Missing application settings"))?
        .jwt
        .secret
        .clone();

    let token = req.headers().get("Authorization");
    if token.is_none() {
        return Err(ErrorUnauthorized("Missing token"));
    }
    let token = token.unwrap().to_str().unwrap_or("").replace("Bearer ", "");
    if token.is_empty() {
        return Err(ErrorUnauthorized("Invalid token"));
    }
    match verify_jwt(&token, &secret) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.call(req).await
        }
        Err(_) => Err(ErrorUnauthorized("Invalid token")),
    }
}
