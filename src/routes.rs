use actix_web::web;

use crate::error::{describe_json_error, ApiError};
use crate::handlers;

/// Registers every route and the JSON body configuration on an `App`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(describe_json_error(&err)).into()),
    )
    .service(handlers::home)
    .service(handlers::create_tweet)
    .service(handlers::get_tweet)
    .service(handlers::update_tweet)
    .service(handlers::delete_tweet)
    .service(handlers::register_user)
    .service(handlers::login)
    .service(handlers::list_users)
    .service(handlers::get_user)
    .service(handlers::update_user)
    .service(handlers::delete_user);
}
