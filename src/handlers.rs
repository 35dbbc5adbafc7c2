use actix_web::{delete, get, post, put, web, HttpResponse};
use bcrypt::hash;
use log::{debug, info, warn};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{LoginRequest, StoredUser, Tweet, User, UserRegister, UserUpdate};
use crate::store::UserStore;

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        warn!("Rejected malformed id: {}", raw);
        ApiError::BadRequest(format!("invalid id `{}`", raw))
    })
}

fn validate<T: Validate>(payload: &T) -> Result<(), ApiError> {
    payload.validate().map_err(|e| {
        let err = ApiError::Validation(e);
        warn!("Rejected payload: {}", err);
        err
    })
}

#[get("/")]
pub async fn home() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "Twitter API": {
            "status": "working"
        }
    }))
}

// Tweets

#[post("/post")]
pub async fn create_tweet(tweet: web::Json<Tweet>) -> Result<HttpResponse, ApiError> {
    validate(&*tweet)?;
    debug!("Tweet {} accepted but not stored", tweet.tweet_id);
    Err(ApiError::NotImplemented("tweet creation"))
}

#[get("/tweets/{tweet_id}")]
pub async fn get_tweet(tweet_id: web::Path<String>) -> Result<HttpResponse, ApiError> {
    parse_id(&tweet_id)?;
    Err(ApiError::NotImplemented("tweet lookup"))
}

#[put("/tweets/{tweet_id}/update")]
pub async fn update_tweet(
    tweet_id: web::Path<String>,
    tweet: web::Json<Tweet>,
) -> Result<HttpResponse, ApiError> {
    parse_id(&tweet_id)?;
    validate(&*tweet)?;
    Err(ApiError::NotImplemented("tweet update"))
}

#[delete("/tweets/{tweet_id}/delete")]
pub async fn delete_tweet(tweet_id: web::Path<String>) -> Result<HttpResponse, ApiError> {
    parse_id(&tweet_id)?;
    Err(ApiError::NotImplemented("tweet deletion"))
}

// Users

#[post("/users")]
pub async fn register_user(
    store: web::Data<Arc<UserStore>>,
    config: web::Data<Config>,
    user_data: web::Json<UserRegister>,
) -> Result<HttpResponse, ApiError> {
    validate(&*user_data)?;

    let (user, password) = user_data.into_inner().into_user();
    let cost = config.bcrypt_cost;
    let password_hash = web::block(move || hash(password.as_bytes(), cost)).await??;

    store
        .insert(StoredUser {
            user: user.clone(),
            password_hash,
        })
        .await?;

    info!("User registered: {}", user.user_id);
    Ok(HttpResponse::Created().json(user))
}

#[post("/login")]
pub async fn login(credentials: web::Json<LoginRequest>) -> Result<HttpResponse, ApiError> {
    validate(&*credentials)?;
    Err(ApiError::NotImplemented("login"))
}

#[get("/users")]
pub async fn list_users(store: web::Data<Arc<UserStore>>) -> Result<HttpResponse, ApiError> {
    let users: Vec<User> = store.list().await?.into_iter().map(|u| u.user).collect();
    debug!("Listing {} users", users.len());
    Ok(HttpResponse::Ok().json(users))
}

#[get("/users/{user_id}")]
pub async fn get_user(
    store: web::Data<Arc<UserStore>>,
    user_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = parse_id(&user_id)?;
    match store.get(user_id).await? {
        Some(stored) => Ok(HttpResponse::Ok().json(stored.user)),
        None => Err(ApiError::NotFound(user_id)),
    }
}

#[put("/users/{user_id}/update")]
pub async fn update_user(
    store: web::Data<Arc<UserStore>>,
    user_id: web::Path<String>,
    update: web::Json<UserUpdate>,
) -> Result<HttpResponse, ApiError> {
    let user_id = parse_id(&user_id)?;
    validate(&*update)?;

    match store.update(user_id, update.into_inner()).await? {
        Some(stored) => {
            info!("User updated: {}", user_id);
            Ok(HttpResponse::Ok().json(stored.user))
        }
        None => Err(ApiError::NotFound(user_id)),
    }
}

#[delete("/users/{user_id}/delete")]
pub async fn delete_user(
    store: web::Data<Arc<UserStore>>,
    user_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = parse_id(&user_id)?;
    match store.delete(user_id).await? {
        Some(stored) => {
            info!("User deleted: {}", user_id);
            Ok(HttpResponse::Ok().json(stored.user))
        }
        None => Err(ApiError::NotFound(user_id)),
    }
}
