use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Public view of a user. This is what every user route answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct User {
    pub user_id: Uuid,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
}

/// Registration body. The id is optional; the server assigns one when the
/// client leaves it out.
#[derive(Debug, Deserialize, Validate)]
pub struct UserRegister {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[validate(length(min = 8, max = 64))]
    pub password: String,
}

impl UserRegister {
    /// Splits the request into the public user and the plain password.
    pub fn into_user(self) -> (User, String) {
        let user = User {
            user_id: self.user_id.unwrap_or_else(Uuid::new_v4),
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            birth_date: self.birth_date,
        };
        (user, self.password)
    }
}

/// Partial update of a user. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UserUpdate {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl UserUpdate {
    pub fn apply(self, user: &mut User) {
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(birth_date) = self.birth_date {
            user.birth_date = Some(birth_date);
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 64))]
    pub password: String,
}

/// A user record as it sits in the JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUser {
    #[serde(flatten)]
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Tweet {
    #[serde(default = "Uuid::new_v4")]
    pub tweet_id: Uuid,
    #[validate(length(min = 1, max = 256))]
    pub content: String,
    #[serde(with = "chrono::serde::ts_milliseconds", default = "now")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds_option", default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[validate]
    pub by: User,
}

impl Tweet {
    pub fn new(content: String, by: User) -> Self {
        Self {
            tweet_id: Uuid::new_v4(),
            content,
            created_at: now(),
            updated_at: None,
            by,
        }
    }
}
