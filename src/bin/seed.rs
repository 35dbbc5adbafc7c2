use bcrypt::hash;
use chrono::NaiveDate;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use std::error::Error;
use uuid::Uuid;

use twitter_api::config::Config;
use twitter_api::error::StoreError;
use twitter_api::models::{StoredUser, User};
use twitter_api::store::UserStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    println!("Starting data seeding...");

    let config = Config::from_env()?;
    let num_users: usize = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 100,
    };

    let store = UserStore::open(&config.data_file).await?;
    println!("Seeding {}", store.path().display());

    seed_users(&store, num_users, config.bcrypt_cost).await?;

    println!("Seeding completed!");
    Ok(())
}

async fn seed_users(store: &UserStore, count: usize, cost: u32) -> Result<(), Box<dyn Error>> {
    println!("Creating {} users...", count);
    let password_hash = hash("password123", cost)?;
    let mut created = 0;

    while created < count {
        let user = User {
            user_id: Uuid::new_v4(),
            email: SafeEmail().fake(),
            first_name: FirstName().fake(),
            last_name: LastName().fake(),
            birth_date: NaiveDate::from_ymd_opt(
                (1950i32..2006).fake::<i32>(),
                (1u32..13).fake::<u32>(),
                (1u32..29).fake::<u32>(),
            ),
        };
        let user_id = user.user_id;
        let email = user.email.clone();

        match store
            .insert(StoredUser {
                user,
                password_hash: password_hash.clone(),
            })
            .await
        {
            Ok(()) => {}
            // Faker repeats emails now and then; draw another one.
            Err(StoreError::Conflict(_)) => continue,
            Err(e) => return Err(e.into()),
        }

        created += 1;
        println!("Created user {}/{}: {} ({})", created, count, email, user_id);
    }

    Ok(())
}
