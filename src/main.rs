use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::{Builder, Env};
use log::{error, info};
use std::sync::Arc;

use twitter_api::config::Config;
use twitter_api::routes;
use twitter_api::store::UserStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let config = Config::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    info!("Starting Twitter API...");
    let store = UserStore::open(&config.data_file).await.map_err(|e| {
        error!("Failed to open user store: {}", e);
        std::io::Error::other(e)
    })?;
    let store = Arc::new(store);

    info!("Using user store at {}", store.path().display());

    let bind_addr = config.bind_addr();
    let workers = config.workers;
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(config.clone()))
            .configure(routes::configure)
    })
    .workers(workers)
    .bind(bind_addr)?
    .run()
    .await
}
