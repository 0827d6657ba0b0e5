use actix_web::{web, HttpServer};
use dotenv::dotenv;
use log::{error, info};
use std::io;

use ta_api::app::{build_state, create_app};
use ta_api::config::load_config;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables
    dotenv().ok();

    let config = load_config().map_err(|e| {
        eprintln!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // Initialize logger
    env_logger::init_from_env(
        env_logger::Env::new().default_filter_or(config.logging.filter()),
    );

    info!(
        "Starting trusted auth server {} ({:?}, {} tokens)",
        config.auth.token.server_id,
        config.environment,
        if config.auth.token.uses_session() { "session" } else { "cookie" }
    );

    let state = build_state(&config).await.map_err(|e| {
        error!("Failed to initialise trusted authentication: {}", e);
        io::Error::new(io::ErrorKind::Other, e.to_string())
    })?;
    let state = web::Data::new(state);

    let bind_address = config.server.bind_address();
    info!("Server will bind to: {}", bind_address);

    let mut server = HttpServer::new(move || create_app(state.clone()))
        .keep_alive(std::time::Duration::from_secs(config.server.keep_alive));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(&bind_address)?.run().await
}
