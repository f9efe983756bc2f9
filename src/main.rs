use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use catordog::classifier::Classifier;
use catordog::config;
use catordog::handlers::{self, AppState};
use catordog::scoring::OnnxScorer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> Result<()> {
    let config = match config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logs.level))
        .map_err(|e| anyhow::anyhow!("Invalid log level '{}': {}", config.logs.level, e))?;
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    let model_path = config.model_path();
    let scorer = match OnnxScorer::load(&model_path, config.image_size) {
        Ok(scorer) => scorer,
        Err(e) => {
            error!("Failed to load model: {}", e);
            return Err(e.into());
        }
    };

    let state = web::Data::new(AppState {
        classifier: Classifier::new(Arc::new(scorer), &config),
        max_payload_bytes: config.max_payload_bytes,
    });

    let addr = (config.host.clone(), config.port);
    info!("Server running at http://{}:{}", addr.0, addr.1);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(handlers::configure)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
