mod config;
mod ddb;
mod error;
mod inference;
mod routes;
mod storage;
mod upload;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_s3::Client as S3Client;
use config::AppConfig;
use ddb::prediction_store::{DynamoPredictionStore, PredictionStore};
use inference::loader::ModelLoader;
use routes::configure_routes;
use std::sync::Arc;
use storage::s3_service::S3Service;
use upload::UploadLimits;

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    log::error!("{}: {}", context, err);
    std::io::Error::other(format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| startup_error("Invalid configuration", e))?;

    let aws_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let s3_service = S3Service::new(S3Client::new(&aws_config), config.model_bucket.clone());

    // Loaded once; every worker shares the same model.
    let artifacts = ModelLoader::new(
        &s3_service,
        &config.model_prefix,
        &config.model_manifest,
        &config.model_dir,
    )
    .fetch()
    .await
    .map_err(|e| startup_error("Error loading model", e))?;
    let classifier = inference::model::load_classifier(&artifacts)
        .map_err(|e| startup_error("Error loading model", e))?;

    let store: Arc<dyn PredictionStore> = Arc::new(DynamoPredictionStore::new(
        DynamoDbClient::new(&aws_config),
        config.predictions_table.clone(),
    ));
    let limits = UploadLimits {
        max_image_bytes: config.max_image_bytes,
    };

    let bind_address = config.bind_address();
    log::info!("Server running on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .app_data(web::Data::from(classifier.clone()))
            .app_data(web::Data::from(store.clone()))
            .app_data(web::Data::new(limits))
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
