use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;

mod api;
mod camera;
mod config;
mod db;
mod docs;
mod error;
mod matcher;
mod model;
mod routes;
mod store;
mod utils;
mod vision;

use config::Config;
use db::init_db;
use matcher::FaceMatcher;

use crate::docs::ApiDoc;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    std::fs::create_dir_all(&config.employee_images_dir)?;

    let pool = init_db(&config.database_url).await;

    let engine = vision::spawn_engine(&config.detector_model_path, &config.encoder_model_path)
        .expect("failed to start face engine");
    let engine_data = Data::new(engine);

    let matcher = Data::new(FaceMatcher::new(config.tolerance, config.max_face_distance));
    match matcher.reload(&pool).await {
        Ok(count) => info!(count, "face matcher warmed up"),
        Err(e) => warn!(error = %e, "face matcher warmup failed"),
    }

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            // Camera frames arrive as base64 form fields; raise the form limit.
            .app_data(web::FormConfig::default().limit(8 * 1024 * 1024))
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(matcher.clone())
            .app_data(engine_data.clone())
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
