use actix_web::{web, App, HttpServer};
use backend::config::AppConfig;
use backend::db;
use backend::job_controller::state::{start_progress_updater, ProgressState};
use backend::pipeline::convert::{DocumentConverter, LibreOfficeConverter};
use backend::services;
use env_logger::Env;
use log::info;
use std::fs;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let config = AppConfig::from_env();

    fs::create_dir_all(&config.storage_root)?;
    db::init_schema(&config)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    // Progress updater task: the single writer behind batch polling.
    let (tx, rx) = mpsc::channel(100);
    let progress = ProgressState { tx };
    let updater_config = config.clone();
    tokio::spawn(async move {
        start_progress_updater(updater_config, rx).await;
    });

    let converter: Arc<dyn DocumentConverter> =
        Arc::new(LibreOfficeConverter::new(config.converter_bin.clone()));

    let bind_addr = (config.host.clone(), config.port);
    info!("Server running at http://{}:{}", bind_addr.0, bind_addr.1);

    let app_config = config.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024)) // 10 MB
            .app_data(web::Data::new(app_config.clone()))
            .app_data(web::Data::new(progress.clone()))
            .app_data(web::Data::new(converter.clone()))
            .service(services::templates::configure_routes())
            .service(services::batches::configure_routes())
            .service(services::certificates::configure_routes())
    })
    .bind(bind_addr)?
    .run()
    .await
}
