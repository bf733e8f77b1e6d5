//! Synchronous validation of the generate endpoint: bad requests are
//! rejected before any batch record exists, and the uploaded dataset file
//! never outlives the rejection.

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use backend::config::AppConfig;
use backend::db;
use backend::job_controller::state::ProgressState;
use backend::pipeline::convert::{DocumentConverter, LibreOfficeConverter};
use backend::services;
use chrono::Utc;
use common::model::template::{Template, TemplateType};
use std::sync::Arc;
use tokio::sync::mpsc;

const BOUNDARY: &str = "test-boundary-7d1f";

fn test_config(dir: &tempfile::TempDir) -> AppConfig {
    let storage_root = dir.path().join("data");
    std::fs::create_dir_all(&storage_root).unwrap();
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_path: storage_root.join("test.sqlite"),
        converter_bin: "unused".to_string(),
        storage_root,
    }
}

fn seed_template(config: &AppConfig, owner: &str) {
    let now = Utc::now();
    let template = Template {
        id: "tmpl-1".to_string(),
        owner_id: owner.to_string(),
        name: "Course certificate".to_string(),
        description: None,
        template_type: TemplateType::Docx,
        file_path: config
            .templates_dir()
            .join("tmpl-1.docx")
            .to_string_lossy()
            .into_owned(),
        placeholders: vec!["recipient_name".to_string()],
        created_at: now,
        updated_at: now,
    };
    let conn = db::open(config).unwrap();
    db::templates::insert(&conn, &template).unwrap();
}

fn multipart_body(json: &str, filename: &str, file_content: &str) -> String {
    format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"json\"\r\n\r\n\
         {json}\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {file_content}\r\n\
         --{b}--\r\n",
        b = BOUNDARY,
        json = json,
        filename = filename,
        file_content = file_content,
    )
}

async fn post_generate(
    config: &AppConfig,
    body: String,
) -> actix_web::dev::ServiceResponse {
    let (tx, _rx) = mpsc::channel(8);
    let progress = ProgressState { tx };
    let converter: Arc<dyn DocumentConverter> =
        Arc::new(LibreOfficeConverter::new(config.converter_bin.clone()));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(progress))
            .app_data(web::Data::new(converter))
            .service(services::batches::configure_routes()),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/batches/generate")
        .insert_header(("X-User-Id", "alice"))
        .insert_header((
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(body)
        .to_request();
    test::call_service(&app, req).await
}

fn no_batches_and_no_uploads(config: &AppConfig) {
    let conn = db::open(config).unwrap();
    assert!(db::batches::list_for_owner(&conn, "alice").unwrap().is_empty());

    let leftover_uploads = std::fs::read_dir(config.datasets_dir())
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftover_uploads, 0);
}

#[actix_web::test]
async fn header_only_dataset_is_rejected_before_batch_creation() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    db::init_schema(&config).unwrap();
    seed_template(&config, "alice");

    let body = multipart_body(
        r#"{"template_id":"tmpl-1","mappings":{"Name":"recipient_name"}}"#,
        "recipients.csv",
        "Name,Course",
    );
    let resp = post_generate(&config, body).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    no_batches_and_no_uploads(&config);
}

#[actix_web::test]
async fn unknown_template_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    db::init_schema(&config).unwrap();

    let body = multipart_body(
        r#"{"template_id":"no-such-template","mappings":{}}"#,
        "recipients.csv",
        "Name\nAda",
    );
    let resp = post_generate(&config, body).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    no_batches_and_no_uploads(&config);
}

#[actix_web::test]
async fn foreign_template_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    db::init_schema(&config).unwrap();
    seed_template(&config, "someone-else");

    let body = multipart_body(
        r#"{"template_id":"tmpl-1","mappings":{}}"#,
        "recipients.csv",
        "Name\nAda",
    );
    let resp = post_generate(&config, body).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    no_batches_and_no_uploads(&config);
}

#[actix_web::test]
async fn unparseable_mapping_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    db::init_schema(&config).unwrap();
    seed_template(&config, "alice");

    let body = multipart_body(
        r#"{"template_id":"tmpl-1","mappings":"not an object"}"#,
        "recipients.csv",
        "Name\nAda",
    );
    let resp = post_generate(&config, body).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    no_batches_and_no_uploads(&config);
}

#[actix_web::test]
async fn unsupported_dataset_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    db::init_schema(&config).unwrap();
    seed_template(&config, "alice");

    let body = multipart_body(
        r#"{"template_id":"tmpl-1","mappings":{}}"#,
        "recipients.exe",
        "Name\nAda",
    );
    let resp = post_generate(&config, body).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    no_batches_and_no_uploads(&config);
}
