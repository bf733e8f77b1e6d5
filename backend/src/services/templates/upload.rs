use crate::auth::{self, Identity};
use crate::config::AppConfig;
use crate::db;
use crate::services::multipart::read_upload_form;
use actix_multipart::Multipart;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use chrono::Utc;
use common::model::template::Template;
use common::requests::TemplateUpload;
use std::fs;
use uuid::Uuid;

pub(crate) async fn process(
    req: HttpRequest,
    config: web::Data<AppConfig>,
    payload: Multipart,
) -> Result<HttpResponse, Error> {
    let identity = auth::identify(&req)?;
    Ok(match save_template(identity, &config, payload).await {
        Ok(template) => HttpResponse::Created().json(template),
        Err(e) => HttpResponse::BadRequest().body(e),
    })
}

async fn save_template(
    identity: Identity,
    config: &AppConfig,
    payload: Multipart,
) -> Result<Template, String> {
    let id = Uuid::new_v4().to_string();
    let form = read_upload_form::<TemplateUpload>(
        payload,
        &config.templates_dir(),
        &id,
        &["docx", "pptx"],
    )
    .await?;

    let discard_upload = |message: String| {
        let _ = fs::remove_file(&form.file_path);
        message
    };

    if form.meta.name.trim().is_empty() {
        return Err(discard_upload("Template name must not be empty".to_string()));
    }
    let uploaded_extension = form
        .file_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    if uploaded_extension != form.meta.template_type.extension() {
        return Err(discard_upload(format!(
            "Uploaded '.{}' file does not match declared template type '{}'",
            uploaded_extension,
            form.meta.template_type.as_str()
        )));
    }

    let now = Utc::now();
    let template = Template {
        id,
        owner_id: identity.0,
        name: form.meta.name.trim().to_string(),
        description: form.meta.description,
        template_type: form.meta.template_type,
        file_path: form.file_path.to_string_lossy().into_owned(),
        placeholders: form.meta.placeholders,
        created_at: now,
        updated_at: now,
    };

    let conn = db::open(config).map_err(|e| discard_upload(e.to_string()))?;
    db::templates::insert(&conn, &template).map_err(|e| discard_upload(e.to_string()))?;
    Ok(template)
}
