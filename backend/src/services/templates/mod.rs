//! Template management endpoints.
//!
//! Templates are uploaded as multipart forms (a `json` metadata field
//! with the display name, type and declared placeholders, then the
//! DOCX/PPTX `file` itself), listed and fetched per owner, and deleted
//! together with their backing file.

mod delete;
mod get;
mod list;
mod upload;

use actix_web::{web, Scope};

const API_PATH: &str = "/api/templates";

/// Configures and returns the Actix `Scope` for template routes.
pub fn configure_routes() -> Scope {
    web::scope(API_PATH)
        .route("", web::post().to(upload::process))
        .route("", web::get().to(list::process))
        .route("/{template_id}", web::get().to(get::process))
        .route("/{template_id}", web::delete().to(delete::process))
}
