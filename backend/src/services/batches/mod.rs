//! Batch generation endpoints.
//!
//! `POST /generate` accepts a template reference, a spreadsheet and a
//! column → placeholder mapping, creates a batch and answers `202
//! Accepted` before any row is processed. Everything after that is
//! observable only through the polling endpoints: `/status` for the
//! counters, `/details` for per-certificate results, `/download` for the
//! finished archive.

mod details;
mod download;
mod list;
pub mod start;
mod status;

use actix_web::{web, Scope};

const API_PATH: &str = "/api/batches";

/// Configures and returns the Actix `Scope` for batch routes.
pub fn configure_routes() -> Scope {
    web::scope(API_PATH)
        .route("", web::get().to(list::process))
        .route("/generate", web::post().to(start::process))
        .route("/{batch_id}/status", web::get().to(status::process))
        .route("/{batch_id}/details", web::get().to(details::process))
        .route("/{batch_id}/download", web::get().to(download::process))
}
