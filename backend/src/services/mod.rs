pub mod batches;
pub mod certificates;
pub mod multipart;
pub mod templates;
