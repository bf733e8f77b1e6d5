use chrono::Utc;
use common::model::batch::{Batch, BatchStatus};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub fn insert(conn: &Connection, batch: &Batch) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO batches
            (id, owner_id, template_id, name, status, total_certificates,
             processed_certificates, generated_certificates, mappings,
             zip_path, error, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            batch.id,
            batch.owner_id,
            batch.template_id,
            batch.name,
            batch.status.as_str(),
            batch.total_certificates,
            batch.processed_certificates,
            batch.generated_certificates,
            serde_json::to_string(&batch.mappings).unwrap_or_else(|_| "{}".to_string()),
            batch.zip_path,
            batch.error,
            batch.created_at,
            batch.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<Batch>, rusqlite::Error> {
    conn.query_row(
        "SELECT id, owner_id, template_id, name, status, total_certificates,
                processed_certificates, generated_certificates, mappings,
                zip_path, error, created_at, updated_at
         FROM batches WHERE id = ?1",
        params![id],
        from_row,
    )
    .optional()
}

pub fn list_for_owner(conn: &Connection, owner_id: &str) -> Result<Vec<Batch>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, template_id, name, status, total_certificates,
                processed_certificates, generated_certificates, mappings,
                zip_path, error, created_at, updated_at
         FROM batches WHERE owner_id = ?1 ORDER BY created_at DESC",
    )?;
    let batches = stmt
        .query_map(params![owner_id], from_row)?
        .filter_map(Result::ok)
        .collect();
    Ok(batches)
}

/// Move a pending batch into processing. A batch already past pending is
/// left untouched; status never moves backward.
pub fn mark_processing(conn: &Connection, id: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "UPDATE batches SET status = 'processing', updated_at = ?2
         WHERE id = ?1 AND status = 'pending'",
        params![id, Utc::now()],
    )?;
    Ok(())
}

/// Persist the running counters after a row has been attempted.
pub fn record_progress(
    conn: &Connection,
    id: &str,
    processed: u32,
    generated: u32,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "UPDATE batches
         SET processed_certificates = ?2, generated_certificates = ?3,
             updated_at = ?4
         WHERE id = ?1 AND status = 'processing'",
        params![id, processed, generated, Utc::now()],
    )?;
    Ok(())
}

pub fn mark_completed(conn: &Connection, id: &str, zip_path: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "UPDATE batches SET status = 'completed', zip_path = ?2, updated_at = ?3
         WHERE id = ?1 AND status IN ('pending', 'processing')",
        params![id, zip_path, Utc::now()],
    )?;
    Ok(())
}

pub fn mark_failed(conn: &Connection, id: &str, error: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "UPDATE batches SET status = 'failed', error = ?2, updated_at = ?3
         WHERE id = ?1 AND status IN ('pending', 'processing')",
        params![id, error, Utc::now()],
    )?;
    Ok(())
}

fn from_row(row: &Row) -> rusqlite::Result<Batch> {
    let status_str: String = row.get(4)?;
    let status = BatchStatus::parse(&status_str)
        .ok_or_else(|| super::column_parse_error(4, &status_str))?;
    let mappings_json: String = row.get(8)?;

    Ok(Batch {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        template_id: row.get(2)?,
        name: row.get(3)?,
        status,
        total_certificates: row.get(5)?,
        processed_certificates: row.get(6)?,
        generated_certificates: row.get(7)?,
        mappings: serde_json::from_str(&mappings_json).unwrap_or_default(),
        zip_path: row.get(9)?,
        error: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}
