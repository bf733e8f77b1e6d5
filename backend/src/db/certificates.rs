use common::model::certificate::{Certificate, CertificateStatus};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub fn insert(conn: &Connection, certificate: &Certificate) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO certificates
            (id, owner_id, batch_id, recipient_name, row_data, status,
             pdf_path, error, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            certificate.id,
            certificate.owner_id,
            certificate.batch_id,
            certificate.recipient_name,
            serde_json::to_string(&certificate.row_data)
                .unwrap_or_else(|_| "{}".to_string()),
            certificate.status.as_str(),
            certificate.pdf_path,
            certificate.error,
            certificate.created_at,
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<Certificate>, rusqlite::Error> {
    conn.query_row(
        "SELECT id, owner_id, batch_id, recipient_name, row_data, status,
                pdf_path, error, created_at
         FROM certificates WHERE id = ?1",
        params![id],
        from_row,
    )
    .optional()
}

/// Certificates of one batch in row order (they are inserted in row
/// order and ids are opaque, so creation time is the order).
pub fn list_for_batch(
    conn: &Connection,
    batch_id: &str,
) -> Result<Vec<Certificate>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, batch_id, recipient_name, row_data, status,
                pdf_path, error, created_at
         FROM certificates WHERE batch_id = ?1 ORDER BY rowid",
    )?;
    let certificates = stmt
        .query_map(params![batch_id], from_row)?
        .filter_map(Result::ok)
        .collect();
    Ok(certificates)
}

fn from_row(row: &Row) -> rusqlite::Result<Certificate> {
    let status_str: String = row.get(5)?;
    let status = CertificateStatus::parse(&status_str)
        .ok_or_else(|| super::column_parse_error(5, &status_str))?;
    let row_data_json: String = row.get(4)?;

    Ok(Certificate {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        batch_id: row.get(2)?,
        recipient_name: row.get(3)?,
        row_data: serde_json::from_str(&row_data_json).unwrap_or_default(),
        status,
        pdf_path: row.get(6)?,
        error: row.get(7)?,
        created_at: row.get(8)?,
    })
}
