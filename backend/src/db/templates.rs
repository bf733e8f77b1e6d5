use common::model::template::{Template, TemplateType};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub fn insert(conn: &Connection, template: &Template) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO templates
            (id, owner_id, name, description, template_type, file_path,
             placeholders, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            template.id,
            template.owner_id,
            template.name,
            template.description,
            template.template_type.as_str(),
            template.file_path,
            serde_json::to_string(&template.placeholders)
                .unwrap_or_else(|_| "[]".to_string()),
            template.created_at,
            template.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<Template>, rusqlite::Error> {
    conn.query_row(
        "SELECT id, owner_id, name, description, template_type, file_path,
                placeholders, created_at, updated_at
         FROM templates WHERE id = ?1",
        params![id],
        from_row,
    )
    .optional()
}

pub fn list_for_owner(
    conn: &Connection,
    owner_id: &str,
) -> Result<Vec<Template>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, name, description, template_type, file_path,
                placeholders, created_at, updated_at
         FROM templates WHERE owner_id = ?1 ORDER BY created_at DESC",
    )?;
    let templates = stmt
        .query_map(params![owner_id], from_row)?
        .filter_map(Result::ok)
        .collect();
    Ok(templates)
}

pub fn delete(conn: &Connection, id: &str) -> Result<usize, rusqlite::Error> {
    conn.execute("DELETE FROM templates WHERE id = ?1", params![id])
}

fn from_row(row: &Row) -> rusqlite::Result<Template> {
    let type_str: String = row.get(4)?;
    let template_type = TemplateType::parse(&type_str)
        .ok_or_else(|| super::column_parse_error(4, &type_str))?;
    let placeholders_json: String = row.get(6)?;

    Ok(Template {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        template_type,
        file_path: row.get(5)?,
        placeholders: serde_json::from_str(&placeholders_json).unwrap_or_default(),
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
