use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::{
    format_timestamp, from_json, now_timestamp, parse_timestamp, parse_uuid, to_json,
    DatabaseError,
};
use crate::models::enums::ExtractionStatus;
use crate::models::{FileMetadata, OfferFile};

const SELECT_COLUMNS: &str = "SELECT id, workspace_id, offer_id, file_name, file_type, file_size,
    storage_path, extraction_status, extracted_content, summary, metadata, created_at, updated_at
    FROM offer_files";

pub fn insert_offer_file(conn: &Connection, file: &OfferFile) -> Result<(), DatabaseError> {
    let metadata = file
        .metadata
        .as_ref()
        .map(|m| to_json("metadata", m))
        .transpose()?;

    conn.execute(
        "INSERT INTO offer_files (id, workspace_id, offer_id, file_name, file_type, file_size,
         storage_path, extraction_status, extracted_content, summary, metadata, created_at,
         updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            file.id.to_string(),
            file.workspace_id.to_string(),
            file.offer_id.to_string(),
            file.file_name,
            file.file_type,
            file.file_size,
            file.storage_path,
            file.extraction_status.as_str(),
            file.extracted_content,
            file.summary,
            metadata,
            format_timestamp(&file.created_at),
            format_timestamp(&file.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_offer_file(conn: &Connection, id: &Uuid) -> Result<Option<OfferFile>, DatabaseError> {
    let result = conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE id = ?1"),
        params![id.to_string()],
        file_row_from_rusqlite,
    );

    match result {
        Ok(row) => Ok(Some(file_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Files attached to an offer context, newest first.
pub fn list_offer_files(conn: &Connection, offer_id: &Uuid) -> Result<Vec<OfferFile>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} WHERE offer_id = ?1 ORDER BY created_at DESC, rowid DESC"
    ))?;
    let rows = stmt.query_map(params![offer_id.to_string()], file_row_from_rusqlite)?;

    let mut files = Vec::new();
    for row in rows {
        files.push(file_from_row(row?)?);
    }
    Ok(files)
}

/// Non-empty summaries of completed extractions for an offer, oldest upload first.
pub fn list_completed_summaries(
    conn: &Connection,
    offer_id: &Uuid,
) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT summary FROM offer_files
         WHERE offer_id = ?1 AND extraction_status = 'complete'
           AND summary IS NOT NULL AND summary != ''
         ORDER BY created_at ASC, rowid ASC",
    )?;
    let rows = stmt.query_map(params![offer_id.to_string()], |row| row.get::<_, String>(0))?;

    let mut summaries = Vec::new();
    for row in rows {
        summaries.push(row?);
    }
    Ok(summaries)
}

pub fn list_file_ids_by_status(
    conn: &Connection,
    status: ExtractionStatus,
) -> Result<Vec<Uuid>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id FROM offer_files WHERE extraction_status = ?1 ORDER BY created_at ASC, rowid ASC",
    )?;
    let rows = stmt.query_map(params![status.as_str()], |row| row.get::<_, String>(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(parse_uuid(&row?)?);
    }
    Ok(ids)
}

pub fn update_extraction_status(
    conn: &Connection,
    id: &Uuid,
    status: ExtractionStatus,
) -> Result<(), DatabaseError> {
    let n = conn.execute(
        "UPDATE offer_files SET extraction_status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), format_timestamp(&now_timestamp()), id.to_string()],
    )?;
    if n == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "OfferFile".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Record a finished extraction and mark the file complete.
pub fn complete_extraction(
    conn: &Connection,
    id: &Uuid,
    extracted_content: &str,
    summary: &str,
    metadata: &FileMetadata,
) -> Result<(), DatabaseError> {
    let n = conn.execute(
        "UPDATE offer_files SET extraction_status = 'complete', extracted_content = ?1,
         summary = ?2, metadata = ?3, updated_at = ?4 WHERE id = ?5",
        params![
            extracted_content,
            summary,
            to_json("metadata", metadata)?,
            format_timestamp(&now_timestamp()),
            id.to_string(),
        ],
    )?;
    if n == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "OfferFile".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Move every file in `from` to `to`. Returns the number of rows changed.
pub fn reset_extraction_status(
    conn: &Connection,
    from: ExtractionStatus,
    to: ExtractionStatus,
) -> Result<usize, DatabaseError> {
    let n = conn.execute(
        "UPDATE offer_files SET extraction_status = ?1, updated_at = ?2
         WHERE extraction_status = ?3",
        params![to.as_str(), format_timestamp(&now_timestamp()), from.as_str()],
    )?;
    Ok(n)
}

pub fn delete_offer_file(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let n = conn.execute("DELETE FROM offer_files WHERE id = ?1", params![id.to_string()])?;
    Ok(n > 0)
}

struct OfferFileRow {
    id: String,
    workspace_id: String,
    offer_id: String,
    file_name: String,
    file_type: String,
    file_size: i64,
    storage_path: String,
    extraction_status: String,
    extracted_content: Option<String>,
    summary: Option<String>,
    metadata: Option<String>,
    created_at: String,
    updated_at: String,
}

fn file_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<OfferFileRow, rusqlite::Error> {
    Ok(OfferFileRow {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        offer_id: row.get(2)?,
        file_name: row.get(3)?,
        file_type: row.get(4)?,
        file_size: row.get(5)?,
        storage_path: row.get(6)?,
        extraction_status: row.get(7)?,
        extracted_content: row.get(8)?,
        summary: row.get(9)?,
        metadata: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn file_from_row(row: OfferFileRow) -> Result<OfferFile, DatabaseError> {
    Ok(OfferFile {
        id: parse_uuid(&row.id)?,
        workspace_id: parse_uuid(&row.workspace_id)?,
        offer_id: parse_uuid(&row.offer_id)?,
        file_name: row.file_name,
        file_type: row.file_type,
        file_size: row.file_size,
        storage_path: row.storage_path,
        extraction_status: ExtractionStatus::from_str(&row.extraction_status)?,
        extracted_content: row.extracted_content,
        summary: row.summary,
        metadata: row
            .metadata
            .as_deref()
            .map(|m| from_json("metadata", m))
            .transpose()?,
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    })
}
