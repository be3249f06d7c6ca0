use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::{
    format_timestamp, from_json, now_timestamp, parse_timestamp, parse_uuid, to_json,
    DatabaseError,
};
use crate::models::enums::ReportStatus;
use crate::models::{ReportMetadata, ReportVersion, SalesReport};

const SELECT_COLUMNS: &str = "SELECT id, workspace_id, offer_id, title, status, content, metadata,
    version, created_at, updated_at FROM sales_reports";

pub fn insert_sales_report(conn: &Connection, report: &SalesReport) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO sales_reports (id, workspace_id, offer_id, title, status, content, metadata,
         version, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            report.id.to_string(),
            report.workspace_id.to_string(),
            report.offer_id.to_string(),
            report.title,
            report.status.as_str(),
            report.content,
            to_json("metadata", &report.metadata)?,
            report.version,
            format_timestamp(&report.created_at),
            format_timestamp(&report.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_sales_report(conn: &Connection, id: &Uuid) -> Result<Option<SalesReport>, DatabaseError> {
    let result = conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE id = ?1"),
        params![id.to_string()],
        report_row_from_rusqlite,
    );

    match result {
        Ok(row) => Ok(Some(report_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Reports of a workspace, newest first.
pub fn list_sales_reports(
    conn: &Connection,
    workspace_id: &Uuid,
) -> Result<Vec<SalesReport>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} WHERE workspace_id = ?1 ORDER BY created_at DESC, rowid DESC"
    ))?;
    let rows = stmt.query_map(params![workspace_id.to_string()], report_row_from_rusqlite)?;

    let mut reports = Vec::new();
    for row in rows {
        reports.push(report_from_row(row?)?);
    }
    Ok(reports)
}

pub fn update_report_status(
    conn: &Connection,
    id: &Uuid,
    status: ReportStatus,
) -> Result<(), DatabaseError> {
    let n = conn.execute(
        "UPDATE sales_reports SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), format_timestamp(&now_timestamp()), id.to_string()],
    )?;
    ensure_updated(n, id)
}

pub fn update_report_content(
    conn: &Connection,
    id: &Uuid,
    content: &str,
) -> Result<(), DatabaseError> {
    let n = conn.execute(
        "UPDATE sales_reports SET content = ?1, updated_at = ?2 WHERE id = ?3",
        params![content, format_timestamp(&now_timestamp()), id.to_string()],
    )?;
    ensure_updated(n, id)
}

/// Replace content and section metadata, leaving status untouched.
pub fn update_report_document(
    conn: &Connection,
    id: &Uuid,
    content: &str,
    metadata: &ReportMetadata,
) -> Result<(), DatabaseError> {
    let n = conn.execute(
        "UPDATE sales_reports SET content = ?1, metadata = ?2, updated_at = ?3 WHERE id = ?4",
        params![
            content,
            to_json("metadata", metadata)?,
            format_timestamp(&now_timestamp()),
            id.to_string(),
        ],
    )?;
    ensure_updated(n, id)
}

/// Store a freshly generated document: content, metadata, status `complete`,
/// plus a snapshot row at the report's current version.
pub fn save_generated_report(
    conn: &Connection,
    id: &Uuid,
    content: &str,
    metadata: &ReportMetadata,
) -> Result<ReportVersion, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let n = tx.execute(
        "UPDATE sales_reports SET content = ?1, metadata = ?2, status = 'complete', updated_at = ?3
         WHERE id = ?4",
        params![
            content,
            to_json("metadata", metadata)?,
            format_timestamp(&now_timestamp()),
            id.to_string(),
        ],
    )?;
    ensure_updated(n, id)?;

    let version: i64 = tx.query_row(
        "SELECT version FROM sales_reports WHERE id = ?1",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    let snapshot = ReportVersion {
        id: Uuid::new_v4(),
        report_id: *id,
        version,
        content: content.to_string(),
        created_at: now_timestamp(),
    };
    insert_report_version(&tx, &snapshot)?;
    tx.commit()?;
    Ok(snapshot)
}

/// Snapshot the current content at the current version, then increment the
/// report's version. Returns the new version number.
pub fn create_report_version(conn: &Connection, id: &Uuid) -> Result<i64, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let (version, content): (i64, String) = match tx.query_row(
        "SELECT version, content FROM sales_reports WHERE id = ?1",
        params![id.to_string()],
        |row| Ok((row.get(0)?, row.get(1)?)),
    ) {
        Ok(v) => v,
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            return Err(DatabaseError::NotFound {
                entity_type: "SalesReport".into(),
                id: id.to_string(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    insert_report_version(
        &tx,
        &ReportVersion {
            id: Uuid::new_v4(),
            report_id: *id,
            version,
            content,
            created_at: now_timestamp(),
        },
    )?;
    tx.execute(
        "UPDATE sales_reports SET version = version + 1, updated_at = ?1 WHERE id = ?2",
        params![format_timestamp(&now_timestamp()), id.to_string()],
    )?;
    tx.commit()?;
    Ok(version + 1)
}

pub fn insert_report_version(conn: &Connection, v: &ReportVersion) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO report_versions (id, report_id, version, content, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            v.id.to_string(),
            v.report_id.to_string(),
            v.version,
            v.content,
            format_timestamp(&v.created_at),
        ],
    )?;
    Ok(())
}

/// Version snapshots of a report, newest first.
pub fn list_report_versions(
    conn: &Connection,
    report_id: &Uuid,
) -> Result<Vec<ReportVersion>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, report_id, version, content, created_at FROM report_versions
         WHERE report_id = ?1 ORDER BY version DESC, created_at DESC, rowid DESC",
    )?;
    let rows = stmt.query_map(params![report_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut versions = Vec::new();
    for row in rows {
        let (id, report_id, version, content, created_at) = row?;
        versions.push(ReportVersion {
            id: parse_uuid(&id)?,
            report_id: parse_uuid(&report_id)?,
            version,
            content,
            created_at: parse_timestamp(&created_at),
        });
    }
    Ok(versions)
}

/// Move every report in `from` to `to`. Returns the number of rows changed.
pub fn reset_report_status(
    conn: &Connection,
    from: ReportStatus,
    to: ReportStatus,
) -> Result<usize, DatabaseError> {
    let n = conn.execute(
        "UPDATE sales_reports SET status = ?1, updated_at = ?2 WHERE status = ?3",
        params![to.as_str(), format_timestamp(&now_timestamp()), from.as_str()],
    )?;
    Ok(n)
}

pub fn delete_sales_report(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let n = conn.execute("DELETE FROM sales_reports WHERE id = ?1", params![id.to_string()])?;
    Ok(n > 0)
}

fn ensure_updated(rows: usize, id: &Uuid) -> Result<(), DatabaseError> {
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "SalesReport".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

struct SalesReportRow {
    id: String,
    workspace_id: String,
    offer_id: String,
    title: String,
    status: String,
    content: String,
    metadata: String,
    version: i64,
    created_at: String,
    updated_at: String,
}

fn report_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<SalesReportRow, rusqlite::Error> {
    Ok(SalesReportRow {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        offer_id: row.get(2)?,
        title: row.get(3)?,
        status: row.get(4)?,
        content: row.get(5)?,
        metadata: row.get(6)?,
        version: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn report_from_row(row: SalesReportRow) -> Result<SalesReport, DatabaseError> {
    Ok(SalesReport {
        id: parse_uuid(&row.id)?,
        workspace_id: parse_uuid(&row.workspace_id)?,
        offer_id: parse_uuid(&row.offer_id)?,
        title: row.title,
        status: ReportStatus::from_str(&row.status)?,
        content: row.content,
        metadata: from_json("metadata", &row.metadata)?,
        version: row.version,
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    })
}
