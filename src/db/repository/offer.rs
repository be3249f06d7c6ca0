use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::{format_timestamp, from_json, parse_timestamp, parse_uuid, to_json, DatabaseError};
use crate::models::enums::{OfferInputType, OfferStatus};
use crate::models::Offer;

pub fn insert_offer(conn: &Connection, offer: &Offer) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO offers (id, workspace_id, user_id, name, status, input_type, input_value,
         analysis, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            offer.id.to_string(),
            offer.workspace_id.to_string(),
            offer.user_id.to_string(),
            offer.name,
            offer.status.as_str(),
            offer.input_type.as_str(),
            offer.input_value,
            to_json("analysis", &offer.analysis)?,
            format_timestamp(&offer.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_offer(conn: &Connection, id: &Uuid) -> Result<Option<Offer>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, workspace_id, user_id, name, status, input_type, input_value, analysis,
         created_at FROM offers WHERE id = ?1",
        params![id.to_string()],
        offer_row_from_rusqlite,
    );

    match result {
        Ok(row) => Ok(Some(offer_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_offers(conn: &Connection, workspace_id: &Uuid) -> Result<Vec<Offer>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, workspace_id, user_id, name, status, input_type, input_value, analysis,
         created_at FROM offers WHERE workspace_id = ?1 ORDER BY created_at DESC, rowid DESC",
    )?;
    let rows = stmt.query_map(params![workspace_id.to_string()], offer_row_from_rusqlite)?;

    let mut offers = Vec::new();
    for row in rows {
        offers.push(offer_from_row(row?)?);
    }
    Ok(offers)
}

struct OfferRow {
    id: String,
    workspace_id: String,
    user_id: String,
    name: String,
    status: String,
    input_type: String,
    input_value: String,
    analysis: String,
    created_at: String,
}

fn offer_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<OfferRow, rusqlite::Error> {
    Ok(OfferRow {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        user_id: row.get(2)?,
        name: row.get(3)?,
        status: row.get(4)?,
        input_type: row.get(5)?,
        input_value: row.get(6)?,
        analysis: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn offer_from_row(row: OfferRow) -> Result<Offer, DatabaseError> {
    Ok(Offer {
        id: parse_uuid(&row.id)?,
        workspace_id: parse_uuid(&row.workspace_id)?,
        user_id: parse_uuid(&row.user_id)?,
        name: row.name,
        status: OfferStatus::from_str(&row.status)?,
        input_type: OfferInputType::from_str(&row.input_type)?,
        input_value: row.input_value,
        analysis: from_json("analysis", &row.analysis)?,
        created_at: parse_timestamp(&row.created_at),
    })
}
