use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::{format_timestamp, from_json, parse_timestamp, parse_uuid, to_json, DatabaseError};
use crate::models::OfferContext;

/// Insert, or update every editable column when the id already exists.
/// `created_at` of an existing row is preserved.
pub fn upsert_offer_context(conn: &Connection, ctx: &OfferContext) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO offer_contexts (id, workspace_id, product_name, category, target_audience,
         main_problem, key_features, price_point, geographic_focus, usp, additional_context,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
         ON CONFLICT(id) DO UPDATE SET
            product_name = excluded.product_name,
            category = excluded.category,
            target_audience = excluded.target_audience,
            main_problem = excluded.main_problem,
            key_features = excluded.key_features,
            price_point = excluded.price_point,
            geographic_focus = excluded.geographic_focus,
            usp = excluded.usp,
            additional_context = excluded.additional_context,
            updated_at = excluded.updated_at",
        params![
            ctx.id.to_string(),
            ctx.workspace_id.to_string(),
            ctx.product_name,
            ctx.category,
            ctx.target_audience,
            ctx.main_problem,
            to_json("key_features", &ctx.key_features)?,
            ctx.price_point,
            ctx.geographic_focus,
            ctx.usp,
            ctx.additional_context,
            format_timestamp(&ctx.created_at),
            format_timestamp(&ctx.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_offer_context(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<OfferContext>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, workspace_id, product_name, category, target_audience, main_problem,
         key_features, price_point, geographic_focus, usp, additional_context, created_at,
         updated_at FROM offer_contexts WHERE id = ?1",
        params![id.to_string()],
        context_row_from_rusqlite,
    );

    match result {
        Ok(row) => Ok(Some(context_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Offer contexts of a workspace, newest first.
pub fn list_offer_contexts(
    conn: &Connection,
    workspace_id: &Uuid,
) -> Result<Vec<OfferContext>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, workspace_id, product_name, category, target_audience, main_problem,
         key_features, price_point, geographic_focus, usp, additional_context, created_at,
         updated_at FROM offer_contexts WHERE workspace_id = ?1
         ORDER BY created_at DESC, rowid DESC",
    )?;
    let rows = stmt.query_map(params![workspace_id.to_string()], context_row_from_rusqlite)?;

    let mut contexts = Vec::new();
    for row in rows {
        contexts.push(context_from_row(row?)?);
    }
    Ok(contexts)
}

/// Returns false when no row matched.
pub fn delete_offer_context(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let n = conn.execute(
        "DELETE FROM offer_contexts WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(n > 0)
}

struct OfferContextRow {
    id: String,
    workspace_id: String,
    product_name: String,
    category: String,
    target_audience: String,
    main_problem: String,
    key_features: String,
    price_point: String,
    geographic_focus: String,
    usp: String,
    additional_context: Option<String>,
    created_at: String,
    updated_at: String,
}

fn context_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<OfferContextRow, rusqlite::Error> {
    Ok(OfferContextRow {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        product_name: row.get(2)?,
        category: row.get(3)?,
        target_audience: row.get(4)?,
        main_problem: row.get(5)?,
        key_features: row.get(6)?,
        price_point: row.get(7)?,
        geographic_focus: row.get(8)?,
        usp: row.get(9)?,
        additional_context: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn context_from_row(row: OfferContextRow) -> Result<OfferContext, DatabaseError> {
    Ok(OfferContext {
        id: parse_uuid(&row.id)?,
        workspace_id: parse_uuid(&row.workspace_id)?,
        product_name: row.product_name,
        category: row.category,
        target_audience: row.target_audience,
        main_problem: row.main_problem,
        key_features: from_json("key_features", &row.key_features)?,
        price_point: row.price_point,
        geographic_focus: row.geographic_focus,
        usp: row.usp,
        additional_context: row.additional_context,
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    })
}
