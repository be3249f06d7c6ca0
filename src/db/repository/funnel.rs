use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::{format_timestamp, from_json, parse_timestamp, parse_uuid, to_json, DatabaseError};
use crate::models::enums::{FunnelPageType, FunnelStatus};
use crate::models::{Funnel, FunnelPage};

/// Insert a funnel together with its pages in one transaction.
pub fn insert_funnel_with_pages(
    conn: &Connection,
    funnel: &Funnel,
    pages: &[FunnelPage],
) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    insert_funnel(&tx, funnel)?;
    for page in pages {
        insert_funnel_page(&tx, page)?;
    }
    tx.commit()?;
    Ok(())
}

pub fn insert_funnel(conn: &Connection, funnel: &Funnel) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO funnels (id, workspace_id, offer_id, user_id, name, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            funnel.id.to_string(),
            funnel.workspace_id.to_string(),
            funnel.offer_id.to_string(),
            funnel.user_id.to_string(),
            funnel.name,
            funnel.status.as_str(),
            format_timestamp(&funnel.created_at),
        ],
    )?;
    Ok(())
}

pub fn insert_funnel_page(conn: &Connection, page: &FunnelPage) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO funnel_pages (id, funnel_id, name, slug, page_type, order_index, blocks,
         copy_data, seo)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            page.id.to_string(),
            page.funnel_id.to_string(),
            page.name,
            page.slug,
            page.page_type.as_str(),
            page.order_index,
            to_json("blocks", &page.blocks)?,
            to_json("copy_data", &page.copy_data)?,
            to_json("seo", &page.seo)?,
        ],
    )?;
    Ok(())
}

pub fn get_funnel(conn: &Connection, id: &Uuid) -> Result<Option<Funnel>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, workspace_id, offer_id, user_id, name, status, created_at
         FROM funnels WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        },
    );

    match result {
        Ok((id, workspace_id, offer_id, user_id, name, status, created_at)) => Ok(Some(Funnel {
            id: parse_uuid(&id)?,
            workspace_id: parse_uuid(&workspace_id)?,
            offer_id: parse_uuid(&offer_id)?,
            user_id: parse_uuid(&user_id)?,
            name,
            status: FunnelStatus::from_str(&status)?,
            created_at: parse_timestamp(&created_at),
        })),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Pages of a funnel ordered by `order_index`.
pub fn get_funnel_pages(
    conn: &Connection,
    funnel_id: &Uuid,
) -> Result<Vec<FunnelPage>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, funnel_id, name, slug, page_type, order_index, blocks, copy_data, seo
         FROM funnel_pages WHERE funnel_id = ?1 ORDER BY order_index ASC",
    )?;

    let rows = stmt.query_map(params![funnel_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, i64>(5)?,
            row.get::<_, String>(6)?,
            row.get::<_, String>(7)?,
            row.get::<_, String>(8)?,
        ))
    })?;

    let mut pages = Vec::new();
    for row in rows {
        let (id, funnel_id, name, slug, page_type, order_index, blocks, copy_data, seo) = row?;
        pages.push(FunnelPage {
            id: parse_uuid(&id)?,
            funnel_id: parse_uuid(&funnel_id)?,
            name,
            slug,
            page_type: FunnelPageType::from_str(&page_type)?,
            order_index,
            blocks: from_json("blocks", &blocks)?,
            copy_data: from_json("copy_data", &copy_data)?,
            seo: from_json("seo", &seo)?,
        });
    }
    Ok(pages)
}
