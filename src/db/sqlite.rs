use std::path::Path;

use rusqlite::Connection;

use super::DatabaseError;

/// Embedded schema migrations, in application order.
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../../resources/migrations/001_initial.sql"))];

/// Open the application database at `path`, creating and migrating it as needed.
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    prepare(Connection::open(path)?)
}

/// Open an in-memory database (for testing)
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    prepare(Connection::open_in_memory()?)
}

fn prepare(conn: Connection) -> Result<Connection, DatabaseError> {
    // Upload handlers and the extraction worker write concurrently
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA foreign_keys=ON;",
    )?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Apply every migration newer than the recorded schema version.
///
/// Each migration runs in its own transaction, so a failure leaves the
/// schema at the last good version.
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let applied = schema_version(conn);

    for &(version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > applied) {
        tracing::info!(version, "Applying database migration");
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql)
            .and_then(|_| tx.commit())
            .map_err(|e| DatabaseError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
    }

    Ok(())
}

/// Highest applied migration, 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> i64 {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, Option<i64>>(0)
    })
    .ok()
    .flatten()
    .unwrap_or(0)
}

/// Count tables in the database (for verification)
pub fn count_tables(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_has_every_table() {
        let conn = open_memory_database().unwrap();
        // 9 entity tables + schema_version
        assert_eq!(count_tables(&conn).unwrap(), 10);
        assert_eq!(schema_version(&conn), MIGRATIONS.len() as i64);
    }

    #[test]
    fn rerunning_migrations_is_a_no_op() {
        let conn = open_memory_database().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(count_tables(&conn).unwrap(), 10);
    }

    #[test]
    fn foreign_keys_cascade_from_users() {
        let conn = open_memory_database().unwrap();
        conn.execute_batch(
            "INSERT INTO users (id, email, name, token_hash, created_at)
                 VALUES ('u1', 'a@b.c', 'A', x'00', '2024-01-01 00:00:00.000000');
             INSERT INTO workspaces (id, user_id, name, created_at)
                 VALUES ('w1', 'u1', 'Acme', '2024-01-01 00:00:00.000000');
             DELETE FROM users WHERE id = 'u1';",
        )
        .unwrap();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM workspaces", [], |row| row.get(0))
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn file_database_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offeriq.db");
        {
            let conn = open_database(&path).unwrap();
            conn.execute(
                "INSERT INTO users (id, email, name, token_hash, created_at)
                 VALUES ('u1', 'a@b.c', 'A', x'00', '2024-01-01 00:00:00.000000')",
                [],
            )
            .unwrap();
        }
        let conn = open_database(&path).unwrap();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(n, 1);
    }
}
