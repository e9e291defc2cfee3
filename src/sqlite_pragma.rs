//! Shared SQLite PRAGMA tuning applied to every database connection

use rusqlite::Connection;

/// Apply the standard PRAGMA set (WAL, NORMAL, MEMORY, mmap, cache, autocheckpoint)
///
/// WAL mode allows the monitor's reader and the alert sink's writer to share
/// one database file without blocking each other.
pub fn apply_optimized_pragmas(conn: &Connection) -> Result<(), rusqlite::Error> {
    // Note: PRAGMA journal_mode returns a result row; pragma_update handles that
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.pragma_update(None, "mmap_size", 268_435_456_i64)?;
    conn.pragma_update(None, "cache_size", -64_000_i64)?;
    conn.pragma_update(None, "wal_autocheckpoint", 1000_i64)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_pragmas_applied() {
        let dir = tempdir().unwrap();
        let conn = Connection::open(dir.path().join("test.db")).unwrap();

        apply_optimized_pragmas(&conn).unwrap();

        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(journal_mode.to_lowercase(), "wal");

        let checkpoint: i32 = conn
            .query_row("PRAGMA wal_autocheckpoint", [], |row| row.get(0))
            .unwrap();
        assert_eq!(checkpoint, 1000);
    }
}
