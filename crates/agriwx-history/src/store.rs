//! SQLite-backed retention store for lookups.

use agriwx_core::StoreError;
use agriwx_weather::CurrentConditions;
use chrono::{TimeZone, Utc};
use rusqlite::{params, Connection, TransactionBehavior};
use std::path::Path;

use crate::record::{LookupRecord, NewLookupRecord};

/// Default number of lookups kept
pub const MAX_RETAINED: usize = 5;

/// Local SQLite storage for recent lookups
pub struct SqliteHistoryStore {
    conn: Connection,
    max_retained: usize,
}

impl SqliteHistoryStore {
    /// Open or create the database at `path`
    pub fn open(path: &Path, max_retained: usize) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Open(format!("{}: {}", parent.display(), e)))?;
        }

        let conn = Connection::open(path)
            .map_err(|e| StoreError::Open(format!("{}: {}", path.display(), e)))?;

        let store = Self { conn, max_retained };
        store.init_schema()?;

        tracing::info!(
            "History store opened at {} (keeping {})",
            path.display(),
            max_retained
        );
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory(max_retained: usize) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open(e.to_string()))?;
        let store = Self { conn, max_retained };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS lookups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                location_label TEXT NOT NULL,
                current_json TEXT NOT NULL,
                advisories_json TEXT NOT NULL,
                created_at_ms INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_lookups_created ON lookups(created_at_ms, id);
            "#,
        )?;
        Ok(())
    }

    /// Insert a lookup, then evict the oldest rows beyond the retention limit.
    ///
    /// Insert, count and delete share one immediate transaction. Ties on
    /// `created_at` are evicted in insertion order.
    pub fn record(&mut self, entry: &NewLookupRecord) -> Result<i64, StoreError> {
        let current_json = serde_json::to_string(&entry.current)?;
        let advisories_json = serde_json::to_string(&entry.advisories)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO lookups (location_label, current_json, advisories_json, created_at_ms)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.location_label,
                current_json,
                advisories_json,
                entry.created_at.timestamp_millis(),
            ],
        )?;
        let id = tx.last_insert_rowid();

        let count: i64 = tx.query_row("SELECT COUNT(*) FROM lookups", [], |row| row.get(0))?;
        let excess = count - self.max_retained as i64;

        if excess > 0 {
            let evicted = tx.execute(
                "DELETE FROM lookups WHERE id IN (
                    SELECT id FROM lookups ORDER BY created_at_ms ASC, id ASC LIMIT ?1
                 )",
                params![excess],
            )?;
            tracing::debug!("Evicted {} old lookup(s)", evicted);
        }

        tx.commit()?;
        Ok(id)
    }

    /// Most recent lookups first
    pub fn recent(&self, limit: usize) -> Result<Vec<LookupRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, location_label, current_json, advisories_json, created_at_ms
             FROM lookups ORDER BY created_at_ms DESC, id DESC LIMIT ?1",
        )?;

        let records = stmt
            .query_map(params![limit as i64], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Get the stored lookup count.
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM lookups", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<LookupRecord> {
        let current_json: String = row.get(2)?;
        let advisories_json: String = row.get(3)?;
        let created_at_ms: i64 = row.get(4)?;

        let current: CurrentConditions = serde_json::from_str(&current_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let advisories: Vec<String> = serde_json::from_str(&advisories_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let created_at = Utc
            .timestamp_millis_opt(created_at_ms)
            .single()
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(4, created_at_ms))?;

        Ok(LookupRecord {
            id: row.get(0)?,
            location_label: row.get(1)?,
            current,
            advisories,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use chrono::{DateTime, Duration};
    use tempfile::tempdir;

    fn base_time() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_760_000_000_000).single().unwrap()
    }

    fn entry(label: &str, offset_secs: i64) -> NewLookupRecord {
        NewLookupRecord {
            location_label: label.to_string(),
            current: CurrentConditions {
                temperature_c: 25.0,
                humidity_pct: 60,
                wind_kmh: 8.0,
                precipitation_probability_pct: Some(10),
                description: "clear sky".to_string(),
            },
            advisories: vec!["No rain expected in next 6 hours — safe to irrigate if needed.".to_string()],
            created_at: base_time() + Duration::seconds(offset_secs),
        }
    }

    fn labels(records: &[LookupRecord]) -> Vec<String> {
        records.iter().map(|r| r.location_label.clone()).collect()
    }

    #[test]
    fn test_record_and_read_back() {
        let mut store = SqliteHistoryStore::in_memory(MAX_RETAINED).unwrap();
        let e = entry("Nairobi, KE", 0);
        let id = store.record(&e).unwrap();

        let records = store.recent(10).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].location_label, "Nairobi, KE");
        assert_eq!(records[0].current, e.current);
        assert_eq!(records[0].advisories, e.advisories);
        assert_eq!(records[0].created_at, e.created_at);
    }

    #[test]
    fn test_never_exceeds_limit() {
        let mut store = SqliteHistoryStore::in_memory(MAX_RETAINED).unwrap();
        for i in 0..12 {
            store.record(&entry(&format!("city-{}", i), i)).unwrap();
            assert!(store.count().unwrap() <= MAX_RETAINED);
        }
        assert_eq!(store.count().unwrap(), 5);
        assert_eq!(
            labels(&store.recent(10).unwrap()),
            vec!["city-11", "city-10", "city-9", "city-8", "city-7"]
        );
    }

    #[test]
    fn test_evicts_by_created_at_not_arrival() {
        let mut store = SqliteHistoryStore::in_memory(3).unwrap();
        store.record(&entry("late", 100)).unwrap();
        store.record(&entry("early", 1)).unwrap();
        store.record(&entry("middle", 50)).unwrap();
        store.record(&entry("latest", 200)).unwrap();

        assert_eq!(
            labels(&store.recent(10).unwrap()),
            vec!["latest", "late", "middle"]
        );
    }

    #[test]
    fn test_ties_evicted_in_insertion_order() {
        let mut store = SqliteHistoryStore::in_memory(2).unwrap();
        store.record(&entry("first", 0)).unwrap();
        store.record(&entry("second", 0)).unwrap();
        store.record(&entry("third", 0)).unwrap();

        assert_eq!(labels(&store.recent(10).unwrap()), vec!["third", "second"]);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("history.db");

        {
            let mut store = SqliteHistoryStore::open(&db_path, MAX_RETAINED).unwrap();
            for i in 0..7 {
                store.record(&entry(&format!("city-{}", i), i)).unwrap();
            }
        }

        let store = SqliteHistoryStore::open(&db_path, MAX_RETAINED).unwrap();
        assert_eq!(store.count().unwrap(), 5);
        assert_eq!(store.recent(1).unwrap()[0].location_label, "city-6");
    }
}
