//! Append-only SQLite store for extracted triples.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::KgResult;
use crate::models::triple::Triple;

pub const DEFAULT_DB_PATH: &str = "data/kg_triples.db";

const CSV_HEADER: &str = "head,relation,tail,evidence,url,timestamp";

/// One stored triple together with where and when it was extracted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripleRecord {
    pub head: String,
    pub relation: String,
    pub tail: String,
    pub evidence: String,
    pub url: String,
    pub timestamp: String,
}

pub struct TripleStore {
    db_path: PathBuf,
}

impl TripleStore {
    /// Open (and create if needed) the store at `db_path`
    pub fn open(db_path: impl AsRef<Path>) -> KgResult<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let store = Self { db_path };
        store.init_schema()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> KgResult<Connection> {
        Ok(Connection::open(&self.db_path)?)
    }

    fn init_schema(&self) -> KgResult<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS triples (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                head TEXT NOT NULL,
                relation TEXT NOT NULL,
                tail TEXT NOT NULL,
                evidence TEXT NOT NULL,
                url TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
        "#,
        )?;
        Ok(())
    }

    /// Append one row per triple, all stamped with the current time. Returns the number of rows.
    pub fn insert_triples(&self, triples: &[Triple], url: &str) -> KgResult<usize> {
        self.insert_triples_at(triples, url, Utc::now())
    }

    pub fn insert_triples_at(
        &self,
        triples: &[Triple],
        url: &str,
        at: DateTime<Utc>,
    ) -> KgResult<usize> {
        let mut conn = self.connect()?;
        let timestamp = at.to_rfc3339();

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO triples (head, relation, tail, evidence, url, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;
            for triple in triples {
                stmt.execute(params![
                    triple.head(),
                    triple.relation(),
                    triple.tail(),
                    triple.evidence(),
                    url,
                    timestamp
                ])?;
            }
        }
        tx.commit()?;

        info!(count = triples.len(), %url, "stored triples");
        Ok(triples.len())
    }

    /// Every stored row, newest first
    pub fn fetch_triples(&self) -> KgResult<Vec<TripleRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT head, relation, tail, evidence, url, created_at
             FROM triples
             ORDER BY id DESC",
        )?;

        let records = stmt
            .query_map([], |row| {
                Ok(TripleRecord {
                    head: row.get("head")?,
                    relation: row.get("relation")?,
                    tail: row.get("tail")?,
                    evidence: row.get("evidence")?,
                    url: row.get("url")?,
                    timestamp: row.get("created_at")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Write every stored row to `path` as CSV
    pub fn export_csv(&self, path: impl AsRef<Path>) -> KgResult<usize> {
        let records = self.fetch_triples()?;
        fs::write(path, to_csv(&records))?;
        Ok(records.len())
    }
}

/// Render records as CSV with a header row
pub fn to_csv(records: &[TripleRecord]) -> String {
    let mut output = String::new();
    output.push_str(CSV_HEADER);
    output.push('\n');

    for record in records {
        let _ = writeln!(
            output,
            "{},{},{},{},{},{}",
            escape_csv(&record.head),
            escape_csv(&record.relation),
            escape_csv(&record.tail),
            escape_csv(&record.evidence),
            escape_csv(&record.url),
            escape_csv(&record.timestamp),
        );
    }
    output
}

/// Download name for an export made at `at`
pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("kg_triples_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn triple(head: &str, relation: &str, tail: &str, evidence: &str) -> Triple {
        Triple::new(head, relation, tail, evidence).unwrap()
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("data").join("kg.db");

        let store = TripleStore::open(&db_path).unwrap();
        assert!(db_path.exists());
        assert!(store.fetch_triples().unwrap().is_empty());
    }

    #[test]
    fn test_insert_and_fetch_newest_first() {
        let dir = tempdir().unwrap();
        let store = TripleStore::open(dir.path().join("kg.db")).unwrap();

        let first = vec![triple("Paris", "capitalOf", "France", "Paris is the capital of France.")];
        let second = vec![
            triple("Berlin", "capitalOf", "Germany", "Berlin is the capital of Germany."),
            triple("Berlin", "locatedOn", "Spree", "Berlin lies on the Spree."),
        ];

        assert_eq!(store.insert_triples(&first, "https://example.com/paris").unwrap(), 1);
        assert_eq!(store.insert_triples(&second, "https://example.com/berlin").unwrap(), 2);

        let records = store.fetch_triples().unwrap();
        let tails: Vec<&str> = records.iter().map(|r| r.tail.as_str()).collect();
        assert_eq!(tails, vec!["Spree", "Germany", "France"]);
        assert_eq!(records[2].url, "https://example.com/paris");
    }

    #[test]
    fn test_store_keeps_duplicates() {
        let dir = tempdir().unwrap();
        let store = TripleStore::open(dir.path().join("kg.db")).unwrap();
        let triples = vec![triple("A", "r", "B", "A r B.")];

        store.insert_triples(&triples, "u").unwrap();
        store.insert_triples(&triples, "u").unwrap();
        assert_eq!(store.fetch_triples().unwrap().len(), 2);
    }

    #[test]
    fn test_reopen_preserves_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kg.db");
        TripleStore::open(&path)
            .unwrap()
            .insert_triples(&[triple("A", "r", "B", "A r B.")], "u")
            .unwrap();

        let reopened = TripleStore::open(&path).unwrap();
        assert_eq!(reopened.fetch_triples().unwrap().len(), 1);
    }

    #[test]
    fn test_insert_empty_list() {
        let dir = tempdir().unwrap();
        let store = TripleStore::open(dir.path().join("kg.db")).unwrap();
        assert_eq!(store.insert_triples(&[], "u").unwrap(), 0);
        assert!(store.fetch_triples().unwrap().is_empty());
    }

    #[test]
    fn test_export_csv() {
        let dir = tempdir().unwrap();
        let store = TripleStore::open(dir.path().join("kg.db")).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        store
            .insert_triples_at(
                &[triple("Paris", "capitalOf", "France", "Paris, the \"City of Light\", is the capital.")],
                "https://example.com/paris",
                at,
            )
            .unwrap();

        let export_path = dir.path().join("export.csv");
        assert_eq!(store.export_csv(&export_path).unwrap(), 1);

        let csv = fs::read_to_string(&export_path).unwrap();
        assert_eq!(
            csv,
            "head,relation,tail,evidence,url,timestamp\n\
             Paris,capitalOf,France,\"Paris, the \"\"City of Light\"\", is the capital.\",https://example.com/paris,2024-05-01T12:30:00+00:00\n"
        );
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("line\nbreak"), "\"line\nbreak\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_export_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 5, 9).unwrap();
        assert_eq!(export_file_name(at), "kg_triples_20240501_080509.csv");
    }
}
