use crate::config::Config;
use crate::markov::store::{MessageStore, StoreError, StoredMessage, TrimBefore};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Fixed-width so that text comparison in SQL orders chronologically.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS messages (
        message TEXT NOT NULL,
        timestamp TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages (timestamp);
";

/// SQLite-backed message log.
///
/// Holds only the database path: every operation opens its own connection on
/// the blocking pool and closes it when done.
#[derive(Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        Self::open(&config.database_url)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let db = Self { path };
        db.execute_init()?;
        Ok(db)
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }

    pub fn execute_init(&self) -> Result<(), StoreError> {
        info!("Database: Initializing schema at {}", self.path.display());
        let conn = self.connect()?;
        conn.execute_batch(SCHEMA)?;
        debug!("Database: Schema initialized successfully");
        Ok(())
    }

    /// Runs `f` with a fresh connection on tokio's blocking pool.
    pub async fn run_blocking<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = db.connect()?;
            f(&mut conn)
        })
        .await?
    }

    pub async fn append_at(&self, text: &str, timestamp: DateTime<Utc>) -> Result<(), StoreError> {
        let text = text.to_lowercase();
        let timestamp = format_timestamp(timestamp);
        self.run_blocking(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO messages (message, timestamp) VALUES (?1, ?2)",
                (&text, &timestamp),
            )?;
            tx.commit()?;
            debug!("Database: Saved message at {}", timestamp);
            Ok(())
        })
        .await
    }
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    let naive = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map_err(|_| StoreError::Timestamp(raw.to_string()))?;
    Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}

#[async_trait]
impl MessageStore for Database {
    async fn append(&self, text: &str) -> Result<(), StoreError> {
        self.append_at(text, Utc::now()).await
    }

    async fn fetch_all(&self) -> Result<Option<Vec<StoredMessage>>, StoreError> {
        let rows = self
            .run_blocking(|conn| {
                let mut stmt =
                    conn.prepare("SELECT message, timestamp FROM messages ORDER BY rowid")?;
                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?;

                let mut results = Vec::new();
                for row in rows {
                    let (text, timestamp) = row?;
                    results.push(StoredMessage {
                        text,
                        timestamp: parse_timestamp(&timestamp)?,
                    });
                }
                Ok(results)
            })
            .await?;

        debug!("Database: Fetched {} messages", rows.len());
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(rows))
    }

    async fn trim(&self, before: TrimBefore) -> Result<usize, StoreError> {
        let cutoff = before.cutoff(Utc::now());
        let cutoff = format_timestamp(cutoff);
        self.run_blocking(move |conn| {
            let tx = conn.transaction()?;
            let count = tx.execute("DELETE FROM messages WHERE timestamp < ?1", (&cutoff,))?;
            tx.commit()?;
            debug!("Database: Trimmed {} messages older than {}", count, cutoff);
            Ok(count)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use tempfile::TempDir;

    fn test_db() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path().join("data").join("markov.db")).unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn test_db_init_and_empty_fetch() {
        let (_dir, db) = test_db();
        assert!(db.fetch_all().await.unwrap().is_none());

        // Re-running the schema on an existing file is harmless.
        db.execute_init().unwrap();
    }

    #[tokio::test]
    async fn test_db_append_round_trip() {
        let (_dir, db) = test_db();
        db.append("Olá, Mundo!").await.unwrap();
        db.append("segunda mensagem").await.unwrap();

        let rows = db.fetch_all().await.unwrap().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text, "olá, mundo!");
        assert_eq!(rows[1].text, "segunda mensagem");
        assert!(rows[0].timestamp <= rows[1].timestamp);
    }

    #[tokio::test]
    async fn test_db_trim_by_age() {
        let (_dir, db) = test_db();
        let now = Utc::now();
        db.append_at("old msg", now - ChronoDuration::hours(48)).await.unwrap();
        db.append_at("new msg", now - ChronoDuration::hours(1)).await.unwrap();

        let deleted = db
            .trim(TrimBefore::Age(ChronoDuration::hours(24)))
            .await
            .unwrap();
        assert_eq!(deleted, 1);

        let rows = db.fetch_all().await.unwrap().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text, "new msg");
        assert!(rows[0].timestamp >= Utc::now() - ChronoDuration::hours(24));
    }

    #[tokio::test]
    async fn test_db_trim_by_instant() {
        let (_dir, db) = test_db();
        let now = Utc::now();
        db.append_at("a", now - ChronoDuration::minutes(10)).await.unwrap();
        db.append_at("b", now - ChronoDuration::minutes(5)).await.unwrap();
        db.append_at("c", now).await.unwrap();

        let deleted = db
            .trim(TrimBefore::Instant(now - ChronoDuration::minutes(5)))
            .await
            .unwrap();
        assert_eq!(deleted, 1);

        let texts: Vec<_> = db
            .fetch_all()
            .await
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|r| r.text)
            .collect();
        assert_eq!(texts, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_db_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("markov.db");
        Database::open(&path).unwrap().append("persistido").await.unwrap();

        let reopened = Database::open(&path).unwrap();
        let rows = reopened.fetch_all().await.unwrap().unwrap();
        assert_eq!(rows[0].text, "persistido");
    }

    #[tokio::test]
    async fn test_db_trim_with_oversized_age_keeps_rows() {
        let (_dir, db) = test_db();
        db.append_at("antigo", Utc::now() - ChronoDuration::days(3650)).await.unwrap();
        db.append("recente").await.unwrap();

        let age = ChronoDuration::from_std(humantime::parse_duration("1000000years").unwrap())
            .unwrap();
        assert_eq!(db.trim(TrimBefore::Age(age)).await.unwrap(), 0);
        assert_eq!(db.fetch_all().await.unwrap().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_db_handles_quotes_in_text() {
        let (_dir, db) = test_db();
        db.append("'; DROP TABLE messages; --").await.unwrap();

        let rows = db.fetch_all().await.unwrap().unwrap();
        assert_eq!(rows[0].text, "'; drop table messages; --");
    }

    #[test]
    fn test_timestamp_format_round_trip() {
        let now = Utc::now();
        let parsed = parse_timestamp(&format_timestamp(now)).unwrap();
        assert_eq!(parsed.timestamp_micros(), now.timestamp_micros());
        assert!(parse_timestamp("not a date").is_err());
    }
}
