//! Relational submission store backed by SQLite
//!
//! Uses sqlx with a small connection pool. Timestamps are stored as
//! fixed-width RFC 3339 text (microsecond precision, `Z` suffix), so ordering
//! by the text column is chronological.

use std::str::FromStr;

use async_trait::async_trait;
use birthorder_core::{
    recombine, FieldLayout, GroupAggregate, NewSubmission, StatisticsOutcome, Submission,
};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use super::{Backend, Paginated, Pagination, StoreError, SubmissionStore};

/// Kept low; SQLite serializes writers anyway.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const SELECT_COLUMNS: &str = "id, region, family_size, firstborn_gender, attitude_score, \
     firstborn_education, laterborn_education, age_range, notes, contact_email, \
     ip_address, user_agent, timestamp";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to a SQLite database URL, creating the file if missing.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let store = SqliteStore::connect("sqlite://submissions.db").await?;
    /// ```
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .connect_with(options)
            .await?;
        tracing::info!(url = %database_url, "connected to SQLite database");
        Self::from_pool(pool).await
    }

    /// Private in-memory database.
    ///
    /// A single connection that never expires; each SQLite in-memory
    /// connection is its own database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool and make sure the schema exists.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS submissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                region TEXT NOT NULL,
                family_size INTEGER NOT NULL CHECK (family_size BETWEEN 1 AND 20),
                firstborn_gender TEXT NOT NULL CHECK (firstborn_gender IN ('male', 'female')),
                attitude_score REAL NOT NULL CHECK (attitude_score BETWEEN 0.1 AND 0.7),
                firstborn_education REAL NOT NULL CHECK (firstborn_education BETWEEN 1 AND 20),
                laterborn_education REAL NOT NULL CHECK (laterborn_education BETWEEN 1 AND 20),
                age_range TEXT NOT NULL,
                notes TEXT NOT NULL DEFAULT '',
                contact_email TEXT NOT NULL DEFAULT '',
                ip_address TEXT,
                user_agent TEXT,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        for ddl in [
            "CREATE INDEX IF NOT EXISTS idx_submissions_region_timestamp ON submissions (region, timestamp DESC)",
            "CREATE INDEX IF NOT EXISTS idx_submissions_attitude_score ON submissions (attitude_score)",
            "CREATE INDEX IF NOT EXISTS idx_submissions_timestamp ON submissions (timestamp DESC)",
        ] {
            sqlx::query(ddl).execute(&self.pool).await?;
        }

        tracing::debug!("submissions table ready");
        Ok(())
    }
}

fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_submission(row: &SqliteRow) -> Result<Submission, StoreError> {
    let id: i64 = row.try_get("id")?;
    let corrupt = |reason: String| StoreError::corrupt(id.to_string(), reason);

    let region: String = row.try_get("region")?;
    let gender: String = row.try_get("firstborn_gender")?;
    let age_range: String = row.try_get("age_range")?;
    let family_size: i64 = row.try_get("family_size")?;
    let timestamp: String = row.try_get("timestamp")?;

    Ok(Submission {
        id: id.to_string(),
        region: region.parse().map_err(|e| corrupt(format!("region: {e}")))?,
        family_size: u8::try_from(family_size)
            .map_err(|_| corrupt(format!("family_size out of range: {family_size}")))?,
        firstborn_gender: gender.parse().map_err(|e| corrupt(format!("gender: {e}")))?,
        attitude_score: row.try_get("attitude_score")?,
        firstborn_education: row.try_get("firstborn_education")?,
        laterborn_education: row.try_get("laterborn_education")?,
        age_range: age_range
            .parse()
            .map_err(|e| corrupt(format!("age_range: {e}")))?,
        notes: row.try_get("notes")?,
        contact_email: row.try_get("contact_email")?,
        ip_address: row.try_get("ip_address")?,
        user_agent: row.try_get("user_agent")?,
        timestamp: DateTime::parse_from_rfc3339(&timestamp)
            .map_err(|e| corrupt(format!("timestamp: {e}")))?
            .with_timezone(&Utc),
    })
}

fn rows_to_submissions(rows: &[SqliteRow]) -> Result<Vec<Submission>, StoreError> {
    rows.iter().map(row_to_submission).collect()
}

#[async_trait]
impl SubmissionStore for SqliteStore {
    fn backend(&self) -> Backend {
        Backend::Sqlite
    }

    fn export_layout(&self) -> FieldLayout {
        FieldLayout::Relational
    }

    async fn create(&self, submission: NewSubmission) -> Result<Submission, StoreError> {
        // Truncate so the returned record equals what a later read yields
        let timestamp = Utc::now().trunc_subsecs(6);

        let result = sqlx::query(
            r#"
            INSERT INTO submissions
                (region, family_size, firstborn_gender, attitude_score, firstborn_education,
                 laterborn_education, age_range, notes, contact_email, ip_address, user_agent,
                 timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(submission.region.as_str())
        .bind(i64::from(submission.family_size))
        .bind(submission.firstborn_gender.as_str())
        .bind(submission.attitude_score)
        .bind(submission.firstborn_education)
        .bind(submission.laterborn_education)
        .bind(submission.age_range.as_str())
        .bind(&submission.notes)
        .bind(&submission.contact_email)
        .bind(&submission.ip_address)
        .bind(&submission.user_agent)
        .bind(encode_timestamp(&timestamp))
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::debug!(id, "inserted submission");
        Ok(submission.into_stored(id.to_string(), timestamp))
    }

    async fn list(&self, page: Pagination) -> Result<Paginated<Submission>, StoreError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM submissions ORDER BY timestamp DESC, id DESC LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(page.limit))
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(Paginated {
            items: rows_to_submissions(&rows)?,
            total: self.count().await?,
            page: page.page,
            limit: page.limit,
        })
    }

    async fn list_by_region(&self, region: &str) -> Result<Vec<Submission>, StoreError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM submissions WHERE region = ? ORDER BY timestamp DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(region)
            .fetch_all(&self.pool)
            .await?;
        rows_to_submissions(&rows)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM submissions")
            .fetch_one(&self.pool)
            .await?;
        Ok(total as u64)
    }

    async fn all(&self) -> Result<Vec<Submission>, StoreError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM submissions ORDER BY timestamp DESC, id DESC"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows_to_submissions(&rows)
    }

    /// Group in SQL, then recombine the weighted group means.
    async fn statistics(&self) -> Result<StatisticsOutcome, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
                region,
                firstborn_gender,
                COUNT(*) AS total,
                AVG(family_size) AS avg_family_size,
                AVG(attitude_score) AS avg_attitude_score,
                AVG(firstborn_education - laterborn_education) AS avg_education_diff
            FROM submissions
            GROUP BY region, firstborn_gender
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let groups = rows
            .iter()
            .map(|row| -> Result<GroupAggregate, StoreError> {
                let region: String = row.try_get("region")?;
                let gender: String = row.try_get("firstborn_gender")?;
                let total: i64 = row.try_get("total")?;
                Ok(GroupAggregate {
                    region: region
                        .parse()
                        .map_err(|e| StoreError::corrupt("group", format!("region: {e}")))?,
                    gender: gender
                        .parse()
                        .map_err(|e| StoreError::corrupt("group", format!("gender: {e}")))?,
                    count: total as u64,
                    mean_family_size: row.try_get("avg_family_size")?,
                    mean_attitude_score: row.try_get("avg_attitude_score")?,
                    mean_education_difference: row.try_get("avg_education_diff")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(recombine(&groups))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use birthorder_core::{compute_statistics, AgeRange, Gender, Region};

    fn new_submission(region: Region, gender: Gender, family_size: u8, attitude: f64) -> NewSubmission {
        NewSubmission {
            region,
            family_size,
            firstborn_gender: gender,
            attitude_score: attitude,
            firstborn_education: 16.0,
            laterborn_education: 14.5,
            age_range: AgeRange::Over35,
            notes: "first, second".into(),
            contact_email: "a@b.com".into(),
            ip_address: Some("127.0.0.1".into()),
            user_agent: Some("test-agent".into()),
        }
    }

    #[tokio::test]
    async fn file_database_survives_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("submissions.db").display());

        let store = SqliteStore::connect(&url).await.unwrap();
        let created = store
            .create(new_submission(Region::African, Gender::Female, 5, 0.35))
            .await
            .unwrap();
        store.pool.close().await;

        let reopened = SqliteStore::connect(&url).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
        assert_eq!(reopened.all().await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn create_round_trips_all_fields() {
        let store = SqliteStore::in_memory().await.unwrap();
        let created = store
            .create(new_submission(Region::SouthAsian, Gender::Male, 4, 0.55))
            .await
            .unwrap();

        let listed = store.list(Pagination::default()).await.unwrap();
        assert_eq!(listed.total, 1);
        assert_eq!(listed.items, vec![created]);
    }

    #[tokio::test]
    async fn ids_are_unique_and_ordering_is_newest_first() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut ids = Vec::new();
        for i in 1..=25u8 {
            let s = store
                .create(new_submission(Region::Other, Gender::Female, i % 20 + 1, 0.3))
                .await
                .unwrap();
            ids.push(s.id);
        }

        let page = store.list(Pagination::new(2, 10)).await.unwrap();
        assert_eq!(page.total_pages(), 3);
        let page_ids: Vec<_> = page.items.iter().map(|s| s.id.clone()).collect();
        let expected: Vec<_> = ids.iter().rev().skip(10).take(10).cloned().collect();
        assert_eq!(page_ids, expected);
    }

    #[tokio::test]
    async fn grouped_statistics_match_single_pass() {
        let store = SqliteStore::in_memory().await.unwrap();
        let inputs = [
            (Region::British, Gender::Male, 3, 0.45),
            (Region::British, Gender::Male, 5, 0.15),
            (Region::British, Gender::Female, 2, 0.7),
            (Region::Caribbean, Gender::Female, 7, 0.65),
            (Region::Caribbean, Gender::Female, 1, 0.1),
        ];
        for (region, gender, size, attitude) in inputs {
            store
                .create(new_submission(region, gender, size, attitude))
                .await
                .unwrap();
        }

        let grouped = store.statistics().await.unwrap();
        let direct = compute_statistics(&store.all().await.unwrap());
        let (g, d) = (grouped.statistics().unwrap(), direct.statistics().unwrap());
        assert_eq!(g.total_submissions, 5);
        assert!((g.average_family_size - d.average_family_size).abs() < 1e-9);
        assert!((g.average_attitude_score - d.average_attitude_score).abs() < 1e-9);
        assert!((g.average_education_difference - d.average_education_difference).abs() < 1e-9);
        assert_eq!(g.regions, d.regions);
        assert_eq!(g.gender_distribution, d.gender_distribution);
    }

    #[tokio::test]
    async fn empty_table_has_no_statistics() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert_eq!(store.statistics().await.unwrap(), StatisticsOutcome::NoData);
        assert_eq!(store.count().await.unwrap(), 0);
        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn check_constraints_reject_out_of_range_rows() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut bad = new_submission(Region::Other, Gender::Male, 3, 0.3);
        bad.family_size = 42;
        assert!(matches!(store.create(bad).await, Err(StoreError::Sqlx(_))));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[test]
    fn timestamp_encoding_is_fixed_width() {
        let a = encode_timestamp(&"2024-01-01T00:00:00Z".parse().unwrap());
        let b = encode_timestamp(&"2024-01-01T00:00:00.5Z".parse().unwrap());
        assert_eq!(a.len(), b.len());
        assert!(a < b);
    }
}
