use super::activity::{Activity, NewActivity};
use super::error::{BufferError, BufferResult};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

const MAX_CONNECTIONS: u32 = 4;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
// well below SQLITE_MAX_VARIABLE_NUMBER on every supported build
const BIND_LIMIT: usize = 999;

const INSERT_ACTIVITY: &str = "
    INSERT INTO activities (
        client_id, project, git_remote, started_at, ended_at, filename, filetype,
        lines_added, lines_removed, git_branch,
        actions_per_minute, words_per_minute, editor, machine, created_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

const SELECT_UNCONSUMED: &str = "
    SELECT id, client_id, project, git_remote, started_at, ended_at, filename, filetype,
           lines_added, lines_removed, git_branch,
           actions_per_minute, words_per_minute, editor, machine, synced, created_at
    FROM activities
    WHERE synced = FALSE
    ORDER BY started_at ASC, id ASC
    LIMIT ?";

/// SQLite-backed append / read-unconsumed / mark-consumed store.
///
/// Cloning is cheap and every clone shares the same connection pool; each
/// operation is atomic on its own.
#[derive(Clone, Debug)]
pub struct ActivityBuffer {
    pool: SqlitePool,
}

impl ActivityBuffer {
    /// Opens (creating if needed) the buffer at `path` and applies the schema.
    pub async fn open(path: impl AsRef<Path>) -> BufferResult<Self> {
        let path = path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("Opened activity buffer at {}", path.display());
        Ok(Self { pool })
    }

    /// Persists `activity` as unconsumed and returns its identity.
    pub async fn append(&self, activity: NewActivity) -> BufferResult<i64> {
        let client_id = activity
            .client_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let id = sqlx::query(INSERT_ACTIVITY)
            .bind(&client_id)
            .bind(activity.project)
            .bind(activity.git_remote)
            .bind(activity.started_at)
            .bind(activity.ended_at)
            .bind(activity.filename)
            .bind(activity.filetype)
            .bind(activity.lines_added)
            .bind(activity.lines_removed)
            .bind(activity.git_branch)
            .bind(activity.actions_per_minute)
            .bind(activity.words_per_minute)
            .bind(activity.editor)
            .bind(activity.machine)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        debug!("Appended activity {id} ({client_id})");
        Ok(id)
    }

    /// Up to `limit` unconsumed activities, oldest start first, ties by id.
    /// An empty result means the buffer is drained.
    pub async fn unconsumed(&self, limit: usize) -> BufferResult<Vec<Activity>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let activities = sqlx::query_as::<_, Activity>(SELECT_UNCONSUMED)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(activities)
    }

    /// Flips exactly `ids` to consumed in one transaction.
    ///
    /// Either every identity is marked or none is: if any of them does not
    /// exist the transaction is rolled back and
    /// [`BufferError::MissingActivities`] names the culprits.
    pub async fn mark_consumed(&self, ids: &[i64]) -> BufferResult<()> {
        let ids: Vec<i64> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        if ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        let mut missing = Vec::new();

        for chunk in ids.chunks(BIND_LIMIT) {
            let mut update: QueryBuilder<Sqlite> =
                QueryBuilder::new("UPDATE activities SET synced = TRUE WHERE id IN (");
            push_ids(&mut update, chunk);
            let updated = update.build().execute(&mut *tx).await?.rows_affected();

            if updated != chunk.len() as u64 {
                let mut select: QueryBuilder<Sqlite> =
                    QueryBuilder::new("SELECT id FROM activities WHERE id IN (");
                push_ids(&mut select, chunk);
                let found: BTreeSet<i64> = select
                    .build_query_scalar::<i64>()
                    .fetch_all(&mut *tx)
                    .await?
                    .into_iter()
                    .collect();
                missing.extend(chunk.iter().filter(|id| !found.contains(id)));
            }
        }

        if !missing.is_empty() {
            tx.rollback().await?;
            return Err(BufferError::MissingActivities(missing));
        }

        tx.commit().await?;
        debug!("Marked {} activities consumed", ids.len());
        Ok(())
    }

    /// Number of activities still waiting to be forwarded.
    pub async fn count_unconsumed(&self) -> BufferResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM activities WHERE synced = FALSE",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Closes the connection pool. Further operations fail.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed activity buffer");
    }
}

fn push_ids(builder: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}
