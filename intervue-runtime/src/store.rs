use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, mpsc};
use std::thread::{self, JoinHandle};

use anyhow::{Context, anyhow, bail};
use chrono::{DateTime, Utc};
use intervue_core::scoring::ScoreSummary;
use intervue_core::types::{Candidate, Evaluation, UserId};
use intervue_engine::traits::ResultStore;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::oneshot;

const CURRENT_SCHEMA_VERSION: i32 = 1;

const SAMPLE_CANDIDATES: [(&str, &str, &str, &str); 3] = [
    ("priya_s", "pass123", "Priya Sharma", "priya.s@example.com"),
    ("amit_k", "pass456", "Amit Kumar", "amit.k@example.com"),
    ("sneha_p", "pass789", "Sneha Patel", "sneha.p@example.com"),
];

/// Hex SHA-256 of a login secret; the only form secrets are stored in.
pub fn hash_secret(secret: &str) -> String {
    format!("{:x}", Sha256::digest(secret.as_bytes()))
}

/// One row of `interview_results` with the evaluation blob decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResult {
    pub result_id: i64,
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
    pub total_score: u32,
    pub max_score: u32,
    pub final_percentage: f64,
    pub warning_count: u32,
    pub evaluations: Vec<Evaluation>,
}

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct StoreInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                log::error!("failed to send shutdown to result store thread: {err}");
            }
            if let Err(err) = handle.join() {
                log::error!("failed to join result store thread: {err:?}");
            }
        }
    }
}

/// SQLite-backed candidates and results.
///
/// The connection lives on a dedicated thread; callers queue closures and
/// await the reply, so async tasks never block on disk I/O.
#[derive(Clone)]
pub struct SqliteStore {
    inner: Arc<StoreInner>,
    path: Arc<PathBuf>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .finish()
    }
}

impl SqliteStore {
    /// Opens (creating if needed) the database, migrates it and seeds the
    /// sample candidates into an empty `candidates` table.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path: PathBuf = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("create database directory: {}", parent.display())
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<anyhow::Result<()>>();
        let path_for_thread = path.clone();

        let worker = thread::Builder::new()
            .name("intervue-db".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(conn) => conn,
                    Err(err) => {
                        let _ = ready_tx.send(Err(
                            anyhow::Error::new(err).context("open SQLite database")
                        ));
                        return;
                    }
                };

                let init = initialize(&mut conn);
                let failed = init.is_err();
                if ready_tx.send(init).is_err() || failed {
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => task(&mut conn),
                        DbCommand::Shutdown => break,
                    }
                }
                log::debug!("result store thread shutting down");
            })
            .context("spawn result store thread")?;

        ready_rx
            .recv()
            .context("result store thread exited before signalling readiness")??;
        log::info!("result store ready at {}", path.display());

        Ok(Self {
            inner: Arc::new(StoreInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            path: Arc::new(path),
        })
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    async fn execute<F, T>(&self, task: F) -> anyhow::Result<T>
    where
        F: FnOnce(&mut Connection) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let command = DbCommand::Execute(Box::new(move |conn| {
            if reply_tx.send(task(conn)).is_err() {
                log::warn!("result store caller went away before the reply");
            }
        }));

        self.inner
            .sender
            .send(command)
            .map_err(|err| anyhow!("send command to result store thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("result store thread terminated unexpectedly"))?
    }

    /// Inserts or replaces a candidate; the secret is hashed before storage.
    pub async fn upsert_candidate(&self, candidate: &Candidate, secret: &str) -> anyhow::Result<()> {
        let candidate = candidate.clone();
        let secret = hash_secret(secret);
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO candidates (userid, secret, name, email)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(userid) DO UPDATE SET
                     secret = excluded.secret,
                     name = excluded.name,
                     email = excluded.email",
                params![
                    candidate.user_id.as_str(),
                    secret,
                    candidate.name,
                    candidate.email
                ],
            )
            .context("upsert candidate")?;
            Ok(())
        })
        .await
    }

    /// Stored results for one candidate, newest first.
    pub async fn results_for(&self, user_id: &UserId) -> anyhow::Result<Vec<StoredResult>> {
        let user_id = user_id.as_str().to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT result_id, userid, interview_timestamp, total_score, max_score,
                        final_percentage, warning_count, detailed_results
                 FROM interview_results
                 WHERE userid = ?1
                 ORDER BY result_id DESC",
            )?;
            let mut rows = stmt.query(params![user_id])?;

            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                out.push(row_to_result(row)?);
            }
            Ok(out)
        })
        .await
    }
}

#[async_trait::async_trait]
impl ResultStore for SqliteStore {
    async fn verify_credentials(
        &self,
        user_id: &str,
        secret: &str,
    ) -> anyhow::Result<Option<Candidate>> {
        let user_id = user_id.to_string();
        let secret = hash_secret(secret);
        self.execute(move |conn| {
            let candidate = conn
                .query_row(
                    "SELECT userid, name, email FROM candidates
                     WHERE userid = ?1 AND secret = ?2",
                    params![user_id, secret],
                    |row| {
                        Ok(Candidate {
                            user_id: UserId::new(row.get::<_, String>(0)?),
                            name: row.get(1)?,
                            email: row.get(2)?,
                        })
                    },
                )
                .optional()
                .context("look up candidate")?;
            Ok(candidate)
        })
        .await
    }

    async fn save_results(
        &self,
        user_id: &UserId,
        evaluations: &[Evaluation],
        warning_count: u32,
    ) -> anyhow::Result<Option<i64>> {
        if evaluations.is_empty() {
            log::info!("no evaluations for {}, nothing saved", user_id.as_str());
            return Ok(None);
        }

        let summary = ScoreSummary::from_evaluations(evaluations);
        let detailed = serde_json::to_string(evaluations).context("encode evaluations")?;
        let user_id = user_id.as_str().to_string();
        let timestamp = Utc::now().to_rfc3339();

        let result_id = self
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO interview_results (userid, interview_timestamp, total_score,
                         max_score, final_percentage, warning_count, detailed_results)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        user_id,
                        timestamp,
                        summary.total_score,
                        summary.max_score,
                        summary.final_percentage,
                        warning_count,
                        detailed
                    ],
                )
                .with_context(|| format!("insert results for {user_id}"))?;
                let id = conn.last_insert_rowid();
                log::info!("saved results {id} for {user_id}");
                Ok(id)
            })
            .await?;
        Ok(Some(result_id))
    }
}

fn initialize(conn: &mut Connection) -> anyhow::Result<()> {
    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        log::warn!("failed to enable WAL mode: {err}");
    }
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("enable foreign keys")?;
    run_migrations(conn).context("run database migrations")?;
    seed_sample_candidates(conn).context("seed sample candidates")?;
    Ok(())
}

fn run_migrations(conn: &mut Connection) -> anyhow::Result<()> {
    let mut version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("read user_version pragma")?;

    if version > CURRENT_SCHEMA_VERSION {
        bail!(
            "database version ({version}) is newer than supported schema ({CURRENT_SCHEMA_VERSION})"
        );
    }
    if version == CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction().context("open migration transaction")?;
    while version < CURRENT_SCHEMA_VERSION {
        let next = version + 1;
        apply_migration(&tx, next).with_context(|| format!("migration to version {next}"))?;
        version = next;
    }
    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .context("update user_version pragma")?;
    tx.commit().context("commit migrations")?;
    Ok(())
}

fn apply_migration(tx: &Transaction<'_>, version: i32) -> anyhow::Result<()> {
    match version {
        1 => tx
            .execute_batch(include_str!("schemas/schema_v1.sql"))
            .context("execute schema_v1.sql"),
        other => bail!("no migration for version {other}"),
    }
}

fn seed_sample_candidates(conn: &mut Connection) -> anyhow::Result<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM candidates", [], |row| row.get(0))?;
    if count > 0 {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (user_id, secret, name, email) in SAMPLE_CANDIDATES {
        tx.execute(
            "INSERT INTO candidates (userid, secret, name, email) VALUES (?1, ?2, ?3, ?4)",
            params![user_id, hash_secret(secret), name, email],
        )?;
    }
    tx.commit()?;
    log::info!("seeded {} sample candidates", SAMPLE_CANDIDATES.len());
    Ok(())
}

fn row_to_result(row: &Row<'_>) -> anyhow::Result<StoredResult> {
    let timestamp: String = row.get(2)?;
    let detailed: String = row.get(7)?;

    Ok(StoredResult {
        result_id: row.get(0)?,
        user_id: UserId::new(row.get::<_, String>(1)?),
        timestamp: DateTime::parse_from_rfc3339(&timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .with_context(|| format!("invalid timestamp '{timestamp}'"))?,
        total_score: row.get(3)?,
        max_score: row.get(4)?,
        final_percentage: row.get(5)?,
        warning_count: row.get(6)?,
        evaluations: serde_json::from_str(&detailed).context("decode detailed results")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use intervue_core::types::{Difficulty, Question};

    fn eval(score: u8) -> Evaluation {
        let q = Question {
            text: "What does SUM do?".into(),
            level: Difficulty::Easy,
            topic: "Formulas".into(),
        };
        Evaluation::for_question(&q, score, "ok")
    }

    fn open_temp() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("data").join("intervue.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn secret_hash_is_sha256_hex() {
        assert_eq!(
            hash_secret("pass123"),
            "9b8769a4a742959a2d0298c36fb70623f2dfacda8436237df08d8dfd5b37374c"
        );
    }

    #[tokio::test]
    async fn seeded_candidates_can_log_in() {
        let (_dir, store) = open_temp();

        let c = store
            .verify_credentials("priya_s", "pass123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(c.name, "Priya Sharma");
        assert_eq!(c.email, "priya.s@example.com");

        assert!(
            store
                .verify_credentials("priya_s", "wrong")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .verify_credentials("nobody", "pass123")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn saves_and_lists_results_newest_first() {
        let (_dir, store) = open_temp();
        let user = UserId::new("amit_k");

        let first = store
            .save_results(&user, &[eval(5), eval(2)], 1)
            .await
            .unwrap();
        let second = store.save_results(&user, &[eval(4)], 0).await.unwrap();
        assert!(first.is_some());
        assert!(second > first);

        let results = store.results_for(&user).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(Some(results[0].result_id), second);

        let older = &results[1];
        assert_eq!(older.total_score, 7);
        assert_eq!(older.max_score, 10);
        assert!((older.final_percentage - 70.0).abs() < 1e-9);
        assert_eq!(older.warning_count, 1);
        assert_eq!(older.evaluations.len(), 2);
        assert_eq!(older.evaluations[1].score, 2);
    }

    #[tokio::test]
    async fn empty_evaluations_are_not_written() {
        let (_dir, store) = open_temp();
        let user = UserId::new("sneha_p");

        assert_eq!(store.save_results(&user, &[], 2).await.unwrap(), None);
        assert!(store.results_for(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_user_violates_foreign_key() {
        let (_dir, store) = open_temp();
        let res = store
            .save_results(&UserId::new("ghost"), &[eval(3)], 0)
            .await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn reopening_keeps_data_and_does_not_reseed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intervue.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            let c = Candidate {
                user_id: UserId::new("priya_s"),
                name: "Priya S.".into(),
                email: "priya@example.com".into(),
            };
            store.upsert_candidate(&c, "new-secret").await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert!(
            store
                .verify_credentials("priya_s", "pass123")
                .await
                .unwrap()
                .is_none()
        );
        let c = store
            .verify_credentials("priya_s", "new-secret")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(c.name, "Priya S.");
    }
}
