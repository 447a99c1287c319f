use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
use tokio::sync::Mutex;
use tracing::debug;

use shared::{
    domain::{Event, EventId, Registrant, Registration, RegistrationId, RegistrationStatus},
    error::ErrorCode,
};

pub mod memory;

pub use memory::MemoryStore;

/// Predicate evaluated against the live registrations of an event at the moment of
/// admission. Returning an error code rejects the registrant without writing.
pub type AdmissionCheck<'a> = dyn Fn(&[Registration]) -> Result<(), ErrorCode> + Send + Sync + 'a;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Admitted(Registration),
    Rejected(ErrorCode),
}

/// Keyed storage of registration records.
///
/// `try_admit` is the only way to add a record: the check and the append happen as one
/// indivisible step, so two concurrent callers can never both observe a free slot and
/// both write. Implementations own registration id allocation and never reuse an id.
#[async_trait]
pub trait AttendeeStore: Send + Sync {
    async fn health_check(&self) -> Result<()>;

    /// Creates the event if it does not exist yet. An existing event keeps its capacity.
    async fn create_event(&self, event_id: &EventId, capacity: u32) -> Result<Event>;

    async fn event(&self, event_id: &EventId) -> Result<Option<Event>>;

    async fn list_events(&self) -> Result<Vec<Event>>;

    /// Live registrations in admission order.
    async fn get_all(&self, event_id: &EventId) -> Result<Vec<Registration>>;

    async fn try_admit(
        &self,
        event_id: &EventId,
        check: &AdmissionCheck<'_>,
        registrant: Registrant,
    ) -> Result<Admission>;

    /// Returns `false` when no live record with that id exists for the event.
    async fn remove(&self, event_id: &EventId, registration_id: RegistrationId) -> Result<bool>;
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
    // SQLite admits a single writer; admissions and removals queue here so the
    // read-check-insert sequence never interleaves with another write.
    write_lock: Arc<Mutex<()>>,
}

const SELECT_EVENT_REGISTRATIONS: &str =
    "SELECT id, event_id, name, email, college, status, registered_at
     FROM registrations
     WHERE event_id = ?
     ORDER BY id ASC";

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl AttendeeStore for Storage {
    async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    async fn create_event(&self, event_id: &EventId, capacity: u32) -> Result<Event> {
        if capacity == 0 {
            bail!("event {event_id} must have a positive capacity");
        }
        {
            let _guard = self.write_lock.lock().await;
            sqlx::query(
                "INSERT INTO events (id, capacity) VALUES (?, ?) ON CONFLICT(id) DO NOTHING",
            )
            .bind(event_id.as_str())
            .bind(i64::from(capacity))
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to create event {event_id}"))?;
        }
        self.event(event_id)
            .await?
            .ok_or_else(|| anyhow!("event {event_id} missing after insert"))
    }

    async fn event(&self, event_id: &EventId) -> Result<Option<Event>> {
        let row = sqlx::query("SELECT id, capacity FROM events WHERE id = ?")
            .bind(event_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| event_from_row(&r)).transpose()
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        let rows = sqlx::query("SELECT id, capacity FROM events ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(event_from_row).collect()
    }

    async fn get_all(&self, event_id: &EventId) -> Result<Vec<Registration>> {
        let rows = sqlx::query(SELECT_EVENT_REGISTRATIONS)
            .bind(event_id.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(registration_from_row).collect()
    }

    async fn try_admit(
        &self,
        event_id: &EventId,
        check: &AdmissionCheck<'_>,
        registrant: Registrant,
    ) -> Result<Admission> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to open admission transaction")?;

        let known_event: Option<i64> = sqlx::query_scalar("SELECT 1 FROM events WHERE id = ?")
            .bind(event_id.as_str())
            .fetch_optional(&mut *tx)
            .await?;
        if known_event.is_none() {
            tx.rollback().await?;
            return Ok(Admission::Rejected(ErrorCode::EventNotFound));
        }

        let rows = sqlx::query(SELECT_EVENT_REGISTRATIONS)
            .bind(event_id.as_str())
            .fetch_all(&mut *tx)
            .await?;
        let live = rows
            .iter()
            .map(registration_from_row)
            .collect::<Result<Vec<_>>>()?;

        if let Err(code) = check(live.as_slice()) {
            tx.rollback().await?;
            return Ok(Admission::Rejected(code));
        }

        let registered_at = Utc::now();
        let status = RegistrationStatus::Registered;
        let rec = sqlx::query(
            "INSERT INTO registrations (event_id, name, email, college, status, registered_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(event_id.as_str())
        .bind(&registrant.name)
        .bind(&registrant.email)
        .bind(&registrant.college)
        .bind(status.as_str())
        .bind(registered_at)
        .fetch_one(&mut *tx)
        .await
        .context("failed to insert registration")?;
        tx.commit().await.context("failed to commit admission")?;

        let registration_id = RegistrationId(rec.get::<i64, _>(0));
        debug!(%event_id, %registration_id, live = live.len() + 1, "registration admitted");
        Ok(Admission::Admitted(Registration {
            registration_id,
            event_id: event_id.clone(),
            name: registrant.name,
            email: registrant.email,
            college: registrant.college,
            status,
            registered_at,
        }))
    }

    async fn remove(&self, event_id: &EventId, registration_id: RegistrationId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let result = sqlx::query("DELETE FROM registrations WHERE event_id = ? AND id = ?")
            .bind(event_id.as_str())
            .bind(registration_id.0)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete registration {registration_id}"))?;
        Ok(result.rows_affected() > 0)
    }
}

fn event_from_row(row: &SqliteRow) -> Result<Event> {
    let capacity = row.get::<i64, _>(1);
    Ok(Event {
        id: EventId(row.get::<String, _>(0)),
        capacity: u32::try_from(capacity)
            .with_context(|| format!("stored capacity {capacity} out of range"))?,
    })
}

fn registration_from_row(row: &SqliteRow) -> Result<Registration> {
    let status = match row.get::<String, _>(5).as_str() {
        "registered" => RegistrationStatus::Registered,
        other => bail!("unknown registration status '{other}'"),
    };
    Ok(Registration {
        registration_id: RegistrationId(row.get::<i64, _>(0)),
        event_id: EventId(row.get::<String, _>(1)),
        name: row.get::<String, _>(2),
        email: row.get::<String, _>(3),
        college: row.get::<String, _>(4),
        status,
        registered_at: row.get::<DateTime<Utc>, _>(6),
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
