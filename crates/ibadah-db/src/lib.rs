//! ibadah-db: SQLite persistence for users, daily checklists, feedback,
//! and discussion history.
//!
//! One connection behind an async mutex; every query runs on the blocking
//! pool. The daily-log table is wide: one text column per checklist item.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension};
use tokio::sync::Mutex;

use ibadah_types::{
    CHECKLIST_ITEMS, ChatTurn, NotifKind, STATUS_PENDING, UserStatus, is_checklist_item,
};

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Blocking task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("Unknown checklist item: {0}")]
    UnknownItem(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Per-kind notification flags for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifFlags {
    pub sholat: bool,
    pub rangkuman: bool,
    pub dzikir: bool,
    pub dhuha: bool,
    pub jumat: bool,
    pub motivasi: bool,
}

impl NotifFlags {
    pub fn get(&self, kind: NotifKind) -> bool {
        match kind {
            NotifKind::Sholat => self.sholat,
            NotifKind::Rangkuman => self.rangkuman,
            NotifKind::Dzikir => self.dzikir,
            NotifKind::Dhuha => self.dhuha,
            NotifKind::Jumat => self.jumat,
            NotifKind::Motivasi => self.motivasi,
        }
    }

    /// Kinds currently switched on, in the canonical order.
    pub fn enabled(&self) -> Vec<NotifKind> {
        NotifKind::ALL.into_iter().filter(|k| self.get(*k)).collect()
    }
}

/// One row of the users table.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: i64,
    pub full_name: String,
    pub username: String,
    pub status: UserStatus,
    pub agreed_terms: bool,
    pub location: Option<String>,
    pub registration_date: String,
    pub notif: NotifFlags,
}

impl UserRecord {
    /// True once the user may use the bot (approved and terms accepted).
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Approved && self.agreed_terms
    }
}

/// Outcome of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// A brand-new row was created.
    Created,
    /// An existing row was reset back to Pending.
    Reset,
}

/// One day's checklist for one user. Items map column name to
/// "Sudah"/"Belum".
#[derive(Debug, Clone)]
pub struct DailyLog {
    pub user_id: i64,
    pub date: String,
    pub items: HashMap<String, String>,
}

impl DailyLog {
    /// Status string for an item, defaulting to pending for unknown keys.
    pub fn status(&self, item: &str) -> &str {
        self.items.get(item).map(String::as_str).unwrap_or(STATUS_PENDING)
    }

    pub fn is_done(&self, item: &str) -> bool {
        self.status(item) == ibadah_types::STATUS_DONE
    }
}

/// SQLite-backed store. Cheap to clone; clones share the connection.
#[derive(Clone)]
pub struct IbadahDb {
    conn: Arc<Mutex<Connection>>,
}

fn schema() -> String {
    let checklist_columns = CHECKLIST_ITEMS
        .iter()
        .map(|item| format!(r#""{item}" TEXT NOT NULL DEFAULT 'Belum'"#))
        .collect::<Vec<_>>()
        .join(",\n                ");

    format!(
        "CREATE TABLE IF NOT EXISTS users (
            user_id INTEGER PRIMARY KEY,
            full_name TEXT NOT NULL DEFAULT '',
            username TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'Pending',
            agreed_terms INTEGER NOT NULL DEFAULT 0,
            location TEXT,
            registration_date TEXT NOT NULL DEFAULT '',
            notif_sholat INTEGER NOT NULL DEFAULT 1,
            notif_rangkuman INTEGER NOT NULL DEFAULT 1,
            notif_dzikir INTEGER NOT NULL DEFAULT 1,
            notif_dhuha INTEGER NOT NULL DEFAULT 1,
            notif_jumat INTEGER NOT NULL DEFAULT 1,
            notif_motivasi INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS daily_logs (
            log_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            {checklist_columns},
            UNIQUE(user_id, date)
        );

        CREATE TABLE IF NOT EXISTS feedback (
            feedback_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            timestamp TEXT NOT NULL,
            feedback_text TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS discussions (
            message_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            timestamp TEXT NOT NULL
        );"
    )
}

fn now_stamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        user_id: row.get(0)?,
        full_name: row.get(1)?,
        username: row.get(2)?,
        status: UserStatus::from_str(&row.get::<_, String>(3)?).unwrap_or(UserStatus::Pending),
        agreed_terms: row.get::<_, i64>(4)? != 0,
        location: row.get(5)?,
        registration_date: row.get(6)?,
        notif: NotifFlags {
            sholat: row.get::<_, i64>(7)? != 0,
            rangkuman: row.get::<_, i64>(8)? != 0,
            dzikir: row.get::<_, i64>(9)? != 0,
            dhuha: row.get::<_, i64>(10)? != 0,
            jumat: row.get::<_, i64>(11)? != 0,
            motivasi: row.get::<_, i64>(12)? != 0,
        },
    })
}

const USER_COLUMNS: &str = "user_id, full_name, username, status, agreed_terms, location, \
     registration_date, notif_sholat, notif_rangkuman, notif_dzikir, notif_dhuha, \
     notif_jumat, notif_motivasi";

fn log_select() -> String {
    let quoted = CHECKLIST_ITEMS
        .iter()
        .map(|i| format!(r#""{i}""#))
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT user_id, date, {quoted} FROM daily_logs")
}

fn row_to_log(row: &rusqlite::Row<'_>) -> rusqlite::Result<DailyLog> {
    let mut items = HashMap::with_capacity(CHECKLIST_ITEMS.len());
    for (idx, item) in CHECKLIST_ITEMS.iter().enumerate() {
        items.insert(item.to_string(), row.get::<_, String>(idx + 2)?);
    }
    Ok(DailyLog {
        user_id: row.get(0)?,
        date: row.get(1)?,
        items,
    })
}

impl IbadahDb {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(&schema())?;
        tracing::info!("Database opened: {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&schema())?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // ─── Users ───────────────────────────────────

    /// Fetch one user row.
    pub async fn find_user(&self, user_id: i64) -> Result<Option<UserRecord>> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let result = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
                    rusqlite::params![user_id],
                    row_to_user,
                )
                .optional()?;
            Ok(result)
        })
        .await?
    }

    /// Register a user for admin verification. An existing row is reset to
    /// Pending with terms cleared, matching re-registration semantics.
    pub async fn register_user(
        &self,
        user_id: i64,
        username: &str,
        full_name: &str,
    ) -> Result<RegisterOutcome> {
        let conn = self.conn.clone();
        let username = username.to_string();
        let full_name = full_name.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let updated = conn.execute(
                "UPDATE users SET status = 'Pending', agreed_terms = 0, full_name = ?1, username = ?2
                 WHERE user_id = ?3",
                rusqlite::params![full_name, username, user_id],
            )?;
            if updated > 0 {
                return Ok(RegisterOutcome::Reset);
            }
            conn.execute(
                "INSERT INTO users (user_id, full_name, username, registration_date)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![user_id, full_name, username, now_stamp()],
            )?;
            Ok(RegisterOutcome::Created)
        })
        .await?
    }

    /// Set a user's approval status.
    pub async fn set_status(&self, user_id: i64, status: UserStatus) -> Result<()> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "UPDATE users SET status = ?1 WHERE user_id = ?2",
                rusqlite::params![status.as_str(), user_id],
            )?;
            Ok(())
        })
        .await?
    }

    /// Record that a user accepted the terms.
    pub async fn set_agreed_terms(&self, user_id: i64) -> Result<()> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "UPDATE users SET agreed_terms = 1 WHERE user_id = ?1",
                rusqlite::params![user_id],
            )?;
            Ok(())
        })
        .await?
    }

    /// Save the user's free-text location.
    pub async fn set_location(&self, user_id: i64, location: &str) -> Result<()> {
        let conn = self.conn.clone();
        let location = location.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "UPDATE users SET location = ?1 WHERE user_id = ?2",
                rusqlite::params![location, user_id],
            )?;
            Ok(())
        })
        .await?
    }

    /// Atomically invert one notification flag and return the new value.
    ///
    /// A single UPDATE..RETURNING, so two quick taps serialize inside
    /// SQLite instead of racing a read-then-write.
    pub async fn toggle_notification(&self, user_id: i64, kind: NotifKind) -> Result<bool> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let col = kind.column();
            let new_value: i64 = conn.query_row(
                &format!("UPDATE users SET {col} = 1 - {col} WHERE user_id = ?1 RETURNING {col}"),
                rusqlite::params![user_id],
                |row| row.get(0),
            )?;
            Ok(new_value != 0)
        })
        .await?
    }

    /// Every approved user who accepted the terms, for boot reconciliation.
    pub async fn active_users(&self) -> Result<Vec<UserRecord>> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE status = 'Approved' AND agreed_terms = 1"
            ))?;
            let rows = stmt
                .query_map([], row_to_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await?
    }

    // ─── Daily logs ───────────────────────────────────

    /// Fetch the checklist row for (user, date), creating it lazily.
    pub async fn get_or_create_daily_log(&self, user_id: i64, date: &str) -> Result<DailyLog> {
        let conn = self.conn.clone();
        let date = date.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT OR IGNORE INTO daily_logs (user_id, date) VALUES (?1, ?2)",
                rusqlite::params![user_id, date],
            )?;
            let log = conn.query_row(
                &format!("{} WHERE user_id = ?1 AND date = ?2", log_select()),
                rusqlite::params![user_id, date],
                row_to_log,
            )?;
            Ok(log)
        })
        .await?
    }

    /// Set one checklist item to "Sudah"/"Belum" for (user, date).
    pub async fn update_log_item(
        &self,
        user_id: i64,
        date: &str,
        item: &str,
        status: &str,
    ) -> Result<()> {
        if !is_checklist_item(item) {
            return Err(DbError::UnknownItem(item.to_string()));
        }
        let conn = self.conn.clone();
        let date = date.to_string();
        let item = item.to_string();
        let status = status.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT OR IGNORE INTO daily_logs (user_id, date) VALUES (?1, ?2)",
                rusqlite::params![user_id, date],
            )?;
            conn.execute(
                &format!(r#"UPDATE daily_logs SET "{item}" = ?1 WHERE user_id = ?2 AND date = ?3"#),
                rusqlite::params![status, user_id, date],
            )?;
            Ok(())
        })
        .await?
    }

    /// Checklist rows for a closed date range (inclusive, "%Y-%m-%d").
    pub async fn logs_for_period(
        &self,
        user_id: i64,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<DailyLog>> {
        let conn = self.conn.clone();
        let start = start_date.to_string();
        let end = end_date.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(&format!(
                "{} WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3 ORDER BY date",
                log_select()
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, start, end], row_to_log)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await?
    }

    // ─── Feedback ───────────────────────────────────

    /// Append one feedback entry.
    pub async fn add_feedback(&self, user_id: i64, text: &str) -> Result<()> {
        let conn = self.conn.clone();
        let text = text.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT INTO feedback (user_id, timestamp, feedback_text) VALUES (?1, ?2, ?3)",
                rusqlite::params![user_id, now_stamp(), text],
            )?;
            Ok(())
        })
        .await?
    }

    // ─── Discussion history ───────────────────────────────────

    /// The user's discussion turns, oldest first.
    pub async fn discussion_history(&self, user_id: i64) -> Result<Vec<ChatTurn>> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(
                "SELECT role, content FROM discussions WHERE user_id = ?1 ORDER BY message_id",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![user_id], |row| {
                    Ok(ChatTurn {
                        role: row.get(0)?,
                        content: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await?
    }

    /// Append one discussion turn.
    pub async fn add_discussion_message(
        &self,
        user_id: i64,
        role: &str,
        content: &str,
    ) -> Result<()> {
        let conn = self.conn.clone();
        let role = role.to_string();
        let content = content.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT INTO discussions (user_id, role, content, timestamp) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![user_id, role, content, now_stamp()],
            )?;
            Ok(())
        })
        .await?
    }

    /// Drop the user's discussion history.
    pub async fn clear_discussion(&self, user_id: i64) -> Result<()> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "DELETE FROM discussions WHERE user_id = ?1",
                rusqlite::params![user_id],
            )?;
            Ok(())
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibadah_types::{STATUS_DONE, STATUS_PENDING};

    async fn db_with_user(user_id: i64) -> IbadahDb {
        let db = IbadahDb::open_in_memory().unwrap();
        db.register_user(user_id, "alice", "Alice").await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_register_and_find() {
        let db = IbadahDb::open_in_memory().unwrap();
        let outcome = db.register_user(1, "alice", "Alice").await.unwrap();
        assert_eq!(outcome, RegisterOutcome::Created);

        let user = db.find_user(1).await.unwrap().unwrap();
        assert_eq!(user.full_name, "Alice");
        assert_eq!(user.status, UserStatus::Pending);
        assert!(!user.agreed_terms);
        assert!(user.location.is_none());
        // Schema default: every notification flag starts on.
        for kind in NotifKind::ALL {
            assert!(user.notif.get(kind), "{kind:?} should default to on");
        }
    }

    #[tokio::test]
    async fn test_reregistration_resets() {
        let db = db_with_user(1).await;
        db.set_status(1, UserStatus::Approved).await.unwrap();
        db.set_agreed_terms(1).await.unwrap();

        let outcome = db.register_user(1, "alice2", "Alice B").await.unwrap();
        assert_eq!(outcome, RegisterOutcome::Reset);
        let user = db.find_user(1).await.unwrap().unwrap();
        assert_eq!(user.status, UserStatus::Pending);
        assert!(!user.agreed_terms);
        assert_eq!(user.username, "alice2");
    }

    #[tokio::test]
    async fn test_find_user_not_found() {
        let db = IbadahDb::open_in_memory().unwrap();
        assert!(db.find_user(404).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_status_and_location() {
        let db = db_with_user(1).await;
        db.set_status(1, UserStatus::Approved).await.unwrap();
        db.set_agreed_terms(1).await.unwrap();
        db.set_location(1, "Bandung").await.unwrap();

        let user = db.find_user(1).await.unwrap().unwrap();
        assert!(user.is_active());
        assert_eq!(user.location.as_deref(), Some("Bandung"));
    }

    #[tokio::test]
    async fn test_toggle_notification_flips_atomically() {
        let db = db_with_user(1).await;
        // Default on, so the first toggle turns it off.
        assert!(!db.toggle_notification(1, NotifKind::Dzikir).await.unwrap());
        assert!(db.toggle_notification(1, NotifKind::Dzikir).await.unwrap());

        let user = db.find_user(1).await.unwrap().unwrap();
        assert!(user.notif.dzikir);
        // Other flags untouched.
        assert!(user.notif.sholat);
    }

    #[tokio::test]
    async fn test_active_users_filter() {
        let db = IbadahDb::open_in_memory().unwrap();
        db.register_user(1, "a", "A").await.unwrap();
        db.register_user(2, "b", "B").await.unwrap();
        db.register_user(3, "c", "C").await.unwrap();
        db.set_status(1, UserStatus::Approved).await.unwrap();
        db.set_agreed_terms(1).await.unwrap();
        db.set_status(2, UserStatus::Approved).await.unwrap();
        // User 2 never agreed; user 3 stays Pending.

        let active = db.active_users().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].user_id, 1);
    }

    #[tokio::test]
    async fn test_daily_log_lazy_create_and_update() {
        let db = db_with_user(1).await;
        let log = db.get_or_create_daily_log(1, "2024-07-01").await.unwrap();
        assert_eq!(log.status("Subuh"), STATUS_PENDING);
        assert_eq!(log.items.len(), CHECKLIST_ITEMS.len());

        db.update_log_item(1, "2024-07-01", "Subuh", STATUS_DONE)
            .await
            .unwrap();
        let log = db.get_or_create_daily_log(1, "2024-07-01").await.unwrap();
        assert!(log.is_done("Subuh"));
        assert!(!log.is_done("Dzuhur"));
    }

    #[tokio::test]
    async fn test_one_row_per_user_date() {
        let db = db_with_user(1).await;
        db.get_or_create_daily_log(1, "2024-07-01").await.unwrap();
        db.get_or_create_daily_log(1, "2024-07-01").await.unwrap();
        let logs = db.logs_for_period(1, "2024-07-01", "2024-07-01").await.unwrap();
        assert_eq!(logs.len(), 1);
    }

    #[tokio::test]
    async fn test_update_unknown_item_rejected() {
        let db = db_with_user(1).await;
        let err = db
            .update_log_item(1, "2024-07-01", "Ngopi; DROP TABLE users", STATUS_DONE)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UnknownItem(_)));
    }

    #[tokio::test]
    async fn test_logs_for_period_range() {
        let db = db_with_user(1).await;
        for date in ["2024-07-01", "2024-07-02", "2024-07-05"] {
            db.update_log_item(1, date, "Tilawah", STATUS_DONE).await.unwrap();
        }
        let logs = db.logs_for_period(1, "2024-07-01", "2024-07-03").await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].date, "2024-07-01");
    }

    #[tokio::test]
    async fn test_quoted_column_names() {
        // Items with spaces and apostrophes are real column names.
        let db = db_with_user(1).await;
        db.update_log_item(1, "2024-07-01", "Puasa Tasu'a/Asyura", STATUS_DONE)
            .await
            .unwrap();
        let log = db.get_or_create_daily_log(1, "2024-07-01").await.unwrap();
        assert!(log.is_done("Puasa Tasu'a/Asyura"));
    }

    #[tokio::test]
    async fn test_feedback_append() {
        let db = db_with_user(1).await;
        db.add_feedback(1, "Tolong tambah fitur qibla").await.unwrap();
        db.add_feedback(1, "Jazakallah").await.unwrap();
    }

    #[tokio::test]
    async fn test_discussion_history_order_and_clear() {
        let db = db_with_user(1).await;
        db.add_discussion_message(1, "user", "Apa itu sabar?").await.unwrap();
        db.add_discussion_message(1, "assistant", "Sabar adalah...").await.unwrap();

        let history = db.discussion_history(1).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[1].role, "assistant");

        db.clear_discussion(1).await.unwrap();
        assert!(db.discussion_history(1).await.unwrap().is_empty());
    }
}
