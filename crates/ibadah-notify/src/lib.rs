//! ibadah-notify: the scheduled notification engine.
//!
//! A [`TimerRegistry`] of named tokio jobs, the [`Notifier`] orchestrator
//! that installs and retracts jobs as users flip their notification flags,
//! and the delivery handlers those jobs run. Delivery, schedule lookup,
//! and motivation text all sit behind traits so the orchestrator can be
//! driven by fakes in tests.

pub mod notifier;
pub mod registry;

pub use notifier::{Notifier, PlannedJob, plan_prayer_jobs};
pub use registry::TimerRegistry;

use async_trait::async_trait;
use chrono::NaiveDate;

use ibadah_db::DailyLog;
use ibadah_types::{DzikirTime, PrayerSchedule};

/// Every user shares one clock.
pub const ZONE: chrono_tz::Tz = chrono_tz::Asia::Jakarta;

/// Outbound message delivery.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a MarkdownV2 message to a chat.
    async fn send_markdown(&self, chat_id: i64, text: &str) -> anyhow::Result<()>;
}

/// Prayer-schedule lookup for a free-text location.
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    /// Today's schedule, or None when the location resolves to nothing.
    async fn schedule_for(
        &self,
        location: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<PrayerSchedule>>;
}

/// Motivational text composition. Implementations never fail; they fall
/// back to static strings internally.
#[async_trait]
pub trait Motivator: Send + Sync {
    /// Personal motivation over a set of logs, returned MarkdownV2-ready
    /// with its own leading separator (appended verbatim to a message).
    async fn daily_motivation(&self, logs: &[DailyLog]) -> String;
    /// Raw (unescaped) dzikir encouragement for a slot.
    async fn dzikir_motivation(&self, when: DzikirTime) -> String;
    /// Raw dhuha encouragement.
    async fn dhuha_motivation(&self) -> String;
    /// Raw Friday encouragement.
    async fn jumat_motivation(&self) -> String;
}
