//! Concrete capability implementations wired into the notifier.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

use ibadah_ai::{AnthropicClient, ScriptureSource, TextCompleter};
use ibadah_api::MyQuranApi;
use ibadah_db::DailyLog;
use ibadah_notify::{Motivator, ScheduleSource, Transport};
use ibadah_telegram::TelegramApi;
use ibadah_telegram::types::SendMessageParams;
use ibadah_types::{DzikirTime, PrayerSchedule};

/// Sends through the Bot API, retrying a rejected MarkdownV2 message as
/// plain text.
pub struct TelegramTransport {
    api: Arc<TelegramApi>,
}

impl TelegramTransport {
    pub fn new(api: Arc<TelegramApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_markdown(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
        let markdown = SendMessageParams::markdown(chat_id, text);
        if let Err(e) = self.api.send_message(&markdown).await {
            debug!(chat_id, "markdown send rejected, retrying plain: {e:#}");
            self.api
                .send_message(&SendMessageParams::plain(chat_id, text))
                .await?;
        }
        Ok(())
    }
}

/// Schedule lookups backed by the MyQuran API.
pub struct MyQuranSchedules {
    api: Arc<MyQuranApi>,
}

impl MyQuranSchedules {
    pub fn new(api: Arc<MyQuranApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ScheduleSource for MyQuranSchedules {
    async fn schedule_for(
        &self,
        location: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<PrayerSchedule>> {
        self.api.prayer_schedule(location, date).await
    }
}

/// Motivation text backed by the AI composers. Scripture grounding comes
/// from the MyQuran API; every composer carries its own fallback.
pub struct AiMotivator {
    ai: Arc<AnthropicClient>,
    scripture: Arc<MyQuranApi>,
}

impl AiMotivator {
    pub fn new(ai: Arc<AnthropicClient>, scripture: Arc<MyQuranApi>) -> Self {
        Self { ai, scripture }
    }

    fn completer(&self) -> &dyn TextCompleter {
        self.ai.as_ref()
    }

    fn source(&self) -> &dyn ScriptureSource {
        self.scripture.as_ref()
    }
}

#[async_trait]
impl Motivator for AiMotivator {
    async fn daily_motivation(&self, logs: &[DailyLog]) -> String {
        ibadah_ai::motivational_message(self.completer(), self.source(), logs).await
    }

    async fn dzikir_motivation(&self, when: DzikirTime) -> String {
        ibadah_ai::dzikir_motivation(self.completer(), when).await
    }

    async fn dhuha_motivation(&self) -> String {
        ibadah_ai::dhuha_motivation(self.completer()).await
    }

    async fn jumat_motivation(&self) -> String {
        ibadah_ai::jumat_motivation(self.completer()).await
    }
}
