//! Prayer times, the daily checklist, and devotion reports.

use chrono::Duration;
use tracing::warn;

use ibadah_report::{ReportPeriod, generate_report};
use ibadah_db::UserRecord;
use ibadah_telegram::types::{
    EditMessageReplyMarkupParams, EditMessageTextParams, ReplyMarkup, SendMessageParams,
};
use ibadah_types::{STATUS_DONE, STATUS_PENDING};

use crate::dispatcher::{Bot, ConvState, clock_string, today_date, today_string};
use crate::{keyboards, texts};

impl Bot {
    // ─── Waktu Sholat ───────────────────────────────────

    pub(crate) async fn menu_sholat(
        &self,
        user: &UserRecord,
        chat_id: i64,
    ) -> anyhow::Result<()> {
        match &user.location {
            Some(city) => self.show_schedule(user.user_id, chat_id, city).await,
            None => {
                self.set_state(user.user_id, ConvState::AwaitingLocation).await;
                self.send_plain(chat_id, texts::ASK_LOCATION).await
            }
        }
    }

    /// A city reply while awaiting a location: validate it by fetching a
    /// schedule, save it on success.
    pub(crate) async fn location_input(
        &self,
        user_id: i64,
        chat_id: i64,
        city: &str,
    ) -> anyhow::Result<()> {
        let city = city.trim();
        let found = match self.quran.prayer_schedule(city, today_date()).await {
            Ok(found) => found,
            Err(e) => {
                warn!(user_id, "location validation failed: {e:#}");
                None
            }
        };
        if found.is_none() {
            return self.send_plain(chat_id, texts::LOCATION_NOT_FOUND).await;
        }

        self.db.set_location(user_id, city).await?;
        self.clear_state(user_id).await;
        self.send_plain(chat_id, &format!("📍 Lokasi tersimpan: {city}"))
            .await?;
        self.show_schedule(user_id, chat_id, city).await
    }

    /// Today's schedule plus a personal motivation over the last week.
    async fn show_schedule(&self, user_id: i64, chat_id: i64, city: &str) -> anyhow::Result<()> {
        let schedule = match self.quran.prayer_schedule(city, today_date()).await {
            Ok(Some(schedule)) => schedule,
            Ok(None) => {
                return self
                    .send_plain(chat_id, texts::LOCATION_NOT_FOUND)
                    .await;
            }
            Err(e) => {
                warn!(user_id, "schedule fetch failed: {e:#}");
                return self
                    .send_plain(chat_id, "Gagal mengambil jadwal sholat. Coba lagi nanti.")
                    .await;
            }
        };

        let mut text = ibadah_api::format_schedule(city, &schedule, &clock_string());
        let week_ago = (today_date() - Duration::days(6)).format("%Y-%m-%d").to_string();
        let logs = self
            .db
            .logs_for_period(user_id, &week_ago, &today_string())
            .await?;
        text.push_str(
            &ibadah_ai::motivational_message(self.ai.as_ref(), self.quran.as_ref(), &logs).await,
        );

        self.send_markdown(
            chat_id,
            &text,
            Some(ReplyMarkup::Inline(keyboards::change_location())),
        )
        .await
    }

    // ─── Checklist ───────────────────────────────────

    pub(crate) async fn menu_checklist(&self, chat_id: i64) -> anyhow::Result<()> {
        let params = SendMessageParams::plain(chat_id, "📝 Pilih kategori ibadah:")
            .with_markup(ReplyMarkup::Inline(keyboards::checklist_categories()));
        self.api.send_message(&params).await?;
        Ok(())
    }

    pub(crate) async fn cb_checklist_category(
        &self,
        from_id: i64,
        origin: Option<(i64, i64)>,
        category: &str,
    ) -> anyhow::Result<()> {
        if self.active_user(from_id).await?.is_none() {
            return Ok(());
        }
        let Some((chat_id, message_id)) = origin else {
            return Ok(());
        };
        let Some(items) = keyboards::category_items(category, today_date()) else {
            return Ok(());
        };
        let log = self.db.get_or_create_daily_log(from_id, &today_string()).await?;
        let edit = EditMessageTextParams {
            chat_id,
            message_id,
            text: "📝 Tandai ibadah yang sudah dikerjakan hari ini:".into(),
            parse_mode: None,
            reply_markup: Some(keyboards::checklist_items(category, &items, &log)),
        };
        self.api.edit_message_text(&edit).await?;
        Ok(())
    }

    /// Flip one item Sudah↔Belum and refresh the keyboard in place.
    pub(crate) async fn cb_checklist_toggle(
        &self,
        from_id: i64,
        origin: Option<(i64, i64)>,
        category: &str,
        item: &str,
    ) -> anyhow::Result<()> {
        // Stale inline keyboards outlive a demotion; inactive users must
        // not keep writing log rows through them.
        if self.active_user(from_id).await?.is_none() {
            return Ok(());
        }
        let today = today_string();
        let log = self.db.get_or_create_daily_log(from_id, &today).await?;
        let status = if log.is_done(item) {
            STATUS_PENDING
        } else {
            STATUS_DONE
        };
        self.db.update_log_item(from_id, &today, item, status).await?;

        let Some((chat_id, message_id)) = origin else {
            return Ok(());
        };
        let Some(items) = keyboards::category_items(category, today_date()) else {
            return Ok(());
        };
        let log = self.db.get_or_create_daily_log(from_id, &today).await?;
        let edit = EditMessageReplyMarkupParams {
            chat_id,
            message_id,
            reply_markup: Some(keyboards::checklist_items(category, &items, &log)),
        };
        self.api.edit_message_reply_markup(&edit).await?;
        Ok(())
    }

    pub(crate) async fn cb_back_to_categories(
        &self,
        origin: Option<(i64, i64)>,
    ) -> anyhow::Result<()> {
        let Some((chat_id, message_id)) = origin else {
            return Ok(());
        };
        let edit = EditMessageTextParams {
            chat_id,
            message_id,
            text: "📝 Pilih kategori ibadah:".into(),
            parse_mode: None,
            reply_markup: Some(keyboards::checklist_categories()),
        };
        self.api.edit_message_text(&edit).await?;
        Ok(())
    }

    // ─── Laporan ───────────────────────────────────

    pub(crate) async fn menu_laporan(&self, chat_id: i64) -> anyhow::Result<()> {
        let params = SendMessageParams::plain(chat_id, "📊 Pilih periode laporan:")
            .with_markup(ReplyMarkup::Inline(keyboards::report_periods()));
        self.api.send_message(&params).await?;
        Ok(())
    }

    pub(crate) async fn cb_report(
        &self,
        from_id: i64,
        origin: Option<(i64, i64)>,
        period_key: &str,
    ) -> anyhow::Result<()> {
        if self.active_user(from_id).await?.is_none() {
            return Ok(());
        }
        let Some((chat_id, _)) = origin else {
            return Ok(());
        };
        let Some(period) = ReportPeriod::from_key(period_key) else {
            return Ok(());
        };
        let start = (today_date() - Duration::days(period.window_days() - 1))
            .format("%Y-%m-%d")
            .to_string();
        let logs = self
            .db
            .logs_for_period(from_id, &start, &today_string())
            .await?;
        let report = generate_report(&logs, period);
        self.send_markdown(chat_id, &report, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ibadah_ai::AnthropicClient;
    use ibadah_api::MyQuranApi;
    use ibadah_db::IbadahDb;
    use ibadah_notify::Notifier;
    use ibadah_telegram::TelegramApi;

    use crate::adapters::{AiMotivator, MyQuranSchedules, TelegramTransport};

    async fn bot_with_pending_user() -> Bot {
        let api = Arc::new(TelegramApi::new("123:fake"));
        let db = IbadahDb::open_in_memory().unwrap();
        db.register_user(1, "alice", "Alice").await.unwrap();
        let quran = Arc::new(MyQuranApi::new());
        let ai = Arc::new(AnthropicClient::new(None));
        let notifier = Notifier::new(
            db.clone(),
            Arc::new(TelegramTransport::new(api.clone())),
            Arc::new(MyQuranSchedules::new(quran.clone())),
            Arc::new(AiMotivator::new(ai.clone(), quran.clone())),
        );
        Bot::new(api, db, quran, ai, notifier, 99)
    }

    #[tokio::test]
    async fn test_checklist_callbacks_ignore_inactive_users() {
        // A user awaiting approval still holds yesterday's inline
        // keyboards; pressing them must not touch the daily log.
        let bot = bot_with_pending_user().await;
        bot.cb_checklist_toggle(1, Some((1, 10)), "wajib", "Subuh")
            .await
            .unwrap();
        bot.cb_checklist_category(1, Some((1, 10)), "wajib").await.unwrap();
        bot.cb_report(1, Some((1, 10)), "harian").await.unwrap();

        let today = today_string();
        let logs = bot.db.logs_for_period(1, &today, &today).await.unwrap();
        assert!(logs.is_empty());
    }
}
