//! Feedback collection and the multi-turn Islamic discussion mode.

use chrono::Duration;
use tracing::debug;

use ibadah_report::analyze_logs;
use ibadah_telegram::types::SendChatActionParams;

use crate::dispatcher::{Bot, ConvState, today_date, today_string};
use crate::texts;

impl Bot {
    // ─── Kritik dan Saran ───────────────────────────────────

    pub(crate) async fn menu_feedback(&self, user_id: i64, chat_id: i64) -> anyhow::Result<()> {
        self.set_state(user_id, ConvState::AwaitingFeedback).await;
        self.send_plain(chat_id, texts::ASK_FEEDBACK).await
    }

    pub(crate) async fn feedback_input(
        &self,
        user_id: i64,
        chat_id: i64,
        text: &str,
    ) -> anyhow::Result<()> {
        self.db.add_feedback(user_id, text).await?;
        self.clear_state(user_id).await;

        let forward = format!("💌 Masukan dari ID {user_id}:\n\n{text}");
        if let Err(e) = self.send_plain(self.admin_id, &forward).await {
            debug!("feedback forward failed: {e:#}");
        }
        self.send_main_menu(chat_id, texts::FEEDBACK_THANKS).await
    }

    // ─── Diskusi Islami ───────────────────────────────────

    /// Enter discussion mode with a clean history.
    pub(crate) async fn menu_discussion(&self, user_id: i64, chat_id: i64) -> anyhow::Result<()> {
        self.db.clear_discussion(user_id).await?;
        self.set_state(user_id, ConvState::Discussion).await;
        self.send_plain(chat_id, texts::DISCUSSION_INTRO).await
    }

    /// One question inside discussion mode.
    pub(crate) async fn discussion_turn(
        &self,
        user_id: i64,
        chat_id: i64,
        question: &str,
    ) -> anyhow::Result<()> {
        let typing = SendChatActionParams {
            chat_id,
            action: "typing".into(),
        };
        if let Err(e) = self.api.send_chat_action(&typing).await {
            debug!("chat action failed: {e:#}");
        }

        // Prior turns only; the composer embeds the current question in
        // its master prompt.
        let history = self.db.discussion_history(user_id).await?;
        self.db.add_discussion_message(user_id, "user", question).await?;

        let week_ago = (today_date() - Duration::days(6)).format("%Y-%m-%d").to_string();
        let logs = self
            .db
            .logs_for_period(user_id, &week_ago, &today_string())
            .await?;
        let summary = analyze_logs(&logs);

        let answer = ibadah_ai::discussion_response(
            self.ai.as_ref(),
            self.quran.as_ref(),
            question,
            &history,
            &summary,
        )
        .await;

        self.db
            .add_discussion_message(user_id, "assistant", &answer)
            .await?;
        self.send_markdown(chat_id, &answer, None).await
    }

    /// `/selesai`: leave discussion mode and drop the history.
    pub(crate) async fn cmd_selesai(&self, user_id: i64, chat_id: i64) -> anyhow::Result<()> {
        self.db.clear_discussion(user_id).await?;
        self.clear_state(user_id).await;
        self.send_main_menu(chat_id, texts::DISCUSSION_DONE).await
    }
}
