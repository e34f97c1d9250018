//! Registration, admin verification, and terms agreement.

use tracing::{info, warn};

use ibadah_telegram::types::{
    EditMessageTextParams, ReplyMarkup, SendMessageParams, TgMessage,
};
use ibadah_types::UserStatus;

use crate::dispatcher::{Bot, ConvState};
use crate::{keyboards, texts};

impl Bot {
    /// `/start`: route an existing user by status, or begin registration.
    pub(crate) async fn cmd_start(&self, msg: &TgMessage) -> anyhow::Result<()> {
        let Some(from) = &msg.from else {
            return Ok(());
        };
        let user_id = from.id;
        let chat_id = msg.chat.id;

        match self.db.find_user(user_id).await? {
            Some(user) if user.is_active() => {
                self.send_main_menu(chat_id, texts::WELCOME_ACTIVE).await
            }
            Some(user) if user.status == UserStatus::Approved => {
                self.send_terms(chat_id, user_id).await
            }
            Some(user) if user.status == UserStatus::Rejected => {
                self.send_plain(chat_id, texts::REJECTED).await
            }
            Some(_) => self.send_plain(chat_id, texts::AWAITING_APPROVAL).await,
            None => {
                self.set_state(user_id, ConvState::AwaitingName).await;
                self.send_plain(chat_id, texts::ASK_NAME).await
            }
        }
    }

    /// The full-name reply that completes a registration request.
    pub(crate) async fn registration_name(
        &self,
        msg: &TgMessage,
        name: &str,
    ) -> anyhow::Result<()> {
        let Some(from) = &msg.from else {
            return Ok(());
        };
        let user_id = from.id;
        let chat_id = msg.chat.id;
        let name = name.trim();
        if name.is_empty() {
            return self.send_plain(chat_id, texts::ASK_NAME).await;
        }

        let username = from.username.clone().unwrap_or_default();
        self.db.register_user(user_id, &username, name).await?;
        self.clear_state(user_id).await;
        info!(user_id, "registration submitted");

        let review = format!(
            "👤 Pendaftar baru\nNama: {name}\nUsername: @{username}\nID: {user_id}"
        );
        let notify_admin = SendMessageParams::plain(self.admin_id, review)
            .with_markup(ReplyMarkup::Inline(keyboards::admin_review(user_id)));
        if let Err(e) = self.api.send_message(&notify_admin).await {
            warn!(user_id, "admin notification failed: {e:#}");
        }

        self.send_plain(chat_id, texts::AWAITING_APPROVAL).await
    }

    /// Admin pressed Approve or Reject on a review message.
    pub(crate) async fn cb_review(
        &self,
        from_id: i64,
        origin: Option<(i64, i64)>,
        target_id: i64,
        approve: bool,
    ) -> anyhow::Result<()> {
        if from_id != self.admin_id {
            warn!(from_id, "non-admin pressed a review button");
            return Ok(());
        }
        let status = if approve {
            UserStatus::Approved
        } else {
            UserStatus::Rejected
        };
        self.db.set_status(target_id, status).await?;
        info!(target_id, status = status.as_str(), "registration reviewed");

        if let Some((chat_id, message_id)) = origin {
            let verdict = if approve { "✅ Diterima" } else { "❌ Ditolak" };
            let edit = EditMessageTextParams {
                chat_id,
                message_id,
                text: format!("Pendaftar ID {target_id}: {verdict}"),
                parse_mode: None,
                reply_markup: None,
            };
            if let Err(e) = self.api.edit_message_text(&edit).await {
                warn!("review message edit failed: {e:#}");
            }
        }

        if approve {
            self.send_terms(target_id, target_id).await
        } else {
            self.send_plain(target_id, texts::REJECTED).await
        }
    }

    /// The addressed user accepted the terms: flag them, install the
    /// default notification kinds, and open the main menu.
    pub(crate) async fn cb_agree_terms(
        &self,
        from_id: i64,
        origin: Option<(i64, i64)>,
        target_id: i64,
    ) -> anyhow::Result<()> {
        if from_id != target_id {
            return Ok(());
        }
        self.db.set_agreed_terms(target_id).await?;
        self.notifier.enable_defaults(target_id).await;
        info!(user_id = target_id, "terms accepted");

        if let Some((chat_id, message_id)) = origin {
            let edit = EditMessageTextParams {
                chat_id,
                message_id,
                text: "📜 Syarat dan ketentuan telah disetujui.".into(),
                parse_mode: None,
                reply_markup: None,
            };
            if let Err(e) = self.api.edit_message_text(&edit).await {
                warn!("terms message edit failed: {e:#}");
            }
        }
        self.send_main_menu(target_id, texts::WELCOME_ACTIVE).await
    }

    async fn send_terms(&self, chat_id: i64, user_id: i64) -> anyhow::Result<()> {
        let params = SendMessageParams::plain(chat_id, texts::TERMS_AND_CONDITIONS)
            .with_markup(ReplyMarkup::Inline(keyboards::agree_terms(user_id)));
        self.api.send_message(&params).await?;
        Ok(())
    }
}
