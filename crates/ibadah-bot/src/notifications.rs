//! The per-kind notification settings menu.

use ibadah_telegram::types::{
    EditMessageReplyMarkupParams, ReplyMarkup, SendMessageParams,
};
use ibadah_types::NotifKind;

use crate::dispatcher::Bot;
use crate::keyboards;

const SETTINGS_TEXT: &str =
    "🔔 Atur notifikasi Anda. Tekan sebuah baris untuk menyalakan/mematikannya.";

impl Bot {
    pub(crate) async fn menu_notifications(
        &self,
        user_id: i64,
        chat_id: i64,
    ) -> anyhow::Result<()> {
        let Some(user) = self.active_user(user_id).await? else {
            return self.send_plain(chat_id, crate::texts::USE_MENU).await;
        };
        let params = SendMessageParams::plain(chat_id, SETTINGS_TEXT).with_markup(
            ReplyMarkup::Inline(keyboards::notification_settings(&user.notif)),
        );
        self.api.send_message(&params).await?;
        Ok(())
    }

    /// Flip one kind through the orchestrator and refresh the keyboard.
    pub(crate) async fn cb_toggle_notification(
        &self,
        from_id: i64,
        origin: Option<(i64, i64)>,
        kind_key: &str,
    ) -> anyhow::Result<()> {
        let Some(kind) = NotifKind::from_key(kind_key) else {
            return Ok(());
        };
        if self.active_user(from_id).await?.is_none() {
            return Ok(());
        }
        self.notifier.toggle(from_id, kind).await?;

        let Some((chat_id, message_id)) = origin else {
            return Ok(());
        };
        let Some(user) = self.db.find_user(from_id).await? else {
            return Ok(());
        };
        let edit = EditMessageReplyMarkupParams {
            chat_id,
            message_id,
            reply_markup: Some(keyboards::notification_settings(&user.notif)),
        };
        self.api.edit_message_reply_markup(&edit).await?;
        Ok(())
    }
}
