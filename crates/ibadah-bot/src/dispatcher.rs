//! Update routing and conversation state.
//!
//! One [`Bot`] instance serves every chat; per-user conversation state
//! lives in a map keyed by Telegram user id. Handlers for the individual
//! flows sit in the sibling modules as further `impl Bot` blocks.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use ibadah_ai::AnthropicClient;
use ibadah_api::MyQuranApi;
use ibadah_db::{IbadahDb, UserRecord};
use ibadah_notify::{Notifier, ZONE};
use ibadah_telegram::TelegramApi;
use ibadah_telegram::polling::BotEvent;
use ibadah_telegram::types::{
    AnswerCallbackQueryParams, CallbackQuery, ReplyMarkup, SendMessageParams, TgMessage,
};

use crate::{keyboards, texts};

/// Where a user currently is in a multi-message flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvState {
    AwaitingName,
    AwaitingLocation,
    AwaitingFeedback,
    Discussion,
}

pub struct Bot {
    pub(crate) api: Arc<TelegramApi>,
    pub(crate) db: IbadahDb,
    pub(crate) quran: Arc<MyQuranApi>,
    pub(crate) ai: Arc<AnthropicClient>,
    pub(crate) notifier: Notifier,
    pub(crate) admin_id: i64,
    states: Mutex<HashMap<i64, ConvState>>,
}

/// Split checklist toggle data into (category, item).
pub fn parse_checklist_data(data: &str) -> Option<(&str, &str)> {
    data.strip_prefix("checklist_")?.split_once('_')
}

pub fn today_string() -> String {
    chrono::Utc::now().with_timezone(&ZONE).format("%Y-%m-%d").to_string()
}

pub fn today_date() -> chrono::NaiveDate {
    chrono::Utc::now().with_timezone(&ZONE).date_naive()
}

pub fn clock_string() -> String {
    chrono::Utc::now().with_timezone(&ZONE).format("%H:%M:%S").to_string()
}

impl Bot {
    pub fn new(
        api: Arc<TelegramApi>,
        db: IbadahDb,
        quran: Arc<MyQuranApi>,
        ai: Arc<AnthropicClient>,
        notifier: Notifier,
        admin_id: i64,
    ) -> Self {
        Self {
            api,
            db,
            quran,
            ai,
            notifier,
            admin_id,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Entry point for one polled update. Never propagates errors; the
    /// polling loop must not die over one bad chat.
    pub async fn dispatch(&self, event: BotEvent) {
        let result = match event {
            BotEvent::Message(msg) => self.handle_message(msg).await,
            BotEvent::Callback(query) => self.handle_callback(query).await,
        };
        if let Err(e) = result {
            warn!("update handling failed: {e:#}");
        }
    }

    // ─── Conversation state ───────────────────────────────────

    pub(crate) async fn set_state(&self, user_id: i64, state: ConvState) {
        self.states.lock().await.insert(user_id, state);
    }

    pub(crate) async fn clear_state(&self, user_id: i64) {
        self.states.lock().await.remove(&user_id);
    }

    async fn state_of(&self, user_id: i64) -> Option<ConvState> {
        self.states.lock().await.get(&user_id).copied()
    }

    // ─── Message routing ───────────────────────────────────

    async fn handle_message(&self, msg: TgMessage) -> anyhow::Result<()> {
        let Some(from) = &msg.from else {
            return Ok(());
        };
        if from.is_bot {
            return Ok(());
        }
        let user_id = from.id;
        let chat_id = msg.chat.id;
        let Some(text) = msg.text.clone() else {
            return Ok(());
        };

        if let Some(command) = msg.command() {
            debug!(user_id, command, "bot command");
            match command {
                "start" => {
                    self.clear_state(user_id).await;
                    return self.cmd_start(&msg).await;
                }
                "cancel" => {
                    self.clear_state(user_id).await;
                    return self.send_main_menu(chat_id, texts::CANCELLED).await;
                }
                "selesai" => return self.cmd_selesai(user_id, chat_id).await,
                "notifikasi" => return self.menu_notifications(user_id, chat_id).await,
                _ => return self.send_plain(chat_id, texts::USE_MENU).await,
            }
        }

        match self.state_of(user_id).await {
            Some(ConvState::AwaitingName) => return self.registration_name(&msg, &text).await,
            Some(ConvState::AwaitingLocation) => {
                return self.location_input(user_id, chat_id, &text).await;
            }
            Some(ConvState::AwaitingFeedback) => {
                return self.feedback_input(user_id, chat_id, &text).await;
            }
            Some(ConvState::Discussion) => {
                return self.discussion_turn(user_id, chat_id, &text).await;
            }
            None => {}
        }

        let Some(user) = self.active_user(user_id).await? else {
            return self.send_plain(chat_id, texts::USE_MENU).await;
        };
        match text.as_str() {
            texts::MENU_SHOLAT => self.menu_sholat(&user, chat_id).await,
            texts::MENU_CHECKLIST => self.menu_checklist(chat_id).await,
            texts::MENU_LAPORAN => self.menu_laporan(chat_id).await,
            texts::MENU_NOTIFIKASI => self.menu_notifications(user_id, chat_id).await,
            texts::MENU_FEEDBACK => self.menu_feedback(user_id, chat_id).await,
            texts::MENU_DISKUSI => self.menu_discussion(user_id, chat_id).await,
            _ => self.send_plain(chat_id, texts::USE_MENU).await,
        }
    }

    // ─── Callback routing ───────────────────────────────────

    async fn handle_callback(&self, query: CallbackQuery) -> anyhow::Result<()> {
        let ack = AnswerCallbackQueryParams {
            callback_query_id: query.id.clone(),
            text: None,
            show_alert: None,
        };
        if let Err(e) = self.api.answer_callback_query(&ack).await {
            debug!("answerCallbackQuery failed: {e:#}");
        }

        let Some(data) = query.data.clone() else {
            return Ok(());
        };
        let from_id = query.from.id;
        let origin = query
            .message
            .as_ref()
            .map(|m| (m.chat.id, m.message_id));
        debug!(from_id, %data, "callback query");

        if let Some(id) = data.strip_prefix("approve_") {
            return self.cb_review(from_id, origin, id.parse()?, true).await;
        }
        if let Some(id) = data.strip_prefix("reject_") {
            return self.cb_review(from_id, origin, id.parse()?, false).await;
        }
        if let Some(id) = data.strip_prefix("agree_terms_") {
            return self.cb_agree_terms(from_id, origin, id.parse()?).await;
        }
        if let Some(category) = data.strip_prefix("checklist_cat_") {
            return self.cb_checklist_category(from_id, origin, category).await;
        }
        if data == "back_to_categories" {
            return self.cb_back_to_categories(origin).await;
        }
        if let Some((category, item)) = parse_checklist_data(&data) {
            return self.cb_checklist_toggle(from_id, origin, category, item).await;
        }
        if let Some(period) = data.strip_prefix("laporan_") {
            return self.cb_report(from_id, origin, period).await;
        }
        if let Some(kind) = data.strip_prefix("toggle_notif_") {
            return self.cb_toggle_notification(from_id, origin, kind).await;
        }
        if data == "change_location" {
            self.set_state(from_id, ConvState::AwaitingLocation).await;
            if let Some((chat_id, _)) = origin {
                return self.send_plain(chat_id, texts::ASK_LOCATION).await;
            }
            return Ok(());
        }

        debug!(%data, "unhandled callback data");
        Ok(())
    }

    // ─── Shared helpers ───────────────────────────────────

    /// The user row, only when approved with terms accepted.
    pub(crate) async fn active_user(&self, user_id: i64) -> anyhow::Result<Option<UserRecord>> {
        Ok(self.db.find_user(user_id).await?.filter(UserRecord::is_active))
    }

    pub(crate) async fn send_plain(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
        self.api
            .send_message(&SendMessageParams::plain(chat_id, text))
            .await?;
        Ok(())
    }

    /// MarkdownV2 send with a plain-text retry when Telegram rejects the
    /// markup.
    pub(crate) async fn send_markdown(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> anyhow::Result<()> {
        let mut params = SendMessageParams::markdown(chat_id, text);
        params.reply_markup = markup.clone();
        if let Err(e) = self.api.send_message(&params).await {
            debug!(chat_id, "markdown send rejected, retrying plain: {e:#}");
            let mut plain = SendMessageParams::plain(chat_id, text);
            plain.reply_markup = markup;
            self.api.send_message(&plain).await?;
        }
        Ok(())
    }

    pub(crate) async fn send_main_menu(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
        self.api
            .send_message(
                &SendMessageParams::plain(chat_id, text)
                    .with_markup(ReplyMarkup::Keyboard(keyboards::main_menu())),
            )
            .await?;
        Ok(())
    }
}
