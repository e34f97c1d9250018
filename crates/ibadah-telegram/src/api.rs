//! Telegram Bot API HTTP client.

use std::time::Duration;

use anyhow::{Context, bail};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::types::{
    AnswerCallbackQueryParams, ApiResponse, BotInfo, DeleteMessageParams,
    EditMessageReplyMarkupParams, EditMessageTextParams, GetUpdatesParams, SendChatActionParams,
    SendMessageParams, SetMyCommandsParams, TgMessage, Update,
};

/// HTTP client for the Telegram Bot API.
pub struct TelegramApi {
    client: Client,
    base_url: String,
}

impl TelegramApi {
    /// Create a new API client with the given bot token.
    pub fn new(bot_token: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build reqwest client");
        Self {
            client,
            base_url: format!("https://api.telegram.org/bot{bot_token}"),
        }
    }

    async fn call<P, T>(&self, method: &str, params: &P) -> anyhow::Result<T>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let resp: ApiResponse<T> = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .json(params)
            .send()
            .await
            .with_context(|| format!("{method} request failed"))?
            .json()
            .await
            .with_context(|| format!("{method} response parse failed"))?;

        if !resp.ok {
            bail!(
                "{method} failed: {}",
                resp.description.unwrap_or_else(|| "unknown error".into())
            );
        }
        resp.result
            .with_context(|| format!("{method} returned no result"))
    }

    /// Verify the bot token by calling `getMe`.
    pub async fn get_me(&self) -> anyhow::Result<BotInfo> {
        let resp: ApiResponse<BotInfo> = self
            .client
            .get(format!("{}/getMe", self.base_url))
            .send()
            .await
            .context("getMe request failed")?
            .json()
            .await
            .context("getMe response parse failed")?;

        if !resp.ok {
            bail!(
                "getMe failed: {}",
                resp.description.unwrap_or_else(|| "unknown error".into())
            );
        }
        resp.result.context("getMe returned no result")
    }

    /// Long-poll for updates.
    pub async fn get_updates(&self, params: &GetUpdatesParams) -> anyhow::Result<Vec<Update>> {
        self.call("getUpdates", params).await
    }

    /// Send a text message.
    pub async fn send_message(&self, params: &SendMessageParams) -> anyhow::Result<TgMessage> {
        self.call("sendMessage", params).await
    }

    /// Edit an existing message's text (and optionally its inline
    /// keyboard).
    pub async fn edit_message_text(
        &self,
        params: &EditMessageTextParams,
    ) -> anyhow::Result<TgMessage> {
        self.call("editMessageText", params).await
    }

    /// Replace or clear a message's inline keyboard.
    pub async fn edit_message_reply_markup(
        &self,
        params: &EditMessageReplyMarkupParams,
    ) -> anyhow::Result<()> {
        // Returns the edited message, or true for inline-mode messages.
        let _: serde_json::Value = self.call("editMessageReplyMarkup", params).await?;
        Ok(())
    }

    /// Delete a message.
    pub async fn delete_message(&self, params: &DeleteMessageParams) -> anyhow::Result<()> {
        let _: bool = self.call("deleteMessage", params).await?;
        Ok(())
    }

    /// Acknowledge an inline-button press.
    pub async fn answer_callback_query(
        &self,
        params: &AnswerCallbackQueryParams,
    ) -> anyhow::Result<()> {
        let _: bool = self.call("answerCallbackQuery", params).await?;
        Ok(())
    }

    /// Register bot commands in the menu.
    pub async fn set_my_commands(&self, params: &SetMyCommandsParams) -> anyhow::Result<()> {
        let _: bool = self.call("setMyCommands", params).await?;
        Ok(())
    }

    /// Send a chat action (e.g. "typing").
    pub async fn send_chat_action(&self, params: &SendChatActionParams) -> anyhow::Result<()> {
        let _: bool = self.call("sendChatAction", params).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        let api = TelegramApi::new("123:ABC");
        assert_eq!(api.base_url, "https://api.telegram.org/bot123:ABC");
    }
}
