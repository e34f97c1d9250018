//! Telegram long-polling loop.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::TelegramApi;
use crate::types::{CallbackQuery, GetUpdatesParams, TgMessage};

/// One update worth dispatching.
#[derive(Debug)]
pub enum BotEvent {
    Message(TgMessage),
    Callback(CallbackQuery),
}

/// Run the long-polling loop, forwarding messages and callback queries as
/// [`BotEvent`]s.
///
/// Exits when `cancel` is cancelled or the `sender` is closed. Errors from
/// `getUpdates` back off exponentially up to 30 seconds.
pub async fn run_polling_loop(
    api: &TelegramApi,
    sender: mpsc::Sender<BotEvent>,
    cancel: CancellationToken,
) {
    let mut offset: Option<i64> = None;
    let mut backoff = Duration::from_secs(1);
    let max_backoff = Duration::from_secs(30);

    info!("Telegram polling loop started");

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let params = GetUpdatesParams {
            offset,
            timeout: Some(30),
            allowed_updates: Some(vec!["message".into(), "callback_query".into()]),
        };

        let updates = tokio::select! {
            _ = cancel.cancelled() => break,
            result = api.get_updates(&params) => result,
        };

        match updates {
            Ok(updates) => {
                backoff = Duration::from_secs(1);

                for update in updates {
                    offset = Some(update.update_id + 1);

                    let event = if let Some(msg) = update.message {
                        BotEvent::Message(msg)
                    } else if let Some(query) = update.callback_query {
                        BotEvent::Callback(query)
                    } else {
                        continue;
                    };

                    debug!(update_id = update.update_id, "Forwarding Telegram update");

                    if sender.send(event).await.is_err() {
                        info!("Event channel closed, stopping polling");
                        return;
                    }
                }
            }
            Err(e) => {
                warn!(backoff_secs = backoff.as_secs(), "getUpdates error: {e:#}");

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(backoff) => {},
                }

                backoff = (backoff * 2).min(max_backoff);
            }
        }
    }

    info!("Telegram polling loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_polling_loop_exits_on_cancel() {
        // Fake token, so any request would fail; cancellation must win.
        let api = TelegramApi::new("fake_token");
        let (tx, _rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        cancel.cancel();

        tokio::time::timeout(
            Duration::from_secs(2),
            run_polling_loop(&api, tx, cancel),
        )
        .await
        .expect("polling loop should exit promptly on cancel");
    }
}
