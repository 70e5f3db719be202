use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQueryId, FileId, InlineKeyboardMarkup, InputFile, MessageId, UpdateKind,
};
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};

use crate::bot::Command;
use crate::card::{Card, CardPayload};
use crate::config::TelegramConfig;
use crate::platform::{Incoming, IncomingCallback, IncomingMessage, Messenger};

/// `Messenger` backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_card(&self, chat_id: ChatId, card: &Card) -> Result<()> {
        match &card.payload {
            CardPayload::Text(text) => {
                self.bot
                    .send_message(chat_id, text)
                    .reply_markup(card.keyboard.clone())
                    .await?;
            }
            CardPayload::Photo { file_id, caption } => {
                self.bot
                    .send_photo(chat_id, InputFile::file_id(FileId(file_id.clone())))
                    .caption(caption)
                    .reply_markup(card.keyboard.clone())
                    .await?;
            }
        }
        Ok(())
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.bot.send_message(chat_id, text).await?;
        Ok(())
    }

    async fn edit_keyboard(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        keyboard: &InlineKeyboardMarkup,
    ) -> Result<()> {
        self.bot
            .edit_message_reply_markup(chat_id, message_id)
            .reply_markup(keyboard.clone())
            .await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
        self.bot.delete_message(chat_id, message_id).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let mut request = self
            .bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()));
        if let Some(text) = text {
            request = request.text(text);
        }
        request.await?;
        Ok(())
    }
}

/// Reduce a raw Telegram update to what the dispatcher handles.
/// Other update kinds (edits, channel posts, polls...) yield `None`.
pub fn incoming_from_update(update: Update) -> Option<Incoming> {
    match update.kind {
        UpdateKind::Message(msg) => {
            let text = msg
                .caption()
                .or_else(|| msg.text())
                .unwrap_or_default()
                .to_string();
            let photo = msg
                .photo()
                .and_then(|sizes| sizes.last())
                .map(|size| size.file.id.0.clone());
            let user_name = msg
                .from
                .as_ref()
                .map(|user| user.full_name())
                .unwrap_or_default();

            Some(Incoming::Message(IncomingMessage {
                chat_id: msg.chat.id,
                user_name,
                text,
                photo,
            }))
        }
        UpdateKind::CallbackQuery(q) => Some(Incoming::Callback(IncomingCallback {
            id: q.id.0.clone(),
            message: q.message.as_ref().map(|m| (m.chat().id, m.id())),
            data: q.data.clone().unwrap_or_default(),
        })),
        _ => None,
    }
}

/// Point Telegram at our webhook and publish the command menu.
/// Failures are logged; the server runs regardless.
pub async fn register(bot: &Bot, config: &TelegramConfig) {
    if let Some(url) = &config.webhook_url {
        match reqwest::Url::parse(url).context("Invalid webhook URL") {
            Ok(url) => match bot.set_webhook(url.clone()).await {
                Ok(_) => info!("Webhook registered at {}", url),
                Err(e) => warn!("Failed to register webhook: {}", e),
            },
            Err(e) => warn!("{:#}", e),
        }
    }

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("Failed to publish bot commands: {}", e);
    }
}
