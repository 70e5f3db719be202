pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;
use teloxide::types::{ChatId, InlineKeyboardMarkup, MessageId};

use crate::card::Card;

/// Something that arrived through the webhook and needs handling
#[derive(Debug, Clone)]
pub enum Incoming {
    Message(IncomingMessage),
    Callback(IncomingCallback),
}

/// A chat message, reduced to what the relay cares about
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    /// Display name of the sender, for logs
    pub user_name: String,
    /// Caption for media messages, otherwise the text
    pub text: String,
    /// File id of the largest photo size
    pub photo: Option<String>,
}

/// An inline-button press
#[derive(Debug, Clone)]
pub struct IncomingCallback {
    pub id: String,
    /// The message carrying the pressed button, if Telegram still exposes it
    pub message: Option<(ChatId, MessageId)>,
    pub data: String,
}

/// Outbound side of the bot API
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a text or photo card with its keyboard
    async fn send_card(&self, chat_id: ChatId, card: &Card) -> Result<()>;

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()>;

    /// Replace only the inline keyboard of an existing message
    async fn edit_keyboard(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        keyboard: &InlineKeyboardMarkup,
    ) -> Result<()>;

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()>;

    /// Acknowledge a button press, optionally with a short notice
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Everything a `RecordingMessenger` was asked to do, in order
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Sent {
        Card(ChatId, Card),
        Text(ChatId, String),
        EditKeyboard(ChatId, MessageId, InlineKeyboardMarkup),
        Delete(ChatId, MessageId),
        Answer(String, Option<String>),
    }

    #[derive(Default)]
    pub(crate) struct RecordingMessenger {
        sent: Mutex<Vec<Sent>>,
        fail_deletes: bool,
        fail_sends: bool,
    }

    impl RecordingMessenger {
        pub(crate) fn failing_deletes() -> Self {
            Self {
                fail_deletes: true,
                ..Self::default()
            }
        }

        /// Every `send_card` / `send_text` fails, as when the Bot API is unreachable
        pub(crate) fn failing_sends() -> Self {
            Self {
                fail_sends: true,
                ..Self::default()
            }
        }

        pub(crate) fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        fn push(&self, sent: Sent) {
            self.sent.lock().unwrap().push(sent);
        }
    }

    #[async_trait]
    impl Messenger for RecordingMessenger {
        async fn send_card(&self, chat_id: ChatId, card: &Card) -> Result<()> {
            if self.fail_sends {
                anyhow::bail!("Bad Request: chat not found");
            }
            self.push(Sent::Card(chat_id, card.clone()));
            Ok(())
        }

        async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
            if self.fail_sends {
                anyhow::bail!("Bad Request: chat not found");
            }
            self.push(Sent::Text(chat_id, text.to_string()));
            Ok(())
        }

        async fn edit_keyboard(
            &self,
            chat_id: ChatId,
            message_id: MessageId,
            keyboard: &InlineKeyboardMarkup,
        ) -> Result<()> {
            self.push(Sent::EditKeyboard(chat_id, message_id, keyboard.clone()));
            Ok(())
        }

        async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
            if self.fail_deletes {
                anyhow::bail!("message to delete not found");
            }
            self.push(Sent::Delete(chat_id, message_id));
            Ok(())
        }

        async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
            self.push(Sent::Answer(
                callback_id.to_string(),
                text.map(str::to_string),
            ));
            Ok(())
        }
    }
}
