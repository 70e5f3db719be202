use std::sync::Arc;

use anyhow::Result;
use teloxide::types::{ChatId, MessageId};
use teloxide::utils::command::BotCommands;
use tracing::{debug, info, warn};

use crate::callback::CallbackAction;
use crate::card::{self, Page};
use crate::config::Config;
use crate::platform::{Incoming, IncomingCallback, IncomingMessage, Messenger};
use crate::recorder;
use crate::store::{Flag, JsonStore, View};

const START_TEXT: &str = "Привет! Чтобы отправить заявку, напишите сообщение, \
                          начинающееся с 🎄, или пришлите фото.";
const NOT_FOUND: &str = "Не найдено";
const DONE: &str = "Готово";

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Команды:")]
pub enum Command {
    #[command(description = "все заявки")]
    All,
    #[command(description = "избранные заявки")]
    Favorites,
    #[command(description = "отобранные заявки")]
    Selected,
    #[command(description = "как отправить заявку")]
    Start,
}

// The derive only feeds `set_my_commands`. Parsing stays manual because
// webhook mode never learns the bot username that `BotCommands::parse` needs.
impl Command {
    /// Recognize `/cmd` or `/cmd@BotName` at the start of a message.
    pub fn from_text(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name.to_lowercase().as_str() {
            "all" => Some(Command::All),
            "favorites" => Some(Command::Favorites),
            "selected" => Some(Command::Selected),
            "start" => Some(Command::Start),
            _ => None,
        }
    }

    fn view(&self) -> Option<View> {
        match self {
            Command::All => Some(View::All),
            Command::Favorites => Some(View::Favorites),
            Command::Selected => Some(View::Selected),
            Command::Start => None,
        }
    }
}

fn empty_reply(view: View) -> &'static str {
    match view {
        View::All => "❌ Заявок нет",
        View::Favorites => "⭐ Нет избранных",
        View::Selected => "🏁 Нет отобранных",
    }
}

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub store: JsonStore,
    pub messenger: Arc<dyn Messenger>,
}

impl AppState {
    pub fn new(config: Config, messenger: Arc<dyn Messenger>) -> Self {
        let store = JsonStore::new(config.store.path.clone());
        Self {
            config,
            store,
            messenger,
        }
    }

    fn manager_chat(&self) -> ChatId {
        ChatId(self.config.telegram.manager_chat_id)
    }
}

/// Handle one inbound event end to end
pub async fn handle(state: &AppState, incoming: Incoming) -> Result<()> {
    match incoming {
        Incoming::Message(msg) => handle_message(state, msg).await,
        Incoming::Callback(cb) => handle_callback(state, cb).await,
    }
}

async fn handle_message(state: &AppState, msg: IncomingMessage) -> Result<()> {
    info!(
        "Message from {} ({}): {}",
        msg.user_name, msg.chat_id, msg.text
    );

    if msg.photo.is_none() {
        if let Some(command) = Command::from_text(&msg.text) {
            match command.view() {
                None => {
                    state.messenger.send_text(msg.chat_id, START_TEXT).await?;
                    return Ok(());
                }
                Some(view) if msg.chat_id == state.manager_chat() => {
                    return show_view(state, msg.chat_id, view).await;
                }
                Some(_) => {
                    debug!("Ignoring {:?} from non-manager chat {}", command, msg.chat_id);
                }
            }
        }
    }

    let Some(submission) =
        recorder::record(&state.store, &msg.text, msg.photo.as_deref()).await?
    else {
        return Ok(());
    };

    let card = card::render(&submission, None);
    state.messenger.send_card(state.manager_chat(), &card).await?;
    Ok(())
}

/// First card of a filtered view, as page 1 of N
async fn show_view(state: &AppState, chat_id: ChatId, view: View) -> Result<()> {
    let list = state.store.list(view).await;
    debug!("{:?} view has {} submission(s)", view, list.len());

    match list.first() {
        None => state.messenger.send_text(chat_id, empty_reply(view)).await,
        Some(first) => {
            let card = card::render(first, Some(Page::new(1, list.len())));
            state.messenger.send_card(chat_id, &card).await
        }
    }
}

async fn handle_callback(state: &AppState, cb: IncomingCallback) -> Result<()> {
    let messenger = &state.messenger;

    let Some((chat_id, message_id)) = cb.message else {
        warn!("Callback {} without an accessible message", cb.data);
        return messenger.answer_callback(&cb.id, None).await;
    };

    if chat_id != state.manager_chat() {
        warn!("Ignoring callback {} from non-manager chat {}", cb.data, chat_id);
        return messenger.answer_callback(&cb.id, None).await;
    }

    let action = match cb.data.parse::<CallbackAction>() {
        Ok(action) => action,
        Err(e) => {
            warn!("Unrecognized callback data: {:#}", e);
            return messenger.answer_callback(&cb.id, None).await;
        }
    };

    debug!("Callback {}", action);

    match action {
        CallbackAction::Noop => messenger.answer_callback(&cb.id, None).await,
        CallbackAction::Next(index) => {
            navigate(state, &cb.id, chat_id, message_id, index, true).await
        }
        CallbackAction::Prev(index) => {
            navigate(state, &cb.id, chat_id, message_id, index, false).await
        }
        CallbackAction::Favorite(id) => {
            toggle(state, &cb.id, chat_id, message_id, id, Flag::Favorite).await
        }
        CallbackAction::Select(id) => {
            toggle(state, &cb.id, chat_id, message_id, id, Flag::Selected).await
        }
    }
}

/// Wrapping step over the full list. Returns the new 0-based index.
fn step(index: usize, total: usize, forward: bool) -> usize {
    let current = index.saturating_sub(1) % total;
    if forward {
        (current + 1) % total
    } else {
        (current + total - 1) % total
    }
}

/// Replace the card with its neighbour. Paging always runs over the
/// unfiltered list, whichever view produced the card.
async fn navigate(
    state: &AppState,
    callback_id: &str,
    chat_id: ChatId,
    message_id: MessageId,
    index: usize,
    forward: bool,
) -> Result<()> {
    let list = state.store.list(View::All).await;
    let total = list.len();
    if total == 0 {
        return state
            .messenger
            .answer_callback(callback_id, Some(NOT_FOUND))
            .await;
    }

    let new_index = step(index, total, forward);

    if let Err(e) = state.messenger.delete_message(chat_id, message_id).await {
        warn!("Failed to delete previous card: {:#}", e);
    }

    let card = card::render(&list[new_index], Some(Page::new(new_index + 1, total)));
    state.messenger.send_card(chat_id, &card).await?;
    state.messenger.answer_callback(callback_id, None).await
}

async fn toggle(
    state: &AppState,
    callback_id: &str,
    chat_id: ChatId,
    message_id: MessageId,
    id: u64,
    flag: Flag,
) -> Result<()> {
    let Some(toggled) = state.store.toggle(id, flag).await? else {
        info!("Toggle for unknown submission {}", id);
        return state
            .messenger
            .answer_callback(callback_id, Some(NOT_FOUND))
            .await;
    };

    info!(
        id,
        favorite = toggled.submission.favorite,
        selected = toggled.submission.selected,
        "Submission updated"
    );

    let keyboard = card::build_keyboard(
        &toggled.submission,
        Some(Page::new(toggled.index + 1, toggled.total)),
    );
    state
        .messenger
        .edit_keyboard(chat_id, message_id, &keyboard)
        .await?;
    state.messenger.answer_callback(callback_id, Some(DONE)).await
}
