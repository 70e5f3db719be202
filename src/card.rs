//! Card builder: message payload plus inline keyboard for one submission

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::callback::CallbackAction;
use crate::store::{Flag, Submission};

const FAVORITE_ADD: &str = "⭐ В избранное";
const FAVORITE_REMOVE: &str = "⭐ Убрать";
const SELECTED_ADD: &str = "🏁 В отбор";
const SELECTED_REMOVE: &str = "🏁 Убрать";
const NAV_PREV: &str = "← Назад";
const NAV_NEXT: &str = "Вперёд →";

/// What a card shows above its buttons
#[derive(Debug, Clone, PartialEq)]
pub enum CardPayload {
    Text(String),
    Photo { file_id: String, caption: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub payload: CardPayload,
    pub keyboard: InlineKeyboardMarkup,
}

/// Position of a card inside the list being paged through (1-based index)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub index: usize,
    pub total: usize,
}

impl Page {
    pub fn new(index: usize, total: usize) -> Self {
        Self { index, total }
    }
}

fn toggle_button(submission: &Submission, flag: Flag) -> InlineKeyboardButton {
    let label = match flag {
        Flag::Favorite if submission.favorite => FAVORITE_REMOVE,
        Flag::Favorite => FAVORITE_ADD,
        Flag::Selected if submission.selected => SELECTED_REMOVE,
        Flag::Selected => SELECTED_ADD,
    };
    InlineKeyboardButton::callback(
        label,
        CallbackAction::toggle(flag, submission.id).to_string(),
    )
}

/// Toggle row, plus a prev / counter / next row when `page` is given.
pub fn build_keyboard(submission: &Submission, page: Option<Page>) -> InlineKeyboardMarkup {
    let mut rows = vec![vec![
        toggle_button(submission, Flag::Favorite),
        toggle_button(submission, Flag::Selected),
    ]];

    if let Some(page) = page {
        rows.push(vec![
            InlineKeyboardButton::callback(NAV_PREV, CallbackAction::Prev(page.index).to_string()),
            InlineKeyboardButton::callback(
                format!("{}/{}", page.index, page.total),
                CallbackAction::Noop.to_string(),
            ),
            InlineKeyboardButton::callback(NAV_NEXT, CallbackAction::Next(page.index).to_string()),
        ]);
    }

    InlineKeyboardMarkup::new(rows)
}

pub fn render(submission: &Submission, page: Option<Page>) -> Card {
    let payload = match &submission.photo {
        Some(file_id) => CardPayload::Photo {
            file_id: file_id.clone(),
            caption: submission.text.clone(),
        },
        None => CardPayload::Text(submission.text.clone()),
    };

    Card {
        payload,
        keyboard: build_keyboard(submission, page),
    }
}
