//! Inline-button payloads, encoded as `action:value`.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context};

use crate::store::Flag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// `fav:{id}`
    Favorite(u64),
    /// `sel:{id}`
    Select(u64),
    /// `next:{1-based index of the card being shown}`
    Next(usize),
    /// `prev:{1-based index of the card being shown}`
    Prev(usize),
    /// Page counter button; does nothing
    Noop,
}

impl CallbackAction {
    pub fn toggle(flag: Flag, id: u64) -> Self {
        match flag {
            Flag::Favorite => CallbackAction::Favorite(id),
            Flag::Selected => CallbackAction::Select(id),
        }
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackAction::Favorite(id) => write!(f, "fav:{id}"),
            CallbackAction::Select(id) => write!(f, "sel:{id}"),
            CallbackAction::Next(index) => write!(f, "next:{index}"),
            CallbackAction::Prev(index) => write!(f, "prev:{index}"),
            CallbackAction::Noop => write!(f, "noop"),
        }
    }
}

impl FromStr for CallbackAction {
    type Err = anyhow::Error;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let (action, value) = match data.split_once(':') {
            Some((action, value)) => (action, Some(value)),
            None => (data, None),
        };

        if action == "noop" {
            return Ok(CallbackAction::Noop);
        }

        let value = value.ok_or_else(|| anyhow!("callback '{data}' has no value"))?;
        match action {
            "fav" => Ok(CallbackAction::Favorite(parse_number(value, data)?)),
            "sel" => Ok(CallbackAction::Select(parse_number(value, data)?)),
            "next" => Ok(CallbackAction::Next(parse_number(value, data)?)),
            "prev" => Ok(CallbackAction::Prev(parse_number(value, data)?)),
            other => bail!("unknown callback action '{other}'"),
        }
    }
}

fn parse_number<T: FromStr>(value: &str, data: &str) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .with_context(|| format!("callback '{data}' has a non-numeric value"))
}
