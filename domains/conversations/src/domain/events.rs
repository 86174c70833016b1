//! Inbound events
//!
//! Maps a raw Telegram update onto the event the dispatcher acts on.
//! Callbacks are routed by explicit payload prefix, never by content
//! heuristics.

use kbchat_telegram::{Message, Update};

use super::languages::LANGUAGE_CALLBACK_PREFIX;

pub const LIKED_CALLBACK_PREFIX: &str = "message-liked__";
pub const DISLIKED_CALLBACK_PREFIX: &str = "message-disliked__";
pub const REPLY_CALLBACK_PREFIX: &str = "replymessage_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    SelectLanguage,
}

impl Command {
    /// Parse `/name`, `/name@BotName` or `/name args`. A command addressed
    /// to another bot is not ours.
    pub fn parse(text: &str, bot_name: Option<&str>) -> Option<Self> {
        if addressed_elsewhere(text, bot_name) {
            return None;
        }
        let word = text.strip_prefix('/')?.split_whitespace().next()?;
        let name = word.split('@').next()?;
        match name {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "select_language" => Some(Self::SelectLanguage),
            _ => None,
        }
    }
}

/// `/name@Other` where `Other` is not this bot. Without a bot name every
/// suffix is accepted.
fn addressed_elsewhere(text: &str, bot_name: Option<&str>) -> bool {
    let Some(expected) = bot_name
        .map(|name| name.trim().trim_start_matches('@'))
        .filter(|name| !name.is_empty())
    else {
        return false;
    };
    let Some(word) = text
        .strip_prefix('/')
        .and_then(|rest| rest.split_whitespace().next())
    else {
        return false;
    };
    match word.split_once('@') {
        Some((_, suffix)) => !suffix.eq_ignore_ascii_case(expected),
        None => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Liked,
    Disliked,
}

impl std::fmt::Display for Vote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Liked => write!(f, "liked"),
            Self::Disliked => write!(f, "disliked"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// `lang_<code>`
    PickLanguage(String),
    /// `message-liked__<id>` / `message-disliked__<id>`
    Feedback { vote: Vote, message_ref: String },
    /// `replymessage_liked` / `replymessage_disliked`, a tap on an already
    /// redrawn feedback keyboard
    FeedbackReply(Option<Vote>),
    Unknown(String),
}

impl CallbackAction {
    pub fn parse(data: &str) -> Self {
        if let Some(code) = data.strip_prefix(LANGUAGE_CALLBACK_PREFIX) {
            return Self::PickLanguage(code.to_string());
        }
        if let Some(message_ref) = data.strip_prefix(LIKED_CALLBACK_PREFIX) {
            return Self::Feedback {
                vote: Vote::Liked,
                message_ref: message_ref.to_string(),
            };
        }
        if let Some(message_ref) = data.strip_prefix(DISLIKED_CALLBACK_PREFIX) {
            return Self::Feedback {
                vote: Vote::Disliked,
                message_ref: message_ref.to_string(),
            };
        }
        if let Some(rest) = data.strip_prefix(REPLY_CALLBACK_PREFIX) {
            let vote = match rest {
                "liked" => Some(Vote::Liked),
                "disliked" => Some(Vote::Disliked),
                _ => None,
            };
            return Self::FeedbackReply(vote);
        }
        Self::Unknown(data.to_string())
    }
}

/// Who an event came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    /// Chat the bot replies in; also keys the session language
    pub chat_id: i64,
    /// Telegram user; used as the backend session id
    pub user_id: i64,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Command {
        sender: Sender,
        command: Command,
    },
    Callback {
        sender: Sender,
        callback_id: String,
        /// Message carrying the tapped keyboard
        message_id: Option<i64>,
        action: CallbackAction,
    },
    Text {
        sender: Sender,
        message_id: i64,
        text: String,
    },
    Voice {
        sender: Sender,
        message_id: i64,
        file_id: String,
    },
}

impl InboundEvent {
    /// `None` for update kinds the bot does not handle and for commands
    /// addressed to another bot
    pub fn from_update(update: &Update, bot_name: Option<&str>) -> Option<Self> {
        if let Some(query) = &update.callback_query {
            let chat_id = query
                .message
                .as_ref()
                .map(|m| m.chat.id)
                .unwrap_or(query.from.id);
            let display_name = query
                .message
                .as_ref()
                .and_then(|m| m.chat.first_name.clone())
                .unwrap_or_else(|| query.from.first_name.clone());

            return Some(Self::Callback {
                sender: Sender {
                    chat_id,
                    user_id: query.from.id,
                    display_name,
                },
                callback_id: query.id.clone(),
                message_id: query.message.as_ref().map(|m| m.message_id),
                action: CallbackAction::parse(query.data.as_deref().unwrap_or_default()),
            });
        }

        let message = update.message.as_ref()?;
        let sender = sender_of(message);

        if let Some(text) = &message.text {
            if addressed_elsewhere(text, bot_name) {
                return None;
            }
            if let Some(command) = Command::parse(text, bot_name) {
                return Some(Self::Command { sender, command });
            }
            return Some(Self::Text {
                sender,
                message_id: message.message_id,
                text: text.clone(),
            });
        }

        message.voice.as_ref().map(|voice| Self::Voice {
            sender,
            message_id: message.message_id,
            file_id: voice.file_id.clone(),
        })
    }

    pub fn sender(&self) -> &Sender {
        match self {
            Self::Command { sender, .. }
            | Self::Callback { sender, .. }
            | Self::Text { sender, .. }
            | Self::Voice { sender, .. } => sender,
        }
    }
}

fn sender_of(message: &Message) -> Sender {
    let user_id = message
        .from
        .as_ref()
        .map(|u| u.id)
        .unwrap_or(message.chat.id);
    let display_name = message
        .chat
        .first_name
        .clone()
        .or_else(|| message.from.as_ref().map(|u| u.first_name.clone()))
        .unwrap_or_default();

    Sender {
        chat_id: message.chat.id,
        user_id,
        display_name,
    }
}
