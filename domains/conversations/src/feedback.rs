//! Thumbs-up/down feedback on answers
//!
//! Votes are logged, not stored. Tapping a reaction redraws the pair with
//! the chosen icon solid and the other outlined; further taps on the redrawn
//! pair are only acknowledged.

use std::sync::Arc;

use kbchat_telegram::{ChatTransport, InlineKeyboardButton, InlineKeyboardMarkup};

use crate::domain::events::{
    Sender, Vote, DISLIKED_CALLBACK_PREFIX, LIKED_CALLBACK_PREFIX, REPLY_CALLBACK_PREFIX,
};
use crate::domain::state::{ConversationEvent, ConversationState, ConversationStateMachine};
use crate::error::DispatchError;

pub const FEEDBACK_PROMPT: &str = "Please provide your feedback";
pub const FEEDBACK_REDRAWN_PROMPT: &str = "Please provide your feedback:";
pub const FEEDBACK_THANKS: &str = "Thanks for your feedback.";

const THUMBS_UP_OUTLINE: &str = "👍🏻";
const THUMBS_DOWN_OUTLINE: &str = "👎🏻";
const THUMBS_UP_SOLID: &str = "👍";
const THUMBS_DOWN_SOLID: &str = "👎";

/// Reaction pair attached under an answer
pub fn prompt_keyboard(message_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::new(
            THUMBS_UP_OUTLINE,
            format!("{}{}", LIKED_CALLBACK_PREFIX, message_id),
        ),
        InlineKeyboardButton::new(
            THUMBS_DOWN_OUTLINE,
            format!("{}{}", DISLIKED_CALLBACK_PREFIX, message_id),
        ),
    ]])
}

/// Reaction pair after a vote
pub fn selection_keyboard(vote: Vote) -> InlineKeyboardMarkup {
    let (up, down) = match vote {
        Vote::Liked => (THUMBS_UP_SOLID, THUMBS_DOWN_OUTLINE),
        Vote::Disliked => (THUMBS_UP_OUTLINE, THUMBS_DOWN_SOLID),
    };
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::new(up, format!("{}liked", REPLY_CALLBACK_PREFIX)),
        InlineKeyboardButton::new(down, format!("{}disliked", REPLY_CALLBACK_PREFIX)),
    ]])
}

#[derive(Clone)]
pub struct FeedbackHandler {
    transport: Arc<dyn ChatTransport>,
}

impl FeedbackHandler {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self { transport }
    }

    /// Handle a tap on a fresh reaction pair
    pub async fn record(
        &self,
        sender: &Sender,
        callback_id: &str,
        prompt_message_id: Option<i64>,
        vote: Vote,
        message_ref: &str,
    ) -> Result<ConversationState, DispatchError> {
        let next = ConversationStateMachine::transition(
            ConversationState::FeedbackPending,
            ConversationEvent::FeedbackGiven,
        )?;

        self.transport
            .answer_callback(callback_id, Some(FEEDBACK_THANKS))
            .await?;

        tracing::info!(
            id = sender.chat_id,
            username = %sender.display_name,
            category = "feedback",
            label = %vote,
            value = %message_ref,
            "Feedback received"
        );

        match prompt_message_id {
            Some(message_id) => {
                self.transport
                    .edit_message_text(
                        sender.chat_id,
                        message_id,
                        FEEDBACK_REDRAWN_PROMPT,
                        Some(selection_keyboard(vote)),
                    )
                    .await?;
            }
            None => {
                tracing::debug!(id = sender.chat_id, "Feedback prompt no longer available to redraw");
            }
        }

        Ok(next)
    }

    /// Handle a tap on an already redrawn pair
    pub async fn acknowledge(
        &self,
        sender: &Sender,
        callback_id: &str,
        vote: Option<Vote>,
    ) -> Result<ConversationState, DispatchError> {
        self.transport.answer_callback(callback_id, None).await?;

        tracing::debug!(
            id = sender.chat_id,
            vote = ?vote,
            "Repeated feedback tap acknowledged"
        );

        Ok(ConversationState::FeedbackRecorded)
    }
}
