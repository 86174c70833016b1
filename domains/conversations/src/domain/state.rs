//! State machine for a session's conversation
//!
//! States are not persisted; each inbound event runs the part of the
//! machine it drives, starting from the state that event implies.
//!
//! ```text
//! AwaitingLanguage --LanguagePicked--> LanguageConfirmed
//! (any idle state) --QueryReceived--> QueryInFlight
//! QueryInFlight --AnswerDelivered--> FeedbackPending --FeedbackGiven--> FeedbackRecorded
//! QueryInFlight --QueryFailed--> AwaitingQuery
//! (any idle state) --Start--> AwaitingLanguage
//! ```

pub use kbchat_common::StateError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    AwaitingLanguage,
    LanguageConfirmed,
    AwaitingQuery,
    QueryInFlight,
    FeedbackPending,
    FeedbackRecorded,
}

impl ConversationState {
    /// States in which a new query or command may start
    pub fn is_idle(&self) -> bool {
        !matches!(self, Self::QueryInFlight)
    }

    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [ConversationState] {
        match self {
            Self::QueryInFlight => &[Self::FeedbackPending, Self::AwaitingQuery],
            Self::FeedbackPending => &[
                Self::FeedbackRecorded,
                Self::AwaitingLanguage,
                Self::LanguageConfirmed,
                Self::QueryInFlight,
            ],
            Self::AwaitingLanguage
            | Self::LanguageConfirmed
            | Self::AwaitingQuery
            | Self::FeedbackRecorded => &[
                Self::AwaitingLanguage,
                Self::LanguageConfirmed,
                Self::QueryInFlight,
            ],
        }
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AwaitingLanguage => write!(f, "awaiting_language"),
            Self::LanguageConfirmed => write!(f, "language_confirmed"),
            Self::AwaitingQuery => write!(f, "awaiting_query"),
            Self::QueryInFlight => write!(f, "query_in_flight"),
            Self::FeedbackPending => write!(f, "feedback_pending"),
            Self::FeedbackRecorded => write!(f, "feedback_recorded"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConversationEvent {
    /// `/start` or `/select_language`
    Start,
    /// A language picker button was tapped
    LanguagePicked,
    /// A text or voice query arrived
    QueryReceived,
    /// The backend answered and the answer was sent
    AnswerDelivered,
    /// The backend call failed
    QueryFailed,
    /// A reaction button was tapped
    FeedbackGiven,
}

impl std::fmt::Display for ConversationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::LanguagePicked => write!(f, "language_picked"),
            Self::QueryReceived => write!(f, "query_received"),
            Self::AnswerDelivered => write!(f, "answer_delivered"),
            Self::QueryFailed => write!(f, "query_failed"),
            Self::FeedbackGiven => write!(f, "feedback_given"),
        }
    }
}

pub struct ConversationStateMachine;

impl ConversationStateMachine {
    /// Attempt a state transition
    pub fn transition(
        current: ConversationState,
        event: ConversationEvent,
    ) -> Result<ConversationState, StateError> {
        use ConversationEvent as E;
        use ConversationState as S;

        let next = match (current, event) {
            (S::FeedbackRecorded, E::FeedbackGiven) => {
                return Err(StateError::TerminalState(current.to_string()));
            }
            (S::FeedbackPending, E::FeedbackGiven) => S::FeedbackRecorded,

            (S::QueryInFlight, E::AnswerDelivered) => S::FeedbackPending,
            (S::QueryInFlight, E::QueryFailed) => S::AwaitingQuery,

            (state, E::Start) if state.is_idle() => S::AwaitingLanguage,
            (state, E::LanguagePicked) if state.is_idle() => S::LanguageConfirmed,
            (state, E::QueryReceived) if state.is_idle() => S::QueryInFlight,

            _ => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }
}
