//! Conversation Dispatcher
//!
//! Turns one inbound event into the outbound messages of that step of the
//! conversation. Backend failures are part of the normal flow and end in a
//! single localized error message; only transport refusals surface as
//! [`DispatchError`].

use std::sync::Arc;

use kbchat_backend::{QaBackend, QueryRequest};
use kbchat_common::Language;
use kbchat_telegram::{escape_markdown, split_message, ChatTransport, ParseMode, TransportError};

use crate::domain::catalog::{MessageCatalog, MessageKey};
use crate::domain::events::{CallbackAction, Command, InboundEvent, Sender};
use crate::domain::languages::language_keyboard;
use crate::domain::state::{ConversationEvent, ConversationState, ConversationStateMachine};
use crate::error::DispatchError;
use crate::feedback::{prompt_keyboard, FeedbackHandler, FEEDBACK_PROMPT};
use crate::resolver::LanguageResolver;

pub const LANGUAGE_PROMPT: &str = "\nPlease select a Language to proceed";
pub const HELP_TEXT: &str = "Help!";

/// What a query carries to the backend
enum Query {
    Text(String),
    Voice { file_id: String },
}

pub struct Dispatcher {
    transport: Arc<dyn ChatTransport>,
    backend: Arc<dyn QaBackend>,
    resolver: LanguageResolver,
    catalog: Arc<MessageCatalog>,
    /// Picker entries, already filtered and ordered
    languages: Arc<Vec<Language>>,
    welcome_msg: String,
    /// Commands suffixed with another bot's name are ignored
    bot_name: Option<String>,
    feedback: FeedbackHandler,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        backend: Arc<dyn QaBackend>,
        resolver: LanguageResolver,
        catalog: Arc<MessageCatalog>,
        languages: Vec<Language>,
        welcome_msg: impl Into<String>,
    ) -> Self {
        Self {
            feedback: FeedbackHandler::new(transport.clone()),
            transport,
            backend,
            resolver,
            catalog,
            languages: Arc::new(languages),
            welcome_msg: welcome_msg.into(),
            bot_name: None,
        }
    }

    pub fn with_bot_name(mut self, bot_name: impl Into<String>) -> Self {
        let bot_name = bot_name.into();
        self.bot_name = (!bot_name.trim().is_empty()).then_some(bot_name);
        self
    }

    pub fn bot_name(&self) -> Option<&str> {
        self.bot_name.as_deref()
    }

    pub fn resolver(&self) -> &LanguageResolver {
        &self.resolver
    }

    /// Handle one event to completion; returns the state it leaves the
    /// conversation in
    pub async fn dispatch(&self, event: InboundEvent) -> Result<ConversationState, DispatchError> {
        match event {
            InboundEvent::Command { sender, command } => self.on_command(&sender, command).await,
            InboundEvent::Callback {
                sender,
                callback_id,
                message_id,
                action,
            } => {
                self.on_callback(&sender, &callback_id, message_id, action)
                    .await
            }
            InboundEvent::Text {
                sender,
                message_id,
                text,
            } => self.on_query(&sender, message_id, Query::Text(text)).await,
            InboundEvent::Voice {
                sender,
                message_id,
                file_id,
            } => {
                self.on_query(&sender, message_id, Query::Voice { file_id })
                    .await
            }
        }
    }

    async fn on_command(
        &self,
        sender: &Sender,
        command: Command,
    ) -> Result<ConversationState, DispatchError> {
        match command {
            Command::Start => {
                tracing::info!(
                    id = sender.chat_id,
                    username = %sender.display_name,
                    category = "logged_in",
                    label = "logged_in",
                    "User started the bot"
                );
                self.transport
                    .send_text(
                        sender.chat_id,
                        &self.welcome_msg,
                        Some(ParseMode::Markdown),
                        None,
                    )
                    .await?;
                self.present_language_picker(sender).await
            }
            Command::SelectLanguage => self.present_language_picker(sender).await,
            Command::Help => {
                self.transport
                    .send_text(sender.chat_id, HELP_TEXT, None, None)
                    .await?;
                Ok(ConversationState::AwaitingQuery)
            }
        }
    }

    async fn present_language_picker(
        &self,
        sender: &Sender,
    ) -> Result<ConversationState, DispatchError> {
        let Some(keyboard) = language_keyboard(&self.languages) else {
            tracing::debug!(id = sender.chat_id, "No languages configured, skipping picker");
            return Ok(ConversationState::AwaitingQuery);
        };

        let next = ConversationStateMachine::transition(
            ConversationState::AwaitingQuery,
            ConversationEvent::Start,
        )?;

        self.transport
            .send_text(sender.chat_id, LANGUAGE_PROMPT, None, Some(keyboard))
            .await?;

        Ok(next)
    }

    async fn on_callback(
        &self,
        sender: &Sender,
        callback_id: &str,
        message_id: Option<i64>,
        action: CallbackAction,
    ) -> Result<ConversationState, DispatchError> {
        match action {
            CallbackAction::PickLanguage(code) => {
                self.on_language_picked(sender, callback_id, &code).await
            }
            CallbackAction::Feedback { vote, message_ref } => {
                self.feedback
                    .record(sender, callback_id, message_id, vote, &message_ref)
                    .await
            }
            CallbackAction::FeedbackReply(vote) => {
                self.feedback.acknowledge(sender, callback_id, vote).await
            }
            CallbackAction::Unknown(data) => {
                tracing::debug!(id = sender.chat_id, data = %data, "Ignoring unknown callback");
                self.transport.answer_callback(callback_id, None).await?;
                Ok(ConversationState::AwaitingQuery)
            }
        }
    }

    async fn on_language_picked(
        &self,
        sender: &Sender,
        callback_id: &str,
        code: &str,
    ) -> Result<ConversationState, DispatchError> {
        if !self.resolver.is_supported(code) {
            tracing::warn!(
                id = sender.chat_id,
                username = %sender.display_name,
                value = %code,
                "Unsupported language picked"
            );
            self.transport.answer_callback(callback_id, None).await?;
            return self.present_language_picker(sender).await;
        }

        let next = ConversationStateMachine::transition(
            ConversationState::AwaitingLanguage,
            ConversationEvent::LanguagePicked,
        )?;

        if let Err(e) = self.resolver.store(sender.chat_id, code).await {
            tracing::warn!(
                id = sender.chat_id,
                reason = e.reason(),
                error = %e,
                "Could not store language selection"
            );
        }

        tracing::info!(
            id = sender.chat_id,
            username = %sender.display_name,
            category = "language_selection",
            label = "engine_selection",
            value = %code,
            "Language selected"
        );

        self.transport.answer_callback(callback_id, None).await?;

        let language = self.resolver.resolve(sender.chat_id).await;
        let confirmation = self.catalog.text(&language, MessageKey::LanguageSelection);
        self.transport
            .send_text(
                sender.chat_id,
                &confirmation,
                Some(ParseMode::Markdown),
                None,
            )
            .await?;

        Ok(next)
    }

    async fn on_query(
        &self,
        sender: &Sender,
        message_id: i64,
        query: Query,
    ) -> Result<ConversationState, DispatchError> {
        let in_flight = ConversationStateMachine::transition(
            ConversationState::AwaitingQuery,
            ConversationEvent::QueryReceived,
        )?;

        let language = self.resolver.resolve(sender.chat_id).await;

        let (request, question) = match query {
            Query::Text(text) => {
                tracing::info!(
                    id = sender.chat_id,
                    username = %sender.display_name,
                    category = "query_handler",
                    label = "question",
                    value = %text,
                    "Question received"
                );
                (
                    QueryRequest::text(sender.user_id, text.clone(), language.clone()),
                    text,
                )
            }
            Query::Voice { file_id } => {
                let audio_url = self.voice_file_url(sender, &file_id).await;
                tracing::info!(
                    id = sender.chat_id,
                    username = %sender.display_name,
                    category = "query_handler",
                    label = "voice_question",
                    value = audio_url.as_deref().unwrap_or_default(),
                    "Voice question received"
                );
                let question = audio_url.clone().unwrap_or_default();
                (
                    QueryRequest::voice(sender.user_id, audio_url, language.clone()),
                    question,
                )
            }
        };

        let loading = self.catalog.text(&language, MessageKey::ContextLoading);
        self.transport
            .send_text(sender.chat_id, &loading, None, None)
            .await?;

        tracing::debug!(
            id = sender.chat_id,
            state = %in_flight,
            language = %language,
            "Querying KB agent"
        );

        match self.backend.send(request).await {
            Ok(answer) => {
                tracing::info!(
                    id = sender.chat_id,
                    username = %sender.display_name,
                    category = "handle_query_response",
                    label = "answer_received",
                    value = %question,
                    "Answer received"
                );

                if let Err(e) = self.send_answer(sender.chat_id, &answer.answer_text).await {
                    self.report_failure(sender, &language, &question, "answer_undeliverable", &e)
                        .await?;
                    return Ok(ConversationStateMachine::transition(
                        in_flight,
                        ConversationEvent::QueryFailed,
                    )?);
                }
                self.transport
                    .send_text(
                        sender.chat_id,
                        FEEDBACK_PROMPT,
                        Some(ParseMode::Markdown),
                        Some(prompt_keyboard(message_id)),
                    )
                    .await?;

                if let Some(url) = answer.audio_url.as_deref() {
                    self.deliver_audio(sender, url).await;
                }

                Ok(ConversationStateMachine::transition(
                    in_flight,
                    ConversationEvent::AnswerDelivered,
                )?)
            }
            Err(failure) => {
                self.report_failure(sender, &language, &question, failure.reason(), &failure)
                    .await?;
                Ok(ConversationStateMachine::transition(
                    in_flight,
                    ConversationEvent::QueryFailed,
                )?)
            }
        }
    }

    /// `None` when the file cannot be resolved; the query still goes out
    async fn voice_file_url(&self, sender: &Sender, file_id: &str) -> Option<String> {
        match self.transport.resolve_file_url(file_id).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(
                    id = sender.chat_id,
                    file_id = %file_id,
                    error = %e,
                    "Could not resolve voice file, sending empty audio reference"
                );
                None
            }
        }
    }

    /// Escaped answer, split to fit the message size limit
    async fn send_answer(&self, chat_id: i64, answer_text: &str) -> Result<(), TransportError> {
        if answer_text.trim().is_empty() {
            return Err(TransportError::Response("answer is empty".to_string()));
        }

        for chunk in split_message(&escape_markdown(answer_text)) {
            self.transport
                .send_text(chat_id, &chunk, Some(ParseMode::Markdown), None)
                .await?;
        }
        Ok(())
    }

    /// One localized error message, then the diagnostic log records
    async fn report_failure(
        &self,
        sender: &Sender,
        language: &str,
        question: &str,
        reason: &'static str,
        detail: &(dyn std::fmt::Display + Sync),
    ) -> Result<(), DispatchError> {
        let error_msg = self.catalog.text(language, MessageKey::ContextError);
        self.transport
            .send_text(sender.chat_id, &error_msg, None, None)
            .await?;

        tracing::info!(
            id = sender.chat_id,
            username = %sender.display_name,
            category = "handle_query_response",
            label = "question_sent",
            value = %question,
            "Question sent"
        );
        tracing::error!(
            id = sender.chat_id,
            username = %sender.display_name,
            category = "handle_query_response",
            label = "question_sent",
            value = %question,
            reason,
            error = %detail,
            "KB agent query failed"
        );

        Ok(())
    }

    /// Best effort; failures are logged and skipped
    async fn deliver_audio(&self, sender: &Sender, url: &str) {
        let audio = match self.backend.fetch_audio(url).await {
            Ok(audio) => audio,
            Err(e) => {
                tracing::warn!(id = sender.chat_id, url = %url, error = %e, "Answer audio fetch failed");
                return;
            }
        };

        if let Err(e) = self.transport.send_voice(sender.chat_id, audio).await {
            tracing::warn!(id = sender.chat_id, error = %e, "Answer audio delivery failed");
        }
    }
}
