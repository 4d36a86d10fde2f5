//! Request/response reconciliation for the weather conversation
//!
//! A [`Session`] owns the message log, the exchange state and the weather
//! category. An exchange is opened with [`Session::begin`], which hands back a
//! [`PendingExchange`] token, and closed by passing that token to
//! [`Session::settle`]. All mutation happens inside those two calls; the
//! remote request in between touches no session state.
//!
//! [`ExchangeController`] drives the protocol against a [`WeatherBackend`],
//! either inline ([`ExchangeController::submit`]) or on a background task
//! ([`ExchangeController::dispatch`] then [`ExchangeController::wait_settled`])
//! so a UI can keep drawing while the request is outstanding.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::{QueryResponse, WeatherBackend};
use crate::error::{BackendError, SessionError};
use crate::state::{ChatMessage, Conversation, IdSequence, WeatherInsights};
use crate::weather::{CategoryProjector, WeatherCategory};

/// Shown in place of an answer when the backend could not be reached.
pub const UNREACHABLE_NOTICE: &str = "⚠️ Unable to reach backend.";

const EMPTY_ANSWER_NOTICE: &str = "The weather service returned an empty answer.";
const UNSPECIFIED_FAILURE_NOTICE: &str = "The weather service could not answer that request.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangeState {
    #[default]
    Idle,
    InFlight,
}

/// Proof that an exchange was begun; consumed when it settles.
#[derive(Debug)]
#[must_use = "an exchange stays in flight until its token is settled"]
pub struct PendingExchange {
    query: String,
}

impl PendingExchange {
    /// The trimmed text to send to the backend
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// The three ways an exchange can end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    Answered {
        text: String,
        insights: Option<WeatherInsights>,
        category: WeatherCategory,
    },
    Refused {
        text: String,
    },
    Unreachable,
}

impl ExchangeOutcome {
    pub fn from_result(result: Result<QueryResponse, BackendError>) -> Self {
        match result {
            Ok(response) => Self::from_response(response),
            Err(err) => {
                warn!(error = %err, "weather backend unreachable");
                ExchangeOutcome::Unreachable
            }
        }
    }

    pub fn from_response(response: QueryResponse) -> Self {
        let QueryResponse {
            success,
            response,
            error,
            weather_type,
            insights,
        } = response;

        if !success {
            return ExchangeOutcome::Refused {
                text: non_blank(error).unwrap_or_else(|| UNSPECIFIED_FAILURE_NOTICE.to_string()),
            };
        }

        match non_blank(response) {
            Some(text) => ExchangeOutcome::Answered {
                text,
                insights,
                category: WeatherCategory::from_wire(weather_type.as_deref()),
            },
            None => ExchangeOutcome::Refused {
                text: EMPTY_ANSWER_NOTICE.to_string(),
            },
        }
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

/// One conversation: its log, exchange state and weather category
#[derive(Debug, Default)]
pub struct Session {
    conversation: Conversation,
    state: ExchangeState,
    category: CategoryProjector,
    ids: IdSequence,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn is_in_flight(&self) -> bool {
        self.state == ExchangeState::InFlight
    }

    pub fn category(&self) -> WeatherCategory {
        self.category.current()
    }

    /// Accept a submission: record the user's message and mark the exchange in flight.
    ///
    /// Blank input and submissions while another exchange is outstanding are
    /// rejected without touching any state.
    pub fn begin(&mut self, raw_input: &str) -> Result<PendingExchange, SessionError> {
        let query = raw_input.trim();
        if query.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        if self.is_in_flight() {
            return Err(SessionError::ExchangeInFlight);
        }

        let id = self.ids.next_id();
        self.append(ChatMessage::user(id, raw_input))?;
        self.state = ExchangeState::InFlight;
        info!(message_id = %id, "weather exchange started");

        Ok(PendingExchange {
            query: query.to_string(),
        })
    }

    /// Close the exchange behind `pending` with the backend's result.
    ///
    /// Appends exactly one assistant message and returns it.
    pub fn settle(
        &mut self,
        pending: PendingExchange,
        result: Result<QueryResponse, BackendError>,
    ) -> &ChatMessage {
        self.settle_outcome(pending, ExchangeOutcome::from_result(result))
    }

    pub fn settle_outcome(
        &mut self,
        pending: PendingExchange,
        outcome: ExchangeOutcome,
    ) -> &ChatMessage {
        drop(pending);
        let id = self.ids.next_id();

        let message = match outcome {
            ExchangeOutcome::Answered {
                text,
                insights,
                category,
            } => {
                self.category.project(category);
                info!(message_id = %id, %category, "weather exchange answered");
                ChatMessage::assistant(id, text, insights)
            }
            // Category intentionally left as is: only transport failures reset it.
            ExchangeOutcome::Refused { text } => {
                info!(message_id = %id, "weather exchange refused by backend");
                ChatMessage::assistant(id, text, None)
            }
            ExchangeOutcome::Unreachable => {
                self.category.reset();
                ChatMessage::assistant(id, UNREACHABLE_NOTICE, None)
            }
        };

        self.state = ExchangeState::Idle;
        self.conversation.push(message);
        &self.conversation.messages()[self.conversation.len() - 1]
    }

    fn append(&mut self, message: ChatMessage) -> Result<(), SessionError> {
        if message.is_user() && self.is_in_flight() {
            return Err(SessionError::InvariantViolation(
                "user message appended while an exchange is in flight",
            ));
        }
        self.conversation.push(message);
        Ok(())
    }
}

struct InFlight {
    pending: PendingExchange,
    task: JoinHandle<Result<QueryResponse, BackendError>>,
}

/// Runs weather exchanges for a [`Session`] against a backend
pub struct ExchangeController {
    session: Session,
    backend: Arc<dyn WeatherBackend>,
    in_flight: Option<InFlight>,
}

impl ExchangeController {
    pub fn new(backend: Arc<dyn WeatherBackend>) -> Self {
        Self {
            session: Session::new(),
            backend,
            in_flight: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_in_flight(&self) -> bool {
        self.session.is_in_flight()
    }

    /// Run one exchange to completion.
    ///
    /// Returns the assistant's reply, or `None` if the submission was ignored.
    /// Cancel safe: if dropped mid-request, [`Self::wait_settled`] finishes it.
    pub async fn submit(&mut self, raw_input: &str) -> Option<&ChatMessage> {
        if !self.dispatch(raw_input) {
            return None;
        }
        self.wait_settled().await
    }

    /// Start an exchange whose request runs on a background task.
    ///
    /// Returns `false` if the submission was ignored. Must be called from
    /// within a tokio runtime.
    pub fn dispatch(&mut self, raw_input: &str) -> bool {
        let Some(pending) = self.accept(raw_input) else {
            return false;
        };

        let backend = Arc::clone(&self.backend);
        let query = pending.query().to_string();
        let task = tokio::spawn(async move { backend.query(&query).await });
        self.in_flight = Some(InFlight { pending, task });
        true
    }

    /// Wait for the dispatched request to finish and settle it.
    ///
    /// Cancel safe: dropping the future before the request completes leaves
    /// the exchange in flight. Returns `None` when nothing was dispatched.
    pub async fn wait_settled(&mut self) -> Option<&ChatMessage> {
        let in_flight = self.in_flight.as_mut()?;
        let joined = (&mut in_flight.task).await;

        let InFlight { pending, .. } = self.in_flight.take()?;
        let result = joined.unwrap_or_else(|err| Err(BackendError::Aborted(err.to_string())));
        Some(self.session.settle(pending, result))
    }

    fn accept(&mut self, raw_input: &str) -> Option<PendingExchange> {
        match self.session.begin(raw_input) {
            Ok(pending) => Some(pending),
            Err(reason) => {
                debug!(%reason, "submission ignored");
                None
            }
        }
    }
}
