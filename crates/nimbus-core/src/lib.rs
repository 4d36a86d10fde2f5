pub mod backend;
pub mod config;
pub mod error;
pub mod exchange;
pub mod state;
pub mod weather;

// Re-export main types for convenience
pub use backend::{HealthStatus, HttpBackend, QueryRequest, QueryResponse, WeatherBackend};
pub use config::Config;
pub use error::{BackendError, SessionError};
pub use exchange::{
    ExchangeController, ExchangeOutcome, ExchangeState, PendingExchange, Session,
    UNREACHABLE_NOTICE,
};
pub use state::{ChatMessage, ChatRole, Conversation, MessageId, WeatherInsights};
pub use weather::{CategoryProjector, WeatherCategory};
