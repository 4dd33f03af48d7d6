//! # Ollabot chat pipeline
//!
//! Turns a user prompt into exactly one [`GenerationResult`]:
//!
//! ```text
//! prompt ──> reachability ──> model check ──> POST /api/generate ──> classify
//!                 │                 │                  │
//!                 └── ServiceUnavailable, ModelUnavailable, ConnectionFailed, ...
//! ```
//!
//! Every turn re-runs both health checks; nothing is cached between turns
//! except the consecutive-failure count held by the orchestrator.
//!
//! ## Usage
//!
//! ```ignore
//! use ollabot_chat::{ChatConfig, ChatRequestOrchestrator, ChatSession};
//!
//! let config = ChatConfig::from_env();
//! let mut orchestrator = ChatRequestOrchestrator::from_config(&config)?;
//! let mut session = ChatSession::new(&config);
//!
//! let result = orchestrator.respond("Hello!", &mut session).await;
//! ```

mod config;
mod error;
mod failure;
mod metrics;
mod orchestrator;
mod request;
mod result;
mod session;

pub use config::{ChatConfig, ChatConfigBuilder, DEFAULT_GENERATION_TIMEOUT, DEFAULT_SYSTEM_PROMPT};
pub use error::ChatError;
pub use failure::{FailureTracker, FailureWarning, DEFAULT_FAILURE_THRESHOLD};
pub use metrics::{ResponseSample, SessionMetrics};
pub use orchestrator::ChatRequestOrchestrator;
pub use request::{
    ConversationContext, GenerationRequest, SamplingParameters, DEFAULT_TEMPERATURE, DEFAULT_TOP_P,
};
pub use result::{ErrorKind, GenerationResult};
pub use session::{ChatSession, Message, Role};
