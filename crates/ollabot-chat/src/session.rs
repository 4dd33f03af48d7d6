//! Application state for one chat session.

use std::fmt;
use std::time::Duration;

use crate::config::ChatConfig;
use crate::metrics::SessionMetrics;
use crate::request::{ConversationContext, GenerationRequest, SamplingParameters};
use crate::result::GenerationResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Assistant => f.write_str("assistant"),
        }
    }
}

/// A transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Everything the user can see or tune during a session.
///
/// Held by the front-end and lent to the orchestrator per turn.
#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<Message>,
    sampling: SamplingParameters,
    system_prompt: String,
    context: Option<ConversationContext>,
    metrics: SessionMetrics,
}

impl ChatSession {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            messages: Vec::new(),
            sampling: config.sampling,
            system_prompt: config.system_prompt.clone(),
            context: None,
            metrics: SessionMetrics::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn sampling(&self) -> SamplingParameters {
        self.sampling
    }

    /// Set the temperature, clamped into `[0, 1]`. Returns the applied value.
    pub fn set_temperature(&mut self, temperature: f32) -> f32 {
        self.sampling = self.sampling.with_temperature(temperature);
        self.sampling.temperature()
    }

    /// Set top-p, clamped into `[0, 1]`. Returns the applied value.
    pub fn set_top_p(&mut self, top_p: f32) -> f32 {
        self.sampling = self.sampling.with_top_p(top_p);
        self.sampling.top_p()
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = prompt.into();
    }

    pub fn context(&self) -> Option<&ConversationContext> {
        self.context.as_ref()
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    /// Build the request for `prompt` from the current settings.
    pub fn request(&self, prompt: &str) -> GenerationRequest {
        GenerationRequest::new(prompt)
            .with_system_prompt(self.system_prompt.clone())
            .with_context(self.context.clone())
            .with_sampling(self.sampling)
    }

    /// Append a finished turn to the transcript and metrics.
    ///
    /// The prompt is always kept; the reply only on success.
    pub fn record_turn(&mut self, prompt: &str, result: &GenerationResult, elapsed: Duration) {
        self.messages.push(Message {
            role: Role::User,
            content: prompt.to_string(),
        });

        if let GenerationResult::Success { text, context } = result {
            self.messages.push(Message {
                role: Role::Assistant,
                content: text.clone(),
            });
            if let Some(context) = context {
                self.context = Some(context.clone());
            }
        }

        self.metrics.record(elapsed, result.is_success());
    }

    /// Forget the transcript and the backend context. Metrics are kept.
    pub fn clear_history(&mut self) {
        self.messages.clear();
        self.context = None;
    }
}
