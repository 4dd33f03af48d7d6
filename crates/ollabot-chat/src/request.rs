//! Generation request construction.

use ollabot_http::api::{GenerateBody, GenerateOptions};

use crate::error::ChatError;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default nucleus-sampling probability.
pub const DEFAULT_TOP_P: f32 = 0.9;

/// Temperature and top-p, both always finite and within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParameters {
    temperature: f32,
    top_p: f32,
}

impl Default for SamplingParameters {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
        }
    }
}

impl SamplingParameters {
    /// Validate both values, rejecting anything outside `[0, 1]` or NaN.
    pub fn new(temperature: f32, top_p: f32) -> Result<Self, ChatError> {
        Ok(Self {
            temperature: check_unit("temperature", temperature)?,
            top_p: check_unit("top_p", top_p)?,
        })
    }

    /// Clamp both values into `[0, 1]`. Non-finite values fall back to the
    /// defaults.
    pub fn clamped(temperature: f32, top_p: f32) -> Self {
        Self {
            temperature: clamp_unit(temperature, DEFAULT_TEMPERATURE),
            top_p: clamp_unit(top_p, DEFAULT_TOP_P),
        }
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn top_p(&self) -> f32 {
        self.top_p
    }

    pub fn with_temperature(self, temperature: f32) -> Self {
        Self::clamped(temperature, self.top_p)
    }

    pub fn with_top_p(self, top_p: f32) -> Self {
        Self::clamped(self.temperature, top_p)
    }
}

fn check_unit(name: &'static str, value: f32) -> Result<f32, ChatError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ChatError::InvalidSampling { name, value })
    }
}

fn clamp_unit(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

/// Token state returned by the backend, threaded into the next turn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConversationContext(Vec<i64>);

impl ConversationContext {
    pub fn new(tokens: Vec<i64>) -> Self {
        Self(tokens)
    }

    pub fn tokens(&self) -> &[i64] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One user turn, ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    prompt: String,
    system_prompt: Option<String>,
    context: Option<ConversationContext>,
    sampling: SamplingParameters,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            context: None,
            sampling: SamplingParameters::default(),
        }
    }

    /// Blank system prompts are dropped.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        let system_prompt = system_prompt.into();
        self.system_prompt = (!system_prompt.trim().is_empty()).then_some(system_prompt);
        self
    }

    /// Empty contexts are dropped.
    pub fn with_context(mut self, context: Option<ConversationContext>) -> Self {
        self.context = context.filter(|c| !c.is_empty());
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingParameters) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn context(&self) -> Option<&ConversationContext> {
        self.context.as_ref()
    }

    pub fn sampling(&self) -> SamplingParameters {
        self.sampling
    }

    /// Wire body for `model`, always non-streaming.
    pub fn to_body(&self, model: &str) -> GenerateBody {
        GenerateBody {
            model: model.to_string(),
            prompt: self.prompt.clone(),
            system: self.system_prompt.clone(),
            context: self.context.as_ref().map(|c| c.tokens().to_vec()),
            stream: false,
            options: Some(GenerateOptions {
                temperature: self.sampling.temperature,
                top_p: self.sampling.top_p,
            }),
        }
    }
}
