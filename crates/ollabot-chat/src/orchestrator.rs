//! The per-turn pipeline: check, check, generate, classify.

use ollabot_http::api::{ErrorReply, GenerateReply, GENERATE_PATH};
use ollabot_http::{HttpResponse, RetryableHttpClient, StatusCode};
use ollabot_service::{BackendHealthChecker, HealthCheck};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::{ChatConfig, DEFAULT_GENERATION_TIMEOUT};
use crate::error::ChatError;
use crate::failure::{FailureTracker, FailureWarning};
use crate::request::{ConversationContext, GenerationRequest};
use crate::result::{ErrorKind, GenerationResult};
use crate::session::ChatSession;

/// Turns one prompt into one [`GenerationResult`].
///
/// Both health checks run on every turn, in order, and a failed check
/// short-circuits the rest. The generation call uses its own client so its
/// deadline is independent of the checker's.
pub struct ChatRequestOrchestrator<H: HealthCheck = BackendHealthChecker> {
    health: H,
    http: RetryableHttpClient,
    model: String,
    generation_timeout: Duration,
    failures: FailureTracker,
    last_warning: Option<FailureWarning>,
}

impl ChatRequestOrchestrator<BackendHealthChecker> {
    /// Build the checker and the generation client from `config`.
    pub fn from_config(config: &ChatConfig) -> Result<Self, ChatError> {
        let health = BackendHealthChecker::new(&config.base_url, config.retry.clone())?
            .with_reachability_timeout(config.reachability_timeout)
            .with_model_timeout(config.model_timeout);
        let http = RetryableHttpClient::new(&config.base_url, config.retry.clone())?;

        Ok(Self::new(health, http, &config.model)
            .with_generation_timeout(config.generation_timeout)
            .with_failure_threshold(config.failure_threshold))
    }
}

impl<H: HealthCheck> ChatRequestOrchestrator<H> {
    pub fn new(health: H, http: RetryableHttpClient, model: impl Into<String>) -> Self {
        Self {
            health,
            http,
            model: model.into(),
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
            failures: FailureTracker::default(),
            last_warning: None,
        }
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failures = FailureTracker::new(threshold);
        self
    }

    pub fn health(&self) -> &H {
        &self.health
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.failures.consecutive()
    }

    /// Warning raised by the most recent turn, if any.
    pub fn warning(&self) -> Option<&FailureWarning> {
        self.last_warning.as_ref()
    }

    /// Forget past failures, e.g. after a successful restart.
    pub fn reset_failures(&mut self) {
        self.failures.reset();
        self.last_warning = None;
    }

    /// Run a turn built from `session` and record it there.
    pub async fn respond(&mut self, prompt: &str, session: &mut ChatSession) -> GenerationResult {
        let request = session.request(prompt);
        let start = Instant::now();
        let result = self.generate(&request).await;
        session.record_turn(prompt, &result, start.elapsed());
        result
    }

    /// Run the full pipeline for `request`.
    pub async fn generate(&mut self, request: &GenerationRequest) -> GenerationResult {
        let start = Instant::now();
        let result = self.run_pipeline(request).await;
        info!("Response time: {:.2}s", start.elapsed().as_secs_f64());

        self.last_warning = self.failures.record(&result);
        if let Some(warning) = &self.last_warning {
            warn!("{}", warning);
        }
        result
    }

    async fn run_pipeline(&self, request: &GenerationRequest) -> GenerationResult {
        let status = self.health.check_reachability().await;
        if !status.reachable {
            return GenerationResult::failure(ErrorKind::ServiceUnavailable, status.message);
        }

        let model = self.health.check_model_available(&self.model).await;
        if !model.available {
            return GenerationResult::failure(ErrorKind::ModelUnavailable, model.message);
        }

        let body = request.to_body(&self.model);
        debug!("Generating with {} ({} chars)", self.model, request.prompt().len());
        match self.http.post(GENERATE_PATH, &body, self.generation_timeout).await {
            Ok(response) => classify(&response),
            Err(e) => {
                error!("Generation request failed: {}", e);
                GenerationResult::failure(
                    ErrorKind::ConnectionFailed,
                    format!("Connection failed: {}", e),
                )
            }
        }
    }
}

fn classify(response: &HttpResponse) -> GenerationResult {
    match response.status() {
        StatusCode::OK => match response.json::<GenerateReply>() {
            Ok(reply) => GenerationResult::Success {
                text: reply.response,
                context: reply
                    .context
                    .filter(|tokens| !tokens.is_empty())
                    .map(ConversationContext::new),
            },
            Err(e) => {
                error!("Undecodable generation reply: {}", e);
                GenerationResult::failure(
                    ErrorKind::MalformedResponse,
                    format!("Malformed response: {}", e),
                )
            }
        },
        StatusCode::BAD_REQUEST => {
            let detail = response
                .json::<ErrorReply>()
                .map(|reply| reply.error)
                .unwrap_or_else(|_| "Invalid request".to_string());
            GenerationResult::failure(ErrorKind::InvalidRequest, detail)
        }
        other => GenerationResult::failure(
            ErrorKind::UnexpectedStatus,
            format!("Unexpected response (status code: {})", other.as_u16()),
        ),
    }
}
