//! Retry policy for the provider boundary.
//!
//! The core itself never retries a failed provider call. Callers who want
//! retry with backoff wrap a provider in [`Retrying`]; the policy stays at
//! the boundary instead of leaking into search or chunking logic.

use std::time::Duration;

use super::{EmbeddingProvider, GenerationProvider, ProviderResult};

/// Retry policy with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first. 1 means no retry.
    pub max_attempts: u32,

    /// Delay before the first retry.
    pub initial_backoff: Duration,

    /// Backoff multiplier applied after each failed attempt.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        // No retry unless the caller opts in
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_millis(500),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy with the given number of attempts and standard backoff.
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    fn run<T>(&self, what: &str, mut op: impl FnMut() -> ProviderResult<T>) -> ProviderResult<T> {
        let mut backoff = self.initial_backoff;
        let mut attempt = 1;

        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts => {
                    tracing::warn!(
                        target: "retry",
                        "{what} attempt {attempt}/{} failed: {e}; retrying in {backoff:?}",
                        self.max_attempts
                    );
                    std::thread::sleep(backoff);
                    backoff = backoff.mul_f64(self.multiplier);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Provider wrapper that applies a [`RetryPolicy`] to every call.
///
/// Implements whichever provider traits the inner type implements, so the
/// same wrapper serves embedding and generation backends.
pub struct Retrying<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P> Retrying<P> {
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: EmbeddingProvider> EmbeddingProvider for Retrying<P> {
    fn encode(&self, texts: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
        self.policy.run("encode", || self.inner.encode(texts))
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}

impl<P: GenerationProvider> GenerationProvider for Retrying<P> {
    fn generate(&self, prompt: &str) -> ProviderResult<String> {
        self.policy.run("generate", || self.inner.generate(prompt))
    }
}
