//! Politeness delays between outbound requests.
//!
//! Waiting is behind the [`Pacer`] trait so the delay policy can be
//! asserted with a recording fake instead of real sleeps.

use std::time::Duration;

use async_trait::async_trait;

/// Suspends the current run between external requests.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// [`Pacer`] that sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
