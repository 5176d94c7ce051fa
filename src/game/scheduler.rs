use std::time::Duration;

use async_trait::async_trait;

/// Paces a cascade between explosion steps so a renderer can keep up.
/// Pacing never changes what a cascade does, only when.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Resolve once `delay` has passed
    async fn after(&self, delay: Duration);
}

/// Real-time pacing on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn after(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Resolves at once; runs a whole cascade back to back
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateScheduler;

#[async_trait]
impl Scheduler for ImmediateScheduler {
    async fn after(&self, _delay: Duration) {
        tokio::task::yield_now().await;
    }
}
