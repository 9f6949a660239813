use async_trait::async_trait;

use crate::Error;

/// What went wrong with one email.
#[derive(Debug)]
pub struct ProcessingContext<'a> {
    pub email_subject: &'a str,
    pub handler_name: Option<&'a str>,
    pub error: &'a Error,
}

#[async_trait]
pub trait MonitoringSink: Send + Sync {
    async fn notify_processing_error(&self, context: &ProcessingContext<'_>);

    async fn notify_transport_error(&self, error: &Error);
}

/// Reports failures as `tracing` error events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMonitor;

#[async_trait]
impl MonitoringSink for TracingMonitor {
    async fn notify_processing_error(&self, context: &ProcessingContext<'_>) {
        tracing::error!(
            subject = context.email_subject,
            handler = context.handler_name.unwrap_or("-"),
            "❌ Failed to process email: {}",
            context.error
        );
    }

    async fn notify_transport_error(&self, error: &Error) {
        tracing::error!("📭 Mailbox unavailable: {}", error);
    }
}
