//! Message sink handed to business logic running under a service.

use std::error::Error as StdError;

/// Accepts messages without blocking the caller
pub trait Logger: Send + Sync {
    fn error(&self, message: &str);
    fn warning(&self, message: &str);
    fn info(&self, message: &str);

    /// Log an error value together with its source chain
    fn report(&self, err: &dyn StdError) {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        self.error(&message);
    }
}

/// Forwards to `tracing`, tagging every event with the service name
#[derive(Debug, Clone)]
pub struct TracingLogger {
    service: String,
}

impl TracingLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }
}

impl Logger for TracingLogger {
    fn error(&self, message: &str) {
        tracing::error!(service = %self.service, "{}", message);
    }

    fn warning(&self, message: &str) {
        tracing::warn!(service = %self.service, "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(service = %self.service, "{}", message);
    }
}
