use std::net::SocketAddr;

/// Receives human readable progress messages from a driver.
///
/// Only called when the session is verbose. Purely observational.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, device: &str, target: SocketAddr, message: &str);
}

/// Forwards messages as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, device: &str, target: SocketAddr, message: &str) {
        tracing::info!(device, %target, "{message}");
    }
}

impl<F> DiagnosticSink for F
where
    F: Fn(&str, SocketAddr, &str) + Send + Sync,
{
    fn emit(&self, device: &str, target: SocketAddr, message: &str) {
        self(device, target, message)
    }
}
