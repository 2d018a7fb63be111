//! Driven port for checking that a backing service answers.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Failures reported by dependency checks.
    pub enum ProbeError {
        /// Dependency did not answer.
        Unreachable { message: String } => "dependency unreachable: {message}",
    }
}

/// Driven port for readiness checks against a backing service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DependencyProbe: Send + Sync {
    /// Short name used in readiness reports, e.g. `database`.
    fn name(&self) -> &'static str;

    /// Check that the dependency answers.
    async fn check(&self) -> Result<(), ProbeError>;
}
