use derive_more::Display;

/// Failures that reach the orchestrator's error state.
///
/// Expected conditions (an off-screen coordinate, an unreadable stored
/// preference, a coarser resolution served by the backend, calls after
/// dispose) are not errors and never show up here.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ChartError {
    #[display(fmt = "Network Error: {}", _0)]
    Network(String),
    #[display(fmt = "Decode Error: {}", _0)]
    Decode(String),
    #[display(fmt = "Storage Error: {}", _0)]
    Storage(String),
    #[display(fmt = "Host Chart Error: {}", _0)]
    Host(String),
}

impl std::error::Error for ChartError {}

impl ChartError {
    /// Whether the UI should offer a manual retry for this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChartError::Network(_) | ChartError::Decode(_))
    }
}

pub type ChartResult<T> = Result<T, ChartError>;
