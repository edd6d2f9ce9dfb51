use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
/// A failed request against the backend client.
///
/// The error raised by the client is captured verbatim and never reformatted
/// at this layer; turning it into a user-facing message is the presentation
/// layer's concern. The inner error is reference counted so the value stays
/// cheap to clone while travelling inside action payloads and slice state.
pub struct RequestError(Arc<anyhow::Error>);

impl RequestError {
    pub fn new<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        Self(Arc::new(anyhow::Error::new(err)))
    }

    /// Create a request error from a plain message
    pub fn msg<M>(msg: M) -> Self
    where
        M: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        Self(Arc::new(anyhow::anyhow!(msg)))
    }
}

impl From<anyhow::Error> for RequestError {
    fn from(err: anyhow::Error) -> Self {
        Self(Arc::new(err))
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err)
    }
}

// Two request errors compare equal when their rendered messages match.
// The underlying client errors are opaque, this is the only comparison
// that can be made without downcasting
impl PartialEq for RequestError {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_string() == other.0.to_string()
    }
}

impl Eq for RequestError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_renders_the_source_message_verbatim() {
        let err = RequestError::msg("network down");
        assert_eq!(err.to_string(), "network down");
    }

    #[test]
    fn it_compares_by_rendered_message() {
        let a = RequestError::msg("network down");
        let b = RequestError::msg("network down");
        let c = RequestError::msg("forbidden");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
