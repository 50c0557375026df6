use thiserror::Error;

/// Everything that can go wrong with a single download. None of these abort
/// the run; the caller records the failure and moves on to the next task.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("body too small ({0} bytes)")]
    TooSmall(u64),

    #[error("redirect limit exceeded after {0} hops")]
    RedirectLoop(u32),

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_name_the_cause() {
        assert_eq!(FetchError::HttpStatus(404).to_string(), "HTTP 404");
        assert_eq!(
            FetchError::TooSmall(1234).to_string(),
            "body too small (1234 bytes)"
        );
        assert_eq!(
            FetchError::RedirectLoop(5).to_string(),
            "redirect limit exceeded after 5 hops"
        );
    }
}
