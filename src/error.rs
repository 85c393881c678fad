use thiserror::Error;

/// Everything that can go wrong while talking to the servo controller
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ServoError {
    /// Malformed user input (address, channel or angle)
    #[error("{0}")]
    Validation(String),

    #[error("please connect to a device first")]
    NotConnected,

    /// Request could not be sent or no response was received
    #[error("{0}")]
    Transport(String),

    /// Device answered with a non-success status
    #[error("Error {status}: {}", device_body(.body))]
    Device { status: u16, body: String },

    /// Status body is not valid JSON
    #[error("failed to parse status: {0}")]
    Parse(String),
}

fn device_body(body: &str) -> &str {
    if body.is_empty() {
        "no error details"
    } else {
        body
    }
}

impl From<reqwest::Error> for ServoError {
    fn from(e: reqwest::Error) -> Self {
        let mut message = if e.is_timeout() {
            format!("request timed out: {e}")
        } else {
            e.to_string()
        };

        // reqwest keeps the interesting part (refused, dns) in the source chain
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            message.push_str(&format!(": {cause}"));
            source = cause.source();
        }

        ServoError::Transport(message)
    }
}
