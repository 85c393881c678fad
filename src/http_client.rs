use crate::error::ServoError;
use log::{debug, error};
use reqwest::{Client, Response};
use std::time::Duration;
use tokio::time::timeout;

/// How long an error body may take to arrive before it is dropped
pub const ERROR_BODY_TIMEOUT: Duration = Duration::from_secs(1);

/// Create the plain HTTP client used to reach the servo controller
///
/// The device only speaks unencrypted HTTP/1.1, so no TLS backend is
/// configured and no proxy is consulted.
pub fn device_http_client() -> Result<Client, ServoError> {
    Client::builder()
        .no_proxy()
        .http1_only()
        .build()
        .map_err(|e| {
            error!("failed to create device HTTP client: {e}");
            ServoError::from(e)
        })
}

/// Handle HTTP response by checking status and extracting body
///
/// The status is checked before the body is read, so a device that sends an
/// error status and then stalls or breaks off the body still yields
/// `ServoError::Device` with its status code.
///
/// # Arguments
/// * `res` - The HTTP response to handle
/// * `context_msg` - Context message describing the request (e.g., "POST /servo")
///
/// # Returns
/// * `Ok(String)` - The response body if the status is successful
/// * `Err(ServoError::Device)` - If the status is not successful, with the body
///   text (empty if it could not be read within [`ERROR_BODY_TIMEOUT`])
/// * `Err(ServoError::Transport)` - If reading a success body fails
pub async fn handle_http_response(res: Response, context_msg: &str) -> Result<String, ServoError> {
    if !res.status().is_success() {
        return Err(device_error(res, context_msg).await);
    }
    res.text().await.map_err(ServoError::from)
}

/// Read the body of a non-2xx response into a `ServoError::Device`
async fn device_error(res: Response, context_msg: &str) -> ServoError {
    let status = res.status();
    let body = match timeout(ERROR_BODY_TIMEOUT, res.text()).await {
        Ok(Ok(body)) => body,
        Ok(Err(e)) => {
            debug!("{context_msg}: failed to read error body: {e}");
            String::new()
        }
        Err(_) => {
            debug!("{context_msg}: error body did not arrive in time");
            String::new()
        }
    };

    debug!("{context_msg} failed with status {status} and body: {body}");

    ServoError::Device {
        status: status.as_u16(),
        body,
    }
}

/// Fail with `ServoError::Device` (empty body) unless the status is 2xx.
/// Never touches the body.
pub fn check_response_status(res: &Response, context_msg: &str) -> Result<(), ServoError> {
    let status = res.status();
    if status.is_success() {
        return Ok(());
    }

    debug!("{context_msg} failed with status {status}");
    Err(ServoError::Device {
        status: status.as_u16(),
        body: String::new(),
    })
}
