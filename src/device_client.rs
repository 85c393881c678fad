use crate::{
    error::ServoError,
    http_client::{check_response_status, device_http_client, handle_http_response},
    preset::Preset,
    types::{Angle, DeviceAddress, ServoChannel},
};
use log::{debug, info};
#[cfg(feature = "mock")]
use mockall::automock;
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use std::{fmt::Debug, time::Duration};
use tokio::time::{sleep, timeout};
use trait_variant::make;

/// Upper bound for the liveness probe
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Pause after each preset step; the controller drops commands sent back-to-back
pub const PRESET_STEP_DELAY: Duration = Duration::from_millis(100);

/// Port the controller's web server listens on unless configured otherwise
pub const DEFAULT_DEVICE_PORT: u16 = 80;

/// Body of `POST /servo`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ServoCommand {
    pub servo: ServoChannel,
    pub angle: Angle,
}

#[make(Send)]
#[cfg_attr(feature = "mock", automock)]
pub trait DeviceClient {
    /// Move one servo and return the raw response text
    async fn move_servo(
        &self,
        address: &DeviceAddress,
        channel: ServoChannel,
        angle: Angle,
    ) -> Result<String, ServoError>;

    /// Fetch and parse `GET /status`
    async fn status(&self, address: &DeviceAddress) -> Result<Value, ServoError>;

    /// `GET /status` judged by its status line alone; succeeds only on 2xx
    async fn probe(&self, address: &DeviceAddress) -> Result<(), ServoError>;
}

#[derive(Clone)]
pub struct HttpDeviceClient {
    client: Client,
    port: u16,
}

impl HttpDeviceClient {
    // API endpoint constants
    const SERVO_ENDPOINT: &str = "/servo";
    const STATUS_ENDPOINT: &str = "/status";

    pub fn new(port: u16) -> Result<Self, ServoError> {
        Ok(HttpDeviceClient {
            client: device_http_client()?,
            port,
        })
    }

    fn build_url(&self, address: &DeviceAddress, path: &str) -> String {
        // Normalize path to always start with a single "/"
        let normalized_path = path.trim_start_matches('/');
        format!("http://{address}:{}/{normalized_path}", self.port)
    }

    /// Send a GET request and hand back the response once its head arrived
    async fn send_get(
        &self,
        address: &DeviceAddress,
        path: &str,
        limit: Option<Duration>,
    ) -> Result<(String, Response), ServoError> {
        let url = self.build_url(address, path);
        info!("GET {url}");

        let mut request = self.client.get(&url);
        if let Some(limit) = limit {
            request = request.timeout(limit);
        }

        let res = request.send().await.map_err(|e| {
            debug!("failed to send GET request to {url}: {e}");
            ServoError::from(e)
        })?;

        Ok((url, res))
    }

    /// GET request to the device
    async fn get(&self, address: &DeviceAddress, path: &str) -> Result<String, ServoError> {
        let (url, res) = self.send_get(address, path, None).await?;
        handle_http_response(res, &format!("GET {url}")).await
    }

    /// POST request to the device with JSON body
    async fn post_json(
        &self,
        address: &DeviceAddress,
        path: &str,
        body: impl Debug + Serialize,
    ) -> Result<String, ServoError> {
        let url = self.build_url(address, path);
        info!("POST {url} with body: {body:?}");

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                debug!("failed to send POST request to {url}: {e}");
                ServoError::from(e)
            })?;

        handle_http_response(res, &format!("POST {url}")).await
    }
}

impl DeviceClient for HttpDeviceClient {
    async fn move_servo(
        &self,
        address: &DeviceAddress,
        channel: ServoChannel,
        angle: Angle,
    ) -> Result<String, ServoError> {
        let command = ServoCommand {
            servo: channel,
            angle,
        };
        self.post_json(address, Self::SERVO_ENDPOINT, command).await
    }

    async fn status(&self, address: &DeviceAddress) -> Result<Value, ServoError> {
        let body = self.get(address, Self::STATUS_ENDPOINT).await?;
        serde_json::from_str(&body).map_err(|e| ServoError::Parse(e.to_string()))
    }

    async fn probe(&self, address: &DeviceAddress) -> Result<(), ServoError> {
        // the status line decides; the body is never read
        let (url, res) = self
            .send_get(address, Self::STATUS_ENDPOINT, Some(PROBE_TIMEOUT))
            .await?;
        check_response_status(&res, &format!("GET {url}"))
    }
}

/// Liveness probe: true only if the device answered `GET /status` with 2xx
/// within [`PROBE_TIMEOUT`]. Every failure collapses into `false`.
pub async fn check_connection<C: DeviceClient>(client: &C, address: &DeviceAddress) -> bool {
    match timeout(PROBE_TIMEOUT, client.probe(address)).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            debug!("connection check to {address} failed: {e}");
            false
        }
        Err(_) => {
            debug!("connection check to {address} timed out");
            false
        }
    }
}

/// Send a preset channel by channel, pausing [`PRESET_STEP_DELAY`] after each
/// command. The first failure aborts the sequence; later channels are not sent.
///
/// `on_step` runs right before each channel is sent.
pub async fn apply_preset<C, F>(
    client: &C,
    address: &DeviceAddress,
    preset: &Preset,
    mut on_step: F,
) -> Result<String, ServoError>
where
    C: DeviceClient,
    F: FnMut(ServoChannel, Angle),
{
    for (channel, angle) in preset.steps() {
        on_step(channel, angle);
        client.move_servo(address, channel, angle).await?;
        sleep(PRESET_STEP_DELAY).await;
    }

    Ok(format!("Preset \"{}\" applied successfully.", preset.name()))
}
