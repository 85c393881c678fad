use crate::{
    device_client::{self, DeviceClient},
    error::ServoError,
    preset::Preset,
    types::{
        ActiveView, Angle, CHANNEL_COUNT, ConnectionState, DEFAULT_ANGLE, DeviceAddress,
        ServoChannel,
    },
};
use log::{debug, error, info};
use serde::Serialize;
use serde_json::Value;

/// Snapshot handed to the presentation layer after every update
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub is_connected: bool,
    pub connection_label: String,
    pub address: String,
    pub angles: [Angle; CHANNEL_COUNT],
    pub status_message: Option<String>,
    pub active_view: ActiveView,
}

/// State of one controller session
///
/// Holds the typed address, whether the user connected, the last angle sent to
/// every channel and the last status line. All device traffic goes through the
/// owned [`DeviceClient`].
pub struct Session<C> {
    client: C,
    address_text: String,
    connection: ConnectionState,
    angles: [Angle; CHANNEL_COUNT],
    status_message: Option<String>,
    active_view: ActiveView,
}

impl<C: DeviceClient> Session<C> {
    pub fn new(client: C) -> Self {
        Session {
            client,
            address_text: String::new(),
            connection: ConnectionState::Disconnected,
            angles: [DEFAULT_ANGLE; CHANNEL_COUNT],
            status_message: None,
            active_view: ActiveView::default(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Store the address text as typed; the connection is left untouched
    pub fn set_address(&mut self, text: impl Into<String>) {
        self.address_text = text.into();
    }

    pub fn address_text(&self) -> &str {
        &self.address_text
    }

    /// Mark the session connected if the typed address looks like an IPv4
    /// address. The device is not contacted.
    pub fn connect(&mut self) -> Result<(), ServoError> {
        match DeviceAddress::parse(&self.address_text) {
            Ok(address) => {
                info!("connected to {address}");
                self.status_message = Some(format!("Connected to: {address}"));
                self.connection = ConnectionState::Connected(address);
                Ok(())
            }
            Err(e) => {
                error!("connect failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
                Err(e)
            }
        }
    }

    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn angle(&self, channel: ServoChannel) -> Angle {
        self.angles[channel.index()]
    }

    pub fn angles(&self) -> &[Angle; CHANNEL_COUNT] {
        &self.angles
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn active_view(&self) -> ActiveView {
        self.active_view
    }

    pub fn select_view(&mut self, view: ActiveView) {
        debug!("switching view to {view:?}");
        self.active_view = view;
    }

    /// Move one servo. The stored angle is updated before the request is sent
    /// and stays updated if the request fails.
    pub async fn set_channel_angle(
        &mut self,
        channel: ServoChannel,
        angle: Angle,
    ) -> Result<String, ServoError> {
        let address = self.connected_address()?;

        self.angles[channel.index()] = angle;
        self.status_message = Some(format!("Sending command: Servo {channel} to {angle}..."));

        match self.client.move_servo(&address, channel, angle).await {
            Ok(body) => {
                let message = if body.is_empty() {
                    "Command executed successfully".to_string()
                } else {
                    body
                };
                self.status_message = Some(message.clone());
                Ok(message)
            }
            Err(e) => {
                error!("failed to move servo {channel}: {e}");
                self.status_message = Some(format!("Error: {e}"));
                Err(e)
            }
        }
    }

    /// Apply a preset to channels 1..=6 in order. Each channel's stored angle is
    /// updated right before its command goes out; channels after a failure keep
    /// their previous value.
    pub async fn apply_preset(&mut self, preset: &Preset) -> Result<String, ServoError> {
        let address = self.connected_address()?;

        self.status_message = Some(format!("Applying preset: {}...", preset.name()));

        let angles = &mut self.angles;
        let result =
            device_client::apply_preset(&self.client, &address, preset, |channel, angle| {
                angles[channel.index()] = angle;
            })
            .await;

        match result {
            Ok(message) => {
                info!("{message}");
                self.status_message = Some(message.clone());
                Ok(message)
            }
            Err(e) => {
                error!("failed to apply preset {}: {e}", preset.name());
                self.status_message = Some(format!("Error applying preset: {e}"));
                Err(e)
            }
        }
    }

    /// Read the device status document
    pub async fn refresh_status(&mut self) -> Result<Value, ServoError> {
        let address = self.connected_address()?;

        match self.client.status(&address).await {
            Ok(status) => {
                self.status_message = Some(status.to_string());
                Ok(status)
            }
            Err(e) => {
                error!("failed to get status: {e}");
                self.status_message = Some(format!("Error: {e}"));
                Err(e)
            }
        }
    }

    /// Probe the device. Uses the connected address, or the typed one if the
    /// session is not connected yet. Never changes the connection state.
    pub async fn check_connection(&mut self) -> bool {
        let address = match &self.connection {
            ConnectionState::Connected(address) => address.clone(),
            ConnectionState::Disconnected => match DeviceAddress::parse(&self.address_text) {
                Ok(address) => address,
                Err(e) => {
                    self.status_message = Some(format!("Error: {e}"));
                    return false;
                }
            },
        };

        let reachable = device_client::check_connection(&self.client, &address).await;

        self.status_message = Some(if reachable {
            format!("Device reachable: {address}")
        } else {
            format!("Device not reachable: {address}")
        });

        reachable
    }

    pub fn view(&self) -> SessionView {
        let connection_label = match &self.connection {
            ConnectionState::Connected(address) => format!("Connected: {address}"),
            ConnectionState::Disconnected => "Disconnected".to_string(),
        };

        SessionView {
            is_connected: self.is_connected(),
            connection_label,
            address: self.address_text.clone(),
            angles: self.angles,
            status_message: self.status_message.clone(),
            active_view: self.active_view,
        }
    }

    fn connected_address(&mut self) -> Result<DeviceAddress, ServoError> {
        match &self.connection {
            ConnectionState::Connected(address) => Ok(address.clone()),
            ConnectionState::Disconnected => {
                self.status_message = Some(format!("Error: {}", ServoError::NotConnected));
                Err(ServoError::NotConnected)
            }
        }
    }
}
