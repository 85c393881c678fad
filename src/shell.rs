//! Line-based front-end for a [`Session`]
//!
//! Each input line maps to one [`Command`]; after running it the shell prints
//! the session's status line, the same text the mobile screens displayed.

use crate::{
    device_client::DeviceClient,
    error::ServoError,
    preset::{Preset, find_preset},
    session::{Session, SessionView},
    types::{ActiveView, Angle, ServoChannel},
};
use log::debug;

pub const HELP: &str = "\
commands:
  address <ip>             set the device IP address
  connect                  validate the address and connect
  servo <channel> <angle>  move servo 1-6 to 0-180 degrees
  presets                  list presets
  preset <number|name>     apply a preset
  status                   read the device status
  ping                     check whether the device answers
  view <manual|presets|settings>
  show                     print the current session state
  help                     this text
  quit                     leave";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Address(String),
    Connect,
    Servo(ServoChannel, Angle),
    ListPresets,
    Preset(String),
    Status,
    Ping,
    View(ActiveView),
    Show,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line; `Ok(None)` for blank lines
    pub fn parse(line: &str) -> Result<Option<Command>, ServoError> {
        let line = line.trim();
        let Some((word, rest)) = split_word(line) else {
            return Ok(None);
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "address" | "ip" => Command::Address(rest.to_string()),
            "connect" => Command::Connect,
            "servo" | "move" => {
                let Some((channel, angle)) = split_word(rest) else {
                    return Err(usage("servo <channel> <angle>"));
                };
                let channel = channel
                    .parse::<u8>()
                    .map_err(|_| usage("servo <channel> <angle>"))
                    .and_then(ServoChannel::new)?;
                let angle = angle
                    .parse::<i64>()
                    .map_err(|_| usage("servo <channel> <angle>"))?;
                Command::Servo(channel, Angle::clamped(angle))
            }
            "presets" => Command::ListPresets,
            "preset" if !rest.is_empty() => Command::Preset(rest.to_string()),
            "preset" => return Err(usage("preset <number|name>")),
            "status" => Command::Status,
            "ping" => Command::Ping,
            "view" | "tab" => Command::View(rest.parse()?),
            "show" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => {
                return Err(ServoError::Validation(format!(
                    "unknown command: {other} (try help)"
                )));
            }
        };

        Ok(Some(command))
    }
}

fn split_word(text: &str) -> Option<(&str, &str)> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => Some((word, rest.trim())),
        None => Some((text, "")),
    }
}

fn usage(text: &str) -> ServoError {
    ServoError::Validation(format!("usage: {text}"))
}

/// Whether the shell keeps reading input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Run one command against the session and return the text to print
pub async fn execute<C: DeviceClient>(
    session: &mut Session<C>,
    presets: &[Preset],
    command: Command,
) -> (Flow, String) {
    debug!("executing {command:?}");

    let output = match command {
        Command::Address(text) => {
            session.set_address(text);
            format!("address set to \"{}\"", session.address_text())
        }
        Command::Connect => {
            let _ = session.connect();
            status_line(session)
        }
        Command::Servo(channel, angle) => {
            session.select_view(ActiveView::Manual);
            let _ = session.set_channel_angle(channel, angle).await;
            status_line(session)
        }
        Command::ListPresets => {
            session.select_view(ActiveView::Presets);
            presets
                .iter()
                .enumerate()
                .map(|(i, preset)| format!("{}. {preset}", i + 1))
                .collect::<Vec<_>>()
                .join("\n")
        }
        Command::Preset(key) => {
            session.select_view(ActiveView::Presets);
            match find_preset(presets, &key) {
                Some(preset) => {
                    let _ = session.apply_preset(preset).await;
                    status_line(session)
                }
                None => format!("Error: unknown preset: {key}"),
            }
        }
        Command::Status => {
            let _ = session.refresh_status().await;
            status_line(session)
        }
        Command::Ping => {
            let _ = session.check_connection().await;
            status_line(session)
        }
        Command::View(view) => {
            session.select_view(view);
            render(&session.view())
        }
        Command::Show => render(&session.view()),
        Command::Help => HELP.to_string(),
        Command::Quit => return (Flow::Quit, "good bye".to_string()),
    };

    (Flow::Continue, output)
}

fn status_line<C: DeviceClient>(session: &Session<C>) -> String {
    session.status_message().unwrap_or_default().to_string()
}

/// Human-readable dump of a session snapshot
pub fn render(view: &SessionView) -> String {
    let mut lines = vec![
        format!("[{}]", view.connection_label),
        format!("view: {:?}", view.active_view),
        format!("address: {}", view.address),
    ];

    lines.extend(ServoChannel::all().map(|channel| {
        format!("servo {channel}: {}", view.angles[channel.index()])
    }));

    if let Some(message) = &view.status_message {
        lines.push(format!("status: {message}"));
    }

    lines.join("\n")
}
