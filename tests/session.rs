mod mock_device;

use mock_device::MockDevice;
use servo_control::{
    Angle, HttpDeviceClient, Preset, ServoChannel, ServoError, Session, preset::builtin_presets,
    shell::{self, Command, Flow},
};
use std::{sync::Arc, time::Duration};

async fn connected_session(device: &MockDevice) -> Session<HttpDeviceClient> {
    let client = HttpDeviceClient::new(device.port).expect("failed to create client");
    let mut session = Session::new(client);
    session.set_address("127.0.0.1");
    session.connect().expect("failed to connect");
    session
}

fn channel(c: u8) -> ServoChannel {
    ServoChannel::new(c).expect("invalid channel")
}

#[tokio::test]
async fn set_channel_angle_sends_and_stores() {
    let device = MockDevice::ok("OK").await;
    let mut session = connected_session(&device).await;

    let message = session
        .set_channel_angle(channel(5), Angle::new(135).unwrap())
        .await
        .expect("set_channel_angle failed");

    assert_eq!(message, "OK");
    assert_eq!(session.angle(channel(5)).degrees(), 135);
    assert_eq!(session.status_message(), Some("OK"));
    assert_eq!(
        device.requests()[0].json(),
        serde_json::json!({"servo": 5, "angle": 135})
    );
}

#[tokio::test]
async fn apply_preset_sends_six_paced_commands_in_order() {
    let device = MockDevice::ok("").await;
    let mut session = connected_session(&device).await;
    let preset = Preset::from_degrees("Home Position", [90; 6]).unwrap();

    let message = session
        .apply_preset(&preset)
        .await
        .expect("apply_preset failed");

    assert!(message.contains("Home Position"));
    assert_eq!(session.status_message(), Some(message.as_str()));

    let requests = device.requests();
    assert_eq!(requests.len(), 6);

    for (i, request) in requests.iter().enumerate() {
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/servo");
        assert_eq!(
            request.json(),
            serde_json::json!({"servo": i + 1, "angle": 90})
        );
    }

    for pair in requests.windows(2) {
        let gap = pair[1].at.duration_since(pair[0].at);
        assert!(gap >= Duration::from_millis(100), "gap was {gap:?}");
    }
}

#[tokio::test]
async fn apply_preset_stops_at_first_failure() {
    let device = MockDevice::start(Arc::new(|index, _| {
        if index == 2 {
            (500, "servo stalled".to_string())
        } else {
            (200, String::new())
        }
    }))
    .await;
    let mut session = connected_session(&device).await;

    // move channel 5 away from the default first
    session
        .set_channel_angle(channel(5), Angle::new(10).unwrap())
        .await
        .unwrap();

    let preset = Preset::from_degrees("Arm Extended", [0, 45, 120, 30, 30, 30]).unwrap();

    // request #0 was the single move above, so the preset's 2nd step fails
    let err = session.apply_preset(&preset).await.unwrap_err();
    assert!(matches!(err, ServoError::Device { status: 500, .. }));

    let requests = device.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[2].json()["servo"], 2);

    let degrees: Vec<u8> = session.angles().iter().map(|a| a.degrees()).collect();
    assert_eq!(degrees, vec![0, 45, 90, 90, 10, 90]);
    assert_eq!(
        session.status_message(),
        Some("Error applying preset: Error 500: servo stalled")
    );
}

#[tokio::test]
async fn third_preset_step_failure_leaves_later_channels_untouched() {
    let device = MockDevice::start(Arc::new(|index, _| {
        if index == 2 {
            (500, String::new())
        } else {
            (200, String::new())
        }
    }))
    .await;
    let mut session = connected_session(&device).await;
    let preset = Preset::from_degrees("Ramp", [10, 20, 30, 40, 50, 60]).unwrap();

    assert!(session.apply_preset(&preset).await.is_err());

    let sent: Vec<u64> = device
        .requests()
        .iter()
        .map(|r| r.json()["servo"].as_u64().unwrap())
        .collect();
    assert_eq!(sent, vec![1, 2, 3]);

    let degrees: Vec<u8> = session.angles().iter().map(|a| a.degrees()).collect();
    assert_eq!(degrees, vec![10, 20, 30, 90, 90, 90]);
}

#[tokio::test]
async fn failed_move_is_reported_but_not_rolled_back() {
    let device = MockDevice::start(Arc::new(|_, _| (500, String::new()))).await;
    let mut session = connected_session(&device).await;

    let result = session
        .set_channel_angle(channel(1), Angle::new(20).unwrap())
        .await;

    assert!(result.is_err());
    assert_eq!(session.angle(channel(1)).degrees(), 20);
    assert_eq!(
        session.status_message(),
        Some("Error: Error 500: no error details")
    );
    assert!(session.is_connected());
}

#[tokio::test]
async fn ping_uses_connected_address() {
    let device = MockDevice::ok("{}").await;
    let mut session = connected_session(&device).await;

    assert!(session.check_connection().await);
    assert_eq!(session.status_message(), Some("Device reachable: 127.0.0.1"));
}

async fn run(
    session: &mut Session<HttpDeviceClient>,
    presets: &[Preset],
    line: &str,
) -> (Flow, String) {
    let command = Command::parse(line)
        .expect("failed to parse")
        .expect("blank line");
    shell::execute(session, presets, command).await
}

#[tokio::test]
async fn shell_drives_session_end_to_end() {
    let device = MockDevice::ok("").await;
    let client = HttpDeviceClient::new(device.port).expect("failed to create client");
    let mut session = Session::new(client);
    let presets = builtin_presets();

    assert_eq!(
        run(&mut session, &presets, "servo 1 45").await.1,
        "Error: please connect to a device first"
    );
    run(&mut session, &presets, "address 127.0.0.1").await;
    assert_eq!(run(&mut session, &presets, "connect").await.1, "Connected to: 127.0.0.1");
    assert_eq!(run(&mut session, &presets, "servo 1 45").await.1, "Command executed successfully");
    assert_eq!(
        run(&mut session, &presets, "preset gripper closed").await.1,
        "Preset \"Gripper Closed\" applied successfully."
    );
    assert_eq!(run(&mut session, &presets, "quit").await.0, Flow::Quit);

    assert_eq!(device.requests().len(), 7);
    assert_eq!(session.angle(channel(6)).degrees(), 0);
}
