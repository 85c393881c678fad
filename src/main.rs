use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};
use log::{error, info};
use servo_control::{
    DeviceClient, HttpDeviceClient, Session,
    config::AppConfig,
    preset::{Preset, builtin_presets, load_presets},
    shell::{self, Command, Flow},
};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, stdin, stdout};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("application error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    initialize();

    let config = AppConfig::load().context("failed to load application configuration")?;

    let client =
        HttpDeviceClient::new(config.device.port).context("failed to create device client")?;

    let mut presets = builtin_presets();
    if let Some(file) = &config.presets.file {
        presets.extend(load_presets(file)?);
    }

    let mut session = Session::new(client);
    if let Some(address) = &config.device.address {
        session.set_address(address.as_str());
    }

    run_shell(&mut session, &presets).await
}

fn initialize() {
    log_panics::init();

    let mut builder = if cfg!(debug_assertions) {
        Builder::from_env(Env::default().default_filter_or("debug"))
    } else {
        Builder::from_env(Env::default().default_filter_or("info"))
    };

    builder.format(|f, record| match record.level() {
        log::Level::Error => {
            eprintln!("{}", record.args());
            Ok(())
        }
        _ => {
            writeln!(f, "{}", record.args())
        }
    });

    builder.target(Target::Stdout).init();

    info!("module version: {}", env!("CARGO_PKG_VERSION"));
}

async fn run_shell<C: DeviceClient>(session: &mut Session<C>, presets: &[Preset]) -> Result<()> {
    let mut out = stdout();
    let mut lines = BufReader::new(stdin()).lines();

    out.write_all(format!("{}\n", shell::HELP).as_bytes())
        .await
        .context("failed to write to stdout")?;

    loop {
        out.write_all(b"> ")
            .await
            .context("failed to write to stdout")?;
        out.flush().await.context("failed to flush stdout")?;

        let Some(line) = lines
            .next_line()
            .await
            .context("failed to read from stdin")?
        else {
            break;
        };

        let output = match Command::parse(&line) {
            Ok(Some(command)) => match shell::execute(session, presets, command).await {
                (Flow::Continue, output) => output,
                (Flow::Quit, output) => {
                    out.write_all(format!("{output}\n").as_bytes())
                        .await
                        .context("failed to write to stdout")?;
                    break;
                }
            },
            Ok(None) => continue,
            Err(e) => format!("Error: {e}"),
        };

        out.write_all(format!("{output}\n").as_bytes())
            .await
            .context("failed to write to stdout")?;
    }

    info!("good bye");

    Ok(())
}
