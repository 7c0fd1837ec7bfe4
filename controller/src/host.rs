use std::{io::ErrorKind, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use relay_interlock::{Channel, RelayInterlock, RuntimeConfig, SimRelayBoard, SystemClock};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::Mutex,
};
use tracing::{info, warn};

use crate::{
    app::{RelayApp, Reply},
    command::Command,
};

const CONTROL_TICK: Duration = Duration::from_secs(1);

type HostApp = RelayApp<SimRelayBoard, SystemClock>;

#[derive(Clone)]
struct AppState {
    app: Arc<Mutex<HostApp>>,
}

struct ConfigStore {
    runtime_path: PathBuf,
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let store = ConfigStore::new();
    let mut runtime = store.load_runtime_config().await.unwrap_or_else(|err| {
        warn!(
            "failed to load runtime config from {}: {err:#}",
            store.runtime_path.display()
        );
        RuntimeConfig::default()
    });
    if let Some(enabled) = env_flag("RELAY_DEBUG") {
        runtime.debug_logging = enabled;
    }
    runtime.sanitize();

    let mut interlock = RelayInterlock::new(
        runtime.interlock.clone(),
        SimRelayBoard::new(),
        SystemClock::new(),
    )
    .context("failed to initialize relay interlock")?;
    interlock.set_debug_logging(runtime.debug_logging);

    let pins = interlock.config().pins;
    info!(
        "simulated relays ready: heat=pin {}, ac=pin {}, fan=pin {}, startup wait {}s",
        pins.pin(Channel::Heat),
        pins.pin(Channel::Ac),
        pins.pin(Channel::Fan),
        interlock.waiting_secs_left(),
    );

    let state = AppState {
        app: Arc::new(Mutex::new(RelayApp::new(interlock))),
    };

    spawn_control_loop(state.clone());
    spawn_status_loop(
        state.clone(),
        Duration::from_millis(runtime.status_interval_ms),
    );

    read_commands(&state).await?;

    state.app.lock().await.shutdown();
    info!("all relays released");
    Ok(())
}

async fn read_commands(state: &AppState) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read command from stdin")? else {
                    info!("stdin closed, running until interrupted");
                    tokio::signal::ctrl_c()
                        .await
                        .context("failed to listen for ctrl-c")?;
                    return Ok(());
                };
                if line.trim().is_empty() {
                    continue;
                }

                match line.parse::<Command>() {
                    Ok(command) => {
                        if !handle_command(state, command).await? {
                            return Ok(());
                        }
                    }
                    Err(err) => warn!("{err}"),
                }
            }
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for ctrl-c")?;
                info!("interrupt received");
                return Ok(());
            }
        }
    }
}

/// Returns `false` once the operator asked to quit.
async fn handle_command(state: &AppState, command: Command) -> anyhow::Result<bool> {
    let reply = {
        let mut app = state.app.lock().await;
        // An AC start sleeps through the fan settle delay.
        tokio::task::block_in_place(|| app.apply(command))
    };

    match reply {
        Reply::Ack => {}
        Reply::Deferred(channel) => println!("{channel} deferred, retrying every tick"),
        Reply::Status { status, demand } => {
            println!("{}", serde_json::to_string_pretty(&status)?);
            match demand {
                Some(channel) => println!("demand: {channel}"),
                None => println!("demand: none"),
            }
        }
        Reply::Quit => return Ok(false),
    }
    Ok(true)
}

fn spawn_control_loop(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CONTROL_TICK);
        loop {
            interval.tick().await;
            let mut app = state.app.lock().await;
            tokio::task::block_in_place(|| app.tick());
        }
    });
}

fn spawn_status_loop(state: AppState, period: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;

            let payload = {
                let app = state.app.lock().await;
                serde_json::to_string(&app.interlock().status())
            };

            match payload {
                Ok(body) => info!("relay status: {body}"),
                Err(err) => warn!("relay status serialization failed: {err}"),
            }
        }
    });
}

impl ConfigStore {
    fn new() -> Self {
        let data_dir = std::env::var("THERMOSTAT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.thermostat"));

        Self {
            runtime_path: data_dir.join("runtime.json"),
        }
    }

    async fn load_runtime_config(&self) -> anyhow::Result<RuntimeConfig> {
        match tokio::fs::read(&self.runtime_path).await {
            Ok(raw) => Ok(serde_json::from_slice::<RuntimeConfig>(&raw)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(RuntimeConfig::default()),
            Err(err) => Err(err.into()),
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    parse_flag(&value)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
