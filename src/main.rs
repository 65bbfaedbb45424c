//! ==============================================================================
//! main.rs - sensor-hub CLI
//! ==============================================================================
//!
//! purpose:
//!     command-line consumer of the client library. each subcommand maps to
//!     one backend operation; `dashboard` pipes the full reading set through
//!     the aggregator the way the app's dashboard screen does.
//!
//! responsibilities:
//!     - load client.toml (saved url + token) and build the session client
//!     - wire the unauthorized callback so an expired session drops the
//!       persisted token and tells the user to log in again
//!     - persist url/token changes back through the config collaborator
//!
//! relationships:
//!     - uses: client.rs (all backend traffic)
//!     - uses: aggregate.rs (dashboard summaries)
//!     - uses: config.rs (persistence; the client itself never touches disk)
//!
//! ==============================================================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use sensor_hub_client::{aggregate, ClientConfig, SensorReadingCreate, SessionClient};

#[derive(Parser)]
#[command(name = "sensor-hub-client", about = "CLI for the sensor-hub readings API")]
struct Cli {
    /// Path to the settings file (saved API url + auth token)
    #[arg(long, default_value = "client.toml", global = true)]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Authenticate and save the session token
    Login { username: String, password: String },
    /// Create an account and save the session token
    Register { username: String, password: String },
    /// List readings, optionally for a single sensor
    Readings {
        #[arg(long)]
        sensor: Option<String>,
    },
    /// Submit a new reading
    Submit { sensor_id: String, value: f64 },
    /// Per-sensor summary of all readings
    Dashboard,
    /// Probe whether the configured backend is reachable
    Check,
    /// Change the saved API url
    SetUrl { url: String },
    /// Drop the saved session token
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::load_or_default(&cli.config);

    // flipped by the unauthorized callback; checked after the command runs
    // so the stale token also gets dropped from the settings file
    let session_expired = Arc::new(AtomicBool::new(false));

    let mut builder = SessionClient::builder().base_url(config.api.url.as_str()).on_unauthorized({
        let session_expired = session_expired.clone();
        move || {
            session_expired.store(true, Ordering::SeqCst);
            eprintln!("session expired, please log in again");
        }
    });
    if let Some(token) = &config.auth.token {
        builder = builder.token(token.as_str());
    }
    let client = builder.build();

    let outcome = run(&cli.command, &client, &mut config, &cli.config).await;

    if session_expired.load(Ordering::SeqCst) && config.auth.token.is_some() {
        config.auth.token = None;
        config.store(&cli.config)?;
    }

    outcome?;
    Ok(())
}

async fn run(
    command: &Command,
    client: &SessionClient,
    config: &mut ClientConfig,
    config_path: &str,
) -> Result<()> {
    match command {
        Command::Login { username, password } => {
            let auth = client.login(username, password).await?;
            client.set_token(&auth.token);
            config.auth.token = Some(auth.token);
            config.store(config_path)?;
            println!("logged in as {}", username);
        }
        Command::Register { username, password } => {
            let auth = client.register(username, password).await?;
            client.set_token(&auth.token);
            config.auth.token = Some(auth.token);
            config.store(config_path)?;
            println!("registered {}", username);
        }
        Command::Readings { sensor } => {
            let readings = match sensor {
                Some(id) => client.get_readings_by_sensor(id).await?,
                None => client.get_readings().await?,
            };
            for r in &readings {
                match r.value {
                    Some(v) => println!("{}  {}  {:>10.2}", r.timestamp, r.sensor_id, v),
                    None => println!("{}  {}  {:>10}", r.timestamp, r.sensor_id, "-"),
                }
            }
            println!("{} reading(s)", readings.len());
        }
        Command::Submit { sensor_id, value } => {
            let created = client
                .create_reading(&SensorReadingCreate {
                    sensor_id: sensor_id.clone(),
                    value: *value,
                })
                .await?;
            println!("created reading {} at {}", created.id, created.timestamp);
        }
        Command::Dashboard => {
            let summaries = aggregate::summarize(client.get_readings().await?);
            println!(
                "{:<20} {:>8} {:>10} {:>10} {:>10}",
                "sensor", "count", "latest", "min", "max"
            );
            for s in &summaries {
                println!(
                    "{:<20} {:>8} {:>10} {:>10} {:>10}",
                    s.sensor_id,
                    s.readings.len(),
                    fmt_value(s.latest.as_ref().and_then(|r| r.value)),
                    fmt_value(s.min),
                    fmt_value(s.max),
                );
            }
        }
        Command::Check => {
            if client.test_connection().await {
                println!("backend reachable at {}", client.base_url());
            } else {
                println!(
                    "backend NOT reachable at {} - check the configured url",
                    client.base_url()
                );
            }
        }
        Command::SetUrl { url } => {
            client.set_base_url(url);
            config.api.url = client.base_url();
            config.store(config_path)?;
            println!("api url set to {}", config.api.url);
        }
        Command::Logout => {
            client.clear_token();
            config.auth.token = None;
            config.store(config_path)?;
            println!("logged out");
        }
    }

    Ok(())
}

fn fmt_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "-".to_string(),
    }
}
