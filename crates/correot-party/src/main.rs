//! CorreOT Party CLI
//!
//! Runs the correlated OT setup handshake between both roles in one process,
//! over the in-memory relay:
//! - Setup (loopback handshake, optionally saving both outputs)
//! - Info (inspect saved outputs)

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use correot_core::{
    setup, CorreOtReceiveSetup, CorreOtSendSetup, Group, MemoryRelay, SessionConfig, SessionId,
    SetupParams, DEFAULT_SEC_PARAM,
};
use rand::rngs::OsRng;
use std::{path::PathBuf, time::Duration};
use tracing::{info, Level};

const SENDER_ID: usize = 0;
const RECEIVER_ID: usize = 1;

/// CorreOT Party - correlated OT setup runner
#[derive(Parser)]
#[command(name = "correot-party")]
#[command(about = "Correlated OT setup loopback runner")]
#[command(version)]
struct Cli {
    /// Security parameter (number of base OTs, bit length of Delta)
    #[arg(short = 'k', long, env = "CORREOT_SEC_PARAM", default_value_t = DEFAULT_SEC_PARAM)]
    sec_param: usize,

    /// Reject round messages that do not carry exactly one entry per base OT
    #[arg(long, env = "CORREOT_STRICT_LENGTH")]
    strict_length: bool,

    /// Seconds to wait for a peer message
    #[arg(long, env = "CORREOT_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Data directory for setup outputs
    #[arg(short, long, env = "DEST", default_value = "./data")]
    dest: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a loopback setup between sender and receiver
    Setup {
        /// Session id (hex encoded, 32 bytes); random if omitted
        #[arg(short, long)]
        session: Option<String>,

        /// Save both outputs to the data directory
        #[arg(long)]
        save: bool,
    },

    /// Show saved setup outputs
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Setup { ref session, save } => {
            run_setup(&cli, session.as_deref(), save).await?;
        }
        Commands::Info => {
            show_info(&cli)?;
        }
    }

    Ok(())
}

async fn run_setup(cli: &Cli, session: Option<&str>, save: bool) -> Result<()> {
    let params = SetupParams::new(cli.sec_param)?.with_strict_length(cli.strict_length);

    let session_id: SessionId = match session {
        Some(hex_id) => hex::decode(hex_id)?
            .try_into()
            .map_err(|_| anyhow::anyhow!("Session id must be 32 bytes"))?,
        None => rand::random(),
    };

    let sender_config = SessionConfig::with_session_id(session_id, SENDER_ID, RECEIVER_ID, params)?;
    let receiver_config =
        SessionConfig::with_session_id(session_id, RECEIVER_ID, SENDER_ID, params)?;

    info!(
        session_id = hex::encode(session_id),
        sec_param = params.sec_param(),
        strict_length = params.strict_length(),
        "Starting loopback setup"
    );

    let relay = MemoryRelay::new().with_timeout(Duration::from_secs(cli.timeout));
    let mut sender_rng = OsRng;
    let mut receiver_rng = OsRng;
    let (send_out, receive_out) = tokio::join!(
        setup::run_cot_sender_setup(&sender_config, &relay, &mut sender_rng),
        setup::run_cot_receiver_setup(&receiver_config, Group::Secp256k1, &relay, &mut receiver_rng),
    );
    let send_out = send_out?;
    let receive_out = receive_out?;

    if !send_out.is_correlated_with(&receive_out) {
        bail!("Correlation check failed");
    }

    info!(
        delta_bytes = send_out.delta().len(),
        base_ots = send_out.k_delta().len(),
        "Setup completed, correlation verified"
    );

    if save {
        std::fs::create_dir_all(&cli.dest)?;
        let send_path = cli.dest.join("cot-send-setup.json");
        let receive_path = cli.dest.join("cot-receive-setup.json");
        std::fs::write(&send_path, serde_json::to_string_pretty(&send_out)?)?;
        std::fs::write(&receive_path, serde_json::to_string_pretty(&receive_out)?)?;

        info!(sender = ?send_path, receiver = ?receive_path, "Setup outputs saved");
    }

    println!("Session: {}", hex::encode(session_id));
    println!("Base OTs: {}", send_out.k_delta().len());
    println!("Delta bytes: {}", send_out.delta().len());
    println!("Correlation: verified");

    Ok(())
}

fn show_info(cli: &Cli) -> Result<()> {
    let send_out: CorreOtSendSetup =
        serde_json::from_str(&std::fs::read_to_string(cli.dest.join("cot-send-setup.json"))?)?;
    let receive_out: CorreOtReceiveSetup =
        serde_json::from_str(&std::fs::read_to_string(cli.dest.join("cot-receive-setup.json"))?)?;

    let set_entries = send_out.k_delta().iter().filter(|k| k.is_some()).count();

    println!("Setup Info:");
    println!("  Base OTs: {}", send_out.k_delta().len());
    println!("  Completed: {}", set_entries);
    println!("  Delta bytes: {}", send_out.delta().len());
    println!("  Sender complete: {}", send_out.is_complete());
    println!("  Receiver complete: {}", receive_out.is_complete());
    println!(
        "  Correlated: {}",
        send_out.is_correlated_with(&receive_out)
    );

    Ok(())
}
