//! Doerner Party CLI
//!
//! Command-line interface for two-party key generation:
//! - Run a complete keygen between a local sender and receiver
//! - Inspect a stored key share

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use doerner_core::{
    mpc::{self, MemoryRelay},
    start_keygen, ConfigReceiver, ConfigSender, Group, KeygenOutput, PartyRole, VERSION,
};
use rand::rngs::OsRng;
use std::{path::PathBuf, sync::Arc};
use tracing::{info, Level};

/// Doerner Party - two-party ECDSA key generation
#[derive(Parser)]
#[command(name = "doerner-party")]
#[command(about = "Two-party OT-based ECDSA key generation")]
#[command(version)]
struct Cli {
    /// Data directory for key shares
    #[arg(short, long, env = "DEST", default_value = "./data")]
    dest: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Role {
    Sender,
    Receiver,
}

impl From<Role> for PartyRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Sender => PartyRole::Sender,
            Role::Receiver => PartyRole::Receiver,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run key generation between a local sender and receiver
    Keygen {
        /// Session id (hex, 32 bytes); random if omitted
        #[arg(short, long, env = "SESSION_ID")]
        session_id: Option<String>,

        /// Sender party ID
        #[arg(long, env = "SENDER_ID", default_value = "alice")]
        sender_id: String,

        /// Receiver party ID
        #[arg(long, env = "RECEIVER_ID", default_value = "bob")]
        receiver_id: String,

        /// Group name
        #[arg(short, long, env = "GROUP", default_value = "secp256k1")]
        group: Group,

        /// Worker threads for the OT setup
        #[arg(short, long, env = "THREADS", default_value_t = 4)]
        threads: usize,
    },

    /// Show key share info
    Info {
        /// Which stored share to show
        #[arg(short, long, value_enum)]
        role: Role,
    },
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

    // Ensure data directory exists
    std::fs::create_dir_all(&cli.dest)?;

    match cli.command {
        Commands::Keygen {
            ref session_id,
            ref sender_id,
            ref receiver_id,
            group,
            threads,
        } => {
            run_keygen(&cli, session_id.as_deref(), sender_id, receiver_id, group, threads).await?;
        }
        Commands::Info { role } => {
            show_info(&cli, role.into())?;
        }
    }

    Ok(())
}

async fn run_keygen(
    cli: &Cli,
    session_id: Option<&str>,
    sender_id: &str,
    receiver_id: &str,
    group: Group,
    threads: usize,
) -> Result<()> {
    let session_id = match session_id {
        Some(hex_id) => hex::decode(hex_id)?,
        None => rand::random::<[u8; 32]>().to_vec(),
    };

    info!(
        version = VERSION,
        sender = sender_id,
        receiver = receiver_id,
        %group,
        session_id = hex::encode(&session_id),
        "Running local two-party keygen"
    );

    let pool = Arc::new(
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()?,
    );

    let sender = start_keygen(
        group,
        PartyRole::Sender,
        sender_id.into(),
        receiver_id.into(),
        pool.clone(),
        &session_id,
    )?;
    let receiver = start_keygen(
        group,
        PartyRole::Receiver,
        receiver_id.into(),
        sender_id.into(),
        pool,
        &session_id,
    )?;

    let relay = MemoryRelay::new();
    let (mut rng_s, mut rng_r) = (OsRng, OsRng);
    let (sender_out, receiver_out) = tokio::join!(
        mpc::run_keygen(sender, &relay, &mut rng_s),
        mpc::run_keygen(receiver, &relay, &mut rng_r),
    );
    let (sender_out, receiver_out) = (sender_out?, receiver_out?);

    for output in [&sender_out, &receiver_out] {
        let path = share_path(cli, output.role());
        let json = match output {
            KeygenOutput::Sender(config) => serde_json::to_string_pretty(config)?,
            KeygenOutput::Receiver(config) => serde_json::to_string_pretty(config)?,
        };
        std::fs::write(&path, json)?;
        info!(role = %output.role(), path = ?path, "Key share saved");
    }

    // Print public key
    println!("Public Key: {}", hex::encode(sender_out.public().to_bytes()));

    Ok(())
}

fn show_info(cli: &Cli, role: PartyRole) -> Result<()> {
    let json = std::fs::read_to_string(share_path(cli, role))?;
    let (group, public, setup_digest) = match role {
        PartyRole::Sender => {
            let config: ConfigSender = serde_json::from_str(&json)?;
            (config.group(), *config.public(), *config.setup().digest())
        }
        PartyRole::Receiver => {
            let config: ConfigReceiver = serde_json::from_str(&json)?;
            (config.group(), *config.public(), *config.setup().digest())
        }
    };

    println!("Key Share Info:");
    println!("  Role: {}", role);
    println!("  Group: {}", group);
    println!("  Public Key: {}", hex::encode(public.to_bytes()));
    println!("  Setup Digest: {}", hex::encode(setup_digest));

    Ok(())
}

fn share_path(cli: &Cli, role: PartyRole) -> PathBuf {
    cli.dest.join(format!("{}.json", role))
}
