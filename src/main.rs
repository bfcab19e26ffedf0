use std::{
    fs,
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use ed25519_dalek::{SigningKey, VerifyingKey};
use eegg_ledger::{Principal, Request, Role, Token, TokenConfig};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// EEGG token ledger driver.
///
/// Acts as the host for a single token instance: resolves callers, feeds
/// requests in order and prints the resulting events and state.
#[derive(Debug, Parser)]
#[clap(name = "eegg", version)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Deploy a token and apply a JSON-lines request script to it
    Replay {
        /// Principal that deploys the token and becomes the first admin
        #[clap(long, value_name = "HEX")]
        deployer: Principal,

        /// Token metadata and genesis supply (JSON)
        #[clap(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// One `{"caller": HEX, "op": ..., ...}` object per line
        #[clap(value_name = "SCRIPT")]
        script: PathBuf,
    },

    /// Print the principal of an ed25519 public key
    Principal {
        #[clap(long, value_name = "HEX")]
        pk_hex: String,
    },

    /// Print the identifier of a named role
    Role {
        /// `ROLE_ADMIN` maps to the built-in admin role
        name: String,
    },

    /// Generate an ed25519 keypair and print its principal
    Keygen {
        #[clap(long, value_name = "DIR")]
        out_dir: PathBuf,
    },
}

#[derive(Deserialize)]
struct ScriptLine {
    caller: Principal,
    #[serde(flatten)]
    request: Request,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum Outcome {
    Ok(Vec<eegg_ledger::Event>),
    Error(String),
}

fn replay_cmd(deployer: Principal, config: Option<&Path>, script: &Path) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => TokenConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => TokenConfig::default(),
    };
    let mut token = Token::new(config, deployer).context("deploying token")?;

    let file =
        fs::File::open(script).with_context(|| format!("opening {}", script.display()))?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let (mut committed, mut rejected) = (0usize, 0usize);
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: ScriptLine = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: malformed request", script.display(), idx + 1))?;
        let outcome = match token.apply(entry.caller, &entry.request) {
            Ok(events) => {
                committed += 1;
                Outcome::Ok(events)
            }
            Err(err) => {
                rejected += 1;
                Outcome::Error(err.to_string())
            }
        };
        serde_json::to_writer(&mut out, &outcome)?;
        writeln!(out)?;
    }

    serde_json::to_writer_pretty(&mut out, &token.snapshot())?;
    writeln!(out)?;
    info!(committed, rejected, "replay finished");
    Ok(())
}

fn principal_cmd(pk_hex: &str) -> anyhow::Result<()> {
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(pk_hex.trim(), &mut bytes).context("--pk-hex must be 64 hex chars")?;
    let key = VerifyingKey::from_bytes(&bytes).context("not an ed25519 public key")?;
    println!("{}", Principal::from(key));
    Ok(())
}

fn role_cmd(name: &str) {
    let role = match name {
        "ROLE_ADMIN" => Role::ADMIN,
        other => Role::named(other),
    };
    println!("{role}");
}

fn keygen_cmd(out_dir: &Path) -> anyhow::Result<()> {
    if out_dir.join("sk.hex").exists() {
        bail!("{} already holds a key", out_dir.display());
    }
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    let mut sk_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut sk_bytes);
    let sk = SigningKey::from_bytes(&sk_bytes);
    let pk = sk.verifying_key();

    fs::write(out_dir.join("sk.hex"), hex::encode(sk_bytes))?;
    fs::write(out_dir.join("pk.hex"), hex::encode(pk.as_bytes()))?;
    println!("{}", Principal::from(pk));
    info!(dir = %out_dir.display(), "keypair written");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match Cli::parse().command {
        Command::Replay {
            deployer,
            config,
            script,
        } => replay_cmd(deployer, config.as_deref(), &script),
        Command::Principal { pk_hex } => principal_cmd(&pk_hex),
        Command::Role { name } => {
            role_cmd(&name);
            Ok(())
        }
        Command::Keygen { out_dir } => keygen_cmd(&out_dir),
    }
}
