// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Operator CLI for formseal deployments
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use formseal::codec::cipher::CipherCodec;
use formseal::codec::{StateCodec, Submission};
use formseal::engine_core::constants::config as env_keys;
use formseal::engine_core::crypto::KeyRing;
use formseal::engine_core::models::SessionId;
use formseal::utils::logging::init_tracing;
use formseal::{Config, KeyScope, SessionState, Token};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print fresh cipher and hash keys as environment assignments
    Keygen,

    /// Load configuration (env, or a YAML file) and print the effective settings
    CheckConfig {
        /// YAML file to load instead of FORMSEAL_CONFIG_PATH
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Open a cipher-strategy token and print the page state it carries
    InspectToken {
        #[arg(long)]
        token: String,

        /// Session id the token was issued for
        #[arg(long)]
        session: String,

        /// Hex-encoded AES-256 key
        #[arg(long)]
        cipher_key: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config from env, using defaults: {}", e);
        Config::default()
    });
    if let Err(e) = init_tracing(&config) {
        eprintln!("Failed to init tracing: {}", e);
    }

    match cli.command {
        Command::Keygen => keygen(),
        Command::CheckConfig { file } => check_config(file),
        Command::InspectToken {
            token,
            session,
            cipher_key,
        } => inspect_token(&token, &session, &cipher_key),
    }
}

fn keygen() -> Result<()> {
    let (cipher, hash) = KeyRing::generate().to_hex();
    println!("{}={}", env_keys::ENV_CIPHER_KEY, cipher);
    println!("{}={}", env_keys::ENV_HASH_KEY, hash);
    Ok(())
}

fn check_config(file: Option<PathBuf>) -> Result<()> {
    let config = match file {
        Some(path) => Config::from_yaml_file(&path)
            .with_context(|| format!("invalid config file {}", path.display()))?,
        None => Config::from_env().context("invalid environment configuration")?,
    };
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn inspect_token(token: &str, session: &str, cipher_key: &str) -> Result<()> {
    let session_id: SessionId = session.parse().context("session must be a UUID")?;
    let keys = KeyRing::from_hex(Some(cipher_key), None)?;
    let codec = CipherCodec::new(keys, usize::MAX);
    let session = SessionState::with_id(session_id, 1, KeyScope::Process);

    debug!(%session_id, "Opening token");
    let state = codec
        .open_token(&Token::new(token), &Submission::token_only(&session))
        .context("token could not be opened")?;
    println!("{}", serde_json::to_string_pretty(&*state)?);
    Ok(())
}
