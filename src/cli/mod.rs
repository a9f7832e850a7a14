//! CLI module: Clap argument parser, prompts, output helpers and commands.
//!
//! The CLI is a thin front end: it gathers secrets and confirmations from
//! the user and hands them to [`crate::vault`], which never prompts.

pub mod commands;
pub mod output;

use std::io::{self, IsTerminal, Read};

use clap::Parser;
use zeroize::{Zeroize, Zeroizing};

use crate::config::Settings;
use crate::errors::{PassVaultError, Result};
use crate::vault::{Field, RecordId, Session, UnlockResult, Vault};

/// Environment variable holding the current master key (scripting / CI).
pub const MASTER_KEY_ENV: &str = "PASSVAULT_MASTER_KEY";

/// Environment variable holding the new master key for `rotate-key`.
pub const NEW_MASTER_KEY_ENV: &str = "PASSVAULT_NEW_MASTER_KEY";

/// PassVault CLI: local encrypted credential vault.
#[derive(Parser)]
#[command(
    name = "passvault",
    about = "Local encrypted credential vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault directory (default: from .passvault.toml, else .passvault)
    #[arg(long, global = true, env = "PASSVAULT_VAULT_DIR")]
    pub vault_dir: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Register a master key and create an empty vault
    Init {
        /// Skip the "master key cannot be recovered" confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show all stored credentials
    List {
        /// Show passwords instead of masking them
        #[arg(long)]
        show: bool,
    },

    /// Add a credential
    Add {
        /// Site URL (e.g. site.com)
        url: String,
        /// Account identifier
        user_id: String,
        /// Password (omit for hidden prompt)
        password: Option<String>,
    },

    /// Change one field of a stored credential
    Set {
        /// Row number as shown by `list`
        row: usize,
        /// Field to change: url, user-id or password
        field: String,
        /// New value (omit for prompt)
        value: Option<String>,
    },

    /// Delete a stored credential
    Delete {
        /// Row number as shown by `list`
        row: usize,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Change the master key and re-encrypt every credential
    RotateKey,
}

impl Cli {
    /// Build the vault handle from `.passvault.toml` and CLI overrides.
    pub fn vault(&self) -> Result<Vault> {
        let cwd = std::env::current_dir()?;
        let mut settings = Settings::load(&cwd)?;
        if let Some(dir) = &self.vault_dir {
            settings.vault_dir = dir.clone();
        }
        Ok(Vault::from_settings(&settings, &cwd))
    }
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Read a secret from `env_var`, falling back to a hidden prompt.
///
/// Returns `Zeroizing<String>` so the secret is wiped from memory on drop.
pub fn read_secret(env_var: &str, prompt: &str) -> Result<Zeroizing<String>> {
    if let Ok(secret) = std::env::var(env_var) {
        if !secret.is_empty() {
            return Ok(Zeroizing::new(secret));
        }
    }

    prompt_secret(prompt)
}

/// Hidden interactive prompt.
pub fn prompt_secret(prompt: &str) -> Result<Zeroizing<String>> {
    let secret = dialoguer::Password::new()
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()
        .map_err(|e| PassVaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(secret))
}

/// Read a new master key and its confirmation.
///
/// The two copies are returned separately so the core checks that they
/// match. With `env_var` set, both copies come from it.
pub fn read_new_secret(env_var: &str) -> Result<(Zeroizing<String>, Zeroizing<String>)> {
    if let Ok(secret) = std::env::var(env_var) {
        if !secret.is_empty() {
            return Ok((Zeroizing::new(secret.clone()), Zeroizing::new(secret)));
        }
    }

    let new = prompt_secret("New master key")?;
    let confirm = prompt_secret("New master key (again)")?;
    Ok((new, confirm))
}

/// Read a field value that was not given on the command line.
///
/// Piped stdin wins; otherwise prompt, hiding the input for passwords.
pub fn read_field_value(field: Field) -> Result<Zeroizing<String>> {
    if !io::stdin().is_terminal() {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        let value = Zeroizing::new(buf.trim_end().to_string());
        buf.zeroize();
        return Ok(value);
    }

    let prompt = format!("Enter {field}");
    match field {
        Field::Password => prompt_secret(&prompt),
        Field::Url | Field::UserId => dialoguer::Input::<String>::new()
            .with_prompt(prompt)
            .interact_text()
            .map(Zeroizing::new)
            .map_err(|e| PassVaultError::CommandFailed(format!("input prompt: {e}"))),
    }
}

/// Unlock the vault or fail with a user-facing error.
pub fn unlock(vault: &Vault) -> Result<Session> {
    let secret = read_secret(MASTER_KEY_ENV, "Enter master key")?;
    match vault.unlock(&secret)? {
        UnlockResult::Success(session) => Ok(session),
        UnlockResult::FirstTimeSetup => Err(PassVaultError::VaultNotFound(vault.path().to_path_buf())),
        UnlockResult::WrongSecret => Err(PassVaultError::WrongSecret),
    }
}

/// Map a 1-based row number, as printed by `list`, to its record.
pub fn record_at(session: &Session, row: usize) -> Result<RecordId> {
    row.checked_sub(1)
        .and_then(|index| session.records().get(index))
        .map(|record| record.id())
        .ok_or_else(|| {
            PassVaultError::CommandFailed(format!(
                "no row {row}; the vault has {} row(s)",
                session.records().len()
            ))
        })
}
