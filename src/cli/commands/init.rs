//! `passvault init`: register a master key and create an empty vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{read_new_secret, Cli, MASTER_KEY_ENV};
use crate::errors::{PassVaultError, Result};
use crate::vault::Confirmation;

/// Execute the `init` command.
pub fn execute(cli: &Cli, yes: bool) -> Result<()> {
    let vault = cli.vault()?;

    if vault.is_registered()? {
        output::tip("Use `passvault list` to open the existing vault.");
        return Err(PassVaultError::VaultAlreadyExists(vault.path().to_path_buf()));
    }

    output::warning("The master key cannot be recovered. If you forget it, every credential is lost.");
    let confirmation = if yes {
        Confirmation::Confirmed
    } else {
        let confirmed = Confirm::new()
            .with_prompt("Create the vault with this understanding?")
            .default(false)
            .interact()
            .map_err(|e| PassVaultError::CommandFailed(format!("confirm prompt: {e}")))?;
        Confirmation::from_bool(confirmed)
    };

    if confirmation == Confirmation::Declined {
        output::info("Cancelled.");
        return Ok(());
    }

    let (secret, confirm) = read_new_secret(MASTER_KEY_ENV)?;
    if *secret != *confirm {
        return Err(PassVaultError::SecretMismatch);
    }

    let session = vault.register(&secret, confirmation)?;
    session.lock();

    output::success(&format!("Vault created at {}", vault.path().display()));
    output::tip("Run `passvault add <url> <user_id>` to add a credential.");
    output::tip("Run `passvault list` to see all credentials.");

    Ok(())
}
