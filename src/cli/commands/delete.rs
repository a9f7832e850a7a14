//! `passvault delete`: remove a credential from the vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{record_at, unlock, Cli};
use crate::errors::{PassVaultError, Result};
use crate::vault::Confirmation;

/// Execute the `delete` command.
pub fn execute(cli: &Cli, row: usize, force: bool) -> Result<()> {
    let vault = cli.vault()?;
    let mut session = unlock(&vault)?;
    let id = record_at(&session, row)?;

    let url = session
        .record(id)
        .map(|record| record.url().to_string())
        .unwrap_or_default();

    // Unless --force is set, ask for confirmation before deleting.
    let confirmation = if force {
        Confirmation::Confirmed
    } else {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete row {row} ({url})?"))
            .default(false)
            .interact()
            .map_err(|e| PassVaultError::CommandFailed(format!("confirm prompt: {e}")))?;
        Confirmation::from_bool(confirmed)
    };

    if confirmation == Confirmation::Declined {
        output::info("Cancelled.");
        return Ok(());
    }

    session.delete_row(id, confirmation)?;
    let report = session.save()?;

    output::success(&format!(
        "Deleted row {row} ({url}); {} credential(s) left",
        report.saved
    ));
    Ok(())
}
