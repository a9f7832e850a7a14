//! `passvault rotate-key`: change the master key.
//!
//! The current key is checked, every credential is decrypted and then
//! re-encrypted under the new key, and the vault is written in a single
//! atomic replace. Any failure leaves the vault exactly as it was.

use crate::cli::output;
use crate::cli::{read_new_secret, read_secret, Cli, MASTER_KEY_ENV, NEW_MASTER_KEY_ENV};
use crate::errors::Result;

/// Execute the `rotate-key` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let vault = cli.vault()?;

    output::info("Enter your current master key.");
    let old = read_secret(MASTER_KEY_ENV, "Current master key")?;

    output::info("Choose your new master key.");
    let (new, confirm) = read_new_secret(NEW_MASTER_KEY_ENV)?;

    let report = vault.change_master_key(&old, &new, &confirm)?;

    output::success(&format!(
        "Master key changed ({} credential(s) re-encrypted)",
        report.records
    ));
    output::tip("Unlock with the new master key from now on.");

    Ok(())
}
