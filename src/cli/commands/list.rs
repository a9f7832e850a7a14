//! `passvault list`: display all credentials in a table.

use crate::cli::output;
use crate::cli::{unlock, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli, show: bool) -> Result<()> {
    let vault = cli.vault()?;
    let session = unlock(&vault)?;

    let records = session.records();
    output::info(&format!("{} credential(s)", records.len()));
    output::print_records_table(records, show);

    Ok(())
}
