//! `passvault set`: change one field of a stored credential.

use crate::cli::output;
use crate::cli::{read_field_value, record_at, unlock, Cli};
use crate::errors::Result;
use crate::vault::Field;

/// Execute the `set` command.
pub fn execute(cli: &Cli, row: usize, field: &str, value: Option<&str>) -> Result<()> {
    let field: Field = field.parse()?;
    let vault = cli.vault()?;
    let mut session = unlock(&vault)?;
    let id = record_at(&session, row)?;

    let value = match value {
        Some(v) => {
            if field == Field::Password {
                output::warning("Password provided on command line; it may appear in shell history.");
            }
            zeroize::Zeroizing::new(v.to_string())
        }
        None => read_field_value(field)?,
    };

    session.mutate_field(id, field, &value)?;
    session.save()?;

    output::success(&format!("Updated {field} of row {row}"));
    Ok(())
}
