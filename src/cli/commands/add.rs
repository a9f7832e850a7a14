//! `passvault add`: store a new credential.

use crate::cli::output;
use crate::cli::{read_field_value, unlock, Cli};
use crate::errors::Result;
use crate::vault::{Field, RecordId, Session};

/// Execute the `add` command.
pub fn execute(cli: &Cli, url: &str, user_id: &str, password: Option<&str>) -> Result<()> {
    let vault = cli.vault()?;

    let password = match password {
        Some(p) => {
            output::warning("Password provided on command line; it may appear in shell history.");
            zeroize::Zeroizing::new(p.to_string())
        }
        None => read_field_value(Field::Password)?,
    };

    let mut session = unlock(&vault)?;
    let id = session.add_row();
    fill(&mut session, id, url, user_id, &password)?;

    let report = session.save()?;
    output::success(&format!(
        "Added credential for '{}' ({} total)",
        url.trim(),
        report.saved
    ));

    Ok(())
}

fn fill(session: &mut Session, id: RecordId, url: &str, user_id: &str, password: &str) -> Result<()> {
    session.mutate_field(id, Field::Url, url)?;
    session.mutate_field(id, Field::UserId, user_id)?;
    session.mutate_field(id, Field::Password, password)
}
