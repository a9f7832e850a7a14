//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so every command
//! shares the same styling.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::CredentialRecord;

/// Shown in place of a password unless `list --show` is given.
const MASK: &str = "\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}";

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print the credential table (#, URL, ID, Password).
///
/// Row numbers are 1-based and are what `set` and `delete` take.
pub fn print_records_table(records: &[CredentialRecord], show_passwords: bool) {
    if records.is_empty() {
        info("No credentials in this vault yet.");
        tip("Run `passvault add <url> <user_id>` to add your first credential.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "URL", "ID", "Password"]);

    for (index, record) in records.iter().enumerate() {
        let password = if show_passwords {
            record.password().to_string()
        } else {
            MASK.to_string()
        };
        table.add_row(vec![
            (index + 1).to_string(),
            record.url().to_string(),
            record.user_id().to_string(),
            password,
        ]);
    }

    println!("{table}");
}
