use clap::Parser;
use passvault::cli::{commands, output, Cli, Commands};

fn main() {
    passvault::logging::init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { yes } => commands::init::execute(&cli, yes),
        Commands::List { show } => commands::list::execute(&cli, show),
        Commands::Add {
            ref url,
            ref user_id,
            ref password,
        } => commands::add::execute(&cli, url, user_id, password.as_deref()),
        Commands::Set {
            row,
            ref field,
            ref value,
        } => commands::set::execute(&cli, row, field, value.as_deref()),
        Commands::Delete { row, force } => commands::delete::execute(&cli, row, force),
        Commands::RotateKey => commands::rotate::execute(&cli),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
