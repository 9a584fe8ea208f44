use crate::report::{run_compat, run_kinds, run_revision, CompatArgs, RevisionArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use mariner_qhse::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "mariner-qhse",
    about = "QHSE and ship-to-ship document control service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// List document kinds with their form codes and upload rules
    Kinds,
    /// Run the hose and fender compatibility calculation for two vessels
    Compat(CompatArgs),
    /// Show the revision that follows a given label
    Revision(RevisionArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Kinds => run_kinds(),
        Command::Compat(args) => run_compat(args),
        Command::Revision(args) => run_revision(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn compat_requires_input() {
        let parsed =
            Cli::try_parse_from(["mariner-qhse", "compat", "--input", "pair.json", "--json"])
                .expect("parses");
        match parsed.command {
            Some(Command::Compat(args)) => {
                assert!(args.json);
                assert_eq!(args.input, std::path::PathBuf::from("pair.json"));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(Cli::try_parse_from(["mariner-qhse", "compat"]).is_err());
    }
}
