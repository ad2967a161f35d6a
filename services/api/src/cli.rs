use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use job_board::config::AppConfig;
use job_board::error::AppError;
use job_board::tenancy::Protocol;
use job_board::JobBoard;
use rust_decimal::Decimal;

use crate::{commands, server};

#[derive(Parser, Debug)]
#[command(
    name = "job-board",
    about = "Run and administer the multi-tenant job board",
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
    #[command(flatten)]
    Operator(OperatorCommand),
}

/// One-shot administration commands run against the configured database.
#[derive(Subcommand, Debug)]
pub(crate) enum OperatorCommand {
    /// Expire jobs older than each site's expire_after window
    Expire,
    /// Send each site's weekly digest of new jobs to its mailing list
    SendMailshot,
    /// Print the mailing lists available to a site
    DisplayLists {
        /// Domain name of the site
        site_domain: String,
    },
    /// Register, list and configure sites
    Site {
        #[command(subcommand)]
        command: SiteCommand,
    },
    /// Manage a site's job categories
    Category {
        #[command(subcommand)]
        command: CategoryCommand,
    },
    /// Maintain the shared country list
    Countries {
        #[command(subcommand)]
        command: CountriesCommand,
    },
    /// Grant staff status or set token balances
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
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

#[derive(Subcommand, Debug)]
pub(crate) enum SiteCommand {
    /// Register a new site; its configuration is created with defaults
    Add {
        #[arg(long)]
        domain: String,
        #[arg(long)]
        name: String,
    },
    /// List registered sites
    List,
    /// Update a site's configuration
    Configure(ConfigureArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ConfigureArgs {
    /// Domain name of the site
    pub(crate) domain: String,
    /// Days a paid job stays listed
    #[arg(long)]
    pub(crate) expire_after: Option<i64>,
    #[arg(long)]
    pub(crate) admin_email: Option<String>,
    /// Listing price, e.g. 50.25
    #[arg(long)]
    pub(crate) price: Option<Decimal>,
    /// http or https
    #[arg(long)]
    pub(crate) protocol: Option<Protocol>,
    /// Force every job on the site to be remote
    #[arg(long)]
    pub(crate) remote: Option<bool>,
    #[arg(long)]
    pub(crate) google_analytics: Option<String>,
    #[arg(long)]
    pub(crate) twitter: Option<String>,
    #[arg(long)]
    pub(crate) stripe_publishable_key: Option<String>,
    #[arg(long)]
    pub(crate) stripe_secret_key: Option<String>,
    #[arg(long)]
    pub(crate) twitter_access_token: Option<String>,
    #[arg(long)]
    pub(crate) mailchimp_username: Option<String>,
    #[arg(long)]
    pub(crate) mailchimp_api_key: Option<String>,
    #[arg(long)]
    pub(crate) mailchimp_list_id: Option<String>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum CategoryCommand {
    /// Add a category to a site
    Add { domain: String, name: String },
}

#[derive(Subcommand, Debug)]
pub(crate) enum CountriesCommand {
    /// Import countries from a CSV file with a `name` column
    Import { csv: PathBuf },
}

#[derive(Subcommand, Debug)]
pub(crate) enum UserCommand {
    /// Grant staff status
    Staff { username: String },
    /// Set a user's token balance
    Tokens { username: String, count: i64 },
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Operator(command) => {
            let config = AppConfig::load()?;
            job_board::telemetry::init(&config.telemetry)?;
            let board = crate::infra::build_board(&config).await?;
            let output = operate(&board, command).await?;
            print!("{output}");
            Ok(())
        }
    }
}

async fn operate(board: &JobBoard, command: OperatorCommand) -> Result<String, AppError> {
    match command {
        OperatorCommand::Expire => commands::expire(board).await,
        OperatorCommand::SendMailshot => commands::send_mailshot(board).await,
        OperatorCommand::DisplayLists { site_domain } => {
            commands::display_lists(board, &site_domain).await
        }
        OperatorCommand::Site { command } => commands::site(board, command).await,
        OperatorCommand::Category {
            command: CategoryCommand::Add { domain, name },
        } => commands::add_category(board, &domain, &name).await,
        OperatorCommand::Countries {
            command: CountriesCommand::Import { csv },
        } => commands::import_countries(board, &csv).await,
        OperatorCommand::User { command } => commands::user(board, command).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_site_configuration_flags() {
        let cli = Cli::try_parse_from([
            "job-board",
            "site",
            "configure",
            "tramcar.org",
            "--price",
            "50.25",
            "--protocol",
            "https",
            "--remote",
            "true",
        ])
        .expect("arguments parse");

        let Some(Command::Operator(OperatorCommand::Site {
            command: SiteCommand::Configure(args),
        })) = cli.command
        else {
            panic!("expected site configure");
        };
        assert_eq!(args.domain, "tramcar.org");
        assert_eq!(args.price, Some(Decimal::new(5025, 2)));
        assert_eq!(args.protocol, Some(Protocol::Https));
        assert_eq!(args.remote, Some(true));
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["job-board"]).expect("arguments parse");
        assert!(cli.command.is_none());
    }

    #[test]
    fn display_lists_takes_a_domain() {
        let cli = Cli::try_parse_from(["job-board", "display-lists", "tramcar.org"])
            .expect("arguments parse");
        assert!(matches!(
            cli.command,
            Some(Command::Operator(OperatorCommand::DisplayLists { ref site_domain }))
                if site_domain == "tramcar.org"
        ));
    }
}
