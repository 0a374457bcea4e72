use clap::{Parser, Subcommand};
use std::path::PathBuf;

use scorebook::access::{authorize, AccessError, Capability};
use scorebook::api::{ApiClient, ApiConfig, ApiError, ResponseCache};
use scorebook::commands::{self, CommandContext, InvalidInput, StageArg};
use scorebook::config::ReportSettings;
use scorebook::scoring::YearFilter;

const EXIT_SUCCESS: i32 = 0;
const EXIT_AUTH: i32 = 1;
const EXIT_NETWORK: i32 = 2;
const EXIT_CONFIG: i32 = 4;
const EXIT_ACCESS_DENIED: i32 = 5;
const EXIT_INVALID_INPUT: i32 = 6;

#[derive(Subcommand, Debug)]
enum ShooterCommand {
    /// List all shooters
    List,
    /// Show one shooter
    Show { id: u64 },
    /// Add a shooter
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        club: Option<String>,
        /// NRA membership number
        #[arg(long = "nra")]
        nra_number: Option<String>,
    },
    /// Change a shooter's details (an empty value clears a field)
    Edit {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        club: Option<String>,
        #[arg(long = "nra")]
        nra_number: Option<String>,
    },
    /// Delete a shooter
    Delete {
        id: u64,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum MatchCommand {
    /// List matches, newest first
    List,
    /// Show a match and its match types
    Show { id: u64 },
    /// Create a match from a YAML file
    Add {
        #[arg(long)]
        file: PathBuf,
    },
    /// Replace a match's definition from a YAML file
    Edit {
        id: u64,
        #[arg(long)]
        file: PathBuf,
    },
    /// Delete a match
    Delete {
        id: u64,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ScoreCommand {
    /// List the scores of a match
    List {
        #[arg(long = "match")]
        match_id: u64,
    },
    /// Show a score with totals and subtotals
    Show { id: u64 },
    /// Record a score
    Add {
        #[arg(long = "match")]
        match_id: u64,
        #[arg(long = "shooter")]
        shooter_id: u64,
        /// Instance name of the match type
        #[arg(long)]
        instance: String,
        #[arg(long)]
        caliber: String,
        /// Stage result: SF=96:3, SF=96 or SF=- for not fired
        #[arg(long = "stage", value_name = "STAGE=SCORE[:X]")]
        stages: Vec<StageArg>,
    },
    /// Correct a recorded score
    Edit {
        id: u64,
        #[arg(long)]
        caliber: Option<String>,
        #[arg(long = "stage", value_name = "STAGE=SCORE[:X]")]
        stages: Vec<StageArg>,
    },
    /// Delete a score
    Delete {
        id: u64,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// Leaderboards of a match
    Match { id: u64 },
    /// Caliber averages and match history of a shooter
    Shooter {
        id: u64,
        /// "all" or a year; defaults to report.default_year from the config
        #[arg(long)]
        year: Option<YearFilter>,
    },
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
    /// Remove cached API responses
    Clear,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a config file interactively
    Init,
    /// Log in to the score service
    Login,
    /// Forget the stored token and session
    Logout,
    /// Show the user the stored token belongs to
    Whoami,
    #[command(subcommand)]
    Shooters(ShooterCommand),
    #[command(subcommand)]
    Matches(MatchCommand),
    #[command(subcommand)]
    Scores(ScoreCommand),
    #[command(subcommand)]
    Report(ReportCommand),
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Parser, Debug)]
#[command(name = "scorebook")]
#[command(about = "Record and report shooting-match scores", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/scorebook/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Bypass the HTTP response cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Capability a command needs; None for commands that work logged out.
fn required_capability(command: &Commands) -> Option<Capability> {
    match command {
        Commands::Init | Commands::Login | Commands::Logout | Commands::Whoami | Commands::Cache(_) => None,
        Commands::Report(_) => Some(Capability::ViewReports),
        Commands::Shooters(cmd) => match cmd {
            ShooterCommand::List | ShooterCommand::Show { .. } => Some(Capability::ViewReports),
            _ => Some(Capability::ManageShooters),
        },
        Commands::Matches(cmd) => match cmd {
            MatchCommand::List | MatchCommand::Show { .. } => Some(Capability::ViewReports),
            _ => Some(Capability::ManageMatches),
        },
        Commands::Scores(cmd) => match cmd {
            ScoreCommand::List { .. } | ScoreCommand::Show { .. } => Some(Capability::ViewReports),
            ScoreCommand::Add { .. } | ScoreCommand::Edit { .. } => Some(Capability::RecordScores),
            ScoreCommand::Delete { .. } => Some(Capability::ManageMatches),
        },
    }
}

fn access_exit_code(err: &AccessError) -> i32 {
    match err {
        AccessError::NotAuthenticated => EXIT_AUTH,
        AccessError::Denied { .. } => EXIT_ACCESS_DENIED,
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<AccessError>() {
            return access_exit_code(e);
        }
        if let Some(e) = cause.downcast_ref::<ApiError>() {
            return match e {
                ApiError::Unauthorized => EXIT_AUTH,
                ApiError::Forbidden => EXIT_ACCESS_DENIED,
                ApiError::Access(access) => access_exit_code(access),
                ApiError::NotFound(_) => EXIT_INVALID_INPUT,
                ApiError::Status { status, .. } if status.is_client_error() => EXIT_INVALID_INPUT,
                ApiError::InvalidConfig(_) => EXIT_CONFIG,
                _ => EXIT_NETWORK,
            };
        }
        if cause.downcast_ref::<InvalidInput>().is_some() {
            return EXIT_INVALID_INPUT;
        }
    }
    EXIT_CONFIG
}

fn fail(message: &str, err: &anyhow::Error) -> ! {
    eprintln!("{}: {:#}", message, err);
    std::process::exit(exit_code(err));
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    scorebook::logging::init(cli.verbose);

    // Install rustls crypto provider (required for rustls 0.23+)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("rustls crypto provider already installed");
    }
    let config_path = cli.config.map(PathBuf::from);

    // Commands that need neither config nor network
    match &cli.command {
        Commands::Init => {
            if let Err(e) = scorebook::config::run_init_wizard(config_path) {
                eprintln!("Init failed: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
            std::process::exit(EXIT_SUCCESS);
        }
        Commands::Cache(CacheCommand::Clear) => {
            if let Err(e) = scorebook::api::clear_cache() {
                eprintln!("Failed to clear cache: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
            println!("Cache cleared.");
            std::process::exit(EXIT_SUCCESS);
        }
        Commands::Logout => {
            if let Err(e) = commands::auth::logout().await {
                fail("Logout failed", &e);
            }
            std::process::exit(EXIT_SUCCESS);
        }
        _ => {}
    }

    // Load and validate config
    let config = match scorebook::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    if let Err(errors) = scorebook::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }
    let api_config = match ApiConfig::from_config(&config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Session for this server, if any
    let session = scorebook::session::load_session_for(
        &scorebook::session::get_session_path(),
        &api_config.base_url,
    );

    // Authorize once, before any request is made
    let permit = match required_capability(&cli.command) {
        Some(capability) => match authorize(session.as_ref(), capability) {
            Ok(p) => Some(p),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(access_exit_code(&e));
            }
        },
        None => None,
    };

    let token = match cli.command {
        Commands::Login => None,
        _ => scorebook::credentials::resolve_token().await,
    };

    let cache = if cli.no_cache {
        tracing::debug!("Cache: disabled (--no-cache)");
        None
    } else {
        Some(ResponseCache::new(scorebook::api::get_cache_path()))
    };

    let client = match ApiClient::new(&api_config, token, cache) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create API client: {}", e);
            std::process::exit(EXIT_NETWORK);
        }
    };

    let ctx = CommandContext {
        client,
        use_colors: scorebook::output::should_use_colors(config.output.color),
        json: cli.json,
    };

    if let Err(e) = dispatch(&ctx, cli.command, permit.as_ref(), session.as_ref(), &config.report).await {
        fail("Error", &e);
    }

    std::process::exit(EXIT_SUCCESS);
}

async fn dispatch(
    ctx: &CommandContext,
    command: Commands,
    permit: Option<&scorebook::access::Permit>,
    session: Option<&scorebook::session::Session>,
    report_settings: &ReportSettings,
) -> anyhow::Result<()> {
    // Every write command was authorized above
    let require_permit = || permit.ok_or(AccessError::NotAuthenticated);

    match command {
        Commands::Login => commands::auth::login(ctx, session).await,
        Commands::Whoami => commands::auth::whoami(ctx, session).await,
        Commands::Shooters(cmd) => match cmd {
            ShooterCommand::List => commands::shooters::list(ctx).await,
            ShooterCommand::Show { id } => commands::shooters::show(ctx, id).await,
            ShooterCommand::Add {
                name,
                club,
                nra_number,
            } => {
                let changes = commands::shooters::ShooterChanges {
                    name: Some(name),
                    club,
                    nra_number,
                };
                commands::shooters::add(ctx, require_permit()?, changes).await
            }
            ShooterCommand::Edit {
                id,
                name,
                club,
                nra_number,
            } => {
                let changes = commands::shooters::ShooterChanges {
                    name,
                    club,
                    nra_number,
                };
                commands::shooters::edit(ctx, require_permit()?, id, changes).await
            }
            ShooterCommand::Delete { id, yes } => {
                commands::shooters::delete(ctx, require_permit()?, id, yes).await
            }
        },
        Commands::Matches(cmd) => match cmd {
            MatchCommand::List => commands::matches::list(ctx).await,
            MatchCommand::Show { id } => commands::matches::show(ctx, id).await,
            MatchCommand::Add { file } => commands::matches::add(ctx, require_permit()?, &file).await,
            MatchCommand::Edit { id, file } => {
                commands::matches::edit(ctx, require_permit()?, id, &file).await
            }
            MatchCommand::Delete { id, yes } => {
                commands::matches::delete(ctx, require_permit()?, id, yes).await
            }
        },
        Commands::Scores(cmd) => match cmd {
            ScoreCommand::List { match_id } => commands::scores::list(ctx, match_id).await,
            ScoreCommand::Show { id } => commands::scores::show(ctx, id).await,
            ScoreCommand::Add {
                match_id,
                shooter_id,
                instance,
                caliber,
                stages,
            } => {
                let new = commands::scores::NewScore {
                    match_id,
                    shooter_id,
                    instance,
                    caliber,
                    stages,
                };
                commands::scores::add(ctx, require_permit()?, new).await
            }
            ScoreCommand::Edit { id, caliber, stages } => {
                let changes = commands::scores::ScoreChanges { caliber, stages };
                commands::scores::edit(ctx, require_permit()?, id, changes).await
            }
            ScoreCommand::Delete { id, yes } => {
                commands::scores::delete(ctx, require_permit()?, id, yes).await
            }
        },
        Commands::Report(cmd) => match cmd {
            ReportCommand::Match { id } => commands::report::match_report(ctx, id).await,
            ReportCommand::Shooter { id, year } => {
                let year = commands::report::resolve_year(year, report_settings)?;
                commands::report::shooter_report(ctx, id, year).await
            }
        },
        Commands::Init | Commands::Logout | Commands::Cache(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_score_add() {
        let cli = Cli::try_parse_from([
            "scorebook", "scores", "add", "--match", "3", "--shooter", "9", "--instance", "NMC 1",
            "--caliber", "TWENTYTWO", "--stage", "SF=95:2", "--stage", "TF=-",
        ])
        .unwrap();
        match cli.command {
            Commands::Scores(ScoreCommand::Add { stages, .. }) => {
                assert_eq!(stages.len(), 2);
                assert_eq!(stages[1].value, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bad_stage_flag_is_rejected() {
        assert!(Cli::try_parse_from([
            "scorebook", "scores", "add", "--match", "3", "--shooter", "9", "--instance", "NMC 1",
            "--caliber", "TWENTYTWO", "--stage", "SF",
        ])
        .is_err());
    }

    #[test]
    fn test_required_capability() {
        let cap = |args: &[&str]| required_capability(&Cli::try_parse_from(args).unwrap().command);
        assert_eq!(cap(&["scorebook", "whoami"]), None);
        assert_eq!(cap(&["scorebook", "shooters", "list"]), Some(Capability::ViewReports));
        assert_eq!(
            cap(&["scorebook", "shooters", "delete", "4"]),
            Some(Capability::ManageShooters)
        );
        assert_eq!(
            cap(&["scorebook", "scores", "edit", "4", "--stage", "SF=90"]),
            Some(Capability::RecordScores)
        );
        assert_eq!(cap(&["scorebook", "scores", "delete", "4"]), Some(Capability::ManageMatches));
        assert_eq!(
            cap(&["scorebook", "report", "shooter", "2", "--year", "2024"]),
            Some(Capability::ViewReports)
        );
    }

    #[test]
    fn test_exit_codes() {
        let denied = anyhow::Error::from(ApiError::Forbidden);
        assert_eq!(exit_code(&denied), EXIT_ACCESS_DENIED);
        let invalid = anyhow::Error::from(InvalidInput(vec!["x".to_string()]));
        assert_eq!(exit_code(&invalid.context("Failed")), EXIT_INVALID_INPUT);
        let auth = anyhow::Error::from(AccessError::NotAuthenticated);
        assert_eq!(exit_code(&auth), EXIT_AUTH);
    }
}
