//! Operator CLI for the IAM authenticator mapping engine.
//!
//! `validate` checks that a configuration file builds a mapping index;
//! `resolve` shows which Kubernetes identity a principal would be given.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use iam_authenticator_mapping::{AuthenticatedPrincipal, Config, MappingIndex, Resolver};

/// Exit code for a principal that resolves to a denial.
const EXIT_DENIED: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "iam-authenticator",
    version,
    about = "Map AWS IAM principals to Kubernetes identities"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a configuration file and build its mapping index
    Validate {
        /// Path to the JSON configuration file
        #[arg(short, long, env = "IAM_AUTHENTICATOR_CONFIG")]
        config: PathBuf,
    },
    /// Resolve an authenticated principal to a Kubernetes identity
    Resolve {
        /// Path to the JSON configuration file
        #[arg(short, long, env = "IAM_AUTHENTICATOR_CONFIG")]
        config: PathBuf,
        /// ARN of the authenticated principal
        #[arg(long)]
        arn: String,
        /// 12-digit AWS account ID of the principal
        #[arg(long)]
        account_id: String,
        /// Role session name (empty for IAM users)
        #[arg(long, default_value = "")]
        session_name: String,
        /// Unique ID of the principal
        #[arg(long, default_value = "")]
        user_id: String,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_config(path: &Path) -> Result<Config> {
    Config::load(path).with_context(|| format!("loading configuration {}", path.display()))
}

fn validate(path: &Path) -> Result<ExitCode> {
    let config = load_config(path)?;
    let index = MappingIndex::build(config.mapping()).context("building mapping index")?;
    println!(
        "configuration OK: cluster {}, {} role mappings, {} user mappings, {} mapped accounts",
        config.cluster_id,
        index.role_count(),
        index.user_count(),
        index.account_count()
    );
    Ok(ExitCode::SUCCESS)
}

fn resolve(path: &Path, principal: AuthenticatedPrincipal) -> Result<ExitCode> {
    let config = load_config(path)?;
    let resolver = Resolver::from_config(config.mapping()).context("building mapping index")?;

    match resolver.resolve(&principal) {
        Ok(identity) => {
            let json = serde_json::to_string_pretty(&identity)
                .context("serializing resolved identity")?;
            println!("{json}");
            Ok(ExitCode::SUCCESS)
        }
        Err(denied) => {
            eprintln!("{denied}");
            Ok(ExitCode::from(EXIT_DENIED))
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    log::debug!("Parsed arguments: {:?}", cli);

    match cli.command {
        Command::Validate { config } => validate(&config),
        Command::Resolve {
            config,
            arn,
            account_id,
            session_name,
            user_id,
        } => resolve(
            &config,
            AuthenticatedPrincipal::new(arn, account_id, session_name, user_id),
        ),
    }
}
