mod accounts;
mod db;
mod export;
mod revenue;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use creatorhub_core::reporting::ExportKind;
use creatorhub_core::BillingMonth;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "creatorhub-cli")]
#[command(about = "CreatorHub operator command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Schema and seed management
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Demo account provisioning
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// User token management
    Users {
        #[command(subcommand)]
        command: UsersCommands,
    },
    /// Monthly revenue shares
    Revenue {
        #[command(subcommand)]
        command: RevenueCommands,
    },
    /// Write a CSV export to disk
    Export {
        /// influencers, payments or videos
        #[arg(long)]
        kind: ExportKind,
        /// Output path; defaults to `{kind}_{YYYY-MM-DD}.csv` in the current directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Upsert the built-in administrator
    Seed,
    /// Drop every table, then re-apply migrations
    Reset {
        /// Required; the reset destroys all data
        #[arg(long)]
        yes: bool,
    },
    /// Check database connectivity
    Ping,
}

#[derive(Debug, Subcommand)]
enum AccountsCommands {
    /// Provision the accounts listed in the accounts file and print their tokens
    Demo {
        /// Overrides `CREATORHUB_ACCOUNTS_PATH`
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
enum UsersCommands {
    /// Issue a fresh API token, replacing the previous one
    IssueToken {
        #[arg(long)]
        email: String,
    },
}

#[derive(Debug, Subcommand)]
enum RevenueCommands {
    /// Compute shares for a month (defaults to the previous month)
    Compute {
        /// `YYYY-MM`
        #[arg(long)]
        month: Option<BillingMonth>,
        /// JSON object mapping influencer id to `{leads_generated, revenue_from_leads}`
        #[arg(long)]
        leads: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("creatorhub-cli: run with --help to list commands");
        return Ok(());
    };

    let config = creatorhub_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = creatorhub_db::PoolConfig::from_app_config(&config);
    let pool = creatorhub_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Migrate => db::run_migrate(&pool).await?,
            DbCommands::Seed => db::run_seed(&pool).await?,
            DbCommands::Reset { yes } => db::run_reset(&pool, yes).await?,
            DbCommands::Ping => db::run_ping(&pool).await?,
        },
        Commands::Accounts {
            command: AccountsCommands::Demo { file },
        } => {
            let path = file.unwrap_or_else(|| config.accounts_path.clone());
            accounts::run_demo(&pool, &config, &path).await?;
        }
        Commands::Users {
            command: UsersCommands::IssueToken { email },
        } => accounts::run_issue_token(&pool, &config, &email).await?,
        Commands::Revenue {
            command: RevenueCommands::Compute { month, leads },
        } => revenue::run_compute(&pool, month, leads.as_deref()).await?,
        Commands::Export { kind, out } => export::run_export(&pool, kind, out).await?,
    }

    Ok(())
}
