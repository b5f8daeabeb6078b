//! Sendo CLI - merchant desk in your terminal

use std::process::ExitCode;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{admin, auth, kyc, logs, payment, pin, status, transactions};

/// Sendo - merchant desk in your terminal
#[derive(Parser)]
#[command(name = "sendo", version, about, long_about = None)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to your Sendo account
    Login {
        /// Account email (prompted if omitted)
        #[arg(long)]
        email: Option<String>,
        /// Account password (prompted if omitted)
        #[arg(long, env = "SENDO_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Log out and forget the stored session
    Logout,

    /// Show session and account summary
    Status,

    /// Browse merchant transactions
    Transactions {
        #[command(subcommand)]
        command: transactions::TransactionsCommands,
    },

    /// Send funds to another Sendo wallet
    Transfer {
        /// Destination wallet matricule
        wallet: Option<String>,
        /// Amount to send
        #[arg(long)]
        amount: Option<Decimal>,
    },

    /// Withdraw merchant funds to a phone number
    Withdraw {
        /// Phone number receiving the funds
        phone: Option<String>,
        /// Amount to withdraw
        #[arg(long)]
        amount: Option<Decimal>,
    },

    /// Set or check the payment PIN
    Pin {
        #[command(subcommand)]
        command: pin::PinCommands,
    },

    /// Show merchant statistics
    Stats {
        /// Merchant id (defaults to your own merchant account)
        #[arg(long)]
        merchant: Option<i64>,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Show the commission report
    Commissions {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Commission type filter
        #[arg(long = "type")]
        kind: Option<String>,
    },

    /// Manage roles
    Roles {
        #[command(subcommand)]
        command: admin::RolesCommands,
    },

    /// Manage user accounts
    Users {
        #[command(subcommand)]
        command: admin::UsersCommands,
    },

    /// Upload KYC documents
    Kyc {
        #[command(subcommand)]
        command: kyc::KycCommands,
    },

    /// View and manage the local event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = match e.downcast_ref::<sendo_core::Error>() {
                Some(core) => core.user_message(),
                None => format!("{:#}", e),
            };
            output::error(&message);
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr; `SENDO_LOG` takes an EnvFilter directive
fn init_tracing() {
    let filter = EnvFilter::try_from_env("SENDO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn run(cli: Cli) -> Result<()> {
    let json = cli.json;
    match cli.command {
        Commands::Login { email, password } => auth::login(email, password, json).await,
        Commands::Logout => auth::logout(json).await,
        Commands::Status => status::run(json).await,
        Commands::Transactions { command } => transactions::run(command, json).await,
        Commands::Transfer { wallet, amount } => payment::transfer(wallet, amount, json).await,
        Commands::Withdraw { phone, amount } => payment::withdraw(phone, amount, json).await,
        Commands::Pin { command } => pin::run(command, json).await,
        Commands::Stats { merchant, from, to } => admin::stats(merchant, from, to, json).await,
        Commands::Commissions { from, to, kind } => {
            admin::commissions(from, to, kind, json).await
        }
        Commands::Roles { command } => admin::roles(command, json).await,
        Commands::Users { command } => admin::users(command, json).await,
        Commands::Kyc { command } => kyc::run(command, json).await,
        Commands::Logs { command } => logs::run(command, json),
    }
}
