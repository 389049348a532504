//! TestGate CLI - Command-line client
//!
//! Usage:
//!   testgate register <login> --password <pw> --full-name <name> --id-number <n> --role teacher
//!   testgate login <login> --password <pw>
//!   testgate whoami
//!   testgate test get <id>
//!   testgate test create --title Quiz1 --theme Algebra ... --deadline 2026-12-01
//!   testgate test delete <id>
//!   testgate logout

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use testgate_cli::{ApiClient, NewTestRequest, Registration, SessionFile};
use testgate_core::Role;

#[derive(Parser)]
#[command(name = "testgate")]
#[command(about = "Client for the TestGate API")]
#[command(version)]
struct Cli {
    /// API base URL
    #[arg(long, env = "TESTGATE_SERVER", default_value = "http://127.0.0.1:8000")]
    server: String,

    /// Where the session tokens are kept
    #[arg(long, env = "TESTGATE_SESSION")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        login: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        id_number: i64,
        /// teacher or student
        #[arg(long)]
        role: Role,
    },
    /// Log in and store the session
    Login {
        login: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in account
    Whoami,
    /// Work with tests
    Test {
        #[command(subcommand)]
        action: TestAction,
    },
}

#[derive(Subcommand)]
enum TestAction {
    /// Show a test
    Get { id: i64 },
    /// Create a test (teachers only)
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        theme: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        answer: String,
        /// YYYY-MM-DD
        #[arg(long)]
        deadline: NaiveDate,
    },
    /// Delete a test (teachers only)
    Delete { id: i64 },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let session_file = cli
        .session_file
        .map(SessionFile::new)
        .unwrap_or_else(SessionFile::default_location);
    let mut client =
        ApiClient::new(&cli.server, session_file).context("failed to load session")?;

    match cli.command {
        Commands::Register {
            login,
            password,
            full_name,
            id_number,
            role,
        } => {
            let response = client
                .register(&Registration {
                    login,
                    password,
                    full_name,
                    identification_number: id_number,
                    role,
                })
                .await?;
            print_json(&response)?;
        }
        Commands::Login { login, password } => {
            let pair = client.login(&login, &password).await?;
            println!(
                "Logged in as {login}, access token valid for {}s",
                pair.expires_in
            );
        }
        Commands::Logout => {
            client.logout()?;
            println!("Logged out");
        }
        Commands::Whoami => {
            let profile = client.whoami().await?;
            print_json(&profile)?;
        }
        Commands::Test { action } => match action {
            TestAction::Get { id } => {
                let test = client.get_test(id).await?;
                print_json(&test)?;
            }
            TestAction::Create {
                title,
                theme,
                description,
                answer,
                deadline,
            } => {
                let response = client
                    .create_test(&NewTestRequest {
                        title,
                        theme,
                        description,
                        answer,
                        date_deadline: deadline,
                    })
                    .await?;
                print_json(&response)?;
            }
            TestAction::Delete { id } => {
                let response = client.delete_test(id).await?;
                print_json(&response)?;
            }
        },
    }

    Ok(())
}
