mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use testbench_common::types::Language;
use testbench_harness::reports::IssueType;

#[derive(Parser)]
#[command(name = "testbench-cli")]
#[command(about = "Testbench CLI - Run submissions against problem test cases", long_about = None)]
struct Cli {
    /// Harness config file (defaults to config/harness.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the execution service's runtimes, or resolve one language
    Runtimes {
        #[arg(short, long)]
        language: Option<Language>,
    },

    /// Print the starter program for a language
    Template {
        #[arg(short, long)]
        language: Language,
    },

    /// Show the program that would be submitted for a source file
    Adapt {
        #[arg(short, long)]
        language: Language,

        #[arg(short, long)]
        source: PathBuf,
    },

    /// Run source code once against arbitrary stdin
    Exec {
        #[arg(short, long)]
        language: Language,

        #[arg(short, long)]
        source: PathBuf,

        /// File whose content is passed as stdin
        #[arg(long)]
        stdin: Option<PathBuf>,
    },

    /// Run a single test case of a problem
    Run {
        /// Problem JSON with inputTestCases/outputTestCases
        #[arg(short, long)]
        problem: PathBuf,

        #[arg(short, long)]
        language: Language,

        #[arg(short, long)]
        source: PathBuf,

        /// Test case id (1-based)
        #[arg(short, long)]
        case: u32,

        /// Grant access to hidden test cases
        #[arg(long, default_value = "false")]
        all_access: bool,
    },

    /// Run every test case of a problem; fails unless all pass
    Submit {
        #[arg(short, long)]
        problem: PathBuf,

        #[arg(short, long)]
        language: Language,

        #[arg(short, long)]
        source: PathBuf,

        /// User to mark the problem solved for
        #[arg(short, long)]
        user: Option<String>,

        #[arg(long, default_value = "false")]
        all_access: bool,
    },

    /// Report a test case that looks wrong
    Report {
        #[arg(short, long)]
        problem: PathBuf,

        #[arg(short, long)]
        case: u32,

        /// wrong_expected_output, invalid_input, unclear or other
        #[arg(short, long)]
        issue: IssueType,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Output your program produced for the case
        #[arg(long)]
        actual_output: Option<String>,

        #[arg(short, long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Runtimes { language } => {
            commands::list_runtimes(&config, language).await?;
        }
        Commands::Template { language } => {
            commands::print_template(language);
        }
        Commands::Adapt { language, source } => {
            commands::adapt_source(language, &source)?;
        }
        Commands::Exec { language, source, stdin } => {
            commands::exec(&config, language, &source, stdin.as_deref()).await?;
        }
        Commands::Run {
            problem,
            language,
            source,
            case,
            all_access,
        } => {
            commands::run_case(&config, &problem, language, &source, case, all_access).await?;
        }
        Commands::Submit {
            problem,
            language,
            source,
            user,
            all_access,
        } => {
            commands::submit(&config, &problem, language, &source, user, all_access).await?;
        }
        Commands::Report {
            problem,
            case,
            issue,
            description,
            actual_output,
            user,
        } => {
            commands::report(&config, &problem, case, issue, &description, actual_output, user).await?;
        }
    }

    Ok(())
}
