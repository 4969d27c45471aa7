mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "arbiter-cli")]
#[command(about = "Arbiter CLI - Run and grade submissions against a judge instance", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile and run a source file once, printing the raw output
    Run {
        /// Path to the source file
        #[arg(short, long)]
        file: String,

        /// Language name (python, javascript, java, cpp, c)
        #[arg(short, long)]
        language: String,

        /// Optional file to feed to the program's stdin
        #[arg(short, long)]
        stdin: Option<String>,

        /// Base URL of the judge API
        #[arg(long, default_value = "http://localhost:3000")]
        api_url: String,
    },

    /// Grade a source file against a test-case JSON file
    Submit {
        /// Path to the source file
        #[arg(short, long)]
        file: String,

        /// Language name (python, javascript, java, cpp, c)
        #[arg(short, long)]
        language: String,

        /// Path to a JSON array of {input, expected_output} objects
        #[arg(short, long)]
        tests: String,

        /// Prior attempt count for this problem
        #[arg(long, default_value = "0")]
        attempts: u32,

        /// Prior correct-attempt count for this problem
        #[arg(long, default_value = "0")]
        correct: u32,

        /// Base URL of the judge API
        #[arg(long, default_value = "http://localhost:3000")]
        api_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            language,
            stdin,
            api_url,
        } => {
            commands::run(&file, &language, stdin.as_deref(), &api_url).await?;
        }
        Commands::Submit {
            file,
            language,
            tests,
            attempts,
            correct,
            api_url,
        } => {
            commands::submit(&file, &language, &tests, attempts, correct, &api_url).await?;
        }
    }

    Ok(())
}
