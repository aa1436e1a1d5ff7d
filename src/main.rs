mod config;
mod core;
mod services;
mod ui;

use std::process::ExitCode;

use clap::Parser;
use colored::*;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::core::Conversation;
use crate::services::{HistoryLog, OpenAiClient, ShellRunner};
use crate::ui::{Session, SessionEnd, TerminalPrompt};

#[derive(Parser)]
#[command(name = "jinn")]
#[command(version)]
#[command(about = "Turns natural-language instructions into runnable shell commands")]
struct Cli {
    /// The instruction, in your own words
    #[arg(required = true)]
    instruction: Vec<String>,

    /// Skip reading and writing the conversation log
    #[arg(short = 'd', long)]
    disable_history: bool,

    /// Ask before executing the generated command
    #[arg(short, long)]
    confirm: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.to_string().red());
            return ExitCode::from(1);
        }
    };

    let instruction = cli.instruction.join(" ");

    let history = if cli.disable_history {
        None
    } else {
        Some(HistoryLog::new(config.history_path.clone()))
    };
    let prior = history.as_ref().map(HistoryLog::load).unwrap_or_default();
    let conversation = Conversation::with_prior(config.system_message(), prior);

    let prompter = match TerminalPrompt::new() {
        Ok(prompter) => prompter,
        Err(e) => {
            eprintln!("{}", e.to_string().red());
            return ExitCode::from(1);
        }
    };

    let mut session = Session::new(
        OpenAiClient::from_config(&config),
        ShellRunner::new(),
        prompter,
        conversation,
        history,
        cli.confirm,
    );

    match session.run(&instruction).await {
        Ok(SessionEnd::Success) => ExitCode::SUCCESS,
        Ok(SessionEnd::Declined) => ExitCode::from(2),
        Err(e) => {
            eprintln!("{}", e.to_string().red());
            ExitCode::from(1)
        }
    }
}
