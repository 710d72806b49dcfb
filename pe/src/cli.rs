//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// planexec - plan and execute agent workflows through an orchestrator
#[derive(Parser)]
#[command(
    name = "pe",
    about = "Request, approve and stream agent plans from an orchestrator",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Print stream events as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ask the orchestrator for a plan
    Plan {
        /// What you want done
        prompt: String,

        /// Wrap the prompt in a decision prompt listing these agents
        #[arg(short, long, value_delimiter = ',')]
        agents: Vec<String>,

        /// Write the structured plan to this file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Execute the plan after approval
        #[arg(short, long)]
        execute: bool,

        /// Approve without asking
        #[arg(short, long, requires = "execute")]
        yes: bool,
    },

    /// Stream the execution of a saved JSON plan
    Run {
        /// Plan file (`{"plan": [...]}` or a bare step array)
        plan_file: PathBuf,

        /// Model identifier sent with the plan
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Print the text a saved plan renders to
    Render {
        /// Plan file (`{"plan": [...]}` or a bare step array)
        plan_file: PathBuf,
    },

    /// List models offered by the orchestrator
    Models,
}
