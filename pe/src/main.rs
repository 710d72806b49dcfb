//! planexec - Plan Execution Client
//!
//! CLI entry point for requesting, approving and streaming agent plans.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, eyre};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use planexec::cli::{Cli, Command};
use planexec::client::{ExecutionHandle, ExecutionState, OrchestratorClient};
use planexec::config::Config;
use planexec::plan::{format_plan_preview, is_approval, is_rejection, render_plan, validate_plan};
use planexec::prompts::build_decision_prompt;
use planexec::stream::StreamEvent;

/// Events buffered between the execution task and the printer
const EVENT_CHANNEL_CAPACITY: usize = 64;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("planexec")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("planexec.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let resolved = config.orchestrator.resolve();
    info!(base_url = %resolved.base_url, model = %resolved.model, "planexec loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Plan {
            prompt,
            agents,
            save,
            execute,
            yes,
        } => {
            let client = OrchestratorClient::from_config(&resolved)?;
            cmd_plan(&client, &prompt, &agents, save.as_deref(), execute, yes, cli.json).await
        }
        Command::Run { plan_file, model } => {
            let client = OrchestratorClient::from_config(&resolved)?;
            cmd_run(&client, &plan_file, model.as_deref(), cli.json).await
        }
        Command::Render { plan_file } => cmd_render(&plan_file),
        Command::Models => {
            let client = OrchestratorClient::from_config(&resolved)?;
            cmd_models(&client).await
        }
    }
}

async fn cmd_plan(
    client: &OrchestratorClient,
    prompt: &str,
    agents: &[String],
    save: Option<&Path>,
    execute: bool,
    yes: bool,
    json: bool,
) -> Result<()> {
    let request_text = if agents.is_empty() {
        prompt.to_string()
    } else {
        build_decision_prompt(agents, prompt)?
    };

    let reply = client.request_plan(&request_text).await.context("Planning request failed")?;
    println!("{}", reply.text);

    let Some(plan) = reply.plan_json else {
        println!("{}", "No structured plan in the reply.".dimmed());
        if execute {
            return Err(eyre!("Nothing to execute: the orchestrator returned no plan"));
        }
        return Ok(());
    };

    debug!(source = ?reply.source, "cmd_plan: structured plan found");
    println!();
    println!("{}", format_plan_preview(&plan));
    if let Err(e) = validate_plan(&plan) {
        println!("{} {}", "Plan problem:".yellow(), e);
    }

    if let Some(path) = save {
        let pretty = serde_json::to_string_pretty(&plan)?;
        fs::write(path, pretty).context(format!("Failed to write plan to {}", path.display()))?;
        println!("{} {}", "Saved plan to".green(), path.display());
    }

    if !execute {
        return Ok(());
    }

    if !yes && !ask_approval(&mut io::stdin().lock(), &mut io::stdout())? {
        println!("{}", "Plan was cancelled.".yellow());
        return Ok(());
    }

    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let handle = client.approve_and_execute(Some(&plan), tx);
    follow_execution(handle, rx, json).await
}

/// Prompt until the answer is an approval or a rejection; end of input rejects
fn ask_approval(input: &mut impl BufRead, output: &mut impl Write) -> Result<bool> {
    loop {
        write!(output, "{} ", "Execute? [yes/no]".bold())?;
        output.flush()?;

        let mut answer = String::new();
        if input.read_line(&mut answer)? == 0 {
            debug!("ask_approval: end of input");
            return Ok(false);
        }
        if is_approval(&answer) {
            return Ok(true);
        }
        if is_rejection(&answer) {
            return Ok(false);
        }
        writeln!(output, "{}", "Please answer yes or no.".yellow())?;
    }
}

fn read_plan_file(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).context(format!("Failed to read plan file {}", path.display()))?;
    serde_json::from_str(&content).context(format!("Plan file {} is not valid JSON", path.display()))
}

async fn cmd_run(client: &OrchestratorClient, plan_file: &Path, model: Option<&str>, json: bool) -> Result<()> {
    let plan = read_plan_file(plan_file)?;
    if let Err(e) = validate_plan(&plan) {
        warn!(error = %e, "cmd_run: plan failed validation, executing anyway");
        eprintln!("{} {}", "Plan problem:".yellow(), e);
    }

    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let handle = match model {
        Some(model) => client.stream_plan(&render_plan(Some(&plan)), model, tx),
        None => client.approve_and_execute(Some(&plan), tx),
    };
    follow_execution(handle, rx, json).await
}

fn cmd_render(plan_file: &Path) -> Result<()> {
    let plan = read_plan_file(plan_file)?;
    println!("{}", render_plan(Some(&plan)));
    Ok(())
}

async fn cmd_models(client: &OrchestratorClient) -> Result<()> {
    let models = client.list_models().await;
    if models.is_empty() {
        println!("{}", "No models available.".dimmed());
    }
    for model in models {
        println!("{}", model);
    }
    Ok(())
}

/// Print events until the execution ends; Ctrl-C cancels it
async fn follow_execution(handle: ExecutionHandle, mut rx: mpsc::Receiver<StreamEvent>, json: bool) -> Result<()> {
    info!(id = %handle.id(), "follow_execution: started");

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => print_event(&event, json)?,
                None => break,
            },
            _ = tokio::signal::ctrl_c(), if !handle.is_cancelled() => {
                info!(id = %handle.id(), "follow_execution: interrupted, cancelling");
                handle.cancel();
            }
        }
    }

    match handle.wait().await {
        ExecutionState::Errored => Err(eyre!("Plan execution failed")),
        state => {
            debug!(%state, "follow_execution: done");
            Ok(())
        }
    }
}

fn print_event(event: &StreamEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    match event {
        StreamEvent::Data { payload } => match payload {
            Value::String(s) => println!("{}", s),
            other => println!("{}", other),
        },
        StreamEvent::Raw { raw } => println!("{}", raw.dimmed()),
        StreamEvent::Finished => println!("{}", "Plan completed.".green().bold()),
        StreamEvent::Cancelled => println!("{}", "Plan execution cancelled.".yellow()),
        StreamEvent::Error { message } => eprintln!("{} {}", "Plan execution failed:".red().bold(), message),
    }
    Ok(())
}
