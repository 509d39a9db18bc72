//! codeint-agent CLI entry point

use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use tracing_subscriber::EnvFilter;

use codeint_agent::agent::{AgentRequest, ConversationDriver, NormalizedEvent, RunConfigBuilder};
use codeint_agent::config::{self, Config};
use codeint_agent::runtime::ProcessRunService;
use codeint_agent::{auth, ui};

#[derive(Parser)]
#[command(name = "codeint-agent")]
#[command(about = "Run an agent with a Code Interpreter sandbox, gateway tools and sub-agents")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.codeint-agent/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one conversation turn and stream its events
    Run {
        /// Task prompt
        #[arg(short, long)]
        prompt: Option<String>,

        /// Run session id to resume (from a previous run_completed event)
        #[arg(long)]
        resume: Option<String>,

        /// Code Interpreter session id (from a previous session_updated event)
        #[arg(long)]
        sandbox_session: Option<String>,

        /// Read the whole request from a JSON file instead
        #[arg(long, conflicts_with_all = ["prompt", "resume", "sandbox_session"])]
        request: Option<PathBuf>,

        /// Caller's bearer token, used to log who is asking
        #[arg(long)]
        authorization: Option<String>,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Write a default configuration file
    Init,

    /// Show the resolved configuration and capabilities
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Init => {
            let path = config::init()?;
            ui::print_step(&format!("Wrote default config to {:?}", path));
        }

        Commands::Status => {
            let config = load_config(cli.config.as_deref())?;
            let gateway_auth = auth::GatewayAuth::from_config(config.gateway.as_ref());
            let gateway = auth::resolve_gateway(gateway_auth.as_ref()).await?;
            let builder = RunConfigBuilder::new(&config, gateway.as_ref());

            println!("Model: {}", config.model);
            println!("Sub-agent model: {}", config.subagent_model);
            println!("CLI: {:?}", config.cli_path);
            println!("Sandbox server: {} {}", config.sandbox.command, config.sandbox.args.join(" "));
            match &gateway {
                Some(g) => println!("Gateway: {}", g.url),
                None => println!("Gateway: not configured"),
            }
            println!("Capabilities:");
            for capability in builder.capabilities() {
                println!("  {}", capability);
            }
        }

        Commands::Run { prompt, resume, sandbox_session, request, authorization, json } => {
            let config = load_config(cli.config.as_deref())?;
            let request = match request {
                Some(path) => read_request(&path)?,
                None => AgentRequest {
                    prompt: prompt.unwrap_or_default(),
                    run_resume_token: resume,
                    sandbox_session_id: sandbox_session,
                    runtime_session_id: None,
                },
            };
            if request.prompt.trim().is_empty() {
                bail!("A prompt is required (--prompt or --request)");
            }

            if let Some(token) = authorization {
                match auth::user_id_from_token(&token) {
                    Ok(user) => tracing::info!("[AGENT] User: {}", user),
                    Err(e) => ui::print_warning(&format!("Could not identify caller: {}", e)),
                }
            }

            run(&config, request, json).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let mut config = config::load_from(path)?;
            config.apply_overrides(|key| std::env::var(key).ok());
            config.validate()?;
            Ok(config)
        }
        None => Ok(config::load()?),
    }
}

fn read_request(path: &Path) -> Result<AgentRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request {:?}", path))?;
    Ok(serde_json::from_str(&content)?)
}

async fn run(config: &Config, request: AgentRequest, json: bool) -> Result<()> {
    let gateway_auth = auth::GatewayAuth::from_config(config.gateway.as_ref());
    let gateway = auth::resolve_gateway(gateway_auth.as_ref()).await?;
    let builder = RunConfigBuilder::new(config, gateway.as_ref());
    let driver = ConversationDriver::new(ProcessRunService::new(&config.cli_path), builder);

    let mut events = driver.run_conversation(request);
    let mut run_session = None;
    let mut sandbox_session = None;

    loop {
        let item = tokio::select! {
            item = events.next() => item,
            _ = tokio::signal::ctrl_c() => {
                ui::print_warning("Interrupted, stopping run");
                break;
            }
        };

        let Some(item) = item else { break };
        let event = match item {
            Ok(event) => event,
            Err(e) => {
                ui::print_error(&e.to_string());
                return Err(e.into());
            }
        };

        match &event {
            NormalizedEvent::RunCompleted { run_session_id } => run_session = Some(run_session_id.clone()),
            NormalizedEvent::SessionUpdated { new_session_id } => sandbox_session = Some(new_session_id.clone()),
            _ => {}
        }

        if json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            ui::print_event(&event);
        }
    }

    if !json {
        if let Some(id) = run_session {
            ui::print_step(&format!("Resume with --resume {}", id));
        }
        if let Some(id) = sandbox_session {
            ui::print_step(&format!("Sandbox session: --sandbox-session {}", id));
        }
    }

    Ok(())
}
