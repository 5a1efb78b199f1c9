//! Steward CLI - Main entry point

mod cli;
mod demo;

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Steward - governance toolkit for tool-using agents
#[derive(Parser, Debug)]
#[command(name = "steward")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inspect and evaluate policies
    #[command(subcommand)]
    Policy(PolicyCommand),

    /// Tool definition versioning
    #[command(subcommand)]
    Tool(ToolCommand),

    /// Agent definition versioning
    #[command(subcommand)]
    Agent(AgentCommand),

    /// Read audit logs
    #[command(subcommand)]
    Audit(AuditCommand),

    /// Show the effective configuration
    Config,

    /// Run a governed payment retry end to end
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum PolicyCommand {
    /// List registered policies
    List {
        /// Policy directory (defaults to config / STEWARD_POLICIES_DIR)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Evaluate a policy against a JSON input
    Eval {
        /// Policy id, e.g. payments/retry
        id: String,

        /// Input document as JSON
        #[arg(short, long)]
        input: String,

        /// Policy directory (defaults to config / STEWARD_POLICIES_DIR)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ToolCommand {
    /// Compare two tool definitions and compute the next version
    Bump(BumpArgs),
}

#[derive(Subcommand, Debug)]
enum AgentCommand {
    /// Compare two agent definitions and compute the next version
    Bump(BumpArgs),
}

#[derive(ClapArgs, Debug)]
struct BumpArgs {
    /// Current definition (JSON)
    #[arg(long)]
    old: PathBuf,

    /// Edited definition (JSON)
    #[arg(long)]
    new: PathBuf,

    /// Report changes without bumping the version
    #[arg(long)]
    no_bump: bool,
}

#[derive(Subcommand, Debug)]
enum AuditCommand {
    /// Print entries from a JSONL audit log (most recent first)
    Show {
        /// Audit log file (defaults to STEWARD_AUDIT_LOG / config)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Only entries for this agent
        #[arg(short, long)]
        agent: Option<String>,

        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Summarize a JSONL audit log
    Stats {
        /// Audit log file (defaults to STEWARD_AUDIT_LOG / config)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[derive(ClapArgs, Debug)]
pub struct DemoArgs {
    /// Payment amount
    #[arg(long, default_value = "5000")]
    pub amount: f64,

    /// Number of earlier retries
    #[arg(long, default_value = "0")]
    pub retries: u64,

    /// Request escalation (overrides limits)
    #[arg(long)]
    pub escalate: bool,

    /// Disable the agent before running
    #[arg(long)]
    pub disable_agent: bool,

    /// Mirror audit entries to this JSONL file
    #[arg(long)]
    pub audit_log: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = cli::load_config()?;

    match args.command {
        Command::Policy(PolicyCommand::List { dir }) => {
            cli::print_policies(&cli::load_policies(&config, dir)?);
            Ok(())
        }
        Command::Policy(PolicyCommand::Eval { id, input, dir }) => {
            let registry = cli::load_policies(&config, dir)?;
            cli::print_json(&cli::policy_eval(&registry, &id, &input)?)
        }
        Command::Tool(ToolCommand::Bump(bump)) => {
            cli::tool_bump(&bump.old, &bump.new, !bump.no_bump)?.print();
            Ok(())
        }
        Command::Agent(AgentCommand::Bump(bump)) => {
            cli::agent_bump(&bump.old, &bump.new, !bump.no_bump)?.print();
            Ok(())
        }
        Command::Audit(AuditCommand::Show { file, agent, limit }) => {
            cli::print_entries(&cli::audit_show(&config, file, agent.as_deref(), limit)?);
            Ok(())
        }
        Command::Audit(AuditCommand::Stats { file }) => {
            cli::print_json(&cli::audit_stats(&config, file)?)
        }
        Command::Config => cli::print_json(&config),
        Command::Demo(demo_args) => demo::run(&config, demo_args).await,
    }
}
