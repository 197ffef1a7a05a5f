//! Operation protocol CLI
//!
//! Parse messages and run proposed operations against a seeded in-memory
//! workspace.
//!
//! # Usage
//!
//! ```bash
//! # Parse tokens into llm_text + structured refs/ops
//! ops_cli parse 'Link this [ref v:1 type:task id:task-1] please.'
//!
//! # Run a message through the pipeline with a fixed set of proposals
//! ops_cli run --ops proposals.json --trust-mode training_wheels 'Create X'
//!
//! # Use your own workspace seed
//! ops_cli run --seed workspace.json --ops proposals.json 'Clean up Ops'
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use workroom_ops::{
    parse_message, ContractPayload, InMemoryThreadContextStore, InMemoryWorkspace,
    OperationPipeline, OperationProposer, OpsConfig, PipelineRequest, TrustMode, UiContext,
};

const OWNER: &str = "cli-user";

#[derive(Parser)]
#[command(name = "ops_cli")]
#[command(version = "0.1.0")]
#[command(about = "Parse and execute agent workspace operations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print compact JSON instead of pretty JSON
    #[arg(long, global = true)]
    compact: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a message (reads stdin if no text is given)
    Parse { text: Option<String> },

    /// Run a message through the full pipeline
    Run {
        text: Option<String>,

        /// JSON file of proposed operations returned by the proposer
        #[arg(long)]
        ops: PathBuf,

        /// Workspace seed JSON (defaults to a small demo workspace)
        #[arg(long)]
        seed: Option<PathBuf>,

        /// training_wheels, supervised or autonomous (defaults to config)
        #[arg(long, env = "OPS_TRUST_MODE")]
        trust_mode: Option<TrustMode>,

        #[arg(long, default_value = "cli-thread")]
        thread: String,

        /// Optional YAML config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Default, Deserialize)]
struct Seed {
    #[serde(default)]
    projects: Vec<SeedProject>,
    #[serde(default)]
    tasks: Vec<SeedTask>,
    #[serde(default)]
    actions: Vec<SeedAction>,
}

#[derive(Debug, Deserialize)]
struct SeedProject {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SeedTask {
    id: String,
    title: String,
    project_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeedAction {
    id: String,
    title: String,
}

/// Returns the same proposals for every payload
struct FixedProposer {
    proposals: serde_json::Value,
}

#[async_trait]
impl OperationProposer for FixedProposer {
    async fn propose(&self, payload: &ContractPayload) -> Result<serde_json::Value> {
        tracing::debug!(llm_text = %payload.llm_text, "proposing fixed operations");
        Ok(self.proposals.clone())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Parse { text } => cmd_parse(text, cli.compact),
        Commands::Run {
            text,
            ops,
            seed,
            trust_mode,
            thread,
            config,
        } => cmd_run(text, &ops, seed.as_deref(), trust_mode, thread, config, cli.compact).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_parse(text: Option<String>, compact: bool) -> Result<()> {
    let text = read_text(text)?;
    let parsed = parse_message(&text)?;
    print_json(&parsed, compact)
}

async fn cmd_run(
    text: Option<String>,
    ops: &Path,
    seed: Option<&Path>,
    trust_mode: Option<TrustMode>,
    thread: String,
    config: Option<PathBuf>,
    compact: bool,
) -> Result<()> {
    let text = read_text(text)?;
    let config = match config {
        Some(path) => OpsConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => OpsConfig::from_env()?,
    };

    let proposals: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(ops).with_context(|| format!("reading {}", ops.display()))?,
    )?;
    let seed: Seed = match seed {
        Some(path) => serde_json::from_str(
            &std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?,
        )?,
        None => demo_seed(),
    };

    let workspace = Arc::new(InMemoryWorkspace::new());
    load_seed(&workspace, seed).await;

    let pipeline = OperationPipeline::new(
        workspace,
        Arc::new(InMemoryThreadContextStore::new()),
        Arc::new(FixedProposer { proposals }),
        config,
    );

    let mut request = PipelineRequest::new(OWNER, text)
        .in_thread(thread)
        .with_ui(UiContext::hub());
    request.trust_mode = trust_mode;

    let outcome = pipeline.run(request).await?;
    print_json(&outcome, compact)
}

fn demo_seed() -> Seed {
    Seed {
        projects: vec![SeedProject {
            id: "project-ops".into(),
            name: "Ops".into(),
        }],
        tasks: vec![
            SeedTask {
                id: "task-1".into(),
                title: "Sample".into(),
                project_id: Some("project-ops".into()),
            },
            SeedTask {
                id: "task-2".into(),
                title: "Write docs".into(),
                project_id: None,
            },
        ],
        actions: vec![SeedAction {
            id: "action-1".into(),
            title: "Reply to the vendor".into(),
        }],
    }
}

async fn load_seed(workspace: &InMemoryWorkspace, seed: Seed) {
    for p in seed.projects {
        workspace.add_project(OWNER, &p.id, &p.name).await;
    }
    for t in seed.tasks {
        workspace
            .add_task(OWNER, &t.id, &t.title, t.project_id.as_deref())
            .await;
    }
    for a in seed.actions {
        workspace.add_action_item(OWNER, &a.id, &a.title).await;
    }
}

fn read_text(text: Option<String>) -> Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T, compact: bool) -> Result<()> {
    let out = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", out);
    Ok(())
}
