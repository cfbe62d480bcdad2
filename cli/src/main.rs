//! Agentmesh CLI - manage agents and delegate tasks from the terminal

mod client;
mod messages;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::client::MeshClient;
use crate::messages::{Agent, DelegateRequest, Receipt};

#[derive(Parser)]
#[command(name = "agentmesh-cli")]
#[command(about = "Command-line client for the agentmesh registry")]
#[command(version)]
struct Cli {
    /// Registry base URL
    #[arg(short, long, env = "AGENTMESH_SERVER", default_value = "http://localhost:3000")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered agents
    List,

    /// Show one agent
    Show { name: String },

    /// Register or update an agent from a JSON descriptor
    Register {
        #[arg(short, long)]
        file: std::path::PathBuf,
    },

    /// Refresh an agent's last-seen time
    Heartbeat { name: String },

    /// Remove an agent
    Remove { name: String },

    /// Rank agents for a free-text query
    Discover {
        query: String,

        #[arg(short, long)]
        limit: Option<usize>,

        /// Resource the agent must cover (repeatable)
        #[arg(short, long = "resource")]
        resources: Vec<String>,
    },

    /// Hand a task to an agent
    Delegate {
        agent: String,
        task: String,

        /// Let the agent report back through the callback URL
        #[arg(long = "async")]
        async_mode: bool,

        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Show a delegation's ledger entry
    Status { id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agentmesh_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let client = MeshClient::new(&cli.server)?;

    match cli.command {
        Commands::List => run_list(&client).await,
        Commands::Show { name } => {
            let agent = client.get_agent(&name).await?;
            print_agent(&agent);
            Ok(())
        }
        Commands::Register { file } => run_register(&client, &file).await,
        Commands::Heartbeat { name } => {
            let agent = client.heartbeat(&name).await?;
            println!(
                "{} last seen {}",
                agent.name,
                agent.last_seen.format("%Y-%m-%d %H:%M:%S")
            );
            Ok(())
        }
        Commands::Remove { name } => {
            client.remove(&name).await?;
            println!("Removed {}", name);
            Ok(())
        }
        Commands::Discover {
            query,
            limit,
            resources,
        } => run_discover(&client, &query, limit, resources).await,
        Commands::Delegate {
            agent,
            task,
            async_mode,
            timeout_secs,
        } => {
            run_delegate(
                &client,
                DelegateRequest {
                    agent,
                    task,
                    async_mode,
                    timeout_secs,
                },
            )
            .await
        }
        Commands::Status { id } => run_status(&client, id).await,
    }
}

async fn run_list(client: &MeshClient) -> Result<()> {
    let agents = client.list_agents().await?;

    if agents.is_empty() {
        println!("No agents registered.");
    } else {
        println!("Agents:");
        println!("{:─<60}", "");
        for agent in agents {
            println!(
                "  {} - {} (last seen: {})",
                agent.name,
                agent.capabilities.join(", "),
                agent.last_seen.format("%Y-%m-%d %H:%M")
            );
        }
    }

    Ok(())
}

fn print_agent(agent: &Agent) {
    println!("{}", agent.name);
    println!("{:─<60}", "");
    if !agent.description.is_empty() {
        println!("  {}", agent.description);
    }
    println!("  endpoint:     {}", agent.endpoint);
    println!("  capabilities: {}", agent.capabilities.join(", "));
    for grant in &agent.resources {
        println!("  resource:     {}", grant);
    }
    if agent.auth.is_some() {
        println!("  auth:         configured");
    }
    println!(
        "  registered:   {}",
        agent.registered_at.format("%Y-%m-%d %H:%M")
    );
    println!("  last seen:    {}", agent.last_seen.format("%Y-%m-%d %H:%M"));
}

async fn run_register(client: &MeshClient, file: &std::path::Path) -> Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let descriptor: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    let agent = client.register(&descriptor).await?;
    println!("Registered {} at {}", agent.name, agent.endpoint);
    Ok(())
}

async fn run_discover(
    client: &MeshClient,
    query: &str,
    limit: Option<usize>,
    resources: Vec<String>,
) -> Result<()> {
    let results = client.discover(query, limit, resources).await?;

    if results.is_empty() {
        println!("No matching agents.");
        return Ok(());
    }

    for candidate in results {
        println!(
            "  {:.2}  {} - matched: {}",
            candidate.score,
            candidate.agent.name,
            candidate.matched_capabilities.join(", ")
        );
        for m in &candidate.matched_resources {
            println!("          {} via {}", m.requirement, m.grant);
        }
    }

    Ok(())
}

async fn run_delegate(client: &MeshClient, request: DelegateRequest) -> Result<()> {
    let receipt = client.delegate(&request).await?;
    let outcome = &receipt.outcome;

    println!(
        "Delegation {} to {}: {} ({} ms)",
        receipt.delegation_id, receipt.agent, outcome.status, outcome.latency_ms
    );
    if let Some(result) = &outcome.result {
        println!("{}", result);
    }
    if let Some(error) = &outcome.error {
        eprintln!("Error: {}", error);
    }
    if outcome.status == "accepted" {
        println!(
            "Running asynchronously; check with `agentmesh-cli status {}`",
            receipt.delegation_id
        );
    }

    check_outcome(&receipt)
}

/// A delegation that did not succeed makes the command fail
fn check_outcome(receipt: &Receipt) -> Result<()> {
    if receipt.outcome.success {
        return Ok(());
    }
    Err(anyhow!(
        "Delegation {} to {} {}",
        receipt.delegation_id,
        receipt.agent,
        receipt.outcome.status
    ))
}

async fn run_status(client: &MeshClient, id: Uuid) -> Result<()> {
    let entry = client.delegation(id).await?;

    println!("{} -> {} [{}]", entry.id, entry.agent_name, entry.status);
    println!("  task:    {}", entry.task);
    println!("  depth:   {}", entry.depth);
    if let Some(ms) = entry.latency_ms {
        println!("  latency: {} ms", ms);
    }
    if let Some(result) = &entry.result {
        println!("  result:  {}", result);
    }
    if let Some(error) = &entry.error {
        println!("  error:   {}", error);
    }
    println!(
        "  updated: {}",
        entry.updated_at.format("%Y-%m-%d %H:%M:%S")
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_discover() {
        let cli = Cli::try_parse_from([
            "agentmesh-cli",
            "discover",
            "web search",
            "--limit",
            "3",
            "--resource",
            "s3://a",
            "--resource",
            "s3://b",
        ])
        .unwrap();
        match cli.command {
            Commands::Discover {
                query,
                limit,
                resources,
            } => {
                assert_eq!(query, "web search");
                assert_eq!(limit, Some(3));
                assert_eq!(resources, vec!["s3://a", "s3://b"]);
            }
            _ => panic!("Expected Discover"),
        }
    }

    #[test]
    fn test_parse_delegate() {
        let cli = Cli::try_parse_from([
            "agentmesh-cli",
            "--server",
            "http://mesh:3000",
            "delegate",
            "crawler",
            "index the docs",
            "--async",
        ])
        .unwrap();
        assert_eq!(cli.server, "http://mesh:3000");
        match cli.command {
            Commands::Delegate {
                agent, async_mode, timeout_secs, ..
            } => {
                assert_eq!(agent, "crawler");
                assert!(async_mode);
                assert!(timeout_secs.is_none());
            }
            _ => panic!("Expected Delegate"),
        }
    }

    fn receipt(status: &str, success: bool) -> Receipt {
        serde_json::from_value(serde_json::json!({
            "delegation_id": "00000000-0000-0000-0000-000000000000",
            "agent": "crawler",
            "outcome": {"status": status, "success": success, "latency_ms": 3}
        }))
        .unwrap()
    }

    #[test]
    fn test_check_outcome() {
        assert!(check_outcome(&receipt("completed", true)).is_ok());
        assert!(check_outcome(&receipt("accepted", true)).is_ok());

        let err = check_outcome(&receipt("timeout", false)).unwrap_err();
        assert!(err.to_string().contains("crawler timeout"));
    }

    #[test]
    fn test_status_requires_uuid() {
        assert!(Cli::try_parse_from(["agentmesh-cli", "status", "not-a-uuid"]).is_err());
    }
}
