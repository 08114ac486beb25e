//! CLI entrypoint for roundtable
//!
//! This is the main binary that wires together all layers using
//! dependency injection: in-memory store, broadcast events (plus an
//! optional JSONL event log), provider clients, and the discussion engine.

use anyhow::{Result, bail};
use clap::Parser;
use colored::Colorize;
use roundtable_application::{
    CompositeEventSink, DiscussionEngine, EventSink, SessionEvent,
};
use roundtable_domain::{SessionId, SessionRecord};
use roundtable_infrastructure::{
    BroadcastEventSink, ConfigLoader, InMemorySessionStore, JsonlEventLog, ProviderFactory,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roundtable", about = "Run a multi-model roundtable discussion")]
struct Cli {
    /// Discussion topic
    topic: Option<String>,

    /// Round budget override
    #[arg(long)]
    rounds: Option<u32>,

    /// Explicit config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ignore all config files and use built-in defaults
    #[arg(long)]
    no_config: bool,

    /// Append every session event to this JSONL file
    #[arg(long)]
    event_log: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!(e))?
    };

    let topic = match cli.topic {
        Some(topic) => topic,
        None => bail!("A topic is required, e.g.: roundtable \"How should we test this?\""),
    };
    if config.participants.is_empty() {
        bail!(
            "No participants configured. Add [[participants]] entries to roundtable.toml \
             or pass --config."
        );
    }

    info!("Starting roundtable");

    // === Dependency Injection ===
    let store = Arc::new(InMemorySessionStore::new());
    let session_id = SessionId::new("session-1");

    let mut record = SessionRecord::new(session_id.clone(), config.session.title.clone(), topic)
        .with_generation(config.session.temperature, config.session.max_tokens)
        .with_max_rounds(cli.rounds.unwrap_or(config.session.max_rounds));
    record.validate()?;
    let roster = config
        .participants
        .iter()
        .enumerate()
        .map(|(i, p)| p.to_participant(i))
        .collect();
    store.insert_session(record.clone(), roster);

    let broadcast = Arc::new(BroadcastEventSink::new());
    let mut sinks: Vec<Arc<dyn EventSink>> = vec![broadcast.clone()];
    if let Some(path) = &cli.event_log {
        match JsonlEventLog::new(path) {
            Some(log) => sinks.push(Arc::new(log)),
            None => bail!("Could not open event log at {}", path.display()),
        }
    }
    let events = Arc::new(CompositeEventSink::new(sinks));

    let engine = Arc::new(
        DiscussionEngine::new(store.clone(), events, Arc::new(ProviderFactory::new()))
            .with_params(config.engine.to_engine_params()),
    );

    println!();
    println!("{}", format!("Topic: {}", record.topic).bold());
    println!(
        "Participants: {}",
        config
            .participants
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Rounds: {}", record.max_rounds);
    println!();

    // Subscribe before starting so no event is missed
    let mut rx = broadcast.subscribe(&session_id);
    engine.start(&session_id).await?;

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    let completed = matches!(event, SessionEvent::SessionCompleted { .. });
                    render_event(&event);
                    if completed {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    eprintln!("{}", format!("(skipped {} events)", missed).dimmed());
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                println!("{}", "Stopping session...".yellow());
                engine.stop(&session_id).await;
            }
        }
    }

    Ok(())
}

fn render_event(event: &SessionEvent) {
    match event {
        SessionEvent::RoundUpdate {
            current_round,
            max_rounds,
            ..
        } => {
            println!();
            println!(
                "{}",
                format!("=== Round {} of {} ===", current_round, max_rounds).bold()
            );
        }
        SessionEvent::ParticipantTyping { name, .. } => {
            println!("{}", format!("{} is thinking...", name).dimmed());
        }
        SessionEvent::ParticipantStoppedTyping { .. } => {}
        SessionEvent::NewMessage { message } => match message.role {
            roundtable_domain::Role::Assistant => {
                let name = message.participant_name.as_deref().unwrap_or("assistant");
                println!();
                println!("{}", name.cyan().bold());
                println!("{}", message.body);
            }
            roundtable_domain::Role::User => {
                println!();
                println!("{}", "you".green().bold());
                println!("{}", message.body);
            }
            roundtable_domain::Role::System => {
                println!();
                println!("{}", message.body.yellow());
            }
        },
        SessionEvent::ConsensusUpdate {
            percentage,
            total_messages,
            ..
        } => {
            println!(
                "{}",
                format!("consensus {:.1}% ({} messages)", percentage, total_messages).dimmed()
            );
        }
        SessionEvent::SessionCompleted {
            total_rounds,
            total_messages,
            consensus_percentage,
            ..
        } => {
            println!();
            println!(
                "{}",
                format!(
                    "Session completed: {} rounds, {} messages, consensus {:.1}%",
                    total_rounds, total_messages, consensus_percentage
                )
                .green()
                .bold()
            );
        }
    }
}
