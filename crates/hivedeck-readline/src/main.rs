use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use hivedeck_application::event::{self, ClientEvent, NoticeKind};
use hivedeck_application::{DashboardAggregator, TaskOrchestrator};
use hivedeck_core::TaskService;
use hivedeck_core::conversation::ConversationStore;
use hivedeck_core::dashboard::ActivityKind;
use hivedeck_interaction::{BackendConfig, RestTaskService};

const COMMANDS: &[&str] = &[
    "/new", "/list", "/switch", "/rename", "/delete", "/search", "/cancel", "/agents", "/status",
    "/activity", "/history", "/quit",
];

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|cmd| cmd.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// The main entry point for the Hivedeck readline REPL.
///
/// Wires the conversation store, the REST task service, the orchestrator and
/// the dashboard aggregator together, then drives a rustyline loop where
/// plain input becomes a task submission and slash commands manage
/// conversations and dashboard views. Assistant replies and notices arrive
/// asynchronously on the event channel and are printed by a spawned task.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // ===== Configuration =====
    let mut args = std::env::args().skip(1);
    let config = match args.next().as_deref() {
        Some("--config") => {
            let path = args
                .next()
                .ok_or_else(|| anyhow::anyhow!("--config requires a path"))?;
            BackendConfig::load(Path::new(&path))?.apply_env()
        }
        Some(other) => anyhow::bail!("Unknown argument: {}", other),
        None => BackendConfig::load_default()?,
    };

    // ===== Backend Initialization =====
    let service: Arc<dyn TaskService> = Arc::new(RestTaskService::new(&config));
    let store = Arc::new(ConversationStore::new());
    let (events, mut event_rx) = event::channel();

    let orchestrator = Arc::new(TaskOrchestrator::new(
        store.clone(),
        service.clone(),
        events.clone(),
        config.poll_interval(),
    ));
    let aggregator = Arc::new(DashboardAggregator::new(
        service,
        events,
        config.dashboard_debounce(),
        config.poll_interval(),
    ));
    orchestrator.attach_dashboard(aggregator.clone()).await;
    aggregator.start(orchestrator.watch_in_flight()).await;

    // Start with one conversation ready for input.
    store.create().await;

    // Spawn the event printer; it ends when the last sender is dropped.
    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                ClientEvent::AssistantMessage { text, .. } => {
                    for line in text.lines() {
                        println!("{}", line.bright_blue());
                    }
                }
                ClientEvent::Notice(notice) => {
                    let text = format!("* {}", notice.text);
                    match notice.kind {
                        NoticeKind::Info => println!("{}", text.bright_black()),
                        NoticeKind::Success => println!("{}", text.green()),
                        NoticeKind::Error => println!("{}", text.red()),
                    }
                }
            }
        }
    });

    // ===== REPL Setup =====
    let helper = CliHelper::new();
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));

    println!("{}", "=== Hivedeck ===".bright_magenta().bold());
    println!(
        "{}",
        format!("Connected to {}", config.base_url).bright_black()
    );
    println!(
        "{}",
        "Type a task for the agents, '/list' to see conversations, or '/quit' to exit."
            .bright_black()
    );
    println!();

    // ===== Main REPL Loop =====
    loop {
        let readline = rl.readline(">> ");

        match readline {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed == "/quit" || trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }

                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                if trimmed.starts_with('/') {
                    handle_command(trimmed, &store, &orchestrator, &aggregator).await;
                    continue;
                }

                if orchestrator.is_in_flight().await {
                    println!(
                        "{}",
                        "A task is still in flight; wait for it to finish.".yellow()
                    );
                    continue;
                }

                println!("{}", format!("> {}", trimmed).green());
                orchestrator.submit(trimmed).await;
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    // ===== Shutdown =====
    aggregator.stop().await;
    orchestrator.cancel_in_flight().await;
    drop(orchestrator);
    drop(aggregator);
    let _ = printer.await;

    Ok(())
}

/// Dispatches a slash command against the store and the aggregator.
async fn handle_command(
    line: &str,
    store: &Arc<ConversationStore>,
    orchestrator: &Arc<TaskOrchestrator>,
    aggregator: &Arc<DashboardAggregator>,
) {
    let (command, rest) = match line.split_once(' ') {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "/new" => {
            store.create().await;
            println!("{}", "Started a new conversation".green());
        }
        "/list" => {
            list_conversations(store).await;
        }
        "/switch" => {
            let conversations = store.snapshot().await;
            let target = rest
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|index| conversations.get(index));
            match target {
                Some(conversation) => {
                    store.select(conversation.id).await;
                    println!(
                        "{}",
                        format!("Switched to \"{}\"", conversation.title).green()
                    );
                }
                None => println!(
                    "{}",
                    "Usage: /switch <number> (see /list for numbers)".yellow()
                ),
            }
        }
        "/rename" => {
            if rest.is_empty() {
                println!("{}", "Usage: /rename <new title>".yellow());
                return;
            }
            match store.current_id().await {
                Some(id) => {
                    store.rename(id, rest).await;
                    println!("{}", format!("Renamed to \"{}\"", rest).green());
                }
                None => println!("{}", "No conversation to rename".yellow()),
            }
        }
        "/delete" => match store.current_id().await {
            Some(id) => {
                store.delete(id).await;
                println!("{}", "Conversation deleted".green());
            }
            None => println!("{}", "No conversation to delete".yellow()),
        },
        "/search" => {
            let matches = store.search(rest).await;
            if matches.is_empty() {
                println!("{}", "No matching conversations".bright_black());
            } else {
                for conversation in &matches {
                    println!(
                        "{}",
                        format!(
                            "{} ({} messages)",
                            conversation.title,
                            conversation.messages.len()
                        )
                        .cyan()
                    );
                }
            }
        }
        "/cancel" => {
            if orchestrator.is_in_flight().await {
                orchestrator.cancel_in_flight().await;
                println!("{}", "Cancelled the in-flight task".green());
            } else {
                println!("{}", "Nothing in flight".bright_black());
            }
        }
        "/agents" => {
            aggregator.refresh_roster().await;
            let state = aggregator.state().await;
            if state.agents.is_empty() {
                println!("{}", "No agents reported".bright_black());
            }
            for agent in &state.agents {
                println!(
                    "{}",
                    format!(
                        "{:<16} {:<12} {}",
                        agent.name,
                        format!("{:?}", agent.status).to_lowercase(),
                        agent.description
                    )
                    .cyan()
                );
            }
        }
        "/status" => {
            aggregator.refresh_roster().await;
            let state = aggregator.state().await;
            println!(
                "{}",
                format!(
                    "Agents: {} active / {} total",
                    state.status.active_agents, state.status.total_agents
                )
                .cyan()
            );
            println!(
                "{}",
                format!(
                    "Tasks:  {} active, {} completed, {} failed",
                    state.status.active_tasks,
                    state.status.total_completed_tasks,
                    state.status.total_failed_tasks
                )
                .cyan()
            );
            println!(
                "{}",
                format!(
                    "Load:   CPU {}% | Memory {}%",
                    state.load.cpu_usage, state.load.memory_usage
                )
                .cyan()
            );
        }
        "/activity" => {
            aggregator.refresh_activity().await;
            let state = aggregator.state().await;
            if state.activity.is_empty() {
                println!("{}", "No activity yet".bright_black());
            }
            for entry in &state.activity {
                let line = format!("[{}] {}: {}", entry.timestamp, entry.agent, entry.action);
                match entry.kind {
                    ActivityKind::Error => println!("{}", line.red()),
                    ActivityKind::Success => println!("{}", line.green()),
                    ActivityKind::Info => println!("{}", line.bright_black()),
                }
            }
        }
        "/history" => {
            aggregator.refresh_history().await;
            let state = aggregator.state().await;
            if state.history.is_empty() {
                println!("{}", "No completed tasks yet".bright_black());
            }
            for entry in &state.history {
                println!("{}", format!("[{}] {}", entry.timestamp, entry.task).cyan());
                if let Some(result) = &entry.result {
                    for line in result.lines() {
                        println!("{}", format!("    {}", line).bright_black());
                    }
                }
            }
        }
        _ => {
            println!("{}", "Unknown command".bright_black());
        }
    }
}

/// Prints every conversation with its listing number and current marker.
async fn list_conversations(store: &Arc<ConversationStore>) {
    let conversations = store.snapshot().await;
    if conversations.is_empty() {
        println!("{}", "No conversations yet".bright_black());
        return;
    }
    let current = store.current_id().await;
    for (index, conversation) in conversations.iter().enumerate() {
        let marker = if Some(conversation.id) == current {
            "*"
        } else {
            " "
        };
        println!(
            "{}",
            format!(
                "{} {}. {} ({} messages)",
                marker,
                index + 1,
                conversation.title,
                conversation.messages.len()
            )
            .cyan()
        );
    }
}
