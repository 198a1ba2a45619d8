//! pomoedit - pomodoro timers driven by task lines
//!
//! CLI entry point.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result, eyre};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use pomoedit::broadcast::{BroadcastClient, BroadcastEvent, BroadcastServer, EventBus, spawn_event_logger};
use pomoedit::cli::{Cli, Command, OutputFormat, format_clock, generate_after_help};
use pomoedit::config::Config;
use pomoedit::plan::{Plan, compile_with_cap};
use pomoedit::scanner::{diagnose, scan};
use pomoedit::session::{EventHandlers, Phase, SessionSnapshot, TimerHandle};
use pomoedit::syntax::{Node, try_parse_syntax};
use pomoedit::watcher::{DocumentWatcher, document_id_for};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pomoedit")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > INFO
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

    let log_file = fs::File::create(log_dir.join("pomoedit.log")).context("Failed to create log file")?;

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
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Log level comes from the config before the full load so the load itself is logged
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Watch {
            file,
            broadcast,
            bind,
            event_log,
        } => cmd_watch(&config, &file, broadcast, bind, event_log).await,
        Command::Check { file, format } => cmd_check(&config, &file, format),
        Command::Plan { dsl, loop_cap, format } => cmd_plan(&config, &dsl, loop_cap, format),
        Command::Listen { addr } => cmd_listen(&config, addr).await,
    }
}

/// Compile and print a timer expression
fn cmd_plan(config: &Config, dsl: &str, loop_cap: Option<u32>, format: OutputFormat) -> Result<()> {
    debug!(%dsl, ?loop_cap, %format, "cmd_plan: called");
    let nodes = try_parse_syntax(dsl).map_err(|e| eyre!("Invalid timer expression '{}': {}", dsl, e))?;
    if nodes.iter().map(Node::leaf_count).sum::<usize>() == 0 {
        return Err(eyre!("Timer expression '{}' has no countdowns", dsl));
    }

    let plan = compile_with_cap(&nodes, loop_cap.unwrap_or(config.timer.loop_cap));
    match format {
        OutputFormat::Json => {
            let out = json!({
                "syntax": dsl,
                "total_seconds": plan.total_seconds(),
                "truncated": plan.is_truncated(),
                "entries": plan.entries(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => print_plan(&plan),
    }
    Ok(())
}

/// Show what a file declares
fn cmd_check(config: &Config, file: &Path, format: OutputFormat) -> Result<()> {
    debug!(file = %file.display(), %format, "cmd_check: called");
    let text = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let document_id = document_id_for(file);

    let Some(declaration) = scan(&text, &document_id) else {
        let reason = diagnose(&text);
        match format {
            OutputFormat::Json => {
                let error = reason.map(|(line, e)| json!({ "line": line + 1, "message": e.to_string() }));
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({ "declaration": null, "error": error }))?
                );
            }
            OutputFormat::Text => match reason {
                Some((line, e)) => println!("{} line {}: {}", "No timer:".yellow().bold(), line + 1, e),
                None => println!("{}", "No timer declaration found".yellow()),
            },
        }
        return Ok(());
    };

    let plan = compile_with_cap(&declaration.ast, config.timer.loop_cap);
    match format {
        OutputFormat::Json => {
            let out = json!({
                "declaration": declaration,
                "total_seconds": plan.total_seconds(),
                "truncated": plan.is_truncated(),
                "entries": plan.entries(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!(
                "{} line {}: [{}] {}",
                "Timer:".green().bold(),
                declaration.line + 1,
                declaration.raw_syntax.cyan(),
                declaration.label
            );
            if declaration.paused {
                println!("  {}", "paused".yellow());
            }
            print_plan(&plan);
        }
    }
    Ok(())
}

fn print_plan(plan: &Plan) {
    for (index, entry) in plan.entries().iter().enumerate() {
        let marker = if plan.announces_step(index) { "▶" } else { " " };
        println!(
            "{} {:>4}  {:>8}  {:<8} {}",
            marker,
            index + 1,
            format_clock(entry.seconds),
            entry.step_label(),
            entry.symbol.as_deref().unwrap_or("")
        );
    }
    println!(
        "{} {} entries, {}",
        "Total:".bold(),
        plan.len(),
        format_clock(plan.total_seconds())
    );
    if plan.is_truncated() {
        println!(
            "  {}",
            format!("truncated at {} entries", pomoedit::plan::MAX_PLAN_ENTRIES).yellow()
        );
    }
}

/// Watch a file and drive its timer until `quit` or Ctrl+C
async fn cmd_watch(
    config: &Config,
    file: &Path,
    broadcast: bool,
    bind: Option<String>,
    event_log: Option<PathBuf>,
) -> Result<()> {
    debug!(file = %file.display(), broadcast, ?bind, ?event_log, "cmd_watch: called");

    let broadcast = broadcast || bind.is_some() || config.broadcast.enabled;
    let event_log = event_log.or_else(|| config.broadcast.event_log.clone());

    let bus = (broadcast || event_log.is_some()).then(|| Arc::new(EventBus::new(config.broadcast.channel_capacity)));
    if let (Some(bus), Some(path)) = (&bus, &event_log) {
        info!(path = %path.display(), "Logging broadcast events");
        spawn_event_logger(bus.clone(), path);
    }
    if let Some(bus) = bus.as_ref().filter(|_| broadcast) {
        let addr = bind.unwrap_or_else(|| config.broadcast.bind.clone());
        let server = BroadcastServer::bind(&addr).await?;
        println!("{} {}", "Broadcasting on".dimmed(), server.local_addr()?);
        tokio::spawn(server.run(bus.clone()));
    }

    let handle = TimerHandle::spawn(&config.timer, bus.as_ref().map(|b| b.emitter()));
    let handlers = printing_handlers();

    let (tx, mut changes) = mpsc::channel(16);
    let watcher = DocumentWatcher::new(config.watch.clone(), file, tx);
    println!("{} {}", "Watching".dimmed(), watcher.document_id());
    let watcher_task = tokio::spawn(watcher.run());

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            change = changes.recv() => {
                let Some(change) = change else {
                    warn!("cmd_watch: watcher stopped");
                    break;
                };
                handle.evaluate(change.text, change.document_id, handlers.clone()).await?;
            }
            line = stdin.next_line(), if stdin_open => {
                match line.context("Failed to read stdin")? {
                    Some(line) => {
                        if !run_control(&handle, line.trim()).await? {
                            break;
                        }
                    }
                    None => {
                        debug!("cmd_watch: stdin closed, watching only");
                        stdin_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("cmd_watch: ctrl_c received");
                break;
            }
        }
    }

    watcher_task.abort();
    handle.shutdown().await?;
    println!();
    Ok(())
}

/// Handle one stdin control line; returns false on quit
async fn run_control(handle: &TimerHandle, command: &str) -> Result<bool> {
    debug!(%command, "run_control: called");
    match command {
        "" => {}
        "stop" => {
            handle.stop_timer().await?;
        }
        "retry" => {
            handle.retry_latest().await?;
        }
        "status" => print_snapshot(&handle.snapshot().await?),
        "quit" | "exit" | "q" => return Ok(false),
        other => println!("{} {} (stop, retry, status, quit)", "Unknown command:".red(), other),
    }
    Ok(true)
}

fn print_snapshot(snapshot: &SessionSnapshot) {
    let phase = match snapshot.phase {
        Phase::Idle => "idle".dimmed(),
        Phase::Running => "running".green(),
        Phase::Paused => "paused".yellow(),
    };
    match &snapshot.label {
        Some(label) if snapshot.phase != Phase::Idle => println!(
            "\r{} {} {}/{} entry {}/{} [{}]",
            phase,
            label,
            format_clock(snapshot.remaining),
            format_clock(snapshot.duration),
            snapshot.position + 1,
            snapshot.plan_len,
            snapshot.step
        ),
        _ => println!("\r{}", phase),
    }
}

fn printing_handlers() -> EventHandlers {
    EventHandlers::new()
        .on_start(|d| println!("\r{} {}", "start".green().bold(), d.label))
        .on_interval(|remaining, duration, step, symbol, d| {
            print!(
                "\r{} {} / {} {} {}   ",
                symbol.unwrap_or("⏱"),
                format_clock(remaining),
                format_clock(duration),
                if step.is_empty() { String::new() } else { format!("[{}]", step) },
                d.label
            );
            let _ = std::io::stdout().flush();
        })
        .on_step(|step, symbol, _| println!("\r{} {} {}", "step".cyan().bold(), step, symbol.unwrap_or("")))
        .on_finish(|d| println!("\r{} {}", "finish".magenta().bold(), d.label))
        .on_cancel(|| println!("\r{}", "cancel".red().bold()))
}

/// Print events from a broadcast listener until it closes
async fn cmd_listen(config: &Config, addr: Option<String>) -> Result<()> {
    let addr = addr.unwrap_or_else(|| config.broadcast.bind.clone());
    debug!(%addr, "cmd_listen: called");
    let mut client = BroadcastClient::connect(&addr).await?;
    println!("{} {}", "Listening to".dimmed(), addr);

    while let Some(event) = client.next_event().await? {
        match &event {
            BroadcastEvent::Interval {
                remaining,
                duration,
                step,
                symbol,
                content,
            } => println!(
                "{} {} / {} [{}] {} {}",
                "interval".dimmed(),
                format_clock(*remaining),
                format_clock(*duration),
                step,
                symbol.as_deref().unwrap_or(""),
                content
            ),
            BroadcastEvent::Step { step, symbol, content } => println!(
                "{} {} {} {}",
                "step".cyan().bold(),
                step,
                symbol.as_deref().unwrap_or(""),
                content
            ),
            BroadcastEvent::Finish { content } => println!("{} {}", "finish".magenta().bold(), content),
        }
    }

    println!("{}", "Connection closed".dimmed());
    Ok(())
}
