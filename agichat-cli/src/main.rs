// agichat CLI - Chat Message File Tools
// Reduces, duplicates, flags, and inspects messages stored as JSON or JSONL

use std::path::{Path, PathBuf};
use std::sync::Arc;

use agichat_core::logger::{MemoryLogStore, TracingReporter};
use agichat_core::{
    duplicate_message, message_fragments_reduce_text, message_was_interrupted_at_start,
    user_flag_emoji, JsonlWriter, LogDetails, LogOptions, Logger, LoggerConfig, Message,
    MessageUserFlag, DEFAULT_FRAGMENT_SEPARATOR,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::{eyre::Context, Result};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = LoggerConfig {
        default_source: "cli".to_string(),
        ..LoggerConfig::default()
    };
    let (logger, store) = Logger::in_memory(Arc::new(TracingReporter), config);

    match &cli.command {
        Command::Reduce(cmd) => handle_reduce(cmd, &logger)?,
        Command::Duplicate(cmd) => handle_duplicate(cmd, &logger)?,
        Command::Flag(cmd) => handle_flag(cmd, &logger)?,
        Command::Inspect(cmd) => handle_inspect(cmd, &logger)?,
    }

    if let Some(ref target) = cli.export_log {
        export_log(target.as_deref(), &store)?;
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(
    name = "agichat",
    author,
    version,
    about = "agichat: tools for chat message files",
    long_about = "Work with chat messages stored as a JSON array or as JSONL (one message per line).\nOutput messages are written as JSONL."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Write this run's log entries as JSONL to the given file; with no path,
    /// append them to today's log in the export directory ($AGICHAT_EXPORT_DIR)
    #[arg(long, global = true, num_args = 0..=1, value_name = "PATH")]
    export_log: Option<Option<PathBuf>>,
    /// Show debug diagnostics (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the plain text of each message
    Reduce(ReduceArgs),
    /// Copy messages under new ids
    Duplicate(DuplicateArgs),
    /// Turn a user flag on or off for every message
    Flag(FlagArgs),
    /// Summarize each message
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct ReduceArgs {
    /// Message file (JSON array or JSONL)
    file: PathBuf,
    /// Separator placed between fragments
    #[arg(short, long, default_value = DEFAULT_FRAGMENT_SEPARATOR)]
    separator: String,
    /// Leave attachment text out
    #[arg(long)]
    exclude_attachments: bool,
}

#[derive(Args, Debug)]
struct DuplicateArgs {
    file: PathBuf,
    /// Drop placeholder and auxiliary fragments
    #[arg(long)]
    skip_void: bool,
    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FlagArgs {
    file: PathBuf,
    #[arg(short, long, value_enum)]
    flag: FlagArg,
    /// Clear the flag instead of setting it
    #[arg(long)]
    off: bool,
    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    file: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FlagArg {
    Skip,
    Starred,
    NotifyComplete,
    CacheAuto,
    CacheUser,
}

impl From<FlagArg> for MessageUserFlag {
    fn from(arg: FlagArg) -> Self {
        match arg {
            FlagArg::Skip => MessageUserFlag::AixSkip,
            FlagArg::Starred => MessageUserFlag::Starred,
            FlagArg::NotifyComplete => MessageUserFlag::NotifyComplete,
            FlagArg::CacheAuto => MessageUserFlag::VndAntCacheAuto,
            FlagArg::CacheUser => MessageUserFlag::VndAntCacheUser,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load messages, logging and skipping the ones that fail to parse
fn load_messages(path: &Path, logger: &Logger) -> Result<Vec<Message>> {
    let mut messages = Vec::new();
    for (idx, parsed) in agichat_core::export::read_messages(path)?.into_iter().enumerate() {
        match parsed {
            Ok(message) => messages.push(message),
            Err(e) => {
                logger.error(
                    format!("Skipping message {} in {}", idx + 1, path.display()),
                    LogOptions::new().details(LogDetails::error(e)),
                );
            }
        }
    }

    tracing::debug!(file = %path.display(), count = messages.len(), "loaded messages");
    if messages.is_empty() {
        eprintln!("⚠ No messages found in {}", path.display());
    }
    Ok(messages)
}

fn write_output(messages: &[Message], output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            let (dir, file_name) = split_output_path(path)?;
            let written = JsonlWriter::with_base_dir(dir).write_messages(&file_name, messages)?;
            println!("✓ Wrote {} messages", messages.len());
            println!("  Location: {}", written.display());
        }
        None => {
            for message in messages {
                println!("{}", serde_json::to_string(message)?);
            }
        }
    }
    Ok(())
}

fn split_output_path(path: &Path) -> Result<(PathBuf, String)> {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| color_eyre::eyre::eyre!("Invalid output path: {}", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, file_name))
}

fn handle_reduce(args: &ReduceArgs, logger: &Logger) -> Result<()> {
    let messages = load_messages(&args.file, logger)?;
    for message in &messages {
        let text = message_fragments_reduce_text(
            &message.fragments,
            &args.separator,
            args.exclude_attachments,
        );
        println!("[{}] {}", message.role, text);
    }
    Ok(())
}

fn handle_duplicate(args: &DuplicateArgs, logger: &Logger) -> Result<()> {
    let messages = load_messages(&args.file, logger)?;
    let copies: Vec<Message> = messages
        .iter()
        .map(|m| duplicate_message(m, args.skip_void))
        .collect();

    logger.info(
        format!("Duplicated {} messages from {}", copies.len(), args.file.display()),
        LogOptions::new(),
    );
    write_output(&copies, args.output.as_ref())
}

fn handle_flag(args: &FlagArgs, logger: &Logger) -> Result<()> {
    let flag = MessageUserFlag::from(args.flag);
    let mut messages = load_messages(&args.file, logger)?;

    let changed = messages
        .iter_mut()
        .map(|m| m.set_user_flag(flag, !args.off))
        .filter(|changed| *changed)
        .count();
    eprintln!("{} of {} messages changed", changed, messages.len());

    write_output(&messages, args.output.as_ref())
}

fn handle_inspect(args: &InspectArgs, logger: &Logger) -> Result<()> {
    let messages = load_messages(&args.file, logger)?;

    println!("\n📊 {} messages in {}\n", messages.len(), args.file.display());
    for message in &messages {
        let flags: String = message
            .user_flags
            .iter()
            .map(|f| user_flag_emoji(*f))
            .collect();
        let status = match message.updated {
            Some(_) => "complete",
            None => "incomplete",
        };
        let text = message.text();
        let preview: String = text.chars().take(60).collect();

        println!(
            "{} {:<9} {:>2} fragments  {:<10} {}{}",
            message.id,
            message.role.as_str(),
            message.fragments.len(),
            status,
            flags,
            preview.replace('\n', " ")
        );

        if message_was_interrupted_at_start(message) {
            logger.warn(
                format!("Message {} was aborted before any output", message.id),
                LogOptions::new().source("inspect"),
            );
        }
    }
    Ok(())
}

fn export_log(path: Option<&Path>, store: &MemoryLogStore) -> Result<()> {
    let entries = store.entries();
    let written = match path {
        Some(path) => {
            let (dir, file_name) = split_output_path(path)?;
            JsonlWriter::with_base_dir(dir).write_log_entries(&file_name, &entries)
        }
        None => JsonlWriter::from_env()?
            .append_log_entries(&JsonlWriter::dated_file_name("agichat-log"), &entries),
    }
    .context("Failed to export log")?;
    eprintln!("✓ Exported {} log entries to {}", entries.len(), written.display());
    Ok(())
}
