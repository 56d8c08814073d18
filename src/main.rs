use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cnote::utils::{ensure_database_directory, get_database_path};
use cnote::{ItemId, NoteError, NoteStore, backup, logging};
use time::OffsetDateTime;
use time::macros::format_description;

/// cnote - a command line note app with tagged items
#[derive(Parser)]
#[command(name = "cnote")]
#[command(about = "A command line note app: tagged items grouped into notes")]
#[command(version)]
struct Cli {
    /// Path of the note database
    #[arg(long, global = true, env = "CNOTE_DB", value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Create a new note and select it
    New {
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Delete a note and all of its items
    Del {
        #[arg(value_name = "NAME")]
        name: String,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Select a note
    Use {
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// List all notes
    #[command(visible_alias = "ls")]
    List,
    /// Add an item to the current note
    Add {
        /// Comma-separated tags
        #[arg(value_name = "TAGS")]
        tags: String,
        /// The content of the item
        #[arg(value_name = "CONTENT")]
        content: String,
    },
    /// Remove items from the current note
    Rm {
        #[arg(value_name = "ID", required = true)]
        ids: Vec<ItemId>,
    },
    /// List items by tags, or all tags when none are given
    #[command(visible_alias = "t")]
    Tag {
        #[arg(value_name = "TAG")]
        tags: Vec<String>,
    },
    /// Search items with regular expressions
    #[command(visible_alias = "s")]
    Search {
        #[arg(value_name = "PATTERN", required = true)]
        patterns: Vec<String>,
    },
    /// Dump the whole database, for backup or transfer
    Dump,
    /// Wipe the whole database
    Wipe {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Wipe the whole database and restore it from a dump file
    Restore {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Import the items of a dumped note into a note
    Import {
        /// Note receiving the items
        #[arg(value_name = "NOTE")]
        note: String,
        /// Name of the note inside the dump
        #[arg(value_name = "DUMPED_NOTE")]
        dumped_note: String,
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init() {
        eprintln!("Warning: {e}");
    }

    if let Err(e) = run(cli) {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Determines if an error was caused by user input (vs internal error).
fn is_user_error(error: &anyhow::Error) -> bool {
    error
        .chain()
        .any(|cause| cause.downcast_ref::<NoteError>().is_some_and(NoteError::is_user_error))
}

fn run(cli: Cli) -> Result<()> {
    let db_path = match cli.db {
        Some(path) => path,
        None => get_database_path()?,
    };
    ensure_database_directory(&db_path)?;

    let mut store = NoteStore::open(&db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

    let stdout = io::stdout();
    let stdin = io::stdin();
    let result = execute(&cli.command, &mut store, &mut stdout.lock(), &mut stdin.lock());

    // Config is saved even when the command failed.
    store.close().context("Failed to save config")?;
    result
}

/// Executes a command against an open store.
///
/// Separated from `run` so tests can drive it with an in-memory store and
/// buffers for stdout and stdin.
fn execute<W: Write, R: BufRead>(
    command: &Commands,
    store: &mut NoteStore,
    out: &mut W,
    input: &mut R,
) -> Result<()> {
    match command {
        Commands::New { name } => {
            store.new_note(name)?;
            writeln!(out, "note \"{name}\" created.")?;
            print_current(store, out)?;
        }
        Commands::Del { name, yes } => {
            let note = store.load_note(name)?;
            let warning = format!(
                "Attention, it will delete all the {} items of note \"{}\".",
                note.sum, name
            );
            if *yes || confirm(out, input, &warning)? {
                store.delete_note(name)?;
                writeln!(out, "note \"{name}\" deleted.")?;
            }
        }
        Commands::Use { name } => {
            store.use_note(name)?;
            print_current(store, out)?;
        }
        Commands::List => {
            for summary in store.note_summaries()? {
                write!(
                    out,
                    "note: {}\t(#. of items: {}, last update: {}).",
                    summary.name,
                    summary.sum,
                    format_timestamp(summary.last_update)?
                )?;
                if summary.current {
                    write!(out, " (current note)")?;
                }
                writeln!(out)?;
            }
        }
        Commands::Add { tags, content } => {
            if content.trim().is_empty() {
                anyhow::bail!("Item content cannot be empty");
            }
            let item = store.add_item(tags, content)?;
            writeln!(out, "{item}")?;
        }
        Commands::Rm { ids } => {
            let note = store.require_current()?.name.clone();
            for id in ids {
                let item = store.remove_item(&note, *id)?;
                writeln!(out, "{item}")?;
            }
        }
        Commands::Tag { tags } if tags.is_empty() => {
            for stat in store.tag_stats()? {
                writeln!(out, "tag: {}\t(#. of items: {}).", stat.tag, stat.count)?;
            }
        }
        Commands::Tag { tags } => {
            let query = store.items_by_tag(tags.as_slice())?;
            let note = store.require_current()?;
            for tag in &query.missing {
                writeln!(out, "tag \"{tag}\" does not exist in note \"{}\".", note.name)?;
            }
            for item in &query.items {
                writeln!(out, "{item}")?;
            }
        }
        Commands::Search { patterns } => {
            for item in store.items_by_pattern(patterns.as_slice())? {
                writeln!(out, "{item}")?;
            }
        }
        Commands::Dump => {
            backup::write_dump(&store.dump()?, &mut *out)?;
        }
        Commands::Wipe { yes } => {
            if *yes || confirm(out, input, "Attention, it will clear all the data.")? {
                store.wipe()?;
            }
        }
        Commands::Restore { file, yes } => {
            let reader = open_dump(file)?;
            if *yes || confirm(out, input, "Attention, it will clear all the data.")? {
                let n = store.restore(reader)?;
                writeln!(out, "{n} records restored.")?;
            }
        }
        Commands::Import {
            note,
            dumped_note,
            file,
        } => {
            let n = store.import(note, dumped_note, open_dump(file)?)?;
            writeln!(out, "{n} items imported into note \"{note}\".")?;
        }
    }
    Ok(())
}

fn open_dump(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open dump file: {}", path.display()))?;
    Ok(BufReader::new(file))
}

fn print_current<W: Write>(store: &NoteStore, out: &mut W) -> Result<()> {
    let note = store.require_current()?;
    writeln!(
        out,
        "current note: \"{}\" (last update: {}).",
        note.name,
        format_timestamp(note.last_update)?
    )?;
    Ok(())
}

fn format_timestamp(t: OffsetDateTime) -> Result<String> {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute] [offset_hour sign:mandatory]:[offset_minute]");
    Ok(t.format(&format)?)
}

/// Asks the user to type "yes" before a destructive action.
fn confirm<W: Write, R: BufRead>(out: &mut W, input: &mut R, warning: &str) -> Result<bool> {
    let bar = "=".repeat(warning.len() + 2);
    writeln!(out, "{bar}\n {warning}\n{bar}")?;
    write!(out, " Type \"yes\" to continue: ")?;
    out.flush()?;

    let mut reply = String::new();
    input.read_line(&mut reply)?;
    if reply.trim() != "yes" {
        writeln!(out, "\ngiven up.")?;
        return Ok(false);
    }
    Ok(true)
}
