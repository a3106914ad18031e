use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use inquire::Confirm;
use kvdesk_core::Session;
use kvdesk_core::record::SaveDraft;

use crate::get;
use crate::settings::Target;

#[derive(Args, Debug)]
#[command(about = "Save a new value for an existing key")]
pub struct PutArgs {
    /// Key to update
    pub key: String,

    /// New value. Read from stdin when neither VALUE nor --file is given
    pub value: Option<String>,

    /// Read the new value from a file
    #[arg(short, long, value_name = "PATH", conflicts_with = "value")]
    pub file: Option<PathBuf>,

    /// Save values that are not valid JSON without asking
    #[arg(short, long)]
    pub yes: bool,
}

fn read_value(args: &PutArgs) -> Result<String> {
    if let Some(value) = &args.value {
        return Ok(value.clone());
    }
    if let Some(path) = &args.file {
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        eprintln!("{}", "Reading value from stdin (end with Ctrl-D)".dimmed());
    }
    let mut value = String::new();
    stdin
        .read_to_string(&mut value)
        .context("Failed to read value from stdin")?;
    Ok(value)
}

fn confirm_plain_text(draft: &SaveDraft) -> bool {
    if let Some(error) = draft.parse_error() {
        eprintln!("{} {error}", "Not valid JSON:".yellow());
    }
    Confirm::new(&format!("Save \"{}\" as plain text?", draft.key()))
        .with_default(false)
        .prompt()
        .unwrap_or(false)
}

pub fn execute(args: PutArgs, target: &Target) -> Result<()> {
    let value = read_value(&args)?;
    let store = target.connect()?;
    let mut session = Session::new();
    get::load(&mut session, &store, &args.key)?;

    session.record.set_text(value);
    let request = session
        .record
        .save(|draft| args.yes || confirm_plain_text(draft))?;
    let Some(request) = request else {
        println!("{} Save cancelled", "✗".yellow());
        return Ok(());
    };

    session
        .run_record(&store, request)
        .with_context(|| format!("Failed to save \"{}\"", args.key))?;
    println!(
        "{} Saved {} ({})",
        "✓".green(),
        args.key.bold(),
        session.record.size_label()
    );
    Ok(())
}
