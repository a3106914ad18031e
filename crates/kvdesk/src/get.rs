use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use kvdesk_core::record::KEY_TYPE_LABEL;
use kvdesk_core::{RecordStore, Session};

use crate::settings::Target;

#[derive(Args, Debug)]
#[command(about = "Print a record")]
pub struct GetArgs {
    /// Key to fetch
    pub key: String,

    /// Print the stored value exactly, without pretty-printing
    #[arg(long)]
    pub raw: bool,

    /// Print the full record as JSON
    #[arg(long, conflicts_with = "raw")]
    pub json: bool,
}

/// Make `key` the session's active record, fetching it from `store`.
pub(crate) fn load(session: &mut Session, store: &dyn RecordStore, key: &str) -> Result<()> {
    if let Some(request) = session.record.select(key)? {
        session
            .run_record(store, request)
            .with_context(|| format!("Failed to load \"{key}\""))?;
    }
    Ok(())
}

pub fn execute(args: GetArgs, target: &Target) -> Result<()> {
    let store = target.connect()?;
    let mut session = Session::new();
    load(&mut session, &store, &args.key)?;

    let record = session
        .record
        .record()
        .context("Store returned no record")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }
    if args.raw {
        println!("{}", record.raw_value);
        return Ok(());
    }

    println!("{}", session.record.text());
    let kind = if record.is_json { "JSON" } else { "text" };
    eprintln!(
        "{}",
        format!("{KEY_TYPE_LABEL} · {kind} · {}", session.record.size_label()).dimmed()
    );
    Ok(())
}
