use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use kvdesk_core::Session;

use crate::settings::Target;

#[derive(Args, Debug)]
#[command(about = "List keys in the store")]
pub struct KeysArgs {
    /// Only keys containing this text (case-insensitive)
    #[arg(short, long, value_name = "TEXT")]
    pub filter: Option<String>,

    /// Output keys as a JSON array
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: KeysArgs, target: &Target) -> Result<()> {
    let store = target.connect()?;
    let mut session = Session::new();
    session
        .load_keys(&store)
        .with_context(|| format!("Failed to list keys from {}", target.url))?;

    if let Some(filter) = &args.filter {
        session.query(filter);
    }
    let keys = session.keys.visible();

    if args.json {
        println!("{}", serde_json::to_string_pretty(keys)?);
        return Ok(());
    }

    for key in keys {
        println!("{key}");
    }
    let total = session.keys.len();
    let summary = if keys.len() == total {
        format!("{total} keys")
    } else {
        format!("{} of {total} keys", keys.len())
    };
    eprintln!("{}", summary.dimmed());
    Ok(())
}
