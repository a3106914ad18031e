use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use inquire::Confirm;
use kvdesk_core::Session;

use crate::get;
use crate::settings::Target;

#[derive(Args, Debug)]
#[command(about = "Delete a record")]
pub struct DeleteArgs {
    /// Key to delete
    pub key: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

pub fn execute(args: DeleteArgs, target: &Target) -> Result<()> {
    let store = target.connect()?;
    let mut session = Session::new();
    get::load(&mut session, &store, &args.key)?;

    let confirmation = session.record.request_delete()?;
    if !args.yes {
        let confirmed = Confirm::new(&confirmation.prompt())
            .with_default(false)
            .prompt()
            .unwrap_or(false);
        if !confirmed {
            println!("{} Delete cancelled", "✗".yellow());
            return Ok(());
        }
    }

    let request = session.record.delete(confirmation)?;
    session
        .run_record(&store, request)
        .with_context(|| format!("Failed to delete \"{}\"", args.key))?;
    println!("{} Deleted {}", "✓".green(), args.key.bold());
    Ok(())
}
