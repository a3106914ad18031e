use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table, presets};
use kvdesk_core::RecordStore;
use kvdesk_core::browse::{FileBrowser, start_directory};

use crate::settings::Target;

#[derive(Args, Debug)]
#[command(about = "List a directory on the store host")]
pub struct BrowseArgs {
    /// Directory to list (defaults to the one holding the current database)
    pub directory: Option<String>,

    /// Output the listing as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: BrowseArgs, target: &Target) -> Result<()> {
    let store = target.connect()?;

    let directory = match args.directory {
        Some(directory) => directory,
        None => {
            let config = store
                .get_config()
                .map_err(|e| log::warn!("Failed to fetch store config: {e}"))
                .ok();
            start_directory(config.as_ref())
        }
    };

    let mut browser = FileBrowser::new();
    let request = browser.open(directory);
    let response = request.perform(&store);
    let listing = response.result.clone();
    browser.apply(response);

    if let Some(error) = browser.error() {
        anyhow::bail!("Failed to list {}: {error}", browser.directory());
    }

    if args.json {
        let listing = listing.context("Listing missing")?;
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("{} {}", "Directory:".bold(), browser.directory());
    if browser.is_empty_dir() {
        println!("{}", "(no directories or database files)".dimmed());
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_BORDERS_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Type").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Path").add_attribute(Attribute::Bold),
        ]);
    for entry in browser.items() {
        let (kind, color) = if entry.is_dir() {
            ("dir", Color::Blue)
        } else {
            ("file", Color::Green)
        };
        table.add_row(vec![
            Cell::new(kind).fg(color),
            Cell::new(&entry.name),
            Cell::new(&entry.path),
        ]);
    }
    println!("{table}");
    Ok(())
}
