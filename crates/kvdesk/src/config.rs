use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use comfy_table::{Attribute, Cell, ContentArrangement, Table, presets};
use kvdesk_core::browse::validate_db_path;
use kvdesk_core::{RecordStore, Session, StoreConfig};

use crate::settings::Target;

#[derive(Args, Debug)]
#[command(about = "Show or change the store's database path")]
pub struct ConfigArgs {
    /// Point the store at this database file
    #[arg(long, value_name = "PATH")]
    pub db_path: Option<String>,

    /// Output the configuration as JSON
    #[arg(long)]
    pub json: bool,
}

fn config_table(config: &StoreConfig) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_BORDERS_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Setting").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

    table.add_row(vec![
        "db_path".to_string(),
        config.db_path.clone().unwrap_or_else(|| "-".to_string()),
    ]);
    for (name, value) in &config.extra {
        let value = match value.as_str() {
            Some(text) => text.to_string(),
            None => value.to_string(),
        };
        table.add_row(vec![name.clone(), value]);
    }
    table
}

pub fn execute(args: ConfigArgs, target: &Target) -> Result<()> {
    let store = target.connect()?;

    let config = match &args.db_path {
        Some(input) => {
            let path = validate_db_path(input)?;
            let config = store
                .put_config(&path)
                .with_context(|| format!("Failed to switch the store to {path}"))?;
            if !args.json {
                println!("{} Store now uses {}", "✓".green(), path.bold());
                let mut session = Session::new();
                let count = session
                    .load_keys(&store)
                    .context("Failed to list keys after the switch")?;
                println!("  {}", format!("{count} keys").dimmed());
            }
            config
        }
        None => store.get_config().context("Failed to fetch store config")?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else if args.db_path.is_none() {
        println!("{}", config_table(&config));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lists_db_path_first() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"db_path": "/data/kv.db", "readonly": false}"#).unwrap();
        let rendered = config_table(&config).to_string();
        let db_path = rendered.find("/data/kv.db").unwrap();
        let readonly = rendered.find("readonly").unwrap();
        assert!(db_path < readonly);
        assert!(rendered.contains("false"));
    }
}
