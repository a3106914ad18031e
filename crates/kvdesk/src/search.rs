use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use kvdesk_core::highlight::Highlighter;
use kvdesk_core::search::ResultItem;
use kvdesk_core::{SearchMode, SearchView, Session};

use crate::settings::Target;

#[derive(Args, Debug)]
#[command(about = "Search key names, or keys and values with --global")]
pub struct SearchArgs {
    /// Text to look for (case-insensitive)
    pub term: String,

    /// Search record values as well as key names
    #[arg(short, long)]
    pub global: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored terminal output
    Text,
    /// HTML fragments with <mark> around matches
    Html,
    /// JSON output
    Json,
}

/// Matched parts reversed, the rest untouched.
fn paint(segments: &[(&str, bool)]) -> String {
    segments
        .iter()
        .map(|(text, matched)| {
            if *matched {
                text.black().on_yellow().to_string()
            } else {
                text.to_string()
            }
        })
        .collect()
}

fn print_keys(keys: &[String], term: &str, format: OutputFormat) -> Result<()> {
    let highlighter = Highlighter::new(term);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(keys)?),
        OutputFormat::Html => {
            for key in keys {
                println!("<li>{}</li>", highlighter.html(key));
            }
        }
        OutputFormat::Text => {
            for key in keys {
                println!("{}", paint(&highlighter.segments(key)));
            }
        }
    }
    Ok(())
}

fn print_results(items: &[ResultItem], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let hits: Vec<_> = items.iter().map(|item| &item.hit).collect();
            println!("{}", serde_json::to_string_pretty(&hits)?);
        }
        OutputFormat::Html => {
            for item in items {
                println!(
                    "<li><strong>{}</strong> <span>{}</span><pre>{}</pre></li>",
                    item.key_html(),
                    item.badges().join(" "),
                    item.preview_html()
                );
            }
        }
        OutputFormat::Text => {
            for item in items {
                let badges = item
                    .badges()
                    .iter()
                    .map(|badge| format!("[{badge}]"))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("{} {}", paint(&item.key_segments()).bold(), badges.dimmed());
                println!("    {}", paint(&item.preview_segments()));
            }
        }
    }
    Ok(())
}

pub fn execute(args: SearchArgs, target: &Target) -> Result<()> {
    let term = args.term.trim();
    if term.is_empty() {
        anyhow::bail!("Search term must not be empty");
    }

    let store = target.connect()?;
    let mut session = Session::new();
    if args.global {
        session.set_mode(SearchMode::Global);
    } else {
        session
            .load_keys(&store)
            .with_context(|| format!("Failed to list keys from {}", target.url))?;
    }

    let outcome = session.query(term);
    session.run_search(&store, outcome);

    match session.view() {
        SearchView::Keys(keys) => {
            print_keys(keys, term, args.format)?;
            if args.format == OutputFormat::Text {
                eprintln!(
                    "{}",
                    format!("{} of {} keys", keys.len(), session.keys.len()).dimmed()
                );
            }
        }
        SearchView::Results { items, .. } => {
            print_results(items, args.format)?;
            if args.format == OutputFormat::Text
                && let Some(summary) = session.search.summary()
            {
                eprintln!("{}", summary.dimmed());
            }
        }
        SearchView::Failed { term, message } => {
            anyhow::bail!("Search for \"{term}\" failed: {message}");
        }
        SearchView::Searching { term } => {
            anyhow::bail!("Search for \"{term}\" did not complete");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_leaves_unmatched_text_alone() {
        colored::control::set_override(false);
        assert_eq!(paint(&[("ab", false), ("CD", true), ("e", false)]), "abCDe");
    }
}
