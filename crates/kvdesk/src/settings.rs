use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use kvdesk_api::HttpStore;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Contents of `~/.kvdesk/settings.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn settings_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().context("Failed to get home directory")?;
    Ok(home_dir.join(".kvdesk"))
}

pub fn settings_file_path() -> Result<PathBuf> {
    Ok(settings_dir()?.join("settings.toml"))
}

pub fn load_settings() -> Result<ClientSettings> {
    let path = settings_file_path()?;
    if !path.exists() {
        return Ok(ClientSettings::default());
    }
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn save_settings(settings: &ClientSettings) -> Result<PathBuf> {
    fs::create_dir_all(settings_dir()?)?;
    let path = settings_file_path()?;
    fs::write(&path, toml::to_string(settings)?)?;
    Ok(path)
}

/// Where the store URL came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlSource {
    Flag,
    Env,
    File,
    Default,
}

impl fmt::Display for UrlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UrlSource::Flag => "--url",
            UrlSource::Env => kvdesk_api::URL_ENV,
            UrlSource::File => "settings file",
            UrlSource::Default => "default",
        })
    }
}

/// The store this invocation talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub url: String,
    pub source: UrlSource,
    pub timeout: Duration,
}

impl Target {
    /// `--url` > `KVDESK_URL` > settings file > default
    pub fn resolve(flag: Option<&str>) -> Result<Self> {
        let settings = load_settings()?;
        Ok(Self::from_sources(
            flag,
            kvdesk_api::base_url_from_env(),
            &settings,
        ))
    }

    fn from_sources(flag: Option<&str>, env: Option<String>, settings: &ClientSettings) -> Self {
        let flag = flag.map(str::trim).filter(|url| !url.is_empty());
        let file = settings.url.as_deref().filter(|url| !url.trim().is_empty());

        let (url, source) = if let Some(url) = flag {
            (url.to_string(), UrlSource::Flag)
        } else if let Some(url) = env {
            (url, UrlSource::Env)
        } else if let Some(url) = file {
            (url.trim().to_string(), UrlSource::File)
        } else {
            (kvdesk_api::DEFAULT_BASE_URL.to_string(), UrlSource::Default)
        };

        let timeout = settings.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self {
            url,
            source,
            timeout: Duration::from_secs(timeout),
        }
    }

    pub fn connect(&self) -> Result<HttpStore> {
        HttpStore::new(&self.url, self.timeout)
            .with_context(|| format!("Failed to create a client for {}", self.url))
    }
}

#[derive(Args, Debug)]
#[command(about = "Show or change client settings")]
pub struct SettingsArgs {
    /// Save this store URL as the default
    #[arg(long = "set-url", value_name = "URL")]
    pub set_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Remove the settings file
    #[arg(long, conflicts_with_all = ["set_url", "timeout"])]
    pub reset: bool,
}

pub fn execute(args: SettingsArgs, url_flag: Option<&str>) -> Result<()> {
    if args.reset {
        let path = settings_file_path()?;
        if path.exists() {
            fs::remove_file(&path)?;
            println!("{} Removed {}", "✓".green(), path.display());
        } else {
            println!("No settings saved");
        }
        return Ok(());
    }

    if args.set_url.is_some() || args.timeout.is_some() {
        let mut settings = load_settings()?;
        if let Some(url) = args.set_url {
            let url = url.trim().trim_end_matches('/').to_string();
            if url.is_empty() {
                anyhow::bail!("URL must not be empty");
            }
            settings.url = Some(url);
        }
        if let Some(timeout) = args.timeout {
            settings.timeout_secs = Some(timeout);
        }
        let path = save_settings(&settings)?;
        println!("{} Saved settings to {}", "✓".green(), path.display());
    }

    let target = Target::resolve(url_flag)?;
    println!("{} {}", "URL:".bold(), target.url);
    println!("  {}", format!("from {}", target.source).dimmed());
    println!("{} {}s", "Timeout:".bold(), target.timeout.as_secs());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(url: Option<&str>, timeout_secs: Option<u64>) -> ClientSettings {
        ClientSettings {
            url: url.map(str::to_string),
            timeout_secs,
        }
    }

    #[test]
    fn flag_beats_env_and_file() {
        let target = Target::from_sources(
            Some("http://flag:1"),
            Some("http://env:2".to_string()),
            &file(Some("http://file:3"), None),
        );
        assert_eq!(target.url, "http://flag:1");
        assert_eq!(target.source, UrlSource::Flag);
    }

    #[test]
    fn env_beats_file() {
        let target = Target::from_sources(
            None,
            Some("http://env:2".to_string()),
            &file(Some("http://file:3"), Some(5)),
        );
        assert_eq!(target.url, "http://env:2");
        assert_eq!(target.source, UrlSource::Env);
        assert_eq!(target.timeout, Duration::from_secs(5));
    }

    #[test]
    fn blank_values_fall_through_to_the_default() {
        let target = Target::from_sources(Some("  "), None, &file(Some(""), None));
        assert_eq!(target.url, kvdesk_api::DEFAULT_BASE_URL);
        assert_eq!(target.source, UrlSource::Default);
        assert_eq!(target.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn settings_file_format() {
        let settings = file(Some("http://kv.local:5001"), Some(10));
        let text = toml::to_string(&settings).unwrap();
        insta::assert_snapshot!(text, @r#"
        url = "http://kv.local:5001"
        timeout_secs = 10
        "#);
        assert_eq!(toml::from_str::<ClientSettings>(&text).unwrap(), settings);
        assert_eq!(toml::from_str::<ClientSettings>("").unwrap(), ClientSettings::default());
    }
}
