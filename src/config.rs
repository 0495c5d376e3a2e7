use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

/// Lists every top-level field of the payload.
pub const DEFAULT_TEMPLATE: &str =
    "{{#each data}}<div class=\"field\" data-key=\"{{@key}}\">{{@key}}: {{this}}</div>\n{{/each}}";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read template {path}: {source}")]
    ReadTemplate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fetch a URL into a panel and print what it renders.
#[derive(Parser, Debug, Clone)]
#[command(name = "panelkit", version)]
pub struct Cli {
    /// Address the panel fetches its data from.
    #[arg(long, env = "PANEL_URL")]
    pub url: String,

    /// Selector of the attachment point.
    #[arg(long, env = "PANEL_ATTACH", default_value = "#app")]
    pub attach: String,

    /// Template file; a field listing is used when absent.
    #[arg(long, env = "PANEL_TEMPLATE")]
    pub template: Option<PathBuf>,

    /// Identity of the activation, repeatable.
    #[arg(long = "id")]
    pub ids: Vec<String>,

    /// Seconds to wait for the response.
    #[arg(long, env = "PANEL_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,
}

impl Cli {
    pub fn load_template(&self) -> Result<String, ConfigError> {
        match &self.template {
            Some(path) => std::fs::read_to_string(path).map_err(|source| ConfigError::ReadTemplate {
                path: path.clone(),
                source,
            }),
            None => Ok(DEFAULT_TEMPLATE.to_string()),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
