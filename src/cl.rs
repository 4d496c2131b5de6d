//! Command line interface

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use reqwest::Url;

use crate::delivery::Sink;

/// Default base URL of The Cat API, endpoints are resolved relative to it
pub const DEFAULT_API_URL: &str = "https://api.thecatapi.com/v1/";

/// Command line arguments for `cats` binary
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct CatsArgs {
    /// What to fetch and where to write it
    #[clap(flatten)]
    pub run: RunConfig,
    /// API access options
    #[clap(flatten)]
    pub api: ApiOptions,
}

/// Command line arguments driving a pipeline run
#[derive(Parser, Debug, Clone, Default)]
pub struct RunConfig {
    /// Output filename for cat image.
    /// If not set, image bytes are written to standard output.
    #[clap(short = 'o', long = "output")]
    pub output_path: Option<PathBuf>,
    /// Log runtime messages to standard error
    #[clap(short, long)]
    pub verbose: bool,
    /// Only return cats of this breed ID
    #[clap(short = 'b', long = "breed")]
    pub breed_filter: Option<String>,
    /// Print the index of available cat breed IDs and exit
    #[clap(long = "breeds")]
    pub show_breed_help: bool,
}

impl RunConfig {
    /// Where the image bytes go
    #[must_use]
    pub fn sink(&self) -> Sink {
        match &self.output_path {
            Some(path) => Sink::File(path.clone()),
            None => Sink::Stdout,
        }
    }

    /// Level of logging output
    #[must_use]
    pub fn log_level(&self) -> log::Level {
        if self.verbose {
            log::Level::Debug
        } else {
            log::Level::Warn
        }
    }
}

/// Command line arguments related to API access
#[derive(Parser, Debug, Clone)]
pub struct ApiOptions {
    /// API key sent with every request
    #[clap(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// Base URL of the API
    #[clap(long, default_value = DEFAULT_API_URL)]
    pub api_url: Url,
    /// Timeout in seconds for API requests
    #[clap(long = "timeout", default_value_t = 10)]
    pub timeout_secs: u64,
    /// Timeout in seconds for the image download
    #[clap(long = "download-timeout", default_value_t = 60)]
    pub download_timeout_secs: u64,
}

impl ApiOptions {
    /// Total timeout for API requests
    pub(crate) fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Total timeout for the image download
    pub(crate) fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}
