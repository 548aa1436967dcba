use crate::error::Result;
use crate::validation;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Default)]
#[command(name = "wastewatch", about = "A terminal dashboard for waste-classification monitoring")]
#[command(version, long_about = None)]
pub struct Args {
    /// Backend API base URL (default: config file or http://localhost:8000)
    #[arg(short = 's', long = "server")]
    pub server: Option<String>,

    /// Base URL for detection images (default: the server URL)
    #[arg(long = "media-base")]
    pub media_base: Option<String>,

    /// Refresh interval in milliseconds
    #[arg(short = 't', long = "interval", default_value = "5000")]
    pub refresh_interval: u64,

    /// History page size
    #[arg(short = 'p', long = "page-size", default_value = "20")]
    pub page_size: u32,

    /// Number of recent detections to show
    #[arg(short = 'n', long = "recent", default_value = "5")]
    pub recent_limit: u32,

    /// Pre-filter history by waste type labels (comma separated)
    #[arg(short = 'w', long = "waste-types", value_delimiter = ',')]
    pub waste_types: Vec<String>,

    /// History start date (YYYY-MM-DD)
    #[arg(long = "start-date")]
    pub start_date: Option<String>,

    /// History end date (YYYY-MM-DD)
    #[arg(long = "end-date")]
    pub end_date: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long, default_value = "10")]
    pub timeout: u64,

    /// Log newly observed detections to file ("-" for stdout)
    #[arg(short = 'f', long = "file")]
    pub log_file: Option<String>,

    /// List available waste types and exit
    #[arg(short, long)]
    pub list_types: bool,

    /// Fetch every resource once, print a summary and exit (bypass TUI)
    #[arg(long)]
    pub test: bool,

    /// Submit a detection record for the given waste type id and exit
    #[arg(long, value_name = "TYPE_ID")]
    pub submit: Option<u64>,

    /// Confidence percentage for --submit
    #[arg(long, default_value = "100")]
    pub confidence: u8,

    /// Image file for --submit
    #[arg(long, value_name = "PATH")]
    pub image: Option<PathBuf>,

    /// Force plain terminal mode (bypass TUI)
    #[arg(long)]
    pub force_terminal: bool,
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        if let Some(server) = &self.server {
            validation::validate_server_url(server)?;
        }
        if let Some(media_base) = &self.media_base {
            validation::validate_server_url(media_base)?;
        }
        validation::validate_refresh_interval(self.refresh_interval)?;
        validation::validate_page_size(self.page_size)?;
        validation::validate_recent_limit(self.recent_limit)?;
        validation::validate_timeout(self.timeout)?;
        for label in &self.waste_types {
            validation::validate_type_label(label)?;
        }
        if let Some(date) = &self.start_date {
            validation::validate_date(date)?;
        }
        if let Some(date) = &self.end_date {
            validation::validate_date(date)?;
        }
        if self.submit.is_some() {
            validation::validate_confidence(self.confidence)?;
        }
        Ok(())
    }
}
