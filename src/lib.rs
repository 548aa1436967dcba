//! # wastewatch
//!
//! A terminal dashboard for waste-classification monitoring, built on a
//! REST backend that serves detection records from a recognition camera.
//!
//! ## Features
//!
//! - Live polling of stats, distribution, confidence and trend widgets
//! - Filtered, paginated detection history
//! - Per-widget change detection so unchanged data never forces a redraw
//! - Detection submission and one-shot inspection modes for scripting
//!
//! ## Example
//!
//! ```rust,no_run
//! use wastewatch::cli::Args;
//! use wastewatch::run;
//!
//! let args = Args {
//!     server: Some("http://localhost:8000".to_string()),
//!     refresh_interval: 5000,
//!     page_size: 20,
//!     recent_limit: 5,
//!     timeout: 10,
//!     ..Default::default()
//! };
//!
//! run(args).expect("Failed to run wastewatch");
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod input;
pub mod logger;
pub mod model;
pub mod poll;
pub mod validation;

use anyhow::Result;
use api::ApiClient;
use cli::Args;
use crossterm::{execute, terminal::*};
use model::RecordFilter;
use std::time::Duration;

/// Main entry point for the wastewatch application.
///
/// Handles command-line arguments and dispatches to the appropriate mode
/// of operation (list types, submit, one-shot summary, dashboard).
pub fn run(args: Args) -> Result<()> {
    args.validate().map_err(|e| anyhow::anyhow!(e))?;

    // Dashboard mode owns the terminal; everything else logs to stderr.
    let interactive = !(args.list_types || args.test || args.submit.is_some() || args.force_terminal);
    init_tracing(interactive);

    let mut config = config::Config::load()?;
    config.apply_args(&args);

    let client = ApiClient::new(
        &config.server_url,
        config.media_base(),
        Duration::from_secs(config.request_timeout),
    )?;

    // Handle simple commands first
    if args.list_types {
        return list_types(&client);
    }

    if let Some(type_id) = args.submit {
        return submit_detection(&client, type_id, args.confidence, args.image.as_deref());
    }

    let filter = RecordFilter {
        waste_types: args.waste_types.clone(),
        start_date: args.start_date.clone(),
        end_date: args.end_date.clone(),
        page: Some(1),
        limit: Some(config.history_page_size),
    };

    if args.test || args.force_terminal {
        return print_summary(&client, &config, &filter);
    }

    match initialize_tui() {
        Ok(mut stdout) => {
            let result = dashboard::run_dashboard(client, config, filter, args.log_file);

            // Cleanup
            let _ = disable_raw_mode();
            let _ = execute!(stdout, LeaveAlternateScreen);
            result
        }
        Err(e) => {
            eprintln!("TUI initialization failed: {e}");
            eprintln!("Falling back to a one-shot summary...");
            print_summary(&client, &config, &filter)
        }
    }
}

fn init_tracing(interactive: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if interactive {
        // Writing to stderr would tear the alternate screen.
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn list_types(client: &ApiClient) -> Result<()> {
    let types = client.waste_types()?;

    if types.is_empty() {
        println!("No waste types configured on {}", client.base_url());
        return Ok(());
    }

    println!("{:<6} {:<14} {:<16} Color", "ID", "Label", "Display Name");
    for waste_type in types {
        println!(
            "{:<6} {:<14} {:<16} {}",
            waste_type.id, waste_type.label, waste_type.display_name, waste_type.color
        );
    }

    Ok(())
}

fn submit_detection(
    client: &ApiClient,
    type_id: u64,
    confidence: u8,
    image: Option<&std::path::Path>,
) -> Result<()> {
    let record = client.create_record(type_id, confidence, image)?;

    println!("Created detection record:");
    println!("  Id:         {}", record.id);
    println!("  Type:       {}", record.type_label);
    println!("  Confidence: {}%", record.confidence);
    println!("  Timestamp:  {}", model::format_timestamp(&record.timestamp));
    if !record.image.is_empty() {
        println!("  Image:      {}", client.media_url(&record.image));
    }

    Ok(())
}

/// Fetches every dashboard resource once and prints a plain-text summary.
/// Doubles as a connectivity check for scripts and headless environments.
fn print_summary(client: &ApiClient, config: &config::Config, filter: &RecordFilter) -> Result<()> {
    println!("wastewatch summary for {}", client.base_url());
    println!();

    let types = client.waste_types()?;
    let stats = client.waste_stats()?;

    println!("Totals:");
    println!("  {:<16} {}", "All items", stats.total_items());
    for slice in model::derive_distribution(&types, &stats) {
        println!("  {:<16} {} ({}%)", slice.name, slice.value, slice.percentage);
    }
    println!();

    println!("Distribution (server-side):");
    let distribution = client.waste_distribution()?;
    if distribution.is_empty() {
        println!("  (none)");
    }
    for slice in distribution {
        println!("  {:<16} {} ({}%)", slice.name, slice.value, slice.percentage);
    }
    println!();

    println!("Last 7 days:");
    let trend = client.waste_over_time()?;
    if trend.is_empty() {
        println!("  (none)");
    }
    for point in trend {
        println!("  {:<8} {} items", point.date, point.total());
    }
    println!();

    println!("Avg. confidence:");
    for point in client.waste_confidence()? {
        println!("  {:<16} {}%", point.name, point.confidence);
    }
    println!();

    let type_map = model::WasteTypeMap::from_types(&types);
    println!("Recent detections:");
    let recent = client.recent_detections(config.recent_limit)?;
    if recent.is_empty() {
        println!("  (none)");
    }
    for record in recent {
        println!(
            "  #{:<6} {:<12} {:>3}%  {}",
            record.id,
            type_map.display_name(&record.type_label),
            record.confidence,
            model::format_timestamp(&record.timestamp)
        );
    }
    println!();

    let page = client.waste_records(filter)?;
    println!(
        "History: {} records, page {}/{}",
        page.count,
        page.current_page.max(1),
        page.total_pages.max(1)
    );

    Ok(())
}

fn initialize_tui() -> Result<std::io::Stdout> {
    use std::io;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(e.into());
    }

    Ok(stdout)
}
