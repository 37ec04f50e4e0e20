//! mailsweep - Gmail subscription scanner and unsubscriber.
//!
//! Scans recent messages for `List-Unsubscribe` headers, aggregates
//! them per sender, and unsubscribes via one-click POST, automated
//! email, or a manual link.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod menu;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use clap::Parser;
use mailsweep_core::{ScanOptions, scan, select};
use mailsweep_gmail::{Authenticator, GmailClient, credentials};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Scan a Gmail account for newsletter subscriptions and unsubscribe
/// from them.
#[derive(Debug, Parser)]
#[command(name = "mailsweep", version, about)]
struct Args {
    /// Maximum number of recent messages to scan.
    #[arg(long, default_value_t = 500)]
    max_results: usize,

    /// Gmail search query to pre-filter the scan (e.g. "category:promotions").
    #[arg(long)]
    query: Option<String>,

    /// Minimum messages from a sender before it is listed.
    #[arg(long, default_value_t = 6)]
    min_count: u32,

    /// Concurrent header fetches.
    #[arg(long, default_value_t = 8)]
    workers: usize,

    /// Simulate unsubscribes without contacting anyone.
    #[arg(long)]
    dry_run: bool,

    /// Skip the menu and batch-unsubscribe every automatable sender.
    #[arg(long)]
    yes: bool,

    /// Path to the OAuth client secrets file (credentials.json).
    #[arg(long)]
    credentials: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailsweep=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    info!("Starting mailsweep");

    // Setup failures (missing credentials, denied authorization) are
    // the only errors allowed to end the process.
    let client = login(args.credentials.as_deref()).await?;

    let abort = Arc::new(AtomicBool::new(false));
    {
        let abort = Arc::clone(&abort);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nStopping scan...");
                abort.store(true, Ordering::Relaxed);
            }
        });
    }

    println!(
        "Scanning the last {} messages for unsubscribe headers...",
        args.max_results
    );

    let options = ScanOptions {
        max_results: args.max_results,
        query: args.query.clone(),
        workers: args.workers,
    };
    let result = scan(&client, &options, &abort, progress_line)
        .await
        .context("Message listing failed")?;
    eprintln!();

    println!(
        "Scan complete: {} messages examined, {} skipped, {} senders detected.",
        result.scanned,
        result.skipped,
        result.len()
    );

    if select(&result, args.min_count).is_empty() {
        println!(
            "No subscriptions with at least {} messages found (out of {} senders detected).",
            args.min_count,
            result.len()
        );
        return Ok(());
    }

    if args.yes {
        menu::run_batch(&client, &result, args.min_count, args.dry_run).await?;
    } else {
        menu::run(&client, &result, args.min_count, args.dry_run).await?;
    }

    Ok(())
}

/// Loads client secrets, obtains a token, and builds the API client.
async fn login(credentials_path: Option<&Path>) -> anyhow::Result<GmailClient> {
    let path = credentials::locate(credentials_path)?;
    let secrets = credentials::load_client_secrets(&path)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    let token = Authenticator::new(secrets)
        .obtain_token(|url| {
            println!("Authorize mailsweep in your browser:\n\n  {url}\n");
            if opener::open(url.as_str()).is_err() {
                println!("(could not open a browser, use the URL above)");
            }
        })
        .await
        .context("Gmail authorization failed")?;

    GmailClient::new(token.access_token).context("Failed to build Gmail client")
}

/// Overwrites one stderr line with scan progress, every tenth message
/// and at the end.
fn progress_line(done: usize, total: usize) {
    if done % 10 == 0 || done == total {
        eprint!("\rScanning: {done}/{total}");
        let _ = std::io::stderr().flush();
    }
}
