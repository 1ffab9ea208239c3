// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse and validate command-line arguments (bad input stops us here,
//    before any network activity)
// 2. Detach into the background if -B was given
// 3. Dispatch to the selected mode: single file, URL list, or mirror
// 4. Print a summary and exit with a proper code:
//    0 = everything downloaded, 1 = some downloads failed, 2 = error
// =============================================================================

mod background;
mod cli;
mod config;
mod context;
mod crawl;
mod download;
mod fetch;
mod logging;
mod progress;
mod transfer;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::{Config, Mode, Settings};
use context::{RunContext, StatusSink};
use crawl::MirrorOptions;
use fetch::ReqwestFetcher;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let config = match Config::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(2);
        }
    };

    if config.settings.background && !background::is_child() {
        let pid = background::detach()?;
        println!(
            "Output will be written to \"{}\" (pid {}).",
            background::LOG_FILE,
            pid
        );
        return Ok(0);
    }

    logging::init();

    let status = if config.settings.background {
        StatusSink::log_file(Path::new(background::LOG_FILE))?
    } else {
        StatusSink::stdout()
    };
    let ctx = RunContext::new(
        status,
        config.settings.rate_limit,
        config.settings.background,
    );

    // Ctrl-C stops transfers between chunks; whatever finished stays on disk
    let cancel = ctx.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, stopping");
            cancel.cancel();
        }
    });

    let fetcher = ReqwestFetcher::new()?;

    match config.mode {
        Mode::Single { url, name } => {
            handle_single(&fetcher, &ctx, &config.settings, &url, name.as_deref()).await
        }
        Mode::Mirror(options) => handle_mirror(&fetcher, &ctx, &config.settings, options).await,
        Mode::Multi { urls } => handle_multi(fetcher, &ctx, &config.settings, &urls).await,
    }
}

// Downloads one URL
async fn handle_single(
    fetcher: &ReqwestFetcher,
    ctx: &RunContext,
    settings: &Settings,
    url: &str,
    name: Option<&str>,
) -> Result<i32> {
    if !settings.rate_limit.is_unlimited() {
        ctx.status.line(format!("rate limit: {}", settings.rate_limit));
    }

    match download::download_one(fetcher, ctx, url, &settings.dest_dir, name).await {
        Ok(_) => Ok(0),
        Err(e) => {
            ctx.status.line(format!("Error: {}", e));
            Ok(1)
        }
    }
}

// Mirrors a site into <dest>/<host>/
async fn handle_mirror(
    fetcher: &ReqwestFetcher,
    ctx: &RunContext,
    settings: &Settings,
    options: MirrorOptions,
) -> Result<i32> {
    ctx.status.line(format!("Downloading {}", options.seed));
    ctx.status.line(format!("Saving to {}", options.root.display()));

    let report = crawl::mirror_site(fetcher, ctx, options).await;

    if settings.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        ctx.status.line("Downloading complete");
        ctx.status.line(format!(
            "   saved: {}, failed: {}, skipped: {} off-site, {} filtered, {} malformed",
            report.saved.len(),
            report.failed.len(),
            report.out_of_scope,
            report.filtered,
            report.malformed
        ));
        for failed in &report.failed {
            ctx.status.line(format!("   failed {}: {}", failed.url, failed.error));
        }
    }

    Ok(if report.is_ok() { 0 } else { 1 })
}

// Downloads every URL from the -i list concurrently
async fn handle_multi(
    fetcher: ReqwestFetcher,
    ctx: &RunContext,
    settings: &Settings,
    urls: &[String],
) -> Result<i32> {
    ctx.status.line(format!("Downloading {} file(s)", urls.len()));

    let outcomes = download::download_all(Arc::new(fetcher), ctx, urls, &settings.dest_dir).await;
    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();

    if settings.json {
        let summaries: Vec<_> = outcomes.iter().map(|o| o.summary()).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        ctx.status.line(format!(
            "Download finished: {} ok, {} failed",
            outcomes.len() - failed,
            failed
        ));
    }

    Ok(if failed > 0 { 1 } else { 0 })
}
