//! m4b-binder
//!
//! Batch converter that scans a directory of audiobook folders and
//! binds each one into a single M4B file with metadata, cover art,
//! and chapter markers. Audio work is delegated to ffmpeg.

mod audio;
mod cli;
mod config;
mod conversion;
mod core;
mod error;
mod logging;
mod planning;

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;

use crate::audio::LoftyTagReader;
use crate::cli::Cli;
use crate::config::Settings;
use crate::error::BindError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _ = logging::init_logging();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns Ok(true) only when every discovered book was bound.
async fn run(cli: Cli) -> Result<bool, BindError> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::load_default()?,
    };
    cli.apply_to(&mut settings);
    settings.validate()?;

    let root = cli.input_dir.clone();
    if !root.is_dir() {
        return Err(BindError::Config(format!(
            "input path is not a directory: {}",
            root.display()
        )));
    }

    conversion::verify_ffmpeg()?;

    let output_dir = conversion::resolve_output_dir(&root, cli.output.clone());
    conversion::ensure_output_dir(&output_dir)?;

    log::info!("Scanning {}", root.display());
    let reader = LoftyTagReader;
    let report = planning::discover_and_plan(&root, &output_dir, &settings, &reader)?;

    for issue in &report.issues {
        log::warn!("Excluded {}: {}", issue.folder.display(), issue.error);
    }
    for plan in &report.plans {
        log::info!(
            "Planned \"{}\": {} file(s), {}, {} chapter(s) -> {}",
            plan.display_title(),
            plan.book.file_count(),
            plan.decision.describe(),
            plan.chapters.len(),
            plan.output_filename
        );
    }

    if report.plans.is_empty() {
        log::info!("No audiobook folders found in {}", root.display());
        return Ok(report.issues.is_empty());
    }

    // Ctrl-C stops dispatching new books and kills in-flight ffmpeg
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupt received, finishing up");
                cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    let started = Instant::now();
    let output_dir_for_jobs = output_dir.clone();
    let cancel_for_jobs = cancel.clone();
    let summary = conversion::execute_plans(
        report.plans,
        settings.concurrency_limit,
        cancel,
        move |plan| {
            let output_dir = output_dir_for_jobs.clone();
            let cancel = cancel_for_jobs.clone();
            async move { conversion::bind_book(&plan, &output_dir, cancel).await }
        },
    )
    .await;

    log::info!(
        "Done: {} bound, {} failed, {} excluded in {:.1}s",
        summary.completed(),
        summary.failed(),
        report.issues.len(),
        started.elapsed().as_secs_f64()
    );
    for outcome in summary.outcomes.iter().filter(|o| !o.succeeded()) {
        if let Some(error) = &outcome.error {
            log::warn!("  failed: \"{}\": {}", outcome.title, error);
        }
    }
    if summary.cancelled {
        log::warn!("Run was cancelled before all books were processed");
    }

    Ok(summary.failed() == 0 && report.issues.is_empty() && !summary.cancelled)
}
