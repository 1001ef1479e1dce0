//! Batch processing command for multiple expense reports.

use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use reimb_core::export::{ExpenseSummary, CATEGORIES};
use reimb_core::form::rules::format_amount;
use reimb_core::{
    write_csv, CancellationToken, FileJob, FileProcessor, JobStatus, ProcessedFile, ReimbError,
    SourceFile,
};

use super::{build_processor, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching the input files
    #[arg(required = true)]
    input: String,

    /// Output directory for the CSV export
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Number of files processed concurrently
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Keep going when a file fails
    #[arg(long)]
    continue_on_error: bool,

    /// Print a summary report after processing
    #[arg(long)]
    report: bool,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// OCR language hint
    #[arg(short, long)]
    lang: Option<String>,
}

type JobOutcome = (FileJob, Result<ProcessedFile, ReimbError>);

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let paths: Vec<PathBuf> = glob(&args.input)?.filter_map(|r| r.ok()).collect();
    if paths.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    // Invalid files are reported and never become jobs.
    let mut queued = Vec::with_capacity(paths.len());
    for path in paths {
        match SourceFile::from_path(&path) {
            Ok(file) => {
                let job = FileJob::new(&file.name, file.size_hint().unwrap_or(0));
                debug!("Queued {} as {} ({})", job.file_name, job.id, job.size);
                queued.push((file, job));
            }
            Err(e) => eprintln!("{} Skipping {}: {}", style("!").yellow(), path.display(), e),
        }
    }

    if queued.is_empty() {
        anyhow::bail!("No supported files matched: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        queued.len()
    );

    let processor = build_processor(&config, args.model_dir.as_deref(), args.lang.as_deref());
    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));
    let cancel = CancellationToken::new();

    let multi_progress = MultiProgress::new();
    let overall_pb = multi_progress.add(ProgressBar::new(queued.len() as u64));
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );
    let file_style = ProgressStyle::default_bar()
        .template("  {bar:30.green/white} {pos:>3}% {msg}")?
        .progress_chars("##-");

    let mut handles = Vec::with_capacity(queued.len());
    for (file, job) in queued {
        let semaphore = Arc::clone(&semaphore);
        let processor = processor.clone();
        let cancel = cancel.clone();
        let pb = multi_progress.add(ProgressBar::new(100));
        pb.set_style(file_style.clone());
        pb.set_message(file.name.clone());

        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await?;
            let outcome =
                tokio::task::spawn_blocking(move || run_job(&processor, &file, job, &pb, &cancel))
                    .await?;
            anyhow::Ok(outcome)
        }));
    }

    let mut jobs = Vec::with_capacity(handles.len());
    let mut results = Vec::new();
    for handle in handles {
        let (job, result) = handle.await??;
        overall_pb.inc(1);

        match result {
            Ok(processed) => results.push(processed),
            Err(e) => {
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", job.file_name, e);
                } else if !cancel.is_cancelled() {
                    error!("Failed to process {}: {}", job.file_name, e);
                    cancel.cancel();
                }
            }
        }
        jobs.push(job);
    }

    overall_pb.finish_with_message("Complete");

    let failed: Vec<&FileJob> = jobs
        .iter()
        .filter(|j| j.status == JobStatus::Error)
        .collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        jobs.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(results.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for job in &failed {
            println!(
                "  - {}: {}",
                job.file_name,
                job.error.as_deref().unwrap_or("unknown error")
            );
        }

        if !args.continue_on_error {
            anyhow::bail!(
                "{} file(s) failed; rerun with --continue-on-error to export the rest",
                failed.len()
            );
        }
    }

    let export_path = match &args.output_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            dir.join(&config.export.file_name)
        }
        None => PathBuf::from(&config.export.file_name),
    };
    write_csv(&results, File::create(&export_path)?, config.export.include_bom)?;
    println!(
        "{} Export written to {}",
        style("✓").green(),
        export_path.display()
    );

    if args.report {
        println!();
        print_report(&ExpenseSummary::from_results(&results));
    }

    Ok(())
}

fn run_job(
    processor: &FileProcessor,
    file: &SourceFile,
    mut job: FileJob,
    pb: &ProgressBar,
    cancel: &CancellationToken,
) -> JobOutcome {
    let result = job.start().and_then(|()| {
        processor.process(
            file,
            |p| {
                job.set_progress(p);
                pb.set_position(p as u64);
            },
            cancel,
        )
    });

    let transition = match &result {
        Ok(_) => {
            pb.finish_with_message(format!("{} done", file.name));
            job.complete()
        }
        Err(e) => {
            pb.abandon_with_message(format!("{} failed", file.name));
            job.fail(e.to_string())
        }
    };
    if let Err(e) = transition {
        warn!("Job {} left in {} state: {}", job.id, job.status, e);
    }

    (job, result)
}

fn print_report(summary: &ExpenseSummary) {
    println!("{}", style("Expense report").bold());
    println!(
        "  Grand total:  NT$ {}",
        format_amount(summary.grand_total)
    );
    println!("  Claimants:    {}", summary.claimants);
    println!("  Average:      NT$ {}", format_amount(summary.average));
    println!("  Largest:      NT$ {}", format_amount(summary.max_total));

    println!();
    for field in CATEGORIES {
        if let Some(category) = summary.categories.iter().find(|c| c.field == field) {
            println!(
                "  {:<6} NT$ {:>10}  {:>5.1}%",
                field.label(),
                format_amount(category.total),
                category.share
            );
        }
    }

    println!();
    for claimant in &summary.per_claimant {
        println!(
            "  {:<20} NT$ {:>10}  {:>5.1}%",
            claimant.name.as_deref().unwrap_or(&claimant.file_name),
            format_amount(claimant.total),
            claimant.share
        );
    }
}
