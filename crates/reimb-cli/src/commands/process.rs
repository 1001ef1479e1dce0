//! Process command - extract data from a single expense report.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use reimb_core::models::form::{ConfidenceLevel, ExtractedForm, FieldId};
use reimb_core::{write_csv, CancellationToken, ProcessedFile, SourceFile};

use super::{build_processor, load_config};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (JPEG, PNG, GIF, WebP or PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Declared MIME type, checked before the file extension
    #[arg(long)]
    mime: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// OCR language hint
    #[arg(short, long)]
    lang: Option<String>,

    /// Show per-field confidence scores
    #[arg(long)]
    show_confidence: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let file = SourceFile::from_path_with_mime(&args.input, args.mime.as_deref())?;
    info!("Processing file: {}", args.input.display());

    let processor = build_processor(&config, args.model_dir.as_deref(), args.lang.as_deref());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}% {msg}")?
            .progress_chars("##-"),
    );
    pb.set_message(file.name.clone());

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let bar = pb.clone();
    let result = tokio::task::spawn_blocking(move || {
        processor.process(&file, |p| bar.set_position(p as u64), &cancel)
    })
    .await?;

    let processed = match result {
        Ok(processed) => {
            pb.finish_with_message("Done");
            processed
        }
        Err(e) => {
            pb.abandon_with_message("Failed");
            return Err(e.into());
        }
    };

    let threshold = config.extraction.low_confidence_threshold;
    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&processed)?,
        OutputFormat::Csv => {
            let mut buf = Vec::new();
            write_csv(std::slice::from_ref(&processed), &mut buf, config.export.include_bom)?;
            String::from_utf8(buf)?
        }
        OutputFormat::Text => format_form_text(&processed, threshold),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    for warning in &processed.warnings {
        eprintln!("{} {}", style("!").yellow(), warning);
    }

    if args.show_confidence {
        println!();
        print_confidence(&processed.data);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Render a form as `label: value` lines, flagging fields below `threshold`.
pub fn format_form_text(processed: &ProcessedFile, threshold: f64) -> String {
    let form = &processed.data;
    let mut output = String::new();

    output.push_str(&format!("File: {}\n\n", processed.file_name));

    for field in FieldId::ALL {
        let value = form
            .value(field)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        let flag = if form.confidence_of(field) < threshold {
            "  (review)"
        } else {
            ""
        };
        output.push_str(&format!("{}: {}{}\n", field.label(), value, flag));
    }

    output
}

fn print_confidence(form: &ExtractedForm) {
    for field in FieldId::ALL {
        let score = form.confidence_of(field);
        let percent = format!("{:>3.0}%", score * 100.0);
        let styled = match form.confidence_level(field) {
            ConfidenceLevel::High => style(percent).green(),
            ConfidenceLevel::Medium => style(percent).yellow(),
            ConfidenceLevel::Low => style(percent).red(),
        };
        println!("{} {:<14} {}", style("ℹ").blue(), field.key(), styled);
    }
}
