//! Parse command - run field extraction on already-recognized text.

use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use tracing::debug;

use reimb_core::{ExpenseFormParser, FormParser};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Text file to parse; reads stdin when omitted or `-`
    input: Option<PathBuf>,

    /// Print only the form, without warnings and timing
    #[arg(long)]
    form_only: bool,
}

pub async fn run(args: ParseArgs) -> anyhow::Result<()> {
    let text = match &args.input {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)?,
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    debug!("Parsing {} characters", text.chars().count());
    let result = ExpenseFormParser::new().parse(&text);

    let output = if args.form_only {
        serde_json::to_string_pretty(&result.form)?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    println!("{}", output);

    Ok(())
}
