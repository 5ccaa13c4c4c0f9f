//! Repayment Waterfall CLI
//!
//! Reads the repayments and batches sheets from one workbook (or one CSV per
//! sheet), runs the allocation and prints the result document as JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- loans.xlsx > result.json
//! cargo run -- repayments.csv batches.csv > result.json
//! cargo run -- --route-unreferenced loans.xlsx
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `info` to trace allocation decisions

use repayment_waterfall::{ingest, report, CliArgs, Result, WaterfallEngine};
use std::env;
use std::io;
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse(env::args().skip(1))?;
    let (repayments, batches) = ingest::load(&args.input)?;

    let engine = WaterfallEngine::new(args.options);
    let result = engine.allocate(&repayments, batches);

    let stdout = io::stdout();
    let handle = stdout.lock();
    report::write_json(&result, handle)?;

    Ok(())
}
