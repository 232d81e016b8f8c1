//! Rewards Engine CLI
//!
//! Applies a CSV batch of rewards operations and outputs final account
//! states.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- operations.csv > accounts.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use rewards_engine::{BatchRunner, Result, RewardsError};
use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(RewardsError::MissingArgument);
    }

    let input_path = &args[1];
    let file = File::open(input_path)?;
    let reader = BufReader::new(file);

    let mut runner = BatchRunner::new();
    runner.process_csv(reader)?;

    let stdout = io::stdout();
    let handle = stdout.lock();
    runner.write_output(handle)?;

    Ok(())
}
