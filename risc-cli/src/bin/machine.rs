use clap::Parser;
use risc_core::{code, input, machine};
use std::fs;
use std::path::PathBuf;

/// Execute a machine-code file against an input schedule.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Machine code produced by the translator
    code_file: PathBuf,
    /// Input schedule: a list of (tick, character) pairs, or empty
    input_file: PathBuf,
}

fn main() -> Result<(), String> {
    env_logger::init();
    let cli = Cli::parse();

    let code = code::read_code(&cli.code_file).map_err(|e| e.to_string())?;
    let text = fs::read_to_string(&cli.input_file).map_err(|e| e.to_string())?;
    let input_tokens = if text.trim().is_empty() {
        Vec::new()
    } else {
        input::parse_schedule(text.trim()).map_err(|e| e.to_string())?
    };

    let summary = machine::simulate(&code, input_tokens).map_err(|e| e.to_string())?;

    println!("{}\n", summary.output);
    println!(
        "instr_counter: {} ticks: {}",
        summary.instruction_counter, summary.tick_counter
    );
    Ok(())
}
