use clap::Parser;
use risc_core::{asm, code};
use std::fs;
use std::path::PathBuf;

/// Translate assembly source into a machine-code file.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Assembly source to translate
    input_asm: PathBuf,
    /// Where the machine code goes
    output_code: PathBuf,
}

fn main() -> Result<(), String> {
    env_logger::init();
    let cli = Cli::parse();

    let source = fs::read_to_string(&cli.input_asm).map_err(|e| e.to_string())?;
    let code = match asm::translate(&source) {
        Ok(code) => code,
        Err(error) => return Err(error.render(&source)),
    };
    code::write_code(&cli.output_code, &code).map_err(|e| e.to_string())?;

    println!(
        "source LoC: {} code instr: {}",
        source.split('\n').count(),
        code.len()
    );
    Ok(())
}
