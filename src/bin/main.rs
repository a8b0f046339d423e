use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use emulator::machine::Machine;
use emulator::program::Program;

/// LS-8 emulator
#[derive(Parser)]
struct Args {
  /// Program image of binary-digit lines, loaded at address 0
  image: PathBuf,
}

fn main() -> ExitCode {
  let args = Args::parse();

  let source = match fs::read_to_string(&args.image) {
    Ok(source) => source,
    Err(err) => {
      eprintln!("{}: {err}", args.image.display());
      return ExitCode::from(2);
    }
  };

  let program = match Program::parse(&source) {
    Ok(program) => program,
    Err(err) => {
      eprintln!("{}: {err}", args.image.display());
      return ExitCode::FAILURE;
    }
  };

  let mut machine = Machine::new();
  if let Err(err) = machine.load(program.bytes()) {
    eprintln!("{}: {err}", args.image.display());
    return ExitCode::FAILURE;
  }

  let stdout = io::stdout();
  if let Err(err) = machine.run(&mut stdout.lock()) {
    eprintln!("error: {err}");
    return ExitCode::FAILURE;
  }

  ExitCode::SUCCESS
}
