use std::{
    io::{stdin, stdout, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;
use interpreter::{InterpretError, Interpreter};

#[derive(clap::Parser)]
struct Args {
    /// Script to run; an interactive session starts when omitted.
    script: Option<PathBuf>,
}

fn run_file(path: PathBuf) -> anyhow::Result<ExitCode> {
    let source = std::fs::read_to_string(path)?;
    let mut interpreter = Interpreter::new();
    match interpreter.run_source(&source, &mut stdout()) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e @ InterpretError::CompileError(_)) => {
            eprintln!("{}", e);
            Ok(ExitCode::from(65))
        }
        Err(e @ InterpretError::RuntimeError(_)) => {
            eprintln!("{}", e);
            Ok(ExitCode::from(70))
        }
        Err(InterpretError::Io(e)) => Err(e.into()),
    }
}

fn run_prompt() -> anyhow::Result<ExitCode> {
    let mut interpreter = Interpreter::new();
    loop {
        print!("> ");
        stdout().flush()?;

        let mut line = String::new();
        if stdin().read_line(&mut line)? == 0 {
            return Ok(ExitCode::SUCCESS);
        }

        // Anything defined on this line can stay reachable from the globals
        // for the rest of the session, so the line has to outlive the loop
        let line: &'static str = Box::leak(line.into_boxed_str());

        if let Err(e) = interpreter.run_source(line, &mut stdout()) {
            println!("{}", e);
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();
    let args = Args::parse();

    match args.script {
        Some(script) => run_file(script),
        None => run_prompt(),
    }
}
