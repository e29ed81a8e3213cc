use clap::Parser;
use color_eyre::Report;
use color_eyre::eyre::eyre;
use std::fs;
use std::io::{self, BufRead as _, Write as _};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tadpole_errors::ReportableError;
use tadpole_heap::GcConfig;
use tadpole_vm::{InterpretError, Vm};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const FRONTEND_ERROR: u8 = 65;
const RUNTIME_ERROR: u8 = 70;

#[derive(Debug, Parser)]
#[clap(name = "tadpole", version)]
pub struct CLArgs {
    #[clap(subcommand)]
    pub routine: CLCommand,
    /// Collect garbage before every instruction.
    #[clap(long, global = true)]
    pub gc_stress: bool,
    /// The fewest live objects that can trigger a collection.
    #[clap(long, global = true)]
    pub gc_baseline: Option<usize>,
}

#[derive(Debug, clap::Subcommand)]
pub enum CLCommand {
    /// Run a script.
    Run { path: PathBuf },
    /// Print the bytecode of a script.
    Disassemble { path: PathBuf },
    /// Print the tokens of a script.
    Tokenize { path: PathBuf },
    /// Read and run lines interactively.
    Repl,
}

impl CLArgs {
    fn gc_config(&self) -> GcConfig {
        let defaults = GcConfig::default();
        GcConfig {
            baseline: self.gc_baseline.unwrap_or(defaults.baseline),
            stress: self.gc_stress,
            ..defaults
        }
    }
}

fn main() -> Result<ExitCode, Report> {
    color_eyre::install()?;
    let args = CLArgs::parse();

    let filter = EnvFilter::builder().from_env()?;
    tracing_subscriber::registry()
        .with(fmt::layer().without_time())
        .with(filter)
        .init();

    let config = args.gc_config();
    match args.routine {
        CLCommand::Run { ref path } => {
            let src = read_source(path)?;
            run(&src, path, config)
        }
        CLCommand::Disassemble { ref path } => {
            let src = read_source(path)?;
            disassemble(&src, path, config)
        }
        CLCommand::Tokenize { ref path } => {
            let src = read_source(path)?;
            tokenize(&src)
        }
        CLCommand::Repl => repl(config),
    }
}

fn read_source(path: &Path) -> Result<String, Report> {
    fs::read_to_string(path).map_err(|err| eyre!("could not read {}: {err}", path.display()))
}

fn report(error: &(impl ReportableError + ?Sized), path: &str, text: &str) -> Result<(), Report> {
    let mut buffer = String::new();
    error.report(&mut buffer, path, text)?;
    eprint!("{buffer}");
    Ok(())
}

fn run(text: &str, path: &Path, config: GcConfig) -> Result<ExitCode, Report> {
    let path = &path.to_string_lossy();
    let mut vm = Vm::with_config(config);
    vm.register_builtins();

    match vm.interpret_source(text) {
        Ok(()) => {
            tracing::debug!("Finished with heap {:?}.", vm.heap().stats());
            Ok(ExitCode::SUCCESS)
        }
        Err(InterpretError::Compile(errors)) => {
            report(errors.as_slice(), path, text)?;
            Ok(ExitCode::from(FRONTEND_ERROR))
        }
        Err(InterpretError::Runtime(error)) => {
            report(&error, path, text)?;
            Ok(ExitCode::from(RUNTIME_ERROR))
        }
    }
}

fn disassemble(text: &str, path: &Path, config: GcConfig) -> Result<ExitCode, Report> {
    let path = &path.to_string_lossy();
    let mut vm = Vm::with_config(config);

    let function = match vm.compile(text) {
        Ok(function) => function,
        Err(errors) => {
            report(errors.as_slice(), path, text)?;
            return Ok(ExitCode::from(FRONTEND_ERROR));
        }
    };

    let mut buffer = String::new();
    let function = vm
        .heap()
        .get(function)
        .map_err(|err| eyre!("compiled script is missing: {err}"))?;
    function.disassemble(&mut buffer, vm.heap())?;
    print!("{buffer}");
    Ok(ExitCode::SUCCESS)
}

fn tokenize(text: &str) -> Result<ExitCode, Report> {
    use tadpole_lexer::Lexer;

    let mut succeeded = true;
    let mut buffer = String::new();
    for token in Lexer::new(text) {
        buffer.clear();
        succeeded &= !token.is_error();
        Lexer::dump_token_cc(&mut buffer, &token)?;
        println!("{buffer}");
    }

    if succeeded {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(FRONTEND_ERROR))
    }
}

fn repl(config: GcConfig) -> Result<ExitCode, Report> {
    let mut vm = Vm::with_config(config);
    vm.register_builtins();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            println!();
            return Ok(ExitCode::SUCCESS);
        };
        let line = line?;

        // Errors are reported and the session carries on with its globals intact.
        match vm.interpret_source(&line) {
            Ok(()) => {}
            Err(InterpretError::Compile(errors)) => report(errors.as_slice(), "<repl>", &line)?,
            Err(InterpretError::Runtime(error)) => report(&error, "<repl>", &line)?,
        }
    }
}
