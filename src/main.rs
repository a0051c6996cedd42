//! cmini compiler CLI
//!
//! The `cminic` command compiles C-subset programs to IR and runs them.

use clap::{Parser, Subcommand};
use cmini::diagnostics::Diagnostics;
use cmini::io::{StdinInput, StdoutOutput};
use cmini::ir::{print_program, IrProgram};
use cmini::session::{CompileError, Session};
use cmini::vm::{Execution, Vm, VmConfig, VmState};
use cmini::{lexer, parser, token, RunError};
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cminic")]
#[command(version = cmini::VERSION)]
#[command(about = "Compiler and VM for a small C subset", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Execution options shared by the commands that run code
#[derive(clap::Args, Clone)]
struct RunArgs {
    /// Stop on division by zero instead of storing 0
    #[arg(long)]
    strict: bool,

    /// Stop after this many executed instructions
    #[arg(long, value_name = "N", env = "CMINI_MAX_STEPS")]
    max_steps: Option<u64>,
}

impl RunArgs {
    fn config(&self) -> VmConfig {
        VmConfig {
            strict_arithmetic: self.strict,
            step_limit: self.max_steps,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compile and run a source file
    Run {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Compile a source file to IR
    Build {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Write the IR as JSON to this file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Emit tokens (for debugging)
        #[arg(long)]
        emit_tokens: bool,

        /// Emit AST (for debugging)
        #[arg(long)]
        emit_ast: bool,

        /// Emit IR listing
        #[arg(long)]
        emit_ir: bool,
    },

    /// Tokenize a file and print tokens
    Tokenize {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Parse a file and print AST
    Parse {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Run IR previously written by `build -o`
    Exec {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Compile and run one line at a time
    Repl {
        #[command(flatten)]
        run: RunArgs,
    },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_source(path: &Path) -> miette::Result<String> {
    fs::read_to_string(path).map_err(|e| miette::miette!("Failed to read {}: {}", path.display(), e))
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics.iter() {
        eprintln!("{}", diagnostic);
    }
}

/// Compile, printing diagnostics; a syntax error becomes the command's error
fn compile(session: &mut Session, source: &str) -> miette::Result<cmini::Compilation> {
    match session.compile(source) {
        Ok(compilation) => {
            print_diagnostics(session.diagnostics());
            Ok(compilation)
        }
        Err(CompileError::Syntax { error, partial }) => {
            print_diagnostics(session.diagnostics());
            debug!(statements = partial.stmts.len(), "statements parsed before the error");
            Err(miette::miette!("Syntax error: {}", error))
        }
    }
}

/// Compile and run in one go, printing every diagnostic
fn run_program(source: &str, config: VmConfig) -> miette::Result<Execution> {
    match cmini::run_source(source, config, &mut StdoutOutput, &mut StdinInput) {
        Ok(report) => {
            print_diagnostics(&report.diagnostics);
            if let VmState::Faulted(fault) = &report.execution.state {
                return Err(miette::miette!("Execution stopped: {}", fault));
            }
            Ok(report.execution)
        }
        Err(RunError::Compile { error, diagnostics }) => {
            print_diagnostics(&diagnostics);
            Err(miette::miette!("Compilation failed: {}", error))
        }
        Err(RunError::Load(e)) => Err(miette::miette!("Failed to load program: {}", e)),
    }
}

fn execute(program: IrProgram, config: VmConfig) -> miette::Result<Execution> {
    let mut vm = Vm::load(program, config).map_err(|e| miette::miette!("Failed to load program: {}", e))?;
    let mut diagnostics = Diagnostics::new();
    let execution = vm.run(&mut StdoutOutput, &mut StdinInput, &mut diagnostics);
    print_diagnostics(&diagnostics);

    match &execution.state {
        VmState::Faulted(fault) => Err(miette::miette!("Execution stopped: {}", fault)),
        _ => Ok(execution),
    }
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Run { input, run } => {
            let source = read_source(&input)?;
            let execution = run_program(&source, run.config())?;
            info!(steps = execution.steps, "program finished");
            Ok(())
        }

        Commands::Build {
            input,
            output,
            emit_tokens,
            emit_ast,
            emit_ir,
        } => {
            let source = read_source(&input)?;

            if emit_tokens {
                println!("=== Tokens ===");
                let (tokens, _) = lexer::lex(&source);
                for token in &tokens {
                    println!("{:>4}  {:?}", token.line(), token.kind);
                }
            }

            let mut session = Session::new();
            let compilation = compile(&mut session, &source)?;

            if emit_ast {
                println!("=== AST ===");
                println!("{:#?}", compilation.ast);
                println!("=== Symbols ===");
                for (name, ty) in session.symbols.iter() {
                    println!("  {} : {}", name, ty);
                }
            }

            if emit_ir {
                println!("=== IR ===");
                print!("{}", print_program(&compilation.ir));
            }

            if let Some(path) = output {
                let json = compilation
                    .ir
                    .to_json()
                    .map_err(|e| miette::miette!("Failed to serialize IR: {}", e))?;
                fs::write(&path, json)
                    .map_err(|e| miette::miette!("Failed to write {}: {}", path.display(), e))?;
                println!("Wrote {} instructions to {}", compilation.ir.len(), path.display());
            }

            if session.diagnostics().has_errors() {
                return Err(miette::miette!(
                    "Found {} error(s)",
                    session.diagnostics().iter().filter(|d| d.severity == cmini::Severity::Error).count()
                ));
            }
            Ok(())
        }

        Commands::Tokenize { input } => {
            let source = read_source(&input)?;
            let (tokens, errors) = lexer::lex(&source);

            for token in &tokens {
                println!(
                    "{:<20} {:20} {:?}",
                    token.span.to_string(),
                    token.kind.describe(),
                    token.text(&source)
                );
            }
            println!("\n{}", token::render(&tokens));

            if !errors.is_empty() {
                eprintln!("\nLexer errors:");
                for err in errors {
                    eprintln!("  {}", err);
                }
            }
            Ok(())
        }

        Commands::Parse { input } => {
            let source = read_source(&input)?;
            let mut session = Session::new();
            let (ast, error) = parser::parse(&source, &mut session);

            println!("{:#?}", ast);
            print_diagnostics(session.diagnostics());

            match error {
                Some(error) => Err(miette::miette!("Syntax error: {}", error)),
                None => Ok(()),
            }
        }

        Commands::Exec { input, run } => {
            let json = read_source(&input)?;
            let program =
                IrProgram::from_json(&json).map_err(|e| miette::miette!("Invalid IR file: {}", e))?;
            execute(program, run.config())?;
            Ok(())
        }

        Commands::Repl { run } => {
            println!("cmini REPL v{}", cmini::VERSION);
            println!("Each line is its own program. Type 'exit' to quit.\n");

            let stdin = std::io::stdin();
            let mut line = String::new();

            loop {
                print!("> ");
                let _ = std::io::stdout().flush();

                line.clear();
                match stdin.lock().read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }

                let input = line.trim();
                if input == "exit" || input == "quit" {
                    break;
                }
                if input.is_empty() {
                    continue;
                }

                if let Err(e) = run_program(input, run.config()) {
                    eprintln!("{}", e);
                }
                println!();
            }

            println!("Goodbye!");
            Ok(())
        }
    }
}
