use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rlox::ast::Ast;
use rlox::ast_printer::AstPrinter;
use rlox::error::LoxError;
use rlox::lox::{Lox, RunOutcome};
use rlox::parser::Parser;
use rlox::scanner::Scanner;
use rlox::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    /// Without a subcommand the interpreter starts an interactive prompt.
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable logging to rlox.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize { filename: PathBuf },

    /// Parses input from a file and prints each statement's AST
    Parse { filename: PathBuf },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },
}

/// Reads the contents of a file into a String
fn read_file(filename: &PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();

    let bytes = reader
        .read_to_string(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("rlox.log").context("Failed to create rlox.log")?;

    // Write to file with the module path and source line of each record
    Builder::new()
        .format(|buf, record| {
            // Strip 'rlox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rlox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .init();

    info!("Logger initialized, writing to rlox.log");
    Ok(())
}

/// Print every diagnostic from one run and map it to the process exit code:
/// 65 for compile-stage errors, 70 for a runtime error, 0 otherwise.
fn report(outcome: &RunOutcome) -> i32 {
    for e in &outcome.compile_errors {
        eprintln!("{}", e);
    }

    if let Some(e) = &outcome.runtime_error {
        eprintln!("{}", e);
        return 70;
    }

    if outcome.compile_errors.is_empty() {
        0
    } else {
        65
    }
}

fn tokenize(filename: &PathBuf) -> Result<i32> {
    info!("Running Tokenize subcommand");
    let source = read_file(filename)?;
    let mut clean = true;

    for result in Scanner::new(source.as_bytes()) {
        match result {
            Ok(token) => {
                debug!("Scanned token: {}", token);

                println!("{}", token);
            }

            Err(e) => {
                clean = false;

                debug!("Tokenization error: {}", e);

                eprintln!("{}", e);
            }
        }
    }

    Ok(if clean { 0 } else { 65 })
}

fn parse(filename: &PathBuf) -> Result<i32> {
    info!("Running Parse subcommand");
    let source = read_file(filename)?;

    let mut errors: Vec<LoxError> = Vec::new();
    let mut tokens: Vec<Token> = Vec::new();

    for result in Scanner::new(source.as_bytes()) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    let mut ast = Ast::new();
    let (statements, parse_errors) = Parser::new(&tokens, &mut ast).parse();
    errors.extend(parse_errors);

    for e in &errors {
        eprintln!("{}", e);
    }

    if !errors.is_empty() {
        return Ok(65);
    }

    for stmt in statements {
        println!("{}", AstPrinter::print_stmt(&ast, stmt));
    }

    Ok(0)
}

fn run(filename: &PathBuf) -> Result<i32> {
    info!("Running Run subcommand");
    let source = read_file(filename)?;

    let mut lox = Lox::new();
    let outcome = lox.run(&source);

    Ok(report(&outcome))
}

/// Interactive prompt: one pipeline run per line, session state carried
/// across lines.  Errors are reported but never end the session.
fn repl() -> Result<i32> {
    info!("Starting REPL session");

    let mut lox = Lox::new();
    lox.set_repl_session();

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }

        let line = line.trim_end();
        if line == "exit" {
            break;
        }

        if line.is_empty() {
            continue;
        }

        let outcome = lox.run(line);
        report(&outcome);
    }

    info!("REPL session ended");
    Ok(0)
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let code = match args.commands {
        Some(Commands::Tokenize { filename }) => tokenize(&filename)?,
        Some(Commands::Parse { filename }) => parse(&filename)?,
        Some(Commands::Run { filename }) => run(&filename)?,
        None => repl()?,
    };

    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
