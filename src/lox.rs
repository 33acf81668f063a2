//! The top‑level pipeline facade: scan → parse → resolve → interpret.
//!
//! A [`Lox`] instance owns the AST arena and the interpreter, and both
//! persist across `run` calls.  That is deliberate: in a REPL session a
//! closure defined on one line holds a `StmtId` into the arena and an
//! environment chain in the interpreter, and both must stay valid when a
//! later line calls it.  The arena is append‑only, so ids never move.

use log::{debug, info};

use crate::ast::Ast;
use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

/// Everything one `run` produced, for the driver to report and map to an
/// exit code.  Compile errors (lex, parse, resolve) and the runtime error
/// travel separately because they carry different exit codes.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub compile_errors: Vec<LoxError>,
    pub runtime_error: Option<LoxError>,
}

impl RunOutcome {
    pub fn is_clean(&self) -> bool {
        self.compile_errors.is_empty() && self.runtime_error.is_none()
    }
}

/// One interpreter session.  Feed it source chunks with [`Lox::run`]; state
/// accumulates across calls.
pub struct Lox {
    ast: Ast,
    interpreter: Interpreter,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    pub fn new() -> Self {
        Lox {
            ast: Ast::new(),
            interpreter: Interpreter::new(),
        }
    }

    /// A session whose `print` output goes to `out` instead of stdout.
    pub fn with_output(out: Box<dyn std::io::Write>) -> Self {
        Lox {
            ast: Ast::new(),
            interpreter: Interpreter::with_output(out),
        }
    }

    /// Switch on REPL echo of top‑level expression and `var` values.
    /// One‑way; a session never switches back to script mode.
    pub fn set_repl_session(&mut self) {
        self.interpreter.set_repl_session();
    }

    /// Run one chunk of source through the full pipeline.
    ///
    /// The stage gates are strict: any lex or parse error suppresses
    /// resolution, and any compile‑stage error suppresses interpretation,
    /// so no partially understood program ever executes.
    pub fn run(&mut self, source: &str) -> RunOutcome {
        let mut outcome = RunOutcome::default();

        info!("Running {} byte(s) of source", source.len());

        // Stage 1: scan the whole chunk, collecting tokens and lex errors.
        let mut tokens: Vec<Token> = Vec::new();

        for result in Scanner::new(source.as_bytes()) {
            match result {
                Ok(token) => tokens.push(token),
                Err(e) => outcome.compile_errors.push(e),
            }
        }

        debug!(
            "Scanned {} token(s), {} lex error(s)",
            tokens.len(),
            outcome.compile_errors.len()
        );

        // Stage 2: parse into the persistent arena.
        let parser = Parser::new(&tokens, &mut self.ast);
        let (statements, parse_errors) = parser.parse();
        outcome.compile_errors.extend(parse_errors);

        if !outcome.compile_errors.is_empty() {
            debug!("Skipping resolution: compile errors present");
            return outcome;
        }

        // Stage 3: resolve bindings and static diagnostics.
        let resolver = Resolver::new(&self.ast, &mut self.interpreter);
        outcome.compile_errors = resolver.resolve(&statements);

        if !outcome.compile_errors.is_empty() {
            debug!("Skipping interpretation: resolve errors present");
            return outcome;
        }

        // Stage 4: execute.
        if let Err(e) = self.interpreter.interpret(&self.ast, &statements) {
            outcome.runtime_error = Some(e);
        }

        outcome
    }
}
