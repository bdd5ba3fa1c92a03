use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use minipy::checker::check_definitions;
use minipy::console::StdConsole;
use minipy::interpreter::{DEFAULT_MAX_CALL_DEPTH, EvalConfig, Interpreter};
use minipy::{compile, lexer};

/// Host stack reserved for each allowed user call, on top of a fixed base.
const STACK_PER_CALL: usize = 64 * 1024;
const BASE_STACK: usize = 1024 * 1024;

/// Runs programs written in a small Python-like scripting language.
#[derive(Parser, Debug)]
#[command(name = "minipy", version)]
struct Args {
    /// Only run the duplicate-definition check and print its findings
    #[arg(long)]
    check: bool,

    /// Print the token stream and exit
    #[arg(long, conflicts_with_all = ["check", "dump_ast"])]
    dump_tokens: bool,

    /// Print the parsed syntax tree and exit
    #[arg(long, conflicts_with = "check")]
    dump_ast: bool,

    /// Maximum nesting of user function calls
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,

    /// Log calls and registrations (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,

    /// Program to run (if not provided, reads from stdin)
    path: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .context("Building log filter")?;
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let source = match &args.path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Reading stdin")?;
            buffer
        }
    };

    if args.dump_tokens {
        for token in lexer::tokenize(&source)? {
            println!(
                "{}:{} {} {:?}",
                token.span.line, token.span.column, token.kind, token.lexeme
            );
        }
        return Ok(());
    }

    let program = compile(&source)?;

    if args.dump_ast {
        println!("{program:#?}");
        return Ok(());
    }

    let findings = check_definitions(&program);
    if args.check {
        for finding in &findings {
            println!("{finding}");
        }
        return Ok(());
    }
    for finding in &findings {
        warn!("{finding}");
    }

    let max_call_depth = args.max_call_depth;
    let stack_size = max_call_depth
        .saturating_mul(STACK_PER_CALL)
        .saturating_add(BASE_STACK);
    let evaluator = thread::Builder::new()
        .name("evaluator".to_string())
        .stack_size(stack_size)
        .spawn(move || -> Result<()> {
            let interpreter = Interpreter::with_config(EvalConfig { max_call_depth });
            let mut output = StdConsole;
            let mut input = StdConsole;
            interpreter
                .prepare(&program)
                .run(&mut output, &mut input)
                .context("Evaluation failed")?;
            Ok(())
        })
        .with_context(|| format!("Starting evaluator with a {stack_size} byte stack"))?;
    evaluator
        .join()
        .map_err(|_| anyhow!("Evaluator thread panicked"))?
}
