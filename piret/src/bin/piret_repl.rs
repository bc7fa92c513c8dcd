// Piret REPL
// Evaluates an expression, a file, or an interactive session

use clap::Parser;
use piret::{NamespaceRegistry, PiretConfig, PiretError, Session};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "piret-repl")]
#[command(about = "Piret interactive REPL and script runner")]
struct Args {
    /// Evaluate this source and print each top-level result
    #[arg(short, long)]
    eval: Option<String>,

    /// Evaluate the forms in this file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "piret=debug" } else { "piret=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => match PiretConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => PiretConfig::default(),
    };

    let mut session = match Session::with_registry(NamespaceRegistry::global(), &config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let source = match (&args.eval, &args.file) {
        (Some(src), _) => src.clone(),
        (None, Some(path)) => match std::fs::read_to_string(path) {
            Ok(src) => src,
            Err(e) => {
                eprintln!("failed to read {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        (None, None) => return run_interactive(&mut session),
    };

    match eval_and_print(&mut session, &source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn eval_and_print(session: &mut Session, source: &str) -> Result<(), PiretError> {
    for form in piret::read_all(source)? {
        let value = session.eval_form(&form)?;
        println!("{}", value);
    }
    Ok(())
}

/// Whether `source` has more opening than closing brackets, ignoring strings and comments.
#[cfg(feature = "repl")]
fn is_incomplete(source: &str) -> bool {
    let mut depth = 0i64;
    let mut chars = source.chars();
    let mut in_string = false;
    while let Some(c) = chars.next() {
        match (in_string, c) {
            (true, '\\') => {
                chars.next();
            }
            (true, '"') => in_string = false,
            (true, _) => {}
            (false, '"') => in_string = true,
            (false, ';') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            (false, '(' | '[') => depth += 1,
            (false, ')' | ']') => depth -= 1,
            (false, _) => {}
        }
    }
    in_string || depth > 0
}

#[cfg(feature = "repl")]
fn run_interactive(session: &mut Session) -> ExitCode {
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("failed to create line editor: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut buffer = String::new();
    loop {
        let prompt = if buffer.is_empty() {
            format!("{}> ", session.namespace().name())
        } else {
            "  ".to_string()
        };
        match rl.readline(&prompt) {
            Ok(line) => {
                buffer.push_str(&line);
                buffer.push('\n');
                if is_incomplete(&buffer) {
                    continue;
                }
                let source = std::mem::take(&mut buffer);
                if source.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(source.trim());
                if let Err(e) = eval_and_print(session, &source) {
                    eprintln!("error: {}", e);
                }
            }
            Err(ReadlineError::Interrupted) => buffer.clear(),
            Err(ReadlineError::Eof) => return ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }
}

#[cfg(not(feature = "repl"))]
fn run_interactive(session: &mut Session) -> ExitCode {
    // Without line editing, evaluate standard input as one script
    let mut source = String::new();
    if let Err(e) = std::io::Read::read_to_string(&mut std::io::stdin(), &mut source) {
        eprintln!("failed to read stdin: {}", e);
        return ExitCode::FAILURE;
    }
    match eval_and_print(session, &source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
