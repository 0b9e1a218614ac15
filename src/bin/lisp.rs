use anyhow::Result;
use clap::Parser;
use lisp_rs::core::error::LispError;
use lisp_rs::printer;
use lisp_rs::reader::Reader;
use lisp_rs::vm::engine::Interp;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lisp")]
#[command(about = "A Lisp interpreter in Rust", long_about = None)]
struct Cli {
    /// Evaluate a file; "-" reads from standard input
    #[arg(short = 'f', value_name = "FILE")]
    file: Option<String>,

    /// Force an interactive session
    #[arg(short = 'i', long)]
    interactive: bool,

    /// Enable diagnostic output
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut interp = Interp::new();

    if let Some(path) = cli.file.as_deref() {
        if let Err(err) = interp.eval_path(path) {
            report_uncaught(&mut interp, &err);
            interp.reset_after_error();
            if !cli.interactive {
                std::process::exit(2);
            }
        }
        if cli.interactive {
            run_repl(&mut interp)?;
        }
    } else {
        run_repl(&mut interp)?;
    }
    Ok(())
}

/// Print the buffered error string and a stack trace, outermost callable
/// first.
fn report_uncaught(interp: &mut Interp, err: &LispError) {
    interp.last_error = err.to_string();
    eprintln!("{}", err);
    println!("Stack trace:");
    for entry in interp.stack_trace() {
        println!("  {}", entry);
    }
}

fn run_repl(interp: &mut Interp) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;
                eval_line(interp, line);
                interp.collect_garbage();
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }
    Ok(())
}

/// Evaluate every form on the line, printing each result. On a raise,
/// recover to the single global frame and keep reading.
fn eval_line(interp: &mut Interp, line: &str) {
    let mut reader = Reader::new(line);
    loop {
        let form = match reader.read(interp) {
            Ok(Some(form)) => form,
            Ok(None) => break,
            Err(err) => {
                report_uncaught(interp, &err);
                interp.reset_after_error();
                break;
            }
        };
        match interp.eval(form) {
            Ok(val) => println!("{}", printer::render(interp, val)),
            Err(err) => {
                report_uncaught(interp, &err);
                interp.reset_after_error();
                break;
            }
        }
    }
}
