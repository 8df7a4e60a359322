//! The interactive shell and one-shot runner.

use clap::Parser;
use csvdb_core::{Outcome, Session};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "csvdb", version, about = "A SQL shell over CSV files")]
struct Cli {
	/// Directory holding the persisted catalog; in-memory if omitted
	#[arg(long, env = "CSVDB_DIR")]
	dir: Option<PathBuf>,

	/// Execute one statement and exit
	#[arg(short, long)]
	execute: Option<String>,
}

fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
		.with_writer(std::io::stderr)
		.init();
	let cli = Cli::parse();
	let session = match &cli.dir {
		Some(dir) => Session::open(dir),
		None => Ok(Session::memory()),
	};
	let mut session = match session {
		Ok(session) => session,
		Err(err) => {
			error!("{err}");
			return ExitCode::FAILURE;
		}
	};
	match cli.execute {
		Some(statement) => run_one(&mut session, &statement),
		None => repl(&mut session),
	}
}

fn run_one(session: &mut Session, statement: &str) -> ExitCode {
	let mut stdout = std::io::stdout().lock();
	match session.execute(statement, &mut stdout) {
		Ok(_) => ExitCode::SUCCESS,
		Err(err) => {
			error!("{err}");
			ExitCode::FAILURE
		}
	}
}

fn repl(session: &mut Session) -> ExitCode {
	let mut editor = match DefaultEditor::new() {
		Ok(editor) => editor,
		Err(err) => {
			error!("cannot initialize the line editor: {err}");
			return ExitCode::FAILURE;
		}
	};
	let history = dirs_history();
	if let Some(history) = &history {
		let _ = editor.load_history(history);
	}
	let mut buffer = String::new();
	loop {
		let prompt = if buffer.is_empty() { "csvdb> " } else { "    -> " };
		match editor.readline(prompt) {
			Ok(line) => {
				let trimmed = line.trim();
				if buffer.is_empty()
					&& (trimmed.eq_ignore_ascii_case("quit")
						|| trimmed.eq_ignore_ascii_case("exit"))
				{
					break;
				}
				if trimmed.is_empty() {
					continue;
				}
				buffer.push_str(&line);
				buffer.push('\n');
				// statements end with a semicolon
				if !trimmed.ends_with(';') {
					continue;
				}
				let statement = std::mem::take(&mut buffer);
				let _ = editor.add_history_entry(statement.trim());
				let mut stdout = std::io::stdout().lock();
				match session.execute(&statement, &mut stdout) {
					Ok(Outcome::Rows(rows)) => {
						let _ = writeln!(stdout, "[{rows} rows]");
					}
					Ok(Outcome::Done) => {
						let _ = writeln!(stdout, "[ok]");
					}
					Err(err) => {
						let _ = writeln!(std::io::stderr(), "error: {err}");
					}
				}
			}
			Err(ReadlineError::Interrupted) => {
				buffer.clear();
			}
			Err(ReadlineError::Eof) => break,
			Err(err) => {
				error!("{err}");
				return ExitCode::FAILURE;
			}
		}
	}
	if let Some(history) = &history {
		let _ = editor.save_history(history);
	}
	ExitCode::SUCCESS
}

fn dirs_history() -> Option<PathBuf> {
	std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".csvdb_history"))
}
