use std::collections::VecDeque;

use log::{debug, warn};
use rustyline::completion::FilenameCompleter;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Completer, Editor, Helper, Highlighter, Hinter, Validator};

use crate::cond;
use crate::global::State;
use crate::types::ExitStatus;

pub const PROMPT: &str = "FCIT> ";

pub enum Input {
	Line(String),
	Interrupted,
	Eof,
}

/// Where the loop gets its lines from.
pub trait LineSource {
	fn read_line(&mut self, prompt: &str) -> Input;

	/// Offers an accepted line to the source's own recall buffer.
	fn remember(&mut self, _line: &str) {}
}

#[derive(Helper, Completer, Hinter, Highlighter, Validator)]
struct LineHelper {
	#[rustyline(Completer)]
	completer: FilenameCompleter,
}

/// Interactive terminal input with filename completion.
pub struct Terminal {
	editor: Editor<LineHelper, DefaultHistory>,
}

impl Terminal {
	pub fn new() -> rustyline::Result<Terminal> {
		let mut editor = Editor::new()?;
		editor.set_helper(Some(LineHelper { completer: FilenameCompleter::new() }));
		Ok(Terminal { editor: editor })
	}
}

impl LineSource for Terminal {
	fn read_line(&mut self, prompt: &str) -> Input {
		match self.editor.readline(prompt) {
			Ok(line) => Input::Line(line),
			Err(ReadlineError::Interrupted) => Input::Interrupted,
			Err(ReadlineError::Eof) => Input::Eof,
			Err(err) => {
				warn!("readline failed: {}", err);
				eprintln!("Error: {}", err);
				Input::Eof
			},
		}
	}

	fn remember(&mut self, line: &str) {
		let _ = self.editor.add_history_entry(line);
	}
}

/// A fixed list of lines, used for scripted sessions.
#[derive(Debug, Default)]
pub struct Script {
	lines: VecDeque<String>,
}

impl Script {
	pub fn new<I, S>(lines: I) -> Script where I: IntoIterator<Item = S>, S: Into<String> {
		Script { lines: lines.into_iter().map(Into::into).collect() }
	}
}

impl LineSource for Script {
	fn read_line(&mut self, _prompt: &str) -> Input {
		match self.lines.pop_front() {
			Some(line) => Input::Line(line),
			None => Input::Eof,
		}
	}
}

enum Step { Continue, Stop }

fn process_line(state: &mut State, source: &mut dyn LineSource, raw: &str) -> Step {
	let trimmed = raw.trim();
	if trimmed.is_empty() {
		return Step::Continue;
	}
	let line = match state.history.recall(trimmed) {
		Ok(Some(recalled)) => {
			println!("{}", recalled);
			recalled.to_owned()
		},
		Ok(None) => trimmed.to_owned(),
		Err(e) => {
			eprintln!("{}", e);
			return Step::Continue;
		},
	};
	state.history.push(&line);
	source.remember(&line);

	if !cond::opens_block(&line) {
		state.run_line(&line);
		return Step::Continue;
	}
	match cond::read_block(&line, source) {
		Ok(block) => {
			cond::run_block(state, &block);
			Step::Continue
		},
		Err(e) => {
			eprintln!("{}", e);
			state.executor.set_last_status(ExitStatus::FAILURE);
			match e {
				cond::BlockError::UnexpectedEof => Step::Stop,
				_ => Step::Continue,
			}
		},
	}
}

/// Reads and runs lines until `exit` or end of input.
pub fn run(state: &mut State, source: &mut dyn LineSource) {
	while !state.should_exit {
		state.executor.jobs_mut().reap_completed();
		let step = match source.read_line(PROMPT) {
			Input::Line(line) => process_line(state, source, &line),
			Input::Interrupted => Step::Continue,
			Input::Eof => Step::Stop,
		};
		if let Step::Stop = step {
			println!("\nShell exited.");
			break;
		}
	}
	debug!("leaving loop");
}
