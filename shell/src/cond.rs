//! `if` / `then` / `else` / `fi` blocks.
//!
//! A block is read completely before anything runs. The condition always goes to
//! the executor, even when it names a builtin; the selected branch runs line by
//! line through the full command path and keeps going after a failing line.

use std::{error, fmt, mem};

use log::debug;

use crate::global::State;
use crate::repl::{Input, LineSource};
use crate::types::ExitStatus;

pub const CONTINUATION_PROMPT: &str = "> ";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Block {
	pub condition: String,
	pub then_lines: Vec<String>,
	pub else_lines: Vec<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum BlockError {
	MissingCondition,
	BodyOutsideBranch(String),
	UnexpectedKeyword(&'static str),
	UnexpectedEof,
	Interrupted,
}

impl fmt::Display for BlockError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			BlockError::MissingCondition => f.write_str("if: missing condition command"),
			BlockError::BodyOutsideBranch(ref line) => write!(f, "if: '{}' outside of then/else", line),
			BlockError::UnexpectedKeyword(word) => write!(f, "if: unexpected '{}'", word),
			BlockError::UnexpectedEof => f.write_str("if: end of input before 'fi'"),
			BlockError::Interrupted => f.write_str("if: block discarded"),
		}
	}
}

impl error::Error for BlockError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase { AwaitBranch, Then, Else }

pub struct BlockReader {
	block: Block,
	phase: Phase,
}

/// The condition command if `line` opens a block.
fn condition_of(line: &str) -> Option<&str> {
	let line = line.trim_start();
	let rest = line.strip_prefix("if")?;
	if rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace()) {
		Some(rest.trim())
	} else {
		None
	}
}

pub fn opens_block(line: &str) -> bool {
	condition_of(line).is_some()
}

impl BlockReader {
	pub fn start(line: &str) -> Result<BlockReader, BlockError> {
		match condition_of(line) {
			Some(cond) if !cond.is_empty() => Ok(BlockReader {
				block: Block { condition: cond.to_owned(), ..Block::default() },
				phase: Phase::AwaitBranch,
			}),
			_ => Err(BlockError::MissingCondition),
		}
	}

	/// Consumes one line; yields the block once `fi` closes it.
	pub fn feed(&mut self, line: &str) -> Result<Option<Block>, BlockError> {
		let line = line.trim();
		match (line, self.phase) {
			("", _) => {},
			("fi", _) => return Ok(Some(mem::take(&mut self.block))),
			("then", Phase::AwaitBranch) => self.phase = Phase::Then,
			("then", _) => return Err(BlockError::UnexpectedKeyword("then")),
			("else", Phase::Else) => return Err(BlockError::UnexpectedKeyword("else")),
			("else", _) => self.phase = Phase::Else,
			(_, Phase::AwaitBranch) => return Err(BlockError::BodyOutsideBranch(line.to_owned())),
			(_, Phase::Then) => self.block.then_lines.push(line.to_owned()),
			(_, Phase::Else) => self.block.else_lines.push(line.to_owned()),
		}
		Ok(None)
	}
}

/// Skips the rest of a rejected block, up to and including its `fi`.
fn drain(source: &mut dyn LineSource) {
	while let Input::Line(line) = source.read_line(CONTINUATION_PROMPT) {
		if line.trim() == "fi" {
			break;
		}
	}
}

/// Reads the rest of the block opened by `first` from `source`.
///
/// A malformed block is consumed through its `fi` so none of its lines run on their own.
pub fn read_block(first: &str, source: &mut dyn LineSource) -> Result<Block, BlockError> {
	let mut reader = match BlockReader::start(first) {
		Ok(reader) => reader,
		Err(e) => {
			drain(source);
			return Err(e);
		},
	};
	loop {
		match source.read_line(CONTINUATION_PROMPT) {
			Input::Line(line) => match reader.feed(&line) {
				Ok(Some(block)) => return Ok(block),
				Ok(None) => {},
				Err(e) => {
					debug!("discarding block: {}", e);
					drain(source);
					return Err(e);
				},
			},
			Input::Interrupted => return Err(BlockError::Interrupted),
			Input::Eof => return Err(BlockError::UnexpectedEof),
		}
	}
}

/// Runs the condition, then exactly one branch; returns the last status observed.
pub fn run_block(state: &mut State, block: &Block) -> ExitStatus {
	let status = state.run_external(&block.condition);
	debug!("condition '{}': {}", block.condition, status);
	let branch = if status.success() { &block.then_lines } else { &block.else_lines };
	for line in branch {
		state.run_line(line);
		if state.should_exit {
			break;
		}
	}
	state.last_status()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::repl::Script;

	fn read(lines: &[&str]) -> Result<Block, BlockError> {
		let mut reader = BlockReader::start(lines[0])?;
		for line in &lines[1 ..] {
			if let Some(block) = reader.feed(line)? {
				return Ok(block);
			}
		}
		Err(BlockError::UnexpectedEof)
	}

	#[test]
	fn well_formed_block() {
		let block = read(&["if test -f x", "then", "echo a", "echo b", "else", "echo c", "fi"]).unwrap();
		assert_eq!(block.condition, "test -f x");
		assert_eq!(block.then_lines, ["echo a", "echo b"]);
		assert_eq!(block.else_lines, ["echo c"]);
	}

	#[test]
	fn else_may_follow_condition_directly() {
		let block = read(&["if false", "else", "echo c", "fi"]).unwrap();
		assert!(block.then_lines.is_empty());
		assert_eq!(block.else_lines, ["echo c"]);
		assert_eq!(read(&["if true", "fi"]).unwrap().condition, "true");
	}

	#[test]
	fn malformed_blocks() {
		assert_eq!(read(&["if"]), Err(BlockError::MissingCondition));
		assert_eq!(read(&["if true", "echo x"]), Err(BlockError::BodyOutsideBranch("echo x".to_owned())));
		assert_eq!(read(&["if true", "then", "then"]), Err(BlockError::UnexpectedKeyword("then")));
		assert_eq!(read(&["if true", "else", "else"]), Err(BlockError::UnexpectedKeyword("else")));
		assert_eq!(read(&["if true", "else", "then"]), Err(BlockError::UnexpectedKeyword("then")));
		assert_eq!(read(&["if true", "then", "echo"]), Err(BlockError::UnexpectedEof));
	}

	#[test]
	fn opens_block_needs_if_word() {
		assert!(opens_block("if true"));
		assert!(opens_block("  if"));
		assert!(!opens_block("ifconfig"));
		assert!(!opens_block("echo if"));
	}

	#[test]
	fn rejected_block_is_consumed_through_fi() {
		let mut script = Script::new(vec!["echo x", "then", "y=1", "fi", "z=2"]);
		assert_eq!(read_block("if true", &mut script), Err(BlockError::BodyOutsideBranch("echo x".to_owned())));
		assert!(matches!(script.read_line(CONTINUATION_PROMPT), Input::Line(ref l) if l == "z=2"));

		let mut script = Script::new(vec!["then", "fi", "after"]);
		assert_eq!(read_block("if", &mut script), Err(BlockError::MissingCondition));
		assert!(matches!(script.read_line(CONTINUATION_PROMPT), Input::Line(ref l) if l == "after"));
	}
}
