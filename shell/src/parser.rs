use std::{error, fmt};

use crate::types::*;

pub const PIPE: &str = "|";
pub const BACKGROUND: &str = "&";
pub const REDIRECT_IN: &str = "<";
pub const REDIRECT_OUT: &str = ">";

struct Tokenizer<'a> {
	line: &'a str,
	i: usize,
}

impl<'a> Tokenizer<'a> {
	fn proceed_while<F>(&mut self, f: F) where F: Fn(u8) -> bool {
		while let Some(&c) = self.line.as_bytes().get(self.i) {
			if !f(c) { break; }
			self.i += 1;
		}
	}

	fn is_whitespace(c: u8) -> bool {
		matches!(c, b' ' | b'\t' | b'\n' | b'\r')
	}

	fn is_operator(c: u8) -> bool {
		matches!(c, b'>' | b'<' | b'&' | b'|')
	}

	fn is_letter(c: u8) -> bool {
		!Tokenizer::is_operator(c) && !Tokenizer::is_whitespace(c)
	}

	fn skip_whitespaces(&mut self) {
		self.proceed_while(Tokenizer::is_whitespace);
	}

	fn next_token(&mut self) -> Option<&'a str> {
		self.skip_whitespaces();
		let orig = self.i;
		match self.line.as_bytes().get(self.i) {
			None => None,
			Some(&c) if Tokenizer::is_operator(c) => {
				self.i += 1;
				Some(&self.line[orig .. self.i])
			},
			Some(_) => {
				self.proceed_while(Tokenizer::is_letter);
				Some(&self.line[orig .. self.i])
			},
		}
	}
}

/// Splits a raw line into words and the single-character operators `<`, `>`, `|`, `&`.
///
/// Returns `None` for a blank line.
pub fn tokenize(line: &str) -> Option<Vec<String>> {
	let mut tokenizer = Tokenizer { line: line, i: 0 };
	let mut tokens = vec![];
	while let Some(token) = tokenizer.next_token() {
		tokens.push(token.to_owned());
	}
	if tokens.is_empty() { None } else { Some(tokens) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
	/// Only redirections, no command.
	MissingCommand,
	/// A `|` with nothing on one side of it.
	MissingStage(Side),
	/// An operator left where the command name belongs, as in `> | wc`.
	OperatorCommand(String),
}

impl fmt::Display for SyntaxError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			SyntaxError::MissingCommand => f.write_str("syntax error: missing command"),
			SyntaxError::MissingStage(side) => write!(f, "syntax error: missing command {}", side),
			SyntaxError::OperatorCommand(ref op) => write!(f, "syntax error near '{}'", op),
		}
	}
}

impl error::Error for SyntaxError {}

fn is_operator(word: &str) -> bool {
	matches!(word, PIPE | BACKGROUND | REDIRECT_IN | REDIRECT_OUT)
}

/// Removes the first `&`, reporting whether one was present.
fn take_background(args: &mut Vec<String>) -> bool {
	match args.iter().position(|a| a == BACKGROUND) {
		Some(i) => { args.remove(i); true },
		None => false,
	}
}

/// Extracts the first `< file` and the first `> file` pair; every other token is kept in order.
pub fn extract_redirects(args: Vec<String>) -> (Vec<String>, Redirects) {
	let mut redirects = Redirects::default();
	let mut rest = Vec::with_capacity(args.len());
	let mut iter = args.into_iter();
	while let Some(arg) = iter.next() {
		let is_input = arg == REDIRECT_IN && redirects.input.is_none();
		let is_output = arg == REDIRECT_OUT && redirects.output.is_none();
		if !is_input && !is_output {
			rest.push(arg);
			continue;
		}
		match iter.next() {
			Some(target) if is_input => redirects.input = Some(target),
			Some(target) => redirects.output = Some(target),
			None => rest.push(arg),
		}
	}
	(rest, redirects)
}

/// `side` is `None` for a command without a pipe.
fn stage(args: Vec<String>, side: Option<Side>) -> Result<Stage, SyntaxError> {
	let (argv, redirects) = extract_redirects(args);
	match (argv.first(), side) {
		(None, None) => Err(SyntaxError::MissingCommand),
		(None, Some(side)) => Err(SyntaxError::MissingStage(side)),
		(Some(name), _) if is_operator(name) => Err(SyntaxError::OperatorCommand(name.clone())),
		_ => Ok(Stage { argv: argv, redirects: redirects }),
	}
}

/// Classifies a finalized argument list: background marker first, then the pipe split,
/// then redirections per side.
///
/// Only the first `|` splits; any later one is an ordinary argument of the right stage.
/// An empty list, or one that is empty once `&` is removed, yields `Ok(None)`.
pub fn parse(mut args: Vec<String>) -> Result<Option<Pipeline>, SyntaxError> {
	let is_background = take_background(&mut args);
	if args.is_empty() {
		return Ok(None);
	}

	let (left, right) = match args.iter().position(|a| a == PIPE) {
		Some(i) => {
			let right = args.split_off(i + 1);
			args.pop();
			(stage(args, Some(Side::Left))?, Some(stage(right, Some(Side::Right))?))
		},
		None => (stage(args, None)?, None),
	};
	Ok(Some(Pipeline { left: left, right: right, is_background: is_background }))
}
