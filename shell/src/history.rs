use std::collections::VecDeque;
use std::{error, fmt};

#[derive(Debug, PartialEq, Eq)]
pub enum HistoryError {
	Invalid(String),
	OutOfRange(usize),
}

impl fmt::Display for HistoryError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			HistoryError::Invalid(_) => f.write_str("Invalid !n command"),
			HistoryError::OutOfRange(n) => write!(f, "No such command in history: !{}", n),
		}
	}
}

impl error::Error for HistoryError {}

/// The last `capacity` lines entered, oldest first.
#[derive(Debug)]
pub struct History {
	lines: VecDeque<String>,
	capacity: usize,
}

impl History {
	pub fn new(capacity: usize) -> History {
		History { lines: VecDeque::with_capacity(capacity), capacity: capacity }
	}

	pub fn push(&mut self, line: &str) {
		if self.capacity == 0 {
			return;
		}
		if self.lines.len() == self.capacity {
			self.lines.pop_front();
		}
		self.lines.push_back(line.to_owned());
	}

	/// 1-indexed over the lines currently stored.
	pub fn get(&self, n: usize) -> Option<&str> {
		n.checked_sub(1).and_then(|i| self.lines.get(i)).map(|s| s.as_str())
	}

	pub fn len(&self) -> usize {
		self.lines.len()
	}

	pub fn is_empty(&self) -> bool {
		self.lines.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
		self.lines.iter().enumerate().map(|(i, l)| (i + 1, l.as_str()))
	}

	pub fn clear(&mut self) {
		self.lines.clear();
	}

	/// Resolves a `!n` line to the stored line it names.
	///
	/// Returns `Ok(None)` when `line` is not a recall at all.
	pub fn recall(&self, line: &str) -> Result<Option<&str>, HistoryError> {
		let digits = match line.strip_prefix('!') {
			Some(d) => d,
			None => return Ok(None),
		};
		if digits.is_empty() || !digits.bytes().all(|c| c.is_ascii_digit()) {
			return Err(HistoryError::Invalid(line.to_owned()));
		}
		let n: usize = digits.parse().map_err(|_| HistoryError::Invalid(line.to_owned()))?;
		self.get(n).map(Some).ok_or(HistoryError::OutOfRange(n))
	}
}
