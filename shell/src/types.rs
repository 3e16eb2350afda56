use std::fmt;

use nix::sys::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side { Left, Right }

impl fmt::Display for Side {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			Side::Left => f.write_str("before '|'"),
			Side::Right => f.write_str("after '|'"),
		}
	}
}

/// Files a stage's standard input and output are rebound to.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Redirects {
	pub input: Option<String>,
	pub output: Option<String>,
}

/// One process to spawn: its argv with every operator already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
	pub argv: Vec<String>,
	pub redirects: Redirects,
}

impl Stage {
	pub fn name(&self) -> &str {
		self.argv.first().map_or("", |s| s.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
	pub left: Stage,
	/// Present when the argument list contained a `|`.
	pub right: Option<Stage>,
	pub is_background: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
	Code(i32),
	Signaled(Signal),
}

impl ExitStatus {
	pub const SUCCESS: ExitStatus = ExitStatus::Code(0);
	pub const FAILURE: ExitStatus = ExitStatus::Code(1);

	pub fn success(self) -> bool {
		self == ExitStatus::SUCCESS
	}
}

impl fmt::Display for ExitStatus {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			ExitStatus::Code(c) => write!(f, "exit {}", c),
			ExitStatus::Signaled(sig) => write!(f, "killed by {}", sig),
		}
	}
}
