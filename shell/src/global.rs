use log::debug;

use crate::builtin;
use crate::config::Config;
use crate::eval::Executor;
use crate::history::History;
use crate::job::JobTable;
use crate::parser;
use crate::types::ExitStatus;
use crate::vars::{self, VarStore};

pub struct State {
	pub config: Config,
	pub executor: Executor,
	pub vars: VarStore,
	pub history: History,
	pub should_exit: bool,
}

impl State {
	pub fn new(config: Config) -> State {
		let executor = Executor::new(JobTable::new(config.job_capacity, config.label_max));
		let history = History::new(config.history_size);
		State { config: config, executor: executor, vars: VarStore::new(), history: history, should_exit: false }
	}

	pub fn last_status(&self) -> ExitStatus {
		self.executor.last_status()
	}

	/// One command line: tokenize, assign or expand, then a builtin or the executor.
	pub fn run_line(&mut self, line: &str) {
		let args = match parser::tokenize(line) {
			Some(args) => args,
			None => return,
		};
		if args.len() == 1 {
			if let Some((name, value)) = vars::split_assignment(&args[0]) {
				let value = self.vars.expand_word(value);
				debug!("set {}={}", name, value);
				self.vars.set(name, &value);
				self.executor.set_last_status(ExitStatus::SUCCESS);
				return;
			}
		}
		let args = self.vars.expand(args);
		if let Some(builtin) = builtin::match_builtin(&args[0]) {
			let code = builtin(self, &args);
			self.executor.set_last_status(ExitStatus::Code(code));
			return;
		}
		self.dispatch(args);
	}

	/// Like [`State::run_line`] but never consults builtins or assignments.
	pub fn run_external(&mut self, line: &str) -> ExitStatus {
		match parser::tokenize(line) {
			Some(args) => {
				let args = self.vars.expand(args);
				self.dispatch(args);
			},
			None => self.executor.set_last_status(ExitStatus::FAILURE),
		}
		self.last_status()
	}

	fn dispatch(&mut self, args: Vec<String>) {
		if let Err(e) = self.executor.execute(args) {
			eprintln!("{}", e);
		}
	}

	pub fn teardown(&mut self) {
		self.vars.clear();
		self.history.clear();
	}
}
