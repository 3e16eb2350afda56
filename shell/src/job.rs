use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::types::ExitStatus;

pub trait WaitStatusExt {
	/// `None` while the process has not terminated.
	fn exit_status(self) -> Option<ExitStatus>;
}

impl WaitStatusExt for WaitStatus {
	fn exit_status(self) -> Option<ExitStatus> {
		match self {
			WaitStatus::Exited(_, code) => Some(ExitStatus::Code(code)),
			WaitStatus::Signaled(_, sig, _) => Some(ExitStatus::Signaled(sig)),
			_ => None,
		}
	}
}

/// Blocks until `pid` terminates.
pub fn wait_for(pid: Pid) -> nix::Result<ExitStatus> {
	loop {
		match wait::waitpid(pid, None) {
			Ok(status) => if let Some(s) = status.exit_status() {
				debug!("pid {} finished: {}", pid, s);
				return Ok(s);
			},
			Err(Errno::EINTR) => {},
			Err(e) => return Err(e),
		}
	}
}

/// Non-blocking check; `true` once `pid` has been collected.
fn try_reap(pid: Pid) -> bool {
	match wait::waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
		Ok(WaitStatus::StillAlive) => false,
		Ok(status) => match status.exit_status() {
			Some(s) => {
				debug!("reaped background pid {}: {}", pid, s);
				true
			},
			None => false,
		},
		Err(Errno::ECHILD) => {
			warn!("pid {} is no longer our child", pid);
			true
		},
		Err(e) => {
			warn!("waitpid({}) failed: {}", pid, e);
			false
		},
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
	pub pid: Pid,
	pub label: String,
}

/// Background processes the shell has not waited for yet, in spawn order.
#[derive(Debug)]
pub struct JobTable {
	jobs: Vec<Job>,
	/// Spawned while the table was full; reaped silently.
	untracked: Vec<Pid>,
	capacity: usize,
	label_max: usize,
}

impl JobTable {
	pub fn new(capacity: usize, label_max: usize) -> JobTable {
		JobTable { jobs: Vec::with_capacity(capacity), untracked: vec![], capacity: capacity, label_max: label_max }
	}

	/// Appends a record and returns its 1-based position, or `None` when the table is full.
	pub fn record(&mut self, pid: Pid, label: &str) -> Option<usize> {
		if self.jobs.len() >= self.capacity {
			warn!("job table full ({} entries), pid {} untracked", self.capacity, pid);
			self.untracked.push(pid);
			return None;
		}
		debug_assert!(!self.contains(pid));
		let label: String = label.chars().take(self.label_max).collect();
		self.jobs.push(Job { pid: pid, label: label });
		Some(self.jobs.len())
	}

	/// Collects every tracked process that has terminated and closes the gaps.
	pub fn reap_completed(&mut self) {
		self.jobs.retain(|job| !try_reap(job.pid));
		self.untracked.retain(|&pid| !try_reap(pid));
	}

	/// Current records, after reaping the finished ones.
	pub fn list(&mut self) -> impl Iterator<Item = &Job> {
		self.reap_completed();
		self.jobs.iter()
	}

	pub fn len(&self) -> usize {
		self.jobs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.jobs.is_empty()
	}

	/// Whether `pid` is among the tracked records.
	pub fn contains(&self, pid: Pid) -> bool {
		self.jobs.iter().any(|j| j.pid == pid)
	}
}
