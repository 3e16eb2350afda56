use std::ffi::{self, CString};
use std::io::{self, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::{error, fmt};

use log::{debug, info};
use nix::errno::Errno;
use nix::fcntl::{self, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::{self, ForkResult, Pid};

use crate::job::{self, JobTable};
use crate::parser::{self, SyntaxError};
use crate::types::*;

#[derive(Debug)]
pub enum ExecError {
	Fork(Errno),
	Pipe(Errno),
	Wait(Errno),
	NulError(ffi::NulError),
	Syntax(SyntaxError),
}
impl From<ffi::NulError> for ExecError {
	fn from(e: ffi::NulError) -> ExecError {
		ExecError::NulError(e)
	}
}
impl From<SyntaxError> for ExecError {
	fn from(e: SyntaxError) -> ExecError {
		ExecError::Syntax(e)
	}
}
impl fmt::Display for ExecError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			ExecError::Fork(ref e) => write!(f, "fork failed: {}", e),
			ExecError::Pipe(ref e) => write!(f, "pipe failed: {}", e),
			ExecError::Wait(ref e) => write!(f, "wait failed: {}", e),
			ExecError::NulError(ref e) => write!(f, "Nul char error: {}", e),
			ExecError::Syntax(ref e) => write!(f, "{}", e),
		}
	}
}
impl error::Error for ExecError {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		match *self {
			ExecError::Fork(ref e) | ExecError::Pipe(ref e) | ExecError::Wait(ref e) => Some(e),
			ExecError::NulError(ref e) => Some(e),
			ExecError::Syntax(ref e) => Some(e),
		}
	}
}

/// Everything a child needs after fork, built beforehand so the child never allocates.
struct ChildPlan {
	argv: Vec<CString>,
	/// Null-terminated pointers into `argv`, as `execvp` expects them.
	argv_ptrs: Vec<*const libc::c_char>,
	input: Option<CString>,
	output: Option<CString>,
	not_found: Vec<u8>,
	input_error: Vec<u8>,
	output_error: Vec<u8>,
}

impl ChildPlan {
	fn new(stage: &Stage) -> Result<ChildPlan, ExecError> {
		let argv: Result<Vec<CString>, ffi::NulError> = stage.argv.iter().map(|a| CString::new(a.as_bytes())).collect();
		let input = stage.redirects.input.as_ref().map(|p| CString::new(p.as_bytes())).transpose()?;
		let output = stage.redirects.output.as_ref().map(|p| CString::new(p.as_bytes())).transpose()?;
		let argv = argv?;
		let argv_ptrs = argv.iter().map(|a| a.as_ptr()).chain(std::iter::once(std::ptr::null())).collect();
		Ok(ChildPlan {
			argv: argv,
			argv_ptrs: argv_ptrs,
			input: input,
			output: output,
			not_found: format!("Error: command not found: {}\n", stage.name()).into_bytes(),
			input_error: format!("Error: cannot open input file '{}': ", stage.redirects.input.as_deref().unwrap_or("")).into_bytes(),
			output_error: format!("Error: cannot open output file '{}': ", stage.redirects.output.as_deref().unwrap_or("")).into_bytes(),
		})
	}
}

fn write_stderr(bytes: &[u8]) {
	unsafe { libc::write(libc::STDERR_FILENO, bytes.as_ptr() as *const libc::c_void, bytes.len()); }
}

fn child_exit(parts: &[&[u8]]) -> ! {
	for part in parts {
		write_stderr(part);
	}
	unsafe { libc::_exit(1) }
}

fn child_redirect(path: &CString, flags: OFlag, mode: Mode, target: RawFd, error: &[u8]) {
	let fd = match fcntl::open(path.as_c_str(), flags, mode) {
		Ok(fd) => fd,
		Err(e) => child_exit(&[error, e.desc().as_bytes(), b"\n"]),
	};
	if let Err(e) = unistd::dup2(fd, target) {
		child_exit(&[b"Error: dup2 failed: ", e.desc().as_bytes(), b"\n"]);
	}
	let _ = unistd::close(fd);
}

/// Runs in the forked child: rebinds stdin/stdout, closes the inherited pipe ends and execs.
///
/// A file redirection takes precedence over the pipe end offered for the same descriptor.
fn exec_child(plan: &ChildPlan, stdin: Option<RawFd>, stdout: Option<RawFd>, inherited: &[RawFd]) -> ! {
	let out_mode = Mode::S_IRUSR | Mode::S_IWUSR | Mode::S_IRGRP | Mode::S_IROTH;
	if let Some(ref path) = plan.input {
		child_redirect(path, OFlag::O_RDONLY, Mode::empty(), libc::STDIN_FILENO, &plan.input_error);
	} else if let Some(fd) = stdin {
		if let Err(e) = unistd::dup2(fd, libc::STDIN_FILENO) {
			child_exit(&[b"Error: dup2 failed: ", e.desc().as_bytes(), b"\n"]);
		}
	}
	if let Some(ref path) = plan.output {
		child_redirect(path, OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC, out_mode, libc::STDOUT_FILENO, &plan.output_error);
	} else if let Some(fd) = stdout {
		if let Err(e) = unistd::dup2(fd, libc::STDOUT_FILENO) {
			child_exit(&[b"Error: dup2 failed: ", e.desc().as_bytes(), b"\n"]);
		}
	}
	for &fd in inherited {
		let _ = unistd::close(fd);
	}
	unsafe { libc::execvp(plan.argv[0].as_ptr(), plan.argv_ptrs.as_ptr()); }
	child_exit(&[&plan.not_found])
}

fn spawn(plan: &ChildPlan, stdin: Option<RawFd>, stdout: Option<RawFd>, inherited: &[RawFd]) -> Result<Pid, ExecError> {
	// Pending output would otherwise interleave with the child's.
	let _ = io::stdout().flush();
	match unsafe { unistd::fork() }.map_err(ExecError::Fork)? {
		ForkResult::Parent { child } => Ok(child),
		ForkResult::Child => exec_child(plan, stdin, stdout, inherited),
	}
}

/// Turns finalized argument lists into running processes and keeps the background ones.
#[derive(Debug)]
pub struct Executor {
	jobs: JobTable,
	last_status: ExitStatus,
}

impl Executor {
	pub fn new(jobs: JobTable) -> Executor {
		Executor { jobs: jobs, last_status: ExitStatus::SUCCESS }
	}

	pub fn jobs(&self) -> &JobTable {
		&self.jobs
	}

	pub fn jobs_mut(&mut self) -> &mut JobTable {
		&mut self.jobs
	}

	/// Status of the last foreground command; the right stage's for a pipeline.
	/// A background dispatch counts as success, a failed dispatch as failure.
	pub fn last_status(&self) -> ExitStatus {
		self.last_status
	}

	pub fn set_last_status(&mut self, status: ExitStatus) {
		self.last_status = status;
	}

	/// Dispatches one argument list. `Ok` means the command was started; its exit status is
	/// available from [`Executor::last_status`].
	///
	/// Operator tokens are consumed: `args` is not usable afterwards.
	pub fn execute(&mut self, args: Vec<String>) -> Result<(), ExecError> {
		let r = parser::parse(args).map_err(ExecError::from).and_then(|p| match p {
			Some(pipeline) => self.run(&pipeline),
			None => Ok(()),
		});
		if r.is_err() {
			self.last_status = ExitStatus::FAILURE;
		}
		r
	}

	fn run(&mut self, pipeline: &Pipeline) -> Result<(), ExecError> {
		match pipeline.right {
			None => self.run_simple(&pipeline.left, pipeline.is_background),
			Some(ref right) => self.run_piped(&pipeline.left, right, pipeline.is_background),
		}
	}

	fn run_simple(&mut self, stage: &Stage, is_background: bool) -> Result<(), ExecError> {
		let plan = ChildPlan::new(stage)?;
		let pid = spawn(&plan, None, None, &[])?;
		debug!("spawned {} as pid {}", stage.name(), pid);
		self.settle(pid, stage.name(), is_background)
	}

	fn run_piped(&mut self, left: &Stage, right: &Stage, is_background: bool) -> Result<(), ExecError> {
		let left_plan = ChildPlan::new(left)?;
		let right_plan = ChildPlan::new(right)?;
		let (read_end, write_end) = unistd::pipe2(OFlag::O_CLOEXEC).map_err(ExecError::Pipe)?;
		let fds = [read_end.as_raw_fd(), write_end.as_raw_fd()];

		let left_pid = spawn(&left_plan, None, Some(fds[1]), &fds)?;
		let right_pid = match spawn(&right_plan, Some(fds[0]), None, &fds) {
			Ok(pid) => pid,
			Err(e) => {
				drop(read_end);
				drop(write_end);
				let _ = self.settle(left_pid, left.name(), is_background);
				return Err(e);
			},
		};
		// The reader only sees EOF once every copy of the write end is closed.
		drop(read_end);
		drop(write_end);
		debug!("spawned {} | {} as pids {} {}", left.name(), right.name(), left_pid, right_pid);

		if is_background {
			self.background(left_pid, left.name());
			self.background(right_pid, right.name());
			self.last_status = ExitStatus::SUCCESS;
			Ok(())
		} else {
			let left_status = job::wait_for(left_pid);
			self.last_status = job::wait_for(right_pid).map_err(ExecError::Wait)?;
			left_status.map(|_| ()).map_err(ExecError::Wait)
		}
	}

	fn settle(&mut self, pid: Pid, label: &str, is_background: bool) -> Result<(), ExecError> {
		if is_background {
			self.background(pid, label);
			self.last_status = ExitStatus::SUCCESS;
		} else {
			self.last_status = job::wait_for(pid).map_err(ExecError::Wait)?;
		}
		Ok(())
	}

	fn background(&mut self, pid: Pid, label: &str) {
		match self.jobs.record(pid, label) {
			Some(n) => {
				info!("background job [{}] {} ({})", n, pid, label);
				println!("[{}] {}", n, pid);
			},
			None => eprintln!("jobs: table full, not tracking {}", pid),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn words(s: &str) -> Vec<String> {
		parser::tokenize(s).unwrap_or_default()
	}

	fn executor() -> Executor {
		Executor::new(JobTable::new(8, 255))
	}

	#[test]
	fn foreground_status_is_surfaced() {
		let mut ex = executor();
		ex.execute(words("true")).unwrap();
		assert!(ex.last_status().success());
		ex.execute(words("false")).unwrap();
		assert_eq!(ex.last_status(), ExitStatus::Code(1));
		assert!(ex.jobs().is_empty());
	}

	#[test]
	fn missing_command_exits_one_in_child() {
		let mut ex = executor();
		ex.execute(words("definitely-not-a-command-3141")).unwrap();
		assert_eq!(ex.last_status(), ExitStatus::Code(1));
	}

	#[test]
	fn pipeline_status_comes_from_right_stage() {
		let mut ex = executor();
		ex.execute(words("true | false")).unwrap();
		assert_eq!(ex.last_status(), ExitStatus::Code(1));
		ex.execute(words("false | true")).unwrap();
		assert!(ex.last_status().success());
	}

	#[test]
	fn empty_stage_is_reported_without_spawning() {
		let mut ex = executor();
		match ex.execute(words("| wc")) {
			Err(ExecError::Syntax(SyntaxError::MissingStage(Side::Left))) => {},
			other => panic!("unexpected {:?}", other),
		}
		assert_eq!(ex.last_status(), ExitStatus::FAILURE);
	}

	#[test]
	fn operator_in_command_position_is_reported_without_spawning() {
		let mut ex = executor();
		let err = ex.execute(words("> | wc")).unwrap_err();
		assert_eq!(err.to_string(), "syntax error near '>'");
		let err = ex.execute(words("< in.txt")).unwrap_err();
		assert_eq!(err.to_string(), "syntax error: missing command");
		assert_eq!(ex.last_status(), ExitStatus::FAILURE);
		assert!(ex.jobs().is_empty());
	}

	#[test]
	fn child_plan_argv_pointers_are_null_terminated() {
		let stage = Stage { argv: vec!["echo".to_owned(), "hi".to_owned()], redirects: Redirects::default() };
		let plan = ChildPlan::new(&stage).unwrap();
		assert_eq!(plan.argv_ptrs.len(), 3);
		assert_eq!(plan.argv_ptrs[0], plan.argv[0].as_ptr());
		assert_eq!(plan.argv_ptrs[1], plan.argv[1].as_ptr());
		assert!(plan.argv_ptrs[2].is_null());
	}

	#[test]
	fn nul_in_argument_is_rejected() {
		let mut ex = executor();
		assert!(matches!(ex.execute(vec!["echo".to_owned(), "a\0b".to_owned()]), Err(ExecError::NulError(_))));
	}

	#[test]
	fn empty_list_is_noop() {
		let mut ex = executor();
		ex.execute(vec![]).unwrap();
		ex.execute(words("&")).unwrap();
		assert!(ex.jobs().is_empty());
	}
}
