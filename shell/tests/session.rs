use std::fs;
use std::path::Path;

use minish::cond::{self, Block};
use minish::config::Config;
use minish::global::State;
use minish::repl::{self, Script};

fn state() -> State {
	State::new(Config::default())
}

fn lines(v: &[String]) -> Vec<String> {
	v.to_vec()
}

#[test]
fn true_condition_runs_then_branch_in_order() {
	let dir = tempfile::tempdir().unwrap();
	let d = dir.path().to_str().unwrap();
	let block = Block {
		condition: "true".to_owned(),
		then_lines: lines(&[format!("printf first > {}/one", d), format!("cat {0}/one > {0}/two", d)]),
		else_lines: lines(&[format!("touch {}/else", d)]),
	};
	let mut s = state();
	assert!(cond::run_block(&mut s, &block).success());
	assert_eq!(fs::read_to_string(dir.path().join("two")).unwrap(), "first");
	assert!(!dir.path().join("else").exists());
}

#[test]
fn false_condition_runs_only_else_branch() {
	let dir = tempfile::tempdir().unwrap();
	let d = dir.path().to_str().unwrap();
	let block = Block {
		condition: "false".to_owned(),
		then_lines: lines(&[format!("touch {}/then", d)]),
		else_lines: lines(&[format!("touch {}/else", d)]),
	};
	let mut s = state();
	cond::run_block(&mut s, &block);
	assert!(dir.path().join("else").exists());
	assert!(!dir.path().join("then").exists());
}

#[test]
fn false_condition_with_empty_else_runs_nothing() {
	let dir = tempfile::tempdir().unwrap();
	let d = dir.path().to_str().unwrap();
	let block = Block {
		condition: "false".to_owned(),
		then_lines: lines(&[format!("touch {}/then", d)]),
		else_lines: vec![],
	};
	let mut s = state();
	cond::run_block(&mut s, &block);
	assert!(!dir.path().join("then").exists());
}

#[test]
fn failing_line_does_not_stop_branch() {
	let dir = tempfile::tempdir().unwrap();
	let d = dir.path().to_str().unwrap();
	let block = Block {
		condition: "true".to_owned(),
		then_lines: lines(&["no-such-command-2718".to_owned(), format!("touch {}/after", d)]),
		else_lines: vec![],
	};
	let mut s = state();
	assert!(cond::run_block(&mut s, &block).success());
	assert!(dir.path().join("after").exists());
}

#[test]
fn scripted_session_with_variables_and_block() {
	let dir = tempfile::tempdir().unwrap();
	let d = dir.path().to_str().unwrap();
	let out = format!("{}/out", d);
	let mut s = state();
	let mut script = Script::new(vec![
		format!("target={}", out),
		"word=hello".to_owned(),
		"if true".to_owned(),
		"then".to_owned(),
		"printf $word > $target".to_owned(),
		"fi".to_owned(),
	]);
	repl::run(&mut s, &mut script);
	assert_eq!(fs::read_to_string(Path::new(&out)).unwrap(), "hello");
	assert_eq!(s.history.len(), 3);
}

#[test]
fn background_job_from_session_is_listed() {
	let mut s = state();
	s.run_line("sleep 5 &");
	let pids: Vec<_> = s.executor.jobs_mut().list().map(|j| j.pid).collect();
	assert_eq!(pids.len(), 1);
	for pid in pids {
		nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGKILL).unwrap();
		nix::sys::wait::waitpid(pid, None).unwrap();
	}
	s.executor.jobs_mut().reap_completed();
	assert!(s.executor.jobs().is_empty());
}
