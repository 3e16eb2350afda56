use std::env;

use log::info;

use crate::global;

pub type Builtin = fn(&mut global::State, &[String]) -> i32;

pub fn builtin_exit(state: &mut global::State, _: &[String]) -> i32 {
	println!("Exiting shell...");
	info!("exit requested");
	state.teardown();
	state.should_exit = true;
	0
}

pub fn builtin_cd(_: &mut global::State, args: &[String]) -> i32 {
	let dir = match args.get(1) {
		Some(d) => d,
		None => {
			eprintln!("cd: missing argument");
			return 1;
		},
	};
	match env::set_current_dir(dir) {
		Ok(()) => 0,
		Err(e) => {
			eprintln!("cd failed: {}", e);
			1
		},
	}
}

pub fn builtin_help(_: &mut global::State, _: &[String]) -> i32 {
	println!("Built-in commands:");
	println!("  cd <dir>   - Change directory");
	println!("  help       - Show this help message");
	println!("  exit       - Exit the shell");
	println!("  jobs       - List background jobs");
	println!("  history    - Show command history (!n re-runs entry n)");
	println!("  set        - List shell variables (NAME=value assigns one)");
	println!("Operators: cmd < in > out, cmd1 | cmd2, cmd &");
	println!("Blocks:    if cmd / then / ... / else / ... / fi");
	0
}

pub fn builtin_jobs(state: &mut global::State, _: &[String]) -> i32 {
	for (i, job) in state.executor.jobs_mut().list().enumerate() {
		println!("[{}] {} {}", i + 1, job.pid, job.label);
	}
	0
}

pub fn builtin_history(state: &mut global::State, _: &[String]) -> i32 {
	for (n, line) in state.history.iter() {
		println!("{} {}", n, line);
	}
	0
}

pub fn builtin_set(state: &mut global::State, _: &[String]) -> i32 {
	for (name, value) in state.vars.iter() {
		println!("{}={}", name, value);
	}
	0
}

pub fn match_builtin(name: &str) -> Option<Builtin> {
	match name {
		"exit" => Some(builtin_exit),
		"cd" => Some(builtin_cd),
		"help" => Some(builtin_help),
		"jobs" => Some(builtin_jobs),
		"history" => Some(builtin_history),
		"set" => Some(builtin_set),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::Config;

	fn args(words: &[&str]) -> Vec<String> {
		words.iter().map(|w| w.to_string()).collect()
	}

	#[test]
	fn every_name_resolves() {
		for name in ["exit", "cd", "help", "jobs", "history", "set"] {
			assert!(match_builtin(name).is_some(), "{}", name);
		}
		assert!(match_builtin("ls").is_none());
		assert!(match_builtin("").is_none());
	}

	#[test]
	fn cd_without_argument_fails() {
		let mut state = global::State::new(Config::default());
		assert_eq!(builtin_cd(&mut state, &args(&["cd"])), 1);
		assert_eq!(builtin_cd(&mut state, &args(&["cd", "/definitely/not/here"])), 1);
	}

	#[test]
	fn exit_tears_down_state() {
		let mut state = global::State::new(Config::default());
		state.vars.set("x", "1");
		state.history.push("x=1");
		assert_eq!(builtin_exit(&mut state, &args(&["exit"])), 0);
		assert!(state.should_exit);
		assert!(state.history.is_empty());
		assert_eq!(state.vars.iter().count(), 0);
	}
}
