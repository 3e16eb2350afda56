use std::process;

use log::info;

use minish::config::Config;
use minish::{global, logging, repl};

fn main() {
	let config = Config::load();
	logging::init(&config);
	info!("starting with {:?}", config);

	let mut terminal = match repl::Terminal::new() {
		Ok(t) => t,
		Err(e) => {
			eprintln!("cannot initialize line editor: {}", e);
			process::exit(1);
		},
	};
	let mut state = global::State::new(config);
	repl::run(&mut state, &mut terminal);
}
