use std::env;
use std::fs::OpenOptions;

use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode, WriteLogger};

use crate::config::Config;

pub const LOG_ENV: &str = "MINISH_LOG";

/// `$MINISH_LOG` wins over the configured level; anything unparsable means `warn`.
pub fn level(config: &Config) -> LevelFilter {
	env::var(LOG_ENV).ok()
		.and_then(|l| l.parse().ok())
		.or_else(|| config.log_level.parse().ok())
		.unwrap_or(LevelFilter::Warn)
}

/// Installs the global logger. Failures are reported and the shell runs without one.
pub fn init(config: &Config) {
	let level = level(config);
	let log_config = ConfigBuilder::new().set_time_level(LevelFilter::Off).build();
	let r = match config.log_file {
		Some(ref path) => match OpenOptions::new().create(true).append(true).open(path) {
			Ok(file) => WriteLogger::init(level, log_config, file),
			Err(e) => {
				eprintln!("{}: {}", path.display(), e);
				TermLogger::init(level, log_config, TerminalMode::Stderr, ColorChoice::Auto)
			},
		},
		None => TermLogger::init(level, log_config, TerminalMode::Stderr, ColorChoice::Auto),
	};
	if let Err(e) = r {
		eprintln!("logger: {}", e);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn configured_level_is_parsed() {
		if env::var_os(LOG_ENV).is_some() {
			return;
		}
		let mut config = Config::default();
		assert_eq!(level(&config), LevelFilter::Warn);
		config.log_level = "Debug".to_owned();
		assert_eq!(level(&config), LevelFilter::Debug);
		config.log_level = "loud".to_owned();
		assert_eq!(level(&config), LevelFilter::Warn);
	}
}
