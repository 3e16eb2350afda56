use std::path::{Path, PathBuf};
use std::{env, error, fmt, fs, io};

use log::{debug, warn};
use serde::Deserialize;

pub const CONFIG_ENV: &str = "MINISH_CONFIG";

#[derive(Debug)]
pub enum ConfigError {
	Io(io::Error),
	Toml(toml::de::Error),
}
impl From<io::Error> for ConfigError {
	fn from(e: io::Error) -> ConfigError {
		ConfigError::Io(e)
	}
}
impl From<toml::de::Error> for ConfigError {
	fn from(e: toml::de::Error) -> ConfigError {
		ConfigError::Toml(e)
	}
}
impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			ConfigError::Io(ref e) => write!(f, "IO error: {}", e),
			ConfigError::Toml(ref e) => write!(f, "TOML error: {}", e),
		}
	}
}
impl error::Error for ConfigError {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		match *self {
			ConfigError::Io(ref e) => Some(e),
			ConfigError::Toml(ref e) => Some(e),
		}
	}
}

/// Bounds and logging settings, fixed for the life of the shell.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub history_size: usize,
	pub job_capacity: usize,
	/// Maximum job label length, in characters.
	pub label_max: usize,
	pub log_level: String,
	pub log_file: Option<PathBuf>,
}

impl Default for Config {
	fn default() -> Config {
		Config {
			history_size: 20,
			job_capacity: 32,
			label_max: 255,
			log_level: "warn".to_owned(),
			log_file: None,
		}
	}
}

impl Config {
	pub fn parse(text: &str) -> Result<Config, ConfigError> {
		Ok(toml::from_str(text)?)
	}

	/// A missing file is not an error.
	pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
		match fs::read_to_string(path) {
			Ok(text) => Config::parse(&text),
			Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(Config::default()),
			Err(e) => Err(e.into()),
		}
	}

	/// `$MINISH_CONFIG`, else `~/.config/minish/config.toml`.
	pub fn default_path() -> Option<PathBuf> {
		if let Some(p) = env::var_os(CONFIG_ENV) {
			return Some(PathBuf::from(p));
		}
		env::var_os("HOME").map(|home| Path::new(&home).join(".config/minish/config.toml"))
	}

	/// Loads the default file, falling back to defaults after reporting any problem.
	pub fn load() -> Config {
		let path = match Config::default_path() {
			Some(p) => p,
			None => return Config::default(),
		};
		match Config::load_from(&path) {
			Ok(config) => {
				debug!("config from {}: {:?}", path.display(), config);
				config
			},
			Err(e) => {
				warn!("ignoring config {}: {}", path.display(), e);
				eprintln!("{}: {}", path.display(), e);
				Config::default()
			},
		}
	}
}
