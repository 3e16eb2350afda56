/// Shell variables, kept in the order they were first set.
#[derive(Debug, Default)]
pub struct VarStore {
	vars: Vec<(String, String)>,
}

impl VarStore {
	pub fn new() -> VarStore {
		VarStore { vars: vec![] }
	}

	pub fn get(&self, name: &str) -> Option<&str> {
		self.vars.iter().find(|e| e.0 == name).map(|e| e.1.as_str())
	}

	pub fn set(&mut self, name: &str, value: &str) {
		match self.vars.iter_mut().find(|e| e.0 == name) {
			Some(e) => e.1 = value.to_owned(),
			None => self.vars.push((name.to_owned(), value.to_owned())),
		}
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.vars.iter().map(|e| (e.0.as_str(), e.1.as_str()))
	}

	pub fn clear(&mut self) {
		self.vars.clear();
	}

	/// `$name` becomes the stored value, or the empty string when unset.
	pub fn expand_word(&self, word: &str) -> String {
		match word.strip_prefix('$') {
			Some(name) if !name.is_empty() => self.get(name).unwrap_or("").to_owned(),
			_ => word.to_owned(),
		}
	}

	pub fn expand(&self, args: Vec<String>) -> Vec<String> {
		args.into_iter()
			.map(|a| if a.starts_with('$') { self.expand_word(&a) } else { a })
			.collect()
	}
}

fn is_name(s: &str) -> bool {
	let mut chars = s.chars();
	match chars.next() {
		Some(c) if c == '_' || c.is_ascii_alphabetic() => chars.all(|c| c == '_' || c.is_ascii_alphanumeric()),
		_ => false,
	}
}

/// Recognizes `NAME=value`, returning the name and the raw value.
pub fn split_assignment(word: &str) -> Option<(&str, &str)> {
	let eq = word.find('=')?;
	let (name, value) = (&word[.. eq], &word[eq + 1 ..]);
	if is_name(name) { Some((name, value)) } else { None }
}
