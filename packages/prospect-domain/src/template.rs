use std::{collections::HashMap, fs, path::Path, sync::LazyLock};

use regex::Regex;

use crate::{Error, Result};

static VAR_PATTERN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\{([A-Za-z][A-Za-z0-9_]*)\}").expect("Pattern must compile."));

/// A prompt body with `{variable}` placeholders. The variable list is derived
/// from the body so `list-prompts` can show what each template expects.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
	pub name: String,
	pub body: String,
	pub variables: Vec<String>,
}

impl PromptTemplate {
	pub fn from_file(path: &Path) -> Result<Self> {
		let raw = fs::read_to_string(path)
			.map_err(|err| Error::ReadFile { path: path.to_path_buf(), source: err })?;
		let name =
			path.file_stem().and_then(|stem| stem.to_str()).unwrap_or("prompt").to_string();

		Ok(Self::parse(name, raw))
	}

	pub fn parse(name: String, body: String) -> Self {
		let mut variables = Vec::new();

		for capture in VAR_PATTERN.captures_iter(&body) {
			let variable = capture[1].to_string();

			if !variables.contains(&variable) {
				variables.push(variable);
			}
		}

		Self { name, body, variables }
	}

	/// Substitutes every placeholder. A placeholder without a supplied value is
	/// an error rather than a silently-forwarded `{name}` literal.
	pub fn render(&self, vars: &HashMap<String, String>) -> Result<String> {
		let mut out = self.body.clone();

		for name in &self.variables {
			let Some(value) = vars.get(name) else {
				return Err(Error::UnboundVariable { name: name.clone() });
			};

			out = out.replace(&format!("{{{name}}}"), value);
		}

		Ok(out)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn repeated_placeholders_are_listed_once() {
		let template = PromptTemplate::parse(
			"test".to_string(),
			"Hello {company_name}, again {company_name} and {website_content}.".to_string(),
		);

		assert_eq!(template.variables, vec!["company_name", "website_content"]);
	}

	#[test]
	fn json_examples_are_not_placeholders() {
		let template = PromptTemplate::parse(
			"test".to_string(),
			r#"Return {"industry": "..."} for {company_name}."#.to_string(),
		);

		assert_eq!(template.variables, vec!["company_name"]);
	}
}
