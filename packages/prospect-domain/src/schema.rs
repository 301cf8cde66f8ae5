use std::{fmt::Write as _, fs, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Declared shape of an LLM extraction: which fields the caller expects, which
/// of them are mandatory, and what to substitute when the model omits an
/// optional one.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractionSchema {
	pub name: String,
	#[serde(default)]
	pub description: String,
	pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldDef {
	pub name: String,
	#[serde(rename = "type", default = "default_type_tag")]
	pub type_tag: String,
	#[serde(default)]
	pub required: bool,
	#[serde(default)]
	pub default: Option<Value>,
	#[serde(default)]
	pub description: String,
}

fn default_type_tag() -> String {
	"string".to_string()
}

impl ExtractionSchema {
	pub fn from_file(path: &Path) -> Result<Self> {
		let raw = fs::read_to_string(path)
			.map_err(|err| Error::ReadFile { path: path.to_path_buf(), source: err })?;

		serde_json::from_str(&raw)
			.map_err(|err| Error::ParseSchema { path: path.to_path_buf(), source: err })
	}

	/// Bullet list of the expected fields, ready to splice into a prompt.
	pub fn field_instructions(&self) -> String {
		let mut out = String::new();

		for field in &self.fields {
			let requirement = if field.required { "required" } else { "optional" };

			let _ = write!(out, "- \"{}\" ({}, {})", field.name, field.type_tag, requirement);

			if !field.description.is_empty() {
				let _ = write!(out, ": {}", field.description);
			}

			out.push('\n');
		}

		out
	}
}

/// Checks a candidate extraction against the schema. Every missing or null
/// required field is collected so the failure names the fields themselves.
/// Missing optional fields are filled from their declared default; fields the
/// schema does not know about pass through untouched.
pub fn validate_extraction(
	schema: &ExtractionSchema,
	candidate: Value,
) -> Result<Map<String, Value>> {
	let Value::Object(mut object) = candidate else {
		return Err(Error::NotAnObject);
	};
	let mut missing = Vec::new();

	for field in &schema.fields {
		let present = object.get(&field.name).map(|value| !value.is_null()).unwrap_or(false);

		if present {
			continue;
		}
		if field.required {
			missing.push(field.name.clone());

			continue;
		}
		if let Some(default) = &field.default {
			object.insert(field.name.clone(), default.clone());
		}
	}

	if !missing.is_empty() {
		return Err(Error::MissingFields { fields: missing });
	}

	Ok(object)
}
