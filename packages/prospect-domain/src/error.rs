pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read {path:?}.")]
	ReadFile { path: std::path::PathBuf, source: std::io::Error },
	#[error("Failed to parse schema at {path:?}.")]
	ParseSchema { path: std::path::PathBuf, source: serde_json::Error },
	#[error("Extraction result is not a JSON object.")]
	NotAnObject,
	#[error("Missing required fields: {}.", fields.join(", "))]
	MissingFields { fields: Vec<String> },
	#[error("Template variable {name:?} has no value.")]
	UnboundVariable { name: String },
}
