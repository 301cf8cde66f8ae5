pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Failed to create database directory {path:?}.")]
	CreateDir { path: std::path::PathBuf, source: std::io::Error },
	#[error("Stored timestamp {value:?} is not valid RFC 3339.")]
	InvalidTimestamp { value: String },
}
