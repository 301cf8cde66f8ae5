pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error("{operation} request to {url} failed.")]
	Api { operation: &'static str, url: String, source: reqwest::Error },
	#[error("{operation} is not configured: {missing} is empty.")]
	MissingCredential { operation: &'static str, missing: &'static str },
	#[error("{message}")]
	InvalidResponse { message: String },
}
