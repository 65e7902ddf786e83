pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Configuration error: {message}")]
	Config { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
impl From<sift_storage::Error> for Error {
	fn from(err: sift_storage::Error) -> Self {
		match err {
			sift_storage::Error::Sqlx(err) => err.into(),
			sift_storage::Error::InvalidArgument(message) | sift_storage::Error::NotFound(message) =>
				Self::InvalidRequest { message },
		}
	}
}
impl From<sift_config::Error> for Error {
	fn from(err: sift_config::Error) -> Self {
		Self::Config { message: err.to_string() }
	}
}
