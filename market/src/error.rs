use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Debug)]
pub enum PrepareError {
	Io(std::io::Error),
	Json(serde_json::Error),
	MissingTitle(PathBuf),
	EmptyFile(PathBuf),
}

impl Display for PrepareError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Io(e) => write!(f, "io error: {e}"),
			Self::Json(e) => write!(f, "json error: {e}"),
			Self::MissingTitle(p) => write!(f, "title file not found: {}", p.display()),
			Self::EmptyFile(p) => write!(f, "file is empty or not a record array: {}", p.display()),
		}
	}
}

impl std::error::Error for PrepareError {}

impl From<std::io::Error> for PrepareError {
	fn from(value: std::io::Error) -> Self {
		Self::Io(value)
	}
}

impl From<serde_json::Error> for PrepareError {
	fn from(value: serde_json::Error) -> Self {
		Self::Json(value)
	}
}
