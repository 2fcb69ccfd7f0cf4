use thiserror::Error;

/// The directory could not produce an identity list.
///
/// Both variants mean the directory is unavailable to the operator; the
/// variant records why.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),

    #[error("directory returned a malformed payload: {0}")]
    Malformed(String),
}

