use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdictError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{} exists but is not a regular file", .0.display())]
    NotAFile(PathBuf),

    #[error("{} does not exist, not creating", .0.display())]
    DoesNotExist(PathBuf),

    #[error("Unexpected EOF. File may be corrupted")]
    UnexpectedEof,

    #[error("{0}. File may be corrupted")]
    Corruption(&'static str),

    #[error("Definition hash does not match. File may be corrupted")]
    HashMismatch,

    #[error("Repeated words were inserted")]
    RepeatedWords,

    #[error("Words must be non-empty and contain no NUL byte")]
    InvalidWord,

    #[error("Definitions must not be empty")]
    EmptyDef,

    #[error("Definition exceeds the maximum encodable size")]
    DefTooLarge,

    #[error("The {0} section exceeds the 32-bit addressable range")]
    SectionOverflow(&'static str),
}

pub type Result<T> = std::result::Result<T, SdictError>;
