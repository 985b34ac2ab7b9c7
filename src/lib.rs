pub mod config;
pub mod dedup;
pub mod defs;
pub mod dict;
pub mod error;
pub mod fnv;
pub mod index;
pub mod layout;
pub mod pipeline;

pub use dict::DictionaryFile;
pub use error::{Result, SdictError};
