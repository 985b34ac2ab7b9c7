use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct OpenConfig {
    pub create_if_missing: bool,
    pub deduplicate: bool,
    /// Recompute and check every definition hash on open (expensive).
    pub verify_defs: bool,
}

impl Default for OpenConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            deduplicate: true,
            verify_defs: true,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AddOptions {
    /// Flush words and indices after the definition is written. Without it,
    /// lookups stay slow until flush() runs, but bulk insertion is much cheaper.
    pub flush: bool,
    /// Skip the existing-word check. Only safe when the input is known to
    /// contain no duplicates.
    pub skip_dup_check: bool,
}

impl Default for AddOptions {
    fn default() -> Self {
        Self {
            flush: true,
            skip_dup_check: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BuildConfig {
    pub words_path: PathBuf,
    pub api_key_path: PathBuf,
    pub output_path: PathBuf,
    pub api_host: String,
    pub http_workers: usize,
    pub word_queue_depth: usize,
    pub def_queue_depth: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            words_path: PathBuf::from("words.txt"),
            api_key_path: PathBuf::from("api_key.txt"),
            output_path: PathBuf::from("data.sdict"),
            api_host: String::from("https://www.dictionaryapi.com"),
            http_workers: 16,
            word_queue_depth: 64,
            def_queue_depth: 8,
        }
    }
}
