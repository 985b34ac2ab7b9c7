//! Batch builder: fetches a definition for every word in words.txt and
//! writes them all into data.sdict.

use anyhow::{bail, Context, Result};
use sdict::config::{BuildConfig, OpenConfig};
use sdict::pipeline;
use sdict::DictionaryFile;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = BuildConfig::default();

    let api_key = std::fs::read_to_string(&config.api_key_path)
        .with_context(|| format!("reading {}", config.api_key_path.display()))?
        .trim()
        .to_string();
    if api_key.is_empty() {
        bail!("{} is empty", config.api_key_path.display());
    }

    // always start from a fresh file
    if config.output_path.exists() {
        std::fs::remove_file(&config.output_path)?;
    }
    let dict = DictionaryFile::open(&config.output_path, &OpenConfig::default())?;

    let stored = pipeline::run(config, api_key, dict).await?;
    tracing::info!(stored, "dictionary build finished");
    Ok(())
}
