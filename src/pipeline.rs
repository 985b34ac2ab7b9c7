//! Concurrent batch build: one reader feeds words into a bounded queue, a
//! pool of HTTP workers fetches definitions, and a single writer owns the
//! dictionary file. Queue capacities bound memory; closing a channel is the
//! shutdown signal for the stage behind it.

use crate::config::{AddOptions, BuildConfig};
use crate::dict::DictionaryFile;
use anyhow::{anyhow, bail, Context, Result};
use reqwest::StatusCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};

/// Drive the pipeline to completion and return the number of stored
/// definitions. The dictionary file is flushed once, at the end.
pub async fn run(config: BuildConfig, api_key: String, mut dict: DictionaryFile) -> Result<usize> {
    let (word_tx, word_rx) = mpsc::channel::<String>(config.word_queue_depth);
    // Several workers claim words from the one receiver, so it sits behind
    // a mutex; the def queue has a single consumer and needs none.
    let word_rx = Arc::new(Mutex::new(word_rx));
    let (def_tx, mut def_rx) = mpsc::channel::<(String, String)>(config.def_queue_depth);

    let words_path = config.words_path.clone();
    let reader = tokio::spawn(async move {
        let file = tokio::fs::File::open(&words_path)
            .await
            .with_context(|| format!("opening {}", words_path.display()))?;
        let mut lines = BufReader::new(file).lines();
        while let Some(line) = lines.next_line().await? {
            let word = line.trim().to_lowercase();
            if word.is_empty() {
                continue;
            }
            if word_tx.send(word).await.is_err() {
                break; // workers are gone, nothing left to feed
            }
        }
        Ok::<_, anyhow::Error>(())
    });

    let client = reqwest::Client::new();
    let mut workers = Vec::with_capacity(config.http_workers);
    for _ in 0..config.http_workers {
        let word_rx = word_rx.clone();
        let def_tx = def_tx.clone();
        let client = client.clone();
        let host = config.api_host.clone();
        let api_key = api_key.clone();
        workers.push(tokio::spawn(async move {
            loop {
                let word = { word_rx.lock().await.recv().await };
                let Some(word) = word else {
                    break; // reader finished and the queue drained
                };
                let url = lookup_url(&host, &word)?;
                let response = client
                    .get(url)
                    .query(&[("key", api_key.as_str())])
                    .send()
                    .await
                    .with_context(|| format!("requesting definition of {word:?}"))?;
                if response.status() != StatusCode::OK {
                    bail!(
                        "definition request for {word:?} failed with status {}",
                        response.status()
                    );
                }
                let body = response.text().await?;
                if def_tx.send((word, body)).await.is_err() {
                    break; // writer is gone
                }
            }
            Ok::<_, anyhow::Error>(())
        }));
    }
    drop(def_tx); // the writer stops once every worker has hung up

    // The writer alone touches the file; add_word skips flushing and the
    // duplicate check (the word list is deduplicated upstream).
    let writer = tokio::task::spawn_blocking(move || -> Result<usize> {
        let opts = AddOptions {
            flush: false,
            skip_dup_check: true,
        };
        let mut stored = 0usize;
        while let Some((word, body)) = def_rx.blocking_recv() {
            let def = json_to_cbor(&body)
                .with_context(|| format!("transcoding definition of {word:?}"))?;
            dict.add_word_with(word.as_bytes(), &def, opts)?;
            stored += 1;
            if stored % 10 == 0 {
                tracing::info!(stored, "stored definitions");
            }
        }
        dict.flush()?;
        dict.close()?;
        Ok(stored)
    });

    reader.await??;
    for worker in workers {
        worker.await??;
    }
    let stored = writer.await??;
    Ok(stored)
}

fn lookup_url(host: &str, word: &str) -> Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(host)?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("API host {host:?} cannot carry a path"))?
        .pop_if_empty()
        .extend(["api", "v3", "references", "collegiate", "json", word]);
    Ok(url)
}

/// Re-encode an API response body as CBOR. The dictionary file stores the
/// result as an opaque blob.
pub fn json_to_cbor(body: &str) -> Result<Vec<u8>> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let mut out = Vec::new();
    ciborium::ser::into_writer(&value, &mut out)?;
    Ok(out)
}
