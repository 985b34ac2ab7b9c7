//! The dictionary container: a self-describing binary file mapping words to
//! opaque definition blobs (see `layout` for the exact format). Identical
//! definitions are stored once and shared between words; every record carries
//! an FNV-1a-64 checksum of its payload. Single-writer semantics: one
//! `DictionaryFile` owns the file, nothing else may alias it.

mod flusher;
mod loader;

use crate::config::{AddOptions, OpenConfig};
use crate::dedup::DedupIndex;
use crate::defs;
use crate::error::{Result, SdictError};
use crate::fnv;
use crate::index::IndexTable;
use crate::layout;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenMode {
    Read,
    ReadWrite,
}

pub struct DictionaryFile {
    path: PathBuf,
    file: File,
    mode: OpenMode,
    reserved_words: u32,
    words_sect_size: u32,
    index: IndexTable,
    dedup: Option<DedupIndex>,
    created: bool,
}

impl std::fmt::Debug for DictionaryFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictionaryFile")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("reserved_words", &self.reserved_words)
            .field("words_sect_size", &self.words_sect_size)
            .field("created", &self.created)
            .finish()
    }
}

impl DictionaryFile {
    /// Open an existing dictionary file, or create an empty one when the path
    /// does not exist and `create_if_missing` is set.
    pub fn open(path: impl Into<PathBuf>, config: &OpenConfig) -> Result<Self> {
        let path = path.into();
        match std::fs::metadata(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if !config.create_if_missing {
                    return Err(SdictError::DoesNotExist(path));
                }
                Self::create(path, config.deduplicate)
            }
            Err(e) => Err(e.into()),
            Ok(meta) if !meta.is_file() => Err(SdictError::NotAFile(path)),
            Ok(_) => Self::load(path, config),
        }
    }

    /// Whether open() created a fresh file rather than reading an existing one.
    pub fn created_file(&self) -> bool {
        self.created
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn num_words(&self) -> usize {
        self.index.len()
    }

    pub fn contains(&self, word: &[u8]) -> bool {
        self.index.find(word).is_some()
    }

    /// Look up a word and read its definition. With `verify`, the payload
    /// hash is recomputed and checked against the stored one.
    pub fn find(&mut self, word: &[u8], verify: bool) -> Result<Option<Vec<u8>>> {
        let Some(def_ind) = self.index.find(word) else {
            return Ok(None);
        };
        let defs_start = self.defs_start();
        defs::read_payload(&mut self.file, defs_start, def_ind, verify).map(Some)
    }

    /// Insert a word with its definition, flushing immediately.
    /// Returns false (without touching the file) when the word already exists.
    pub fn add_word(&mut self, word: &[u8], def: &[u8]) -> Result<bool> {
        self.add_word_with(word, def, AddOptions::default())
    }

    /// Insert with explicit flush/dup-check behavior; bulk loads run with
    /// `flush: false, skip_dup_check: true` and call flush() once at the end.
    pub fn add_word_with(&mut self, word: &[u8], def: &[u8], opts: AddOptions) -> Result<bool> {
        if word.is_empty() || word.contains(&0) {
            return Err(SdictError::InvalidWord);
        }
        if def.is_empty() {
            return Err(SdictError::EmptyDef);
        }
        let size = u32::try_from(def.len()).map_err(|_| SdictError::DefTooLarge)?;
        if !opts.skip_dup_check && self.index.find(word).is_some() {
            return Ok(false);
        }

        if let Some(existing) = self.find_existing_def(def, size)? {
            self.index.append(word.to_vec(), existing);
        } else {
            self.open_in_out()?;
            let defs_start = self.defs_start();
            let (def_ind, hash) = defs::append(&mut self.file, defs_start, def)?;
            if let Some(dedup) = self.dedup.as_mut() {
                dedup.insert(size, hash, def_ind);
            }
            self.index.append(word.to_vec(), def_ind);
        }

        if opts.flush {
            self.flush()?;
        }
        Ok(true)
    }

    /// Flush pending words and surface any error; dropping instead flushes
    /// silently.
    pub fn close(mut self) -> Result<()> {
        if self.index.first_new().is_some() {
            self.flush()?;
        }
        Ok(())
    }

    /// Probe the dedup index for a record with this exact payload. The hash
    /// is only computed once a size bucket exists; a candidate whose stored
    /// header matches on size and hash is taken as the same payload.
    fn find_existing_def(&mut self, def: &[u8], size: u32) -> Result<Option<u32>> {
        let Some(dedup) = self.dedup.as_ref() else {
            return Ok(None);
        };
        if !dedup.has_size(size) {
            return Ok(None);
        }
        let hash = fnv::fnv1a(def);
        let Some(candidates) = dedup.candidates(size, hash) else {
            return Ok(None);
        };
        let candidates = candidates.to_vec();
        let defs_start = self.defs_start();
        for def_ind in candidates {
            if let Some(header) =
                defs::read_header_if_size(&mut self.file, defs_start, def_ind, size)?
            {
                if header.hash == hash {
                    return Ok(Some(def_ind));
                }
            }
        }
        Ok(None)
    }

    fn defs_start(&self) -> u64 {
        layout::defs_section_offset(self.reserved_words, self.words_sect_size)
    }

    /// Swap the handle to read-only (the resting state between mutations).
    fn open_in(&mut self) -> Result<()> {
        if self.mode == OpenMode::Read {
            return Ok(());
        }
        self.file = File::open(&self.path)?;
        self.mode = OpenMode::Read;
        Ok(())
    }

    /// Swap the handle to read+write without truncating.
    fn open_in_out(&mut self) -> Result<()> {
        if self.mode == OpenMode::ReadWrite {
            return Ok(());
        }
        self.file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        self.mode = OpenMode::ReadWrite;
        Ok(())
    }
}

impl Drop for DictionaryFile {
    fn drop(&mut self) {
        if self.index.first_new().is_some() {
            if let Err(e) = self.flush() {
                tracing::warn!("flush on drop failed: {e}");
            }
        }
    }
}
