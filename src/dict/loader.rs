//! Opening paths: creating an empty file and loading + validating an
//! existing one.

use super::{DictionaryFile, OpenMode};
use crate::config::OpenConfig;
use crate::dedup::DedupIndex;
use crate::defs::{self, DEF_HEADER_LEN};
use crate::error::{Result, SdictError};
use crate::index::{IndexTable, WordEntry};
use crate::layout::{self, INIT_RESERVED_WORDS, INIT_WORDS_SECT_SIZE, MAGIC};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

impl DictionaryFile {
    /// Write a fresh empty file: magic, initial header, zeroed index tables
    /// and words section. The defs section needs no filling since records
    /// are only ever appended to the end.
    pub(super) fn create(path: PathBuf, deduplicate: bool) -> Result<Self> {
        let mut out = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        out.write_all(&MAGIC)?;
        layout::write_u32(&mut out, INIT_RESERVED_WORDS)?;
        layout::write_u32(&mut out, INIT_WORDS_SECT_SIZE)?;
        layout::write_u32(&mut out, 0)?;
        layout::write_nulls(&mut out, INIT_RESERVED_WORDS as u64 * 4 * 2)?;
        layout::write_nulls(&mut out, INIT_WORDS_SECT_SIZE as u64)?;
        out.sync_all()?;
        drop(out);

        Ok(Self {
            file: File::open(&path)?,
            path,
            mode: OpenMode::Read,
            reserved_words: INIT_RESERVED_WORDS,
            words_sect_size: INIT_WORDS_SECT_SIZE,
            index: IndexTable::new(),
            dedup: deduplicate.then(DedupIndex::default),
            created: true,
        })
    }

    pub(super) fn load(path: PathBuf, config: &OpenConfig) -> Result<Self> {
        let mut file = File::open(&path)?;
        let file_size = file.metadata()?.len();

        let mut magic = [0u8; MAGIC.len()];
        layout::read_exact(&mut file, &mut magic)?;
        if magic != MAGIC {
            return Err(SdictError::Corruption("Incorrect magic bytes"));
        }
        let reserved_words = layout::read_u32(&mut file)?;
        if reserved_words == 0 {
            return Err(SdictError::Corruption("Read 0 reserved words"));
        }
        let words_sect_size = layout::read_u32(&mut file)?;
        if words_sect_size == 0 {
            return Err(SdictError::Corruption("Read 0 word section size"));
        }
        let num_words = layout::read_u32(&mut file)?;
        if num_words > reserved_words {
            return Err(SdictError::Corruption(
                "Number of words is greater than total reserved words",
            ));
        }
        if layout::defs_section_offset(reserved_words, words_sect_size) > file_size {
            return Err(SdictError::Corruption(
                "Reported section sizes are greater than file size",
            ));
        }

        // Index tables: nonzero entries are 1-based, zero means unassigned.
        let mut word_inds = Vec::with_capacity(num_words as usize);
        for _ in 0..reserved_words {
            let ind = layout::read_u32(&mut file)?;
            if ind != 0 {
                word_inds.push(ind - 1);
            }
        }
        let mut def_inds = Vec::with_capacity(num_words as usize);
        for _ in 0..reserved_words {
            let ind = layout::read_u32(&mut file)?;
            if ind != 0 {
                def_inds.push(ind - 1);
            }
        }
        if word_inds.len() != num_words as usize || def_inds.len() != num_words as usize {
            return Err(SdictError::Corruption("Incorrect number of valid indices"));
        }

        // Words must each occupy their own slot; defs may be shared.
        let mut pairs: Vec<(u32, u32)> = word_inds.into_iter().zip(def_inds).collect();
        pairs.sort_unstable_by_key(|&(word_off, _)| word_off);
        if pairs.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(SdictError::Corruption("Found repeated indices"));
        }

        let mut words_buf = vec![0u8; words_sect_size as usize];
        layout::read_exact(&mut file, &mut words_buf)?;

        let mut entries = Vec::with_capacity(pairs.len());
        for (word_off, def_ind) in pairs {
            let start = word_off as usize;
            if start >= words_buf.len() {
                return Err(SdictError::Corruption(
                    "Word index points outside the words section",
                ));
            }
            let rest = &words_buf[start..];
            let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
            entries.push(WordEntry {
                word: rest[..end].to_vec(),
                def_ind,
            });
        }

        let mut dict = Self {
            file,
            path,
            mode: OpenMode::Read,
            reserved_words,
            words_sect_size,
            index: IndexTable::from_entries(entries)?,
            dedup: config.deduplicate.then(DedupIndex::default),
            created: false,
        };
        if config.deduplicate || config.verify_defs {
            dict.scan_defs(config.verify_defs)?;
        }
        Ok(dict)
    }

    /// Read every referenced def header, feeding the dedup index and, when
    /// asked, recomputing each payload hash in batches to catch corruption.
    fn scan_defs(&mut self, verify: bool) -> Result<()> {
        let defs_start = self.defs_start();
        for entry in self.index.entries() {
            let header = defs::read_header(&mut self.file, defs_start, entry.def_ind)?;
            if let Some(dedup) = self.dedup.as_mut() {
                dedup.insert(header.size, header.hash, entry.def_ind);
            }
            if verify {
                let data_start = defs_start + entry.def_ind as u64 + DEF_HEADER_LEN;
                let computed = defs::stream_hash(&mut self.file, data_start, header.size)?;
                if computed != header.hash {
                    return Err(SdictError::HashMismatch);
                }
            }
        }
        Ok(())
    }
}
