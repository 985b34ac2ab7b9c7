//! Flushing: the in-place fast path when everything still fits, and the
//! rewrite path that grows the reserved sections, compacts the defs and
//! swaps the new file in with an atomic rename.

use super::{DictionaryFile, OpenMode};
use crate::defs::{self, DEF_HEADER_LEN};
use crate::error::{Result, SdictError};
use crate::layout;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;

impl DictionaryFile {
    /// Write pending words and index entries. Definitions are already on
    /// disk by the time this runs; only the header, index tables and words
    /// section change. Returns whether the file was modified.
    ///
    /// When the new words no longer fit the reserved index slots or the
    /// words section, both are doubled until they do and the whole file is
    /// rewritten through a temp sibling.
    pub fn flush(&mut self) -> Result<bool> {
        let Some(first_new) = self.index.first_new() else {
            self.open_in()?;
            return Ok(false);
        };
        self.open_in_out()?;

        let cur_len = self.index.packed_len(0, first_new);
        let new_len = self.index.packed_len(first_new, self.index.len());

        let old_words_sect_size = self.words_sect_size;
        while (self.words_sect_size as u64) < cur_len + new_len {
            self.words_sect_size = self
                .words_sect_size
                .checked_mul(2)
                .ok_or(SdictError::SectionOverflow("words"))?;
        }
        if self.words_sect_size != old_words_sect_size
            || (self.reserved_words as usize) < self.index.len()
        {
            self.index.finalize()?;
            let old_reserved_words = self.reserved_words;
            while (self.reserved_words as usize) < self.index.len() {
                self.reserved_words = self
                    .reserved_words
                    .checked_mul(2)
                    .ok_or(SdictError::SectionOverflow("index"))?;
            }
            self.rewrite(old_reserved_words, old_words_sect_size)?;
            return Ok(true);
        }

        let inds_off = layout::inds_section_offset();
        let words_off = layout::words_section_offset(self.reserved_words);

        self.file.seek(SeekFrom::Start(inds_off - 4))?;
        layout::write_u32(&mut self.file, self.index.len() as u32)?;

        // pack the new words right after the existing ones
        let mut word_offs = Vec::with_capacity(self.index.len() - first_new);
        self.file.seek(SeekFrom::Start(words_off + cur_len))?;
        let mut written = 0u64;
        for entry in &self.index.entries()[first_new..] {
            word_offs.push(cur_len + written);
            self.file.write_all(&entry.word)?;
            self.file.write_all(&[0])?;
            written += entry.word.len() as u64 + 1;
        }

        // index slots for the tail, 1-based on disk
        self.file.seek(SeekFrom::Start(inds_off + first_new as u64 * 4))?;
        for &off in &word_offs {
            layout::write_u32(&mut self.file, off as u32 + 1)?;
        }
        self.file.seek(SeekFrom::Start(
            inds_off + (self.reserved_words as u64 + first_new as u64) * 4,
        ))?;
        for entry in &self.index.entries()[first_new..] {
            layout::write_u32(&mut self.file, entry.def_ind + 1)?;
        }

        self.index.finalize()?;
        self.open_in()?;
        tracing::debug!(words = self.index.len(), "flushed words in place");
        Ok(true)
    }

    /// Rebuild the whole file under the grown section sizes. Defs are copied
    /// across one by one, deduplicating against what the new file already
    /// holds; candidates are confirmed with a full payload compare before a
    /// record is shared. The temp file replaces the original via rename.
    fn rewrite(&mut self, old_reserved_words: u32, old_words_sect_size: u32) -> Result<()> {
        debug_assert!(self.index.first_new().is_none());
        debug_assert!(self.reserved_words as usize >= self.index.len());

        let tmp_path = {
            let mut os = self.path.clone().into_os_string();
            os.push(".tmp");
            PathBuf::from(os)
        };
        let mut tmp = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;

        tmp.write_all(&layout::MAGIC)?;
        layout::write_u32(&mut tmp, self.reserved_words)?;
        layout::write_u32(&mut tmp, self.words_sect_size)?;
        layout::write_u32(&mut tmp, self.index.len() as u32)?;

        // word index over the sorted entries
        let mut off = 0u64;
        for entry in self.index.entries() {
            layout::write_u32(&mut tmp, off as u32 + 1)?;
            off += entry.word.len() as u64 + 1;
        }
        let free_slots = self.reserved_words as u64 - self.index.len() as u64;
        layout::write_nulls(&mut tmp, free_slots * 4)?;
        // def offsets are only known once the defs have moved; placeholder
        layout::write_nulls(&mut tmp, self.reserved_words as u64 * 4)?;

        let mut written = 0u64;
        for entry in self.index.entries() {
            tmp.write_all(&entry.word)?;
            tmp.write_all(&[0])?;
            written += entry.word.len() as u64 + 1;
        }
        layout::write_nulls(&mut tmp, self.words_sect_size as u64 - written)?;

        if let Some(dedup) = self.dedup.as_mut() {
            dedup.clear();
        }
        let new_defs_start = layout::defs_section_offset(self.reserved_words, self.words_sect_size);
        let old_defs_start = layout::defs_section_offset(old_reserved_words, old_words_sect_size);
        debug_assert_eq!(tmp.stream_position()?, new_defs_start);

        for i in 0..self.index.len() {
            let old_ind = self.index.entries()[i].def_ind;
            let header = defs::read_header(&mut self.file, old_defs_start, old_ind)?;

            let candidates: Vec<u32> = self
                .dedup
                .as_ref()
                .and_then(|d| d.candidates(header.size, header.hash))
                .map(|c| c.to_vec())
                .unwrap_or_default();
            let mut reused = None;
            for cand in candidates {
                let Some(cand_header) =
                    defs::read_header_if_size(&mut tmp, new_defs_start, cand, header.size)?
                else {
                    continue;
                };
                if cand_header.hash != header.hash {
                    continue;
                }
                let equal = defs::payloads_equal(
                    &mut self.file,
                    old_defs_start + old_ind as u64 + DEF_HEADER_LEN,
                    &mut tmp,
                    new_defs_start + cand as u64 + DEF_HEADER_LEN,
                    header.size,
                )?;
                if equal {
                    reused = Some(cand);
                    break;
                }
            }

            let new_ind = match reused {
                Some(ind) => ind,
                None => {
                    let end = tmp.seek(SeekFrom::End(0))?;
                    let new_ind = u32::try_from(end - new_defs_start)
                        .map_err(|_| SdictError::SectionOverflow("defs"))?;
                    layout::write_u32(&mut tmp, header.size)?;
                    layout::write_u64(&mut tmp, header.hash)?;
                    defs::copy_payload(
                        &mut self.file,
                        old_defs_start + old_ind as u64 + DEF_HEADER_LEN,
                        &mut tmp,
                        header.size,
                    )?;
                    if let Some(dedup) = self.dedup.as_mut() {
                        dedup.insert(header.size, header.hash, new_ind);
                    }
                    new_ind
                }
            };
            self.index.entries_mut()[i].def_ind = new_ind;
        }

        // def index, now that every record has its final offset
        tmp.seek(SeekFrom::Start(
            layout::inds_section_offset() + self.reserved_words as u64 * 4,
        ))?;
        for entry in self.index.entries() {
            layout::write_u32(&mut tmp, entry.def_ind + 1)?;
        }

        tmp.sync_all()?;
        drop(tmp);
        // Reopen through the temp path first so the old handle is released,
        // then swap; the new handle follows the inode across the rename.
        self.file = File::open(&tmp_path)?;
        self.mode = OpenMode::Read;
        std::fs::rename(&tmp_path, &self.path)?;

        tracing::info!(
            words = self.index.len(),
            reserved_words = self.reserved_words,
            words_sect_size = self.words_sect_size,
            "rewrote dictionary file"
        );
        Ok(())
    }
}
