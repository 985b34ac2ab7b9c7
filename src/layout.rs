//! On-disk layout of a dictionary file.
//!
//! ```text
//! "SDICT" 0x01 0x00                                  magic (0x01 = version)
//! reserved_words  u32 LE                             > 0, power of two
//! words_sect_size u32 LE                             > 0, power of two
//! num_words       u32 LE                             <= reserved_words
//! word_index[reserved_words]  u32 LE each            1-based; 0 = unassigned
//! def_index[reserved_words]   u32 LE each            1-based; 0 = unassigned
//! words section   words_sect_size bytes              packed NUL-terminated words
//! defs section    unbounded                          {size u32, hash u64, payload}
//! ```
//!
//! All integers are little-endian regardless of host.

use crate::error::{Result, SdictError};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

pub const MAGIC: [u8; 7] = *b"SDICT\x01\x00";

pub const INIT_RESERVED_WORDS: u32 = 32;
pub const INIT_WORDS_SECT_SIZE: u32 = 256;

/// Batch size for streamed definition reads.
pub const BATCH_SIZE: usize = 4096;

pub const fn inds_section_offset() -> u64 {
    MAGIC.len() as u64 + 4 + 4 + 4
}

pub const fn words_section_offset(reserved_words: u32) -> u64 {
    inds_section_offset() + reserved_words as u64 * 4 * 2
}

pub const fn defs_section_offset(reserved_words: u32, words_sect_size: u32) -> u64 {
    words_section_offset(reserved_words) + words_sect_size as u64
}

// Running off the end of a section mid-read means the file is lying about
// its sizes, so EOF surfaces as corruption rather than a plain I/O error.
fn map_eof(e: io::Error) -> SdictError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        SdictError::UnexpectedEof
    } else {
        SdictError::Io(e)
    }
}

pub fn read_u32(r: &mut impl Read) -> Result<u32> {
    r.read_u32::<LittleEndian>().map_err(map_eof)
}

pub fn read_u64(r: &mut impl Read) -> Result<u64> {
    r.read_u64::<LittleEndian>().map_err(map_eof)
}

pub fn read_exact(r: &mut impl Read, buf: &mut [u8]) -> Result<()> {
    r.read_exact(buf).map_err(map_eof)
}

pub fn write_u32(w: &mut impl Write, val: u32) -> Result<()> {
    w.write_u32::<LittleEndian>(val)?;
    Ok(())
}

pub fn write_u64(w: &mut impl Write, val: u64) -> Result<()> {
    w.write_u64::<LittleEndian>(val)?;
    Ok(())
}

/// Zero-fill `count` bytes (unassigned index slots and words-section padding).
pub fn write_nulls(w: &mut impl Write, mut count: u64) -> Result<()> {
    const ZEROS: [u8; 4096] = [0; 4096];
    while count > 0 {
        let n = count.min(ZEROS.len() as u64) as usize;
        w.write_all(&ZEROS[..n])?;
        count -= n as u64;
    }
    Ok(())
}
