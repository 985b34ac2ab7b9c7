//! Definition records: `{size u32 LE, hash u64 LE, payload[size]}` appended
//! to the defs section. Reads of payload data are batched so that very large
//! definitions never have to sit in memory whole.

use crate::error::{Result, SdictError};
use crate::fnv;
use crate::layout::{self, BATCH_SIZE};
use bytes::BufMut;
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};

pub const DEF_HEADER_LEN: u64 = 4 + 8;

#[derive(Debug, Clone, Copy)]
pub struct DefHeader {
    pub size: u32,
    pub hash: u64,
}

pub fn read_header(file: &mut File, defs_start: u64, def_ind: u32) -> Result<DefHeader> {
    file.seek(SeekFrom::Start(defs_start + def_ind as u64))?;
    let size = layout::read_u32(file)?;
    if size == 0 {
        return Err(SdictError::Corruption("Read 0 definition size"));
    }
    let hash = layout::read_u64(file)?;
    Ok(DefHeader { size, hash })
}

/// Header read for dedup candidates: None when the stored size differs from
/// the expected one (the hash is not read in that case).
pub fn read_header_if_size(
    file: &mut File,
    defs_start: u64,
    def_ind: u32,
    expected_size: u32,
) -> Result<Option<DefHeader>> {
    file.seek(SeekFrom::Start(defs_start + def_ind as u64))?;
    let size = layout::read_u32(file)?;
    if size == 0 {
        return Err(SdictError::Corruption("Read 0 definition size"));
    }
    if size != expected_size {
        return Ok(None);
    }
    let hash = layout::read_u64(file)?;
    Ok(Some(DefHeader { size, hash }))
}

/// Append a record at the end of the file. Returns the new record's offset
/// within the defs section and the payload hash.
pub fn append(file: &mut File, defs_start: u64, def: &[u8]) -> Result<(u32, u64)> {
    let end = file.seek(SeekFrom::End(0))?;
    if end < defs_start {
        return Err(SdictError::Corruption("Incorrect file size (too small)"));
    }
    let def_ind =
        u32::try_from(end - defs_start).map_err(|_| SdictError::SectionOverflow("defs"))?;
    let hash = fnv::fnv1a(def);

    // one buffer, one write
    let mut buf = Vec::with_capacity(DEF_HEADER_LEN as usize + def.len());
    buf.put_u32_le(def.len() as u32);
    buf.put_u64_le(hash);
    buf.put_slice(def);
    file.write_all(&buf)?;

    Ok((def_ind, hash))
}

pub fn read_payload(
    file: &mut File,
    defs_start: u64,
    def_ind: u32,
    verify: bool,
) -> Result<Vec<u8>> {
    let header = read_header(file, defs_start, def_ind)?;
    let mut payload = vec![0u8; header.size as usize];
    layout::read_exact(file, &mut payload)?;
    if verify && fnv::fnv1a(&payload) != header.hash {
        return Err(SdictError::HashMismatch);
    }
    Ok(payload)
}

/// Hash a stored payload in batches. `data_start` is the absolute offset of
/// the payload (past the record header).
pub fn stream_hash(file: &mut File, data_start: u64, size: u32) -> Result<u64> {
    let mut hash = fnv::FNV_OFFSET_BASIS;
    let mut buf = [0u8; BATCH_SIZE];
    file.seek(SeekFrom::Start(data_start))?;
    let mut remaining = size as usize;
    while remaining > 0 {
        let n = remaining.min(BATCH_SIZE);
        layout::read_exact(file, &mut buf[..n])?;
        hash = fnv::fnv1a_with(hash, &buf[..n]);
        remaining -= n;
    }
    Ok(hash)
}

/// Batched byte compare of two stored payloads of equal size, possibly in
/// different files.
pub fn payloads_equal(
    file_a: &mut File,
    a_start: u64,
    file_b: &mut File,
    b_start: u64,
    size: u32,
) -> Result<bool> {
    let mut buf_a = [0u8; BATCH_SIZE];
    let mut buf_b = [0u8; BATCH_SIZE];
    file_a.seek(SeekFrom::Start(a_start))?;
    file_b.seek(SeekFrom::Start(b_start))?;
    let mut remaining = size as usize;
    while remaining > 0 {
        let n = remaining.min(BATCH_SIZE);
        layout::read_exact(file_a, &mut buf_a[..n])?;
        layout::read_exact(file_b, &mut buf_b[..n])?;
        if buf_a[..n] != buf_b[..n] {
            return Ok(false);
        }
        remaining -= n;
    }
    Ok(true)
}

/// Stream a payload from `src` into the current position of `dst`.
pub fn copy_payload(src: &mut File, src_start: u64, dst: &mut File, size: u32) -> Result<()> {
    let mut buf = [0u8; BATCH_SIZE];
    src.seek(SeekFrom::Start(src_start))?;
    let mut remaining = size as usize;
    while remaining > 0 {
        let n = remaining.min(BATCH_SIZE);
        layout::read_exact(src, &mut buf[..n])?;
        dst.write_all(&buf[..n])?;
        remaining -= n;
    }
    Ok(())
}
