use std::collections::HashMap;

/// Two-level map from definition size and FNV-1a hash to the offsets of
/// records already in the file. Multiple word entries pointing at one def
/// offset is how deduplication shows up on disk.
#[derive(Debug, Default)]
pub struct DedupIndex {
    by_size: HashMap<u32, HashMap<u64, Vec<u32>>>,
}

impl DedupIndex {
    pub fn clear(&mut self) {
        self.by_size.clear();
    }

    /// Cheap pre-check so the caller can skip hashing a payload whose size
    /// has never been stored.
    pub fn has_size(&self, size: u32) -> bool {
        self.by_size.contains_key(&size)
    }

    pub fn candidates(&self, size: u32, hash: u64) -> Option<&[u32]> {
        self.by_size
            .get(&size)?
            .get(&hash)
            .map(|inds| inds.as_slice())
    }

    pub fn insert(&mut self, size: u32, hash: u64, def_ind: u32) {
        self.by_size
            .entry(size)
            .or_default()
            .entry(hash)
            .or_default()
            .push(def_ind);
    }
}
