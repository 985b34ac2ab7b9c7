use crate::error::{Result, SdictError};

#[derive(Debug, Clone)]
pub struct WordEntry {
    pub word: Vec<u8>,
    /// Offset of the definition record from the start of the defs section.
    /// Starts at 0, despite the on-disk index being 1-based.
    pub def_ind: u32,
}

/// In-memory word index: a sorted prefix plus an unsorted tail of entries
/// appended since the last flush. Lookup binary-searches the prefix and
/// scans the tail; the tail is sorted and merged in at flush time.
#[derive(Debug, Default)]
pub struct IndexTable {
    entries: Vec<WordEntry>,
    first_new: Option<usize>,
}

impl IndexTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from freshly-loaded entries. Sorts them and rejects duplicate
    /// words, which a well-formed file can never contain.
    pub fn from_entries(mut entries: Vec<WordEntry>) -> Result<Self> {
        entries.sort_unstable_by(|a, b| a.word.cmp(&b.word));
        if entries.windows(2).any(|w| w[0].word == w[1].word) {
            return Err(SdictError::Corruption("Found repeated words"));
        }
        Ok(Self {
            entries,
            first_new: None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the first unflushed entry, or None when fully sorted.
    pub fn first_new(&self) -> Option<usize> {
        self.first_new
    }

    pub fn entries(&self) -> &[WordEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [WordEntry] {
        &mut self.entries
    }

    pub fn find(&self, word: &[u8]) -> Option<u32> {
        let sorted_len = self.first_new.unwrap_or(self.entries.len());
        let sorted = &self.entries[..sorted_len];
        if let Ok(i) = sorted.binary_search_by(|e| e.word.as_slice().cmp(word)) {
            return Some(sorted[i].def_ind);
        }
        self.entries[sorted_len..]
            .iter()
            .find(|e| e.word == word)
            .map(|e| e.def_ind)
    }

    pub fn append(&mut self, word: Vec<u8>, def_ind: u32) {
        if self.first_new.is_none() {
            self.first_new = Some(self.entries.len());
        }
        self.entries.push(WordEntry { word, def_ind });
    }

    /// Total packed byte length of entries in `[from, to)`, counting the NUL
    /// terminator each word carries on disk.
    pub fn packed_len(&self, from: usize, to: usize) -> u64 {
        self.entries[from..to]
            .iter()
            .map(|e| e.word.len() as u64 + 1)
            .sum()
    }

    /// Sort the tail and merge it into the prefix. The tail must contain no
    /// duplicates; duplicates against the prefix are the caller's job to
    /// prevent via find().
    pub fn finalize(&mut self) -> Result<()> {
        let Some(first_new) = self.first_new else {
            return Ok(());
        };
        let tail = &mut self.entries[first_new..];
        tail.sort_unstable_by(|a, b| a.word.cmp(&b.word));
        if tail.windows(2).any(|w| w[0].word == w[1].word) {
            return Err(SdictError::RepeatedWords);
        }
        // Two sorted runs; the stable sort detects and merges them.
        self.entries.sort_by(|a, b| a.word.cmp(&b.word));
        self.first_new = None;
        debug_assert!(self.entries.windows(2).all(|w| w[0].word <= w[1].word));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(word: &str, def_ind: u32) -> WordEntry {
        WordEntry {
            word: word.as_bytes().to_vec(),
            def_ind,
        }
    }

    #[test]
    fn find_in_prefix_and_tail() {
        let mut index =
            IndexTable::from_entries(vec![entry("bar", 1), entry("foo", 2)]).unwrap();
        assert_eq!(index.find(b"bar"), Some(1));
        assert_eq!(index.find(b"foo"), Some(2));
        assert_eq!(index.find(b"baz"), None);

        index.append(b"baz".to_vec(), 3);
        assert_eq!(index.first_new(), Some(2));
        assert_eq!(index.find(b"baz"), Some(3));
        assert_eq!(index.find(b"bar"), Some(1));

        index.finalize().unwrap();
        assert_eq!(index.first_new(), None);
        assert_eq!(index.find(b"baz"), Some(3));
        let words: Vec<_> = index.entries().iter().map(|e| e.word.clone()).collect();
        assert_eq!(words, [b"bar".to_vec(), b"baz".to_vec(), b"foo".to_vec()]);
    }

    #[test]
    fn repeated_tail_words_rejected() {
        let mut index = IndexTable::new();
        index.append(b"dup".to_vec(), 0);
        index.append(b"dup".to_vec(), 1);
        assert!(matches!(
            index.finalize(),
            Err(SdictError::RepeatedWords)
        ));
    }

    #[test]
    fn loaded_duplicates_are_corruption() {
        let res = IndexTable::from_entries(vec![entry("a", 0), entry("a", 1)]);
        assert!(matches!(res, Err(SdictError::Corruption(_))));
    }

    #[test]
    fn packed_len_counts_terminators() {
        let index =
            IndexTable::from_entries(vec![entry("ab", 0), entry("cdef", 1)]).unwrap();
        assert_eq!(index.packed_len(0, 2), 3 + 5);
    }
}
