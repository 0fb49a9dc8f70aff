//! Fixed-capacity bit set used to track covered interactions.

/// A bit set backed by a vector of u64 words.
///
/// Each bit corresponds to an interaction index. The capacity is fixed at construction.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BitSet {
    words: Vec<u64>,
    capacity: usize,
    /// Number of set bits (cached for O(1) len())
    count: usize,
}

impl BitSet {
    const BITS_PER_WORD: usize = 64;

    /// Creates an empty bit set able to hold indices `0..capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(Self::BITS_PER_WORD)],
            capacity,
            count: 0,
        }
    }

    /// Returns the number of set bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true if every index below the capacity is set.
    pub fn is_full(&self) -> bool {
        self.count == self.capacity
    }

    #[inline]
    fn locate(index: usize) -> (usize, u64) {
        (index / Self::BITS_PER_WORD, 1u64 << (index % Self::BITS_PER_WORD))
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        let (word, mask) = Self::locate(index);
        index < self.capacity && self.words[word] & mask != 0
    }

    /// Sets the bit. Returns true if it was previously clear.
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity`.
    #[inline]
    pub fn insert(&mut self, index: usize) -> bool {
        assert!(index < self.capacity, "Index {} out of bounds for capacity {}", index, self.capacity);
        let (word, mask) = Self::locate(index);
        let was_clear = self.words[word] & mask == 0;
        if was_clear {
            self.words[word] |= mask;
            self.count += 1;
        }
        was_clear
    }

    /// Clears the bit. Returns true if it was previously set.
    #[inline]
    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.capacity {
            return false;
        }
        let (word, mask) = Self::locate(index);
        let was_set = self.words[word] & mask != 0;
        if was_set {
            self.words[word] &= !mask;
            self.count -= 1;
        }
        was_set
    }

    /// Returns the smallest clear index `>= from`, if any.
    pub fn next_clear(&self, from: usize) -> Option<usize> {
        let mut index = from;
        while index < self.capacity {
            let (word, _) = Self::locate(index);
            let bits = !self.words[word] >> (index % Self::BITS_PER_WORD);
            if bits != 0 {
                let found = index + bits.trailing_zeros() as usize;
                return (found < self.capacity).then_some(found);
            }
            index = (word + 1) * Self::BITS_PER_WORD;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_insert_remove() {
        let mut bs = BitSet::new(100);
        assert!(bs.is_empty());
        assert!(bs.insert(5));
        assert!(!bs.insert(5));
        assert!(bs.insert(99));
        assert_eq!(bs.len(), 2);
        assert!(bs.contains(5));
        assert!(!bs.contains(6));
        assert!(!bs.contains(1000));
        assert!(bs.remove(5));
        assert!(!bs.remove(5));
        assert_eq!(bs.len(), 1);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_insert_out_of_bounds() {
        BitSet::new(10).insert(10);
    }

    #[test]
    fn test_next_clear() {
        let mut bs = BitSet::new(130);
        for i in 0..128 {
            bs.insert(i);
        }
        assert_eq!(bs.next_clear(0), Some(128));
        bs.remove(64);
        assert_eq!(bs.next_clear(0), Some(64));
        assert_eq!(bs.next_clear(65), Some(128));
        bs.insert(128);
        bs.insert(129);
        bs.insert(64);
        assert!(bs.is_full());
        assert_eq!(bs.next_clear(0), None);
    }
}
