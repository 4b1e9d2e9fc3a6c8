/// An immutable set of triangle indices stored as a bitset.
///
/// The bits start at the lowest contained index, which is kept as offset. Sparse sets with high
/// indices therefore only pay for the range they actually span.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriangleSet {
    /// The index represented by the first bit.
    offset: u32,

    /// The bits, relative to the offset.
    words: Vec<u64>,

    /// The number of set bits.
    len: usize,
}

impl TriangleSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the set from the given indices. Duplicates are ignored.
    pub fn from_indices<I>(indices: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        let indices: Vec<u32> = indices.into_iter().collect();

        let (offset, last) = match (indices.iter().min(), indices.iter().max()) {
            (Some(min), Some(max)) => (*min, *max),
            _ => return Self::new(),
        };

        let num_words = ((last - offset) as usize) / 64 + 1;
        let mut words = vec![0u64; num_words];
        let mut len = 0;

        for index in indices {
            let bit = (index - offset) as usize;
            let mask = 1u64 << (bit % 64);
            let word = &mut words[bit / 64];

            if *word & mask == 0 {
                *word |= mask;
                len += 1;
            }
        }

        Self { offset, words, len }
    }

    /// Returns the number of indices in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the lowest index of the set, zero for the empty set.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Returns the number of 64 bit words used for storing the bits.
    #[inline]
    pub fn num_words(&self) -> usize {
        self.words.len()
    }

    pub fn contains(&self, index: u32) -> bool {
        if index < self.offset {
            return false;
        }

        let bit = (index - self.offset) as usize;
        match self.words.get(bit / 64) {
            Some(word) => word & (1u64 << (bit % 64)) != 0,
            None => false,
        }
    }

    /// Iterates over the indices in ascending order.
    pub fn iter(&self) -> TriangleSetIter<'_> {
        TriangleSetIter {
            set: self,
            word_index: 0,
            word: self.words.first().copied().unwrap_or(0),
        }
    }
}

/// Ascending iterator over the indices of a [`TriangleSet`].
pub struct TriangleSetIter<'a> {
    set: &'a TriangleSet,
    word_index: usize,

    /// The not yet visited bits of the current word.
    word: u64,
}

impl Iterator for TriangleSetIter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        while self.word == 0 {
            self.word_index += 1;
            self.word = *self.set.words.get(self.word_index)?;
        }

        let bit = self.word.trailing_zeros() as usize;
        self.word &= self.word - 1;

        Some(self.set.offset + (self.word_index * 64 + bit) as u32)
    }
}

impl<'a> IntoIterator for &'a TriangleSet {
    type Item = u32;
    type IntoIter = TriangleSetIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
