use std::fmt::{self, Debug, Formatter};

type BitBlock = u64;

const BLOCK_NBITS: usize = BitBlock::BITS as usize;

/// Growable set of small integers, used for first-sets keyed by symbol index.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct BitSet {
    blocks: Vec<BitBlock>,
}

impl BitSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(num_bits: usize) -> Self {
        Self {
            blocks: vec![0; num_bits.div_ceil(BLOCK_NBITS)],
        }
    }

    pub fn clear(&mut self) {
        self.blocks.iter_mut().for_each(|x| *x = 0);
    }

    /// Returns whether the bit was newly set.
    pub fn insert(&mut self, bit: usize) -> bool {
        let block = bit / BLOCK_NBITS;
        if block >= self.blocks.len() {
            self.blocks.resize(block + 1, 0);
        }
        let mask = 1 << (bit % BLOCK_NBITS);
        let old = self.blocks[block];
        self.blocks[block] |= mask;
        old & mask == 0
    }

    /// Returns whether the set has changed.
    pub fn union_with(&mut self, other: &BitSet) -> bool {
        if other.blocks.len() > self.blocks.len() {
            self.blocks.resize(other.blocks.len(), 0);
        }
        let mut changed = false;
        for (mine, theirs) in self.blocks.iter_mut().zip(&other.blocks) {
            let old = *mine;
            *mine |= theirs;
            changed |= old != *mine;
        }
        changed
    }

    pub fn len(&self) -> usize {
        self.blocks.iter().map(|b| b.count_ones() as usize).sum()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            blocks: &self.blocks,
            bit: 0,
            index: 0,
        }
    }
}

pub struct Iter<'a> {
    blocks: &'a [BitBlock],
    bit: usize,
    index: usize,
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.index < self.blocks.len() {
            if self.bit < BLOCK_NBITS {
                let rest = self.blocks[self.index] & (!0 << self.bit);
                let bit = rest.trailing_zeros() as usize;
                if bit < BLOCK_NBITS {
                    self.bit = bit + 1;
                    return Some(self.index * BLOCK_NBITS + bit);
                }
            }

            self.index += 1;
            self.bit = 0;
        }
        None
    }
}

impl FromIterator<usize> for BitSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = BitSet::new();
        for bit in iter {
            set.insert(bit);
        }
        set
    }
}

impl Debug for BitSet {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
