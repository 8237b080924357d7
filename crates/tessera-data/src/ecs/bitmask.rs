// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Implements the multi-word bitmask used for component signatures.

use smallvec::SmallVec;
use std::fmt;
use std::hash::{Hash, Hasher};

const WORD_BITS: u32 = 64;

/// A set of component bit indices packed into 64-bit words.
///
/// The first 128 bits live inline; the mask spills to the heap only once a bit beyond
/// the current capacity is set. Every entity carries one of these as its signature, and
/// every compiled query carries the OR of its required bits, so the membership test in a
/// query is a word-by-word [`is_superset_of`](Bitmask::is_superset_of).
///
/// Two masks compare equal when they hold the same set bits, regardless of how many
/// trailing zero words either one has allocated.
#[derive(Clone, Default)]
pub struct Bitmask {
    words: SmallVec<[u64; 2]>,
}

impl Bitmask {
    /// Creates a new, empty bitmask.
    pub fn new() -> Self {
        Self {
            words: SmallVec::new(),
        }
    }

    /// Creates a bitmask with a single bit set.
    pub fn with_bit(index: u32) -> Self {
        let mut mask = Self::new();
        mask.set(index);
        mask
    }

    /// Sets the bit at the specified index to 1, growing the mask if needed.
    pub fn set(&mut self, index: u32) {
        let word_idx = (index / WORD_BITS) as usize;
        let bit_idx = index % WORD_BITS;

        if word_idx >= self.words.len() {
            self.words.resize(word_idx + 1, 0);
        }

        self.words[word_idx] |= 1 << bit_idx;
    }

    /// Clears the bit at the specified index to 0.
    pub fn clear(&mut self, index: u32) {
        let word_idx = (index / WORD_BITS) as usize;
        let bit_idx = index % WORD_BITS;

        if let Some(word) = self.words.get_mut(word_idx) {
            *word &= !(1 << bit_idx);
        }
    }

    /// Clears every bit. The allocated words are kept.
    pub fn clear_all(&mut self) {
        self.words.iter_mut().for_each(|word| *word = 0);
    }

    /// Returns true if the bit at the specified index is set.
    pub fn contains(&self, index: u32) -> bool {
        let word_idx = (index / WORD_BITS) as usize;
        let bit_idx = index % WORD_BITS;

        self.words
            .get(word_idx)
            .is_some_and(|word| word & (1 << bit_idx) != 0)
    }

    /// Returns the 64-bit word at the specified word index, or 0 past the end.
    pub fn word(&self, word_idx: usize) -> u64 {
        self.words.get(word_idx).copied().unwrap_or(0)
    }

    /// Returns the number of allocated words.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// ORs every bit of `other` into this mask.
    pub fn union_with(&mut self, other: &Bitmask) {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (word, bits) in self.words.iter_mut().zip(other.words.iter()) {
            *word |= bits;
        }
    }

    /// Returns the union of two masks.
    pub fn union(&self, other: &Bitmask) -> Bitmask {
        let mut result = self.clone();
        result.union_with(other);
        result
    }

    /// Returns true if every bit set in `required` is also set in `self`.
    pub fn is_superset_of(&self, required: &Bitmask) -> bool {
        required
            .words
            .iter()
            .enumerate()
            .all(|(i, bits)| self.word(i) & bits == *bits)
    }

    /// Returns true if the two masks share at least one bit.
    pub fn intersects(&self, other: &Bitmask) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .any(|(a, b)| a & b != 0)
    }

    /// Returns true if no bit is set.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|word| *word == 0)
    }

    /// Returns the number of set bits.
    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|word| word.count_ones()).sum()
    }

    /// Iterates over the indices of the set bits in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.words.iter().enumerate().flat_map(|(word_idx, &word)| {
            let base = word_idx as u32 * WORD_BITS;
            let mut remaining = word;
            std::iter::from_fn(move || {
                if remaining == 0 {
                    return None;
                }
                let bit = remaining.trailing_zeros();
                remaining &= remaining - 1;
                Some(base + bit)
            })
        })
    }

    /// The words up to and including the last non-zero one.
    fn significant_words(&self) -> &[u64] {
        let len = self
            .words
            .iter()
            .rposition(|word| *word != 0)
            .map_or(0, |last| last + 1);
        &self.words[..len]
    }
}

impl PartialEq for Bitmask {
    fn eq(&self, other: &Self) -> bool {
        self.significant_words() == other.significant_words()
    }
}

impl Eq for Bitmask {}

impl Hash for Bitmask {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant_words().hash(state);
    }
}

impl fmt::Debug for Bitmask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<u32> for Bitmask {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut mask = Bitmask::new();
        for index in iter {
            mask.set(index);
        }
        mask
    }
}
