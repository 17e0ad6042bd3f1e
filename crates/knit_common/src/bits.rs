use std::fmt::Debug;

use smallvec::SmallVec;

/// One bit per entry point. Files and parts reached from several entries end up with several bits
/// set; parts with equal bits share a chunk.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryBits(SmallVec<[u64; 1]>);

impl EntryBits {
  pub fn new(max_bit_count: usize) -> Self {
    Self(SmallVec::from_elem(0, max_bit_count.div_ceil(64)))
  }

  pub fn set(&mut self, bit: usize) {
    let word = bit / 64;
    if word >= self.0.len() {
      self.0.resize(word + 1, 0);
    }
    self.0[word] |= 1u64 << (bit % 64);
  }

  pub fn has(&self, bit: usize) -> bool {
    self
      .0
      .get(bit / 64)
      .map_or(false, |word| word & (1u64 << (bit % 64)) != 0)
  }

  pub fn is_empty(&self) -> bool {
    self.0.iter().all(|word| *word == 0)
  }

  pub fn union(&mut self, other: &Self) {
    if other.0.len() > self.0.len() {
      self.0.resize(other.0.len(), 0);
    }
    self.0.iter_mut().zip(other.0.iter()).for_each(|(a, b)| *a |= b);
  }

  /// Every bit set in `other` is also set in `self`.
  pub fn contains_all(&self, other: &Self) -> bool {
    other
      .0
      .iter()
      .enumerate()
      .all(|(i, b)| self.0.get(i).copied().unwrap_or(0) & b == *b)
  }

  pub fn count(&self) -> u32 {
    self.0.iter().map(|word| word.count_ones()).sum()
  }

  pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
    self.0.iter().enumerate().flat_map(|(i, word)| {
      (0..64)
        .filter(move |bit| word & (1u64 << bit) != 0)
        .map(move |bit| i * 64 + bit)
    })
  }
}

impl Debug for EntryBits {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_set().entries(self.iter_ones()).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn grows_on_demand() {
    let mut bits = EntryBits::new(1);
    assert!(bits.is_empty());
    bits.set(3);
    bits.set(70);
    assert!(bits.has(3));
    assert!(bits.has(70));
    assert!(!bits.has(4));
    assert_eq!(bits.count(), 2);
    assert_eq!(bits.iter_ones().collect::<Vec<_>>(), vec![3, 70]);

    let mut single = EntryBits::new(1);
    single.set(3);
    assert!(bits.contains_all(&single));
    assert!(!single.contains_all(&bits));
  }
}
