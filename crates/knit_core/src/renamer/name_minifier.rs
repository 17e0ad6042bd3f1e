use super::char_freq::CharFreq;

const DEFAULT_HEAD: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_$";
const DEFAULT_TAIL: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_$0123456789";

/// Turns a counter into the shortest identifiers first: `a`, `b`, ..., `$`, `aa`, `ba`, ...
#[derive(Debug, Clone)]
pub struct NameMinifier {
  head: Vec<char>,
  tail: Vec<char>,
}

impl Default for NameMinifier {
  fn default() -> Self {
    Self {
      head: DEFAULT_HEAD.chars().collect(),
      tail: DEFAULT_TAIL.chars().collect(),
    }
  }
}

impl NameMinifier {
  /// Characters the output already uses a lot come first, which gzips better.
  pub fn from_char_freq(freq: &CharFreq) -> Self {
    Self {
      head: freq.sort_by_frequency(DEFAULT_HEAD),
      tail: freq.sort_by_frequency(DEFAULT_TAIL),
    }
  }

  pub fn number_to_name(&self, mut i: usize) -> String {
    let mut name = String::new();
    name.push(self.head[i % self.head.len()]);
    i /= self.head.len();
    while i > 0 {
      i -= 1;
      name.push(self.tail[i % self.tail.len()]);
      i /= self.tail.len();
    }
    name
  }

  /// Names in generation order, starting at `from`.
  pub fn names_from(&self, from: usize) -> impl Iterator<Item = (usize, String)> + '_ {
    (from..).map(|i| (i, self.number_to_name(i)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn shortest_names_first() {
    let minifier = NameMinifier::default();
    assert_eq!(minifier.number_to_name(0), "a");
    assert_eq!(minifier.number_to_name(25), "z");
    assert_eq!(minifier.number_to_name(53), "$");
    assert_eq!(minifier.number_to_name(54), "aa");
    assert_eq!(minifier.number_to_name(55), "ba");
    assert_eq!(minifier.number_to_name(54 + 54 * 64), "aaa");
  }

  #[test]
  fn frequent_characters_come_first() {
    let mut freq = CharFreq::default();
    freq.scan("zzzz yyy", 1);
    let minifier = NameMinifier::from_char_freq(&freq);
    assert_eq!(minifier.number_to_name(0), "z");
    assert_eq!(minifier.number_to_name(1), "y");
    assert_eq!(minifier.number_to_name(2), "a");
  }
}
