/// Byte range of a node in its source file. Synthesized nodes use [Span::DUMMY].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
  pub start: u32,
  pub end: u32,
}

impl Span {
  pub const DUMMY: Span = Span { start: 0, end: 0 };

  pub const fn new(start: u32, end: u32) -> Self {
    Self { start, end }
  }

  pub fn is_dummy(&self) -> bool {
    *self == Self::DUMMY
  }
}
