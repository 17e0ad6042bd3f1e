use std::fmt::Debug;

use knit_ast::SymbolId;

use crate::ModuleIdx;

/// A symbol declared in a specific module.
#[derive(Hash, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SymbolRef {
  pub owner: ModuleIdx,
  pub symbol: SymbolId,
}

impl SymbolRef {
  pub fn new(owner: ModuleIdx, symbol: SymbolId) -> Self {
    Self { owner, symbol }
  }
}

impl From<(ModuleIdx, SymbolId)> for SymbolRef {
  fn from((owner, symbol): (ModuleIdx, SymbolId)) -> Self {
    Self { owner, symbol }
  }
}

impl Debug for SymbolRef {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "SymbolRef({}#{})",
      self.owner.index(),
      self.symbol.index()
    )
  }
}
