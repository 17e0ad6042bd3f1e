use hashlink::LinkedHashMap;
use knit_ast::{Atom, Span, SymbolId, SymbolKind, SymbolTable};
use knit_common::{ModuleId, ModuleIdx, SymbolRef};

use crate::make_legal;

/// A module that stays outside the bundle. It owns one symbol per imported name so that every
/// importer in a chunk shares one local binding.
#[derive(Debug)]
pub struct ExternalModule {
  pub idx: ModuleIdx,
  pub exec_order: usize,
  pub id: ModuleId,
  pub symbols: SymbolTable,
  /// `import_react` for `import * as React from "react"` and for the `require("react")` object of
  /// non-ESM output.
  pub namespace_symbol: SymbolId,
  pub exports: LinkedHashMap<Atom, SymbolId>,
}

impl ExternalModule {
  pub fn new(idx: ModuleIdx, id: ModuleId) -> Self {
    let mut symbols = SymbolTable::new();
    let root = symbols.root_scope();
    let namespace_symbol = symbols.declare(
      format!("import_{}", make_legal(id.stem())),
      SymbolKind::Namespace,
      root,
      Span::DUMMY,
    );
    Self {
      idx,
      exec_order: usize::MAX,
      id,
      symbols,
      namespace_symbol,
      exports: LinkedHashMap::default(),
    }
  }

  pub fn find_exported_symbol(&mut self, exported_name: &Atom) -> SymbolRef {
    if let Some(symbol) = self.exports.get(exported_name) {
      return SymbolRef::new(self.idx, *symbol);
    }
    let hint = if exported_name == "default" {
      format!("{}_default", make_legal(self.id.stem()))
    } else {
      make_legal(exported_name)
    };
    let root = self.symbols.root_scope();
    let symbol = self
      .symbols
      .declare(hint, SymbolKind::Import, root, Span::DUMMY);
    self.exports.insert(exported_name.clone(), symbol);
    SymbolRef::new(self.idx, symbol)
  }

  pub fn namespace_ref(&self) -> SymbolRef {
    SymbolRef::new(self.idx, self.namespace_symbol)
  }
}
