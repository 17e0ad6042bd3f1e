use hashlink::{LinkedHashMap, LinkedHashSet};
use knit_ast::Atom;
use knit_common::{EntryBits, ModuleIdx, SymbolRef};
use oxc_index::IndexVec;
use rustc_hash::FxHashMap;

use crate::treeshake::PartIdx;

oxc_index::define_index_type! {
  pub struct ChunkIdx = u32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
  /// The chunk of a user entry or of an `import()` target.
  Entry { module: ModuleIdx, is_user_defined: bool },
  /// Code shared by several entries.
  Common,
}

#[derive(Debug)]
pub struct Chunk {
  pub kind: ChunkKind,
  pub name: String,
  pub filename: String,
  /// The entries whose code this chunk holds.
  pub bits: EntryBits,
  /// Included parts by module, modules in execution order and parts in source order.
  pub modules: LinkedHashMap<ModuleIdx, Vec<PartIdx>>,
  /// Symbols read from other chunks, grouped by the chunk declaring them.
  pub imports_from_chunks: LinkedHashMap<ChunkIdx, LinkedHashSet<SymbolRef>>,
  /// Chunks imported only for their side effects.
  pub side_effect_imports: Vec<ChunkIdx>,
  /// Symbols other chunks read from this one, with the names they are exported under.
  pub exports_to_chunks: LinkedHashMap<SymbolRef, Atom>,
}

impl Chunk {
  pub fn new(kind: ChunkKind, name: String, bits: EntryBits) -> Self {
    Self {
      kind,
      name,
      filename: String::new(),
      bits,
      modules: LinkedHashMap::default(),
      imports_from_chunks: LinkedHashMap::default(),
      side_effect_imports: vec![],
      exports_to_chunks: LinkedHashMap::default(),
    }
  }

  pub fn entry_module(&self) -> Option<ModuleIdx> {
    match self.kind {
      ChunkKind::Entry { module, .. } => Some(module),
      ChunkKind::Common => None,
    }
  }

  pub fn is_user_defined_entry(&self) -> bool {
    matches!(
      self.kind,
      ChunkKind::Entry {
        is_user_defined: true,
        ..
      }
    )
  }

  pub fn is_dynamic_entry(&self) -> bool {
    matches!(
      self.kind,
      ChunkKind::Entry {
        is_user_defined: false,
        ..
      }
    )
  }
}

#[derive(Debug, Default)]
pub struct ChunkGraph {
  pub chunks: IndexVec<ChunkIdx, Chunk>,
  /// The chunk every entry's code starts in, by entry bit.
  pub entry_chunks: Vec<ChunkIdx>,
  /// Where each included part lives. Only filled when code splitting, where a part lives in
  /// exactly one chunk.
  pub part_to_chunk: FxHashMap<(ModuleIdx, PartIdx), ChunkIdx>,
}

impl ChunkGraph {
  pub fn chunk_of_entry(&self, entry: ModuleIdx) -> Option<&Chunk> {
    self
      .chunks
      .iter()
      .find(|chunk| chunk.entry_module() == Some(entry))
  }
}
