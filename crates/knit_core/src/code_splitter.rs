use std::{
  hash::{Hash, Hasher},
  path::{Component, Path},
};

use itertools::Itertools;
use knit_common::{EntryBits, UnionFind};
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use sugar_path::SugarPath;

use crate::{
  chunk::{Chunk, ChunkGraph, ChunkIdx, ChunkKind},
  classifier::WrapKind,
  options::file_name::RenderOptions,
  treeshake::PartIdx,
  Graph, InputOptions, NormalModule, OutputOptions,
};

/// `src/pages/home.js` relative to `root` becomes `src_pages_home`.
pub fn uri_to_chunk_name(root: &Path, uri: &Path) -> String {
  let mut relatived = uri.relative(root);
  relatived.set_extension("");
  itertools::Itertools::intersperse(
    relatived
      .components()
      .filter(|com| matches!(com, Component::Normal(_)))
      .filter_map(|seg| seg.as_os_str().to_str()),
    "_",
  )
  .fold(String::new(), |mut acc, seg| {
    acc.push_str(seg);
    acc
  })
}

pub(crate) struct CodeSplitter<'a> {
  graph: &'a Graph,
  input_options: &'a InputOptions,
  output_options: &'a OutputOptions,
}

impl<'a> CodeSplitter<'a> {
  pub(crate) fn new(
    graph: &'a Graph,
    input_options: &'a InputOptions,
    output_options: &'a OutputOptions,
  ) -> Self {
    Self {
      graph,
      input_options,
      output_options,
    }
  }

  #[tracing::instrument(skip_all)]
  pub(crate) fn split(self) -> ChunkGraph {
    let mut chunk_graph = self.create_entry_chunks();
    self.assign_parts(&mut chunk_graph);
    self.gen_file_names(&mut chunk_graph);
    if self.graph.code_splitting {
      self.link_chunks(&mut chunk_graph);
    }
    tracing::debug!(
      "chunks {:#?}",
      chunk_graph
        .chunks
        .iter()
        .map(|chunk| (&chunk.filename, chunk.modules.len()))
        .collect_vec()
    );
    chunk_graph
  }

  fn create_entry_chunks(&self) -> ChunkGraph {
    let entries = self.graph.chunk_entries().collect_vec();
    let mut chunk_graph = ChunkGraph::default();
    for (bit, entry) in entries.iter().enumerate() {
      let mut bits = EntryBits::new(entries.len());
      bits.set(bit);
      let user_name = self
        .graph
        .entries
        .iter()
        .find(|(_, idx)| idx == entry)
        .map(|(name, _)| name.clone());
      let is_user_defined = user_name.is_some();
      let name = user_name.unwrap_or_else(|| {
        uri_to_chunk_name(
          &self.input_options.cwd,
          self.graph.modules[*entry].id().as_path(),
        )
      });
      let idx = chunk_graph.chunks.push(Chunk::new(
        ChunkKind::Entry {
          module: *entry,
          is_user_defined,
        },
        name,
        bits,
      ));
      chunk_graph.entry_chunks.push(idx);
    }
    chunk_graph
  }

  /// Without splitting, every entry gets a copy of what it reaches. With splitting, a part lives in
  /// the chunk of its exact entry set. Wrapped modules move as a whole, and parts assigning to a
  /// top-level binding move with its declaration.
  fn assign_parts(&self, chunk_graph: &mut ChunkGraph) {
    let mut common_chunks: FxHashMap<EntryBits, ChunkIdx> = FxHashMap::default();
    for idx in &self.graph.sorted_modules {
      let Some(module) = self.graph.normal(*idx).filter(|m| m.is_included()) else {
        continue;
      };
      let grouped_bits = if self.graph.code_splitting && module.wrap_kind == WrapKind::None {
        writer_group_bits(module)
      } else {
        FxHashMap::default()
      };
      for (part_idx, part) in module.parts.iter_enumerated() {
        if !part.is_included() {
          continue;
        }
        if !self.graph.code_splitting {
          for bit in part.entry_bits.iter_ones() {
            let chunk = chunk_graph.entry_chunks[bit];
            chunk_graph.chunks[chunk]
              .modules
              .entry(module.idx)
              .or_insert_with(Default::default)
              .push(part_idx);
          }
          continue;
        }

        let bits = if module.wrap_kind == WrapKind::None {
          grouped_bits.get(&part_idx).unwrap_or(&part.entry_bits)
        } else {
          &module.entry_bits
        };
        let chunk = match bits.iter_ones().exactly_one() {
          Ok(bit) => chunk_graph.entry_chunks[bit],
          Err(_) => *common_chunks.entry(bits.clone()).or_insert_with(|| {
            chunk_graph
              .chunks
              .push(Chunk::new(ChunkKind::Common, String::new(), bits.clone()))
          }),
        };
        chunk_graph.chunks[chunk]
          .modules
          .entry(module.idx)
          .or_insert_with(Default::default)
          .push(part_idx);
        chunk_graph.part_to_chunk.insert((module.idx, part_idx), chunk);
      }
    }
  }

  fn content_hash(&self, chunk: &Chunk) -> String {
    let mut hasher = FxHasher::default();
    chunk.bits.iter_ones().for_each(|bit| bit.hash(&mut hasher));
    for module in chunk.modules.keys() {
      self.graph.modules[*module].id().hash(&mut hasher);
    }
    format!("{:08x}", hasher.finish() as u32)
  }

  fn gen_file_names(&self, chunk_graph: &mut ChunkGraph) {
    let mut used = FxHashSet::default();
    for chunk in chunk_graph.chunks.iter_mut() {
      let hash = self.content_hash(chunk);
      let filename = match chunk.kind {
        ChunkKind::Entry { .. } => self.output_options.entry_file_names.render(RenderOptions {
          name: Some(&chunk.name),
          hash: Some(&hash),
        }),
        ChunkKind::Common => {
          chunk.name = format!("chunk-{hash}");
          self.output_options.chunk_file_names.render(RenderOptions {
            name: Some("chunk"),
            hash: Some(&hash),
          })
        }
      };
      chunk.filename = dedupe_file_name(filename, &mut used);
    }
  }

  /// Symbols used across chunks become imports and exports. A chunk also runs every chunk whose
  /// entry set covers its own.
  fn link_chunks(&self, chunk_graph: &mut ChunkGraph) {
    let mut links = vec![];
    for (chunk_idx, chunk) in chunk_graph.chunks.iter_enumerated() {
      let mut used = vec![];
      for (module_idx, parts) in &chunk.modules {
        let Some(module) = self.graph.normal(*module_idx) else {
          continue;
        };
        for part in parts {
          used.extend(self.graph.symbols_used_by_part(module, &module.parts[*part]));
        }
      }
      if let Some(entry) = chunk.entry_module() {
        used.extend(self.graph.export_surface_symbols(entry));
      }
      for symbol in used {
        let Some(owner) = self.graph.normal(symbol.owner) else {
          continue;
        };
        let declaring = owner
          .parts
          .find_parts_where_symbol_declared(symbol.symbol)
          .iter()
          .find_map(|part| chunk_graph.part_to_chunk.get(&(owner.idx, *part)));
        if let Some(declaring) = declaring.filter(|declaring| **declaring != chunk_idx) {
          links.push((chunk_idx, *declaring, symbol));
        }
      }
    }

    for (importer, declaring, symbol) in links {
      chunk_graph.chunks[importer]
        .imports_from_chunks
        .entry(declaring)
        .or_insert_with(Default::default)
        .insert(symbol);
      chunk_graph.chunks[declaring]
        .exports_to_chunks
        .entry(symbol)
        .or_insert_with(Default::default);
    }

    let covering = chunk_graph
      .chunks
      .iter_enumerated()
      .map(|(idx, chunk)| {
        chunk_graph
          .chunks
          .iter_enumerated()
          .filter(|(other, other_chunk)| {
            *other != idx
              && other_chunk.entry_module().is_none()
              && other_chunk.bits.contains_all(&chunk.bits)
              && !chunk.imports_from_chunks.contains_key(other)
          })
          .map(|(other, _)| other)
          .collect_vec()
      })
      .collect_vec();
    for (chunk, side_effect_imports) in chunk_graph.chunks.iter_mut().zip(covering) {
      chunk.side_effect_imports = side_effect_imports;
    }
  }
}

/// An imported binding is read-only, so a part assigning to a top-level binding has to share a
/// chunk with the part declaring it. Each such group gets the union of its members' entry bits.
fn writer_group_bits(module: &NormalModule) -> FxHashMap<PartIdx, EntryBits> {
  let mut groups = UnionFind::<PartIdx>::default();
  let mut grouped = vec![];
  for (part_idx, part) in module.parts.iter_enumerated() {
    if !part.is_included() {
      continue;
    }
    for symbol in &part.written {
      for declaring in module.parts.find_parts_where_symbol_declared(*symbol) {
        if *declaring != part_idx && module.parts[*declaring].is_included() {
          groups.union(&part_idx, declaring);
          grouped.extend([part_idx, *declaring]);
        }
      }
    }
  }
  if grouped.is_empty() {
    return FxHashMap::default();
  }

  let mut bits_of_root: FxHashMap<PartIdx, EntryBits> = FxHashMap::default();
  let roots = grouped
    .into_iter()
    .unique()
    .map(|part| {
      let root = groups.find_root(&part);
      bits_of_root
        .entry(root)
        .or_default()
        .union(&module.parts[part].entry_bits);
      (part, root)
    })
    .collect_vec();
  roots
    .into_iter()
    .map(|(part, root)| (part, bits_of_root[&root].clone()))
    .collect()
}

/// `main.js` taken twice gives `main.js` and `main2.js`.
fn dedupe_file_name(filename: String, used: &mut FxHashSet<String>) -> String {
  if used.insert(filename.clone()) {
    return filename;
  }
  let (stem, ext) = match filename.rfind('.') {
    Some(dot) => filename.split_at(dot),
    None => (filename.as_str(), ""),
  };
  let mut count = 2;
  loop {
    let candidate = format!("{stem}{count}{ext}");
    if used.insert(candidate.clone()) {
      return candidate;
    }
    count += 1;
  }
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use super::*;

  #[test]
  fn chunk_name_from_path() {
    assert_eq!(
      uri_to_chunk_name(
        &PathBuf::from("/project"),
        &PathBuf::from("/project/src/pages/home.js")
      ),
      "src_pages_home"
    );
  }

  #[test]
  fn duplicated_file_names_get_a_counter() {
    let mut used = FxHashSet::default();
    assert_eq!(dedupe_file_name("main.js".into(), &mut used), "main.js");
    assert_eq!(dedupe_file_name("main.js".into(), &mut used), "main2.js");
    assert_eq!(dedupe_file_name("main.js".into(), &mut used), "main3.js");
  }
}

