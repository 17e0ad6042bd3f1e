use itertools::Itertools;
use knit_ast::Atom;
use knit_common::ModuleId;
use knit_error::CWD;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::{
  chunk::{ChunkGraph, ChunkIdx},
  code_splitter::CodeSplitter,
  finalizer::ChunkFinalizer,
  renamer::{mangle_props, NamingContext, Renamer},
  BuildError, Graph, InputOptions, LegalComments, OutputOptions,
};

#[derive(Debug, Clone)]
pub struct OutputChunk {
  pub name: String,
  pub filename: String,
  pub is_entry: bool,
  pub is_dynamic_entry: bool,
  /// Bundled modules in the order they are printed.
  pub modules: Vec<ModuleId>,
  pub code: String,
  pub exports: Vec<Atom>,
  /// Other chunks and external modules the chunk imports.
  pub imports: Vec<String>,
  pub helpers: Vec<&'static str>,
  /// Collected for `linked` and `external` legal comments.
  pub legal_comments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
  pub filename: String,
  pub content: String,
}

#[derive(Debug, Default)]
pub struct BundleOutput {
  pub chunks: Vec<OutputChunk>,
  pub assets: Vec<Asset>,
  pub warnings: Vec<BuildError>,
}

impl BundleOutput {
  pub fn chunk(&self, filename: &str) -> Option<&OutputChunk> {
    self.chunks.iter().find(|chunk| chunk.filename == filename)
  }
}

#[derive(Debug)]
pub struct Bundle<'a> {
  pub input_options: &'a InputOptions,
  pub output_options: &'a OutputOptions,
  pub graph: &'a Graph,
}

impl<'a> Bundle<'a> {
  pub fn new(
    input_options: &'a InputOptions,
    output_options: &'a OutputOptions,
    graph: &'a Graph,
  ) -> Self {
    Self {
      input_options,
      output_options,
      graph,
    }
  }

  #[tracing::instrument(skip_all)]
  pub fn generate(&self) -> (Vec<OutputChunk>, Vec<Asset>) {
    let mut chunk_graph =
      CodeSplitter::new(self.graph, self.input_options, self.output_options).split();
    let props = mangle_props(self.graph, &chunk_graph, self.output_options);

    let mut contexts = chunk_graph
      .chunks
      .raw
      .par_iter()
      .map(|chunk| {
        Renamer::new(self.graph, chunk, self.input_options, self.output_options).rename()
      })
      .collect::<Vec<_>>();
    self.assign_export_aliases(&mut chunk_graph, &contexts);

    let cwd = &self.input_options.cwd;
    let chunk_graph = &chunk_graph;
    let chunks = contexts
      .par_iter_mut()
      .enumerate()
      .map(|(idx, ctx)| {
        // Worker threads don't see the scoped cwd of the caller.
        CWD.set(cwd, || {
          ChunkFinalizer {
            graph: self.graph,
            chunk_graph,
            chunk_idx: ChunkIdx::from_usize(idx),
            props: &props,
            output_options: self.output_options,
          }
          .finalize(ctx)
        })
      })
      .collect::<Vec<_>>();

    let assets = self.legal_assets(&chunks);
    tracing::debug!(
      "generated {:?}",
      chunks.iter().map(|chunk| &chunk.filename).collect_vec()
    );
    (chunks, assets)
  }

  /// Names other chunks import a symbol by: its final name in the declaring chunk, suffixed when
  /// the entry of that chunk already exports the name.
  fn assign_export_aliases(&self, chunk_graph: &mut ChunkGraph, contexts: &[NamingContext]) {
    for (chunk_idx, chunk) in chunk_graph.chunks.iter_mut_enumerated() {
      let ctx = &contexts[chunk_idx.index()];
      let mut taken = chunk
        .entry_module()
        .map(|entry| {
          self
            .graph
            .unambiguous_exports(entry)
            .map(|(name, _)| name.clone())
            .collect::<FxHashSet<_>>()
        })
        .unwrap_or_default();
      for (symbol, alias) in chunk.exports_to_chunks.iter_mut() {
        let canonical = self.graph.canonical_ref(*symbol);
        let name = ctx.name_of(canonical).cloned().unwrap_or_else(|| {
          self.graph.modules[canonical.owner]
            .symbols()
            .name(canonical.symbol)
            .clone()
        });
        let mut candidate = name.clone();
        let mut count = 1;
        while taken.contains(&candidate) {
          candidate = Atom::from(format!("{name}${count}"));
          count += 1;
        }
        taken.insert(candidate.clone());
        *alias = candidate;
      }
    }
  }

  /// `<chunk>.LEGAL.txt` for every chunk with collected legal comments.
  fn legal_assets(&self, chunks: &[OutputChunk]) -> Vec<Asset> {
    if !matches!(
      self.output_options.legal_comments,
      LegalComments::Linked | LegalComments::External
    ) {
      return vec![];
    }
    chunks
      .iter()
      .filter(|chunk| !chunk.legal_comments.is_empty())
      .map(|chunk| Asset {
        filename: format!("{}.LEGAL.txt", chunk.filename),
        content: chunk.legal_comments.iter().map(|comment| format!("{comment}\n")).join(""),
      })
      .collect()
  }
}
