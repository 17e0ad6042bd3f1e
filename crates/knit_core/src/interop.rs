//! Expressions that read bindings and load modules across the bundle's module boundaries.

use knit_ast::{ast::*, is_identifier_name, Atom, Span};
use knit_common::SymbolRef;
use knit_runtime_helpers::RuntimeHelpers;

use crate::{
  chunk::ChunkGraph,
  classifier::{ExportsKind, WrapKind},
  normal_module::ImportBinding,
  renamer::NamingContext,
  Graph, NormalModule, OutputOptions,
};

pub(crate) struct Interop<'a> {
  pub graph: &'a Graph,
  pub chunk_graph: &'a ChunkGraph,
  pub ctx: &'a NamingContext,
  pub helpers: &'a RuntimeHelpers,
  pub output_options: &'a OutputOptions,
}

impl<'a> Interop<'a> {
  /// The name `symbol` has in this chunk. Symbols the renamer never saw keep their own name.
  pub fn name(&self, symbol: SymbolRef) -> Atom {
    let canonical = self.graph.canonical_ref(symbol);
    self.ctx.name_of(canonical).cloned().unwrap_or_else(|| {
      self.graph.modules[canonical.owner]
        .symbols()
        .name(canonical.symbol)
        .clone()
    })
  }

  pub fn namespace_name(&self, module: &NormalModule) -> Atom {
    self.name(module.symbol_ref(module.namespace_symbol))
  }

  pub fn wrapper_name(&self, module: &NormalModule) -> Option<Atom> {
    module
      .wrapper_symbol
      .map(|symbol| self.name(module.symbol_ref(symbol)))
  }

  /// How the canonical symbol is read in this chunk.
  pub fn reference(&self, canonical: SymbolRef) -> Expr {
    match self.graph.binding_of(canonical) {
      Some(ImportBinding::Property { namespace, name }) => {
        let object = self.reference(self.graph.canonical_ref(*namespace));
        return property(object, name);
      }
      Some(ImportBinding::Undefined) => return Expr::void_0(),
      None => {}
    }
    if let Some(ext) = self.graph.modules[canonical.owner].as_ext() {
      if !self.output_options.format.is_es() && canonical.symbol != ext.namespace_symbol {
        let object = Expr::Ident(Ident::unbound(self.name(ext.namespace_ref())));
        let exported = ext
          .exports
          .iter()
          .find(|(_, symbol)| **symbol == canonical.symbol)
          .map(|(name, _)| name.clone())
          .unwrap_or_else(|| ext.symbols.name(canonical.symbol).clone());
        return property(object, &exported);
      }
    }
    Expr::Ident(Ident::unbound(self.name(canonical)))
  }

  /// Whether `reference` gives something other than the plain local name.
  pub fn needs_rewrite(&self, canonical: SymbolRef) -> bool {
    if self.graph.binding_of(canonical).is_some() {
      return true;
    }
    self.graph.modules[canonical.owner]
      .as_ext()
      .is_some_and(|ext| {
        !self.output_options.format.is_es() && canonical.symbol != ext.namespace_symbol
      })
  }

  /// `init_foo()`, awaited when the initializer is async. `None` for modules that are not lazily
  /// initialized.
  pub fn init_call(&self, target: &NormalModule) -> Option<Expr> {
    if target.wrap_kind != WrapKind::Esm {
      return None;
    }
    let wrapper = self.wrapper_name(target)?;
    let call = knit_ast_template::call_name(&wrapper);
    Some(if target.is_async_init {
      Expr::Await(Box::new(call), Span::DUMMY)
    } else {
      call
    })
  }

  /// `require_foo()`
  pub fn require_wrapper_call(&self, target: &NormalModule) -> Option<Expr> {
    if target.wrap_kind != WrapKind::Cjs {
      return None;
    }
    self
      .wrapper_name(target)
      .map(|wrapper| knit_ast_template::call_name(&wrapper))
  }

  /// What `require("./foo")` turns into when `./foo` is bundled.
  pub fn require(&self, target: &NormalModule) -> Expr {
    if let Some(call) = self.require_wrapper_call(target) {
      return call;
    }
    self.helpers.to_common_js();
    let exports = knit_ast_template::to_common_js(&self.namespace_name(target));
    match self.init_sync_call(target) {
      Some(init) => Expr::seq(vec![init, exports]),
      None => exports,
    }
  }

  fn init_sync_call(&self, target: &NormalModule) -> Option<Expr> {
    if target.wrap_kind != WrapKind::Esm {
      return None;
    }
    self
      .wrapper_name(target)
      .map(|wrapper| knit_ast_template::call_name(&wrapper))
  }

  /// What `import("./foo")` turns into when `./foo` is bundled.
  pub fn dynamic_import(&self, target: &NormalModule) -> Expr {
    if target.is_dynamic_entry {
      if let Some(chunk) = self.chunk_graph.chunk_of_entry(target.idx) {
        return knit_ast_template::dynamic_import_chunk(
          &format!("./{}", chunk.filename),
          target.exports_kind == ExportsKind::Cjs,
        );
      }
    }
    if let Some(call) = self.require_wrapper_call(target) {
      self.helpers.to_esm();
      return knit_ast_template::promise_resolve_then(knit_ast_template::to_esm(call, false));
    }
    let namespace = Expr::Ident(Ident::unbound(self.namespace_name(target)));
    match self.init_sync_call(target) {
      // The wrapper is declared later in the chunk, so the call waits for a tick.
      Some(init) if target.is_async_init => knit_ast_template::then_returning(
        knit_ast_template::promise_resolve_then(init),
        namespace,
      ),
      Some(init) => knit_ast_template::promise_resolve_then(Expr::seq(vec![init, namespace])),
      None => knit_ast_template::promise_resolve_then(namespace),
    }
  }
}

/// `object.name`, or `object["name"]` when `name` is not an identifier.
fn property(object: Expr, name: &Atom) -> Expr {
  if is_identifier_name(name) {
    return Expr::member(object, name.clone());
  }
  Expr::Member(MemberExpr {
    object: Box::new(object),
    prop: MemberProp::Computed(Box::new(Expr::str(name.clone()))),
    span: Span::DUMMY,
  })
}
