use knit_ast::{
  ast::*,
  visit_mut::{
    walk_mut_arrow, walk_mut_class, walk_mut_function, walk_mut_member_prop, walk_mut_prop_key,
    walk_mut_stmts, VisitMut,
  },
  Atom, SymbolId, SymbolKind,
};
use knit_runtime_helpers::RuntimeHelpers;

use super::{MangledProps, NamingContext};
use crate::{utils::is_keyword, Graph, NormalModule};

/// Writes the final names of one module's statements: symbols, labels, private names and mangled
/// properties. With `keep_names`, renamed functions and classes get their original `name` back.
pub(crate) struct SymbolRenamer<'a> {
  graph: &'a Graph,
  module: &'a NormalModule,
  ctx: &'a NamingContext,
  props: &'a MangledProps,
  keep_names: bool,
  helpers: &'a RuntimeHelpers,
  labels: Vec<(Atom, Atom)>,
  private_scopes: Vec<Vec<(Atom, Atom)>>,
}

impl<'a> SymbolRenamer<'a> {
  pub(crate) fn new(
    graph: &'a Graph,
    module: &'a NormalModule,
    ctx: &'a NamingContext,
    props: &'a MangledProps,
    keep_names: bool,
    helpers: &'a RuntimeHelpers,
  ) -> Self {
    Self {
      graph,
      module,
      ctx,
      props,
      keep_names,
      helpers,
      labels: vec![],
      private_scopes: vec![],
    }
  }

  fn final_name(&self, symbol: SymbolId) -> Option<&'a Atom> {
    let symbol_ref = self.module.symbol_ref(symbol);
    if self.module.symbols.is_top_level(symbol) {
      self.ctx.name_of(self.graph.canonical_ref(symbol_ref))
    } else {
      self.ctx.nested_name_of(symbol_ref)
    }
  }

  fn rename(&self, ident: &mut Ident) {
    if let Some(name) = ident.symbol.and_then(|symbol| self.final_name(symbol)) {
      if ident.name != *name {
        ident.name = name.clone();
      }
    }
  }

  fn mangle(&self, name: &mut IdentName) {
    if let Some(mangled) = self.props.get(&name.name) {
      name.name = mangled.clone();
    }
  }

  fn label_name(&self, depth: usize) -> Option<Atom> {
    let minifier = self.ctx.minifier()?;
    minifier
      .names_from(0)
      .map(|(_, name)| name)
      .filter(|name| !is_keyword(name))
      .nth(depth)
      .map(Atom::from)
  }

  /// Runs `f` with no enclosing labels, since labels do not cross function boundaries.
  fn in_function(&mut self, f: impl FnOnce(&mut Self)) {
    let labels = std::mem::take(&mut self.labels);
    f(self);
    self.labels = labels;
  }

  /// The binding a renamed function or class needs its original name restored on.
  fn renamed_binding(&self, stmt: &Stmt) -> Option<(Atom, Atom)> {
    let ident = match stmt {
      Stmt::Fn(decl) | Stmt::ExportDecl(ExportDecl { decl: Decl::Fn(decl), .. }) => &decl.ident,
      Stmt::Class(decl)
      | Stmt::ExportDecl(ExportDecl {
        decl: Decl::Class(decl),
        ..
      }) => &decl.ident,
      Stmt::ExportDefault(ExportDefault {
        local,
        value: DefaultValue::Fn(_) | DefaultValue::Class(_),
        ..
      }) => local,
      Stmt::Var(decl)
      | Stmt::ExportDecl(ExportDecl {
        decl: Decl::Var(decl),
        ..
      }) => {
        let [declarator] = decl.decls.as_slice() else {
          return None;
        };
        let is_anonymous = matches!(
          &declarator.init,
          Some(Expr::Fn(FnExpr { ident: None, .. }))
            | Some(Expr::Class(ClassExpr { ident: None, .. }))
            | Some(Expr::Arrow(_))
        );
        if !is_anonymous {
          return None;
        }
        declarator.name.as_ident()?
      }
      _ => return None,
    };
    let decl = &self.module.symbols.symbols[ident.symbol?];
    (decl.kind != SymbolKind::Generated && decl.name != ident.name)
      .then(|| (ident.name.clone(), decl.name.clone()))
  }
}

impl<'a> VisitMut for SymbolRenamer<'a> {
  fn visit_mut_ident(&mut self, ident: &mut Ident) {
    self.rename(ident);
  }

  fn visit_mut_binding_ident(&mut self, ident: &mut Ident) {
    self.rename(ident);
  }

  fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
    walk_mut_stmts(self, stmts);
    if !self.keep_names {
      return;
    }
    let mut idx = 0;
    while idx < stmts.len() {
      if let Some((local, original)) = self.renamed_binding(&stmts[idx]) {
        self.helpers.name();
        stmts.insert(idx + 1, knit_ast_template::keep_name(&local, &original));
        idx += 1;
      }
      idx += 1;
    }
  }

  fn visit_mut_function(&mut self, function: &mut Function) {
    self.in_function(|this| walk_mut_function(this, function));
  }

  fn visit_mut_arrow(&mut self, arrow: &mut ArrowExpr) {
    self.in_function(|this| walk_mut_arrow(this, arrow));
  }

  fn visit_mut_class(&mut self, class: &mut Class) {
    let Some(minifier) = self.ctx.minifier() else {
      self.in_function(|this| walk_mut_class(this, class));
      return;
    };
    let offset = self.private_scopes.iter().map(Vec::len).sum::<usize>();
    let mut declared: Vec<(Atom, Atom)> = vec![];
    for member in &class.members {
      let key = match member {
        ClassMember::Method(m) => &m.key,
        ClassMember::Property(p) => &p.key,
        ClassMember::StaticBlock(_) => continue,
      };
      if let PropKey::Private(name) = key {
        if declared.iter().all(|(original, _)| *original != name.name) {
          let renamed = Atom::from(minifier.number_to_name(offset + declared.len()));
          declared.push((name.name.clone(), renamed));
        }
      }
    }
    self.private_scopes.push(declared);
    self.in_function(|this| walk_mut_class(this, class));
    self.private_scopes.pop();
  }

  fn visit_mut_private_name(&mut self, name: &mut PrivateName) {
    let renamed = self
      .private_scopes
      .iter()
      .rev()
      .flat_map(|scope| scope.iter())
      .find(|(original, _)| *original == name.name)
      .map(|(_, renamed)| renamed.clone());
    if let Some(renamed) = renamed {
      name.name = renamed;
    }
  }

  fn visit_mut_labeled(&mut self, stmt: &mut LabeledStmt) {
    let Some(renamed) = self.label_name(self.labels.len()) else {
      self.visit_mut_stmt(&mut stmt.body);
      return;
    };
    self.labels.push((stmt.label.clone(), renamed.clone()));
    stmt.label = renamed;
    self.visit_mut_stmt(&mut stmt.body);
    self.labels.pop();
  }

  fn visit_mut_label(&mut self, label: &mut Atom) {
    if let Some((_, renamed)) = self.labels.iter().rev().find(|(original, _)| original == label) {
      *label = renamed.clone();
    }
  }

  fn visit_mut_prop_key(&mut self, key: &mut PropKey) {
    if let PropKey::Ident(name) = key {
      self.mangle(name);
    }
    walk_mut_prop_key(self, key);
  }

  fn visit_mut_member_prop(&mut self, prop: &mut MemberProp) {
    if let MemberProp::Ident(name) = prop {
      self.mangle(name);
    }
    walk_mut_member_prop(self, prop);
  }
}
