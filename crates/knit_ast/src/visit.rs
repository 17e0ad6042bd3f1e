//! Read-only traversal. Override a `visit_*` method and call the matching `walk_*` function to keep
//! descending.

use crate::ast::*;
use crate::{Atom, ScopeId};

pub trait Visit: Sized {
  fn visit_program(&mut self, program: &Program) {
    walk_program(self, program)
  }

  fn visit_stmts(&mut self, stmts: &[Stmt]) {
    walk_stmts(self, stmts)
  }

  fn visit_stmt(&mut self, stmt: &Stmt) {
    walk_stmt(self, stmt)
  }

  fn visit_expr(&mut self, expr: &Expr) {
    walk_expr(self, expr)
  }

  fn visit_pat(&mut self, pat: &Pat) {
    walk_pat(self, pat)
  }

  fn visit_assign_target(&mut self, target: &AssignTarget) {
    walk_assign_target(self, target)
  }

  /// An identifier in reference position, including assignment targets.
  fn visit_ident(&mut self, _ident: &Ident) {}

  /// An identifier in binding position.
  fn visit_binding_ident(&mut self, _ident: &Ident) {}

  fn visit_function(&mut self, function: &Function) {
    walk_function(self, function)
  }

  fn visit_arrow(&mut self, arrow: &ArrowExpr) {
    walk_arrow(self, arrow)
  }

  fn visit_class(&mut self, class: &Class) {
    walk_class(self, class)
  }

  fn visit_prop_key(&mut self, key: &PropKey) {
    walk_prop_key(self, key)
  }

  fn visit_member_prop(&mut self, prop: &MemberProp) {
    walk_member_prop(self, prop)
  }

  fn visit_label(&mut self, _label: &Atom) {}

  fn visit_private_name(&mut self, _name: &PrivateName) {}

  fn visit_block(&mut self, stmts: &[Stmt], _scope: ScopeId) {
    self.visit_stmts(stmts)
  }

  fn visit_var_decl(&mut self, decl: &VarDecl) {
    walk_var_decl(self, decl)
  }
}

pub fn walk_program<V: Visit>(v: &mut V, program: &Program) {
  v.visit_stmts(&program.body)
}

pub fn walk_stmts<V: Visit>(v: &mut V, stmts: &[Stmt]) {
  stmts.iter().for_each(|stmt| v.visit_stmt(stmt))
}

pub fn walk_var_decl<V: Visit>(v: &mut V, decl: &VarDecl) {
  for declarator in &decl.decls {
    v.visit_pat(&declarator.name);
    if let Some(init) = &declarator.init {
      v.visit_expr(init);
    }
  }
}

pub fn walk_stmt<V: Visit>(v: &mut V, stmt: &Stmt) {
  match stmt {
    Stmt::Expr(s) => v.visit_expr(&s.expr),
    Stmt::Var(decl) => v.visit_var_decl(decl),
    Stmt::Fn(decl) => {
      v.visit_binding_ident(&decl.ident);
      v.visit_function(&decl.function);
    }
    Stmt::Class(decl) => {
      v.visit_binding_ident(&decl.ident);
      v.visit_class(&decl.class);
    }
    Stmt::Block(block) => v.visit_block(&block.stmts, block.scope),
    Stmt::If(s) => {
      v.visit_expr(&s.test);
      v.visit_stmt(&s.cons);
      if let Some(alt) = &s.alt {
        v.visit_stmt(alt);
      }
    }
    Stmt::Return(s) => {
      if let Some(arg) = &s.arg {
        v.visit_expr(arg);
      }
    }
    Stmt::Throw(s) => v.visit_expr(&s.arg),
    Stmt::While(s) => {
      v.visit_expr(&s.test);
      v.visit_stmt(&s.body);
    }
    Stmt::DoWhile(s) => {
      v.visit_stmt(&s.body);
      v.visit_expr(&s.test);
    }
    Stmt::For(s) => {
      match &s.init {
        Some(ForInit::Var(decl)) => v.visit_var_decl(decl),
        Some(ForInit::Expr(expr)) => v.visit_expr(expr),
        None => {}
      }
      if let Some(test) = &s.test {
        v.visit_expr(test);
      }
      if let Some(update) = &s.update {
        v.visit_expr(update);
      }
      v.visit_stmt(&s.body);
    }
    Stmt::ForInOf(s) => {
      match &s.left {
        ForHead::Var(decl) => v.visit_var_decl(decl),
        ForHead::Target(target) => v.visit_assign_target(target),
      }
      v.visit_expr(&s.right);
      v.visit_stmt(&s.body);
    }
    Stmt::Labeled(s) => {
      v.visit_label(&s.label);
      v.visit_stmt(&s.body);
    }
    Stmt::Break(label, _) | Stmt::Continue(label, _) => {
      if let Some(label) = label {
        v.visit_label(label);
      }
    }
    Stmt::Try(s) => {
      v.visit_block(&s.block.stmts, s.block.scope);
      if let Some(handler) = &s.handler {
        if let Some(param) = &handler.param {
          v.visit_pat(param);
        }
        v.visit_block(&handler.body, handler.scope);
      }
      if let Some(finalizer) = &s.finalizer {
        v.visit_block(&finalizer.stmts, finalizer.scope);
      }
    }
    Stmt::Switch(s) => {
      v.visit_expr(&s.discriminant);
      for case in &s.cases {
        if let Some(test) = &case.test {
          v.visit_expr(test);
        }
        v.visit_stmts(&case.cons);
      }
    }
    Stmt::Empty(_) => {}
    Stmt::Import(decl) => {
      for specifier in &decl.specifiers {
        v.visit_binding_ident(specifier.local());
      }
    }
    Stmt::ExportNamed(decl) => {
      for specifier in &decl.specifiers {
        match specifier {
          ExportSpecifier::Named { local, .. } if decl.source.is_none() => v.visit_ident(local),
          ExportSpecifier::Named { local, .. } | ExportSpecifier::Namespace { local, .. } => {
            v.visit_binding_ident(local)
          }
        }
      }
    }
    Stmt::ExportDecl(decl) => match &decl.decl {
      Decl::Var(var) => v.visit_var_decl(var),
      Decl::Fn(f) => {
        v.visit_binding_ident(&f.ident);
        v.visit_function(&f.function);
      }
      Decl::Class(c) => {
        v.visit_binding_ident(&c.ident);
        v.visit_class(&c.class);
      }
    },
    Stmt::ExportDefault(decl) => {
      v.visit_binding_ident(&decl.local);
      match &decl.value {
        DefaultValue::Expr(expr) => v.visit_expr(expr),
        DefaultValue::Fn(f) => v.visit_function(&f.function),
        DefaultValue::Class(c) => v.visit_class(&c.class),
      }
    }
    Stmt::ExportAll(_) => {}
  }
}

pub fn walk_expr<V: Visit>(v: &mut V, expr: &Expr) {
  match expr {
    Expr::Ident(ident) => v.visit_ident(ident),
    Expr::Lit(_) | Expr::This(_) | Expr::ImportMeta(_) | Expr::Super(_) | Expr::Require(_) => {}
    Expr::Array(arr) => arr.elems.iter().flatten().for_each(|e| v.visit_expr(e)),
    Expr::Object(obj) => {
      for prop in &obj.props {
        match prop {
          Prop::KeyValue(kv) => {
            v.visit_prop_key(&kv.key);
            v.visit_expr(&kv.value);
          }
          Prop::Method(m) => {
            v.visit_prop_key(&m.key);
            v.visit_function(&m.function);
          }
          Prop::Spread(e) => v.visit_expr(e),
        }
      }
    }
    Expr::Fn(f) => {
      if let Some(ident) = &f.ident {
        v.visit_binding_ident(ident);
      }
      v.visit_function(&f.function);
    }
    Expr::Arrow(arrow) => v.visit_arrow(arrow),
    Expr::Class(c) => {
      if let Some(ident) = &c.ident {
        v.visit_binding_ident(ident);
      }
      v.visit_class(&c.class);
    }
    Expr::Unary(e) => v.visit_expr(&e.arg),
    Expr::Update(e) => v.visit_expr(&e.arg),
    Expr::Binary(e) => {
      v.visit_expr(&e.left);
      v.visit_expr(&e.right);
    }
    Expr::Assign(e) => {
      v.visit_assign_target(&e.target);
      v.visit_expr(&e.value);
    }
    Expr::Cond(e) => {
      v.visit_expr(&e.test);
      v.visit_expr(&e.cons);
      v.visit_expr(&e.alt);
    }
    Expr::Call(e) | Expr::New(e) => {
      v.visit_expr(&e.callee);
      e.args.iter().for_each(|arg| v.visit_expr(arg));
    }
    Expr::Member(e) => {
      v.visit_expr(&e.object);
      v.visit_member_prop(&e.prop);
    }
    Expr::Seq(e) => e.exprs.iter().for_each(|e| v.visit_expr(e)),
    Expr::Spread(e) | Expr::Await(e, _) => v.visit_expr(e),
    Expr::Yield(e) => {
      if let Some(arg) = &e.arg {
        v.visit_expr(arg);
      }
    }
    Expr::Import(e) => v.visit_expr(&e.arg),
  }
}

pub fn walk_assign_target<V: Visit>(v: &mut V, target: &AssignTarget) {
  match target {
    AssignTarget::Ident(ident) => v.visit_ident(ident),
    AssignTarget::Member(member) => {
      v.visit_expr(&member.object);
      v.visit_member_prop(&member.prop);
    }
    AssignTarget::Pat(pat) => walk_assign_pat(v, pat),
  }
}

/// Destructuring assignment: identifiers are references, defaults and keys are expressions.
fn walk_assign_pat<V: Visit>(v: &mut V, pat: &Pat) {
  match pat {
    Pat::Ident(ident) => v.visit_ident(ident),
    Pat::Array(arr) => {
      arr.elems.iter().flatten().for_each(|p| walk_assign_pat(v, p));
      if let Some(rest) = &arr.rest {
        walk_assign_pat(v, rest);
      }
    }
    Pat::Object(obj) => {
      for prop in &obj.props {
        v.visit_prop_key(&prop.key);
        walk_assign_pat(v, &prop.value);
      }
      if let Some(rest) = &obj.rest {
        walk_assign_pat(v, rest);
      }
    }
    Pat::Assign(assign) => {
      walk_assign_pat(v, &assign.left);
      v.visit_expr(&assign.right);
    }
    Pat::Expr(expr) => v.visit_expr(expr),
  }
}

pub fn walk_pat<V: Visit>(v: &mut V, pat: &Pat) {
  match pat {
    Pat::Ident(ident) => v.visit_binding_ident(ident),
    Pat::Array(arr) => {
      arr.elems.iter().flatten().for_each(|p| v.visit_pat(p));
      if let Some(rest) = &arr.rest {
        v.visit_pat(rest);
      }
    }
    Pat::Object(obj) => {
      for prop in &obj.props {
        v.visit_prop_key(&prop.key);
        v.visit_pat(&prop.value);
      }
      if let Some(rest) = &obj.rest {
        v.visit_pat(rest);
      }
    }
    Pat::Assign(assign) => {
      v.visit_pat(&assign.left);
      v.visit_expr(&assign.right);
    }
    Pat::Expr(expr) => v.visit_expr(expr),
  }
}

pub fn walk_function<V: Visit>(v: &mut V, function: &Function) {
  function.params.iter().for_each(|p| v.visit_pat(p));
  v.visit_block(&function.body, function.scope);
}

pub fn walk_arrow<V: Visit>(v: &mut V, arrow: &ArrowExpr) {
  arrow.params.iter().for_each(|p| v.visit_pat(p));
  match &arrow.body {
    ArrowBody::Block(stmts) => v.visit_block(stmts, arrow.scope),
    ArrowBody::Expr(expr) => v.visit_expr(expr),
  }
}

pub fn walk_class<V: Visit>(v: &mut V, class: &Class) {
  if let Some(super_class) = &class.super_class {
    v.visit_expr(super_class);
  }
  for member in &class.members {
    match member {
      ClassMember::Method(m) => {
        v.visit_prop_key(&m.key);
        v.visit_function(&m.function);
      }
      ClassMember::Property(p) => {
        v.visit_prop_key(&p.key);
        if let Some(value) = &p.value {
          v.visit_expr(value);
        }
      }
      ClassMember::StaticBlock(b) => v.visit_block(&b.body, b.scope),
    }
  }
}

pub fn walk_prop_key<V: Visit>(v: &mut V, key: &PropKey) {
  match key {
    PropKey::Computed(expr) => v.visit_expr(expr),
    PropKey::Private(name) => v.visit_private_name(name),
    PropKey::Ident(_) | PropKey::Str(..) | PropKey::Num(..) => {}
  }
}

pub fn walk_member_prop<V: Visit>(v: &mut V, prop: &MemberProp) {
  match prop {
    MemberProp::Computed(expr) => v.visit_expr(expr),
    MemberProp::Private(name) => v.visit_private_name(name),
    MemberProp::Ident(_) => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{Span, SymbolId};

  #[derive(Default)]
  struct Collect {
    refs: Vec<String>,
    bindings: Vec<String>,
  }

  impl Visit for Collect {
    fn visit_ident(&mut self, ident: &Ident) {
      self.refs.push(ident.name.to_string());
    }

    fn visit_binding_ident(&mut self, ident: &Ident) {
      self.bindings.push(ident.name.to_string());
    }
  }

  fn ident(name: &str) -> Ident {
    Ident::new(name, Some(SymbolId::from_usize(0)), Span::DUMMY)
  }

  #[test]
  fn destructuring_assignment_targets_are_references() {
    // [a, b = c] = d
    let stmt = Stmt::expr(Expr::Assign(AssignExpr {
      op: AssignOp::Assign,
      target: AssignTarget::Pat(Pat::Array(ArrayPat {
        elems: vec![
          Some(Pat::Ident(ident("a"))),
          Some(Pat::Assign(AssignPat {
            left: Box::new(Pat::Ident(ident("b"))),
            right: Box::new(Expr::Ident(ident("c"))),
            span: Span::DUMMY,
          })),
        ],
        rest: None,
        span: Span::DUMMY,
      })),
      value: Box::new(Expr::Ident(ident("d"))),
      span: Span::DUMMY,
    }));
    let mut collect = Collect::default();
    collect.visit_stmt(&stmt);
    assert_eq!(collect.refs, vec!["a", "b", "c", "d"]);
    assert!(collect.bindings.is_empty());
  }

  #[test]
  fn declarations_are_bindings() {
    let stmt = Stmt::Var(VarDecl::single(
      VarKind::Let,
      ident("x"),
      Some(Expr::Ident(ident("y"))),
    ));
    let mut collect = Collect::default();
    collect.visit_stmt(&stmt);
    assert_eq!(collect.bindings, vec!["x"]);
    assert_eq!(collect.refs, vec!["y"]);
  }
}
