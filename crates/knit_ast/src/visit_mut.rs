//! Mutable traversal, mirroring [crate::visit::Visit].

use crate::ast::*;
use crate::{Atom, ScopeId};

pub trait VisitMut: Sized {
  fn visit_mut_program(&mut self, program: &mut Program) {
    self.visit_mut_stmts(&mut program.body)
  }

  fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
    walk_mut_stmts(self, stmts)
  }

  fn visit_mut_stmt(&mut self, stmt: &mut Stmt) {
    walk_mut_stmt(self, stmt)
  }

  fn visit_mut_expr(&mut self, expr: &mut Expr) {
    walk_mut_expr(self, expr)
  }

  fn visit_mut_pat(&mut self, pat: &mut Pat) {
    walk_mut_pat(self, pat)
  }

  fn visit_mut_assign_target(&mut self, target: &mut AssignTarget) {
    walk_mut_assign_target(self, target)
  }

  fn visit_mut_ident(&mut self, _ident: &mut Ident) {}

  fn visit_mut_binding_ident(&mut self, _ident: &mut Ident) {}

  fn visit_mut_function(&mut self, function: &mut Function) {
    walk_mut_function(self, function)
  }

  fn visit_mut_arrow(&mut self, arrow: &mut ArrowExpr) {
    walk_mut_arrow(self, arrow)
  }

  fn visit_mut_class(&mut self, class: &mut Class) {
    walk_mut_class(self, class)
  }

  fn visit_mut_prop_key(&mut self, key: &mut PropKey) {
    walk_mut_prop_key(self, key)
  }

  fn visit_mut_member_prop(&mut self, prop: &mut MemberProp) {
    walk_mut_member_prop(self, prop)
  }

  fn visit_mut_label(&mut self, _label: &mut Atom) {}

  fn visit_mut_private_name(&mut self, _name: &mut PrivateName) {}

  fn visit_mut_block(&mut self, stmts: &mut Vec<Stmt>, _scope: ScopeId) {
    self.visit_mut_stmts(stmts)
  }

  fn visit_mut_var_decl(&mut self, decl: &mut VarDecl) {
    walk_mut_var_decl(self, decl)
  }

  fn visit_mut_labeled(&mut self, stmt: &mut LabeledStmt) {
    self.visit_mut_label(&mut stmt.label);
    self.visit_mut_stmt(&mut stmt.body);
  }

  fn visit_mut_object_prop(&mut self, prop: &mut Prop) {
    walk_mut_object_prop(self, prop)
  }
}

pub fn walk_mut_stmts<V: VisitMut>(v: &mut V, stmts: &mut Vec<Stmt>) {
  stmts.iter_mut().for_each(|stmt| v.visit_mut_stmt(stmt))
}

pub fn walk_mut_var_decl<V: VisitMut>(v: &mut V, decl: &mut VarDecl) {
  for declarator in &mut decl.decls {
    v.visit_mut_pat(&mut declarator.name);
    if let Some(init) = &mut declarator.init {
      v.visit_mut_expr(init);
    }
  }
}

fn walk_mut_block_stmt<V: VisitMut>(v: &mut V, block: &mut BlockStmt) {
  v.visit_mut_block(&mut block.stmts, block.scope)
}

pub fn walk_mut_stmt<V: VisitMut>(v: &mut V, stmt: &mut Stmt) {
  match stmt {
    Stmt::Expr(s) => v.visit_mut_expr(&mut s.expr),
    Stmt::Var(decl) => v.visit_mut_var_decl(decl),
    Stmt::Fn(decl) => {
      v.visit_mut_binding_ident(&mut decl.ident);
      v.visit_mut_function(&mut decl.function);
    }
    Stmt::Class(decl) => {
      v.visit_mut_binding_ident(&mut decl.ident);
      v.visit_mut_class(&mut decl.class);
    }
    Stmt::Block(block) => walk_mut_block_stmt(v, block),
    Stmt::If(s) => {
      v.visit_mut_expr(&mut s.test);
      v.visit_mut_stmt(&mut s.cons);
      if let Some(alt) = &mut s.alt {
        v.visit_mut_stmt(alt);
      }
    }
    Stmt::Return(s) => {
      if let Some(arg) = &mut s.arg {
        v.visit_mut_expr(arg);
      }
    }
    Stmt::Throw(s) => v.visit_mut_expr(&mut s.arg),
    Stmt::While(s) => {
      v.visit_mut_expr(&mut s.test);
      v.visit_mut_stmt(&mut s.body);
    }
    Stmt::DoWhile(s) => {
      v.visit_mut_stmt(&mut s.body);
      v.visit_mut_expr(&mut s.test);
    }
    Stmt::For(s) => {
      match &mut s.init {
        Some(ForInit::Var(decl)) => v.visit_mut_var_decl(decl),
        Some(ForInit::Expr(expr)) => v.visit_mut_expr(expr),
        None => {}
      }
      if let Some(test) = &mut s.test {
        v.visit_mut_expr(test);
      }
      if let Some(update) = &mut s.update {
        v.visit_mut_expr(update);
      }
      v.visit_mut_stmt(&mut s.body);
    }
    Stmt::ForInOf(s) => {
      match &mut s.left {
        ForHead::Var(decl) => v.visit_mut_var_decl(decl),
        ForHead::Target(target) => v.visit_mut_assign_target(target),
      }
      v.visit_mut_expr(&mut s.right);
      v.visit_mut_stmt(&mut s.body);
    }
    Stmt::Labeled(s) => v.visit_mut_labeled(s),
    Stmt::Break(label, _) | Stmt::Continue(label, _) => {
      if let Some(label) = label {
        v.visit_mut_label(label);
      }
    }
    Stmt::Try(s) => {
      walk_mut_block_stmt(v, &mut s.block);
      if let Some(handler) = &mut s.handler {
        if let Some(param) = &mut handler.param {
          v.visit_mut_pat(param);
        }
        v.visit_mut_block(&mut handler.body, handler.scope);
      }
      if let Some(finalizer) = &mut s.finalizer {
        walk_mut_block_stmt(v, finalizer);
      }
    }
    Stmt::Switch(s) => {
      v.visit_mut_expr(&mut s.discriminant);
      for case in &mut s.cases {
        if let Some(test) = &mut case.test {
          v.visit_mut_expr(test);
        }
        v.visit_mut_stmts(&mut case.cons);
      }
    }
    Stmt::Empty(_) => {}
    Stmt::Import(decl) => {
      for specifier in &mut decl.specifiers {
        match specifier {
          ImportSpecifier::Named { local, .. }
          | ImportSpecifier::Default(local)
          | ImportSpecifier::Namespace(local) => v.visit_mut_binding_ident(local),
        }
      }
    }
    Stmt::ExportNamed(decl) => {
      let is_reexport = decl.source.is_some();
      for specifier in &mut decl.specifiers {
        match specifier {
          ExportSpecifier::Named { local, .. } if !is_reexport => v.visit_mut_ident(local),
          ExportSpecifier::Named { local, .. } | ExportSpecifier::Namespace { local, .. } => {
            v.visit_mut_binding_ident(local)
          }
        }
      }
    }
    Stmt::ExportDecl(decl) => match &mut decl.decl {
      Decl::Var(var) => v.visit_mut_var_decl(var),
      Decl::Fn(f) => {
        v.visit_mut_binding_ident(&mut f.ident);
        v.visit_mut_function(&mut f.function);
      }
      Decl::Class(c) => {
        v.visit_mut_binding_ident(&mut c.ident);
        v.visit_mut_class(&mut c.class);
      }
    },
    Stmt::ExportDefault(decl) => {
      v.visit_mut_binding_ident(&mut decl.local);
      match &mut decl.value {
        DefaultValue::Expr(expr) => v.visit_mut_expr(expr),
        DefaultValue::Fn(f) => v.visit_mut_function(&mut f.function),
        DefaultValue::Class(c) => v.visit_mut_class(&mut c.class),
      }
    }
    Stmt::ExportAll(_) => {}
  }
}

pub fn walk_mut_object_prop<V: VisitMut>(v: &mut V, prop: &mut Prop) {
  match prop {
    Prop::KeyValue(kv) => {
      v.visit_mut_prop_key(&mut kv.key);
      v.visit_mut_expr(&mut kv.value);
    }
    Prop::Method(m) => {
      v.visit_mut_prop_key(&mut m.key);
      v.visit_mut_function(&mut m.function);
    }
    Prop::Spread(e) => v.visit_mut_expr(e),
  }
}

pub fn walk_mut_expr<V: VisitMut>(v: &mut V, expr: &mut Expr) {
  match expr {
    Expr::Ident(ident) => v.visit_mut_ident(ident),
    Expr::Lit(_) | Expr::This(_) | Expr::ImportMeta(_) | Expr::Super(_) | Expr::Require(_) => {}
    Expr::Array(arr) => arr
      .elems
      .iter_mut()
      .flatten()
      .for_each(|e| v.visit_mut_expr(e)),
    Expr::Object(obj) => obj
      .props
      .iter_mut()
      .for_each(|prop| v.visit_mut_object_prop(prop)),
    Expr::Fn(f) => {
      if let Some(ident) = &mut f.ident {
        v.visit_mut_binding_ident(ident);
      }
      v.visit_mut_function(&mut f.function);
    }
    Expr::Arrow(arrow) => v.visit_mut_arrow(arrow),
    Expr::Class(c) => {
      if let Some(ident) = &mut c.ident {
        v.visit_mut_binding_ident(ident);
      }
      v.visit_mut_class(&mut c.class);
    }
    Expr::Unary(e) => v.visit_mut_expr(&mut e.arg),
    Expr::Update(e) => v.visit_mut_expr(&mut e.arg),
    Expr::Binary(e) => {
      v.visit_mut_expr(&mut e.left);
      v.visit_mut_expr(&mut e.right);
    }
    Expr::Assign(e) => {
      v.visit_mut_assign_target(&mut e.target);
      v.visit_mut_expr(&mut e.value);
    }
    Expr::Cond(e) => {
      v.visit_mut_expr(&mut e.test);
      v.visit_mut_expr(&mut e.cons);
      v.visit_mut_expr(&mut e.alt);
    }
    Expr::Call(e) | Expr::New(e) => {
      v.visit_mut_expr(&mut e.callee);
      e.args.iter_mut().for_each(|arg| v.visit_mut_expr(arg));
    }
    Expr::Member(e) => {
      v.visit_mut_expr(&mut e.object);
      v.visit_mut_member_prop(&mut e.prop);
    }
    Expr::Seq(e) => e.exprs.iter_mut().for_each(|e| v.visit_mut_expr(e)),
    Expr::Spread(e) | Expr::Await(e, _) => v.visit_mut_expr(e),
    Expr::Yield(e) => {
      if let Some(arg) = &mut e.arg {
        v.visit_mut_expr(arg);
      }
    }
    Expr::Import(e) => v.visit_mut_expr(&mut e.arg),
  }
}

pub fn walk_mut_assign_target<V: VisitMut>(v: &mut V, target: &mut AssignTarget) {
  match target {
    AssignTarget::Ident(ident) => v.visit_mut_ident(ident),
    AssignTarget::Member(member) => {
      v.visit_mut_expr(&mut member.object);
      v.visit_mut_member_prop(&mut member.prop);
    }
    AssignTarget::Pat(pat) => walk_mut_assign_pat(v, pat),
  }
}

fn walk_mut_assign_pat<V: VisitMut>(v: &mut V, pat: &mut Pat) {
  match pat {
    Pat::Ident(ident) => v.visit_mut_ident(ident),
    Pat::Array(arr) => {
      arr
        .elems
        .iter_mut()
        .flatten()
        .for_each(|p| walk_mut_assign_pat(v, p));
      if let Some(rest) = &mut arr.rest {
        walk_mut_assign_pat(v, rest);
      }
    }
    Pat::Object(obj) => {
      for prop in &mut obj.props {
        v.visit_mut_prop_key(&mut prop.key);
        walk_mut_assign_pat(v, &mut prop.value);
      }
      if let Some(rest) = &mut obj.rest {
        walk_mut_assign_pat(v, rest);
      }
    }
    Pat::Assign(assign) => {
      walk_mut_assign_pat(v, &mut assign.left);
      v.visit_mut_expr(&mut assign.right);
    }
    Pat::Expr(expr) => v.visit_mut_expr(expr),
  }
}

pub fn walk_mut_pat<V: VisitMut>(v: &mut V, pat: &mut Pat) {
  match pat {
    Pat::Ident(ident) => v.visit_mut_binding_ident(ident),
    Pat::Array(arr) => {
      arr
        .elems
        .iter_mut()
        .flatten()
        .for_each(|p| v.visit_mut_pat(p));
      if let Some(rest) = &mut arr.rest {
        v.visit_mut_pat(rest);
      }
    }
    Pat::Object(obj) => {
      for prop in &mut obj.props {
        v.visit_mut_prop_key(&mut prop.key);
        v.visit_mut_pat(&mut prop.value);
      }
      if let Some(rest) = &mut obj.rest {
        v.visit_mut_pat(rest);
      }
    }
    Pat::Assign(assign) => {
      v.visit_mut_pat(&mut assign.left);
      v.visit_mut_expr(&mut assign.right);
    }
    Pat::Expr(expr) => v.visit_mut_expr(expr),
  }
}

pub fn walk_mut_function<V: VisitMut>(v: &mut V, function: &mut Function) {
  function.params.iter_mut().for_each(|p| v.visit_mut_pat(p));
  v.visit_mut_block(&mut function.body, function.scope);
}

pub fn walk_mut_arrow<V: VisitMut>(v: &mut V, arrow: &mut ArrowExpr) {
  arrow.params.iter_mut().for_each(|p| v.visit_mut_pat(p));
  match &mut arrow.body {
    ArrowBody::Block(stmts) => v.visit_mut_block(stmts, arrow.scope),
    ArrowBody::Expr(expr) => v.visit_mut_expr(expr),
  }
}

pub fn walk_mut_class<V: VisitMut>(v: &mut V, class: &mut Class) {
  if let Some(super_class) = &mut class.super_class {
    v.visit_mut_expr(super_class);
  }
  for member in &mut class.members {
    match member {
      ClassMember::Method(m) => {
        v.visit_mut_prop_key(&mut m.key);
        v.visit_mut_function(&mut m.function);
      }
      ClassMember::Property(p) => {
        v.visit_mut_prop_key(&mut p.key);
        if let Some(value) = &mut p.value {
          v.visit_mut_expr(value);
        }
      }
      ClassMember::StaticBlock(b) => v.visit_mut_block(&mut b.body, b.scope),
    }
  }
}

pub fn walk_mut_prop_key<V: VisitMut>(v: &mut V, key: &mut PropKey) {
  match key {
    PropKey::Computed(expr) => v.visit_mut_expr(expr),
    PropKey::Private(name) => v.visit_mut_private_name(name),
    PropKey::Ident(_) | PropKey::Str(..) | PropKey::Num(..) => {}
  }
}

pub fn walk_mut_member_prop<V: VisitMut>(v: &mut V, prop: &mut MemberProp) {
  match prop {
    MemberProp::Computed(expr) => v.visit_mut_expr(expr),
    MemberProp::Private(name) => v.visit_mut_private_name(name),
    MemberProp::Ident(_) => {}
  }
}
