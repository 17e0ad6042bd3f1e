//! The subset of the ECMAScript syntax tree that the linker consumes and produces.
//!
//! Every binding and reference identifier carries the [SymbolId] the parser resolved it to, or
//! `None` when it refers to a global that no enclosing scope declares.

mod expr;
mod stmt;

pub use expr::*;
pub use stmt::*;

use crate::{Atom, ScopeId, Span, SymbolId};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
  pub hashbang: Option<Atom>,
  pub directives: Vec<Directive>,
  pub body: Vec<Stmt>,
  /// `/*! ... */`, `@license` and `@preserve` comments, in source order.
  pub legal_comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
  pub value: Atom,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
  /// The full comment text including its delimiters.
  pub text: Atom,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
  pub name: Atom,
  pub symbol: Option<SymbolId>,
  pub span: Span,
}

impl Ident {
  pub fn new(name: impl Into<Atom>, symbol: Option<SymbolId>, span: Span) -> Self {
    Self {
      name: name.into(),
      symbol,
      span,
    }
  }

  /// An identifier referring to a global, like `Object` or a runtime helper.
  pub fn unbound(name: impl Into<Atom>) -> Self {
    Self::new(name, None, Span::DUMMY)
  }
}

/// A property name after `.` or as an object key, never resolved to a symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentName {
  pub name: Atom,
  pub span: Span,
}

impl IdentName {
  pub fn new(name: impl Into<Atom>) -> Self {
    Self {
      name: name.into(),
      span: Span::DUMMY,
    }
  }
}

/// `#name` without the leading `#`.
#[derive(Debug, Clone, PartialEq)]
pub struct PrivateName {
  pub name: Atom,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LitValue {
  Str(Atom),
  Num(f64),
  Bool(bool),
  Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lit {
  pub value: LitValue,
  pub span: Span,
}

impl Lit {
  pub fn str(value: impl Into<Atom>) -> Self {
    Self {
      value: LitValue::Str(value.into()),
      span: Span::DUMMY,
    }
  }

  pub fn num(value: f64) -> Self {
    Self {
      value: LitValue::Num(value),
      span: Span::DUMMY,
    }
  }

  pub fn bool(value: bool) -> Self {
    Self {
      value: LitValue::Bool(value),
      span: Span::DUMMY,
    }
  }

  /// Static truthiness, as used by `if` and `?:`.
  pub fn truthiness(&self) -> bool {
    match &self.value {
      LitValue::Str(s) => !s.is_empty(),
      LitValue::Num(n) => *n != 0.0 && !n.is_nan(),
      LitValue::Bool(b) => *b,
      LitValue::Null => false,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropKey {
  Ident(IdentName),
  Str(Atom, Span),
  Num(f64, Span),
  Computed(Box<Expr>),
  Private(PrivateName),
}

impl PropKey {
  /// The key as a property name when it is known statically.
  pub fn static_name(&self) -> Option<&Atom> {
    match self {
      PropKey::Ident(ident) => Some(&ident.name),
      PropKey::Str(s, _) => Some(s),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
  pub params: Vec<Pat>,
  pub body: Vec<Stmt>,
  pub is_async: bool,
  pub is_generator: bool,
  /// Annotated with `/* @__NO_SIDE_EFFECTS__ */`
  pub no_side_effects: bool,
  pub scope: ScopeId,
  pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
  Method,
  Getter,
  Setter,
  Constructor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
  pub super_class: Option<Box<Expr>>,
  pub members: Vec<ClassMember>,
  pub scope: ScopeId,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassMember {
  Method(ClassMethod),
  Property(ClassProp),
  StaticBlock(StaticBlock),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassMethod {
  pub key: PropKey,
  pub kind: MethodKind,
  pub is_static: bool,
  pub function: Function,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassProp {
  pub key: PropKey,
  pub value: Option<Expr>,
  pub is_static: bool,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticBlock {
  pub body: Vec<Stmt>,
  pub scope: ScopeId,
  pub span: Span,
}

/// Binding patterns. In assignment position the identifiers are references being written.
#[derive(Debug, Clone, PartialEq)]
pub enum Pat {
  Ident(Ident),
  Array(ArrayPat),
  Object(ObjectPat),
  Assign(AssignPat),
  /// A member expression target inside a destructuring assignment
  Expr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayPat {
  pub elems: Vec<Option<Pat>>,
  pub rest: Option<Box<Pat>>,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPat {
  pub props: Vec<ObjectPatProp>,
  pub rest: Option<Box<Pat>>,
  pub span: Span,
}

/// `{ key: value }`. Printed in shorthand form when the key and the bound name agree.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPatProp {
  pub key: PropKey,
  pub value: Pat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignPat {
  pub left: Box<Pat>,
  pub right: Box<Expr>,
  pub span: Span,
}

impl Pat {
  /// Calls `f` on every identifier the pattern binds or writes.
  pub fn for_each_ident<'a>(&'a self, f: &mut impl FnMut(&'a Ident)) {
    match self {
      Pat::Ident(ident) => f(ident),
      Pat::Array(arr) => {
        arr.elems.iter().flatten().for_each(|p| p.for_each_ident(f));
        if let Some(rest) = &arr.rest {
          rest.for_each_ident(f);
        }
      }
      Pat::Object(obj) => {
        obj.props.iter().for_each(|p| p.value.for_each_ident(f));
        if let Some(rest) = &obj.rest {
          rest.for_each_ident(f);
        }
      }
      Pat::Assign(assign) => assign.left.for_each_ident(f),
      Pat::Expr(_) => {}
    }
  }

  pub fn as_ident(&self) -> Option<&Ident> {
    match self {
      Pat::Ident(ident) => Some(ident),
      _ => None,
    }
  }
}
