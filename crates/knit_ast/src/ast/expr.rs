use crate::{Atom, ImportRecordIdx, ScopeId, Span};

use super::{Class, Function, Ident, IdentName, Lit, MethodKind, Pat, PrivateName, PropKey, Stmt};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Ident(Ident),
  Lit(Lit),
  This(Span),
  /// `import.meta`
  ImportMeta(Span),
  Super(Span),
  Array(ArrayExpr),
  Object(ObjectExpr),
  Fn(FnExpr),
  Arrow(ArrowExpr),
  Class(ClassExpr),
  Unary(UnaryExpr),
  Update(UpdateExpr),
  Binary(BinaryExpr),
  Assign(AssignExpr),
  Cond(CondExpr),
  Call(CallExpr),
  New(CallExpr),
  Member(MemberExpr),
  Seq(SeqExpr),
  Spread(Box<Expr>),
  Await(Box<Expr>, Span),
  Yield(YieldExpr),
  /// `require("literal")`, resolved by the parser to an import record
  Require(RequireExpr),
  /// `import(...)`
  Import(ImportExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExpr {
  pub elems: Vec<Option<Expr>>,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectExpr {
  pub props: Vec<Prop>,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Prop {
  KeyValue(KeyValueProp),
  Method(MethodProp),
  Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyValueProp {
  pub key: PropKey,
  pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodProp {
  pub key: PropKey,
  pub kind: MethodKind,
  pub function: Function,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnExpr {
  pub ident: Option<Ident>,
  pub function: Function,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassExpr {
  pub ident: Option<Ident>,
  pub class: Class,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrowBody {
  Block(Vec<Stmt>),
  Expr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrowExpr {
  pub params: Vec<Pat>,
  pub body: ArrowBody,
  pub is_async: bool,
  pub no_side_effects: bool,
  pub scope: ScopeId,
  pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
  Minus,
  Plus,
  Not,
  Tilde,
  TypeOf,
  Void,
  Delete,
}

impl UnaryOp {
  pub fn as_str(self) -> &'static str {
    match self {
      UnaryOp::Minus => "-",
      UnaryOp::Plus => "+",
      UnaryOp::Not => "!",
      UnaryOp::Tilde => "~",
      UnaryOp::TypeOf => "typeof",
      UnaryOp::Void => "void",
      UnaryOp::Delete => "delete",
    }
  }

  pub fn is_keyword(self) -> bool {
    matches!(self, UnaryOp::TypeOf | UnaryOp::Void | UnaryOp::Delete)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
  pub op: UnaryOp,
  pub arg: Box<Expr>,
  pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
  Increment,
  Decrement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateExpr {
  pub op: UpdateOp,
  pub prefix: bool,
  pub arg: Box<Expr>,
  pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  EqEq,
  NotEq,
  EqEqEq,
  NotEqEq,
  Lt,
  LtEq,
  Gt,
  GtEq,
  LShift,
  RShift,
  ZeroFillRShift,
  Add,
  Sub,
  Mul,
  Div,
  Mod,
  Exp,
  BitOr,
  BitXor,
  BitAnd,
  In,
  InstanceOf,
  LogicalOr,
  LogicalAnd,
  NullishCoalescing,
}

impl BinaryOp {
  pub fn as_str(self) -> &'static str {
    match self {
      BinaryOp::EqEq => "==",
      BinaryOp::NotEq => "!=",
      BinaryOp::EqEqEq => "===",
      BinaryOp::NotEqEq => "!==",
      BinaryOp::Lt => "<",
      BinaryOp::LtEq => "<=",
      BinaryOp::Gt => ">",
      BinaryOp::GtEq => ">=",
      BinaryOp::LShift => "<<",
      BinaryOp::RShift => ">>",
      BinaryOp::ZeroFillRShift => ">>>",
      BinaryOp::Add => "+",
      BinaryOp::Sub => "-",
      BinaryOp::Mul => "*",
      BinaryOp::Div => "/",
      BinaryOp::Mod => "%",
      BinaryOp::Exp => "**",
      BinaryOp::BitOr => "|",
      BinaryOp::BitXor => "^",
      BinaryOp::BitAnd => "&",
      BinaryOp::In => "in",
      BinaryOp::InstanceOf => "instanceof",
      BinaryOp::LogicalOr => "||",
      BinaryOp::LogicalAnd => "&&",
      BinaryOp::NullishCoalescing => "??",
    }
  }

  pub fn precedence(self) -> u8 {
    match self {
      BinaryOp::NullishCoalescing => 4,
      BinaryOp::LogicalOr => 4,
      BinaryOp::LogicalAnd => 5,
      BinaryOp::BitOr => 6,
      BinaryOp::BitXor => 7,
      BinaryOp::BitAnd => 8,
      BinaryOp::EqEq | BinaryOp::NotEq | BinaryOp::EqEqEq | BinaryOp::NotEqEq => 9,
      BinaryOp::Lt
      | BinaryOp::LtEq
      | BinaryOp::Gt
      | BinaryOp::GtEq
      | BinaryOp::In
      | BinaryOp::InstanceOf => 10,
      BinaryOp::LShift | BinaryOp::RShift | BinaryOp::ZeroFillRShift => 11,
      BinaryOp::Add | BinaryOp::Sub => 12,
      BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 13,
      BinaryOp::Exp => 14,
    }
  }

  pub fn is_equality(self) -> bool {
    matches!(
      self,
      BinaryOp::EqEq | BinaryOp::NotEq | BinaryOp::EqEqEq | BinaryOp::NotEqEq
    )
  }

  pub fn is_comparison(self) -> bool {
    self.is_equality()
      || matches!(
        self,
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq
      )
  }

  pub fn is_logical(self) -> bool {
    matches!(
      self,
      BinaryOp::LogicalOr | BinaryOp::LogicalAnd | BinaryOp::NullishCoalescing
    )
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
  pub op: BinaryOp,
  pub left: Box<Expr>,
  pub right: Box<Expr>,
  pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
  Assign,
  AddAssign,
  SubAssign,
  MulAssign,
  DivAssign,
  ModAssign,
  ExpAssign,
  LShiftAssign,
  RShiftAssign,
  ZeroFillRShiftAssign,
  BitOrAssign,
  BitXorAssign,
  BitAndAssign,
  OrAssign,
  AndAssign,
  NullishAssign,
}

impl AssignOp {
  pub fn as_str(self) -> &'static str {
    match self {
      AssignOp::Assign => "=",
      AssignOp::AddAssign => "+=",
      AssignOp::SubAssign => "-=",
      AssignOp::MulAssign => "*=",
      AssignOp::DivAssign => "/=",
      AssignOp::ModAssign => "%=",
      AssignOp::ExpAssign => "**=",
      AssignOp::LShiftAssign => "<<=",
      AssignOp::RShiftAssign => ">>=",
      AssignOp::ZeroFillRShiftAssign => ">>>=",
      AssignOp::BitOrAssign => "|=",
      AssignOp::BitXorAssign => "^=",
      AssignOp::BitAndAssign => "&=",
      AssignOp::OrAssign => "||=",
      AssignOp::AndAssign => "&&=",
      AssignOp::NullishAssign => "??=",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
  Ident(Ident),
  Member(MemberExpr),
  /// Destructuring assignment
  Pat(Pat),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignExpr {
  pub op: AssignOp,
  pub target: AssignTarget,
  pub value: Box<Expr>,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CondExpr {
  pub test: Box<Expr>,
  pub cons: Box<Expr>,
  pub alt: Box<Expr>,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
  pub callee: Box<Expr>,
  pub args: Vec<Expr>,
  /// Annotated with `/* @__PURE__ */`
  pub is_pure: bool,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberProp {
  Ident(IdentName),
  Computed(Box<Expr>),
  Private(PrivateName),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
  pub object: Box<Expr>,
  pub prop: MemberProp,
  pub span: Span,
}

impl MemberExpr {
  /// `a.b` and `a["b"]` both name the property `b`.
  pub fn static_prop(&self) -> Option<&Atom> {
    match &self.prop {
      MemberProp::Ident(name) => Some(&name.name),
      MemberProp::Computed(expr) => match &**expr {
        Expr::Lit(Lit {
          value: super::LitValue::Str(s),
          ..
        }) => Some(s),
        _ => None,
      },
      MemberProp::Private(_) => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeqExpr {
  pub exprs: Vec<Expr>,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YieldExpr {
  pub arg: Option<Box<Expr>>,
  pub delegate: bool,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequireExpr {
  pub record: ImportRecordIdx,
  pub specifier: Atom,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportExpr {
  pub arg: Box<Expr>,
  /// Set when the argument is a string literal the parser recorded.
  pub record: Option<ImportRecordIdx>,
  pub span: Span,
}

impl Expr {
  pub fn ident(ident: Ident) -> Self {
    Expr::Ident(ident)
  }

  pub fn str(value: impl Into<Atom>) -> Self {
    Expr::Lit(Lit::str(value))
  }

  pub fn void_0() -> Self {
    Expr::Unary(UnaryExpr {
      op: UnaryOp::Void,
      arg: Box::new(Expr::Lit(Lit::num(0.0))),
      span: Span::DUMMY,
    })
  }

  pub fn member(object: Expr, prop: impl Into<Atom>) -> Self {
    Expr::Member(MemberExpr {
      object: Box::new(object),
      prop: MemberProp::Ident(IdentName::new(prop)),
      span: Span::DUMMY,
    })
  }

  pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
    Expr::Call(CallExpr {
      callee: Box::new(callee),
      args,
      is_pure: false,
      span: Span::DUMMY,
    })
  }

  pub fn seq(exprs: Vec<Expr>) -> Self {
    Expr::Seq(SeqExpr {
      exprs,
      span: Span::DUMMY,
    })
  }

  /// `() => expr`
  pub fn arrow_returning(expr: Expr, scope: ScopeId) -> Self {
    Expr::Arrow(ArrowExpr {
      params: vec![],
      body: ArrowBody::Expr(Box::new(expr)),
      is_async: false,
      no_side_effects: false,
      scope,
      span: Span::DUMMY,
    })
  }

  pub fn span(&self) -> Span {
    match self {
      Expr::Ident(e) => e.span,
      Expr::Lit(e) => e.span,
      Expr::This(span) | Expr::ImportMeta(span) | Expr::Super(span) | Expr::Await(_, span) => *span,
      Expr::Array(e) => e.span,
      Expr::Object(e) => e.span,
      Expr::Fn(e) => e.function.span,
      Expr::Arrow(e) => e.span,
      Expr::Class(e) => e.class.span,
      Expr::Unary(e) => e.span,
      Expr::Update(e) => e.span,
      Expr::Binary(e) => e.span,
      Expr::Assign(e) => e.span,
      Expr::Cond(e) => e.span,
      Expr::Call(e) | Expr::New(e) => e.span,
      Expr::Member(e) => e.span,
      Expr::Seq(e) => e.span,
      Expr::Spread(e) => e.span(),
      Expr::Yield(e) => e.span,
      Expr::Require(e) => e.span,
      Expr::Import(e) => e.span,
    }
  }

  pub fn as_ident(&self) -> Option<&Ident> {
    match self {
      Expr::Ident(ident) => Some(ident),
      _ => None,
    }
  }

  /// The static truthiness of the expression, when it has no side effects and is known.
  pub fn known_truthiness(&self) -> Option<bool> {
    match self {
      Expr::Lit(lit) => Some(lit.truthiness()),
      Expr::Unary(UnaryExpr {
        op: UnaryOp::Not,
        arg,
        ..
      }) => arg.known_truthiness().map(|b| !b),
      Expr::Unary(UnaryExpr {
        op: UnaryOp::Void,
        arg,
        ..
      }) if matches!(&**arg, Expr::Lit(_)) => Some(false),
      Expr::Fn(_) | Expr::Arrow(_) => Some(true),
      _ => None,
    }
  }
}
