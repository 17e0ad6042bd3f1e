use crate::{Atom, ImportRecordIdx, ScopeId, Span};

use super::{AssignTarget, Class, ClassExpr, Expr, FnExpr, Function, Ident, Pat};

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
  Expr(ExprStmt),
  Var(VarDecl),
  Fn(FnDecl),
  Class(ClassDecl),
  Block(BlockStmt),
  If(IfStmt),
  Return(ReturnStmt),
  Throw(ThrowStmt),
  While(WhileStmt),
  DoWhile(DoWhileStmt),
  For(ForStmt),
  ForInOf(ForInOfStmt),
  Labeled(LabeledStmt),
  Break(Option<Atom>, Span),
  Continue(Option<Atom>, Span),
  Try(TryStmt),
  Switch(SwitchStmt),
  Empty(Span),
  Import(ImportDecl),
  ExportNamed(ExportNamed),
  ExportDecl(ExportDecl),
  ExportDefault(ExportDefault),
  ExportAll(ExportAll),
}

impl Stmt {
  pub fn expr(expr: Expr) -> Self {
    Stmt::Expr(ExprStmt {
      expr,
      span: Span::DUMMY,
    })
  }

  pub fn is_module_decl(&self) -> bool {
    matches!(
      self,
      Stmt::Import(_)
        | Stmt::ExportNamed(_)
        | Stmt::ExportDecl(_)
        | Stmt::ExportDefault(_)
        | Stmt::ExportAll(_)
    )
  }

  pub fn span(&self) -> Span {
    match self {
      Stmt::Expr(s) => s.span,
      Stmt::Var(s) => s.span,
      Stmt::Fn(s) => s.function.span,
      Stmt::Class(s) => s.class.span,
      Stmt::Block(s) => s.span,
      Stmt::If(s) => s.span,
      Stmt::Return(s) => s.span,
      Stmt::Throw(s) => s.span,
      Stmt::While(s) => s.span,
      Stmt::DoWhile(s) => s.span,
      Stmt::For(s) => s.span,
      Stmt::ForInOf(s) => s.span,
      Stmt::Labeled(s) => s.span,
      Stmt::Break(_, span) | Stmt::Continue(_, span) | Stmt::Empty(span) => *span,
      Stmt::Try(s) => s.span,
      Stmt::Switch(s) => s.span,
      Stmt::Import(s) => s.span,
      Stmt::ExportNamed(s) => s.span,
      Stmt::ExportDecl(s) => s.span,
      Stmt::ExportDefault(s) => s.span,
      Stmt::ExportAll(s) => s.span,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
  pub expr: Expr,
  pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
  Var,
  Let,
  Const,
}

impl VarKind {
  pub fn as_str(self) -> &'static str {
    match self {
      VarKind::Var => "var",
      VarKind::Let => "let",
      VarKind::Const => "const",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
  pub kind: VarKind,
  pub decls: Vec<VarDeclarator>,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclarator {
  pub name: Pat,
  pub init: Option<Expr>,
  pub span: Span,
}

impl VarDecl {
  pub fn single(kind: VarKind, name: Ident, init: Option<Expr>) -> Self {
    Self {
      kind,
      decls: vec![VarDeclarator {
        name: Pat::Ident(name),
        init,
        span: Span::DUMMY,
      }],
      span: Span::DUMMY,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
  pub ident: Ident,
  pub function: Function,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
  pub ident: Ident,
  pub class: Class,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStmt {
  pub stmts: Vec<Stmt>,
  pub scope: ScopeId,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
  pub test: Expr,
  pub cons: Box<Stmt>,
  pub alt: Option<Box<Stmt>>,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
  pub arg: Option<Expr>,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThrowStmt {
  pub arg: Expr,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
  pub test: Expr,
  pub body: Box<Stmt>,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoWhileStmt {
  pub body: Box<Stmt>,
  pub test: Expr,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
  Var(VarDecl),
  Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
  pub init: Option<ForInit>,
  pub test: Option<Expr>,
  pub update: Option<Expr>,
  pub body: Box<Stmt>,
  pub scope: ScopeId,
  pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForInOfKind {
  In,
  Of,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForHead {
  Var(VarDecl),
  Target(AssignTarget),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForInOfStmt {
  pub kind: ForInOfKind,
  pub is_await: bool,
  pub left: ForHead,
  pub right: Expr,
  pub body: Box<Stmt>,
  pub scope: ScopeId,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledStmt {
  pub label: Atom,
  pub body: Box<Stmt>,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
  pub param: Option<Pat>,
  pub body: Vec<Stmt>,
  pub scope: ScopeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryStmt {
  pub block: BlockStmt,
  pub handler: Option<CatchClause>,
  pub finalizer: Option<BlockStmt>,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
  /// `None` for `default:`
  pub test: Option<Expr>,
  pub cons: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStmt {
  pub discriminant: Expr,
  pub cases: Vec<SwitchCase>,
  pub scope: ScopeId,
  pub span: Span,
}

/// A name in an import or export clause. Names that are not identifiers are written as strings.
pub type ModuleExportName = Atom;

#[derive(Debug, Clone, PartialEq)]
pub enum ImportSpecifier {
  /// `import { imported as local }`
  Named {
    imported: ModuleExportName,
    local: Ident,
  },
  /// `import local from`
  Default(Ident),
  /// `import * as local from`
  Namespace(Ident),
}

impl ImportSpecifier {
  pub fn local(&self) -> &Ident {
    match self {
      ImportSpecifier::Named { local, .. }
      | ImportSpecifier::Default(local)
      | ImportSpecifier::Namespace(local) => local,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
  pub specifiers: Vec<ImportSpecifier>,
  pub record: Option<ImportRecordIdx>,
  pub source: Atom,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportSpecifier {
  /// `export { local as exported }`. In a re-export, `local.name` is the imported name and
  /// `local.symbol` is a hidden alias the parser declared for it.
  Named {
    local: Ident,
    exported: ModuleExportName,
  },
  /// `export * as exported from`
  Namespace {
    local: Ident,
    exported: ModuleExportName,
  },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportNamed {
  pub specifiers: Vec<ExportSpecifier>,
  pub record: Option<ImportRecordIdx>,
  pub source: Option<Atom>,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
  Var(VarDecl),
  Fn(FnDecl),
  Class(ClassDecl),
}

impl Decl {
  pub fn into_stmt(self) -> Stmt {
    match self {
      Decl::Var(decl) => Stmt::Var(decl),
      Decl::Fn(decl) => Stmt::Fn(decl),
      Decl::Class(decl) => Stmt::Class(decl),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportDecl {
  pub decl: Decl,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
  Expr(Expr),
  Fn(FnExpr),
  Class(ClassExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportDefault {
  /// The symbol holding the default export. It is the function or class name when the
  /// declaration has one, and a generated `<file>_default` otherwise.
  pub local: Ident,
  pub value: DefaultValue,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportAll {
  pub record: Option<ImportRecordIdx>,
  pub source: Atom,
  pub span: Span,
}
