//! Reference printer for the syntax tree.
//!
//! Readable mode indents with two spaces and puts one statement per line. Minified mode only keeps
//! the whitespace needed to separate tokens.

use crate::ast::*;
use crate::{is_identifier_name, Atom};

const PREC_LOWEST: u8 = 0;
const PREC_COMMA: u8 = 1;
const PREC_ASSIGN: u8 = 2;
const PREC_COND: u8 = 3;
const PREC_PREFIX: u8 = 15;
const PREC_POSTFIX: u8 = 16;
const PREC_CALL: u8 = 18;
const PREC_MEMBER: u8 = 19;
const PREC_PRIMARY: u8 = 20;

#[derive(Debug, Default, Clone, Copy)]
pub struct CodegenOptions {
  pub minify_whitespace: bool,
}

pub fn print_program(program: &Program, options: CodegenOptions) -> String {
  let mut codegen = Codegen::new(options);
  if let Some(hashbang) = &program.hashbang {
    codegen.raw_line(hashbang);
  }
  for directive in &program.directives {
    codegen.directive(&directive.value);
  }
  codegen.print_stmts(&program.body);
  codegen.into_string()
}

pub fn print_expr(expr: &Expr, options: CodegenOptions) -> String {
  let mut codegen = Codegen::new(options);
  codegen.expr(expr, PREC_LOWEST);
  codegen.into_string()
}

pub struct Codegen {
  out: String,
  indent: usize,
  minify: bool,
}

impl Codegen {
  pub fn new(options: CodegenOptions) -> Self {
    Self {
      out: String::new(),
      indent: 0,
      minify: options.minify_whitespace,
    }
  }

  pub fn into_string(self) -> String {
    self.out
  }

  pub fn is_empty(&self) -> bool {
    self.out.is_empty()
  }

  /// Writes `text` followed by a line break, even in minified mode.
  pub fn raw_line(&mut self, text: &str) {
    if !self.out.is_empty() && !self.out.ends_with('\n') {
      self.out.push('\n');
    }
    self.out.push_str(text);
    self.out.push('\n');
  }

  /// A `//` comment on its own line. Dropped in minified mode.
  pub fn comment_line(&mut self, text: &str) {
    if self.minify {
      return;
    }
    self.write_indent();
    self.out.push_str("// ");
    self.out.push_str(text);
    self.out.push('\n');
  }

  pub fn blank_line(&mut self) {
    if !self.minify && !self.out.is_empty() && !self.out.ends_with("\n\n") {
      self.out.push('\n');
    }
  }

  pub fn directive(&mut self, value: &str) {
    self.write_indent();
    self.emit(&quote(value));
    self.emit(";");
    self.newline();
  }

  pub fn print_stmts(&mut self, stmts: &[Stmt]) {
    stmts.iter().for_each(|stmt| self.print_stmt(stmt));
  }

  pub fn print_stmt(&mut self, stmt: &Stmt) {
    self.write_indent();
    self.stmt_inner(stmt);
    self.newline();
  }

  /// Wraps everything printed by `f` in `(() => { ... })();`, optionally assigning the result to
  /// the variable `assign_to`.
  pub fn iife(&mut self, assign_to: Option<&str>, is_async: bool, f: impl FnOnce(&mut Self)) {
    self.write_indent();
    if let Some(name) = assign_to {
      self.emit("var");
      self.emit(name);
      self.space();
      self.emit("=");
      self.space();
    }
    if is_async {
      self.emit("(async");
      self.space();
      self.emit("()");
    } else {
      self.emit("(()");
    }
    self.space();
    self.emit("=>");
    self.space();
    self.emit("{");
    self.newline();
    self.indent += 1;
    f(self);
    self.indent -= 1;
    self.write_indent();
    self.emit("})();");
    self.newline();
  }

  // Low level output

  fn emit(&mut self, token: &str) {
    let (Some(last), Some(first)) = (self.out.chars().last(), token.chars().next()) else {
      self.out.push_str(token);
      return;
    };
    let needs_space = (is_word_char(last) && is_word_char(first))
      || (last == '+' && first == '+')
      || (last == '-' && first == '-')
      || (last == '/' && first == '/');
    if needs_space {
      self.out.push(' ');
    }
    self.out.push_str(token);
  }

  fn space(&mut self) {
    if !self.minify {
      self.out.push(' ');
    }
  }

  fn newline(&mut self) {
    if !self.minify {
      self.out.push('\n');
    }
  }

  fn write_indent(&mut self) {
    if !self.minify {
      for _ in 0..self.indent {
        self.out.push_str("  ");
      }
    }
  }

  fn comma(&mut self) {
    self.emit(",");
    self.space();
  }

  // Statements

  fn block(&mut self, stmts: &[Stmt]) {
    if stmts.is_empty() {
      self.emit("{}");
      return;
    }
    self.emit("{");
    self.newline();
    self.indent += 1;
    self.print_stmts(stmts);
    self.indent -= 1;
    self.write_indent();
    self.emit("}");
  }

  /// Body of `if`, loops and labels.
  fn body(&mut self, stmt: &Stmt) {
    match stmt {
      Stmt::Block(block) => {
        self.space();
        self.block(&block.stmts);
      }
      _ => {
        self.newline();
        self.indent += 1;
        self.write_indent();
        self.stmt_inner(stmt);
        self.indent -= 1;
      }
    }
  }

  fn var_decl(&mut self, decl: &VarDecl) {
    self.emit(decl.kind.as_str());
    self.emit(" ");
    for (i, declarator) in decl.decls.iter().enumerate() {
      if i > 0 {
        self.comma();
      }
      self.pat(&declarator.name);
      if let Some(init) = &declarator.init {
        self.space();
        self.emit("=");
        self.space();
        self.expr(init, PREC_ASSIGN);
      }
    }
  }

  fn stmt_inner(&mut self, stmt: &Stmt) {
    match stmt {
      Stmt::Expr(s) => {
        if starts_ambiguously(&s.expr) {
          self.emit("(");
          self.expr(&s.expr, PREC_LOWEST);
          self.emit(")");
        } else {
          self.expr(&s.expr, PREC_LOWEST);
        }
        self.emit(";");
      }
      Stmt::Var(decl) => {
        self.var_decl(decl);
        self.emit(";");
      }
      Stmt::Fn(decl) => self.function(Some(&decl.ident.name), &decl.function, true),
      Stmt::Class(decl) => self.class(Some(&decl.ident.name), &decl.class),
      Stmt::Block(block) => self.block(&block.stmts),
      Stmt::If(s) => {
        self.emit("if");
        self.space();
        self.emit("(");
        self.expr(&s.test, PREC_LOWEST);
        self.emit(")");
        match &s.alt {
          None => self.body(&s.cons),
          Some(alt) => {
            // A nested `if` without braces would capture our `else`.
            if let Stmt::If(_) = &*s.cons {
              self.space();
              self.block(std::slice::from_ref(&*s.cons));
            } else {
              self.body(&s.cons);
            }
            if matches!(&*s.cons, Stmt::Block(_) | Stmt::If(_)) {
              self.space();
            } else {
              self.newline();
              self.write_indent();
            }
            self.emit("else");
            if let Stmt::If(_) = &**alt {
              self.emit(" ");
              self.stmt_inner(alt);
            } else {
              self.body(alt);
            }
          }
        }
      }
      Stmt::Return(s) => {
        self.emit("return");
        if let Some(arg) = &s.arg {
          self.emit(" ");
          self.expr(arg, PREC_LOWEST);
        }
        self.emit(";");
      }
      Stmt::Throw(s) => {
        self.emit("throw ");
        self.expr(&s.arg, PREC_LOWEST);
        self.emit(";");
      }
      Stmt::While(s) => {
        self.emit("while");
        self.space();
        self.emit("(");
        self.expr(&s.test, PREC_LOWEST);
        self.emit(")");
        self.body(&s.body);
      }
      Stmt::DoWhile(s) => {
        self.emit("do");
        self.body(&s.body);
        if matches!(&*s.body, Stmt::Block(_)) {
          self.space();
        } else {
          self.newline();
          self.write_indent();
        }
        self.emit("while");
        self.space();
        self.emit("(");
        self.expr(&s.test, PREC_LOWEST);
        self.emit(");");
      }
      Stmt::For(s) => {
        self.emit("for");
        self.space();
        self.emit("(");
        match &s.init {
          Some(ForInit::Var(decl)) => self.var_decl(decl),
          Some(ForInit::Expr(expr)) => self.expr(expr, PREC_LOWEST),
          None => {}
        }
        self.emit(";");
        if let Some(test) = &s.test {
          self.space();
          self.expr(test, PREC_LOWEST);
        }
        self.emit(";");
        if let Some(update) = &s.update {
          self.space();
          self.expr(update, PREC_LOWEST);
        }
        self.emit(")");
        self.body(&s.body);
      }
      Stmt::ForInOf(s) => {
        self.emit("for");
        if s.is_await {
          self.emit(" await");
        }
        self.space();
        self.emit("(");
        match &s.left {
          ForHead::Var(decl) => self.var_decl(decl),
          ForHead::Target(target) => self.assign_target(target),
        }
        self.emit(match s.kind {
          ForInOfKind::In => " in ",
          ForInOfKind::Of => " of ",
        });
        self.expr(&s.right, PREC_ASSIGN);
        self.emit(")");
        self.body(&s.body);
      }
      Stmt::Labeled(s) => {
        self.emit(&s.label);
        self.emit(":");
        match &*s.body {
          Stmt::Block(_) => self.body(&s.body),
          body => {
            self.space();
            self.stmt_inner(body);
          }
        }
      }
      Stmt::Break(label, _) | Stmt::Continue(label, _) => {
        self.emit(if matches!(stmt, Stmt::Break(..)) {
          "break"
        } else {
          "continue"
        });
        if let Some(label) = label {
          self.emit(" ");
          self.emit(label);
        }
        self.emit(";");
      }
      Stmt::Try(s) => {
        self.emit("try");
        self.space();
        self.block(&s.block.stmts);
        if let Some(handler) = &s.handler {
          self.space();
          self.emit("catch");
          self.space();
          if let Some(param) = &handler.param {
            self.emit("(");
            self.pat(param);
            self.emit(")");
            self.space();
          }
          self.block(&handler.body);
        }
        if let Some(finalizer) = &s.finalizer {
          self.space();
          self.emit("finally");
          self.space();
          self.block(&finalizer.stmts);
        }
      }
      Stmt::Switch(s) => {
        self.emit("switch");
        self.space();
        self.emit("(");
        self.expr(&s.discriminant, PREC_LOWEST);
        self.emit(")");
        self.space();
        self.emit("{");
        self.newline();
        self.indent += 1;
        for case in &s.cases {
          self.write_indent();
          match &case.test {
            Some(test) => {
              self.emit("case ");
              self.expr(test, PREC_LOWEST);
            }
            None => self.emit("default"),
          }
          self.emit(":");
          self.newline();
          self.indent += 1;
          self.print_stmts(&case.cons);
          self.indent -= 1;
        }
        self.indent -= 1;
        self.write_indent();
        self.emit("}");
      }
      Stmt::Empty(_) => self.emit(";"),
      Stmt::Import(decl) => self.import_decl(decl),
      Stmt::ExportNamed(decl) => self.export_named(decl),
      Stmt::ExportDecl(decl) => {
        self.emit("export ");
        match &decl.decl {
          Decl::Var(var) => {
            self.var_decl(var);
            self.emit(";");
          }
          Decl::Fn(f) => self.function(Some(&f.ident.name), &f.function, true),
          Decl::Class(c) => self.class(Some(&c.ident.name), &c.class),
        }
      }
      Stmt::ExportDefault(decl) => {
        self.emit("export default ");
        match &decl.value {
          DefaultValue::Expr(expr) => {
            if starts_ambiguously(expr) || expr_prec(expr) < PREC_ASSIGN {
              self.emit("(");
              self.expr(expr, PREC_LOWEST);
              self.emit(")");
            } else {
              self.expr(expr, PREC_ASSIGN);
            }
            self.emit(";");
          }
          DefaultValue::Fn(f) => {
            self.function(f.ident.as_ref().map(|i| &i.name), &f.function, true)
          }
          DefaultValue::Class(c) => self.class(c.ident.as_ref().map(|i| &i.name), &c.class),
        }
      }
      Stmt::ExportAll(decl) => {
        self.emit("export");
        self.space();
        self.emit("*");
        self.space();
        self.emit("from");
        self.space();
        self.emit(&quote(&decl.source));
        self.emit(";");
      }
    }
  }

  fn module_export_name(&mut self, name: &str) {
    if is_identifier_name(name) {
      self.emit(name);
    } else {
      self.emit(&quote(name));
    }
  }

  fn import_decl(&mut self, decl: &ImportDecl) {
    self.emit("import");
    let default = decl.specifiers.iter().find_map(|s| match s {
      ImportSpecifier::Default(local) => Some(local),
      _ => None,
    });
    let namespace = decl.specifiers.iter().find_map(|s| match s {
      ImportSpecifier::Namespace(local) => Some(local),
      _ => None,
    });
    let named = decl
      .specifiers
      .iter()
      .filter_map(|s| match s {
        ImportSpecifier::Named { imported, local } => Some((imported, local)),
        _ => None,
      })
      .collect::<Vec<_>>();
    if decl.specifiers.is_empty() {
      self.space();
      self.emit(&quote(&decl.source));
      self.emit(";");
      return;
    }
    self.emit(" ");
    let mut needs_comma = false;
    if let Some(default) = default {
      self.emit(&default.name);
      needs_comma = true;
    }
    if let Some(namespace) = namespace {
      if needs_comma {
        self.comma();
      }
      self.emit("*");
      self.emit(" as ");
      self.emit(&namespace.name);
      needs_comma = true;
    }
    if !named.is_empty() {
      if needs_comma {
        self.comma();
      }
      self.emit("{");
      self.space();
      for (i, (imported, local)) in named.iter().enumerate() {
        if i > 0 {
          self.comma();
        }
        if imported.as_str() == local.name.as_str() {
          self.emit(&local.name);
        } else {
          self.module_export_name(imported);
          self.emit(" as ");
          self.emit(&local.name);
        }
      }
      self.space();
      self.emit("}");
    }
    self.space();
    self.emit("from");
    self.space();
    self.emit(&quote(&decl.source));
    self.emit(";");
  }

  fn export_named(&mut self, decl: &ExportNamed) {
    self.emit("export");
    self.space();
    if let [ExportSpecifier::Namespace { exported, .. }] = decl.specifiers.as_slice() {
      self.emit("*");
      self.emit(" as ");
      self.module_export_name(exported);
    } else {
      self.emit("{");
      if !decl.specifiers.is_empty() {
        self.space();
      }
      for (i, specifier) in decl.specifiers.iter().enumerate() {
        if i > 0 {
          self.comma();
        }
        let (ExportSpecifier::Named { local, exported }
        | ExportSpecifier::Namespace { local, exported }) = specifier;
        self.module_export_name(&local.name);
        if local.name.as_str() != exported.as_str() {
          self.emit(" as ");
          self.module_export_name(exported);
        }
      }
      if !decl.specifiers.is_empty() {
        self.space();
      }
      self.emit("}");
    }
    if let Some(source) = &decl.source {
      self.space();
      self.emit("from");
      self.space();
      self.emit(&quote(source));
    }
    self.emit(";");
  }

  fn function(&mut self, name: Option<&Atom>, function: &Function, with_keyword: bool) {
    if function.is_async {
      self.emit("async ");
    }
    if with_keyword {
      self.emit("function");
    }
    if function.is_generator {
      self.emit("*");
    }
    if let Some(name) = name {
      if with_keyword && !function.is_generator {
        self.emit(" ");
      } else if with_keyword {
        self.space();
      }
      self.emit(name);
    }
    self.params(&function.params);
    self.space();
    self.block(&function.body);
  }

  fn params(&mut self, params: &[Pat]) {
    self.emit("(");
    for (i, param) in params.iter().enumerate() {
      if i > 0 {
        self.comma();
      }
      self.pat(param);
    }
    self.emit(")");
  }

  fn class(&mut self, name: Option<&Atom>, class: &Class) {
    self.emit("class");
    if let Some(name) = name {
      self.emit(" ");
      self.emit(name);
    }
    if let Some(super_class) = &class.super_class {
      self.emit(" extends ");
      self.expr(super_class, PREC_CALL);
    }
    self.space();
    if class.members.is_empty() {
      self.emit("{}");
      return;
    }
    self.emit("{");
    self.newline();
    self.indent += 1;
    for member in &class.members {
      self.write_indent();
      match member {
        ClassMember::Method(m) => {
          if m.is_static {
            self.emit("static ");
          }
          self.method(&m.key, m.kind, &m.function);
        }
        ClassMember::Property(p) => {
          if p.is_static {
            self.emit("static ");
          }
          self.prop_key(&p.key);
          if let Some(value) = &p.value {
            self.space();
            self.emit("=");
            self.space();
            self.expr(value, PREC_ASSIGN);
          }
          self.emit(";");
        }
        ClassMember::StaticBlock(b) => {
          self.emit("static");
          self.space();
          self.block(&b.body);
        }
      }
      self.newline();
    }
    self.indent -= 1;
    self.write_indent();
    self.emit("}");
  }

  fn method(&mut self, key: &PropKey, kind: MethodKind, function: &Function) {
    match kind {
      MethodKind::Getter => self.emit("get "),
      MethodKind::Setter => self.emit("set "),
      MethodKind::Method | MethodKind::Constructor => {}
    }
    if function.is_async {
      self.emit("async ");
    }
    if function.is_generator {
      self.emit("*");
    }
    self.prop_key(key);
    self.params(&function.params);
    self.space();
    self.block(&function.body);
  }

  fn prop_key(&mut self, key: &PropKey) {
    match key {
      PropKey::Ident(name) => self.emit(&name.name),
      PropKey::Str(s, _) => self.emit(&quote(s)),
      PropKey::Num(n, _) => self.emit(&number(*n)),
      PropKey::Computed(expr) => {
        self.emit("[");
        self.expr(expr, PREC_ASSIGN);
        self.emit("]");
      }
      PropKey::Private(name) => {
        self.emit("#");
        self.out.push_str(&name.name);
      }
    }
  }

  // Patterns

  fn pat(&mut self, pat: &Pat) {
    match pat {
      Pat::Ident(ident) => self.emit(&ident.name),
      Pat::Array(arr) => {
        self.emit("[");
        for (i, elem) in arr.elems.iter().enumerate() {
          if i > 0 {
            self.comma();
          }
          if let Some(elem) = elem {
            self.pat(elem);
          }
        }
        if matches!(arr.elems.last(), Some(None)) && arr.rest.is_none() {
          self.emit(",");
        }
        if let Some(rest) = &arr.rest {
          if !arr.elems.is_empty() {
            self.comma();
          }
          self.emit("...");
          self.pat(rest);
        }
        self.emit("]");
      }
      Pat::Object(obj) => {
        self.emit("{");
        if !obj.props.is_empty() || obj.rest.is_some() {
          self.space();
        }
        for (i, prop) in obj.props.iter().enumerate() {
          if i > 0 {
            self.comma();
          }
          let shorthand_name = match (&prop.key, &prop.value) {
            (PropKey::Ident(key), Pat::Ident(value)) if key.name == value.name => Some(None),
            (PropKey::Ident(key), Pat::Assign(assign))
              if matches!(&*assign.left, Pat::Ident(value) if value.name == key.name) =>
            {
              Some(Some(&assign.right))
            }
            _ => None,
          };
          match shorthand_name {
            Some(default) => {
              self.prop_key(&prop.key);
              if let Some(default) = default {
                self.space();
                self.emit("=");
                self.space();
                self.expr(default, PREC_ASSIGN);
              }
            }
            None => {
              self.prop_key(&prop.key);
              self.emit(":");
              self.space();
              self.pat(&prop.value);
            }
          }
        }
        if let Some(rest) = &obj.rest {
          if !obj.props.is_empty() {
            self.comma();
          }
          self.emit("...");
          self.pat(rest);
        }
        if !obj.props.is_empty() || obj.rest.is_some() {
          self.space();
        }
        self.emit("}");
      }
      Pat::Assign(assign) => {
        self.pat(&assign.left);
        self.space();
        self.emit("=");
        self.space();
        self.expr(&assign.right, PREC_ASSIGN);
      }
      Pat::Expr(expr) => self.expr(expr, PREC_CALL),
    }
  }

  fn assign_target(&mut self, target: &AssignTarget) {
    match target {
      AssignTarget::Ident(ident) => self.emit(&ident.name),
      AssignTarget::Member(member) => self.member(member),
      AssignTarget::Pat(pat) => self.pat(pat),
    }
  }

  // Expressions

  pub fn expr(&mut self, expr: &Expr, level: u8) {
    let wrap = expr_prec(expr) < level;
    if wrap {
      self.emit("(");
    }
    self.expr_inner(expr);
    if wrap {
      self.emit(")");
    }
  }

  fn expr_inner(&mut self, expr: &Expr) {
    match expr {
      Expr::Ident(ident) => self.emit(&ident.name),
      Expr::Lit(lit) => self.lit(lit),
      Expr::This(_) => self.emit("this"),
      Expr::ImportMeta(_) => self.emit("import.meta"),
      Expr::Super(_) => self.emit("super"),
      Expr::Array(arr) => {
        self.emit("[");
        for (i, elem) in arr.elems.iter().enumerate() {
          if i > 0 {
            self.comma();
          }
          if let Some(elem) = elem {
            self.expr(elem, PREC_ASSIGN);
          }
        }
        if matches!(arr.elems.last(), Some(None)) {
          self.emit(",");
        }
        self.emit("]");
      }
      Expr::Object(obj) => self.object(obj),
      Expr::Fn(f) => self.function(f.ident.as_ref().map(|i| &i.name), &f.function, true),
      Expr::Arrow(arrow) => {
        if arrow.is_async {
          self.emit("async ");
        }
        self.params(&arrow.params);
        self.space();
        self.emit("=>");
        self.space();
        match &arrow.body {
          ArrowBody::Block(stmts) => self.block(stmts),
          ArrowBody::Expr(body) => {
            if starts_ambiguously(body) && matches!(leftmost(body), Expr::Object(_)) {
              self.emit("(");
              self.expr(body, PREC_LOWEST);
              self.emit(")");
            } else {
              self.expr(body, PREC_ASSIGN);
            }
          }
        }
      }
      Expr::Class(c) => self.class(c.ident.as_ref().map(|i| &i.name), &c.class),
      Expr::Unary(e) => {
        self.emit(e.op.as_str());
        if e.op.is_keyword() {
          self.emit(" ");
        }
        self.expr(&e.arg, PREC_PREFIX);
      }
      Expr::Update(e) => {
        let op = match e.op {
          UpdateOp::Increment => "++",
          UpdateOp::Decrement => "--",
        };
        if e.prefix {
          self.emit(op);
          self.expr(&e.arg, PREC_PREFIX);
        } else {
          self.expr(&e.arg, PREC_POSTFIX);
          self.emit(op);
        }
      }
      Expr::Binary(e) => self.binary(e),
      Expr::Assign(e) => {
        self.assign_target(&e.target);
        self.space();
        self.emit(e.op.as_str());
        self.space();
        self.expr(&e.value, PREC_ASSIGN);
      }
      Expr::Cond(e) => {
        self.expr(&e.test, PREC_COND + 1);
        self.space();
        self.emit("?");
        self.space();
        self.expr(&e.cons, PREC_ASSIGN);
        self.space();
        self.emit(":");
        self.space();
        self.expr(&e.alt, PREC_ASSIGN);
      }
      Expr::Call(e) => {
        if e.is_pure {
          self.emit("/* @__PURE__ */");
          self.space();
        }
        self.expr(&e.callee, PREC_CALL);
        self.args(&e.args);
      }
      Expr::New(e) => {
        if e.is_pure {
          self.emit("/* @__PURE__ */");
          self.space();
        }
        self.emit("new ");
        if has_call_in_chain(&e.callee) {
          self.emit("(");
          self.expr(&e.callee, PREC_LOWEST);
          self.emit(")");
        } else {
          self.expr(&e.callee, PREC_MEMBER);
        }
        self.args(&e.args);
      }
      Expr::Member(e) => self.member(e),
      Expr::Seq(e) => {
        for (i, expr) in e.exprs.iter().enumerate() {
          if i > 0 {
            self.comma();
          }
          self.expr(expr, PREC_ASSIGN);
        }
      }
      Expr::Spread(arg) => {
        self.emit("...");
        self.expr(arg, PREC_ASSIGN);
      }
      Expr::Await(arg, _) => {
        self.emit("await ");
        self.expr(arg, PREC_PREFIX);
      }
      Expr::Yield(e) => {
        self.emit("yield");
        if e.delegate {
          self.emit("*");
        }
        if let Some(arg) = &e.arg {
          self.emit(" ");
          self.expr(arg, PREC_ASSIGN);
        }
      }
      Expr::Require(e) => {
        self.emit("require(");
        self.emit(&quote(&e.specifier));
        self.emit(")");
      }
      Expr::Import(e) => {
        self.emit("import(");
        self.expr(&e.arg, PREC_ASSIGN);
        self.emit(")");
      }
    }
  }

  fn args(&mut self, args: &[Expr]) {
    self.emit("(");
    for (i, arg) in args.iter().enumerate() {
      if i > 0 {
        self.comma();
      }
      self.expr(arg, PREC_ASSIGN);
    }
    self.emit(")");
  }

  fn member(&mut self, member: &MemberExpr) {
    if matches!(&*member.object, Expr::Lit(Lit { value: LitValue::Num(_), .. })) {
      self.emit("(");
      self.expr(&member.object, PREC_LOWEST);
      self.emit(")");
    } else {
      self.expr(&member.object, PREC_CALL);
    }
    match &member.prop {
      MemberProp::Ident(name) => {
        self.emit(".");
        self.out.push_str(&name.name);
      }
      MemberProp::Computed(expr) => {
        self.emit("[");
        self.expr(expr, PREC_LOWEST);
        self.emit("]");
      }
      MemberProp::Private(name) => {
        self.emit(".#");
        self.out.push_str(&name.name);
      }
    }
  }

  fn binary(&mut self, e: &BinaryExpr) {
    let prec = e.op.precedence();
    let mixes_nullish = |child: &Expr| match child {
      Expr::Binary(child) => {
        (e.op == BinaryOp::NullishCoalescing)
          != (child.op == BinaryOp::NullishCoalescing)
          && e.op.is_logical()
          && child.op.is_logical()
      }
      _ => false,
    };
    let left_level = if e.op == BinaryOp::Exp {
      if matches!(&*e.left, Expr::Unary(_) | Expr::Await(..)) {
        PREC_PRIMARY
      } else {
        prec + 1
      }
    } else if mixes_nullish(&e.left) {
      PREC_PRIMARY
    } else {
      prec
    };
    let right_level = if e.op == BinaryOp::Exp {
      prec
    } else if mixes_nullish(&e.right) {
      PREC_PRIMARY
    } else {
      prec + 1
    };
    self.expr(&e.left, left_level);
    if matches!(e.op, BinaryOp::In | BinaryOp::InstanceOf) {
      self.emit(" ");
      self.emit(e.op.as_str());
      self.emit(" ");
    } else {
      self.space();
      self.emit(e.op.as_str());
      self.space();
    }
    self.expr(&e.right, right_level);
  }

  fn object(&mut self, obj: &ObjectExpr) {
    if obj.props.is_empty() {
      self.emit("{}");
      return;
    }
    let multiline = !self.minify
      && obj.props.iter().any(|prop| match prop {
        Prop::Method(_) => true,
        Prop::KeyValue(kv) => matches!(kv.value, Expr::Fn(_) | Expr::Arrow(_)),
        Prop::Spread(_) => false,
      });
    self.emit("{");
    if multiline {
      self.newline();
      self.indent += 1;
    } else {
      self.space();
    }
    for (i, prop) in obj.props.iter().enumerate() {
      if i > 0 {
        self.emit(",");
        if multiline {
          self.newline();
        } else {
          self.space();
        }
      }
      if multiline {
        self.write_indent();
      }
      match prop {
        Prop::KeyValue(kv) => match (&kv.key, &kv.value) {
          (PropKey::Ident(key), Expr::Ident(value)) if key.name == value.name => {
            self.emit(&key.name)
          }
          _ => {
            self.prop_key(&kv.key);
            self.emit(":");
            self.space();
            self.expr(&kv.value, PREC_ASSIGN);
          }
        },
        Prop::Method(m) => self.method(&m.key, m.kind, &m.function),
        Prop::Spread(e) => {
          self.emit("...");
          self.expr(e, PREC_ASSIGN);
        }
      }
    }
    if multiline {
      self.indent -= 1;
      self.newline();
      self.write_indent();
    } else {
      self.space();
    }
    self.emit("}");
  }

  fn lit(&mut self, lit: &Lit) {
    match &lit.value {
      LitValue::Str(s) => self.emit(&quote(s)),
      LitValue::Num(n) => self.emit(&number(*n)),
      LitValue::Bool(b) => self.emit(if *b { "true" } else { "false" }),
      LitValue::Null => self.emit("null"),
    }
  }
}

fn is_word_char(c: char) -> bool {
  c.is_alphanumeric() || c == '_' || c == '$' || c == '#'
}

fn expr_prec(expr: &Expr) -> u8 {
  match expr {
    Expr::Seq(_) => PREC_COMMA,
    Expr::Yield(_) | Expr::Arrow(_) | Expr::Assign(_) | Expr::Spread(_) => PREC_ASSIGN,
    Expr::Cond(_) => PREC_COND,
    Expr::Binary(e) => e.op.precedence(),
    Expr::Unary(_) | Expr::Await(..) => PREC_PREFIX,
    Expr::Update(e) if e.prefix => PREC_PREFIX,
    Expr::Update(_) => PREC_POSTFIX,
    Expr::Call(e) | Expr::New(e) if e.is_pure => PREC_PREFIX,
    Expr::Call(_) | Expr::New(_) | Expr::Require(_) | Expr::Import(_) => PREC_CALL,
    Expr::Member(_) => PREC_MEMBER,
    Expr::Lit(Lit {
      value: LitValue::Num(n),
      ..
    }) if n.is_sign_negative() => PREC_PREFIX,
    _ => PREC_PRIMARY,
  }
}

fn leftmost(expr: &Expr) -> &Expr {
  match expr {
    Expr::Binary(e) => leftmost(&e.left),
    Expr::Cond(e) => leftmost(&e.test),
    Expr::Call(e) if !e.is_pure => leftmost(&e.callee),
    Expr::Member(e) => leftmost(&e.object),
    Expr::Seq(e) => e.exprs.first().map_or(expr, leftmost),
    Expr::Update(e) if !e.prefix => leftmost(&e.arg),
    Expr::Assign(e) => match &e.target {
      AssignTarget::Member(member) => leftmost(&member.object),
      _ => expr,
    },
    _ => expr,
  }
}

/// Expression statements can't start with `{`, `function` or `class`.
fn starts_ambiguously(expr: &Expr) -> bool {
  match leftmost(expr) {
    Expr::Object(_) | Expr::Fn(_) | Expr::Class(_) => true,
    Expr::Assign(e) => matches!(e.target, AssignTarget::Pat(Pat::Object(_))),
    _ => false,
  }
}

fn has_call_in_chain(expr: &Expr) -> bool {
  match expr {
    Expr::Call(_) | Expr::Require(_) | Expr::Import(_) => true,
    Expr::Member(e) => has_call_in_chain(&e.object),
    _ => false,
  }
}

pub fn quote(s: &str) -> String {
  let mut out = String::with_capacity(s.len() + 2);
  out.push('"');
  for c in s.chars() {
    match c {
      '"' => out.push_str("\\\""),
      '\\' => out.push_str("\\\\"),
      '\n' => out.push_str("\\n"),
      '\r' => out.push_str("\\r"),
      '\t' => out.push_str("\\t"),
      '\u{2028}' => out.push_str("\\u2028"),
      '\u{2029}' => out.push_str("\\u2029"),
      c if (c as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", c as u32)),
      c => out.push(c),
    }
  }
  out.push('"');
  out
}

pub fn number(n: f64) -> String {
  if n.is_nan() {
    "NaN".to_string()
  } else if n.is_infinite() {
    if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
  } else if n.abs() >= 1e21 {
    format!("{n:e}")
  } else {
    format!("{n}")
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{ScopeId, Span};

  fn ident(name: &str) -> Expr {
    Expr::Ident(Ident::unbound(name))
  }

  fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary(BinaryExpr {
      op,
      left: Box::new(left),
      right: Box::new(right),
      span: Span::DUMMY,
    })
  }

  fn readable(expr: &Expr) -> String {
    print_expr(expr, CodegenOptions::default())
  }

  #[test]
  fn parenthesizes_by_precedence() {
    let expr = binary(
      BinaryOp::Mul,
      binary(BinaryOp::Add, ident("a"), ident("b")),
      ident("c"),
    );
    assert_eq!(readable(&expr), "(a + b) * c");

    let expr = binary(
      BinaryOp::Sub,
      ident("a"),
      binary(BinaryOp::Sub, ident("b"), ident("c")),
    );
    assert_eq!(readable(&expr), "a - (b - c)");
  }

  #[test]
  fn minified_output_keeps_tokens_apart() {
    let expr = binary(
      BinaryOp::Sub,
      ident("a"),
      Expr::Unary(UnaryExpr {
        op: UnaryOp::Minus,
        arg: Box::new(ident("b")),
        span: Span::DUMMY,
      }),
    );
    let minified = print_expr(
      &expr,
      CodegenOptions {
        minify_whitespace: true,
      },
    );
    assert_eq!(minified, "a- -b");

    let expr = Expr::Unary(UnaryExpr {
      op: UnaryOp::TypeOf,
      arg: Box::new(ident("x")),
      span: Span::DUMMY,
    });
    assert_eq!(
      print_expr(
        &expr,
        CodegenOptions {
          minify_whitespace: true
        }
      ),
      "typeof x"
    );
  }

  #[test]
  fn object_expression_statement_is_wrapped() {
    let stmt = Stmt::expr(Expr::Member(MemberExpr {
      object: Box::new(Expr::Object(ObjectExpr {
        props: vec![],
        span: Span::DUMMY,
      })),
      prop: MemberProp::Ident(IdentName::new("a")),
      span: Span::DUMMY,
    }));
    let mut codegen = Codegen::new(CodegenOptions::default());
    codegen.print_stmt(&stmt);
    assert_eq!(codegen.into_string(), "({}.a);\n");
  }

  #[test]
  fn arrow_returning_object_is_wrapped() {
    let expr = Expr::arrow_returning(
      Expr::Object(ObjectExpr {
        props: vec![],
        span: Span::DUMMY,
      }),
      ScopeId::from_usize(0),
    );
    assert_eq!(readable(&expr), "() => ({})");
  }

  #[test]
  fn numeric_member_access() {
    let expr = Expr::member(Expr::Lit(Lit::num(1.0)), "toString");
    assert_eq!(readable(&expr), "(1).toString");
  }

  #[test]
  fn strings_and_numbers() {
    assert_eq!(quote("a\"b\\c\n"), "\"a\\\"b\\\\c\\n\"");
    assert_eq!(number(1.0), "1");
    assert_eq!(number(0.5), "0.5");
    assert_eq!(number(f64::NAN), "NaN");
  }

  #[test]
  fn dangling_else_gets_braces() {
    let inner = Stmt::If(IfStmt {
      test: ident("b"),
      cons: Box::new(Stmt::expr(ident("c"))),
      alt: None,
      span: Span::DUMMY,
    });
    let outer = Stmt::If(IfStmt {
      test: ident("a"),
      cons: Box::new(inner),
      alt: Some(Box::new(Stmt::expr(ident("d")))),
      span: Span::DUMMY,
    });
    let mut codegen = Codegen::new(CodegenOptions {
      minify_whitespace: true,
    });
    codegen.print_stmt(&outer);
    assert_eq!(codegen.into_string(), "if(a){if(b)c;}else d;");
  }

  #[test]
  fn shorthand_properties() {
    let expr = Expr::Object(ObjectExpr {
      props: vec![
        Prop::KeyValue(KeyValueProp {
          key: PropKey::Ident(IdentName::new("a")),
          value: ident("a"),
        }),
        Prop::KeyValue(KeyValueProp {
          key: PropKey::Ident(IdentName::new("b")),
          value: ident("c"),
        }),
      ],
      span: Span::DUMMY,
    });
    assert_eq!(readable(&expr), "{ a, b: c }");
  }
}
