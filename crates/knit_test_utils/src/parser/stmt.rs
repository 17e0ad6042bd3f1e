use knit_ast::{ast::*, Atom, ScopeKind, Span, SymbolKind};
use knit_common::ImportKind;

use super::{lexer::TokenKind, PResult, Parser};

impl<'a> Parser<'a> {
  pub(super) fn parse_module_item(&mut self) -> PResult<Stmt> {
    let is_import_decl =
      self.is_word("import") && !self.is_at(1, "(") && !self.is_at(1, ".");
    if is_import_decl {
      return self.parse_import();
    }
    if self.is_word("export") {
      return self.parse_export();
    }
    self.parse_stmt()
  }

  pub(super) fn parse_stmt(&mut self) -> PResult<Stmt> {
    let start = self.start();
    match self.peek().kind.clone() {
      TokenKind::Punct("{") => Ok(Stmt::Block(self.parse_block()?)),
      TokenKind::Punct(";") => {
        self.bump();
        Ok(Stmt::Empty(self.span_from(start)))
      }
      TokenKind::Word(word) => match word.as_str() {
        "var" | "const" => {
          let decl = self.parse_var_decl(false)?;
          self.semicolon()?;
          Ok(Stmt::Var(decl))
        }
        "let" if self.starts_let_decl() => {
          let decl = self.parse_var_decl(false)?;
          self.semicolon()?;
          Ok(Stmt::Var(decl))
        }
        "function" => Ok(Stmt::Fn(self.parse_fn_decl()?)),
        "async" if self.is_word_at(1, "function") && !self.peek_at(1).newline_before => {
          Ok(Stmt::Fn(self.parse_fn_decl()?))
        }
        "class" => Ok(Stmt::Class(self.parse_class_decl()?)),
        "if" => self.parse_if(),
        "return" => {
          self.bump();
          let arg = if self.is(";") || self.is("}") || self.at_eof() || self.peek().newline_before
          {
            None
          } else {
            Some(self.parse_expr()?)
          };
          self.semicolon()?;
          Ok(Stmt::Return(ReturnStmt {
            arg,
            span: self.span_from(start),
          }))
        }
        "throw" => {
          self.bump();
          let arg = self.parse_expr()?;
          self.semicolon()?;
          Ok(Stmt::Throw(ThrowStmt {
            arg,
            span: self.span_from(start),
          }))
        }
        "while" => {
          self.bump();
          self.expect("(")?;
          let test = self.parse_expr()?;
          self.expect(")")?;
          let body = Box::new(self.parse_stmt()?);
          Ok(Stmt::While(WhileStmt {
            test,
            body,
            span: self.span_from(start),
          }))
        }
        "do" => {
          self.bump();
          let body = Box::new(self.parse_stmt()?);
          self.expect_word("while")?;
          self.expect("(")?;
          let test = self.parse_expr()?;
          self.expect(")")?;
          self.eat(";");
          Ok(Stmt::DoWhile(DoWhileStmt {
            body,
            test,
            span: self.span_from(start),
          }))
        }
        "for" => self.parse_for(),
        "break" | "continue" => {
          let is_break = word.as_str() == "break";
          self.bump();
          let label = match &self.peek().kind {
            TokenKind::Word(label) if !self.peek().newline_before => {
              let label = label.clone();
              self.bump();
              Some(label)
            }
            _ => None,
          };
          self.semicolon()?;
          let span = self.span_from(start);
          Ok(if is_break {
            Stmt::Break(label, span)
          } else {
            Stmt::Continue(label, span)
          })
        }
        "try" => self.parse_try(),
        "switch" => self.parse_switch(),
        "import" | "export" if !self.is_at(1, "(") && !self.is_at(1, ".") => Err(self.error(
          format!("\"{word}\" declarations may only appear at the top level"),
          self.peek().span,
        )),
        _ if self.is_at(1, ":") && !super::is_reserved(&word) => {
          let label = word.clone();
          self.bump();
          self.bump();
          let body = Box::new(self.parse_stmt()?);
          Ok(Stmt::Labeled(LabeledStmt {
            label,
            body,
            span: self.span_from(start),
          }))
        }
        _ => self.parse_expr_stmt(),
      },
      _ => self.parse_expr_stmt(),
    }
  }

  fn parse_expr_stmt(&mut self) -> PResult<Stmt> {
    let start = self.start();
    let expr = self.parse_expr()?;
    self.semicolon()?;
    Ok(Stmt::Expr(ExprStmt {
      expr,
      span: self.span_from(start),
    }))
  }

  fn starts_let_decl(&self) -> bool {
    match &self.peek_at(1).kind {
      TokenKind::Word(word) => !matches!(word.as_str(), "in" | "instanceof" | "of"),
      TokenKind::Punct(p) => matches!(*p, "[" | "{"),
      _ => false,
    }
  }

  pub(super) fn parse_block(&mut self) -> PResult<BlockStmt> {
    let start = self.start();
    self.expect("{")?;
    let (scope, stmts) = self.with_scope(ScopeKind::Block, |p| p.parse_stmts_until_brace());
    Ok(BlockStmt {
      stmts: stmts?,
      scope,
      span: self.span_from(start),
    })
  }

  /// Statements up to and including the closing `}`.
  pub(super) fn parse_stmts_until_brace(&mut self) -> PResult<Vec<Stmt>> {
    let mut stmts = vec![];
    while !self.is("}") {
      if self.at_eof() {
        return Err(self.unexpected("\"}\""));
      }
      stmts.push(self.parse_stmt()?);
    }
    self.bump();
    Ok(stmts)
  }

  /// `var`, `let` or `const` with its declarators. `in_for_head` stops at `in` and `of`.
  pub(super) fn parse_var_decl(&mut self, in_for_head: bool) -> PResult<VarDecl> {
    let start = self.start();
    let (kind, symbol_kind) = match &self.bump().kind {
      TokenKind::Word(w) if w.as_str() == "var" => (VarKind::Var, SymbolKind::Hoisted),
      TokenKind::Word(w) if w.as_str() == "let" => (VarKind::Let, SymbolKind::BlockScoped),
      _ => (VarKind::Const, SymbolKind::Const),
    };
    let mut decls = vec![];
    loop {
      let decl_start = self.start();
      let name = self.parse_binding_pat(symbol_kind)?;
      let init = if self.eat("=") {
        Some(self.parse_assign_no_in(in_for_head)?)
      } else {
        None
      };
      decls.push(VarDeclarator {
        name,
        init,
        span: self.span_from(decl_start),
      });
      if !self.eat(",") {
        break;
      }
    }
    Ok(VarDecl {
      kind,
      decls,
      span: self.span_from(start),
    })
  }

  fn parse_fn_decl(&mut self) -> PResult<FnDecl> {
    let start = self.start();
    let no_side_effects = self.peek().no_side_effects;
    let is_async = self.eat_word("async");
    self.expect_word("function")?;
    let is_generator = self.eat("*");
    let (name, span) = self.binding_name()?;
    let ident = self.declare_ident(name, SymbolKind::HoistedFunction, span);
    let mut function = self.parse_function_rest(start, is_async, is_generator)?;
    function.no_side_effects = no_side_effects;
    Ok(FnDecl { ident, function })
  }

  fn parse_class_decl(&mut self) -> PResult<ClassDecl> {
    let start = self.start();
    self.expect_word("class")?;
    let (name, span) = self.binding_name()?;
    let ident = self.declare_ident(name, SymbolKind::Class, span);
    let class = self.parse_class_rest(start)?;
    Ok(ClassDecl { ident, class })
  }

  fn parse_if(&mut self) -> PResult<Stmt> {
    let start = self.start();
    self.expect_word("if")?;
    self.expect("(")?;
    let test = self.parse_expr()?;
    self.expect(")")?;
    let cons = Box::new(self.parse_stmt()?);
    let alt = if self.eat_word("else") {
      Some(Box::new(self.parse_stmt()?))
    } else {
      None
    };
    Ok(Stmt::If(IfStmt {
      test,
      cons,
      alt,
      span: self.span_from(start),
    }))
  }

  fn parse_for(&mut self) -> PResult<Stmt> {
    let start = self.start();
    self.expect_word("for")?;
    let is_await = self.eat_word("await");
    self.expect("(")?;
    let (_, stmt) = self.with_scope(ScopeKind::Block, |p| p.parse_for_rest(start, is_await));
    stmt
  }

  fn parse_for_rest(&mut self, start: u32, is_await: bool) -> PResult<Stmt> {
    let scope = self.scope;
    let starts_decl = self.is_word("var")
      || self.is_word("const")
      || (self.is_word("let") && self.starts_let_decl());
    let init = if self.is(";") {
      None
    } else if starts_decl {
      Some(ForInit::Var(self.parse_var_decl(true)?))
    } else {
      Some(ForInit::Expr(self.parse_expr_no_in()?))
    };

    let in_of = if self.is_word("of") {
      Some(ForInOfKind::Of)
    } else if self.is_word("in") {
      Some(ForInOfKind::In)
    } else {
      None
    };
    if let Some(kind) = in_of {
      self.bump();
      let left = match init {
        Some(ForInit::Var(decl)) => ForHead::Var(decl),
        Some(ForInit::Expr(expr)) => ForHead::Target(self.expr_to_assign_target(expr)?),
        None => return Err(self.unexpected("expression")),
      };
      let right = if kind == ForInOfKind::Of {
        self.parse_assign()?
      } else {
        self.parse_expr()?
      };
      self.expect(")")?;
      let body = Box::new(self.parse_stmt()?);
      return Ok(Stmt::ForInOf(ForInOfStmt {
        kind,
        is_await,
        left,
        right,
        body,
        scope,
        span: self.span_from(start),
      }));
    }

    self.expect(";")?;
    let test = if self.is(";") {
      None
    } else {
      Some(self.parse_expr()?)
    };
    self.expect(";")?;
    let update = if self.is(")") {
      None
    } else {
      Some(self.parse_expr()?)
    };
    self.expect(")")?;
    let body = Box::new(self.parse_stmt()?);
    Ok(Stmt::For(ForStmt {
      init,
      test,
      update,
      body,
      scope,
      span: self.span_from(start),
    }))
  }

  fn parse_try(&mut self) -> PResult<Stmt> {
    let start = self.start();
    self.expect_word("try")?;
    let block = self.parse_block()?;
    let handler = if self.eat_word("catch") {
      let (scope, handler) = self.with_scope(ScopeKind::Catch, |p| -> PResult<_> {
        let param = if p.eat("(") {
          let param = p.parse_binding_pat(SymbolKind::BlockScoped)?;
          p.expect(")")?;
          Some(param)
        } else {
          None
        };
        p.expect("{")?;
        let body = p.parse_stmts_until_brace()?;
        Ok((param, body))
      });
      let (param, body) = handler?;
      Some(CatchClause { param, body, scope })
    } else {
      None
    };
    let finalizer = if self.eat_word("finally") {
      Some(self.parse_block()?)
    } else {
      None
    };
    if handler.is_none() && finalizer.is_none() {
      return Err(self.unexpected("\"catch\" or \"finally\""));
    }
    Ok(Stmt::Try(TryStmt {
      block,
      handler,
      finalizer,
      span: self.span_from(start),
    }))
  }

  fn parse_switch(&mut self) -> PResult<Stmt> {
    let start = self.start();
    self.expect_word("switch")?;
    self.expect("(")?;
    let discriminant = self.parse_expr()?;
    self.expect(")")?;
    self.expect("{")?;
    let (scope, cases) = self.with_scope(ScopeKind::Block, |p| -> PResult<_> {
      let mut cases = vec![];
      while !p.eat("}") {
        let test = if p.eat_word("default") {
          None
        } else {
          p.expect_word("case")?;
          Some(p.parse_expr()?)
        };
        p.expect(":")?;
        let mut cons = vec![];
        while !(p.is_word("case") || p.is_word("default") || p.is("}")) {
          if p.at_eof() {
            return Err(p.unexpected("\"}\""));
          }
          cons.push(p.parse_stmt()?);
        }
        cases.push(SwitchCase { test, cons });
      }
      Ok(cases)
    });
    Ok(Stmt::Switch(SwitchStmt {
      discriminant,
      cases: cases?,
      scope,
      span: self.span_from(start),
    }))
  }

  // Module syntax

  fn parse_import(&mut self) -> PResult<Stmt> {
    let start = self.start();
    self.expect_word("import")?;
    let mut specifiers = vec![];

    if !matches!(self.peek().kind, TokenKind::Str(_)) {
      if !self.is("{") && !self.is("*") {
        let (name, span) = self.binding_name()?;
        specifiers.push(ImportSpecifier::Default(self.declare_ident(
          name,
          SymbolKind::Import,
          span,
        )));
        if !self.eat(",") {
          self.expect_word("from")?;
          return self.finish_import(start, specifiers);
        }
      }
      if self.eat("*") {
        self.expect_word("as")?;
        let (name, span) = self.binding_name()?;
        specifiers.push(ImportSpecifier::Namespace(self.declare_ident(
          name,
          SymbolKind::Namespace,
          span,
        )));
      } else {
        self.expect("{")?;
        while !self.eat("}") {
          let (imported, imported_span) = self.module_export_name()?;
          let (local, span) = if self.eat_word("as") {
            self.binding_name()?
          } else {
            (imported.clone(), imported_span)
          };
          let local = self.declare_ident(local, SymbolKind::Import, span);
          specifiers.push(ImportSpecifier::Named { imported, local });
          if !self.eat(",") {
            self.expect("}")?;
            break;
          }
        }
      }
      self.expect_word("from")?;
    }
    self.finish_import(start, specifiers)
  }

  fn finish_import(&mut self, start: u32, specifiers: Vec<ImportSpecifier>) -> PResult<Stmt> {
    let (source, source_span) = self.string()?;
    self.semicolon()?;
    let record = self.add_record(source.clone(), ImportKind::Static, source_span);
    Ok(Stmt::Import(ImportDecl {
      specifiers,
      record: Some(record),
      source,
      span: self.span_from(start),
    }))
  }

  /// An identifier or a string in an import or export clause.
  fn module_export_name(&mut self) -> PResult<(Atom, Span)> {
    if matches!(self.peek().kind, TokenKind::Str(_)) {
      self.string()
    } else {
      self.any_name()
    }
  }

  fn parse_export(&mut self) -> PResult<Stmt> {
    let start = self.start();
    // `/* @__NO_SIDE_EFFECTS__ */ export function f() {}`
    let no_side_effects = self.peek().no_side_effects;
    self.expect_word("export")?;

    if self.eat("*") {
      if self.eat_word("as") {
        let (exported, span) = self.module_export_name()?;
        self.expect_word("from")?;
        let (source, source_span) = self.string()?;
        self.semicolon()?;
        let symbol = self.declare_hidden(&exported, SymbolKind::Namespace, span);
        let record = self.add_record(source.clone(), ImportKind::Static, source_span);
        let local = Ident::new(exported.clone(), Some(symbol), span);
        return Ok(Stmt::ExportNamed(ExportNamed {
          specifiers: vec![ExportSpecifier::Namespace { local, exported }],
          record: Some(record),
          source: Some(source),
          span: self.span_from(start),
        }));
      }
      self.expect_word("from")?;
      let (source, source_span) = self.string()?;
      self.semicolon()?;
      let record = self.add_record(source.clone(), ImportKind::Static, source_span);
      return Ok(Stmt::ExportAll(ExportAll {
        record: Some(record),
        source,
        span: self.span_from(start),
      }));
    }

    if self.eat("{") {
      let mut names = vec![];
      while !self.eat("}") {
        let (local, span) = self.module_export_name()?;
        let exported = if self.eat_word("as") {
          self.module_export_name()?.0
        } else {
          local.clone()
        };
        names.push((local, span, exported));
        if !self.eat(",") {
          self.expect("}")?;
          break;
        }
      }
      let source = if self.eat_word("from") {
        Some(self.string()?)
      } else {
        None
      };
      self.semicolon()?;
      let record = source
        .as_ref()
        .map(|(source, span)| self.add_record(source.clone(), ImportKind::Static, *span));
      let specifiers = names
        .into_iter()
        .map(|(local, span, exported)| {
          // A re-exported name gets an alias only the linker sees.
          let symbol = record
            .is_some()
            .then(|| self.declare_hidden(&local, SymbolKind::Import, span));
          ExportSpecifier::Named {
            local: Ident::new(local, symbol, span),
            exported,
          }
        })
        .collect();
      return Ok(Stmt::ExportNamed(ExportNamed {
        specifiers,
        record,
        source: source.map(|(source, _)| source),
        span: self.span_from(start),
      }));
    }

    if self.eat_word("default") {
      return self.parse_export_default(start);
    }

    let decl = if self.is_word("function") || self.is_word("async") {
      let mut decl = self.parse_fn_decl()?;
      decl.function.no_side_effects |= no_side_effects;
      Decl::Fn(decl)
    } else if self.is_word("class") {
      Decl::Class(self.parse_class_decl()?)
    } else if self.is_word("var") || self.is_word("let") || self.is_word("const") {
      let decl = self.parse_var_decl(false)?;
      self.semicolon()?;
      Decl::Var(decl)
    } else {
      return Err(self.unexpected("declaration"));
    };
    Ok(Stmt::ExportDecl(ExportDecl {
      decl,
      span: self.span_from(start),
    }))
  }

  fn parse_export_default(&mut self, start: u32) -> PResult<Stmt> {
    let is_fn = self.is_word("function")
      || (self.is_word("async")
        && self.is_word_at(1, "function")
        && !self.peek_at(1).newline_before);
    if is_fn {
      let fn_start = self.start();
      let no_side_effects = self.peek().no_side_effects;
      let is_async = self.eat_word("async");
      self.expect_word("function")?;
      let is_generator = self.eat("*");
      let ident = match &self.peek().kind {
        TokenKind::Word(_) => {
          let (name, span) = self.binding_name()?;
          Some(self.declare_ident(name, SymbolKind::HoistedFunction, span))
        }
        _ => None,
      };
      let mut function = self.parse_function_rest(fn_start, is_async, is_generator)?;
      function.no_side_effects = no_side_effects;
      let local = self.default_local(ident.as_ref());
      return Ok(Stmt::ExportDefault(ExportDefault {
        local,
        value: DefaultValue::Fn(FnExpr { ident, function }),
        span: self.span_from(start),
      }));
    }
    if self.is_word("class") {
      let class_start = self.start();
      self.bump();
      let ident = match &self.peek().kind {
        TokenKind::Word(word) if word.as_str() != "extends" => {
          let (name, span) = self.binding_name()?;
          Some(self.declare_ident(name, SymbolKind::Class, span))
        }
        _ => None,
      };
      let class = self.parse_class_rest(class_start)?;
      let local = self.default_local(ident.as_ref());
      return Ok(Stmt::ExportDefault(ExportDefault {
        local,
        value: DefaultValue::Class(ClassExpr { ident, class }),
        span: self.span_from(start),
      }));
    }
    let expr = self.parse_assign()?;
    self.semicolon()?;
    let local = self.default_local(None);
    Ok(Stmt::ExportDefault(ExportDefault {
      local,
      value: DefaultValue::Expr(expr),
      span: self.span_from(start),
    }))
  }

  /// The name of a function or class given as the default export, or a generated `<file>_default`.
  fn default_local(&mut self, ident: Option<&Ident>) -> Ident {
    match ident {
      Some(ident) => ident.clone(),
      None => {
        let name = Atom::from(self.default_export_name.as_str());
        self.declare_ident(name, SymbolKind::Generated, Span::DUMMY)
      }
    }
  }
}
