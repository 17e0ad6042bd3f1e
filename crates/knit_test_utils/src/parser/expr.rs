use knit_ast::{ast::*, ScopeKind, SymbolKind};
use knit_common::ImportKind;

use super::{is_reserved, lexer::TokenKind, PResult, Parser};

fn assign_op(punct: &str) -> Option<AssignOp> {
  Some(match punct {
    "=" => AssignOp::Assign,
    "+=" => AssignOp::AddAssign,
    "-=" => AssignOp::SubAssign,
    "*=" => AssignOp::MulAssign,
    "/=" => AssignOp::DivAssign,
    "%=" => AssignOp::ModAssign,
    "**=" => AssignOp::ExpAssign,
    "<<=" => AssignOp::LShiftAssign,
    ">>=" => AssignOp::RShiftAssign,
    ">>>=" => AssignOp::ZeroFillRShiftAssign,
    "|=" => AssignOp::BitOrAssign,
    "^=" => AssignOp::BitXorAssign,
    "&=" => AssignOp::BitAndAssign,
    "||=" => AssignOp::OrAssign,
    "&&=" => AssignOp::AndAssign,
    "??=" => AssignOp::NullishAssign,
    _ => return None,
  })
}

fn binary_op(punct: &str) -> Option<BinaryOp> {
  Some(match punct {
    "==" => BinaryOp::EqEq,
    "!=" => BinaryOp::NotEq,
    "===" => BinaryOp::EqEqEq,
    "!==" => BinaryOp::NotEqEq,
    "<" => BinaryOp::Lt,
    "<=" => BinaryOp::LtEq,
    ">" => BinaryOp::Gt,
    ">=" => BinaryOp::GtEq,
    "<<" => BinaryOp::LShift,
    ">>" => BinaryOp::RShift,
    ">>>" => BinaryOp::ZeroFillRShift,
    "+" => BinaryOp::Add,
    "-" => BinaryOp::Sub,
    "*" => BinaryOp::Mul,
    "/" => BinaryOp::Div,
    "%" => BinaryOp::Mod,
    "**" => BinaryOp::Exp,
    "|" => BinaryOp::BitOr,
    "^" => BinaryOp::BitXor,
    "&" => BinaryOp::BitAnd,
    "||" => BinaryOp::LogicalOr,
    "&&" => BinaryOp::LogicalAnd,
    "??" => BinaryOp::NullishCoalescing,
    _ => return None,
  })
}

impl<'a> Parser<'a> {
  pub(super) fn parse_expr(&mut self) -> PResult<Expr> {
    self.parse_seq(false)
  }

  /// An expression in the head of a `for` loop, where `in` starts a `for-in`.
  pub(super) fn parse_expr_no_in(&mut self) -> PResult<Expr> {
    self.parse_seq(true)
  }

  fn parse_seq(&mut self, no_in: bool) -> PResult<Expr> {
    let start = self.start();
    let first = self.parse_assign_no_in(no_in)?;
    if !self.is(",") {
      return Ok(first);
    }
    let mut exprs = vec![first];
    while self.eat(",") {
      exprs.push(self.parse_assign_no_in(no_in)?);
    }
    Ok(Expr::Seq(SeqExpr {
      exprs,
      span: self.span_from(start),
    }))
  }

  pub(super) fn parse_assign(&mut self) -> PResult<Expr> {
    self.parse_assign_no_in(false)
  }

  pub(super) fn parse_assign_no_in(&mut self, no_in: bool) -> PResult<Expr> {
    if let Some(arrow) = self.try_parse_arrow()? {
      return Ok(arrow);
    }
    if self.in_generator && self.is_word("yield") {
      return self.parse_yield();
    }
    let start = self.start();
    let left = self.parse_cond(no_in)?;
    let op = match &self.peek().kind {
      TokenKind::Punct(punct) => assign_op(punct),
      _ => None,
    };
    let Some(op) = op else {
      return Ok(left);
    };
    let op_span = self.bump().span;
    let target = match (op, left) {
      (AssignOp::Assign, left) => self.expr_to_assign_target(left)?,
      (_, Expr::Ident(ident)) => AssignTarget::Ident(ident),
      (_, Expr::Member(member)) => AssignTarget::Member(member),
      _ => return Err(self.error("Invalid assignment target", op_span)),
    };
    let value = self.parse_assign_no_in(no_in)?;
    Ok(Expr::Assign(AssignExpr {
      op,
      target,
      value: Box::new(value),
      span: self.span_from(start),
    }))
  }

  fn parse_yield(&mut self) -> PResult<Expr> {
    let start = self.start();
    self.expect_word("yield")?;
    let delegate = self.eat("*");
    let ends = matches!(
      self.peek().kind,
      TokenKind::Punct(")" | "]" | "}" | "," | ";" | ":") | TokenKind::Eof
    ) || self.peek().newline_before;
    let arg = if ends && !delegate {
      None
    } else {
      Some(Box::new(self.parse_assign()?))
    };
    Ok(Expr::Yield(YieldExpr {
      arg,
      delegate,
      span: self.span_from(start),
    }))
  }

  /// Whether the `(` at `offset` closes right before a `=>`.
  fn arrow_after_parens(&self, offset: usize) -> bool {
    let mut depth = 0usize;
    for (idx, token) in self.tokens.iter().enumerate().skip(self.pos + offset) {
      match &token.kind {
        TokenKind::Punct("(" | "[" | "{") => depth += 1,
        TokenKind::Punct(")" | "]" | "}") => {
          depth = depth.saturating_sub(1);
          if depth == 0 {
            return self.tokens.get(idx + 1).is_some_and(|next| {
              matches!(next.kind, TokenKind::Punct("=>")) && !next.newline_before
            });
          }
        }
        TokenKind::Eof => return false,
        _ => {}
      }
    }
    false
  }

  fn is_binding_name_at(&self, offset: usize) -> bool {
    matches!(&self.peek_at(offset).kind, TokenKind::Word(word) if !is_reserved(word))
  }

  fn try_parse_arrow(&mut self) -> PResult<Option<Expr>> {
    let start = self.start();
    let no_side_effects = self.peek().no_side_effects;
    let is_async = self.is_word("async")
      && !self.peek_at(1).newline_before
      && ((self.is_binding_name_at(1) && self.is_at(2, "=>"))
        || (self.is_at(1, "(") && self.arrow_after_parens(1)));
    let offset = usize::from(is_async);
    let single_param = self.is_binding_name_at(offset) && self.is_at(offset + 1, "=>");
    if !single_param && !(self.is_at(offset, "(") && self.arrow_after_parens(offset)) {
      return Ok(None);
    }
    if is_async {
      self.bump();
    }

    let (scope, parts) = self.with_function_scope(is_async, false, |p| -> PResult<_> {
      let params = if single_param {
        let (name, span) = p.binding_name()?;
        vec![Pat::Ident(p.declare_ident(name, SymbolKind::Hoisted, span))]
      } else {
        p.parse_params()?
      };
      p.expect("=>")?;
      let body = if p.eat("{") {
        ArrowBody::Block(p.parse_stmts_until_brace()?)
      } else {
        ArrowBody::Expr(Box::new(p.parse_assign()?))
      };
      Ok((params, body))
    });
    let (params, body) = parts?;
    Ok(Some(Expr::Arrow(ArrowExpr {
      params,
      body,
      is_async,
      no_side_effects,
      scope,
      span: self.span_from(start),
    })))
  }

  fn parse_cond(&mut self, no_in: bool) -> PResult<Expr> {
    let start = self.start();
    let test = self.parse_binary(0, no_in)?;
    if !self.eat("?") {
      return Ok(test);
    }
    let cons = self.parse_assign()?;
    self.expect(":")?;
    let alt = self.parse_assign_no_in(no_in)?;
    Ok(Expr::Cond(CondExpr {
      test: Box::new(test),
      cons: Box::new(cons),
      alt: Box::new(alt),
      span: self.span_from(start),
    }))
  }

  fn peek_binary_op(&self, no_in: bool) -> Option<BinaryOp> {
    match &self.peek().kind {
      TokenKind::Punct(punct) => binary_op(punct),
      TokenKind::Word(word) if word.as_str() == "instanceof" => Some(BinaryOp::InstanceOf),
      TokenKind::Word(word) if word.as_str() == "in" && !no_in => Some(BinaryOp::In),
      _ => None,
    }
  }

  fn parse_binary(&mut self, min_precedence: u8, no_in: bool) -> PResult<Expr> {
    let start = self.start();
    let mut left = self.parse_unary()?;
    while let Some(op) = self.peek_binary_op(no_in) {
      let precedence = op.precedence();
      if precedence <= min_precedence {
        break;
      }
      self.bump();
      // `**` is right-associative.
      let right_min = if op == BinaryOp::Exp {
        precedence - 1
      } else {
        precedence
      };
      let right = self.parse_binary(right_min, no_in)?;
      left = Expr::Binary(BinaryExpr {
        op,
        left: Box::new(left),
        right: Box::new(right),
        span: self.span_from(start),
      });
    }
    Ok(left)
  }

  fn parse_unary(&mut self) -> PResult<Expr> {
    let start = self.start();
    let op = match &self.peek().kind {
      TokenKind::Punct("!") => Some(UnaryOp::Not),
      TokenKind::Punct("~") => Some(UnaryOp::Tilde),
      TokenKind::Punct("+") => Some(UnaryOp::Plus),
      TokenKind::Punct("-") => Some(UnaryOp::Minus),
      TokenKind::Word(word) => match word.as_str() {
        "typeof" => Some(UnaryOp::TypeOf),
        "void" => Some(UnaryOp::Void),
        "delete" => Some(UnaryOp::Delete),
        _ => None,
      },
      _ => None,
    };
    if let Some(op) = op {
      self.bump();
      let arg = self.parse_unary()?;
      return Ok(Expr::Unary(UnaryExpr {
        op,
        arg: Box::new(arg),
        span: self.span_from(start),
      }));
    }
    if self.is("++") || self.is("--") {
      let op = if self.bump().kind == TokenKind::Punct("++") {
        UpdateOp::Increment
      } else {
        UpdateOp::Decrement
      };
      let arg = self.parse_unary()?;
      return Ok(Expr::Update(UpdateExpr {
        op,
        prefix: true,
        arg: Box::new(arg),
        span: self.span_from(start),
      }));
    }
    if self.in_async && self.is_word("await") {
      self.bump();
      let arg = self.parse_unary()?;
      return Ok(Expr::Await(Box::new(arg), self.span_from(start)));
    }

    let expr = self.parse_lhs()?;
    if (self.is("++") || self.is("--")) && !self.peek().newline_before {
      let op = if self.bump().kind == TokenKind::Punct("++") {
        UpdateOp::Increment
      } else {
        UpdateOp::Decrement
      };
      return Ok(Expr::Update(UpdateExpr {
        op,
        prefix: false,
        arg: Box::new(expr),
        span: self.span_from(start),
      }));
    }
    Ok(expr)
  }

  pub(super) fn parse_lhs(&mut self) -> PResult<Expr> {
    let start = self.start();
    let pure = self.peek().pure;
    let expr = if self.is_word("new") {
      self.parse_new()?
    } else {
      self.parse_primary()?
    };
    self.parse_member_tail(expr, start, pure, true)
  }

  fn parse_new(&mut self) -> PResult<Expr> {
    let start = self.start();
    let pure = self.peek().pure;
    self.expect_word("new")?;
    let callee_start = self.start();
    let callee = if self.is_word("new") {
      self.parse_new()?
    } else {
      self.parse_primary()?
    };
    let callee = self.parse_member_tail(callee, callee_start, false, false)?;
    let args = if self.is("(") {
      self.parse_args()?
    } else {
      vec![]
    };
    Ok(Expr::New(CallExpr {
      callee: Box::new(callee),
      args,
      is_pure: pure,
      span: self.span_from(start),
    }))
  }

  /// Property accesses and, with `allow_call`, calls after `expr`. A pure annotation applies to
  /// the first call.
  fn parse_member_tail(
    &mut self,
    mut expr: Expr,
    start: u32,
    mut pure: bool,
    allow_call: bool,
  ) -> PResult<Expr> {
    loop {
      if self.eat(".") {
        let prop = match self.peek().kind.clone() {
          TokenKind::PrivateName(name) => {
            let span = self.bump().span;
            MemberProp::Private(PrivateName { name, span })
          }
          _ => {
            let (name, span) = self.any_name()?;
            MemberProp::Ident(IdentName { name, span })
          }
        };
        expr = Expr::Member(MemberExpr {
          object: Box::new(expr),
          prop,
          span: self.span_from(start),
        });
      } else if self.eat("[") {
        let prop = self.parse_expr()?;
        self.expect("]")?;
        expr = Expr::Member(MemberExpr {
          object: Box::new(expr),
          prop: MemberProp::Computed(Box::new(prop)),
          span: self.span_from(start),
        });
      } else if allow_call && self.is("(") {
        let args = self.parse_args()?;
        expr = self.make_call(expr, args, pure, start);
        pure = false;
      } else if self.is("?.") {
        return Err(self.error("Optional chaining is not supported", self.peek().span));
      } else {
        return Ok(expr);
      }
    }
  }

  /// `require("x")` with a literal becomes an import record unless `require` is declared here.
  fn make_call(&mut self, callee: Expr, mut args: Vec<Expr>, is_pure: bool, start: u32) -> Expr {
    let span = self.span_from(start);
    let is_global_require = matches!(
      &callee,
      Expr::Ident(Ident { name, .. }) if name.as_str() == "require"
    ) && self.symbols.lookup(self.scope, "require").is_none();
    if is_global_require && args.len() == 1 {
      if let Some(Expr::Lit(Lit {
        value: LitValue::Str(specifier),
        span: specifier_span,
      })) = args.first().cloned()
      {
        args.clear();
        let record = self.add_record(specifier.clone(), ImportKind::Require, specifier_span);
        return Expr::Require(RequireExpr {
          record,
          specifier,
          span,
        });
      }
    }
    Expr::Call(CallExpr {
      callee: Box::new(callee),
      args,
      is_pure,
      span,
    })
  }

  fn parse_args(&mut self) -> PResult<Vec<Expr>> {
    self.expect("(")?;
    let mut args = vec![];
    while !self.eat(")") {
      if self.eat("...") {
        args.push(Expr::Spread(Box::new(self.parse_assign()?)));
      } else {
        args.push(self.parse_assign()?);
      }
      if !self.eat(",") {
        self.expect(")")?;
        break;
      }
    }
    Ok(args)
  }

  fn parse_primary(&mut self) -> PResult<Expr> {
    let start = self.start();
    match self.peek().kind.clone() {
      TokenKind::Num(value) => {
        let span = self.bump().span;
        Ok(Expr::Lit(Lit {
          value: LitValue::Num(value),
          span,
        }))
      }
      TokenKind::Str(value) => {
        let span = self.bump().span;
        Ok(Expr::Lit(Lit {
          value: LitValue::Str(value),
          span,
        }))
      }
      TokenKind::Punct("(") => {
        self.bump();
        let expr = self.parse_expr()?;
        self.expect(")")?;
        Ok(expr)
      }
      TokenKind::Punct("[") => self.parse_array(),
      TokenKind::Punct("{") => self.parse_object(),
      TokenKind::Word(word) => match word.as_str() {
        "this" => Ok(Expr::This(self.bump().span)),
        "super" => Ok(Expr::Super(self.bump().span)),
        "null" | "true" | "false" => {
          let span = self.bump().span;
          let value = match word.as_str() {
            "null" => LitValue::Null,
            "true" => LitValue::Bool(true),
            _ => LitValue::Bool(false),
          };
          Ok(Expr::Lit(Lit { value, span }))
        }
        "function" => self.parse_fn_expr(),
        "async" if self.is_word_at(1, "function") && !self.peek_at(1).newline_before => {
          self.parse_fn_expr()
        }
        "class" => self.parse_class_expr(),
        "import" => {
          self.bump();
          if self.eat(".") {
            self.expect_word("meta")?;
            return Ok(Expr::ImportMeta(self.span_from(start)));
          }
          self.expect("(")?;
          let arg = self.parse_assign()?;
          self.expect(")")?;
          let record = match &arg {
            Expr::Lit(Lit {
              value: LitValue::Str(specifier),
              span,
            }) => Some(self.add_record(specifier.clone(), ImportKind::DynamicImport, *span)),
            _ => None,
          };
          Ok(Expr::Import(ImportExpr {
            arg: Box::new(arg),
            record,
            span: self.span_from(start),
          }))
        }
        _ if !is_reserved(&word) => {
          let span = self.bump().span;
          Ok(Expr::Ident(Ident::new(word, None, span)))
        }
        _ => Err(self.unexpected("expression")),
      },
      _ => Err(self.unexpected("expression")),
    }
  }

  fn parse_array(&mut self) -> PResult<Expr> {
    let start = self.start();
    self.expect("[")?;
    let mut elems = vec![];
    while !self.eat("]") {
      if self.eat(",") {
        elems.push(None);
        continue;
      }
      let elem = if self.eat("...") {
        Expr::Spread(Box::new(self.parse_assign()?))
      } else {
        self.parse_assign()?
      };
      elems.push(Some(elem));
      if !self.eat(",") {
        self.expect("]")?;
        break;
      }
    }
    Ok(Expr::Array(ArrayExpr {
      elems,
      span: self.span_from(start),
    }))
  }

  /// Whether the word at `offset` is followed by a key, so that it is a modifier like `get`.
  fn is_modifier_at(&self, offset: usize) -> bool {
    !matches!(
      self.peek_at(offset + 1).kind,
      TokenKind::Punct("(" | "=" | ";" | "}" | "," | ":") | TokenKind::Eof
    )
  }

  fn parse_object(&mut self) -> PResult<Expr> {
    let start = self.start();
    self.expect("{")?;
    let mut props = vec![];
    while !self.eat("}") {
      props.push(self.parse_object_prop()?);
      if !self.eat(",") {
        self.expect("}")?;
        break;
      }
    }
    Ok(Expr::Object(ObjectExpr {
      props,
      span: self.span_from(start),
    }))
  }

  fn parse_object_prop(&mut self) -> PResult<Prop> {
    if self.eat("...") {
      return Ok(Prop::Spread(self.parse_assign()?));
    }
    let start = self.start();
    let is_async =
      self.is_word("async") && self.is_modifier_at(0) && !self.peek_at(1).newline_before;
    if is_async {
      self.bump();
    }
    let is_generator = self.eat("*");
    let accessor = self.accessor_kind();
    let key = self.parse_prop_key()?;

    if is_async || is_generator || accessor.is_some() || self.is("(") {
      let function = self.parse_function_rest(start, is_async, is_generator)?;
      return Ok(Prop::Method(MethodProp {
        key,
        kind: accessor.unwrap_or(MethodKind::Method),
        function,
      }));
    }
    if self.eat(":") {
      let value = self.parse_assign()?;
      return Ok(Prop::KeyValue(KeyValueProp { key, value }));
    }

    let PropKey::Ident(name) = &key else {
      return Err(self.unexpected("\":\""));
    };
    let ident = Ident::new(name.name.clone(), None, name.span);
    // `{ a = 1 } = obj` only makes sense as a pattern.
    let value = if self.eat("=") {
      let default = self.parse_assign()?;
      Expr::Assign(AssignExpr {
        op: AssignOp::Assign,
        target: AssignTarget::Ident(ident),
        value: Box::new(default),
        span: self.span_from(start),
      })
    } else {
      Expr::Ident(ident)
    };
    Ok(Prop::KeyValue(KeyValueProp { key, value }))
  }

  /// Consumes `get` or `set` when a key follows.
  fn accessor_kind(&mut self) -> Option<MethodKind> {
    let kind = if self.is_word("get") {
      MethodKind::Getter
    } else if self.is_word("set") {
      MethodKind::Setter
    } else {
      return None;
    };
    if !self.is_modifier_at(0) {
      return None;
    }
    self.bump();
    Some(kind)
  }

  pub(super) fn parse_prop_key(&mut self) -> PResult<PropKey> {
    match self.peek().kind.clone() {
      TokenKind::Word(name) => {
        let span = self.bump().span;
        Ok(PropKey::Ident(IdentName { name, span }))
      }
      TokenKind::Str(value) => Ok(PropKey::Str(value, self.bump().span)),
      TokenKind::Num(value) => Ok(PropKey::Num(value, self.bump().span)),
      TokenKind::PrivateName(name) => {
        let span = self.bump().span;
        Ok(PropKey::Private(PrivateName { name, span }))
      }
      TokenKind::Punct("[") => {
        self.bump();
        let key = self.parse_assign()?;
        self.expect("]")?;
        Ok(PropKey::Computed(Box::new(key)))
      }
      _ => Err(self.unexpected("property name")),
    }
  }

  // Functions and classes

  fn parse_fn_expr(&mut self) -> PResult<Expr> {
    let start = self.start();
    let no_side_effects = self.peek().no_side_effects;
    let is_async = self.eat_word("async");
    self.expect_word("function")?;
    let is_generator = self.eat("*");
    let (ident, mut function) = if self.is_binding_name_at(0) {
      let (name, span) = self.binding_name()?;
      // The name is only visible inside the function.
      let (_, parsed) = self.with_scope(ScopeKind::Block, |p| -> PResult<_> {
        let ident = p.declare_ident(name, SymbolKind::HoistedFunction, span);
        Ok((Some(ident), p.parse_function_rest(start, is_async, is_generator)?))
      });
      parsed?
    } else {
      (None, self.parse_function_rest(start, is_async, is_generator)?)
    };
    function.no_side_effects = no_side_effects;
    Ok(Expr::Fn(FnExpr { ident, function }))
  }

  /// Parameters and body, starting at `(`.
  pub(super) fn parse_function_rest(
    &mut self,
    start: u32,
    is_async: bool,
    is_generator: bool,
  ) -> PResult<Function> {
    let (scope, parts) = self.with_function_scope(is_async, is_generator, |p| -> PResult<_> {
      let params = p.parse_params()?;
      p.expect("{")?;
      let body = p.parse_stmts_until_brace()?;
      Ok((params, body))
    });
    let (params, body) = parts?;
    Ok(Function {
      params,
      body,
      is_async,
      is_generator,
      no_side_effects: false,
      scope,
      span: self.span_from(start),
    })
  }

  fn parse_params(&mut self) -> PResult<Vec<Pat>> {
    self.expect("(")?;
    let mut params = vec![];
    while !self.eat(")") {
      if self.is("...") {
        return Err(self.error("Rest parameters are not supported", self.peek().span));
      }
      params.push(self.parse_binding_element(SymbolKind::Hoisted)?);
      if !self.eat(",") {
        self.expect(")")?;
        break;
      }
    }
    Ok(params)
  }

  fn parse_class_expr(&mut self) -> PResult<Expr> {
    let start = self.start();
    self.expect_word("class")?;
    let (ident, class) = if self.is_binding_name_at(0) {
      let (name, span) = self.binding_name()?;
      let (_, parsed) = self.with_scope(ScopeKind::Block, |p| -> PResult<_> {
        let ident = p.declare_ident(name, SymbolKind::Class, span);
        Ok((Some(ident), p.parse_class_rest(start)?))
      });
      parsed?
    } else {
      (None, self.parse_class_rest(start)?)
    };
    Ok(Expr::Class(ClassExpr { ident, class }))
  }

  /// The optional `extends` clause and the class body.
  pub(super) fn parse_class_rest(&mut self, start: u32) -> PResult<Class> {
    let super_class = if self.eat_word("extends") {
      Some(Box::new(self.parse_lhs()?))
    } else {
      None
    };
    self.expect("{")?;
    let (scope, members) = self.with_scope(ScopeKind::Class, |p| -> PResult<_> {
      let mut members = vec![];
      while !p.eat("}") {
        if p.at_eof() {
          return Err(p.unexpected("\"}\""));
        }
        if p.eat(";") {
          continue;
        }
        members.push(p.parse_class_member()?);
      }
      Ok(members)
    });
    Ok(Class {
      super_class,
      members: members?,
      scope,
      span: self.span_from(start),
    })
  }

  fn parse_class_member(&mut self) -> PResult<ClassMember> {
    let start = self.start();
    let is_static = self.is_word("static") && self.is_modifier_at(0);
    if is_static {
      self.bump();
      if self.eat("{") {
        let (scope, body) =
          self.with_function_scope(false, false, |p| p.parse_stmts_until_brace());
        return Ok(ClassMember::StaticBlock(StaticBlock {
          body: body?,
          scope,
          span: self.span_from(start),
        }));
      }
    }
    let is_async =
      self.is_word("async") && self.is_modifier_at(0) && !self.peek_at(1).newline_before;
    if is_async {
      self.bump();
    }
    let is_generator = self.eat("*");
    let accessor = self.accessor_kind();
    let key = self.parse_prop_key()?;

    if self.is("(") {
      let is_constructor = !is_static
        && matches!(&key, PropKey::Ident(name) if name.name.as_str() == "constructor");
      let kind = match accessor {
        Some(kind) => kind,
        None if is_constructor => MethodKind::Constructor,
        None => MethodKind::Method,
      };
      let function = self.parse_function_rest(start, is_async, is_generator)?;
      return Ok(ClassMember::Method(ClassMethod {
        key,
        kind,
        is_static,
        function,
      }));
    }
    let value = if self.eat("=") {
      Some(self.parse_assign()?)
    } else {
      None
    };
    self.semicolon()?;
    Ok(ClassMember::Property(ClassProp {
      key,
      value,
      is_static,
      span: self.span_from(start),
    }))
  }

  // Patterns

  /// A binding pattern with an optional default value.
  fn parse_binding_element(&mut self, kind: SymbolKind) -> PResult<Pat> {
    let start = self.start();
    let pat = self.parse_binding_pat(kind)?;
    if !self.eat("=") {
      return Ok(pat);
    }
    let right = self.parse_assign()?;
    Ok(Pat::Assign(AssignPat {
      left: Box::new(pat),
      right: Box::new(right),
      span: self.span_from(start),
    }))
  }

  /// Declares every name the pattern binds as `kind`.
  pub(super) fn parse_binding_pat(&mut self, kind: SymbolKind) -> PResult<Pat> {
    let start = self.start();
    if self.eat("[") {
      let mut elems = vec![];
      let mut rest = None;
      while !self.eat("]") {
        if self.eat(",") {
          elems.push(None);
          continue;
        }
        if self.eat("...") {
          rest = Some(Box::new(self.parse_binding_pat(kind)?));
          self.expect("]")?;
          break;
        }
        elems.push(Some(self.parse_binding_element(kind)?));
        if !self.eat(",") {
          self.expect("]")?;
          break;
        }
      }
      return Ok(Pat::Array(ArrayPat {
        elems,
        rest,
        span: self.span_from(start),
      }));
    }

    if self.eat("{") {
      let mut props = vec![];
      let mut rest = None;
      while !self.eat("}") {
        if self.eat("...") {
          rest = Some(Box::new(self.parse_binding_pat(kind)?));
          self.expect("}")?;
          break;
        }
        let key = self.parse_prop_key()?;
        let value = if self.eat(":") {
          self.parse_binding_element(kind)?
        } else {
          let PropKey::Ident(name) = &key else {
            return Err(self.unexpected("\":\""));
          };
          let ident = self.declare_ident(name.name.clone(), kind, name.span);
          let pat = Pat::Ident(ident);
          if self.eat("=") {
            let right = self.parse_assign()?;
            Pat::Assign(AssignPat {
              left: Box::new(pat),
              right: Box::new(right),
              span: self.span_from(start),
            })
          } else {
            pat
          }
        };
        props.push(ObjectPatProp { key, value });
        if !self.eat(",") {
          self.expect("}")?;
          break;
        }
      }
      return Ok(Pat::Object(ObjectPat {
        props,
        rest,
        span: self.span_from(start),
      }));
    }

    let (name, span) = self.binding_name()?;
    Ok(Pat::Ident(self.declare_ident(name, kind, span)))
  }

  pub(super) fn expr_to_assign_target(&self, expr: Expr) -> PResult<AssignTarget> {
    match expr {
      Expr::Ident(ident) => Ok(AssignTarget::Ident(ident)),
      Expr::Member(member) => Ok(AssignTarget::Member(member)),
      expr @ (Expr::Array(_) | Expr::Object(_)) => Ok(AssignTarget::Pat(self.expr_to_pat(expr)?)),
      expr => Err(self.error("Invalid assignment target", expr.span())),
    }
  }

  /// Reinterprets an array or object literal as a destructuring pattern.
  fn expr_to_pat(&self, expr: Expr) -> PResult<Pat> {
    match expr {
      Expr::Ident(ident) => Ok(Pat::Ident(ident)),
      expr @ Expr::Member(_) => Ok(Pat::Expr(Box::new(expr))),
      Expr::Array(array) => {
        let mut elems = vec![];
        let mut rest = None;
        for elem in array.elems {
          match elem {
            Some(Expr::Spread(arg)) => rest = Some(Box::new(self.expr_to_pat(*arg)?)),
            Some(elem) => elems.push(Some(self.expr_to_pat(elem)?)),
            None => elems.push(None),
          }
        }
        Ok(Pat::Array(ArrayPat {
          elems,
          rest,
          span: array.span,
        }))
      }
      Expr::Object(object) => {
        let mut props = vec![];
        let mut rest = None;
        for prop in object.props {
          match prop {
            Prop::KeyValue(KeyValueProp { key, value }) => props.push(ObjectPatProp {
              key,
              value: self.expr_to_pat(value)?,
            }),
            Prop::Spread(arg) => rest = Some(Box::new(self.expr_to_pat(arg)?)),
            Prop::Method(method) => {
              return Err(self.error("Invalid destructuring target", method.function.span))
            }
          }
        }
        Ok(Pat::Object(ObjectPat {
          props,
          rest,
          span: object.span,
        }))
      }
      Expr::Assign(AssignExpr {
        op: AssignOp::Assign,
        target,
        value,
        span,
      }) => {
        let left = match target {
          AssignTarget::Ident(ident) => Pat::Ident(ident),
          AssignTarget::Member(member) => Pat::Expr(Box::new(Expr::Member(member))),
          AssignTarget::Pat(pat) => pat,
        };
        Ok(Pat::Assign(AssignPat {
          left: Box::new(left),
          right: value,
          span,
        }))
      }
      expr => Err(self.error("Invalid destructuring target", expr.span())),
    }
  }
}
