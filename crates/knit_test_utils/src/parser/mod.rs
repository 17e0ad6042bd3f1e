//! A parser for the subset of JavaScript the bundler tests are written in. It produces the same
//! [ParsedModule] a production front end would: a program with every binding declared in a
//! [SymbolTable], references resolved to their symbols and one import record per import site.

use std::path::Path;

use knit_ast::{
  ast::*, visit_mut::VisitMut, Atom, ImportRecordIdx, ScopeId, ScopeKind, Span, SymbolId,
  SymbolKind, SymbolTable,
};
use knit_common::{ImportKind, ModuleId, ParsedModule, RawImportRecord};
use knit_core::{make_legal, BuildError};
use oxc_index::IndexVec;
use rustc_hash::FxHashSet;

mod expr;
mod lexer;
mod resolver;
mod stmt;

use lexer::{Lexer, Token, TokenKind};
use resolver::Resolver;

type PResult<T> = Result<T, BuildError>;

/// Parses `source` as the module `id`. Import records are left unresolved.
pub fn parse(id: &ModuleId, source: &str) -> knit_error::Result<ParsedModule> {
  let lexed = Lexer::new(source)
    .tokenize()
    .map_err(|(message, span)| BuildError::parse_error(message).at(id.as_path(), span))?;
  let mut parser = Parser::new(id, lexed.tokens);
  let (directives, body) = parser.parse_program()?;
  let Parser {
    mut symbols,
    import_records,
    hidden,
    ..
  } = parser;

  let mut program = Program {
    hashbang: lexed.hashbang,
    directives,
    body,
    legal_comments: lexed.legal_comments,
  };
  Resolver::new(&mut symbols, &hidden).visit_mut_program(&mut program);

  Ok(ParsedModule {
    id: id.clone(),
    program,
    symbols,
    import_records,
    module_side_effects: true,
  })
}

pub(crate) struct Parser<'a> {
  path: &'a Path,
  tokens: Vec<Token>,
  pos: usize,
  prev_end: u32,
  symbols: SymbolTable,
  scope: ScopeId,
  import_records: IndexVec<ImportRecordIdx, RawImportRecord>,
  /// Aliases of re-exported names. They exist for the linker and can't be referenced.
  hidden: FxHashSet<SymbolId>,
  default_export_name: String,
  in_async: bool,
  in_generator: bool,
}

impl<'a> Parser<'a> {
  fn new(id: &'a ModuleId, tokens: Vec<Token>) -> Self {
    let symbols = SymbolTable::new();
    Self {
      path: id.as_path(),
      tokens,
      pos: 0,
      prev_end: 0,
      scope: symbols.root_scope(),
      symbols,
      import_records: IndexVec::new(),
      hidden: FxHashSet::default(),
      default_export_name: format!("{}_default", make_legal(id.stem())),
      // Modules may await at the top level.
      in_async: true,
      in_generator: false,
    }
  }

  fn parse_program(&mut self) -> PResult<(Vec<Directive>, Vec<Stmt>)> {
    let mut directives = vec![];
    while let TokenKind::Str(value) = &self.peek().kind {
      let next = self.peek_at(1);
      let ends_statement = matches!(next.kind, TokenKind::Punct(";") | TokenKind::Eof)
        || next.newline_before;
      if !ends_statement {
        break;
      }
      let value = value.clone();
      let span = self.bump().span;
      self.eat(";");
      directives.push(Directive { value, span });
    }

    let mut body = vec![];
    while !self.at_eof() {
      body.push(self.parse_module_item()?);
    }
    Ok((directives, body))
  }

  // Tokens

  fn peek(&self) -> &Token {
    self.peek_at(0)
  }

  fn peek_at(&self, offset: usize) -> &Token {
    let last = self.tokens.len() - 1;
    &self.tokens[(self.pos + offset).min(last)]
  }

  fn bump(&mut self) -> Token {
    let token = self.peek().clone();
    if self.pos < self.tokens.len() - 1 {
      self.pos += 1;
    }
    self.prev_end = token.span.end;
    token
  }

  fn at_eof(&self) -> bool {
    self.peek().kind == TokenKind::Eof
  }

  fn start(&self) -> u32 {
    self.peek().span.start
  }

  fn span_from(&self, start: u32) -> Span {
    Span::new(start, self.prev_end)
  }

  fn is(&self, punct: &str) -> bool {
    matches!(&self.peek().kind, TokenKind::Punct(p) if *p == punct)
  }

  fn is_at(&self, offset: usize, punct: &str) -> bool {
    matches!(&self.peek_at(offset).kind, TokenKind::Punct(p) if *p == punct)
  }

  fn is_word(&self, word: &str) -> bool {
    self.is_word_at(0, word)
  }

  fn is_word_at(&self, offset: usize, word: &str) -> bool {
    matches!(&self.peek_at(offset).kind, TokenKind::Word(w) if w.as_str() == word)
  }

  fn eat(&mut self, punct: &str) -> bool {
    let matched = self.is(punct);
    if matched {
      self.bump();
    }
    matched
  }

  fn eat_word(&mut self, word: &str) -> bool {
    let matched = self.is_word(word);
    if matched {
      self.bump();
    }
    matched
  }

  fn expect(&mut self, punct: &str) -> PResult<Span> {
    if self.is(punct) {
      return Ok(self.bump().span);
    }
    Err(self.unexpected(&format!("\"{punct}\"")))
  }

  fn expect_word(&mut self, word: &str) -> PResult<Span> {
    if self.is_word(word) {
      return Ok(self.bump().span);
    }
    Err(self.unexpected(&format!("\"{word}\"")))
  }

  /// Automatic semicolon insertion: a missing `;` is fine before `}`, at the end of the file and
  /// after a line break.
  fn semicolon(&mut self) -> PResult<()> {
    if self.eat(";") || self.is("}") || self.at_eof() || self.peek().newline_before {
      return Ok(());
    }
    Err(self.unexpected("\";\""))
  }

  fn error(&self, message: impl Into<String>, span: Span) -> BuildError {
    BuildError::parse_error(message).at(self.path, span)
  }

  fn unexpected(&self, expected: &str) -> BuildError {
    let token = self.peek();
    let found = match &token.kind {
      TokenKind::Word(word) => format!("\"{word}\""),
      TokenKind::PrivateName(name) => format!("\"#{name}\""),
      TokenKind::Str(_) => "string".to_string(),
      TokenKind::Num(_) => "number".to_string(),
      TokenKind::Punct(p) => format!("\"{p}\""),
      TokenKind::Eof => "end of file".to_string(),
    };
    self.error(format!("Expected {expected} but found {found}"), token.span)
  }

  /// An identifier that is not a reserved word.
  fn binding_name(&mut self) -> PResult<(Atom, Span)> {
    match &self.peek().kind {
      TokenKind::Word(word) if !is_reserved(word) => {
        let word = word.clone();
        Ok((word, self.bump().span))
      }
      _ => Err(self.unexpected("identifier")),
    }
  }

  /// Any word, as used after `.` and for property keys.
  fn any_name(&mut self) -> PResult<(Atom, Span)> {
    match &self.peek().kind {
      TokenKind::Word(word) => {
        let word = word.clone();
        Ok((word, self.bump().span))
      }
      _ => Err(self.unexpected("identifier")),
    }
  }

  fn string(&mut self) -> PResult<(Atom, Span)> {
    match &self.peek().kind {
      TokenKind::Str(value) => {
        let value = value.clone();
        Ok((value, self.bump().span))
      }
      _ => Err(self.unexpected("string")),
    }
  }

  // Scopes and symbols

  fn with_scope<T>(&mut self, kind: ScopeKind, f: impl FnOnce(&mut Self) -> T) -> (ScopeId, T) {
    let scope = self.symbols.add_scope(self.scope, kind);
    let parent = std::mem::replace(&mut self.scope, scope);
    let result = f(self);
    self.scope = parent;
    (scope, result)
  }

  /// Runs `f` in a new function scope with the given `async` and generator context.
  fn with_function_scope<T>(
    &mut self,
    is_async: bool,
    is_generator: bool,
    f: impl FnOnce(&mut Self) -> T,
  ) -> (ScopeId, T) {
    let outer = (self.in_async, self.in_generator);
    self.in_async = is_async;
    self.in_generator = is_generator;
    let result = self.with_scope(ScopeKind::Function, f);
    (self.in_async, self.in_generator) = outer;
    result
  }

  /// The scope `var` declarations of the current scope land in.
  fn var_scope(&self) -> ScopeId {
    self
      .symbols
      .ancestors(self.scope)
      .find(|scope| {
        matches!(
          self.symbols.scopes[*scope].kind,
          ScopeKind::Function | ScopeKind::Module
        )
      })
      .unwrap_or(self.symbols.root_scope())
  }

  fn declare(&mut self, name: Atom, kind: SymbolKind, span: Span) -> SymbolId {
    let scope = match kind {
      SymbolKind::Hoisted => self.var_scope(),
      SymbolKind::Import | SymbolKind::Namespace => self.symbols.root_scope(),
      _ => self.scope,
    };
    if matches!(kind, SymbolKind::Hoisted | SymbolKind::HoistedFunction) {
      let existing = self.symbols.scopes[scope].symbols.iter().copied().find(|id| {
        let decl = &self.symbols.symbols[*id];
        decl.name == name && matches!(decl.kind, SymbolKind::Hoisted | SymbolKind::HoistedFunction)
      });
      if let Some(existing) = existing {
        return existing;
      }
    }
    self.symbols.declare(name, kind, scope, span)
  }

  fn declare_ident(&mut self, name: Atom, kind: SymbolKind, span: Span) -> Ident {
    let symbol = self.declare(name.clone(), kind, span);
    Ident::new(name, Some(symbol), span)
  }

  fn declare_hidden(&mut self, name: &str, kind: SymbolKind, span: Span) -> SymbolId {
    let symbol = self.declare(Atom::from(make_legal(name)), kind, span);
    self.hidden.insert(symbol);
    symbol
  }

  fn add_record(&mut self, specifier: Atom, kind: ImportKind, span: Span) -> ImportRecordIdx {
    self.import_records.push(RawImportRecord {
      specifier,
      kind,
      span,
      resolved: None,
    })
  }
}

fn is_reserved(word: &str) -> bool {
  matches!(
    word,
    "break"
      | "case"
      | "catch"
      | "class"
      | "const"
      | "continue"
      | "debugger"
      | "default"
      | "delete"
      | "do"
      | "else"
      | "export"
      | "extends"
      | "false"
      | "finally"
      | "for"
      | "function"
      | "if"
      | "import"
      | "in"
      | "instanceof"
      | "new"
      | "null"
      | "return"
      | "super"
      | "switch"
      | "this"
      | "throw"
      | "true"
      | "try"
      | "typeof"
      | "var"
      | "void"
      | "while"
      | "with"
  )
}

#[cfg(test)]
mod tests;
