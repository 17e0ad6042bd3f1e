use knit_ast::{ast::Comment, Atom, Span};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
  /// Identifiers and keywords alike
  Word(Atom),
  PrivateName(Atom),
  Str(Atom),
  Num(f64),
  Punct(&'static str),
  Eof,
}

#[derive(Debug, Clone)]
pub(crate) struct Token {
  pub kind: TokenKind,
  pub span: Span,
  pub newline_before: bool,
  /// Preceded by `/* @__PURE__ */` or `/* #__PURE__ */`
  pub pure: bool,
  /// Preceded by `/* @__NO_SIDE_EFFECTS__ */`
  pub no_side_effects: bool,
}

const PUNCTUATORS: &[&str] = &[
  ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==", "!=",
  "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=",
  "**", "<<", ">>", "{", "}", "(", ")", "[", "]", ";", ",", "<", ">", "+", "-", "*", "/", "%", "&",
  "|", "^", "!", "~", "?", ":", "=", ".", "@",
];

pub(crate) struct Lexed {
  pub tokens: Vec<Token>,
  pub hashbang: Option<Atom>,
  pub legal_comments: Vec<Comment>,
}

pub(crate) struct Lexer<'a> {
  source: &'a str,
  pos: usize,
  newline_before: bool,
  pure: bool,
  no_side_effects: bool,
  legal_comments: Vec<Comment>,
}

impl<'a> Lexer<'a> {
  pub(crate) fn new(source: &'a str) -> Self {
    Self {
      source,
      pos: 0,
      newline_before: false,
      pure: false,
      no_side_effects: false,
      legal_comments: vec![],
    }
  }

  fn rest(&self) -> &'a str {
    &self.source[self.pos..]
  }

  fn peek_char(&self) -> Option<char> {
    self.rest().chars().next()
  }

  fn span_from(&self, start: usize) -> Span {
    Span::new(start as u32, self.pos as u32)
  }

  pub(crate) fn tokenize(mut self) -> Result<Lexed, (String, Span)> {
    let hashbang = self.rest().starts_with("#!").then(|| {
      let end = self.rest().find('\n').unwrap_or(self.rest().len());
      let line = Atom::from(&self.rest()[..end]);
      self.pos += end;
      line
    });

    let mut tokens = vec![];
    loop {
      self.skip_trivia()?;
      let start = self.pos;
      let Some(c) = self.peek_char() else {
        tokens.push(self.token(TokenKind::Eof, start));
        break;
      };
      let kind = if c == '"' || c == '\'' {
        TokenKind::Str(self.string(c)?)
      } else if c.is_ascii_digit() || (c == '.' && self.next_is_digit()) {
        TokenKind::Num(self.number()?)
      } else if c == '#' {
        self.pos += 1;
        TokenKind::PrivateName(self.word())
      } else if is_word_start(c) {
        TokenKind::Word(self.word())
      } else if c == '`' {
        return Err(("Template literals are not supported".to_string(), self.span_from(start)));
      } else {
        TokenKind::Punct(self.punct()?)
      };
      tokens.push(self.token(kind, start));
    }
    Ok(Lexed {
      tokens,
      hashbang,
      legal_comments: self.legal_comments,
    })
  }

  fn token(&mut self, kind: TokenKind, start: usize) -> Token {
    let token = Token {
      kind,
      span: self.span_from(start),
      newline_before: self.newline_before,
      pure: self.pure,
      no_side_effects: self.no_side_effects,
    };
    self.newline_before = false;
    self.pure = false;
    self.no_side_effects = false;
    token
  }

  fn next_is_digit(&self) -> bool {
    self.rest()[1..].starts_with(|c: char| c.is_ascii_digit())
  }

  fn skip_trivia(&mut self) -> Result<(), (String, Span)> {
    loop {
      let rest = self.rest();
      if rest.starts_with("//") {
        let end = rest.find('\n').unwrap_or(rest.len());
        self.comment(self.pos, self.pos + end);
        self.pos += end;
      } else if rest.starts_with("/*") {
        let start = self.pos;
        let Some(end) = rest[2..].find("*/") else {
          return Err(("Unterminated comment".to_string(), self.span_from(start)));
        };
        let end = start + 2 + end + 2;
        if self.source[start..end].contains('\n') {
          self.newline_before = true;
        }
        self.comment(start, end);
        self.pos = end;
      } else if let Some(c) = self.peek_char().filter(|c| c.is_whitespace()) {
        if c == '\n' {
          self.newline_before = true;
        }
        self.pos += c.len_utf8();
      } else {
        return Ok(());
      }
    }
  }

  fn comment(&mut self, start: usize, end: usize) {
    let text = &self.source[start..end];
    if text.contains("@__PURE__") || text.contains("#__PURE__") {
      self.pure = true;
    }
    if text.contains("@__NO_SIDE_EFFECTS__") || text.contains("#__NO_SIDE_EFFECTS__") {
      self.no_side_effects = true;
    }
    let is_legal = text.starts_with("/*!")
      || text.starts_with("//!")
      || text.contains("@license")
      || text.contains("@preserve");
    if is_legal {
      self.legal_comments.push(Comment {
        text: Atom::from(text),
        span: Span::new(start as u32, end as u32),
      });
    }
  }

  fn word(&mut self) -> Atom {
    let len = self
      .rest()
      .find(|c: char| !is_word_part(c))
      .unwrap_or(self.rest().len());
    let word = Atom::from(&self.rest()[..len]);
    self.pos += len;
    word
  }

  fn string(&mut self, quote: char) -> Result<Atom, (String, Span)> {
    let start = self.pos;
    self.pos += 1;
    let mut value = String::new();
    loop {
      let Some(c) = self.peek_char() else {
        return Err(("Unterminated string literal".to_string(), self.span_from(start)));
      };
      self.pos += c.len_utf8();
      match c {
        c if c == quote => return Ok(Atom::from(value)),
        '\n' => {
          return Err(("Unterminated string literal".to_string(), self.span_from(start)));
        }
        '\\' => {
          let Some(escaped) = self.peek_char() else {
            continue;
          };
          self.pos += escaped.len_utf8();
          match escaped {
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            '0' => value.push('\0'),
            '\n' => {}
            'u' => value.push(self.unicode_escape(start)?),
            other => value.push(other),
          }
        }
        c => value.push(c),
      }
    }
  }

  fn unicode_escape(&mut self, start: usize) -> Result<char, (String, Span)> {
    let rest = self.rest();
    let (digits, len) = match rest.strip_prefix('{') {
      Some(braced) => {
        let end = braced.find('}').unwrap_or(0);
        (&braced[..end], end + 2)
      }
      None => (rest.get(..4).unwrap_or(""), 4),
    };
    let c = u32::from_str_radix(digits, 16)
      .ok()
      .and_then(char::from_u32)
      .ok_or_else(|| ("Invalid unicode escape".to_string(), self.span_from(start)))?;
    self.pos += len;
    Ok(c)
  }

  fn number(&mut self) -> Result<f64, (String, Span)> {
    let start = self.pos;
    let rest = self.rest();
    let radix = match rest.get(..2).map(str::to_ascii_lowercase).as_deref() {
      Some("0x") => 16,
      Some("0o") => 8,
      Some("0b") => 2,
      _ => 10,
    };
    if radix != 10 {
      let len = rest[2..]
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .unwrap_or(rest.len() - 2);
      let digits = rest[2..2 + len].replace('_', "");
      self.pos += 2 + len;
      return u64::from_str_radix(&digits, radix)
        .map(|n| n as f64)
        .map_err(|_| ("Invalid number".to_string(), self.span_from(start)));
    }
    let mut len = 0;
    let bytes = rest.as_bytes();
    let mut seen_exponent = false;
    while len < bytes.len() {
      let b = bytes[len];
      let is_sign_of_exponent =
        (b == b'+' || b == b'-') && len > 0 && matches!(bytes[len - 1], b'e' | b'E');
      if b.is_ascii_digit() || b == b'.' || b == b'_' || is_sign_of_exponent {
        len += 1;
      } else if (b == b'e' || b == b'E') && !seen_exponent {
        seen_exponent = true;
        len += 1;
      } else {
        break;
      }
    }
    let text = rest[..len].replace('_', "");
    self.pos += len;
    text
      .parse::<f64>()
      .map_err(|_| ("Invalid number".to_string(), self.span_from(start)))
  }

  fn punct(&mut self) -> Result<&'static str, (String, Span)> {
    let rest = self.rest();
    let punct = PUNCTUATORS
      .iter()
      .find(|p| rest.starts_with(**p))
      // `a?.5:b` is a conditional
      .filter(|p| !(**p == "?." && rest[2..].starts_with(|c: char| c.is_ascii_digit())))
      .copied()
      .or_else(|| rest.starts_with('?').then_some("?"));
    match punct {
      Some(punct) => {
        self.pos += punct.len();
        Ok(punct)
      }
      None => {
        let start = self.pos;
        self.pos += rest.chars().next().map_or(1, char::len_utf8);
        Err((
          format!("Unexpected character {:?}", &rest[..self.pos - start]),
          self.span_from(start),
        ))
      }
    }
  }
}

fn is_word_start(c: char) -> bool {
  c.is_alphabetic() || c == '_' || c == '$'
}

fn is_word_part(c: char) -> bool {
  c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::new(source)
      .tokenize()
      .map(|lexed| lexed.tokens.into_iter().map(|t| t.kind).collect())
      .unwrap_or_default()
  }

  #[test]
  fn longest_punctuator_wins() {
    assert_eq!(
      kinds("a >>>= b?.c"),
      vec![
        TokenKind::Word("a".into()),
        TokenKind::Punct(">>>="),
        TokenKind::Word("b".into()),
        TokenKind::Punct("?."),
        TokenKind::Word("c".into()),
        TokenKind::Eof,
      ]
    );
    assert_eq!(kinds("a?.5:1")[1], TokenKind::Punct("?"));
  }

  #[test]
  fn annotations_and_legal_comments() {
    let lexed = Lexer::new("#!/usr/bin/env node\n/*! MIT */\n/* @__PURE__ */ f()")
      .tokenize()
      .map_err(|(message, _)| message)
      .unwrap();
    assert_eq!(lexed.hashbang.as_deref(), Some("#!/usr/bin/env node"));
    assert_eq!(lexed.legal_comments[0].text.as_str(), "/*! MIT */");
    assert!(lexed.tokens[0].pure);
    assert!(lexed.tokens[0].newline_before);
    assert!(!lexed.tokens[1].pure);
  }

  #[test]
  fn numbers() {
    let numbers = [
      TokenKind::Num(16.0),
      TokenKind::Num(1000.0),
      TokenKind::Num(0.5),
      TokenKind::Num(1000.0),
    ];
    assert_eq!(kinds("0x10 1e3 .5 1_000")[..4], numbers);
  }
}
