use knit_ast::{
  ast::*,
  visit::{walk_expr, walk_member_prop, walk_prop_key, Visit},
  Atom,
};

/// How often each ASCII character shows up in text that is printed as is.
#[derive(Debug, Clone)]
pub struct CharFreq([i64; 128]);

impl Default for CharFreq {
  fn default() -> Self {
    Self([0; 128])
  }
}

impl CharFreq {
  pub fn scan(&mut self, text: &str, delta: i64) {
    for byte in text.bytes().filter(u8::is_ascii) {
      self.0[byte as usize] += delta;
    }
  }

  /// `alphabet` reordered by descending frequency. Ties keep their order.
  pub fn sort_by_frequency(&self, alphabet: &str) -> Vec<char> {
    let mut chars = alphabet.chars().collect::<Vec<_>>();
    chars.sort_by_key(|c| std::cmp::Reverse(self.0[*c as usize]));
    chars
  }
}

/// Feeds strings, property names, private names, labels and globals into a [CharFreq]. Names of
/// symbols are left out since the renamer replaces them.
pub(crate) struct CharFreqCollector<'a> {
  pub freq: &'a mut CharFreq,
}

impl<'a> CharFreqCollector<'a> {
  fn name(&mut self, name: &Atom) {
    self.freq.scan(name, 1);
  }
}

impl<'a> Visit for CharFreqCollector<'a> {
  fn visit_ident(&mut self, ident: &Ident) {
    if ident.symbol.is_none() {
      self.name(&ident.name);
    }
  }

  fn visit_expr(&mut self, expr: &Expr) {
    if let Expr::Lit(Lit {
      value: LitValue::Str(value),
      ..
    }) = expr
    {
      self.name(value);
    }
    walk_expr(self, expr);
  }

  fn visit_prop_key(&mut self, key: &PropKey) {
    match key {
      PropKey::Ident(ident) => self.name(&ident.name),
      PropKey::Str(value, _) => self.name(value),
      _ => {}
    }
    walk_prop_key(self, key);
  }

  fn visit_member_prop(&mut self, prop: &MemberProp) {
    if let MemberProp::Ident(ident) = prop {
      self.name(&ident.name);
    }
    walk_member_prop(self, prop);
  }

  fn visit_private_name(&mut self, name: &PrivateName) {
    self.name(&name.name);
  }

  fn visit_label(&mut self, label: &Atom) {
    self.name(label);
  }
}

#[cfg(test)]
mod tests {
  use knit_ast::{Span, SymbolId};

  use super::*;

  #[test]
  fn globals_and_strings_are_counted() {
    let stmt = Stmt::expr(Expr::call(
      Expr::member(Expr::Ident(Ident::unbound("console")), "log"),
      vec![
        Expr::str("zz"),
        Expr::Ident(Ident::new("qqqq", Some(SymbolId::from_usize(0)), Span::DUMMY)),
      ],
    ));
    let mut freq = CharFreq::default();
    CharFreqCollector { freq: &mut freq }.visit_stmt(&stmt);
    let order = freq.sort_by_frequency("cloqz");
    assert_eq!(order, vec!['o', 'l', 'z', 'c', 'q']);
  }
}
