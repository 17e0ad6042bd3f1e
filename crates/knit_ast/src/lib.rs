mod atom;
mod span;
mod symbol;

pub mod ast;
pub mod codegen;
pub mod visit;
pub mod visit_mut;

pub use atom::Atom;
pub use span::Span;
pub use symbol::{
  ImportRecordIdx, Scope, ScopeId, ScopeKind, SymbolDecl, SymbolId, SymbolKind, SymbolTable,
};

pub fn is_identifier_name(name: &str) -> bool {
  let mut chars = name.chars();
  match chars.next() {
    Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
    _ => return false,
  }
  chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
