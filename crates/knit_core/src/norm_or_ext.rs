use knit_ast::SymbolTable;
use knit_common::{ModuleId, ModuleIdx};

use crate::{external_module::ExternalModule, normal_module::NormalModule};

#[derive(Debug)]
pub enum NormOrExt {
  Normal(NormalModule),
  External(ExternalModule),
}

impl NormOrExt {
  pub fn id(&self) -> &ModuleId {
    match self {
      NormOrExt::Normal(module) => &module.id,
      NormOrExt::External(module) => &module.id,
    }
  }

  pub fn idx(&self) -> ModuleIdx {
    match self {
      NormOrExt::Normal(module) => module.idx,
      NormOrExt::External(module) => module.idx,
    }
  }

  pub fn symbols(&self) -> &SymbolTable {
    match self {
      NormOrExt::Normal(module) => &module.symbols,
      NormOrExt::External(module) => &module.symbols,
    }
  }

  pub fn exec_order(&self) -> usize {
    match self {
      NormOrExt::Normal(module) => module.exec_order,
      NormOrExt::External(m) => m.exec_order,
    }
  }

  pub fn set_exec_order(&mut self, exec_order: usize) {
    match self {
      NormOrExt::Normal(module) => module.exec_order = exec_order,
      NormOrExt::External(m) => m.exec_order = exec_order,
    }
  }

  pub fn as_norm(&self) -> Option<&NormalModule> {
    match self {
      NormOrExt::Normal(m) => Some(m),
      _ => None,
    }
  }

  pub fn as_norm_mut(&mut self) -> Option<&mut NormalModule> {
    match self {
      NormOrExt::Normal(m) => Some(m),
      _ => None,
    }
  }

  pub fn as_ext(&self) -> Option<&ExternalModule> {
    match self {
      NormOrExt::External(m) => Some(m),
      _ => None,
    }
  }

  pub fn as_ext_mut(&mut self) -> Option<&mut ExternalModule> {
    match self {
      NormOrExt::External(m) => Some(m),
      _ => None,
    }
  }

  pub fn is_external(&self) -> bool {
    matches!(self, NormOrExt::External(_))
  }
}
