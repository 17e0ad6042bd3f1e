use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

/// Runtime helpers a chunk needs. Marking a helper also marks the helpers it calls.
#[derive(Default, Debug)]
pub struct RuntimeHelpers {
  inner: Inner,
}

macro_rules! define_helpers {
    (
        Helpers {
            $( $name:ident ( $( $declared:ident ),* ): ( $( $dep:ident ),* ), )*
        }
    ) => {

        #[derive(Debug,Default)]
        struct Inner {
            $( $name: AtomicBool, )*
        }

        impl RuntimeHelpers {
            pub fn extend_from(&self, other: &Self) {
                $(
                    if other.inner.$name.load(Ordering::SeqCst) {
                        self.inner.$name.store(true, Ordering::Relaxed);
                    }
                )*
            }

            /// Source text of every used helper, in declaration order.
            pub fn generate_helpers(&self) -> Vec<&'static str> {
                let mut to = vec![];
                $(
                    if self.inner.$name.load(Ordering::Relaxed) {
                        to.push(include_str!(concat!(
                            "./snippets/_",
                            stringify!($name),
                            ".js"
                        )));
                    }
                )*
                to
            }

            pub fn is_used_any_helpers(&self) -> bool {
                $(
                    if self.inner.$name.load(Ordering::Relaxed) {
                        return true;
                    }
                )*
                false
            }

            pub fn used_names(&self) -> HashSet<&'static str> {
                let mut to = HashSet::new();
                $(
                    if self.inner.$name.load(Ordering::Relaxed) {
                        $(
                            to.insert(stringify!($declared));
                        )*
                    }
                )*
                to
            }

            /// Every top-level name any helper may declare.
            pub fn all_names() -> &'static [&'static str] {
                &[$( $( stringify!($declared), )* )*]
            }

            $(
                pub fn $name(&self) {
                    self.inner.$name.store(true, Ordering::Relaxed);
                    $(
                        self.$dep();
                    )*
                }
            )*
        }
    };
}

impl RuntimeHelpers {
  pub fn new() -> Self {
    Self::default()
  }
}

define_helpers!(Helpers {
    prelude(__create, __defProp, __getOwnPropDesc, __getOwnPropNames, __getProtoOf, __hasOwnProp): (),
    name(__name): (prelude),
    esm(__esm): (prelude),
    commonjs(__commonJS): (prelude),
    export(__export): (prelude),
    copy_props(__copyProps): (prelude),
    re_export(__reExport): (copy_props),
    to_esm(__toESM): (copy_props),
    to_common_js(__toCommonJS): (copy_props),
});

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn dependencies_are_marked() {
    let helpers = RuntimeHelpers::new();
    assert!(!helpers.is_used_any_helpers());
    helpers.to_esm();
    let used = helpers.used_names();
    assert!(used.contains("__toESM"));
    assert!(used.contains("__copyProps"));
    assert!(used.contains("__defProp"));
    assert!(!used.contains("__commonJS"));
    assert_eq!(
      helpers.generate_helpers(),
      vec![
        include_str!("./snippets/_prelude.js"),
        include_str!("./snippets/_copy_props.js"),
        include_str!("./snippets/_to_esm.js"),
      ]
    );
  }

  #[test]
  fn extend_from_other_chunk() {
    let a = RuntimeHelpers::new();
    let b = RuntimeHelpers::new();
    b.commonjs();
    a.extend_from(&b);
    assert!(a.used_names().contains("__commonJS"));
    assert!(RuntimeHelpers::all_names().contains(&"__reExport"));
  }
}
