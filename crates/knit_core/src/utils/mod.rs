mod name_helpers;
pub use name_helpers::*;
mod preset_of_used_names;
pub(crate) use preset_of_used_names::*;
