mod input_options;
pub use input_options::*;
mod output_options;
pub use output_options::*;
