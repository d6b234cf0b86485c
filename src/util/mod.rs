mod expand_tilde;
mod output;

pub use expand_tilde::*;
pub use output::*;
