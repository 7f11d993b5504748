pub mod chunk;
pub mod dialogue;

pub use chunk::*;
pub use dialogue::*;
