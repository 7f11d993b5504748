pub mod client;
#[cfg(test)]
pub mod mock;
pub mod prompts;
pub mod sanitize;

pub use client::*;
pub use prompts::*;
pub use sanitize::*;
