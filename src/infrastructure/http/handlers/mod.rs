//! HTTP Handlers

mod docs;
mod generate;
mod system;
mod voice;

pub use docs::*;
pub use generate::*;
pub use system::*;
pub use voice::*;
