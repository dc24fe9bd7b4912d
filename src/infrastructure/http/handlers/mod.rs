//! HTTP Handlers

mod info;
mod ping;
mod task;

pub use info::*;
pub use ping::*;
pub use task::*;
