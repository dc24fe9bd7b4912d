//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod gate;

pub use gate::{build_gate, OpenGate, StaticTokenGate};
