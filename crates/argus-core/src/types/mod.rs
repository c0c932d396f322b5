//! Type system for Argus
//!
//! Runtime values flowing through expression evaluation.

pub mod value;

pub use value::Value;
