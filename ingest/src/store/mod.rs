pub mod base;
pub mod batch;
pub mod columns;
pub mod duplicate;
pub mod memory;
pub mod postgres;

pub use base::*;
