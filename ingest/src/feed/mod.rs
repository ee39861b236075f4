pub mod client;
pub mod cursor;

pub use client::*;
pub use cursor::*;
