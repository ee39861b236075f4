mod base;
mod columns;
mod connection;
mod feed;
mod importer;

pub use base::*;
pub use columns::*;
pub use connection::*;
pub use feed::*;
pub use importer::*;
