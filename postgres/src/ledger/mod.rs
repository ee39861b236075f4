mod db;
mod rows;
mod schema;

pub use db::*;
pub use rows::*;
pub use schema::*;
