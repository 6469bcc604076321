mod repository;
mod schema;

pub use repository::{BatchInsert, Repository};
