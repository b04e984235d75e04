mod result_set;
mod row;

pub use result_set::{QueryResult, Rows};
pub use row::{CellMeta, Row};
