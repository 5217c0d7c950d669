pub mod error;
pub mod query;
pub mod todo;

pub use error::*;
pub use query::*;
pub use todo::*;
