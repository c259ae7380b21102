//! Data types and literal values.

mod value;

pub use value::{DataType, Value};
