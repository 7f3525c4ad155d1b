//! Mesh file readers.

mod obj;

pub use obj::{ObjError, parse_obj, read_obj};
