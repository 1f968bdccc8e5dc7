pub mod cursor;

pub use cursor::{ByteCursor, Underflow};
