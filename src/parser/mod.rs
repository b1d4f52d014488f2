// Cell coercion parsers

pub mod date;
pub mod lexer;
pub mod number;

// Public API re-exports
pub use date::{month_key, parse_date};
pub use number::parse_number;
