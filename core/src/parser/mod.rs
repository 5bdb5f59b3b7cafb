pub mod error;
pub mod parser;

pub use error::{ParseError, ParseErrorKind};
pub use parser::{DEFAULT_MAX_DEPTH, Parser, parse, parse_program, parse_with_max_depth};
