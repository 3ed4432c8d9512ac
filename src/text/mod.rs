//! The text encoding: tokenizer, parser, and writer.

pub mod parser;
pub mod tokenizer;
pub mod writer;

pub use parser::Parser;
pub use writer::{TextWriter, TextWriterBuilder};
