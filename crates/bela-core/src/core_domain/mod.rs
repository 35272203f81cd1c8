mod annotation;
mod diagnostics;
mod document;
mod error;
mod interval;
mod language_mix;
mod linker;
mod markup;
mod ports;
mod row_summary;
mod rows;
mod segmenter;
mod tokenizer;
mod turns;
mod types;

pub use annotation::*;
pub use diagnostics::*;
pub use document::*;
pub use error::*;
pub use interval::*;
pub use language_mix::*;
pub use linker::*;
pub use markup::*;
pub use ports::*;
pub use row_summary::*;
pub use rows::*;
pub use segmenter::*;
pub use tokenizer::*;
pub use turns::*;
pub use types::*;
