// Value ingestion: pasted text or the first column of an uploaded sheet.
// Both reduce to one ordered list of trimmed, non-empty sticker values.

pub mod tokenizer;

pub use tokenizer::{tokenize_cells, tokenize_text};
