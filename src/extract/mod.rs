pub mod canonical;
pub mod extractor;
