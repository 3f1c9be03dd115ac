pub mod fields;
pub mod parse;
pub mod serve;
