use clap::ValueEnum;

pub mod json;
pub mod table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON (default)
    Json,
    /// Human-readable table
    Table,
}
