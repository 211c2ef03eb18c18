use thiserror::Error;

use super::Column;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("CSV is empty or unreadable.")]
    Empty,

    #[error(
        "CSV headers not recognised. Expected Location/Min/Max/Berthing/Unberthing columns (missing: {})",
        column_names(.missing)
    )]
    UnrecognisedHeaders { missing: Vec<Column> },
}

fn column_names(columns: &[Column]) -> String {
    columns
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(", ")
}
