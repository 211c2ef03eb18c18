//! Header resolution for the reference table.
//!
//! Column titles vary between exports ("Harbour", "Min LOA (m)",
//! "Berthing Tugs No."), so each logical column has a list of aliases that
//! are compared after normalization.

use super::ParseError;

/// Logical columns of the reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Location,
    MinLength,
    MaxLength,
    BerthingTugs,
    BerthingRule,
    UnberthingTugs,
    UnberthingRule,
    Notes,
}

impl Column {
    pub const MANDATORY: [Column; 5] = [
        Column::Location,
        Column::MinLength,
        Column::MaxLength,
        Column::BerthingTugs,
        Column::UnberthingTugs,
    ];

    /// Accepted header spellings, in priority order.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Column::Location => &["location", "harbour", "port", "area"],
            Column::MinLength => &["min_length_m", "min_length", "loa_min", "min_loa_m", "min_loa"],
            Column::MaxLength => &["max_length_m", "max_length", "loa_max", "max_loa_m", "max_loa"],
            Column::BerthingTugs => &["berthing_tugs_no", "berthing_tugs", "berthing", "tugs_berthing"],
            Column::BerthingRule => &["berthing_rule", "rule_berthing"],
            Column::UnberthingTugs => &[
                "unberthing_tugs_no",
                "unberthing_tugs",
                "unberthing",
                "tugs_unberthing",
            ],
            Column::UnberthingRule => &["unberthing_rule", "rule_unberthing"],
            Column::Notes => &[
                "additional_notes",
                "additionalnotes",
                "notes",
                "remarks",
                "additional_note",
            ],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Column::Location => "Location",
            Column::MinLength => "Min Length",
            Column::MaxLength => "Max Length",
            Column::BerthingTugs => "Berthing Tugs",
            Column::BerthingRule => "Berthing Rule",
            Column::UnberthingTugs => "Unberthing Tugs",
            Column::UnberthingRule => "Unberthing Rule",
            Column::Notes => "Additional Notes",
        }
    }

    /// Index of the first alias present in a normalized header row.
    fn find(&self, header: &[String]) -> Option<usize> {
        self.aliases().iter().find_map(|alias| {
            let alias = normalize_header(alias);
            header.iter().position(|h| *h == alias)
        })
    }
}

/// Fold a header cell into its comparable form.
///
/// Lowercases, drops punctuation other than `_` and `-`, turns runs of
/// whitespace into a single `_` and hyphens into `_`.
/// `"Min Loa (m)"` becomes `min_loa_m`.
pub fn normalize_header(cell: &str) -> String {
    let cleaned: String = cell
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_' || *c == '-')
        .collect();

    let mut out = String::with_capacity(cleaned.len());
    let mut in_space = false;
    for c in cleaned.trim().chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        out.push(if c == '-' { '_' } else { c });
    }
    out
}

/// Positions of the logical columns within a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub location: usize,
    pub min_length: usize,
    pub max_length: usize,
    pub berthing_tugs: usize,
    pub berthing_rule: Option<usize>,
    pub unberthing_tugs: usize,
    pub unberthing_rule: Option<usize>,
    pub notes: Option<usize>,
}

impl ColumnMap {
    /// Resolve columns from a raw header row.
    /// Fails naming every mandatory column that could not be found.
    pub fn resolve(header: &[String]) -> Result<Self, ParseError> {
        let normalized: Vec<String> = header.iter().map(|h| normalize_header(h)).collect();

        let missing: Vec<Column> = Column::MANDATORY
            .iter()
            .copied()
            .filter(|c| c.find(&normalized).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ParseError::UnrecognisedHeaders { missing });
        }

        let required = |c: Column| c.find(&normalized).unwrap_or_default();

        Ok(Self {
            location: required(Column::Location),
            min_length: required(Column::MinLength),
            max_length: required(Column::MaxLength),
            berthing_tugs: required(Column::BerthingTugs),
            berthing_rule: Column::BerthingRule.find(&normalized),
            unberthing_tugs: required(Column::UnberthingTugs),
            unberthing_rule: Column::UnberthingRule.find(&normalized),
            notes: Column::Notes.find(&normalized),
        })
    }

    /// Cell text at `index`, or empty when the row is short or the column
    /// is absent.
    pub fn cell<'a>(row: &'a [String], index: Option<usize>) -> &'a str {
        index
            .and_then(|i| row.get(i))
            .map(|s| s.trim())
            .unwrap_or("")
    }
}
