/// Byte-order mark some spreadsheet exports prepend.
const BOM: char = '\u{FEFF}';

/// Row content used in the source table for "more rows follow" placeholders.
const ELLIPSIS_ROW: &str = "...";

/// Split delimited text into rows of trimmed fields.
///
/// Fields are separated by commas; double-quoted fields may contain commas
/// and line breaks, and `""` inside quotes is a literal quote. An unterminated
/// quote runs to end of input. `\n`, `\r\n` and `\r` all end a row.
///
/// Rows with a single field, or whose fields are all blank or spell `...`,
/// are dropped.
pub fn split_rows(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_prefix(BOM).unwrap_or(text);

    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                row.push(field.trim().to_string());
                field.clear();
            }
            '\n' | '\r' if !in_quotes => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(field.trim().to_string());
                field.clear();
                push_row(&mut rows, std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field.trim().to_string());
        push_row(&mut rows, row);
    }

    rows
}

fn push_row(rows: &mut Vec<Vec<String>>, row: Vec<String>) {
    if row.len() <= 1 {
        return;
    }
    let joined = row.concat();
    let joined = joined.trim();
    if joined.is_empty() || joined == ELLIPSIS_ROW {
        return;
    }
    rows.push(row);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(rows: &[Vec<String>]) -> Vec<Vec<&str>> {
        rows.iter()
            .map(|r| r.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn test_split_simple_rows() {
        let rows = split_rows("a,b,c\n1,2,3\n");
        assert_eq!(strs(&rows), vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
    }

    #[test]
    fn test_all_line_endings() {
        let rows = split_rows("a,b\r\nc,d\re,f\ng,h");
        assert_eq!(
            strs(&rows),
            vec![vec!["a", "b"], vec!["c", "d"], vec!["e", "f"], vec!["g", "h"]]
        );
    }

    #[test]
    fn test_strips_bom() {
        let rows = split_rows("\u{FEFF}Location,Min\nX,1");
        assert_eq!(rows[0][0], "Location");
    }

    #[test]
    fn test_quoted_fields() {
        let rows = split_rows("name,rule\nA,\"Two tugs, one aft\"\nB,\"Say \"\"all fast\"\"\"\n");
        assert_eq!(rows[1][1], "Two tugs, one aft");
        assert_eq!(rows[2][1], "Say \"all fast\"");
    }

    #[test]
    fn test_quoted_line_break_stays_in_field() {
        let rows = split_rows("a,\"line one\nline two\"\nb,c");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], "line one\nline two");
    }

    #[test]
    fn test_unterminated_quote_runs_to_end() {
        let rows = split_rows("a,b\nc,\"open\nstill open");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][1], "open\nstill open");
    }

    #[test]
    fn test_fields_are_trimmed() {
        let rows = split_rows("  a , b  \n\" x \",y");
        assert_eq!(strs(&rows), vec![vec!["a", "b"], vec!["x", "y"]]);
    }

    #[test]
    fn test_drops_placeholder_rows() {
        let rows = split_rows("a,b\n...,\n,,\n , \nsingle\nc,d\n");
        assert_eq!(strs(&rows), vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_ellipsis_split_across_fields_is_dropped() {
        let rows = split_rows("a,b\n..,.\n");
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(split_rows("").is_empty());
        assert!(split_rows("\n\r\n").is_empty());
    }
}
