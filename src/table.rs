use std::collections::HashMap;

/// Decoded rows of a report file. Cells keep the text exactly as read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ReportTable {
    /// Rows shorter than the header are padded with empty cells. Cells past
    /// the end of the header get positional columns (`column_<n>`, 1-based),
    /// so every row spans the full header and no cell is lost later on.
    pub fn new(mut columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let widest = rows.iter().map(Vec::len).max().unwrap_or(0);
        for position in columns.len()..widest {
            columns.push(format!("column_{}", position + 1));
        }
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index).map(String::as_str)
    }

    /// Appends `other` below `self`, matching columns by name.
    ///
    /// A repeated name matches by occurrence: the second `a` in `other` lines
    /// up with the second `a` in `self`. Columns only present in `other` are
    /// added on the right and earlier rows get empty cells for them; rows from
    /// `other` get empty cells for columns it lacks.
    pub fn append(&mut self, other: ReportTable) {
        if self.columns.is_empty() && self.rows.is_empty() {
            *self = other;
            return;
        }
        if self.columns == other.columns {
            self.rows.extend(other.rows);
            return;
        }

        let mapping = self.column_mapping(&other.columns);
        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }

        for row in other.rows {
            let mut aligned = vec![String::new(); width];
            for (cell, target) in row.into_iter().zip(&mapping) {
                aligned[*target] = cell;
            }
            self.rows.push(aligned);
        }
    }

    /// Position in `self.columns` of every incoming column, adding the ones
    /// `self` does not have yet.
    fn column_mapping(&mut self, incoming: &[String]) -> Vec<usize> {
        let mut occurrences: HashMap<&str, usize> = HashMap::new();
        incoming
            .iter()
            .map(|column| {
                let occurrence = occurrences.entry(column.as_str()).or_default();
                let existing = self
                    .columns
                    .iter()
                    .enumerate()
                    .filter(|(_, name)| name.as_str() == column.as_str())
                    .map(|(index, _)| index)
                    .nth(*occurrence);
                *occurrence += 1;
                existing.unwrap_or_else(|| {
                    self.columns.push(column.clone());
                    self.columns.len() - 1
                })
            })
            .collect()
    }

    pub fn concat(tables: impl IntoIterator<Item = ReportTable>) -> ReportTable {
        let mut combined = ReportTable::default();
        for table in tables {
            combined.append(table);
        }
        combined
    }

    /// Rows as `column -> value` maps, in row order. A repeated column name
    /// keeps its first occurrence as is; later ones get a `_<n>` suffix.
    pub fn records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        let keys = record_keys(&self.columns);
        self.rows
            .iter()
            .map(|row| {
                keys.iter()
                    .zip(row)
                    .map(|(key, cell)| (key.clone(), serde_json::Value::String(cell.clone())))
                    .collect()
            })
            .collect()
    }
}

fn record_keys(columns: &[String]) -> Vec<String> {
    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    columns
        .iter()
        .map(|column| {
            let occurrence = occurrences.entry(column.as_str()).or_default();
            *occurrence += 1;
            match *occurrence {
                1 => column.clone(),
                n => format!("{column}_{n}"),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> ReportTable {
        ReportTable::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn append_same_columns() {
        let mut combined = table(&["date", "oi"], &[&["2020-01-07", "10"]]);
        combined.append(table(&["date", "oi"], &[&["2021-01-05", "11"]]));
        assert_eq!(combined.len(), 2);
        assert_eq!(combined.value(1, "oi"), Some("11"));
    }

    #[test]
    fn append_aligns_by_name() {
        let mut combined = table(&["date", "oi"], &[&["2020-01-07", "10"]]);
        combined.append(table(&["oi", "date", "conc"], &[&["11", "2021-01-05", "4.2"]]));

        assert_eq!(combined.columns(), &["date", "oi", "conc"]);
        assert_eq!(combined.rows()[0], vec!["2020-01-07", "10", ""]);
        assert_eq!(combined.rows()[1], vec!["2021-01-05", "11", "4.2"]);
    }

    #[test]
    fn short_rows_are_padded() {
        let t = table(&["a", "b", "c"], &[&["1"]]);
        assert_eq!(t.rows()[0], vec!["1", "", ""]);
    }

    #[test]
    fn concat_of_nothing_is_empty() {
        let combined = ReportTable::concat(Vec::new());
        assert!(combined.is_empty());
        assert!(combined.columns().is_empty());
    }

    #[test]
    fn append_matches_repeated_names_by_occurrence() {
        let mut combined = table(&["a", "b"], &[&["1", "2"]]);
        combined.append(table(&["a", "a", "c"], &[&["x", "y", "z"]]));

        assert_eq!(combined.columns(), &["a", "b", "a", "c"]);
        assert_eq!(combined.rows()[0], vec!["1", "2", "", ""]);
        assert_eq!(combined.rows()[1], vec!["x", "", "y", "z"]);
    }

    #[test]
    fn cells_past_the_header_get_positional_columns() {
        let t = table(&["a", "b"], &[&["1", "2"], &["3", "4", "extra"]]);
        assert_eq!(t.columns(), &["a", "b", "column_3"]);
        assert_eq!(t.rows()[0], vec!["1", "2", ""]);
        assert_eq!(t.value(1, "column_3"), Some("extra"));
    }

    #[test]
    fn extra_cells_survive_reordered_append() {
        let mut combined = table(&["a", "b"], &[&["1", "2"]]);
        combined.append(table(&["b", "a"], &[&["3", "4", "extra"]]));

        assert_eq!(combined.columns(), &["a", "b", "column_3"]);
        assert_eq!(combined.rows()[1], vec!["4", "3", "extra"]);
        assert_eq!(combined.records()[1]["column_3"], "extra");
    }

    #[test]
    fn records_keep_repeated_columns_apart() {
        let t = table(&["a", "a"], &[&["x", "y"]]);
        let records = t.records();
        assert_eq!(records[0]["a"], "x");
        assert_eq!(records[0]["a_2"], "y");
    }
}
