/// One `<table>` from the dataset document, cells kept as text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// `<caption>` text, when the publisher provides one.
    pub caption: Option<String>,
    /// Column labels in source order, with repeated labels disambiguated as
    /// `X`, `X.1`, `X.2`, ...
    pub labels: Vec<String>,
    /// Body rows, each padded or truncated to `labels.len()` cells.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(labels: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = labels.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self {
            caption: None,
            labels,
            rows,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_padded_and_truncated() {
        let t = RawTable::new(
            vec!["Week end".into(), "ON Tests".into()],
            vec![
                vec!["2024-01-06".into()],
                vec!["2024-01-13".into(), "12".into(), "extra".into()],
            ],
        );
        assert_eq!(t.rows[0], vec!["2024-01-06".to_string(), String::new()]);
        assert_eq!(t.rows[1].len(), 2);
        assert_eq!(t.cell(1, 1), Some("12"));
        assert_eq!(t.cell(2, 0), None);
    }
}
