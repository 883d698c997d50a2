use std::path::Path;

use crate::error::MonitorError;

const MISSING_MARKERS: [&str; 5] = ["", "na", "nan", "null", "n/a"];

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

impl Column {
    fn from_cells(cells: Vec<Option<String>>) -> Self {
        let parsed: Option<Vec<Option<f64>>> = cells
            .iter()
            .map(|cell| match cell {
                None => Some(None),
                Some(raw) => raw.parse::<f64>().ok().filter(|v| v.is_finite()).map(Some),
            })
            .collect();

        match parsed {
            Some(values) if values.iter().any(Option::is_some) => Column::Numeric(values),
            _ => Column::Categorical(cells),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(values) => values.len(),
            Column::Categorical(values) => values.len(),
        }
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            Column::Numeric(values) => values.get(row).map_or(true, Option::is_none),
            Column::Categorical(values) => values.get(row).map_or(true, Option::is_none),
        }
    }

    pub fn text(&self, row: usize) -> Option<String> {
        match self {
            Column::Numeric(values) => values.get(row).copied().flatten().map(|v| v.to_string()),
            Column::Categorical(values) => values.get(row).cloned().flatten(),
        }
    }
}

/// A table of named columns read from delimited text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<(String, Column)>,
    rows: usize,
}

impl Dataset {
    pub fn from_csv(path: &Path, delimiter: u8) -> Result<Self, MonitorError> {
        if !path.exists() {
            return Err(MonitorError::DatasetNotFound(path.to_path_buf()));
        }
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_path(path)?;
        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Err(MonitorError::MissingHeader(path.to_path_buf()));
        }
        Self::from_records(&headers, reader.records())
    }

    fn from_records<I>(headers: &csv::StringRecord, records: I) -> Result<Self, MonitorError>
    where
        I: Iterator<Item = Result<csv::StringRecord, csv::Error>>,
    {
        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        let mut rows = 0usize;

        for result in records {
            let record = result?;
            for (index, column) in cells.iter_mut().enumerate() {
                let cell = record.get(index).and_then(normalize_cell);
                column.push(cell);
            }
            rows += 1;
        }

        let columns = headers
            .iter()
            .zip(cells)
            .map(|(name, values)| (name.to_string(), Column::from_cells(values)))
            .collect();

        Ok(Self { columns, rows })
    }

    /// Builds a dataset of numeric columns; used by fixtures and callers
    /// that already hold parsed values.
    pub fn from_numeric<S: Into<String>>(columns: Vec<(S, Vec<Option<f64>>)>) -> Self {
        let rows = columns.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
        let columns = columns
            .into_iter()
            .map(|(name, values)| (name.into(), Column::Numeric(values)))
            .collect();
        Self { columns, rows }
    }

    pub fn with_column<S: Into<String>>(mut self, name: S, column: Column) -> Self {
        self.rows = self.rows.max(column.len());
        self.columns.push((name.into(), column));
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(column_name, _)| column_name == name)
            .map(|(_, column)| column)
    }

    pub fn require_column(&self, name: &str) -> Result<&Column, MonitorError> {
        self.column(name).ok_or_else(|| MonitorError::MissingColumn {
            column: name.to_string(),
        })
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        matches!(self.column(name), Some(Column::Numeric(_)))
    }

    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|(_, column)| matches!(column, Column::Numeric(_)))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Non-missing values of a numeric column.
    pub fn values(&self, name: &str) -> Option<Vec<f64>> {
        match self.column(name)? {
            Column::Numeric(values) => Some(values.iter().flatten().copied().collect()),
            Column::Categorical(_) => None,
        }
    }
}

fn normalize_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if MISSING_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}
