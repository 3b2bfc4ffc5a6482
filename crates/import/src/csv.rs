use std::io::Read;
use tally_core::{Money, TransactionType};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

/// One record as read from the file: trimmed fields plus the line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub line: u64,
    pub fields: Vec<String>,
}

/// Lazy, single-pass reader over the data rows of an import file.
///
/// The first line is a header and never yielded. Rows may carry any number
/// of fields; interpretation is left to [`CsvRow::from_raw`].
pub struct RowReader<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
}

impl<R: Read> RowReader<R> {
    pub fn new(data: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(data);
        Self {
            records: reader.into_records(),
        }
    }
}

impl<R: Read> Iterator for RowReader<R> {
    type Item = Result<RawRow, CsvError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e.into())),
        };
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        Some(Ok(RawRow {
            line,
            fields: record.iter().map(|f| f.trim().to_string()).collect(),
        }))
    }
}

/// A data row interpreted positionally as `title,type,value,category`.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    pub title: String,
    pub kind: TransactionType,
    pub value: Money,
    /// `None` when the category column is blank or missing.
    pub category: Option<String>,
}

impl CsvRow {
    /// `None` when title, type or value is absent, or when type or value does
    /// not parse; those rows are dropped from the batch.
    pub fn from_raw(raw: &RawRow) -> Option<CsvRow> {
        let field = |idx: usize| {
            raw.fields
                .get(idx)
                .map(String::as_str)
                .filter(|s| !s.is_empty())
        };

        let (title, kind, value) = (field(0)?, field(1)?, field(2)?);

        let parsed = kind
            .parse::<TransactionType>()
            .and_then(|kind| Money::parse(value).map(|value| (kind, value)));
        let (kind, value) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(line = raw.line, "Skipping row: {e}");
                return None;
            }
        };

        Some(CsvRow {
            title: title.to_string(),
            kind,
            value,
            category: field(3).map(str::to_string),
        })
    }
}

/// Every usable row of one file, collected before anything is persisted.
#[derive(Debug, Default)]
pub struct ParsedBatch {
    pub rows: Vec<CsvRow>,
    pub skipped: usize,
}

impl ParsedBatch {
    /// Category names in row order, duplicates included, blanks omitted.
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().filter_map(|r| r.category.as_deref())
    }
}

/// Drains the reader to exhaustion.
pub fn parse_rows<R: Read>(data: R) -> Result<ParsedBatch, CsvError> {
    let mut batch = ParsedBatch::default();

    for raw in RowReader::new(data) {
        match CsvRow::from_raw(&raw?) {
            Some(row) => batch.rows.push(row),
            None => batch.skipped += 1,
        }
    }

    Ok(batch)
}
