//! Record decoder: raw CSV bytes to an ordered sequence of raw rows.
//!
//! Decoding is purely structural. Each data row becomes a map from header
//! name to cell value; a short row yields absent keys rather than an error,
//! and cells beyond the header count are dropped. Semantic checks belong to
//! the validator.

use crate::error::DecodeError;
use crate::record::RawRow;
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter, Trim};

/// A lazy, header-driven iterator over the data rows of a CSV document.
///
/// The whole input is checked for UTF-8 validity up front, so iteration only
/// surfaces structural CSV errors (e.g. an unterminated quote). Empty input,
/// or input with a header row only, yields an empty sequence.
pub struct RecordDecoder<'a> {
    headers: StringRecord,
    records: StringRecordsIntoIter<&'a [u8]>,
}

impl std::fmt::Debug for RecordDecoder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordDecoder")
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl<'a> RecordDecoder<'a> {
    /// Builds a decoder over raw uploaded bytes.
    ///
    /// Fails with `DecodeError::Utf8` if the bytes are not valid UTF-8 text,
    /// or `DecodeError::Csv` if the header row itself is malformed.
    pub fn new(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(bytes)?;

        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();

        Ok(RecordDecoder {
            headers,
            records: reader.into_records(),
        })
    }

    /// The header names, in file order.
    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    fn to_row(&self, record: StringRecord) -> RawRow {
        // Zipping stops at the shorter side: short rows lack trailing keys,
        // extra cells beyond the header count are dropped.
        self.headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.to_string(), cell.to_string()))
            .collect()
    }
}

impl Iterator for RecordDecoder<'_> {
    type Item = Result<RawRow, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.records.next()? {
            Ok(record) => Some(Ok(self.to_row(record))),
            Err(e) => Some(Err(DecodeError::Csv(e))),
        }
    }
}
