//! Incremental CSV decoder
//!
//! Record boundaries, quoting and line endings are handled by a single
//! `csv_core::Reader` kept across chunks, so a record split over any number
//! of chunks decodes the same as one read in full.

use super::types::{CsvOptions, ShortRowPolicy};
use crate::error::{Error, Result};
use crate::types::Row;
use csv_core::{ReadRecordResult, Reader, ReaderBuilder};
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Push-based CSV decoder producing header-keyed rows
pub struct CsvRowDecoder {
    options: CsvOptions,
    /// Bytes held back until the BOM and the delimiter are settled
    pending: Vec<u8>,
    bom_checked: bool,
    delimiter: Option<u8>,
    /// Built once the delimiter is known
    reader: Option<Reader>,
    /// Field bytes of the record being read
    fields: Vec<u8>,
    /// Field end offsets into `fields`
    ends: Vec<usize>,
    fields_len: usize,
    ends_len: usize,
    headers: Option<Vec<String>>,
    rows: usize,
}

impl CsvRowDecoder {
    /// Create a decoder
    pub fn new(options: CsvOptions) -> Self {
        Self {
            delimiter: options.delimiter,
            options,
            pending: Vec::new(),
            bom_checked: false,
            reader: None,
            fields: vec![0; 1024],
            ends: vec![0; 32],
            fields_len: 0,
            ends_len: 0,
            headers: None,
            rows: 0,
        }
    }

    /// Header row, once it has been read
    pub fn headers(&self) -> Option<&[String]> {
        self.headers.as_deref()
    }

    /// Delimiter in use, once known
    pub fn delimiter(&self) -> Option<u8> {
        self.delimiter
    }

    /// Number of data rows produced so far
    pub fn rows_decoded(&self) -> usize {
        self.rows
    }

    /// Feed a chunk of bytes, returning the rows it completed
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Row>> {
        let mut rows = Vec::new();

        if self.reader.is_some() {
            self.read(chunk, &mut rows)?;
            return Ok(rows);
        }

        self.pending.extend_from_slice(chunk);

        if !self.bom_checked {
            if self.pending.len() < UTF8_BOM.len() && UTF8_BOM.starts_with(&self.pending) {
                return Ok(rows);
            }
            self.strip_bom();
        }

        let Some(line_end) = self.pending.iter().position(|&b| b == b'\n') else {
            if self.delimiter.is_none() {
                return Ok(rows);
            }
            self.start_reader();
            let pending = std::mem::take(&mut self.pending);
            self.read(&pending, &mut rows)?;
            return Ok(rows);
        };

        if self.delimiter.is_none() {
            let d = sniff_delimiter(&self.pending[..line_end]);
            debug!("CSV delimiter sniffed as {:?}", d as char);
            self.delimiter = Some(d);
        }
        self.start_reader();

        let pending = std::mem::take(&mut self.pending);
        self.read(&pending, &mut rows)?;
        Ok(rows)
    }

    /// Flush whatever is left after the last chunk
    ///
    /// A final record without a line terminator, or with an unterminated
    /// quote, is emitted here.
    pub fn finish(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();

        if self.reader.is_none() {
            if !self.bom_checked {
                self.strip_bom();
            }
            if self.pending.is_empty() {
                debug!("CSV decoder finished without input");
                return Ok(rows);
            }
            if self.delimiter.is_none() {
                self.delimiter = Some(sniff_delimiter(&self.pending));
            }
            self.start_reader();
            let pending = std::mem::take(&mut self.pending);
            self.read(&pending, &mut rows)?;
        }

        // Empty input tells the reader the stream has ended
        self.read_to_end(&mut rows)?;

        debug!("CSV decoder finished after {} rows", self.rows);
        Ok(rows)
    }

    fn strip_bom(&mut self) {
        if self.pending.starts_with(UTF8_BOM) {
            self.pending.drain(..UTF8_BOM.len());
        }
        self.bom_checked = true;
    }

    fn start_reader(&mut self) {
        let delimiter = self.delimiter.unwrap_or(b',');
        self.reader = Some(
            ReaderBuilder::new()
                .delimiter(delimiter)
                .quote(self.options.quote)
                .build(),
        );
    }

    /// Push `input` through the reader, emitting every record it completes
    fn read(&mut self, mut input: &[u8], rows: &mut Vec<Row>) -> Result<()> {
        while !input.is_empty() {
            let (result, consumed) = self.read_step(input);
            input = &input[consumed..];
            if matches!(result, ReadRecordResult::Record) {
                self.emit_record(rows)?;
            }
        }
        Ok(())
    }

    fn read_to_end(&mut self, rows: &mut Vec<Row>) -> Result<()> {
        loop {
            match self.read_step(&[]).0 {
                ReadRecordResult::Record => self.emit_record(rows)?,
                ReadRecordResult::End => return Ok(()),
                _ => {}
            }
        }
    }

    fn read_step(&mut self, input: &[u8]) -> (ReadRecordResult, usize) {
        let Some(reader) = self.reader.as_mut() else {
            return (ReadRecordResult::End, input.len());
        };

        let (result, nin, nout, nend) = reader.read_record(
            input,
            &mut self.fields[self.fields_len..],
            &mut self.ends[self.ends_len..],
        );
        self.fields_len += nout;
        self.ends_len += nend;

        match result {
            ReadRecordResult::OutputFull => {
                let len = self.fields.len();
                self.fields.resize(len * 2, 0);
            }
            ReadRecordResult::OutputEndsFull => {
                let len = self.ends.len();
                self.ends.resize(len * 2, 0);
            }
            _ => {}
        }
        (result, nin)
    }

    fn emit_record(&mut self, rows: &mut Vec<Row>) -> Result<()> {
        let record_no = self.rows + usize::from(self.headers.is_some()) + 1;
        let ends_len = std::mem::take(&mut self.ends_len);
        self.fields_len = 0;

        let mut values = Vec::with_capacity(ends_len);
        let mut start = 0;
        for &end in &self.ends[..ends_len] {
            let value = std::str::from_utf8(&self.fields[start..end]).map_err(|e| {
                Error::decode(format!("invalid UTF-8 in CSV record {record_no}: {e}"))
            })?;
            values.push(value.to_string());
            start = end;
        }

        let Some(headers) = &self.headers else {
            self.headers = Some(values);
            return Ok(());
        };

        let mut row = Row::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            match values.get(i) {
                Some(value) => {
                    row.insert(header.clone(), value.clone());
                }
                None if self.options.short_rows == ShortRowPolicy::FillEmpty => {
                    row.insert(header.clone(), String::new());
                }
                None => break,
            }
        }

        rows.push(row);
        self.rows += 1;
        Ok(())
    }
}

impl std::fmt::Debug for CsvRowDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvRowDecoder")
            .field("options", &self.options)
            .field("delimiter", &self.delimiter)
            .field("headers", &self.headers)
            .field("rows", &self.rows)
            .finish_non_exhaustive()
    }
}

/// Decode a complete CSV document in one call
pub fn decode_all(bytes: &[u8], options: CsvOptions) -> Result<Vec<Row>> {
    let mut decoder = CsvRowDecoder::new(options);
    let mut rows = decoder.feed(bytes)?;
    rows.extend(decoder.finish()?);
    Ok(rows)
}

/// `;` when the header has semicolons and no commas, `,` otherwise
fn sniff_delimiter(header: &[u8]) -> u8 {
    if header.contains(&b';') && !header.contains(&b',') {
        b';'
    } else {
        b','
    }
}
