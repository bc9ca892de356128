use crate::domain::LogRecord;
use std::io::BufRead;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed record on line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads NDJSON log records, one per line. Blank lines are skipped.
pub struct RecordReader<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    /// Reads up to `max` records. An empty batch means end of input.
    pub fn next_batch(&mut self, max: usize) -> Result<Vec<LogRecord>, InputError> {
        let mut batch = Vec::with_capacity(max.min(1024));
        while batch.len() < max {
            match self.next() {
                Some(record) => batch.push(record?),
                None => break,
            }
        }
        Ok(batch)
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<LogRecord, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
            self.line += 1;

            let trimmed = self.buf.trim();
            if trimmed.is_empty() {
                continue;
            }

            return Some(serde_json::from_str(trimmed).map_err(|source| {
                InputError::Malformed {
                    line: self.line,
                    source,
                }
            }));
        }
    }
}
