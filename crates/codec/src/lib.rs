//! # Codec - CSV Line Codec
//!
//! Transport layer of the CsvDB storage engine. Turns a file path into a
//! sequential stream of records (one record per line, every field a string)
//! and back.
//!
//! Compression is decided purely by the **path suffix** handed to the codec:
//! `.gz` and `.gzip` files are transparently framed with gzip on both the read
//! and the write side. The codec never looks at any table-level flag.
//!
//! ## Write modes
//!
//! ```text
//! Append   -> create if missing, keep existing content, write at the end
//! Truncate -> create if missing, discard existing content
//! ```
//!
//! Appending to a gzip file adds a new gzip member after the existing ones.
//! The reader therefore decodes with a multi-member decoder, so a file that
//! was flushed N times reads back as one continuous record stream.
//!
//! ## Example
//!
//! ```rust,no_run
//! use codec::{CsvReader, CsvWriter, WriteMode};
//!
//! let mut w = CsvWriter::open("users.csv.gz", WriteMode::Append).unwrap();
//! w.write_record(&["1".to_string(), "alice".to_string()]).unwrap();
//! w.close().unwrap();
//!
//! let mut r = CsvReader::open("users.csv.gz").unwrap();
//! while let Some(rec) = r.next_record().unwrap() {
//!     println!("{:?}", rec);
//! }
//! ```

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while reading or writing record files.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The target file could not be opened.
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An underlying I/O error (including gzip framing errors).
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A record could not be encoded or decoded as CSV.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The writer was already closed.
    #[error("writer is closed")]
    Closed,
}

/// Framing applied on top of the CSV stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Plain,
    Gzip,
}

impl Compression {
    /// Infers the framing from the path suffix (`.gz` / `.gzip`).
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("gz") | Some("gzip") => Compression::Gzip,
            _ => Compression::Plain,
        }
    }
}

/// File-open discipline for [`CsvWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Preserve existing content and add records at the end.
    Append,
    /// Truncate the file before writing.
    Truncate,
}

/// Sequential record reader over a plain or gzip-framed CSV file.
///
/// The first decode error is returned once from [`next_record`]; every
/// later call reports end of stream.
///
/// [`next_record`]: CsvReader::next_record
pub struct CsvReader {
    rdr: csv::Reader<Box<dyn Read>>,
    record: csv::StringRecord,
    path: PathBuf,
    compression: Compression,
    /// Set after EOF or the first error; no further reads are attempted.
    done: bool,
}

impl CsvReader {
    /// Opens `path` for reading, choosing gzip framing from its suffix.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CodecError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| CodecError::Open {
            path: path.clone(),
            source,
        })?;
        let compression = Compression::from_path(&path);

        // A zero-length gzip file has no member header at all; treat it as an
        // empty stream rather than a framing error.
        let empty = file.metadata()?.len() == 0;
        let src: Box<dyn Read> = match compression {
            _ if empty => Box::new(io::empty()),
            Compression::Gzip => Box::new(MultiGzDecoder::new(BufReader::new(file))),
            Compression::Plain => Box::new(BufReader::new(file)),
        };

        Ok(Self::with_source(src, path, compression))
    }

    /// Builds a reader over any byte source. Used by tests with in-memory data.
    pub fn from_reader<R: Read + 'static>(reader: R) -> Self {
        Self::with_source(Box::new(reader), PathBuf::new(), Compression::Plain)
    }

    fn with_source(src: Box<dyn Read>, path: PathBuf, compression: Compression) -> Self {
        let rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(src);
        Self {
            rdr,
            record: csv::StringRecord::new(),
            path,
            compression,
            done: false,
        }
    }

    /// Returns the next record, `Ok(None)` at end of stream, or the first
    /// decode error. After an error every call returns `Ok(None)`.
    pub fn next_record(&mut self) -> Result<Option<Vec<String>>, CodecError> {
        if self.done {
            return Ok(None);
        }
        match self.rdr.read_record(&mut self.record) {
            Ok(true) => Ok(Some(self.record.iter().map(str::to_string).collect())),
            Ok(false) => {
                self.done = true;
                Ok(None)
            }
            Err(e) => {
                self.done = true;
                Err(CodecError::Csv(e))
            }
        }
    }

    /// Path this reader was opened on (empty for in-memory readers).
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }
}

/// Byte sink below the CSV encoder.
enum Sink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Plain(w) => w.write(buf),
            Sink::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Plain(w) => w.flush(),
            Sink::Gzip(w) => w.flush(),
        }
    }
}

impl Sink {
    /// Finishes the compression layer first, then the file buffer.
    fn finish(self) -> io::Result<()> {
        match self {
            Sink::Plain(mut w) => w.flush(),
            Sink::Gzip(enc) => {
                let mut w = enc.finish()?;
                w.flush()
            }
        }
    }
}

/// Record writer over a plain or gzip-framed CSV file.
///
/// [`close`](CsvWriter::close) must be called to surface errors from the
/// final gzip trailer write. Dropping an open writer closes it and discards
/// any error.
pub struct CsvWriter {
    wtr: Option<csv::Writer<Sink>>,
    path: PathBuf,
    compression: Compression,
}

impl CsvWriter {
    /// Opens (or creates) `path` with the given write mode.
    pub fn open<P: AsRef<Path>>(path: P, mode: WriteMode) -> Result<Self, CodecError> {
        let path = path.as_ref().to_path_buf();
        let mut opts = OpenOptions::new();
        opts.create(true).write(true);
        match mode {
            WriteMode::Append => opts.append(true),
            WriteMode::Truncate => opts.truncate(true),
        };
        let file = opts.open(&path).map_err(|source| CodecError::Open {
            path: path.clone(),
            source,
        })?;

        let compression = Compression::from_path(&path);
        let sink = match compression {
            Compression::Gzip => Sink::Gzip(GzEncoder::new(
                BufWriter::new(file),
                flate2::Compression::default(),
            )),
            Compression::Plain => Sink::Plain(BufWriter::new(file)),
        };

        Ok(Self {
            wtr: Some(csv::Writer::from_writer(sink)),
            path,
            compression,
        })
    }

    /// Encodes and buffers one record.
    pub fn write_record(&mut self, record: &[String]) -> Result<(), CodecError> {
        let wtr = self.wtr.as_mut().ok_or(CodecError::Closed)?;
        wtr.write_record(record)?;
        Ok(())
    }

    /// Pushes buffered output to the underlying stream without closing it.
    pub fn flush(&mut self) -> Result<(), CodecError> {
        let wtr = self.wtr.as_mut().ok_or(CodecError::Closed)?;
        wtr.flush()?;
        Ok(())
    }

    /// Releases the compression layer and then the file handle.
    ///
    /// Calling `close` on an already closed writer is a no-op.
    pub fn close(&mut self) -> Result<(), CodecError> {
        if let Some(wtr) = self.wtr.take() {
            let sink = wtr
                .into_inner()
                .map_err(|e| CodecError::Io(e.into_error()))?;
            sink.finish()?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }
}

impl Drop for CsvWriter {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
