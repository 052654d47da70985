use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::bufread::MultiGzDecoder;
use tracing::debug;

use crate::constants::transport::GZIP_MAGIC;
use crate::errors::{Location, ReaderError};
use crate::types::{LineNumber, RawLine};

/// Compression applied to an input file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Compression {
    /// Sniff the leading bytes for the gzip magic number.
    #[default]
    Auto,
    /// Uncompressed text.
    Plain,
    /// One or more concatenated gzip members.
    Gzip,
}

/// Buffered, already-decompressed byte stream over one input file.
pub type LineStream = Box<dyn BufRead + Send>;

/// Open `path` for line reading, resolving `Auto` to the detected compression.
pub fn open_stream(
    path: &Path,
    compression: Compression,
) -> Result<(LineStream, Compression), ReaderError> {
    let access = |source: io::Error| ReaderError::FileAccess {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(access)?;
    let mut reader = BufReader::new(file);
    let head = reader.fill_buf().map_err(access)?;
    // An empty file is an empty stream, never a truncated gzip member.
    let resolved = if head.is_empty() {
        Compression::Plain
    } else {
        match compression {
            Compression::Auto if head.starts_with(&GZIP_MAGIC) => Compression::Gzip,
            Compression::Auto => Compression::Plain,
            explicit => explicit,
        }
    };
    debug!(path = %path.display(), compression = ?resolved, "opened input file");
    let stream: LineStream = match resolved {
        Compression::Gzip => Box::new(BufReader::new(MultiGzDecoder::new(reader))),
        _ => Box::new(reader),
    };
    Ok((stream, resolved))
}

/// Pulls newline-terminated lines from a stream, tracking line numbers.
///
/// Read failures are classified by stream kind: a failing gzip stream is a
/// [`ReaderError::Decode`], a failing plain stream a [`ReaderError::FileAccess`].
/// Lines that are not UTF-8 are [`ReaderError::Parse`] failures.
pub struct LineReader<R> {
    inner: R,
    path: PathBuf,
    compression: Compression,
    line: LineNumber,
    buf: Vec<u8>,
}

impl LineReader<LineStream> {
    /// Open a file-backed line reader.
    pub fn open(path: impl AsRef<Path>, compression: Compression) -> Result<Self, ReaderError> {
        let path = path.as_ref();
        let (stream, resolved) = open_stream(path, compression)?;
        Ok(Self::new(stream, path, resolved))
    }
}

impl<R: BufRead> LineReader<R> {
    /// Wrap an already-decoded stream; `path` only labels errors.
    pub fn new(inner: R, path: impl Into<PathBuf>, compression: Compression) -> Self {
        Self {
            inner,
            path: path.into(),
            compression,
            line: 0,
            buf: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Lines pulled from the stream so far.
    pub fn lines_read(&self) -> LineNumber {
        self.line
    }

    /// Location of the most recently returned line.
    pub fn location(&self) -> Location {
        Location::new(self.path.clone(), self.line)
    }

    /// Next line without its terminator, or `None` at end of input.
    pub fn next_line(&mut self) -> Result<Option<RawLine>, ReaderError> {
        self.buf.clear();
        let read = match self.inner.read_until(b'\n', &mut self.buf) {
            Ok(read) => read,
            Err(source) => return Err(self.read_error(source)),
        };
        if read == 0 {
            return Ok(None);
        }
        self.line += 1;
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        String::from_utf8(std::mem::take(&mut self.buf))
            .map(Some)
            .map_err(|err| ReaderError::Parse {
                at: self.location(),
                reason: format!("line is not valid UTF-8: {err}"),
            })
    }

    fn read_error(&self, source: io::Error) -> ReaderError {
        match self.compression {
            Compression::Gzip => ReaderError::Decode {
                path: self.path.clone(),
                line: self.line + 1,
                source,
            },
            Compression::Auto | Compression::Plain => ReaderError::FileAccess {
                path: self.path.clone(),
                source,
            },
        }
    }
}
