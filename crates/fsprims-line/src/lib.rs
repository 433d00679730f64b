//! fsprims-line: Encoding-aware single line reads.
//!
//! [`read_line`] reads one block from a descriptor, finds the end of the
//! first line in it, and seeks back so the descriptor sits exactly after the
//! line terminator. Repeated calls therefore walk a file line by line even
//! though each call issues a single block read, and a tailer can stop at any
//! point and resume later from the saved offset.
//!
//! ## Terminators
//!
//! | Sequence | Convention | Line ends after |
//! |----------|------------|-----------------|
//! | LF | Unix | LF |
//! | CR LF | Windows | LF |
//! | CR not followed by LF | classic Mac | CR |
//!
//! Patterns are matched one code unit at a time, so UTF-16 and UTF-32 text
//! is handled without decoding it.
//!
//! ## Example
//!
//! ```no_run
//! use fsprims_line::{read_line, Encoding};
//!
//! let mut file = std::fs::File::open("/var/log/app.log")?;
//! let mut buf = [0u8; 4096];
//! loop {
//!     let n = read_line(&mut file, &mut buf, Encoding::from_name("UTF-16LE"))?;
//!     if n == 0 {
//!         break;
//!     }
//!     println!("{} bytes", n);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::io::{Read, Seek, SeekFrom};

use fsprims_core::{FsprimsError, FsprimsResult};

mod encoding;

pub use encoding::{Encoding, Terminators};

/// Length of the first line in `chunk`, terminator included.
///
/// Without a terminator the whole chunk is the line. A chunk shorter than
/// one code unit is returned whole as well.
pub fn find_line_end(chunk: &[u8], encoding: Encoding) -> usize {
    let Terminators { cr, lf, width } = encoding.terminators();
    let len = chunk.len();
    if len < width {
        return len;
    }

    let last = len - width;
    let mut i = 0;
    while i <= last {
        let unit = &chunk[i..i + width];

        if unit == lf {
            return i + width;
        }

        if unit == cr {
            if i < last && &chunk[i + width..i + 2 * width] == lf {
                return i + 2 * width;
            }
            return i + width;
        }

        i += width;
    }

    len
}

/// Read one line from `reader` into `buf`.
///
/// Returns the number of bytes of the line, terminator included, which
/// occupy the start of `buf`. `Ok(0)` means end of stream. Afterwards the
/// reader is positioned right after the returned line.
///
/// A line longer than `buf` is returned in `buf`-sized pieces.
///
/// # Errors
///
/// `Io` if querying the position, reading, or seeking fails.
pub fn read_line<R>(
    reader: &mut R,
    buf: &mut [u8],
    encoding: impl Into<Encoding>,
) -> FsprimsResult<usize>
where
    R: Read + Seek + ?Sized,
{
    let offset = reader
        .stream_position()
        .map_err(|e| FsprimsError::io("seek", "", e))?;

    let nbytes = reader
        .read(buf)
        .map_err(|e| FsprimsError::io("read", "", e))?;
    if nbytes == 0 {
        return Ok(0);
    }

    let consumed = find_line_end(&buf[..nbytes], encoding.into());

    reader
        .seek(SeekFrom::Start(offset + consumed as u64))
        .map_err(|e| FsprimsError::io("seek", "", e))?;

    Ok(consumed)
}

// ============================================================================
// LineReader
// ============================================================================

/// Line-by-line reader over a seekable source, for tailing files.
///
/// Keeps its own buffer and the offset of the next unread byte. The offset
/// can be saved and handed to [`LineReader::at_offset`] to resume later.
#[derive(Debug)]
pub struct LineReader<R> {
    reader: R,
    buf: Vec<u8>,
    encoding: Encoding,
    offset: u64,
}

impl<R: Read + Seek> LineReader<R> {
    /// Start reading at the reader's current position.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `capacity` is zero, `Io` if the position cannot
    /// be queried.
    pub fn new(
        mut reader: R,
        capacity: usize,
        encoding: impl Into<Encoding>,
    ) -> FsprimsResult<Self> {
        if capacity == 0 {
            return Err(FsprimsError::invalid_argument("line buffer capacity must be > 0"));
        }

        let offset = reader
            .stream_position()
            .map_err(|e| FsprimsError::io("seek", "", e))?;

        Ok(Self {
            reader,
            buf: vec![0; capacity],
            encoding: encoding.into(),
            offset,
        })
    }

    /// Start reading at `offset`.
    pub fn at_offset(
        mut reader: R,
        offset: u64,
        capacity: usize,
        encoding: impl Into<Encoding>,
    ) -> FsprimsResult<Self> {
        reader
            .seek(SeekFrom::Start(offset))
            .map_err(|e| FsprimsError::io("seek", "", e))?;
        Self::new(reader, capacity, encoding)
    }

    /// Offset of the next unread byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Next line, or `None` at the current end of the source.
    ///
    /// After `None`, a later call picks up data appended in the meantime.
    pub fn next_line(&mut self) -> FsprimsResult<Option<&[u8]>> {
        let n = read_line(&mut self.reader, &mut self.buf, self.encoding)?;
        if n == 0 {
            return Ok(None);
        }
        self.offset += n as u64;
        Ok(Some(&self.buf[..n]))
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Seek> Iterator for LineReader<R> {
    type Item = FsprimsResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line()
            .map(|line| line.map(<[u8]>::to_vec))
            .transpose()
    }
}
