//! Buffered text streams opened with `fopen`-style mode strings.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fsprims_core::{FsprimsError, FsprimsResult};

/// A buffered stream over an open file.
///
/// Reads are buffered; writes go straight to the file, so `flush` is
/// cheap. As with C stdio, switching from reading to writing needs a
/// [`Seek`] in between to drop buffered input.
///
/// [`close`](Stream::close) may be called any number of times; only the
/// first call closes the file.
#[derive(Debug)]
pub struct Stream {
    path: PathBuf,
    inner: Option<BufReader<File>>,
}

impl Stream {
    pub(crate) fn open(physical: PathBuf, mode: &str) -> FsprimsResult<Self> {
        let file = stream_options(mode)?
            .open(&physical)
            .map_err(|e| FsprimsError::from_io("open", &physical, e))?;

        Ok(Self {
            path: physical,
            inner: Some(BufReader::new(file)),
        })
    }

    /// Physical path the stream was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The underlying file, unless the stream is closed.
    pub fn file(&self) -> Option<&File> {
        self.inner.as_ref().map(BufReader::get_ref)
    }

    /// Whether [`close`](Stream::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Close the stream, surfacing the OS error from the close call.
    ///
    /// Closing an already closed stream succeeds without doing anything.
    pub fn close(&mut self) -> FsprimsResult<()> {
        match self.inner.take() {
            Some(reader) => crate::platform::close_impl(reader.into_inner())
                .map_err(|e| FsprimsError::io("close", &self.path, e)),
            None => Ok(()),
        }
    }

    fn live(&mut self) -> io::Result<&mut BufReader<File>> {
        self.inner.as_mut().ok_or_else(closed)
    }
}

fn closed() -> io::Error {
    io::Error::other("stream is closed")
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.live()?.read(buf)
    }
}

impl BufRead for Stream {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self.inner.as_mut() {
            Some(reader) => reader.fill_buf(),
            None => Err(closed()),
        }
    }

    fn consume(&mut self, amt: usize) {
        if let Some(reader) = self.inner.as_mut() {
            reader.consume(amt);
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.live()?.get_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.live()?.get_mut().flush()
    }
}

impl Seek for Stream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.live()?.seek(pos)
    }
}

/// Close an optional stream. `None` is a successful no-op.
pub fn close_stream(stream: Option<Stream>) -> FsprimsResult<()> {
    match stream {
        Some(mut stream) => stream.close(),
        None => Ok(()),
    }
}

/// Translate an `fopen` mode string into open options.
///
/// Accepts `r`, `w`, `a`, `r+`, `w+`, `a+`, each with an optional `b`
/// anywhere after the first character. Streams never translate newlines,
/// so `b` changes nothing.
fn stream_options(mode: &str) -> FsprimsResult<OpenOptions> {
    let normalized: String = mode.chars().filter(|c| *c != 'b').collect();
    if mode.starts_with('b') {
        return Err(FsprimsError::invalid_argument(format!(
            "unsupported stream mode '{mode}'"
        )));
    }

    let mut opts = OpenOptions::new();
    match normalized.as_str() {
        "r" => {
            opts.read(true);
        }
        "r+" => {
            opts.read(true).write(true);
        }
        "w" => {
            opts.write(true).create(true).truncate(true);
        }
        "w+" => {
            opts.read(true).write(true).create(true).truncate(true);
        }
        "a" => {
            opts.append(true).create(true);
        }
        "a+" => {
            opts.read(true).append(true).create(true);
        }
        _ => {
            return Err(FsprimsError::invalid_argument(format!(
                "unsupported stream mode '{mode}'"
            )));
        }
    }
    Ok(opts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_options_accepts_fopen_modes() {
        for mode in ["r", "rb", "r+", "rb+", "r+b", "w", "wb", "w+", "a", "ab", "a+"] {
            assert!(stream_options(mode).is_ok(), "mode {mode} rejected");
        }
    }

    #[test]
    fn stream_options_rejects_unknown_modes() {
        for mode in ["", "x", "rw", "b", "br", "wt", "r++"] {
            let err = stream_options(mode).unwrap_err();
            assert!(
                matches!(err, FsprimsError::InvalidArgument { .. }),
                "mode {mode:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn close_stream_none_is_ok() {
        assert!(close_stream(None).is_ok());
    }
}
