//! Text encodings recognised by the line reader.

use std::convert::Infallible;
use std::str::FromStr;

use serde::Serialize;

/// Encoding of the text being read.
///
/// Only the byte patterns of CR and LF matter to the line reader; the rest
/// of the text is treated as opaque bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Encoding {
    /// Any single-byte character set (ASCII, Latin-1, UTF-8).
    #[default]
    SingleByte,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

/// Line terminator byte patterns for one encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terminators {
    /// Carriage return as one code unit.
    pub cr: &'static [u8],
    /// Line feed as one code unit.
    pub lf: &'static [u8],
    /// Code unit width in bytes: 1, 2 or 4.
    pub width: usize,
}

const UTF16LE_NAMES: [&str; 6] = [
    "UNICODE",
    "UNICODELITTLE",
    "UTF-16",
    "UTF-16LE",
    "UTF16",
    "UTF16LE",
];
const UTF16BE_NAMES: [&str; 4] = ["UNICODEBIG", "UNICODEFFFE", "UTF-16BE", "UTF16BE"];
const UTF32LE_NAMES: [&str; 4] = ["UTF-32", "UTF-32LE", "UTF32", "UTF32LE"];
const UTF32BE_NAMES: [&str; 2] = ["UTF-32BE", "UTF32BE"];

impl Encoding {
    /// Look up an encoding by name, ignoring ASCII case.
    ///
    /// The empty string and any unrecognised name mean [`Encoding::SingleByte`].
    pub fn from_name(name: &str) -> Self {
        let is = |names: &[&str]| names.iter().any(|n| n.eq_ignore_ascii_case(name));

        if name.is_empty() {
            Encoding::SingleByte
        } else if is(&UTF16LE_NAMES) {
            Encoding::Utf16Le
        } else if is(&UTF16BE_NAMES) {
            Encoding::Utf16Be
        } else if is(&UTF32LE_NAMES) {
            Encoding::Utf32Le
        } else if is(&UTF32BE_NAMES) {
            Encoding::Utf32Be
        } else {
            Encoding::SingleByte
        }
    }

    /// Canonical name, as accepted by [`from_name`](Self::from_name).
    pub const fn name(self) -> &'static str {
        match self {
            Encoding::SingleByte => "",
            Encoding::Utf16Le => "UTF-16LE",
            Encoding::Utf16Be => "UTF-16BE",
            Encoding::Utf32Le => "UTF-32LE",
            Encoding::Utf32Be => "UTF-32BE",
        }
    }

    pub const fn terminators(self) -> Terminators {
        match self {
            Encoding::SingleByte => Terminators {
                cr: b"\r",
                lf: b"\n",
                width: 1,
            },
            Encoding::Utf16Le => Terminators {
                cr: b"\r\0",
                lf: b"\n\0",
                width: 2,
            },
            Encoding::Utf16Be => Terminators {
                cr: b"\0\r",
                lf: b"\0\n",
                width: 2,
            },
            Encoding::Utf32Le => Terminators {
                cr: b"\r\0\0\0",
                lf: b"\n\0\0\0",
                width: 4,
            },
            Encoding::Utf32Be => Terminators {
                cr: b"\0\0\0\r",
                lf: b"\0\0\0\n",
                width: 4,
            },
        }
    }

    /// Code unit width in bytes.
    pub const fn width(self) -> usize {
        self.terminators().width
    }

    /// Decode bytes for display, replacing invalid sequences with U+FFFD.
    ///
    /// Single-byte text is decoded as UTF-8.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::SingleByte => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Utf16Le => decode_utf16(bytes, u16::from_le_bytes),
            Encoding::Utf16Be => decode_utf16(bytes, u16::from_be_bytes),
            Encoding::Utf32Le => decode_utf32(bytes, u32::from_le_bytes),
            Encoding::Utf32Be => decode_utf32(bytes, u32::from_be_bytes),
        }
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let chunks = bytes.chunks_exact(2);
    let partial = !chunks.remainder().is_empty();
    let units = chunks.map(|c| unit([c[0], c[1]]));

    let mut text: String = char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
    if partial {
        text.push(char::REPLACEMENT_CHARACTER);
    }
    text
}

fn decode_utf32(bytes: &[u8], unit: fn([u8; 4]) -> u32) -> String {
    let chunks = bytes.chunks_exact(4);
    let partial = !chunks.remainder().is_empty();

    let mut text: String = chunks
        .map(|c| {
            char::from_u32(unit([c[0], c[1], c[2], c[3]])).unwrap_or(char::REPLACEMENT_CHARACTER)
        })
        .collect();
    if partial {
        text.push(char::REPLACEMENT_CHARACTER);
    }
    text
}

impl FromStr for Encoding {
    type Err = Infallible;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Ok(Encoding::from_name(name))
    }
}

impl From<&str> for Encoding {
    fn from(name: &str) -> Self {
        Encoding::from_name(name)
    }
}
