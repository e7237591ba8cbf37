// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/decoder.rs - Code-page decoder for Ultiboard DDF design dumps.
 *  Copyright (C) 2026  The ulti2kicad developers
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

/*!
 * # `decoder` Module
 *
 * This module provides functionality to read an Ultiboard DDF design dump
 * and decode it from the fixed DOS code page 850 into lines of text.
 *
 * ## Usage Example
 *
 * ```no_run
 * use ulti2kicad::decoder::DecodedDdfFile;
 *
 * fn main() -> Result<(), std::io::Error> {
 *     let decoded = DecodedDdfFile::from_filename("example.ddf")?;
 *     println!("{} lines", decoded.lines.len());
 *     Ok(())
 * }
 * ```
 */

use std::fs::File;
use std::io::BufReader;
use std::io::prelude::*;

// Code page 850 upper half (0x80..=0xFF). The lower half is ASCII.
const CP850_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', //
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', 'ø', '£', 'Ø', '×', 'ƒ', //
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '®', '¬', '½', '¼', '¡', '«', '»', //
    '░', '▒', '▓', '│', '┤', 'Á', 'Â', 'À', '©', '╣', '║', '╗', '╝', '¢', '¥', '┐', //
    '└', '┴', '┬', '├', '─', '┼', 'ã', 'Ã', '╚', '╔', '╩', '╦', '╠', '═', '╬', '¤', //
    'ð', 'Ð', 'Ê', 'Ë', 'È', 'ı', 'Í', 'Î', 'Ï', '┘', '┌', '█', '▄', '¦', 'Ì', '▀', //
    'Ó', 'ß', 'Ô', 'Ò', 'õ', 'Õ', 'µ', 'þ', 'Þ', 'Ú', 'Û', 'Ù', 'ý', 'Ý', '¯', '´', //
    '\u{AD}', '±', '‗', '¾', '¶', '§', '÷', '¸', '°', '¨', '·', '¹', '³', '²', '■',
    '\u{A0}',
];

fn decode_cp850(data: &[u8]) -> String {
    data.iter()
        .map(|&b| {
            if b < 0x80 {
                b as char
            } else {
                CP850_HIGH[(b - 0x80) as usize]
            }
        })
        .collect()
}

/// An Ultiboard DDF file decoded into lines of text.
///
/// Line numbers elsewhere in this crate are 1-based indices into
/// [DecodedDdfFile::lines].
#[derive(Debug)]
pub struct DecodedDdfFile {
    /// The decoded lines of the file, in file order, without terminators.
    pub lines: Vec<String>,
}

impl DecodedDdfFile {
    /// Reads and decodes a DDF file from any byte source.
    pub fn new<R: Read>(mut reader: R) -> Result<Self, std::io::Error> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;

        let text = decode_cp850(&buffer);
        let mut lines: Vec<String> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();
        // A final newline terminates the last line; it does not start an
        // empty one.
        if text.ends_with('\n') {
            lines.pop();
        }

        Ok(Self { lines })
    }

    /// Opens, reads, and decodes the DDF file at `filename`.
    pub fn from_filename(filename: &str) -> Result<Self, std::io::Error> {
        let file = File::open(filename)?;
        let reader = BufReader::new(file);
        Self::new(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ascii_passthrough() {
        assert_eq!(decode_cp850(b"*N 'GND 1 2;"), "*N 'GND 1 2;");
    }

    #[test]
    fn test_decode_high_bytes() {
        // 0x81 -> u-umlaut, 0x9C -> pound sign, 0xE1 -> sharp s
        assert_eq!(decode_cp850(&[0x81, 0x9C, 0xE1]), "ü£ß");
        assert_eq!(decode_cp850(&[0xFF]), "\u{A0}");
    }

    #[test]
    fn test_lines_split_and_strip_crlf() {
        let decoded = DecodedDdfFile::new("a\r\nb\nc".as_bytes()).unwrap();
        assert_eq!(decoded.lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_trailing_newline_terminates_last_line() {
        let decoded = DecodedDdfFile::new("a\nb\n".as_bytes()).unwrap();
        assert_eq!(decoded.lines, vec!["a", "b"]);
        // Interior blank lines survive; only the terminator is dropped.
        let decoded = DecodedDdfFile::new("a\n\n".as_bytes()).unwrap();
        assert_eq!(decoded.lines, vec!["a", ""]);
        let decoded = DecodedDdfFile::new("".as_bytes()).unwrap();
        assert_eq!(decoded.lines, vec![""]);
    }
}
