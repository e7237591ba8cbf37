// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/reader.rs - Pull-based cursor over logical DDF records.
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
 * # `reader` Module
 *
 * A pull-based cursor over the logical records of a decoded DDF file.
 *
 * A record is introduced by a line whose first character is `*`; the second
 * character is the record-type tag. The lines that follow, up to the next
 * record line, belong to the record and are consumed by the caller with
 * [RecordReader::next_line]. The cursor never rewinds; skipping a record is
 * simply not consuming its remaining lines before the next
 * [RecordReader::next_record] call.
 */

use crate::decoder::DecodedDdfFile;
use crate::error::ConvertError;
use crate::units::BoardUnit;

/// The header line of one logical record.
#[derive(Debug, Clone, Copy)]
pub struct RecordHeader<'a> {
    /// The record-type tag, the second character of the `*` line.
    pub tag: char,
    /// The full record line, trimmed.
    pub text: &'a str,
    /// 1-based line number of the record line.
    pub line: usize,
}

/// A forward-only cursor over the lines of a decoded DDF file.
#[derive(Debug)]
pub struct RecordReader<'a> {
    lines: &'a [String],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    pub fn new(decoded: &'a DecodedDdfFile) -> Self {
        Self {
            lines: &decoded.lines,
            pos: 0,
        }
    }

    /// 1-based line number of the most recently yielded line.
    pub fn line_number(&self) -> usize {
        self.pos
    }

    /// Advances to the next record line, skipping anything in between.
    pub fn next_record(&mut self) -> Option<RecordHeader<'a>> {
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos].trim();
            self.pos += 1;
            if line.starts_with('*') {
                if let Some(tag) = line.chars().nth(1) {
                    return Some(RecordHeader {
                        tag,
                        text: line,
                        line: self.pos,
                    });
                }
            }
        }
        None
    }

    /// Yields the next line of the current record, trimmed.
    ///
    /// Returns `None` when the stream is exhausted; the caller maps that to
    /// an unexpected-end-of-stream error with record context.
    pub fn next_line(&mut self) -> Option<&'a str> {
        if self.pos < self.lines.len() {
            let line = self.lines[self.pos].trim();
            self.pos += 1;
            Some(line)
        } else {
            None
        }
    }

    /// Like [RecordReader::next_line], but a multi-line record running off
    /// the end of the stream is a structural (fatal) error.
    pub fn require_line(&mut self, tag: char) -> Result<&'a str, ConvertError> {
        self.next_line()
            .ok_or(ConvertError::UnexpectedEndOfStream {
                line: self.pos,
                tag,
            })
    }
}

pub(crate) fn malformed(line: usize, tag: char, reason: impl Into<String>) -> ConvertError {
    ConvertError::MalformedRecord {
        line,
        tag,
        reason: reason.into(),
    }
}

/// Splits `text` on `sep` and parses every non-empty field as a board-unit
/// integer.
pub(crate) fn parse_ints<F>(
    text: &str,
    sep: F,
    line: usize,
    tag: char,
) -> Result<Vec<BoardUnit>, ConvertError>
where
    F: Fn(char) -> bool,
{
    text.split(sep)
        .filter(|field| !field.is_empty())
        .map(|field| {
            field
                .trim()
                .parse::<BoardUnit>()
                .map_err(|_| malformed(line, tag, format!("bad integer field \"{}\"", field)))
        })
        .collect()
}

/// Drops the final character of a content line (the `;` or `,` marker
/// position the source format reserves there).
pub fn strip_last_char(line: &str) -> &str {
    match line.char_indices().last() {
        Some((index, _)) => &line[..index],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(text: &str) -> DecodedDdfFile {
        DecodedDdfFile::new(text.as_bytes()).unwrap()
    }

    #[test]
    fn test_records_are_found_by_leading_star() {
        let d = decoded("junk\n*N 'GND 0;\ndata\n*V 100\n");
        let mut reader = RecordReader::new(&d);

        let first = reader.next_record().unwrap();
        assert_eq!(first.tag, 'N');
        assert_eq!(first.line, 2);

        // Sub-lines of the first record were not consumed; the cursor skips
        // them while scanning for the next record.
        let second = reader.next_record().unwrap();
        assert_eq!(second.tag, 'V');
        assert_eq!(second.line, 4);

        assert!(reader.next_record().is_none());
    }

    #[test]
    fn test_next_line_consumes_record_body() {
        let d = decoded("*S DIP8\n 0 0 0 0 0 0 \n;\n");
        let mut reader = RecordReader::new(&d);

        reader.next_record().unwrap();
        assert_eq!(reader.next_line(), Some("0 0 0 0 0 0"));
        assert_eq!(reader.next_line(), Some(";"));
        assert_eq!(reader.next_line(), None);
        assert_eq!(reader.line_number(), 3);
    }

    #[test]
    fn test_bare_star_line_is_not_a_record() {
        let d = decoded("*\n*X 0 0 1 1 5 0 0 hi\n");
        let mut reader = RecordReader::new(&d);
        assert_eq!(reader.next_record().unwrap().tag, 'X');
    }
}
