// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/error.rs - Conversion error types.
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

use thiserror::Error;

/// Errors raised while converting a DDF record stream.
///
/// Every variant carries the 1-based line number of the record that raised it
/// and the record's type tag. Per-record errors are collected as warnings at
/// the dispatch boundary and the stream continues; only
/// [ConvertError::UnexpectedEndOfStream] is fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("line {line}: record *{tag}: placement references unknown shape \"{name}\"")]
    UnknownShape { line: usize, tag: char, name: String },

    #[error(
        "line {line}: record *{tag}: net list has {got} entries but shape \"{name}\" has {expected} pads"
    )]
    PadCountMismatch {
        line: usize,
        tag: char,
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("line {line}: record *{tag}: unsupported pad rotation {rotation} degrees")]
    UnsupportedPadRotation {
        line: usize,
        tag: char,
        rotation: f64,
    },

    #[error("line {line}: record *{tag}: {reason}")]
    MalformedRecord {
        line: usize,
        tag: char,
        reason: String,
    },

    #[error("line {line}: unexpected end of stream inside record *{tag}")]
    UnexpectedEndOfStream { line: usize, tag: char },
}
