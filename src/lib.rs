// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/lib.rs - Converter library for Ultiboard DDF design dumps.
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
 * # `ulti2kicad` Crate
 *
 * A library for translating Ultiboard DDF design dumps into KiCad PCB
 * files.
 *
 * This crate provides a full pipeline for working with DDF dumps:
 *
 * 1. [decoder]: Reads the CP850-encoded file into lines.
 * 2. [reader]: Walks the line stream as tagged records.
 * 3. [convert]: Folds the records into KiCad statements.
 * 4. [kicad]: Serializes the statements into the output document.
 *
 * The supporting modules hold the shared vocabulary: [units] for the
 * board-unit coordinate scale, [tables] for the technology and net tables,
 * [shape] for the footprint shape library, and [error] for the conversion
 * error type.
 *
 * ## Usage Example
 *
 * ```no_run
 * use std::fs::File;
 * use std::io::BufWriter;
 *
 * use ulti2kicad::convert::Conversion;
 * use ulti2kicad::decoder::DecodedDdfFile;
 *
 * fn main() -> Result<(), Box<dyn std::error::Error>> {
 *     // Read and decode the dump
 *     let decoded = DecodedDdfFile::from_filename("example.ddf")?;
 *
 *     // Convert the record stream
 *     let conversion = Conversion::from_decoded(&decoded)?;
 *     for warning in &conversion.warnings {
 *         eprintln!("warning: {}", warning);
 *     }
 *
 *     // Write the KiCad board file
 *     let out = File::create("example.kicad_pcb")?;
 *     conversion.write_to(BufWriter::new(out))?;
 *
 *     Ok(())
 * }
 * ```
 */

pub mod convert;
pub mod decoder;
pub mod error;
pub mod kicad;
pub mod reader;
pub mod shape;
pub mod tables;
pub mod units;
