// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/main.rs - Command-line converter from Ultiboard DDF to KiCad PCB.
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

use std::fs::File;
use std::io::BufWriter;
use std::process::ExitCode;

use clap::Parser;

use ulti2kicad::convert::Conversion;
use ulti2kicad::decoder::DecodedDdfFile;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The DDF file to read.
    input: String,

    /// The KiCad PCB file to write.
    output: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let decoded = match DecodedDdfFile::from_filename(&args.input) {
        Ok(df) => df,
        Err(error) => {
            eprintln!("Error opening file {:?}: {:?}", &args.input, error);
            return ExitCode::FAILURE;
        }
    };

    let conversion = match Conversion::from_decoded(&decoded) {
        Ok(c) => c,
        Err(error) => {
            eprintln!("Error converting file {:?}: {}", &args.input, error);
            return ExitCode::FAILURE;
        }
    };
    for warning in &conversion.warnings {
        eprintln!("warning: {}", warning);
    }

    let out = match File::create(&args.output) {
        Ok(f) => f,
        Err(error) => {
            eprintln!("Error creating file {:?}: {:?}", &args.output, error);
            return ExitCode::FAILURE;
        }
    };
    if let Err(error) = conversion.write_to(BufWriter::new(out)) {
        eprintln!("Error writing file {:?}: {:?}", &args.output, error);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
