// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/tables.rs - Technology tables and the net table.
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
 * # `tables` Module
 *
 * The per-code technology tables (trace width, trace clearance, drill
 * diameter, and the top/inner/bottom pad-geometry tables) and the ordinal
 * net table.
 *
 * Technology tables are keyed by an 8-bit code. Entries are last-write-wins
 * upserts populated in file order by `*T` records; there is no removal.
 * Reading an unset code yields zero for every field — placements that rely
 * on unset codes degrade silently to zero-size geometry, which is a source
 * format convention, not an error.
 */

use crate::units::BoardUnit;

/// The number of codes each technology table holds.
pub const TECH_CODES: usize = 256;

/// One entry of a pad-geometry table, in board units.
///
/// `x1` and `x2` are independent half-widths about an implicit pad center:
/// the total pad width is `x1 + x2`, and when they differ the pad's true
/// center is offset from its nominal placement point by `(x1 - x2) / 2`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PadGeometry {
    pub x1: BoardUnit,
    pub x2: BoardUnit,
    pub y: BoardUnit,
    pub radius: BoardUnit,
    pub clearance: BoardUnit,
    pub horizontal: BoardUnit,
    pub vertical: BoardUnit,
    pub thermal_h: BoardUnit,
    pub thermal_v: BoardUnit,
}

/// Which copper level a pad-geometry table describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadLevel {
    Top,
    Inner,
    Bottom,
}

/// The sparse per-code tables populated by `*T` technology records.
#[derive(Debug)]
pub struct TechnologyTables {
    trace_width: [BoardUnit; TECH_CODES],
    trace_clearance: [BoardUnit; TECH_CODES],
    drill: [BoardUnit; TECH_CODES],
    pad_top: [PadGeometry; TECH_CODES],
    pad_inner: [PadGeometry; TECH_CODES],
    pad_bottom: [PadGeometry; TECH_CODES],
}

impl Default for TechnologyTables {
    fn default() -> Self {
        Self {
            trace_width: [0; TECH_CODES],
            trace_clearance: [0; TECH_CODES],
            drill: [0; TECH_CODES],
            pad_top: [PadGeometry::default(); TECH_CODES],
            pad_inner: [PadGeometry::default(); TECH_CODES],
            pad_bottom: [PadGeometry::default(); TECH_CODES],
        }
    }
}

impl TechnologyTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_trace(&mut self, code: u8, width: BoardUnit, clearance: BoardUnit) {
        self.trace_width[code as usize] = width;
        self.trace_clearance[code as usize] = clearance;
    }

    pub fn set_drill(&mut self, code: u8, diameter: BoardUnit) {
        self.drill[code as usize] = diameter;
    }

    pub fn set_pad(&mut self, level: PadLevel, code: u8, geometry: PadGeometry) {
        let table = match level {
            PadLevel::Top => &mut self.pad_top,
            PadLevel::Inner => &mut self.pad_inner,
            PadLevel::Bottom => &mut self.pad_bottom,
        };
        table[code as usize] = geometry;
    }

    pub fn trace_width(&self, code: u8) -> BoardUnit {
        self.trace_width[code as usize]
    }

    pub fn trace_clearance(&self, code: u8) -> BoardUnit {
        self.trace_clearance[code as usize]
    }

    pub fn drill(&self, code: u8) -> BoardUnit {
        self.drill[code as usize]
    }

    pub fn pad(&self, level: PadLevel, code: u8) -> &PadGeometry {
        let table = match level {
            PadLevel::Top => &self.pad_top,
            PadLevel::Inner => &self.pad_inner,
            PadLevel::Bottom => &self.pad_bottom,
        };
        &table[code as usize]
    }
}

/// The DDF net-number sentinel for "no net".
pub const NET_NONE_SENTINEL: u32 = 65535;

/// Maps a raw DDF net number to a net index, folding the sentinel to 0.
pub fn net_index(raw: u32) -> u32 {
    if raw == NET_NONE_SENTINEL { 0 } else { raw }
}

/// The ordinal net table: index = net number, populated by `*N` records in
/// file order, append-only. Index 0 is reserved for "no net".
#[derive(Debug, Default)]
pub struct NetTable {
    names: Vec<String>,
}

impl NetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the next net's raw stored name and returns its index.
    pub fn push(&mut self, raw_name: &str) -> u32 {
        self.names.push(raw_name.to_string());
        (self.names.len() - 1) as u32
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolves a net index to its emitted name.
    ///
    /// The raw stored name carries a one-character type prefix which is
    /// stripped. An empty or unknown name becomes the synthesized
    /// placeholder `SB$<index>`, and embedded quote characters are replaced
    /// so the name stays quotable in the output.
    pub fn resolve_name(&self, index: u32) -> String {
        let raw = self
            .names
            .get(index as usize)
            .map(String::as_str)
            .unwrap_or("");
        let name = raw.get(1..).unwrap_or("");
        if name.is_empty() {
            format!("SB${}", index)
        } else {
            name.replace('\'', "/")
        }
    }
}
