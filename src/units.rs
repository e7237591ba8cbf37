// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/units.rs - Board-unit to millimeter conversion.
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
 * # `units` Module
 *
 * Conversion from the native Ultiboard fixed-point board unit to
 * millimeters. One board unit is 1/1.2 × 0.0254 mm (1/1200 inch).
 *
 * All record parsing keeps values in board units; conversion happens once
 * per value, at the point where the value enters an output statement. The
 * source format's Y axis grows downward while KiCad's grows upward, so every
 * emitted Y coordinate is negated at that same point and nowhere else.
 */

/// The native fixed-point coordinate unit of the DDF format (1/1200 inch).
pub type BoardUnit = i64;

/// Converts a board-unit value to millimeters.
pub fn to_mm(v: BoardUnit) -> f64 {
    (v as f64 / 1.2) * 0.0254
}

/// Converts a fractional board-unit value to millimeters.
///
/// Used where a raw field has already been scaled (text thickness, label
/// rotation) before conversion.
pub fn to_mm_f(v: f64) -> f64 {
    (v / 1.2) * 0.0254
}
