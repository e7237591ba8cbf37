// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/shape.rs - Footprint shape library and outline parsing.
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
 * # `shape` Module
 *
 * Parsing of `*S` footprint shape records into immutable [ShapeTemplate]s,
 * and the [ShapeLibrary] that component placements resolve against.
 *
 * A template carries the outline geometry (lines, arcs, circles) in local
 * shape coordinates already converted to millimeters, and one
 * [PadInstance] per pad index for each of the top and bottom pad stacks.
 * Pad geometry stays in board units so the resolver can do its offset
 * arithmetic without accumulating rounding error.
 */

use std::collections::HashMap;

use crate::error::ConvertError;
use crate::kicad::FpGraphic;
use crate::reader::{RecordHeader, RecordReader, malformed, parse_ints, strip_last_char};
use crate::tables::{PadGeometry, PadLevel, TechnologyTables};
use crate::units::{BoardUnit, to_mm};

/// A shape with this name bypasses footprint-outline emission; its polyline
/// segments become global edge cuts instead.
pub const BOARD_OUTLINE_SENTINEL: &str = "BOARD";

/// A raw sweep of exactly 360 degrees denotes a full circle.
const FULL_CIRCLE_RAW: i64 = 360 * 64;

/// One pad of a shape template, resolved against a pad-geometry table at the
/// time the shape record was consumed.
///
/// Geometry fields are board units; `drill` is zero for the bottom-stack
/// instance of a pad.
#[derive(Debug, Clone, PartialEq)]
pub struct PadInstance {
    pub code: u8,
    /// Pad rotation in degrees.
    pub rotation: f64,
    /// Raw layer-set mask from the pad sub-line (hex field).
    pub layer_mask: u32,
    pub relx: BoardUnit,
    pub rely: BoardUnit,
    pub name: String,
    pub x1: BoardUnit,
    pub x2: BoardUnit,
    pub y: BoardUnit,
    pub radius: BoardUnit,
    pub clearance: BoardUnit,
    pub drill: BoardUnit,
}

impl PadInstance {
    fn new(
        code: u8,
        rotation: f64,
        layer_mask: u32,
        relx: BoardUnit,
        rely: BoardUnit,
        name: &str,
        geometry: &PadGeometry,
        drill: BoardUnit,
    ) -> Self {
        Self {
            code,
            rotation,
            layer_mask,
            relx,
            rely,
            name: name.to_string(),
            x1: geometry.x1,
            x2: geometry.x2,
            y: geometry.y,
            radius: geometry.radius,
            clearance: geometry.clearance,
            drill,
        }
    }

    /// Total pad width.
    pub fn width(&self) -> BoardUnit {
        self.x1 + self.x2
    }

    /// Total pad height.
    pub fn height(&self) -> BoardUnit {
        self.y
    }

    /// Offset of the true pad center from the nominal placement point,
    /// doubled (the emitted shift is half of this along the rotation axis).
    pub fn center_offset(&self) -> BoardUnit {
        self.x1 - self.x2
    }

    /// Whether two stack instances describe the same annular geometry.
    ///
    /// The drill field is deliberately excluded: the bottom-stack instance
    /// never carries a drill, and a pad is a true dual-geometry stack only
    /// when the ring geometry itself differs.
    pub fn same_geometry(&self, other: &PadInstance) -> bool {
        self.x1 == other.x1
            && self.x2 == other.x2
            && self.y == other.y
            && self.radius == other.radius
            && self.clearance == other.clearance
    }
}

/// An immutable footprint template built from one `*S` record.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeTemplate {
    pub name: String,
    /// Position and rotation of the shape-name label, millimeters/degrees.
    pub label_at: (f64, f64, f64),
    /// Outline primitives in local coordinates, millimeters, Y flipped.
    pub graphics: Vec<FpGraphic>,
    /// Board-outline segments; only populated for the sentinel shape.
    pub edge_lines: Vec<((f64, f64), (f64, f64))>,
    /// Top-stack pad instances, in pad-list order.
    pub pads: Vec<PadInstance>,
    /// Bottom-stack pad instances, matched 1:1 by index with `pads`.
    pub bottom_pads: Vec<PadInstance>,
}

impl ShapeTemplate {
    /// Consumes the body of a `*S` record and builds the template.
    ///
    /// The record layout is: name label line, alias label line, thermal
    /// junction line, outline polyline block, pad block, and arc/circle
    /// block, the last three each terminated by a `;` marker.
    pub fn parse(
        header: RecordHeader<'_>,
        reader: &mut RecordReader<'_>,
        tables: &TechnologyTables,
    ) -> Result<Self, ConvertError> {
        let tag = header.tag;
        let name = header.text.get(2..).unwrap_or("").to_string();

        let label_line = reader.require_line(tag)?;
        let label = parse_ints(label_line, char::is_whitespace, reader.line_number(), tag)?;
        if label.len() < 4 {
            return Err(malformed(reader.line_number(), tag, "short name-label line"));
        }
        // The label rotation field passes through the unit converter
        // before the divide by 64, so it comes out scaled by the mm
        // factor. That is what readers of these files expect.
        let label_at = (to_mm(label[0]), -to_mm(label[1]), to_mm(label[3]) / 64.0);

        // Alias label and thermal junction lines are consumed and discarded.
        reader.require_line(tag)?;
        reader.require_line(tag)?;

        let outline = read_outline_block(reader, tag)?;
        let mut graphics = Vec::new();
        let mut edge_lines = Vec::new();
        if !outline.is_empty() {
            let values = parse_ints(&outline, |c| c == ',', reader.line_number(), tag)?;
            for run in split_on_odd(&values) {
                for i in (0..run.len().saturating_sub(3)).step_by(2) {
                    // The first x of each run doubles as the poly-break
                    // marker and is one above its true value.
                    let sx = if i == 0 { run[i] - 1 } else { run[i] };
                    let start = (to_mm(sx), -to_mm(run[i + 1]));
                    let end = (to_mm(run[i + 2]), -to_mm(run[i + 3]));
                    if name == BOARD_OUTLINE_SENTINEL {
                        edge_lines.push((start, end));
                    } else {
                        graphics.push(FpGraphic::Line { start, end });
                    }
                }
            }
        }

        let (pads, bottom_pads) = parse_pad_block(reader, tag, tables)?;
        parse_arc_block(reader, tag, &mut graphics)?;

        Ok(Self {
            name,
            label_at,
            graphics,
            edge_lines,
            pads,
            bottom_pads,
        })
    }
}

/// The mapping from shape name to parsed template; built as shape records
/// stream in, referenced (never mutated) by later placements.
#[derive(Debug, Default)]
pub struct ShapeLibrary {
    shapes: HashMap<String, ShapeTemplate>,
}

impl ShapeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, template: ShapeTemplate) {
        self.shapes.insert(template.name.clone(), template);
    }

    pub fn get(&self, name: &str) -> Option<&ShapeTemplate> {
        self.shapes.get(name)
    }
}

/// Partitions a flat value sequence into maximal runs starting at each
/// odd-valued element (the poly-break rule).
pub fn split_on_odd(values: &[BoardUnit]) -> Vec<Vec<BoardUnit>> {
    let mut result = Vec::new();
    let mut run: Vec<BoardUnit> = Vec::new();
    for &value in values {
        if value % 2 != 0 {
            if !run.is_empty() {
                result.push(std::mem::take(&mut run));
            }
            run.push(value);
        } else {
            run.push(value);
        }
    }
    if !run.is_empty() {
        result.push(run);
    }
    result
}

/// Accumulates the outline polyline block into one flat comma-separated
/// string. Content lines are concatenated as-is; the terminating line loses
/// its final character (the `;` marker).
fn read_outline_block(reader: &mut RecordReader<'_>, tag: char) -> Result<String, ConvertError> {
    let mut joined = String::new();
    loop {
        let line = reader.require_line(tag)?;
        if line.starts_with(';') {
            break;
        }
        if line.contains(';') {
            joined.push_str(strip_last_char(line));
            break;
        }
        joined.push_str(line);
    }
    Ok(joined)
}

fn parse_pad_block(
    reader: &mut RecordReader<'_>,
    tag: char,
    tables: &TechnologyTables,
) -> Result<(Vec<PadInstance>, Vec<PadInstance>), ConvertError> {
    let mut pads = Vec::new();
    let mut bottom_pads = Vec::new();
    loop {
        let line = reader.require_line(tag)?;
        if line.len() > 1 {
            let content = strip_last_char(line);
            let fields: Vec<&str> = content.splitn(6, ',').collect();
            if fields.len() < 6 {
                return Err(malformed(reader.line_number(), tag, "short pad line"));
            }
            let parse_num = |field: &str| {
                field.trim().parse::<BoardUnit>().map_err(|_| {
                    malformed(
                        reader.line_number(),
                        tag,
                        format!("bad pad field \"{}\"", field),
                    )
                })
            };
            let code_raw = parse_num(fields[0])?;
            let code = u8::try_from(code_raw).map_err(|_| {
                malformed(
                    reader.line_number(),
                    tag,
                    format!("pad code {} out of range", code_raw),
                )
            })?;
            let rotation = parse_num(fields[1])? as f64 / 64.0;
            let layer_mask = u32::from_str_radix(fields[2].trim(), 16).map_err(|_| {
                malformed(
                    reader.line_number(),
                    tag,
                    format!("bad pad layer mask \"{}\"", fields[2]),
                )
            })?;
            let relx = parse_num(fields[3])?;
            let rely = parse_num(fields[4])?;
            let name = fields[5];

            pads.push(PadInstance::new(
                code,
                rotation,
                layer_mask,
                relx,
                rely,
                name,
                tables.pad(PadLevel::Top, code),
                tables.drill(code),
            ));
            bottom_pads.push(PadInstance::new(
                code,
                rotation,
                layer_mask,
                relx,
                rely,
                name,
                tables.pad(PadLevel::Bottom, code),
                0,
            ));
        }
        if line.contains(';') {
            break;
        }
    }
    Ok((pads, bottom_pads))
}

fn parse_arc_block(
    reader: &mut RecordReader<'_>,
    tag: char,
    graphics: &mut Vec<FpGraphic>,
) -> Result<(), ConvertError> {
    loop {
        let line = reader.require_line(tag)?;
        if line.len() > 1 {
            let content = strip_last_char(line);
            let fields = parse_ints(content, |c| c == ',', reader.line_number(), tag)?;
            if fields.len() < 5 {
                return Err(malformed(reader.line_number(), tag, "short arc line"));
            }
            let center = (to_mm(fields[0]), to_mm(fields[1]));
            let radius = to_mm(fields[2]);
            if fields[4] == FULL_CIRCLE_RAW {
                graphics.push(FpGraphic::Circle {
                    center: (center.0, -center.1),
                    end: (center.0 + radius, -center.1),
                });
            } else {
                graphics.push(arc_triple(center, radius, fields[3], fields[4]));
            }
        }
        if line.contains(';') {
            break;
        }
    }
    Ok(())
}

/// Re-derives the three-point arc form from a start-angle/sweep pair.
///
/// The mid-angle is sign-inverted because the output format's angular sense
/// is opposite the source's; the Y flip is applied only to the final emitted
/// coordinates, never to the intermediate trigonometry.
fn arc_triple(center: (f64, f64), radius: f64, start_raw: i64, sweep_raw: i64) -> FpGraphic {
    let start_angle = start_raw as f64 / 64.0;
    let sweep = sweep_raw as f64 / 64.0;

    let mut arc_start = 360.0 + start_angle;
    if arc_start > 360.0 {
        arc_start -= 360.0;
    }
    let mut arc_mid = -(arc_start + sweep / 2.0);
    if arc_mid > 360.0 {
        arc_mid -= 360.0;
    }
    let mut arc_end = arc_start + sweep;
    if arc_end > 360.0 {
        arc_end -= 360.0;
    }

    let (sin_s, cos_s) = arc_start.to_radians().sin_cos();
    let (sin_m, cos_m) = arc_mid.to_radians().sin_cos();
    let (sin_e, cos_e) = arc_end.to_radians().sin_cos();

    FpGraphic::Arc {
        start: (center.0 + radius * cos_s, -(center.1 + radius * sin_s)),
        mid: (center.0 + radius * cos_m, -(center.1 - radius * sin_m)),
        end: (center.0 + radius * cos_e, -(center.1 + radius * sin_e)),
        width: 0.1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::DecodedDdfFile;
    use crate::tables::PadGeometry;

    #[test]
    fn test_split_on_odd_starts_runs_at_odd_values() {
        assert_eq!(
            split_on_odd(&[1, 0, 0, 2, 2, 3, 4, 4, 6, 6]),
            vec![vec![1, 0, 0, 2, 2], vec![3, 4, 4, 6, 6]]
        );
    }

    #[test]
    fn test_split_on_odd_keeps_leading_evens() {
        assert_eq!(split_on_odd(&[2, 2, 5, 6]), vec![vec![2, 2], vec![5, 6]]);
        assert_eq!(split_on_odd(&[-3, 4]), vec![vec![-3, 4]]);
        assert!(split_on_odd(&[]).is_empty());
    }

    fn tables_with_pad(code: u8) -> TechnologyTables {
        let mut tables = TechnologyTables::new();
        tables.set_pad(
            PadLevel::Top,
            code,
            PadGeometry {
                x1: 30,
                x2: 30,
                y: 60,
                radius: 10,
                ..Default::default()
            },
        );
        tables.set_pad(
            PadLevel::Bottom,
            code,
            PadGeometry {
                x1: 30,
                x2: 30,
                y: 60,
                radius: 10,
                ..Default::default()
            },
        );
        tables.set_drill(code, 24);
        tables
    }

    fn parse_shape(text: &str, tables: &TechnologyTables) -> ShapeTemplate {
        let decoded = DecodedDdfFile::new(text.as_bytes()).unwrap();
        let mut reader = RecordReader::new(&decoded);
        let header = reader.next_record().unwrap();
        ShapeTemplate::parse(header, &mut reader, tables).unwrap()
    }

    #[test]
    fn test_parse_shape_outline_and_pads() {
        let tables = tables_with_pad(5);
        let text = "*SDIP2\n\
                    12 24 10 640 10 2\n\
                    0 0 0 0 0 0\n\
                    0.5\n\
                    121,0,120,0,120,80,121,80;\n\
                    5,0,1,100,200,1;\n\
                    ;\n";
        let template = parse_shape(text, &tables);

        assert_eq!(template.name, "DIP2");
        assert!(template.edge_lines.is_empty());
        // Two runs: the first x of the first run is decremented from 121 to
        // 120; the second run is too short to yield a segment.
        assert_eq!(template.graphics.len(), 2);
        match &template.graphics[0] {
            FpGraphic::Line { start, end } => {
                assert!((start.0 - to_mm(120)).abs() < 1e-9);
                assert!((start.1 + to_mm(0)).abs() < 1e-9);
                assert!((end.0 - to_mm(120)).abs() < 1e-9);
            }
            other => panic!("expected line, got {:?}", other),
        }

        assert_eq!(template.pads.len(), 1);
        assert_eq!(template.bottom_pads.len(), 1);
        let pad = &template.pads[0];
        assert_eq!(pad.code, 5);
        assert_eq!(pad.layer_mask, 1);
        assert_eq!(pad.relx, 100);
        assert_eq!(pad.rely, 200);
        assert_eq!(pad.name, "1");
        assert_eq!(pad.width(), 60);
        assert_eq!(pad.drill, 24);
        assert_eq!(template.bottom_pads[0].drill, 0);
        assert!(pad.same_geometry(&template.bottom_pads[0]));
    }

    #[test]
    fn test_board_sentinel_goes_to_edge_cuts() {
        let tables = TechnologyTables::new();
        let text = "*SBOARD\n\
                    0 0 0 0 0 0\n\
                    0 0 0 0 0 0\n\
                    0\n\
                    1,0,1200,0,1200,-800,0,-800,0,0;\n\
                    ;\n\
                    ;\n";
        let template = parse_shape(text, &tables);
        assert_eq!(template.edge_lines.len(), 4);
        assert!(template.graphics.is_empty());
        // Closing segment back to the origin; Y flip applied.
        let (_, end) = template.edge_lines[3];
        assert!((end.0 - 0.0).abs() < 1e-9);
        assert!((end.1 - 0.0).abs() < 1e-9);
        let (_, corner) = template.edge_lines[1];
        assert!((corner.0 - 25.4).abs() < 1e-9);
        assert!((corner.1 - to_mm(800)).abs() < 1e-9);
    }

    #[test]
    fn test_full_circle_sweep_yields_circle() {
        let tables = TechnologyTables::new();
        let text = "*SRING\n\
                    0 0 0 0 0 0\n\
                    0 0 0 0 0 0\n\
                    0\n\
                    ;\n\
                    ;\n\
                    120,240,60,0,23040;\n";
        let template = parse_shape(text, &tables);
        assert_eq!(template.graphics.len(), 1);
        match &template.graphics[0] {
            FpGraphic::Circle { center, end } => {
                assert!((center.0 - to_mm(120)).abs() < 1e-9);
                assert!((center.1 + to_mm(240)).abs() < 1e-9);
                assert!((end.0 - to_mm(180)).abs() < 1e-9);
            }
            other => panic!("expected circle, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_sweep_yields_arc_triple() {
        let tables = TechnologyTables::new();
        // Start 0 degrees, sweep 90 degrees, radius 120 units at the origin.
        let text = "*SARC\n\
                    0 0 0 0 0 0\n\
                    0 0 0 0 0 0\n\
                    0\n\
                    ;\n\
                    ;\n\
                    0,0,120,0,5760;\n";
        let template = parse_shape(text, &tables);
        let radius = to_mm(120);
        match &template.graphics[0] {
            FpGraphic::Arc {
                start, mid, end, ..
            } => {
                // arcStart = 360 -> (r, 0) after the single normalization.
                assert!((start.0 - radius).abs() < 1e-6);
                assert!(start.1.abs() < 1e-6);
                // arcMid = -(360 + 45) -> cos 45, and the mid-point Y uses
                // the inverted convention (center.y - r sin).
                assert!((mid.0 - radius * 45f64.to_radians().cos()).abs() < 1e-6);
                assert!((mid.1 - radius * (-405f64).to_radians().sin()).abs() < 1e-6);
                // arcEnd = 450 - 360 = 90 -> (0, r) flipped to (0, -r).
                assert!(end.0.abs() < 1e-6);
                assert!((end.1 + radius).abs() < 1e-6);
            }
            other => panic!("expected arc, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_record_is_end_of_stream() {
        let tables = TechnologyTables::new();
        let decoded = DecodedDdfFile::new("*SX\n0 0 0 0 0 0\n".as_bytes()).unwrap();
        let mut reader = RecordReader::new(&decoded);
        let header = reader.next_record().unwrap();
        let err = ShapeTemplate::parse(header, &mut reader, &tables).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::UnexpectedEndOfStream { tag: 'S', .. }
        ));
    }
}
