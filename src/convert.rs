// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/convert.rs - The DDF record stream to KiCad statement fold.
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
 * # `convert` Module
 *
 * The single-pass fold from a decoded DDF record stream to the ordered
 * KiCad [Statement] sequence.
 *
 * Records are dispatched on their type tag. Technology, net, and shape
 * records populate the conversion state; placement and routing records
 * resolve against that state and append statements. The DDF file format
 * guarantees definitions precede their uses, so one pass suffices.
 *
 * A malformed or unresolvable record is reported as a warning and the fold
 * resumes at the next record line; only a record running off the end of the
 * stream aborts the conversion.
 */

use std::io::Write;

use crate::decoder::DecodedDdfFile;
use crate::error::ConvertError;
use crate::kicad::{
    BOTTOM_COPPER_CODE, Footprint, FootprintAttr, GrText, Pad, PadKind, PadShape, PaperSize,
    ReferenceLabel, Side, Statement, Zone, layer_name,
};
use crate::reader::{RecordHeader, RecordReader, malformed, parse_ints, strip_last_char};
use crate::shape::{PadInstance, ShapeLibrary, ShapeTemplate};
use crate::tables::{
    NET_NONE_SENTINEL, NetTable, PadGeometry, PadLevel, TechnologyTables, net_index,
};
use crate::units::{BoardUnit, to_mm, to_mm_f};

/// Paper switches from A4 to A3 above this board-outline width, mm.
const A4_WIDTH_LIMIT_MM: f64 = 260.0;

/// A degenerate zero coordinate is nudged by this much, mm, so downstream
/// tools keep the pad selectable.
const ZERO_NUDGE_MM: f64 = 0.001;

/// The result of converting one DDF file.
#[derive(Debug)]
pub struct Conversion {
    /// Output statements, in source-record order.
    pub statements: Vec<Statement>,
    /// Per-record errors the fold recovered from.
    pub warnings: Vec<ConvertError>,
}

impl Conversion {
    /// Folds the whole record stream.
    ///
    /// Returns `Err` only when a multi-line record is truncated by the end
    /// of the stream; every other record-level failure lands in
    /// [Conversion::warnings] and conversion continues.
    pub fn from_decoded(decoded: &DecodedDdfFile) -> Result<Self, ConvertError> {
        let mut converter = Converter::new();
        let mut reader = RecordReader::new(decoded);
        while let Some(header) = reader.next_record() {
            match converter.dispatch(header, &mut reader) {
                Ok(()) => {}
                Err(err @ ConvertError::UnexpectedEndOfStream { .. }) => return Err(err),
                Err(err) => converter.warnings.push(err),
            }
        }
        Ok(Self {
            statements: converter.statements,
            warnings: converter.warnings,
        })
    }

    /// Serializes the statement sequence and the closing delimiter.
    pub fn write_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        for statement in &self.statements {
            write!(writer, "{}", statement)?;
        }
        writeln!(writer, ")")
    }
}

/// Mutable conversion state threaded through the record handlers.
struct Converter {
    tables: TechnologyTables,
    nets: NetTable,
    shapes: ShapeLibrary,
    header_emitted: bool,
    statements: Vec<Statement>,
    warnings: Vec<ConvertError>,
}

impl Converter {
    fn new() -> Self {
        Self {
            tables: TechnologyTables::new(),
            nets: NetTable::new(),
            shapes: ShapeLibrary::new(),
            header_emitted: false,
            statements: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn dispatch(
        &mut self,
        header: RecordHeader<'_>,
        reader: &mut RecordReader<'_>,
    ) -> Result<(), ConvertError> {
        match header.tag {
            'P' => self.header_record(header, reader),
            'S' => self.shape_record(header, reader),
            'T' => self.technology_record(header),
            'N' => self.net_record(header),
            'C' => self.component_record(header, reader),
            'L' => self.routed_record(header, reader),
            'V' => self.via_record(header, reader),
            'X' => self.text_record(header),
            // Unknown record types are passed over without comment.
            _ => Ok(()),
        }
    }

    /// `*P`: the file header. The second body line carries the board
    /// outline, whose width selects the output paper size. Only the first
    /// header record emits the preamble.
    fn header_record(
        &mut self,
        header: RecordHeader<'_>,
        reader: &mut RecordReader<'_>,
    ) -> Result<(), ConvertError> {
        let tag = header.tag;
        reader.require_line(tag)?;
        let line = reader.require_line(tag)?;
        let fields = parse_ints(
            strip_last_char(line),
            |c| c == ',',
            reader.line_number(),
            tag,
        )?;
        if fields.len() < 4 {
            return Err(malformed(reader.line_number(), tag, "short outline line"));
        }
        if self.header_emitted {
            return Ok(());
        }
        let width = to_mm(fields[0]) - to_mm(fields[2]);
        let paper = if width > A4_WIDTH_LIMIT_MM {
            PaperSize::A3
        } else {
            PaperSize::A4
        };
        self.statements.push(Statement::Header(paper));
        self.header_emitted = true;
        Ok(())
    }

    /// `*S`: a footprint shape definition. The board-outline sentinel shape
    /// additionally flushes its segments straight to the edge-cut layer.
    fn shape_record(
        &mut self,
        header: RecordHeader<'_>,
        reader: &mut RecordReader<'_>,
    ) -> Result<(), ConvertError> {
        let template = ShapeTemplate::parse(header, reader, &self.tables)?;
        for &(start, end) in &template.edge_lines {
            self.statements.push(Statement::GrLine {
                start,
                end,
                width: 0.1,
                layer: "Edge.Cuts",
            });
        }
        self.shapes.insert(template);
        Ok(())
    }

    /// `*T`: a technology table entry. The third character of the record
    /// line selects the table; unrecognized sub-types are skipped.
    fn technology_record(&mut self, header: RecordHeader<'_>) -> Result<(), ConvertError> {
        let tag = header.tag;
        let subtype = header.text.chars().nth(2);
        let content = header.text.get(4..).unwrap_or("");
        match subtype {
            Some('T') => {
                let fields = parse_ints(content, |c| c == ',', header.line, tag)?;
                if fields.len() < 3 {
                    return Err(malformed(header.line, tag, "short trace entry"));
                }
                let code = tech_code(fields[0], header.line, tag)?;
                self.tables.set_trace(code, fields[1], fields[2]);
            }
            Some('D') => {
                let fields = parse_ints(content, |c| c == ',', header.line, tag)?;
                if fields.len() < 2 {
                    return Err(malformed(header.line, tag, "short drill entry"));
                }
                let code = tech_code(fields[0], header.line, tag)?;
                self.tables.set_drill(code, fields[1]);
            }
            Some(level @ ('0' | '1' | '2')) => {
                let fields = parse_ints(content, |c| c == ',', header.line, tag)?;
                if fields.len() < 10 {
                    return Err(malformed(header.line, tag, "short pad entry"));
                }
                let code = tech_code(fields[0], header.line, tag)?;
                let geometry = PadGeometry {
                    x1: fields[1],
                    x2: fields[2],
                    y: fields[3],
                    radius: fields[4],
                    clearance: fields[5],
                    horizontal: fields[6],
                    vertical: fields[7],
                    thermal_h: fields[8],
                    thermal_v: fields[9],
                };
                let level = match level {
                    '0' => PadLevel::Inner,
                    '1' => PadLevel::Top,
                    _ => PadLevel::Bottom,
                };
                self.tables.set_pad(level, code, geometry);
            }
            _ => {}
        }
        Ok(())
    }

    /// `*N`: the next net, numbered by position in the file.
    fn net_record(&mut self, header: RecordHeader<'_>) -> Result<(), ConvertError> {
        let content = strip_last_char(header.text.get(3..).unwrap_or(""));
        let raw_name = content.split(' ').next().unwrap_or("");
        let index = self.nets.push(raw_name);
        let name = self.nets.resolve_name(index);
        self.statements.push(Statement::Net { index, name });
        Ok(())
    }

    /// `*C`: a component placement, resolved against the shape library and
    /// the technology tables into one footprint statement.
    fn component_record(
        &mut self,
        header: RecordHeader<'_>,
        reader: &mut RecordReader<'_>,
    ) -> Result<(), ConvertError> {
        let tag = header.tag;
        let tokens: Vec<&str> = header.text.get(3..).unwrap_or("").split(' ').collect();
        if tokens.len() < 3 {
            return Err(malformed(header.line, tag, "short placement header"));
        }
        let component_name = tokens[0];
        let shape_name = tokens[2];

        let placement_line = reader.require_line(tag)?;
        let fields: Vec<&str> = placement_line.split(',').collect();
        if fields.len() < 15 {
            return Err(malformed(
                reader.line_number(),
                tag,
                "short placement coordinate line",
            ));
        }
        let mut values = [0 as BoardUnit; 15];
        for (slot, field) in values.iter_mut().zip(&fields) {
            *slot = int_field(*field, reader.line_number(), tag)?;
        }

        // The attribute line is present but carries nothing we emit.
        reader.require_line(tag)?;

        // Net/layer pairs, one per pad, possibly wrapped over several lines.
        let mut pair_tokens: Vec<&str> = Vec::new();
        loop {
            let line = reader.require_line(tag)?;
            if line.starts_with(';') {
                break;
            }
            pair_tokens.extend(line.split_whitespace());
        }
        if pair_tokens.len() % 2 != 0 {
            return Err(malformed(
                reader.line_number(),
                tag,
                "odd net/layer token count",
            ));
        }
        let pairs_line = reader.line_number();
        let mut pairs: Vec<(u32, u32)> = Vec::with_capacity(pair_tokens.len() / 2);
        for chunk in pair_tokens.chunks_exact(2) {
            let net_raw = chunk[0].parse::<u32>().map_err(|_| {
                malformed(pairs_line, tag, format!("bad net number \"{}\"", chunk[0]))
            })?;
            // A placement pad with no connection carries an all-ones layer
            // mask and lands on the top silk layer.
            let layer = if chunk[1] == "ffffffff" {
                0
            } else {
                chunk[1].parse::<u32>().map_err(|_| {
                    malformed(pairs_line, tag, format!("bad layer code \"{}\"", chunk[1]))
                })?
            };
            pairs.push((net_index(net_raw), layer));
        }

        let footprint =
            self.resolve_placement(header.line, tag, component_name, shape_name, &values, &pairs)?;
        self.statements.push(Statement::Footprint(footprint));
        Ok(())
    }

    /// Builds the footprint for one placement.
    ///
    /// `values` is the 15-field placement coordinate line: position and
    /// rotation, then the reference-label position, rotation, font size, and
    /// stroke width. A placement whose first and last pads sit on bottom
    /// copper is taken to be on the back side.
    fn resolve_placement(
        &self,
        line: usize,
        tag: char,
        component_name: &str,
        shape_name: &str,
        values: &[BoardUnit; 15],
        pairs: &[(u32, u32)],
    ) -> Result<Footprint, ConvertError> {
        let template = self
            .shapes
            .get(shape_name)
            .ok_or_else(|| ConvertError::UnknownShape {
                line,
                tag,
                name: shape_name.to_string(),
            })?;
        if pairs.len() != template.pads.len() {
            return Err(ConvertError::PadCountMismatch {
                line,
                tag,
                name: shape_name.to_string(),
                expected: template.pads.len(),
                got: pairs.len(),
            });
        }

        let bottom = match (pairs.first(), pairs.last()) {
            (Some(first), Some(last)) => {
                first.1 == BOTTOM_COPPER_CODE && last.1 == BOTTOM_COPPER_CODE
            }
            _ => false,
        };
        let side = if bottom { Side::Back } else { Side::Front };

        let x = to_mm(values[0]);
        let y = -to_mm(values[1]);
        let mut rotation = values[2] as f64 / 64.0;
        let label_x = to_mm(values[3]);
        let mut label_y = -to_mm(values[4]);
        let label_rotation = values[5] as f64 / 64.0;
        let label_size = (to_mm(values[6]), to_mm(values[7]));
        let label_thickness = to_mm(values[8]) / 10.0;
        if bottom {
            rotation += 180.0;
            label_y = -label_y;
        }

        let layer = match pairs.first() {
            Some(&(_, code)) => layer_name(code).ok_or_else(|| {
                malformed(line, tag, format!("placement layer code {} out of range", code))
            })?,
            None => "F.Cu",
        };
        let attr = template.pads.first().map(|pad| {
            if pad.drill == 0 {
                FootprintAttr::Smd
            } else {
                FootprintAttr::ThroughHole
            }
        });

        let mut pads = Vec::with_capacity(template.pads.len());
        for (index, pad) in template.pads.iter().enumerate() {
            let (net, pair_layer) = pairs[index];
            if pad.drill == 0 {
                if let Some(resolved) =
                    self.resolve_smd_pad(line, tag, pad, net, pair_layer, rotation)?
                {
                    pads.push(resolved);
                }
            } else {
                let (top, ring) = self.resolve_thru_pad(
                    line,
                    tag,
                    pad,
                    &template.bottom_pads[index],
                    net,
                    rotation,
                )?;
                pads.push(top);
                pads.extend(ring);
            }
        }

        Ok(Footprint {
            shape_name: template.name.clone(),
            layer: layer.to_string(),
            side,
            at: (x, y, rotation),
            label_at: template.label_at,
            reference: ReferenceLabel {
                name: component_name.to_string(),
                at: (label_x, label_y, label_rotation + rotation),
                size: label_size,
                thickness: label_thickness,
                mirror: bottom,
            },
            attr,
            graphics: template.graphics.clone(),
            pads,
        })
    }

    /// A drill-less pad becomes a surface-mount roundrect. Asymmetric
    /// geometry shifts the pad center along its rotation axis; only the
    /// four cardinal rotations are defined for that shift.
    ///
    /// Returns `None` for a pad whose code never got geometry, which the
    /// source format uses for intentionally absent pads.
    fn resolve_smd_pad(
        &self,
        line: usize,
        tag: char,
        pad: &PadInstance,
        net: u32,
        pair_layer: u32,
        placement_rotation: f64,
    ) -> Result<Option<Pad>, ConvertError> {
        let width = pad.width();
        if pad.height() == 0 || width == 0 {
            return Ok(None);
        }
        let height_mm = if pad.y == 0 {
            ZERO_NUDGE_MM
        } else {
            to_mm(pad.y)
        };
        let rely_mm = if pad.rely == 0 {
            ZERO_NUDGE_MM
        } else {
            to_mm(pad.rely)
        };
        let relx_mm = to_mm(pad.relx);
        let offset = pad.center_offset();
        let (px, py) = if offset == 0 {
            (relx_mm, rely_mm)
        } else {
            let shift = to_mm(offset) / 2.0;
            match pad.rotation {
                r if r == 0.0 => (relx_mm - shift, rely_mm),
                r if r == 90.0 => (relx_mm, rely_mm - shift),
                r if r == 180.0 => (relx_mm + shift, rely_mm),
                r if r == 270.0 => (relx_mm, rely_mm + shift),
                r => {
                    return Err(ConvertError::UnsupportedPadRotation {
                        line,
                        tag,
                        rotation: r,
                    });
                }
            }
        };
        let copper = layer_name(pair_layer)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                malformed(line, tag, format!("pad layer code {} out of range", pair_layer))
            })?;
        let (paste, mask) = if pair_layer == BOTTOM_COPPER_CODE {
            ("B.Paste", "B.Mask")
        } else {
            ("F.Paste", "F.Mask")
        };
        Ok(Some(Pad {
            name: pad.name.clone(),
            kind: PadKind::Smd,
            shape: PadShape::RoundRect,
            net,
            net_name: self.nets.resolve_name(net),
            at: (px, -py, placement_rotation + pad.rotation),
            size: (to_mm(width), height_mm),
            drill: None,
            layers: vec![copper.to_string(), paste.to_string(), mask.to_string()],
            roundrect_ratio: to_mm(pad.radius) / height_mm,
        }))
    }

    /// A drilled pad becomes a through-hole pad, classified square/round
    /// from its corner radius when the ring is symmetric and square, and a
    /// shifted roundrect otherwise. When the bottom-stack ring differs from
    /// the top one, a second surface pad on bottom copper carries it.
    fn resolve_thru_pad(
        &self,
        line: usize,
        tag: char,
        pad: &PadInstance,
        bottom_pad: &PadInstance,
        net: u32,
        placement_rotation: f64,
    ) -> Result<(Pad, Option<Pad>), ConvertError> {
        if pad.y == 0 {
            return Err(malformed(
                line,
                tag,
                format!("through-hole pad code {} has no pad geometry", pad.code),
            ));
        }
        let width = pad.width();
        let offset = pad.center_offset();
        let mut rely = pad.rely;
        let shape = if offset == 0 && width == pad.y {
            if pad.radius * 2 < width {
                PadShape::Rect
            } else {
                PadShape::Circle
            }
        } else {
            // Asymmetric rings shift along the pre-rotation Y axis.
            rely -= offset;
            PadShape::RoundRect
        };
        let ratio = to_mm(pad.radius) / to_mm(pad.y);
        let drill = to_mm(pad.drill);
        let net_name = self.nets.resolve_name(net);

        let top = Pad {
            name: pad.name.clone(),
            kind: PadKind::ThruHole,
            shape,
            net,
            net_name: net_name.clone(),
            at: (
                to_mm(pad.relx),
                -to_mm(rely),
                placement_rotation + pad.rotation - 90.0,
            ),
            size: (to_mm(pad.y), to_mm(width)),
            drill: Some(drill),
            layers: vec!["*.Cu".to_string(), "*.Mask".to_string()],
            roundrect_ratio: ratio,
        };

        let ring = if bottom_pad.same_geometry(pad) {
            None
        } else {
            Some(Pad {
                name: bottom_pad.name.clone(),
                kind: PadKind::Smd,
                shape,
                net,
                net_name,
                at: (
                    to_mm(bottom_pad.relx),
                    -to_mm(bottom_pad.rely),
                    placement_rotation + bottom_pad.rotation - 90.0,
                ),
                size: (to_mm(bottom_pad.height()), to_mm(bottom_pad.width())),
                // The ring shares the top pad's drilled hole.
                drill: Some(drill),
                layers: vec!["B.Cu".to_string(), "B.Mask".to_string()],
                roundrect_ratio: ratio,
            })
        };
        Ok((top, ring))
    }

    /// `*L`: routed copper. The third character selects tracks, vectors,
    /// arcs, or polygons; anything else is skipped.
    fn routed_record(
        &mut self,
        header: RecordHeader<'_>,
        reader: &mut RecordReader<'_>,
    ) -> Result<(), ConvertError> {
        match header.text.chars().nth(2) {
            Some('T') => self.track_record(header, reader),
            Some('V') => self.vector_record(header),
            Some('A') => self.arc_record(header),
            Some('P') => self.polygon_record(header, reader),
            _ => Ok(()),
        }
    }

    /// `*LT`: a run of axis-aligned or 45-degree segments sharing one
    /// coordinate, given on the record line.
    fn track_record(
        &mut self,
        header: RecordHeader<'_>,
        reader: &mut RecordReader<'_>,
    ) -> Result<(), ConvertError> {
        let tag = header.tag;
        let head = parse_ints(
            header.text.get(4..).unwrap_or(""),
            char::is_whitespace,
            header.line,
            tag,
        )?;
        if head.len() < 2 {
            return Err(malformed(header.line, tag, "short track header"));
        }
        let layer = layer_name(head[0] as u32)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                malformed(header.line, tag, format!("track layer code {} out of range", head[0]))
            })?;
        let shared = to_mm(head[1]);

        loop {
            let line = reader.require_line(tag)?;
            if line.len() > 1 {
                let fields: Vec<&str> = line.split_whitespace().collect();
                if fields.len() < 6 {
                    return Err(malformed(reader.line_number(), tag, "short track line"));
                }
                let a = to_mm_f(float_field(fields[0], reader.line_number(), tag)?);
                let b = to_mm_f(float_field(fields[1], reader.line_number(), tag)?);
                let net = net_index(int_field(fields[2], reader.line_number(), tag)? as u32);
                let code = tech_code(
                    int_field(fields[3], reader.line_number(), tag)?,
                    reader.line_number(),
                    tag,
                )?;
                let width = to_mm(self.tables.trace_width(code));
                let orientation = fields[5].chars().next().unwrap_or(' ');
                let endpoints = match orientation {
                    // Horizontal: the shared coordinate is Y.
                    '1' => Some(((a, -shared), (b, -shared))),
                    // Vertical: the shared coordinate is X.
                    '2' => Some(((shared, -a), (shared, -b))),
                    // The two diagonal orientations reconstruct both axes
                    // from the shared coordinate and the endpoint pair.
                    '4' => Some((
                        (a + (shared - a) / 2.0, (shared - a) / 2.0),
                        (b + (shared - b) / 2.0, (shared - b) / 2.0),
                    )),
                    '8' => Some((
                        (a - (a - shared) / 2.0, (a - shared) / 2.0),
                        (b - (b - shared) / 2.0, (b - shared) / 2.0),
                    )),
                    other => {
                        self.warnings.push(malformed(
                            reader.line_number(),
                            tag,
                            format!("unknown track orientation \"{}\"", other),
                        ));
                        None
                    }
                };
                if let Some((start, end)) = endpoints {
                    self.statements.push(Statement::Segment {
                        start,
                        end,
                        width,
                        layer: layer.to_string(),
                        net,
                    });
                }
            }
            if line.contains(';') {
                return Ok(());
            }
        }
    }

    /// `*LV`: a free segment with both endpoints on the record line.
    fn vector_record(&mut self, header: RecordHeader<'_>) -> Result<(), ConvertError> {
        let tag = header.tag;
        let fields = parse_ints(
            header.text.get(4..).unwrap_or("").trim_end_matches(';'),
            char::is_whitespace,
            header.line,
            tag,
        )?;
        if fields.len() < 8 {
            return Err(malformed(header.line, tag, "short vector record"));
        }
        let layer = layer_name(fields[0] as u32)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                malformed(header.line, tag, format!("vector layer code {} out of range", fields[0]))
            })?;
        let code = tech_code(fields[6], header.line, tag)?;
        self.statements.push(Statement::Segment {
            start: (to_mm(fields[1]), -to_mm(fields[2])),
            end: (to_mm(fields[3]), -to_mm(fields[4])),
            width: to_mm(self.tables.trace_width(code)),
            layer: layer.to_string(),
            net: net_index(fields[5] as u32),
        });
        Ok(())
    }

    /// `*LA`: a routed arc, given as center, radius, start angle, and sweep.
    /// The emitted three-point form uses the arc center as its mid-point.
    fn arc_record(&mut self, header: RecordHeader<'_>) -> Result<(), ConvertError> {
        let tag = header.tag;
        let fields = parse_ints(
            header.text.get(4..).unwrap_or("").trim_end_matches(';'),
            char::is_whitespace,
            header.line,
            tag,
        )?;
        if fields.len() < 9 {
            return Err(malformed(header.line, tag, "short arc record"));
        }
        let layer = layer_name(fields[0] as u32)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                malformed(header.line, tag, format!("arc layer code {} out of range", fields[0]))
            })?;
        let cx = to_mm(fields[1]);
        let cy = -to_mm(fields[2]);
        let radius = to_mm(fields[3]);
        // Arcs reuse the net sentinel as an "unset" trace code.
        let code_raw = if fields[7] == NET_NONE_SENTINEL as BoardUnit {
            0
        } else {
            fields[7]
        };
        let code = tech_code(code_raw, header.line, tag)?;

        let mut arc_start = 360.0 + fields[4] as f64 / 64.0;
        if arc_start > 360.0 {
            arc_start -= 360.0;
        }
        let mut arc_end = arc_start + fields[5] as f64 / 64.0;
        if arc_end > 360.0 {
            arc_end -= 360.0;
        }
        let (sin_s, cos_s) = arc_start.to_radians().sin_cos();
        let (sin_e, cos_e) = arc_end.to_radians().sin_cos();

        self.statements.push(Statement::GrArc {
            start: (cx + radius * cos_s, cy + radius * sin_s),
            mid: (cx, cy),
            end: (cx + radius * cos_e, cy + radius * sin_e),
            width: to_mm(self.tables.trace_width(code)),
            layer: layer.to_string(),
        });
        Ok(())
    }

    /// `*LP`: a filled polygon; vertex pairs follow on the body lines.
    fn polygon_record(
        &mut self,
        header: RecordHeader<'_>,
        reader: &mut RecordReader<'_>,
    ) -> Result<(), ConvertError> {
        let tag = header.tag;
        let fields = parse_ints(
            header.text.get(4..).unwrap_or(""),
            char::is_whitespace,
            header.line,
            tag,
        )?;
        if fields.len() < 2 {
            return Err(malformed(header.line, tag, "short polygon record"));
        }
        let layer = layer_name(fields[0] as u32)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                malformed(header.line, tag, format!("polygon layer code {} out of range", fields[0]))
            })?;
        let net = net_index(fields[1] as u32);

        let mut values: Vec<BoardUnit> = Vec::new();
        loop {
            let line = reader.require_line(tag)?;
            if line.starts_with(';') || line.starts_with(':') {
                break;
            }
            let content = line.trim_matches(|c| c == ':' || c == ';');
            values.extend(parse_ints(
                content,
                char::is_whitespace,
                reader.line_number(),
                tag,
            )?);
            if line.contains(':') || line.contains(';') {
                break;
            }
        }
        let vertices = values
            .chunks_exact(2)
            .map(|pair| (to_mm(pair[0]), -to_mm(pair[1])))
            .collect();

        self.statements.push(Statement::Zone(Zone {
            net,
            net_name: self.nets.resolve_name(net),
            layer: layer.to_string(),
            vertices,
        }));
        Ok(())
    }

    /// `*V`: a column of vias sharing the X coordinate on the record line.
    /// Diameter and drill come from the via's pad code.
    fn via_record(
        &mut self,
        header: RecordHeader<'_>,
        reader: &mut RecordReader<'_>,
    ) -> Result<(), ConvertError> {
        let tag = header.tag;
        let x_raw = int_field(
            header.text.get(3..).unwrap_or("").split(' ').next().unwrap_or(""),
            header.line,
            tag,
        )?;
        let x = to_mm(x_raw);

        loop {
            let line = reader.require_line(tag)?;
            if line.starts_with(';') {
                return Ok(());
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 3 {
                return Err(malformed(reader.line_number(), tag, "short via line"));
            }
            let y = -to_mm(int_field(fields[0], reader.line_number(), tag)?);
            let net = net_index(int_field(fields[1], reader.line_number(), tag)? as u32);
            let code = tech_code(
                int_field(fields[2], reader.line_number(), tag)?,
                reader.line_number(),
                tag,
            )?;
            self.statements.push(Statement::Via {
                at: (x, y),
                size: to_mm(self.tables.pad(PadLevel::Top, code).y),
                drill: to_mm(self.tables.drill(code)),
                net,
            });
            if line.contains(';') {
                return Ok(());
            }
        }
    }

    /// `*X`: free text. Layer code 0 means "auto": positive rotations go to
    /// the top silk layer, the rest to the bottom one.
    fn text_record(&mut self, header: RecordHeader<'_>) -> Result<(), ConvertError> {
        let tag = header.tag;
        let fields: Vec<&str> = header.text.get(3..).unwrap_or("").splitn(8, ' ').collect();
        if fields.len() < 8 {
            return Err(malformed(header.line, tag, "short text record"));
        }
        let x = to_mm(int_field(fields[0], header.line, tag)?);
        let y = -to_mm(int_field(fields[1], header.line, tag)?);
        let height = to_mm(int_field(fields[2], header.line, tag)?);
        let width = to_mm(int_field(fields[3], header.line, tag)?);
        let thickness = to_mm_f(int_field(fields[4], header.line, tag)? as f64 / 5.0);
        let rotation = int_field(fields[5], header.line, tag)? as f64 / 64.0;
        let code = int_field(fields[6], header.line, tag)? as u32;

        let mirror = code == 2 || code == 4;
        let resolved = if code == 0 {
            if rotation > 0.0 { 0 } else { 7 }
        } else {
            code
        };
        let layer = layer_name(resolved)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                malformed(header.line, tag, format!("text layer code {} out of range", code))
            })?;

        self.statements.push(Statement::Text(GrText {
            text: fields[7].to_string(),
            at: (x, y),
            rotation,
            layer: layer.to_string(),
            size: (height, width),
            thickness,
            mirror,
        }));
        Ok(())
    }
}

fn tech_code(raw: BoardUnit, line: usize, tag: char) -> Result<u8, ConvertError> {
    u8::try_from(raw)
        .map_err(|_| malformed(line, tag, format!("technology code {} out of range", raw)))
}

/// Parses one whitespace token as a board-unit integer, tolerating an
/// attached block terminator.
fn int_field(field: &str, line: usize, tag: char) -> Result<BoardUnit, ConvertError> {
    field
        .trim()
        .trim_end_matches([';', ':'])
        .parse::<BoardUnit>()
        .map_err(|_| malformed(line, tag, format!("bad integer field \"{}\"", field)))
}

fn float_field(field: &str, line: usize, tag: char) -> Result<f64, ConvertError> {
    field
        .trim()
        .trim_end_matches([';', ':'])
        .parse::<f64>()
        .map_err(|_| malformed(line, tag, format!("bad numeric field \"{}\"", field)))
}
