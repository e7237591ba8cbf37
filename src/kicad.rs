// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/kicad.rs - Structured KiCad output statements.
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
 * # `kicad` Module
 *
 * Structured builders for the emitted KiCad PCB statements.
 *
 * Conversion produces a sequence of [Statement] values; serialization to the
 * nested-parenthesized text form happens only here, through `Display`. Tests
 * elsewhere in the crate assert on the structured values, not on strings.
 *
 * All coordinates in these types are millimeters in KiCad's coordinate
 * system, i.e. the Y flip has already been applied.
 */

use std::fmt;
use std::fmt::Display;

/// The fixed document preamble: layer stack and plot setup, parameterized
/// only by the paper size.
const PCB_HEADER: &str = r#"(kicad_pcb (version 20221018) (generator ulti2kicad)

  (general
    (thickness 1.6)
  )

  (paper "{papersize}")
  (layers
    (0 "F.Cu" signal)
    (1 "In1.Cu" power)
    (2 "In2.Cu" power)
    (31 "B.Cu" signal)
    (32 "B.Adhes" user "B.Adhesive")
    (33 "F.Adhes" user "F.Adhesive")
    (34 "B.Paste" user)
    (35 "F.Paste" user)
    (36 "B.SilkS" user "B.Silkscreen")
    (37 "F.SilkS" user "F.Silkscreen")
    (38 "B.Mask" user)
    (39 "F.Mask" user)
    (40 "Dwgs.User" user "User.Drawings")
    (41 "Cmts.User" user "User.Comments")
    (42 "Eco1.User" user "User.Eco1")
    (43 "Eco2.User" user "User.Eco2")
    (44 "Edge.Cuts" user)
    (45 "Margin" user)
    (46 "B.CrtYd" user "B.Courtyard")
    (47 "F.CrtYd" user "F.Courtyard")
    (48 "B.Fab" user)
    (49 "F.Fab" user)
  )

  (setup
    (pad_to_mask_clearance 0.051)
    (solder_mask_min_width 0.25)
    (pcbplotparams
      (layerselection 0x00010fc_ffffffff)
      (plot_on_all_layers_selection 0x0000000_00000000)
      (disableapertmacros false)
      (usegerberextensions false)
      (usegerberattributes true)
      (usegerberadvancedattributes true)
      (creategerberjobfile true)
      (dashed_line_dash_ratio 12.000000)
      (dashed_line_gap_ratio 3.000000)
      (svgprecision 4)
      (plotframeref false)
      (viasonmask false)
      (mode 1)
      (useauxorigin false)
      (hpglpennumber 1)
      (hpglpenspeed 20)
      (hpglpendiameter 15.000000)
      (dxfpolygonmode true)
      (dxfimperialunits true)
      (dxfusepcbnewfont true)
      (psnegative false)
      (psa4output false)
      (plotreference true)
      (plotvalue true)
      (plotinvisibletext false)
      (sketchpadsonfab false)
      (subtractmaskfromsilk false)
      (outputformat 1)
      (mirror false)
      (drillshape 1)
      (scaleselection 1)
      (outputdirectory "")
    )
  )

"#;

/// DDF layer codes index into this name table.
pub const LAYER_NAMES: [&str; 13] = [
    "F.SilkS",
    "F.Cu",
    "B.Cu",
    "In1.Cu",
    "In2.Cu",
    "F.Mask",
    "B.Mask",
    "B.SilkS",
    "B.Fab",
    "Cmts.User",
    "",
    "",
    "",
];

/// The DDF layer code for bottom copper.
pub const BOTTOM_COPPER_CODE: u32 = 2;

/// Looks up the KiCad layer name for a DDF layer code.
pub fn layer_name(code: u32) -> Option<&'static str> {
    LAYER_NAMES.get(code as usize).copied()
}

/// Escapes the characters the output dialect treats specially in free text.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            ']' | '\\' | '^' | '$' | '*' | '"' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Output page size, chosen from the board outline width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperSize {
    A3,
    A4,
}

impl Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaperSize::A3 => write!(f, "A3"),
            PaperSize::A4 => write!(f, "A4"),
        }
    }
}

/// Which side of the board a component sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
}

impl Side {
    /// The one-letter layer-name prefix ("F" or "B").
    pub fn letter(self) -> &'static str {
        match self {
            Side::Front => "F",
            Side::Back => "B",
        }
    }
}

/// A footprint outline primitive on the component side's silkscreen.
#[derive(Debug, Clone, PartialEq)]
pub enum FpGraphic {
    Line {
        start: (f64, f64),
        end: (f64, f64),
    },
    Circle {
        center: (f64, f64),
        end: (f64, f64),
    },
    Arc {
        start: (f64, f64),
        mid: (f64, f64),
        end: (f64, f64),
        width: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadKind {
    Smd,
    ThruHole,
}

impl Display for PadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PadKind::Smd => write!(f, "smd"),
            PadKind::ThruHole => write!(f, "thru_hole"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadShape {
    Rect,
    Circle,
    RoundRect,
}

impl Display for PadShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PadShape::Rect => write!(f, "rect"),
            PadShape::Circle => write!(f, "circle"),
            PadShape::RoundRect => write!(f, "roundrect"),
        }
    }
}

/// One emitted pad statement.
///
/// `size` is emitted verbatim in field order; the resolver fills it in the
/// axis order the pad kind requires.
#[derive(Debug, Clone, PartialEq)]
pub struct Pad {
    pub name: String,
    pub kind: PadKind,
    pub shape: PadShape,
    pub net: u32,
    pub net_name: String,
    pub at: (f64, f64, f64),
    pub size: (f64, f64),
    pub drill: Option<f64>,
    pub layers: Vec<String>,
    pub roundrect_ratio: f64,
}

impl Display for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  (pad \"{}\" {} {} (net {} \"{}\") (at {} {} {}) (size {} {})",
            self.name,
            self.kind,
            self.shape,
            self.net,
            self.net_name,
            self.at.0,
            self.at.1,
            self.at.2,
            self.size.0,
            self.size.1,
        )?;
        if let Some(drill) = self.drill {
            write!(f, " (drill {})", drill)?;
        }
        write!(f, " (layers")?;
        for layer in &self.layers {
            write!(f, " \"{}\"", layer)?;
        }
        writeln!(f, ") (roundrect_rratio {}))", self.roundrect_ratio)
    }
}

/// The component reference label emitted as a `Reference` property.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLabel {
    pub name: String,
    pub at: (f64, f64, f64),
    pub size: (f64, f64),
    pub thickness: f64,
    pub mirror: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FootprintAttr {
    Smd,
    ThroughHole,
}

/// One fully resolved component footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub shape_name: String,
    /// KiCad layer name from the placement's first net/layer pair.
    pub layer: String,
    pub side: Side,
    pub at: (f64, f64, f64),
    /// The shape-name user text on the fabrication layer.
    pub label_at: (f64, f64, f64),
    pub reference: ReferenceLabel,
    pub attr: Option<FootprintAttr>,
    pub graphics: Vec<FpGraphic>,
    pub pads: Vec<Pad>,
}

impl Display for Footprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = self.side.letter();
        writeln!(
            f,
            "(footprint \"library:{}\" (layer \"{}\")",
            self.shape_name, self.layer
        )?;
        writeln!(f, " (at {} {} {})", self.at.0, self.at.1, self.at.2)?;
        writeln!(
            f,
            "  (fp_text user \"${}\" (at {} {} {}) (layer \"F.Fab\")",
            self.shape_name, self.label_at.0, self.label_at.1, self.label_at.2
        )?;
        writeln!(f, "    (effects (font (size 0.25 0.25) (thickness 0.04)))")?;
        writeln!(f, "  )")?;
        for graphic in &self.graphics {
            match graphic {
                FpGraphic::Line { start, end } => writeln!(
                    f,
                    "  (fp_line (start {} {}) (end {} {}) (layer \"{}.SilkS\"))",
                    start.0, start.1, end.0, end.1, side
                )?,
                FpGraphic::Circle { center, end } => writeln!(
                    f,
                    "  (fp_circle (center {} {}) (end {} {}) (layer \"{}.SilkS\") (width 0.1))",
                    center.0, center.1, end.0, end.1, side
                )?,
                FpGraphic::Arc {
                    start,
                    mid,
                    end,
                    width,
                } => writeln!(
                    f,
                    "  (fp_arc (start {:.4} {:.4}) (mid {:.4} {:.4}) (end {:.4} {:.4}) (width {:.3}) (layer \"{}.SilkS\"))",
                    start.0, start.1, mid.0, mid.1, end.0, end.1, width, side
                )?,
            }
        }
        let reference = &self.reference;
        let justify = if reference.mirror { "(justify mirror)" } else { "" };
        writeln!(
            f,
            "  (property \"Reference\" \"{}\" (layer \"{}.SilkS\") (at {} {} {}) (hide no) (effects (font (size {} {}) (thickness {})) {}))",
            reference.name,
            side,
            reference.at.0,
            reference.at.1,
            reference.at.2,
            reference.size.0,
            reference.size.1,
            reference.thickness,
            justify
        )?;
        match self.attr {
            Some(FootprintAttr::Smd) => writeln!(f, "  (attr smd)")?,
            Some(FootprintAttr::ThroughHole) => writeln!(f, "  (attr through_hole)")?,
            None => {}
        }
        for pad in &self.pads {
            pad.fmt(f)?;
        }
        writeln!(f, ")")
    }
}

/// A filled copper polygon bound to one net and one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub net: u32,
    pub net_name: String,
    pub layer: String,
    pub vertices: Vec<(f64, f64)>,
}

impl Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  (zone (net {})", self.net)?;
        writeln!(f, "    (net_name \"{}\")", self.net_name)?;
        writeln!(f, "    (layer \"{}\")", self.layer)?;
        writeln!(
            f,
            "    (fill yes (thermal_gap 0.508) (thermal_bridge_width 0.508))"
        )?;
        writeln!(f, "    (connect_pads (clearance 0.152))")?;
        writeln!(f, "    (polygon")?;
        writeln!(f, "      (pts")?;
        for (x, y) in &self.vertices {
            writeln!(f, "        (xy {} {})", x, y)?;
        }
        writeln!(f, "  )))")
    }
}

/// A free text item.
#[derive(Debug, Clone, PartialEq)]
pub struct GrText {
    pub text: String,
    pub at: (f64, f64),
    pub rotation: f64,
    pub layer: String,
    /// Font size, (height, width).
    pub size: (f64, f64),
    pub thickness: f64,
    pub mirror: bool,
}

impl Display for GrText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let justify = if self.mirror { "(justify mirror)" } else { "" };
        writeln!(
            f,
            "  (gr_text \"{}\" (at {} {} {}) (layer \"{}\") (effects (font (size {} {}) (thickness {})) {}))",
            escape_text(&self.text),
            self.at.0,
            self.at.1,
            self.rotation,
            self.layer,
            self.size.0,
            self.size.1,
            self.thickness,
            justify
        )
    }
}

/// One output statement, fully determined when its source record was
/// consumed. The output document is the ordered statement sequence followed
/// by a single closing delimiter.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// The fixed document preamble; emitted once, after the first header
    /// record.
    Header(PaperSize),
    Net {
        index: u32,
        name: String,
    },
    /// A board-outline segment on the edge-cut layer.
    GrLine {
        start: (f64, f64),
        end: (f64, f64),
        width: f64,
        layer: &'static str,
    },
    /// A routed arc.
    GrArc {
        start: (f64, f64),
        mid: (f64, f64),
        end: (f64, f64),
        width: f64,
        layer: String,
    },
    /// A routed track segment.
    Segment {
        start: (f64, f64),
        end: (f64, f64),
        width: f64,
        layer: String,
        net: u32,
    },
    Via {
        at: (f64, f64),
        size: f64,
        drill: f64,
        net: u32,
    },
    Zone(Zone),
    Text(GrText),
    Footprint(Footprint),
}

impl Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Header(paper) => {
                f.write_str(&PCB_HEADER.replace("{papersize}", &paper.to_string()))
            }
            Statement::Net { index, name } => writeln!(f, "  (net {} \"{}\")", index, name),
            Statement::GrLine {
                start,
                end,
                width,
                layer,
            } => writeln!(
                f,
                "  (gr_line (start {:.4} {:.4}) (end {:.4} {:.4}) (width {}) (layer \"{}\"))",
                start.0, start.1, end.0, end.1, width, layer
            ),
            Statement::GrArc {
                start,
                mid,
                end,
                width,
                layer,
            } => writeln!(
                f,
                "  (gr_arc (start {:.4} {:.4}) (mid {:.4} {:.4}) (end {:.4} {:.4}) (width {:.3}) (layer \"{}\"))",
                start.0, start.1, mid.0, mid.1, end.0, end.1, width, layer
            ),
            Statement::Segment {
                start,
                end,
                width,
                layer,
                net,
            } => writeln!(
                f,
                "  (segment (start {:.4} {:.4}) (end {:.4} {:.4}) (width {:.3}) (layer \"{}\") (net {}))",
                start.0, start.1, end.0, end.1, width, layer, net
            ),
            Statement::Via {
                at,
                size,
                drill,
                net,
            } => writeln!(
                f,
                "  (via (at {} {}) (size {}) (drill {:.2}) (layers \"F.Cu\" \"B.Cu\") (net {}))",
                at.0, at.1, size, drill, net
            ),
            Statement::Zone(zone) => zone.fmt(f),
            Statement::Text(text) => text.fmt(f),
            Statement::Footprint(footprint) => footprint.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_substitutes_paper_size() {
        let header = Statement::Header(PaperSize::A3).to_string();
        assert!(header.starts_with("(kicad_pcb (version 20221018) (generator ulti2kicad)"));
        assert!(header.contains("(paper \"A3\")"));
        assert!(!header.contains("{papersize}"));
        assert!(header.contains("(44 \"Edge.Cuts\" user)"));
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text(r#"a]b\c^d$e*f"g"#), r#"a\]b\\c\^d\$e\*f\"g"#);
        assert_eq!(escape_text("plain"), "plain");
    }

    #[test]
    fn test_layer_name_lookup() {
        assert_eq!(layer_name(0), Some("F.SilkS"));
        assert_eq!(layer_name(2), Some("B.Cu"));
        assert_eq!(layer_name(9), Some("Cmts.User"));
        assert_eq!(layer_name(13), None);
    }

    #[test]
    fn test_segment_display() {
        let segment = Statement::Segment {
            start: (1.0, -2.0),
            end: (3.0, -4.0),
            width: 0.254,
            layer: "F.Cu".to_string(),
            net: 3,
        };
        assert_eq!(
            segment.to_string(),
            "  (segment (start 1.0000 -2.0000) (end 3.0000 -4.0000) (width 0.254) (layer \"F.Cu\") (net 3))\n"
        );
    }

    #[test]
    fn test_smd_pad_display_has_no_drill() {
        let pad = Pad {
            name: "1".to_string(),
            kind: PadKind::Smd,
            shape: PadShape::RoundRect,
            net: 2,
            net_name: "VCC".to_string(),
            at: (1.5, -0.5, 90.0),
            size: (2.0, 1.0),
            drill: None,
            layers: vec![
                "F.Cu".to_string(),
                "F.Paste".to_string(),
                "F.Mask".to_string(),
            ],
            roundrect_ratio: 0.25,
        };
        let text = pad.to_string();
        assert!(text.starts_with("  (pad \"1\" smd roundrect (net 2 \"VCC\")"));
        assert!(!text.contains("(drill"));
        assert!(text.contains("(layers \"F.Cu\" \"F.Paste\" \"F.Mask\")"));
        assert!(text.contains("(roundrect_rratio 0.25)"));
    }

    #[test]
    fn test_thru_hole_pad_display_has_drill() {
        let pad = Pad {
            name: "2".to_string(),
            kind: PadKind::ThruHole,
            shape: PadShape::Circle,
            net: 0,
            net_name: "SB$0".to_string(),
            at: (0.0, 0.0, -90.0),
            size: (1.6, 1.6),
            drill: Some(0.8),
            layers: vec!["*.Cu".to_string(), "*.Mask".to_string()],
            roundrect_ratio: 0.5,
        };
        let text = pad.to_string();
        assert!(text.contains("thru_hole circle"));
        assert!(text.contains("(drill 0.8)"));
        assert!(text.contains("(layers \"*.Cu\" \"*.Mask\")"));
    }

    #[test]
    fn test_zone_display() {
        let zone = Zone {
            net: 1,
            net_name: "GND".to_string(),
            layer: "B.Cu".to_string(),
            vertices: vec![(0.0, 0.0), (1.0, 0.0), (1.0, -1.0)],
        };
        let text = zone.to_string();
        assert!(text.starts_with("  (zone (net 1)\n    (net_name \"GND\")\n    (layer \"B.Cu\")"));
        assert_eq!(text.matches("(xy ").count(), 3);
        assert!(text.ends_with("  )))\n"));
    }

    #[test]
    fn test_text_display_escapes_and_mirrors() {
        let text = GrText {
            text: "5V*".to_string(),
            at: (1.0, -2.0),
            rotation: 0.0,
            layer: "B.Cu".to_string(),
            size: (1.0, 1.0),
            thickness: 0.1,
            mirror: true,
        };
        let out = text.to_string();
        assert!(out.contains("\"5V\\*\""));
        assert!(out.contains("(justify mirror)"));
    }
}
