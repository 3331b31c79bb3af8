use std::collections::{HashMap, HashSet};

use crate::error::ElementError;
use crate::geometry::{Matrix, parse_transform_list};
use crate::style::{Axis, Declarations, LengthContext, parse_color, parse_opacity};
use crate::types::{BBox, Color, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientKind {
    Linear,
    Radial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradientUnits {
    #[default]
    ObjectBoundingBox,
    UserSpaceOnUse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpreadMethod {
    #[default]
    Pad,
    Reflect,
    Repeat,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32, // 0..=1, non-decreasing within a gradient
    pub color: Color,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GradientGeometry {
    Linear {
        start: Point,
        end: Point,
    },
    Radial {
        center: Point,
        radius: f32,
        focal: Point,
    },
}

// Fully resolved gradient paint. Geometry lives in gradient space; `transform`
// maps it into the painted element's user space.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientDescriptor {
    pub id: String,
    pub geometry: GradientGeometry,
    pub spread: SpreadMethod,
    pub transform: Option<Matrix>,
    pub stops: Vec<GradientStop>,
}

impl GradientDescriptor {
    pub fn kind(&self) -> GradientKind {
        match self.geometry {
            GradientGeometry::Linear { .. } => GradientKind::Linear,
            GradientGeometry::Radial { .. } => GradientKind::Radial,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Coord {
    v: f32,
    is_percent: bool,
}

impl Coord {
    const fn percent(v: f32) -> Self {
        Self {
            v,
            is_percent: true,
        }
    }

    fn parse(input: &str) -> Option<Coord> {
        let s = input.trim();
        if let Some(p) = s.strip_suffix('%') {
            let v = p.trim().parse::<f32>().ok().filter(|v| v.is_finite())?;
            return Some(Coord::percent(v / 100.0));
        }
        let v = LengthContext::default().resolve(s, Axis::Horizontal)?;
        Some(Coord {
            v,
            is_percent: false,
        })
    }

    fn resolve(self, units: GradientUnits, lengths: &LengthContext, axis: Axis) -> f32 {
        match units {
            // Bounding-box space is the unit square; percentages and numbers are fractions.
            GradientUnits::ObjectBoundingBox => self.v,
            GradientUnits::UserSpaceOnUse if self.is_percent => lengths.percent_base(axis) * self.v,
            GradientUnits::UserSpaceOnUse => self.v,
        }
    }
}

// Attributes that may be absent and then inherited through `href`.
#[derive(Debug, Clone, Default, PartialEq)]
struct GradientAttrs {
    x1: Option<Coord>,
    y1: Option<Coord>,
    x2: Option<Coord>,
    y2: Option<Coord>,
    cx: Option<Coord>,
    cy: Option<Coord>,
    r: Option<Coord>,
    fx: Option<Coord>,
    fy: Option<Coord>,
    units: Option<GradientUnits>,
    spread: Option<SpreadMethod>,
    transform: Option<Matrix>,
}

impl GradientAttrs {
    fn fill_from(&mut self, base: &GradientAttrs) {
        self.x1 = self.x1.or(base.x1);
        self.y1 = self.y1.or(base.y1);
        self.x2 = self.x2.or(base.x2);
        self.y2 = self.y2.or(base.y2);
        self.cx = self.cx.or(base.cx);
        self.cy = self.cy.or(base.cy);
        self.r = self.r.or(base.r);
        self.fx = self.fx.or(base.fx);
        self.fy = self.fy.or(base.fy);
        self.units = self.units.or(base.units);
        self.spread = self.spread.or(base.spread);
        self.transform = self.transform.or(base.transform);
    }
}

// A gradient as written in the document, before bounding-box resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientDef {
    pub id: String,
    pub kind: GradientKind,
    pub stops: Vec<GradientStop>,
    href: Option<String>,
    attrs: GradientAttrs,
}

impl GradientDef {
    pub fn parse(node: roxmltree::Node<'_, '_>, id: &str) -> Result<GradientDef, ElementError> {
        let kind = match node.tag_name().name() {
            "linearGradient" => GradientKind::Linear,
            "radialGradient" => GradientKind::Radial,
            other => return Err(ElementError::UnsupportedElement(other.to_string())),
        };

        let coord = |name: &'static str| -> Result<Option<Coord>, ElementError> {
            match node.attribute(name) {
                None => Ok(None),
                Some(raw) => Coord::parse(raw).map(Some).ok_or_else(|| {
                    ElementError::InvalidAttribute {
                        name,
                        value: raw.to_string(),
                    }
                }),
            }
        };

        let units = node.attribute("gradientUnits").map(|v| match v.trim() {
            "userSpaceOnUse" => GradientUnits::UserSpaceOnUse,
            _ => GradientUnits::ObjectBoundingBox,
        });
        let spread = node.attribute("spreadMethod").map(|v| match v.trim() {
            "reflect" => SpreadMethod::Reflect,
            "repeat" => SpreadMethod::Repeat,
            _ => SpreadMethod::Pad,
        });
        let transform = node
            .attribute("gradientTransform")
            .map(parse_transform_list)
            .transpose()?;

        let attrs = GradientAttrs {
            x1: coord("x1")?,
            y1: coord("y1")?,
            x2: coord("x2")?,
            y2: coord("y2")?,
            cx: coord("cx")?,
            cy: coord("cy")?,
            r: coord("r")?,
            fx: coord("fx")?,
            fy: coord("fy")?,
            units,
            spread,
            transform,
        };

        Ok(GradientDef {
            id: id.to_string(),
            kind,
            stops: parse_stops(node),
            href: crate::defs::href_id(node),
            attrs,
        })
    }

    // Resolve against the painted element. None means "no paint".
    pub fn resolve(&self, bbox: Option<BBox>, lengths: &LengthContext) -> Option<GradientDescriptor> {
        if self.stops.is_empty() {
            return None;
        }
        let a = &self.attrs;
        let units = a.units.unwrap_or_default();
        let c = |v: Option<Coord>, default: Coord, axis: Axis| {
            v.unwrap_or(default).resolve(units, lengths, axis)
        };

        let geometry = match self.kind {
            GradientKind::Linear => GradientGeometry::Linear {
                start: Point::new(
                    c(a.x1, Coord::percent(0.0), Axis::Horizontal),
                    c(a.y1, Coord::percent(0.0), Axis::Vertical),
                ),
                end: Point::new(
                    c(a.x2, Coord::percent(1.0), Axis::Horizontal),
                    c(a.y2, Coord::percent(0.0), Axis::Vertical),
                ),
            },
            GradientKind::Radial => {
                let center = Point::new(
                    c(a.cx, Coord::percent(0.5), Axis::Horizontal),
                    c(a.cy, Coord::percent(0.5), Axis::Vertical),
                );
                // The focal point defaults to the (possibly inherited) center.
                let focal = Point::new(
                    a.fx.map_or(center.x, |v| v.resolve(units, lengths, Axis::Horizontal)),
                    a.fy.map_or(center.y, |v| v.resolve(units, lengths, Axis::Vertical)),
                );
                GradientGeometry::Radial {
                    center,
                    radius: c(a.r, Coord::percent(0.5), Axis::Diagonal).max(0.0),
                    focal,
                }
            }
        };

        let transform = match units {
            GradientUnits::ObjectBoundingBox => {
                let b = bbox?;
                if b.width <= 0.0 || b.height <= 0.0 {
                    return None;
                }
                let to_bbox = Matrix::translate(b.x, b.y).mul(Matrix::scale(b.width, b.height));
                Some(to_bbox.mul(a.transform.unwrap_or_default()))
            }
            GradientUnits::UserSpaceOnUse => a.transform.filter(|m| !m.is_identity()),
        };

        Some(GradientDescriptor {
            id: self.id.clone(),
            geometry,
            spread: a.spread.unwrap_or_default(),
            transform,
            stops: self.stops.clone(),
        })
    }
}

// Apply `href` inheritance: missing attributes and an empty stop list come from the
// referenced gradient, nearest first. Cycles stop the walk.
pub(crate) fn resolve_inheritance(defs: &mut HashMap<String, GradientDef>) {
    let snapshot = defs.clone();
    for def in defs.values_mut() {
        let mut seen = HashSet::new();
        seen.insert(def.id.clone());
        let mut next = def.href.clone();
        while let Some(base_id) = next {
            if !seen.insert(base_id.clone()) {
                break;
            }
            let Some(base) = snapshot.get(&base_id) else {
                break;
            };
            def.attrs.fill_from(&base.attrs);
            if def.stops.is_empty() {
                def.stops = base.stops.clone();
            }
            next = base.href.clone();
        }
    }
}

fn parse_stops(node: roxmltree::Node<'_, '_>) -> Vec<GradientStop> {
    let mut stops: Vec<GradientStop> = Vec::new();
    for stop in node
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "stop")
    {
        let decls = Declarations::from_node(stop);
        let offset = stop
            .attribute("offset")
            .and_then(parse_stop_offset)
            .unwrap_or(0.0);
        let (color, alpha) = decls
            .get("stop-color")
            .and_then(parse_color)
            .unwrap_or((Color::BLACK, 1.0));
        let opacity = decls
            .get("stop-opacity")
            .and_then(parse_opacity)
            .unwrap_or(1.0);
        // Offsets never decrease; a smaller offset snaps to the previous one.
        let floor = stops.last().map_or(0.0, |s| s.offset);
        stops.push(GradientStop {
            offset: offset.max(floor),
            color,
            opacity: opacity * alpha,
        });
    }
    stops
}

fn parse_stop_offset(input: &str) -> Option<f32> {
    let s = input.trim();
    let v = match s.strip_suffix('%') {
        Some(p) => p.trim().parse::<f32>().ok()? / 100.0,
        None => s.parse::<f32>().ok()?,
    };
    v.is_finite().then(|| v.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defs_of(svg: &str) -> HashMap<String, GradientDef> {
        let doc = roxmltree::Document::parse(svg).unwrap();
        let mut out = HashMap::new();
        for node in doc.descendants().filter(|n| n.is_element()) {
            let name = node.tag_name().name();
            if name != "linearGradient" && name != "radialGradient" {
                continue;
            }
            let id = node.attribute("id").unwrap();
            out.insert(id.to_string(), GradientDef::parse(node, id).unwrap());
        }
        resolve_inheritance(&mut out);
        out
    }

    const UNIT: BBox = BBox {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    #[test]
    fn radial_gradient_keeps_every_stop() {
        let defs = defs_of(
            r##"<svg><radialGradient id="r" cx="0.4" fx="0.2">
                <stop offset="0" stop-color="#ff0000"/>
                <stop offset="0.5" stop-color="#00ff00"/>
                <stop offset="1" stop-color="#0000ff"/>
            </radialGradient></svg>"##,
        );
        let desc = defs["r"]
            .resolve(Some(UNIT), &LengthContext::default())
            .unwrap();
        assert_eq!(desc.kind(), GradientKind::Radial);
        assert_eq!(desc.stops.len(), 3);
        assert_eq!(desc.stops[1].color, Color::rgb(0.0, 1.0, 0.0));
        assert_eq!(
            desc.geometry,
            GradientGeometry::Radial {
                center: Point::new(0.4, 0.5),
                radius: 0.5,
                focal: Point::new(0.2, 0.5),
            }
        );
    }

    #[test]
    fn zero_stop_gradient_resolves_to_no_paint() {
        let defs = defs_of(r#"<svg><linearGradient id="empty"/></svg>"#);
        assert!(defs["empty"]
            .resolve(Some(UNIT), &LengthContext::default())
            .is_none());
    }

    #[test]
    fn stop_offsets_are_clamped_and_monotonic() {
        let defs = defs_of(
            r#"<svg><linearGradient id="g">
                <stop offset="40%" stop-color="red" stop-opacity="0.5"/>
                <stop offset="0.2" style="stop-color: blue"/>
                <stop offset="7"/>
            </linearGradient></svg>"#,
        );
        let offsets: Vec<f32> = defs["g"].stops.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.4, 0.4, 1.0]);
        assert_eq!(defs["g"].stops[0].opacity, 0.5);
        assert_eq!(defs["g"].stops[1].color, Color::rgb(0.0, 0.0, 1.0));
        assert_eq!(defs["g"].stops[2].color, Color::BLACK);
    }

    #[test]
    fn href_inherits_stops_and_missing_attributes() {
        let defs = defs_of(
            r##"<svg xmlns:xlink="http://www.w3.org/1999/xlink">
                <linearGradient id="base" x2="0" y2="1" gradientUnits="userSpaceOnUse">
                    <stop offset="0" stop-color="white"/>
                    <stop offset="1" stop-color="black"/>
                </linearGradient>
                <linearGradient id="child" xlink:href="#base" x2="50"/>
                <linearGradient id="loop_a" href="#loop_b"/>
                <linearGradient id="loop_b" href="#loop_a"/>
            </svg>"##,
        );
        let child = &defs["child"];
        assert_eq!(child.stops.len(), 2);
        let desc = child.resolve(None, &LengthContext::default()).unwrap();
        assert_eq!(
            desc.geometry,
            GradientGeometry::Linear {
                start: Point::new(0.0, 0.0),
                end: Point::new(50.0, 1.0),
            }
        );
        assert!(defs["loop_a"].stops.is_empty());
    }

    #[test]
    fn bounding_box_units_map_through_transform() {
        let defs = defs_of(
            r#"<svg><linearGradient id="g" gradientTransform="rotate(90)">
                <stop offset="0" stop-color="red"/>
            </linearGradient></svg>"#,
        );
        let bbox = BBox {
            x: 10.0,
            y: 20.0,
            width: 100.0,
            height: 50.0,
        };
        let desc = defs["g"]
            .resolve(Some(bbox), &LengthContext::default())
            .unwrap();
        let m = desc.transform.unwrap();
        let origin = m.apply(Point::new(0.0, 0.0));
        assert_eq!(origin, Point::new(10.0, 20.0));
        assert!(defs["g"]
            .resolve(
                Some(BBox {
                    width: 0.0,
                    ..bbox
                }),
                &LengthContext::default()
            )
            .is_none());
    }
}
