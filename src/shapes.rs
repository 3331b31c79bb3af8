use roxmltree::Node;

use crate::command::{Fill, Paint, PathCommand, Stroke};
use crate::defs::Registry;
use crate::error::ElementError;
use crate::geometry::{Matrix, PathBuilder, Subpath, bbox_of_subpaths, parse_path_data};
use crate::style::{Axis, LengthContext, PaintSource, StyleContext};
use crate::types::{BBox, Point, q};

// Cubic approximation of a quarter circle.
const KAPPA: f32 = 0.552_284_8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Path,
    Rect,
    Circle,
    Ellipse,
    Line,
    Polyline,
    Polygon,
}

impl ShapeKind {
    pub fn from_tag(tag: &str) -> Option<ShapeKind> {
        Some(match tag {
            "path" => ShapeKind::Path,
            "rect" => ShapeKind::Rect,
            "circle" => ShapeKind::Circle,
            "ellipse" => ShapeKind::Ellipse,
            "line" => ShapeKind::Line,
            "polyline" => ShapeKind::Polyline,
            "polygon" => ShapeKind::Polygon,
            _ => return None,
        })
    }
}

// Every shape becomes path geometry. Zero-sized shapes yield no subpaths.
pub fn shape_subpaths(
    kind: ShapeKind,
    node: Node<'_, '_>,
    lengths: &LengthContext,
) -> Result<Vec<Subpath>, ElementError> {
    let len = |name: &'static str, axis: Axis| length_attr(node, name, axis, lengths);
    match kind {
        ShapeKind::Path => {
            let d = node.attribute("d").ok_or(ElementError::MissingAttribute("d"))?;
            Ok(parse_path_data(d)?)
        }
        ShapeKind::Rect => {
            let x = len("x", Axis::Horizontal)?.unwrap_or(0.0);
            let y = len("y", Axis::Vertical)?.unwrap_or(0.0);
            let w = non_negative("width", len("width", Axis::Horizontal)?)?;
            let h = non_negative("height", len("height", Axis::Vertical)?)?;
            let rx = len("rx", Axis::Horizontal)?.filter(|v| *v >= 0.0);
            let ry = len("ry", Axis::Vertical)?.filter(|v| *v >= 0.0);
            // A missing radius mirrors the other one.
            let (rx, ry) = match (rx, ry) {
                (Some(rx), Some(ry)) => (rx, ry),
                (Some(r), None) | (None, Some(r)) => (r, r),
                (None, None) => (0.0, 0.0),
            };
            Ok(rect_subpaths(x, y, w, h, rx.min(w / 2.0), ry.min(h / 2.0)))
        }
        ShapeKind::Circle => {
            let cx = len("cx", Axis::Horizontal)?.unwrap_or(0.0);
            let cy = len("cy", Axis::Vertical)?.unwrap_or(0.0);
            let r = non_negative("r", len("r", Axis::Diagonal)?)?;
            Ok(ellipse_subpaths(cx, cy, r, r))
        }
        ShapeKind::Ellipse => {
            let cx = len("cx", Axis::Horizontal)?.unwrap_or(0.0);
            let cy = len("cy", Axis::Vertical)?.unwrap_or(0.0);
            let rx = non_negative("rx", len("rx", Axis::Horizontal)?)?;
            let ry = non_negative("ry", len("ry", Axis::Vertical)?)?;
            Ok(ellipse_subpaths(cx, cy, rx, ry))
        }
        ShapeKind::Line => {
            let mut b = PathBuilder::default();
            b.move_to(Point::new(
                len("x1", Axis::Horizontal)?.unwrap_or(0.0),
                len("y1", Axis::Vertical)?.unwrap_or(0.0),
            ));
            b.line_to(Point::new(
                len("x2", Axis::Horizontal)?.unwrap_or(0.0),
                len("y2", Axis::Vertical)?.unwrap_or(0.0),
            ));
            Ok(b.finish())
        }
        ShapeKind::Polyline | ShapeKind::Polygon => {
            let raw = node
                .attribute("points")
                .ok_or(ElementError::MissingAttribute("points"))?;
            let points = parse_points(raw).ok_or_else(|| ElementError::InvalidAttribute {
                name: "points",
                value: raw.to_string(),
            })?;
            let mut b = PathBuilder::default();
            let mut it = points.into_iter();
            if let Some(first) = it.next() {
                b.move_to(first);
            }
            for p in it {
                b.line_to(p);
            }
            if kind == ShapeKind::Polygon {
                b.close();
            }
            Ok(b.finish())
        }
    }
}

pub(crate) fn length_attr(
    node: Node<'_, '_>,
    name: &'static str,
    axis: Axis,
    lengths: &LengthContext,
) -> Result<Option<f32>, ElementError> {
    match node.attribute(name) {
        None => Ok(None),
        Some(raw) => lengths
            .resolve(raw, axis)
            .map(Some)
            .ok_or_else(|| ElementError::InvalidAttribute {
                name,
                value: raw.to_string(),
            }),
    }
}

// Absent means zero (nothing drawn); negative is an error.
fn non_negative(name: &'static str, value: Option<f32>) -> Result<f32, ElementError> {
    match value {
        Some(v) if v < 0.0 => Err(ElementError::InvalidAttribute {
            name,
            value: v.to_string(),
        }),
        Some(v) => Ok(v),
        None => Ok(0.0),
    }
}

fn rect_subpaths(x: f32, y: f32, w: f32, h: f32, rx: f32, ry: f32) -> Vec<Subpath> {
    if w <= 0.0 || h <= 0.0 {
        return Vec::new();
    }
    let mut b = PathBuilder::default();
    if rx <= 0.0 || ry <= 0.0 {
        b.move_to(Point::new(x, y));
        b.line_to(Point::new(x + w, y));
        b.line_to(Point::new(x + w, y + h));
        b.line_to(Point::new(x, y + h));
        b.close();
        return b.finish();
    }
    let (kx, ky) = (rx * KAPPA, ry * KAPPA);
    let (r, btm) = (x + w, y + h);
    b.move_to(Point::new(x + rx, y));
    b.line_to(Point::new(r - rx, y));
    b.cubic_to(
        Point::new(r - rx + kx, y),
        Point::new(r, y + ry - ky),
        Point::new(r, y + ry),
    );
    b.line_to(Point::new(r, btm - ry));
    b.cubic_to(
        Point::new(r, btm - ry + ky),
        Point::new(r - rx + kx, btm),
        Point::new(r - rx, btm),
    );
    b.line_to(Point::new(x + rx, btm));
    b.cubic_to(
        Point::new(x + rx - kx, btm),
        Point::new(x, btm - ry + ky),
        Point::new(x, btm - ry),
    );
    b.line_to(Point::new(x, y + ry));
    b.cubic_to(
        Point::new(x, y + ry - ky),
        Point::new(x + rx - kx, y),
        Point::new(x + rx, y),
    );
    b.close();
    b.finish()
}

fn ellipse_subpaths(cx: f32, cy: f32, rx: f32, ry: f32) -> Vec<Subpath> {
    if rx <= 0.0 || ry <= 0.0 {
        return Vec::new();
    }
    let (ox, oy) = (rx * KAPPA, ry * KAPPA);
    let mut b = PathBuilder::default();
    b.move_to(Point::new(cx + rx, cy));
    b.cubic_to(
        Point::new(cx + rx, cy + oy),
        Point::new(cx + ox, cy + ry),
        Point::new(cx, cy + ry),
    );
    b.cubic_to(
        Point::new(cx - ox, cy + ry),
        Point::new(cx - rx, cy + oy),
        Point::new(cx - rx, cy),
    );
    b.cubic_to(
        Point::new(cx - rx, cy - oy),
        Point::new(cx - ox, cy - ry),
        Point::new(cx, cy - ry),
    );
    b.cubic_to(
        Point::new(cx + ox, cy - ry),
        Point::new(cx + rx, cy - oy),
        Point::new(cx + rx, cy),
    );
    b.close();
    b.finish()
}

// Coordinate pairs; a trailing odd number is dropped, a bad token fails.
fn parse_points(input: &str) -> Option<Vec<Point>> {
    let nums = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f32>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<f32>>>()?;
    Some(
        nums.chunks_exact(2)
            .map(|pair| Point::new(pair[0], pair[1]))
            .collect(),
    )
}

// Inputs shared by fill and stroke resolution for one element.
pub(crate) struct PaintScope<'r, 'a, 'input> {
    pub registry: &'r Registry<'a, 'input>,
    pub lengths: &'r LengthContext,
    pub bbox: Option<BBox>,
}

impl PaintScope<'_, '_, '_> {
    // Recoverable problems land in `warnings`; the paint still resolves if it can.
    pub(crate) fn resolve(
        &self,
        source: &PaintSource,
        opacity: f32,
        style: &StyleContext,
        warnings: &mut Vec<ElementError>,
    ) -> Option<Paint> {
        let opacity = (opacity * style.opacity).clamp(0.0, 1.0);
        match source {
            PaintSource::None => None,
            PaintSource::Color { color, alpha } => Some(Paint::Solid {
                color: *color,
                opacity: opacity * alpha,
            }),
            PaintSource::CurrentColor => Some(Paint::Solid {
                color: style.color,
                opacity,
            }),
            PaintSource::Url { id, fallback } => {
                let fallback = fallback.map(|color| Paint::Solid { color, opacity });
                if let Some(def) = self.registry.gradient(id) {
                    if def.stops.is_empty() {
                        warnings.push(ElementError::InvalidGradient(id.clone()));
                        return fallback;
                    }
                    // None for a degenerate bounding box: nothing to spread the gradient over.
                    return def
                        .resolve(self.bbox, self.lengths)
                        .map(|gradient| Paint::Gradient { gradient, opacity })
                        .or(fallback);
                }
                match self.registry.element(id) {
                    // Patterns degrade to the fallback silently.
                    Ok(node) if node.tag_name().name() == "pattern" => fallback,
                    _ => {
                        warnings.push(ElementError::UnresolvedReference(id.clone()));
                        fallback
                    }
                }
            }
        }
    }
}

// Build the path command for already-computed local geometry. None when nothing
// would be painted.
pub(crate) fn emit_path(
    subpaths: Vec<Subpath>,
    style: &StyleContext,
    transform: Matrix,
    registry: &Registry<'_, '_>,
    lengths: &LengthContext,
    warnings: &mut Vec<ElementError>,
) -> Option<PathCommand> {
    if subpaths.is_empty() || !style.visible {
        return None;
    }
    let scope = PaintScope {
        registry,
        lengths,
        bbox: bbox_of_subpaths(&subpaths),
    };

    let fill = scope
        .resolve(&style.fill, style.fill_opacity, style, warnings)
        .map(|paint| Fill {
            paint,
            rule: style.fill_rule,
        });
    let stroke = if style.stroke_width > 0.0 {
        scope
            .resolve(&style.stroke, style.stroke_opacity, style, warnings)
            .map(|paint| Stroke {
                paint,
                width: q(style.stroke_width),
                cap: style.line_cap,
                join: style.line_join,
                miter_limit: style.miter_limit,
                dash_array: style.dash_array.iter().map(|v| q(*v)).collect(),
                dash_offset: q(style.dash_offset),
            })
    } else {
        None
    };

    if fill.is_none() && stroke.is_none() {
        return None;
    }
    Some(PathCommand {
        subpaths: subpaths.iter().map(Subpath::quantized).collect(),
        fill,
        stroke,
        transform,
    })
}
