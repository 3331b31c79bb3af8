use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use roxmltree::Node;

use crate::command::{DecorationLine, FontSpec, TextCommand};
use crate::error::{DocumentError, ElementError};
use crate::geometry::Matrix;
use crate::shapes::PaintScope;
use crate::style::{Axis, Decoration, LengthContext, StyleContext};
use crate::types::{Point, q};

// Vertical font metrics in em units (multiply by font size). Positions are
// measured upwards from the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub cap_height: f32,
    pub underline_position: f32,
    pub underline_thickness: f32,
    pub strikeout_position: f32,
    pub strikeout_thickness: f32,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            ascent: 0.8,
            descent: -0.2,
            cap_height: 0.7,
            underline_position: -0.1,
            underline_thickness: 0.05,
            strikeout_position: 0.3,
            strikeout_thickness: 0.05,
        }
    }
}

impl FontMetrics {
    fn from_face(face: &ttf_parser::Face<'_>) -> Self {
        let upem = face.units_per_em().max(1) as f32;
        let em = |v: i16| v as f32 / upem;
        let ascent = em(face.ascender());
        let cap_height = face.capital_height().map(em).unwrap_or(ascent * 0.875);
        let fallback = FontMetrics::default();
        let (underline_position, underline_thickness) = face
            .underline_metrics()
            .map(|m| (em(m.position), em(m.thickness)))
            .unwrap_or((fallback.underline_position, fallback.underline_thickness));
        let (strikeout_position, strikeout_thickness) = face
            .strikeout_metrics()
            .map(|m| (em(m.position), em(m.thickness)))
            .unwrap_or((cap_height / 2.0, underline_thickness));
        Self {
            ascent,
            descent: em(face.descender()),
            cap_height,
            underline_position,
            underline_thickness,
            strikeout_position,
            strikeout_thickness,
        }
    }

    // Placement of one decoration at `size`. Unknown kinds get no line.
    pub fn decoration_line(&self, decoration: Decoration, size: f32) -> Option<DecorationLine> {
        let (position, thickness) = match decoration {
            Decoration::UNDERLINE => (self.underline_position, self.underline_thickness),
            Decoration::LINE_THROUGH => (self.strikeout_position, self.strikeout_thickness),
            Decoration::OVERLINE => (self.ascent, self.underline_thickness),
            _ => return None,
        };
        Some(DecorationLine {
            decoration,
            offset: q(-position * size),
            thickness: q(thickness * size),
        })
    }
}

// Supplies metrics for decoration placement; the compiler never shapes text.
pub trait FontMetricsProvider: Send + Sync + fmt::Debug {
    fn metrics(&self, families: &[String], bold: bool, italic: bool) -> FontMetrics;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFontMetrics;

impl FontMetricsProvider for DefaultFontMetrics {
    fn metrics(&self, _families: &[String], _bold: bool, _italic: bool) -> FontMetrics {
        FontMetrics::default()
    }
}

#[derive(Debug)]
struct RegisteredFont {
    name: String,
    metrics: FontMetrics,
}

// Metrics read from TrueType/OpenType faces, looked up by family, full or
// PostScript name. Families with no registered face use the fallback.
#[derive(Debug, Default)]
pub struct FontRegistry {
    fonts: Vec<RegisteredFont>,
    lookup: HashMap<String, usize>,
    fallback: FontMetrics,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_file(&mut self, path: impl AsRef<Path>) -> Result<String, DocumentError> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let source = path
            .file_stem()
            .and_then(|v| v.to_str())
            .unwrap_or("EmbeddedFont");
        self.register_bytes(&data, Some(source))
    }

    pub fn register_bytes(
        &mut self,
        data: &[u8],
        source_name: Option<&str>,
    ) -> Result<String, DocumentError> {
        let source = source_name.unwrap_or("EmbeddedFont");
        let face = ttf_parser::Face::parse(data, 0).map_err(|_| {
            DocumentError::InvalidConfiguration(format!("invalid font data for {source}"))
        })?;
        let (name, aliases) = font_names(&face, source);
        let index = self.fonts.len();
        self.fonts.push(RegisteredFont {
            name: name.clone(),
            metrics: FontMetrics::from_face(&face),
        });
        for alias in std::iter::once(name.clone()).chain(aliases) {
            let key = normalize_name(&alias);
            if !key.is_empty() {
                self.lookup.entry(key).or_insert(index);
            }
        }
        Ok(name)
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fonts.iter().map(|f| f.name.as_str())
    }
}

impl FontMetricsProvider for FontRegistry {
    fn metrics(&self, families: &[String], _bold: bool, _italic: bool) -> FontMetrics {
        families
            .iter()
            .find_map(|family| self.lookup.get(&normalize_name(family)))
            .map(|&i| self.fonts[i].metrics)
            .unwrap_or(self.fallback)
    }
}

fn font_names(face: &ttf_parser::Face<'_>, source: &str) -> (String, Vec<String>) {
    use ttf_parser::name::name_id;

    let mut family = None;
    let mut full = None;
    let mut post = None;
    for entry in face.names() {
        let Some(name) = entry.to_string() else {
            continue;
        };
        let slot = match entry.name_id {
            name_id::TYPOGRAPHIC_FAMILY | name_id::FAMILY => &mut family,
            name_id::FULL_NAME => &mut full,
            name_id::POST_SCRIPT_NAME => &mut post,
            _ => continue,
        };
        slot.get_or_insert(name);
    }

    let primary = family
        .clone()
        .or_else(|| full.clone())
        .or_else(|| post.clone())
        .unwrap_or_else(|| source.to_string());
    let aliases = [full, post, Some(source.to_string())]
        .into_iter()
        .flatten()
        .filter(|a| *a != primary)
        .collect();
    (primary, aliases)
}

fn normalize_name(name: &str) -> String {
    name.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .to_ascii_lowercase()
}

// Descendant character data (tspan included), whitespace collapsed.
fn text_content(node: Node<'_, '_>) -> String {
    let raw: String = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

// First entry of a coordinate list attribute such as `x="10 20 30"`.
fn first_length(
    node: Node<'_, '_>,
    name: &'static str,
    axis: Axis,
    lengths: &LengthContext,
) -> Result<f32, ElementError> {
    let Some(raw) = node.attribute(name) else {
        return Ok(0.0);
    };
    let Some(first) = raw
        .split(|c: char| c.is_whitespace() || c == ',')
        .find(|s| !s.is_empty())
    else {
        return Ok(0.0);
    };
    lengths
        .resolve(first, axis)
        .ok_or_else(|| ElementError::InvalidAttribute {
            name,
            value: raw.to_string(),
        })
}

pub(crate) fn translate_text(
    node: Node<'_, '_>,
    style: &StyleContext,
    transform: Matrix,
    scope: &PaintScope<'_, '_, '_>,
    fonts: &dyn FontMetricsProvider,
    warnings: &mut Vec<ElementError>,
) -> Result<Option<TextCommand>, ElementError> {
    let lengths = scope.lengths;
    let x = first_length(node, "x", Axis::Horizontal, lengths)?
        + first_length(node, "dx", Axis::Horizontal, lengths)?;
    let y = first_length(node, "y", Axis::Vertical, lengths)?
        + first_length(node, "dy", Axis::Vertical, lengths)?;

    let content = text_content(node);
    if content.is_empty() || !style.visible {
        return Ok(None);
    }

    let fill = scope.resolve(&style.fill, style.fill_opacity, style, warnings);
    let bold = style.is_bold();
    let italic = style.is_italic();
    let metrics = fonts.metrics(&style.font_families, bold, italic);
    let decoration_lines = style
        .decorations
        .iter()
        .filter_map(|d| metrics.decoration_line(d, style.font_size))
        .collect();

    Ok(Some(TextCommand {
        content,
        position: Point::new(x, y).quantized(),
        font: FontSpec {
            families: style.font_families.clone(),
            size: q(style.font_size),
            weight: style.font_weight,
            bold,
            italic,
        },
        fill,
        anchor: style.text_anchor,
        decorations: style.decorations.clone(),
        decoration_lines,
        transform,
    }))
}
