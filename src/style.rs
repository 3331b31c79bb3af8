use std::collections::BTreeSet;

use lightningcss::traits::Parse;
use lightningcss::values::color::{CssColor, SRGB};

use crate::types::Color;

// Presentation attributes read from element attributes. Anything else on an element
// (geometry, ids, hrefs) is not style.
const PRESENTATION_ATTRIBUTES: &[&str] = &[
    "fill",
    "fill-opacity",
    "fill-rule",
    "stroke",
    "stroke-width",
    "stroke-opacity",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-dasharray",
    "stroke-dashoffset",
    "opacity",
    "color",
    "font-family",
    "font-size",
    "font-weight",
    "font-style",
    "text-decoration",
    "text-decoration-line",
    "text-anchor",
    "visibility",
    "display",
    "clip-path",
    "mask",
    "filter",
    "marker-start",
    "marker-mid",
    "marker-end",
    "stop-color",
    "stop-opacity",
];

// Properties we recognise but do not implement; they degrade silently.
const UNSUPPORTED_PROPERTIES: &[&str] = &[
    "clip-path",
    "mask",
    "filter",
    "marker-start",
    "marker-mid",
    "marker-end",
];

pub const DEFAULT_FONT_SIZE: f32 = 16.0;
pub const DEFAULT_FONT_FAMILY: &str = "sans-serif";
// Weights at or above this render bold.
pub const BOLD_THRESHOLD: u16 = 600;

// A named text decoration. New kinds only need an entry in DECORATION_KEYWORDS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decoration(&'static str);

impl Decoration {
    pub const UNDERLINE: Decoration = Decoration("underline");
    pub const LINE_THROUGH: Decoration = Decoration("line-through");
    pub const OVERLINE: Decoration = Decoration("overline");

    pub fn name(&self) -> &'static str {
        self.0
    }

    pub fn from_keyword(keyword: &str) -> Option<Decoration> {
        DECORATION_KEYWORDS
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(keyword))
            .map(|(_, d)| *d)
    }
}

const DECORATION_KEYWORDS: &[(&str, Decoration)] = &[
    ("underline", Decoration::UNDERLINE),
    ("line-through", Decoration::LINE_THROUGH),
    ("strike-through", Decoration::LINE_THROUGH),
    ("overline", Decoration::OVERLINE),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decorations(BTreeSet<Decoration>);

impl Decorations {
    pub fn insert(&mut self, decoration: Decoration) -> bool {
        self.0.insert(decoration)
    }

    pub fn contains(&self, decoration: Decoration) -> bool {
        self.0.contains(&decoration)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Decoration> + '_ {
        self.0.iter().copied()
    }

    // None when the value names no decoration at all (keeps the inherited set).
    pub fn parse(value: &str) -> Option<Decorations> {
        let mut out = Decorations::default();
        let mut saw_none = false;
        for token in value.split_whitespace() {
            if token.eq_ignore_ascii_case("none") {
                saw_none = true;
            } else if let Some(d) = Decoration::from_keyword(token) {
                out.insert(d);
            }
        }
        if out.is_empty() && !saw_none {
            return None;
        }
        Some(out)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintSource {
    None,
    Color { color: Color, alpha: f32 },
    CurrentColor,
    Url { id: String, fallback: Option<Color> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

// Resolved, inheritable style at one node.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleContext {
    pub fill: PaintSource,
    pub fill_opacity: f32,
    pub fill_rule: FillRule,
    pub stroke: PaintSource,
    pub stroke_opacity: f32,
    pub stroke_width: f32,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f32,
    pub dash_array: Vec<f32>,
    pub dash_offset: f32,
    // Product of `opacity` along the ancestor chain.
    pub opacity: f32,
    pub color: Color,
    pub font_families: Vec<String>,
    pub font_size: f32,
    pub font_weight: u16,
    pub font_style: FontStyle,
    pub decorations: Decorations,
    pub text_anchor: TextAnchor,
    pub visible: bool,
}

impl Default for StyleContext {
    fn default() -> Self {
        // SVG defaults: black fill, no stroke.
        Self {
            fill: PaintSource::Color {
                color: Color::BLACK,
                alpha: 1.0,
            },
            fill_opacity: 1.0,
            fill_rule: FillRule::NonZero,
            stroke: PaintSource::None,
            stroke_opacity: 1.0,
            stroke_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 4.0,
            dash_array: Vec::new(),
            dash_offset: 0.0,
            opacity: 1.0,
            color: Color::BLACK,
            font_families: vec![DEFAULT_FONT_FAMILY.to_string()],
            font_size: DEFAULT_FONT_SIZE,
            font_weight: 400,
            font_style: FontStyle::Normal,
            decorations: Decorations::default(),
            text_anchor: TextAnchor::Start,
            visible: true,
        }
    }
}

impl StyleContext {
    pub fn is_bold(&self) -> bool {
        self.font_weight >= BOLD_THRESHOLD
    }

    pub fn is_italic(&self) -> bool {
        self.font_style != FontStyle::Normal
    }

    // Child context: start from the parent and apply only what the element declares.
    pub fn derive(&self, decls: &Declarations, lengths: &LengthContext) -> StyleContext {
        let mut out = self.clone();
        // font-size first so em-relative lengths below see the element's own size.
        if let Some(v) = decls.get("font-size") {
            if let Some(size) = parse_font_size(v, self.font_size) {
                out.font_size = size;
            }
        }
        let lengths = LengthContext {
            font_size: out.font_size,
            ..*lengths
        };
        for (name, value) in decls.iter() {
            out.apply(name, value, &lengths);
        }
        out
    }

    fn apply(&mut self, name: &str, value: &str, lengths: &LengthContext) {
        if value.eq_ignore_ascii_case("inherit") {
            return;
        }
        match name {
            "fill" => {
                if let Some(paint) = parse_paint(value) {
                    self.fill = paint;
                }
            }
            "stroke" => {
                if let Some(paint) = parse_paint(value) {
                    self.stroke = paint;
                }
            }
            "fill-opacity" => {
                if let Some(v) = parse_opacity(value) {
                    self.fill_opacity = v;
                }
            }
            "stroke-opacity" => {
                if let Some(v) = parse_opacity(value) {
                    self.stroke_opacity = v;
                }
            }
            "opacity" => {
                if let Some(v) = parse_opacity(value) {
                    self.opacity *= v;
                }
            }
            "fill-rule" => {
                self.fill_rule = match value {
                    "evenodd" => FillRule::EvenOdd,
                    _ => FillRule::NonZero,
                };
            }
            "stroke-width" => {
                if let Some(v) = lengths.resolve(value, Axis::Diagonal) {
                    self.stroke_width = v.max(0.0);
                }
            }
            "stroke-linecap" => {
                self.line_cap = match value {
                    "round" => LineCap::Round,
                    "square" => LineCap::Square,
                    _ => LineCap::Butt,
                };
            }
            "stroke-linejoin" => {
                self.line_join = match value {
                    "round" => LineJoin::Round,
                    "bevel" => LineJoin::Bevel,
                    _ => LineJoin::Miter,
                };
            }
            "stroke-miterlimit" => {
                if let Some(v) = parse_number(value) {
                    self.miter_limit = v.max(1.0);
                }
            }
            "stroke-dasharray" => {
                if value.eq_ignore_ascii_case("none") {
                    self.dash_array.clear();
                } else if let Some(mut dashes) = value
                    .split(|c: char| c.is_whitespace() || c == ',')
                    .filter(|s| !s.is_empty())
                    .map(|s| lengths.resolve(s, Axis::Diagonal))
                    .collect::<Option<Vec<f32>>>()
                {
                    if dashes.iter().any(|v| *v < 0.0) || dashes.iter().all(|v| *v == 0.0) {
                        dashes.clear();
                    }
                    if dashes.len() % 2 == 1 {
                        let dup = dashes.clone();
                        dashes.extend_from_slice(&dup);
                    }
                    self.dash_array = dashes;
                }
            }
            "stroke-dashoffset" => {
                if let Some(v) = lengths.resolve(value, Axis::Diagonal) {
                    self.dash_offset = v;
                }
            }
            "color" => {
                if let Some((c, _)) = parse_color(value) {
                    self.color = c;
                }
            }
            "font-family" => {
                let families = parse_font_families(value);
                if !families.is_empty() {
                    self.font_families = families;
                }
            }
            "font-weight" => {
                if let Some(w) = parse_font_weight(value, self.font_weight) {
                    self.font_weight = w;
                }
            }
            "font-style" => {
                self.font_style = match value {
                    "italic" => FontStyle::Italic,
                    "oblique" => FontStyle::Oblique,
                    _ => FontStyle::Normal,
                };
            }
            "text-decoration" | "text-decoration-line" => {
                if let Some(d) = Decorations::parse(value) {
                    self.decorations = d;
                }
            }
            "text-anchor" => {
                self.text_anchor = match value {
                    "middle" => TextAnchor::Middle,
                    "end" => TextAnchor::End,
                    _ => TextAnchor::Start,
                };
            }
            "visibility" => {
                self.visible = !matches!(value, "hidden" | "collapse");
            }
            _ => {}
        }
    }
}

// Ordered property declarations for one element: presentation attributes first,
// then `style=""` entries, which replace same-named attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declarations {
    entries: Vec<(String, String)>,
}

impl Declarations {
    pub fn from_node(node: roxmltree::Node<'_, '_>) -> Declarations {
        let mut out = Declarations::default();
        for name in PRESENTATION_ATTRIBUTES {
            if let Some(value) = node.attribute(*name) {
                out.set(name, value);
            }
        }
        if let Some(style) = node.attribute("style") {
            out.extend_from_style(style);
        }
        out
    }

    pub fn extend_from_style(&mut self, input: &str) {
        for decl in input.split(';') {
            let Some((k, v)) = decl.split_once(':') else {
                continue;
            };
            let key = k.trim().to_ascii_lowercase();
            let mut value = v.trim();
            if let Some((before, _)) = value.rsplit_once("!important") {
                value = before.trim();
            }
            if key.is_empty() || value.is_empty() {
                continue;
            }
            self.set(&key, value);
        }
    }

    pub fn set(&mut self, name: &str, value: &str) {
        let value = value.trim().to_string();
        match self.entries.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn display_none(&self) -> bool {
        self.get("display")
            .is_some_and(|v| v.eq_ignore_ascii_case("none"))
    }

    pub fn unsupported(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(k, v)| UNSUPPORTED_PROPERTIES.contains(&k.as_str()) && v != "none")
            .map(|(k, _)| k.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Axis {
    Horizontal,
    Vertical,
    Diagonal,
}

// Reference sizes for unit and percentage resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthContext {
    pub font_size: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
}

impl Default for LengthContext {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            viewport_width: 100.0,
            viewport_height: 100.0,
        }
    }
}

impl LengthContext {
    // The length that 100% refers to along `axis`.
    pub fn percent_base(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.viewport_width,
            Axis::Vertical => self.viewport_height,
            Axis::Diagonal => libm::sqrtf(
                (self.viewport_width * self.viewport_width
                    + self.viewport_height * self.viewport_height)
                    / 2.0,
            ),
        }
    }

    pub fn resolve(&self, input: &str, axis: Axis) -> Option<f32> {
        let s = input.trim();
        if let Some(p) = s.strip_suffix('%') {
            let v = p.trim().parse::<f32>().ok().filter(|v| v.is_finite())?;
            return Some(self.percent_base(axis) * v / 100.0);
        }
        let units = [
            ("px", 1.0),
            ("pt", 4.0 / 3.0),
            ("pc", 16.0),
            ("mm", 96.0 / 25.4),
            ("cm", 96.0 / 2.54),
            ("in", 96.0),
            ("em", self.font_size),
            ("ex", self.font_size / 2.0),
        ];
        let (num, factor) = units
            .iter()
            .find_map(|&(unit, factor)| s.strip_suffix(unit).map(|n| (n, factor)))
            .unwrap_or((s, 1.0));
        let v = num.trim().parse::<f32>().ok().filter(|v| v.is_finite())?;
        Some(v * factor)
    }
}

pub(crate) fn parse_number(input: &str) -> Option<f32> {
    input
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
}

pub(crate) fn parse_opacity(input: &str) -> Option<f32> {
    let s = input.trim();
    let v = match s.strip_suffix('%') {
        Some(p) => p.trim().parse::<f32>().ok()? / 100.0,
        None => s.parse::<f32>().ok()?,
    };
    v.is_finite().then(|| v.clamp(0.0, 1.0))
}

pub(crate) fn parse_paint(input: &str) -> Option<PaintSource> {
    let v = input.trim();
    if v.eq_ignore_ascii_case("none") {
        return Some(PaintSource::None);
    }
    if v.eq_ignore_ascii_case("currentcolor") {
        return Some(PaintSource::CurrentColor);
    }
    if let Some((id, rest)) = parse_url_ref(v) {
        let fallback = parse_color(rest).map(|(c, _)| c);
        return Some(PaintSource::Url { id, fallback });
    }
    // Unknown paint keeps the inherited value.
    parse_color(v).map(|(color, alpha)| PaintSource::Color { color, alpha })
}

// `url(#id) <rest>` -> (id, rest)
pub(crate) fn parse_url_ref(input: &str) -> Option<(String, &str)> {
    let s = input.trim();
    if !s.get(..4)?.eq_ignore_ascii_case("url(") {
        return None;
    }
    let close = s.find(')')?;
    let inner = s[4..close].trim().trim_matches('"').trim_matches('\'');
    let id = inner.strip_prefix('#')?;
    if id.is_empty() {
        return None;
    }
    Some((id.to_string(), s[close + 1..].trim()))
}

pub(crate) fn parse_color(input: &str) -> Option<(Color, f32)> {
    let v = input.trim();
    if v.is_empty() || v.eq_ignore_ascii_case("none") || v.eq_ignore_ascii_case("currentcolor") {
        return None;
    }
    let color = CssColor::parse_string(v).ok()?;
    css_color_to_rgb(&color)
}

fn css_color_to_rgb(color: &CssColor) -> Option<(Color, f32)> {
    if let CssColor::RGBA(rgba) = color {
        let alpha = (rgba.alpha as f32 / 255.0).clamp(0.0, 1.0);
        return Some((Color::from_rgb8(rgba.red, rgba.green, rgba.blue), alpha));
    }
    if let Ok(srgb) = SRGB::try_from(color) {
        let alpha = if srgb.alpha.is_finite() {
            srgb.alpha.clamp(0.0, 1.0)
        } else {
            1.0
        };
        return Some((Color::rgb(srgb.r, srgb.g, srgb.b), alpha));
    }
    None
}

fn parse_font_families(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|f| f.trim().trim_matches('"').trim_matches('\'').trim())
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_font_size(value: &str, parent: f32) -> Option<f32> {
    let size = match value.trim() {
        "xx-small" => 9.0,
        "x-small" => 10.0,
        "small" => 13.0,
        "medium" => 16.0,
        "large" => 18.0,
        "x-large" => 24.0,
        "xx-large" => 32.0,
        "larger" => parent * 1.2,
        "smaller" => parent / 1.2,
        other => {
            let lengths = LengthContext {
                font_size: parent,
                viewport_width: parent,
                viewport_height: parent,
            };
            lengths.resolve(other, Axis::Horizontal)?
        }
    };
    (size >= 0.0).then_some(size)
}

fn parse_font_weight(value: &str, parent: u16) -> Option<u16> {
    match value.trim() {
        "normal" => Some(400),
        "bold" => Some(700),
        "bolder" => Some(if parent < BOLD_THRESHOLD { 700 } else { 900 }),
        "lighter" => Some(if parent >= BOLD_THRESHOLD { 400 } else { 100 }),
        other => other
            .parse::<u16>()
            .ok()
            .filter(|w| (1..=1000).contains(w)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decls(pairs: &[(&str, &str)]) -> Declarations {
        let mut d = Declarations::default();
        for (k, v) in pairs {
            d.set(k, v);
        }
        d
    }

    fn first_element(svg: &str) -> Declarations {
        let doc = roxmltree::Document::parse(svg).unwrap();
        let node = doc
            .root_element()
            .children()
            .find(|n| n.is_element())
            .unwrap();
        Declarations::from_node(node)
    }

    #[test]
    fn inline_style_overrides_same_named_attribute() {
        let d = first_element(
            r##"<svg><rect fill="#ff0000" stroke="#00ff00" style="fill: #0000ff !important"/></svg>"##,
        );
        assert_eq!(d.get("fill"), Some("#0000ff"));
        assert_eq!(d.get("stroke"), Some("#00ff00"));
        let style = StyleContext::default().derive(&d, &LengthContext::default());
        assert_eq!(
            style.fill,
            PaintSource::Color {
                color: Color::rgb(0.0, 0.0, 1.0),
                alpha: 1.0
            }
        );
    }

    #[test]
    fn child_inherits_everything_it_does_not_override() {
        let lengths = LengthContext::default();
        let parent = StyleContext::default().derive(
            &decls(&[
                ("stroke", "blue"),
                ("stroke-width", "3"),
                ("font-family", "'Courier New', monospace"),
                ("text-decoration", "underline"),
            ]),
            &lengths,
        );
        let child = parent.derive(&decls(&[("stroke-width", "5")]), &lengths);
        assert_eq!(child.stroke, parent.stroke);
        assert_eq!(child.stroke_width, 5.0);
        assert_eq!(child.font_families, vec!["Courier New", "monospace"]);
        assert!(child.decorations.contains(Decoration::UNDERLINE));
        assert_eq!(child.fill, StyleContext::default().fill);
    }

    #[test]
    fn decoration_keywords_combine_as_a_set() {
        let style = StyleContext::default().derive(
            &decls(&[("text-decoration", "underline overline")]),
            &LengthContext::default(),
        );
        assert_eq!(style.decorations.len(), 2);
        assert!(style.decorations.contains(Decoration::OVERLINE));

        let d = Decorations::parse("strike-through underline line-through").unwrap();
        assert_eq!(d.len(), 2);
        assert!(Decorations::parse("none").unwrap().is_empty());
        assert_eq!(Decorations::parse("wavy"), None);
    }

    #[test]
    fn opacity_multiplies_while_fill_opacity_replaces() {
        let lengths = LengthContext::default();
        let parent = StyleContext::default()
            .derive(&decls(&[("opacity", "0.5"), ("fill-opacity", "0.5")]), &lengths);
        let child = parent.derive(&decls(&[("opacity", "50%"), ("fill-opacity", "0.8")]), &lengths);
        assert!((child.opacity - 0.25).abs() < 1e-6);
        assert!((child.fill_opacity - 0.8).abs() < 1e-6);
    }

    #[test]
    fn paints_parse_colors_urls_and_none() {
        assert_eq!(parse_paint("none"), Some(PaintSource::None));
        assert_eq!(parse_paint("currentColor"), Some(PaintSource::CurrentColor));
        assert_eq!(
            parse_paint("url(#grad) red"),
            Some(PaintSource::Url {
                id: "grad".to_string(),
                fallback: Some(Color::rgb(1.0, 0.0, 0.0)),
            })
        );
        match parse_paint("rgba(0, 0, 255, 0.5)") {
            Some(PaintSource::Color { color, alpha }) => {
                assert_eq!(color, Color::rgb(0.0, 0.0, 1.0));
                assert!((alpha - 0.5).abs() < 0.01);
            }
            other => panic!("unexpected paint {other:?}"),
        }
        assert_eq!(parse_paint("not-a-color"), None);
    }

    #[test]
    fn named_and_short_hex_colors() {
        assert_eq!(parse_color("#0f0").map(|c| c.0), Some(Color::rgb(0.0, 1.0, 0.0)));
        assert_eq!(
            parse_color("orange").map(|c| c.0.to_rgb8()),
            Some((255, 165, 0))
        );
    }

    #[test]
    fn lengths_resolve_units_and_percentages() {
        let l = LengthContext {
            font_size: 10.0,
            viewport_width: 200.0,
            viewport_height: 50.0,
        };
        assert_eq!(l.resolve("12", Axis::Horizontal), Some(12.0));
        assert_eq!(l.resolve("2em", Axis::Horizontal), Some(20.0));
        assert_eq!(l.resolve("1in", Axis::Horizontal), Some(96.0));
        assert_eq!(l.resolve("50%", Axis::Horizontal), Some(100.0));
        assert_eq!(l.resolve("50%", Axis::Vertical), Some(25.0));
        assert_eq!(l.resolve("1e1px", Axis::Horizontal), Some(10.0));
        assert_eq!(l.resolve("3furlongs", Axis::Horizontal), None);
    }

    #[test]
    fn font_weight_and_style_flags() {
        let lengths = LengthContext::default();
        let bold = StyleContext::default().derive(
            &decls(&[("font-weight", "bold"), ("font-style", "italic")]),
            &lengths,
        );
        assert!(bold.is_bold());
        assert!(bold.is_italic());
        let semi = StyleContext::default().derive(&decls(&[("font-weight", "600")]), &lengths);
        assert!(semi.is_bold());
        let normal = StyleContext::default().derive(&decls(&[("font-weight", "500")]), &lengths);
        assert!(!normal.is_bold());
    }

    #[test]
    fn font_size_em_is_relative_to_parent() {
        let lengths = LengthContext::default();
        let parent = StyleContext::default().derive(&decls(&[("font-size", "20px")]), &lengths);
        let child = parent.derive(
            &decls(&[("font-size", "1.5em"), ("stroke-width", "0.1em")]),
            &lengths,
        );
        assert_eq!(child.font_size, 30.0);
        assert!((child.stroke_width - 3.0).abs() < 1e-5);
    }

    #[test]
    fn dasharray_odd_lists_are_repeated() {
        let style = StyleContext::default().derive(
            &decls(&[("stroke-dasharray", "2 3 4")]),
            &LengthContext::default(),
        );
        assert_eq!(style.dash_array, vec![2.0, 3.0, 4.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn unknown_properties_are_ignored() {
        let style = StyleContext::default().derive(
            &decls(&[("shape-rendering", "crispEdges"), ("fill", "bogus")]),
            &LengthContext::default(),
        );
        assert_eq!(style, StyleContext::default());
    }

    #[test]
    fn display_and_unsupported_detection() {
        let d = first_element(
            r#"<svg><g style="display:none" filter="url(#f)" clip-path="none"/></svg>"#,
        );
        assert!(d.display_none());
        assert_eq!(d.unsupported().collect::<Vec<_>>(), vec!["filter"]);
    }
}
