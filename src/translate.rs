use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use roxmltree::{Document, Node, ParsingOptions};
use tracing::{debug, warn};

use crate::command::DrawCommand;
use crate::defs::{DefinitionSummary, Registry, href_id};
use crate::embedded::translate_image;
use crate::error::{Diagnostic, DocumentError, ElementError, Severity};
use crate::geometry::{Matrix, parse_number_list, parse_transform_list};
use crate::shapes::{PaintScope, ShapeKind, emit_path, length_attr, shape_subpaths};
use crate::style::{Axis, Declarations, LengthContext, StyleContext};
use crate::text::{DefaultFontMetrics, FontMetricsProvider, translate_text};

pub(crate) const SVG_NS: &str = "http://www.w3.org/2000/svg";

// Shared flag checked between the root's top-level children.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub viewport: Option<(f32, f32)>,
    pub scale: f32,
    pub definitions_only: bool,
    pub max_use_depth: usize,
    pub fonts: Arc<dyn FontMetricsProvider>,
    pub abort: Option<AbortHandle>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            viewport: None,
            scale: 1.0,
            definitions_only: false,
            max_use_depth: 16,
            fonts: Arc::new(DefaultFontMetrics),
            abort: None,
        }
    }
}

// Result of one translation: commands in paint order plus everything recovered.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub commands: Vec<DrawCommand>,
    pub diagnostics: Vec<Diagnostic>,
    pub definitions: DefinitionSummary,
}

impl Translation {
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    CollectingDefinitions,
    Rendering,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Group,
    // Renders only its first child whose conditions hold.
    Switch,
    Shape(ShapeKind),
    Text,
    Image,
    Use,
    // Only drawn through a reference (defs, symbol, gradients, style sheets).
    Definition,
    // Recognised but not implemented; ignored with an informational diagnostic.
    Unsupported,
    // Metadata with no visual meaning.
    Ignored,
    Unknown,
}

impl ElementKind {
    pub fn classify(node: Node<'_, '_>) -> ElementKind {
        if node
            .tag_name()
            .namespace()
            .is_some_and(|ns| ns != SVG_NS)
        {
            return ElementKind::Ignored;
        }
        let tag = node.tag_name().name();
        if let Some(shape) = ShapeKind::from_tag(tag) {
            return ElementKind::Shape(shape);
        }
        match tag {
            "g" | "a" => ElementKind::Group,
            "switch" => ElementKind::Switch,
            "text" => ElementKind::Text,
            "image" => ElementKind::Image,
            "use" => ElementKind::Use,
            "defs" | "symbol" | "linearGradient" | "radialGradient" | "style" => {
                ElementKind::Definition
            }
            "clipPath" | "mask" | "filter" | "pattern" | "marker" | "svg" | "foreignObject" => {
                ElementKind::Unsupported
            }
            "title" | "desc" | "metadata" | "script" => ElementKind::Ignored,
            _ => ElementKind::Unknown,
        }
    }
}

pub(crate) fn parse_document(text: &str) -> Result<Document<'_>, DocumentError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Ok(Document::parse_with_options(text, options)?)
}

pub(crate) fn translate_document(
    text: &str,
    settings: &Settings,
) -> Result<Translation, DocumentError> {
    let doc = parse_document(text)?;
    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return Err(DocumentError::UnexpectedRoot(
            root.tag_name().name().to_string(),
        ));
    }

    let mut translator = Translator::new(root, settings);
    if !settings.definitions_only {
        translator.enter(Phase::Rendering);
        translator.render_root(root)?;
    }
    Ok(translator.finish())
}

// One instance per document; consumed by `finish`.
struct Translator<'a, 'input, 's> {
    phase: Phase,
    settings: &'s Settings,
    registry: Registry<'a, 'input>,
    transforms: Vec<Matrix>,
    lengths: LengthContext,
    use_chain: Vec<String>,
    commands: Vec<DrawCommand>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a, 'input, 's> Translator<'a, 'input, 's> {
    fn new(root: Node<'a, 'input>, settings: &'s Settings) -> Self {
        debug!(phase = ?Phase::CollectingDefinitions, "svg phase");
        let mut diagnostics = Vec::new();
        let registry = Registry::collect(root, &mut diagnostics);
        for d in &diagnostics {
            log_diagnostic(d);
        }
        debug!(definitions = registry.len(), "svg definitions collected");
        Self {
            phase: Phase::CollectingDefinitions,
            settings,
            registry,
            transforms: Vec::new(),
            lengths: LengthContext::default(),
            use_chain: Vec::new(),
            commands: Vec::new(),
            diagnostics,
        }
    }

    fn enter(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "svg phase");
        self.phase = phase;
    }

    fn finish(mut self) -> Translation {
        self.enter(Phase::Done);
        Translation {
            commands: self.commands,
            diagnostics: self.diagnostics,
            definitions: self.registry.summary(),
        }
    }

    fn ctm(&self) -> Matrix {
        self.transforms.last().copied().unwrap_or_default()
    }

    // The pushed matrix is popped on every path out of `f`.
    fn with_transform<R>(&mut self, local: Matrix, f: impl FnOnce(&mut Self) -> R) -> R {
        let ctm = self.ctm().mul(local);
        self.transforms.push(ctm);
        let out = f(self);
        self.transforms.pop();
        out
    }

    fn record(&mut self, diagnostic: Diagnostic) {
        log_diagnostic(&diagnostic);
        self.diagnostics.push(diagnostic);
    }

    fn element_error(&mut self, node: Node<'_, '_>, error: ElementError) {
        self.record(Diagnostic::Element {
            tag: node.tag_name().name().to_string(),
            id: node.attribute("id").map(str::to_string),
            error,
        });
    }

    fn lengths_for(&self, style: &StyleContext) -> LengthContext {
        LengthContext {
            font_size: style.font_size,
            ..self.lengths
        }
    }

    fn render_root(&mut self, root: Node<'a, 'input>) -> Result<(), DocumentError> {
        let view_box = root.attribute("viewBox").and_then(parse_view_box);
        let viewport = self.settings.viewport.or_else(|| {
            let w = root.attribute("width").and_then(absolute_length)?;
            let h = root.attribute("height").and_then(absolute_length)?;
            Some((w, h))
        });
        let (vp_w, vp_h) = match (view_box, viewport) {
            (Some(vb), _) => (vb.2, vb.3),
            (None, Some(size)) => size,
            (None, None) => (self.lengths.viewport_width, self.lengths.viewport_height),
        };
        self.lengths.viewport_width = vp_w;
        self.lengths.viewport_height = vp_h;

        let mut root_matrix = match (view_box, viewport) {
            (Some(vb), Some((w, h))) => {
                view_box_matrix(vb, w, h, root.attribute("preserveAspectRatio"))
            }
            (Some(vb), None) => Matrix::translate(-vb.0, -vb.1),
            (None, _) => Matrix::identity(),
        };
        if self.settings.scale != 1.0 {
            root_matrix = Matrix::scale(self.settings.scale, self.settings.scale).mul(root_matrix);
        }

        let decls = Declarations::from_node(root);
        let style = StyleContext::default().derive(&decls, &self.lengths);
        let abort = self.settings.abort.clone();
        self.with_transform(root_matrix, |t| {
            for child in root.children().filter(|n| n.is_element()) {
                if abort.as_ref().is_some_and(AbortHandle::is_aborted) {
                    return Err(DocumentError::Aborted);
                }
                t.render_node(child, &style);
            }
            Ok(())
        })
    }

    fn render_node(&mut self, node: Node<'a, 'input>, parent: &StyleContext) {
        let kind = ElementKind::classify(node);
        let tag = node.tag_name().name();
        match kind {
            ElementKind::Ignored | ElementKind::Definition => return,
            ElementKind::Unsupported => {
                self.record(Diagnostic::UnsupportedFeature {
                    tag: tag.to_string(),
                    feature: tag.to_string(),
                });
                return;
            }
            ElementKind::Unknown => {
                self.element_error(node, ElementError::UnsupportedElement(tag.to_string()));
                return;
            }
            _ => {}
        }

        let Some((style, local)) = self.prepare(node, parent) else {
            return;
        };
        self.with_transform(local, |t| t.render_kind(node, kind, &style));
    }

    // Style and local transform for a drawable element. None skips the element.
    fn prepare(
        &mut self,
        node: Node<'a, 'input>,
        parent: &StyleContext,
    ) -> Option<(StyleContext, Matrix)> {
        let decls = Declarations::from_node(node);
        if decls.display_none() {
            return None;
        }
        let unsupported: Vec<String> = decls.unsupported().map(str::to_string).collect();
        for feature in unsupported {
            self.record(Diagnostic::UnsupportedFeature {
                tag: node.tag_name().name().to_string(),
                feature,
            });
        }
        let local = match node.attribute("transform").map(parse_transform_list) {
            None => Matrix::identity(),
            Some(Ok(m)) => m,
            Some(Err(e)) => {
                self.element_error(node, e.into());
                return None;
            }
        };
        Some((parent.derive(&decls, &self.lengths), local))
    }

    fn render_kind(&mut self, node: Node<'a, 'input>, kind: ElementKind, style: &StyleContext) {
        let lengths = self.lengths_for(style);
        let result = match kind {
            ElementKind::Group => {
                self.render_children(node, style);
                Ok(())
            }
            ElementKind::Switch => {
                if let Some(child) = node.children().find(|n| switch_candidate(*n)) {
                    self.render_node(child, style);
                }
                Ok(())
            }
            ElementKind::Shape(shape) => self.render_shape(node, shape, style, &lengths),
            ElementKind::Text => self.render_text(node, style, &lengths),
            ElementKind::Image if style.visible => {
                translate_image(node, self.ctm(), &lengths).map(|cmd| {
                    self.commands.extend(cmd.map(DrawCommand::Image));
                })
            }
            ElementKind::Use => self.render_use(node, style, &lengths),
            _ => Ok(()),
        };
        if let Err(e) = result {
            self.element_error(node, e);
        }
    }

    fn render_children(&mut self, node: Node<'a, 'input>, style: &StyleContext) {
        for child in node.children().filter(|n| n.is_element()) {
            self.render_node(child, style);
        }
    }

    fn render_shape(
        &mut self,
        node: Node<'a, 'input>,
        shape: ShapeKind,
        style: &StyleContext,
        lengths: &LengthContext,
    ) -> Result<(), ElementError> {
        let subpaths = shape_subpaths(shape, node, lengths)?;
        let mut warnings = Vec::new();
        let cmd = emit_path(
            subpaths,
            style,
            self.ctm(),
            &self.registry,
            lengths,
            &mut warnings,
        );
        self.commands.extend(cmd.map(DrawCommand::Path));
        for w in warnings {
            self.element_error(node, w);
        }
        Ok(())
    }

    fn render_text(
        &mut self,
        node: Node<'a, 'input>,
        style: &StyleContext,
        lengths: &LengthContext,
    ) -> Result<(), ElementError> {
        let scope = PaintScope {
            registry: &self.registry,
            lengths,
            bbox: None,
        };
        let mut warnings = Vec::new();
        let cmd = translate_text(
            node,
            style,
            self.ctm(),
            &scope,
            self.settings.fonts.as_ref(),
            &mut warnings,
        )?;
        self.commands.extend(cmd.map(DrawCommand::Text));
        for w in warnings {
            self.element_error(node, w);
        }
        Ok(())
    }

    fn render_use(
        &mut self,
        node: Node<'a, 'input>,
        style: &StyleContext,
        lengths: &LengthContext,
    ) -> Result<(), ElementError> {
        let id = href_id(node).ok_or(ElementError::MissingAttribute("href"))?;
        let target = self.registry.element(&id)?;
        if self.use_chain.contains(&id) || node.ancestors().any(|a| a == target) {
            return Err(ElementError::ReferenceCycle(id));
        }
        if self.use_chain.len() >= self.settings.max_use_depth {
            return Err(ElementError::ReuseTooDeep(self.settings.max_use_depth));
        }

        let x = length_attr(node, "x", Axis::Horizontal, lengths)?.unwrap_or(0.0);
        let y = length_attr(node, "y", Axis::Vertical, lengths)?.unwrap_or(0.0);
        let width = length_attr(node, "width", Axis::Horizontal, lengths)?;
        let height = length_attr(node, "height", Axis::Vertical, lengths)?;

        self.use_chain.push(id);
        self.with_transform(Matrix::translate(x, y), |t| {
            if target.tag_name().name() == "symbol" {
                t.render_symbol(target, style, width, height);
            } else {
                t.render_node(target, style);
            }
        });
        self.use_chain.pop();
        Ok(())
    }

    fn render_symbol(
        &mut self,
        symbol: Node<'a, 'input>,
        style: &StyleContext,
        width: Option<f32>,
        height: Option<f32>,
    ) {
        let Some((style, local)) = self.prepare(symbol, style) else {
            return;
        };
        let fit = match symbol.attribute("viewBox").and_then(parse_view_box) {
            Some(vb) => view_box_matrix(
                vb,
                width.unwrap_or(vb.2),
                height.unwrap_or(vb.3),
                symbol.attribute("preserveAspectRatio"),
            ),
            None => Matrix::identity(),
        };
        self.with_transform(local.mul(fit), |t| t.render_children(symbol, &style));
    }
}

fn log_diagnostic(diagnostic: &Diagnostic) {
    match diagnostic.severity() {
        Severity::Warning => warn!(kind = diagnostic.kind(), "{diagnostic}"),
        Severity::Info => debug!(kind = diagnostic.kind(), "{diagnostic}"),
    }
}

// No extensions are supported, so a non-empty `requiredExtensions` never
// matches. Language and feature tests always pass.
fn switch_candidate(node: Node<'_, '_>) -> bool {
    node.is_element()
        && !matches!(ElementKind::classify(node), ElementKind::Ignored)
        && node
            .attribute("requiredExtensions")
            .is_none_or(|v| v.trim().is_empty())
}

// (min-x, min-y, width, height); None unless both sides are positive.
fn parse_view_box(input: &str) -> Option<(f32, f32, f32, f32)> {
    match parse_number_list(input)?.as_slice() {
        &[x, y, w, h] if w > 0.0 && h > 0.0 => Some((x, y, w, h)),
        _ => None,
    }
}

// Root `width`/`height`; percentages have nothing to resolve against here.
fn absolute_length(input: &str) -> Option<f32> {
    if input.trim().ends_with('%') {
        return None;
    }
    LengthContext::default()
        .resolve(input, Axis::Horizontal)
        .filter(|v| *v > 0.0)
}

// Map a viewBox onto a width x height viewport. `none` stretches; every other
// value is treated as the default xMidYMid meet.
fn view_box_matrix(
    (vx, vy, vw, vh): (f32, f32, f32, f32),
    width: f32,
    height: f32,
    preserve: Option<&str>,
) -> Matrix {
    let sx = width / vw;
    let sy = height / vh;
    if preserve.is_some_and(|p| p.trim().starts_with("none")) {
        return Matrix::new(sx, 0.0, 0.0, sy, -vx * sx, -vy * sy);
    }
    let s = sx.min(sy);
    let tx = (width - vw * s) / 2.0 - vx * s;
    let ty = (height - vh * s) / 2.0 - vy * s;
    Matrix::new(s, 0.0, 0.0, s, tx, ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Paint, PathCommand};
    use crate::geometry::Segment;
    use crate::gradient::GradientGeometry;
    use crate::style::Decoration;
    use crate::types::{Color, Point};
    use pretty_assertions::assert_eq;

    fn run(svg: &str) -> Translation {
        translate_document(svg, &Settings::default()).unwrap()
    }

    fn paths(t: &Translation) -> Vec<&PathCommand> {
        t.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Path(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn red_rect_end_to_end() {
        let t = run(r##"<svg><rect x="0" y="0" width="10" height="10" fill="#ff0000"/></svg>"##);
        assert_eq!(t.commands.len(), 1);
        assert!(t.diagnostics.is_empty());
        let DrawCommand::Path(path) = &t.commands[0] else {
            panic!("expected a path command");
        };
        assert_eq!(path.transform, Matrix::identity());
        assert_eq!(path.subpaths.len(), 1);
        let sp = &path.subpaths[0];
        assert!(sp.closed);
        assert_eq!(sp.start, Point::new(0.0, 0.0));
        assert_eq!(
            sp.segments,
            vec![
                Segment::Line(Point::new(10.0, 0.0)),
                Segment::Line(Point::new(10.0, 10.0)),
                Segment::Line(Point::new(0.0, 10.0)),
            ]
        );
        assert_eq!(
            path.fill.as_ref().unwrap().paint,
            Paint::Solid {
                color: Color::rgb(1.0, 0.0, 0.0),
                opacity: 1.0
            }
        );
        assert!(path.stroke.is_none());
    }

    #[test]
    fn translation_is_idempotent() {
        let svg = r##"<svg viewBox="0 0 50 50" width="100" height="100">
            <defs><radialGradient id="r"><stop offset="0" stop-color="gold"/><stop offset="1"/></radialGradient></defs>
            <g transform="rotate(33 10 10) skewX(5)" opacity="0.7">
                <path d="M1.5 2 a 5 3 20 1 1 8 4 q 3 3 6 0 z" fill="url(#r)" stroke="teal"/>
                <text x="3" y="9" text-decoration="underline">hi</text>
            </g>
        </svg>"##;
        assert_eq!(run(svg), run(svg));
    }

    #[test]
    fn group_and_element_transforms_compose() {
        let t = run(
            r#"<svg><g transform="translate(10,0)"><circle cx="3" cy="4" r="1" transform="scale(2)"/></g></svg>"#,
        );
        let path = paths(&t)[0];
        assert_eq!(
            path.transform,
            Matrix::translate(10.0, 0.0).mul(Matrix::scale(2.0, 2.0))
        );
        assert_eq!(path.transform.apply(Point::new(3.0, 4.0)), Point::new(16.0, 8.0));
        assert_eq!(
            path.transform.apply(path.subpaths[0].start),
            Point::new(18.0, 8.0)
        );
    }

    #[test]
    fn forward_reference_matches_backward_reference() {
        let before = run(
            r##"<svg><use href="#a" x="5"/><defs><rect id="a" width="2" height="3"/></defs></svg>"##,
        );
        let after = run(
            r##"<svg><defs><rect id="a" width="2" height="3"/></defs><use href="#a" x="5"/></svg>"##,
        );
        assert_eq!(before.commands.len(), 1);
        assert_eq!(before.commands, after.commands);
        assert_eq!(
            before.commands[0].transform(),
            Matrix::translate(5.0, 0.0)
        );
    }

    #[test]
    fn radial_gradient_keeps_all_stops() {
        let t = run(
            r##"<svg>
                <radialGradient id="rg" fx="0.25">
                    <stop offset="0" stop-color="#ff0000"/>
                    <stop offset="0.5" stop-color="#00ff00"/>
                    <stop offset="1" stop-color="#0000ff"/>
                </radialGradient>
                <circle cx="10" cy="10" r="10" fill="url(#rg)"/>
            </svg>"##,
        );
        let fill = paths(&t)[0].fill.clone().unwrap();
        let Paint::Gradient { gradient, .. } = fill.paint else {
            panic!("expected gradient paint");
        };
        let offsets: Vec<f32> = gradient.stops.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.0, 0.5, 1.0]);
        assert_eq!(gradient.stops[2].color, Color::rgb(0.0, 0.0, 1.0));
        assert!(matches!(
            gradient.geometry,
            GradientGeometry::Radial { focal, .. } if focal == Point::new(0.25, 0.5)
        ));
    }

    #[test]
    fn decorations_union_on_text() {
        let t = run(r#"<svg><text text-decoration="underline overline">both</text></svg>"#);
        let DrawCommand::Text(text) = &t.commands[0] else {
            panic!("expected a text command");
        };
        assert_eq!(text.decorations.len(), 2);
        assert!(text.decorations.contains(Decoration::OVERLINE));
        assert_eq!(text.decoration_lines.len(), 2);
    }

    #[test]
    fn malformed_path_does_not_stop_siblings() {
        let t = run(
            r#"<svg>
                <rect width="1" height="1"/>
                <path id="bad" d="M 0 0 L 1.2.3.x 4"/>
                <circle r="2"/>
                <g><ellipse rx="1" ry="2"/></g>
            </svg>"#,
        );
        assert_eq!(t.commands.len(), 3);
        assert_eq!(t.diagnostics.len(), 1);
        assert!(matches!(
            &t.diagnostics[0],
            Diagnostic::Element { tag, id: Some(id), error: ElementError::InvalidPath(_) }
                if tag == "path" && id == "bad"
        ));
    }

    #[test]
    fn unknown_reference_draws_nothing() {
        let t = run(r##"<svg><rect width="1" height="1"/><use href="#missing"/><circle r="1"/></svg>"##);
        assert_eq!(t.commands.len(), 2);
        assert_eq!(
            t.diagnostics,
            vec![Diagnostic::Element {
                tag: "use".to_string(),
                id: None,
                error: ElementError::UnresolvedReference("missing".to_string()),
            }]
        );
    }

    #[test]
    fn use_cycles_and_depth_are_bounded() {
        let t = run(
            r##"<svg><defs>
                <g id="a"><use href="#b"/></g>
                <g id="b"><use href="#a"/></g>
            </defs><use href="#a"/><g id="self"><use href="#self"/></g></svg>"##,
        );
        assert!(t.commands.is_empty());
        let cycles = t
            .diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::Element { error: ElementError::ReferenceCycle(_), .. }))
            .count();
        assert_eq!(cycles, 2);

        let settings = Settings {
            max_use_depth: 1,
            ..Settings::default()
        };
        let t = translate_document(
            r##"<svg><defs><rect id="r" width="1" height="1"/><use id="u" href="#r"/></defs><use href="#u"/></svg>"##,
            &settings,
        )
        .unwrap();
        assert!(t.commands.is_empty());
        assert!(matches!(
            t.diagnostics[0],
            Diagnostic::Element { error: ElementError::ReuseTooDeep(1), .. }
        ));
    }

    #[test]
    fn symbol_viewbox_fits_use_size() {
        let t = run(
            r##"<svg>
                <symbol id="icon" viewBox="0 0 10 10"><rect width="10" height="10"/></symbol>
                <use href="#icon" x="100" width="20" height="40"/>
            </svg>"##,
        );
        assert_eq!(t.commands.len(), 1);
        // Uniform scale 2, centred vertically in the 40-high box.
        assert_eq!(
            t.commands[0].transform(),
            Matrix::new(2.0, 0.0, 0.0, 2.0, 100.0, 10.0)
        );
    }

    #[test]
    fn use_style_is_inherited_by_target() {
        let t = run(
            r##"<svg><defs><rect id="r" width="1" height="1"/></defs><use href="#r" fill="blue"/></svg>"##,
        );
        assert_eq!(
            paths(&t)[0].fill.as_ref().unwrap().paint,
            Paint::Solid {
                color: Color::rgb(0.0, 0.0, 1.0),
                opacity: 1.0
            }
        );
    }

    #[test]
    fn display_and_visibility() {
        let t = run(
            r#"<svg>
                <g display="none"><rect width="1" height="1"/></g>
                <g visibility="hidden">
                    <rect width="1" height="1"/>
                    <rect width="1" height="1" visibility="visible"/>
                </g>
            </svg>"#,
        );
        assert_eq!(t.commands.len(), 1);
    }

    #[test]
    fn unsupported_features_degrade_silently() {
        let t = run(
            r#"<svg>
                <clipPath id="c"><rect width="1" height="1"/></clipPath>
                <rect width="1" height="1" clip-path="url(#c)"/>
                <svg><rect width="1" height="1"/></svg>
                <title>ignored</title>
            </svg>"#,
        );
        assert_eq!(t.commands.len(), 1);
        assert_eq!(t.warnings().count(), 0);
        let features: Vec<String> = t
            .diagnostics
            .iter()
            .map(|d| match d {
                Diagnostic::UnsupportedFeature { feature, .. } => feature.clone(),
                other => panic!("unexpected diagnostic {other}"),
            })
            .collect();
        assert_eq!(features, vec!["clipPath", "clip-path", "svg"]);
    }

    #[test]
    fn unknown_element_is_reported_and_skipped() {
        let t = run(r#"<svg><blink/><rect width="1" height="1"/></svg>"#);
        assert_eq!(t.commands.len(), 1);
        assert_eq!(
            t.diagnostics[0].to_string(),
            "<blink>: unsupported element <blink>"
        );
    }

    #[test]
    fn foreign_namespace_elements_are_ignored() {
        let t = run(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:x="urn:x"><x:thing/><rect width="1" height="1"/></svg>"#,
        );
        assert_eq!(t.commands.len(), 1);
        assert!(t.diagnostics.is_empty());
    }

    #[test]
    fn bad_transform_skips_only_that_element() {
        let t = run(
            r#"<svg><rect width="1" height="1" transform="spin(4)"/><rect width="2" height="2"/></svg>"#,
        );
        assert_eq!(t.commands.len(), 1);
        assert!(matches!(
            t.diagnostics[0],
            Diagnostic::Element { error: ElementError::InvalidTransform(_), .. }
        ));
    }

    #[test]
    fn root_viewbox_maps_into_viewport_and_scale() {
        let svg = r#"<svg viewBox="10 10 20 10" width="40" height="40"><rect width="1" height="1"/></svg>"#;
        let t = run(svg);
        // meet: scale 2, centred vertically (40 - 20) / 2 = 10.
        assert_eq!(
            t.commands[0].transform(),
            Matrix::new(2.0, 0.0, 0.0, 2.0, -20.0, -10.0)
        );

        let settings = Settings {
            scale: 0.5,
            ..Settings::default()
        };
        let t = translate_document(svg, &settings).unwrap();
        assert_eq!(
            t.commands[0].transform(),
            Matrix::new(1.0, 0.0, 0.0, 1.0, -10.0, -5.0)
        );

        let settings = Settings {
            viewport: Some((20.0, 10.0)),
            ..Settings::default()
        };
        let t = translate_document(svg, &settings).unwrap();
        assert_eq!(
            t.commands[0].transform(),
            Matrix::translate(-10.0, -10.0)
        );
    }

    #[test]
    fn percentages_resolve_against_the_viewbox() {
        let t = run(r#"<svg viewBox="0 0 200 100"><rect width="50%" height="50%"/></svg>"#);
        let sp = &paths(&t)[0].subpaths[0];
        assert_eq!(sp.segments[1], Segment::Line(Point::new(100.0, 50.0)));
    }

    #[test]
    fn definitions_only_collects_without_rendering() {
        let settings = Settings {
            definitions_only: true,
            ..Settings::default()
        };
        let t = translate_document(
            r#"<svg><linearGradient id="l"/><rect id="r" width="1" height="1"/><rect id="r"/></svg>"#,
            &settings,
        )
        .unwrap();
        assert!(t.commands.is_empty());
        assert_eq!(
            t.definitions,
            DefinitionSummary {
                elements: 1,
                linear_gradients: 1,
                radial_gradients: 0,
                conflicts: 1,
            }
        );
        assert_eq!(t.diagnostics.len(), 1);
    }

    #[test]
    fn abort_stops_between_top_level_children() {
        let handle = AbortHandle::new();
        handle.abort();
        let settings = Settings {
            abort: Some(handle.clone()),
            ..Settings::default()
        };
        let err = translate_document(r#"<svg><rect width="1" height="1"/></svg>"#, &settings)
            .unwrap_err();
        assert!(matches!(err, DocumentError::Aborted));

        handle.reset();
        assert!(translate_document(r#"<svg><rect width="1" height="1"/></svg>"#, &settings).is_ok());
    }

    #[test]
    fn document_errors_are_fatal() {
        let settings = Settings::default();
        assert!(matches!(
            translate_document("", &settings),
            Err(DocumentError::MissingRoot)
        ));
        assert!(matches!(
            translate_document("<svg><g></svg>", &settings),
            Err(DocumentError::Xml(_))
        ));
        assert!(matches!(
            translate_document("<html/>", &settings),
            Err(DocumentError::UnexpectedRoot(tag)) if tag == "html"
        ));
    }

    #[test]
    fn doctype_is_accepted() {
        let t = run(
            r#"<?xml version="1.0"?>
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">
<svg xmlns="http://www.w3.org/2000/svg"><rect width="1" height="1"/></svg>"#,
        );
        assert_eq!(t.commands.len(), 1);
    }

    #[test]
    fn switch_renders_first_matching_child() {
        let t = run(
            r#"<svg><switch>
                <title>skipped</title>
                <rect requiredExtensions="http://example.com/ext" width="9" height="9"/>
                <circle r="2"/>
                <rect width="1" height="1"/>
            </switch></svg>"#,
        );
        assert_eq!(t.commands.len(), 1);
        let bbox = crate::geometry::bbox_of_subpaths(&paths(&t)[0].subpaths).unwrap();
        assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (-2.0, -2.0, 4.0, 4.0));
    }
}
