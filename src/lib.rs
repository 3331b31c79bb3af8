mod command;
mod debug;
mod defs;
mod embedded;
mod error;
mod geometry;
mod gradient;
mod perf;
mod shapes;
mod style;
mod text;
mod translate;
mod types;
mod validate;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::debug;

pub use command::{
    DecorationLine, DrawCommand, Fill, FontSpec, ImageCommand, ImageFormat, Paint, PathCommand,
    Stroke, TextCommand,
};
use debug::DebugLogger;
pub use defs::DefinitionSummary;
pub use embedded::{DecodedImage, decode_data_uri};
pub use error::{
    Diagnostic, DocumentError, ElementError, ImageError, PathError, Severity, TransformError,
};
pub use geometry::{Matrix, Segment, Subpath, bbox_of_subpaths, parse_path_data, parse_transform_list};
pub use gradient::{
    GradientDescriptor, GradientGeometry, GradientKind, GradientStop, GradientUnits, SpreadMethod,
};
use perf::{PerfLogger, TranslationSizes};
pub use shapes::ShapeKind;
pub use style::{
    Axis, BOLD_THRESHOLD, Declarations, Decoration, Decorations, FillRule, FontStyle,
    LengthContext, LineCap, LineJoin, PaintSource, StyleContext, TextAnchor,
};
pub use text::{DefaultFontMetrics, FontMetrics, FontMetricsProvider, FontRegistry};
pub use translate::{AbortHandle, ElementKind, Phase, Translation};
use translate::{Settings, translate_document};
pub use types::{BBox, Color, Point, Pt};
pub use validate::{ValidationError, validate_path, validate_str};

// Compiles SVG documents into draw commands. Cheap to share across threads; each
// call gets its own registry and stacks.
pub struct SvgCompiler {
    settings: Settings,
    debug: Option<DebugLogger>,
    perf: Option<PerfLogger>,
}

#[derive(Clone)]
pub struct SvgCompilerBuilder {
    viewport: Option<(f32, f32)>,
    scale: f32,
    definitions_only: bool,
    max_use_depth: usize,
    font_metrics: Option<Arc<dyn FontMetricsProvider>>,
    font_files: Vec<PathBuf>,
    font_bytes: Vec<(Vec<u8>, Option<String>)>,
    abort: Option<AbortHandle>,
    debug_path: Option<PathBuf>,
    perf_path: Option<PathBuf>,
}

impl Default for SvgCompilerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgCompilerBuilder {
    pub fn new() -> Self {
        let defaults = Settings::default();
        Self {
            viewport: defaults.viewport,
            scale: defaults.scale,
            definitions_only: defaults.definitions_only,
            max_use_depth: defaults.max_use_depth,
            font_metrics: None,
            font_files: Vec::new(),
            font_bytes: Vec::new(),
            abort: None,
            debug_path: None,
            perf_path: None,
        }
    }

    // Target size for the root viewBox. Defaults to the root width/height.
    pub fn viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport = Some((width, height));
        self
    }

    // Uniform scale applied on top of the viewBox mapping.
    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    // Collect definitions and report diagnostics without emitting commands.
    pub fn definitions_only(mut self, enabled: bool) -> Self {
        self.definitions_only = enabled;
        self
    }

    pub fn max_use_depth(mut self, depth: usize) -> Self {
        self.max_use_depth = depth;
        self
    }

    pub fn font_metrics(mut self, provider: Arc<dyn FontMetricsProvider>) -> Self {
        self.font_metrics = Some(provider);
        self
    }

    pub fn font_file(mut self, path: impl AsRef<Path>) -> Self {
        self.font_files.push(path.as_ref().to_path_buf());
        self
    }

    pub fn font_bytes(mut self, data: Vec<u8>, name: Option<&str>) -> Self {
        self.font_bytes.push((data, name.map(str::to_string)));
        self
    }

    pub fn abort_handle(mut self, handle: AbortHandle) -> Self {
        self.abort = Some(handle);
        self
    }

    pub fn debug_log(mut self, path: impl AsRef<Path>) -> Self {
        self.debug_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn perf_log(mut self, path: impl AsRef<Path>) -> Self {
        self.perf_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> Result<SvgCompiler, DocumentError> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(DocumentError::InvalidConfiguration(format!(
                "scale must be finite and > 0, got {}",
                self.scale
            )));
        }
        if let Some((w, h)) = self.viewport {
            if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
                return Err(DocumentError::InvalidConfiguration(format!(
                    "viewport must be finite and > 0, got {w}x{h}"
                )));
            }
        }
        if self.max_use_depth == 0 {
            return Err(DocumentError::InvalidConfiguration(
                "max_use_depth must be >= 1".to_string(),
            ));
        }

        let has_faces = !self.font_files.is_empty() || !self.font_bytes.is_empty();
        let fonts: Arc<dyn FontMetricsProvider> = match self.font_metrics {
            Some(_) if has_faces => {
                return Err(DocumentError::InvalidConfiguration(
                    "font_metrics cannot be combined with font_file/font_bytes".to_string(),
                ));
            }
            Some(provider) => provider,
            None if has_faces => {
                let mut registry = FontRegistry::new();
                for file in &self.font_files {
                    registry.register_file(file)?;
                }
                for (data, name) in &self.font_bytes {
                    registry.register_bytes(data, name.as_deref())?;
                }
                debug!(
                    faces = registry.len(),
                    names = ?registry.names().collect::<Vec<_>>(),
                    "svg fonts registered"
                );
                Arc::new(registry)
            }
            None => Arc::new(DefaultFontMetrics),
        };

        let debug = self.debug_path.map(DebugLogger::new).transpose()?;
        let perf = self.perf_path.map(PerfLogger::new).transpose()?;

        Ok(SvgCompiler {
            settings: Settings {
                viewport: self.viewport,
                scale: self.scale,
                definitions_only: self.definitions_only,
                max_use_depth: self.max_use_depth,
                fonts,
                abort: self.abort,
            },
            debug,
            perf,
        })
    }
}

impl SvgCompiler {
    pub fn builder() -> SvgCompilerBuilder {
        SvgCompilerBuilder::new()
    }

    pub fn translate(&self, svg: &str) -> Result<Translation, DocumentError> {
        self.run(svg, None)
    }

    // Independent documents in parallel; results keep the input order.
    pub fn translate_batch(&self, documents: &[&str]) -> Vec<Result<Translation, DocumentError>> {
        documents
            .par_iter()
            .enumerate()
            .map(|(index, svg)| self.run(svg, Some(index)))
            .collect()
    }

    fn run(&self, svg: &str, doc_id: Option<usize>) -> Result<Translation, DocumentError> {
        let start = Instant::now();
        let result = translate_document(svg, &self.settings);
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(t) => {
                debug!(
                    doc_id,
                    commands = t.commands.len(),
                    diagnostics = t.diagnostics.len(),
                    elapsed_ms,
                    "svg translated"
                );
                if let Some(logger) = &self.debug {
                    logger.log_translation(doc_id, &t.diagnostics, t.commands.len());
                }
                if let Some(perf) = &self.perf {
                    perf.log_translation(
                        doc_id,
                        elapsed_ms,
                        Some(TranslationSizes {
                            commands: t.commands.len() as u64,
                            diagnostics: t.diagnostics.len() as u64,
                            definitions: t.definitions.total() as u64,
                        }),
                    );
                }
            }
            Err(e) => {
                debug!(doc_id, error = %e, "svg translation failed");
                if let Some(perf) = &self.perf {
                    perf.log_translation(doc_id, elapsed_ms, None);
                }
            }
        }
        result
    }
}

// Translate with default settings.
pub fn translate(svg: &str) -> Result<Translation, DocumentError> {
    translate_document(svg, &Settings::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn compiler_is_shareable() {
        assert_send_sync::<SvgCompiler>();
        assert_send_sync::<Translation>();
    }

    #[test]
    fn builder_rejects_bad_configuration() {
        for builder in [
            SvgCompiler::builder().scale(0.0),
            SvgCompiler::builder().scale(f32::NAN),
            SvgCompiler::builder().viewport(-1.0, 10.0),
            SvgCompiler::builder().max_use_depth(0),
            SvgCompiler::builder().font_bytes(b"nope".to_vec(), Some("Nope")),
            SvgCompiler::builder()
                .font_metrics(Arc::new(DefaultFontMetrics))
                .font_bytes(Vec::new(), None),
        ] {
            assert!(matches!(
                builder.build(),
                Err(DocumentError::InvalidConfiguration(_))
            ));
        }
        assert!(matches!(
            SvgCompiler::builder()
                .font_file("/nonexistent/svgprim/font.ttf")
                .build(),
            Err(DocumentError::Io(_))
        ));
    }

    #[test]
    fn batch_preserves_input_order() {
        let compiler = SvgCompiler::builder().build().unwrap();
        let docs = [
            r#"<svg><rect width="1" height="1"/></svg>"#,
            "<svg><g>",
            r#"<svg><circle r="1"/><circle r="2"/></svg>"#,
            "<svg/>",
        ];
        let out = compiler.translate_batch(&docs);
        let counts: Vec<Option<usize>> = out
            .iter()
            .map(|r| r.as_ref().ok().map(|t| t.commands.len()))
            .collect();
        assert_eq!(counts, vec![Some(1), None, Some(2), Some(0)]);
    }

    #[test]
    fn builder_settings_reach_the_translation() {
        let compiler = SvgCompiler::builder()
            .scale(3.0)
            .build()
            .unwrap();
        let t = compiler
            .translate(r#"<svg><rect width="1" height="1"/></svg>"#)
            .unwrap();
        assert_eq!(t.commands[0].transform(), Matrix::scale(3.0, 3.0));

        let defs_only = SvgCompiler::builder()
            .definitions_only(true)
            .build()
            .unwrap()
            .translate(r##"<svg><defs><rect id="a"/></defs><use href="#a"/></svg>"##)
            .unwrap();
        assert!(defs_only.commands.is_empty());
        assert_eq!(defs_only.definitions.elements, 1);
    }

    #[test]
    fn free_function_matches_default_compiler() {
        let svg = r#"<svg><text x="1" y="2">hello</text></svg>"#;
        let compiler = SvgCompiler::builder().build().unwrap();
        assert_eq!(translate(svg).unwrap(), compiler.translate(svg).unwrap());
    }

    #[test]
    fn logs_are_written_per_translation() {
        let dir = std::env::temp_dir();
        let pid = std::process::id();
        let debug_path = dir.join(format!("svgprim_lib_debug_{pid}.jsonl"));
        let perf_path = dir.join(format!("svgprim_lib_perf_{pid}.jsonl"));
        {
            let compiler = SvgCompiler::builder()
                .debug_log(&debug_path)
                .perf_log(&perf_path)
                .build()
                .unwrap();
            compiler
                .translate(r##"<svg><use href="#nowhere"/></svg>"##)
                .unwrap();
        }
        let debug_text = std::fs::read_to_string(&debug_path).unwrap();
        assert!(debug_text.contains("\"type\":\"svg.diagnostic\""));
        assert!(debug_text.contains("\"counts\":{\"commands\":0,\"element\":1}"));
        let perf_text = std::fs::read_to_string(&perf_path).unwrap();
        assert!(perf_text.contains("\"name\":\"svg.translate\""));
        assert!(perf_text.contains("\"definitions\":0"));
        let hot = dir.join(format!("svgprim_lib_perf_{pid}_hot.log"));
        for path in [debug_path, perf_path, hot] {
            let _ = std::fs::remove_file(path);
        }
    }

    #[test]
    fn batch_summaries_count_only_their_own_document() {
        let path = std::env::temp_dir().join(format!(
            "svgprim_lib_batch_debug_{}.jsonl",
            std::process::id()
        ));
        let docs: Vec<String> = (0..64)
            .map(|i| {
                let uses = r##"<use href="#missing"/>"##.repeat(i % 7 + 1);
                format!("<svg>{uses}</svg>")
            })
            .collect();
        let refs: Vec<&str> = docs.iter().map(String::as_str).collect();
        {
            let compiler = SvgCompiler::builder().debug_log(&path).build().unwrap();
            compiler.translate_batch(&refs);
        }

        let text = std::fs::read_to_string(&path).unwrap();
        let summaries: Vec<&str> = text
            .lines()
            .filter(|line| line.contains("\"type\":\"svg.summary\""))
            .collect();
        assert_eq!(summaries.len(), docs.len());
        for i in 0..docs.len() {
            let expected = format!(
                "{{\"type\":\"svg.summary\",\"doc_id\":{i},\"counts\":{{\"commands\":0,\"element\":{}}}}}",
                i % 7 + 1
            );
            assert!(summaries.contains(&expected.as_str()), "missing {expected}");
        }
        let _ = std::fs::remove_file(path);
    }
}
