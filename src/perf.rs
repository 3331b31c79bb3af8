use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::debug::{json_doc_id, json_escape};

// Per-translation sizes reported alongside the timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TranslationSizes {
    pub commands: u64,
    pub diagnostics: u64,
    pub definitions: u64,
}

impl TranslationSizes {
    fn fields(&self) -> [(&'static str, u64); 3] {
        [
            ("commands", self.commands),
            ("diagnostics", self.diagnostics),
            ("definitions", self.definitions),
        ]
    }
}

// JSONL timing sink. Totals are ranked into `<stem>_hot.log` when the last
// clone is dropped.
#[derive(Clone)]
pub(crate) struct PerfLogger {
    inner: Arc<Mutex<PerfState>>,
}

#[derive(Default)]
struct Outcome {
    ms: f64,
    runs: u64,
    slowest: Option<(f64, Option<usize>)>,
}

struct PerfState {
    writer: BufWriter<File>,
    path: PathBuf,
    outcomes: BTreeMap<&'static str, Outcome>,
    sizes: BTreeMap<&'static str, u64>,
}

impl PerfLogger {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(PerfState {
                writer: BufWriter::new(file),
                path,
                outcomes: BTreeMap::new(),
                sizes: BTreeMap::new(),
            })),
        })
    }

    // `sizes` is None when the document was rejected.
    pub fn log_translation(&self, doc_id: Option<usize>, ms: f64, sizes: Option<TranslationSizes>) {
        let name = if sizes.is_some() {
            "svg.translate"
        } else {
            "svg.translate_failed"
        };
        let doc = json_doc_id(doc_id);
        let span = format!(
            "{{\"type\":\"perf.span\",\"name\":\"{name}\",\"doc_id\":{doc},\"unit\":\"ms\",\"ms\":{ms:.3}}}"
        );
        let counts = sizes.map(|sizes| {
            let fields = sizes
                .fields()
                .iter()
                .map(|(key, value)| format!("\"{key}\":{value}"))
                .collect::<Vec<_>>()
                .join(",");
            format!("{{\"type\":\"perf.counts\",\"name\":\"svg\",\"doc_id\":{doc},\"counts\":{{{fields}}}}}")
        });

        if let Ok(mut state) = self.inner.lock() {
            let outcome = state.outcomes.entry(name).or_default();
            outcome.ms += ms;
            outcome.runs = outcome.runs.saturating_add(1);
            if outcome.slowest.is_none_or(|(worst, _)| ms > worst) {
                outcome.slowest = Some((ms, doc_id));
            }
            if let Some(sizes) = sizes {
                for (key, value) in sizes.fields() {
                    let total = state.sizes.entry(key).or_insert(0);
                    *total = total.saturating_add(value);
                }
            }
            let _ = writeln!(state.writer, "{span}");
            if let Some(counts) = counts {
                let _ = writeln!(state.writer, "{counts}");
            }
            let _ = state.writer.flush();
        }
    }
}

impl Drop for PerfState {
    fn drop(&mut self) {
        let _ = self.writer.flush();
        let Ok(file) = File::create(hot_path_for(&self.path)) else {
            return;
        };
        let mut writer = BufWriter::new(file);

        let mut outcomes: Vec<(&&str, &Outcome)> = self.outcomes.iter().collect();
        outcomes.sort_by(|a, b| b.1.ms.total_cmp(&a.1.ms).then_with(|| a.0.cmp(b.0)));
        for (rank, (name, outcome)) in outcomes.into_iter().enumerate() {
            let avg = outcome.ms / outcome.runs.max(1) as f64;
            let (slowest_ms, slowest_doc) = outcome.slowest.unwrap_or((0.0, None));
            let _ = writeln!(
                writer,
                "{{\"type\":\"perf.hot.span\",\"rank\":{},\"name\":\"{}\",\"ms\":{:.3},\"count\":{},\"avg_ms\":{:.3},\"slowest_ms\":{:.3},\"slowest_doc_id\":{}}}",
                rank + 1,
                json_escape(name),
                outcome.ms,
                outcome.runs,
                avg,
                slowest_ms,
                json_doc_id(slowest_doc)
            );
        }

        for (key, value) in &self.sizes {
            let _ = writeln!(
                writer,
                "{{\"type\":\"perf.hot.count\",\"name\":\"svg.{key}\",\"value\":{value}}}"
            );
        }
    }
}

fn hot_path_for(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("svgprim_perf");
    path.with_file_name(format!("{stem}_hot.log"))
}
