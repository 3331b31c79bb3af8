use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::Diagnostic;

// JSONL sink for translation diagnostics. Clones share one file; each
// translation's lines are written together.
#[derive(Clone)]
pub(crate) struct DebugLogger {
    inner: Arc<Mutex<BufWriter<File>>>,
}

impl DebugLogger {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(BufWriter::new(file))),
        })
    }

    // One line per diagnostic, then a summary of this translation's counters.
    pub fn log_translation(&self, doc_id: Option<usize>, diagnostics: &[Diagnostic], commands: usize) {
        let doc = json_doc_id(doc_id);
        let mut counters: BTreeMap<&'static str, u64> = BTreeMap::new();
        counters.insert("commands", commands as u64);

        let mut lines = Vec::with_capacity(diagnostics.len() + 1);
        for diagnostic in diagnostics {
            let entry = counters.entry(diagnostic.kind()).or_insert(0);
            *entry = entry.saturating_add(1);
            lines.push(format!(
                "{{\"type\":\"svg.diagnostic\",\"doc_id\":{doc},\"kind\":\"{}\",\"severity\":\"{}\",\"message\":\"{}\"}}",
                diagnostic.kind(),
                diagnostic.severity().as_str(),
                json_escape(&diagnostic.to_string())
            ));
        }
        let counts = counters
            .iter()
            .map(|(key, value)| format!("\"{}\":{}", json_escape(key), value))
            .collect::<Vec<_>>()
            .join(",");
        lines.push(format!(
            "{{\"type\":\"svg.summary\",\"doc_id\":{doc},\"counts\":{{{counts}}}}}"
        ));

        if let Ok(mut writer) = self.inner.lock() {
            for line in &lines {
                let _ = writeln!(writer, "{line}");
            }
            let _ = writer.flush();
        }
    }
}

pub(crate) fn json_doc_id(doc_id: Option<usize>) -> String {
    doc_id.map_or_else(|| "null".to_string(), |v| v.to_string())
}

pub(crate) fn json_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            _ => out.push(ch),
        }
    }
    out
}
