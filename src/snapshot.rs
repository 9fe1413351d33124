//! Headless rendering for the `snapshot` subcommand.

use crate::components::RefExamples;
use crate::config::Config;
use crate::core::ports::{DocumentMeta, RecordingMeta};
use crate::core::runtime::Runtime;
use crate::data::element::ElementKind;
use crate::data::page::layout_document;
use anyhow::{Context, Result};
use std::rc::Rc;

/// What to print
#[derive(Debug, Clone, Copy)]
pub struct SnapshotOptions {
    pub width: u16,
    pub json: bool,
    /// Clicks on the first Increase button before rendering
    pub clicks: u32,
}

/// Mount the page, apply the clicks, and return the output lines
/// (text layout or a JSON tree) followed by a `title:` line.
pub fn render_snapshot(config: &Config, options: SnapshotOptions) -> Result<Vec<String>> {
    let meta = Rc::new(RecordingMeta::new());
    let mut runtime = Runtime::new(config.metrics());
    runtime.mount(RefExamples::new(meta.clone(), config.measure_settings()))?;

    if options.clicks > 0 {
        let button = runtime
            .document()
            .find_by_kind(ElementKind::Button)
            .first()
            .copied()
            .context("No Increase button on the page")?;
        for _ in 0..options.clicks {
            runtime.click(button)?;
        }
    }

    let doc = runtime.document();
    let mut lines: Vec<String> = if options.json {
        let tree = doc.snapshot().context("Nothing mounted")?;
        serde_json::to_string_pretty(&tree)?
            .lines()
            .map(str::to_string)
            .collect()
    } else {
        layout_document(&doc, options.width)
            .plain_lines()
            .into_iter()
            .map(|line| line.trim_end().to_string())
            .collect()
    };
    lines.push(format!(
        "title: {}",
        meta.title().unwrap_or_else(|| "(unset)".to_string())
    ));
    Ok(lines)
}
