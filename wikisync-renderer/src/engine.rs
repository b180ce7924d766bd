//! Tera engine for the aggregate version summary page.

use std::collections::HashMap;

use tera::{Tera, Value};

use wikisync_core::markup;
use wikisync_core::types::VersionSet;

use crate::context::{KnownVersionTags, SummaryContext};
use crate::error::RenderError;

const SUMMARY_TEMPLATE: &str = "summary.wiki";
const SUMMARY_SOURCE: &str = include_str!("templates/summary.wiki.tera");

/// Tera filter escaping `|` and `=` so interpolated text cannot break table
/// or template-argument markup.
fn wiki_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = match value {
        Value::String(s) => markup::escape(s),
        Value::Null => String::new(),
        other => markup::escape(&other.to_string()),
    };
    Ok(Value::String(text))
}

fn build_tera() -> Result<Tera, RenderError> {
    let mut tera = Tera::default();
    tera.register_filter("wiki", wiki_filter);
    tera.add_raw_template(SUMMARY_TEMPLATE, SUMMARY_SOURCE)?;
    Ok(tera)
}

/// Renders the summary table. Create once and reuse across passes.
pub struct SummaryRenderer {
    tera: Tera,
}

impl SummaryRenderer {
    pub fn new() -> Result<Self, RenderError> {
        Ok(SummaryRenderer { tera: build_tera()? })
    }

    pub fn render(&self, ctx: &SummaryContext) -> Result<String, RenderError> {
        let tera_ctx = ctx.to_tera_context()?;
        let content = self.tera.render(SUMMARY_TEMPLATE, &tera_ctx)?;
        tracing::debug!(rows = ctx.rows.len(), bytes = content.len(), "rendered version summary");
        Ok(content)
    }
}

/// Build the context and render it with a fresh engine.
pub fn render_summary(known_tags: &KnownVersionTags, sets: &VersionSet) -> Result<String, RenderError> {
    SummaryRenderer::new()?.render(&SummaryContext::build(known_tags, sets))
}
