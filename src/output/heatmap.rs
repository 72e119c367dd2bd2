// Interactive heatmap documents.
//
// A Heatmap is the similarity matrix serialized as a JSON payload plus the
// bundled JavaScript runtime. It renders two ways: one standalone HTML
// document with everything inlined, or a <script> + <div> pair for
// dropping into an existing page.

use anyhow::{Context, Result};
use ndarray::Array2;
use serde::Serialize;

use super::palette::{hex, inferno_256, ColorScale};

/// The heatmap runtime, compiled into the binary.
const RUNTIME_JS: &str = include_str!("heatmap.js");

/// Page-level rules, only for the standalone document.
const PAGE_STYLE: &str = "\
body { margin: 0; font-family: sans-serif; background: #ffffff; }
";

/// Rules the widget needs wherever it is embedded.
const WIDGET_STYLE: &str = "\
.numsim-heatmap { width: 100%; }
.numsim-title { font-size: 15px; font-weight: bold; padding: 8px 4px; }
.numsim-tooltip { background: #eceff1; border: 1px solid #000000; opacity: 0.9; \
padding: 3px 6px; font-size: 12px; white-space: nowrap; }
";

/// Payload consumed by `NumsimHeatmap.render`.
#[derive(Debug, Serialize)]
struct HeatmapData<'a> {
    title: &'a str,
    size: usize,
    x: f64,
    y: f64,
    dw: f64,
    dh: f64,
    low: f64,
    high: f64,
    palette: Vec<String>,
    /// Row-major; NaN has no JSON form and travels as null.
    values: Vec<Option<f64>>,
}

/// A serialized interactive heatmap, ready to be wrapped as HTML.
#[derive(Debug, Clone)]
pub struct Heatmap {
    /// DOM id of the target element.
    pub element_id: String,
    pub title: String,
    payload: String,
}

impl Heatmap {
    /// Build the heatmap for the similarity matrix of `0..=max_number`.
    pub fn new(matrix: &Array2<f64>, max_number: usize, model_name: &str) -> Result<Self> {
        let title = format!("{model_name} Similarities of Numbers 0 - {max_number}");
        let scale = ColorScale::for_matrix(matrix);
        let size = matrix.nrows();
        // Half-cell offset puts cell centres on integer coordinates.
        let extent = (max_number + 1) as f64;

        let data = HeatmapData {
            title: &title,
            size,
            x: -0.5,
            y: -0.5,
            dw: extent,
            dh: extent,
            low: scale.low,
            high: scale.high,
            palette: inferno_256().into_iter().map(hex).collect(),
            values: matrix
                .iter()
                .map(|&v| if v.is_finite() { Some(v) } else { None })
                .collect(),
        };

        let payload = serde_json::to_string(&data).context("Failed to serialize heatmap data")?;

        Ok(Self {
            element_id: format!("similarities-{max_number}"),
            title,
            payload: escape_script(&payload),
        })
    }

    /// JavaScript that renders into `element_id` once the DOM is ready.
    fn bootstrap_js(&self) -> String {
        format!(
            "(function () {{\n  var data = {payload};\n  function run() {{\n    \
             window.NumsimHeatmap.render(document.getElementById(\"{id}\"), data);\n  }}\n  \
             if (document.readyState === \"loading\") {{\n    \
             document.addEventListener(\"DOMContentLoaded\", run);\n  }} else {{\n    run();\n  }}\n}})();",
            payload = self.payload,
            id = self.element_id,
        )
    }

    /// Target element markup.
    pub fn div(&self) -> String {
        format!(
            "<div id=\"{}\" class=\"numsim-heatmap\"></div>",
            escape_html(&self.element_id)
        )
    }

    /// A single <script> element carrying runtime and data.
    pub fn script(&self) -> String {
        format!(
            "<script type=\"text/javascript\">\n{}\n{}\n</script>",
            escape_script(RUNTIME_JS),
            self.bootstrap_js()
        )
    }

    /// The target element preceded by the widget's own style rules.
    pub fn div_fragment(&self) -> String {
        format!("<style>\n{WIDGET_STYLE}</style>\n{}", self.div())
    }

    /// Embeddable pair: (script, styled div fragment).
    pub fn components(&self) -> (String, String) {
        (self.script(), self.div_fragment())
    }

    /// A self-contained HTML document needing no external resources.
    pub fn standalone_html(&self) -> String {
        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{title}</title>\n<style>\n{page}{widget}</style>\n</head>\n<body>\n{div}\n{script}\n\
             </body>\n</html>\n",
            title = escape_html(&self.title),
            page = PAGE_STYLE,
            widget = WIDGET_STYLE,
            div = self.div(),
            script = self.script(),
        )
    }
}

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Keep inline script text from closing its own <script> element.
fn escape_script(js: &str) -> String {
    js.replace("</", "<\\/")
}
