use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use crate::report::table::SampleTable;

const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// A static chart over a [`SampleTable`], rendered as a self-contained HTML
/// document with the data rows embedded in the Vega-Lite spec.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    spec: Value,
}

impl Chart {
    /// Binned histogram of one table column (e.g. the NDVI distribution).
    pub fn histogram(table: &SampleTable, field: &str, title: &str) -> Chart {
        Chart {
            spec: json!({
                "$schema": VEGA_LITE_SCHEMA,
                "title": title,
                "data": { "values": table.rows() },
                "mark": "bar",
                "encoding": {
                    "x": { "field": field, "type": "quantitative", "bin": true },
                    "y": { "aggregate": "count", "type": "quantitative" }
                }
            }),
        }
    }

    /// Scatter plot of two table columns (e.g. red vs. NIR reflectance).
    pub fn scatter(table: &SampleTable, x: &str, y: &str, title: &str) -> Chart {
        Chart {
            spec: json!({
                "$schema": VEGA_LITE_SCHEMA,
                "title": title,
                "data": { "values": table.rows() },
                "mark": "point",
                "encoding": {
                    "x": { "field": x, "type": "quantitative" },
                    "y": { "field": y, "type": "quantitative" }
                }
            }),
        }
    }

    pub fn spec(&self) -> &Value {
        &self.spec
    }

    /// Write the chart to `path` as a standalone HTML document.
    pub fn save(&self, path: &Path) -> Result<()> {
        let document = self.to_html()?;
        fs::write(path, document)
            .with_context(|| format!("writing chart to {}", path.display()))?;
        log::info!("wrote chart {}", path.display());
        Ok(())
    }

    fn to_html(&self) -> Result<String> {
        let spec = serde_json::to_string(&self.spec).context("serializing chart spec")?;
        Ok(format!(
            r##"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8" />
  <script src="https://cdn.jsdelivr.net/npm/vega@5"></script>
  <script src="https://cdn.jsdelivr.net/npm/vega-lite@5"></script>
  <script src="https://cdn.jsdelivr.net/npm/vega-embed@6"></script>
</head>
<body>
  <div id="vis"></div>
  <script type="text/javascript">
    vegaEmbed("#vis", {spec}).catch(console.error);
  </script>
</body>
</html>
"##,
            spec = spec
        ))
    }
}
