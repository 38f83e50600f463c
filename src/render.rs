use minijinja::render;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

/// Public CDN serving the standalone lightweight-charts bundle.
pub const DEFAULT_BASE_URL: &str = "https://unpkg.com/lightweight-charts/dist/";

/// Template-ready projection of one series; payloads are pre-serialized JSON
/// text so the template only splices strings.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesSpec {
    pub series_type: &'static str,
    pub data: String,
    pub options: String,
    pub price_lines: Vec<String>,
    pub markers: String,
}

/// Template-ready projection of a whole chart.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub options: String,
    pub series: Vec<SeriesSpec>,
}

/// Fresh container id, unique per render so the same chart can be displayed
/// more than once on a page.
pub fn fresh_output_div() -> String {
    format!("vis-{}", Uuid::new_v4().simple())
}

/// Render the markup fragment bootstrapping the chart inside `output_div`:
/// one asset script tag, one container element, one inline script adding each
/// series with its data, markers and price lines in specification order.
pub fn render_chart_html(chart: &ChartSpec, base_url: &str, output_div: &str) -> String {
    debug!(output_div, series = chart.series.len(), "render chart fragment");
    render!(
        CHART_TEMPLATE,
        chart => chart,
        base_url => base_url,
        output_div => output_div,
    )
    .trim()
    .to_string()
}

const CHART_TEMPLATE: &str = r#"
<script src="{{ base_url }}lightweight-charts.standalone.production.js"></script>

<div id="{{ output_div }}"></div>
<script type="text/javascript">
  (() => {
  const outputDiv = document.getElementById("{{ output_div }}");
  const chart = LightweightCharts.createChart(outputDiv, {{ chart.options }});
  {% for series in chart.series %}
  (() => {
    const chart_series = chart.add{{ series.series_type }}Series(
      {{ series.options }}
    );
    chart_series.setData(
      {{ series.data }}
    );
    chart_series.setMarkers(
      {{ series.markers }}
    );
    {% for price_line in series.price_lines %}
    chart_series.createPriceLine({{ price_line }});
    {% endfor %}
  })();
  {% endfor %}
  })();
</script>
"#;
