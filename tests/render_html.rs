use lwcharts::prelude::*;
use polars::lazy::prelude::*;
use polars::prelude::*;
use serde_json::json;

fn date_frame() -> DataFrame {
    df!(
        "time" => ["2020-01-01", "2020-01-02"],
        "value" => [1.0, 2.0]
    )
    .unwrap()
    .lazy()
    .with_column(col("time").str().to_date(StrptimeOptions {
        format: Some("%Y-%m-%d".into()),
        strict: true,
        exact: true,
        cache: false,
    }))
    .collect()
    .unwrap()
}

fn container_id(html: &str) -> &str {
    let start = html.find("<div id=\"").unwrap() + "<div id=\"".len();
    let len = html[start..].find('"').unwrap();
    &html[start..start + len]
}

#[test]
fn test_line_chart_end_to_end() {
    let chart = Chart::with_data(date_frame()).size(600, 400);
    chart.add_line(None, json!({}));
    let html = chart.to_html().unwrap();
    assert!(html.contains("lightweight-charts.standalone.production.js"));
    assert!(html.contains("\"width\": 600"));
    assert!(html.contains("\"height\": 400"));
    assert!(html.contains("addLineSeries"));
    assert!(html.contains("setData"));
    assert!(html.contains(r#""time":"2020-01-01""#));
    assert!(html.contains(r#""time":"2020-01-02""#));
    assert_eq!(html.matches(r#""time":""#).count(), 2);
}

#[test]
fn test_series_insertion_order_is_preserved() {
    let chart = Chart::with_data(date_frame());
    chart.add_line(None, json!({}));
    chart.add_bar(None, json!({}));
    chart.add_area(None, json!({}));
    let html = chart.to_html().unwrap();
    let line = html.find("addLineSeries").unwrap();
    let bar = html.find("addBarSeries").unwrap();
    let area = html.find("addAreaSeries").unwrap();
    assert!(line < bar && bar < area);
}

#[test]
fn test_price_lines_render_in_call_order() {
    let chart = Chart::with_data(date_frame());
    chart
        .add_line(None, json!({}))
        .price_line(json!({"price": 1.0, "title": "P1"}))
        .price_line(json!({"price": 2.0, "title": "P2"}))
        .price_line(json!({"price": 3.0, "title": "P3"}));
    let html = chart.to_html().unwrap();
    assert_eq!(html.matches("createPriceLine").count(), 3);
    let p1 = html.find(r#""title": "P1""#).unwrap();
    let p2 = html.find(r#""title": "P2""#).unwrap();
    let p3 = html.find(r#""title": "P3""#).unwrap();
    assert!(p1 < p2 && p2 < p3);
}

#[test]
fn test_same_output_div_renders_identically() {
    let chart = Chart::with_data(date_frame());
    chart.add_line(None, json!({}));
    let first = chart.render_html(DEFAULT_BASE_URL, "vis-fixed").unwrap();
    let second = chart.render_html(DEFAULT_BASE_URL, "vis-fixed").unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_fresh_renders_use_distinct_containers() {
    let chart = Chart::with_data(date_frame());
    chart.add_line(None, json!({}));
    let first = chart.to_html().unwrap();
    let second = chart.to_html().unwrap();
    let first_id = container_id(&first);
    let second_id = container_id(&second);
    assert!(first_id.starts_with("vis-"));
    assert!(second_id.starts_with("vis-"));
    assert_ne!(first_id, second_id);
}

#[test]
fn test_chart_options_may_override_dimensions() {
    let chart = Chart::with_data(date_frame())
        .size(600, 400)
        .options(json!({"width": 999}));
    let html = chart.to_html().unwrap();
    assert!(html.contains("\"width\": 999"));
    assert!(!html.contains("\"width\": 600"));
}

#[test]
fn test_base_url_override() {
    let chart = Chart::with_data(date_frame());
    chart.add_line(None, json!({}));
    let html = chart
        .render_html("https://cdn.example.com/lw/", "vis-fixed")
        .unwrap();
    assert!(html.contains(
        r#"src="https://cdn.example.com/lw/lightweight-charts.standalone.production.js""#
    ));
}

#[test]
fn test_series_render_delegates_to_chart() {
    let chart = Chart::with_data(date_frame());
    let series = chart.add_line(None, json!({}));
    assert_eq!(
        series.render_html(DEFAULT_BASE_URL, "vis-fixed").unwrap(),
        chart.render_html(DEFAULT_BASE_URL, "vis-fixed").unwrap()
    );
}

#[test]
fn test_markers_reach_the_rendered_script() {
    let chart = Chart::with_data(date_frame());
    let series = chart.add_candlestick(None, json!({})).encode(&[
        ("time", "time"),
        ("open", "value"),
        ("high", "value"),
        ("low", "value"),
        ("close", "value"),
    ])
    .unwrap();
    series
        .add_markers(None, json!({"position": "belowBar", "shape": "arrowUp"}))
        .encode(&[("time", "time")])
        .unwrap();
    let html = chart.to_html().unwrap();
    assert!(html.contains("addCandlestickSeries"));
    assert!(html.contains("setMarkers"));
    assert!(html.contains(r#""shape": "arrowUp""#));
}
