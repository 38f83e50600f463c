use chrono::{Duration, NaiveDate};
use core::error::Error;
use lwcharts::prelude::*;
use minijinja::render;
use polars::lazy::prelude::*;
use polars::prelude::*;
use serde_json::json;
use std::io::IsTerminal;
use tracing::info;
use tracing_subscriber::prelude::*;

const OUTPUT_PATH: &str = "kline_dashboard.html";
const SMA_LEN: usize = 20;

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    setup_tracing();

    let klines = synth_klines(240)?;
    let klines = klines
        .lazy()
        .with_column(sma(&col("close"), SMA_LEN).alias("sma20"))
        .with_column(
            col("close")
                .gt(col("sma20"))
                .and(col("close").shift(lit(1)).lt_eq(col("sma20").shift(lit(1))))
                .alias("cross_up"),
        )
        .collect()?;
    info!(rows = klines.height(), "synthesized kline frame");

    let crossings = klines
        .clone()
        .lazy()
        .filter(col("cross_up"))
        .select([col("time")])
        .collect()?;
    info!(count = crossings.height(), "sma cross-over signals");

    let last_close = klines.column("close")?.f64()?.last().unwrap_or_default();

    let chart = Chart::with_data(klines).size(1280, 720).options(json!({
        "layout": {
            "background": { "color": "#222222" },
            "textColor": "#DDDDDD"
        },
        "grid": {
            "vertLines": { "color": "#444444" },
            "horzLines": { "color": "#444444" }
        }
    }));

    chart
        .add_histogram(
            None,
            json!({
                "priceFormat": { "type": "volume" },
                "priceScaleId": "",
                "color": "#26a69a66"
            }),
        )
        .encode(&[("time", "time"), ("value", "volume")])?;

    chart
        .add_line(None, json!({ "color": "#ff9800", "lineWidth": 2 }))
        .encode(&[("time", "time"), ("value", "sma20")])?;

    // Candlesticks last for the highest z-order
    let candles = chart
        .add_candlestick(None, json!({}))
        .encode(&[
            ("time", "time"),
            ("open", "open"),
            ("high", "high"),
            ("low", "low"),
            ("close", "close"),
        ])?
        .price_line(json!({
            "price": last_close,
            "color": "#2962ff",
            "lineStyle": 2,
            "title": "last close"
        }));

    candles
        .add_markers(
            Some(crossings),
            json!({
                "position": "belowBar",
                "color": "#26a69a",
                "shape": "arrowUp",
                "text": "cross"
            }),
        )
        .encode(&[("time", "time")])?;

    let fragment = chart.to_html()?;
    std::fs::write(OUTPUT_PATH, render_page("Synthetic klines", &fragment))?;
    info!(path = OUTPUT_PATH, "wrote dashboard page");

    Ok(())
}

/// Deterministic daily OHLCV walk, so the dashboard needs no market data
fn synth_klines(days: usize) -> Result<DataFrame, Box<dyn Error + Send + Sync>> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let mut time = Vec::with_capacity(days);
    let mut open = Vec::with_capacity(days);
    let mut high = Vec::with_capacity(days);
    let mut low = Vec::with_capacity(days);
    let mut close = Vec::with_capacity(days);
    let mut volume = Vec::with_capacity(days);
    let mut last = 100.0_f64;
    for i in 0..days {
        let date = start + Duration::days(i as i64);
        let t = i as f64;
        let next = 100.0 + t * 0.08 + (t / 9.0).sin() * 4.0 + (t / 23.0).cos() * 6.0;
        let spread = 0.6 + (t / 5.0).sin().abs();
        time.push(date.format("%Y-%m-%d").to_string());
        open.push(last);
        close.push(next);
        high.push(last.max(next) + spread);
        low.push(last.min(next) - spread);
        volume.push(1_000.0 + 500.0 * (t / 4.0).sin().abs());
        last = next;
    }
    let df = df!(
        "time" => time,
        "open" => open,
        "high" => high,
        "low" => low,
        "close" => close,
        "volume" => volume
    )?;
    let df = df
        .lazy()
        .with_column(col("time").str().to_date(StrptimeOptions {
            format: Some("%Y-%m-%d".into()),
            strict: true,
            exact: true,
            cache: false,
        }))
        .collect()?;
    Ok(df)
}

/// Simple moving average
fn sma(src: &Expr, len: usize) -> Expr {
    src.clone().rolling_mean(RollingOptionsFixedWindow {
        window_size: len,
        min_periods: 0,
        weights: None,
        center: false,
        fn_params: None,
    })
}

fn setup_tracing() {
    let subscriber = tracing_subscriber::Registry::default()
        .with(
            // stdout layer, to view everything in the console
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(std::io::stdin().is_terminal())
                .with_file(true)
                .with_line_number(true)
                .with_filter(tracing::level_filters::LevelFilter::INFO),
        )
        .with(
            tracing_subscriber::filter::targets::Targets::new()
                .with_target("kline_dashboard", tracing::level_filters::LevelFilter::DEBUG)
                .with_target("lwcharts", tracing::level_filters::LevelFilter::DEBUG),
        );
    tracing::subscriber::set_global_default(subscriber).unwrap();
}

fn render_page(title: &str, fragment: &str) -> String {
    render!(PAGE_TEMPLATE, title => title, fragment => fragment)
        .trim()
        .to_string()
}

const PAGE_TEMPLATE: &str = r#"
<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8" />
    <title>{{ title }}</title>
    <style>
        body {
            margin: 0;
            padding: 16px;
            background: #222222;
        }
    </style>
  </head>
  <body>
    {{ fragment }}
  </body>
</html>
"#;
