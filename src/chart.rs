use polars::prelude::DataFrame;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::df_utils::{df_to_records, encode_columns};
use crate::error::ChartError;
use crate::render::{self, ChartSpec, SeriesSpec};

/// The five series kinds lightweight-charts can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Line,
    Area,
    Bar,
    Candlestick,
    Histogram,
}

impl SeriesKind {
    /// Infix of the `add*Series` constructor on the JS chart object.
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKind::Line => "Line",
            SeriesKind::Area => "Area",
            SeriesKind::Bar => "Bar",
            SeriesKind::Candlestick => "Candlestick",
            SeriesKind::Histogram => "Histogram",
        }
    }
}

/// Keep only the object content of an options value; arbitrary keys are
/// forwarded verbatim to the charting runtime, no schema validation.
fn option_object(options: Value) -> Map<String, Value> {
    match options {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

struct ChartInner {
    data: Option<DataFrame>,
    width: u32,
    height: u32,
    options: Map<String, Value>,
    series: Vec<Series>,
}

/// Builder handle for one chart. Clones share the same underlying chart, so a
/// handle can be kept around while series are still being attached.
#[derive(Clone)]
pub struct Chart {
    inner: Rc<RefCell<ChartInner>>,
}

impl Default for Chart {
    fn default() -> Self {
        Self::new()
    }
}

impl Chart {
    pub fn new() -> Self {
        Chart {
            inner: Rc::new(RefCell::new(ChartInner {
                data: None,
                width: 400,
                height: 300,
                options: Map::new(),
                series: Vec::new(),
            })),
        }
    }

    /// Chart with a default dataset, shared by series added without their own.
    pub fn with_data(data: DataFrame) -> Self {
        let chart = Chart::new();
        chart.inner.borrow_mut().data = Some(data);
        chart
    }

    pub fn size(&self, width: u32, height: u32) -> Self {
        {
            let mut inner = self.inner.borrow_mut();
            inner.width = width;
            inner.height = height;
        }
        self.clone()
    }

    pub fn data(&self, data: DataFrame) -> Self {
        self.inner.borrow_mut().data = Some(data);
        self.clone()
    }

    /// Merge chart-level style options, forwarded verbatim into the runtime's
    /// `createChart` call.
    pub fn options(&self, options: Value) -> Self {
        self.inner.borrow_mut().options.extend(option_object(options));
        self.clone()
    }

    /// Append a pre-built series and hand it back for further chaining.
    pub fn add(&self, series: Series) -> Series {
        self.inner.borrow_mut().series.push(series.clone());
        series
    }

    fn add_series(&self, kind: SeriesKind, data: Option<DataFrame>, options: Value) -> Series {
        let data = data.or_else(|| self.inner.borrow().data.clone());
        self.add(Series::new(self, kind, data, options))
    }

    /// Add a line series.
    pub fn add_line(&self, data: Option<DataFrame>, options: Value) -> Series {
        self.add_series(SeriesKind::Line, data, options)
    }

    /// Add an area series.
    pub fn add_area(&self, data: Option<DataFrame>, options: Value) -> Series {
        self.add_series(SeriesKind::Area, data, options)
    }

    /// Add a bar series.
    pub fn add_bar(&self, data: Option<DataFrame>, options: Value) -> Series {
        self.add_series(SeriesKind::Bar, data, options)
    }

    /// Add a candlestick series.
    pub fn add_candlestick(&self, data: Option<DataFrame>, options: Value) -> Series {
        self.add_series(SeriesKind::Candlestick, data, options)
    }

    /// Add a histogram series.
    pub fn add_histogram(&self, data: Option<DataFrame>, options: Value) -> Series {
        self.add_series(SeriesKind::Histogram, data, options)
    }

    /// Template-ready projection of the current builder state.
    pub fn spec(&self) -> Result<ChartSpec, ChartError> {
        let inner = self.inner.borrow();
        let mut options = Map::new();
        options.insert("width".to_string(), inner.width.into());
        options.insert("height".to_string(), inner.height.into());
        // Style options merge last and may override the dimensions
        for (key, value) in &inner.options {
            options.insert(key.clone(), value.clone());
        }
        let series = inner
            .series
            .iter()
            .map(|series| series.spec())
            .collect::<Result<Vec<_>, ChartError>>()?;
        Ok(ChartSpec {
            options: serde_json::to_string_pretty(&Value::Object(options))?,
            series,
        })
    }

    /// Render into a fragment with a fresh `vis-` container id.
    pub fn to_html(&self) -> Result<String, ChartError> {
        self.render_html(render::DEFAULT_BASE_URL, &render::fresh_output_div())
    }

    pub fn render_html(&self, base_url: &str, output_div: &str) -> Result<String, ChartError> {
        Ok(render::render_chart_html(&self.spec()?, base_url, output_div))
    }

    /// Rich display hook for the evcxr Jupyter kernel.
    pub fn evcxr_display(&self) {
        match self.to_html() {
            Ok(html) => println!("EVCXR_BEGIN_CONTENT text/html\n{html}\nEVCXR_END_CONTENT"),
            Err(err) => eprintln!("chart render failed: {err}"),
        }
    }
}

struct SeriesInner {
    kind: SeriesKind,
    data: DataFrame,
    options: Map<String, Value>,
    price_lines: Vec<Map<String, Value>>,
    annotations: Vec<Map<String, Value>>,
    markers: Vec<Markers>,
}

/// One data trace on a chart. The kind is fixed at creation; everything else
/// accumulates through the fluent mutators until the chart is rendered.
#[derive(Clone)]
pub struct Series {
    inner: Rc<RefCell<SeriesInner>>,
    chart: Weak<RefCell<ChartInner>>,
}

impl Series {
    /// Series bound to `chart`; pass it to [`Chart::add`] or use the per-kind
    /// helpers on [`Chart`]. Without a dataset the series serializes as `[]`.
    pub fn new(chart: &Chart, kind: SeriesKind, data: Option<DataFrame>, options: Value) -> Self {
        Series {
            inner: Rc::new(RefCell::new(SeriesInner {
                kind,
                data: data.unwrap_or_default(),
                options: option_object(options),
                price_lines: Vec::new(),
                annotations: Vec::new(),
                markers: Vec::new(),
            })),
            chart: Rc::downgrade(&chart.inner),
        }
    }

    pub fn kind(&self) -> SeriesKind {
        self.inner.borrow().kind
    }

    /// Select and rename the columns fed to the series, keeping row order.
    pub fn encode(&self, fields: &[(&str, &str)]) -> Result<Series, ChartError> {
        let projected = {
            let inner = self.inner.borrow();
            encode_columns(&inner.data, fields)?
        };
        self.inner.borrow_mut().data = projected;
        Ok(self.clone())
    }

    /// Append a horizontal price line; lines render in call order.
    pub fn price_line(&self, options: Value) -> Series {
        self.inner
            .borrow_mut()
            .price_lines
            .push(option_object(options));
        self.clone()
    }

    /// Append a single marker pinned to one data point.
    pub fn annotation(&self, options: Value) -> Series {
        self.inner
            .borrow_mut()
            .annotations
            .push(option_object(options));
        self.clone()
    }

    /// Attach a marker group over `data` (the series' own dataset if `None`)
    /// and return the group, so its columns can still be re-encoded.
    pub fn add_markers(&self, data: Option<DataFrame>, options: Value) -> Markers {
        let data = data.unwrap_or_else(|| self.inner.borrow().data.clone());
        let markers = Markers {
            inner: Rc::new(RefCell::new(MarkersInner {
                data,
                options: option_object(options),
            })),
            chart: self.chart.clone(),
        };
        self.inner.borrow_mut().markers.push(markers.clone());
        markers
    }

    /// Template-ready projection of the series state.
    pub fn spec(&self) -> Result<SeriesSpec, ChartError> {
        let inner = self.inner.borrow();
        let data = serde_json::to_string(&df_to_records(&inner.data)?)?;
        let options = serde_json::to_string_pretty(&Value::Object(inner.options.clone()))?;
        let price_lines = inner
            .price_lines
            .iter()
            .map(|line| serde_json::to_string_pretty(&Value::Object(line.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        // Single annotations first, then marker groups in attachment order
        let mut markers: Vec<Value> = inner
            .annotations
            .iter()
            .cloned()
            .map(Value::Object)
            .collect();
        for group in &inner.markers {
            markers.extend(group.records()?);
        }
        Ok(SeriesSpec {
            series_type: inner.kind.as_str(),
            data,
            options,
            price_lines,
            markers: serde_json::to_string_pretty(&Value::Array(markers))?,
        })
    }

    fn chart(&self) -> Result<Chart, ChartError> {
        self.chart
            .upgrade()
            .map(|inner| Chart { inner })
            .ok_or(ChartError::ChartReleased)
    }

    /// Render the whole owning chart.
    pub fn to_html(&self) -> Result<String, ChartError> {
        self.chart()?.to_html()
    }

    pub fn render_html(&self, base_url: &str, output_div: &str) -> Result<String, ChartError> {
        self.chart()?.render_html(base_url, output_div)
    }

    /// Rich display hook for the evcxr Jupyter kernel; shows the owning chart.
    pub fn evcxr_display(&self) {
        match self.chart() {
            Ok(chart) => chart.evcxr_display(),
            Err(err) => eprintln!("chart render failed: {err}"),
        }
    }
}

struct MarkersInner {
    data: DataFrame,
    options: Map<String, Value>,
}

/// A group of per-point markers built from a frame plus static options merged
/// into every row.
#[derive(Clone)]
pub struct Markers {
    inner: Rc<RefCell<MarkersInner>>,
    chart: Weak<RefCell<ChartInner>>,
}

impl Markers {
    /// Select and rename the columns fed to the markers, keeping row order.
    pub fn encode(&self, fields: &[(&str, &str)]) -> Result<Markers, ChartError> {
        let projected = {
            let inner = self.inner.borrow();
            encode_columns(&inner.data, fields)?
        };
        self.inner.borrow_mut().data = projected;
        Ok(self.clone())
    }

    /// One record per row: static options merged first, row fields second, so
    /// row fields win on key collision. Recomputed on every call.
    pub fn records(&self) -> Result<Vec<Value>, ChartError> {
        let inner = self.inner.borrow();
        let rows = df_to_records(&inner.data)?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let mut merged = inner.options.clone();
                merged.extend(row);
                Value::Object(merged)
            })
            .collect())
    }

    fn chart(&self) -> Result<Chart, ChartError> {
        self.chart
            .upgrade()
            .map(|inner| Chart { inner })
            .ok_or(ChartError::ChartReleased)
    }

    /// Render the whole owning chart.
    pub fn to_html(&self) -> Result<String, ChartError> {
        self.chart()?.to_html()
    }

    /// Rich display hook for the evcxr Jupyter kernel; shows the owning chart.
    pub fn evcxr_display(&self) {
        match self.chart() {
            Ok(chart) => chart.evcxr_display(),
            Err(err) => eprintln!("chart render failed: {err}"),
        }
    }
}
