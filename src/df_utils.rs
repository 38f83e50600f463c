use polars::lazy::prelude::*;
use polars::prelude::*;
use serde_json::{Map, Value};
use std::io::Cursor;

use crate::error::ChartError;

/// Select and rename frame columns by an ordered {output name -> source column}
/// mapping. Row order and count are untouched; the input frame is not mutated.
pub fn encode_columns(df: &DataFrame, fields: &[(&str, &str)]) -> Result<DataFrame, ChartError> {
    let mut columns = Vec::with_capacity(fields.len());
    for (output, source) in fields {
        let mut column = df
            .column(source)
            .map_err(|_| ChartError::MissingColumn((*source).to_string()))?
            .clone();
        column.rename((*output).into());
        columns.push(column);
    }
    Ok(DataFrame::new(columns)?)
}

/// Serialize a frame to an ordered sequence of JSON row records, with
/// Date/Datetime columns converted to ISO-8601 strings first.
pub fn df_to_records(df: &DataFrame) -> Result<Vec<Map<String, Value>>, ChartError> {
    if df.width() == 0 {
        return Ok(Vec::new());
    }
    let mut iso_exprs = Vec::new();
    for column in df.get_columns() {
        let name = column.name().as_str();
        match column.dtype() {
            DataType::Date => iso_exprs.push(col(name).dt().to_string("%Y-%m-%d")),
            DataType::Datetime(_, None) => {
                iso_exprs.push(col(name).dt().to_string("%Y-%m-%dT%H:%M:%S%.3f"))
            }
            DataType::Datetime(_, Some(_)) => {
                iso_exprs.push(col(name).dt().to_string("%Y-%m-%dT%H:%M:%S%.3f%:z"))
            }
            _ => {}
        }
    }
    let mut df = if iso_exprs.is_empty() {
        df.clone()
    } else {
        df.clone().lazy().with_columns(iso_exprs).collect()?
    };
    let mut buffer = Cursor::new(Vec::new());
    JsonWriter::new(&mut buffer)
        .with_json_format(JsonFormat::Json)
        .finish(&mut df)?;
    Ok(serde_json::from_slice(&buffer.into_inner())?)
}
