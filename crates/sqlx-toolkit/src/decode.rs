//! Row decoding from the `Any` driver into JSON values
//!
//! Byte columns are returned as text when they hold valid UTF-8 and as base64
//! otherwise.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use sqlx::any::AnyRow;
use sqlx::{Column, Row, ValueRef};

use crate::{Error, Result};

/// Decode rows into ordered column-name → value maps.
pub(crate) fn decode_rows(rows: Vec<AnyRow>) -> Result<Vec<IndexMap<String, JsonValue>>> {
   rows.iter().map(decode_row).collect()
}

pub(crate) fn decode_row(row: &AnyRow) -> Result<IndexMap<String, JsonValue>> {
   let mut value = IndexMap::with_capacity(row.columns().len());
   for (i, column) in row.columns().iter().enumerate() {
      value.insert(column.name().to_string(), to_json(row, i)?);
   }
   Ok(value)
}

/// Convert a single column to JSON.
///
/// The `Any` driver exposes a small fixed set of kinds, so each is tried in
/// turn; `try_get` checks type compatibility before decoding and a mismatch
/// is not an error here.
pub(crate) fn to_json(row: &AnyRow, index: usize) -> Result<JsonValue> {
   if row.try_get_raw(index)?.is_null() {
      return Ok(JsonValue::Null);
   }

   if let Ok(v) = row.try_get::<i64, _>(index) {
      return Ok(JsonValue::from(v));
   }
   if let Ok(v) = row.try_get::<i32, _>(index) {
      return Ok(JsonValue::from(v));
   }
   if let Ok(v) = row.try_get::<i16, _>(index) {
      return Ok(JsonValue::from(v));
   }
   if let Ok(v) = row.try_get::<f64, _>(index) {
      return Ok(float_to_json(v));
   }
   if let Ok(v) = row.try_get::<f32, _>(index) {
      return Ok(float_to_json(f64::from(v)));
   }
   if let Ok(v) = row.try_get::<bool, _>(index) {
      return Ok(JsonValue::Bool(v));
   }
   if let Ok(v) = row.try_get::<String, _>(index) {
      return Ok(JsonValue::String(v));
   }
   if let Ok(v) = row.try_get::<Vec<u8>, _>(index) {
      return Ok(bytes_to_json(v));
   }

   let name = row
      .columns()
      .get(index)
      .map(|c| c.name().to_string())
      .unwrap_or_else(|| index.to_string());

   Err(Error::UnsupportedDatatype(name))
}

// MySQL reports TEXT columns as BLOB, so bytes holding UTF-8 are text
fn bytes_to_json(bytes: Vec<u8>) -> JsonValue {
   match String::from_utf8(bytes) {
      Ok(text) => JsonValue::String(text),
      Err(e) => JsonValue::String(STANDARD.encode(e.into_bytes())),
   }
}

// NaN and infinities have no JSON representation
fn float_to_json(v: f64) -> JsonValue {
   serde_json::Number::from_f64(v)
      .map(JsonValue::Number)
      .unwrap_or(JsonValue::Null)
}
