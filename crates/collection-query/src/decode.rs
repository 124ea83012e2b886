//! SQLite value to JSON conversion

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value as JsonValue;
use sqlx::sqlite::SqliteValueRef;
use sqlx::{Decode, Sqlite, TypeInfo, ValueRef};

use crate::Error;

/// Convert a raw SQLite value to JSON.
///
/// Integers and booleans become JSON integers, reals become JSON numbers
/// (non-finite values become `null`), text and date/time values become
/// strings and BLOBs become base64 strings.
pub(crate) fn to_json(value: SqliteValueRef<'_>) -> Result<JsonValue, Error> {
   if value.is_null() {
      return Ok(JsonValue::Null);
   }

   let type_name = value.type_info().name().to_string();
   let json = match type_name.as_str() {
      "INTEGER" | "BOOLEAN" => {
         let v = <i64 as Decode<Sqlite>>::decode(value).map_err(sqlx::Error::Decode)?;
         JsonValue::from(v)
      }
      "REAL" | "NUMERIC" => {
         let v = <f64 as Decode<Sqlite>>::decode(value).map_err(sqlx::Error::Decode)?;
         serde_json::Number::from_f64(v)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null)
      }
      "TEXT" | "DATE" | "TIME" | "DATETIME" => {
         let v = <String as Decode<Sqlite>>::decode(value).map_err(sqlx::Error::Decode)?;
         JsonValue::String(v)
      }
      "BLOB" => {
         let v = <Vec<u8> as Decode<Sqlite>>::decode(value).map_err(sqlx::Error::Decode)?;
         JsonValue::String(STANDARD.encode(v))
      }
      _ => return Err(Error::UnsupportedDatatype(type_name)),
   };

   Ok(json)
}
