/// JSON <-> Postgres value conversion
///
/// Bind parameters arrive as JSON and are coerced to whatever type the server
/// inferred for each placeholder, the same way a literal would be coerced.
/// Rows are decoded column by column into JSON honoring `TypeOptions`.

use crate::{error::NodeError, node::types::Record, transport::configure::TypeOptions};
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde_json::{json, Number, Value};
use std::{error::Error, net::IpAddr};
use tokio_postgres::{
    types::{to_sql_checked, Date, FromSql, IsNull, Kind, Timestamp, ToSql, Type},
    Row,
};

type BoxError = Box<dyn Error + Sync + Send>;

/// JSON value bound as a statement parameter
#[derive(Debug)]
pub struct JsonParam<'a>(pub &'a Value);

impl ToSql for JsonParam<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        let value = self.0;
        if value.is_null() {
            return Ok(IsNull::Yes);
        }

        match *ty {
            Type::BOOL => as_bool(value)?.to_sql(ty, out),
            Type::INT2 => i16::try_from(as_i64(value)?)?.to_sql(ty, out),
            Type::INT4 => i32::try_from(as_i64(value)?)?.to_sql(ty, out),
            Type::INT8 => as_i64(value)?.to_sql(ty, out),
            Type::FLOAT4 => (as_f64(value)? as f32).to_sql(ty, out),
            Type::FLOAT8 => as_f64(value)?.to_sql(ty, out),
            Type::JSON | Type::JSONB => value.to_sql(ty, out),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
                as_text(value).as_str().to_sql(ty, out)
            }
            _ if matches!(ty.kind(), Kind::Enum(_)) => {
                // Enum labels travel as their text bytes
                out.extend_from_slice(as_text(value).as_bytes());
                Ok(IsNull::No)
            }
            _ => Err(format!("cannot bind {} to a parameter of type {}", value, ty).into()),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn as_bool(value: &Value) -> Result<bool, BoxError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match s.trim() {
            "true" | "t" | "1" => Ok(true),
            "false" | "f" | "0" => Ok(false),
            other => Err(format!("invalid input syntax for type boolean: \"{}\"", other).into()),
        },
        other => Err(format!("invalid input syntax for type boolean: {}", other).into()),
    }
}

fn as_i64(value: &Value) -> Result<i64, BoxError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| format!("invalid input syntax for type integer: {}", n).into()),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("invalid input syntax for type integer: \"{}\"", s).into()),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(format!("invalid input syntax for type integer: {}", other).into()),
    }
}

fn as_f64(value: &Value) -> Result<f64, BoxError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("invalid input syntax for type double precision: {}", n).into()),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid input syntax for type double precision: \"{}\"", s).into()),
        other => Err(format!("invalid input syntax for type double precision: {}", other).into()),
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Raw bytes of one column, captured before any type-specific decoding
struct RawColumn<'a>(Option<&'a [u8]>);

impl<'a> FromSql<'a> for RawColumn<'a> {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        Ok(Self(Some(raw)))
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(Self(None))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

/// Decode a row into a JSON object
pub fn row_to_record(row: &Row, types: TypeOptions) -> Result<Record, NodeError> {
    let mut record = Record::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let ty = column.type_();
        let value = row
            .try_get::<_, RawColumn<'_>>(idx)
            .map_err(BoxError::from)
            .and_then(|raw| decode_value(ty, raw.0, types))
            .map_err(|e| {
                NodeError::Database(format!(
                    "Failed to decode column '{}' ({}): {}",
                    column.name(),
                    ty,
                    e
                ))
            })?;
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

/// Decode one binary column value into JSON
///
/// Domains decode as their base type, arrays element by element. Types with
/// no JSON rendering are an error, never a silent null.
pub fn decode_value(ty: &Type, raw: Option<&[u8]>, types: TypeOptions) -> Result<Value, BoxError> {
    let Some(raw) = raw else {
        return Ok(Value::Null);
    };

    match ty.kind() {
        Kind::Domain(base) => return decode_value(base, Some(raw), types),
        Kind::Enum(_) => return Ok(Value::String(std::str::from_utf8(raw)?.to_string())),
        Kind::Array(member) => {
            let elements = Vec::<RawColumn<'_>>::from_sql(ty, raw)?;
            return elements
                .into_iter()
                .map(|element| decode_value(member, element.0, types))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array);
        }
        _ => {}
    }

    let value = match *ty {
        Type::BOOL => Value::Bool(bool::from_sql(ty, raw)?),
        Type::CHAR => Value::String(char::from(i8::from_sql(ty, raw)? as u8).to_string()),
        Type::INT2 => json!(i16::from_sql(ty, raw)?),
        Type::INT4 => json!(i32::from_sql(ty, raw)?),
        Type::OID => json!(u32::from_sql(ty, raw)?),
        Type::INT8 => large_integer(i64::from_sql(ty, raw)?, types),
        Type::FLOAT4 => json!(f32::from_sql(ty, raw)?),
        Type::FLOAT8 => json!(f64::from_sql(ty, raw)?),
        Type::NUMERIC => numeric(Decimal::from_sql(ty, raw)?, types),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            Value::String(<&str>::from_sql(ty, raw)?.to_string())
        }
        Type::JSON | Type::JSONB => Value::from_sql(ty, raw)?,
        Type::UUID => Value::String(uuid::Uuid::from_sql(ty, raw)?.to_string()),
        Type::INET => Value::String(IpAddr::from_sql(ty, raw)?.to_string()),
        Type::BYTEA => Value::String(hex_bytea(<&[u8]>::from_sql(ty, raw)?)),
        Type::TIME => Value::String(NaiveTime::from_sql(ty, raw)?.to_string()),
        Type::DATE => match Date::<NaiveDate>::from_sql(ty, raw)? {
            Date::Value(date) => Value::String(date.to_string()),
            Date::PosInfinity => Value::String("infinity".into()),
            Date::NegInfinity => Value::String("-infinity".into()),
        },
        Type::TIMESTAMP => timestamp(match Timestamp::<NaiveDateTime>::from_sql(ty, raw)? {
            Timestamp::Value(ts) => Timestamp::Value(ts.and_utc()),
            Timestamp::PosInfinity => Timestamp::PosInfinity,
            Timestamp::NegInfinity => Timestamp::NegInfinity,
        }),
        Type::TIMESTAMPTZ => timestamp(Timestamp::<DateTime<Utc>>::from_sql(ty, raw)?),
        _ => return Err(format!("unsupported column type {}", ty).into()),
    };
    Ok(value)
}

fn large_integer(value: i64, types: TypeOptions) -> Value {
    if types.large_numbers_as_numbers {
        json!(value)
    } else {
        Value::String(value.to_string())
    }
}

fn numeric(value: Decimal, types: TypeOptions) -> Value {
    if types.large_numbers_as_numbers {
        if let Some(n) = value.to_f64().and_then(Number::from_f64) {
            return Value::Number(n);
        }
    }
    Value::String(value.to_string())
}

/// Timestamps render the way a JSON-serialized JS `Date` does
fn timestamp(value: Timestamp<DateTime<Utc>>) -> Value {
    let text = match value {
        Timestamp::Value(ts) => ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        Timestamp::PosInfinity => "infinity".to_string(),
        Timestamp::NegInfinity => "-infinity".to_string(),
    };
    Value::String(text)
}

fn hex_bytea(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(2 + bytes.len() * 2);
    text.push_str("\\x");
    for byte in bytes {
        text.push_str(&format!("{:02x}", byte));
    }
    text
}
