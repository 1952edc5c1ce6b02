use ::toml::value::{Date, Datetime, Offset, Time};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike};

use super::{Error, Format};
use crate::value::{Key, Mapping, Value};

pub fn decode(bytes: &[u8]) -> Result<Value, Error> {
    let text = std::str::from_utf8(bytes)?;
    let table: ::toml::Table = ::toml::from_str(text)?;
    Ok(from_table(table))
}

/// The root must be a mapping. Null entries in mappings are left out; a null
/// inside a sequence has no TOML spelling and is an error. So are two keys
/// with the same text, such as YAML's `1` and `"1"`.
pub fn encode(value: &Value) -> Result<String, Error> {
    let Value::Mapping(map) = value else {
        return Err(Error::Unrepresentable {
            format: Format::Toml,
            what: "a document root that is not a mapping",
        });
    };
    let table = to_table(map)?;
    Ok(::toml::to_string(&table)?)
}

fn from_table(table: ::toml::Table) -> Value {
    Value::Mapping(
        table
            .into_iter()
            .map(|(k, v)| (Key::Str(k), from_toml(v)))
            .collect(),
    )
}

fn from_toml(v: ::toml::Value) -> Value {
    match v {
        ::toml::Value::String(s) => Value::String(s),
        ::toml::Value::Integer(i) => Value::Int(i),
        ::toml::Value::Float(f) => Value::Float(f),
        ::toml::Value::Boolean(b) => Value::Bool(b),
        ::toml::Value::Datetime(dt) => from_datetime(dt),
        ::toml::Value::Array(items) => Value::Sequence(items.into_iter().map(from_toml).collect()),
        ::toml::Value::Table(table) => from_table(table),
    }
}

// Local date-times are taken as UTC. A lone date or time has no instant and
// stays text.
fn from_datetime(dt: Datetime) -> Value {
    let (Some(date), Some(time)) = (dt.date, dt.time) else {
        return Value::String(dt.to_string());
    };
    let offset_secs = match dt.offset {
        Some(Offset::Custom { minutes }) => i32::from(minutes) * 60,
        Some(Offset::Z) | None => 0,
    };
    let naive = NaiveDate::from_ymd_opt(i32::from(date.year), u32::from(date.month), u32::from(date.day))
        .and_then(|d| {
            d.and_hms_nano_opt(
                u32::from(time.hour),
                u32::from(time.minute),
                u32::from(time.second),
                time.nanosecond,
            )
        });
    naive
        .zip(FixedOffset::east_opt(offset_secs))
        .and_then(|(naive, offset)| naive.and_local_timezone(offset).single())
        .map(Value::Timestamp)
        .unwrap_or_else(|| Value::String(dt.to_string()))
}

fn to_table(map: &Mapping) -> Result<::toml::Table, Error> {
    let mut table = ::toml::Table::new();
    for (k, v) in map {
        if v.is_null() {
            continue;
        }
        if table.insert(k.to_string(), to_toml(v)?).is_some() {
            return Err(Error::Unrepresentable {
                format: Format::Toml,
                what: "mapping keys that collide as text",
            });
        }
    }
    Ok(table)
}

fn to_toml(v: &Value) -> Result<::toml::Value, Error> {
    Ok(match v {
        Value::Null => {
            return Err(Error::Unrepresentable {
                format: Format::Toml,
                what: "null inside a sequence",
            });
        }
        Value::Bool(b) => ::toml::Value::Boolean(*b),
        Value::Int(i) => ::toml::Value::Integer(*i),
        Value::Float(f) => ::toml::Value::Float(*f),
        Value::String(s) => ::toml::Value::String(s.clone()),
        Value::Timestamp(t) => ::toml::Value::Datetime(to_datetime(t)),
        Value::Sequence(items) => {
            ::toml::Value::Array(items.iter().map(to_toml).collect::<Result<_, _>>()?)
        }
        Value::Mapping(map) => ::toml::Value::Table(to_table(map)?),
    })
}

fn to_datetime(t: &DateTime<FixedOffset>) -> Datetime {
    let offset_minutes = t.offset().local_minus_utc() / 60;
    let offset = if offset_minutes == 0 {
        Offset::Z
    } else {
        Offset::Custom {
            minutes: offset_minutes as i16,
        }
    };
    Datetime {
        date: Some(Date {
            year: t.year() as u16,
            month: t.month() as u8,
            day: t.day() as u8,
        }),
        time: Some(Time {
            hour: t.hour() as u8,
            minute: t.minute() as u8,
            second: t.second() as u8,
            nanosecond: t.nanosecond(),
        }),
        offset: Some(offset),
    }
}
