// Built-in decode/encode collaborators. The container never calls into this
// module; it only needs "bytes -> Value" and reads back a `&Value`.
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::container::Container;
use crate::value::Value;

pub mod json;
pub mod toml;
pub mod yaml;

#[derive(Debug, Error)]
pub enum Error {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml: {0}")]
    TomlDecode(#[from] ::toml::de::Error),
    #[error("toml: {0}")]
    TomlEncode(#[from] ::toml::ser::Error),
    #[error("yaml: {0}")]
    Yaml(String),
    #[error("{format} cannot represent {what}")]
    Unrepresentable { format: Format, what: &'static str },
    #[error("input is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("cannot tell the format of {} from its extension", .0.display())]
    UnknownFormat(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
    Toml,
}

#[derive(Debug, Clone, Copy)]
pub struct EncodeOpts {
    /// Indented output for JSON. YAML and TOML are always block style.
    pub pretty: bool,
}

impl Default for EncodeOpts {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Toml => "toml",
        })
    }
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            "toml" => Some(Format::Toml),
            _ => None,
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<Value, Error> {
        debug!(format = %self, len = bytes.len(), "decoding");
        match self {
            Format::Json => json::decode(bytes),
            Format::Yaml => yaml::decode(bytes),
            Format::Toml => toml::decode(bytes),
        }
    }

    pub fn encode(self, value: &Value, opts: EncodeOpts) -> Result<String, Error> {
        debug!(format = %self, kind = ?value.kind(), "encoding");
        match self {
            Format::Json => json::encode(value, opts),
            Format::Yaml => Ok(yaml::encode(value)),
            Format::Toml => toml::encode(value),
        }
    }
}

impl Container {
    /// Decode a whole stream in `format`. JSON is decoded straight off the
    /// reader; YAML and TOML are buffered first.
    pub fn from_reader<R: Read>(mut reader: R, format: Format) -> Result<Self, Error> {
        Container::from_stream(|| -> Result<Value, Error> {
            match format {
                Format::Json => {
                    let raw: serde_json::Value = serde_json::from_reader(reader)?;
                    Ok(Value::from(raw))
                }
                _ => {
                    let mut buf = Vec::new();
                    reader.read_to_end(&mut buf)?;
                    format.decode(&buf)
                }
            }
        })
    }
}

/// Load a file, picking the format from its extension unless one is given.
pub fn load_file(path: &Path, format: Option<Format>) -> Result<(Format, Container), Error> {
    let format = match format.or_else(|| Format::from_path(path)) {
        Some(f) => f,
        None => return Err(Error::UnknownFormat(path.to_path_buf())),
    };
    let data = fs::read(path)?;
    let container = Container::from_bytes(&data, |bytes| format.decode(bytes))?;
    Ok((format, container))
}

pub fn write_file(path: &Path, value: &Value, format: Format, opts: EncodeOpts) -> Result<(), Error> {
    let s = format.encode(value, opts)?;
    fs::write(path, s)?;
    Ok(())
}
