//! burrow-core: read, test, replace and delete values by path inside decoded
//! JSON/YAML/TOML trees.
//!
//! This crate focuses on a small surface:
//! - `Value`/`Key`: the generic decoded tree every format maps onto
//! - `Container`/`Node`: path navigation and in-place mutation
//! - `codec`: built-in decoders/encoders (optional, any `bytes -> Value` works)
//! - `path`: textual paths (`a.b.0` or `/a/b/0`) for CLI use
//!
pub mod codec;
pub mod container;
pub mod path;
pub mod value;

pub use codec::{EncodeOpts, Format, load_file, write_file};
pub use container::{Container, Node, lookup};
pub use path::{format_path, parse_path};
pub use value::{Key, Mapping, Value, ValueKind};
