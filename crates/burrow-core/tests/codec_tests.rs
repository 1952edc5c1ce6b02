use burrow_core::codec::Error;
use burrow_core::{Container, EncodeOpts, Format, Key, Value, load_file, path, write_file};

const COMPACT: EncodeOpts = EncodeOpts { pretty: false };

#[test]
fn json_numbers_keep_integer_and_float_apart() {
    let v = Format::Json.decode(br#"{"i": 8080, "f": 4.4, "big": 18446744073709551615, "neg": -3}"#).unwrap();
    let mut c = Container::new(v);
    assert_eq!(c.get(&path!["i"]).data(), Some(&Value::Int(8080)));
    assert_eq!(c.get(&path!["f"]).data(), Some(&Value::Float(4.4)));
    assert_eq!(c.get(&path!["neg"]).data(), Some(&Value::Int(-3)));
    assert!(matches!(c.get(&path!["big"]).data(), Some(Value::Float(_))));
}

#[test]
fn json_encodes_non_json_scalars() {
    let ts = chrono::DateTime::parse_from_rfc3339("2001-02-20T21:03:55+02:00").unwrap();
    let mut map = burrow_core::Mapping::new();
    map.insert(Key::Int(55), Value::Timestamp(ts));
    map.insert(Key::from("nan"), Value::Float(f64::NAN));
    map.insert(Key::from("none"), Value::Null);
    let s = Format::Json.encode(&Value::Mapping(map), COMPACT).unwrap();
    assert_eq!(s, r#"{"55":"2001-02-20T21:03:55+02:00","nan":null,"none":null}"#);
}

#[test]
fn json_pretty_and_compact() {
    let v: Value = [("a", Value::from(vec![1, 2]))].into_iter().collect();
    assert_eq!(Format::Json.encode(&v, COMPACT).unwrap(), r#"{"a":[1,2]}"#);
    let pretty = Format::Json.encode(&v, EncodeOpts::default()).unwrap();
    assert!(pretty.contains("\n  \"a\": ["));
}

#[test]
fn toml_round_trip_after_edit() {
    let raw = r#"
title = "example"
hosts = ["alpha", "omega"]

[owner]
name = "macabot"
time = 2001-02-20T21:03:55Z

[database]
ports = [8080, 8080, 8081]
threshold = 30.5

[[friends]]
id = 0
name = "Wood Compton"

[[friends]]
id = 1
name = "Nina Andrews"
"#;
    let mut c = Container::from_bytes(raw.as_bytes(), |b| Format::Toml.decode(b)).unwrap();
    c.get(&path!["database", "ports", 1]).replace(8088);
    c.delete(&path!["friends", 0]);
    let encoded = Format::Toml.encode(c.data(), EncodeOpts::default()).unwrap();
    let again = Format::Toml.decode(encoded.as_bytes()).unwrap();
    assert_eq!(&again, c.data());
    assert_eq!(
        Container::new(again).get(&path!["friends", 0, "name"]).data(),
        Some(&Value::from("Nina Andrews"))
    );
}

#[test]
fn toml_local_datetimes() {
    let v = Format::Toml
        .decode(b"a = 1979-05-27T07:32:00\nb = 1979-05-27\nc = 1979-05-27T00:32:00-07:00\n")
        .unwrap();
    let mut c = Container::new(v);
    let utc = chrono::DateTime::parse_from_rfc3339("1979-05-27T07:32:00Z").unwrap();
    assert_eq!(c.get(&path!["a"]).data(), Some(&Value::Timestamp(utc)));
    assert_eq!(c.get(&path!["b"]).data(), Some(&Value::from("1979-05-27")));
    assert_eq!(c.get(&path!["c"]).data(), Some(&Value::Timestamp(utc)));
}

#[test]
fn toml_rejects_what_it_cannot_spell() {
    let err = Format::Toml.encode(&Value::from(vec![1, 2]), EncodeOpts::default()).unwrap_err();
    assert!(matches!(err, Error::Unrepresentable { format: Format::Toml, .. }));

    let v: Value = [("a", Value::from(vec![Value::Null]))].into_iter().collect();
    assert!(Format::Toml.encode(&v, EncodeOpts::default()).is_err());

    let v: Value = [("a", Value::Null), ("b", Value::Int(1))].into_iter().collect();
    assert_eq!(Format::Toml.encode(&v, EncodeOpts::default()).unwrap().trim(), "b = 1");
}

#[test]
fn keys_that_collide_as_text_are_rejected() {
    let v = Format::Yaml.decode(b"1: a\n\"1\": b\n").unwrap();
    assert_eq!(v.len(), Some(2));
    for format in [Format::Json, Format::Toml] {
        let err = format.encode(&v, EncodeOpts::default()).unwrap_err();
        assert!(
            matches!(err, Error::Unrepresentable { format: f, .. } if f == format),
            "{format}: {err}"
        );
    }
    // YAML keeps both.
    let yaml = Format::Yaml.encode(&v, EncodeOpts::default()).unwrap();
    assert_eq!(Format::Yaml.decode(yaml.as_bytes()).unwrap(), v);

    // Distinct text still encodes.
    let v = Format::Yaml.decode(b"1: a\n\"2\": b\n").unwrap();
    assert_eq!(Format::Json.encode(&v, COMPACT).unwrap(), r#"{"1":"a","2":"b"}"#);
}

#[test]
fn yaml_anchors_and_quoting() {
    let raw = "
base: &base
  host: localhost
  port: 5432
copy: *base
quoted: \"42\"
single: 'true'
plain: 42
empty:
list:
  - [1, 2]
  - {x: 1}
";
    let mut c = Container::from_bytes(raw.as_bytes(), |b| Format::Yaml.decode(b)).unwrap();
    assert_eq!(c.get(&path!["copy", "port"]).data(), Some(&Value::Int(5432)));
    assert_eq!(c.get(&path!["quoted"]).data(), Some(&Value::from("42")));
    assert_eq!(c.get(&path!["single"]).data(), Some(&Value::from("true")));
    assert_eq!(c.get(&path!["plain"]).data(), Some(&Value::Int(42)));
    assert_eq!(c.get(&path!["empty"]).data(), Some(&Value::Null));
    assert_eq!(c.get(&path!["list", 0, 1]).data(), Some(&Value::Int(2)));
    assert_eq!(c.get(&path!["list", 1, "x"]).data(), Some(&Value::Int(1)));

    // Editing the aliased copy leaves the anchored mapping alone.
    c.get(&path!["copy", "port"]).replace(6543);
    assert_eq!(c.get(&path!["base", "port"]).data(), Some(&Value::Int(5432)));
}

#[test]
fn yaml_emitter_output_reads_back() {
    let v: Value = [
        ("plain", Value::from("hello world")),
        ("looks_numeric", Value::from("42")),
        ("looks_bool", Value::from("false")),
        ("colon", Value::from("a: b")),
        ("multi", Value::from("line one\nline two")),
        ("float", Value::Float(4.0)),
        ("empty_list", Value::Sequence(Vec::new())),
        (
            "nested",
            Value::from(vec![
                Value::from(vec![1, 2]),
                [("x", 1), ("y", 2)].into_iter().collect(),
            ]),
        ),
    ]
    .into_iter()
    .collect();
    let yaml = Format::Yaml.encode(&v, EncodeOpts::default()).unwrap();
    assert!(yaml.contains("looks_numeric: \"42\"\n"));
    assert!(yaml.contains("nested:\n- - 1\n  - 2\n- x: 1\n  y: 2\n"));
    assert_eq!(Format::Yaml.decode(yaml.as_bytes()).unwrap(), v);
}

#[test]
fn yaml_empty_stream_is_null_and_errors_surface() {
    assert_eq!(Format::Yaml.decode(b"").unwrap(), Value::Null);
    assert_eq!(Format::Yaml.decode(b"--- 3\n--- 4\n").unwrap(), Value::Int(3));
    assert!(matches!(Format::Yaml.decode(b"a: [1, 2"), Err(Error::Yaml(_))));
    assert!(matches!(Format::Yaml.decode(b"? [1]\n: x\n"), Err(Error::Yaml(_))));
}

#[test]
fn format_from_extension() {
    use std::path::Path;
    assert_eq!(Format::from_path(Path::new("a.json")), Some(Format::Json));
    assert_eq!(Format::from_path(Path::new("a.YML")), Some(Format::Yaml));
    assert_eq!(Format::from_path(Path::new("dir/a.yaml")), Some(Format::Yaml));
    assert_eq!(Format::from_path(Path::new("Cargo.toml")), Some(Format::Toml));
    assert_eq!(Format::from_path(Path::new("notes.txt")), None);
    assert_eq!(Format::from_path(Path::new("noext")), None);
}

#[test]
fn load_edit_write_files() {
    use tempfile::tempdir;
    let dir = tempdir().unwrap();
    let src = dir.path().join("data.json");
    let out = dir.path().join("out.yaml");
    std::fs::write(&src, r#"{"root":{"a":{"b":[1,2,3],"c":true}}}"#).unwrap();

    let (format, mut c) = load_file(&src, None).expect("load json");
    assert_eq!(format, Format::Json);
    c.get(&path!["root", "a", "c"]).replace(false);
    c.delete(&path!["root", "a", "b", 0]);
    write_file(&out, c.data(), Format::Yaml, EncodeOpts::default()).expect("write yaml");

    let (format, reloaded) = load_file(&out, None).expect("load yaml");
    assert_eq!(format, Format::Yaml);
    assert_eq!(reloaded.data(), c.data());

    let odd = dir.path().join("data.conf");
    std::fs::write(&odd, "x = 1\n").unwrap();
    assert!(matches!(load_file(&odd, None), Err(Error::UnknownFormat(_))));
    let (_, c) = load_file(&odd, Some(Format::Toml)).expect("explicit format");
    assert!(c.has(&path!["x"]));

    assert!(matches!(load_file(&dir.path().join("missing.json"), None), Err(Error::Io(_))));
}
