use burrow_core::{Container, EncodeOpts, Format, Value, parse_path};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "burrow",
    about = "Read and edit JSON, YAML and TOML documents by path",
    version
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the value at a path
    Get(GetArgs),
    /// Print whether a path exists
    Has(HasArgs),
    /// Replace the value at a path; prints or writes with --out
    Set(SetArgs),
    /// Delete keys or sequence elements; prints or writes with --out
    Delete(DeleteArgs),
    /// Re-encode a whole document in another format
    Convert(ConvertArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Json,
    Yaml,
    Toml,
}

impl From<FormatArg> for Format {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Json => Format::Json,
            FormatArg::Yaml => Format::Yaml,
            FormatArg::Toml => Format::Toml,
        }
    }
}

#[derive(ClapArgs, Debug)]
struct InputArgs {
    /// File to load (.json, .yaml/.yml or .toml)
    file: PathBuf,
    /// Input format; detected from the extension by default
    #[arg(long, value_enum)]
    from: Option<FormatArg>,
}

#[derive(ClapArgs, Debug)]
struct OutputArgs {
    /// Output format; defaults to the input format
    #[arg(long, value_enum)]
    to: Option<FormatArg>,
    /// Optional output path to write; otherwise prints to stdout
    #[arg(long)]
    out: Option<PathBuf>,
    /// Compact JSON instead of indented
    #[arg(long, default_value_t = false)]
    compact: bool,
}

#[derive(ClapArgs, Debug)]
struct GetArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Path, e.g. friends.1.name or /friends/1/name (empty for the root)
    #[arg(long, default_value = "")]
    path: String,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(ClapArgs, Debug)]
struct HasArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Path, e.g. friends.1.name or /friends/1/name
    #[arg(long)]
    path: String,
}

#[derive(ClapArgs, Debug)]
struct SetArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Path, e.g. friends.1.name or /friends/1/name (empty for the root)
    #[arg(long, default_value = "")]
    path: String,
    /// New value as raw JSON (e.g., 123, true, "str", {"a":1})
    #[arg(long)]
    value: String,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(ClapArgs, Debug)]
struct DeleteArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Path to delete; repeat to delete several, applied in order
    #[arg(long = "path", required = true)]
    paths: Vec<String>,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(ClapArgs, Debug)]
struct ConvertArgs {
    #[command(flatten)]
    input: InputArgs,
    #[command(flatten)]
    output: OutputArgs,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Get(a) => cmd_get(a),
        Cmd::Has(a) => cmd_has(a),
        Cmd::Set(a) => cmd_set(a),
        Cmd::Delete(a) => cmd_delete(a),
        Cmd::Convert(a) => cmd_convert(a),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load(input: &InputArgs) -> (Format, Container) {
    burrow_core::load_file(&input.file, input.from.map(Format::from)).unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        std::process::exit(2);
    })
}

fn emit(value: &Value, input_format: Format, output: &OutputArgs) {
    let format = output.to.map(Format::from).unwrap_or(input_format);
    let opts = EncodeOpts {
        pretty: !output.compact,
    };
    if let Some(out) = &output.out {
        burrow_core::write_file(out, value, format, opts).unwrap_or_else(|e| {
            eprintln!("error writing: {}", e);
            std::process::exit(5);
        });
        return;
    }
    match format.encode(value, opts) {
        Ok(s) if s.ends_with('\n') => print!("{}", s),
        Ok(s) => println!("{}", s),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(5);
        }
    }
}

fn cmd_get(args: GetArgs) {
    let (format, mut container) = load(&args.input);
    let path = parse_path(&args.path);
    let node = container.get(&path);
    match node.data() {
        // Scalars and fragments need not be valid top-level TOML; fall back to JSON.
        Some(v) if format == Format::Toml && args.output.to.is_none() && v.as_mapping().is_none() => {
            emit(v, Format::Json, &args.output)
        }
        Some(v) => emit(v, format, &args.output),
        None => {
            eprintln!("not found: {}", args.path);
            std::process::exit(3);
        }
    }
}

fn cmd_has(args: HasArgs) {
    let (_, container) = load(&args.input);
    println!("{}", container.has(&parse_path(&args.path)));
}

fn cmd_set(args: SetArgs) {
    let (format, mut container) = load(&args.input);
    let raw: serde_json::Value = serde_json::from_str(&args.value).unwrap_or_else(|e| {
        eprintln!("invalid --value JSON: {}", e);
        std::process::exit(3);
    });
    let path = parse_path(&args.path);
    let node = container.get(&path);
    if node.is_absent() {
        eprintln!("not found: {}", args.path);
        std::process::exit(3);
    }
    if node.replace(Value::from(raw)).is_absent() {
        eprintln!("error: cannot replace {}", args.path);
        std::process::exit(4);
    }
    emit(container.data(), format, &args.output);
}

fn cmd_delete(args: DeleteArgs) {
    let (format, mut container) = load(&args.input);
    for p in &args.paths {
        debug!(path = %p, "deleting");
        container.delete(&parse_path(p));
    }
    emit(container.data(), format, &args.output);
}

fn cmd_convert(args: ConvertArgs) {
    let (format, container) = load(&args.input);
    emit(container.data(), format, &args.output);
}
