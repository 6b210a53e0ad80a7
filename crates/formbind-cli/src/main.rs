use clap::{Args as ClapArgs, Parser, Subcommand};
use formbind_core::{
    Form, FormConfig, JsonModel, PathCache, Resolver, Rule, Syntax, backup_file, list_children,
    load_json, write_json,
};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "formbind",
    about = "Compile and resolve nested form paths (e.g. icons[name=ipad152x152].uri) against JSON files",
    version
)]
struct Cli {
    /// Accept malformed paths the way older templates wrote them
    #[arg(long, global = true, default_value_t = false)]
    lenient: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the compiled segments of a path
    Compile(CompileArgs),
    /// Print the value at a path
    Get(PathArgs),
    /// List children at a path
    List(ListArgs),
    /// Print value, normalized path and boundary for a path (optionally as a write)
    Resolve(ResolveArgs),
    /// Write a value (raw JSON) at a path; prints, writes --out, or edits in place
    Set(SetArgs),
    /// Run a form change: patch, validation errors and state classes
    Change(ChangeArgs),
}

#[derive(ClapArgs, Debug)]
struct CompileArgs {
    /// Path expression, e.g. icons[name=ipad152x152].uri
    path: String,
}

#[derive(ClapArgs, Debug)]
struct PathArgs {
    /// JSON document to read
    file: PathBuf,
    /// Path expression
    #[arg(long)]
    path: String,
}

#[derive(ClapArgs, Debug)]
struct ListArgs {
    /// JSON document to read
    file: PathBuf,
    /// Path expression; lists the document root when omitted
    #[arg(long)]
    path: Option<String>,
}

#[derive(ClapArgs, Debug)]
struct ResolveArgs {
    /// JSON document to read
    file: PathBuf,
    /// Path expression
    #[arg(long)]
    path: String,
    /// Resolve as a write of this raw JSON value (the file is not modified)
    #[arg(long)]
    value: Option<String>,
}

#[derive(ClapArgs, Debug)]
struct SetArgs {
    /// JSON document to edit
    file: PathBuf,
    /// Path expression
    #[arg(long)]
    path: String,
    /// New value as raw JSON (e.g., 123, true, "str", {"a":1})
    #[arg(long)]
    value: String,
    /// Optional output .json path to write; otherwise prints to stdout
    #[arg(long, conflicts_with = "in_place")]
    out: Option<PathBuf>,
    /// Overwrite the input file
    #[arg(long, default_value_t = false)]
    in_place: bool,
    /// Skip the timestamped backup made before --in-place writes
    #[arg(long, default_value_t = false, requires = "in_place")]
    no_backup: bool,
}

#[derive(ClapArgs, Debug)]
struct ChangeArgs {
    /// JSON document holding the model data
    file: PathBuf,
    /// Path expression
    #[arg(long)]
    path: String,
    /// New value as raw JSON
    #[arg(long)]
    value: String,
    /// Validation rules: JSON object of field shape -> rule
    #[arg(long, value_name = "JSON")]
    rules: Option<PathBuf>,
    /// Form config (name and class names) as JSON
    #[arg(long, value_name = "JSON")]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let syntax = if cli.lenient { Syntax::Lenient } else { Syntax::Strict };
    let resolver = Resolver::new(Arc::new(PathCache::with_syntax(syntax)));
    match cli.cmd {
        Cmd::Compile(a) => cmd_compile(&resolver, a),
        Cmd::Get(a) => cmd_get(&resolver, a),
        Cmd::List(a) => cmd_list(&resolver, a),
        Cmd::Resolve(a) => cmd_resolve(&resolver, a),
        Cmd::Set(a) => cmd_set(&resolver, a),
        Cmd::Change(a) => cmd_change(resolver, a),
    }
}

const EXIT_LOAD: i32 = 2;
const EXIT_BAD_VALUE: i32 = 3;
const EXIT_PATH: i32 = 4;
const EXIT_WRITE: i32 = 5;
const EXIT_NOT_FOUND: i32 = 6;

fn fail(code: i32, msg: impl std::fmt::Display) -> ! {
    tracing::debug!(code, "exiting with error");
    eprintln!("error: {}", msg);
    std::process::exit(code);
}

fn load(file: &std::path::Path) -> Value {
    load_json(file).unwrap_or_else(|e| fail(EXIT_LOAD, e))
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|e| fail(EXIT_BAD_VALUE, format!("invalid --value JSON: {}", e)))
}

fn print_json(v: &Value) {
    match serde_json::to_string_pretty(v) {
        Ok(s) => println!("{}", s),
        Err(e) => fail(EXIT_WRITE, e),
    }
}

fn cmd_compile(resolver: &Resolver, args: CompileArgs) {
    let segments = resolver.compile(&args.path).unwrap_or_else(|e| fail(EXIT_PATH, e));
    print_json(&serde_json::to_value(&segments).unwrap_or_else(|e| fail(EXIT_WRITE, e)));
}

fn cmd_get(resolver: &Resolver, args: PathArgs) {
    let doc = load(&args.file);
    match resolver.get(&doc, &args.path) {
        Ok(Some(v)) => print_json(v),
        Ok(None) => fail(EXIT_NOT_FOUND, format!("not found: {}", args.path)),
        Err(e) => fail(EXIT_PATH, e),
    }
}

fn cmd_list(resolver: &Resolver, args: ListArgs) {
    let doc = load(&args.file);
    let node = match args.path.as_deref() {
        None => &doc,
        Some(p) => match resolver.get(&doc, p) {
            Ok(Some(v)) => v,
            Ok(None) => fail(EXIT_NOT_FOUND, format!("not found: {}", p)),
            Err(e) => fail(EXIT_PATH, e),
        },
    };
    for c in list_children(node) {
        println!(
            "{}\t{}{}",
            c.key_or_index,
            c.kind,
            c.len.map(|n| format!("\t(len={})", n)).unwrap_or_default()
        );
    }
}

fn cmd_resolve(resolver: &Resolver, args: ResolveArgs) {
    let mut doc = load(&args.file);
    let res = match args.value.as_deref() {
        Some(raw) => resolver.write(&mut doc, &args.path, parse_value(raw)),
        None => resolver.read(&doc, &args.path),
    };
    let r = res.unwrap_or_else(|e| fail(EXIT_PATH, e));
    print_json(&json!({
        "value": r.value,
        "path": r.path.to_string(),
        "boundaryPath": r.boundary.to_string(),
        "boundaryValue": r.boundary_value,
        "leafPatch": r.is_leaf_patch(),
    }));
}

fn cmd_set(resolver: &Resolver, args: SetArgs) {
    let mut doc = load(&args.file);
    let new_val = parse_value(&args.value);
    let r = resolver
        .write(&mut doc, &args.path, new_val)
        .unwrap_or_else(|e| fail(EXIT_PATH, e));
    tracing::info!(path = %r.path, boundary = %r.boundary, "value written");
    if args.in_place {
        if !args.no_backup {
            let bak = backup_file(&args.file).unwrap_or_else(|e| fail(EXIT_WRITE, format!("backup failed: {}", e)));
            eprintln!("backup: {}", bak.display());
        }
        write_json(&args.file, &doc).unwrap_or_else(|e| fail(EXIT_WRITE, format!("writing: {}", e)));
    } else if let Some(out) = args.out {
        write_json(&out, &doc).unwrap_or_else(|e| fail(EXIT_WRITE, format!("writing: {}", e)));
    } else {
        print_json(&doc);
    }
}

fn cmd_change(resolver: Resolver, args: ChangeArgs) {
    let data = load(&args.file);
    let rules: BTreeMap<String, Rule> = match &args.rules {
        Some(p) => serde_json::from_value(load(p)).unwrap_or_else(|e| fail(EXIT_LOAD, format!("invalid rules: {}", e))),
        None => BTreeMap::new(),
    };
    let config = match &args.config {
        Some(p) => FormConfig::from_json_file(p).unwrap_or_else(|e| fail(EXIT_LOAD, format!("invalid config: {}", e))),
        None => FormConfig::default(),
    };
    let model = JsonModel::with_rules(data, rules).unwrap_or_else(|e| fail(EXIT_LOAD, e));
    let mut form = Form::new(config, model, resolver);

    let patch = form
        .on_change(&args.path, parse_value(&args.value))
        .unwrap_or_else(|e| fail(EXIT_PATH, e));
    print_json(&json!({
        "patch": patch,
        "errors": form.errors(),
        "labelClassName": form.label_class_name(&args.path, false),
        "inputClassName": form.input_class_name(&args.path, false),
        "valid": form.is_valid(),
        "data": form.model().data(),
    }));
}
