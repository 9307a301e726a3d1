//! Schema Bridge CLI
//!
//! Command-line interface for compiling type graphs, building models from
//! schema documents, and validating payloads.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use schema_bridge::{
    build_schema, expand_document, lint, load_schema, load_type_graph, validate_payload,
    BridgeError, BuildOptions, CompileOptions, FileStatus, ForwardCompiler, PortableEmitter,
    Severity, TypeName, TypeNode, ValidateError,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-bridge")]
#[command(about = "Compile between native type graphs and portable schema documents")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a type graph into validator and type declarations
    Compile {
        /// Type graph file ({"types": [...], "roots": [...]})
        graph: PathBuf,

        /// Root type to compile, as a dotted name (default: the graph's roots)
        #[arg(long)]
        root: Vec<String>,

        /// Emit a portable schema document instead of declarations
        #[arg(long)]
        schema: bool,

        /// Fail when any discovered type fails to compile
        #[arg(long)]
        strict: bool,

        /// Emit the compiled artifacts as JSON
        #[arg(long, conflicts_with = "schema")]
        json: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Build native model declarations from a schema document
    Build {
        /// Schema file
        schema: PathBuf,

        /// Name for an untitled root model
        #[arg(long, default_value = "Model")]
        root_name: String,

        /// Emit the declaration tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inline every $ref of a schema document
    Expand {
        /// Schema file
        schema: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a payload against a schema document
    Validate {
        /// Payload file to validate
        payload: PathBuf,

        /// Schema file
        #[arg(long)]
        schema: PathBuf,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Lint schema files for errors (syntax, broken refs, unsupported shapes)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Compile {
            graph,
            root,
            schema,
            strict,
            json,
            output,
            pretty,
        } => run_compile(CompileArgs {
            graph,
            roots: root,
            schema,
            strict,
            json,
            output,
            pretty,
        }),
        Commands::Build {
            schema,
            root_name,
            json,
        } => run_build(&schema, root_name, json),
        Commands::Expand {
            schema,
            output,
            pretty,
        } => run_expand(&schema, output, pretty),
        Commands::Validate {
            payload,
            schema,
            json,
        } => run_validate(&payload, &schema, json),
        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

struct CompileArgs {
    graph: PathBuf,
    roots: Vec<String>,
    schema: bool,
    strict: bool,
    json: bool,
    output: Option<PathBuf>,
    pretty: bool,
}

fn run_compile(args: CompileArgs) -> Result<(), u8> {
    let graph = load_type_graph(&args.graph).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let roots: Vec<TypeNode> = if args.roots.is_empty() {
        graph.roots().to_vec()
    } else {
        args.roots
            .iter()
            .map(|r| TypeNode::named(TypeName::parse(r)))
            .collect()
    };
    if roots.is_empty() {
        eprintln!("Error: no root types: pass --root or list roots in the graph file");
        return Err(2);
    }

    let text = if args.schema {
        let [root] = roots.as_slice() else {
            eprintln!("Error: --schema emits one document; pass exactly one root");
            return Err(2);
        };
        let document = PortableEmitter::new(&graph).emit(root).map_err(report_bridge_error)?;
        to_json(&document, args.pretty)?
    } else {
        let options = CompileOptions::new().strict(args.strict);
        let compiled = ForwardCompiler::with_options(&graph, options)
            .run(&roots)
            .map_err(report_bridge_error)?;
        if args.json {
            to_json(&compiled, args.pretty)?
        } else {
            compiled.render()
        }
    };

    write_output(&text, args.output)
}

fn run_build(schema_path: &Path, root_name: String, json: bool) -> Result<(), u8> {
    let schema = load_schema(schema_path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let options = BuildOptions::new().root_name(root_name);
    let model = build_schema(&schema, &options).map_err(report_bridge_error)?;

    let text = if json {
        to_json(&model, true)?
    } else {
        model.render()
    };
    write_output(&text, None)
}

fn run_expand(schema_path: &Path, output: Option<PathBuf>, pretty: bool) -> Result<(), u8> {
    let schema = load_schema(schema_path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let expanded = expand_document(&schema).map_err(report_bridge_error)?;
    write_output(&to_json(&expanded, pretty)?, output)
}

fn run_validate(payload_path: &Path, schema_path: &Path, json_output: bool) -> Result<(), u8> {
    let payload = load_schema(payload_path).map_err(|e| {
        report_error(json_output, &format!("loading payload: {}", e));
        e.exit_code() as u8
    })?;
    let schema = load_schema(schema_path).map_err(|e| {
        report_error(json_output, &format!("loading schema: {}", e));
        e.exit_code() as u8
    })?;

    match validate_payload(&schema, &payload) {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { errors }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": errors
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
        Err(e @ ValidateError::InvalidSchema { .. }) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = lint(path, strict);

    if format == "json" {
        println!("{}", to_json(&result, true)?);
    } else {
        if !quiet {
            println!("Linting {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if result.is_ok() && (!strict || result.warnings == 0) {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.is_ok() && (!strict || result.warnings == 0) {
        Ok(())
    } else {
        Err(1)
    }
}

/// Print a compiler error with its kind so scripts can match on it.
fn report_bridge_error(err: BridgeError) -> u8 {
    eprintln!("Error: {}: {}", err.kind(), err);
    err.exit_code() as u8
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, u8> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })
}

fn write_output(text: &str, output: Option<PathBuf>) -> Result<(), u8> {
    match output {
        Some(path) => std::fs::write(&path, text).map_err(|e| {
            eprintln!("Error writing to {}: {}", path.display(), e);
            3u8
        }),
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}
