//! Command line front end for the milpa modelling language.
//!
//! Reads a `.milpa` source file and an optional JSON bindings file, compiles
//! them into a concrete MILP model, and prints the resulting model listing,
//! the top-level scope, and compilation statistics. The solver back end is
//! intentionally not wired in here; the printed model is the hand-off
//! surface.

use std::{fs, path::PathBuf, process::ExitCode, time::Instant};

use milpa::{Model, Value};
use tracing::{info, Level};
use tracing_subscriber::fmt::time::uptime;

/// Usage message printed for `--help`.
const USAGE: &str = "\
USAGE: milpa-cli [OPTIONS] <MODEL.milpa>

Options:
  -b, --bindings <FILE>  JSON object binding names to numbers or nested arrays
  -v, --verbose          Increase logging verbosity (may be repeated)
  -h, --help             Print this help message
";

/// Parsed command line arguments.
struct Cli {
	/// Path of the model source file.
	model: PathBuf,
	/// Path of the JSON bindings file, if any.
	bindings: Option<PathBuf>,
	/// Logging verbosity: 0 info, 1 debug, 2+ trace.
	verbose: u8,
}

fn main() -> ExitCode {
	let cli = match Cli::from_env() {
		Ok(Some(cli)) => cli,
		Ok(None) => {
			print!("{USAGE}");
			return ExitCode::SUCCESS;
		}
		Err(err) => {
			eprintln!("error: {err}");
			return ExitCode::FAILURE;
		}
	};

	tracing_subscriber::fmt()
		.with_max_level(match cli.verbose {
			0 => Level::INFO,
			1 => Level::DEBUG,
			_ => Level::TRACE, // 2 or more
		})
		.with_writer(std::io::stderr)
		.with_timer(uptime())
		.init();

	match run(&cli) {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			eprintln!("error: {err}");
			ExitCode::FAILURE
		}
	}
}

/// Compile the model named on the command line and print the results.
fn run(cli: &Cli) -> Result<(), String> {
	let source = fs::read_to_string(&cli.model)
		.map_err(|err| format!("cannot read {}: {err}", cli.model.display()))?;
	let bindings = match &cli.bindings {
		Some(path) => {
			let text = fs::read_to_string(path)
				.map_err(|err| format!("cannot read {}: {err}", path.display()))?;
			decode_bindings(&text)?
		}
		None => Vec::new(),
	};
	let name = cli
		.model
		.file_stem()
		.map_or_else(|| "model".to_owned(), |s| s.to_string_lossy().into_owned());

	let start = Instant::now();
	let (model, scope, stats) =
		Model::from_source(&name, &source, bindings).map_err(|err| err.to_string())?;
	info!(
		variables = stats.variables_created(),
		constraints = stats.constraints_posted(),
		elapsed = %humantime::format_duration(start.elapsed()),
		"compiled model"
	);

	print!("{model}");
	let mut entries: Vec<_> = scope.bindings().collect();
	entries.sort_by(|a, b| a.0.cmp(b.0));
	println!("scope:");
	for (name, value) in entries {
		println!("  {name}: {}", value.kind_name());
	}
	Ok(())
}

/// Decode a JSON object into root-scope bindings: numbers become scalars,
/// arrays become (possibly nested) sequences.
fn decode_bindings(text: &str) -> Result<Vec<(String, Value)>, String> {
	let json: serde_json::Value =
		serde_json::from_str(text).map_err(|err| format!("invalid bindings JSON: {err}"))?;
	let serde_json::Value::Object(map) = json else {
		return Err("bindings JSON must be an object".to_owned());
	};
	map.into_iter()
		.map(|(name, value)| {
			let value = decode_value(&value)
				.ok_or_else(|| format!("binding `{name}' is not a number or array"))?;
			Ok((name, value))
		})
		.collect()
}

/// Decode one JSON value into a [`Value`].
fn decode_value(json: &serde_json::Value) -> Option<Value> {
	match json {
		serde_json::Value::Number(num) => {
			if let Some(int) = num.as_i64() {
				Some(Value::Int(int))
			} else {
				num.as_f64().map(Value::Float)
			}
		}
		serde_json::Value::Array(items) => items
			.iter()
			.map(decode_value)
			.collect::<Option<Vec<_>>>()
			.map(Value::Seq),
		_ => None,
	}
}

impl Cli {
	/// Parse the command line. Returns `Ok(None)` when help was requested.
	fn from_env() -> Result<Option<Cli>, String> {
		let mut args = pico_args::Arguments::from_env();
		if args.contains(["-h", "--help"]) {
			return Ok(None);
		}
		let mut verbose = 0_u8;
		while args.contains(["-v", "--verbose"]) {
			verbose += 1;
		}
		let bindings = args
			.opt_value_from_str(["-b", "--bindings"])
			.map_err(|err| err.to_string())?;
		let model: PathBuf = args.free_from_str().map_err(|_| {
			format!("missing model file\n{USAGE}")
		})?;
		let rest = args.finish();
		if !rest.is_empty() {
			return Err(format!("unexpected arguments: {rest:?}\n{USAGE}"));
		}
		Ok(Some(Cli {
			model,
			bindings,
			verbose,
		}))
	}
}
