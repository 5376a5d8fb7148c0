mod args;
mod compile;
mod coroutine;
mod emit;
mod fmt;
mod runtime;
mod semantic;
mod symbol;
mod syntax;
mod term;
#[cfg(test)]
mod tests;

use std::{
	collections::BTreeMap,
	ffi::OsStr,
	io::{self, Write},
	path::{Path, PathBuf},
	sync::Arc,
};

use tracing_subscriber::EnvFilter;

use term::color;

use args::{Args, Command};
use runtime::{Driver, Handoff, Options, Panic, Value};


/// Failures of the command line tool. Analysis errors are reported as they are found
/// instead.
#[derive(Debug, thiserror::Error)]
enum Error {
	#[error("{}: {}", .path.display(), .error)]
	Io {
		path: PathBuf,
		error: io::Error,
	},

	#[error("invalid pattern: {0}")]
	Pattern(#[from] glob::PatternError),

	#[error(transparent)]
	Glob(#[from] glob::GlobError),

	#[error(transparent)]
	Tags(#[from] emit::TagError),

	#[error("no source files in {}", .0.display())]
	NoSources(PathBuf),

	#[error("no function named {0}")]
	MissingFunction(String),

	#[error("function {0} takes parameters")]
	Parameters(String),

	#[error("stdout: {0}")]
	Stdout(io::Error),

	#[error(transparent)]
	Panic(#[from] Panic),
}


impl Error {
	/// Whether standard output was closed by the reader, as when piping into `head`.
	fn is_broken_pipe(&self) -> bool {
		let error = match self {
			Self::Stdout(error) | Self::Panic(Panic::Io { error, .. }) => error,
			_ => return false,
		};

		error.kind() == io::ErrorKind::BrokenPipe
	}
}


fn main() -> ! {
	init_logging();

	let command = match args::parse(std::env::args_os()) {
		Ok(command) => command,
		Err(error) => {
			eprint!("{}", error);
			std::process::exit(1)
		}
	};

	let result = match command {
		Command::Run(args) => run(args, &mut io::stdout().lock()),
		Command::Help(msg) | Command::Version(msg) => {
			// Nothing useful can be done if stdout is gone.
			let _ = writeln!(io::stdout(), "{}", msg);
			std::process::exit(0)
		},
	};

	let exit_code = match result {
		Ok(code) => code,
		Err(error) if error.is_broken_pipe() => 0,
		Err(error) => {
			eprintln!("{}: {}", color::Fg(color::Red, "Error"), error);
			1
		}
	};

	std::process::exit(exit_code)
}


/// Log to stderr, filtered by the `COROLLA_LOG` environment variable.
fn init_logging() {
	let filter = EnvFilter::try_from_env("COROLLA_LOG")
		.unwrap_or_else(|_| EnvFilter::new("warn"));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(io::stderr)
		.init();
}


fn run<W: Write>(args: Args, out: &mut W) -> Result<i32, Error> {
	if let Some(tags) = &args.tags {
		emit::validate_tags(tags)?;
	}

	let packages = packages(&args)?;
	let mut interner = symbol::Interner::new();
	let mut failed = false;
	let mut ran = false;

	for (dir, files) in packages {
		tracing::debug!(target: "corolla", dir = %dir.display(), files = files.len(), "package");

		let (original, lowered) = match analyze(&dir, &files, &mut interner)? {
			Some(programs) => programs,
			None => {
				failed = true;
				continue;
			}
		};

		if args.print_program {
			let rule = color::Fg(color::Yellow, "--------------------------------------------------");

			write!(out, "{}\n{}{}\n", rule, fmt::Show(&lowered, &interner), rule)
				.map_err(Error::Stdout)?;
		}

		if !args.check {
			let output = output_path(&dir, args.output.as_deref());
			let contents = emit::render(&lowered, args.tags.as_deref(), &interner);

			emit::write(&output, &contents)
				.map_err(|error| Error::Io { path: output, error })?;
		}

		if let Some(name) = &args.run {
			let symbol = interner.get_or_intern(name.as_str());

			if let Some(entry) = original.find(symbol) {
				execute(out, &args, Arc::new(original), Arc::new(lowered), entry, name)?;
				ran = true;
			}
		}
	}

	match &args.run {
		Some(name) if !ran && !failed => Err(Error::MissingFunction(name.clone())),
		_ => Ok(if failed { 2 } else { 0 }),
	}
}


/// Group the source files of the path into packages, by directory.
fn packages(args: &Args) -> Result<BTreeMap<PathBuf, Vec<PathBuf>>, Error> {
	let path = &args.path;
	let output_name = args.output
		.as_deref()
		.and_then(Path::file_name)
		.map(|name| name.to_owned());

	let pattern = match path.to_str() {
		Some("...") => Some("**/*.co".to_owned()),
		Some(path) if path.ends_with("/...") => Some(format!("{}/**/*.co", &path[.. path.len() - 4])),
		_ if path.is_dir() => Some(format!("{}/*.co", path.display())),
		_ => None,
	};

	let files = match pattern {
		Some(pattern) => glob::glob(&pattern)?.collect::<Result<Vec<_>, _>>()?,
		None => vec![path.clone()],
	};

	let mut packages: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();

	for file in files {
		let name = file.file_name().map(|name| name.to_owned());

		// Generated files are never inputs.
		if name.as_deref() == Some(OsStr::new(emit::DEFAULT_OUTPUT)) || (name.is_some() && name == output_name) {
			continue;
		}

		let dir = match file.parent() {
			Some(dir) if !dir.as_os_str().is_empty() => dir.to_owned(),
			_ => PathBuf::from("."),
		};

		packages.entry(dir).or_default().push(file);
	}

	if packages.is_empty() {
		return Err(Error::NoSources(path.clone()));
	}

	Ok(packages)
}


fn output_path(dir: &Path, output: Option<&Path>) -> PathBuf {
	match output {
		Some(output) if output.components().count() > 1 => output.to_owned(),
		Some(name) => dir.join(name),
		None => dir.join(emit::DEFAULT_OUTPUT),
	}
}


/// Analyze and lower a package, reporting errors. Returns the program before and after
/// lowering, or None if there were errors.
fn analyze(
	dir: &Path,
	files: &[PathBuf],
	interner: &mut symbol::Interner,
) -> Result<Option<(semantic::Program, semantic::Program)>, Error> {
	let mut asts = Vec::with_capacity(files.len());
	let mut failed = false;

	for file in files {
		let source = syntax::Source::from_path(file.as_path())
			.map_err(|error| Error::Io { path: file.clone(), error })?;

		let analysis = syntax::Analysis::analyze(source, interner);

		for error in analysis.errors.iter().take(20) {
			eprintln!("{}", fmt::Show(error, &*interner));
		}

		failed |= !analysis.is_ok();
		asts.push(analysis.ast);
	}

	if failed {
		return Ok(None);
	}

	let program = match semantic::analyze(dir, asts, interner) {
		Ok(program) => program,
		Err(errors) => {
			eprint!(
				"{}",
				fmt::Show(
					errors,
					semantic::ErrorsDisplayContext { max_errors: Some(20), interner: &*interner },
				)
			);

			return Ok(None);
		}
	};

	match compile::compile(&program) {
		Ok(lowered) => Ok(Some((program, lowered))),
		Err(error) => {
			eprintln!("{}", fmt::Show(error, &*interner));
			Ok(None)
		}
	}
}


/// Run a function of the package, printing what it yields.
fn execute<W: Write>(
	out: &mut W,
	args: &Args,
	original: Arc<semantic::Program>,
	lowered: Arc<semantic::Program>,
	entry: semantic::program::FnId,
	name: &str,
) -> Result<(), Error> {
	let function = lowered.function(entry);

	if function.params != 0 {
		return Err(Error::Parameters(name.to_owned()));
	}

	let options = Options { seed: args.seed, ..Options::default() };

	if !function.lowered {
		let value = runtime::run(&lowered, entry, Vec::new(), &options)?;

		if value != Value::Nil {
			writeln!(out, "{}", value).map_err(Error::Stdout)?;
		}

		return Ok(());
	}

	let mut driver: Box<dyn Driver> =
		if args.handoff {
			Box::new(Handoff::new(original, entry, Vec::new(), options))
		} else {
			Box::new(runtime::spawn(&original, &lowered, entry, Vec::new(), options))
		};

	let mut yields = 0;

	while driver.step()? {
		if let Some(value) = driver.recv() {
			let value = runtime::value::Thawer::new(lowered.functions.len())
				.thaw(value)
				.map_err(Panic::from)?;

			writeln!(out, "{} {}", color::Fg(color::Yellow, "yield"), value).map_err(Error::Stdout)?;
			yields += 1;
		}
	}

	tracing::info!(target: "corolla", function = name, yields, state = ?driver.state(), "finished");

	Ok(())
}


#[cfg(test)]
mod cli_tests {
	use assert_matches::assert_matches;
	use serial_test::serial;

	use super::*;


	fn args(path: PathBuf) -> Args {
		Args {
			path,
			output: None,
			tags: None,
			check: true,
			print_program: false,
			run: None,
			handoff: false,
			seed: 0,
		}
	}


	#[test]
	fn test_package_discovery() {
		let demos = tests::util::data_path("demos/generators");

		let found = packages(&args(demos.clone())).expect("demos should be found");
		assert_eq!(found.len(), 1);
		assert!(found[&demos].iter().any(|file| file.ends_with("generators.co")));

		let file = demos.join("generators.co");
		let found = packages(&args(file.clone())).expect("file should be found");
		assert_eq!(found[&demos], vec![file]);

		let recursive = PathBuf::from(format!("{}/...", tests::util::data_path("src/compile").display()));
		let found = packages(&args(recursive)).expect("test data should be found");
		assert_eq!(found.len(), 2);
	}


	#[test]
	fn test_demo_packages() {
		let recursive = PathBuf::from(format!("{}/...", tests::util::data_path("demos").display()));
		let found = packages(&args(recursive)).expect("demos should be found");
		assert_eq!(found.len(), 4);

		// Every demo is a package of its own, so their entry points never clash.
		let mut interner = symbol::Interner::new();
		for (dir, files) in found {
			assert_eq!(files.len(), 1, "{}", dir.display());

			let analyzed = analyze(&dir, &files, &mut interner).expect("demo should be readable");
			assert!(analyzed.is_some(), "{}", dir.display());
		}
	}


	#[test]
	fn test_no_sources() {
		let empty = tests::util::data_path("src/term");

		assert_matches!(packages(&args(empty)), Err(Error::NoSources(_)));
	}


	#[test]
	fn test_output_path() {
		let dir = Path::new("pkg");

		assert_eq!(output_path(dir, None), dir.join(emit::DEFAULT_OUTPUT));
		assert_eq!(output_path(dir, Some(Path::new("gen.co"))), dir.join("gen.co"));
		assert_eq!(output_path(dir, Some(Path::new("out/gen.co"))), PathBuf::from("out/gen.co"));
	}


	/// A reader that has gone away.
	struct ClosedPipe;


	impl Write for ClosedPipe {
		fn write(&mut self, _: &[u8]) -> io::Result<usize> {
			Err(io::ErrorKind::BrokenPipe.into())
		}


		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}


	fn generators() -> (semantic::Program, semantic::Program, semantic::program::FnId) {
		let mut interner = symbol::Interner::new();
		let demos = tests::util::data_path("demos/generators");
		let files = vec![demos.join("generators.co")];

		let (original, lowered) = analyze(&demos, &files, &mut interner)
			.expect("demo should be readable")
			.expect("demo should compile");

		let entry = lowered
			.find(interner.get_or_intern("main"))
			.expect("demo should have a main function");

		(original, lowered, entry)
	}


	#[test]
	#[serial]
	fn test_demos_run() {
		let (original, lowered, entry) = generators();

		let (options, _) = Options::buffered();
		let mut driver = runtime::spawn(&Arc::new(original), &Arc::new(lowered), entry, Vec::new(), options);

		let mut yields = 0;
		while driver.step().expect("demo should not panic") {
			yields += 1;
		}

		// Ten fibonacci numbers and five even numbers.
		assert_eq!(yields, 15);
	}


	#[test]
	#[serial]
	fn test_execute_output() {
		let (original, lowered, entry) = generators();
		let mut out = Vec::new();

		execute(&mut out, &args(PathBuf::new()), Arc::new(original), Arc::new(lowered), entry, "main")
			.expect("demo should run");

		let out = String::from_utf8_lossy(&out);
		assert_eq!(out.lines().count(), 15);
		assert!(out.lines().all(|line| line.contains("yield")));
		assert!(out.ends_with(" 8\n"));
	}


	#[test]
	#[serial]
	fn test_closed_stdout() {
		let (original, lowered, entry) = generators();

		let result = execute(&mut ClosedPipe, &args(PathBuf::new()), Arc::new(original), Arc::new(lowered), entry, "main");

		let error = result.expect_err("writing should fail");
		assert_matches!(error, Error::Stdout(_));
		assert!(error.is_broken_pipe());

		assert!(!Error::MissingFunction("main".into()).is_broken_pipe());
		assert!(!Error::Stdout(io::ErrorKind::Other.into()).is_broken_pipe());
	}
}
