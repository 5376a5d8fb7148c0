use std::{
	ffi::OsString,
	path::PathBuf,
};

use clap::{clap_app, crate_authors, crate_version, crate_description};


#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
	Help(Box<str>),
	Version(Box<str>),
	Run(Args)
}


#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Args {
	/// A file, a directory, or a directory followed by `/...` for every package below it.
	pub path: PathBuf,
	/// The name or path of the generated file.
	pub output: Option<PathBuf>,
	/// Build constraint for the generated file.
	pub tags: Option<String>,
	/// Check program with static analysis and lowering, but don't write.
	pub check: bool,
	/// Print the lowered program.
	pub print_program: bool,
	/// A function without parameters to run after lowering.
	pub run: Option<String>,
	/// Run with the thread handoff driver.
	pub handoff: bool,
	/// Seed for select statements.
	pub seed: u64,
}


pub fn parse<A, T>(args: A) -> clap::Result<Command>
where
	A: IntoIterator<Item = T>,
	T: Into<OsString> + Clone
{
	let app = clap_app!(
		corolla =>
			(version: crate_version!())
			(author: crate_authors!())
			(about: crate_description!())
			(@arg output: -o --output +takes_value "Name or path of the generated file")
			(@arg tags: --tags +takes_value "Build constraint for the generated file")
			(@arg check: --check "Perform only analysis and lowering, without writing")
			(@arg program: --program "Print the lowered PROGRAM")
			(@arg run: --run +takes_value "Run the given function")
			(@arg handoff: --handoff "Run with the thread handoff driver")
			(@arg seed: --seed +takes_value "Seed for select statements")
			(@arg PATH: +required "Source file, package directory, or dir/... pattern")
	);

	match app.get_matches_from_safe(args) {
		Ok(matches) => {
			let seed = match matches.value_of("seed") {
				Some(seed) => seed
					.parse()
					.map_err(
						|_| clap::Error::with_description(
							&format!("invalid seed '{}'", seed),
							clap::ErrorKind::InvalidValue,
						)
					)?,
				None => 0,
			};

			Ok(
				Command::Run(
					Args {
						path: matches.value_of_os("PATH").map(PathBuf::from).unwrap_or_default(),
						output: matches.value_of_os("output").map(PathBuf::from),
						tags: matches.value_of("tags").map(String::from),
						check: matches.is_present("check"),
						print_program: matches.is_present("program"),
						run: matches.value_of("run").map(String::from),
						handoff: matches.is_present("handoff"),
						seed,
					}
				)
			)
		}

		Err(error) => match error.kind {
			clap::ErrorKind::HelpDisplayed => Ok(
				Command::Help(error.message.into_boxed_str())
			),
			clap::ErrorKind::VersionDisplayed => Ok(
				Command::Version(error.message.into_boxed_str())
			),
			_ => Err(error)
		}
	}
}


#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;

	use super::*;


	#[test]
	fn test_defaults() {
		let command = parse(vec!["corolla", "pkg"]).expect("arguments should parse");

		assert_eq!(
			command,
			Command::Run(
				Args {
					path: "pkg".into(),
					output: None,
					tags: None,
					check: false,
					print_program: false,
					run: None,
					handoff: false,
					seed: 0,
				}
			)
		);
	}


	#[test]
	fn test_options() {
		let command = parse(
			vec![
				"corolla", "--output", "gen.co", "--tags", "linux && !cgo", "--check",
				"--run", "main", "--handoff", "--seed", "7", "pkg/...",
			]
		);

		match command {
			Ok(Command::Run(args)) => {
				assert_eq!(args.path, PathBuf::from("pkg/..."));
				assert_eq!(args.output, Some(PathBuf::from("gen.co")));
				assert_eq!(args.tags.as_deref(), Some("linux && !cgo"));
				assert!(args.check);
				assert_eq!(args.run.as_deref(), Some("main"));
				assert!(args.handoff);
				assert_eq!(args.seed, 7);
			}

			command => panic!("unexpected parse: {:?}", command),
		}
	}


	#[test]
	fn test_errors() {
		assert!(parse(vec!["corolla"]).is_err());
		assert!(parse(vec!["corolla", "--seed", "x", "pkg"]).is_err());
		assert_matches!(parse(vec!["corolla", "--help"]), Ok(Command::Help(_)));
	}
}
