use std::{io, path::Path};

use assert_matches::assert_matches;

use crate::{fmt, symbol, syntax, tests};
use super::{program::Statement, Errors, ErrorKind, ErrorsDisplayContext, Program};


fn analyze_file(
	path: &Path,
	file: std::fs::File,
	interner: &mut symbol::Interner,
) -> io::Result<Result<Program, Errors>> {
	let source = syntax::Source::from_reader(path, file)?;
	let analysis = syntax::Analysis::analyze(source, interner);

	if !analysis.is_ok() {
		let errors: Vec<String> = analysis.errors
			.iter()
			.map(|error| fmt::Show(error, &*interner).to_string())
			.collect();

		panic!("{}: {:#?}", path.display(), errors);
	}

	Ok(super::analyze(path, vec![analysis.ast], interner))
}


fn test_dir<P, F>(path: P, mut check: F) -> io::Result<()>
where
	P: AsRef<Path>,
	F: FnMut(&Result<Program, Errors>) -> bool,
{
	let mut interner = symbol::Interner::new();

	tests::util::test_dir(
		path,
		move |path, file| {
			let result = analyze_file(path, file, &mut interner)?;

			if !check(&result) {
				match result {
					Ok(program) => panic!("{}:\n{}", path.display(), fmt::Show(program, &interner)),

					Err(errors) => panic!(
						"{}",
						fmt::Show(
							errors,
							ErrorsDisplayContext {
								max_errors: None,
								interner: &interner,
							}
						)
					),
				}
			}

			Ok(())
		}
	)
}


fn analyze_str(source: &str, interner: &mut symbol::Interner) -> Result<Program, Errors> {
	let source = syntax::Source::from_str(Path::new("<test>"), source);

	let analysis = syntax::Analysis::analyze(source, interner);
	assert!(analysis.is_ok());

	super::analyze(Path::new("<test>"), vec![analysis.ast], interner)
}


fn error_kinds(result: Result<Program, Errors>) -> Vec<ErrorKind> {
	match result {
		Ok(_) => panic!("expected semantic errors"),
		Err(errors) => errors.into_iter().map(|error| error.kind).collect(),
	}
}


#[test]
fn test_demos() -> io::Result<()> {
	test_dir(
		"demos",
		|result| result.is_ok(),
	)
}


#[test]
fn test_positive() -> io::Result<()> {
	test_dir(
		"src/semantic/tests/data/positive",
		|result| result.is_ok(),
	)
}


#[test]
fn test_negative() -> io::Result<()> {
	test_dir(
		"src/semantic/tests/data/negative",
		|result| result.is_err(),
	)
}


#[test]
fn test_undeclared_names() {
	let mut interner = symbol::Interner::new();

	let result = analyze_str(
		"func main() {\n\tx = 1\n\tmissing()\n\tvar y Nope\n\tbreak nowhere\n}\n",
		&mut interner,
	);

	let kinds = error_kinds(result);
	assert_eq!(kinds.len(), 4);
	assert_matches!(kinds[0], ErrorKind::UndeclaredVariable(_));
	assert_matches!(kinds[1], ErrorKind::UndeclaredFunction(_));
	assert_matches!(kinds[2], ErrorKind::UndeclaredType(_));
	assert_matches!(kinds[3], ErrorKind::UndeclaredLabel(_));
}


#[test]
fn test_argument_count() {
	let mut interner = symbol::Interner::new();

	let result = analyze_str(
		"func f(a int, b int) {\n}\n\nfunc main() {\n\tf(1)\n}\n",
		&mut interner,
	);

	let kinds = error_kinds(result);
	assert_matches!(kinds.as_slice(), [ErrorKind::ArgumentCount { expected: 2, got: 1, .. }]);
}


#[test]
fn test_compound_assignment() {
	let mut interner = symbol::Interner::new();

	let program = analyze_str(
		"func main() {\n\tx := 1\n\tx += 2\n\tx++\n\t_ = x\n}\n",
		&mut interner,
	).expect("valid program");

	let body = &program.functions[0].body.0;
	assert_eq!(body.len(), 4);
	assert_matches!(body[1], Statement::Assign { .. });
	assert_matches!(body[2], Statement::Assign { .. });
	assert_matches!(body[3], Statement::Expr(_));
}


#[test]
fn test_shadowing() {
	let mut interner = symbol::Interner::new();

	let program = analyze_str(
		"func main() {\n\tx := 1\n\t{\n\t\tx := \"inner\"\n\t\tprintln(x)\n\t}\n\tprintln(x)\n}\n",
		&mut interner,
	).expect("valid program");

	// Both declarations get their own local.
	assert_eq!(program.functions[0].locals.len(), 2);
}


#[test]
fn test_alias_cycle() {
	let mut interner = symbol::Interner::new();

	let result = analyze_str(
		"type A = []B\ntype B = map[string]A\n\nfunc main() {\n}\n",
		&mut interner,
	);

	let kinds = error_kinds(result);
	assert!(!kinds.is_empty());
	assert!(kinds.iter().all(|kind| matches!(kind, ErrorKind::UndeclaredType(_))));
}
