use std::{io, path::Path};

use assert_matches::assert_matches;

use crate::{fmt, semantic, symbol, syntax, tests};
use crate::semantic::program::{Block, FnId, FrameOp, Function, Program, Statement, Type};
use super::{Error, ErrorKind};


fn compile_source(
	path: &Path,
	source: syntax::Source,
	interner: &mut symbol::Interner,
) -> (Program, Result<Program, Error>) {
	let analysis = syntax::Analysis::analyze(source, interner);

	if !analysis.is_ok() {
		let errors: Vec<String> = analysis.errors
			.iter()
			.map(|error| fmt::Show(error, &*interner).to_string())
			.collect();

		panic!("{}: {:#?}", path.display(), errors);
	}

	let program = match semantic::analyze(path, vec![analysis.ast], interner) {
		Ok(program) => program,
		Err(errors) => panic!(
			"{}: {}",
			path.display(),
			fmt::Show(
				errors,
				semantic::ErrorsDisplayContext { max_errors: None, interner: &*interner },
			)
		),
	};

	let result = super::compile(&program);

	(program, result)
}


fn compile_str(source: &str, interner: &mut symbol::Interner) -> (Program, Result<Program, Error>) {
	let path = Path::new("<test>");
	compile_source(path, syntax::Source::from_str(path, source), interner)
}


fn test_dir<P, F>(path: P, mut check: F) -> io::Result<()>
where
	P: AsRef<Path>,
	F: FnMut(&Result<Program, Error>) -> bool,
{
	let mut interner = symbol::Interner::new();

	tests::util::test_dir(
		path,
		move |path, file| {
			let source = syntax::Source::from_reader(path, file)?;
			let (_, result) = compile_source(path, source, &mut interner);

			if !check(&result) {
				match result {
					Ok(program) => panic!("{}:\n{}", path.display(), fmt::Show(program, &interner)),
					Err(error) => panic!("{}", fmt::Show(error, &interner)),
				}
			}

			Ok(())
		}
	)
}


fn function<'a>(program: &'a Program, name: &str, interner: &mut symbol::Interner) -> &'a Function {
	let symbol = interner.get_or_intern(name);

	let id = program
		.find(symbol)
		.unwrap_or_else(|| panic!("missing function {}", name));

	program.function(id)
}


fn error_kind(result: Result<Program, Error>) -> ErrorKind {
	match result {
		Ok(_) => panic!("expected a lowering error"),
		Err(error) => error.kind,
	}
}


/// Collect the arm ends of every dispatch in the block.
fn dispatches(block: &Block) -> Vec<Vec<u32>> {
	let mut dispatches = Vec::new();

	block.walk(
		&mut |statement| {
			if let Statement::Dispatch(arms) = statement {
				dispatches.push(arms.iter().map(|(end, _)| *end).collect());
			}
		}
	);

	dispatches
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
		"src/compile/tests/data/positive",
		|result| result.is_ok(),
	)
}


#[test]
fn test_negative() -> io::Result<()> {
	test_dir(
		"src/compile/tests/data/negative",
		|result| result.is_err(),
	)
}


#[test]
fn test_coloring() {
	let mut interner = symbol::Interner::new();

	let (_, result) = compile_str(
		"func squares(n int) {\n\tfor i := 1; i <= n; i++ {\n\t\tyield[int, nil](i * i)\n\t}\n}\n\n\
		 func parent() {\n\tsquares(2)\n}\n\n\
		 func plain() int {\n\treturn 1\n}\n",
		&mut interner,
	);

	let program = result.expect("program should compile");

	for name in &["squares", "parent"] {
		let function = function(&program, name, &mut interner);
		assert!(function.lowered);

		let signature = function.signature.as_ref().expect("missing signature");
		assert_eq!(signature.yields, Type::Int);
		assert_eq!(signature.receives, Type::Nil);
	}

	let plain = function(&program, "plain", &mut interner);
	assert!(!plain.lowered);
	assert!(plain.signature.is_none());
}


#[test]
fn test_uncolored_unchanged() {
	let mut interner = symbol::Interner::new();

	let (program, result) = compile_str(
		"func plain(xs []int) int {\n\ttotal := 0\n\tfor _, x := range xs {\n\t\ttotal += x\n\t}\n\treturn total\n}\n",
		&mut interner,
	);

	let lowered = result.expect("program should compile");

	let before = fmt::Show(&program, &interner).to_string();
	let after = fmt::Show(&lowered, &interner).to_string();

	assert_eq!(before, after);
}


#[test]
fn test_conflicting_signature() {
	let mut interner = symbol::Interner::new();

	let (_, result) = compile_str(
		"func a() {\n\tyield[int, nil](1)\n}\n\n\
		 func b() {\n\tyield[string, nil](\"x\")\n}\n\n\
		 func both() {\n\ta()\n\tb()\n}\n",
		&mut interner,
	);

	let error = result.expect_err("signatures should conflict");
	assert_eq!(error.function, interner.get_or_intern("both"));
	assert_matches!(error.kind, ErrorKind::ConflictingSignature { .. });
}


#[test]
fn test_unsupported_constructs() {
	let mut interner = symbol::Interner::new();

	let (_, result) = compile_str(
		"func f(ch chan int) {\n\tfor v := range ch {\n\t\tyield[int, nil](v)\n\t}\n}\n",
		&mut interner,
	);
	assert_matches!(error_kind(result), ErrorKind::UnsupportedStatement(_));

	let (_, result) = compile_str(
		"func f() {\n\tfor i := 0; i < 3; i = g(i) {\n\t\tyield[int, nil](i)\n\t}\n}\n\n\
		 func g(i int) int {\n\treturn i + 1\n}\n",
		&mut interner,
	);
	let kind = error_kind(result);
	assert_eq!(kind, ErrorKind::UnsupportedPostStatement);
	assert_eq!(fmt::Show(&kind, &interner).to_string(), "unsupported loop post statement");

	let (_, result) = compile_str(
		"func g() {\n\tyield[int, nil](1)\n}\n\nfunc f() {\n\tdefer g()\n}\n",
		&mut interner,
	);
	let kind = error_kind(result);
	assert_eq!(kind, ErrorKind::UnsupportedDefer);
	assert_eq!(fmt::Show(&kind, &interner).to_string(), "deferred call to a suspending function");
}


#[test]
fn test_unresolved_label() {
	let mut interner = symbol::Interner::new();

	// Both lowered and plain functions are checked.
	for body in &["", "\n\tyield[int, nil](0)"] {
		let source = format!(
			"func f() {{{}\nL:\n\tfor {{\n\t\tbreak\n\t}}\n\tfor {{\n\t\tbreak L\n\t}}\n}}\n",
			body,
		);

		let (_, result) = compile_str(&source, &mut interner);
		assert_matches!(error_kind(result), ErrorKind::UnresolvedLabel(_));
	}
}


#[test]
fn test_dispatch_spans() {
	let mut interner = symbol::Interner::new();

	let (_, result) = compile_str(
		"func f(n int) int {\n\
		 \ttotal := 0\n\
		 \tfor i := 0; i < n; i++ {\n\
		 \t\ttotal += yield[int, int](i)\n\
		 \t\tif total > 10 {\n\
		 \t\t\tbreak\n\
		 \t\t}\n\
		 \t}\n\
		 \tyield[int, int](total)\n\
		 \treturn total\n\
		 }\n",
		&mut interner,
	);

	let program = result.expect("program should compile");
	let function = program.function(FnId(0));

	let dispatches = dispatches(&function.body);
	assert!(!dispatches.is_empty());

	// Arms end at increasing instruction pointers, so that completed statements are skipped.
	for ends in dispatches {
		assert!(ends.len() >= 2);
		assert!(ends.windows(2).all(|pair| pair[0] < pair[1]));
	}
}


#[test]
fn test_loop_post_resets_ip() {
	let mut interner = symbol::Interner::new();

	let (_, result) = compile_str(
		"func f(xs []int) {\n\tfor _, x := range xs {\n\t\tyield[int, nil](x)\n\t}\n}\n",
		&mut interner,
	);

	let program = result.expect("program should compile");
	let function = program.function(FnId(0));

	let mut loops = 0;

	function.body.walk(
		&mut |statement| {
			if let Statement::For { post, .. } = statement {
				loops += 1;

				let post = post.as_deref().expect("lowered loop without post");
				let last = match post {
					Statement::Block(block) => block.0.last().expect("empty post"),
					post => post,
				};

				assert_matches!(last, Statement::Frame(FrameOp::SetIp(ip)) if *ip > 0);
			}
		}
	);

	assert_eq!(loops, 1);
}


#[test]
fn test_frame_wrapping() {
	let mut interner = symbol::Interner::new();

	let (_, result) = compile_str(
		"func f(n int) {\n\tdefer println(n)\n\tx := n\n\tyield[int, nil](x)\n}\n",
		&mut interner,
	);

	let program = result.expect("program should compile");
	let body = &program.function(FnId(0)).body.0;

	let push = body
		.iter()
		.position(|statement| matches!(statement, Statement::Frame(FrameOp::Push)))
		.expect("missing push");

	assert_matches!(body[push + 1], Statement::If { .. });

	match &body[push + 2] {
		Statement::Scoped { unwind, complete, .. } => {
			// The parameter, the user local and the defer list are saved.
			assert!(unwind.0.len() >= 3);
			assert!(unwind.0.iter().all(|statement| matches!(statement, Statement::Frame(FrameOp::Save { .. }))));

			assert_matches!(complete.0[0], Statement::Frame(FrameOp::RunDefers { .. }));
			assert_matches!(complete.0[1], Statement::Frame(FrameOp::Pop));
		}

		statement => panic!("expected scoped body, got {:?}", statement),
	}
}
