use std::{
	path::Path,
	sync::{Arc, Mutex},
};

use assert_matches::assert_matches;
use serial_test::serial;

use crate::{
	compile,
	fmt,
	semantic::{self, program::{FnId, Program}},
	symbol,
	syntax,
};
use super::{Driver, Handoff, Options, Panic, Replay, Snapshot, Value};


const SQUARES: &str = "\
func squares(n int) {
	for i := 1; i <= n; i++ {
		yield[int, nil](i * i)
	}
}

func parent() {
	squares(4)
	squares(4)
}
";


/// A program before and after lowering.
struct Loaded {
	original: Arc<Program>,
	lowered: Arc<Program>,
	interner: symbol::Interner,
}


impl Loaded {
	fn new(source: &str) -> Self {
		let mut interner = symbol::Interner::new();
		let path = Path::new("<test>");

		let analysis = syntax::Analysis::analyze(syntax::Source::from_str(path, source), &mut interner);
		assert!(analysis.is_ok(), "syntax errors in test program");

		let program = match semantic::analyze(path, vec![analysis.ast], &mut interner) {
			Ok(program) => program,
			Err(errors) => panic!(
				"{}",
				fmt::Show(
					errors,
					semantic::ErrorsDisplayContext { max_errors: None, interner: &interner },
				)
			),
		};

		let lowered = match compile::compile(&program) {
			Ok(lowered) => lowered,
			Err(error) => panic!("{}", fmt::Show(error, &interner)),
		};

		Self {
			original: Arc::new(program),
			lowered: Arc::new(lowered),
			interner,
		}
	}


	fn entry(&mut self, name: &str) -> FnId {
		let symbol = self.interner.get_or_intern(name);

		self.original
			.find(symbol)
			.unwrap_or_else(|| panic!("missing function {}", name))
	}


	fn replay(&mut self, name: &str, args: Vec<Snapshot>, options: &Options) -> Replay {
		let entry = self.entry(name);
		Replay::new(self.lowered.clone(), entry, args, options.clone())
	}


	fn handoff(&mut self, name: &str, args: Vec<Snapshot>, options: &Options) -> Handoff {
		let entry = self.entry(name);
		Handoff::new(self.original.clone(), entry, args, options.clone())
	}
}


/// Step until completion, collecting the yielded values.
fn drain<D: Driver>(driver: &mut D) -> Result<Vec<Snapshot>, Panic> {
	let mut values = Vec::new();

	while driver.step()? {
		values.push(driver.recv().expect("step yielded without a value"));
	}

	assert!(driver.done());

	Ok(values)
}


fn ints(values: &[i64]) -> Vec<Snapshot> {
	values.iter().map(|&int| int.into()).collect()
}


fn output(buffer: &Arc<Mutex<Vec<u8>>>) -> String {
	let buffer = buffer.lock().expect("poisoned output buffer");
	String::from_utf8_lossy(&buffer).into_owned()
}


#[test]
#[serial]
fn test_squares() {
	let mut loaded = Loaded::new(SQUARES);
	let (options, _) = Options::buffered();

	let mut coroutine = loaded.replay("squares", ints(&[4]), &options);
	let values = drain(&mut coroutine).expect("coroutine should complete");

	assert_eq!(values, ints(&[1, 4, 9, 16]));
	assert_eq!(coroutine.depth(), 0);
}


#[test]
#[serial]
fn test_squares_marshal_every_step() {
	let mut loaded = Loaded::new(SQUARES);
	let (options, _) = Options::buffered();

	let mut buffer = Vec::new();
	let mut values = Vec::new();

	// Each step runs on a new coroutine, restored from the bytes of the previous one.
	loop {
		let mut coroutine = loaded.replay("squares", ints(&[4]), &options);

		if !buffer.is_empty() {
			let read = coroutine.unmarshal(&buffer).expect("stack should unmarshal");
			assert_eq!(read, buffer.len());
		}

		if !coroutine.step().expect("step should succeed") {
			assert!(coroutine.done());
			break;
		}

		values.push(coroutine.recv().expect("missing value"));

		buffer.clear();
		coroutine.marshal_append(&mut buffer).expect("stack should marshal");
	}

	assert_eq!(values, ints(&[1, 4, 9, 16]));
}


#[test]
#[serial]
fn test_nested_calls() {
	let mut loaded = Loaded::new(SQUARES);
	let (options, _) = Options::buffered();

	let mut coroutine = loaded.replay("parent", Vec::new(), &options);

	assert!(coroutine.step().expect("step should succeed"));
	// The parent and the suspended call both hold a frame.
	assert_eq!(coroutine.depth(), 2);

	let mut values = vec![coroutine.recv().expect("missing value")];
	values.extend(drain(&mut coroutine).expect("coroutine should complete"));

	assert_eq!(values, ints(&[1, 4, 9, 16, 1, 4, 9, 16]));
}


#[test]
#[serial]
fn test_labeled_loops() {
	let mut loaded = Loaded::new(
		"func pairs() {
outer:
	for i := 0; i < 3; i++ {
		for j := 0; j < 3; j++ {
			if j == 2 {
				continue outer
			}
			if i == 2 {
				break outer
			}
			yield[int, nil](i * 10 + j)
		}
	}
	yield[int, nil](-1)
}
"
	);
	let (options, _) = Options::buffered();

	let mut replay = loaded.replay("pairs", Vec::new(), &options);
	let mut handoff = loaded.handoff("pairs", Vec::new(), &options);

	let expected = ints(&[0, 1, 10, 11, -1]);

	assert_eq!(drain(&mut replay).expect("replay should complete"), expected);
	assert_eq!(drain(&mut handoff).expect("handoff should complete"), expected);
}


#[test]
#[serial]
fn test_map_deletion_during_range() {
	let mut loaded = Loaded::new(
		"func walk() {
	m := {\"a\": 1, \"b\": 2, \"c\": 3}
	for k, v := range m {
		delete(m, \"b\")
		yield[string, nil](k)
		_ = v
	}
}
"
	);
	let (options, _) = Options::buffered();

	let expected: Vec<Snapshot> = vec!["a".into(), "c".into()];

	let mut replay = loaded.replay("walk", Vec::new(), &options);
	assert_eq!(drain(&mut replay).expect("replay should complete"), expected);

	let mut handoff = loaded.handoff("walk", Vec::new(), &options);
	assert_eq!(drain(&mut handoff).expect("handoff should complete"), expected);
}


#[test]
#[serial]
fn test_send_values() {
	let mut loaded = Loaded::new(
		"func sum() {
	total := 0
	for i := 0; i < 3; i++ {
		total += yield[int, int](i)
	}
	println(total)
}
"
	);

	for handoff in &[false, true] {
		let (options, buffer) = Options::buffered();

		let mut driver: Box<dyn Driver> =
			if *handoff {
				Box::new(loaded.handoff("sum", Vec::new(), &options))
			} else {
				Box::new(loaded.replay("sum", Vec::new(), &options))
			};

		let mut yielded = Vec::new();

		while driver.step().expect("step should succeed") {
			let value = driver.recv().expect("missing value");

			let sent = match &value {
				Snapshot::Int(int) => (int + 1) * 10,
				value => panic!("expected int, got {:?}", value),
			};

			yielded.push(value);
			driver.send(sent.into()).expect("value should be sent");
		}

		assert_eq!(yielded, ints(&[0, 1, 2]));
		assert_eq!(output(&buffer), "60\n");
	}
}


#[test]
#[serial]
fn test_cancel_runs_defers() {
	let mut loaded = Loaded::new(
		"func gen() {
	defer println(\"cleanup\")
	for i := 0; i < 100; i++ {
		yield[int, nil](i)
	}
	println(\"unreachable\")
}
"
	);

	for handoff in &[false, true] {
		let (options, buffer) = Options::buffered();

		let mut driver: Box<dyn Driver> =
			if *handoff {
				Box::new(loaded.handoff("gen", Vec::new(), &options))
			} else {
				Box::new(loaded.replay("gen", Vec::new(), &options))
			};

		assert!(driver.step().expect("step should succeed"));
		assert!(driver.step().expect("step should succeed"));
		assert_eq!(driver.recv(), Some(1.into()));
		assert_eq!(output(&buffer), "");

		driver.cancel();

		assert!(!driver.step().expect("cancellation should succeed"));
		assert!(driver.done());
		assert_eq!(output(&buffer), "cleanup\n");

		// Stepping a finished coroutine does nothing.
		assert!(!driver.step().expect("step should succeed"));
	}
}


#[test]
#[serial]
fn test_cancel_before_start() {
	let mut loaded = Loaded::new(SQUARES);
	let (options, _) = Options::buffered();

	let mut coroutine = loaded.replay("squares", ints(&[4]), &options);
	coroutine.cancel();

	assert!(!coroutine.step().expect("cancellation should succeed"));
	assert!(coroutine.done());
}


#[test]
#[serial]
fn test_panic_finishes() {
	let mut loaded = Loaded::new(
		"func divide(n int) {
	yield[int, nil](n)
	yield[int, nil](n / 0)
}
"
	);
	let (options, _) = Options::buffered();

	let mut replay = loaded.replay("divide", ints(&[3]), &options);
	assert!(replay.step().expect("step should succeed"));
	assert_matches!(replay.step(), Err(Panic::DivisionByZero { .. }));
	assert!(replay.done());

	let mut handoff = loaded.handoff("divide", ints(&[3]), &options);
	assert!(handoff.step().expect("step should succeed"));
	assert_matches!(handoff.step(), Err(Panic::DivisionByZero { .. }));
	assert!(handoff.done());
}


#[test]
#[serial]
fn test_shared_values_across_suspension() {
	let mut loaded = Loaded::new(
		"func share() {
	xs := make([]int)
	ys := xs
	push(xs, 1)
	yield[int, nil](len(ys))
	push(ys, 2)
	yield[int, nil](len(xs))
}
"
	);
	let (options, _) = Options::buffered();

	let mut buffer = Vec::new();
	let mut values = Vec::new();

	loop {
		let mut coroutine = loaded.replay("share", Vec::new(), &options);

		if !buffer.is_empty() {
			coroutine.unmarshal(&buffer).expect("stack should unmarshal");
		}

		if !coroutine.step().expect("step should succeed") {
			break;
		}

		values.push(coroutine.recv().expect("missing value"));

		buffer.clear();
		coroutine.marshal_append(&mut buffer).expect("stack should marshal");
	}

	assert_eq!(values, ints(&[1, 2]));
}


#[test]
#[serial]
fn test_plain_run() {
	let mut loaded = Loaded::new(
		"func main() {
	ch := make(chan int, 2)
	ch <- 1
	ch <- 2
	close(ch)
	for v := range ch {
		println(v)
	}

	x := 2
	switch x {
	case 1:
		println(\"one\")
	case 2:
		fallthrough
	case 3:
		println(\"two or three\")
	default:
		println(\"other\")
	}

	m := {\"b\": 2.5, \"a\": 1}
	print(m[\"a\"] + m[\"b\"], \"|\")
	println(\"a\" + \"b\", 7 % 3, -2)
}
"
	);
	let (options, buffer) = Options::buffered();

	let entry = loaded.entry("main");
	let result = super::run(&loaded.original, entry, Vec::new(), &options);

	assert_matches!(result, Ok(Value::Nil));
	assert_eq!(output(&buffer), "1\n2\ntwo or three\n3.5|ab 1 -2\n");
}


#[test]
#[serial]
fn test_yield_outside_coroutine() {
	let mut loaded = Loaded::new(SQUARES);
	let (options, _) = Options::buffered();

	let entry = loaded.entry("squares");

	let result = super::run(&loaded.original, entry, vec![Value::Int(2)], &options);
	assert_matches!(result, Err(Panic::YieldOutsideCoroutine { .. }));

	let result = super::run(&loaded.lowered, entry, vec![Value::Int(2)], &options);
	assert_matches!(result, Err(Panic::YieldOutsideCoroutine { .. }));
}


#[test]
#[serial]
fn test_runtime_panics() {
	let mut loaded = Loaded::new(
		"func index(xs []int, i int) int {
	return xs[i]
}

func key(m map[string]int) int {
	return m[\"missing\"]
}

func deep(n int) int {
	return deep(n + 1)
}
"
	);
	let (options, _) = Options::buffered();

	let entry = loaded.entry("index");
	let xs = Value::Array(super::value::Array::new(vec![Value::Int(1)]));
	let result = super::run(&loaded.original, entry, vec![xs, Value::Int(3)], &options);
	assert_matches!(result, Err(Panic::IndexOutOfBounds { .. }));

	let entry = loaded.entry("key");
	let m = Value::Dict(super::value::Dict::default());
	let result = super::run(&loaded.original, entry, vec![m], &options);
	assert_matches!(result, Err(Panic::MissingKey { .. }));

	let entry = loaded.entry("deep");
	let shallow = Options { max_depth: 16, ..options.clone() };
	let result = super::run(&loaded.original, entry, vec![Value::Int(0)], &shallow);
	assert_matches!(result, Err(Panic::StackOverflow { .. }));

	let entry = loaded.entry("index");
	let result = super::run(&loaded.original, entry, Vec::new(), &options);
	assert_matches!(result, Err(Panic::InvalidArgs { expected: 2, got: 0, .. }));
}


#[test]
#[serial]
fn test_select_default() {
	let mut loaded = Loaded::new(
		"func pick() {
	ch := make(chan int, 1)
	select {
	case v := <-ch:
		println(\"received\", v)
	default:
		println(\"empty\")
	}
	ch <- 5
	select {
	case v := <-ch:
		println(\"received\", v)
	default:
		println(\"empty\")
	}
}
"
	);
	let (options, buffer) = Options::buffered();

	let entry = loaded.entry("pick");
	let result = super::run(&loaded.original, entry, Vec::new(), &options);

	assert_matches!(result, Ok(Value::Nil));
	assert_eq!(output(&buffer), "empty\nreceived 5\n");
}


#[test]
#[serial]
fn test_defers_and_negation_across_suspension() {
	let mut loaded = Loaded::new(
		"func steps() {
	defer println(\"first\")
	defer println(\"second\")
	x := 1.5
	yield[float, nil](-x)
	big := x > 2
	println(!big, -3)
}
"
	);

	for handoff in &[false, true] {
		let (options, buffer) = Options::buffered();

		let mut driver: Box<dyn Driver> =
			if *handoff {
				Box::new(loaded.handoff("steps", Vec::new(), &options))
			} else {
				Box::new(loaded.replay("steps", Vec::new(), &options))
			};

		assert!(driver.step().expect("step should succeed"));
		assert_eq!(driver.recv(), Some(Snapshot::Float(-1.5)));

		assert!(!driver.step().expect("step should succeed"));
		assert_eq!(output(&buffer), "true -3\nsecond\nfirst\n");
	}
}


#[test]
#[serial]
fn test_channel_operands() {
	let mut loaded = Loaded::new(
		"func put(ch chan int) {
	ch <- 1
}

func take(ch chan int) int {
	return <-ch
}
"
	);
	let (options, _) = Options::buffered();

	let put = loaded.entry("put");
	let take = loaded.entry("take");

	let result = super::run(&loaded.original, put, vec![Value::Nil], &options);
	assert_matches!(result, Err(Panic::Blocked { .. }));

	let result = super::run(&loaded.original, take, vec![Value::Nil], &options);
	assert_matches!(result, Err(Panic::Blocked { .. }));

	let result = super::run(&loaded.original, put, vec![Value::Int(3)], &options);
	assert_matches!(result, Err(Panic::InvalidOperand { .. }));

	let result = super::run(&loaded.original, take, vec![Value::Int(3)], &options);
	assert_matches!(result, Err(Panic::InvalidOperand { .. }));
}
