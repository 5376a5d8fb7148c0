use assert_matches::assert_matches;

use super::*;
use crate::{symbol, syntax::lexer::{Cursor, Lexer}};


fn parse(input: &str) -> (Box<[ast::Item]>, Vec<Error>) {
	let mut interner = symbol::Interner::new();
	let cursor = Cursor::from(input.as_bytes());
	let tokens = Lexer::new(cursor, &mut interner)
		.map(|result| result.expect("unexpected lexical error"));

	let mut errors = Vec::new();
	let items = Parser::new(tokens, |error| errors.push(error)).parse();

	(items, errors)
}


fn body(items: &[ast::Item]) -> &[ast::Statement] {
	match items {
		[ast::Item::Function(function)] => &function.body.0,
		_ => panic!("expected a single function"),
	}
}


#[test]
fn test_function_signature() {
	let (items, errors) = parse("func f(a int, b map[string][]int) chan int {}");

	assert!(errors.is_empty());
	assert_matches!(
		&items[..],
		[ast::Item::Function(ast::Function { params, result: Some(ast::TypeExpr::Chan { .. }), .. })]
			=> assert_matches!(
				&params[..],
				[
					ast::Param { ty: ast::TypeExpr::Named { .. }, .. },
					ast::Param { ty: ast::TypeExpr::Map { .. }, .. },
				]
			)
	);
}


#[test]
fn test_for_forms() {
	let (items, errors) = parse(
		"func f() {
			for {}
			for x < 1 {}
			for i := 0; i < 3; i++ {}
			for k, v := range m {}
			for k := range m {}
			for range m {}
		}"
	);

	assert!(errors.is_empty());
	assert_matches!(
		body(&items),
		[
			ast::Statement::For { init: None, condition: None, post: None, .. },
			ast::Statement::For { init: None, condition: Some(_), post: None, .. },
			ast::Statement::For { init: Some(_), condition: Some(_), post: Some(_), .. },
			ast::Statement::Range { key: Some(_), value: Some(_), .. },
			ast::Statement::Range { key: Some(_), value: None, .. },
			ast::Statement::Range { key: None, value: None, .. },
		]
	);
}


#[test]
fn test_labels_and_branches() {
	let (items, errors) = parse(
		"func f() {
		outer:
			for {
				break outer
				continue
			}
		}"
	);

	assert!(errors.is_empty());
	assert_matches!(
		body(&items),
		[ast::Statement::Labeled { statement, .. }]
			=> assert_matches!(
				&**statement,
				ast::Statement::For { body, .. } => assert_matches!(
					&body.0[..],
					[
						ast::Statement::Break { label: Some(_), .. },
						ast::Statement::Continue { label: None, .. },
					]
				)
			)
	);
}


#[test]
fn test_switch_tags() {
	let (items, errors) = parse(
		"func f() {
			switch {}
			switch x {}
			switch v.(type) {}
			switch y := v.(type) { case int: }
		}"
	);

	assert!(errors.is_empty());
	assert_matches!(
		body(&items),
		[
			ast::Statement::Switch { tag: ast::SwitchTag::None, .. },
			ast::Statement::Switch { tag: ast::SwitchTag::Value(_), .. },
			ast::Statement::Switch { tag: ast::SwitchTag::Type { binding: None, .. }, .. },
			ast::Statement::Switch { tag: ast::SwitchTag::Type { binding: Some(_), .. }, cases, .. },
		] => assert_matches!(&cases[..], [ast::SwitchCase { guards: ast::Guards::Types(_), .. }])
	);
}


#[test]
fn test_select_comms() {
	let (items, errors) = parse(
		"func f() {
			select {
			case v := <-a:
			case w = <-b:
			case <-c:
			case d <- 1:
			default:
			}
		}"
	);

	assert!(errors.is_empty());
	assert_matches!(
		body(&items),
		[ast::Statement::Select { cases, .. }] => assert_matches!(
			&cases[..],
			[
				ast::SelectCase { comm: ast::Comm::Receive { target: ast::ReceiveTarget::Define(..), .. }, .. },
				ast::SelectCase { comm: ast::Comm::Receive { target: ast::ReceiveTarget::Assign(_), .. }, .. },
				ast::SelectCase { comm: ast::Comm::Receive { target: ast::ReceiveTarget::Discard, .. }, .. },
				ast::SelectCase { comm: ast::Comm::Send { .. }, .. },
				ast::SelectCase { comm: ast::Comm::Default, .. },
			]
		)
	);
}


#[test]
fn test_precedence() {
	let (items, errors) = parse("func f() { x = 1 + 2 * 3 < 4 || !y }");

	assert!(errors.is_empty());
	assert_matches!(
		body(&items),
		[ast::Statement::Assign { value: ast::Expr::BinaryOp { op: ast::BinaryOp::Or, left, .. }, .. }]
			=> assert_matches!(
				&**left,
				ast::Expr::BinaryOp { op: ast::BinaryOp::Lower, left, .. } => assert_matches!(
					&**left,
					ast::Expr::BinaryOp { op: ast::BinaryOp::Plus, .. }
				)
			)
	);
}


#[test]
fn test_recovery() {
	let (items, errors) = parse(
		"func broken() { x := }
		func fine() {}
		type T = int"
	);

	assert_eq!(errors.len(), 1);
	assert_eq!(items.len(), 2);
}
