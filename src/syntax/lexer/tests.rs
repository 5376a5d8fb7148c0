use assert_matches::assert_matches;

use super::*;


fn lex(input: &str, interner: &mut symbol::Interner) -> Vec<Result<Token, Error>> {
	let cursor = Cursor::from(input.as_bytes());
	Lexer::new(cursor, interner).collect()
}


#[test]
fn test_simple_function() {
	let input = r#"
		func foo(bar int, baz string) int {
			if bar >= 10 && baz != nil { // here's a comment
				result := do_something(bar)
				return result
			}
			x <- yield[int, string](bar)
		}
	"#;

	let mut interner = symbol::Interner::new();
	let cursor = Cursor::from(input.as_bytes());
	let mut lexer = Lexer::new(cursor, &mut interner);
	let mut symbols = Vec::new();

	macro_rules! assert_token {
		($token_kind:pat) => {
			assert_matches!(lexer.next(), Some(Ok(Token { kind: $token_kind, .. })))
		};

		($token_kind:pat => $arm:expr) => {
			assert_matches!(lexer.next(), Some(Ok(Token { kind: $token_kind, .. })) => $arm)
		};
	}

	macro_rules! assert_ident {
		($expected:literal) => {
			assert_token!(TokenKind::Identifier(symbol) => symbols.push((symbol, $expected)))
		};
	}

	assert_token!(TokenKind::Keyword(Keyword::Func));
	assert_ident!("foo");
	assert_token!(TokenKind::OpenParens);
	assert_ident!("bar");
	assert_ident!("int");
	assert_token!(TokenKind::Comma);
	assert_ident!("baz");
	assert_ident!("string");
	assert_token!(TokenKind::CloseParens);
	assert_ident!("int");
	assert_token!(TokenKind::OpenBrace);
	assert_token!(TokenKind::Keyword(Keyword::If));
	assert_ident!("bar");
	assert_token!(TokenKind::Operator(Operator::GreaterEquals));
	assert_token!(TokenKind::Literal(Literal::Int(10)));
	assert_token!(TokenKind::Operator(Operator::And));
	assert_ident!("baz");
	assert_token!(TokenKind::Operator(Operator::NotEquals));
	assert_token!(TokenKind::Literal(Literal::Nil));
	assert_token!(TokenKind::OpenBrace);
	assert_ident!("result");
	assert_token!(TokenKind::Operator(Operator::Define));
	assert_ident!("do_something");
	assert_token!(TokenKind::OpenParens);
	assert_ident!("bar");
	assert_token!(TokenKind::CloseParens);
	assert_token!(TokenKind::Semicolon);
	assert_token!(TokenKind::Keyword(Keyword::Return));
	assert_ident!("result");
	assert_token!(TokenKind::Semicolon);
	assert_token!(TokenKind::CloseBrace);
	assert_token!(TokenKind::Semicolon);
	assert_ident!("x");
	assert_token!(TokenKind::Operator(Operator::Arrow));
	assert_token!(TokenKind::Keyword(Keyword::Yield));
	assert_token!(TokenKind::OpenBracket);
	assert_ident!("int");
	assert_token!(TokenKind::Comma);
	assert_ident!("string");
	assert_token!(TokenKind::CloseBracket);
	assert_token!(TokenKind::OpenParens);
	assert_ident!("bar");
	assert_token!(TokenKind::CloseParens);
	assert_token!(TokenKind::Semicolon);
	assert_token!(TokenKind::CloseBrace);
	assert_token!(TokenKind::Semicolon);
	assert_matches!(lexer.next(), None);

	drop(lexer);

	for (symbol, expected) in symbols {
		assert_eq!(interner.resolve(symbol), Some(expected.as_bytes()));
	}
}


#[test]
fn test_operators() {
	let mut interner = symbol::Interner::new();
	let tokens = lex("a += 1; b--; c %= 2; d := e <= f || !g; h <- i", &mut interner);

	let kinds: Vec<TokenKind> = tokens
		.into_iter()
		.map(|token| token.expect("unexpected lexical error").kind)
		.filter(|kind| matches!(kind, TokenKind::Operator(_)))
		.collect();

	assert_eq!(
		kinds,
		vec![
			TokenKind::Operator(Operator::AssignOp(ArithOp::Plus)),
			TokenKind::Operator(Operator::Decrement),
			TokenKind::Operator(Operator::AssignOp(ArithOp::Mod)),
			TokenKind::Operator(Operator::Define),
			TokenKind::Operator(Operator::LowerEquals),
			TokenKind::Operator(Operator::Or),
			TokenKind::Operator(Operator::Not),
			TokenKind::Operator(Operator::Arrow),
		]
	);
}


#[test]
fn test_literals() {
	let mut interner = symbol::Interner::new();
	let tokens = lex(r#"1 2.5 1e3 "a\tb\"" true"#, &mut interner);

	assert_matches!(
		&tokens[..],
		[
			Ok(Token { kind: TokenKind::Literal(Literal::Int(1)), .. }),
			Ok(Token { kind: TokenKind::Literal(Literal::Float(_)), .. }),
			Ok(Token { kind: TokenKind::Literal(Literal::Float(_)), .. }),
			Ok(Token { kind: TokenKind::Literal(Literal::String(string)), .. }),
			Ok(Token { kind: TokenKind::Literal(Literal::True), .. }),
			Ok(Token { kind: TokenKind::Semicolon, .. }),
		] => assert_eq!(&string[..], b"a\tb\"")
	);
}


#[test]
fn test_number_literals() {
	let mut interner = symbol::Interner::new();
	let tokens = lex("0xff 0o17 0b101 1_000 0 2.5e-1 7.", &mut interner);

	let ints: Vec<i64> = tokens
		.iter()
		.filter_map(|token| match token {
			Ok(Token { kind: TokenKind::Literal(Literal::Int(int)), .. }) => Some(*int),
			_ => None,
		})
		.collect();
	assert_eq!(ints, [255, 15, 5, 1000, 0]);

	let floats: Vec<f64> = tokens
		.iter()
		.filter_map(|token| match token {
			Ok(Token { kind: TokenKind::Literal(Literal::Float(float)), .. }) => Some(*float),
			_ => None,
		})
		.collect();
	assert_eq!(floats, [0.25, 7.0]);

	for invalid in &["0x", "1e", "1__0", "0b2", "99999999999999999999", "2.y"] {
		let tokens = lex(invalid, &mut interner);
		assert!(tokens.iter().any(Result::is_err), "{}", invalid);
	}
}


#[test]
fn test_literal_display() {
	assert_eq!(Literal::String(b"a\n"[..].into()).to_string(), r#""a\n""#);
	assert_eq!(Literal::String(b"a\xffb"[..].into()).to_string().to_lowercase(), r#""a\xffb""#);
	assert_eq!(Literal::Float(7.0).to_string(), "7.0");
}


#[test]
fn test_semicolon_insertion() {
	let mut interner = symbol::Interner::new();
	let tokens = lex("x = [\n\t1,\n\t2,\n]\ny++\n", &mut interner);

	let semicolons = tokens
		.iter()
		.filter(|token| matches!(token, Ok(Token { kind: TokenKind::Semicolon, .. })))
		.count();

	// After `]` and after `++`, but never after the commas or the opening bracket.
	assert_eq!(semicolons, 2);
}


#[test]
fn test_invalid_tokens() {
	let mut interner = symbol::Interner::new();
	let tokens = lex("a & b $ \"\\q\" 1.x", &mut interner);

	let errors: Vec<ErrorKind> = tokens
		.into_iter()
		.filter_map(Result::err)
		.map(|error| error.error)
		.collect();

	assert_matches!(
		&errors[..],
		[
			ErrorKind::Unexpected(b'&'),
			ErrorKind::Unexpected(b'$'),
			ErrorKind::InvalidEscapeSequence(_),
			ErrorKind::Unexpected(b'x'),
		]
	);
}


#[test]
fn test_unterminated_string() {
	let mut interner = symbol::Interner::new();
	let tokens = lex("\"abc", &mut interner);

	assert_matches!(
		&tokens[..],
		[Err(Error { error: ErrorKind::UnexpectedEof, .. })]
	);
}
