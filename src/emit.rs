//! Generated files: the lowered program rendered as source, under a header that marks it
//! as generated, and an optional build constraint.

use std::{
	fs,
	io,
	path::Path,
};

use regex::Regex;

use crate::{fmt, semantic::Program, symbol};


pub const HEADER: &str = "// Code generated by corolla. DO NOT EDIT.";

/// The name of generated files when none is given. Files by this name are never inputs.
pub const DEFAULT_OUTPUT: &str = "corolla_generated.co";


#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid build tags {tags:?}: {reason}")]
pub struct TagError {
	pub tags: Box<str>,
	pub reason: &'static str,
}


/// Render the generated file of a lowered program.
pub fn render(program: &Program, tags: Option<&str>, interner: &symbol::Interner) -> String {
	let mut out = String::new();

	out.push_str(HEADER);
	out.push('\n');

	if let Some(tags) = tags {
		out.push_str("//corolla:build ");
		out.push_str(tags);
		out.push('\n');
	}

	out.push('\n');
	out.push_str(&fmt::Show(program, interner).to_string());

	out
}


pub fn write(path: &Path, contents: &str) -> io::Result<()> {
	fs::write(path, contents)?;

	tracing::info!(target: "corolla::emit", path = %path.display(), bytes = contents.len(), "wrote");

	Ok(())
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
	Tag(&'a str),
	Not,
	And,
	Or,
	Open,
	Close,
}


/// Validate a build tag expression: tags combined with `!`, `&&`, `||` and parentheses,
/// where tags are letters, digits, underscores and dots.
pub fn validate_tags(tags: &str) -> Result<(), TagError> {
	let error = |reason| TagError { tags: tags.into(), reason };

	let tokens = tokenize(tags).ok_or_else(|| error("unexpected character"))?;

	if tokens.is_empty() {
		return Err(error("empty expression"));
	}

	let mut parser = TagParser { tokens: &tokens, ix: 0 };

	parser.or().map_err(error)?;

	if parser.ix != tokens.len() {
		return Err(error("unexpected token"));
	}

	Ok(())
}


fn tokenize(tags: &str) -> Option<Vec<Token>> {
	let token = Regex::new(r"^\s*(?:(\(|\)|&&|\|\||!)|([\w.]+))")
		.expect("invalid tag token regex");

	let mut tokens = Vec::new();
	let mut rest = tags;

	while !rest.trim_start().is_empty() {
		let captures = token.captures(rest)?;
		let whole = captures.get(0)?;

		let token = match (captures.get(1), captures.get(2)) {
			(Some(operator), _) => match operator.as_str() {
				"(" => Token::Open,
				")" => Token::Close,
				"&&" => Token::And,
				"||" => Token::Or,
				_ => Token::Not,
			},

			(None, Some(tag)) => Token::Tag(tag.as_str()),

			(None, None) => return None,
		};

		tokens.push(token);
		rest = &rest[whole.end() ..];
	}

	Some(tokens)
}


/// Recursive descent over the tag grammar, from the lowest precedence.
struct TagParser<'t, 'a> {
	tokens: &'t [Token<'a>],
	ix: usize,
}


impl<'t, 'a> TagParser<'t, 'a> {
	fn eat(&mut self, token: Token) -> bool {
		if self.tokens.get(self.ix) == Some(&token) {
			self.ix += 1;
			true
		} else {
			false
		}
	}


	fn or(&mut self) -> Result<(), &'static str> {
		self.and()?;

		while self.eat(Token::Or) {
			self.and()?;
		}

		Ok(())
	}


	fn and(&mut self) -> Result<(), &'static str> {
		self.unary()?;

		while self.eat(Token::And) {
			self.unary()?;
		}

		Ok(())
	}


	fn unary(&mut self) -> Result<(), &'static str> {
		let token = self.tokens.get(self.ix).copied();
		self.ix += 1;

		match token {
			Some(Token::Not) => self.unary(),

			Some(Token::Open) => {
				self.or()?;

				if self.eat(Token::Close) {
					Ok(())
				} else {
					Err("unbalanced parentheses")
				}
			}

			Some(Token::Tag(_)) => Ok(()),

			Some(_) => Err("expected a tag"),

			None => Err("unexpected end of expression"),
		}
	}
}


#[cfg(test)]
mod tests {
	use std::path::Path;

	use assert_matches::assert_matches;

	use super::*;
	use crate::{compile, semantic, syntax};


	#[test]
	fn test_valid_tags() {
		for tags in &["linux", "linux && amd64", "!windows", "(linux || darwin) && !cgo", " go1.18 "] {
			assert_eq!(validate_tags(tags), Ok(()), "{}", tags);
		}
	}


	#[test]
	fn test_invalid_tags() {
		for tags in &["", "linux &&", "&& linux", "(linux", "linux)", "linux amd64", "linux & amd64", "a-b"] {
			assert_matches!(validate_tags(tags), Err(TagError { .. }), "{}", tags);
		}
	}


	#[test]
	fn test_render() {
		let mut interner = symbol::Interner::new();
		let path = Path::new("<test>");

		let source = syntax::Source::from_str(
			path,
			"func squares(n int) {\n\tfor i := 1; i <= n; i++ {\n\t\tyield[int, nil](i * i)\n\t}\n}\n",
		);
		let analysis = syntax::Analysis::analyze(source, &mut interner);
		assert!(analysis.is_ok());

		let program = semantic::analyze(path, vec![analysis.ast], &mut interner)
			.unwrap_or_else(|_| panic!("program should analyze"));
		let lowered = compile::compile(&program).unwrap_or_else(|_| panic!("program should compile"));

		let generated = render(&lowered, Some("linux && !cgo"), &interner);
		let mut lines = generated.lines();

		assert_eq!(lines.next(), Some(HEADER));
		assert_eq!(lines.next(), Some("//corolla:build linux && !cgo"));
		assert_eq!(lines.next(), Some(""));
		assert!(generated.contains("func squares"));

		let untagged = render(&lowered, None, &interner);
		assert!(untagged.starts_with(&format!("{}\n\n", HEADER)));
	}
}
