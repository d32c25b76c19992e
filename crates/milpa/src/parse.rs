//! Lexer and recursive-descent parser producing the [`Node`] tree of a milpa
//! program.
//!
//! The parser implements exactly the statement grammar of the language: one
//! statement per line, `:=` binding a loop variable to a set, `a : b`
//! denoting the closed integer range, and additive and multiplicative chains
//! associating to the left. `#` starts a comment running to the end of the
//! line.

use thiserror::Error;

use crate::{
	ast::{Func, Node, NodeKind, Op, Origin},
	IntVal, ObjSense, VarKind,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Errors that can occur when parsing a milpa source program.
pub enum ParseError {
	#[error("integer literal out of range ({origin})")]
	/// An integer literal did not fit the parameter integer type.
	NumberOverflow {
		/// Position of the literal.
		origin: Origin,
	},
	#[error("unexpected character `{found}' ({origin})")]
	/// The lexer encountered a character outside the language.
	UnexpectedChar {
		/// The offending character.
		found: char,
		/// Position of the character.
		origin: Origin,
	},
	#[error("expected {expected}, found {found} ({origin})")]
	/// The parser encountered a token that does not fit the grammar.
	UnexpectedToken {
		/// Description of what the grammar allows at this position.
		expected: &'static str,
		/// Description of the token that was found.
		found: String,
		/// Position of the token.
		origin: Origin,
	},
}

/// The keywords of the language.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Keyword {
	/// `bin` variable kind.
	Bin,
	/// `constr` statement head.
	Constr,
	/// `cont` variable kind.
	Cont,
	/// `forall` quantifier.
	Forall,
	/// `int` variable kind.
	Int,
	/// `max` objective sense.
	Max,
	/// `min` objective sense.
	Min,
	/// `ndarray` allocation call.
	Ndarray,
	/// `obj` statement head.
	Obj,
	/// `sum` quantifier.
	Sum,
	/// `var` statement head.
	Var,
}

/// The recursive-descent parser state over the token stream.
struct Parser {
	/// The token stream, always terminated by [`TokenKind::Eof`].
	tokens: Vec<Token>,
	/// Index of the next token to consume.
	pos: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// A lexed token and its source position.
struct Token {
	/// The kind of the token.
	kind: TokenKind,
	/// The source position of the token.
	origin: Origin,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(
	variant_size_differences,
	reason = "`Iden` carries its name inline"
)]
/// The kinds of token produced by the lexer.
enum TokenKind {
	/// `:=`
	Bind,
	/// `:`
	Colon,
	/// `,`
	Comma,
	/// End of input.
	Eof,
	/// `==`
	EqEq,
	/// `=`
	Equal,
	/// `>=`
	Ge,
	/// `>`
	Gt,
	/// An identifier.
	Iden(String),
	/// A keyword.
	Keyword(Keyword),
	/// `[`
	LBracket,
	/// `<=`
	Le,
	/// `(`
	LParen,
	/// `<`
	Lt,
	/// `-`
	Minus,
	/// `!=`
	Ne,
	/// End of a statement line.
	Newline,
	/// An integer literal.
	Number(IntVal),
	/// `+`
	Plus,
	/// `]`
	RBracket,
	/// `)`
	RParen,
	/// `/`
	Slash,
	/// `*`
	Star,
}

/// Parse a milpa source program into its [`Node`] tree.
pub fn parse(source: &str) -> Result<Node, ParseError> {
	let tokens = tokenize(source)?;
	Parser { tokens, pos: 0 }.root()
}

/// Consume a `=` continuation of a two-character operator, if present.
fn eat_eq(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) -> bool {
	if let Some(&(_, '=')) = chars.peek() {
		let _ = chars.next();
		true
	} else {
		false
	}
}

/// Lex a milpa source program into a token stream terminated by
/// [`TokenKind::Eof`].
fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
	let mut tokens = Vec::new();
	let mut last_line = 0;
	for (line_idx, line_text) in source.lines().enumerate() {
		let line = line_idx + 1;
		last_line = line;
		let origin = |column0: usize| Origin {
			line,
			column: column0 + 1,
			line_text: line_text.to_owned(),
		};
		let line_start = tokens.len();
		let mut chars = line_text.char_indices().peekable();
		while let Some(&(i, c)) = chars.peek() {
			match c {
				' ' | '\t' => {
					let _ = chars.next();
				}
				'#' => break,
				_ if c.is_ascii_digit() => {
					let mut end = i;
					while let Some(&(j, d)) = chars.peek() {
						if d.is_ascii_digit() {
							end = j;
							let _ = chars.next();
						} else {
							break;
						}
					}
					let value: IntVal = line_text[i..=end]
						.parse()
						.map_err(|_| ParseError::NumberOverflow { origin: origin(i) })?;
					tokens.push(Token {
						kind: TokenKind::Number(value),
						origin: origin(i),
					});
				}
				_ if c.is_ascii_alphabetic() || c == '_' => {
					let mut end = i;
					while let Some(&(j, d)) = chars.peek() {
						if d.is_ascii_alphanumeric() || d == '_' {
							end = j;
							let _ = chars.next();
						} else {
							break;
						}
					}
					let kind = match &line_text[i..=end] {
						"bin" => TokenKind::Keyword(Keyword::Bin),
						"constr" => TokenKind::Keyword(Keyword::Constr),
						"cont" => TokenKind::Keyword(Keyword::Cont),
						"forall" => TokenKind::Keyword(Keyword::Forall),
						"int" => TokenKind::Keyword(Keyword::Int),
						"max" => TokenKind::Keyword(Keyword::Max),
						"min" => TokenKind::Keyword(Keyword::Min),
						"ndarray" => TokenKind::Keyword(Keyword::Ndarray),
						"obj" => TokenKind::Keyword(Keyword::Obj),
						"sum" => TokenKind::Keyword(Keyword::Sum),
						"var" => TokenKind::Keyword(Keyword::Var),
						name => TokenKind::Iden(name.to_owned()),
					};
					tokens.push(Token {
						kind,
						origin: origin(i),
					});
				}
				_ => {
					let _ = chars.next();
					let kind = match c {
						'(' => TokenKind::LParen,
						')' => TokenKind::RParen,
						'[' => TokenKind::LBracket,
						']' => TokenKind::RBracket,
						',' => TokenKind::Comma,
						'+' => TokenKind::Plus,
						'-' => TokenKind::Minus,
						'*' => TokenKind::Star,
						'/' => TokenKind::Slash,
						':' => {
							if eat_eq(&mut chars) {
								TokenKind::Bind
							} else {
								TokenKind::Colon
							}
						}
						'=' => {
							if eat_eq(&mut chars) {
								TokenKind::EqEq
							} else {
								TokenKind::Equal
							}
						}
						'<' => {
							if eat_eq(&mut chars) {
								TokenKind::Le
							} else {
								TokenKind::Lt
							}
						}
						'>' => {
							if eat_eq(&mut chars) {
								TokenKind::Ge
							} else {
								TokenKind::Gt
							}
						}
						'!' if eat_eq(&mut chars) => TokenKind::Ne,
						_ => {
							return Err(ParseError::UnexpectedChar {
								found: c,
								origin: origin(i),
							})
						}
					};
					tokens.push(Token {
						kind,
						origin: origin(i),
					});
				}
			}
		}
		if tokens.len() > line_start {
			tokens.push(Token {
				kind: TokenKind::Newline,
				origin: origin(line_text.len()),
			});
		}
	}
	tokens.push(Token {
		kind: TokenKind::Eof,
		origin: Origin {
			line: last_line + 1,
			column: 1,
			line_text: String::new(),
		},
	});
	Ok(tokens)
}

impl Parser {
	/// Parse the additive level of the expression grammar
	/// (left-associative).
	fn add_expr(&mut self) -> Result<Node, ParseError> {
		let mut node = self.mul_expr()?;
		loop {
			let op = match self.peek_kind(0) {
				TokenKind::Plus => Op::Add,
				TokenKind::Minus => Op::Sub,
				_ => break,
			};
			let tok = self.bump();
			let rhs = self.mul_expr()?;
			node = Node::new(NodeKind::Op(op), vec![node, rhs], tok.origin);
		}
		Ok(node)
	}

	/// Parse a base expression: a parenthesised expression, a slice, an
	/// identifier, or an integer literal.
	fn base_expr(&mut self) -> Result<Node, ParseError> {
		match self.peek_kind(0) {
			TokenKind::LParen => {
				let open = self.bump();
				let inner = self.expr()?;
				let _ = self.expect(TokenKind::RParen, "`)'")?;
				Ok(Node::new(NodeKind::Op(Op::Paren), vec![inner], open.origin))
			}
			TokenKind::Iden(_) => {
				let iden = self.iden()?;
				if *self.peek_kind(0) == TokenKind::LBracket {
					let mut children = vec![iden];
					while *self.peek_kind(0) == TokenKind::LBracket {
						let _ = self.bump();
						children.push(self.add_expr()?);
						let _ = self.expect(TokenKind::RBracket, "`]'")?;
					}
					let origin = children[0].origin.clone();
					Ok(Node::new(NodeKind::Op(Op::Slice), children, origin))
				} else {
					Ok(iden)
				}
			}
			TokenKind::Number(value) => {
				let value = *value;
				let tok = self.bump();
				Ok(Node::new(NodeKind::Value(value), Vec::new(), tok.origin))
			}
			_ => Err(self.unexpected("an expression")),
		}
	}

	/// Parse one quantifier block: `( iter (, iter | predicate)* )`.
	fn block(&mut self) -> Result<Node, ParseError> {
		let open = self.expect(TokenKind::LParen, "a quantifier block")?;
		let mut items = vec![self.iter_expr()?];
		while *self.peek_kind(0) == TokenKind::Comma {
			let _ = self.bump();
			if self.iter_ahead() {
				items.push(self.iter_expr()?);
			} else {
				items.push(self.comp_expr()?);
			}
		}
		let _ = self.expect(TokenKind::RParen, "`)'")?;
		Ok(Node::new(NodeKind::Block, items, open.origin))
	}

	/// Whether the next tokens open another quantifier block
	/// (`'(' IDEN ':='`).
	fn block_ahead(&self) -> bool {
		*self.peek_kind(0) == TokenKind::LParen
			&& matches!(self.peek_kind(1), TokenKind::Iden(_))
			&& *self.peek_kind(2) == TokenKind::Bind
	}

	/// Consume and return the next token. The final [`TokenKind::Eof`] token
	/// is never consumed.
	fn bump(&mut self) -> Token {
		let tok = self.tokens[self.pos].clone();
		if tok.kind != TokenKind::Eof {
			self.pos += 1;
		}
		tok
	}

	/// Parse the comparison level of the expression grammar: an additive
	/// expression optionally followed by one comparison.
	fn comp_expr(&mut self) -> Result<Node, ParseError> {
		let lhs = self.add_expr()?;
		let op = match self.peek_kind(0) {
			TokenKind::EqEq => Op::Eq,
			TokenKind::Ge => Op::Ge,
			TokenKind::Gt => Op::Gt,
			TokenKind::Le => Op::Le,
			TokenKind::Lt => Op::Lt,
			TokenKind::Ne => Op::Ne,
			_ => return Ok(lhs),
		};
		let tok = self.bump();
		let rhs = self.add_expr()?;
		Ok(Node::new(NodeKind::Op(op), vec![lhs, rhs], tok.origin))
	}

	/// Consume a token of the given kind or fail with a description of what
	/// was expected.
	fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token, ParseError> {
		if self.tokens[self.pos].kind == kind {
			Ok(self.bump())
		} else {
			Err(self.unexpected(expected))
		}
	}

	/// Parse a full expression: a quantifier application or a comparison
	/// expression.
	fn expr(&mut self) -> Result<Node, ParseError> {
		let func = match self.peek_kind(0) {
			TokenKind::Keyword(Keyword::Forall) => Func::Forall,
			TokenKind::Keyword(Keyword::Sum) => Func::Sum,
			_ => return self.comp_expr(),
		};
		let tok = self.bump();
		let mut blocks = vec![self.block()?];
		while self.block_ahead() {
			blocks.push(self.block()?);
		}
		let body = self.expr()?;
		let mut children = vec![body];
		children.extend(blocks);
		Ok(Node::new(NodeKind::Func(func), children, tok.origin))
	}

	/// Consume an identifier token into an identifier node.
	fn iden(&mut self) -> Result<Node, ParseError> {
		match self.peek_kind(0) {
			TokenKind::Iden(name) => {
				let name = name.clone();
				let tok = self.bump();
				Ok(Node::new(NodeKind::Iden(name), Vec::new(), tok.origin))
			}
			_ => Err(self.unexpected("an identifier")),
		}
	}

	/// Whether the next tokens form a loop binding (`IDEN ':='`).
	fn iter_ahead(&self) -> bool {
		matches!(self.peek_kind(0), TokenKind::Iden(_)) && *self.peek_kind(1) == TokenKind::Bind
	}

	/// Parse one loop binding `name := set`.
	fn iter_expr(&mut self) -> Result<Node, ParseError> {
		let name = self.iden()?;
		let _ = self.expect(TokenKind::Bind, "`:='")?;
		let set = self.set_expr()?;
		let origin = name.origin.clone();
		Ok(Node::new(NodeKind::Op(Op::Iter), vec![name, set], origin))
	}

	/// Parse the multiplicative level of the expression grammar
	/// (left-associative).
	fn mul_expr(&mut self) -> Result<Node, ParseError> {
		let mut node = self.base_expr()?;
		loop {
			let op = match self.peek_kind(0) {
				TokenKind::Star => Op::Mul,
				TokenKind::Slash => Op::Div,
				_ => break,
			};
			let tok = self.bump();
			let rhs = self.base_expr()?;
			node = Node::new(NodeKind::Op(op), vec![node, rhs], tok.origin);
		}
		Ok(node)
	}

	/// Peek at the kind of the token `offset` positions ahead without
	/// consuming anything.
	fn peek_kind(&self, offset: usize) -> &TokenKind {
		let idx = (self.pos + offset).min(self.tokens.len() - 1);
		&self.tokens[idx].kind
	}

	/// Parse the newline-separated statement list of a program.
	fn root(&mut self) -> Result<Node, ParseError> {
		let mut statements = Vec::new();
		self.skip_newlines();
		while *self.peek_kind(0) != TokenKind::Eof {
			statements.push(self.statement()?);
			match self.peek_kind(0) {
				TokenKind::Newline => self.skip_newlines(),
				TokenKind::Eof => {}
				_ => return Err(self.unexpected("end of statement")),
			}
		}
		Ok(Node::new(NodeKind::Root, statements, Origin::default()))
	}

	/// Parse a set expression: a closed range `a : b` or a bare identifier.
	fn set_expr(&mut self) -> Result<Node, ParseError> {
		let first = self.add_expr()?;
		if *self.peek_kind(0) == TokenKind::Colon {
			let colon = self.bump();
			let second = self.add_expr()?;
			Ok(Node::new(
				NodeKind::Op(Op::Range),
				vec![first, second],
				colon.origin,
			))
		} else if matches!(first.kind, NodeKind::Iden(_)) {
			Ok(first)
		} else {
			Err(ParseError::UnexpectedToken {
				expected: "a range or a set identifier",
				found: first.describe(),
				origin: first.origin,
			})
		}
	}

	/// Skip any run of newline tokens.
	fn skip_newlines(&mut self) {
		while *self.peek_kind(0) == TokenKind::Newline {
			let _ = self.bump();
		}
	}

	/// Parse one statement: `var`, `obj`, or `constr`.
	fn statement(&mut self) -> Result<Node, ParseError> {
		match self.peek_kind(0) {
			TokenKind::Keyword(Keyword::Var) => {
				let head = self.bump();
				let kind = match self.peek_kind(0) {
					TokenKind::Keyword(Keyword::Bin) => VarKind::Binary,
					TokenKind::Keyword(Keyword::Cont) => VarKind::Continuous,
					TokenKind::Keyword(Keyword::Int) => VarKind::Integer,
					_ => return Err(self.unexpected("`cont', `int', or `bin'")),
				};
				let _ = self.bump();
				let name = self.iden()?;
				let _ = self.expect(TokenKind::Equal, "`='")?;
				let rhs = self.var_expr()?;
				Ok(Node::new(
					NodeKind::Var(kind),
					vec![name, rhs],
					head.origin,
				))
			}
			TokenKind::Keyword(Keyword::Obj) => {
				let head = self.bump();
				let sense = match self.peek_kind(0) {
					TokenKind::Keyword(Keyword::Max) => ObjSense::Maximize,
					TokenKind::Keyword(Keyword::Min) => ObjSense::Minimize,
					_ => return Err(self.unexpected("`min' or `max'")),
				};
				let _ = self.bump();
				let expr = self.expr()?;
				Ok(Node::new(NodeKind::Obj(sense), vec![expr], head.origin))
			}
			TokenKind::Keyword(Keyword::Constr) => {
				let head = self.bump();
				let expr = self.expr()?;
				Ok(Node::new(NodeKind::Constr, vec![expr], head.origin))
			}
			_ => Err(self.unexpected("`var', `obj', or `constr'")),
		}
	}

	/// Construct an [`ParseError::UnexpectedToken`] for the current token.
	fn unexpected(&self, expected: &'static str) -> ParseError {
		let tok = &self.tokens[self.pos];
		ParseError::UnexpectedToken {
			expected,
			found: tok.kind.describe(),
			origin: tok.origin.clone(),
		}
	}

	/// Parse the right-hand side of a `var` statement: an `ndarray` call
	/// with one or more shape expressions.
	fn var_expr(&mut self) -> Result<Node, ParseError> {
		let call = self.expect(TokenKind::Keyword(Keyword::Ndarray), "`ndarray'")?;
		let _ = self.expect(TokenKind::LParen, "`('")?;
		let mut shape = vec![self.base_expr()?];
		while *self.peek_kind(0) == TokenKind::Comma {
			let _ = self.bump();
			shape.push(self.base_expr()?);
		}
		let _ = self.expect(TokenKind::RParen, "`)'")?;
		Ok(Node::new(
			NodeKind::Func(Func::Ndarray),
			shape,
			call.origin,
		))
	}
}

impl TokenKind {
	/// A short human-readable description of the token, used in diagnostics.
	fn describe(&self) -> String {
		match self {
			TokenKind::Bind => "`:='".to_owned(),
			TokenKind::Colon => "`:'".to_owned(),
			TokenKind::Comma => "`,'".to_owned(),
			TokenKind::Eof => "end of input".to_owned(),
			TokenKind::EqEq => "`=='".to_owned(),
			TokenKind::Equal => "`='".to_owned(),
			TokenKind::Ge => "`>='".to_owned(),
			TokenKind::Gt => "`>'".to_owned(),
			TokenKind::Iden(name) => format!("identifier `{name}'"),
			TokenKind::Keyword(kw) => format!("keyword `{kw:?}'").to_lowercase(),
			TokenKind::LBracket => "`['".to_owned(),
			TokenKind::Le => "`<='".to_owned(),
			TokenKind::LParen => "`('".to_owned(),
			TokenKind::Lt => "`<'".to_owned(),
			TokenKind::Minus => "`-'".to_owned(),
			TokenKind::Ne => "`!='".to_owned(),
			TokenKind::Newline => "newline".to_owned(),
			TokenKind::Number(value) => format!("number {value}"),
			TokenKind::Plus => "`+'".to_owned(),
			TokenKind::RBracket => "`]'".to_owned(),
			TokenKind::RParen => "`)'".to_owned(),
			TokenKind::Slash => "`/'".to_owned(),
			TokenKind::Star => "`*'".to_owned(),
		}
	}
}

#[cfg(test)]
mod tests {
	use crate::{
		ast::{Func, Node, NodeKind, Op},
		parse::{parse, ParseError},
		ObjSense, VarKind,
	};

	/// Parse a source fragment and return the single statement of the
	/// program.
	fn statement(source: &str) -> Node {
		let root = parse(source).unwrap();
		assert_eq!(root.children.len(), 1);
		root.children.into_iter().next().unwrap()
	}

	#[test]
	fn test_parse_add_left_associative() {
		let stmt = statement("obj min a - b + c");
		assert_eq!(stmt.kind, NodeKind::Obj(ObjSense::Minimize));
		let add = &stmt.children[0];
		assert_eq!(add.kind, NodeKind::Op(Op::Add));
		let sub = &add.children[0];
		assert_eq!(sub.kind, NodeKind::Op(Op::Sub));
		assert_eq!(sub.children[0].kind, NodeKind::Iden("a".to_owned()));
		assert_eq!(sub.children[1].kind, NodeKind::Iden("b".to_owned()));
		assert_eq!(add.children[1].kind, NodeKind::Iden("c".to_owned()));
	}

	#[test]
	fn test_parse_blocks_and_predicates() {
		let stmt = statement("constr forall (i := n, i != 0) (j := n, j != 0, j != i) x[i][j] <= 1");
		let forall = &stmt.children[0];
		assert_eq!(forall.kind, NodeKind::Func(Func::Forall));
		// children are [body, block, block]
		assert_eq!(forall.children.len(), 3);
		assert_eq!(forall.children[0].kind, NodeKind::Op(Op::Le));
		let first = &forall.children[1];
		assert_eq!(first.kind, NodeKind::Block);
		assert_eq!(first.children.len(), 2);
		assert_eq!(first.children[0].kind, NodeKind::Op(Op::Iter));
		assert_eq!(first.children[1].kind, NodeKind::Op(Op::Ne));
		let second = &forall.children[2];
		assert_eq!(second.children.len(), 3);
	}

	#[test]
	fn test_parse_body_swallows_comparison() {
		// Without parentheses the trailing comparison belongs to the
		// quantifier body.
		let stmt = statement("constr forall (i := n) x[i] <= 1");
		let forall = &stmt.children[0];
		assert_eq!(forall.kind, NodeKind::Func(Func::Forall));
		assert_eq!(forall.children[0].kind, NodeKind::Op(Op::Le));
	}

	#[test]
	fn test_parse_comments_and_blank_lines() {
		let root = parse("# model\n\nobj min x\n\n# done\n").unwrap();
		assert_eq!(root.children.len(), 1);
	}

	#[test]
	fn test_parse_missing_bind_in_block() {
		let err = parse("constr forall (i : n) x").unwrap_err();
		assert!(matches!(err, ParseError::UnexpectedToken { .. }));
	}

	#[test]
	fn test_parse_mul_precedence() {
		let stmt = statement("obj min a + b * c");
		let add = &stmt.children[0];
		assert_eq!(add.kind, NodeKind::Op(Op::Add));
		assert_eq!(add.children[1].kind, NodeKind::Op(Op::Mul));
	}

	#[test]
	fn test_parse_number_overflow() {
		let err = parse("obj min 99999999999999999999999").unwrap_err();
		assert!(matches!(err, ParseError::NumberOverflow { .. }));
	}

	#[test]
	fn test_parse_parenthesised_sum_comparison() {
		let stmt = statement("constr (sum (i := I) w[i] * x[i]) <= c");
		let le = &stmt.children[0];
		assert_eq!(le.kind, NodeKind::Op(Op::Le));
		let paren = &le.children[0];
		assert_eq!(paren.kind, NodeKind::Op(Op::Paren));
		assert_eq!(paren.children[0].kind, NodeKind::Func(Func::Sum));
	}

	#[test]
	fn test_parse_range_binding() {
		let stmt = statement("constr forall (k := 2 : 4) x[0] <= 1");
		let forall = &stmt.children[0];
		let block = &forall.children[1];
		let iter = &block.children[0];
		assert_eq!(iter.kind, NodeKind::Op(Op::Iter));
		assert_eq!(iter.children[0].kind, NodeKind::Iden("k".to_owned()));
		assert_eq!(iter.children[1].kind, NodeKind::Op(Op::Range));
	}

	#[test]
	fn test_parse_slice_indices_are_expressions() {
		let stmt = statement("obj min a[i + 1][j]");
		let slice = &stmt.children[0];
		assert_eq!(slice.kind, NodeKind::Op(Op::Slice));
		assert_eq!(slice.children.len(), 3);
		assert_eq!(slice.children[1].kind, NodeKind::Op(Op::Add));
	}

	#[test]
	fn test_parse_unexpected_character() {
		let err = parse("obj min a ; b").unwrap_err();
		assert!(matches!(
			err,
			ParseError::UnexpectedChar { found: ';', .. }
		));
	}

	#[test]
	fn test_parse_var_statement() {
		let stmt = statement("var bin x = ndarray (V, V)");
		assert_eq!(stmt.kind, NodeKind::Var(VarKind::Binary));
		assert_eq!(stmt.children[0].kind, NodeKind::Iden("x".to_owned()));
		let rhs = &stmt.children[1];
		assert_eq!(rhs.kind, NodeKind::Func(Func::Ndarray));
		assert_eq!(rhs.children.len(), 2);
	}

	#[test]
	fn test_parse_var_rejects_plain_expression() {
		let err = parse("var bin x = 5").unwrap_err();
		assert!(matches!(err, ParseError::UnexpectedToken { .. }));
	}

	#[test]
	fn test_parse_line_origin() {
		let root = parse("obj min x\nconstr y <= 1").unwrap();
		assert_eq!(root.children[1].origin.line, 2);
		assert_eq!(root.children[1].origin.column, 1);
	}
}
