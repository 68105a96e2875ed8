use std::ffi::{CString, OsStr};
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::*;

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum ParseError {
	#[error("invalid null command")]
	NullCommand,
	#[error("bad input redirection")]
	BadInput,
	#[error("bad output redirection")]
	BadOutput,
	#[error("ambiguous input")]
	AmbiguousInput,
	#[error("ambiguous output")]
	AmbiguousOutput,
	#[error("unterminated quote")]
	UnterminatedQuote,
	#[error("invalid null byte")]
	NulByte,
}

type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Default)]
struct Command {
	words: Vec<Vec<u8>>,
	input: Option<Vec<u8>>,
	output: Option<Vec<u8>>,
}

struct Parser<'a> {
	line: &'a [u8],
	i: usize,
}

impl<'a> Parser<'a> {
	fn proceed_while<F>(&mut self, f: F) where F: Fn(u8) -> bool {
		while let Some(c) = self.line.get(self.i) {
			if !f(*c) { break; }
			self.i += 1;
		}
	}

	fn is_whitespace(c: u8) -> bool {
		matches!(c, b' ' | b'\t' | b'\n' | b'\r')
	}

	fn is_letter(c: u8) -> bool {
		match c {
			b'>' | b'<' | b'|' | b'"' => false,
			_ => !Parser::is_whitespace(c),
		}
	}

	fn skip_whitespaces(&mut self) {
		self.proceed_while(Parser::is_whitespace);
	}

	fn peek(&self) -> Option<u8> {
		self.line.get(self.i).copied()
	}

	/// Reads one word, gluing quoted runs onto bare runs (`a"b c"d` is `ab cd`).
	/// `None` means no word starts here; `Some(vec![])` is an explicit `""`.
	fn read_word(&mut self) -> ParseResult<Option<Vec<u8>>> {
		let mut word = vec![];
		let mut seen = false;
		loop {
			let orig = self.i;
			self.proceed_while(Parser::is_letter);
			if self.i > orig {
				word.extend_from_slice(&self.line[orig .. self.i]);
				seen = true;
			}
			if self.peek() != Some(b'"') {
				break;
			}
			self.i += 1;
			let start = self.i;
			self.proceed_while(|c| c != b'"');
			if self.i >= self.line.len() {
				return Err(ParseError::UnterminatedQuote);
			}
			word.extend_from_slice(&self.line[start .. self.i]);
			self.i += 1;
			seen = true;
		}
		Ok(if seen { Some(word) } else { None })
	}

	fn parse_redirect(&mut self, slot: &mut Option<Vec<u8>>, err: ParseError) -> ParseResult<()> {
		self.i += 1;
		self.skip_whitespaces();
		let target = self.read_word()?.filter(|t| !t.is_empty()).ok_or(err)?;
		if slot.is_some() {
			return Err(err);
		}
		*slot = Some(target);
		Ok(())
	}

	fn parse_command(&mut self) -> ParseResult<Command> {
		let mut command = Command::default();
		loop {
			self.skip_whitespaces();
			match self.peek() {
				Some(b'<') => self.parse_redirect(&mut command.input, ParseError::BadInput)?,
				Some(b'>') => self.parse_redirect(&mut command.output, ParseError::BadOutput)?,
				Some(b'|') | None => break,
				Some(_) => {
					if let Some(word) = self.read_word()? {
						command.words.push(word);
					}
				},
			}
		}
		if command.words.is_empty() {
			return Err(ParseError::NullCommand);
		}
		Ok(command)
	}

	fn parse_pipeline(&mut self) -> ParseResult<Option<Pipeline>> {
		self.skip_whitespaces();
		if self.peek().is_none() {
			return Ok(None);
		}

		let mut commands: Vec<Command> = vec![];
		loop {
			commands.push(self.parse_command()?);
			match self.peek() {
				Some(b'|') => { self.i += 1; },
				_ => { break; },
			}
		}

		let last = commands.len() - 1;
		let mut stages = Vec::with_capacity(commands.len());
		for (i, command) in commands.into_iter().enumerate() {
			if command.input.is_some() && i != 0 {
				return Err(ParseError::AmbiguousInput);
			}
			if command.output.is_some() && i != last {
				return Err(ParseError::AmbiguousOutput);
			}
			stages.push(build_stage(command)?);
		}
		Ok(Some(Pipeline { stages }))
	}
}

fn to_path(bytes: Vec<u8>) -> PathBuf {
	PathBuf::from(OsStr::from_bytes(&bytes))
}

fn build_stage(command: Command) -> ParseResult<Stage> {
	let argv = command.words.into_iter()
		.map(CString::new)
		.collect::<Result<Vec<CString>, _>>()
		.map_err(|_| ParseError::NulByte)?;
	Ok(Stage {
		argv,
		input: command.input.map(to_path),
		output: command.output.map(to_path),
	})
}

/// Splits one logical line into a pipeline. A blank line yields `Ok(None)`.
pub fn parse(line: &[u8]) -> ParseResult<Option<Pipeline>> {
	if line.contains(&0) {
		return Err(ParseError::NulByte);
	}
	let mut parser = Parser { line, i: 0 };
	parser.parse_pipeline()
}
