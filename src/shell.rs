use std::io::{self, Read, Write};

use crate::builtin;
use crate::error::ShellError;
use crate::eval;
use crate::global;
use crate::parser;
use crate::reader::{LineReader, ReadLine};
use crate::signal::SignalController;

pub const PROMPT: &str = "8-P ";

/// The read-parse-run loop around one input source. Prompts go to `out`;
/// diagnostics always go to standard error.
pub struct Shell<R, W> {
	state: global::State,
	reader: LineReader<R>,
	out: W,
	signals: SignalController,
}

impl<R: Read, W: Write> Shell<R, W> {
	pub fn new(state: global::State, input: R, out: W, signals: SignalController) -> Shell<R, W> {
		Shell { state, reader: LineReader::new(input), out, signals }
	}

	pub fn state(&self) -> &global::State {
		&self.state
	}

	pub fn into_output(self) -> W {
		self.out
	}

	/// Prints the prompt when interactive; `fresh_line` first ends whatever
	/// line the ^C echo left behind.
	fn prompt(&mut self, fresh_line: bool) {
		if !self.state.interactive {
			return;
		}
		if fresh_line {
			let _ = self.out.write_all(b"\n");
		}
		let _ = self.out.write_all(PROMPT.as_bytes());
		let _ = self.out.flush();
	}

	/// Runs one command line. Returns whether SIGINT cut the run short.
	pub fn execute_line(&mut self, line: &[u8]) -> Result<bool, ShellError> {
		let pipeline = match parser::parse(line) {
			Ok(Some(pipeline)) => pipeline,
			Ok(None) => return Ok(false),
			Err(e) => {
				let _ = writeln!(&mut io::stderr(), "{}", e);
				return Ok(false);
			},
		};

		let first = pipeline.first();
		if let Some(builtin) = builtin::match_builtin(first.name()) {
			if pipeline.len() == 1 {
				builtin(&mut self.state, first.arguments())?;
			} else {
				let _ = writeln!(&mut io::stderr(), "{}: not supported in a pipeline", String::from_utf8_lossy(first.name()));
			}
			return Ok(false);
		}

		let reaped = eval::run_pipeline(&self.state, &pipeline, &self.signals)?;
		Ok(reaped.interrupted)
	}

	/// Loops until end of input. Only fatal conditions come back as `Err`.
	pub fn run(&mut self) -> Result<(), ShellError> {
		self.prompt(false);
		loop {
			// a SIGINT that landed while the prompt was being written
			if self.signals.take_interrupt() {
				self.prompt(true);
			}
			let line = match self.reader.read_line().map_err(ShellError::Read)? {
				ReadLine::Line(line) => line,
				ReadLine::Interrupted => {
					self.signals.take_interrupt();
					self.prompt(true);
					continue;
				},
				ReadLine::Eof => break,
			};
			let interrupted = self.execute_line(&line)? | self.signals.take_interrupt();
			self.prompt(interrupted);
		}
		if self.state.interactive {
			let _ = self.out.write_all(b"\n");
			let _ = self.out.flush();
		}
		Ok(())
	}
}
