use std::io::{self, Read};

const CHUNK: usize = 4096;

#[derive(Debug, PartialEq, Eq)]
pub enum ReadLine {
	Line(Vec<u8>),
	/// A signal arrived while blocked; the partial line was dropped.
	Interrupted,
	Eof,
}

/// Reads logical lines of unbounded length. A backslash right before a
/// newline joins the next physical line onto the current one.
///
/// Reads go straight to `R::read` so that `EINTR` surfaces as
/// [`ReadLine::Interrupted`] instead of being retried.
pub struct LineReader<R> {
	inner: R,
	buf: Vec<u8>,
	pos: usize,
	eof: bool,
}

impl<R: Read> LineReader<R> {
	pub fn new(inner: R) -> LineReader<R> {
		LineReader { inner, buf: Vec::with_capacity(CHUNK), pos: 0, eof: false }
	}

	fn fill(&mut self) -> io::Result<usize> {
		self.buf.drain(.. self.pos);
		self.pos = 0;
		let len = self.buf.len();
		self.buf.resize(len + CHUNK, 0);
		let r = self.inner.read(&mut self.buf[len ..]);
		let n = *r.as_ref().unwrap_or(&0);
		self.buf.truncate(len + n);
		r
	}

	pub fn read_line(&mut self) -> io::Result<ReadLine> {
		let mut line: Vec<u8> = vec![];
		loop {
			let pending = &self.buf[self.pos ..];
			if let Some(nl) = pending.iter().position(|&c| c == b'\n') {
				line.extend_from_slice(&pending[.. nl]);
				self.pos += nl + 1;
				if line.last() == Some(&b'\\') {
					line.pop();
					continue;
				}
				return Ok(ReadLine::Line(line));
			}
			line.extend_from_slice(pending);
			self.pos = self.buf.len();

			if self.eof {
				return Ok(if line.is_empty() { ReadLine::Eof } else { ReadLine::Line(line) });
			}
			match self.fill() {
				Ok(0) => { self.eof = true; },
				Ok(_) => {},
				Err(ref e) if e.kind() == io::ErrorKind::Interrupted => return Ok(ReadLine::Interrupted),
				Err(e) => return Err(e),
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	fn line(s: &str) -> ReadLine {
		ReadLine::Line(s.as_bytes().to_vec())
	}

	/// Hands out its script one step at a time; `None` is an `EINTR`.
	struct Scripted(Vec<Option<&'static [u8]>>);

	impl Read for Scripted {
		fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
			if self.0.is_empty() {
				return Ok(0);
			}
			match self.0.remove(0) {
				Some(chunk) => {
					buf[.. chunk.len()].copy_from_slice(chunk);
					Ok(chunk.len())
				},
				None => Err(io::Error::from(io::ErrorKind::Interrupted)),
			}
		}
	}

	#[test]
	fn splits_lines_and_reports_eof() {
		let mut r = LineReader::new(Cursor::new(b"ls\n\ncat a | wc\n".to_vec()));
		assert_eq!(r.read_line().unwrap(), line("ls"));
		assert_eq!(r.read_line().unwrap(), line(""));
		assert_eq!(r.read_line().unwrap(), line("cat a | wc"));
		assert_eq!(r.read_line().unwrap(), ReadLine::Eof);
		assert_eq!(r.read_line().unwrap(), ReadLine::Eof);
	}

	#[test]
	fn last_line_without_newline() {
		let mut r = LineReader::new(Cursor::new(b"echo hi".to_vec()));
		assert_eq!(r.read_line().unwrap(), line("echo hi"));
		assert_eq!(r.read_line().unwrap(), ReadLine::Eof);
	}

	#[test]
	fn backslash_newline_continues() {
		let mut r = LineReader::new(Cursor::new(b"echo a \\\nb \\\n| wc\nnext\n".to_vec()));
		assert_eq!(r.read_line().unwrap(), line("echo a b | wc"));
		assert_eq!(r.read_line().unwrap(), line("next"));
	}

	#[test]
	fn long_lines_span_many_reads() {
		let long = "x".repeat(CHUNK * 3 + 17);
		let mut r = LineReader::new(Cursor::new(format!("{}\nshort\n", long).into_bytes()));
		assert_eq!(r.read_line().unwrap(), line(&long));
		assert_eq!(r.read_line().unwrap(), line("short"));
	}

	#[test]
	fn interruption_drops_partial_line() {
		let mut r = LineReader::new(Scripted(vec![Some(b"partial"), None, Some(b"ls\n")]));
		assert_eq!(r.read_line().unwrap(), ReadLine::Interrupted);
		assert_eq!(r.read_line().unwrap(), line("ls"));
		assert_eq!(r.read_line().unwrap(), ReadLine::Eof);
	}

	#[test]
	fn other_errors_propagate() {
		struct Broken;
		impl Read for Broken {
			fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
				Err(io::Error::from(io::ErrorKind::PermissionDenied))
			}
		}
		let mut r = LineReader::new(Broken);
		assert_eq!(r.read_line().unwrap_err().kind(), io::ErrorKind::PermissionDenied);
	}
}
