use std::ffi::CString;
use std::path::PathBuf;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Stage {
	/// `argv[0]` is the program name; never empty.
	pub argv: Vec<CString>,
	pub input: Option<PathBuf>,
	pub output: Option<PathBuf>,
}

impl Stage {
	pub fn name(&self) -> &[u8] {
		self.argv[0].as_bytes()
	}

	pub fn arguments(&self) -> &[CString] {
		&self.argv[1..]
	}
}

/// One parsed command line. Input redirection may only sit on the first
/// stage and output redirection only on the last; the parser enforces both.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Pipeline {
	pub stages: Vec<Stage>,
}

impl Pipeline {
	pub fn len(&self) -> usize {
		self.stages.len()
	}

	pub fn is_empty(&self) -> bool {
		self.stages.is_empty()
	}

	pub fn first(&self) -> &Stage {
		&self.stages[0]
	}
}
