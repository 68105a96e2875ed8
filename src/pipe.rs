use std::os::fd::{AsRawFd, IntoRawFd, OwnedFd, RawFd};

use nix::fcntl::OFlag;
use nix::unistd;

use crate::error::ShellError;

#[derive(Debug)]
pub struct Pipe {
	pub read: OwnedFd,
	pub write: OwnedFd,
}

/// The pipes joining adjacent stages: pipe `i` carries stage `i`'s output
/// to stage `i + 1`. Dropping the set closes whatever is still open;
/// [`PipeSet::close`] does the same but reports failures.
#[derive(Debug)]
pub struct PipeSet {
	pipes: Vec<Pipe>,
}

impl PipeSet {
	/// Creates `stages - 1` close-on-exec pipes.
	pub fn allocate(stages: usize) -> Result<PipeSet, ShellError> {
		let count = stages.saturating_sub(1);
		let mut pipes = Vec::with_capacity(count);
		for _ in 0 .. count {
			let (read, write) = unistd::pipe2(OFlag::O_CLOEXEC).map_err(ShellError::sys("problem creating pipes"))?;
			pipes.push(Pipe { read, write });
		}
		Ok(PipeSet { pipes })
	}

	pub fn len(&self) -> usize {
		self.pipes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.pipes.is_empty()
	}

	pub fn read_end(&self, i: usize) -> RawFd {
		self.pipes[i].read.as_raw_fd()
	}

	pub fn write_end(&self, i: usize) -> RawFd {
		self.pipes[i].write.as_raw_fd()
	}

	#[cfg(test)]
	fn raw_fds(&self) -> Vec<RawFd> {
		self.pipes.iter().flat_map(|p| [p.read.as_raw_fd(), p.write.as_raw_fd()]).collect()
	}

	/// Closes both ends of every pipe, each exactly once.
	pub fn close(self) -> nix::Result<()> {
		let mut result = Ok(());
		for fd in self.pipes.into_iter().flat_map(|p| [p.write, p.read]) {
			// after a failure the remaining ends are closed on drop
			if result.is_ok() {
				result = unistd::close(fd.into_raw_fd());
			}
		}
		result
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use nix::fcntl::{fcntl, FcntlArg, FdFlag};
	use serial_test::serial;

	#[test]
	#[serial]
	fn allocates_one_pipe_per_boundary() {
		assert_eq!(PipeSet::allocate(1).unwrap().len(), 0);
		assert!(PipeSet::allocate(1).unwrap().is_empty());
		assert_eq!(PipeSet::allocate(4).unwrap().len(), 3);
	}

	#[test]
	#[serial]
	fn pipes_are_close_on_exec() {
		let pipes = PipeSet::allocate(2).unwrap();
		for fd in pipes.raw_fds() {
			let flags = FdFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFD).unwrap());
			assert!(flags.contains(FdFlag::FD_CLOEXEC));
		}
	}

	#[test]
	#[serial]
	fn close_releases_every_descriptor() {
		let pipes = PipeSet::allocate(3).unwrap();
		let fds = pipes.raw_fds();
		assert_eq!(fds.len(), 4);
		pipes.close().unwrap();
		for fd in fds {
			assert_eq!(fcntl(fd, FcntlArg::F_GETFD), Err(nix::errno::Errno::EBADF));
		}
	}
}
