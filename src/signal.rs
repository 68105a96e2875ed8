//! SIGINT handling. The handler only raises a flag; the interpreter notices
//! it where it blocks (reading a line, waiting on children), since the
//! handler is installed without `SA_RESTART` and those calls fail with
//! `EINTR`.

use std::sync::atomic::{AtomicBool, Ordering};

use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal};

use crate::error::ShellError;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_sigint(_: libc::c_int) {
	INTERRUPTED.store(true, Ordering::SeqCst);
}

#[derive(Debug)]
pub struct SignalController {
	mask: SigSet,
}

impl SignalController {
	pub fn install() -> Result<SignalController, ShellError> {
		let mut mask = SigSet::empty();
		mask.add(Signal::SIGINT);
		let action = SigAction::new(SigHandler::Handler(on_sigint), SaFlags::empty(), mask);
		unsafe { signal::sigaction(Signal::SIGINT, &action) }.map_err(ShellError::sys("sigaction error"))?;
		Ok(SignalController { mask })
	}

	/// Holds SIGINT back until the returned guard unblocks it.
	pub fn block(&self) -> Result<BlockGuard, ShellError> {
		let mut previous = SigSet::empty();
		signal::sigprocmask(SigmaskHow::SIG_BLOCK, Some(&self.mask), Some(&mut previous))
			.map_err(ShellError::sys("sigprocmask error"))?;
		Ok(BlockGuard { previous, armed: true })
	}

	/// Clears and returns the pending-interrupt flag.
	pub fn take_interrupt(&self) -> bool {
		INTERRUPTED.swap(false, Ordering::SeqCst)
	}
}

/// Puts SIGPIPE back to its default action, which the Rust runtime
/// ignores and `exec` would otherwise pass on to every program we start.
pub fn reset_for_exec() -> nix::Result<()> {
	unsafe { signal::signal(Signal::SIGPIPE, SigHandler::SigDfl) }.map(drop)
}

/// The mask that was active before [`SignalController::block`].
#[derive(Debug)]
pub struct BlockGuard {
	previous: SigSet,
	armed: bool,
}

impl BlockGuard {
	/// Reinstates the saved mask without disarming the guard; a forked
	/// child calls this before it touches any descriptor.
	pub fn unblock(&self) -> nix::Result<()> {
		signal::sigprocmask(SigmaskHow::SIG_SETMASK, Some(&self.previous), None)
	}

	pub fn release(mut self) -> Result<(), ShellError> {
		self.armed = false;
		self.unblock().map_err(ShellError::sys("sigprocmask error"))
	}
}

impl Drop for BlockGuard {
	fn drop(&mut self) {
		if self.armed {
			let _ = self.unblock();
		}
	}
}
