//! A small pipeline interpreter: reads command lines such as
//! `sort < in | uniq -c | head > out`, runs every stage as its own process
//! wired together with pipes, and waits for all of them before the next line.
//! `cd` is the only builtin.

pub mod builtin;
pub mod config;
pub mod error;
pub mod eval;
pub mod global;
pub mod job;
pub mod parser;
pub mod pipe;
pub mod reader;
pub mod shell;
pub mod signal;
pub mod types;

pub use error::ShellError;
pub use shell::Shell;
