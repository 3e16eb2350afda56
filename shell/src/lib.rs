//! A small interactive shell: simple commands, one `|`, `<`/`>` redirection,
//! trailing `&`, `NAME=value` variables, `!n` history recall and `if` blocks.
//!
//! [`eval::Executor`] does the process work with fork/exec/wait, and
//! [`job::JobTable`] tracks what it left running in the background.

pub mod builtin;
pub mod cond;
pub mod config;
pub mod eval;
pub mod global;
pub mod history;
pub mod job;
pub mod logging;
pub mod parser;
pub mod repl;
pub mod types;
pub mod vars;
