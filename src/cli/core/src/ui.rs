/* src/cli/core/src/ui.rs */

// Human-facing output for the `run` driver. The worker never prints here:
// its stdout is the protocol channel.

#![allow(clippy::print_stdout)]

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn ok(msg: &str) {
  println!("  {GREEN}\u{2713}{RESET} {msg}");
}

pub fn fail(msg: &str) {
  println!("  {RED}\u{2717}{RESET} {msg}");
}

pub fn arrow(msg: &str) {
  println!("  {GREEN}\u{2192}{RESET} {msg}");
}

pub fn detail(msg: &str) {
  println!("        {msg}");
}

/// `[done/total]` line printed for every tick.
pub fn progress(done: usize, total: usize) {
  println!("  {DIM}[{done}/{total}]{RESET} routes exported");
}

pub fn banner(cmd: &str) {
  println!();
  println!("  {BOLD}SeamJS{RESET} {cmd} {DIM}v{VERSION}{RESET}");
  println!();
}

pub fn blank() {
  println!();
}
