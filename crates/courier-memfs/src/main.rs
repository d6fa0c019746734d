//! Binary entry point for the `memfs` courier worker.
//!
//! Delegates to [`courier_memfs::run`]; the protocol owns stdout.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stderr = io::stderr().lock();
    courier_memfs::run(std::env::args_os(), &mut stderr)
}
