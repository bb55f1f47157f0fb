// Library root for the command-line front end, so integration tests can
// drive a run without spawning the binary.

pub mod config;
pub mod export;
pub mod load;
pub mod run;
