//! Parse command

use pinhash_core::command::parse_command;

/// Print each segment of `command` and the package it installs, if any.
pub fn parse(command: &str) {
    let segments = parse_command(command);
    if segments.is_empty() {
        println!("(empty command)");
        return;
    }

    for (segment, spec) in segments {
        println!("{segment}");
        match spec {
            Some(spec) => println!("  -> {spec}"),
            None => println!("  -> not resolvable"),
        }
    }
}
