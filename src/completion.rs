//! # Shell Completion Module
//!
//! This module provides shell completion functionality for Cadence:
//! - Generation of completion scripts for various shells
//! - Dynamic completion of member ids from the database
//!
//! ## Usage
//!
//! ```bash
//! # Generate bash completions
//! cadence completion bash > ~/.local/share/bash-completion/completions/cadence
//!
//! # Generate zsh completions
//! cadence completion zsh > ~/.config/zsh/completions/_cadence
//! ```

use crate::config;
use crate::db;
use anyhow::Result;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io;

/// Generate shell completions for the given shell
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

/// Convert our Shell enum to clap_complete's Shell enum
pub fn shell_to_completion_shell(shell: &crate::cli::Shell) -> CompletionShell {
    match shell {
        crate::cli::Shell::Bash => CompletionShell::Bash,
        crate::cli::Shell::Zsh => CompletionShell::Zsh,
        crate::cli::Shell::Fish => CompletionShell::Fish,
        crate::cli::Shell::PowerShell => CompletionShell::PowerShell,
        crate::cli::Shell::Elvish => CompletionShell::Elvish,
    }
}

/// Get member ids available for completion of `--user` arguments.
///
/// Returns an empty list rather than an error when the database is missing
/// or unreadable, so completion never breaks the shell.
pub fn get_member_completions() -> Result<Vec<String>> {
    let db_path = match config::get_db_path() {
        Ok(path) => path,
        Err(_) => return Ok(Vec::new()),
    };

    if !db_path.exists() {
        return Ok(Vec::new());
    }

    let conn = match db::connect(&db_path) {
        Ok(conn) => conn,
        Err(_) => return Ok(Vec::new()),
    };

    match db::load_members(&conn) {
        Ok(members) => {
            let mut ids: Vec<String> = members.into_iter().map(|m| m.user_id).collect();
            ids.sort();
            Ok(ids)
        }
        Err(_) => Ok(Vec::new()),
    }
}

/// Print member id completions, one per line.
/// This is used by shell completion systems to get dynamic completions.
pub fn print_member_completions() -> Result<()> {
    for id in get_member_completions()? {
        println!("{id}");
    }
    Ok(())
}
