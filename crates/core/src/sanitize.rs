// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Name sanitization for anything that becomes a path component or an
//! argument to an external command (tmux targets, marker filenames).

/// Replace every character outside `[A-Za-z0-9_.\-]` with `_`.
///
/// Applied to session identifiers and agent names before they reach external
/// commands or the filesystem.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') { c } else { '_' })
        .collect()
}

#[cfg(test)]
#[path = "sanitize_tests.rs"]
mod tests;
