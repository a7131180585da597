// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn passes_clean_names_through() {
    assert_eq!(sanitize_name("builder-1"), "builder-1");
    assert_eq!(sanitize_name("ovs_scout.2"), "ovs_scout.2");
}

#[test]
fn replaces_shell_metacharacters() {
    assert_eq!(sanitize_name("a;rm -rf /"), "a_rm_-rf__");
    assert_eq!(sanitize_name("x$(id)"), "x__id_");
    assert_eq!(sanitize_name("a/b"), "a_b");
}

#[test]
fn replaces_unicode() {
    assert_eq!(sanitize_name("bölder"), "b_lder");
}

#[test]
fn empty_stays_empty() {
    assert_eq!(sanitize_name(""), "");
}
