// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

use super::*;

fn config() -> ProjectConfig {
    ProjectConfig::new("widgets", "git@example.com:org/widgets.git", PathBuf::from("/srv/fab"))
}

#[test]
fn new_project_config_uses_default_max_agents() {
    assert_eq!(config().max_agents, DEFAULT_MAX_AGENTS);
}

#[test]
fn directory_layout_is_deterministic() {
    let cfg = config();
    assert_eq!(cfg.project_dir(), PathBuf::from("/srv/fab/widgets"));
    assert_eq!(cfg.repo_dir(), PathBuf::from("/srv/fab/widgets/repo"));
    assert_eq!(cfg.worktrees_dir(), PathBuf::from("/srv/fab/widgets/worktrees"));
    assert_eq!(
        cfg.worktree_path("abc123"),
        PathBuf::from("/srv/fab/widgets/worktrees/wt-abc123")
    );
}

#[test]
fn author_allowed_defaults_to_true_with_no_list() {
    assert!(config().author_allowed("anyone"));
}

#[test]
fn author_allowed_checks_the_list_when_present() {
    let mut cfg = config();
    cfg.allowed_authors = Some(vec!["alice".to_string(), "bob".to_string()]);
    assert!(cfg.author_allowed("alice"));
    assert!(!cfg.author_allowed("mallory"));
}

#[test]
fn serde_roundtrip_fills_in_defaults() {
    let json = r#"{"name":"widgets","remote_url":"url","base_dir":"/srv"}"#;
    let cfg: ProjectConfig = serde_json::from_str(json).unwrap();
    assert_eq!(cfg.max_agents, DEFAULT_MAX_AGENTS);
    assert!(!cfg.autostart);
    assert_eq!(cfg.allowed_authors, None);
}
