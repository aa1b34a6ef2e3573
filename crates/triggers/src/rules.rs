//! Trigger rules: which events fire which Jenkins endpoint.
//!
//! A [`Trigger`] carries one optional [`ConditionBlock`] per supported event
//! kind. A block matches when the event is *allowed* by its repository list or
//! its branch list, and *not excluded* by either exclude list. Allow lists form
//! a union; either exclude list alone vetoes.
//!
//! Branch lists (allow and exclude) are only consulted for `push` events.
//! The name `"*"` matches any repository or branch.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::{EventKind, NormalizedEvent};
use crate::EndpointId;

/// Matches any repository, branch, or pull request action.
pub const WILDCARD: &str = "*";

// ---------------------------------------------------------------------------
// Rule shapes
// ---------------------------------------------------------------------------

/// A repository entry, optionally narrowed to some of its branches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRule {
    /// Repository name or `"*"`.
    pub name: String,
    /// Branches within the repository. Absent or empty means all branches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branches: Option<Vec<String>>,
}

/// A branch entry, optionally narrowed to some repositories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRule {
    /// Branch name or `"*"`.
    pub name: String,
    /// Repositories the branch applies to. Absent or empty means all repositories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repositories: Option<Vec<String>>,
}

/// Allow and deny rules for one event kind.
///
/// `None` and `Some(vec![])` differ only for `actions`: an absent action list
/// lets every action through, an empty one lets none through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repositories: Option<Vec<RepositoryRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branches: Option<Vec<BranchRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_repositories: Option<Vec<RepositoryRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_branches: Option<Vec<BranchRule>>,
    /// Pull request actions; ignored for other event kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
}

/// Condition blocks keyed by event kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push: Option<ConditionBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<ConditionBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<ConditionBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<ConditionBlock>,
}

impl EventConditions {
    /// Returns the block configured for `kind`, if any.
    pub fn for_kind(&self, kind: &EventKind) -> Option<&ConditionBlock> {
        match kind {
            EventKind::Push => self.push.as_ref(),
            EventKind::PullRequest => self.pull_request.as_ref(),
            EventKind::Create => self.create.as_ref(),
            EventKind::Delete => self.delete.as_ref(),
            EventKind::Ping | EventKind::Other(_) => None,
        }
    }
}

/// Binds an event-matching policy to one Jenkins endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// Endpoint invoked when the trigger matches.
    pub endpoint: EndpointId,
    #[serde(default)]
    pub events: EventConditions,
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

impl Trigger {
    /// Decides whether `event` should fire this trigger.
    pub fn matches(&self, event: &NormalizedEvent) -> bool {
        if event.repository.is_empty() {
            return false;
        }

        let is_push = event.kind == EventKind::Push;
        if is_push && event.branch.is_empty() {
            return false;
        }

        let Some(block) = self.events.for_kind(&event.kind) else {
            return false;
        };

        if event.kind == EventKind::PullRequest && !block.allows_action(&event.action) {
            return false;
        }

        block.matches(&event.repository, &event.branch, is_push)
    }
}

impl ConditionBlock {
    /// `true` when no action list is configured, or `action` is listed (or
    /// `"*"` is). An empty `action` never passes a configured list.
    pub fn allows_action(&self, action: &str) -> bool {
        let Some(actions) = &self.actions else {
            return true;
        };
        if action.is_empty() {
            return false;
        }
        actions.iter().any(|a| a == action || a == WILDCARD)
    }

    fn matches(&self, repository: &str, branch: &str, branch_rules_apply: bool) -> bool {
        let in_repos = self
            .repositories
            .as_deref()
            .is_some_and(|rules| any_repository_rule(rules, repository, branch));

        let in_branches = branch_rules_apply
            && self
                .branches
                .as_deref()
                .is_some_and(|rules| any_branch_rule(rules, branch, repository));

        let in_exclude_repos = self
            .exclude_repositories
            .as_deref()
            .is_some_and(|rules| any_repository_rule(rules, repository, branch));

        let in_exclude_branches = branch_rules_apply
            && self
                .exclude_branches
                .as_deref()
                .is_some_and(|rules| any_branch_rule(rules, branch, repository));

        (in_repos || in_branches) && !in_exclude_repos && !in_exclude_branches
    }
}

fn any_repository_rule(rules: &[RepositoryRule], repository: &str, branch: &str) -> bool {
    rules.iter().any(|rule| {
        if rule.name != repository && rule.name != WILDCARD {
            return false;
        }
        match rule.branches.as_deref() {
            None | Some([]) => {
                debug!(rule = %rule.name, "Found repository");
                true
            }
            Some(branches) => {
                let hit = branches.iter().any(|b| b == branch);
                if hit {
                    debug!(rule = %rule.name, branch, "Found branch in repository");
                }
                hit
            }
        }
    })
}

fn any_branch_rule(rules: &[BranchRule], branch: &str, repository: &str) -> bool {
    rules.iter().any(|rule| {
        if rule.name != branch && rule.name != WILDCARD {
            return false;
        }
        match rule.repositories.as_deref() {
            None | Some([]) => {
                debug!(rule = %rule.name, "Found branch");
                true
            }
            Some(repositories) => {
                let hit = repositories.iter().any(|r| r == repository);
                if hit {
                    debug!(rule = %rule.name, repository, "Found repository in branch");
                }
                hit
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: EventKind, repository: &str, branch: &str, action: &str) -> NormalizedEvent {
        NormalizedEvent {
            kind,
            repository: repository.to_string(),
            branch: branch.to_string(),
            git_ref: format!("refs/heads/{branch}"),
            action: action.to_string(),
        }
    }

    fn push(repository: &str, branch: &str) -> NormalizedEvent {
        event(EventKind::Push, repository, branch, "")
    }

    fn repo(name: &str, branches: &[&str]) -> RepositoryRule {
        RepositoryRule {
            name: name.to_string(),
            branches: Some(branches.iter().map(|b| b.to_string()).collect()),
        }
    }

    fn branch(name: &str, repositories: &[&str]) -> BranchRule {
        BranchRule {
            name: name.to_string(),
            repositories: Some(repositories.iter().map(|r| r.to_string()).collect()),
        }
    }

    fn trigger(events: EventConditions) -> Trigger {
        Trigger {
            endpoint: EndpointId::new("deploy").unwrap(),
            events,
        }
    }

    fn push_trigger(block: ConditionBlock) -> Trigger {
        trigger(EventConditions {
            push: Some(block),
            ..Default::default()
        })
    }

    // ── Preconditions ────────────────────────────────────────────────────────

    #[test]
    fn empty_repository_never_matches() {
        let t = push_trigger(ConditionBlock {
            repositories: Some(vec![repo("*", &[])]),
            branches: Some(vec![branch("*", &[])]),
            ..Default::default()
        });

        assert!(!t.matches(&push("", "main")));
        assert!(!t.matches(&event(EventKind::Create, "", "main", "")));
    }

    #[test]
    fn push_without_branch_never_matches() {
        let t = push_trigger(ConditionBlock {
            repositories: Some(vec![repo("*", &[])]),
            ..Default::default()
        });

        assert!(!t.matches(&push("app", "")));
    }

    #[test]
    fn missing_block_for_kind_never_matches() {
        let t = push_trigger(ConditionBlock {
            repositories: Some(vec![repo("*", &[])]),
            ..Default::default()
        });

        assert!(!t.matches(&event(EventKind::Create, "app", "main", "")));
        assert!(!t.matches(&event(EventKind::Other("issues".into()), "app", "main", "")));
    }

    #[test]
    fn block_without_allow_lists_matches_nothing() {
        let t = push_trigger(ConditionBlock::default());

        assert!(!t.matches(&push("app", "main")));
    }

    // ── Repository allow list ────────────────────────────────────────────────

    #[test]
    fn wildcard_repository_matches_any_repository() {
        let t = push_trigger(ConditionBlock {
            repositories: Some(vec![RepositoryRule {
                name: "*".into(),
                branches: None,
            }]),
            ..Default::default()
        });

        assert!(t.matches(&push("app", "main")));
        assert!(t.matches(&push("anything-else", "develop")));
    }

    #[test]
    fn repository_branch_sublist_narrows_match() {
        let t = push_trigger(ConditionBlock {
            repositories: Some(vec![repo("app", &["main", "release"])]),
            ..Default::default()
        });

        assert!(t.matches(&push("app", "main")));
        assert!(t.matches(&push("app", "release")));
        assert!(!t.matches(&push("app", "develop")));
        assert!(!t.matches(&push("other", "main")));
    }

    #[test]
    fn empty_branch_sublist_means_all_branches() {
        let t = push_trigger(ConditionBlock {
            repositories: Some(vec![repo("app", &[])]),
            ..Default::default()
        });

        assert!(t.matches(&push("app", "whatever")));
    }

    // ── Branch allow list ────────────────────────────────────────────────────

    #[test]
    fn branch_list_is_a_union_with_repository_list() {
        let t = push_trigger(ConditionBlock {
            repositories: Some(vec![repo("app", &["main"])]),
            branches: Some(vec![branch("hotfix", &[])]),
            ..Default::default()
        });

        assert!(t.matches(&push("app", "main")));
        assert!(t.matches(&push("service", "hotfix")));
        assert!(!t.matches(&push("service", "main")));
    }

    #[test]
    fn branch_repository_sublist_narrows_match() {
        let t = push_trigger(ConditionBlock {
            branches: Some(vec![branch("main", &["app", "api"])]),
            ..Default::default()
        });

        assert!(t.matches(&push("api", "main")));
        assert!(!t.matches(&push("web", "main")));
    }

    #[test]
    fn branch_lists_are_ignored_outside_push() {
        let block = ConditionBlock {
            branches: Some(vec![branch("*", &[])]),
            ..Default::default()
        };
        let t = trigger(EventConditions {
            create: Some(block.clone()),
            delete: Some(block),
            ..Default::default()
        });

        assert!(!t.matches(&event(EventKind::Create, "app", "main", "")));
        assert!(!t.matches(&event(EventKind::Delete, "app", "main", "")));
    }

    // ── Exclusions ───────────────────────────────────────────────────────────

    #[test]
    fn excluded_repository_dominates_allow_list() {
        let t = push_trigger(ConditionBlock {
            repositories: Some(vec![repo("*", &[])]),
            exclude_repositories: Some(vec![repo("secret", &[])]),
            ..Default::default()
        });

        assert!(t.matches(&push("app", "main")));
        assert!(!t.matches(&push("secret", "main")));
    }

    #[test]
    fn excluded_branch_dominates_allow_list() {
        let t = push_trigger(ConditionBlock {
            repositories: Some(vec![repo("app", &[])]),
            exclude_branches: Some(vec![branch("wip", &[])]),
            ..Default::default()
        });

        assert!(t.matches(&push("app", "main")));
        assert!(!t.matches(&push("app", "wip")));
    }

    #[test]
    fn exclusion_with_branch_sublist_only_vetoes_those_branches() {
        let t = push_trigger(ConditionBlock {
            repositories: Some(vec![repo("app", &[])]),
            exclude_repositories: Some(vec![repo("app", &["experimental"])]),
            ..Default::default()
        });

        assert!(t.matches(&push("app", "main")));
        assert!(!t.matches(&push("app", "experimental")));
    }

    #[test]
    fn exclude_branches_do_not_apply_outside_push() {
        let t = trigger(EventConditions {
            create: Some(ConditionBlock {
                repositories: Some(vec![repo("app", &[])]),
                exclude_branches: Some(vec![branch("*", &[])]),
                ..Default::default()
            }),
            ..Default::default()
        });

        assert!(t.matches(&event(EventKind::Create, "app", "feature", "")));
    }

    // ── Pull request actions ─────────────────────────────────────────────────

    fn pr_trigger(actions: Option<Vec<&str>>) -> Trigger {
        trigger(EventConditions {
            pull_request: Some(ConditionBlock {
                repositories: Some(vec![repo("app", &[])]),
                actions: actions.map(|a| a.into_iter().map(String::from).collect()),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    #[test]
    fn pull_request_action_must_be_listed() {
        let t = pr_trigger(Some(vec!["opened", "synchronize"]));

        assert!(t.matches(&event(EventKind::PullRequest, "app", "", "opened")));
        assert!(!t.matches(&event(EventKind::PullRequest, "app", "", "closed")));
        assert!(!t.matches(&event(EventKind::PullRequest, "app", "", "")));
    }

    #[test]
    fn wildcard_action_accepts_any_non_empty_action() {
        let t = pr_trigger(Some(vec!["*"]));

        assert!(t.matches(&event(EventKind::PullRequest, "app", "", "labeled")));
        assert!(!t.matches(&event(EventKind::PullRequest, "app", "", "")));
    }

    #[test]
    fn absent_action_list_does_not_check_action() {
        let t = pr_trigger(None);

        assert!(t.matches(&event(EventKind::PullRequest, "app", "", "closed")));
        assert!(t.matches(&event(EventKind::PullRequest, "app", "", "")));
    }

    #[test]
    fn conditions_deserialise_from_configuration_shape() {
        let t: Trigger = serde_json::from_value(serde_json::json!({
            "endpoint": "deploy",
            "events": {
                "push": {
                    "repositories": [{ "name": "app", "branches": ["main"] }],
                    "exclude_branches": [{ "name": "wip" }]
                },
                "pull_request": { "repositories": [{ "name": "*" }], "actions": ["opened"] }
            }
        }))
        .unwrap();

        assert_eq!(t.endpoint.as_str(), "deploy");
        assert!(t.matches(&push("app", "main")));
        assert!(!t.matches(&push("app", "develop")));
        assert!(t.matches(&event(EventKind::PullRequest, "x", "", "opened")));
        assert!(t.events.create.is_none());
    }
}
