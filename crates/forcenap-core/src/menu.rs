//! Declarative list of tracking toggles
//!
//! One entry per running application name, allow-listed names left out. A
//! front end (stdin commands, a tray menu) renders the entries and turns a
//! click into [`PolicyHandle::toggle`].

use crate::actuator::AllowList;
use crate::policy::PolicyHandle;
use crate::{AppName, ApplicationIdentity};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleEntry {
    pub name: AppName,
    pub tracked: bool,
}

impl fmt::Display for ToggleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.tracked { "x" } else { " " };
        write!(f, "[{}] {}", mark, self.name)
    }
}

/// Names that appeared and disappeared in a refresh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuDiff {
    pub added: Vec<AppName>,
    pub removed: Vec<AppName>,
}

pub struct ToggleMenu {
    allow: AllowList,
    names: BTreeSet<AppName>,
}

impl ToggleMenu {
    pub fn new(allow: AllowList) -> Self {
        Self {
            allow,
            names: BTreeSet::new(),
        }
    }

    /// Rebuild from the running applications and report what changed
    pub fn refresh(&mut self, apps: &[ApplicationIdentity]) -> MenuDiff {
        let current: BTreeSet<AppName> = apps
            .iter()
            .map(|app| app.name.clone())
            .filter(|name| !self.allow.contains(name))
            .collect();

        let diff = MenuDiff {
            added: current.difference(&self.names).cloned().collect(),
            removed: self.names.difference(&current).cloned().collect(),
        };
        self.names = current;
        diff
    }

    pub fn contains(&self, name: &AppName) -> bool {
        self.names.contains(name)
    }

    /// Sorted entries with their requested tracking state
    pub fn entries(&self, policy: &PolicyHandle) -> Vec<ToggleEntry> {
        self.names
            .iter()
            .map(|name| ToggleEntry {
                name: name.clone(),
                tracked: policy.is_tracked(name),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::TrackingPolicy;

    fn apps(list: &[(&str, u32)]) -> Vec<ApplicationIdentity> {
        list.iter()
            .map(|(name, pid)| ApplicationIdentity::new(*name, *pid))
            .collect()
    }

    #[test]
    fn test_entries_are_sorted_unique_and_unprotected() {
        let mut menu = ToggleMenu::new(AllowList::default());
        menu.refresh(&apps(&[
            ("Slack", 3),
            ("Terminal", 1),
            ("Firefox", 2),
            ("Firefox", 4),
        ]));

        let policy = TrackingPolicy::new();
        let handle = policy.handle();
        handle.set_tracked("Slack", true);

        let rendered: Vec<String> = menu.entries(&handle).iter().map(|e| e.to_string()).collect();
        assert_eq!(rendered, vec!["[ ] Firefox", "[x] Slack"]);
    }

    #[test]
    fn test_refresh_reports_changes() {
        let mut menu = ToggleMenu::new(AllowList::default());

        let diff = menu.refresh(&apps(&[("Mail", 1), ("Notes", 2)]));
        assert_eq!(diff.added.len(), 2);
        assert!(diff.removed.is_empty());

        let diff = menu.refresh(&apps(&[("Mail", 1), ("Music", 3)]));
        assert_eq!(diff.added, vec![AppName::from("Music")]);
        assert_eq!(diff.removed, vec![AppName::from("Notes")]);
        assert!(menu.contains(&AppName::from("Music")));
        assert!(!menu.contains(&AppName::from("Notes")));

        assert_eq!(menu.refresh(&apps(&[("Mail", 5), ("Music", 3)])), MenuDiff::default());
    }
}
