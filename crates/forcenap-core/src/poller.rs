//! Focus and application list sampling

use crate::host::FocusSource;
use crate::{ApplicationIdentity, Pid};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// A change observed between two ticks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    FocusChanged {
        previous: Option<ApplicationIdentity>,
        current: ApplicationIdentity,
    },
    AppListChanged(Vec<ApplicationIdentity>),
}

pub struct FocusPoller<F> {
    source: F,
    last_focus: Option<ApplicationIdentity>,
    last_apps: Option<BTreeSet<Pid>>,
    /// Query the application list every N ticks
    app_list_every: u32,
    ticks: u64,
}

impl<F: FocusSource> FocusPoller<F> {
    pub fn new(source: F, app_list_every: u32) -> Self {
        Self {
            source,
            last_focus: None,
            last_apps: None,
            app_list_every: app_list_every.max(1),
            ticks: 0,
        }
    }

    pub fn source(&self) -> &F {
        &self.source
    }

    /// Sample the host once. Unchanged ticks and failed or empty queries
    /// produce no events.
    pub fn poll(&mut self) -> Vec<PollEvent> {
        let mut events = Vec::new();

        if self.ticks % u64::from(self.app_list_every) == 0 {
            if let Some(event) = self.poll_apps() {
                events.push(event);
            }
        }
        self.ticks += 1;

        match self.source.focused_app() {
            Ok(Some(current)) => {
                if self.last_focus.as_ref() != Some(&current) {
                    info!("Currently focused on {}", current);
                    let previous = self.last_focus.replace(current.clone());
                    events.push(PollEvent::FocusChanged { previous, current });
                }
            }
            Ok(None) => debug!("No focused application this tick"),
            Err(e) => debug!("Focus query failed, skipping tick: {}", e),
        }

        events
    }

    fn poll_apps(&mut self) -> Option<PollEvent> {
        let apps = match self.source.running_apps() {
            Ok(apps) if !apps.is_empty() => apps,
            Ok(_) => {
                debug!("Empty application list, skipping");
                return None;
            }
            Err(e) => {
                debug!("Application list query failed, skipping: {}", e);
                return None;
            }
        };

        let pids: BTreeSet<Pid> = apps.iter().map(|app| app.pid).collect();
        if self.last_apps.as_ref() == Some(&pids) {
            return None;
        }
        self.last_apps = Some(pids);
        Some(PollEvent::AppListChanged(apps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeHost;

    #[test]
    fn test_focus_change_emits_once() {
        let host = FakeHost::new();
        let mail = host.launch("Mail", 10, &[]);
        let notes = host.launch("Notes", 20, &[]);
        host.focus(Some(&mail));

        let mut poller = FocusPoller::new(host.clone(), 1);

        let events = poller.poll();
        assert!(events.contains(&PollEvent::FocusChanged {
            previous: None,
            current: mail.clone(),
        }));
        assert!(matches!(events[0], PollEvent::AppListChanged(_)));

        assert!(poller.poll().is_empty());

        host.focus(Some(&notes));
        assert_eq!(
            poller.poll(),
            vec![PollEvent::FocusChanged {
                previous: Some(mail),
                current: notes,
            }]
        );
    }

    #[test]
    fn test_transient_failures_are_no_change() {
        let host = FakeHost::new();
        let mail = host.launch("Mail", 10, &[]);
        host.focus(Some(&mail));

        let mut poller = FocusPoller::new(host.clone(), 1);
        poller.poll();

        host.set_focus_fails(true);
        assert!(poller.poll().is_empty());

        host.set_focus_fails(false);
        host.focus(None);
        assert!(poller.poll().is_empty());

        host.focus(Some(&mail));
        assert!(poller.poll().is_empty());
    }

    #[test]
    fn test_same_name_different_instance_is_a_change() {
        let host = FakeHost::new();
        let first = host.launch("Terminal", 10, &[]);
        let second = host.launch("Terminal", 11, &[]);
        host.focus(Some(&first));

        let mut poller = FocusPoller::new(host.clone(), 1);
        poller.poll();

        host.focus(Some(&second));
        assert_eq!(poller.poll().len(), 1);
    }

    #[test]
    fn test_app_list_cadence() {
        let host = FakeHost::new();
        host.launch("Mail", 10, &[]);

        let mut poller = FocusPoller::new(host.clone(), 3);
        assert_eq!(poller.poll().len(), 1);

        host.launch("Notes", 20, &[]);
        assert!(poller.poll().is_empty());
        assert!(poller.poll().is_empty());

        match poller.poll().as_slice() {
            [PollEvent::AppListChanged(apps)] => assert_eq!(apps.len(), 2),
            other => panic!("unexpected events: {:?}", other),
        }
    }
}
