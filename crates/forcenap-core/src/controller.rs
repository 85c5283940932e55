//! The suspend/resume state machine
//!
//! Per tracked application the controller keeps one of three states: the
//! focused instance runs, unfocused tracked instances are stopped, untracked
//! instances are left alone. All decisions run on the poll thread; the
//! registry and the applied policy never leave it.

use crate::actuator::{AllowList, Delivery, SignalActuator};
use crate::error::SignalError;
use crate::host::{ProcessTable, SignalSender};
use crate::policy::{PolicyDelta, PolicyHandle, TrackingPolicy};
use crate::poller::PollEvent;
use crate::registry::{SuspendRegistry, SuspendedProcess};
use crate::resolver::ProcessGroupResolver;
use crate::{AppName, ApplicationIdentity, Pid};
use chrono::Utc;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Why a suspend or resume did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Name is allow-listed, or the group holds ForceNap or its launcher
    Protected,
    /// The application has focus and must keep running
    Focused,
    /// Every resolved pid is already stopped
    AlreadySuspended,
    /// No pid of the application is recorded as stopped
    NotSuspended,
    /// The main process is gone
    Exited,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Pids that were stopped or continued. Pids whose delivery failed are
    /// not listed.
    Signalled(Vec<Pid>),
    Skipped(SkipReason),
}

/// Result of resuming everything at shutdown
#[derive(Debug, Default)]
pub struct FlushReport {
    pub resumed: Vec<Pid>,
    pub gone: Vec<Pid>,
    pub failed: Vec<(Pid, SignalError)>,
}

impl FlushReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FocusState {
    pub current: Option<ApplicationIdentity>,
    pub previous: Option<ApplicationIdentity>,
}

pub struct SuspendController<P: ProcessTable, S: SignalSender> {
    resolver: ProcessGroupResolver<P>,
    actuator: SignalActuator<S>,
    registry: SuspendRegistry,
    policy: TrackingPolicy,
    focus: FocusState,
    running: Vec<ApplicationIdentity>,
}

impl<P: ProcessTable, S: SignalSender> SuspendController<P, S> {
    /// The process chain that launched ForceNap (shell, terminal) is looked
    /// up once here and never signalled.
    pub fn new(table: P, sender: S, allow: AllowList) -> Self {
        let resolver = ProcessGroupResolver::new(table);
        let mut actuator = SignalActuator::new(sender, allow);
        let launchers = resolver.ancestors(std::process::id());
        debug!("Protecting launcher processes {:?}", launchers);
        actuator.protect_pids(launchers);

        Self {
            resolver,
            actuator,
            registry: SuspendRegistry::new(),
            policy: TrackingPolicy::new(),
            focus: FocusState::default(),
            running: Vec::new(),
        }
    }

    /// Handle for configuration sources on other threads
    pub fn policy_handle(&self) -> PolicyHandle {
        self.policy.handle()
    }

    pub fn registry(&self) -> &SuspendRegistry {
        &self.registry
    }

    pub fn focus(&self) -> &FocusState {
        &self.focus
    }

    pub fn running(&self) -> &[ApplicationIdentity] {
        &self.running
    }

    pub fn allow_list(&self) -> &AllowList {
        self.actuator.allow_list()
    }

    pub fn is_tracked(&self, name: &AppName) -> bool {
        self.policy.is_tracked(name)
    }

    /// Run one tick worth of events.
    ///
    /// The application list is refreshed first, then pending policy changes
    /// are applied against the focus observed in this tick, and finally the
    /// focus transition itself is handled.
    pub fn process(&mut self, events: &[PollEvent]) {
        let mut focus_change = None;
        for event in events {
            match event {
                PollEvent::AppListChanged(apps) => self.update_running(apps.clone()),
                PollEvent::FocusChanged { previous, current } => {
                    focus_change = Some((previous.clone(), current.clone()));
                }
            }
        }

        if let Some((_, current)) = &focus_change {
            self.focus.previous = self.focus.current.replace(current.clone());
        }

        self.apply_policy();

        if let Some((previous, current)) = focus_change {
            self.on_focus_changed(previous.as_ref(), &current);
        }
    }

    /// Reconcile the tracking policy and act on what changed
    pub fn apply_policy(&mut self) -> PolicyDelta {
        let delta = self.policy.reconcile();
        if delta.is_empty() {
            return delta;
        }
        info!(
            "Tracking changed: added {:?}, removed {:?}",
            delta.added, delta.removed
        );

        let mut handled = BTreeSet::new();
        for app in self.running.clone() {
            if delta.added.contains(&app.name) {
                if self.is_focused(&app) {
                    debug!("{} is the current app, skipping", app);
                    continue;
                }
                self.suspend(&app);
            } else if delta.removed.contains(&app.name) {
                self.resume(&app);
                handled.insert(app.pid);
            }
        }

        // Stopped instances missing from a stale application list
        let leftovers: BTreeSet<(Pid, AppName)> = self
            .registry
            .pids()
            .into_iter()
            .filter_map(|pid| self.registry.get(pid))
            .filter(|entry| !handled.contains(&entry.owner))
            .filter(|entry| delta.removed.contains(&entry.app))
            .map(|entry| (entry.owner, entry.app.clone()))
            .collect();
        for (owner, name) in leftovers {
            self.resume(&ApplicationIdentity::new(name, owner));
        }

        delta
    }

    fn on_focus_changed(
        &mut self,
        previous: Option<&ApplicationIdentity>,
        current: &ApplicationIdentity,
    ) {
        if self.policy.is_tracked(&current.name) {
            self.resume(current);
        } else if !self.registry.owned_by(current.pid).is_empty() {
            info!("{} is focused but still has stopped processes", current);
            self.resume(current);
        }

        if let Some(previous) = previous {
            if previous != current && self.policy.is_tracked(&previous.name) {
                self.suspend(previous);
            }
        }
    }

    /// Stop every process of `app` that is not stopped yet
    pub fn suspend(&mut self, app: &ApplicationIdentity) -> Outcome {
        if self.actuator.is_protected(&app.name) {
            debug!("{} not suspended, in do not suspend list", app);
            return Outcome::Skipped(SkipReason::Protected);
        }
        if self.is_focused(app) {
            debug!("{} has focus, not suspended", app);
            return Outcome::Skipped(SkipReason::Focused);
        }

        let pids = self.resolver.resolve(app);
        if pids.is_empty() {
            debug!("{} has exited, nothing to suspend", app);
            return Outcome::Skipped(SkipReason::Exited);
        }
        if pids.iter().any(|pid| self.actuator.is_protected_pid(*pid)) {
            debug!("{} runs ForceNap or launched it, not suspended", app);
            return Outcome::Skipped(SkipReason::Protected);
        }

        let pending: Vec<Pid> = pids
            .into_iter()
            .filter(|pid| !self.registry.contains(*pid))
            .collect();
        if pending.is_empty() {
            return Outcome::Skipped(SkipReason::AlreadySuspended);
        }

        info!("Suspending {} {:?}", app, pending);
        let mut stopped = Vec::new();
        for pid in pending {
            match self.actuator.stop(&app.name, pid) {
                Ok(Delivery::Sent) => {
                    self.registry
                        .insert(pid, SuspendedProcess::new(app.pid, app.name.clone()));
                    stopped.push(pid);
                }
                Ok(Delivery::Protected) => {}
                Err(SignalError::ProcessGone(_)) => {
                    debug!("Process {} exited before it could be stopped", pid)
                }
                Err(e) => warn!("Could not suspend {}: {}", app, e),
            }
        }

        Outcome::Signalled(stopped)
    }

    /// Continue every recorded process of `app`
    pub fn resume(&mut self, app: &ApplicationIdentity) -> Outcome {
        if self.actuator.is_protected(&app.name) {
            debug!("{} not resumed, in do not suspend list", app);
            return Outcome::Skipped(SkipReason::Protected);
        }

        let mut targets: BTreeSet<Pid> = self.registry.owned_by(app.pid).into_iter().collect();
        for pid in self.resolver.resolve(app) {
            if self.registry.contains(pid) {
                targets.insert(pid);
            }
        }
        if targets.is_empty() {
            return Outcome::Skipped(SkipReason::NotSuspended);
        }

        info!("Resuming {} {:?}", app, targets);
        let mut resumed = Vec::new();
        for pid in targets {
            if !self.resolver.is_running(pid) {
                debug!("Process {} is gone, dropping it", pid);
                self.registry.remove(pid);
                continue;
            }
            match self.actuator.resume(&app.name, pid) {
                Ok(Delivery::Sent) => {
                    if let Some(entry) = self.registry.remove(pid) {
                        let slept = Utc::now() - entry.since;
                        debug!("Process {} was suspended for {}s", pid, slept.num_seconds());
                    }
                    resumed.push(pid);
                }
                Ok(Delivery::Protected) => {}
                Err(SignalError::ProcessGone(_)) => {
                    debug!("Process {} is gone, dropping it", pid);
                    self.registry.remove(pid);
                }
                Err(e) => warn!("Could not resume {}: {}", app, e),
            }
        }

        Outcome::Signalled(resumed)
    }

    /// Continue every recorded pid and empty the registry. Failures are
    /// reported and forgotten; nothing is retried after shutdown.
    pub fn flush(&mut self) -> FlushReport {
        let mut report = FlushReport::default();
        let entries = self.registry.drain();
        if entries.is_empty() {
            return report;
        }

        info!("Resuming {} suspended processes", entries.len());
        for (pid, entry) in entries {
            match self.actuator.force_resume(pid) {
                Ok(()) => report.resumed.push(pid),
                Err(SignalError::ProcessGone(_)) => report.gone.push(pid),
                Err(e) => {
                    warn!("Failed to resume {} ({}): {}", pid, entry.app, e);
                    report.failed.push((pid, e));
                }
            }
        }
        report
    }

    fn update_running(&mut self, apps: Vec<ApplicationIdentity>) {
        let vanished: Vec<ApplicationIdentity> = self
            .running
            .iter()
            .filter(|app| !apps.contains(app))
            .cloned()
            .collect();
        self.running = apps;

        for app in vanished {
            if self.resolver.is_running(app.pid) {
                continue;
            }
            self.release_exited(&app);
        }
    }

    /// Drop bookkeeping for an application whose main process exited. Child
    /// processes that outlived it are continued.
    fn release_exited(&mut self, app: &ApplicationIdentity) {
        for pid in self.registry.owned_by(app.pid) {
            if !self.resolver.is_running(pid) {
                self.registry.remove(pid);
                continue;
            }
            match self.actuator.resume(&app.name, pid) {
                Ok(_) | Err(SignalError::ProcessGone(_)) => {
                    self.registry.remove(pid);
                }
                Err(e) => warn!("Could not resume orphan {} of {}: {}", pid, app, e),
            }
        }
    }

    fn is_focused(&self, app: &ApplicationIdentity) -> bool {
        self.focus.current.as_ref() == Some(app)
    }
}

impl<P: ProcessTable, S: SignalSender> Drop for SuspendController<P, S> {
    fn drop(&mut self) {
        let report = self.flush();
        for (pid, e) in &report.failed {
            warn!("Process {} may still be stopped: {}", pid, e);
        }
    }
}
