//! The poll thread

use crate::controller::{FlushReport, SuspendController};
use crate::error::ServiceError;
use crate::host::{FocusSource, ProcessTable, SignalSender};
use crate::poller::FocusPoller;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info};

/// Runs the poller and the controller on a dedicated thread.
///
/// One tick always completes before the next begins. Stopping the service
/// waits for the current tick, then resumes everything still suspended before
/// the thread exits.
pub struct NapService {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<FlushReport>>,
}

impl NapService {
    pub fn start<F, P, S>(
        mut poller: FocusPoller<F>,
        mut controller: SuspendController<P, S>,
        interval: Duration,
    ) -> Result<Self, ServiceError>
    where
        F: FocusSource + Send + 'static,
        P: ProcessTable + Send + 'static,
        S: SignalSender + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("forcenap-poll".to_string())
            .spawn(move || {
                info!("Polling focus every {:?}", interval);
                loop {
                    let events = poller.poll();
                    controller.process(&events);

                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                controller.flush()
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Stop polling and wait for the final flush
    pub fn stop(&mut self) -> Result<FlushReport, ServiceError> {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }

        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ServiceError::Panicked),
            None => Ok(FlushReport::default()),
        }
    }
}

impl Drop for NapService {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("Poll thread ended badly: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::AllowList;
    use crate::fakes::{FakeHost, Sent};
    use std::time::Instant;

    fn wait_for(host: &FakeHost, sent: Sent) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !host.signals().contains(&sent) {
            assert!(Instant::now() < deadline, "never saw {:?}", sent);
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_stop_flushes_suspended_processes() {
        let host = FakeHost::new();
        let editor = host.launch("TextEdit", 1, &[]);
        host.launch("Slack", 101, &[102]);
        host.focus(Some(&editor));

        let controller = SuspendController::new(host.clone(), host.clone(), AllowList::default());
        controller.policy_handle().set_tracked("Slack", true);
        let poller = FocusPoller::new(host.clone(), 1);

        let mut service = NapService::start(poller, controller, Duration::from_millis(10)).unwrap();
        wait_for(&host, Sent::Stop(102));
        assert!(service.is_running());

        let report = service.stop().unwrap();

        assert_eq!(report.resumed, vec![101, 102]);
        assert!(!service.is_running());
        assert!(host.signals().ends_with(&[Sent::Cont(101), Sent::Cont(102)]));
    }

    #[test]
    fn test_policy_changes_reach_the_poll_thread() {
        let host = FakeHost::new();
        let editor = host.launch("TextEdit", 1, &[]);
        host.launch("Slack", 2, &[]);
        host.focus(Some(&editor));

        let controller = SuspendController::new(host.clone(), host.clone(), AllowList::default());
        let handle = controller.policy_handle();
        let poller = FocusPoller::new(host.clone(), 1);
        let mut service = NapService::start(poller, controller, Duration::from_millis(10)).unwrap();

        handle.set_tracked("Slack", true);
        wait_for(&host, Sent::Stop(2));

        handle.set_tracked("Slack", false);
        wait_for(&host, Sent::Cont(2));

        let report = service.stop().unwrap();
        assert!(report.resumed.is_empty());
    }
}
