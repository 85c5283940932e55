//! Line-based configuration source
//!
//! Stands in for a tray menu: each line read from stdin is one toggle
//! command. Requests go through the policy handle and are applied by the
//! poll thread on its next tick.

use forcenap_core::{AllowList, AppName, FocusSource, PolicyHandle, ToggleMenu};
use std::io::{self, BufRead, Write};
use std::sync::mpsc::Sender;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Track(AppName),
    Untrack(AppName),
    Toggle(AppName),
    List,
    Refresh,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines give `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let name = || {
            if rest.is_empty() {
                Err(format!("'{}' needs an application name", verb))
            } else {
                Ok(AppName::from(rest))
            }
        };

        let command = match verb.to_lowercase().as_str() {
            "track" => Command::Track(name()?),
            "untrack" => Command::Untrack(name()?),
            "toggle" => Command::Toggle(name()?),
            "list" | "ls" => Command::List,
            "refresh" => Command::Refresh,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("Unknown command '{}', try 'help'", other)),
        };
        Ok(Some(command))
    }
}

const HELP: &str = "\
Commands:
  list              show running applications ([x] = tracked)
  refresh           reload the application list
  track <name>      suspend <name> whenever it is not focused
  untrack <name>    stop suspending <name>
  toggle <name>     flip tracking of <name>
  quit              resume everything and exit";

pub struct Console<F> {
    policy: PolicyHandle,
    allow: AllowList,
    menu: ToggleMenu,
    source: F,
    shutdown: Sender<()>,
}

impl<F: FocusSource> Console<F> {
    pub fn new(policy: PolicyHandle, allow: AllowList, source: F, shutdown: Sender<()>) -> Self {
        Self {
            policy,
            menu: ToggleMenu::new(allow.clone()),
            allow,
            source,
            shutdown,
        }
    }

    /// Read commands until `quit` or end of input
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            match Command::parse(&line) {
                Ok(Some(command)) => {
                    if !self.execute(command, &mut out)? {
                        break;
                    }
                }
                Ok(None) => {}
                Err(msg) => writeln!(out, "{}", msg)?,
            }
        }
        debug!("Console input closed");
        Ok(())
    }

    /// Returns false once the console should stop reading
    fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> io::Result<bool> {
        match command {
            Command::Track(name) => self.set(name, true, out)?,
            Command::Untrack(name) => self.set(name, false, out)?,
            Command::Toggle(name) => {
                let track = !self.policy.is_tracked(&name);
                self.set(name, track, out)?;
            }
            Command::List => {
                self.refresh(out, false)?;
                for entry in self.menu.entries(&self.policy) {
                    writeln!(out, "{}", entry)?;
                }
            }
            Command::Refresh => self.refresh(out, true)?,
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Quit => {
                writeln!(out, "Quitting with cleanup...")?;
                let _ = self.shutdown.send(());
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn set<W: Write>(&mut self, name: AppName, track: bool, out: &mut W) -> io::Result<()> {
        if self.allow.contains(&name) {
            writeln!(out, "{} is in the do not suspend list", name)?;
            return Ok(());
        }

        self.policy.set_tracked(name.clone(), track);
        if track {
            writeln!(out, "Tracking {}", name)
        } else {
            writeln!(out, "No longer tracking {}", name)
        }
    }

    fn refresh<W: Write>(&mut self, out: &mut W, verbose: bool) -> io::Result<()> {
        let apps = match self.source.running_apps() {
            Ok(apps) => apps,
            Err(e) => return writeln!(out, "Could not list applications: {}", e),
        };

        let diff = self.menu.refresh(&apps);
        if verbose {
            for name in &diff.added {
                writeln!(out, "+ {}", name)?;
            }
            for name in &diff.removed {
                writeln!(out, "- {}", name)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forcenap_core::{ApplicationIdentity, HostError, TrackingPolicy};
    use std::sync::mpsc;

    struct StaticApps(Vec<ApplicationIdentity>);

    impl FocusSource for StaticApps {
        fn focused_app(&self) -> Result<Option<ApplicationIdentity>, HostError> {
            Ok(self.0.first().cloned())
        }

        fn running_apps(&self) -> Result<Vec<ApplicationIdentity>, HostError> {
            Ok(self.0.clone())
        }
    }

    fn run(input: &str) -> (String, TrackingPolicy, mpsc::Receiver<()>) {
        let policy = TrackingPolicy::new();
        let (tx, rx) = mpsc::channel();
        let apps = StaticApps(vec![
            ApplicationIdentity::new("Terminal", 1),
            ApplicationIdentity::new("Slack", 2),
            ApplicationIdentity::new("Google Chrome", 3),
        ]);
        let mut console = Console::new(policy.handle(), AllowList::default(), apps, tx);

        let mut out = Vec::new();
        console.run(input.as_bytes(), &mut out).unwrap();
        (String::from_utf8(out).unwrap(), policy, rx)
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            Command::parse("track Google Chrome").unwrap(),
            Some(Command::Track(AppName::from("Google Chrome")))
        );
        assert_eq!(Command::parse("  LIST ").unwrap(), Some(Command::List));
        assert_eq!(Command::parse("").unwrap(), None);
        assert!(Command::parse("track").is_err());
        assert!(Command::parse("frobnicate").is_err());
    }

    #[test]
    fn test_track_and_list() {
        let (out, mut policy, _rx) = run("track Slack\nlist\n");

        assert!(out.contains("Tracking Slack"));
        assert!(out.contains("[ ] Google Chrome"));
        assert!(out.contains("[x] Slack"));
        assert!(!out.contains("Terminal"));

        let delta = policy.reconcile();
        assert!(delta.added.contains(&AppName::from("Slack")));
    }

    #[test]
    fn test_protected_names_are_refused() {
        let (out, mut policy, _rx) = run("track Terminal\n");

        assert!(out.contains("do not suspend list"));
        assert!(policy.reconcile().is_empty());
    }

    #[test]
    fn test_toggle_twice_is_no_change() {
        let (_out, mut policy, _rx) = run("toggle Slack\ntoggle Slack\n");
        assert!(policy.reconcile().is_empty());
    }

    #[test]
    fn test_quit_requests_shutdown_and_stops_reading() {
        let (out, mut policy, rx) = run("quit\ntrack Slack\n");

        assert!(rx.try_recv().is_ok());
        assert!(out.contains("Quitting"));
        assert!(policy.reconcile().is_empty());
    }
}
