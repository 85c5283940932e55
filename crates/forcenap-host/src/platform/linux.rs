//! Linux focus detection using X11 (EWMH properties)

use super::PlatformError;
use forcenap_core::{ApplicationIdentity, Pid};
use std::collections::HashSet;
use std::fmt::Display;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Atom, AtomEnum, ConnectionExt, Window};
use x11rb::rust_connection::RustConnection;

fn query_err<E: Display>(context: &'static str) -> impl Fn(E) -> PlatformError {
    move |e| PlatformError::Query(format!("{}: {}", context, e))
}

struct Session {
    conn: RustConnection,
    root: Window,
    active_window: Atom,
    client_list: Atom,
    wm_pid: Atom,
}

impl Session {
    fn connect() -> Result<Self, PlatformError> {
        let (conn, screen_num) =
            RustConnection::connect(None).map_err(query_err("X11 connection failed"))?;
        let root = conn.setup().roots[screen_num].root;

        let mut session = Self {
            conn,
            root,
            active_window: 0,
            client_list: 0,
            wm_pid: 0,
        };
        session.active_window = session.atom(b"_NET_ACTIVE_WINDOW")?;
        session.client_list = session.atom(b"_NET_CLIENT_LIST")?;
        session.wm_pid = session.atom(b"_NET_WM_PID")?;
        Ok(session)
    }

    fn atom(&self, name: &[u8]) -> Result<Atom, PlatformError> {
        Ok(self
            .conn
            .intern_atom(false, name)
            .map_err(query_err("Failed to intern atom"))?
            .reply()
            .map_err(query_err("Failed to get atom reply"))?
            .atom)
    }

    fn property32(
        &self,
        window: Window,
        property: Atom,
        kind: AtomEnum,
        length: u32,
    ) -> Result<Vec<u32>, PlatformError> {
        let reply = self
            .conn
            .get_property(false, window, property, kind, 0, length)
            .map_err(query_err("Failed to get property"))?
            .reply()
            .map_err(query_err("Failed to get property reply"))?;

        Ok(reply.value32().map(|values| values.collect()).unwrap_or_default())
    }

    /// Application behind a top-level window: its `_NET_WM_PID` and the
    /// class part of `WM_CLASS` as the name
    fn identity(&self, window: Window) -> Result<Option<ApplicationIdentity>, PlatformError> {
        let pid: Pid = match self
            .property32(window, self.wm_pid, AtomEnum::CARDINAL, 1)?
            .first()
        {
            Some(&pid) if pid > 0 => pid,
            _ => return Ok(None),
        };

        let class_reply = self
            .conn
            .get_property(false, window, AtomEnum::WM_CLASS, AtomEnum::STRING, 0, 1024)
            .map_err(query_err("Failed to get property"))?
            .reply()
            .map_err(query_err("Failed to get property reply"))?;

        // WM_CLASS contains two null-terminated strings: instance name and class name
        let class_str = String::from_utf8_lossy(&class_reply.value);
        let mut parts = class_str.split('\0').filter(|part| !part.is_empty());
        let instance = parts.next();
        let name = parts.next().or(instance).unwrap_or("Unknown");

        Ok(Some(ApplicationIdentity::new(name, pid)))
    }
}

pub fn focused_app() -> Result<Option<ApplicationIdentity>, PlatformError> {
    let session = Session::connect()?;

    let active = session.property32(session.root, session.active_window, AtomEnum::WINDOW, 1)?;
    match active.first() {
        Some(&window) if window != 0 => session.identity(window),
        _ => Ok(None),
    }
}

pub fn running_apps() -> Result<Vec<ApplicationIdentity>, PlatformError> {
    let session = Session::connect()?;

    let windows = session.property32(session.root, session.client_list, AtomEnum::WINDOW, 4096)?;

    let mut seen = HashSet::new();
    let mut apps = Vec::new();
    for window in windows {
        // Windows can disappear between the list and the lookup
        if let Ok(Some(app)) = session.identity(window) {
            if seen.insert(app.pid) {
                apps.push(app);
            }
        }
    }
    Ok(apps)
}
