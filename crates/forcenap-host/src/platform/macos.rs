//! macOS focus detection using Cocoa/AppKit

use super::PlatformError;
use cocoa::base::{id, nil};
use cocoa::foundation::NSAutoreleasePool;
use forcenap_core::ApplicationIdentity;
use objc::{class, msg_send, sel, sel_impl};

/// NSApplicationActivationPolicyRegular: apps with a Dock icon and menu bar
const ACTIVATION_POLICY_REGULAR: isize = 0;

pub fn focused_app() -> Result<Option<ApplicationIdentity>, PlatformError> {
    unsafe {
        let pool = NSAutoreleasePool::new(nil);
        let result = frontmost();
        let _: () = msg_send![pool, drain];
        result
    }
}

pub fn running_apps() -> Result<Vec<ApplicationIdentity>, PlatformError> {
    unsafe {
        let pool = NSAutoreleasePool::new(nil);
        let result = launched();
        let _: () = msg_send![pool, drain];
        result
    }
}

unsafe fn shared_workspace() -> Result<id, PlatformError> {
    let workspace: id = msg_send![class!(NSWorkspace), sharedWorkspace];
    if workspace == nil {
        return Err(PlatformError::Query(
            "Failed to get shared workspace".to_string(),
        ));
    }
    Ok(workspace)
}

unsafe fn frontmost() -> Result<Option<ApplicationIdentity>, PlatformError> {
    let workspace = shared_workspace()?;

    let frontmost: id = msg_send![workspace, frontmostApplication];
    if frontmost == nil {
        return Ok(None);
    }
    Ok(identity(frontmost))
}

unsafe fn launched() -> Result<Vec<ApplicationIdentity>, PlatformError> {
    let workspace = shared_workspace()?;

    let running: id = msg_send![workspace, runningApplications];
    if running == nil {
        return Err(PlatformError::Query(
            "No running applications list".to_string(),
        ));
    }

    let count: usize = msg_send![running, count];
    let mut apps = Vec::with_capacity(count);
    for i in 0..count {
        let app: id = msg_send![running, objectAtIndex: i];
        let policy: isize = msg_send![app, activationPolicy];
        if policy != ACTIVATION_POLICY_REGULAR {
            continue;
        }
        if let Some(identity) = identity(app) {
            apps.push(identity);
        }
    }
    Ok(apps)
}

unsafe fn identity(app: id) -> Option<ApplicationIdentity> {
    let pid: i32 = msg_send![app, processIdentifier];
    if pid <= 0 {
        return None;
    }

    let name: id = msg_send![app, localizedName];
    let name = if name != nil {
        nsstring_to_string(name)
    } else {
        "Unknown".to_string()
    };

    Some(ApplicationIdentity::new(name, pid as u32))
}

unsafe fn nsstring_to_string(nsstring: id) -> String {
    let bytes: *const std::os::raw::c_char = msg_send![nsstring, UTF8String];
    if bytes.is_null() {
        return String::new();
    }
    std::ffi::CStr::from_ptr(bytes)
        .to_string_lossy()
        .into_owned()
}
