//! Windows focus detection

use super::PlatformError;
use forcenap_core::ApplicationIdentity;
use std::collections::HashSet;
use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;
use windows::Win32::Foundation::{CloseHandle, BOOL, HWND, LPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetForegroundWindow, GetWindowThreadProcessId, IsWindowVisible,
};

pub fn focused_app() -> Result<Option<ApplicationIdentity>, PlatformError> {
    unsafe {
        let hwnd = GetForegroundWindow();
        if hwnd.0 == 0 {
            return Ok(None);
        }
        Ok(identity(hwnd))
    }
}

pub fn running_apps() -> Result<Vec<ApplicationIdentity>, PlatformError> {
    let mut windows: Vec<HWND> = Vec::new();
    unsafe {
        EnumWindows(
            Some(collect_visible),
            LPARAM(&mut windows as *mut Vec<HWND> as isize),
        )
        .map_err(|e| PlatformError::Query(format!("EnumWindows failed: {}", e)))?;
    }

    let mut seen = HashSet::new();
    let mut apps = Vec::new();
    for hwnd in windows {
        if let Some(app) = unsafe { identity(hwnd) } {
            if seen.insert(app.pid) {
                apps.push(app);
            }
        }
    }
    Ok(apps)
}

unsafe extern "system" fn collect_visible(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let windows = &mut *(lparam.0 as *mut Vec<HWND>);
    if IsWindowVisible(hwnd).as_bool() {
        windows.push(hwnd);
    }
    BOOL(1)
}

unsafe fn identity(hwnd: HWND) -> Option<ApplicationIdentity> {
    let mut process_id = 0u32;
    GetWindowThreadProcessId(hwnd, Some(&mut process_id as *mut u32));
    if process_id == 0 {
        return None;
    }

    let name = get_process_name(process_id).unwrap_or_else(|| "unknown".to_string());
    Some(ApplicationIdentity::new(name, process_id))
}

fn get_process_name(process_id: u32) -> Option<String> {
    use windows::Win32::System::ProcessStatus::K32GetModuleBaseNameW;
    use windows::Win32::System::Threading::{
        OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
    };

    unsafe {
        let handle =
            OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, false, process_id).ok()?;

        let mut name_buf = [0u16; 260];
        let len = K32GetModuleBaseNameW(handle, None, &mut name_buf);
        let _ = CloseHandle(handle);

        if len > 0 {
            Some(
                OsString::from_wide(&name_buf[..len as usize])
                    .to_string_lossy()
                    .into_owned(),
            )
        } else {
            None
        }
    }
}
