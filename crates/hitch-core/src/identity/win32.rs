//! Top-level window listing via `EnumWindows`

use super::{WindowInfo, WindowSource};
use crate::{Error, Result};
use windows_sys::Win32::Foundation::{BOOL, HWND, LPARAM};
use windows_sys::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetWindowTextLengthW, GetWindowTextW, GetWindowThreadProcessId, IsWindowVisible,
};

/// Lists top-level windows of the interactive desktop
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32Windows;

impl WindowSource for Win32Windows {
    fn windows(&self) -> Result<Vec<WindowInfo>> {
        let mut windows: Vec<WindowInfo> = Vec::new();
        let windows_ptr = &raw mut windows;

        // SAFETY: the callback only runs during this call and is the sole user
        // of the pointer, which outlives it.
        let ok = unsafe { EnumWindows(Some(enum_windows_proc), windows_ptr as LPARAM) };
        if ok == 0 {
            return Err(Error::WindowQuery("EnumWindows failed".to_string()));
        }

        Ok(windows)
    }
}

unsafe extern "system" fn enum_windows_proc(hwnd: HWND, lparam: LPARAM) -> BOOL {
    // SAFETY: lparam is the Vec pointer passed to EnumWindows above.
    let windows = unsafe { &mut *(lparam as *mut Vec<WindowInfo>) };

    let mut pid = 0u32;
    // SAFETY: hwnd comes from EnumWindows and pid is a valid out pointer.
    unsafe { GetWindowThreadProcessId(hwnd, &raw mut pid) };
    if pid == 0 {
        return 1;
    }

    // SAFETY: hwnd comes from EnumWindows.
    let visible = unsafe { IsWindowVisible(hwnd) } != 0;
    let title = window_text(hwnd);

    windows.push(WindowInfo {
        owner_pid: pid,
        visible,
        title,
    });

    1
}

fn window_text(hwnd: HWND) -> String {
    // SAFETY: hwnd comes from EnumWindows.
    let length = unsafe { GetWindowTextLengthW(hwnd) };
    let Ok(capacity) = usize::try_from(length) else {
        return String::new();
    };
    if capacity == 0 {
        return String::new();
    }

    let mut buffer = vec![0u16; capacity + 1];
    // SAFETY: buffer holds length + 1 UTF-16 units including the terminator.
    let copied = unsafe { GetWindowTextW(hwnd, buffer.as_mut_ptr(), length + 1) };
    let copied = usize::try_from(copied).unwrap_or(0).min(capacity);
    String::from_utf16_lossy(&buffer[..copied])
}
