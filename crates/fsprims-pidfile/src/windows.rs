//! Windows locking for PID files.
//!
//! A single byte far beyond any PID text is locked, so other processes can
//! still read the PID while the file is held. `fs2` locks the whole file on
//! Windows, which would make `read_pid` fail against a live instance, so the
//! region is locked here directly. Handles are opened non-inheritable by
//! `std`, which covers close-on-exec.

use std::fs::File;
use std::io;
use std::os::windows::io::AsRawHandle;

use windows_sys::Win32::Foundation::HANDLE;
use windows_sys::Win32::Storage::FileSystem::{
    LockFileEx, UnlockFileEx, LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY,
};
use windows_sys::Win32::System::IO::OVERLAPPED;

const LOCK_OFFSET_HIGH: u32 = 0x7FFF_FFFF;

fn lock_region() -> OVERLAPPED {
    // SAFETY: OVERLAPPED is plain data; all-zero is its documented initial
    // state, and the offset variant of the union is the one LockFileEx reads.
    unsafe {
        let mut overlapped: OVERLAPPED = std::mem::zeroed();
        overlapped.Anonymous.Anonymous.OffsetHigh = LOCK_OFFSET_HIGH;
        overlapped
    }
}

pub fn try_lock_impl(file: &File) -> io::Result<()> {
    let mut overlapped = lock_region();

    // SAFETY: the handle is owned by `file`; `overlapped` outlives the
    // synchronous call.
    let ok = unsafe {
        LockFileEx(
            file.as_raw_handle() as HANDLE,
            LOCKFILE_EXCLUSIVE_LOCK | LOCKFILE_FAIL_IMMEDIATELY,
            0,
            1,
            0,
            &mut overlapped,
        )
    };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

pub fn unlock_impl(file: &File) -> io::Result<()> {
    let mut overlapped = lock_region();

    // SAFETY: as above.
    let ok = unsafe { UnlockFileEx(file.as_raw_handle() as HANDLE, 0, 1, 0, &mut overlapped) };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

pub fn set_cloexec_impl(_file: &File) -> io::Result<()> {
    Ok(())
}
