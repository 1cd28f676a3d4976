//! Windows endpoint: a mailslot under `\\.\mailslot\`.
//!
//! Mailslot creation is exclusive per name and writes larger than the slot's
//! maximum message size are rejected by the system.
//!
//! The read handle stays open until the receiver is dropped, which happens
//! after the listener has been joined. `close` wakes a blocked read by
//! writing a one byte message to the slot; reads also time out periodically
//! so a failed wake cannot hang the join.

use crate::endpoint::EndpointName;

use std::io::{Error as IoError, ErrorKind, Result as IoResult};
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use windows::Win32::Foundation::{CloseHandle, GENERIC_WRITE, HANDLE};
use windows::Win32::Storage::FileSystem::{
    CreateFileW, FILE_ATTRIBUTE_NORMAL, FILE_SHARE_READ, OPEN_EXISTING, ReadFile, WriteFile,
};
use windows::Win32::System::Mailslots::CreateMailslotW;
use windows::core::{Error as WindowsError, HSTRING};

/// Longest a `ReadFile` blocks before reporting `TimedOut`.
const READ_TIMEOUT_MS: u32 = 500;

/// Sent by `close` to wake the listener. Dropped because the slot is closed.
const WAKE_MESSAGE: &[u8] = &[0];

/// Facility bits of an HRESULT wrapping a Win32 error code.
const WIN32_FACILITY_MASK: u32 = 0xFFFF_0000;
const WIN32_FACILITY: u32 = 0x8007_0000;

fn to_io_error(error: WindowsError) -> IoError {
    let code = error.code().0 as u32;
    if code & WIN32_FACILITY_MASK == WIN32_FACILITY {
        IoError::from_raw_os_error((code & 0xFFFF) as i32)
    } else {
        IoError::other(error)
    }
}

/// Write side held by a child.
#[derive(Debug)]
pub(crate) struct Sender {
    handle: HANDLE,
}

// SAFETY: kernel handles are process-wide and usable from any thread.
unsafe impl Send for Sender {}
unsafe impl Sync for Sender {}

impl Sender {
    pub(crate) fn write(&self, payload: &[u8]) -> IoResult<()> {
        let mut written = 0u32;
        // SAFETY: `handle` is open for writing until `self` is dropped.
        unsafe { WriteFile(self.handle, Some(payload), Some(&raw mut written), None) }
            .map_err(to_io_error)?;

        if written as usize != payload.len() {
            return Err(IoError::new(
                ErrorKind::WriteZero,
                format!("short mailslot write: {written} of {} bytes", payload.len()),
            ));
        }

        Ok(())
    }
}

impl Drop for Sender {
    fn drop(&mut self) {
        // SAFETY: the handle is owned and closed exactly once.
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

/// Opens the mailslot of a live parent for writing.
pub(crate) fn attach(name: &EndpointName) -> IoResult<Sender> {
    let path = HSTRING::from(name.mailslot_path());
    // SAFETY: `path` outlives the call; no security attributes or template.
    let handle = unsafe {
        CreateFileW(
            &path,
            GENERIC_WRITE.0,
            FILE_SHARE_READ,
            None,
            OPEN_EXISTING,
            FILE_ATTRIBUTE_NORMAL,
            None,
        )
    }
    .map_err(to_io_error)?;

    Ok(Sender { handle })
}

/// Read side owned by the parent.
#[derive(Debug)]
pub(crate) struct Receiver {
    handle: HANDLE,
    name: EndpointName,
    open: AtomicBool,
}

// SAFETY: see `Sender`. The handle is only closed in `Drop`, when no read can be in flight.
unsafe impl Send for Receiver {}
unsafe impl Sync for Receiver {}

/// Creates the mailslot. Fails with `AlreadyExists` when another process owns it.
pub(crate) fn create(name: &EndpointName, capacity: usize) -> IoResult<Receiver> {
    let max_message_size = u32::try_from(capacity).map_err(|_| {
        IoError::new(
            ErrorKind::InvalidInput,
            format!("mailslot capacity {capacity} does not fit in 32 bits"),
        )
    })?;

    let path = HSTRING::from(name.mailslot_path());
    // SAFETY: `path` outlives the call; default security attributes.
    let handle = unsafe { CreateMailslotW(&path, max_message_size, READ_TIMEOUT_MS, None) }
        .map_err(to_io_error)?;
    debug!("Created mailslot {name}");

    Ok(Receiver {
        handle,
        name: name.clone(),
        open: AtomicBool::new(true),
    })
}

impl Receiver {
    /// Blocks until a message arrives or the read timeout passes, which is
    /// reported as `ErrorKind::TimedOut`.
    pub(crate) fn recv(&self, buffer: &mut [u8]) -> IoResult<usize> {
        let mut read = 0u32;
        // SAFETY: the handle stays open for as long as `self` is borrowed.
        unsafe { ReadFile(self.handle, Some(buffer), Some(&raw mut read), None) }
            .map_err(to_io_error)?;
        Ok(read as usize)
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Marks the slot closed and wakes a blocked `recv`.
    pub(crate) fn close(&self) {
        if !self.open.swap(false, Ordering::AcqRel) {
            return;
        }

        match attach(&self.name).and_then(|waker| waker.write(WAKE_MESSAGE)) {
            Ok(()) => {}
            Err(error) => debug!("Wake write failed, listener exits on read timeout: {error}"),
        }
    }
}

impl Drop for Receiver {
    fn drop(&mut self) {
        self.close();
        // SAFETY: the handle is owned and closed exactly once, here.
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}
