//! Unix endpoint: a datagram socket plus an advisory lock file.
//!
//! The parent holds an exclusive `flock` on `<name>.lock` for as long as it
//! owns the endpoint. The kernel drops the lock when the process dies, so a
//! socket file left behind by a crashed parent is recognised as stale and
//! replaced by whoever takes the lock next. The lock file is never deleted:
//! unlinking it while another launcher has it open would let two processes
//! lock two different inodes.
//!
//! The parent also writes its receive capacity into the lock file so a child
//! can refuse an oversized payload instead of having it truncated. A child
//! that cannot read it does not attach.
//!
//! Socket buffers are sized from the capacity on both ends. The BSD default
//! send buffer (`net.local.dgram.maxdgram`, 2048 bytes on macOS) is also the
//! largest datagram the kernel accepts.

use crate::endpoint::EndpointName;

use std::fs::{File, OpenOptions, create_dir_all, read_to_string, remove_file};
use std::io::{Error as IoError, ErrorKind, Result as IoResult, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixDatagram;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use fs2::FileExt;
use log::{debug, warn};
use nix::sys::socket::{GetSockOpt, SetSockOpt, getsockopt, setsockopt, sockopt};

/// Per-datagram bookkeeping the kernel charges against a socket buffer.
const DATAGRAM_OVERHEAD: usize = 1024;

/// Full-size datagrams the parent can hold while its handler runs.
const QUEUED_DATAGRAMS: usize = 8;

/// Raises a socket buffer to at least `wanted` bytes. Never shrinks it.
fn grow_buffer<O>(socket: &UnixDatagram, option: O, wanted: usize) -> IoResult<()>
where
    O: GetSockOpt<Val = usize> + SetSockOpt<Val = usize> + Copy,
{
    let current = getsockopt(socket, option)?;
    if current < wanted {
        setsockopt(socket, option, &wanted)?;
        debug!("Socket buffer raised from {current} to {wanted} bytes");
    }
    Ok(())
}

/// Write side held by a child.
#[derive(Debug)]
pub(crate) struct Sender {
    socket: UnixDatagram,
    capacity: usize,
}

impl Sender {
    /// Sends `payload` as a single datagram.
    pub(crate) fn write(&self, payload: &[u8]) -> IoResult<()> {
        if payload.len() > self.capacity {
            return Err(IoError::new(
                ErrorKind::InvalidInput,
                format!(
                    "payload of {} bytes exceeds the parent's capacity of {} bytes",
                    payload.len(),
                    self.capacity
                ),
            ));
        }

        let written = self.socket.send(payload)?;
        if written != payload.len() {
            return Err(IoError::new(
                ErrorKind::WriteZero,
                format!("short datagram write: {written} of {} bytes", payload.len()),
            ));
        }

        Ok(())
    }
}

/// Connects to the socket of a live parent.
///
/// Fails with `NotFound` when no socket exists, `ConnectionRefused` when
/// the socket file is stale and `InvalidData` when the parent's capacity
/// cannot be read from the lock file.
pub(crate) fn attach(name: &EndpointName) -> IoResult<Sender> {
    let socket = UnixDatagram::unbound()?;
    socket.connect(name.socket_path())?;

    let published = read_to_string(name.lock_path())?;
    let capacity = published.trim().parse::<usize>().map_err(|e| {
        IoError::new(
            ErrorKind::InvalidData,
            format!("no parent capacity in {}: {e}", name.lock_path().display()),
        )
    })?;

    grow_buffer(
        &socket,
        sockopt::SndBuf,
        capacity.saturating_add(DATAGRAM_OVERHEAD),
    )?;

    Ok(Sender { socket, capacity })
}

/// Read side owned by the parent.
#[derive(Debug)]
pub(crate) struct Receiver {
    socket: UnixDatagram,
    socket_path: PathBuf,
    // Held only for its flock; released when the receiver is dropped.
    _lock: File,
    open: AtomicBool,
}

/// Takes the lock, publishes `capacity` and binds the socket.
///
/// Returns a `WouldBlock` error when another process holds the lock.
pub(crate) fn create(name: &EndpointName, capacity: usize) -> IoResult<Receiver> {
    create_dir_all(name.directory())?;

    let mut lock = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(name.lock_path())?;
    lock.try_lock_exclusive()?;

    lock.set_len(0)?;
    writeln!(lock, "{capacity}")?;

    let socket_path = name.socket_path();
    match remove_file(&socket_path) {
        Ok(()) => debug!("Removed stale socket {}", socket_path.display()),
        Err(error) if error.kind() == ErrorKind::NotFound => {}
        Err(error) => return Err(error),
    }

    let socket = UnixDatagram::bind(&socket_path)?;
    debug!("Bound instance socket {}", socket_path.display());

    // Built before sizing so a failure below still unlinks the socket.
    let receiver = Receiver {
        socket,
        socket_path,
        _lock: lock,
        open: AtomicBool::new(true),
    };
    grow_buffer(
        &receiver.socket,
        sockopt::RcvBuf,
        capacity
            .saturating_add(DATAGRAM_OVERHEAD)
            .saturating_mul(QUEUED_DATAGRAMS),
    )?;

    Ok(receiver)
}

impl Receiver {
    /// Blocks until a datagram arrives. A datagram longer than `buffer` is
    /// truncated to `buffer.len()`.
    pub(crate) fn recv(&self, buffer: &mut [u8]) -> IoResult<usize> {
        self.socket.recv(buffer)
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Marks the endpoint closed and wakes a blocked `recv`.
    ///
    /// `shutdown` makes a pending `recv` return on Linux; the empty datagram
    /// covers platforms where shutting down an unconnected socket is refused.
    pub(crate) fn close(&self) {
        if !self.open.swap(false, Ordering::AcqRel) {
            return;
        }

        if let Err(error) = self.socket.shutdown(Shutdown::Both) {
            debug!("Socket shutdown refused, waking listener instead: {error}");
        }

        if let Ok(waker) = UnixDatagram::unbound() {
            let _ = waker.send_to(&[], &self.socket_path);
        }
    }
}

impl Drop for Receiver {
    fn drop(&mut self) {
        self.close();

        // Still holding the lock here, so the path is ours to remove.
        match remove_file(&self.socket_path) {
            Ok(()) => debug!("Removed instance socket {}", self.socket_path.display()),
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => warn!(
                "Failed to remove instance socket {}: {error}",
                self.socket_path.display()
            ),
        }
    }
}
