//! Process facade: a portable wrapper owning an opened process handle,
//! exposing region enumeration, page reads, targeted reads/writes, and typed
//! scalar reads. Closes the handle on destruction (via `Drop` on the native
//! handle type); non-copyable, movable.

use std::cell::{Ref, RefCell};

use crate::error::{OpenError, ReadError, WriteError};
use crate::value::FromLeBytes;

#[cfg(unix)]
use crate::linux::process as native;
#[cfg(windows)]
use crate::windows::process as native;

pub type Pid = u32;

/// A process as reported by enumeration: PID and short executable name.
/// Immutable, produced by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessDescriptor {
    pub pid: Pid,
    pub name: String,
}

/// Agnostic representation of OS page-protection bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Protection {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

/// Agnostic representation of OS page-state bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct State {
    pub committed: bool,
    pub free: bool,
    pub reserved: bool,
    /// Private (anonymous/copy-on-write-owned) vs. file-backed/shared.
    pub private: bool,
}

/// A contiguous virtual-memory region in the target, as reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub address: usize,
    pub size: usize,
    pub protection: Protection,
    pub state: State,
}

impl Page {
    pub fn end(&self) -> usize {
        self.address.saturating_add(self.size)
    }
}

/// Which pages `Process::query_pages_with` admits into the scannable set.
/// The default matches spec's literal contract: committed, private,
/// read+write. Read-only regions (useful for locating constants embedded in
/// an image) can be opted into explicitly — the default is never loosened
/// silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageFilter {
    pub require_write: bool,
}

impl Default for PageFilter {
    fn default() -> Self {
        PageFilter { require_write: true }
    }
}

impl PageFilter {
    pub(crate) fn admits(&self, page: &Page) -> bool {
        page.state.committed
            && page.state.private
            && page.protection.read
            && (!self.require_write || page.protection.write)
    }
}

/// Owns an OS handle opened for query+read+write on a target PID.
pub struct Process {
    pid: Pid,
    handle: native::Handle,
    pages: RefCell<Vec<Page>>,
}

impl Process {
    /// Opens the target process. Fails if the OS denies the open.
    pub fn open(pid: Pid) -> Result<Self, OpenError> {
        let handle = native::open_process(pid)?;
        Ok(Process {
            pid,
            handle,
            pages: RefCell::new(Vec::new()),
        })
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// (Re)queries and caches the scannable region list, using the default
    /// filter (committed, private, read+write).
    pub fn query_pages(&self) -> Ref<'_, [Page]> {
        self.query_pages_with(PageFilter::default())
    }

    /// As [`Process::query_pages`], but with an explicit admission filter.
    /// Resolves the open question of whether read-only pages should ever be
    /// scannable: yes, when a caller asks for it, never by default.
    pub fn query_pages_with(&self, filter: PageFilter) -> Ref<'_, [Page]> {
        let regions = native::query_regions(&self.handle);
        let admitted: Vec<Page> = regions.into_iter().filter(|p| filter.admits(p)).collect();
        *self.pages.borrow_mut() = admitted;
        Ref::map(self.pages.borrow(), |v| v.as_slice())
    }

    /// Allocates a buffer sized to the page, issues one read, truncates to
    /// actual bytes read. `None` when zero bytes are read.
    pub fn read_page(&self, page: &Page) -> Option<Vec<u8>> {
        let mut buf = vec![0u8; page.size];
        let n = native::read(&self.handle, page.address, &mut buf);
        if n == 0 {
            return None;
        }
        buf.truncate(n);
        Some(buf)
    }

    /// Reads exactly `buf.len()` bytes, or fails.
    pub fn read_into(&self, address: usize, buf: &mut [u8]) -> Result<(), ReadError> {
        let n = native::read(&self.handle, address, buf);
        if n == buf.len() {
            Ok(())
        } else if n == 0 {
            Err(ReadError::Unreadable)
        } else {
            Err(ReadError::ShortRead)
        }
    }

    /// All-or-nothing from the caller's perspective.
    pub fn write(&self, address: usize, bytes: &[u8]) -> Result<(), WriteError> {
        let n = native::write(&self.handle, address, bytes);
        if n == bytes.len() {
            Ok(())
        } else {
            Err(WriteError::ShortWrite)
        }
    }

    /// Reads a fixed-width scalar via a bit-for-bit reinterpret of the bytes
    /// read into a stack buffer — never a pointer cast.
    pub fn read_typed<T: FromLeBytes>(&self, address: usize) -> Option<T> {
        let mut buf = vec![0u8; T::WIDTH];
        self.read_into(address, &mut buf).ok()?;
        T::from_le_bytes_slice(&buf)
    }
}

/// Portable surface a [`crate::scanner::Scan`] narrows against. `Process` is
/// the only implementation that talks to a real OS target, and the only one
/// that's hard to test. Anything else implementing this trait (a fake target
/// in tests) exercises the exact same scan logic without an OS process on
/// the other end.
pub trait MemoryAccessor {
    fn pid(&self) -> Pid;
    /// Scannable pages using the default admission filter.
    fn query_pages(&self) -> Vec<Page>;
    fn read_page(&self, page: &Page) -> Option<Vec<u8>>;
    fn read_into(&self, address: usize, buf: &mut [u8]) -> Result<(), ReadError>;
    fn write(&self, address: usize, bytes: &[u8]) -> Result<(), WriteError>;
}

impl MemoryAccessor for Process {
    fn pid(&self) -> Pid {
        self.pid()
    }

    fn query_pages(&self) -> Vec<Page> {
        self.query_pages().to_vec()
    }

    fn read_page(&self, page: &Page) -> Option<Vec<u8>> {
        self.read_page(page)
    }

    fn read_into(&self, address: usize, buf: &mut [u8]) -> Result<(), ReadError> {
        self.read_into(address, buf)
    }

    fn write(&self, address: usize, bytes: &[u8]) -> Result<(), WriteError> {
        self.write(address, bytes)
    }
}
