#![cfg(unix)]
use std::fs::{self, File, OpenOptions, read_link};
use std::io::{BufRead, BufReader};
use std::os::unix::fs::FileExt;
use std::path::Path;

use crate::error::OpenError;
use crate::process::{Page, ProcessDescriptor, Protection, State};

/// Native handle: an open `/proc/<pid>/mem` file descriptor plus the pid it
/// was opened for. Closed by `File`'s own `Drop`.
pub struct Handle {
    pid: u32,
    mem: File,
}

pub(crate) fn open_process(pid: u32) -> Result<Handle, OpenError> {
    let mem_path = format!("/proc/{pid}/mem");
    let mem = OpenOptions::new()
        .read(true)
        .write(true)
        .open(&mem_path)
        .map_err(|e| OpenError::from_io(&e))?;
    Ok(Handle { pid, mem })
}

pub(crate) fn query_regions(handle: &Handle) -> Vec<Page> {
    let maps_path = format!("/proc/{}/maps", handle.pid);
    let file = match File::open(&maps_path) {
        Ok(f) => f,
        Err(e) => {
            log::warn!("failed to open {maps_path}: {e}");
            return Vec::new();
        }
    };

    let mut regions = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::debug!("failed to read a /proc/{}/maps line: {e}", handle.pid);
                continue;
            }
        };
        // `start-end perms offset dev:inode pathname`
        let mut parts = line.splitn(6, ' ').filter(|s| !s.is_empty());
        let addr = parts.next().unwrap_or("");
        let perms = parts.next().unwrap_or("");

        let mut addr_it = addr.split('-');
        let (Some(start_hex), Some(end_hex)) = (addr_it.next(), addr_it.next()) else {
            continue;
        };
        let Ok(start) = usize::from_str_radix(start_hex, 16) else {
            continue;
        };
        let Ok(end) = usize::from_str_radix(end_hex, 16) else {
            continue;
        };

        let bytes = perms.as_bytes();
        let read = bytes.first().is_some_and(|&c| c == b'r');
        let write = bytes.get(1).is_some_and(|&c| c == b'w');
        let execute = bytes.get(2).is_some_and(|&c| c == b'x');
        let shared = bytes.get(3).is_some_and(|&c| c == b's');

        regions.push(Page {
            address: start,
            size: end.saturating_sub(start),
            protection: Protection { read, write, execute },
            state: State {
                // A present /proc/pid/maps entry is, by definition, committed.
                committed: true,
                free: false,
                reserved: false,
                private: !shared,
            },
        });
    }

    regions.sort_by_key(|p| p.address);
    regions
}

/// Returns bytes actually transferred; 0 on total failure.
pub(crate) fn read(handle: &Handle, address: usize, buf: &mut [u8]) -> usize {
    handle.mem.read_at(buf, address as u64).unwrap_or(0)
}

/// Returns bytes actually transferred; 0 on total failure.
pub(crate) fn write(handle: &Handle, address: usize, buf: &[u8]) -> usize {
    handle.mem.write_at(buf, address as u64).unwrap_or(0)
}

pub(crate) fn enumerate_processes() -> Vec<ProcessDescriptor> {
    let entries = match fs::read_dir("/proc") {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("failed to read /proc: {e}");
            return Vec::new();
        }
    };

    let mut descriptors = Vec::new();
    for entry in entries.flatten() {
        let fname = entry.file_name();
        let fname = fname.to_string_lossy();
        if !fname.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let Ok(pid) = fname.parse::<u32>() else {
            continue;
        };
        let name = process_name(pid).unwrap_or_else(|| "<unknown>".to_string());
        descriptors.push(ProcessDescriptor { pid, name });
    }
    descriptors
}

fn process_name(pid: u32) -> Option<String> {
    if let Ok(comm) = fs::read_to_string(format!("/proc/{pid}/comm")) {
        let trimmed = comm.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    let link = read_link(format!("/proc/{pid}/exe")).ok()?;
    Path::new(&link)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
}
