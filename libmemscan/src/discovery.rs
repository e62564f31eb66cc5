//! Process discovery: enumerate running processes and resolve a PID by name.
//! Stateless — every call re-queries the OS.

use crate::process::{Pid, ProcessDescriptor};

#[cfg(unix)]
use crate::linux::process as native;
#[cfg(windows)]
use crate::windows::process as native;

/// A snapshot of currently running processes. Enumeration failures collapse
/// to an empty list; a process whose name can't be resolved still appears,
/// carrying a placeholder name, rather than being dropped.
pub fn enumerate_processes() -> Vec<ProcessDescriptor> {
    native::enumerate_processes()
}

/// The PID of the first process (in OS enumeration order) whose name begins
/// with `prefix`, case-insensitively. An empty prefix returns `None`
/// defensively — it would otherwise match the first process in the list.
pub fn find_pid_by_name(prefix: &str) -> Option<Pid> {
    find_pid_by_name_in(enumerate_processes(), prefix)
}

fn find_pid_by_name_in(descriptors: impl IntoIterator<Item = ProcessDescriptor>, prefix: &str) -> Option<Pid> {
    if prefix.is_empty() {
        return None;
    }
    let prefix = prefix.to_lowercase();
    descriptors
        .into_iter()
        .find(|d| d.name.to_lowercase().starts_with(&prefix))
        .map(|d| d.pid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn procs() -> Vec<ProcessDescriptor> {
        vec![
            ProcessDescriptor { pid: 1, name: "systemd".into() },
            ProcessDescriptor { pid: 42, name: "FakeGame.exe".into() },
            ProcessDescriptor { pid: 43, name: "fakegame-helper".into() },
        ]
    }

    #[test]
    fn matches_case_insensitive_prefix() {
        assert_eq!(find_pid_by_name_in(procs(), "fakegame"), Some(42));
    }

    #[test]
    fn ties_resolve_to_first_in_enumeration_order() {
        assert_eq!(find_pid_by_name_in(procs(), "fake"), Some(42));
    }

    #[test]
    fn no_match_returns_none() {
        assert_eq!(find_pid_by_name_in(procs(), "NoSuch___"), None);
    }

    #[test]
    fn empty_prefix_returns_none() {
        assert_eq!(find_pid_by_name_in(procs(), ""), None);
    }
}
