#![cfg(windows)]
use std::mem::{MaybeUninit, size_of};

use winapi::shared::basetsd::SIZE_T;
use winapi::shared::minwindef::{DWORD, FALSE, LPCVOID, LPVOID};
use winapi::um::handleapi::{CloseHandle, INVALID_HANDLE_VALUE};
use winapi::um::memoryapi::{ReadProcessMemory, VirtualQueryEx, WriteProcessMemory};
use winapi::um::processthreadsapi::OpenProcess;
use winapi::um::sysinfoapi::{GetNativeSystemInfo, SYSTEM_INFO};
use winapi::um::tlhelp32::{
    CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW, TH32CS_SNAPPROCESS,
};
use winapi::um::winnt::{
    HANDLE, MEM_COMMIT, MEM_FREE, MEM_PRIVATE, MEM_RESERVE, MEMORY_BASIC_INFORMATION,
    PAGE_EXECUTE, PAGE_EXECUTE_READ, PAGE_EXECUTE_READWRITE, PAGE_EXECUTE_WRITECOPY, PAGE_GUARD,
    PAGE_NOACCESS, PAGE_READONLY, PAGE_READWRITE, PAGE_WRITECOPY, PROCESS_QUERY_INFORMATION,
    PROCESS_VM_OPERATION, PROCESS_VM_READ, PROCESS_VM_WRITE,
};

use crate::error::OpenError;
use crate::process::{Page, ProcessDescriptor, Protection, State};

/// Native handle: an open process `HANDLE`, closed by `Drop`.
pub struct Handle(HANDLE);

impl Drop for Handle {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe {
                CloseHandle(self.0);
            }
        }
    }
}

pub(crate) fn open_process(pid: u32) -> Result<Handle, OpenError> {
    let handle = unsafe {
        OpenProcess(
            PROCESS_QUERY_INFORMATION | PROCESS_VM_READ | PROCESS_VM_WRITE | PROCESS_VM_OPERATION,
            FALSE,
            pid,
        )
    };
    if handle.is_null() {
        return Err(classify_last_error());
    }
    Ok(Handle(handle))
}

fn classify_last_error() -> OpenError {
    let err = std::io::Error::last_os_error();
    match err.raw_os_error() {
        Some(87) => OpenError::NotFound,  // ERROR_INVALID_PARAMETER: no such pid
        Some(5) => OpenError::AccessDenied, // ERROR_ACCESS_DENIED
        _ => OpenError::from_io(&err),
    }
}

fn protection_from_bits(protect: u32) -> Protection {
    Protection {
        read: protect
            & (PAGE_READONLY
                | PAGE_READWRITE
                | PAGE_WRITECOPY
                | PAGE_EXECUTE_READ
                | PAGE_EXECUTE_READWRITE
                | PAGE_EXECUTE_WRITECOPY)
            != 0,
        write: protect & (PAGE_READWRITE | PAGE_WRITECOPY | PAGE_EXECUTE_READWRITE | PAGE_EXECUTE_WRITECOPY) != 0,
        execute: protect & (PAGE_EXECUTE | PAGE_EXECUTE_READ | PAGE_EXECUTE_READWRITE | PAGE_EXECUTE_WRITECOPY) != 0,
    }
}

fn state_from_bits(state: u32, type_: u32) -> State {
    State {
        committed: state & MEM_COMMIT != 0,
        free: state & MEM_FREE != 0,
        reserved: state & MEM_RESERVE != 0,
        private: type_ == MEM_PRIVATE,
    }
}

pub(crate) fn query_regions(handle: &Handle) -> Vec<Page> {
    let (min_addr, max_addr) = application_address_range();
    let mut regions = Vec::new();
    let mut cur_addr = min_addr;

    while cur_addr < max_addr {
        let mut mbi = MaybeUninit::<MEMORY_BASIC_INFORMATION>::uninit();
        let res = unsafe {
            VirtualQueryEx(
                handle.0,
                cur_addr as LPCVOID,
                mbi.as_mut_ptr(),
                size_of::<MEMORY_BASIC_INFORMATION>() as SIZE_T,
            )
        };
        if res == 0 {
            // Failed, or reached the end of the address space.
            break;
        }
        let mbi = unsafe { mbi.assume_init() };
        let base = mbi.BaseAddress as usize;
        let size = mbi.RegionSize as usize;

        // PAGE_GUARD/PAGE_NOACCESS regions never admit a read/write; don't
        // bother surfacing them as scannable pages at all.
        if mbi.Protect & (PAGE_NOACCESS | PAGE_GUARD) == 0 {
            regions.push(Page {
                address: base,
                size,
                protection: protection_from_bits(mbi.Protect),
                state: state_from_bits(mbi.State, mbi.Type),
            });
        }

        cur_addr = base.saturating_add(size.max(1));
    }

    regions
}

fn application_address_range() -> (usize, usize) {
    unsafe {
        let mut info = MaybeUninit::<SYSTEM_INFO>::uninit();
        GetNativeSystemInfo(info.as_mut_ptr());
        let info = info.assume_init();
        (
            info.lpMinimumApplicationAddress as usize,
            info.lpMaximumApplicationAddress as usize,
        )
    }
}

/// Returns bytes actually transferred; 0 on total failure.
pub(crate) fn read(handle: &Handle, address: usize, buf: &mut [u8]) -> usize {
    unsafe {
        let mut bytes_read: SIZE_T = 0;
        let res = ReadProcessMemory(
            handle.0,
            address as LPCVOID,
            buf.as_mut_ptr() as LPVOID,
            buf.len() as SIZE_T,
            &mut bytes_read as *mut SIZE_T,
        );
        if res == 0 { 0 } else { bytes_read as usize }
    }
}

/// Returns bytes actually transferred; 0 on total failure.
pub(crate) fn write(handle: &Handle, address: usize, buf: &[u8]) -> usize {
    unsafe {
        let mut bytes_written: SIZE_T = 0;
        let res = WriteProcessMemory(
            handle.0,
            address as LPVOID,
            buf.as_ptr() as LPCVOID,
            buf.len() as SIZE_T,
            &mut bytes_written as *mut SIZE_T,
        );
        if res == 0 { 0 } else { bytes_written as usize }
    }
}

pub(crate) fn enumerate_processes() -> Vec<ProcessDescriptor> {
    let mut descriptors = Vec::new();
    unsafe {
        let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0);
        if snapshot == INVALID_HANDLE_VALUE {
            log::warn!("CreateToolhelp32Snapshot failed");
            return descriptors;
        }

        let mut entry: PROCESSENTRY32W = std::mem::zeroed();
        entry.dwSize = size_of::<PROCESSENTRY32W>() as u32;

        if Process32FirstW(snapshot, &mut entry) != FALSE {
            loop {
                let name = {
                    let len = entry
                        .szExeFile
                        .iter()
                        .position(|&c| c == 0)
                        .unwrap_or(entry.szExeFile.len());
                    String::from_utf16_lossy(&entry.szExeFile[..len])
                };
                let name = if name.is_empty() { "<unknown>".to_string() } else { name };
                descriptors.push(ProcessDescriptor { pid: entry.th32ProcessID, name });

                if Process32NextW(snapshot, &mut entry) == FALSE {
                    break;
                }
            }
        }

        CloseHandle(snapshot);
    }
    descriptors
}
