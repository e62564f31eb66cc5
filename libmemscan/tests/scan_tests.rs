//! End-to-end scan-engine scenarios driven against an in-process fake
//! target, since a real OS process is an external collaborator (the
//! "fake target" demonstration program is explicitly out of scope for this
//! crate). Scenario numbering follows the literal cases this crate's scan
//! engine is specified against.

use std::cell::RefCell;
use std::rc::Rc;

use libmemscan::{MatchRecord, MemoryAccessor, Page, Pid, Protection, ReadError, Scan, ScanError, State, Value, WriteError};

/// A single writable page over an owned buffer.
struct FakeTarget {
    base: usize,
    data: RefCell<Vec<u8>>,
}

impl FakeTarget {
    fn new(base: usize, data: Vec<u8>) -> Self {
        FakeTarget { base, data: RefCell::new(data) }
    }
}

impl MemoryAccessor for FakeTarget {
    fn pid(&self) -> Pid {
        1
    }

    fn query_pages(&self) -> Vec<Page> {
        vec![Page {
            address: self.base,
            size: self.data.borrow().len(),
            protection: Protection { read: true, write: true, execute: false },
            state: State { committed: true, free: false, reserved: false, private: true },
        }]
    }

    fn read_page(&self, page: &Page) -> Option<Vec<u8>> {
        (page.address == self.base).then(|| self.data.borrow().clone())
    }

    fn read_into(&self, address: usize, buf: &mut [u8]) -> Result<(), ReadError> {
        let data = self.data.borrow();
        let offset = address.checked_sub(self.base).ok_or(ReadError::Unreadable)?;
        let end = offset.checked_add(buf.len()).ok_or(ReadError::Unreadable)?;
        let src = data.get(offset..end).ok_or(ReadError::Unreadable)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write(&self, address: usize, bytes: &[u8]) -> Result<(), WriteError> {
        let offset = address.checked_sub(self.base).ok_or(WriteError::Unwritable)?;
        let mut data = self.data.borrow_mut();
        let end = offset + bytes.len();
        if end > data.len() {
            return Err(WriteError::Unwritable);
        }
        data[offset..end].copy_from_slice(bytes);
        Ok(())
    }
}

/// Scenario 1 & 2 & 3: locate a little-endian i32, observe it change, narrow
/// onto the new value, then fail to narrow back onto the old one.
#[test]
fn scenario_find_then_narrow_across_a_target_mutation() {
    let page = vec![0x00, 0x00, 0x00, 0x00, 0x39, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
    let target = Rc::new(FakeTarget::new(0x400_000, page));
    let mut scan = Scan::new(target.clone());

    let found = scan.find(&Value::I32(1337)).unwrap();
    assert_eq!(found, &[MatchRecord { address: 0x400_000 + 4, bytes: vec![0x39, 0x05, 0x00, 0x00] }]);

    target.write(0x400_000 + 4, &[0x3A, 0x05, 0x00, 0x00]).unwrap();
    let narrowed = scan.filter_equals(&Value::I32(1338)).unwrap();
    assert_eq!(narrowed, &[MatchRecord { address: 0x400_000 + 4, bytes: vec![0x3A, 0x05, 0x00, 0x00] }]);

    let empty = scan.filter_equals(&Value::I32(1337)).unwrap();
    assert!(empty.is_empty());
}

/// Scenario 4: eight consecutive i32s; find the slot holding 4, bump it to
/// 5 and see `filter_increased` keep it, then drop it back to 4 and see
/// `filter_decreased` reject it.
#[test]
fn scenario_increased_then_decreased_over_a_run_of_integers() {
    let mut page = Vec::new();
    for v in 1i32..=8 {
        page.extend_from_slice(&v.to_le_bytes());
    }
    let base = 0x10_0000;
    let target = Rc::new(FakeTarget::new(base, page));
    let mut scan = Scan::new(target.clone());

    let found = scan.find(&Value::I32(4)).unwrap();
    assert_eq!(found.len(), 1);
    let addr = found[0].address;
    assert_eq!(addr, base + 3 * 4);

    target.write(addr, &5i32.to_le_bytes()).unwrap();
    assert_eq!(scan.filter_increased().unwrap().len(), 1);

    target.write(addr, &4i32.to_le_bytes()).unwrap();
    assert!(scan.filter_decreased().unwrap().is_empty());
}

/// Scenario 5: a byte-array needle occurring at two offsets, one of which
/// is 4-aligned; alignment=4 keeps only the aligned one.
#[test]
fn scenario_byte_pattern_alignment_filters_one_of_two_matches() {
    let mut page = vec![0u8; 20];
    page[2..6].copy_from_slice(b"ABCD");
    page[10..14].copy_from_slice(b"ABCD");
    let base = 0x2000;
    let target = Rc::new(FakeTarget::new(base, page));
    let mut scan = Scan::new(target);

    let both = scan.find_bytes_with(b"ABCD", Some(1), &libmemscan::StopToken::never()).unwrap();
    assert_eq!(both.iter().map(|m| m.address).collect::<Vec<_>>(), vec![base + 2, base + 10]);

    let aligned = scan.find_bytes_with(b"ABCD", Some(4), &libmemscan::StopToken::never()).unwrap();
    assert_eq!(aligned.iter().map(|m| m.address).collect::<Vec<_>>(), vec![base + 10]);
}

#[test]
fn scenario_all_pages_unreadable_yields_empty_scan_not_an_error() {
    struct Unreadable;
    impl MemoryAccessor for Unreadable {
        fn pid(&self) -> Pid {
            1
        }
        fn query_pages(&self) -> Vec<Page> {
            vec![Page {
                address: 0x5000,
                size: 16,
                protection: Protection { read: true, write: true, execute: false },
                state: State { committed: true, free: false, reserved: false, private: true },
            }]
        }
        fn read_page(&self, _page: &Page) -> Option<Vec<u8>> {
            None
        }
        fn read_into(&self, _address: usize, _buf: &mut [u8]) -> Result<(), ReadError> {
            Err(ReadError::Unreadable)
        }
        fn write(&self, _address: usize, _bytes: &[u8]) -> Result<(), WriteError> {
            Err(WriteError::Unwritable)
        }
    }

    let mut scan = Scan::new(Rc::new(Unreadable));
    let found = scan.find(&Value::I32(1337)).unwrap();
    assert!(found.is_empty());
}

#[test]
fn empty_needle_is_rejected_with_width_mismatch() {
    let target = Rc::new(FakeTarget::new(0x1000, vec![0u8; 8]));
    let mut scan = Scan::new(target);
    assert_eq!(scan.find_bytes(b""), Err(ScanError::WidthMismatch));
}
