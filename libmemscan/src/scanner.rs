//! The scan engine: the stateful centerpiece that holds a candidate set and
//! the generation immediately preceding it, and narrows the candidate set
//! across successive observations of a live target.
//!
//! A `Find`/`Narrow`/`FilterChanged` trio operating on a current/previous
//! generation pair. `Narrow<T>` generalizes into [`Scan::filter_equals`]
//! over any [`Value`], and `FilterChanged` grows an
//! unchanged/increased/decreased family rather than one bespoke method.

use std::collections::HashMap;
use std::rc::Rc;

use crate::concurrency::StopToken;
use crate::error::ScanError;
use crate::pattern::search_offsets;
use crate::process::MemoryAccessor;
use crate::value::{Value, ValueKind, compare};

/// One candidate: the address in the target and the bytes last observed
/// there, at the scan's current width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub address: usize,
    pub bytes: Vec<u8>,
}

/// Holds the current candidate set and the generation immediately preceding
/// it. Bound to a single [`MemoryAccessor`], shared so a GUI or driver can
/// hold the same process the scan reads from.
pub struct Scan {
    process: Rc<dyn MemoryAccessor>,
    current: Vec<MatchRecord>,
    previous: Vec<MatchRecord>,
    kind: ValueKind,
    /// Distinguishes "never scanned" (an operation on it is misuse) from
    /// "scanned down to zero candidates" (a legitimate empty result).
    populated: bool,
}

impl Scan {
    /// A new scan bound to `process`, in the Empty state.
    pub fn new(process: Rc<dyn MemoryAccessor>) -> Self {
        Scan {
            process,
            current: Vec::new(),
            previous: Vec::new(),
            kind: ValueKind::Bytes(0),
            populated: false,
        }
    }

    pub fn width(&self) -> usize {
        self.kind.width()
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.current
    }

    pub fn process(&self) -> &Rc<dyn MemoryAccessor> {
        &self.process
    }

    /// Initial (or re-)scan for a typed value. Replaces [`Scan::find_bytes`]
    /// when the caller knows the scalar kind (so later `filter_increased`/
    /// `filter_decreased` know its signedness).
    pub fn find(&mut self, value: &Value) -> Result<&[MatchRecord], ScanError> {
        self.find_with(value, &StopToken::never())
    }

    pub fn find_with(&mut self, value: &Value, stop: &StopToken) -> Result<&[MatchRecord], ScanError> {
        let needle = value.to_bytes();
        if needle.is_empty() {
            return Err(ScanError::WidthMismatch);
        }
        let kind = value.kind();
        let alignment = kind.default_alignment();
        self.run_find(&needle, kind, alignment, stop)
    }

    /// Initial (or re-)scan for a raw byte pattern (no scalar interpretation;
    /// `filter_increased`/`filter_decreased` fall back to lexicographic
    /// comparison for the resulting [`ValueKind::Bytes`] scan).
    pub fn find_bytes(&mut self, needle: &[u8]) -> Result<&[MatchRecord], ScanError> {
        self.find_bytes_with(needle, None, &StopToken::never())
    }

    pub fn find_bytes_with(
        &mut self,
        needle: &[u8],
        alignment: Option<usize>,
        stop: &StopToken,
    ) -> Result<&[MatchRecord], ScanError> {
        if needle.is_empty() {
            return Err(ScanError::WidthMismatch);
        }
        let kind = ValueKind::Bytes(needle.len());
        let alignment = alignment.unwrap_or_else(|| kind.default_alignment());
        self.run_find(needle, kind, alignment, stop)
    }

    fn run_find(
        &mut self,
        needle: &[u8],
        kind: ValueKind,
        alignment: usize,
        stop: &StopToken,
    ) -> Result<&[MatchRecord], ScanError> {
        self.previous = std::mem::take(&mut self.current);
        self.kind = kind;

        let pages = self.process.query_pages();
        let mut records = Vec::new();
        for page in &pages {
            if stop.is_stopped() {
                break;
            }
            let Some(bytes) = self.process.read_page(page) else {
                continue;
            };
            for offset in search_offsets(&bytes, needle, alignment) {
                records.push(MatchRecord {
                    address: page.address + offset as usize,
                    bytes: needle.to_vec(),
                });
            }
        }
        self.current = records;
        self.populated = true;
        Ok(&self.current)
    }

    /// Re-reads bytes at every current address in place. Records with
    /// failing reads are dropped. `previous` is untouched.
    pub fn refresh(&mut self) -> Result<&[MatchRecord], ScanError> {
        self.refresh_with(&StopToken::never())
    }

    pub fn refresh_with(&mut self, stop: &StopToken) -> Result<&[MatchRecord], ScanError> {
        self.require_populated()?;
        let width = self.width();
        let mut refreshed = Vec::with_capacity(self.current.len());
        for record in &self.current {
            if stop.is_stopped() {
                break;
            }
            let mut buf = vec![0u8; width];
            if self.process.read_into(record.address, &mut buf).is_ok() {
                refreshed.push(MatchRecord { address: record.address, bytes: buf });
            }
        }
        self.current = refreshed;
        Ok(&self.current)
    }

    /// Narrows against a new constant. `value`'s width must match the scan's
    /// current width.
    pub fn filter_equals(&mut self, value: &Value) -> Result<&[MatchRecord], ScanError> {
        self.filter_equals_with(value, &StopToken::never())
    }

    pub fn filter_equals_with(&mut self, value: &Value, stop: &StopToken) -> Result<&[MatchRecord], ScanError> {
        self.require_populated()?;
        let needle = value.to_bytes();
        if needle.len() != self.width() {
            return Err(ScanError::WidthMismatch);
        }
        let retained = self.collect_retained(stop, |_addr, fresh, _prev| fresh == needle.as_slice());
        self.commit(retained);
        Ok(&self.current)
    }

    /// Retains candidates whose bytes differ from the previous generation.
    pub fn filter_changed(&mut self) -> Result<&[MatchRecord], ScanError> {
        self.filter_changed_with(&StopToken::never())
    }

    pub fn filter_changed_with(&mut self, stop: &StopToken) -> Result<&[MatchRecord], ScanError> {
        self.require_populated()?;
        self.require_prior_generation()?;
        let retained = self.collect_retained(stop, |_addr, fresh, prev| fresh != prev);
        self.commit(retained);
        Ok(&self.current)
    }

    /// Retains candidates whose bytes match the previous generation.
    pub fn filter_unchanged(&mut self) -> Result<&[MatchRecord], ScanError> {
        self.filter_unchanged_with(&StopToken::never())
    }

    pub fn filter_unchanged_with(&mut self, stop: &StopToken) -> Result<&[MatchRecord], ScanError> {
        self.require_populated()?;
        self.require_prior_generation()?;
        let retained = self.collect_retained(stop, |_addr, fresh, prev| fresh == prev);
        self.commit(retained);
        Ok(&self.current)
    }

    /// Retains candidates whose value strictly increased since the previous
    /// generation, interpreted per the scan's current [`ValueKind`]. NaN (or
    /// any other incomparable encoding) never counts as increased.
    pub fn filter_increased(&mut self) -> Result<&[MatchRecord], ScanError> {
        self.filter_increased_with(&StopToken::never())
    }

    pub fn filter_increased_with(&mut self, stop: &StopToken) -> Result<&[MatchRecord], ScanError> {
        self.require_populated()?;
        self.require_prior_generation()?;
        let kind = self.kind;
        let retained = self.collect_retained(stop, move |_addr, fresh, prev| {
            compare(kind, fresh, prev) == Some(std::cmp::Ordering::Greater)
        });
        self.commit(retained);
        Ok(&self.current)
    }

    /// Retains candidates whose value strictly decreased since the previous
    /// generation. See [`Scan::filter_increased`] for the NaN contract.
    pub fn filter_decreased(&mut self) -> Result<&[MatchRecord], ScanError> {
        self.filter_decreased_with(&StopToken::never())
    }

    pub fn filter_decreased_with(&mut self, stop: &StopToken) -> Result<&[MatchRecord], ScanError> {
        self.require_populated()?;
        self.require_prior_generation()?;
        let kind = self.kind;
        let retained = self.collect_retained(stop, move |_addr, fresh, prev| {
            compare(kind, fresh, prev) == Some(std::cmp::Ordering::Less)
        });
        self.commit(retained);
        Ok(&self.current)
    }

    /// Forwards to the bound process. Convenience so callers don't need to
    /// hold their own reference to it just to write a located candidate.
    pub fn write_at(&self, address: usize, bytes: &[u8]) -> Result<(), crate::error::WriteError> {
        self.process.write(address, bytes)
    }

    fn require_populated(&self) -> Result<(), ScanError> {
        if self.populated {
            Ok(())
        } else {
            Err(ScanError::NotPopulated)
        }
    }

    /// `filter_changed`/`filter_unchanged`/`filter_increased`/`filter_decreased`
    /// all compare against the generation before the current one; with none
    /// recorded yet (only true immediately after the very first `find`)
    /// there is nothing to compare against.
    fn require_prior_generation(&self) -> Result<(), ScanError> {
        if self.previous.is_empty() {
            Err(ScanError::NotPopulated)
        } else {
            Ok(())
        }
    }

    /// Re-reads each current address and keeps it iff `keep(address, fresh,
    /// previous_bytes)` holds; a failed read always drops the record.
    /// `previous_bytes` is looked up from `self.previous` by address (the
    /// invariant `current ⊆ previous` makes every lookup succeed, but a
    /// caller that doesn't need it — `filter_equals` — gets an empty slice).
    fn collect_retained(
        &self,
        stop: &StopToken,
        keep: impl Fn(usize, &[u8], &[u8]) -> bool,
    ) -> Vec<MatchRecord> {
        let by_address: HashMap<usize, &[u8]> =
            self.previous.iter().map(|r| (r.address, r.bytes.as_slice())).collect();
        let width = self.width();
        let mut retained = Vec::with_capacity(self.current.len());
        for record in &self.current {
            if stop.is_stopped() {
                break;
            }
            let mut fresh = vec![0u8; width];
            if self.process.read_into(record.address, &mut fresh).is_err() {
                continue;
            }
            let prev_bytes = by_address.get(&record.address).copied().unwrap_or(&[]);
            if keep(record.address, &fresh, prev_bytes) {
                retained.push(MatchRecord { address: record.address, bytes: fresh });
            }
        }
        retained
    }

    /// `previous` becomes what `current` was before this operation;
    /// `current` becomes the freshly retained set. Mirrors `find`'s swap so
    /// every narrowing operation leaves the same two-generation shape.
    fn commit(&mut self, retained: Vec<MatchRecord>) {
        self.previous = std::mem::replace(&mut self.current, retained);
    }
}
