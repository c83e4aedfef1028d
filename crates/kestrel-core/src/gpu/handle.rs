// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Typed resource handles and the owning handle-to-resource map.
//!
//! Every GPU resource is identified by an opaque, non-zero `u32` wrapped in a
//! per-kind newtype. Zero is reserved as "no resource"; a map hands out
//! strictly increasing values and never reuses one, so a stale handle can
//! only ever miss, never alias a different resource.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

/// A typed wrapper over a raw engine handle.
///
/// Implemented by the per-kind id newtypes (`BufferId`, `ProgramId`, ...)
/// and by [`NativeId`] on the backend side.
pub trait ResourceHandle: Copy + Eq + Hash + Debug {
    /// Wraps a raw handle value.
    fn from_raw(raw: u32) -> Self;

    /// Returns the raw handle value.
    fn raw(self) -> u32;

    /// Returns `true` for the reserved "no resource" value.
    fn is_none(self) -> bool {
        self.raw() == 0
    }
}

/// An opaque handle to a backend-native driver object.
///
/// Engine records carry one of these so the device can address the native
/// object without knowing anything about the backing API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NativeId(pub u32);

impl ResourceHandle for NativeId {
    fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    fn raw(self) -> u32 {
        self.0
    }
}

/// The release capability a mapped resource must provide.
///
/// [`ResourceMap::remove`] and [`ResourceMap::set`] invoke this exactly once
/// on the outgoing occupant, centralizing the release contract instead of
/// scattering native-API calls at every removal site.
pub trait Release {
    /// Releases whatever the resource owns. Called once, before the entry
    /// leaves the map.
    fn release(&mut self);
}

/// An owning association from a typed handle to a resource.
///
/// `add` assigns the next counter value (starting at 1) and stores the
/// resource. Looking up an unknown handle returns `None` rather than an
/// error; removing one is a silent no-op. No handle is ever compacted or
/// reassigned.
#[derive(Debug)]
pub struct ResourceMap<H, T> {
    next: u32,
    entries: HashMap<u32, T>,
    _handle: PhantomData<H>,
}

impl<H: ResourceHandle, T: Release> ResourceMap<H, T> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            next: 0,
            entries: HashMap::new(),
            _handle: PhantomData,
        }
    }

    /// Stores `value` under the next handle and returns that handle.
    pub fn add(&mut self, value: T) -> H {
        self.next += 1;
        self.entries.insert(self.next, value);
        H::from_raw(self.next)
    }

    /// Returns the resource for `handle`, or `None` if it is absent.
    pub fn get(&self, handle: H) -> Option<&T> {
        self.entries.get(&handle.raw())
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        self.entries.get_mut(&handle.raw())
    }

    /// Replaces the occupant of an existing slot, releasing the previous
    /// resource first. Storing into a vacant slot is permitted and does not
    /// advance the counter.
    pub fn set(&mut self, handle: H, value: T) {
        if let Some(mut old) = self.entries.insert(handle.raw(), value) {
            old.release();
        }
    }

    /// Releases and detaches the resource for `handle`.
    ///
    /// The released record is returned so the caller can still read
    /// identifying fields (e.g. a native id to hand to the backend).
    /// Removing an unknown handle returns `None` and is not an error.
    pub fn remove(&mut self, handle: H) -> Option<T> {
        self.entries.remove(&handle.raw()).map(|mut value| {
            value.release();
            value
        })
    }

    /// Returns `true` if `handle` currently maps to a resource.
    pub fn contains(&self, handle: H) -> bool {
        self.entries.contains_key(&handle.raw())
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no entries are live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over live `(handle, resource)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (H, &T)> {
        self.entries.iter().map(|(raw, v)| (H::from_raw(*raw), v))
    }

    /// Releases every entry and returns the detached records.
    ///
    /// Used at device termination to hand each native id back to the
    /// backend for destruction.
    pub fn drain(&mut self) -> Vec<(H, T)> {
        self.entries
            .drain()
            .map(|(raw, mut value)| {
                value.release();
                (H::from_raw(raw), value)
            })
            .collect()
    }
}

impl<H: ResourceHandle, T: Release> Default for ResourceMap<H, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct TestId(u32);

    impl ResourceHandle for TestId {
        fn from_raw(raw: u32) -> Self {
            Self(raw)
        }
        fn raw(self) -> u32 {
            self.0
        }
    }

    struct Counted {
        releases: Rc<Cell<u32>>,
    }

    impl Release for Counted {
        fn release(&mut self) {
            self.releases.set(self.releases.get() + 1);
        }
    }

    fn counted(releases: &Rc<Cell<u32>>) -> Counted {
        Counted {
            releases: Rc::clone(releases),
        }
    }

    #[test]
    fn handles_are_strictly_increasing_and_non_zero() {
        let releases = Rc::new(Cell::new(0));
        let mut map: ResourceMap<TestId, Counted> = ResourceMap::new();

        let mut previous = 0;
        for _ in 0..16 {
            let handle = map.add(counted(&releases));
            assert!(handle.raw() > 0, "handle 0 is reserved");
            assert!(handle.raw() > previous, "handles must strictly increase");
            previous = handle.raw();
        }
    }

    #[test]
    fn get_after_remove_returns_none() {
        let releases = Rc::new(Cell::new(0));
        let mut map: ResourceMap<TestId, Counted> = ResourceMap::new();

        let handle = map.add(counted(&releases));
        assert!(map.get(handle).is_some());

        map.remove(handle);
        assert!(map.get(handle).is_none());
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn double_remove_is_a_no_op() {
        let releases = Rc::new(Cell::new(0));
        let mut map: ResourceMap<TestId, Counted> = ResourceMap::new();

        let handle = map.add(counted(&releases));
        assert!(map.remove(handle).is_some());
        assert!(map.remove(handle).is_none());
        assert_eq!(releases.get(), 1, "release must run exactly once");
    }

    #[test]
    fn removed_handles_are_never_reissued() {
        let releases = Rc::new(Cell::new(0));
        let mut map: ResourceMap<TestId, Counted> = ResourceMap::new();

        let first = map.add(counted(&releases));
        map.remove(first);
        let second = map.add(counted(&releases));
        assert_ne!(first, second);
        assert!(second.raw() > first.raw());
    }

    #[test]
    fn set_releases_the_previous_occupant() {
        let releases = Rc::new(Cell::new(0));
        let mut map: ResourceMap<TestId, Counted> = ResourceMap::new();

        let handle = map.add(counted(&releases));
        map.set(handle, counted(&releases));
        assert_eq!(releases.get(), 1);
        assert!(map.get(handle).is_some());
    }

    #[test]
    fn lookup_of_reserved_zero_misses() {
        let releases = Rc::new(Cell::new(0));
        let mut map: ResourceMap<TestId, Counted> = ResourceMap::new();
        map.add(counted(&releases));
        assert!(map.get(TestId::from_raw(0)).is_none());
    }

    #[test]
    fn drain_releases_everything() {
        let releases = Rc::new(Cell::new(0));
        let mut map: ResourceMap<TestId, Counted> = ResourceMap::new();
        for _ in 0..4 {
            map.add(counted(&releases));
        }

        let drained = map.drain();
        assert_eq!(drained.len(), 4);
        assert_eq!(releases.get(), 4);
        assert!(map.is_empty());
    }
}
