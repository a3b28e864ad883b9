//! A reader/writer lock
//!
//! Any number of concurrent readers or exactly one writer. Every release
//! notifies all waiters. The write side records its owning thread: dropping
//! a write guard from any other thread is a concurrent-modification bug in
//! the caller and panics. Acquisition is not re-entrant: a thread that
//! tries to write while holding its own read guard deadlocks.

use parking_lot::{Condvar, Mutex};
use std::cell::UnsafeCell;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::thread::{self, ThreadId};

#[derive(Default)]
struct LockState {
    readers: usize,
    writer: bool,
    owner: Option<ThreadId>,
}

pub struct ReadWriteLock<T> {
    state: Mutex<LockState>,
    released: Condvar,
    data: UnsafeCell<T>,
}

// The state machine hands out either shared `&T` or one exclusive `&mut T`,
// so the usual RwLock bounds apply.
unsafe impl<T: Send> Send for ReadWriteLock<T> {}
unsafe impl<T: Send + Sync> Sync for ReadWriteLock<T> {}

impl<T> ReadWriteLock<T> {
    pub fn new(data: T) -> Self {
        Self {
            state: Mutex::new(LockState::default()),
            released: Condvar::new(),
            data: UnsafeCell::new(data),
        }
    }

    /// Wait until no writer is active, then take shared read access.
    pub fn read(&self) -> ReadGuard<'_, T> {
        let mut state = self.state.lock();
        while state.writer {
            self.released.wait(&mut state);
        }
        state.readers += 1;
        ReadGuard {
            lock: self,
            _not_send: PhantomData,
        }
    }

    /// Wait until no reader or writer is active, then take exclusive write
    /// access, recording the owning thread.
    pub fn write(&self) -> WriteGuard<'_, T> {
        let mut state = self.state.lock();
        while state.readers > 0 || state.writer {
            self.released.wait(&mut state);
        }
        state.writer = true;
        state.owner = Some(thread::current().id());
        WriteGuard {
            lock: self,
            _not_send: PhantomData,
        }
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: Default> Default for ReadWriteLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Shared access to the locked data; released on drop.
pub struct ReadGuard<'a, T> {
    lock: &'a ReadWriteLock<T>,
    // Pins the guard to its acquiring thread so release accounting stays
    // balanced per thread.
    _not_send: PhantomData<*const ()>,
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // No writer can be active while any read guard is live.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        let mut state = self.lock.state.lock();
        state.readers -= 1;
        if state.readers == 0 {
            self.lock.released.notify_all();
        }
    }
}

/// Exclusive access to the locked data; released on drop.
pub struct WriteGuard<'a, T> {
    lock: &'a ReadWriteLock<T>,
    _not_send: PhantomData<*const ()>,
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // This guard is the only access while the writer flag is set.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        let mut state = self.lock.state.lock();
        if state.owner != Some(thread::current().id()) {
            panic!("concurrent modification: write lock released by a thread that does not own it");
        }
        state.writer = false;
        state.owner = None;
        self.lock.released.notify_all();
    }
}
