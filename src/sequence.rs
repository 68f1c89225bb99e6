//! Read-only empty sequence
//!
//! [`EmptyList`] stands in wherever a growable list must be returned but
//! there is nothing in it. It is zero-sized, so every value is the same
//! shared instance and returning one never allocates.
//!
//! Its inherent API is read-only. Code that is generic over [`Sequence`]
//! can still attempt a mutation; every such attempt fails with
//! [`BindError::UnsupportedOperation`] and leaves the list empty.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

use crate::error::{BindError, Result};

/// Random-access sequence with fallible mutation
pub trait Sequence<T> {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> Option<&T>;

    fn push(&mut self, value: T) -> Result<()>;

    fn insert(&mut self, index: usize, value: T) -> Result<()>;

    /// Remove by index; `Ok(None)` when out of bounds
    fn remove(&mut self, index: usize) -> Result<Option<T>>;

    /// Remove the first element equal to `value`
    fn remove_item(&mut self, value: &T) -> Result<bool>
    where
        T: PartialEq;

    fn clear(&mut self) -> Result<()>;

    fn extend_from(&mut self, values: Vec<T>) -> Result<()>;

    fn reserve(&mut self, additional: usize) -> Result<()>;
}

impl<T> Sequence<T> for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    fn push(&mut self, value: T) -> Result<()> {
        Vec::push(self, value);
        Ok(())
    }

    fn insert(&mut self, index: usize, value: T) -> Result<()> {
        if index > Vec::len(self) {
            return Err(BindError::IndexOutOfBounds {
                index,
                len: Vec::len(self),
            });
        }
        Vec::insert(self, index, value);
        Ok(())
    }

    fn remove(&mut self, index: usize) -> Result<Option<T>> {
        if index >= Vec::len(self) {
            return Ok(None);
        }
        Ok(Some(Vec::remove(self, index)))
    }

    fn remove_item(&mut self, value: &T) -> Result<bool>
    where
        T: PartialEq,
    {
        match self.iter().position(|v| v == value) {
            Some(index) => {
                Vec::remove(self, index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn clear(&mut self) -> Result<()> {
        Vec::clear(self);
        Ok(())
    }

    fn extend_from(&mut self, values: Vec<T>) -> Result<()> {
        Vec::extend(self, values);
        Ok(())
    }

    fn reserve(&mut self, additional: usize) -> Result<()> {
        Vec::reserve(self, additional);
        Ok(())
    }
}

/// The empty list; zero-sized, immutable, shared
pub struct EmptyList<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> EmptyList<T> {
    pub const SHARED: Self = Self::new();

    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    /// View as a slice of any lifetime
    pub fn as_slice<'a>(self) -> &'a [T] {
        &[]
    }

    pub fn len(&self) -> usize {
        0
    }

    pub fn is_empty(&self) -> bool {
        true
    }

    pub fn get(&self, _index: usize) -> Option<&T> {
        None
    }
}

/// The shared empty list for `T`
pub fn empty_list<T>() -> EmptyList<T> {
    EmptyList::SHARED
}

impl<T> Clone for EmptyList<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EmptyList<T> {}

impl<T> Default for EmptyList<T> {
    fn default() -> Self {
        Self::SHARED
    }
}

impl<T> fmt::Debug for EmptyList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EmptyList")
    }
}

impl<T> Deref for EmptyList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<'a, T> IntoIterator for &'a EmptyList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

fn unsupported<R>(operation: &'static str) -> Result<R> {
    Err(BindError::UnsupportedOperation { operation })
}

impl<T> Sequence<T> for EmptyList<T> {
    fn len(&self) -> usize {
        0
    }

    fn get(&self, _index: usize) -> Option<&T> {
        None
    }

    fn push(&mut self, _value: T) -> Result<()> {
        unsupported("push")
    }

    fn insert(&mut self, _index: usize, _value: T) -> Result<()> {
        unsupported("insert")
    }

    fn remove(&mut self, _index: usize) -> Result<Option<T>> {
        unsupported("remove")
    }

    fn remove_item(&mut self, _value: &T) -> Result<bool>
    where
        T: PartialEq,
    {
        unsupported("remove_item")
    }

    fn clear(&mut self) -> Result<()> {
        unsupported("clear")
    }

    fn extend_from(&mut self, _values: Vec<T>) -> Result<()> {
        unsupported("extend_from")
    }

    fn reserve(&mut self, _additional: usize) -> Result<()> {
        unsupported("reserve")
    }
}
