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

//! Reference-counted ownership of backend resources with a custom deleter.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

struct HandleInner<T> {
    value: Option<T>,
    deleter: Option<Box<dyn FnOnce(T) + Send + Sync>>,
}

impl<T> Drop for HandleInner<T> {
    fn drop(&mut self) {
        if let (Some(value), Some(deleter)) = (self.value.take(), self.deleter.take()) {
            deleter(value);
        }
    }
}

/// Shared ownership of a backend resource with a destroy-once guarantee.
///
/// Clones share the same underlying resource; dropping the last owner invokes
/// the deleter exactly once, typically a backend destroy call. Used for
/// persistent resources whose lifetime is not governed by the frame pacer.
pub struct SharedHandle<T> {
    inner: Arc<HandleInner<T>>,
}

impl<T> SharedHandle<T> {
    /// Wraps `value`, arranging for `deleter` to run when the last owner is
    /// dropped.
    pub fn new(value: T, deleter: impl FnOnce(T) + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                value: Some(value),
                deleter: Some(Box::new(deleter)),
            }),
        }
    }

    /// Number of live owners, for diagnostics.
    pub fn owner_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl<T> Clone for SharedHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Deref for SharedHandle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // The value is only taken in HandleInner::drop, which cannot run
        // while an owner still holds the Arc.
        self.inner
            .value
            .as_ref()
            .expect("value present until last drop")
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedHandle").field(&**self).finish()
    }
}
