/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * Global Trust Authority is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use log::{debug, info};
use once_cell::sync::{Lazy, OnceCell};
use parking_lot::Mutex;

/// Type-erased view of one type's slot, an `OnceCell<Arc<T>>`.
trait SlotState: Send + Sync {
    fn is_filled(&self) -> bool;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> SlotState for OnceCell<Arc<T>> {
    fn is_filled(&self) -> bool {
        self.get().is_some()
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

type Slot = Arc<dyn SlotState>;
type TypedSlot<T> = Arc<OnceCell<Arc<T>>>;

// Process-wide registry
static GLOBAL_REGISTRY: Lazy<SingletonRegistry> = Lazy::new(SingletonRegistry::new);

/// Returns the process-wide registry.
///
/// The registry starts empty when the process starts and lives until it exits. Callers
/// that need isolation (tests, embedded use) can create their own [`SingletonRegistry`]
/// and pass it by reference instead.
pub fn global() -> &'static SingletonRegistry {
    &GLOBAL_REGISTRY
}

/// Records at most one live instance per type.
///
/// Every slot is either absent or present. A slot becomes present on the first
/// `get_or_create`/`get_or_try_create` for its type and absent again on `reset` or
/// `reset_all`. Holders of an instance keep it after a reset; the registry only stops
/// handing it out.
///
/// Each type has its own slot lock. Concurrent first requests for one type wait for a
/// single factory call, while requests for other types proceed.
pub struct SingletonRegistry {
    slots: Mutex<HashMap<TypeId, Slot>>,
}

impl SingletonRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        SingletonRegistry {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the instance recorded for `T`, building it with `factory` if the slot is absent.
    ///
    /// The factory may request singletons of other types from the same registry, but not
    /// of `T` itself.
    pub fn get_or_create<T, F>(&self, factory: F) -> Arc<T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        match self.get_or_try_create::<T, Infallible, _>(|| Ok(factory())) {
            Ok(instance) => instance,
            Err(never) => match never {},
        }
    }

    /// Fallible variant of [`get_or_create`](Self::get_or_create).
    ///
    /// If the registry is reset while the factory runs, the new instance is returned to
    /// the caller but not recorded.
    ///
    /// # Errors
    ///
    /// Returns the factory's error unchanged. Nothing is recorded in that case, so the
    /// next request runs a factory again.
    pub fn get_or_try_create<T, E, F>(&self, factory: F) -> Result<Arc<T>, E>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Result<T, E>,
    {
        let slot = self.slot::<T>();
        let instance = slot.get_or_try_init(|| {
            debug!("Creating singleton instance of {}", type_name::<T>());
            factory().map(Arc::new)
        })?;
        Ok(Arc::clone(instance))
    }

    /// Returns the instance recorded for `T` without constructing one.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let slot = self.slots.lock().get(&TypeId::of::<T>()).cloned()?;
        typed::<T>(slot)?.get().cloned()
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.get::<T>().is_some()
    }

    /// Clears the slot for `T`. Returns `true` if an instance was recorded.
    pub fn reset<T: Any + Send + Sync>(&self) -> bool {
        let removed = self
            .slots
            .lock()
            .remove(&TypeId::of::<T>())
            .is_some_and(|slot| slot.is_filled());
        if removed {
            info!("Singleton instance of {} reset", type_name::<T>());
        }
        removed
    }

    /// Clears every slot. The next request for any type builds a fresh instance.
    pub fn reset_all(&self) {
        let mut slots = self.slots.lock();
        let filled = slots.values().filter(|slot| slot.is_filled()).count();
        info!("Resetting singleton registry, {} instance(s) dropped", filled);
        slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.lock().values().filter(|slot| slot.is_filled()).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.slots.lock().values().any(|slot| slot.is_filled())
    }

    // The map lock is released before the caller initializes the slot.
    fn slot<T: Any + Send + Sync>(&self) -> TypedSlot<T> {
        let mut slots = self.slots.lock();
        let id = TypeId::of::<T>();
        if let Some(slot) = slots.get(&id).cloned().and_then(typed::<T>) {
            return slot;
        }
        let slot: TypedSlot<T> = Arc::new(OnceCell::new());
        slots.insert(id, slot.clone() as Slot);
        slot
    }
}

impl Default for SingletonRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SingletonRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingletonRegistry")
            .field("instances", &self.len())
            .finish()
    }
}

// Slots are keyed by TypeId, so a failed downcast cannot happen; it reads as absent.
fn typed<T: Any + Send + Sync>(slot: Slot) -> Option<TypedSlot<T>> {
    slot.into_any().downcast::<OnceCell<Arc<T>>>().ok()
}
