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

//! Type-keyed singleton registry.
//!
//! A registry records at most one live instance per Rust type. The first request for a
//! type runs the supplied factory and records the result; later requests return the
//! recorded instance until the slot is reset.
//!
//! # Features
//!
//! * Thread-safe construction: each type's factory runs under that type's slot lock, so
//!   two threads can never build two instances of the same type, and a slow factory does
//!   not hold up other types
//! * Fallible factories whose errors propagate unchanged
//! * Reset of one type's slot or of the whole registry
//! * A process-wide registry through [`global`], or explicit registries passed by reference
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use singleton_registry::SingletonRegistry;
//!
//! struct Counter(u32);
//!
//! let registry = SingletonRegistry::new();
//! let first = registry.get_or_create(|| Counter(1));
//! let second = registry.get_or_create(|| Counter(2));
//! assert!(Arc::ptr_eq(&first, &second));
//! assert_eq!(second.0, 1);
//!
//! registry.reset_all();
//! let third = registry.get_or_create(|| Counter(3));
//! assert_eq!(third.0, 3);
//! ```

pub mod registry;

// Re-export key struct
pub use registry::{global, SingletonRegistry};
