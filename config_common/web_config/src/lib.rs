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

//! Process-wide configuration backed by a YAML file and environment variables.
//!
//! [`WebConfig`] reads the YAML file named by the last command-line argument, or, when
//! `ENVIRONMENT_CONFIG=true`, resolves lookups from environment variables. Each lookup can
//! force a source or demand that the key exists.
//!
//! # Example
//!
//! ```
//! use std::io::Write;
//! use std::sync::Arc;
//!
//! use web_config::{ConfigValue, Lookup, StaticContext, WebConfig};
//!
//! let mut file = tempfile::NamedTempFile::new().unwrap();
//! writeln!(file, "ONE: 1").unwrap();
//!
//! let context = StaticContext::new()
//!     .with_args(["server".to_string(), file.path().display().to_string()])
//!     .with_var("ONE", "something");
//! let config = WebConfig::with_context(Arc::new(context)).unwrap();
//!
//! assert_eq!(config.get("ONE", Lookup::new()).unwrap(), Some(ConfigValue::Integer(1)));
//! assert_eq!(
//!     config.get("ONE", Lookup::new().environ()).unwrap(),
//!     Some(ConfigValue::from("something"))
//! );
//! assert_eq!(config.get("ONES", Lookup::new()).unwrap(), None);
//! assert!(config.get("ONES", Lookup::new().strict()).is_err());
//! ```

pub mod constants;
pub mod context;
pub mod error;
pub mod value;
pub mod web_config;

pub use context::{ProcessContext, StaticContext, SystemContext};
pub use error::ConfigError;
pub use value::ConfigValue;
pub use web_config::{Lookup, ResolutionMode, WebConfig};
