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

use std::collections::HashMap;
use std::env::{self, VarError};

use log::warn;
use parking_lot::RwLock;

/// Ambient process state a [`WebConfig`](crate::WebConfig) reads but never owns.
pub trait ProcessContext: Send + Sync {
    /// Value of an environment variable, `None` when unset.
    fn env_var(&self, key: &str) -> Option<String>;

    /// The command-line argument list, program name first.
    fn args(&self) -> Vec<String>;
}

/// Reads the real process environment and argument list.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemContext;

impl ProcessContext for SystemContext {
    fn env_var(&self, key: &str) -> Option<String> {
        match env::var(key) {
            Ok(value) => Some(value),
            Err(VarError::NotPresent) => None,
            Err(VarError::NotUnicode(raw)) => {
                warn!("Environment variable {} is not valid unicode: {:?}", key, raw);
                None
            }
        }
    }

    fn args(&self) -> Vec<String> {
        env::args_os()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }
}

/// In-memory environment and argument list.
///
/// Both can be changed through a shared reference, so a context handed to a store can
/// still be adjusted afterwards.
#[derive(Debug, Default)]
pub struct StaticContext {
    vars: RwLock<HashMap<String, String>>,
    args: RwLock<Vec<String>>,
}

impl StaticContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_var(key, value);
        self
    }

    pub fn with_args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_args(args);
        self
    }

    pub fn set_var(&self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.write().insert(key.into(), value.into());
    }

    pub fn remove_var(&self, key: &str) {
        self.vars.write().remove(key);
    }

    pub fn set_args<I, S>(&self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.args.write() = args.into_iter().map(Into::into).collect();
    }

    pub fn push_arg(&self, arg: impl Into<String>) {
        self.args.write().push(arg.into());
    }
}

impl ProcessContext for StaticContext {
    fn env_var(&self, key: &str) -> Option<String> {
        self.vars.read().get(key).cloned()
    }

    fn args(&self) -> Vec<String> {
        self.args.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_context_vars() {
        let context = StaticContext::new().with_var("ONE", "something");
        assert_eq!(context.env_var("ONE").as_deref(), Some("something"));

        context.set_var("ONE", "else");
        assert_eq!(context.env_var("ONE").as_deref(), Some("else"));

        context.remove_var("ONE");
        assert_eq!(context.env_var("ONE"), None);
    }

    #[test]
    fn test_static_context_args() {
        let context = StaticContext::new().with_args(["program"]);
        context.push_arg("config.yml");
        assert_eq!(context.args(), vec!["program".to_string(), "config.yml".to_string()]);
    }

    #[test]
    fn test_system_context_reads_args() {
        assert!(!SystemContext.args().is_empty());
    }
}
