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

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use serde_yaml::Value;
use singleton_registry::{global, SingletonRegistry};

use crate::constants::{ENVIRONMENT_CONFIG, ENVIRONMENT_ONLY};
use crate::context::{ProcessContext, SystemContext};
use crate::error::ConfigError;
use crate::value::ConfigValue;

/// Which source a lookup without overrides reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    /// Values come from the YAML file, which is loaded on construction.
    FilePreferred,
    /// Values come from environment variables; the file is not loaded on construction.
    EnvironmentOnly,
}

/// Per-call overrides for [`WebConfig::get`].
///
/// `file` and `environ` force a source and are mutually exclusive. `strict` turns a
/// missing value into [`ConfigError::KeyNotFound`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lookup {
    pub file: bool,
    pub environ: bool,
    pub strict: bool,
}

impl Lookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self) -> Self {
        self.file = true;
        self
    }

    pub fn environ(mut self) -> Self {
        self.environ = true;
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }
}

#[derive(Debug, Default)]
struct Store {
    values: HashMap<String, ConfigValue>,
    file_loaded: bool,
}

/// Configuration resolved from a YAML file and the process environment.
///
/// The file path is the last command-line argument, read once and cached. When the
/// `ENVIRONMENT_CONFIG` variable is `true` (any case) lookups go to the environment
/// instead and the file is only read if a caller asks for it explicitly.
///
/// One instance per process is obtained through [`WebConfig::instance`];
/// [`WebConfig::clean_memory`] discards it so the next request builds a new one.
pub struct WebConfig {
    context: Arc<dyn ProcessContext>,
    file_path: OnceCell<PathBuf>,
    store: RwLock<Store>,
    // Serializes file loads; lookups only need `store`.
    load_guard: Mutex<()>,
}

impl WebConfig {
    /// Builds a store over the real process environment and loads it.
    ///
    /// # Errors
    ///
    /// Fails when file-preferred resolution is active and the file cannot be read or parsed.
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_context(Arc::new(SystemContext))
    }

    /// Builds a store over the given context and loads it.
    pub fn with_context(context: Arc<dyn ProcessContext>) -> Result<Self, ConfigError> {
        let config = WebConfig {
            context,
            file_path: OnceCell::new(),
            store: RwLock::new(Store::default()),
            load_guard: Mutex::new(()),
        };
        config.load()?;
        Ok(config)
    }

    /// Returns the process-wide instance, constructing it on first use.
    ///
    /// Construction, including the initial file load, runs under the registry slot for
    /// `WebConfig` only; requests for other singleton types are not blocked by it.
    pub fn instance() -> Result<Arc<Self>, ConfigError> {
        global().get_or_try_create(Self::new)
    }

    /// Returns the instance recorded in `registry`, constructing it over `context` on first use.
    ///
    /// `context` is ignored when an instance is already recorded.
    pub fn instance_in(
        registry: &SingletonRegistry,
        context: Arc<dyn ProcessContext>,
    ) -> Result<Arc<Self>, ConfigError> {
        registry.get_or_try_create(|| Self::with_context(context))
    }

    /// Clears the whole process-wide registry, not only the config slot.
    ///
    /// Handles obtained earlier stay usable and keep their data.
    pub fn clean_memory() {
        global().reset_all();
    }

    /// Evaluated on every call, so changing `ENVIRONMENT_CONFIG` takes effect immediately.
    pub fn resolution_mode(&self) -> ResolutionMode {
        match self.context.env_var(ENVIRONMENT_CONFIG) {
            Some(value) if value.eq_ignore_ascii_case(ENVIRONMENT_ONLY) => ResolutionMode::EnvironmentOnly,
            _ => ResolutionMode::FilePreferred,
        }
    }

    pub fn from_file(&self) -> bool {
        self.resolution_mode() == ResolutionMode::FilePreferred
    }

    /// The config file path: the last command-line argument at first access.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFilePath`] if the argument list is empty. Nothing is
    /// cached in that case.
    pub fn file_path(&self) -> Result<&Path, ConfigError> {
        self.file_path
            .get_or_try_init(|| {
                self.context
                    .args()
                    .pop()
                    .map(PathBuf::from)
                    .ok_or(ConfigError::MissingFilePath)
            })
            .map(PathBuf::as_path)
    }

    /// Loads the config file unless environment-only resolution is active.
    pub fn load(&self) -> Result<(), ConfigError> {
        match self.resolution_mode() {
            ResolutionMode::FilePreferred => self.load_from_file(),
            ResolutionMode::EnvironmentOnly => {
                debug!("{} is set, skipping config file", ENVIRONMENT_CONFIG);
                Ok(())
            }
        }
    }

    fn load_from_file(&self) -> Result<(), ConfigError> {
        let _guard = self.load_guard.lock();
        self.load_from_file_locked()
    }

    // Loads only if no load has completed yet, re-checking under the load guard.
    fn ensure_file_loaded(&self) -> Result<(), ConfigError> {
        if self.is_file_loaded() {
            return Ok(());
        }
        let _guard = self.load_guard.lock();
        if self.is_file_loaded() {
            return Ok(());
        }
        self.load_from_file_locked()
    }

    // Caller holds `load_guard`. The file is fully parsed before the store is touched.
    fn load_from_file_locked(&self) -> Result<(), ConfigError> {
        let path = self.file_path()?;
        let values = read_yaml_mapping(path)?;
        info!("Loaded {} key(s) from config file {}", values.len(), path.display());

        let mut store = self.store.write();
        store.values.extend(values);
        store.file_loaded = true;
        Ok(())
    }

    /// Resolves `key` according to the resolution mode and the overrides in `lookup`.
    ///
    /// A `file` lookup loads the file first if it has not been loaded yet. A top-level key
    /// whose YAML value is `null` resolves as missing.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::InvalidArguments`] if both `file` and `environ` are set
    /// * [`ConfigError::KeyNotFound`] if `strict` is set and there is no value
    /// * file errors from the lazy load of a `file` lookup
    pub fn get(&self, key: &str, lookup: Lookup) -> Result<Option<ConfigValue>, ConfigError> {
        if lookup.file && lookup.environ {
            return Err(ConfigError::InvalidArguments);
        }

        let value = if lookup.file {
            self.ensure_file_loaded()?;
            self.stored(key)
        } else if lookup.environ {
            self.environ(key)
        } else {
            match self.resolution_mode() {
                ResolutionMode::FilePreferred => self.stored(key),
                ResolutionMode::EnvironmentOnly => self.environ(key),
            }
        };
        check_strict(key, value, lookup.strict)
    }

    fn stored(&self, key: &str) -> Option<ConfigValue> {
        self.store
            .read()
            .values
            .get(key)
            .filter(|value| !value.is_null())
            .cloned()
    }

    fn environ(&self, key: &str) -> Option<ConfigValue> {
        self.context.env_var(key).map(ConfigValue::String)
    }

    pub fn is_file_loaded(&self) -> bool {
        self.store.read().file_loaded
    }

    pub fn len(&self) -> usize {
        self.store.read().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().values.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.store.read().values.contains_key(key)
    }

    /// Loaded keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.store.read().values.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Owned copy of the values loaded from the file.
    pub fn snapshot(&self) -> HashMap<String, ConfigValue> {
        self.store.read().values.clone()
    }

    /// Serializes the loaded values to pretty JSON with sorted keys.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        let store = self.store.read();
        let sorted: BTreeMap<&String, &ConfigValue> = store.values.iter().collect();
        Ok(serde_json::to_string_pretty(&sorted)?)
    }
}

impl fmt::Debug for WebConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.store.read();
        f.debug_struct("WebConfig")
            .field("file_path", &self.file_path.get())
            .field("file_loaded", &store.file_loaded)
            .field("values", &store.values)
            .finish()
    }
}

fn check_strict(key: &str, value: Option<ConfigValue>, strict: bool) -> Result<Option<ConfigValue>, ConfigError> {
    match value {
        None if strict => {
            warn!("Config missing key: {}", key);
            Err(ConfigError::KeyNotFound(key.to_string()))
        }
        value => Ok(value),
    }
}

fn read_yaml_mapping(path: &Path) -> Result<HashMap<String, ConfigValue>, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    let document: Value = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    match ConfigValue::from(document) {
        ConfigValue::Mapping(map) => Ok(map.into_iter().collect()),
        _ => Err(ConfigError::NotAMapping {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StaticContext;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn args_for(file: &NamedTempFile) -> Vec<String> {
        vec!["prog".to_string(), file.path().display().to_string()]
    }

    fn env_only_config(context: StaticContext) -> (Arc<StaticContext>, WebConfig) {
        let context = Arc::new(context.with_var(ENVIRONMENT_CONFIG, "true"));
        let config = WebConfig::with_context(context.clone()).unwrap();
        (context, config)
    }

    #[test]
    fn test_read_yaml_mapping_rejects_non_mapping() {
        let file = yaml_file("- 1\n- 2\n");
        let result = read_yaml_mapping(file.path());
        assert!(matches!(result, Err(ConfigError::NotAMapping { .. })));
    }

    #[test]
    fn test_read_yaml_mapping_rejects_empty_document() {
        let file = yaml_file("");
        assert!(read_yaml_mapping(file.path()).is_err());
    }

    #[test]
    fn test_check_strict() {
        assert_eq!(check_strict("K", None, false).unwrap(), None);
        assert_eq!(
            check_strict("K", Some(ConfigValue::Integer(1)), true).unwrap(),
            Some(ConfigValue::Integer(1))
        );
        let err = check_strict("K", None, true).unwrap_err();
        assert_eq!(err.to_string(), "K not found");
    }

    #[test]
    fn test_load_from_file_merges_over_existing_values() {
        let file = yaml_file("ONE: 1\nTWO: two\n");
        let (context, config) = env_only_config(StaticContext::new().with_args(args_for(&file)));
        assert!(config.is_empty());

        config.load_from_file().unwrap();
        assert_eq!(config.len(), 2);

        // The path is cached, so rewriting the same file and reloading overwrites keys
        std::fs::write(file.path(), "ONE: 10\nTHREE: 3\n").unwrap();
        context.set_args(["prog", "elsewhere.yml"]);
        config.load_from_file().unwrap();

        assert_eq!(config.keys(), vec!["ONE", "THREE", "TWO"]);
        assert_eq!(config.get("ONE", Lookup::new().file()).unwrap(), Some(ConfigValue::Integer(10)));
    }

    #[test]
    fn test_failed_load_keeps_previous_values() {
        let file = yaml_file("ONE: 1\n");
        let (_, config) = env_only_config(StaticContext::new().with_args(args_for(&file)));
        config.load_from_file().unwrap();

        std::fs::write(file.path(), "ONE: [unclosed\n").unwrap();
        let result = config.load_from_file();
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
        assert_eq!(config.snapshot().get("ONE"), Some(&ConfigValue::Integer(1)));
        assert_eq!(config.len(), 1);
    }

    #[test]
    fn test_missing_file_path() {
        let (_, config) = env_only_config(StaticContext::new());
        assert!(matches!(config.file_path(), Err(ConfigError::MissingFilePath)));
        assert!(matches!(
            config.get("ANY", Lookup::new().file()),
            Err(ConfigError::MissingFilePath)
        ));
    }
}
