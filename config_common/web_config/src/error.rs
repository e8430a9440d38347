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

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("file and environ overrides cannot both be set")]
    InvalidArguments,

    #[error("{0} not found")]
    KeyNotFound(String),

    #[error("Failed to read config file {}: {}", .path.display(), .source)]
    FileAccess {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse YAML in {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Config file {} must contain a top-level mapping", .path.display())]
    NotAMapping { path: PathBuf },

    #[error("No config file path: the process argument list is empty")]
    MissingFilePath,

    #[error("Config serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
