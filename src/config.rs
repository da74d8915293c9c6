// Copyright 2026 Printlink Team
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

//! Configuration module.
//!
//! Handles loading and saving application settings.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bluetooth settings.
    pub bluetooth: BluetoothConfig,

    /// Printer settings.
    pub printer: PrinterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BluetoothConfig {
    /// Alias set on the local adapter.
    pub adapter_alias: String,

    /// RFCOMM channel used for outbound connections.
    pub channel: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterConfig {
    /// Bluetooth address of the printer, e.g. "00:11:22:33:44:55".
    pub address: String,

    /// Display name reported when the printer connects.
    pub name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bluetooth: BluetoothConfig {
                adapter_alias: "Printlink".to_string(),
                channel: 1,
            },
            printer: PrinterConfig {
                address: "00:00:00:00:00:00".to_string(),
                name: "Receipt Printer".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from the user config directory, creating the
    /// file with defaults on first run.
    pub fn load() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("printlink");
        Self::load_from(&config_dir)
    }

    /// Load configuration from an explicit directory.
    pub fn load_from(config_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(config_dir)?;

        let config_path = config_dir.join("config.toml");

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            let config = Self::default();
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(&config_path, content)?;
            config
        };

        Ok(config)
    }

    /// Save configuration to an explicit directory.
    pub fn save_to(&self, config_dir: &Path) -> Result<()> {
        let config_path = config_dir.join("config.toml");
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }
}
