//! Scripted hotplug scenarios.
//!
//! A scenario declares devices once and then a list of timed steps. Steps
//! run in `at_ms` order; steps with the same time keep their file order.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use clap::ValueEnum;
use flashd_device::{Device, DeviceDescriptor};
use flashd_registry::config::is_yaml_path;
use serde::{Deserialize, Serialize};

use crate::error::ScenarioError;

/// Scenario file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Pick a format from the file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        if is_yaml_path(path) {
            Self::Yaml
        } else {
            Self::Json
        }
    }
}

/// What a step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Add,
    Remove,
    LookupId,
    LookupGuid,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::LookupId => "lookup_id",
            Self::LookupGuid => "lookup_guid",
        }
    }
}

/// One timed step as written in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Milliseconds after the start of the run.
    #[serde(default)]
    pub at_ms: u64,
    pub action: Action,
    /// Device id for `add` and `remove`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Id prefix or GUID for lookups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// A scenario as written in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioFile {
    #[serde(default)]
    pub devices: Vec<DeviceDescriptor>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// A resolved step, ready to run.
#[derive(Debug, Clone)]
pub enum Command {
    Add(Arc<Device>),
    Remove(Arc<Device>),
    LookupId(String),
    LookupGuid(String),
}

/// A validated scenario with its devices built.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Devices in declaration order.
    pub devices: Vec<Arc<Device>>,
    /// Steps sorted by time.
    pub steps: Vec<(u64, Command)>,
}

impl Scenario {
    /// Read and resolve a scenario file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or resolved.
    pub fn load(path: &Path, format: Option<Format>) -> Result<Self, ScenarioError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents, format.unwrap_or_else(|| Format::from_path(path)))
    }

    /// Parse and resolve scenario text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is malformed or refers to undeclared
    /// devices.
    pub fn parse(contents: &str, format: Format) -> Result<Self, ScenarioError> {
        let file: ScenarioFile = match format {
            Format::Yaml => serde_yaml::from_str(contents)?,
            Format::Json => serde_json::from_str(contents)?,
        };
        Self::resolve(file)
    }

    /// Build devices and bind steps to them.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate or invalid devices and on steps that
    /// name undeclared devices or lack a required field.
    pub fn resolve(file: ScenarioFile) -> Result<Self, ScenarioError> {
        let mut by_id: HashMap<String, Arc<Device>> = HashMap::new();
        let mut devices = Vec::with_capacity(file.devices.len());
        for descriptor in &file.devices {
            let device = Arc::new(descriptor.build()?);
            if by_id
                .insert(descriptor.id.clone(), Arc::clone(&device))
                .is_some()
            {
                return Err(ScenarioError::DuplicateDevice(descriptor.id.clone()));
            }
            devices.push(device);
        }

        let mut steps = Vec::with_capacity(file.steps.len());
        for (index, step) in file.steps.into_iter().enumerate() {
            let command = match step.action {
                Action::Add | Action::Remove => {
                    let id = step.device.ok_or(ScenarioError::MissingField {
                        step: index,
                        action: step.action.as_str(),
                        field: "device",
                    })?;
                    let device = by_id.get(&id).cloned().ok_or(
                        ScenarioError::UndefinedDevice {
                            step: index,
                            device: id,
                        },
                    )?;
                    if step.action == Action::Add {
                        Command::Add(device)
                    } else {
                        Command::Remove(device)
                    }
                }
                Action::LookupId | Action::LookupGuid => {
                    let key = step.key.ok_or(ScenarioError::MissingField {
                        step: index,
                        action: step.action.as_str(),
                        field: "key",
                    })?;
                    if step.action == Action::LookupId {
                        Command::LookupId(key)
                    } else {
                        Command::LookupGuid(key)
                    }
                }
            };
            steps.push((step.at_ms, command));
        }
        steps.sort_by_key(|(at_ms, _)| *at_ms);

        Ok(Self { devices, steps })
    }
}
