use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{Result, ServiceError};

/// Option key requesting a per-user (session) service instead of a system one
pub const OPTION_USER_SERVICE: &str = "UserService";

/// Declarative record of what to run and how.
///
/// A backend borrows the description and never mutates it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescription {
    /// Unique identifier, used as the file name and as the control argument
    pub name: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub description: String,

    /// Absolute path to the binary; the running executable when empty
    #[serde(default)]
    pub executable: Option<PathBuf>,

    #[serde(default)]
    pub arguments: Vec<String>,

    /// Account to run as; empty or absent means the installing user
    #[serde(default)]
    pub user_name: Option<String>,

    #[serde(default)]
    pub working_directory: Option<String>,

    #[serde(default)]
    pub chroot: Option<String>,

    #[serde(default)]
    pub options: Options,
}

impl ServiceDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    pub fn arguments<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn user_name(mut self, user: impl Into<String>) -> Self {
        self.user_name = Some(user.into());
        self
    }

    pub fn working_directory(mut self, dir: impl Into<String>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn chroot(mut self, dir: impl Into<String>) -> Self {
        self.chroot = Some(dir.into());
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.options.set(key, value);
        self
    }

    /// User name, treating an empty string as unset
    pub fn user(&self) -> Option<&str> {
        non_empty(&self.user_name)
    }

    pub fn working_dir(&self) -> Option<&str> {
        non_empty(&self.working_directory)
    }

    pub fn chroot_dir(&self) -> Option<&str> {
        non_empty(&self.chroot)
    }

    pub fn is_user_service(&self) -> bool {
        self.options.bool(OPTION_USER_SERVICE, false)
    }

    /// Check that the name can be used as a file name and a command argument
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ServiceError::Config {
                message: "service name is empty".into(),
            });
        }

        if self
            .name
            .chars()
            .any(|c| c == '/' || c.is_whitespace() || c.is_control())
        {
            return Err(ServiceError::Config {
                message: format!("service name {:?} is not a valid file name", self.name),
            });
        }

        Ok(())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Backend-specific flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(BTreeMap<String, OptionValue>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        OptionValue::Bool(v)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        OptionValue::Int(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        OptionValue::Str(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        OptionValue::Str(v)
    }
}

impl Options {
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Boolean option, `default` when absent or of another type
    pub fn bool(&self, key: &str, default: bool) -> bool {
        match self.0.get(key) {
            Some(OptionValue::Bool(v)) => *v,
            _ => default,
        }
    }
}
