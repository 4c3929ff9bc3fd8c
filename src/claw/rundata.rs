//! Solver run configuration
//!
//! `RunData` is the in-memory form of a Clawpack run configuration: named
//! sections of ordered `name = value` parameters. It is produced by a
//! [`RunConfigProvider`], adjusted per case, and written into the case's
//! run directory as `.data` files that the solver reads in order.

use crate::error::{IoResultExt, Result, SweepError};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Width of the value column in written data files
const VALUE_WIDTH: usize = 26;

/// A parameter value in a data file
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    /// Written as `T` / `F`
    Bool(bool),
    /// Integer
    Int(i64),
    /// Real number
    Float(f64),
    /// Quoted string
    Str(String),
    /// Space-separated list
    List(Vec<DataValue>),
}

/// `{:?}` drops the point in exponent form (`1e20`); Fortran readers want `1.0e20`.
fn fortran_float(x: f64) -> String {
    let text = format!("{:?}", x);
    match text.find('e') {
        Some(pos) if !text[..pos].contains('.') => format!("{}.0{}", &text[..pos], &text[pos..]),
        _ => text,
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => write!(f, "T"),
            Self::Bool(false) => write!(f, "F"),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", fortran_float(*x)),
            Self::Str(s) => write!(f, "'{}'", s),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl<T: Into<DataValue>> From<Vec<T>> for DataValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl TryFrom<&serde_json::Value> for DataValue {
    type Error = String;

    fn try_from(value: &serde_json::Value) -> std::result::Result<Self, Self::Error> {
        use serde_json::Value;

        match value {
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .ok_or_else(|| format!("unrepresentable number {}", n)),
            Value::String(s) => Ok(Self::Str(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(DataValue::try_from)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Self::List),
            Value::Null => Err("null is not a valid parameter value".to_string()),
            Value::Object(_) => Err("nested objects are not valid parameter values".to_string()),
        }
    }
}

/// One data file worth of parameters
#[derive(Debug, Clone, PartialEq)]
pub struct DataSection {
    name: String,
    entries: Vec<(String, DataValue)>,
}

impl DataSection {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Section name (`claw`, `probdata`, ...)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File the section is written to
    pub fn file_name(&self) -> String {
        data_file_name(&self.name)
    }

    /// Look up a parameter
    pub fn get(&self, key: &str) -> Option<&DataValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut DataValue> {
        self.entries.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Set a parameter, keeping its position if it already exists
    pub fn set(&mut self, key: &str, value: DataValue) {
        match self.get_mut(key) {
            Some(slot) => *slot = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Parameters in file order
    pub fn entries(&self) -> &[(String, DataValue)] {
        &self.entries
    }

    fn render(&self, out: &mut impl Write) -> std::io::Result<()> {
        writeln!(out, "########################################################")?;
        writeln!(out, "### DO NOT EDIT THIS FILE:  GENERATED AUTOMATICALLY ####")?;
        writeln!(
            out,
            "### Written by clawsweep at {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(out, "########################################################")?;
        writeln!(out)?;
        for (key, value) in &self.entries {
            writeln!(out, "{:<width$} =: {}", value.to_string(), key, width = VALUE_WIDTH)?;
        }
        Ok(())
    }
}

/// Map a section name to the data file the solver reads it from
pub fn data_file_name(section: &str) -> String {
    match section {
        "claw" | "clawdata" => "claw.data".to_string(),
        "probdata" => "setprob.data".to_string(),
        other => format!("{}.data", other),
    }
}

/// Complete run configuration for one solver invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunData {
    sections: Vec<DataSection>,
}

impl RunData {
    /// Empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object of sections, each an object of parameters.
    ///
    /// Key order in the JSON is the order parameters are written in.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let sections = value
            .as_object()
            .ok_or_else(|| SweepError::RunConfig("top level must be an object of sections".into()))?;

        let mut rundata = Self::new();
        for (name, params) in sections {
            let params = params.as_object().ok_or_else(|| {
                SweepError::RunConfig(format!("section '{}' must be an object", name))
            })?;
            let section = rundata.section_mut(name);
            for (key, value) in params {
                let value = DataValue::try_from(value).map_err(|e| {
                    SweepError::RunConfig(format!("{}.{}: {}", name, key, e))
                })?;
                section.set(key, value);
            }
        }
        Ok(rundata)
    }

    /// Sections in write order
    pub fn sections(&self) -> &[DataSection] {
        &self.sections
    }

    /// Get a section, creating it if needed
    pub fn section_mut(&mut self, name: &str) -> &mut DataSection {
        let index = match self.sections.iter().position(|s| s.name == name) {
            Some(index) => index,
            None => {
                self.sections.push(DataSection::new(name));
                self.sections.len() - 1
            }
        };
        &mut self.sections[index]
    }

    /// Look up `section.key`
    pub fn get(&self, section: &str, key: &str) -> Option<&DataValue> {
        self.sections
            .iter()
            .find(|s| s.name == section)
            .and_then(|s| s.get(key))
    }

    /// Set `section.key`, creating either if needed
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<DataValue>) {
        self.section_mut(section).set(key, value.into());
    }

    /// Set element `index` of the list parameter `section.key`
    pub fn set_index(
        &mut self,
        section: &str,
        key: &str,
        index: usize,
        value: impl Into<DataValue>,
    ) -> Result<()> {
        let slot = self
            .sections
            .iter_mut()
            .find(|s| s.name == section)
            .and_then(|s| s.get_mut(key))
            .ok_or_else(|| SweepError::RunConfig(format!("{}.{} is not set", section, key)))?;

        match slot {
            DataValue::List(items) => {
                let len = items.len();
                let item = items.get_mut(index).ok_or_else(|| {
                    SweepError::RunConfig(format!(
                        "{}.{}[{}] out of range (length {})",
                        section, key, index, len
                    ))
                })?;
                *item = value.into();
                Ok(())
            }
            _ => Err(SweepError::RunConfig(format!("{}.{} is not a list", section, key))),
        }
    }

    /// Write one data file per section into `dir`, returning the paths written.
    pub fn write(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.sections.len());
        for section in &self.sections {
            let path = dir.join(section.file_name());
            let mut file = std::io::BufWriter::new(std::fs::File::create(&path).with_path(&path)?);
            section.render(&mut file).with_path(&path)?;
            file.flush().with_path(&path)?;
            tracing::debug!("wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

/// Supplies the base run configuration for every case
pub trait RunConfigProvider {
    /// Produce a fresh run configuration
    fn produce(&self) -> Result<RunData>;
}

impl<F> RunConfigProvider for F
where
    F: Fn() -> Result<RunData>,
{
    fn produce(&self) -> Result<RunData> {
        self()
    }
}

/// Run configuration read from a JSON file of sections
#[derive(Debug, Clone)]
pub struct JsonSetrun {
    path: PathBuf,
}

impl JsonSetrun {
    /// Read from `path` each time a configuration is produced
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RunConfigProvider for JsonSetrun {
    fn produce(&self) -> Result<RunData> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            SweepError::RunConfig(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            SweepError::RunConfig(format!("cannot parse {}: {}", self.path.display(), e))
        })?;
        RunData::from_json(&value)
    }
}
