//! Named numeric parameters of a simulation run.
//!
//! A `Parameters` value is an insertion-ordered map from parameter names to
//! `f64` values, e.g. `{"pInfect": 0.1, "pRemove": 0.5, "pInfected": 0.01}`.
//! Parameters are not interpreted until a model or a dynamics reads them, at
//! which point they are checked (missing key, non-finite value, value outside
//! the allowed range).
//!
//! Parameters can be loaded from a flat JSON object, and the set used for a
//! run is stored in the `Context` so that models and processes can read it
//! from event callbacks.
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::define_data_plugin;
use crate::error::EpiError;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters {
    values: IndexMap<String, f64>,
}

impl Parameters {
    #[must_use]
    pub fn new() -> Parameters {
        Parameters::default()
    }

    /// Sets a parameter, replacing any previous value, and returns `self` for chaining.
    pub fn set(&mut self, key: &str, value: f64) -> &mut Self {
        self.values.insert(key.to_string(), value);
        self
    }

    /// By-value variant of `set` for building a parameter set in one expression.
    #[must_use]
    pub fn with(mut self, key: &str, value: f64) -> Self {
        self.set(key, value);
        self
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Returns the value of a required, finite parameter.
    ///
    /// # Errors
    ///
    /// `EpiError::ParameterError` if the key is missing or the value is NaN or infinite.
    pub fn get(&self, key: &str) -> Result<f64, EpiError> {
        let value = *self
            .values
            .get(key)
            .ok_or_else(|| EpiError::ParameterError(format!("Missing parameter '{key}'")))?;
        if !value.is_finite() {
            return Err(EpiError::ParameterError(format!(
                "Parameter '{key}' must be finite, got {value}"
            )));
        }
        Ok(value)
    }

    /// Returns a parameter that must lie in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// `EpiError::ParameterError` if missing, not finite or out of range.
    pub fn probability(&self, key: &str) -> Result<f64, EpiError> {
        let value = self.get(key)?;
        if !(0.0..=1.0).contains(&value) {
            return Err(EpiError::ParameterError(format!(
                "Parameter '{key}' must be a probability in [0, 1], got {value}"
            )));
        }
        Ok(value)
    }

    /// Returns a parameter that must be strictly positive.
    ///
    /// # Errors
    ///
    /// `EpiError::ParameterError` if missing, not finite or not positive.
    pub fn positive(&self, key: &str) -> Result<f64, EpiError> {
        let value = self.get(key)?;
        if value <= 0.0 {
            return Err(EpiError::ParameterError(format!(
                "Parameter '{key}' must be positive, got {value}"
            )));
        }
        Ok(value)
    }

    /// Copies every value of `other` into `self`, overriding existing keys.
    pub fn merge(&mut self, other: &Parameters) {
        for (key, value) in other.iter() {
            self.set(key, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(key, value)| (key.as_str(), *value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parses parameters from a flat JSON object of numbers.
    ///
    /// # Errors
    ///
    /// `EpiError::JsonError` if the text is not a JSON object of numbers.
    pub fn from_json_str(text: &str) -> Result<Parameters, EpiError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads parameters from a JSON file.
    ///
    /// # Errors
    ///
    /// `EpiError::IoError` if the file cannot be read, `EpiError::JsonError` if it
    /// does not hold a flat JSON object of numbers.
    pub fn from_json_file(path: &Path) -> Result<Parameters, EpiError> {
        trace!("loading parameters from {}", path.display());
        let text = fs::read_to_string(path)?;
        Parameters::from_json_str(&text)
    }
}

impl Display for Parameters {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (key, value) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{key}={value}")?;
            first = false;
        }
        Ok(())
    }
}

impl<'a> FromIterator<(&'a str, f64)> for Parameters {
    fn from_iter<T: IntoIterator<Item = (&'a str, f64)>>(iter: T) -> Self {
        let mut parameters = Parameters::new();
        for (key, value) in iter {
            parameters.set(key, value);
        }
        parameters
    }
}

define_data_plugin!(ParametersPlugin, Parameters, Parameters::new());

pub trait ContextParametersExt {
    /// Stores the parameter set of the current run in the context.
    fn set_parameters(&mut self, parameters: Parameters);

    /// The parameter set of the current run. Empty if none has been set.
    fn get_parameters(&self) -> Parameters;

    /// Reads one required parameter of the current run.
    ///
    /// # Errors
    ///
    /// See [`Parameters::get`].
    fn get_parameter(&self, key: &str) -> Result<f64, EpiError>;
}

impl ContextParametersExt for Context {
    fn set_parameters(&mut self, parameters: Parameters) {
        trace!("setting parameters: {parameters}");
        *self.get_data_mut(ParametersPlugin) = parameters;
    }

    fn get_parameters(&self) -> Parameters {
        self.get_data(ParametersPlugin).cloned().unwrap_or_default()
    }

    fn get_parameter(&self, key: &str) -> Result<f64, EpiError> {
        match self.get_data(ParametersPlugin) {
            Some(parameters) => parameters.get(key),
            None => Err(EpiError::ParameterError(format!(
                "Missing parameter '{key}'"
            ))),
        }
    }
}
