// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Attribute schemas for the provider, its resources and data sources.
//!
//! A [`Schema`] is the contract between the engine and a resource: which
//! attributes exist, which the practitioner must set, which the provider
//! computes, which are secret and which force a replacement when changed.
//! The generic parts of planning (defaults, carrying computed values,
//! replacement detection) are driven entirely by the schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Bool,
    Number,
}

impl AttributeType {
    /// `null` matches every type; it means the attribute is unset.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::String, Value::String(_)) => true,
            (Self::Bool, Value::Bool(_)) => true,
            (Self::Number, Value::Number(_)) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub force_new: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Attribute {
    fn new(attribute_type: AttributeType) -> Self {
        Self {
            attribute_type,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            force_new: false,
            default: None,
            description: String::new(),
        }
    }

    pub fn required(attribute_type: AttributeType) -> Self {
        Self {
            required: true,
            ..Self::new(attribute_type)
        }
    }

    pub fn optional(attribute_type: AttributeType) -> Self {
        Self {
            optional: true,
            ..Self::new(attribute_type)
        }
    }

    /// Set by the provider only.
    pub fn computed(attribute_type: AttributeType) -> Self {
        Self {
            computed: true,
            ..Self::new(attribute_type)
        }
    }

    /// Optional, filled in by the provider when left unset.
    pub fn optional_computed(attribute_type: AttributeType) -> Self {
        Self {
            optional: true,
            computed: true,
            ..Self::new(attribute_type)
        }
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub version: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            version: 0,
            description: description.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn attribute(mut self, name: &str, attribute: Attribute) -> Self {
        self.attributes.insert(name.to_string(), attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Sets every unset attribute that declares a default.
    pub fn apply_defaults(&self, state: &mut Value) -> Result<(), ProviderError> {
        let object = object_mut(state)?;
        for (name, attribute) in &self.attributes {
            if let Some(default) = &attribute.default {
                let unset = object.get(name).is_none_or(Value::is_null);
                if unset {
                    object.insert(name.clone(), default.clone());
                }
            }
        }
        Ok(())
    }

    /// Checks a configuration or planned state against the schema: it must
    /// be an object of known attributes with the declared types, and every
    /// required attribute must be set.
    pub fn validate(&self, state: &Value) -> Result<(), ProviderError> {
        let object = state
            .as_object()
            .ok_or_else(|| ProviderError::ValidationError("expected an object".to_string()))?;

        for (name, value) in object {
            let attribute = self.get(name).ok_or_else(|| {
                ProviderError::ValidationError(format!("unsupported attribute {name:?}"))
            })?;
            if !attribute.attribute_type.matches(value) {
                return Err(ProviderError::ValidationError(format!(
                    "attribute {name:?} must be a {:?}",
                    attribute.attribute_type
                )));
            }
        }

        for (name, attribute) in &self.attributes {
            if attribute.required && object.get(name).is_none_or(Value::is_null) {
                return Err(ProviderError::ValidationError(format!(
                    "missing required attribute {name:?}"
                )));
            }
        }

        Ok(())
    }

    /// Copies computed attributes the plan left unset from the prior state.
    pub fn carry_computed(&self, prior: &Value, planned: &mut Value) -> Result<(), ProviderError> {
        let object = object_mut(planned)?;
        for (name, attribute) in &self.attributes {
            if !attribute.computed || object.get(name).is_some_and(|v| !v.is_null()) {
                continue;
            }
            if let Some(value) = prior.get(name).filter(|v| !v.is_null()) {
                object.insert(name.clone(), value.clone());
            }
        }
        Ok(())
    }

    /// Copies sensitive attributes the remote API never echoes back from the
    /// prior state into a refreshed one.
    pub fn carry_sensitive(&self, prior: &Value, refreshed: &mut Value) -> Result<(), ProviderError> {
        let object = object_mut(refreshed)?;
        for (name, attribute) in &self.attributes {
            if !attribute.sensitive || object.get(name).is_some_and(|v| !v.is_null()) {
                continue;
            }
            if let Some(value) = prior.get(name) {
                object.insert(name.clone(), value.clone());
            }
        }
        Ok(())
    }

    /// Attributes whose planned value differs from `prior`. Computed
    /// attributes the plan leaves unset are not changes.
    pub fn changed(&self, prior: &Value, planned: &Value) -> Vec<String> {
        self.attributes
            .iter()
            .filter(|(name, attribute)| {
                let before = prior.get(name.as_str()).unwrap_or(&Value::Null);
                let after = planned.get(name.as_str()).unwrap_or(&Value::Null);
                before != after && !(attribute.computed && after.is_null())
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// `force_new` attributes changed between `prior` and `planned`. A
    /// sensitive value that was never known (null after import) is adopted
    /// rather than replaced.
    pub fn changed_force_new(&self, prior: &Value, planned: &Value) -> Vec<String> {
        self.changed(prior, planned)
            .into_iter()
            .filter(|name| {
                self.get(name).is_some_and(|attribute| {
                    attribute.force_new && !self.adopts_unknown_sensitive(prior, name)
                })
            })
            .collect()
    }

    /// True when `name` is sensitive and unset in `prior`.
    pub fn adopts_unknown_sensitive(&self, prior: &Value, name: &str) -> bool {
        self.get(name).is_some_and(|attribute| attribute.sensitive)
            && prior.get(name).is_none_or(Value::is_null)
    }

    /// Unsets every provider-computed attribute; used when a plan replaces
    /// the object so computed values are unknown until apply.
    pub fn clear_computed(&self, planned: &mut Value) -> Result<(), ProviderError> {
        let object = object_mut(planned)?;
        for (name, attribute) in &self.attributes {
            if attribute.computed && !attribute.optional {
                object.insert(name.clone(), Value::Null);
            }
        }
        Ok(())
    }
}

/// Everything served at `GET /schema`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderSchema {
    pub provider: Schema,
    pub resources: BTreeMap<String, Schema>,
    pub data_sources: BTreeMap<String, Schema>,
}

/// `null` becomes an empty object so defaults can be applied to it.
pub fn object_mut(state: &mut Value) -> Result<&mut Map<String, Value>, ProviderError> {
    if state.is_null() {
        *state = Value::Object(Map::new());
    }
    state
        .as_object_mut()
        .ok_or_else(|| ProviderError::ValidationError("expected an object".to_string()))
}
