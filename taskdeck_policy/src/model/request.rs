//! Access requests.

use serde::{Deserialize, Serialize};
use taskdeck_core::types::{Capability, FieldScope, ResourceKind};

/// One permission request against a resource.
///
/// The capability is the closed-enum heart of the request; field scope and
/// resource kind refine the two rules that need them (employee field edits
/// and own-record views) and default to the common case everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest {
    /// The capability being requested.
    pub capability: Capability,

    /// Which fields a `ModifyFields` request touches.
    pub field_scope: FieldScope,

    /// What kind of resource a `View` request targets.
    pub resource: ResourceKind,
}

impl AccessRequest {
    /// Request a capability against a task, touching any field.
    pub fn new(capability: Capability) -> Self {
        Self {
            capability,
            field_scope: FieldScope::All,
            resource: ResourceKind::Task,
        }
    }

    /// Restrict a `ModifyFields` request to progress/remark.
    pub fn with_field_scope(mut self, scope: FieldScope) -> Self {
        self.field_scope = scope;
        self
    }

    /// Mark a `View` request as targeting the actor's own user record.
    pub fn with_resource(mut self, resource: ResourceKind) -> Self {
        self.resource = resource;
        self
    }
}

impl From<Capability> for AccessRequest {
    fn from(capability: Capability) -> Self {
        Self::new(capability)
    }
}
