//! Effect - A side effect described as a value
//!
//! Effects are produced by the differ and executed by the interpreter.
//! Constructing one performs no remote call.

use crate::resource::{Resource, ResourceId, State};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Refresh a data source
    Read(Resource),
    /// Create a declared resource
    Create(Resource),
    /// Push declared attributes to an existing resource
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
    },
    /// Delete a resource that is no longer declared
    Delete(State),
}

impl Effect {
    /// Whether executing this Effect changes the remote platform
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Effect::Read(_))
    }

    pub fn resource_id(&self) -> &ResourceId {
        match self {
            Effect::Read(r) | Effect::Create(r) => &r.id,
            Effect::Update { id, .. } => id,
            Effect::Delete(state) => &state.id,
        }
    }

    /// Short verb used in plan output
    pub fn kind(&self) -> &'static str {
        match self {
            Effect::Read(_) => "read",
            Effect::Create(_) => "create",
            Effect::Update { .. } => "update",
            Effect::Delete(_) => "delete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_not_mutating() {
        let read = Effect::Read(Resource::new("edgeform_iam_countries", "all"));
        let delete = Effect::Delete(State::not_found(ResourceId::new("t", "n")));

        assert!(!read.is_mutating());
        assert!(delete.is_mutating());
        assert_eq!(read.resource_id().to_string(), "edgeform_iam_countries.all");
        assert_eq!(delete.kind(), "delete");
    }
}
