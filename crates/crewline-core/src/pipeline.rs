//! Pipeline construction, structural validation and sequencing plan.
//!
//! A [`Pipeline`] owns its roles and an ordered list of work units. Order is
//! execution order: no unit starts before every unit declared before it has
//! completed. All structural checks happen in [`Pipeline::new`], so a pipeline
//! value is always executable.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ConfigError, SequencingError};
use crate::options::RunOptions;
use crate::role::Role;
use crate::work_unit::WorkUnit;

/// One step of a pipeline's sequencing plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStep {
    /// 0-indexed position in the sequence.
    pub position: usize,
    pub unit: String,
    pub role: String,
}

/// Ordered work units plus the roles they reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PipelineDefinition", into = "PipelineDefinition")]
pub struct Pipeline {
    roles: Vec<Role>,
    units: Vec<WorkUnit>,
}

/// Serialized form of a pipeline, validated on the way in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub roles: Vec<Role>,
    pub work_units: Vec<WorkUnit>,
}

impl TryFrom<PipelineDefinition> for Pipeline {
    type Error = SequencingError;

    fn try_from(def: PipelineDefinition) -> Result<Self, Self::Error> {
        Pipeline::new(def.roles, def.work_units)
    }
}

impl From<Pipeline> for PipelineDefinition {
    fn from(pipeline: Pipeline) -> Self {
        PipelineDefinition {
            roles: pipeline.roles,
            work_units: pipeline.units,
        }
    }
}

impl Pipeline {
    /// Build a pipeline, checking that it is non-empty, that role and unit
    /// names are distinct, and that every unit's role is defined.
    ///
    /// Returns the first [`SequencingError`] found.
    pub fn new(roles: Vec<Role>, units: Vec<WorkUnit>) -> Result<Self, SequencingError> {
        if units.is_empty() {
            return Err(SequencingError::EmptyPipeline);
        }

        let mut role_names = HashSet::new();
        for role in &roles {
            if !role_names.insert(role.name.as_str()) {
                return Err(SequencingError::DuplicateRole(role.name.clone()));
            }
        }

        let mut unit_names = HashSet::new();
        for unit in &units {
            if !unit_names.insert(unit.name.as_str()) {
                return Err(SequencingError::DuplicateUnit(unit.name.clone()));
            }
            if !role_names.contains(unit.role.as_str()) {
                return Err(SequencingError::UnknownRole {
                    unit: unit.name.clone(),
                    role: unit.role.clone(),
                });
            }
        }

        Ok(Self { roles, units })
    }

    /// Parse and validate a JSON pipeline definition
    /// (`{ "roles": [...], "work_units": [...] }`).
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn units(&self) -> &[WorkUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Always false for a constructed pipeline.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name == name)
    }

    /// Roles other than `name`, in declaration order.
    pub fn coworkers_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Role> + 'a {
        self.roles.iter().filter(move |r| r.name != name)
    }

    /// The ordered unit → role sequence this pipeline will execute.
    pub fn plan(&self) -> Vec<PlannedStep> {
        self.units
            .iter()
            .enumerate()
            .map(|(position, unit)| PlannedStep {
                position,
                unit: unit.name.clone(),
                role: unit.role.clone(),
            })
            .collect()
    }

    /// SHA-256 hex digest of the ordered unit definitions and their bound
    /// roles. Identical definitions always produce the same digest.
    pub fn sequencing_digest(&self) -> String {
        let mut hasher = Sha256::new();
        for unit in &self.units {
            for field in [
                &unit.name,
                &unit.description,
                &unit.expected_output,
                &unit.role,
            ] {
                hasher.update(field.as_bytes());
                hasher.update(b"\0");
            }
            if let Some(role) = self.role(&unit.role) {
                hasher.update(role.goal.as_bytes());
                hasher.update(b"\0");
                hasher.update(role.backstory.as_bytes());
                hasher.update(b"\0");
                hasher.update([role.allow_delegation as u8, role.verbose as u8]);
                for tool in &role.tools {
                    hasher.update(tool.to_string().as_bytes());
                    hasher.update(b"\0");
                }
            }
            hasher.update(b"\x1e");
        }
        hex::encode(hasher.finalize())
    }

    /// Check every role's capability wiring against the run options.
    ///
    /// Search bounds are never clamped: a role asking for more results than
    /// the run allows is rejected here, before any stage runs.
    pub fn check_capabilities(
        &self,
        options: &RunOptions,
        search_available: bool,
    ) -> Result<(), ConfigError> {
        for role in self.roles.iter().filter(|r| r.can_search()) {
            if !search_available {
                return Err(ConfigError::MissingSearchCapability {
                    role: role.name.clone(),
                });
            }
            role.search_limit(options.search_result_limit)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::ToolBinding;

    fn roles() -> Vec<Role> {
        vec![
            Role::new("Analyst", "Research {topic}", "Careful.").with_tool(ToolBinding::search()),
            Role::new("Writer", "Write about {topic}", "Clear."),
        ]
    }

    fn units() -> Vec<WorkUnit> {
        vec![
            WorkUnit::new("research", "Research {topic}", "A brief", "Analyst"),
            WorkUnit::new("writing", "Write on {topic}", "A post", "Writer"),
        ]
    }

    #[test]
    fn test_valid_pipeline_builds() {
        let pipeline = Pipeline::new(roles(), units()).unwrap();
        assert_eq!(pipeline.len(), 2);
        assert!(!pipeline.is_empty());
        assert!(pipeline.role("Writer").is_some());
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        assert_eq!(
            Pipeline::new(roles(), vec![]).unwrap_err(),
            SequencingError::EmptyPipeline
        );
    }

    #[test]
    fn test_unknown_role_rejected() {
        let units = vec![WorkUnit::new("edit", "Edit {topic}", "Edits", "Editor")];
        match Pipeline::new(roles(), units).unwrap_err() {
            SequencingError::UnknownRole { unit, role } => {
                assert_eq!(unit, "edit");
                assert_eq!(role, "Editor");
            }
            other => panic!("Expected UnknownRole, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_role_rejected() {
        let mut roles = roles();
        roles.push(Role::new("Writer", "Again", "Dup"));
        assert_eq!(
            Pipeline::new(roles, units()).unwrap_err(),
            SequencingError::DuplicateRole("Writer".to_string())
        );
    }

    #[test]
    fn test_duplicate_unit_rejected() {
        let mut units = units();
        units.push(WorkUnit::new("research", "More", "More", "Analyst"));
        assert_eq!(
            Pipeline::new(roles(), units).unwrap_err(),
            SequencingError::DuplicateUnit("research".to_string())
        );
    }

    #[test]
    fn test_plan_preserves_declared_order() {
        let plan = Pipeline::new(roles(), units()).unwrap().plan();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].position, 0);
        assert_eq!(plan[0].unit, "research");
        assert_eq!(plan[0].role, "Analyst");
        assert_eq!(plan[1].unit, "writing");
    }

    #[test]
    fn test_sequencing_digest_is_deterministic() {
        let a = Pipeline::new(roles(), units()).unwrap();
        let b = Pipeline::new(roles(), units()).unwrap();
        assert_eq!(a.sequencing_digest(), b.sequencing_digest());
        assert_eq!(a.plan(), b.plan());
    }

    #[test]
    fn test_sequencing_digest_is_order_sensitive() {
        let a = Pipeline::new(roles(), units()).unwrap();
        let mut reversed = units();
        reversed.reverse();
        let b = Pipeline::new(roles(), reversed).unwrap();
        assert_ne!(a.sequencing_digest(), b.sequencing_digest());
    }

    #[test]
    fn test_search_binding_requires_capability() {
        let pipeline = Pipeline::new(roles(), units()).unwrap();
        let err = pipeline
            .check_capabilities(&RunOptions::default(), false)
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingSearchCapability {
                role: "Analyst".to_string()
            }
        );
        assert!(pipeline
            .check_capabilities(&RunOptions::default(), true)
            .is_ok());
    }

    #[test]
    fn test_role_search_bound_above_run_limit_rejected() {
        let roles = vec![
            Role::new("Analyst", "Research", "Careful.")
                .with_tool(ToolBinding::search_with_limit(8)),
            Role::new("Writer", "Write", "Clear."),
        ];
        let pipeline = Pipeline::new(roles, units()).unwrap();
        let options = RunOptions {
            search_result_limit: 5,
            ..RunOptions::default()
        };
        assert!(matches!(
            pipeline.check_capabilities(&options, true),
            Err(ConfigError::RoleSearchLimitExceeded {
                requested: 8,
                limit: 5,
                ..
            })
        ));
    }

    #[test]
    fn test_json_definition_is_validated() {
        let json = r#"{
            "roles": [{"name": "Writer", "goal": "Write {topic}", "backstory": "Clear."}],
            "work_units": [{"name": "w", "description": "Write {topic}",
                            "expected_output": "Post", "role": "Ghost"}]
        }"#;
        let err = Pipeline::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("unknown role"));
    }

    #[test]
    fn test_json_definition_roundtrips() {
        let pipeline = Pipeline::new(roles(), units()).unwrap();
        let json = serde_json::to_string(&pipeline).unwrap();
        let parsed = Pipeline::from_json_str(&json).unwrap();
        assert_eq!(parsed, pipeline);
    }
}
