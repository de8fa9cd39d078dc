//! Task assignments bound to a role.

use serde::{Deserialize, Serialize};

use crate::prompt::interpolate;

/// A single unit of work for one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkUnit {
    /// Identity, unique within a pipeline; labels this unit's output for later stages.
    pub name: String,
    /// Instruction given to the bound role; `{topic}` is substituted at run time.
    pub description: String,
    /// Acceptance criterion. Included in the prompt, never validated.
    pub expected_output: String,
    /// Name of the role responsible for this unit.
    pub role: String,
}

impl WorkUnit {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        expected_output: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            expected_output: expected_output.into(),
            role: role.into(),
        }
    }

    pub fn description_for(&self, topic: &str) -> String {
        interpolate(&self.description, topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_substitutes_every_placeholder() {
        let unit = WorkUnit::new(
            "research",
            "Research {topic}. Keep {topic} in focus.",
            "A brief.",
            "Analyst",
        );
        assert_eq!(
            unit.description_for("solar"),
            "Research solar. Keep solar in focus."
        );
    }
}
