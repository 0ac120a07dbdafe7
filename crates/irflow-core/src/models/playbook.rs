//! Playbook templates: the reusable definition a flow is instantiated from.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::StepType;
use crate::error::{FlowError, Result};

fn default_required() -> bool {
    true
}

fn default_estimated_minutes() -> u32 {
    5
}

/// A named response template made of ordered phases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Playbook {
    /// Unique name used to reference the playbook
    pub name: String,

    /// Human readable title
    pub title: String,

    /// What the playbook is for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Phases in execution order
    pub phases: Vec<PhaseDefinition>,
}

/// Ordered group of step definitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseDefinition {
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub steps: Vec<StepDefinition>,
}

/// Template for a single step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepDefinition {
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub step_type: StepType,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default = "default_estimated_minutes")]
    pub estimated_minutes: u32,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub depends_on: BTreeSet<String>,
}

impl Playbook {
    /// Parses a playbook from JSON and validates it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use irflow_core::models::Playbook;
    ///
    /// let playbook = Playbook::from_json(r#"{
    ///     "name": "phishing",
    ///     "title": "Phishing response",
    ///     "phases": [{
    ///         "name": "triage",
    ///         "title": "Triage",
    ///         "steps": [
    ///             {"name": "collect", "title": "Collect headers", "step_type": "artifact_collection"},
    ///             {"name": "analyse", "title": "Analyse sender", "depends_on": ["collect"]}
    ///         ]
    ///     }]
    /// }"#)?;
    ///
    /// assert_eq!(playbook.step_count(), 2);
    /// # irflow_core::Result::<()>::Ok(())
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let playbook: Playbook = serde_json::from_str(json)?;
        playbook.validate()?;
        Ok(playbook)
    }

    /// Total number of steps across all phases.
    pub fn step_count(&self) -> usize {
        self.phases.iter().map(|phase| phase.steps.len()).sum()
    }

    /// Step definitions in global order.
    pub fn steps(&self) -> impl Iterator<Item = &StepDefinition> {
        self.phases.iter().flat_map(|phase| phase.steps.iter())
    }

    /// Checks structural rules: unique names, positive estimates, known
    /// dependencies and an acyclic dependency graph.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(FlowError::invalid_input("name").with_reason("Playbook name cannot be empty"));
        }
        if self.title.trim().is_empty() {
            return Err(FlowError::invalid_input("title").with_reason("Playbook title cannot be empty"));
        }
        if self.phases.is_empty() {
            return Err(FlowError::invalid_input("phases")
                .with_reason("Playbook must contain at least one phase"));
        }

        let mut phase_names = HashSet::new();
        for phase in &self.phases {
            if phase.name.trim().is_empty() {
                return Err(FlowError::invalid_input("phases.name")
                    .with_reason("Phase name cannot be empty"));
            }
            if !phase_names.insert(phase.name.as_str()) {
                return Err(FlowError::invalid_input("phases.name")
                    .with_reason(format!("Duplicate phase name '{}'", phase.name)));
            }
            if phase.steps.is_empty() {
                return Err(FlowError::invalid_input("phases.steps")
                    .with_reason(format!("Phase '{}' has no steps", phase.name)));
            }
        }

        let mut step_names = HashSet::new();
        for step in self.steps() {
            if step.name.trim().is_empty() {
                return Err(FlowError::invalid_input("steps.name").with_reason("Step name cannot be empty"));
            }
            if !step_names.insert(step.name.as_str()) {
                return Err(FlowError::invalid_input("steps.name")
                    .with_reason(format!("Duplicate step name '{}'", step.name)));
            }
            if step.estimated_minutes == 0 {
                return Err(FlowError::invalid_input("steps.estimated_minutes")
                    .with_reason(format!("Step '{}' must have a positive estimate", step.name)));
            }
        }

        for step in self.steps() {
            for dependency in &step.depends_on {
                if dependency == &step.name {
                    return Err(FlowError::invalid_input("steps.depends_on")
                        .with_reason(format!("Step '{}' depends on itself", step.name)));
                }
                if !step_names.contains(dependency.as_str()) {
                    return Err(FlowError::invalid_input("steps.depends_on").with_reason(format!(
                        "Step '{}' depends on unknown step '{dependency}'",
                        step.name
                    )));
                }
            }
        }

        if let Some(step) = self.find_cycle() {
            return Err(FlowError::invalid_input("steps.depends_on")
                .with_reason(format!("Dependency cycle through step '{step}'")));
        }

        Ok(())
    }

    /// Returns a step that lies on a dependency cycle, if any.
    fn find_cycle(&self) -> Option<String> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            name: &'a str,
            graph: &HashMap<&'a str, &'a BTreeSet<String>>,
            marks: &mut HashMap<&'a str, Mark>,
        ) -> Option<String> {
            match marks.get(name) {
                Some(Mark::Done) => return None,
                Some(Mark::Visiting) => return Some(name.to_string()),
                None => {}
            }
            marks.insert(name, Mark::Visiting);
            let deps: Option<&'a BTreeSet<String>> = graph.get(name).copied();
            if let Some(deps) = deps {
                for dep in deps {
                    if let Some(found) = visit(dep.as_str(), graph, marks) {
                        return Some(found);
                    }
                }
            }
            marks.insert(name, Mark::Done);
            None
        }

        let graph: HashMap<&str, &BTreeSet<String>> = self
            .steps()
            .map(|step| (step.name.as_str(), &step.depends_on))
            .collect();
        let mut marks = HashMap::new();

        self.steps()
            .find_map(|step| visit(step.name.as_str(), &graph, &mut marks))
    }
}
