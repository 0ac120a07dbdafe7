//! Result wrapper types for displaying operation outcomes.

use std::fmt;

use crate::models::{Flow, Playbook};

/// Outcome of triggering a flow or importing a playbook.
pub struct CreateResult<T> {
    pub resource: T,
}

impl<T> CreateResult<T> {
    pub fn new(resource: T) -> Self {
        Self { resource }
    }
}

impl fmt::Display for CreateResult<Flow> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Triggered flow {} for incident {}",
            self.resource.id, self.resource.incident_id
        )?;
        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

impl fmt::Display for CreateResult<Playbook> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Imported playbook '{}'", self.resource.name)?;
        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

/// Outcome of a step action, lifecycle change or commit, with an optional
/// list of what changed.
///
/// # Examples
///
/// ```rust
/// use irflow_core::{display::UpdateResult, models::{Flow, Playbook}};
/// use jiff::Timestamp;
///
/// let playbook = Playbook::from_json(r#"{"name":"p","title":"P","phases":[
///     {"name":"x","title":"X","steps":[{"name":"s","title":"S"}]}]}"#)?;
/// let flow = Flow::instantiate(7, &playbook, "INC-7", None, Timestamp::now());
///
/// let output = UpdateResult::new(flow).to_string();
/// assert!(output.starts_with("Updated flow 7"));
/// assert!(!output.contains("Changes made:"));
/// # irflow_core::Result::<()>::Ok(())
/// ```
pub struct UpdateResult<T> {
    pub resource: T,
    pub changes: Vec<String>,
}

impl<T> UpdateResult<T> {
    pub fn new(resource: T) -> Self {
        Self {
            resource,
            changes: Vec::new(),
        }
    }

    pub fn with_changes(resource: T, changes: Vec<String>) -> Self {
        Self { resource, changes }
    }
}

impl fmt::Display for UpdateResult<Flow> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Updated flow {}", self.resource.id)?;
        writeln!(f)?;

        if !self.changes.is_empty() {
            writeln!(f, "Changes made:")?;
            for change in &self.changes {
                writeln!(f, "- {change}")?;
            }
            writeln!(f)?;
        }

        write!(f, "{}", self.resource)
    }
}
