//! Collection wrapper types for displaying groups of domain objects.
//!
//! Each wrapper prints its members one after another and a short notice
//! when the collection is empty.

use std::{fmt, ops::Index};

use crate::models::{FlowSummary, Playbook};

/// Newtype wrapper for displaying a list of flow summaries.
///
/// # Examples
///
/// ```rust
/// use irflow_core::display::FlowSummaries;
///
/// let empty = FlowSummaries(vec![]);
/// assert_eq!(empty.to_string(), "No flows found.\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct FlowSummaries(pub Vec<FlowSummary>);

impl FlowSummaries {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, index: usize) -> Option<&FlowSummary> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FlowSummary> {
        self.0.iter()
    }
}

impl Index<usize> for FlowSummaries {
    type Output = FlowSummary;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IntoIterator for FlowSummaries {
    type Item = FlowSummary;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FlowSummaries {
    type Item = &'a FlowSummary;
    type IntoIter = std::slice::Iter<'a, FlowSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for FlowSummaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No flows found.");
        }
        for summary in &self.0 {
            write!(f, "{summary}")?;
        }
        Ok(())
    }
}

/// Newtype wrapper for the playbook catalogue. Only names, titles and step
/// counts are shown; use the `Playbook` display for the full definition.
#[derive(Debug, Clone, Default)]
pub struct Playbooks(pub Vec<Playbook>);

impl Playbooks {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Playbook> {
        self.0.iter()
    }
}

impl fmt::Display for Playbooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No playbooks found.");
        }
        for playbook in &self.0 {
            writeln!(
                f,
                "- **{}**: {} ({} phases, {} steps)",
                playbook.name,
                playbook.title,
                playbook.phases.len(),
                playbook.step_count()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;
    use crate::{engine::FlowOutcome, models::FlowStatus};

    fn summary(id: u64, incident_id: &str) -> FlowSummary {
        FlowSummary {
            id,
            playbook: "phishing".to_string(),
            incident_id: incident_id.to_string(),
            status: FlowStatus::Active,
            started_by: None,
            total_steps: 4,
            completed_steps: 1,
            progress: 25,
            outcome: FlowOutcome::InProgress,
            current_step: Some("analyse".to_string()),
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        }
    }

    #[test]
    fn test_flow_summaries_lists_each_flow() {
        let summaries = FlowSummaries(vec![summary(1, "INC-1"), summary(2, "INC-2")]);
        let output = summaries.to_string();
        assert!(output.contains("INC-1"));
        assert!(output.contains("INC-2"));
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[1].id, 2);
    }

    #[test]
    fn test_empty_playbooks() {
        assert_eq!(Playbooks(vec![]).to_string(), "No playbooks found.\n");
    }
}
