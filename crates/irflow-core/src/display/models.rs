//! Display implementations for domain models.
//!
//! Status enums print their wire name so they read the same in error
//! messages, logs and query strings. Everything else renders as markdown.

use std::fmt;

use super::datetime::{Elapsed, LocalDateTime};
use crate::{
    engine::{FlowOutcome, FlowProgress, Resolution},
    models::{
        AlertDisposition, DashboardSummary, Flow, FlowStatus, FlowSummary, IncidentStatus,
        Playbook, Step, StepStatus, StepType,
    },
};

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AlertDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FlowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FlowOutcome::InProgress => "in progress",
            FlowOutcome::Succeeded => "succeeded",
            FlowOutcome::Degraded => "finished with failed steps",
            FlowOutcome::Stuck => "stuck",
        };
        f.write_str(label)
    }
}

fn write_json(f: &mut fmt::Formatter<'_>, heading: &str, value: &serde_json::Value) -> fmt::Result {
    writeln!(f, "#### {heading}")?;
    writeln!(f)?;
    writeln!(f, "```json")?;
    match serde_json::to_string_pretty(value) {
        Ok(pretty) => writeln!(f, "{pretty}")?,
        Err(_) => writeln!(f, "{value}")?,
    }
    writeln!(f, "```")?;
    writeln!(f)
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let optional = if self.required { "" } else { ", optional" };
        writeln!(
            f,
            "### {}: {} ({}{optional})",
            self.name,
            self.title,
            self.status.with_icon()
        )?;
        writeln!(f)?;

        if let Some(desc) = &self.description {
            writeln!(f, "{desc}")?;
            writeln!(f)?;
        }

        write!(f, "- Type: {}", self.step_type)?;
        write!(f, ", estimate: {} min", self.estimated_minutes)?;
        if let Some(seconds) = self.duration_seconds() {
            write!(f, ", took {}", Elapsed(seconds))?;
        }
        writeln!(f)?;
        if !self.depends_on.is_empty() {
            let deps: Vec<&str> = self.depends_on.iter().map(String::as_str).collect();
            writeln!(f, "- Depends on: {}", deps.join(", "))?;
        }
        if let Some(reason) = &self.skip_reason {
            writeln!(f, "- Skipped: {reason}")?;
        }
        writeln!(f)?;

        if let Some(input) = &self.input_data {
            write_json(f, "Input", input)?;
        }
        if let Some(output) = &self.output_data {
            write_json(f, "Output", output)?;
        }
        if let Some(error) = &self.error_data {
            write_json(f, "Error", error)?;
        }

        Ok(())
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let progress = FlowProgress::of(self);

        writeln!(f, "# Flow {}: {}", self.id, self.playbook)?;
        writeln!(f)?;
        writeln!(f, "- Incident: {}", self.incident_id)?;
        writeln!(f, "- Status: {}", self.status)?;
        if let Some(reason) = &self.status_reason {
            writeln!(f, "- Reason: {reason}")?;
        }
        if let Some(analyst) = &self.started_by {
            writeln!(f, "- Started by: {analyst}")?;
        }
        writeln!(
            f,
            "- Progress: {}% ({}/{} steps, {})",
            progress.percent, progress.completed, progress.total, progress.outcome
        )?;
        writeln!(f, "- Created: {}", LocalDateTime(&self.created_at))?;
        writeln!(f, "- Updated: {}", LocalDateTime(&self.updated_at))?;

        if let Some(commit) = &self.commit {
            writeln!(f)?;
            writeln!(f, "## Final Report")?;
            writeln!(f)?;
            writeln!(
                f,
                "Alert {}, incident {}.",
                commit.alert_disposition, commit.incident_status
            )?;
            writeln!(f)?;
            writeln!(f, "{}", commit.final_report)?;
        }

        for (phase, phase_progress) in self.phases.iter().zip(&progress.phases) {
            writeln!(f)?;
            writeln!(
                f,
                "## {} ({}%)",
                phase.title, phase_progress.percent
            )?;
            writeln!(f)?;
            if let Some(desc) = &phase.description {
                writeln!(f, "{desc}")?;
                writeln!(f)?;
            }
            for step in &phase.steps {
                write!(f, "{step}")?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for Playbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {} ({})", self.title, self.name)?;
        writeln!(f)?;
        if let Some(desc) = &self.description {
            writeln!(f, "{desc}")?;
            writeln!(f)?;
        }

        for phase in &self.phases {
            writeln!(f, "## {}", phase.title)?;
            writeln!(f)?;
            for step in &phase.steps {
                write!(f, "- **{}**: {} [{}", step.name, step.title, step.step_type)?;
                if !step.required {
                    write!(f, ", optional")?;
                }
                write!(f, ", {} min]", step.estimated_minutes)?;
                if !step.depends_on.is_empty() {
                    let deps: Vec<&str> = step.depends_on.iter().map(String::as_str).collect();
                    write!(f, " after {}", deps.join(", "))?;
                }
                writeln!(f)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl fmt::Display for FlowSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "## Flow {}: {} for {} ({}/{})",
            self.id, self.playbook, self.incident_id, self.completed_steps, self.total_steps
        )?;
        writeln!(f)?;
        writeln!(f, "- **Status**: {} ({})", self.status, self.outcome)?;
        writeln!(f, "- **Progress**: {}%", self.progress)?;
        if let Some(step) = &self.current_step {
            writeln!(f, "- **Current step**: {step}")?;
        }
        if let Some(analyst) = &self.started_by {
            writeln!(f, "- **Started by**: {analyst}")?;
        }
        writeln!(f, "- **Updated**: {}", LocalDateTime(&self.updated_at))?;
        writeln!(f)
    }
}

impl fmt::Display for FlowProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "# Flow {} for {}: {}%",
            self.flow_id, self.incident_id, self.percent
        )?;
        writeln!(f)?;
        writeln!(f, "- Status: {} ({})", self.status, self.outcome)?;
        writeln!(f, "- Completed: {}/{}", self.completed, self.total)?;
        if let Some(step) = &self.current_step {
            writeln!(f, "- Current step: {step}")?;
        }
        writeln!(
            f,
            "- Estimated time remaining: {} min",
            self.estimated_minutes_remaining
        )?;
        writeln!(f)?;

        writeln!(f, "## Phases")?;
        writeln!(f)?;
        for phase in &self.phases {
            writeln!(
                f,
                "- {}: {}% ({}/{})",
                phase.title, phase.percent, phase.completed, phase.total
            )?;
        }
        writeln!(f)?;

        writeln!(f, "## Steps by Status")?;
        writeln!(f)?;
        for (status, count) in self.status_counts.iter().filter(|(_, count)| *count > 0) {
            writeln!(f, "- {}: {count}", status.with_icon())?;
        }

        Ok(())
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Active { step } => {
                writeln!(f, "Step in progress:")?;
                writeln!(f)?;
                write!(f, "{step}")
            }
            Resolution::Ready { step } => {
                writeln!(f, "Next step:")?;
                writeln!(f)?;
                write!(f, "{step}")
            }
            Resolution::Complete => {
                writeln!(f, "All steps are finished. The flow is ready to commit.")
            }
            Resolution::Deadlocked { blocked } => {
                writeln!(
                    f,
                    "No step can run. Blocked steps: {}",
                    blocked.join(", ")
                )
            }
        }
    }
}

impl fmt::Display for DashboardSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.analyst {
            Some(analyst) => writeln!(f, "# Flows in flight for {analyst}")?,
            None => writeln!(f, "# Flows in flight")?,
        }
        writeln!(f)?;

        if self.flows.is_empty() {
            return writeln!(f, "No flows found.");
        }

        let counts: Vec<String> = self
            .status_counts
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(status, count)| format!("{count} {status}"))
            .collect();
        writeln!(f, "Steps: {}", counts.join(", "))?;
        writeln!(f)?;

        for summary in &self.flows {
            write!(f, "{summary}")?;
        }
        Ok(())
    }
}
