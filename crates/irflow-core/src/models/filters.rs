//! Filter types for querying flows.

use super::FlowStatus;

/// Filter options for querying flows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowFilter {
    /// Only flows in this status
    pub status: Option<FlowStatus>,

    /// Only flows bound to this incident
    pub incident_id: Option<String>,

    /// Only flows triggered by this analyst
    pub started_by: Option<String>,

    /// Only active or paused flows; ignored when `status` is set
    pub in_flight_only: bool,
}

impl FlowFilter {
    /// Filter for the in-flight flows of one analyst, as shown on the
    /// dashboard. `None` selects every analyst.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use irflow_core::models::FlowFilter;
    ///
    /// let filter = FlowFilter::in_flight_for(Some("alice"));
    /// assert_eq!(filter.started_by.as_deref(), Some("alice"));
    /// assert!(filter.in_flight_only);
    /// ```
    pub fn in_flight_for(analyst: Option<&str>) -> Self {
        Self {
            started_by: analyst.map(String::from),
            in_flight_only: true,
            ..Default::default()
        }
    }

    /// Query-string pairs for the REST backend.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(status) = self.status {
            query.push(("status", status.as_str().to_string()));
        }
        if let Some(ref incident_id) = self.incident_id {
            query.push(("incident_id", incident_id.clone()));
        }
        if let Some(ref started_by) = self.started_by {
            query.push(("started_by", started_by.clone()));
        }
        if self.in_flight_only && self.status.is_none() {
            query.push(("in_flight", "true".to_string()));
        }
        query
    }
}
