//! Incident manager: creation, deduplication, analysis attachment, and
//! one-way resolution.
//!
//! All mutation happens under a single lock so the dedup check in
//! `create_from_health_transition` is atomic with the insert.

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use thiserror::Error;

use crate::store::{HealthStatus, Incident, IncidentStatus, Severity};

/// Incident error types.
#[derive(Error, Debug)]
pub enum IncidentError {
    #[error("incident {0} not found")]
    NotFound(u64),
}

struct Inner {
    incidents: Vec<Incident>,
    next_id: u64,
}

/// Thread-safe incident store and lifecycle manager.
#[derive(Clone)]
pub struct IncidentManager {
    inner: Arc<Mutex<Inner>>,
}

impl Default for IncidentManager {
    fn default() -> Self {
        Self::new()
    }
}

impl IncidentManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                incidents: Vec::new(),
                next_id: 1,
            })),
        }
    }

    /// Record a new open incident. Always succeeds; ids are monotonic.
    pub fn create(
        &self,
        title: &str,
        description: &str,
        severity: Severity,
        source_target_id: Option<&str>,
    ) -> Incident {
        let mut inner = self.inner.lock().unwrap();
        Self::insert(&mut inner, title, description, severity, source_target_id)
    }

    /// Open an incident for a health degradation, unless the target already
    /// has one open. Returns the new incident, or `None` when deduplicated.
    pub fn create_from_health_transition(
        &self,
        target_id: &str,
        from: HealthStatus,
        to: HealthStatus,
    ) -> Option<Incident> {
        let mut inner = self.inner.lock().unwrap();

        let already_open = inner.incidents.iter().any(|i| {
            i.status == IncidentStatus::Open
                && i.source_target_id.as_deref() == Some(target_id)
        });
        if already_open {
            return None;
        }

        let severity = match to {
            HealthStatus::Unhealthy => Severity::High,
            _ => Severity::Medium,
        };
        let title = format!("{} is {}", target_id, status_word(to));
        let description = format!(
            "Health check for {} transitioned from {} to {}",
            target_id,
            status_word(from),
            status_word(to)
        );

        let incident = Self::insert(
            &mut inner,
            &title,
            &description,
            severity,
            Some(target_id),
        );
        tracing::warn!(
            "Opened incident {} for {}: {}",
            incident.id,
            target_id,
            incident.title
        );
        Some(incident)
    }

    /// Attach an analysis narrative. Idempotent: once set, the text is
    /// frozen and later calls are no-ops.
    pub fn attach_analysis(&self, id: u64, text: &str) -> Result<Incident, IncidentError> {
        let mut inner = self.inner.lock().unwrap();
        let incident = inner
            .incidents
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(IncidentError::NotFound(id))?;

        if incident.ai_analysis.is_none() {
            incident.ai_analysis = Some(text.to_string());
        }
        Ok(incident.clone())
    }

    /// Resolve an incident. One-way: resolving twice is a no-op, and the
    /// original `resolved_at` is kept.
    pub fn resolve(&self, id: u64) -> Result<Incident, IncidentError> {
        let mut inner = self.inner.lock().unwrap();
        let incident = inner
            .incidents
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(IncidentError::NotFound(id))?;

        if incident.status == IncidentStatus::Open {
            incident.status = IncidentStatus::Resolved;
            incident.resolved_at = Some(Utc::now());
        }
        Ok(incident.clone())
    }

    /// Fetch a single incident by id.
    pub fn get(&self, id: u64) -> Result<Incident, IncidentError> {
        let inner = self.inner.lock().unwrap();
        inner
            .incidents
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or(IncidentError::NotFound(id))
    }

    /// All incidents, most recent first.
    pub fn list(&self) -> Vec<Incident> {
        let inner = self.inner.lock().unwrap();
        let mut incidents = inner.incidents.clone();
        incidents.reverse();
        incidents
    }

    /// Count of currently open incidents.
    pub fn open_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .incidents
            .iter()
            .filter(|i| i.status == IncidentStatus::Open)
            .count()
    }

    /// Synthesize a fixed demo batch to populate the dashboard. Bypasses
    /// deduplication and is intentionally non-idempotent.
    pub fn generate_demo_batch(&self) -> Vec<Incident> {
        let mut inner = self.inner.lock().unwrap();
        let mut created = Vec::new();

        let batch: [(&str, Severity, &str, bool); 3] = [
            (
                "High Response Time Detected",
                Severity::Medium,
                "Response times have increased by 200% in the last 5 minutes",
                false,
            ),
            (
                "Service Unavailability",
                Severity::High,
                "Sample application is not responding to health checks",
                false,
            ),
            (
                "Error Rate Spike",
                Severity::Low,
                "Error rate increased temporarily but has recovered",
                true,
            ),
        ];

        for (title, severity, description, resolved) in batch {
            let mut incident = Self::insert(&mut inner, title, description, severity, None);
            if resolved {
                incident.status = IncidentStatus::Resolved;
                incident.resolved_at = Some(Utc::now() - Duration::minutes(30));
                let slot = inner
                    .incidents
                    .iter_mut()
                    .find(|i| i.id == incident.id)
                    .expect("just inserted");
                *slot = incident.clone();
            }
            created.push(incident);
        }

        created
    }

    fn insert(
        inner: &mut Inner,
        title: &str,
        description: &str,
        severity: Severity,
        source_target_id: Option<&str>,
    ) -> Incident {
        let incident = Incident {
            id: inner.next_id,
            title: title.to_string(),
            description: description.to_string(),
            severity,
            status: IncidentStatus::Open,
            created_at: Utc::now(),
            resolved_at: None,
            ai_analysis: None,
            source_target_id: source_target_id.map(str::to_string),
        };
        inner.next_id += 1;
        inner.incidents.push(incident.clone());
        incident
    }
}

fn status_word(status: HealthStatus) -> &'static str {
    match status {
        HealthStatus::Unknown => "unknown",
        HealthStatus::Healthy => "healthy",
        HealthStatus::Degraded => "degraded",
        HealthStatus::Unhealthy => "unhealthy",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_assigns_monotonic_ids() {
        let mgr = IncidentManager::new();
        let a = mgr.create("first", "d", Severity::Low, None);
        let b = mgr.create("second", "d", Severity::High, Some("app"));

        assert!(b.id > a.id);
        assert_eq!(b.status, IncidentStatus::Open);
        assert_eq!(b.source_target_id.as_deref(), Some("app"));
        assert!(b.ai_analysis.is_none());
        assert!(b.resolved_at.is_none());
    }

    #[test]
    fn test_health_transition_dedups_per_target() {
        let mgr = IncidentManager::new();

        let first = mgr.create_from_health_transition(
            "app",
            HealthStatus::Healthy,
            HealthStatus::Unhealthy,
        );
        assert!(first.is_some());

        // Repeated degraded readings against the same open incident.
        for _ in 0..5 {
            let dup = mgr.create_from_health_transition(
                "app",
                HealthStatus::Degraded,
                HealthStatus::Unhealthy,
            );
            assert!(dup.is_none());
        }
        assert_eq!(mgr.open_count(), 1);

        // A different target is not deduplicated against "app".
        let other = mgr.create_from_health_transition(
            "gateway",
            HealthStatus::Healthy,
            HealthStatus::Degraded,
        );
        assert!(other.is_some());
        assert_eq!(mgr.open_count(), 2);
    }

    #[test]
    fn test_dedup_clears_after_resolution() {
        let mgr = IncidentManager::new();
        let first = mgr
            .create_from_health_transition(
                "app",
                HealthStatus::Healthy,
                HealthStatus::Unhealthy,
            )
            .unwrap();
        mgr.resolve(first.id).unwrap();

        let second = mgr.create_from_health_transition(
            "app",
            HealthStatus::Healthy,
            HealthStatus::Unhealthy,
        );
        assert!(second.is_some());
        assert_ne!(second.unwrap().id, first.id);
    }

    #[test]
    fn test_attach_analysis_is_idempotent() {
        let mgr = IncidentManager::new();
        let incident = mgr.create("outage", "d", Severity::High, None);

        let first = mgr.attach_analysis(incident.id, "root cause: disk full").unwrap();
        assert_eq!(first.ai_analysis.as_deref(), Some("root cause: disk full"));

        let second = mgr.attach_analysis(incident.id, "different text").unwrap();
        assert_eq!(second.ai_analysis.as_deref(), Some("root cause: disk full"));
    }

    #[test]
    fn test_attach_analysis_unknown_id() {
        let mgr = IncidentManager::new();
        assert!(matches!(
            mgr.attach_analysis(999, "text"),
            Err(IncidentError::NotFound(999))
        ));
    }

    #[test]
    fn test_resolve_is_one_way() {
        let mgr = IncidentManager::new();
        let incident = mgr.create("outage", "d", Severity::High, None);

        let resolved = mgr.resolve(incident.id).unwrap();
        assert_eq!(resolved.status, IncidentStatus::Resolved);
        let first_resolved_at = resolved.resolved_at.unwrap();

        // Resolving again is a no-op and never reopens or re-stamps.
        let again = mgr.resolve(incident.id).unwrap();
        assert_eq!(again.status, IncidentStatus::Resolved);
        assert_eq!(again.resolved_at.unwrap(), first_resolved_at);
    }

    #[test]
    fn test_resolve_unknown_id() {
        let mgr = IncidentManager::new();
        assert!(matches!(mgr.resolve(42), Err(IncidentError::NotFound(42))));
    }

    #[test]
    fn test_list_most_recent_first() {
        let mgr = IncidentManager::new();
        mgr.create("first", "d", Severity::Low, None);
        mgr.create("second", "d", Severity::Low, None);

        let list = mgr.list();
        assert_eq!(list[0].title, "second");
        assert_eq!(list[1].title, "first");
    }

    #[test]
    fn test_demo_batch_is_non_idempotent() {
        let mgr = IncidentManager::new();
        let first = mgr.generate_demo_batch();
        let second = mgr.generate_demo_batch();

        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 3);
        assert_eq!(mgr.list().len(), 6);

        // The pre-resolved demo entry carries a resolution timestamp.
        let resolved: Vec<_> = mgr
            .list()
            .into_iter()
            .filter(|i| i.status == IncidentStatus::Resolved)
            .collect();
        assert_eq!(resolved.len(), 2);
        assert!(resolved.iter().all(|i| i.resolved_at.is_some()));
    }
}
