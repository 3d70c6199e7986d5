//! Contact registry.
//!
//! Turns per-tick detection results into stable, labelled contacts. Labels
//! (`S1`, `S2`, ...) are assigned once per registry and never reused while
//! the contact lives. Contacts are only removed by `clear_lost_contacts`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use fathom_core::constants::*;
use fathom_core::contact::{Contact, ManualSolution};
use fathom_core::enums::{ContactFilter, ContactSort, ContactStatus};
use fathom_core::events::SonarEvent;
use fathom_core::target::{DetectionResult, TargetId};
use fathom_core::types::angle_diff_deg;

/// Registry tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Seconds unseen before a contact is marked lost.
    pub lost_timeout_secs: f64,
    /// Bearing window (degrees) for ambiguity fusion.
    pub fusion_bearing_deg: f64,
    /// Range window (meters) for ambiguity fusion.
    pub fusion_range_meters: f64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            lost_timeout_secs: CONTACT_LOST_TIMEOUT_SECS,
            fusion_bearing_deg: FUSION_BEARING_DEG,
            fusion_range_meters: FUSION_RANGE_METERS,
        }
    }
}

/// Why a relabel was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelabelError {
    #[error("alias is empty")]
    Empty,
    #[error("alias exceeds {} characters", ALIAS_MAX_LEN)]
    TooLong,
    #[error("alias {0} is already in use")]
    Duplicate(String),
    #[error("no contact for target {0}")]
    NotFound(TargetId),
}

impl RelabelError {
    /// Stable machine-readable code for the host UI.
    pub fn reason_code(&self) -> &'static str {
        match self {
            RelabelError::Empty => "empty",
            RelabelError::TooLong => "too-long",
            RelabelError::Duplicate(_) => "duplicate",
            RelabelError::NotFound(_) => "not-found",
        }
    }
}

/// Why a manual solution was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManualSolutionError {
    #[error("no contact for target {0}")]
    NotFound(TargetId),
    #[error("solution contains a non-finite field")]
    NonFinite,
}

/// Ground truth used to score manual solutions.
#[derive(Debug, Clone, Copy)]
struct SolutionTruth {
    bearing: f64,
    range_meters: f64,
    course: f64,
    speed: f64,
}

impl From<&DetectionResult> for SolutionTruth {
    fn from(r: &DetectionResult) -> Self {
        Self {
            bearing: r.bearing,
            range_meters: r.range_meters,
            course: r.course,
            speed: r.speed,
        }
    }
}

fn error_term(err: f64, scale: f64) -> f64 {
    if !err.is_finite() {
        return 0.0;
    }
    1.0 - (err.abs() / scale).clamp(0.0, 1.0)
}

fn solution_confidence(solution: &ManualSolution, truth: &SolutionTruth) -> u8 {
    let terms = [
        error_term(
            angle_diff_deg(solution.bearing, truth.bearing),
            SOLUTION_ANGLE_SCALE_DEG,
        ),
        error_term(solution.range - truth.range_meters, SOLUTION_RANGE_SCALE),
        error_term(
            angle_diff_deg(solution.course, truth.course),
            SOLUTION_ANGLE_SCALE_DEG,
        ),
        error_term(solution.speed - truth.speed, SOLUTION_SPEED_SCALE),
    ];
    let mean = terms.iter().sum::<f64>() / terms.len() as f64;
    (mean * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Threat ranking: signal strength, proximity, status and pinning.
pub fn threat_score(contact: &Contact) -> f64 {
    let range_term = ((THREAT_RANGE_REF - contact.range_meters) / THREAT_RANGE_DIVISOR)
        .clamp(0.0, THREAT_RANGE_CAP);
    let status_bonus = match contact.status {
        ContactStatus::Ambiguous => THREAT_BONUS_AMBIGUOUS,
        ContactStatus::Tracked => THREAT_BONUS_TRACKED,
        ContactStatus::Lost => 0.0,
    };
    let pinned_bonus = if contact.pinned {
        THREAT_BONUS_PINNED
    } else {
        0.0
    };
    let snr = if contact.snr.is_finite() {
        contact.snr
    } else {
        0.0
    };
    snr + range_term + status_bonus + pinned_bonus
}

#[derive(Debug, Default)]
pub struct ContactRegistry {
    config: RegistryConfig,
    /// Kept in label order.
    contacts: Vec<Contact>,
    next_label: u32,
    truth: HashMap<TargetId, SolutionTruth>,
}

impl ContactRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn contact(&self, target_id: &str) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.target_id == target_id)
    }

    fn contact_mut(&mut self, target_id: &str) -> Option<&mut Contact> {
        self.contacts.iter_mut().find(|c| c.target_id == target_id)
    }

    /// All contacts in label order.
    pub fn all(&self) -> &[Contact] {
        &self.contacts
    }

    /// Fold one tick of detection results into the registry.
    pub fn update(&mut self, results: &[DetectionResult], now: f64, events: &mut Vec<SonarEvent>) {
        for result in results {
            self.truth
                .insert(result.target_id.clone(), SolutionTruth::from(result));
            if result.is_detected() {
                self.observe(result, now, events);
            }
        }

        let lost_timeout = self.config.lost_timeout_secs;
        for contact in &mut self.contacts {
            if contact.status != ContactStatus::Lost && now - contact.last_seen_at > lost_timeout {
                contact.status = ContactStatus::Lost;
                contact.merged_group_id = None;
                info!(label = %contact.label, "contact lost");
                events.push(SonarEvent::ContactLost {
                    label: contact.label.clone(),
                });
            }
        }

        self.fuse();

        for contact in &mut self.contacts {
            if let (Some(solution), Some(truth)) =
                (contact.manual_solution, self.truth.get(&contact.target_id))
            {
                contact.manual_confidence = solution_confidence(&solution, truth);
            }
            contact.threat_score = threat_score(contact);
        }
    }

    fn observe(&mut self, result: &DetectionResult, now: f64, events: &mut Vec<SonarEvent>) {
        let seen_at = result.last_detected_time.unwrap_or(now);
        if let Some(contact) = self.contact_mut(&result.target_id) {
            // A fading track still reports its last detection time; only a
            // newer detection counts as a sighting.
            let fresh = seen_at > contact.last_seen_at;
            if contact.status == ContactStatus::Lost && !fresh {
                return;
            }
            contact.range_meters = result.range_meters;
            contact.bearing = result.bearing;
            contact.snr = result.snr;
            contact.kind = result.kind;
            contact.last_seen_at = contact.last_seen_at.max(seen_at);
            if contact.status == ContactStatus::Lost {
                contact.status = ContactStatus::Tracked;
                contact.reacquire_count += 1;
                info!(label = %contact.label, count = contact.reacquire_count, "contact reacquired");
                events.push(SonarEvent::ContactReacquired {
                    label: contact.label.clone(),
                    reacquire_count: contact.reacquire_count,
                });
            }
            return;
        }

        self.next_label += 1;
        let label = format!("S{}", self.next_label);
        info!(%label, target_id = %result.target_id, "new contact");
        events.push(SonarEvent::NewContact {
            label: label.clone(),
            target_id: result.target_id.clone(),
            bearing: result.bearing,
        });
        self.contacts.push(Contact {
            target_id: result.target_id.clone(),
            label,
            label_index: self.next_label,
            alias: None,
            pinned: false,
            status: ContactStatus::Tracked,
            last_seen_at: seen_at,
            range_meters: result.range_meters,
            bearing: result.bearing,
            snr: result.snr,
            kind: result.kind,
            merged_group_id: None,
            reacquire_count: 0,
            manual_solution: None,
            manual_confidence: 0,
            threat_score: 0.0,
        });
    }

    /// Group live contacts that coincide in bearing and range.
    ///
    /// Grouping is transitive. Members of a group share the smallest label
    /// index among them as `merged_group_id`.
    fn fuse(&mut self) {
        let live: Vec<usize> = self
            .contacts
            .iter()
            .enumerate()
            .filter(|(_, c)| c.status != ContactStatus::Lost)
            .map(|(i, _)| i)
            .collect();

        let mut parent: Vec<usize> = (0..live.len()).collect();
        fn find(parent: &mut [usize], mut i: usize) -> usize {
            while parent[i] != i {
                parent[i] = parent[parent[i]];
                i = parent[i];
            }
            i
        }

        for a in 0..live.len() {
            for b in (a + 1)..live.len() {
                let ca = &self.contacts[live[a]];
                let cb = &self.contacts[live[b]];
                let close_bearing =
                    angle_diff_deg(ca.bearing, cb.bearing) <= self.config.fusion_bearing_deg;
                let close_range =
                    (ca.range_meters - cb.range_meters).abs() <= self.config.fusion_range_meters;
                if close_bearing && close_range {
                    let ra = find(&mut parent, a);
                    let rb = find(&mut parent, b);
                    if ra != rb {
                        parent[rb] = ra;
                    }
                }
            }
        }

        let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
        for i in 0..live.len() {
            let root = find(&mut parent, i);
            groups.entry(root).or_default().push(live[i]);
        }

        for members in groups.values() {
            if members.len() > 1 {
                let group_id = members
                    .iter()
                    .map(|&i| self.contacts[i].label_index)
                    .min();
                for &i in members {
                    let contact = &mut self.contacts[i];
                    contact.status = ContactStatus::Ambiguous;
                    contact.merged_group_id = group_id;
                }
            } else {
                for &i in members {
                    let contact = &mut self.contacts[i];
                    contact.status = ContactStatus::Tracked;
                    contact.merged_group_id = None;
                }
            }
        }
    }

    /// Contacts passing `filter`, ordered by `sort`. Ties fall back to label order.
    pub fn contacts(&self, filter: ContactFilter, sort: ContactSort) -> Vec<&Contact> {
        let mut out: Vec<&Contact> = self
            .contacts
            .iter()
            .filter(|c| match filter {
                ContactFilter::All => true,
                ContactFilter::Tracked => c.status == ContactStatus::Tracked,
                ContactFilter::Ambiguous => c.status == ContactStatus::Ambiguous,
                ContactFilter::Lost => c.status == ContactStatus::Lost,
                ContactFilter::Pinned => c.pinned,
            })
            .collect();

        out.sort_by(|a, b| {
            let primary = match sort {
                ContactSort::Threat => b.threat_score.total_cmp(&a.threat_score),
                ContactSort::Range => a.range_meters.total_cmp(&b.range_meters),
                ContactSort::Label => a.label_index.cmp(&b.label_index),
                ContactSort::Confidence => b.manual_confidence.cmp(&a.manual_confidence),
            };
            primary.then(a.label_index.cmp(&b.label_index))
        });
        out
    }

    /// Set a user alias. Stored trimmed and uppercased.
    pub fn relabel(&mut self, target_id: &str, alias: &str) -> Result<(), RelabelError> {
        let alias = alias.trim().to_uppercase();
        if alias.is_empty() {
            return Err(RelabelError::Empty);
        }
        if alias.chars().count() > ALIAS_MAX_LEN {
            return Err(RelabelError::TooLong);
        }
        if self.contact(target_id).is_none() {
            return Err(RelabelError::NotFound(target_id.to_string()));
        }
        let taken = self.contacts.iter().any(|c| {
            c.target_id != target_id
                && (c.alias.as_deref() == Some(alias.as_str()) || c.label == alias)
        });
        if taken {
            return Err(RelabelError::Duplicate(alias));
        }

        if let Some(contact) = self.contact_mut(target_id) {
            info!(label = %contact.label, %alias, "contact relabelled");
            contact.alias = Some(alias);
        }
        Ok(())
    }

    pub fn set_pinned(&mut self, target_id: &str, pinned: bool) -> bool {
        match self.contact_mut(target_id) {
            Some(contact) => {
                contact.pinned = pinned;
                contact.threat_score = threat_score(contact);
                true
            }
            None => false,
        }
    }

    /// Store a manual solution and score it against the latest truth.
    ///
    /// A solution with any non-finite field is rejected whole.
    pub fn set_manual_solution(
        &mut self,
        target_id: &str,
        solution: ManualSolution,
    ) -> Result<u8, ManualSolutionError> {
        if !solution.is_finite() {
            warn!(target_id, "rejected non-finite manual solution");
            return Err(ManualSolutionError::NonFinite);
        }
        let truth = self.truth.get(target_id).copied();
        let contact = self
            .contact_mut(target_id)
            .ok_or_else(|| ManualSolutionError::NotFound(target_id.to_string()))?;
        contact.manual_solution = Some(solution);
        if let Some(truth) = truth {
            contact.manual_confidence = solution_confidence(&solution, &truth);
        }
        Ok(contact.manual_confidence)
    }

    pub fn clear_manual_solution(&mut self, target_id: &str) -> bool {
        match self.contact_mut(target_id) {
            Some(contact) => {
                contact.manual_solution = None;
                contact.manual_confidence = 0;
                true
            }
            None => false,
        }
    }

    /// Remove every Lost contact and return their target ids.
    pub fn clear_lost_contacts(&mut self) -> Vec<TargetId> {
        let mut removed = Vec::new();
        self.contacts.retain(|c| {
            if c.status == ContactStatus::Lost {
                removed.push(c.target_id.clone());
                false
            } else {
                true
            }
        });
        for id in &removed {
            self.truth.remove(id);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fathom_core::enums::{TargetKind, TrackState};
    use fathom_core::target::ClassificationInfo;

    fn detected(id: &str, bearing: f64, range_meters: f64, now: f64) -> DetectionResult {
        DetectionResult {
            target_id: id.into(),
            kind: TargetKind::Ship,
            snr: 12.0,
            bearing,
            distance: range_meters / RANGE_SCALE_METERS,
            range_meters,
            track_state: TrackState::Tracked,
            last_detected_time: Some(now),
            last_pulse_id: None,
            classification: ClassificationInfo::default(),
            course: 90.0,
            speed: 6.0,
        }
    }

    fn quiet(mut r: DetectionResult) -> DetectionResult {
        r.track_state = TrackState::Undetected;
        r.last_detected_time = None;
        r
    }

    #[test]
    fn test_labels_assigned_in_order_and_stable() {
        let mut reg = ContactRegistry::default();
        let mut events = Vec::new();
        reg.update(&[detected("a", 10.0, 1000.0, 0.1)], 0.1, &mut events);
        reg.update(
            &[detected("a", 10.0, 1000.0, 0.2), detected("b", 200.0, 4000.0, 0.2)],
            0.2,
            &mut events,
        );
        assert_eq!(reg.contact("a").map(|c| c.label.as_str()), Some("S1"));
        assert_eq!(reg.contact("b").map(|c| c.label.as_str()), Some("S2"));
        let new_contacts = events
            .iter()
            .filter(|e| matches!(e, SonarEvent::NewContact { .. }))
            .count();
        assert_eq!(new_contacts, 2);
    }

    #[test]
    fn test_lost_then_reacquired() {
        let mut reg = ContactRegistry::default();
        let mut events = Vec::new();
        reg.update(&[detected("a", 10.0, 1000.0, 0.0)], 0.0, &mut events);
        let q = quiet(detected("a", 10.0, 1000.0, 0.0));
        reg.update(&[q.clone()], 10.0, &mut events);
        assert_eq!(reg.contact("a").map(|c| c.status), Some(ContactStatus::Tracked));
        reg.update(&[q], 10.5, &mut events);
        assert_eq!(reg.contact("a").map(|c| c.status), Some(ContactStatus::Lost));

        events.clear();
        reg.update(&[detected("a", 12.0, 1100.0, 11.0)], 11.0, &mut events);
        let contact = reg.contact("a").expect("contact");
        assert_eq!(contact.status, ContactStatus::Tracked);
        assert_eq!(contact.reacquire_count, 1);
        assert_eq!(contact.label, "S1");
        assert!(events.contains(&SonarEvent::ContactReacquired {
            label: "S1".into(),
            reacquire_count: 1
        }));
    }

    #[test]
    fn test_fading_track_does_not_flap_under_short_registry_timeout() {
        let mut reg = ContactRegistry::new(RegistryConfig {
            lost_timeout_secs: 3.0,
            ..RegistryConfig::default()
        });
        let mut events = Vec::new();
        reg.update(&[detected("a", 10.0, 1000.0, 0.1)], 0.1, &mut events);

        // Detection keeps the track alive (longer timeout) but never refreshes it.
        for i in 2..=82 {
            let now = i as f64 * 0.1;
            reg.update(&[detected("a", 10.0, 1000.0, 0.1)], now, &mut events);
        }

        let contact = reg.contact("a").expect("contact");
        assert_eq!(contact.status, ContactStatus::Lost);
        assert_eq!(contact.reacquire_count, 0, "stale detection must not reacquire");
        let lost = events
            .iter()
            .filter(|e| matches!(e, SonarEvent::ContactLost { .. }))
            .count();
        assert_eq!(lost, 1);
        assert!(!events
            .iter()
            .any(|e| matches!(e, SonarEvent::ContactReacquired { .. })));

        reg.update(&[detected("a", 10.0, 1000.0, 8.4)], 8.4, &mut events);
        let contact = reg.contact("a").expect("contact");
        assert_eq!(contact.status, ContactStatus::Tracked);
        assert_eq!(contact.reacquire_count, 1);
    }

    #[test]
    fn test_transitive_fusion() {
        let mut reg = ContactRegistry::default();
        let mut events = Vec::new();
        // a-b and b-c are within 8 deg / 250 m; a-c is not.
        reg.update(
            &[
                detected("a", 10.0, 1000.0, 1.0),
                detected("b", 16.0, 1200.0, 1.0),
                detected("c", 22.0, 1400.0, 1.0),
                detected("d", 180.0, 1000.0, 1.0),
            ],
            1.0,
            &mut events,
        );
        for id in ["a", "b", "c"] {
            let c = reg.contact(id).expect("contact");
            assert_eq!(c.status, ContactStatus::Ambiguous, "{id} should be fused");
            assert_eq!(c.merged_group_id, Some(1));
        }
        let d = reg.contact("d").expect("contact");
        assert_eq!(d.status, ContactStatus::Tracked);
        assert_eq!(d.merged_group_id, None);

        // Separate b; singletons revert to Tracked.
        reg.update(
            &[
                detected("a", 10.0, 1000.0, 2.0),
                detected("b", 90.0, 1200.0, 2.0),
                detected("c", 22.0, 1400.0, 2.0),
            ],
            2.0,
            &mut events,
        );
        assert_eq!(reg.contact("a").map(|c| c.status), Some(ContactStatus::Tracked));
        assert_eq!(reg.contact("c").map(|c| c.merged_group_id), Some(None));
    }

    #[test]
    fn test_threat_score_terms() {
        let mut reg = ContactRegistry::default();
        let mut events = Vec::new();
        reg.update(&[detected("a", 10.0, 1500.0, 0.0)], 0.0, &mut events);
        // 12 snr + 50 range + 10 tracked.
        assert!((reg.contact("a").expect("contact").threat_score - 72.0).abs() < 1e-9);
        assert!(reg.set_pinned("a", true));
        assert!((reg.contact("a").expect("contact").threat_score - 97.0).abs() < 1e-9);
    }

    #[test]
    fn test_relabel_rules() {
        let mut reg = ContactRegistry::default();
        let mut events = Vec::new();
        reg.update(
            &[detected("a", 10.0, 1000.0, 0.0), detected("b", 200.0, 5000.0, 0.0)],
            0.0,
            &mut events,
        );

        assert_eq!(reg.relabel("a", "  alpha "), Ok(()));
        assert_eq!(
            reg.contact("a").and_then(|c| c.alias.as_deref()),
            Some("ALPHA")
        );
        let err = reg.relabel("b", "ALPHA").expect_err("duplicate alias");
        assert_eq!(err.reason_code(), "duplicate");
        assert_eq!(reg.relabel("b", "S1").map_err(|e| e.reason_code()), Err("duplicate"));
        assert_eq!(reg.relabel("b", "   ").map_err(|e| e.reason_code()), Err("empty"));
        assert_eq!(
            reg.relabel("b", "ABCDEFGHIJKLM").map_err(|e| e.reason_code()),
            Err("too-long")
        );
        assert_eq!(
            reg.relabel("zz", "BRAVO").map_err(|e| e.reason_code()),
            Err("not-found")
        );
        // Re-applying a contact's own alias is fine.
        assert_eq!(reg.relabel("a", "alpha"), Ok(()));
    }

    #[test]
    fn test_manual_solution_scoring() {
        let mut reg = ContactRegistry::default();
        let mut events = Vec::new();
        reg.update(&[detected("a", 350.0, 2000.0, 0.0)], 0.0, &mut events);

        let exact = ManualSolution {
            bearing: 350.0,
            range: 2000.0,
            course: 90.0,
            speed: 6.0,
        };
        assert_eq!(reg.set_manual_solution("a", exact), Ok(100));

        // Bearing wraps: 10 vs 350 is a 20 degree error.
        let off = ManualSolution {
            bearing: 10.0,
            ..exact
        };
        let conf = reg.set_manual_solution("a", off).expect("accepted");
        assert_eq!(conf, 97);

        let bad = ManualSolution {
            speed: f64::NAN,
            ..exact
        };
        assert_eq!(
            reg.set_manual_solution("a", bad),
            Err(ManualSolutionError::NonFinite)
        );
        assert_eq!(
            reg.contact("a").and_then(|c| c.manual_solution),
            Some(off),
            "rejected solution leaves the previous one intact"
        );
        assert_eq!(
            reg.set_manual_solution("missing", exact),
            Err(ManualSolutionError::NotFound("missing".into()))
        );
    }

    #[test]
    fn test_sort_orders() {
        let mut reg = ContactRegistry::default();
        let mut events = Vec::new();
        reg.update(
            &[
                detected("far", 10.0, 2900.0, 0.0),
                detected("near", 100.0, 500.0, 0.0),
            ],
            0.0,
            &mut events,
        );
        let by_range: Vec<&str> = reg
            .contacts(ContactFilter::All, ContactSort::Range)
            .iter()
            .map(|c| c.target_id.as_str())
            .collect();
        assert_eq!(by_range, vec!["near", "far"]);

        let by_threat: Vec<&str> = reg
            .contacts(ContactFilter::All, ContactSort::Threat)
            .iter()
            .map(|c| c.target_id.as_str())
            .collect();
        assert_eq!(by_threat, vec!["near", "far"]);

        let by_label: Vec<&str> = reg
            .contacts(ContactFilter::All, ContactSort::Label)
            .iter()
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(by_label, vec!["S1", "S2"]);

        reg.set_pinned("far", true);
        let pinned = reg.contacts(ContactFilter::Pinned, ContactSort::Label);
        assert_eq!(pinned.len(), 1);
        assert_eq!(pinned[0].target_id, "far");
    }
}
