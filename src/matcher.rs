//! In-memory face matcher.
//!
//! Holds a snapshot of every enrolled descriptor and answers nearest-neighbor
//! queries against it. The snapshot is rebuilt in full from the database on
//! every enrollment or deletion and swapped under a write lock, so concurrent
//! recognition requests always scan a consistent candidate list.

use crate::store;
use crate::vision::Descriptor;
use sqlx::SqlitePool;
use std::sync::RwLock;

/// One enrolled face loaded from the store.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub employee_id: String,
    pub name: String,
    pub descriptor: Descriptor,
}

/// Best candidate for a recognition probe.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub employee_id: String,
    pub name: String,
    /// Raw euclidean distance of the nearest candidate, always surfaced for
    /// diagnostic messaging even when the match is rejected.
    pub distance: f32,
    /// Dual-threshold decision: compare predicate at the best index AND
    /// distance within the strict limit.
    pub accepted: bool,
    /// Whether any candidate at all passed the compare predicate.
    pub any_within_tolerance: bool,
}

impl MatchOutcome {
    pub fn confidence(&self) -> f32 {
        (1.0 - self.distance) * 100.0
    }
}

/// Enrollment-time duplicate hit.
#[derive(Debug, Clone)]
pub struct DuplicateHit {
    pub name: String,
    pub distance: f32,
}

impl DuplicateHit {
    pub fn similarity(&self) -> f32 {
        (1.0 - self.distance) * 100.0
    }
}

pub struct FaceMatcher {
    tolerance: f32,
    max_face_distance: f32,
    candidates: RwLock<Vec<MatchCandidate>>,
}

impl FaceMatcher {
    pub fn new(tolerance: f32, max_face_distance: f32) -> Self {
        Self {
            tolerance,
            max_face_distance,
            candidates: RwLock::new(Vec::new()),
        }
    }

    /// Rebuild the candidate snapshot from all stored descriptors.
    ///
    /// Rows whose blob does not decode are skipped with a warning; one bad
    /// enrollment must not take recognition down for everyone else.
    pub async fn reload(&self, pool: &SqlitePool) -> anyhow::Result<usize> {
        let rows = store::all_descriptors(pool).await?;

        let mut loaded = Vec::with_capacity(rows.len());
        for row in rows {
            match Descriptor::from_bytes(&row.descriptor) {
                Ok(descriptor) => loaded.push(MatchCandidate {
                    employee_id: row.employee_id,
                    name: row.name,
                    descriptor,
                }),
                Err(e) => {
                    tracing::warn!(
                        employee_id = %row.employee_id,
                        name = %row.name,
                        error = %e,
                        "skipping undecodable face descriptor"
                    );
                }
            }
        }

        let count = loaded.len();
        *self.candidates.write().unwrap() = loaded;
        log::info!("face matcher reloaded: {} candidates", count);
        Ok(count)
    }

    /// Nearest candidate for a probe descriptor, or `None` when nothing is
    /// enrolled. The distance of the best candidate is reported even when
    /// the dual-threshold rule rejects it.
    pub fn find_best_match(&self, probe: &Descriptor) -> Option<MatchOutcome> {
        let candidates = self.candidates.read().unwrap();

        let mut best: Option<(usize, f32)> = None;
        let mut any_within_tolerance = false;
        for (i, candidate) in candidates.iter().enumerate() {
            let distance = probe.distance(&candidate.descriptor);
            if distance <= self.tolerance {
                any_within_tolerance = true;
            }
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((i, distance));
            }
        }

        let (idx, distance) = best?;
        let candidate = &candidates[idx];
        let accepted = candidate.descriptor.matches(probe, self.tolerance)
            && distance <= self.max_face_distance;

        Some(MatchOutcome {
            employee_id: candidate.employee_id.clone(),
            name: candidate.name.clone(),
            distance,
            accepted,
            any_within_tolerance,
        })
    }

    /// Enrollment-time duplicate check. Uses the strict distance limit alone,
    /// without the compare predicate the recognition path also applies.
    pub fn is_duplicate(&self, probe: &Descriptor) -> Option<DuplicateHit> {
        let candidates = self.candidates.read().unwrap();

        let nearest = candidates
            .iter()
            .map(|c| (c, probe.distance(&c.descriptor)))
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))?;

        let (candidate, distance) = nearest;
        if distance <= self.max_face_distance {
            Some(DuplicateHit {
                name: candidate.name.clone(),
                distance,
            })
        } else {
            None
        }
    }

    pub fn min_accepted_similarity(&self) -> f32 {
        (1.0 - self.max_face_distance) * 100.0
    }

    #[cfg(test)]
    fn insert_candidates(&self, candidates: Vec<MatchCandidate>) {
        *self.candidates.write().unwrap() = candidates;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::DESCRIPTOR_LEN;

    /// Descriptor at a chosen euclidean distance from the origin descriptor.
    fn descriptor_at(distance: f32) -> Descriptor {
        let mut values = vec![0.0f32; DESCRIPTOR_LEN];
        values[0] = distance;
        Descriptor::from_vec(values).unwrap()
    }

    fn matcher_with(entries: &[(&str, &str, f32)]) -> FaceMatcher {
        let matcher = FaceMatcher::new(0.4, 0.45);
        matcher.insert_candidates(
            entries
                .iter()
                .map(|(id, name, d)| MatchCandidate {
                    employee_id: id.to_string(),
                    name: name.to_string(),
                    descriptor: descriptor_at(*d),
                })
                .collect(),
        );
        matcher
    }

    #[test]
    fn test_empty_cache_returns_none() {
        let matcher = FaceMatcher::new(0.4, 0.45);
        let probe = descriptor_at(0.0);
        assert!(matcher.find_best_match(&probe).is_none());
        assert!(matcher.is_duplicate(&probe).is_none());
    }

    #[test]
    fn test_selects_nearest_candidate() {
        let matcher = matcher_with(&[("E1", "Alice", 0.3), ("E2", "Bob", 0.1)]);
        let outcome = matcher.find_best_match(&descriptor_at(0.0)).unwrap();
        assert_eq!(outcome.employee_id, "E2");
        assert!((outcome.distance - 0.1).abs() < 1e-6);
        assert!(outcome.accepted);
    }

    #[test]
    fn test_find_best_match_is_idempotent() {
        let matcher = matcher_with(&[("E1", "Alice", 0.25)]);
        let probe = descriptor_at(0.0);
        let first = matcher.find_best_match(&probe).unwrap();
        let second = matcher.find_best_match(&probe).unwrap();
        assert_eq!(first.employee_id, second.employee_id);
        assert_eq!(first.distance, second.distance);
        assert_eq!(first.accepted, second.accepted);
    }

    #[test]
    fn test_rejects_distance_beyond_tolerance() {
        let matcher = matcher_with(&[("E1", "Alice", 0.5)]);
        let outcome = matcher.find_best_match(&descriptor_at(0.0)).unwrap();
        assert!(!outcome.accepted);
        assert!(!outcome.any_within_tolerance);
        assert!((outcome.distance - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_threshold_asymmetry_band() {
        // 0.4 < d <= 0.45: recognition rejects (compare predicate fails)
        // but the enrollment duplicate check still flags it.
        let matcher = matcher_with(&[("E1", "Alice", 0.42)]);
        let probe = descriptor_at(0.0);

        let outcome = matcher.find_best_match(&probe).unwrap();
        assert!(!outcome.accepted);

        let dup = matcher.is_duplicate(&probe).unwrap();
        assert_eq!(dup.name, "Alice");
        assert!((dup.distance - 0.42).abs() < 1e-6);
    }

    #[test]
    fn test_duplicate_check_uses_strict_limit_only() {
        let matcher = matcher_with(&[("E1", "Alice", 0.46)]);
        assert!(matcher.is_duplicate(&descriptor_at(0.0)).is_none());
    }

    #[test]
    fn test_confidence_is_inverted_distance() {
        let matcher = matcher_with(&[("E1", "Alice", 0.3)]);
        let outcome = matcher.find_best_match(&descriptor_at(0.0)).unwrap();
        assert!((outcome.confidence() - 70.0).abs() < 1e-3);
    }

    #[actix_web::test]
    async fn test_reload_skips_malformed_blob() {
        use crate::store::tests::{employee, memory_pool};

        let pool = memory_pool().await;
        store::add_employee(&pool, &employee("E1", "Alice", descriptor_at(0.0).to_bytes()))
            .await
            .unwrap();
        store::add_employee(&pool, &employee("E2", "Bob", vec![1, 2, 3]))
            .await
            .unwrap();

        let matcher = FaceMatcher::new(0.4, 0.45);
        assert_eq!(matcher.reload(&pool).await.unwrap(), 1);
        let outcome = matcher.find_best_match(&descriptor_at(0.0)).unwrap();
        assert_eq!(outcome.employee_id, "E1");
    }

    #[actix_web::test]
    async fn test_enroll_recognize_attendance_scenario() {
        use crate::model::attendance::AttendanceKind;
        use crate::store::tests::{employee, memory_pool};

        let pool = memory_pool().await;
        store::add_employee(&pool, &employee("E1", "Alice", descriptor_at(0.0).to_bytes()))
            .await
            .unwrap();

        let matcher = FaceMatcher::new(0.4, 0.45);
        matcher.reload(&pool).await.unwrap();

        // Probe at distance 0.3: inside both thresholds.
        let probe = descriptor_at(0.3);
        let outcome = matcher.find_best_match(&probe).unwrap();
        assert!(outcome.accepted);
        assert_eq!(outcome.name, "Alice");

        store::record_attendance(&pool, &outcome.employee_id, AttendanceKind::CheckIn)
            .await
            .unwrap();
        assert!(
            store::record_attendance(&pool, &outcome.employee_id, AttendanceKind::CheckIn)
                .await
                .is_err()
        );
        store::record_attendance(&pool, &outcome.employee_id, AttendanceKind::CheckOut)
            .await
            .unwrap();
        assert!(
            store::record_attendance(&pool, &outcome.employee_id, AttendanceKind::CheckOut)
                .await
                .is_err()
        );

        let today = store::attendance_today(&pool).await.unwrap();
        assert_eq!(today.len(), 1);
        assert!(today[0].check_in.is_some());
        assert!(today[0].check_out.is_some());

        // Deleting the employee removes them from recognition entirely.
        assert!(store::delete_employee(&pool, "E1").await.unwrap());
        matcher.reload(&pool).await.unwrap();
        assert!(matcher.find_best_match(&probe).is_none());
    }
}
