use serde::{Deserialize, Serialize};

pub const PERSON_LABEL: &str = "person";
pub const PHONE_LABEL: &str = "cell phone";
pub const DEFAULT_DETECTION_THRESHOLD: f32 = 0.9;
pub const DEFAULT_SAMPLE_EVERY: u64 = 10;
pub const DEFAULT_MAX_WARNINGS: u32 = 3;

/// One encoded camera frame (JPEG/PNG bytes as captured at the boundary).
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Frame {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("mime_type", &self.mime_type)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProctoringVerdict {
    pub person_count: u32,
    pub phone_detected: bool,
}

impl ProctoringVerdict {
    /// Counts people and phones among detections strictly above `threshold`.
    /// Every other label is ignored.
    pub fn from_detections(detections: &[Detection], threshold: f32) -> Self {
        let mut verdict = Self::default();
        for d in detections.iter().filter(|d| d.confidence > threshold) {
            match d.label.as_str() {
                PERSON_LABEL => verdict.person_count += 1,
                PHONE_LABEL => verdict.phone_detected = true,
                _ => {}
            }
        }
        verdict
    }

    pub fn status(&self) -> ProctorStatus {
        if self.person_count > 1 {
            ProctorStatus::MultiplePeople
        } else if self.phone_detected {
            ProctorStatus::PhoneDetected
        } else if self.person_count == 0 {
            ProctorStatus::CandidateAbsent
        } else {
            ProctorStatus::Ok
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProctorStatus {
    #[default]
    Ok,
    MultiplePeople,
    PhoneDetected,
    CandidateAbsent,
}

impl ProctorStatus {
    pub fn message(self) -> &'static str {
        match self {
            ProctorStatus::Ok => "Status: OK",
            ProctorStatus::MultiplePeople => "Warning: Multiple people detected.",
            ProctorStatus::PhoneDetected => "Warning: Cell phone detected.",
            ProctorStatus::CandidateAbsent => "Warning: Candidate not detected.",
        }
    }

    pub fn is_violation(self) -> bool {
        self != ProctorStatus::Ok
    }
}

/// Outcome of feeding one status into a [`WarningTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningOutcome {
    Unchanged,
    Warned { count: u32 },
    LimitReached { count: u32 },
}

/// Edge-triggered violation counter.
///
/// A violation counts when it differs from the last observed status: either a
/// fresh entrance from `Ok` or a switch to a different violation. Repeating
/// the same violation never counts; returning to `Ok` only resets the edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningTracker {
    count: u32,
    last: ProctorStatus,
    limit: u32,
}

impl WarningTracker {
    pub fn new(limit: u32) -> Self {
        Self {
            count: 0,
            last: ProctorStatus::Ok,
            limit: limit.max(1),
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn last_status(&self) -> ProctorStatus {
        self.last
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn observe(&mut self, status: ProctorStatus) -> WarningOutcome {
        if !status.is_violation() {
            self.last = ProctorStatus::Ok;
            return WarningOutcome::Unchanged;
        }
        if status == self.last {
            return WarningOutcome::Unchanged;
        }

        self.last = status;
        self.count += 1;
        if self.count >= self.limit {
            WarningOutcome::LimitReached { count: self.count }
        } else {
            WarningOutcome::Warned { count: self.count }
        }
    }
}

impl Default for WarningTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WARNINGS)
    }
}

/// Selects every Nth frame for classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSampler {
    every: u64,
    seen: u64,
}

impl FrameSampler {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            seen: 0,
        }
    }

    pub fn should_sample(&mut self) -> bool {
        self.seen = self.seen.wrapping_add(1);
        self.seen % self.every == 0
    }
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_EVERY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(statuses: &[ProctorStatus]) -> WarningTracker {
        let mut tracker = WarningTracker::new(10);
        for s in statuses {
            tracker.observe(*s);
        }
        tracker
    }

    #[test]
    fn verdict_priority_order() {
        let both = ProctoringVerdict {
            person_count: 2,
            phone_detected: true,
        };
        assert_eq!(both.status(), ProctorStatus::MultiplePeople);

        let phone_alone = ProctoringVerdict {
            person_count: 0,
            phone_detected: true,
        };
        assert_eq!(phone_alone.status(), ProctorStatus::PhoneDetected);

        assert_eq!(
            ProctoringVerdict::default().status(),
            ProctorStatus::CandidateAbsent
        );
        let one = ProctoringVerdict {
            person_count: 1,
            phone_detected: false,
        };
        assert_eq!(one.status(), ProctorStatus::Ok);
    }

    #[test]
    fn detections_below_threshold_and_other_labels_are_ignored() {
        let detections = vec![
            Detection::new("person", 0.95),
            Detection::new("person", 0.9),
            Detection::new("cell phone", 0.5),
            Detection::new("laptop", 0.99),
        ];
        let v = ProctoringVerdict::from_detections(&detections, DEFAULT_DETECTION_THRESHOLD);
        assert_eq!(v.person_count, 1);
        assert!(!v.phone_detected);
        assert_eq!(v.status(), ProctorStatus::Ok);
    }

    #[test]
    fn edge_triggered_sequence_counts_three() {
        use ProctorStatus::*;
        let tracker = run(&[
            Ok,
            MultiplePeople,
            MultiplePeople,
            Ok,
            PhoneDetected,
            MultiplePeople,
        ]);
        assert_eq!(tracker.count(), 3);
        assert_eq!(tracker.last_status(), MultiplePeople);
    }

    #[test]
    fn sustained_violation_counts_once() {
        let tracker = run(&[ProctorStatus::CandidateAbsent; 50]);
        assert_eq!(tracker.count(), 1);
    }

    #[test]
    fn alternating_violations_count_each_change() {
        use ProctorStatus::*;
        let tracker = run(&[PhoneDetected, CandidateAbsent, PhoneDetected]);
        assert_eq!(tracker.count(), 3);
    }

    #[test]
    fn limit_is_reported() {
        use ProctorStatus::*;
        let mut tracker = WarningTracker::new(2);
        assert_eq!(
            tracker.observe(PhoneDetected),
            WarningOutcome::Warned { count: 1 }
        );
        assert_eq!(tracker.observe(PhoneDetected), WarningOutcome::Unchanged);
        assert_eq!(tracker.observe(Ok), WarningOutcome::Unchanged);
        assert_eq!(
            tracker.observe(PhoneDetected),
            WarningOutcome::LimitReached { count: 2 }
        );
    }

    #[test]
    fn sampler_takes_every_nth_frame() {
        let mut sampler = FrameSampler::new(10);
        let sampled: Vec<bool> = (0..30).map(|_| sampler.should_sample()).collect();
        assert_eq!(sampled.iter().filter(|s| **s).count(), 3);
        assert!(sampled[9] && sampled[19] && sampled[29]);
        assert!(!sampled[0]);
    }
}
