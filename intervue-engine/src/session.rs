use chrono::{DateTime, Utc};
use intervue_core::proctoring::{ProctorStatus, WarningTracker};
use intervue_core::timer::elapsed_secs;
use intervue_core::types::{Candidate, ChatMessage, Evaluation, Question, SessionId, Stage};
use serde::{Deserialize, Serialize};

/// All state of one candidate's interview.
///
/// Only [`crate::engine::InterviewEngine`] mutates it; everything else reads
/// through the accessors or a [`SessionSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewSession {
    pub(crate) id: SessionId,
    pub(crate) candidate: Candidate,
    pub(crate) stage: Stage,
    pub(crate) questions: Vec<Question>,
    pub(crate) question_index: usize,
    pub(crate) evaluations: Vec<Evaluation>,
    pub(crate) psych_question_count: u32,
    pub(crate) pending_answer: Option<String>,
    pub(crate) last_probe_question: Option<String>,
    pub(crate) warnings: WarningTracker,
    // Sticky: distinguishes "never started" from "dropped mid-session".
    pub(crate) camera_confirmed_active: bool,
    pub(crate) camera_playing: bool,
    pub(crate) started_at: Option<DateTime<Utc>>,
    pub(crate) messages: Vec<ChatMessage>,
    pub(crate) submitted: bool,
}

impl InterviewSession {
    pub fn new(candidate: Candidate, max_warnings: u32) -> Self {
        Self {
            id: SessionId::new(),
            candidate,
            stage: Stage::AwaitingStart,
            questions: vec![],
            question_index: 0,
            evaluations: vec![],
            psych_question_count: 0,
            pending_answer: None,
            last_probe_question: None,
            warnings: WarningTracker::new(max_warnings),
            camera_confirmed_active: false,
            camera_playing: false,
            started_at: None,
            messages: vec![],
            submitted: false,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question_index(&self) -> usize {
        self.question_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.question_index)
    }

    pub fn evaluations(&self) -> &[Evaluation] {
        &self.evaluations
    }

    pub fn psych_question_count(&self) -> u32 {
        self.psych_question_count
    }

    pub fn pending_answer(&self) -> Option<&str> {
        self.pending_answer.as_deref()
    }

    pub fn warning_count(&self) -> u32 {
        self.warnings.count()
    }

    pub fn last_warning_state(&self) -> ProctorStatus {
        self.warnings.last_status()
    }

    pub fn camera_confirmed_active(&self) -> bool {
        self.camera_confirmed_active
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub(crate) fn say(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(text));
    }

    pub(crate) fn record_user(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::user(text));
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_at(Utc::now())
    }

    pub fn snapshot_at(&self, now: DateTime<Utc>) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            user_id: self.candidate.user_id.0.clone(),
            stage: self.stage,
            messages: self.messages.clone(),
            evaluations: self.evaluations.clone(),
            warning_count: self.warnings.count(),
            max_warnings: self.warnings.limit(),
            question_index: self.question_index,
            total_questions: self.questions.len(),
            psych_question_count: self.psych_question_count,
            proctor_status: self.warnings.last_status(),
            camera_active: self.camera_playing,
            elapsed_secs: self.started_at.map(|t| elapsed_secs(t, now)),
            submitted: self.submitted,
        }
    }
}

/// What the outside world sees after each event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub user_id: String,
    pub stage: Stage,
    pub messages: Vec<ChatMessage>,
    pub evaluations: Vec<Evaluation>,
    pub warning_count: u32,
    pub max_warnings: u32,
    pub question_index: usize,
    pub total_questions: usize,
    pub psych_question_count: u32,
    pub proctor_status: ProctorStatus,
    pub camera_active: bool,
    pub elapsed_secs: Option<u64>,
    pub submitted: bool,
}

impl SessionSnapshot {
    pub fn last_assistant_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == intervue_core::types::Role::Assistant)
            .map(|m| m.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use intervue_core::types::UserId;

    fn candidate() -> Candidate {
        Candidate {
            user_id: UserId::new("priya_s"),
            name: "Priya Sharma".into(),
            email: "priya.s@example.com".into(),
        }
    }

    #[test]
    fn fresh_session_snapshot() {
        let session = InterviewSession::new(candidate(), 3);
        let snap = session.snapshot();
        assert_eq!(snap.stage, Stage::AwaitingStart);
        assert_eq!(snap.user_id, "priya_s");
        assert_eq!(snap.warning_count, 0);
        assert_eq!(snap.max_warnings, 3);
        assert_eq!(snap.elapsed_secs, None);
        assert_eq!(snap.proctor_status, ProctorStatus::Ok);
        assert!(snap.last_assistant_message().is_none());
    }

    #[test]
    fn snapshot_reports_elapsed_from_start() {
        let mut session = InterviewSession::new(candidate(), 3);
        let now = Utc::now();
        session.started_at = Some(now - Duration::seconds(90));
        assert_eq!(session.snapshot_at(now).elapsed_secs, Some(90));
    }
}
