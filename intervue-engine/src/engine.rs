use crate::session::{InterviewSession, SessionSnapshot};
use crate::traits::{ResultStore, TextOracle};
use chrono::Utc;
use intervue_core::catalog::{CatalogError, QuestionCatalog};
use intervue_core::config::InterviewSettings;
use intervue_core::prompts::{
    self, FALLBACK_GREETING, FINAL_QUESTION_NOTICE, GENERIC_INTRO_TRANSITION, GREETING_PROMPT,
    PROBE_QUESTIONS, SCORING_APOLOGY, TRANSITION_PHRASES,
};
use intervue_core::proctoring::{ProctoringVerdict, WarningOutcome};
use intervue_core::random::{RandomSource, choose};
use intervue_core::scoring::{ScoreSummary, parse_score_response};
use intervue_core::text::{extract_name, filter_oracle_output};
use intervue_core::types::{Candidate, Evaluation, Stage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("interview already started (stage {0})")]
    AlreadyStarted(Stage),

    #[error("interview has not started")]
    NotStarted,

    #[error("interview is over (stage {0})")]
    Finished(Stage),

    #[error("camera must be on to answer")]
    CameraInactive,

    #[error("interview is not complete (stage {0})")]
    NotComplete(Stage),

    #[error("results were already submitted")]
    AlreadySubmitted,

    #[error("select questions: {0}")]
    Catalog(#[from] CatalogError),

    #[error("save results: {0:#}")]
    Store(anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub settings: InterviewSettings,
    pub catalog: QuestionCatalog,
}

/// Returned once results have been handed to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingReceipt {
    // None when there were no evaluations to store.
    pub result_id: Option<i64>,
    pub summary: ScoreSummary,
    pub warning_count: u32,
}

/// The interview state machine.
///
/// Each handler takes the session it acts on, applies exactly one event and
/// returns the resulting snapshot. Oracle failures never escape a handler;
/// they degrade to fallback text or the scoring apology.
pub struct InterviewEngine {
    cfg: EngineConfig,
    text: Arc<dyn TextOracle>,
    store: Arc<dyn ResultStore>,
    rng: Box<dyn RandomSource>,
}

impl InterviewEngine {
    pub fn new(
        cfg: EngineConfig,
        text: Arc<dyn TextOracle>,
        store: Arc<dyn ResultStore>,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            cfg,
            text,
            store,
            rng,
        }
    }

    pub fn settings(&self) -> &InterviewSettings {
        &self.cfg.settings
    }

    pub fn new_session(&self, candidate: Candidate) -> InterviewSession {
        InterviewSession::new(candidate, self.cfg.settings.max_warnings)
    }

    /// AWAITING_START -> BOT_INTRODUCTION.
    pub async fn start(
        &mut self,
        session: &mut InterviewSession,
    ) -> Result<SessionSnapshot, EngineError> {
        if session.stage != Stage::AwaitingStart {
            return Err(EngineError::AlreadyStarted(session.stage));
        }

        let questions = self
            .cfg
            .catalog
            .select(self.cfg.settings.selection_plan(), self.rng.as_mut())?;
        log::info!(
            "session {}: selected {} questions",
            session.id.0,
            questions.len()
        );

        session.questions = questions;
        session.started_at = Some(Utc::now());
        set_stage(session, Stage::BotIntroduction);

        let greeting = self
            .ask("greeting", GREETING_PROMPT)
            .await
            .unwrap_or_else(|| FALLBACK_GREETING.to_string());
        session.say(greeting);

        Ok(session.snapshot())
    }

    /// Interprets candidate text according to the current stage.
    pub async fn submit_answer(
        &mut self,
        session: &mut InterviewSession,
        text: &str,
    ) -> Result<SessionSnapshot, EngineError> {
        match session.stage {
            Stage::AwaitingStart => return Err(EngineError::NotStarted),
            s if s.is_terminal() => return Err(EngineError::Finished(s)),
            _ => {}
        }
        if self.cfg.settings.require_camera_for_answers && !session.camera_playing {
            return Err(EngineError::CameraInactive);
        }

        session.record_user(text);
        match session.stage {
            Stage::BotIntroduction => self.handle_introduction(session, text).await,
            Stage::AwaitingAnswer => self.handle_main_answer(session, text).await,
            Stage::AwaitingPsychResponse => self.handle_probe_reply(session, text).await,
            _ => {}
        }
        Ok(session.snapshot())
    }

    /// Camera stream started or stopped.
    pub fn on_camera_state(
        &mut self,
        session: &mut InterviewSession,
        playing: bool,
    ) -> SessionSnapshot {
        // The stream only exists once the interview is running.
        if !session.stage.is_running() {
            return session.snapshot();
        }

        if playing {
            if !session.camera_confirmed_active {
                log::info!("session {}: camera confirmed active", session.id.0);
            }
            session.camera_playing = true;
            session.camera_confirmed_active = true;
        } else {
            let was_playing = std::mem::replace(&mut session.camera_playing, false);
            if was_playing && session.camera_confirmed_active {
                log::warn!("session {}: camera stopped mid-interview", session.id.0);
                set_stage(session, Stage::TerminatedCamera);
            }
        }
        session.snapshot()
    }

    /// Feeds one sampled proctoring verdict into the warning tracker.
    pub fn on_frame_verdict(
        &mut self,
        session: &mut InterviewSession,
        verdict: ProctoringVerdict,
    ) -> SessionSnapshot {
        if !session.stage.is_running() {
            return session.snapshot();
        }

        let status = verdict.status();
        match session.warnings.observe(status) {
            WarningOutcome::Unchanged => {}
            WarningOutcome::Warned { count } => {
                log::warn!(
                    "session {}: {} ({count}/{})",
                    session.id.0,
                    status.message(),
                    session.warnings.limit()
                );
            }
            WarningOutcome::LimitReached { count } => {
                log::warn!(
                    "session {}: {} ({count}/{}), terminating",
                    session.id.0,
                    status.message(),
                    session.warnings.limit()
                );
                set_stage(session, Stage::Terminated);
            }
        }
        session.snapshot()
    }

    /// INTERVIEW_COMPLETE: persist results and leave the state machine.
    pub async fn submit_for_grading(
        &mut self,
        session: &mut InterviewSession,
    ) -> Result<GradingReceipt, EngineError> {
        if session.stage != Stage::InterviewComplete {
            return Err(EngineError::NotComplete(session.stage));
        }
        if session.submitted {
            return Err(EngineError::AlreadySubmitted);
        }

        let warning_count = session.warnings.count();
        let result_id = self
            .store
            .save_results(
                &session.candidate.user_id,
                &session.evaluations,
                warning_count,
            )
            .await
            .map_err(EngineError::Store)?;
        session.submitted = true;
        log::info!(
            "session {}: submitted {} evaluations (result_id={result_id:?})",
            session.id.0,
            session.evaluations.len()
        );

        Ok(GradingReceipt {
            result_id,
            summary: ScoreSummary::from_evaluations(&session.evaluations),
            warning_count,
        })
    }

    async fn handle_introduction(&mut self, session: &mut InterviewSession, introduction: &str) {
        let name = self
            .ask("name extraction", &prompts::name_extraction_prompt(introduction))
            .await
            .and_then(|reply| extract_name(&reply));

        let transition = self
            .ask(
                "intro transition",
                &prompts::intro_transition_prompt(name.as_deref()),
            )
            .await
            .unwrap_or_else(|| GENERIC_INTRO_TRANSITION.to_string());
        session.say(transition);

        self.ask_next_question(session);
    }

    async fn handle_main_answer(&mut self, session: &mut InterviewSession, answer: &str) {
        let Some(question) = session.current_question() else {
            self.ask_next_question(session);
            return;
        };

        if question.level.warrants_probe()
            && session.psych_question_count < self.cfg.settings.max_probe_questions
        {
            let probe = choose(self.rng.as_mut(), &PROBE_QUESTIONS)
                .copied()
                .unwrap_or(PROBE_QUESTIONS[0]);
            session.pending_answer = Some(answer.to_string());
            session.last_probe_question = Some(probe.to_string());
            session.psych_question_count += 1;
            session.say(probe);
            set_stage(session, Stage::AwaitingPsychResponse);
            return;
        }

        self.evaluate(session, answer).await;
    }

    async fn handle_probe_reply(&mut self, session: &mut InterviewSession, reply: &str) {
        let probe = session.last_probe_question.clone().unwrap_or_default();
        if let Some(transition) = self
            .ask(
                "probe transition",
                &prompts::probe_reply_transition_prompt(&probe, reply),
            )
            .await
        {
            session.say(transition);
        }

        let answer = session.pending_answer.take().unwrap_or_default();
        self.evaluate(session, &answer).await;
    }

    /// Scores `answer` against the current question, then moves on regardless
    /// of whether the score parsed.
    async fn evaluate(&mut self, session: &mut InterviewSession, answer: &str) {
        let Some(question) = session.current_question().cloned() else {
            self.ask_next_question(session);
            return;
        };

        let prompt = prompts::evaluation_prompt(&question, answer);
        let parsed = match self.text.generate(&prompt).await {
            Ok(reply) => parse_score_response(&reply.text).map_err(anyhow::Error::from),
            Err(e) => Err(e),
        };

        match parsed {
            Ok(score) => {
                session.evaluations.push(Evaluation::for_question(
                    &question,
                    score.score,
                    score.feedback.clone(),
                ));
                session.say(score.feedback);
            }
            Err(e) => {
                log::warn!(
                    "session {}: scoring question {} failed: {e:#}",
                    session.id.0,
                    session.question_index + 1
                );
                session.say(SCORING_APOLOGY);
            }
        }

        session.question_index = (session.question_index + 1).min(session.questions.len());
        self.ask_next_question(session);
    }

    fn ask_next_question(&mut self, session: &mut InterviewSession) {
        match session.current_question().cloned() {
            Some(question) => {
                let transition = choose(self.rng.as_mut(), &TRANSITION_PHRASES)
                    .copied()
                    .unwrap_or(TRANSITION_PHRASES[0]);
                session.say(prompts::framed_question(transition, &question));
                set_stage(session, Stage::AwaitingAnswer);
            }
            None => {
                session.say(FINAL_QUESTION_NOTICE);
                set_stage(session, Stage::InterviewComplete);
            }
        }
    }

    /// One-shot text request; failures and empty replies become `None`.
    async fn ask(&self, purpose: &str, prompt: &str) -> Option<String> {
        match self.text.generate(prompt).await {
            Ok(out) => {
                let text = filter_oracle_output(&out.text);
                if text.is_empty() {
                    log::warn!("text oracle returned nothing for {purpose}");
                    None
                } else {
                    Some(text)
                }
            }
            Err(e) => {
                log::warn!("text oracle failed for {purpose}: {e:#}");
                None
            }
        }
    }
}

fn set_stage(session: &mut InterviewSession, next: Stage) {
    if session.stage != next {
        log::info!("session {}: {} -> {}", session.id.0, session.stage, next);
        session.stage = next;
    }
}
