use crate::engine::{EngineError, GradingReceipt, InterviewEngine};
use crate::session::{InterviewSession, SessionSnapshot};
use crate::traits::FrameOracle;
use intervue_core::proctoring::{Frame, FrameSampler, ProctoringVerdict};
use intervue_core::types::{SessionId, Stage};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};

const COMMAND_QUEUE_DEPTH: usize = 64;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("session has stopped")]
    Closed,
}

enum Command {
    Start {
        reply: oneshot::Sender<Result<SessionSnapshot, EngineError>>,
    },
    SubmitAnswer {
        text: String,
        reply: oneshot::Sender<Result<SessionSnapshot, EngineError>>,
    },
    CameraState {
        playing: bool,
        reply: oneshot::Sender<SessionSnapshot>,
    },
    FrameVerdict {
        verdict: ProctoringVerdict,
        reply: oneshot::Sender<SessionSnapshot>,
    },
    SubmitForGrading {
        reply: oneshot::Sender<Result<GradingReceipt, EngineError>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

struct FrameGate {
    oracle: Arc<dyn FrameOracle>,
    sampler: Mutex<FrameSampler>,
    threshold: f32,
}

/// Cloneable handle to one running interview.
///
/// Chat turns, camera state changes and frame verdicts all travel through a
/// single queue to the task that owns the session, so they are applied one at
/// a time in arrival order. The task exits once every handle is dropped.
#[derive(Clone)]
pub struct SessionHandle {
    session_id: SessionId,
    tx: mpsc::Sender<Command>,
    stage: watch::Receiver<Stage>,
    frames: Arc<FrameGate>,
}

impl SessionHandle {
    /// Spawns the owning task on the current tokio runtime.
    pub fn spawn(
        engine: InterviewEngine,
        session: InterviewSession,
        frame_oracle: Arc<dyn FrameOracle>,
    ) -> Self {
        let settings = engine.settings();
        let frames = Arc::new(FrameGate {
            oracle: frame_oracle,
            sampler: Mutex::new(FrameSampler::new(settings.frame_sample_every)),
            threshold: settings.detection_threshold,
        });

        let session_id = session.id().clone();
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let (stage_tx, stage_rx) = watch::channel(session.stage());
        tokio::spawn(run(engine, session, rx, stage_tx));

        Self {
            session_id,
            tx,
            stage: stage_rx,
            frames,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Stage as of the last handled event.
    pub fn stage(&self) -> Stage {
        *self.stage.borrow()
    }

    pub async fn start_session(&self) -> Result<SessionSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Start { reply }).await?;
        Ok(rx.await.map_err(|_| SessionError::Closed)??)
    }

    pub async fn submit_answer(
        &self,
        text: impl Into<String>,
    ) -> Result<SessionSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SubmitAnswer {
            text: text.into(),
            reply,
        })
        .await?;
        Ok(rx.await.map_err(|_| SessionError::Closed)??)
    }

    pub async fn on_camera_state(&self, playing: bool) -> Result<SessionSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::CameraState { playing, reply }).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub async fn on_frame_verdict(
        &self,
        verdict: ProctoringVerdict,
    ) -> Result<SessionSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::FrameVerdict { verdict, reply }).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Samples a raw camera frame and, when selected, classifies it before
    /// queueing the verdict.
    ///
    /// Classification runs on the caller's task so a slow detector never holds
    /// up chat turns. Returns `None` when the frame was skipped, the interview
    /// is not running, or the detector failed.
    pub async fn on_frame(&self, frame: &Frame) -> Result<Option<SessionSnapshot>, SessionError> {
        if !self.stage().is_running() {
            return Ok(None);
        }

        let sampled = {
            let mut sampler = match self.frames.sampler.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            sampler.should_sample()
        };
        if !sampled {
            return Ok(None);
        }

        let detections = match self.frames.oracle.classify(frame).await {
            Ok(d) => d,
            Err(e) => {
                log::warn!(
                    "session {}: frame classification failed: {e:#}",
                    self.session_id.0
                );
                return Ok(None);
            }
        };

        let verdict = ProctoringVerdict::from_detections(&detections, self.frames.threshold);
        self.on_frame_verdict(verdict).await.map(Some)
    }

    pub async fn submit_for_grading(&self) -> Result<GradingReceipt, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SubmitForGrading { reply }).await?;
        Ok(rx.await.map_err(|_| SessionError::Closed)??)
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    async fn send(&self, cmd: Command) -> Result<(), SessionError> {
        self.tx.send(cmd).await.map_err(|_| SessionError::Closed)
    }
}

async fn run(
    mut engine: InterviewEngine,
    mut session: InterviewSession,
    mut rx: mpsc::Receiver<Command>,
    stage_tx: watch::Sender<Stage>,
) {
    while let Some(cmd) = rx.recv().await {
        // The stage is published before replying so a caller that awaited
        // the reply never reads a stale stage. A dropped reply receiver just
        // means the caller stopped waiting.
        match cmd {
            Command::Start { reply } => {
                let out = engine.start(&mut session).await;
                stage_tx.send_replace(session.stage());
                let _ = reply.send(out);
            }
            Command::SubmitAnswer { text, reply } => {
                let out = engine.submit_answer(&mut session, &text).await;
                stage_tx.send_replace(session.stage());
                let _ = reply.send(out);
            }
            Command::CameraState { playing, reply } => {
                let out = engine.on_camera_state(&mut session, playing);
                stage_tx.send_replace(session.stage());
                let _ = reply.send(out);
            }
            Command::FrameVerdict { verdict, reply } => {
                let out = engine.on_frame_verdict(&mut session, verdict);
                stage_tx.send_replace(session.stage());
                let _ = reply.send(out);
            }
            Command::SubmitForGrading { reply } => {
                let out = engine.submit_for_grading(&mut session).await;
                let _ = reply.send(out);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(session.snapshot());
            }
        }
    }
    log::debug!("session {}: actor stopped", session.id().0);
}
