use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::phase::TurnPhase;
use super::reply::{parse_reply, question_overlay};
use crate::api::{ChatRequest, ChatResponse, FinalResult, InterviewApi};
use crate::audio::AudioCaptureEncoder;
use crate::error::{Result, SessionError};
use crate::session::{
    ChatTurn, EventBus, SessionEvent, SessionHandle, Speaker, TaskRegistry, TranscriptEntry,
};
use crate::speech::SpeechPlaybackController;

/// What the AI made of one user turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnReply {
    /// What the recogniser understood the user to say
    pub heard: String,
    /// The AI's answer as spoken and shown
    pub reply: String,
    pub complete: bool,
    pub final_result: Option<FinalResult>,
}

/// Result of finishing a recording
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// Nothing was recording
    Idle,
    /// The recording captured no audio; nothing was sent
    Empty,
    Replied(TurnReply),
}

/// Turn-taking state machine between the user's microphone and the AI
pub struct ConversationOrchestrator {
    state: SessionHandle,
    api: Arc<dyn InterviewApi>,
    capture: Mutex<AudioCaptureEncoder>,
    playback: Arc<SpeechPlaybackController>,
    events: EventBus,
    tasks: Arc<TaskRegistry>,
}

impl ConversationOrchestrator {
    pub fn new(
        state: SessionHandle,
        api: Arc<dyn InterviewApi>,
        capture: AudioCaptureEncoder,
        playback: Arc<SpeechPlaybackController>,
        events: EventBus,
        tasks: Arc<TaskRegistry>,
    ) -> Self {
        Self {
            state,
            api,
            capture: Mutex::new(capture),
            playback,
            events,
            tasks,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.state.read(|s| s.phase)
    }

    fn set_phase(&self, phase: TurnPhase) {
        self.state.update(|s| s.phase = phase);
        self.events.publish(SessionEvent::PhaseChanged(phase));
    }

    /// Present and speak the opening line of the interview
    pub fn open(&self, opening_line: &str) {
        let entry = TranscriptEntry::new(Speaker::Ai, opening_line);
        self.state.update(|s| {
            s.transcript.push(entry.clone());
            s.history.push(ChatTurn::assistant(opening_line));
        });
        self.events.publish(SessionEvent::TranscriptAppended(entry));
        self.events.publish(SessionEvent::QuestionChanged(question_overlay(opening_line)));

        info!("Interview opened");
        self.speak(opening_line);
    }

    /// Start a user turn, cutting off the AI if it is still speaking
    pub async fn start_recording(&self) -> Result<()> {
        let mut capture = self.capture.lock().await;

        if self.tasks.is_shut_down() {
            return Err(SessionError::InvalidState("session has ended".into()));
        }

        let phase = self.phase();
        if !phase.accepts_recording() {
            return Err(SessionError::InvalidState(format!("cannot record while {phase}")));
        }

        // Preemption happens before the capture path opens.
        self.playback.stop();

        if let Err(e) = capture.start().await {
            if phase == TurnPhase::Speaking {
                self.set_phase(TurnPhase::AwaitingUserInput);
            }
            return Err(e);
        }

        self.state.update(|s| {
            s.phase = TurnPhase::Recording;
            s.turn += 1;
        });
        self.events.publish(SessionEvent::PhaseChanged(TurnPhase::Recording));
        Ok(())
    }

    /// Finish the user turn: encode, send, apply the reply and speak it
    ///
    /// A failed chat request reverts to `AwaitingUserInput` without touching
    /// history or plan and is returned as a `Network` error.
    pub async fn stop_recording(&self) -> Result<TurnOutcome> {
        let utterance = {
            let mut capture = self.capture.lock().await;
            match capture.stop().await? {
                Some(utterance) => utterance,
                None => return Ok(TurnOutcome::Idle),
            }
        };

        if utterance.is_empty() {
            info!("Recording captured no audio, nothing to send");
            self.set_phase(TurnPhase::AwaitingUserInput);
            return Ok(TurnOutcome::Empty);
        }

        self.set_phase(TurnPhase::Sending);

        let audio = match utterance.into_wav() {
            Ok(audio) => audio,
            Err(e) => return Err(self.fail_turn(e)),
        };

        let request = self.state.read(|s| ChatRequest {
            audio,
            history: s.history.clone(),
            resume_text: s.resume_text.clone(),
            scenario: s.config.scenario.clone(),
            language: s.config.language.clone(),
            difficulty: s.config.difficulty,
            plan: s.plan.clone(),
        });

        self.set_phase(TurnPhase::AwaitingAiResponse);

        let result = self.api.chat(request).await;

        // The session may have ended while the request was in flight.
        if self.tasks.is_shut_down() {
            info!("Discarding chat reply that arrived after the session ended");
            return Err(SessionError::InvalidState("session has ended".into()));
        }

        match result {
            Ok(response) => Ok(TurnOutcome::Replied(self.apply_response(response))),
            Err(e) => {
                let e = match e {
                    SessionError::Network(_) => e,
                    other => SessionError::Network(other.to_string()),
                };
                Err(self.fail_turn(e))
            }
        }
    }

    /// Start recording when idle or speaking, finish the turn when recording
    ///
    /// Returns `None` when this call started a recording.
    pub async fn toggle_recording(&self) -> Result<Option<TurnOutcome>> {
        if self.phase() == TurnPhase::Recording {
            self.stop_recording().await.map(Some)
        } else {
            self.start_recording().await.map(|()| None)
        }
    }

    fn fail_turn(&self, error: SessionError) -> SessionError {
        warn!("Turn failed: {}", error);
        self.set_phase(TurnPhase::AwaitingUserInput);
        self.events.publish(SessionEvent::TurnFailed(error.to_string()));
        error
    }

    fn apply_response(&self, response: ChatResponse) -> TurnReply {
        let (heard, spoken) = parse_reply(&response.reply, response.transcript.as_deref());
        let complete = response.interview_complete;
        let you = TranscriptEntry::new(Speaker::You, heard.clone());
        let ai = TranscriptEntry::new(Speaker::Ai, spoken.clone());

        let (plan_update, final_result) = self.state.update(|s| {
            if let Some(key) = response.session_key.filter(|k| !k.is_empty()) {
                s.session_key = Some(key);
            }

            let plan_update = response.plan_update.map(|plan| {
                let changes = plan.diff(s.plan.as_ref());
                s.plan = Some(plan.clone());
                (plan, changes)
            });

            let final_result = complete.then(|| {
                let result = response.final_result.unwrap_or_else(|| FinalResult {
                    score: s.plan.as_ref().map(|p| f64::from(p.average_score())),
                    comment: None,
                });
                s.final_result = Some(result.clone());
                s.phase = TurnPhase::Complete;
                result
            });

            s.transcript.push(you.clone());
            s.transcript.push(ai.clone());
            s.history.push(ChatTurn::assistant(spoken.clone()));

            (plan_update, final_result)
        });

        if let Some((plan, changes)) = plan_update {
            debug!("Plan replaced: {} items, {} done", changes.len(), plan.completed_count());
            self.events.publish(SessionEvent::PlanUpdated { plan, changes });
        }

        if complete {
            info!(
                "Interview complete, final score: {}",
                final_result
                    .as_ref()
                    .and_then(|r| r.score)
                    .map_or_else(|| "none".to_string(), |s| s.to_string())
            );
            self.events.publish(SessionEvent::PhaseChanged(TurnPhase::Complete));
            self.events.publish(SessionEvent::InterviewComplete(final_result.clone()));
        }

        self.events.publish(SessionEvent::TranscriptAppended(you));
        self.events.publish(SessionEvent::TranscriptAppended(ai));
        self.events.publish(SessionEvent::QuestionChanged(question_overlay(&spoken)));

        self.speak(&spoken);

        TurnReply {
            heard,
            reply: spoken,
            complete,
            final_result,
        }
    }

    /// Hand `text` to playback; `Speaking` ends when playback does
    ///
    /// After completion the AI still speaks but the phase stays `Complete`.
    fn speak(&self, text: &str) {
        if self.tasks.is_shut_down() {
            return;
        }

        if text.trim().is_empty() {
            if !self.phase().is_terminal() {
                self.set_phase(TurnPhase::AwaitingUserInput);
            }
            return;
        }

        let (turn, speaking) = self.state.update(|s| {
            let speaking = !s.phase.is_terminal();
            if speaking {
                s.phase = TurnPhase::Speaking;
            }
            (s.turn, speaking)
        });
        if speaking {
            self.events.publish(SessionEvent::PhaseChanged(TurnPhase::Speaking));
        }

        let playback = self.playback.play(text);
        let state = self.state.clone();
        let events = self.events.clone();

        self.tasks.spawn("playback-watch", move |cancel| async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                outcome = playback => {
                    debug!("Playback for turn {} ended: {:?}", turn, outcome);
                    let resumed = state.update(|s| {
                        let current = s.phase == TurnPhase::Speaking && s.turn == turn;
                        if current {
                            s.phase = TurnPhase::AwaitingUserInput;
                        }
                        current
                    });
                    if resumed {
                        events.publish(SessionEvent::PhaseChanged(TurnPhase::AwaitingUserInput));
                    }
                }
            }
        });
    }

    /// Re-fetch the plan for the held session key; `false` when nothing changed
    pub async fn refresh_plan(&self) -> Result<bool> {
        let Some(key) = self.state.read(|s| s.session_key.clone()) else {
            debug!("No session key yet, plan refresh skipped");
            return Ok(false);
        };

        let Some(plan) = self.api.plan_status(&key).await?.plan else {
            return Ok(false);
        };
        if self.tasks.is_shut_down() {
            return Ok(false);
        }

        let changes = self.state.update(|s| {
            let changes = plan.diff(s.plan.as_ref());
            s.plan = Some(plan.clone());
            changes
        });
        self.events.publish(SessionEvent::PlanUpdated { plan, changes });
        Ok(true)
    }

    /// Silence the AI for good and drop any recording in progress
    pub async fn shutdown(&self) {
        self.playback.close();

        let mut capture = self.capture.lock().await;
        match capture.stop().await {
            Ok(Some(utterance)) => info!("Discarded {} samples recorded at session end", utterance.len()),
            Ok(None) => {}
            Err(e) => warn!("Audio capture failed to stop: {}", e),
        }
    }
}
