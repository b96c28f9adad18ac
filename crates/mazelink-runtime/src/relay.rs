//! [`RelayNode`] – the authoritative participant.
//!
//! For every intent on the [`Topic::Intents`] lane the relay:
//!
//! 1. drops it (`Rejected(Busy)`) if its own mirror of the agent is still
//!    moving;
//! 2. asks [`RelayAuthority`] to validate and commit it;
//! 3. on acceptance, broadcasts the resulting [`StateUpdate`] to every
//!    participant and applies it to its own mirror through the same lane
//!    before looking at the next intent;
//! 4. for rotations, plays the stereo cue on its local audio device.
//!
//! Rejected intents produce no traffic at all.  An audio fault is logged and
//! never undoes a committed intent.

use mazelink_hal::{AudioSink, CueMapper};
use mazelink_kernel::{IntentOutcome, RelayAuthority};
use mazelink_middleware::{EventBus, Topic, TopicReceiver};
use mazelink_types::{
    AgentId, EventPayload, Intent, IntentPhase, MazeError, MovementState, PendingIntent,
    RejectReason, Role, Rotation, StateUpdate,
};
use tracing::{debug, info, warn};

use crate::participant::Participant;

pub struct RelayNode {
    participant: Participant,
    authority: RelayAuthority,
    bus: EventBus,
    intents: TopicReceiver,
    cues: Box<dyn CueMapper>,
    audio: Box<dyn AudioSink>,
}

impl RelayNode {
    /// # Errors
    ///
    /// [`MazeError::RoleViolation`] if `participant` is not the relay or
    /// mirrors a different agent than `authority` owns.
    pub fn new(
        participant: Participant,
        authority: RelayAuthority,
        bus: &EventBus,
        cues: Box<dyn CueMapper>,
        audio: Box<dyn AudioSink>,
    ) -> Result<Self, MazeError> {
        if participant.role() != Role::Relay || participant.agent_id() != authority.agent_id() {
            return Err(MazeError::RoleViolation {
                role: participant.role(),
                action: "own canonical state".to_string(),
            });
        }
        Ok(Self {
            participant,
            authority,
            bus: bus.clone(),
            intents: bus.subscribe_to(Topic::Intents),
            cues,
            audio,
        })
    }

    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    pub fn authority(&self) -> &RelayAuthority {
        &self.authority
    }

    /// Run one intent through validation, broadcast and local application.
    pub fn handle_intent(
        &mut self,
        agent_id: AgentId,
        intent: Intent,
    ) -> Result<PendingIntent, MazeError> {
        let mut pending = PendingIntent::requested(intent);

        if self.participant.movement_state() == MovementState::Moving {
            debug!(?intent, "intent arrived while moving; dropped");
            pending.phase = IntentPhase::Rejected(RejectReason::Busy);
            return Ok(pending);
        }

        let update = match self.authority.handle(agent_id, intent) {
            IntentOutcome::Rejected(reason) => {
                pending.phase = IntentPhase::Rejected(reason);
                return Ok(pending);
            }
            IntentOutcome::Accepted(update) => update,
        };
        pending.phase = IntentPhase::Validated;

        let receivers = self
            .bus
            .broadcast_update(self.participant.source(), agent_id, update)?;
        debug!(?update, receivers, "update broadcast");

        if let StateUpdate::RotateApplied { delta } = update {
            self.play_cue(delta);
        }

        // Our own mirror changes only through the broadcast we just sent.
        self.participant.pump()?;
        pending.phase = IntentPhase::Applied;
        info!(?intent, "intent applied");
        Ok(pending)
    }

    /// The rotation is already committed and broadcast, so a failing audio
    /// device only costs the cue.
    fn play_cue(&mut self, delta: Rotation) {
        let cue = self.cues.map(delta);
        match self.audio.play(&cue.clip, cue.pan) {
            Ok(()) => debug!(clip = cue.clip.name(), pan = cue.pan, "rotation cue played"),
            Err(e) => warn!(error = %e, clip = cue.clip.name(), "rotation cue not played"),
        }
    }

    /// Handle every queued intent, then any remaining updates.
    pub fn pump(&mut self) -> Result<Vec<PendingIntent>, MazeError> {
        let mut handled = Vec::new();
        while let Some(event) = self.intents.try_next() {
            match event.payload {
                EventPayload::Intent { agent_id, intent } => {
                    handled.push(self.handle_intent(agent_id, intent)?);
                }
                other => warn!(?other, "unexpected payload on intent lane"),
            }
        }
        self.participant.pump()?;
        Ok(handled)
    }

    pub fn advance(&mut self, dt: f32) -> Result<(), MazeError> {
        self.participant.advance(dt)
    }
}
