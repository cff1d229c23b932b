// 🎙️ Voice Input - Assistant Phase Machine
// Sequences the speech flow; no audio transport lives here

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoicePhase {
    #[default]
    Idle,
    Listening,
    Processing,
    Speaking,
}

impl VoicePhase {
    pub fn label(&self) -> &'static str {
        match self {
            VoicePhase::Idle => "idle",
            VoicePhase::Listening => "listening",
            VoicePhase::Processing => "processing",
            VoicePhase::Speaking => "speaking",
        }
    }
}

/// Phase machine for the assistant's voice input. Transitions go
/// idle → listening → processing → speaking → idle; anything else is
/// rejected. Leaving the assistant tab cancels back to idle.
#[derive(Debug, Default)]
pub struct VoiceMachine {
    phase: VoicePhase,
}

impl VoiceMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> VoicePhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == VoicePhase::Idle
    }

    fn advance(&mut self, from: VoicePhase, to: VoicePhase) -> bool {
        if self.phase != from {
            tracing::debug!(
                current = self.phase.label(),
                requested = to.label(),
                "rejected voice transition"
            );
            return false;
        }
        self.phase = to;
        true
    }

    pub fn start_listening(&mut self) -> bool {
        self.advance(VoicePhase::Idle, VoicePhase::Listening)
    }

    pub fn finish_capture(&mut self) -> bool {
        self.advance(VoicePhase::Listening, VoicePhase::Processing)
    }

    pub fn start_speaking(&mut self) -> bool {
        self.advance(VoicePhase::Processing, VoicePhase::Speaking)
    }

    pub fn finish_speaking(&mut self) -> bool {
        self.advance(VoicePhase::Speaking, VoicePhase::Idle)
    }

    /// Abort whatever is in flight, e.g. on tab exit.
    pub fn cancel(&mut self) {
        if self.phase != VoicePhase::Idle {
            tracing::debug!(from = self.phase.label(), "voice flow cancelled");
            self.phase = VoicePhase::Idle;
        }
    }
}
