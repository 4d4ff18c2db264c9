//! MIDI output for controller feedback
//!
//! Jumping to a bound note echoes it back so pad controllers light the pad.

use midir::MidiOutputConnection;

use crate::MidiConnectionError;

/// Destination for feedback bytes
pub trait FeedbackOutput: Send {
    fn send_raw(&mut self, message: &[u8]) -> Result<(), MidiConnectionError>;

    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) -> Result<(), MidiConnectionError> {
        self.send_raw(&[0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F])
    }

    fn note_off(&mut self, channel: u8, note: u8) -> Result<(), MidiConnectionError> {
        self.send_raw(&[0x80 | (channel & 0x0F), note & 0x7F, 0])
    }
}

/// Feedback over a midir output port
pub struct MidiFeedback {
    connection: MidiOutputConnection,
}

impl MidiFeedback {
    /// Open the first output port matching `port_match`
    pub fn connect(port_match: &str) -> Result<Self, MidiConnectionError> {
        let connection = crate::connection::connect_output(port_match)?;
        Ok(Self { connection })
    }
}

impl FeedbackOutput for MidiFeedback {
    fn send_raw(&mut self, message: &[u8]) -> Result<(), MidiConnectionError> {
        log::trace!("[MIDI OUT] {:02X?}", message);
        self.connection
            .send(message)
            .map_err(|e| MidiConnectionError::SendError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Capture(Vec<Vec<u8>>);

    impl FeedbackOutput for Capture {
        fn send_raw(&mut self, message: &[u8]) -> Result<(), MidiConnectionError> {
            self.0.push(message.to_vec());
            Ok(())
        }
    }

    #[test]
    fn test_note_messages() {
        let mut out = Capture(Vec::new());
        out.note_on(4, 60, 100).unwrap();
        out.note_off(4, 60).unwrap();
        out.note_on(0x14, 0xC0, 0xFF).unwrap();
        assert_eq!(out.0, vec![vec![0x94, 60, 100], vec![0x84, 60, 0], vec![0x94, 0x40, 0x7F]]);
    }
}
