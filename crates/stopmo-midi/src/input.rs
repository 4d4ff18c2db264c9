//! MIDI input handling
//!
//! Receives raw MIDI bytes from the midir callback, parses them, and forwards
//! the events to the router thread over a flume channel.

use flume::Sender;
use midir::MidiInputConnection;

use crate::events::ControlEvent;
use crate::MidiConnectionError;

/// Raw MIDI input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiInputEvent {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange { channel: u8, cc: u8, value: u8 },
    /// Coarse pitch bend, centred on zero (`msb - 64`)
    PitchBend { channel: u8, bend: i8 },
}

impl MidiInputEvent {
    /// Parse raw MIDI bytes into an event
    ///
    /// MIDI message format:
    /// - Note Off: 0x8n nn vv (n=channel, nn=note, vv=velocity)
    /// - Note On: 0x9n nn vv
    /// - Control Change: 0xBn cc vv (cc=controller, vv=value)
    /// - Pitch Bend: 0xEn ll mm (only the MSB is used)
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 3 {
            return None;
        }

        let status = data[0];
        let channel = status & 0x0F;

        match status & 0xF0 {
            0x80 => Some(Self::NoteOff {
                channel,
                note: data[1],
                velocity: data[2],
            }),
            // Note On with velocity 0 is treated as Note Off
            0x90 if data[2] == 0 => Some(Self::NoteOff {
                channel,
                note: data[1],
                velocity: 0,
            }),
            0x90 => Some(Self::NoteOn {
                channel,
                note: data[1],
                velocity: data[2],
            }),
            0xB0 => Some(Self::ControlChange {
                channel,
                cc: data[1],
                value: data[2],
            }),
            0xE0 => Some(Self::PitchBend {
                channel,
                bend: (data[2] & 0x7F) as i8 - 64,
            }),
            _ => None,
        }
    }

    /// Get the MIDI channel
    pub fn channel(&self) -> u8 {
        match *self {
            Self::NoteOn { channel, .. }
            | Self::NoteOff { channel, .. }
            | Self::ControlChange { channel, .. }
            | Self::PitchBend { channel, .. } => channel,
        }
    }
}

/// MIDI input handler
///
/// Owns the midir connection; dropping it closes the port.
pub struct MidiInputHandler {
    _connection: MidiInputConnection<Sender<ControlEvent>>,
    port_name: String,
}

impl MidiInputHandler {
    /// Open the first input port matching `port_match` and forward its events
    pub fn connect(port_match: &str, event_tx: Sender<ControlEvent>) -> Result<Self, MidiConnectionError> {
        let (midi_in, port) = crate::connection::find_input_port(port_match)?;
        let port_name = midi_in
            .port_name(&port)
            .map_err(|e| MidiConnectionError::PortInfoError(e.to_string()))?;

        let connection = midi_in
            .connect(&port, "stopmo-midi-input", Self::midi_callback, event_tx)
            .map_err(|e| MidiConnectionError::ConnectionError(e.to_string()))?;

        log::info!("MIDI: Input handler connected");

        Ok(Self {
            _connection: connection,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Called from the MIDI driver thread; must not block
    fn midi_callback(_timestamp: u64, data: &[u8], event_tx: &mut Sender<ControlEvent>) {
        let Some(event) = MidiInputEvent::parse(data) else {
            log::debug!("[MIDI IN] ignored {:02X?}", data);
            return;
        };
        log::debug!("[MIDI IN] {:?}", event);

        if event_tx.try_send(ControlEvent::Midi(event)).is_err() {
            log::warn!("MIDI: Event channel full, dropping message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_note_on() {
        let data = [0x94, 0x3C, 0x7F]; // Note On, channel 4, note 60, velocity 127
        assert_eq!(
            MidiInputEvent::parse(&data),
            Some(MidiInputEvent::NoteOn {
                channel: 4,
                note: 0x3C,
                velocity: 0x7F
            })
        );
    }

    #[test]
    fn test_parse_note_on_zero_velocity() {
        let event = MidiInputEvent::parse(&[0x90, 0x3C, 0x00]).unwrap();
        assert!(matches!(event, MidiInputEvent::NoteOff { note: 0x3C, .. }));
    }

    #[test]
    fn test_parse_cc_and_bend() {
        assert_eq!(
            MidiInputEvent::parse(&[0xB1, 0x01, 0x40]),
            Some(MidiInputEvent::ControlChange {
                channel: 1,
                cc: 1,
                value: 0x40
            })
        );
        assert_eq!(
            MidiInputEvent::parse(&[0xE4, 0x00, 0x7F]),
            Some(MidiInputEvent::PitchBend { channel: 4, bend: 63 })
        );
        assert_eq!(
            MidiInputEvent::parse(&[0xE4, 0x00, 0x00]),
            Some(MidiInputEvent::PitchBend { channel: 4, bend: -64 })
        );
        assert_eq!(MidiInputEvent::parse(&[0xE4, 0x00, 0x40]).unwrap().channel(), 4);
    }

    #[test]
    fn test_parse_rejects_short_and_unknown() {
        assert_eq!(MidiInputEvent::parse(&[]), None);
        assert_eq!(MidiInputEvent::parse(&[0x90, 0x3C]), None);
        assert_eq!(MidiInputEvent::parse(&[0xA0, 0x3C, 0x10]), None); // aftertouch
        assert_eq!(MidiInputEvent::parse(&[0xF8, 0x00, 0x00]), None); // clock
    }

    #[test]
    fn test_callback_forwards_events() {
        let (mut tx, rx) = flume::bounded(1);
        MidiInputHandler::midi_callback(0, &[0x94, 40, 100], &mut tx);
        MidiInputHandler::midi_callback(0, &[0xA4, 40, 100], &mut tx);
        // channel full; dropped without blocking
        MidiInputHandler::midi_callback(0, &[0x94, 41, 100], &mut tx);

        assert_eq!(
            rx.try_recv().unwrap(),
            ControlEvent::Midi(MidiInputEvent::NoteOn {
                channel: 4,
                note: 40,
                velocity: 100
            })
        );
        assert!(rx.try_recv().is_err());
    }
}
