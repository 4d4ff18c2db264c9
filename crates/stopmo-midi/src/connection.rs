//! MIDI port discovery and connection
//!
//! Uses midir for cross-platform MIDI I/O (ALSA on Linux, CoreMIDI on macOS, WinMM on Windows).

use midir::{MidiInput, MidiInputPort, MidiOutput, MidiOutputConnection};

/// Error type for MIDI connection operations
#[derive(Debug, thiserror::Error)]
pub enum MidiConnectionError {
    #[error("Failed to initialize MIDI input: {0}")]
    InputInitError(String),

    #[error("Failed to initialize MIDI output: {0}")]
    OutputInitError(String),

    #[error("No MIDI input ports available")]
    NoInputPorts,

    #[error("No MIDI port found matching pattern: {0}")]
    PortNotFound(String),

    #[error("Failed to connect to MIDI port: {0}")]
    ConnectionError(String),

    #[error("Failed to get port info: {0}")]
    PortInfoError(String),

    #[error("Failed to send MIDI message: {0}")]
    SendError(String),
}

/// A control surface as seen by port enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlDevice {
    /// Port name reported by the driver
    pub identifier: String,
    pub supports_input: bool,
    pub supports_output: bool,
}

impl std::fmt::Display for ControlDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dir = match (self.supports_input, self.supports_output) {
            (true, true) => "in/out",
            (true, false) => "in",
            (false, true) => "out",
            (false, false) => "-",
        };
        write!(f, "{} ({})", self.identifier, dir)
    }
}

/// Find an input port whose name contains `port_match` (case-insensitive)
///
/// Returns the MidiInput so the caller can attach its own callback.
pub fn find_input_port(port_match: &str) -> Result<(MidiInput, MidiInputPort), MidiConnectionError> {
    let pattern = port_match.to_lowercase();

    let midi_in = MidiInput::new("stopmo-midi-in")
        .map_err(|e| MidiConnectionError::InputInitError(e.to_string()))?;

    let in_ports = midi_in.ports();
    if in_ports.is_empty() {
        return Err(MidiConnectionError::NoInputPorts);
    }

    let input_port = in_ports
        .into_iter()
        .find(|port| {
            midi_in
                .port_name(port)
                .map(|name| name.to_lowercase().contains(&pattern))
                .unwrap_or(false)
        })
        .ok_or_else(|| MidiConnectionError::PortNotFound(port_match.to_string()))?;

    let port_name = midi_in
        .port_name(&input_port)
        .map_err(|e| MidiConnectionError::PortInfoError(e.to_string()))?;

    log::info!("MIDI: Found input port: {}", port_name);

    Ok((midi_in, input_port))
}

/// Connect to the first output port whose name contains `port_match`
pub fn connect_output(port_match: &str) -> Result<MidiOutputConnection, MidiConnectionError> {
    let pattern = port_match.to_lowercase();

    let midi_out = MidiOutput::new("stopmo-midi-out")
        .map_err(|e| MidiConnectionError::OutputInitError(e.to_string()))?;

    let output_port = midi_out
        .ports()
        .into_iter()
        .find(|port| {
            midi_out
                .port_name(port)
                .map(|name| name.to_lowercase().contains(&pattern))
                .unwrap_or(false)
        })
        .ok_or_else(|| MidiConnectionError::PortNotFound(port_match.to_string()))?;

    let port_name = midi_out
        .port_name(&output_port)
        .map_err(|e| MidiConnectionError::PortInfoError(e.to_string()))?;

    let connection = midi_out
        .connect(&output_port, "stopmo-midi-output")
        .map_err(|e| MidiConnectionError::ConnectionError(e.to_string()))?;

    log::info!("MIDI: Connected output port: {}", port_name);
    Ok(connection)
}

/// List available MIDI input ports
pub fn list_input_ports() -> Result<Vec<String>, MidiConnectionError> {
    let midi_in = MidiInput::new("stopmo-midi-list")
        .map_err(|e| MidiConnectionError::InputInitError(e.to_string()))?;

    Ok(midi_in
        .ports()
        .iter()
        .filter_map(|port| midi_in.port_name(port).ok())
        .collect())
}

/// List available MIDI output ports
pub fn list_output_ports() -> Result<Vec<String>, MidiConnectionError> {
    let midi_out = MidiOutput::new("stopmo-midi-list")
        .map_err(|e| MidiConnectionError::OutputInitError(e.to_string()))?;

    Ok(midi_out
        .ports()
        .iter()
        .filter_map(|port| midi_out.port_name(port).ok())
        .collect())
}

/// Every MIDI port, with input and output sides of the same name merged
///
/// A backend that fails to initialize contributes no ports.
pub fn list_devices() -> Vec<ControlDevice> {
    let inputs = list_input_ports().unwrap_or_else(|e| {
        log::warn!("MIDI: {}", e);
        Vec::new()
    });
    let outputs = list_output_ports().unwrap_or_else(|e| {
        log::warn!("MIDI: {}", e);
        Vec::new()
    });
    merge_ports(inputs, outputs)
}

fn merge_ports(inputs: Vec<String>, outputs: Vec<String>) -> Vec<ControlDevice> {
    let mut devices: Vec<ControlDevice> = inputs
        .into_iter()
        .map(|identifier| ControlDevice {
            identifier,
            supports_input: true,
            supports_output: false,
        })
        .collect();

    for name in outputs {
        match devices.iter_mut().find(|d| d.identifier == name) {
            Some(device) => device.supports_output = true,
            None => devices.push(ControlDevice {
                identifier: name,
                supports_input: false,
                supports_output: true,
            }),
        }
    }
    devices
}
