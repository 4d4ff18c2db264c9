//! Output device enumeration
//!
//! Lists devices from every cpal host (JACK, ALSA, PulseAudio, ...) so a
//! playback device can be picked by name.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::HostId;

use super::error::{AudioError, AudioResult};

/// Human-readable name for a host ID
fn host_name(host_id: HostId) -> String {
    let name = format!("{:?}", host_id);
    match name.as_str() {
        "Alsa" => "ALSA".to_string(),
        "Jack" => "JACK".to_string(),
        "Wasapi" => "WASAPI".to_string(),
        _ => name,
    }
}

/// An output device as shown by `--list-devices`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDevice {
    pub name: String,
    /// Host backend name (e.g., "ALSA", "JACK")
    pub host: String,
    pub is_default: bool,
    pub max_channels: u16,
}

impl std::fmt::Display for OutputDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {} ({} ch)", self.host, self.name, self.max_channels)?;
        if self.is_default {
            write!(f, " *")?;
        }
        Ok(())
    }
}

/// All output devices across all hosts, defaults first
pub fn list_output_devices() -> AudioResult<Vec<OutputDevice>> {
    let mut devices = Vec::new();

    for host_id in cpal::available_hosts() {
        let host = match cpal::host_from_id(host_id) {
            Ok(h) => h,
            Err(e) => {
                log::debug!("Audio: could not initialize host {:?}: {}", host_id, e);
                continue;
            }
        };
        let host_label = host_name(host_id);
        let default_name = host.default_output_device().and_then(|d| d.name().ok());

        let outputs = match host.output_devices() {
            Ok(d) => d,
            Err(e) => {
                log::debug!("Audio: could not enumerate devices for {:?}: {}", host_id, e);
                continue;
            }
        };

        for device in outputs {
            let Ok(name) = device.name() else { continue };
            let max_channels = match device.supported_output_configs() {
                Ok(configs) => configs.map(|c| c.channels()).max().unwrap_or(0),
                Err(_) => continue,
            };
            if max_channels == 0 {
                continue;
            }
            devices.push(OutputDevice {
                is_default: default_name.as_ref() == Some(&name),
                name,
                host: host_label.clone(),
                max_channels,
            });
        }
    }

    if devices.is_empty() {
        return Err(AudioError::NoDevices);
    }

    devices.sort_by(|a, b| {
        b.is_default
            .cmp(&a.is_default)
            .then_with(|| a.host.cmp(&b.host))
            .then_with(|| a.name.cmp(&b.name))
    });

    log::info!("Audio: enumerated {} output devices", devices.len());
    Ok(devices)
}

/// Find an output device by exact name on any host
pub fn find_output_device(name: &str) -> AudioResult<cpal::Device> {
    for host_id in cpal::available_hosts() {
        let Ok(host) = cpal::host_from_id(host_id) else { continue };
        let Ok(mut outputs) = host.output_devices() else { continue };
        if let Some(device) = outputs.find(|d| d.name().ok().as_deref() == Some(name)) {
            return Ok(device);
        }
    }
    Err(AudioError::DeviceNotFound(name.to_string()))
}

/// The default host's default output device
pub fn default_output_device() -> AudioResult<cpal::Device> {
    cpal::default_host()
        .default_output_device()
        .ok_or_else(|| AudioError::NoDefaultDevice("No default output device".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_names() {
        assert!(!host_name(cpal::default_host().id()).is_empty());
    }

    #[test]
    fn test_device_display_marks_default() {
        let device = OutputDevice {
            name: "hw:0,0".to_string(),
            host: "ALSA".to_string(),
            is_default: true,
            max_channels: 2,
        };
        assert_eq!(device.to_string(), "[ALSA] hw:0,0 (2 ch) *");
    }
}
