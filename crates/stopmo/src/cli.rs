//! Command line flags

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};

pub const USAGE: &str = "stopmo [-v] [-o output-dir] [-a audio-file] [-s thumb-size] \
[-r fps] [-R first[-last]] [-f filename-fmt] [-c config] [-m midi-port] \
[--list-devices] [input-dir]";

/// Parsed flags; `None` leaves the config file value alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub audio: Option<PathBuf>,
    pub file_format: Option<String>,
    /// First file number and optional exclusive last
    pub range: Option<(u64, Option<u64>)>,
    pub frame_rate: Option<u8>,
    pub thumb_size: Option<u16>,
    pub config: Option<PathBuf>,
    pub midi_port: Option<String>,
    pub list_devices: bool,
    pub version: bool,
    pub help: bool,
}

impl CliArgs {
    /// Parse everything after the program name
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut cli = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| anyhow!("option {} requires an argument", flag))
            };
            match arg.as_str() {
                "-h" | "-?" | "--help" => cli.help = true,
                "-v" | "--version" => cli.version = true,
                "--list-devices" => cli.list_devices = true,
                "-o" => cli.output_dir = Some(value("-o")?.into()),
                "-a" => cli.audio = Some(value("-a")?.into()),
                "-f" => cli.file_format = Some(value("-f")?),
                "-c" => cli.config = Some(value("-c")?.into()),
                "-m" => cli.midi_port = Some(value("-m")?),
                "-R" => cli.range = Some(parse_range(&value("-R")?)?),
                "-r" => {
                    let v = value("-r")?;
                    cli.frame_rate = Some(v.parse().with_context(|| format!("invalid frame rate '{}'", v))?);
                }
                "-s" => {
                    let v = value("-s")?;
                    cli.thumb_size = Some(v.parse().with_context(|| format!("invalid thumbnail size '{}'", v))?);
                }
                flag if flag.starts_with('-') && flag.len() > 1 => bail!("unknown option {}", flag),
                path => {
                    if cli.input_dir.is_some() {
                        bail!("unexpected argument {}", path);
                    }
                    cli.input_dir = Some(path.into());
                }
            }
        }
        Ok(cli)
    }
}

/// `first` or `first-last`
fn parse_range(s: &str) -> Result<(u64, Option<u64>)> {
    let (first, last) = match s.split_once('-') {
        Some((first, "")) => (first, None),
        Some((first, last)) => (first, Some(last)),
        None => (s, None),
    };
    let first = first
        .parse()
        .with_context(|| format!("invalid range '{}'", s))?;
    let last = last
        .map(|l| l.parse().with_context(|| format!("invalid range '{}'", s)))
        .transpose()?;
    Ok((first, last))
}
