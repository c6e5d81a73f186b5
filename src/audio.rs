/*! Audio collaborators

Decoding and cropping audio is delegated to `ffprobe` and `ffmpeg`.
The rest of the crate only sees the [DurationProbe] and [Cropper] traits,
so that tests (and other front ends) can plug their own.
!*/
use std::path::Path;
use std::process::{Command, Output};

use log::debug;
use serde::Deserialize;

use crate::error::Error;

/// Length of an audio file, in seconds.
pub trait DurationProbe {
    fn duration(&self, path: &Path) -> Result<f64, Error>;
}

impl<F> DurationProbe for F
where
    F: Fn(&Path) -> Result<f64, Error>,
{
    fn duration(&self, path: &Path) -> Result<f64, Error> {
        self(path)
    }
}

/// Writes the `[offset, offset + duration)` window of `src` into `dst`.
pub trait Cropper {
    fn crop(&self, src: &Path, offset: u32, duration: u32, dst: &Path) -> Result<(), Error>;
}

/// ffprobe json output (`-print_format json -show_format`). Only the duration is used.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

fn read_error(path: &Path, reason: impl Into<String>) -> Error {
    Error::ResourceRead {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// run a command, turning spawn failures and non-zero exits into read errors on `path`.
fn run(mut command: Command, path: &Path) -> Result<Output, Error> {
    debug!("running {:?}", command);
    let output = command
        .output()
        .map_err(|e| read_error(path, format!("could not run {:?}: {}", command.get_program(), e)))?;

    if !output.status.success() {
        return Err(read_error(
            path,
            format!(
                "{:?} exited with {:?}: {}",
                command.get_program(),
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ));
    }

    Ok(output)
}

/// Parse the duration out of ffprobe's json output.
fn parse_ffprobe(path: &Path, stdout: &[u8]) -> Result<f64, Error> {
    let output: FfprobeOutput = serde_json::from_slice(stdout)
        .map_err(|e| read_error(path, format!("invalid ffprobe output: {}", e)))?;

    output
        .format
        .duration
        .ok_or_else(|| read_error(path, "ffprobe reported no duration"))?
        .parse::<f64>()
        .map_err(|e| read_error(path, format!("invalid duration: {}", e)))
}

/// [DurationProbe] backed by the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct Ffprobe {
    binary: String,
}

impl Default for Ffprobe {
    fn default() -> Self {
        Self {
            binary: "ffprobe".to_string(),
        }
    }
}

impl Ffprobe {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }
}

impl DurationProbe for Ffprobe {
    fn duration(&self, path: &Path) -> Result<f64, Error> {
        if !path.exists() {
            return Err(read_error(path, "audio file not found"));
        }

        let mut command = Command::new(&self.binary);
        command
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(path);
        let output = run(command, path)?;
        parse_ffprobe(path, &output.stdout)
    }
}

/// [Cropper] backed by the `ffmpeg` binary. Clips are re-encoded to mp3.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    binary: String,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
        }
    }
}

impl Ffmpeg {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }
}

impl Cropper for Ffmpeg {
    fn crop(&self, src: &Path, offset: u32, duration: u32, dst: &Path) -> Result<(), Error> {
        let mut command = Command::new(&self.binary);
        command
            .args(["-nostdin", "-loglevel", "error", "-y"])
            .args(["-ss", &offset.to_string(), "-t", &duration.to_string()])
            .arg("-i")
            .arg(src)
            .args(["-c:a", "libmp3lame"])
            .arg(dst);
        run(command, src)?;
        Ok(())
    }
}
