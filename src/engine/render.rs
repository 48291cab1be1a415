//! Score rendering capability
//!
//! MIDI-to-waveform synthesis lives outside the effects core. Callers inject a
//! [`ScoreRenderer`]; the stock implementation shells out to FluidSynth and
//! reads back the WAV it writes.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::engine::buffer::AudioBuffer;
use crate::engine::io::import_wav;
use crate::error::{FxError, Result};

/// Default General MIDI soundfont shipped by most Linux distributions
pub const DEFAULT_SOUNDFONT: &str = "/usr/share/sounds/sf2/FluidR3_GM.sf2";

/// Default render sample rate in Hz
pub const DEFAULT_RENDER_SAMPLE_RATE: u32 = 44100;

/// Renders a score file into an audio buffer
pub trait ScoreRenderer {
    /// Render `score` and return the synthesized mono buffer
    fn render(&self, score: &Path) -> Result<AudioBuffer>;
}

/// Renderer backed by the `fluidsynth` command-line synthesizer
#[derive(Debug, Clone)]
pub struct FluidSynthRenderer {
    binary: PathBuf,
    soundfont: PathBuf,
    sample_rate: u32,
    work_dir: PathBuf,
}

impl FluidSynthRenderer {
    /// Create a renderer using `fluidsynth` from `PATH` and the default soundfont
    ///
    /// Intermediate WAV files are written into `work_dir`.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: PathBuf::from("fluidsynth"),
            soundfont: PathBuf::from(DEFAULT_SOUNDFONT),
            sample_rate: DEFAULT_RENDER_SAMPLE_RATE,
            work_dir: work_dir.into(),
        }
    }

    /// Use a specific synthesizer executable
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Use a specific soundfont
    pub fn with_soundfont(mut self, soundfont: impl Into<PathBuf>) -> Self {
        self.soundfont = soundfont.into();
        self
    }

    /// Render at the given sample rate
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Sample rate the synthesizer is asked to render at
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Where the intermediate WAV for `score` is written
    fn output_path(&self, score: &Path) -> PathBuf {
        let stem = score
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "score".to_string());
        self.work_dir.join(format!("{}.wav", stem))
    }

    /// Build the synthesizer invocation
    fn command(&self, score: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-ni")
            .arg(&self.soundfont)
            .arg(score)
            .arg("-F")
            .arg(output)
            .arg("-r")
            .arg(self.sample_rate.to_string());
        cmd
    }
}

impl ScoreRenderer for FluidSynthRenderer {
    fn render(&self, score: &Path) -> Result<AudioBuffer> {
        if !score.exists() {
            return Err(FxError::Render {
                details: format!("score not found: {}", score.display()),
            });
        }

        std::fs::create_dir_all(&self.work_dir)?;
        let output = self.output_path(score);

        tracing::info!(
            score = %score.display(),
            output = %output.display(),
            sample_rate = self.sample_rate,
            "rendering score"
        );

        let status = self
            .command(score, &output)
            .status()
            .map_err(|e| FxError::Render {
                details: format!("failed to launch {}: {}", self.binary.display(), e),
            })?;

        if !status.success() {
            return Err(FxError::Render {
                details: format!("{} exited with {}", self.binary.display(), status),
            });
        }

        if !output.exists() {
            return Err(FxError::Render {
                details: format!("synthesizer produced no output at {}", output.display()),
            });
        }

        import_wav(&output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_arguments() {
        let renderer = FluidSynthRenderer::new("/tmp/work")
            .with_soundfont("/sf/piano.sf2")
            .with_sample_rate(22050);
        let cmd = renderer.command(Path::new("song.mid"), Path::new("/tmp/work/song.wav"));

        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(cmd.get_program(), "fluidsynth");
        assert_eq!(
            args,
            vec!["-ni", "/sf/piano.sf2", "song.mid", "-F", "/tmp/work/song.wav", "-r", "22050"]
        );
    }

    #[test]
    fn test_output_path_uses_score_stem() {
        let renderer = FluidSynthRenderer::new("/tmp/work");
        assert_eq!(
            renderer.output_path(Path::new("/music/melody_1234.mid")),
            PathBuf::from("/tmp/work/melody_1234.wav")
        );
    }

    #[test]
    fn test_missing_score_is_render_error() {
        let renderer = FluidSynthRenderer::new(std::env::temp_dir());
        let result = renderer.render(Path::new("/nonexistent/score.mid"));
        assert!(matches!(result, Err(FxError::Render { .. })));
    }

    #[test]
    fn test_missing_binary_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let score = dir.path().join("score.mid");
        std::fs::write(&score, b"MThd").unwrap();

        let renderer = FluidSynthRenderer::new(dir.path())
            .with_binary("/nonexistent/bin/fluidsynth-missing");
        let result = renderer.render(&score);
        assert!(matches!(result, Err(FxError::Render { .. })));
    }
}
