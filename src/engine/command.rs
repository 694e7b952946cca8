use std::path::{Path, PathBuf};

use crate::config::Resolution;

/// What ffmpeg reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A single media file.
    File(PathBuf),
    /// A concat-demuxer manifest, resolved against the working directory.
    ConcatManifest(String),
}

/// A fully enumerated ffmpeg invocation.
///
/// Every flag is set through a typed method and the argument vector is handed
/// to the process directly, so clip file names never pass through a shell.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: Input,
    output: PathBuf,
    working_dir: Option<PathBuf>,
    filter: Option<String>,
    video_codec: Option<String>,
    preset: Option<String>,
    audio_codec: Option<String>,
    bitstream_filter: Option<String>,
    format: Option<String>,
    stream_copy: bool,
    overwrite: bool,
    log_level: String,
}

impl FfmpegCommand {
    fn new(input: Input, output: impl AsRef<Path>) -> Self {
        Self {
            input,
            output: output.as_ref().to_path_buf(),
            working_dir: None,
            filter: None,
            video_codec: None,
            preset: None,
            audio_codec: None,
            bitstream_filter: None,
            format: None,
            stream_copy: false,
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Re-encode a single input file.
    pub fn transcode(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self::new(Input::File(input.as_ref().to_path_buf()), output)
    }

    /// Concatenate the members listed in `manifest` (a bare file name).
    pub fn concat(manifest: impl Into<String>, output: impl AsRef<Path>) -> Self {
        Self::new(Input::ConcatManifest(manifest.into()), output)
    }

    pub fn working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Fit inside `target` without cropping, then letterbox to exactly `target`
    /// with square pixels.
    pub fn scale_and_pad(mut self, target: Resolution) -> Self {
        let Resolution { width, height } = target;
        self.filter = Some(format!(
            "scale={width}:{height}:force_original_aspect_ratio=decrease,\
             pad={width}:{height}:(ow-iw)/2:(oh-ih)/2,setsar=1"
        ));
        self
    }

    pub fn video_codec(mut self, codec: impl Into<String>) -> Self {
        self.video_codec = Some(codec.into());
        self
    }

    pub fn preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = Some(preset.into());
        self
    }

    pub fn audio_codec(mut self, codec: impl Into<String>) -> Self {
        self.audio_codec = Some(codec.into());
        self
    }

    pub fn bitstream_filter(mut self, bsf: impl Into<String>) -> Self {
        self.bitstream_filter = Some(bsf.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Copy the encoded streams instead of re-encoding. Overrides codec settings.
    pub fn stream_copy(mut self) -> Self {
        self.stream_copy = true;
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn current_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn is_stream_copy(&self) -> bool {
        self.stream_copy
    }

    /// Build the argument list, excluding the program name.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }
        args.push("-v".to_string());
        args.push(self.log_level.clone());

        match &self.input {
            Input::File(path) => {
                args.push("-i".to_string());
                args.push(path.to_string_lossy().into_owned());
            }
            Input::ConcatManifest(name) => {
                args.extend(["-f", "concat", "-safe", "0", "-i"].map(String::from));
                args.push(name.clone());
            }
        }

        if let Some(filter) = &self.filter {
            args.push("-vf".to_string());
            args.push(filter.clone());
        }

        if self.stream_copy {
            args.push("-c".to_string());
            args.push("copy".to_string());
        } else {
            if let Some(codec) = &self.video_codec {
                args.push("-c:v".to_string());
                args.push(codec.clone());
            }
            if let Some(preset) = &self.preset {
                args.push("-preset".to_string());
                args.push(preset.clone());
            }
            if let Some(codec) = &self.audio_codec {
                args.push("-c:a".to_string());
                args.push(codec.clone());
            }
        }

        if let Some(bsf) = &self.bitstream_filter {
            args.push("-bsf:v".to_string());
            args.push(bsf.clone());
        }
        if let Some(format) = &self.format {
            args.push("-f".to_string());
            args.push(format.clone());
        }

        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}
