//! Symphonia Audio Validator - 基于 symphonia 的上传音频校验器
//!
//! 流程：
//! - 扩展名白名单
//! - 原始字节写入 staging 临时文件（作用域结束即删除）
//! - symphonia 探测后逐 packet 解码
//! - 每个 packet 下混单声道、线性重采样后直接写入 16-bit PCM WAV，同时累计时长

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{
    AudioValidatorPort, NormalizedAudio, RawUpload, ValidationError,
};
use crate::domain::voice::AudioFormat;

/// 校验器配置
#[derive(Debug, Clone)]
pub struct AudioValidatorConfig {
    /// staging 目录（私有，仅本进程使用）
    pub staging_dir: PathBuf,
    /// 允许的上传格式
    pub allowed_formats: Vec<AudioFormat>,
    /// 最短时长
    pub min_duration: Duration,
    /// 规范存储采样率
    pub sample_rate: u32,
}

impl Default for AudioValidatorConfig {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from("data/staging"),
            allowed_formats: vec![AudioFormat::Mp3, AudioFormat::Wav],
            min_duration: Duration::from_secs(30),
            sample_rate: 22050,
        }
    }
}

/// 规范化输出及源音频参数
#[derive(Debug)]
struct Transcoded {
    path: tempfile::TempPath,
    /// 源音频帧数
    frames: u64,
    sample_rate: u32,
    channels: usize,
}

impl Transcoded {
    fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames as f64 / self.sample_rate as f64)
    }
}

type CanonicalWriter = hound::WavWriter<std::io::BufWriter<File>>;

/// Symphonia 校验器
pub struct SymphoniaAudioValidator {
    config: AudioValidatorConfig,
}

impl SymphoniaAudioValidator {
    pub fn new(config: AudioValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AudioValidatorConfig {
        &self.config
    }

    fn check_format(&self, file_name: &str) -> Result<AudioFormat, ValidationError> {
        let format = AudioFormat::from_file_name(file_name)
            .map_err(|_| ValidationError::UnsupportedFormat(file_name.to_string()))?;
        if !self.config.allowed_formats.contains(&format) {
            let allowed: Vec<&str> = self
                .config
                .allowed_formats
                .iter()
                .map(|f| f.extension())
                .collect();
            return Err(ValidationError::UnsupportedFormat(format!(
                "{} (allowed: {})",
                format,
                allowed.join(", ")
            )));
        }
        Ok(format)
    }

    fn stage_raw(
        &self,
        bytes: &[u8],
        format: AudioFormat,
    ) -> Result<tempfile::NamedTempFile, ValidationError> {
        std::fs::create_dir_all(&self.config.staging_dir)
            .map_err(|e| ValidationError::Staging(format!("create staging dir: {}", e)))?;

        let mut staged = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&format!(".{}", format.extension()))
            .tempfile_in(&self.config.staging_dir)
            .map_err(|e| ValidationError::Staging(format!("create staging file: {}", e)))?;
        staged
            .write_all(bytes)
            .and_then(|_| staged.flush())
            .map_err(|e| ValidationError::Staging(format!("write staging file: {}", e)))?;
        Ok(staged)
    }

    /// 逐 packet 解码，下混、重采样后直接写入规范 WAV
    ///
    /// 内存占用与单个 packet 相当，与上传时长无关
    fn transcode(&self, path: &Path, format: AudioFormat) -> Result<Transcoded, ValidationError> {
        let file = File::open(path)
            .map_err(|e| ValidationError::Staging(format!("open staging file: {}", e)))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        hint.with_extension(format.extension());

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| {
                ValidationError::UnsupportedFormat(format!(
                    "content is not valid {} audio: {}",
                    format, e
                ))
            })?;
        let mut reader = probed.format;

        let track = reader
            .default_track()
            .ok_or_else(|| ValidationError::Corrupt("no audio track found".to_string()))?;
        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
        let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| ValidationError::UnsupportedFormat(format!("no decoder: {}", e)))?;

        let target = tempfile::Builder::new()
            .prefix("normalized-")
            .suffix(".wav")
            .tempfile_in(&self.config.staging_dir)
            .map_err(|e| ValidationError::Staging(format!("create output file: {}", e)))?
            .into_temp_path();
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.config.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&target, spec)
            .map_err(|e| ValidationError::Staging(format!("open wav writer: {}", e)))?;

        let mut resampler: Option<LinearResampler> = None;
        let mut frames: u64 = 0;
        let mut mono = Vec::new();
        let mut resampled = Vec::new();

        loop {
            let packet = match reader.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => {
                    return Err(ValidationError::Corrupt(format!("packet read error: {}", e)));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(e)) => {
                    tracing::warn!(error = %e, "Decode error (skipping packet)");
                    continue;
                }
                Err(e) => {
                    return Err(ValidationError::Corrupt(format!("decode failed: {}", e)));
                }
            };

            let spec = *decoded.spec();
            if sample_rate == 0 {
                sample_rate = spec.rate;
            }
            if channels == 0 {
                channels = spec.channels.count();
            }
            let num_frames = decoded.frames();
            if num_frames == 0 || sample_rate == 0 {
                continue;
            }

            let packet_channels = spec.channels.count();
            let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            let actual_samples = num_frames * packet_channels;
            downmix_into(&sample_buf.samples()[..actual_samples], packet_channels, &mut mono);

            let target_rate = self.config.sample_rate;
            let stream =
                resampler.get_or_insert_with(|| LinearResampler::new(sample_rate, target_rate));
            resampled.clear();
            stream.process(&mono, &mut resampled);
            write_samples(&mut writer, &resampled)?;
            frames += num_frames as u64;
        }

        if let Some(stream) = resampler.as_mut() {
            resampled.clear();
            stream.finish(&mut resampled);
            write_samples(&mut writer, &resampled)?;
        }
        writer
            .finalize()
            .map_err(|e| ValidationError::Staging(format!("finalize wav: {}", e)))?;

        Ok(Transcoded {
            path: target,
            frames,
            sample_rate,
            channels,
        })
    }
}

impl AudioValidatorPort for SymphoniaAudioValidator {
    fn validate_and_normalize(&self, upload: RawUpload) -> Result<NormalizedAudio, ValidationError> {
        let format = self.check_format(&upload.file_name)?;
        if upload.bytes.is_empty() {
            return Err(ValidationError::Empty);
        }

        // staged 在本函数返回时被删除（包括所有错误路径）
        let staged = self.stage_raw(&upload.bytes, format)?;
        drop(upload);

        let transcoded = self.transcode(staged.path(), format)?;
        if transcoded.frames == 0 || transcoded.sample_rate == 0 {
            return Err(ValidationError::Corrupt("no audio samples decoded".to_string()));
        }

        let duration = transcoded.duration();
        if duration < self.config.min_duration {
            return Err(ValidationError::TooShort {
                actual_secs: duration.as_secs_f64(),
                minimum_secs: self.config.min_duration.as_secs(),
            });
        }

        tracing::debug!(
            format = %format,
            duration_secs = duration.as_secs_f64(),
            source_rate = transcoded.sample_rate,
            source_channels = transcoded.channels,
            "Upload validated and normalized"
        );

        Ok(NormalizedAudio::new(
            transcoded.path,
            duration,
            self.config.sample_rate,
        ))
    }
}

fn write_samples(writer: &mut CanonicalWriter, samples: &[f32]) -> Result<(), ValidationError> {
    for &s in samples {
        let clamped = s.clamp(-1.0, 1.0);
        writer
            .write_sample((clamped * i16::MAX as f32) as i16)
            .map_err(|e| ValidationError::Staging(format!("write sample: {}", e)))?;
    }
    Ok(())
}

/// 多声道平均下混为单声道
fn downmix_into(samples: &[f32], channels: usize, out: &mut Vec<f32>) {
    out.clear();
    if channels <= 1 {
        out.extend_from_slice(samples);
        return;
    }
    out.extend(
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32),
    );
}

/// 流式线性重采样（单声道），相位跨 packet 连续
///
/// 总输出长度为 `floor(输入长度 * to / from)`，末尾不足插值的部分用最后一个样本补齐
#[derive(Debug)]
struct LinearResampler {
    /// 每个输出样本对应的源样本步长
    step: f64,
    ratio: f64,
    /// 下一个输出样本在源序列中的位置
    next_pos: f64,
    consumed: u64,
    emitted: u64,
    last: f32,
}

impl LinearResampler {
    fn new(from_rate: u32, to_rate: u32) -> Self {
        Self {
            step: from_rate as f64 / to_rate as f64,
            ratio: to_rate as f64 / from_rate as f64,
            next_pos: 0.0,
            consumed: 0,
            emitted: 0,
            last: 0.0,
        }
    }

    fn process(&mut self, input: &[f32], out: &mut Vec<f32>) {
        let Some(&tail) = input.last() else {
            return;
        };
        let start = self.consumed;
        let end = start + input.len() as u64;
        let prev = self.last;
        // 上一批只可能留下最后一个样本
        let at = |g: u64| {
            if g < start {
                prev
            } else {
                input[(g - start) as usize]
            }
        };

        loop {
            let idx = self.next_pos as u64;
            if idx + 1 >= end {
                break;
            }
            let frac = (self.next_pos - idx as f64) as f32;
            let s0 = at(idx);
            let s1 = at(idx + 1);
            out.push(s0 + (s1 - s0) * frac);
            self.emitted += 1;
            self.next_pos = self.emitted as f64 * self.step;
        }

        self.consumed = end;
        self.last = tail;
    }

    fn finish(&mut self, out: &mut Vec<f32>) {
        let total = (self.consumed as f64 * self.ratio) as u64;
        while self.emitted < total {
            out.push(self.last);
            self.emitted += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sine_wav;
    use tempfile::tempdir;

    fn validator(staging: &Path, min_secs: u64) -> SymphoniaAudioValidator {
        SymphoniaAudioValidator::new(AudioValidatorConfig {
            staging_dir: staging.to_path_buf(),
            allowed_formats: vec![AudioFormat::Mp3, AudioFormat::Wav],
            min_duration: Duration::from_secs(min_secs),
            sample_rate: 16000,
        })
    }

    fn staging_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(true)
    }

    #[test]
    fn test_accepts_and_normalizes_stereo_wav() {
        let dir = tempdir().unwrap();
        let v = validator(dir.path(), 2);
        let upload = RawUpload {
            file_name: "clip.wav".to_string(),
            bytes: sine_wav(3.0, 8000, 2, 440.0),
        };

        let normalized = v.validate_and_normalize(upload).unwrap();
        assert!(normalized.duration() >= Duration::from_millis(2990));
        assert_eq!(normalized.sample_rate(), 16000);

        let reader = hound::WavReader::open(normalized.path()).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.bits_per_sample, 16);
        // 3s @ 16kHz
        assert!((reader.duration() as i64 - 48000).abs() < 10);

        // 只剩下规范化后的输出文件
        let path = normalized.path().to_path_buf();
        drop(normalized);
        assert!(!path.exists());
        assert!(staging_is_empty(dir.path()));
    }

    #[test]
    fn test_rejects_too_short_and_cleans_staging() {
        let dir = tempdir().unwrap();
        let v = validator(dir.path(), 30);
        let upload = RawUpload {
            file_name: "short.wav".to_string(),
            bytes: sine_wav(2.0, 8000, 1, 440.0),
        };

        let err = v.validate_and_normalize(upload).unwrap_err();
        match err {
            ValidationError::TooShort {
                actual_secs,
                minimum_secs,
            } => {
                assert!((actual_secs - 2.0).abs() < 0.05);
                assert_eq!(minimum_secs, 30);
            }
            other => panic!("expected TooShort, got {other:?}"),
        }
        assert!(staging_is_empty(dir.path()));
    }

    #[test]
    fn test_rejects_disallowed_extension() {
        let dir = tempdir().unwrap();
        let v = validator(dir.path(), 1);
        let upload = RawUpload {
            file_name: "clip.flac".to_string(),
            bytes: vec![1, 2, 3],
        };
        assert!(matches!(
            v.validate_and_normalize(upload),
            Err(ValidationError::UnsupportedFormat(_))
        ));

        let upload = RawUpload {
            file_name: "notes.txt".to_string(),
            bytes: vec![1, 2, 3],
        };
        assert!(matches!(
            v.validate_and_normalize(upload),
            Err(ValidationError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_rejects_garbage_content_and_cleans_staging() {
        let dir = tempdir().unwrap();
        let v = validator(dir.path(), 1);
        let upload = RawUpload {
            file_name: "fake.wav".to_string(),
            bytes: b"definitely not a riff file".to_vec(),
        };
        assert!(v.validate_and_normalize(upload).is_err());
        assert!(staging_is_empty(dir.path()));
    }

    #[test]
    fn test_rejects_empty_upload() {
        let dir = tempdir().unwrap();
        let v = validator(dir.path(), 1);
        let upload = RawUpload {
            file_name: "empty.mp3".to_string(),
            bytes: Vec::new(),
        };
        assert!(matches!(
            v.validate_and_normalize(upload),
            Err(ValidationError::Empty)
        ));
    }

    fn resample_chunks(chunks: &[&[f32]], from: u32, to: u32) -> Vec<f32> {
        let mut stream = LinearResampler::new(from, to);
        let mut out = Vec::new();
        for chunk in chunks {
            stream.process(chunk, &mut out);
        }
        stream.finish(&mut out);
        out
    }

    #[test]
    fn test_downmix() {
        let mut mono = Vec::new();
        downmix_into(&[1.0, 0.0, 0.5, 0.5], 2, &mut mono);
        assert_eq!(mono, vec![0.5, 0.5]);

        downmix_into(&[0.25], 1, &mut mono);
        assert_eq!(mono, vec![0.25]);
    }

    #[test]
    fn test_resample_lengths_and_interpolation() {
        let mono: Vec<f32> = (0..100).map(|i| i as f32).collect();

        let up = resample_chunks(&[&mono], 100, 200);
        assert_eq!(up.len(), 200);
        assert_eq!(up[0], 0.0);
        assert!((up[1] - 0.5).abs() < 1e-6);
        assert_eq!(up[199], 99.0);

        let down = resample_chunks(&[&mono], 200, 100);
        assert_eq!(down.len(), 50);
        assert_eq!(down[1], 2.0);

        let same = resample_chunks(&[&mono], 8000, 8000);
        assert_eq!(same, mono);
    }

    #[test]
    fn test_resample_is_continuous_across_chunks() {
        let mono: Vec<f32> = (0..1000).map(|i| (i as f32 * 0.01).sin()).collect();
        let whole = resample_chunks(&[&mono], 44100, 22050);

        let chunks: Vec<&[f32]> = mono.chunks(37).collect();
        let split = resample_chunks(&chunks, 44100, 22050);
        assert_eq!(whole.len(), split.len());
        for (a, b) in whole.iter().zip(&split) {
            assert!((a - b).abs() < 1e-6);
        }

        let chunks: Vec<&[f32]> = mono.chunks(1).collect();
        let upsampled = resample_chunks(&chunks, 8000, 22050);
        assert_eq!(upsampled.len(), resample_chunks(&[&mono], 8000, 22050).len());
    }
}
