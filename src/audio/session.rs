//! Live capture/playback streams used purely for level metering.
//!
//! CPAL invokes the stream callbacks on its own real-time thread. The callbacks only
//! compute an RMS over the delivered buffer and hand it to the caller's closure, which
//! is expected to do a single atomic store.

use super::error::{AudioError, StreamKind};
use super::meter::{i16_to_unit, rms_by, u16_to_unit, Levels};
use crate::{log_event, LogSource};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    BuildStreamError, Device, SampleFormat, SampleRate, SizedSample, Stream, StreamConfig,
    SupportedStreamConfig, SupportedStreamConfigRange,
};

/// Rate requested from both devices when they support it.
const PREFERRED_RATE: u32 = 44_100;
const CAPTURE_CHANNELS: u16 = 1;
const PLAYBACK_CHANNELS: u16 = 2;

struct HostContext {
    host: cpal::Host,
    input: Device,
    output: Device,
}

/// Owns the host context and the two monitor streams.
///
/// Streams are released before the context in [`DeviceSession::close`], which also runs
/// on drop.
pub struct DeviceSession {
    context: Option<HostContext>,
    capture: Option<Stream>,
    playback: Option<Stream>,
}

impl DeviceSession {
    /// Acquire the default host and its default input/output devices.
    pub fn open() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let host_name = host.id().name();
        let input = host.default_input_device().ok_or_else(|| {
            AudioError::DriverInitFailed(format!("{host_name}: no default input device"))
        })?;
        let output = host.default_output_device().ok_or_else(|| {
            AudioError::DriverInitFailed(format!("{host_name}: no default output device"))
        })?;
        log_event(
            LogSource::Device,
            &format!(
                "opened host={host_name} input={} output={}",
                device_label(&input),
                device_label(&output)
            ),
        );
        Ok(Self {
            context: Some(HostContext {
                host,
                input,
                output,
            }),
            capture: None,
            playback: None,
        })
    }

    /// Open the session and start both streams, feeding `levels`.
    ///
    /// If playback fails to start, the already running capture stream is stopped before
    /// the error is returned.
    pub fn start(levels: &Levels) -> Result<Self, AudioError> {
        let mut session = Self::open()?;
        let input = levels.input.clone();
        session.start_capture(move |rms| input.store_rms(rms))?;
        let output = levels.output.clone();
        if let Err(err) = session.start_playback(move |rms| output.store_rms(rms)) {
            session.close();
            return Err(err);
        }
        Ok(session)
    }

    /// Start the microphone stream; `on_frames` receives the RMS of every buffer.
    pub fn start_capture<F>(&mut self, on_frames: F) -> Result<(), AudioError>
    where
        F: FnMut(f32) + Send + 'static,
    {
        let kind = StreamKind::Capture;
        if self.capture.is_some() {
            return Err(AudioError::stream(kind, "already running"));
        }
        let context = self.context.as_ref().ok_or_else(|| closed_error(kind))?;
        let device = &context.input;
        let fallback = device
            .default_input_config()
            .map_err(|err| AudioError::stream(kind, err))?;
        let supported = match device.supported_input_configs() {
            Ok(ranges) => preferred_config(ranges, CAPTURE_CHANNELS, fallback),
            Err(_) => fallback,
        };
        let format = supported.sample_format();
        let config: StreamConfig = supported.into();
        log_event(
            LogSource::Device,
            &format!(
                "capture config: format={format:?} rate={}Hz channels={}",
                config.sample_rate.0, config.channels
            ),
        );

        let stream = match format {
            SampleFormat::F32 => build_capture(device, &config, |s: f32| s, on_frames),
            SampleFormat::I16 => build_capture(device, &config, i16_to_unit, on_frames),
            SampleFormat::U16 => build_capture(device, &config, u16_to_unit, on_frames),
            other => {
                return Err(AudioError::stream(
                    kind,
                    format!("unsupported sample format: {other:?}"),
                ))
            }
        }
        .map_err(|err| AudioError::stream(kind, err))?;
        stream.play().map_err(|err| AudioError::stream(kind, err))?;
        self.capture = Some(stream);
        Ok(())
    }

    /// Start the speaker monitor. The buffer is measured, then overwritten with silence,
    /// so this stream never adds sound of its own.
    pub fn start_playback<F>(&mut self, on_frames: F) -> Result<(), AudioError>
    where
        F: FnMut(f32) + Send + 'static,
    {
        let kind = StreamKind::Playback;
        if self.playback.is_some() {
            return Err(AudioError::stream(kind, "already running"));
        }
        let context = self.context.as_ref().ok_or_else(|| closed_error(kind))?;
        let device = &context.output;
        let fallback = device
            .default_output_config()
            .map_err(|err| AudioError::stream(kind, err))?;
        let supported = match device.supported_output_configs() {
            Ok(ranges) => preferred_config(ranges, PLAYBACK_CHANNELS, fallback),
            Err(_) => fallback,
        };
        let format = supported.sample_format();
        let config: StreamConfig = supported.into();
        log_event(
            LogSource::Device,
            &format!(
                "playback config: format={format:?} rate={}Hz channels={}",
                config.sample_rate.0, config.channels
            ),
        );

        let stream = match format {
            SampleFormat::F32 => build_monitor(device, &config, |s: f32| s, 0.0, on_frames),
            SampleFormat::I16 => build_monitor(device, &config, i16_to_unit, 0, on_frames),
            SampleFormat::U16 => build_monitor(device, &config, u16_to_unit, 32_768, on_frames),
            other => {
                return Err(AudioError::stream(
                    kind,
                    format!("unsupported sample format: {other:?}"),
                ))
            }
        }
        .map_err(|err| AudioError::stream(kind, err))?;
        stream.play().map_err(|err| AudioError::stream(kind, err))?;
        self.playback = Some(stream);
        Ok(())
    }

    /// Stop playback, then capture, then drop the host. Later calls do nothing.
    pub fn close(&mut self) {
        let streams = [
            ("playback", self.playback.take()),
            ("capture", self.capture.take()),
        ];
        for (label, stream) in streams {
            if let Some(stream) = stream {
                if let Err(err) = stream.pause() {
                    let msg = format!("failed to pause {label} stream: {err}");
                    log_event(LogSource::Device, &msg);
                }
                drop(stream);
            }
        }
        if let Some(context) = self.context.take() {
            let msg = format!("released {} host", context.host.id().name());
            log_event(LogSource::Device, &msg);
        }
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Names of the input and output devices the default host exposes.
pub fn list_devices() -> Result<(Vec<String>, Vec<String>), AudioError> {
    let host = cpal::default_host();
    let inputs = host
        .input_devices()
        .map_err(|err| AudioError::DriverInitFailed(err.to_string()))?
        .filter_map(|device| device.name().ok())
        .collect();
    let outputs = host
        .output_devices()
        .map_err(|err| AudioError::DriverInitFailed(err.to_string()))?
        .filter_map(|device| device.name().ok())
        .collect();
    Ok((inputs, outputs))
}

fn closed_error(kind: StreamKind) -> AudioError {
    AudioError::stream(kind, "device session already closed")
}

fn device_label(device: &Device) -> String {
    device
        .name()
        .unwrap_or_else(|_| "unknown device".to_string())
}

/// 16-bit at 44.1 kHz with the wanted channel count if the device offers it.
fn preferred_config<I>(
    ranges: I,
    channels: u16,
    fallback: SupportedStreamConfig,
) -> SupportedStreamConfig
where
    I: Iterator<Item = SupportedStreamConfigRange>,
{
    ranges
        .filter(|range| range.channels() == channels && range.sample_format() == SampleFormat::I16)
        .find(|range| {
            range.min_sample_rate().0 <= PREFERRED_RATE
                && range.max_sample_rate().0 >= PREFERRED_RATE
        })
        .map(|range| range.with_sample_rate(SampleRate(PREFERRED_RATE)))
        .unwrap_or(fallback)
}

fn build_capture<T, F>(
    device: &Device,
    config: &StreamConfig,
    to_unit: fn(T) -> f32,
    mut on_frames: F,
) -> Result<Stream, BuildStreamError>
where
    T: SizedSample + Send + 'static,
    F: FnMut(f32) + Send + 'static,
{
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| on_frames(rms_by(data, to_unit)),
        |err| log_event(LogSource::Device, &format!("capture stream error: {err}")),
        None,
    )
}

fn build_monitor<T, F>(
    device: &Device,
    config: &StreamConfig,
    to_unit: fn(T) -> f32,
    silence: T,
    mut on_frames: F,
) -> Result<Stream, BuildStreamError>
where
    T: SizedSample + Send + 'static,
    F: FnMut(f32) + Send + 'static,
{
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            on_frames(monitor_frames(data, to_unit, silence))
        },
        |err| log_event(LogSource::Device, &format!("playback stream error: {err}")),
        None,
    )
}

/// Measure what the driver handed the playback stream, then overwrite it with silence.
fn monitor_frames<T: Copy>(data: &mut [T], to_unit: fn(T) -> f32, silence: T) -> f32 {
    let rms = rms_by(&*data, to_unit);
    data.fill(silence);
    rms
}
