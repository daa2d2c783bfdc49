use crate::{AudioError, SampleBank, SamplePlayer};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Source};
use std::io::Cursor;
use tracing::{debug, info};

/// Plays samples on the default output device.
///
/// Each play decodes the in-memory sample and hands it to the mixer;
/// nothing is kept after the call returns.
pub struct RodioPlayer {
    // Dropping the stream stops all output.
    _stream: OutputStream,
    handle: OutputStreamHandle,
    bank: SampleBank,
}

impl RodioPlayer {
    pub fn open(bank: SampleBank) -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;
        info!(samples = bank.len(), "Audio output opened");
        Ok(Self {
            _stream: stream,
            handle,
            bank,
        })
    }
}

impl SamplePlayer for RodioPlayer {
    fn play(&mut self, name: &str) -> Result<(), AudioError> {
        let data = self.bank.get(name)?;
        let source = Decoder::new(Cursor::new(data)).map_err(|e| AudioError::Decode {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        self.handle
            .play_raw(source.convert_samples())
            .map_err(|e| AudioError::Playback(e.to_string()))?;
        debug!(sample = name, "Play");
        Ok(())
    }
}
