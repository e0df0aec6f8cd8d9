use std::sync::Arc;

use flux_core::StreamState;

use super::RenderStream;

/// Capability to suspend and resume audio output.
pub trait PowerControl: Send + Sync {
    fn suspend(&self);
    fn resume(&self);
}

/// [`PowerControl`] over a render stream, gated on the stream's state so
/// the driver is not sent redundant requests. Refusals are logged and
/// dropped; nothing is retried.
pub struct StreamPower {
    stream: Arc<dyn RenderStream>,
}

impl StreamPower {
    pub fn new(stream: Arc<dyn RenderStream>) -> Self {
        Self { stream }
    }
}

impl PowerControl for StreamPower {
    fn suspend(&self) {
        let state = self.stream.state();
        if state != StreamState::Started {
            tracing::debug!(%state, "suspend skipped");
            return;
        }
        match self.stream.request_pause() {
            Ok(()) => tracing::info!("output suspended after stillness"),
            Err(err) => tracing::debug!(%err, "suspend refused"),
        }
    }

    fn resume(&self) {
        let state = self.stream.state();
        if !state.is_resumable() {
            tracing::debug!(%state, "resume skipped");
            return;
        }
        match self.stream.request_start() {
            Ok(()) => tracing::info!("output resumed on motion"),
            Err(err) => tracing::debug!(%err, "resume refused"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::atomic::AtomicCell;
    use flux_core::DeviceError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeStream {
        state: AtomicCell<StreamState>,
        starts: AtomicUsize,
        pauses: AtomicUsize,
        refuse: bool,
    }

    impl FakeStream {
        fn new(state: StreamState, refuse: bool) -> Arc<Self> {
            Arc::new(Self {
                state: AtomicCell::new(state),
                starts: AtomicUsize::new(0),
                pauses: AtomicUsize::new(0),
                refuse,
            })
        }
    }

    impl RenderStream for FakeStream {
        fn request_start(&self) -> Result<(), DeviceError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            if self.refuse {
                return Err(DeviceError::InvalidState(self.state.load()));
            }
            self.state.store(StreamState::Started);
            Ok(())
        }

        fn request_pause(&self) -> Result<(), DeviceError> {
            self.pauses.fetch_add(1, Ordering::SeqCst);
            if self.refuse {
                return Err(DeviceError::InvalidState(self.state.load()));
            }
            self.state.store(StreamState::Paused);
            Ok(())
        }

        fn close(&self) {
            self.state.store(StreamState::Closed);
        }

        fn state(&self) -> StreamState {
            self.state.load()
        }

        fn sample_rate(&self) -> u32 {
            48_000
        }

        fn channels(&self) -> u16 {
            1
        }
    }

    #[test]
    fn test_suspend_only_when_started() {
        let stream = FakeStream::new(StreamState::Started, false);
        let power = StreamPower::new(stream.clone());
        power.suspend();
        power.suspend();
        assert_eq!(stream.pauses.load(Ordering::SeqCst), 1);
        assert_eq!(stream.state(), StreamState::Paused);
    }

    #[test]
    fn test_resume_only_when_resumable() {
        let stream = FakeStream::new(StreamState::Started, false);
        let power = StreamPower::new(stream.clone());
        power.resume();
        assert_eq!(stream.starts.load(Ordering::SeqCst), 0);

        for state in [StreamState::Paused, StreamState::Pausing, StreamState::Stopped] {
            stream.state.store(state);
            power.resume();
        }
        assert_eq!(stream.starts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_closed_stream_is_left_alone() {
        let stream = FakeStream::new(StreamState::Closed, false);
        let power = StreamPower::new(stream.clone());
        power.suspend();
        power.resume();
        assert_eq!(stream.starts.load(Ordering::SeqCst), 0);
        assert_eq!(stream.pauses.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_refusal_is_swallowed() {
        let stream = FakeStream::new(StreamState::Started, true);
        let power = StreamPower::new(stream.clone());
        power.suspend();
        assert_eq!(stream.pauses.load(Ordering::SeqCst), 1);
        assert_eq!(stream.state(), StreamState::Started);
    }
}
