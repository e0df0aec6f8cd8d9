use std::sync::{Arc, Weak};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TrySendError};
use flux_core::{Acceleration, SensorError};

use super::{MotionSensor, SensorKind, SensorProvider};

/// Producer half: anything that can push acceleration readings, such as a
/// platform binding or a simulated motion generator.
#[derive(Clone)]
pub struct MotionFeed {
    tx: Sender<Acceleration>,
    /// Held by every clone; the provider watches it to tell whether a
    /// producer still exists.
    _alive: Arc<()>,
}

impl MotionFeed {
    /// Queue a reading. Returns `false` if the queue is full or every
    /// receiver is gone; the reading is dropped either way.
    pub fn push(&self, reading: Acceleration) -> bool {
        match self.tx.try_send(reading) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Hands out [`ChannelSensor`]s that all read from one feed.
pub struct ChannelSensorProvider {
    rx: Receiver<Acceleration>,
    feeds: Weak<()>,
}

impl ChannelSensorProvider {
    /// Create a feed and provider joined by a bounded queue of `capacity` readings.
    pub fn new(capacity: usize) -> (MotionFeed, Self) {
        let (tx, rx) = channel::bounded(capacity.max(1));
        let alive = Arc::new(());
        let feeds = Arc::downgrade(&alive);
        (MotionFeed { tx, _alive: alive }, Self { rx, feeds })
    }
}

impl SensorProvider for ChannelSensorProvider {
    fn default_sensor(&self, kind: SensorKind) -> Result<Box<dyn MotionSensor>, SensorError> {
        // Every feed is gone, so nothing can ever produce a reading.
        if self.feeds.strong_count() == 0 {
            return Err(SensorError::Unavailable);
        }
        match kind {
            SensorKind::LinearAcceleration => Ok(Box::new(ChannelSensor::new(self.rx.clone()))),
        }
    }
}

/// Sensor backed by a crossbeam channel. Readings that arrive while the
/// sensor is disabled are discarded.
pub struct ChannelSensor {
    rx: Receiver<Acceleration>,
    enabled: bool,
    rate_hint_micros: Option<u32>,
}

impl ChannelSensor {
    pub fn new(rx: Receiver<Acceleration>) -> Self {
        Self {
            rx,
            enabled: false,
            rate_hint_micros: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn rate_hint_micros(&self) -> Option<u32> {
        self.rate_hint_micros
    }
}

impl MotionSensor for ChannelSensor {
    fn enable(&mut self, rate_hint_micros: u32) -> Result<(), SensorError> {
        self.enabled = true;
        self.rate_hint_micros = Some(rate_hint_micros);
        Ok(())
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn poll(&mut self, timeout: Duration) -> Result<Option<Acceleration>, SensorError> {
        match self.rx.recv_timeout(timeout) {
            Ok(reading) if self.enabled => Ok(Some(reading)),
            Ok(_) => Ok(None),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(SensorError::Disconnected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_millis(10);

    #[test]
    fn test_enabled_sensor_delivers_readings() {
        let (feed, provider) = ChannelSensorProvider::new(8);
        let mut sensor = provider.default_sensor(SensorKind::LinearAcceleration).unwrap();
        sensor.enable(40_000).unwrap();

        assert!(feed.push(Acceleration::new(1.0, 0.0, 0.0)));
        assert_eq!(
            sensor.poll(WAIT).unwrap(),
            Some(Acceleration::new(1.0, 0.0, 0.0))
        );
        assert_eq!(sensor.poll(WAIT).unwrap(), None);
    }

    #[test]
    fn test_disabled_sensor_discards() {
        let (feed, provider) = ChannelSensorProvider::new(8);
        let mut sensor = ChannelSensor::new(provider.rx.clone());
        feed.push(Acceleration::new(1.0, 1.0, 1.0));
        assert_eq!(sensor.poll(WAIT).unwrap(), None);

        sensor.enable(20_000).unwrap();
        assert_eq!(sensor.rate_hint_micros(), Some(20_000));
        sensor.disable();
        assert!(!sensor.is_enabled());
    }

    #[test]
    fn test_dropped_feed_disconnects() {
        let (feed, provider) = ChannelSensorProvider::new(1);
        let mut sensor = provider.default_sensor(SensorKind::LinearAcceleration).unwrap();
        drop(feed);
        assert_eq!(sensor.poll(WAIT), Err(SensorError::Disconnected));
    }

    #[test]
    fn test_provider_without_feed_is_unavailable() {
        let (feed, provider) = ChannelSensorProvider::new(4);
        let second = feed.clone();
        drop(feed);
        assert!(provider.default_sensor(SensorKind::LinearAcceleration).is_ok());

        drop(second);
        assert_eq!(
            provider.default_sensor(SensorKind::LinearAcceleration).err(),
            Some(SensorError::Unavailable)
        );
    }

    #[test]
    fn test_full_queue_drops_reading() {
        let (feed, _provider) = ChannelSensorProvider::new(1);
        assert!(feed.push(Acceleration::default()));
        assert!(!feed.push(Acceleration::default()));
    }
}
