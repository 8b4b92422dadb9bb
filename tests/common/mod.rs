// Shared fixtures for integration tests: a scripted sensor, a fixed clock,
// recording/failing collaborators and a polling helper.
#![allow(dead_code)]

use anyhow::{bail, Result};
use gps_recorder::{
    Clock, Event, EventNotifier, LocationBackend, LocationSource, RawSample, Recorder,
    RecorderConfig, RecorderError, ReverseGeocoder,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const WALL_NS: i64 = 1_700_000_000_000_000_000;
pub const MONO_NS: u64 = 500_000_000;
pub const OFFSET_NS: i64 = WALL_NS - MONO_NS as i64;

/// Clock frozen at `WALL_NS` / `MONO_NS`
pub struct FixedClock;

impl Clock for FixedClock {
    fn wall_clock_now_ns(&self) -> i64 {
        WALL_NS
    }

    fn monotonic_now_ns(&self) -> u64 {
        MONO_NS
    }
}

/// Raw sample `i` of a test track, one second apart
pub fn raw_sample(i: u64) -> RawSample {
    RawSample {
        monotonic_timestamp_ns: 1_000_000_000 + i * 1_000_000_000,
        latitude: 52.0 + i as f64 * 0.001,
        longitude: 13.0 + i as f64 * 0.002,
        altitude: 40.0,
        accuracy: 3.0,
        speed: 1.5,
        bearing: 90.0,
    }
}

/// Expected UTC timestamp of `raw_sample(i)` under `FixedClock`
pub fn expected_utc(i: u64) -> i64 {
    raw_sample(i).monotonic_timestamp_ns as i64 + OFFSET_NS
}

/// Test-side control of a `ScriptedBackend`
#[derive(Clone, Default)]
pub struct SensorHandle {
    tx: Arc<Mutex<Option<mpsc::Sender<RawSample>>>>,
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
}

impl SensorHandle {
    /// Deliver a reading; false when the sensor is not running
    pub fn emit(&self, sample: RawSample) -> bool {
        match self.tx.lock().unwrap().as_ref() {
            Some(tx) => tx.try_send(sample).is_ok(),
            None => false,
        }
    }

    pub fn emit_track(&self, count: u64) {
        for i in 0..count {
            assert!(self.emit(raw_sample(i)), "sensor should accept sample {}", i);
        }
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.tx.lock().unwrap().is_some()
    }
}

/// Sensor that emits whatever the test pushes through its `SensorHandle`
pub struct ScriptedBackend {
    handle: SensorHandle,
    permission_granted: bool,
}

impl ScriptedBackend {
    pub fn new(permission_granted: bool) -> (Self, SensorHandle) {
        let handle = SensorHandle::default();
        (
            Self {
                handle: handle.clone(),
                permission_granted,
            },
            handle,
        )
    }
}

#[async_trait::async_trait]
impl LocationBackend for ScriptedBackend {
    async fn start(&mut self) -> gps_recorder::Result<mpsc::Receiver<RawSample>> {
        if !self.permission_granted {
            return Err(RecorderError::PermissionDenied);
        }
        let (tx, rx) = mpsc::channel(1024);
        *self.handle.tx.lock().unwrap() = Some(tx);
        self.handle.starts.fetch_add(1, Ordering::SeqCst);
        Ok(rx)
    }

    async fn stop(&mut self) -> gps_recorder::Result<()> {
        self.handle.tx.lock().unwrap().take();
        self.handle.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.handle.is_running()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Location source backed by a scripted sensor
pub fn scripted_source(permission_granted: bool) -> (Arc<LocationSource>, SensorHandle) {
    let (backend, handle) = ScriptedBackend::new(permission_granted);
    (Arc::new(LocationSource::new(Box::new(backend), 64)), handle)
}

pub fn recorder_config(output_dir: &Path, chunk_size: usize) -> RecorderConfig {
    RecorderConfig {
        output_dir: output_dir.to_path_buf(),
        chunk_size,
        drain_timeout: Duration::from_secs(2),
        notify_timeout: Duration::from_millis(200),
        tick_interval: Duration::from_millis(20),
    }
}

/// Recorder over a scripted sensor and `FixedClock`
pub fn scripted_recorder(
    output_dir: &Path,
    chunk_size: usize,
    permission_granted: bool,
) -> (Arc<Recorder>, Arc<LocationSource>, SensorHandle) {
    let (source, handle) = scripted_source(permission_granted);
    let recorder = Recorder::new(
        recorder_config(output_dir, chunk_size),
        Arc::clone(&source),
        Arc::new(FixedClock),
    )
    .expect("valid recorder config");
    (Arc::new(recorder), source, handle)
}

/// Notifier that remembers every event name
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    names: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn names(&self) -> Vec<String> {
        self.names.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl EventNotifier for RecordingNotifier {
    async fn notify(&self, event: &Event) -> Result<()> {
        self.names.lock().unwrap().push(event.name.clone());
        Ok(())
    }
}

/// Notifier whose endpoint is always down
pub struct FailingNotifier;

#[async_trait::async_trait]
impl EventNotifier for FailingNotifier {
    async fn notify(&self, _event: &Event) -> Result<()> {
        bail!("connection refused")
    }
}

/// Geocoder answering every lookup with the same result
pub struct FixedGeocoder(pub gps_recorder::Result<Option<String>>);

#[async_trait::async_trait]
impl ReverseGeocoder for FixedGeocoder {
    async fn reverse_geocode(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> gps_recorder::Result<Option<String>> {
        match &self.0 {
            Ok(address) => Ok(address.clone()),
            Err(e) => Err(RecorderError::LookupFailure(e.to_string())),
        }
    }
}

/// Poll `condition` until it holds or `timeout` passes
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
