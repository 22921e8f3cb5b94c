//! Capture session: polling worker and bounded hand-off queue
//!
//! One worker thread per open session polls the transport with a bounded
//! timeout, runs received packets through the frame codec and publishes bus
//! frames into a bounded channel. The channel is the only shared mutable
//! resource and is used strictly single-producer/single-consumer: the worker
//! is the sole writer, the session owner the sole reader. Inserts block when
//! the queue is full — backpressure instead of silent frame loss.
//!
//! Cancellation is cooperative: [`CaptureSession::close`] clears the running
//! flag, which the worker observes within one polling interval (the read
//! timeout). Frames already queued stay consumable after close.

use crate::codec::{self, PacketEvent, SequenceCounter};
use crate::frame::RawFrame;
use crate::transport::{Transport, TransportError};
use crate::{MonitorError, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Capacity of the frame hand-off queue
pub const QUEUE_CAPACITY: usize = 40;

/// Polling read timeout: small enough that a stop request is observed
/// promptly, large enough to avoid busy-spinning
const READ_TIMEOUT: Duration = Duration::from_millis(200);

/// Timeout for the one-time flush of stale frames before capture starts
const FLUSH_TIMEOUT: Duration = Duration::from_millis(10);

/// One open analyzer session against a bridge
pub struct CaptureSession {
    transport: Arc<dyn Transport>,
    running: Arc<AtomicBool>,
    fatal: Arc<Mutex<Option<TransportError>>>,
    frames: Option<Receiver<RawFrame>>,
    worker: Option<JoinHandle<()>>,
    sequence: SequenceCounter,
    started: Instant,
}

impl CaptureSession {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            running: Arc::new(AtomicBool::new(false)),
            fatal: Arc::new(Mutex::new(None)),
            frames: None,
            worker: None,
            sequence: SequenceCounter::new(),
            started: Instant::now(),
        }
    }

    /// Start the capture worker
    ///
    /// Frames left over in the driver from prior activity are drained first
    /// by repeated short-timeout reads, so the stream starts clean.
    pub fn start_capture(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Err(MonitorError::AlreadyRunning);
        }

        loop {
            match self.transport.read(FLUSH_TIMEOUT) {
                Ok(data) if !data.is_empty() => {
                    debug!("Disregarding {} stale bytes from the bridge", data.len());
                }
                Ok(_) | Err(TransportError::Timeout) => break,
                Err(e) => return Err(e.into()),
            }
        }

        let (tx, rx) = bounded(QUEUE_CAPACITY);
        self.frames = Some(rx);
        self.running.store(true, Ordering::Relaxed);

        let transport = Arc::clone(&self.transport);
        let running = Arc::clone(&self.running);
        let fatal = Arc::clone(&self.fatal);
        let started = self.started;
        self.worker = Some(thread::spawn(move || {
            if let Err(e) = poll_loop(transport.as_ref(), &running, &tx, started) {
                error!("Capture worker terminated: {}", e);
                *fatal.lock().unwrap() = Some(e);
            }
            running.store(false, Ordering::Relaxed);
        }));

        debug!("Capture started");
        Ok(())
    }

    /// Whether the worker is still polling
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Take the next captured frame, blocking until one is available
    ///
    /// After the worker has terminated, frames already queued are still
    /// returned; once the queue is drained this reports the terminal
    /// transport failure, or [`MonitorError::CaptureStopped`] after a
    /// plain [`CaptureSession::close`].
    pub fn next_frame(&self) -> Result<RawFrame> {
        let frames = self.frames.as_ref().ok_or(MonitorError::CaptureStopped)?;
        match frames.recv() {
            Ok(frame) => Ok(frame),
            Err(_) => match self.fatal.lock().unwrap().take() {
                Some(e) => Err(e.into()),
                None => Err(MonitorError::CaptureStopped),
            },
        }
    }

    /// Discard every frame currently queued, without decoding
    pub fn drain_pending(&self) {
        if let Some(frames) = &self.frames {
            let mut discarded = 0usize;
            while frames.try_recv().is_ok() {
                discarded += 1;
            }
            if discarded > 0 {
                debug!("Drained {} pending frames", discarded);
            }
        }
    }

    /// Transmit a 1-3 byte command onto the bus, best effort
    ///
    /// Independent of the capture loop; the bridge echoes the transmission
    /// back and the worker logs (not queues) the echo.
    pub fn send(&mut self, cmd: &[u8]) -> Result<usize> {
        let packet = codec::encode_frame(cmd, self.sequence.next())?;
        Ok(self.transport.write(&packet)?)
    }

    /// Stop the worker and wait for it to exit
    ///
    /// Observed within one polling interval. Queued frames remain
    /// consumable via [`CaptureSession::next_frame`].
    pub fn close(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Capture worker panicked");
            }
            info!("Capture session closed");
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.close();
    }
}

fn poll_loop(
    transport: &dyn Transport,
    running: &AtomicBool,
    frames: &Sender<RawFrame>,
    started: Instant,
) -> std::result::Result<(), TransportError> {
    debug!("Capture worker started");
    while running.load(Ordering::Relaxed) {
        let data = match transport.read(READ_TIMEOUT) {
            Ok(data) => data,
            // Nothing arrived within the polling interval; not an error
            Err(TransportError::Timeout) => continue,
            Err(e) => return Err(e),
        };
        if data.is_empty() {
            continue;
        }

        let timestamp = started.elapsed().as_secs_f64();
        match codec::decode_packet(&data, timestamp) {
            PacketEvent::Frame(frame) => {
                // Blocking insert: waits for room rather than dropping
                if frames.send(frame).is_err() {
                    debug!("Frame queue closed, stopping worker");
                    break;
                }
            }
            PacketEvent::Echo { seq } => {
                debug!("Echo of transmission SN=0x{:02X}", seq);
            }
            PacketEvent::Unrecognized => {
                warn!("Unrecognized packet ({} bytes) dropped", data.len());
            }
        }
    }
    debug!("Capture worker stopped");
    Ok(())
}
