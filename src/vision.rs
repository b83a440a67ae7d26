//! Boundary with the hand-landmark vision service.
//!
//! A [`HandSource`] hands the engine one [`VisionFrame`] per loop iteration:
//! zero to two labelled detections in the MediaPipe 21-point hand layout,
//! normalised to `0..1`. The engine only needs a single strike position per
//! hand, derived from the knuckles by [`strike_position`].

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use serde::{Deserialize, Serialize};

use crate::geometry::{centroid, Point};
use crate::hits::HandSlot;

pub const INDEX_MCP: usize = 5;
pub const MIDDLE_MCP: usize = 9;
pub const RING_MCP: usize = 13;
pub const PINKY_MCP: usize = 17;
pub const HAND_LANDMARKS: usize = 21;

/// Knuckles averaged into the strike position
pub const FIST_LANDMARKS: [usize; 4] = [INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP];

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Handedness as reported by the vision engine ("Left" / "Right")
    pub label: String,
    /// Indexed by landmark id; `None` (or a short list) means not found
    #[serde(default)]
    pub landmarks: Vec<Option<Landmark>>,
}

impl Detection {
    pub fn slot(&self) -> Option<HandSlot> {
        match self.label.as_str() {
            "Right" => Some(HandSlot::Right),
            "Left" => Some(HandSlot::Left),
            _ => None,
        }
    }

    fn landmark(&self, idx: usize) -> Option<Landmark> {
        self.landmarks.get(idx).copied().flatten()
    }
}

/// One captured frame worth of detections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionFrame {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub hands: Vec<Detection>,
}

impl VisionFrame {
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            hands: Vec::new(),
        }
    }

    /// Strike positions per slot, in frame pixels. Detections with an unknown
    /// label are dropped and a later detection for a slot wins.
    pub fn strike_positions(&self) -> [Option<Point>; 2] {
        let mut out = [None, None];
        for det in self.hands.iter().take(2) {
            if let Some(slot) = det.slot() {
                if let Some(p) = strike_position(det, self.width, self.height) {
                    out[slot.index()] = Some(p);
                }
            }
        }
        out
    }
}

/// Centroid of the four MCP knuckles, or the middle knuckle alone when any
/// of them is missing.
pub fn strike_position(det: &Detection, width: u32, height: u32) -> Option<Point> {
    let to_px = |l: Landmark| Point::new(l.x * width as f64, l.y * height as f64);

    let knuckles: Option<Vec<Point>> = FIST_LANDMARKS
        .iter()
        .map(|&idx| det.landmark(idx).map(to_px))
        .collect();

    match knuckles {
        Some(points) => centroid(&points),
        None => det.landmark(MIDDLE_MCP).map(to_px),
    }
}

/// Anything that can supply per-frame hand detections.
pub trait HandSource {
    /// Next frame, or `None` when no new frame is available yet.
    fn read_frame(&mut self) -> Option<VisionFrame>;

    /// Pointer moved to normalised `(x, y)`; only simulated sources care.
    fn on_pointer(&mut self, _x: f64, _y: f64) {}

    /// True once the source can never produce another frame.
    fn is_exhausted(&self) -> bool {
        false
    }
}

impl<H: HandSource + ?Sized> HandSource for Box<H> {
    fn read_frame(&mut self) -> Option<VisionFrame> {
        (**self).read_frame()
    }

    fn on_pointer(&mut self, x: f64, y: f64) {
        (**self).on_pointer(x, y)
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }
}

/// Reads newline-delimited JSON frames produced by an external tracker
/// (file, FIFO or stdin) on a background thread.
///
/// Each line is a [`VisionFrame`]; `width`/`height` may be omitted, in which
/// case the configured frame size is used.
pub struct LandmarkStream {
    rx: Receiver<VisionFrame>,
    closed: bool,
}

#[derive(Deserialize)]
struct StreamLine {
    width: Option<u32>,
    height: Option<u32>,
    #[serde(default)]
    hands: Vec<Detection>,
}

impl LandmarkStream {
    pub fn spawn<R: BufRead + Send + 'static>(reader: R, width: u32, height: u32) -> Self {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            for line in reader.lines() {
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        tracing::error!("landmark stream read failed: {}", e);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                let frame = match serde_json::from_str::<StreamLine>(&line) {
                    Ok(l) => VisionFrame {
                        width: l.width.unwrap_or(width),
                        height: l.height.unwrap_or(height),
                        hands: l.hands,
                    },
                    Err(e) => {
                        tracing::warn!("skipping unparsable landmark frame: {}", e);
                        continue;
                    }
                };
                if tx.send(frame).is_err() {
                    break;
                }
            }
            tracing::info!("landmark stream ended");
        });

        Self { rx, closed: false }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl HandSource for LandmarkStream {
    /// Drains everything queued and keeps the newest frame, so a slow engine
    /// never falls behind the tracker.
    fn read_frame(&mut self) -> Option<VisionFrame> {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(frame) => latest = Some(frame),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
        latest
    }

    fn is_exhausted(&self) -> bool {
        self.closed
    }
}

/// Simulated tracker: the pointer is the right fist. Always produces a frame.
pub struct PointerHands {
    width: u32,
    height: u32,
    pointer: Option<Landmark>,
}

impl PointerHands {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pointer: None,
        }
    }
}

impl HandSource for PointerHands {
    fn read_frame(&mut self) -> Option<VisionFrame> {
        let mut frame = VisionFrame::empty(self.width, self.height);
        if let Some(p) = self.pointer {
            let mut landmarks = vec![None; HAND_LANDMARKS];
            for idx in FIST_LANDMARKS {
                landmarks[idx] = Some(p);
            }
            frame.hands.push(Detection {
                label: "Right".to_string(),
                landmarks,
            });
        }
        Some(frame)
    }

    fn on_pointer(&mut self, x: f64, y: f64) {
        self.pointer = Some(Landmark {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        });
    }
}
