//! Live threshold adjustment for line detection.
//!
//! A control emits [`TunerEvent`]s; the tuner waits on an [`EventSource`],
//! recomputes edges and segments for every change and redraws both maps
//! before waiting again. Everything runs on the calling thread.

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, Sender};

use image::{DynamicImage, GrayImage};
use log::{info, warn};

use crate::detection::LineDetector;
use crate::display::{Display, Frame, draw_lines};
use crate::error::{DetectError, Result};
use crate::models::ThresholdState;
use crate::pipeline::DetectionPipeline;

pub const EDGE_WINDOW: &str = "Edge Map";
pub const LINE_WINDOW: &str = "Line Map";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunerEvent {
    ThresholdChanged(i32),
    Dismiss,
}

/// Blocking wait for the next user event.
pub trait EventSource {
    fn wait_event(&mut self) -> Result<TunerEvent>;
}

/// Slider-like handle: every value set is clamped and queued as an event.
#[derive(Debug, Clone)]
pub struct ThresholdControl {
    sender: Sender<TunerEvent>,
    max: i32,
}

impl ThresholdControl {
    pub fn set(&self, value: i32) -> Result<()> {
        let clamped = value.clamp(0, self.max.max(0));
        if clamped != value {
            warn!("Threshold {} outside [0, {}], using {}", value, self.max, clamped);
        }
        self.send(TunerEvent::ThresholdChanged(clamped))
    }

    pub fn dismiss(&self) -> Result<()> {
        self.send(TunerEvent::Dismiss)
    }

    fn send(&self, event: TunerEvent) -> Result<()> {
        self.sender
            .send(event)
            .map_err(|e| DetectError::Event(format!("tuner is gone: {}", e)))
    }
}

/// Receiving end of a [`ThresholdControl`].
pub struct ChannelEvents {
    receiver: Receiver<TunerEvent>,
}

impl EventSource for ChannelEvents {
    fn wait_event(&mut self) -> Result<TunerEvent> {
        // every control dropped: nothing can change any more
        Ok(self.receiver.recv().unwrap_or(TunerEvent::Dismiss))
    }
}

/// Create a control bound to `[0, max]` and the event queue it feeds.
pub fn adjustable_control(max: i32) -> (ThresholdControl, ChannelEvents) {
    let (sender, receiver) = mpsc::channel();
    (ThresholdControl { sender, max }, ChannelEvents { receiver })
}

/// Reads one threshold per line; `q`, `quit` or end of input dismisses.
pub struct ConsoleEvents<R> {
    reader: R,
    max: i32,
}

impl<R: BufRead> ConsoleEvents<R> {
    pub fn new(reader: R, max: i32) -> Self {
        Self { reader, max }
    }
}

impl<R: BufRead> EventSource for ConsoleEvents<R> {
    fn wait_event(&mut self) -> Result<TunerEvent> {
        loop {
            let mut line = String::new();
            let read = self
                .reader
                .read_line(&mut line)
                .map_err(|e| DetectError::Event(e.to_string()))?;
            if read == 0 {
                return Ok(TunerEvent::Dismiss);
            }
            let input = line.trim();
            match input {
                "" => continue,
                "q" | "quit" => return Ok(TunerEvent::Dismiss),
                _ => match input.parse::<i32>() {
                    Ok(value) => return Ok(TunerEvent::ThresholdChanged(value.clamp(0, self.max.max(0)))),
                    Err(_) => warn!("Ignoring input {:?}: expected a threshold in [0, {}] or q", input, self.max),
                },
            }
        }
    }
}

/// What a finished session left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TuningSummary {
    /// Edge/line map pairs drawn, the initial one included.
    pub renders: usize,
    pub threshold: i32,
    pub line_count: usize,
}

/// Drives the edge/line maps from a threshold control.
#[derive(Debug, Clone, Default)]
pub struct InteractiveTuner {
    threshold: ThresholdState,
}

impl InteractiveTuner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at `initial` with the control bounded by `max`.
    pub fn with_range(initial: i32, max: i32) -> Result<Self> {
        Ok(Self {
            threshold: ThresholdState::new(initial, max)?,
        })
    }

    pub fn threshold(&self) -> ThresholdState {
        self.threshold
    }

    /// Render the initial maps, then redraw on every change until dismissed.
    ///
    /// A dismiss ends the session, not the process; errors from detection
    /// or the display abort it.
    pub fn run<E, V>(
        &mut self,
        pipeline: &mut DetectionPipeline<LineDetector>,
        events: &mut E,
        display: &mut V,
    ) -> Result<TuningSummary>
    where
        E: EventSource,
        V: Display,
    {
        pipeline.detector_mut().set_threshold(self.threshold);
        self.refresh(pipeline, display)?;
        let mut renders = 1;

        loop {
            match events.wait_event()? {
                TunerEvent::ThresholdChanged(value) => {
                    self.threshold.set_low(self.threshold.clamp(value))?;
                    self.refresh(pipeline, display)?;
                    renders += 1;
                }
                TunerEvent::Dismiss => break,
            }
        }

        info!("Tuning session closed at threshold {}", self.threshold.low());
        Ok(TuningSummary {
            renders,
            threshold: self.threshold.low(),
            line_count: pipeline.features().line_count(),
        })
    }

    /// Draw both maps for the current threshold; the store only takes the
    /// new lines once both frames are up.
    fn refresh<V: Display>(&self, pipeline: &mut DetectionPipeline<LineDetector>, display: &mut V) -> Result<()> {
        let (edges, lines) = pipeline.retune(self.threshold.low())?;
        display.show(&edge_frame(&edges))?;

        let base = pipeline.image().working_rgb();
        let frame = Frame::new(LINE_WINDOW, draw_lines(&base, &lines))
            .with_label(format!("Lines Detected: {}", lines.len()));
        display.show(&frame)?;

        pipeline.commit_lines(lines);
        Ok(())
    }
}

fn edge_frame(edges: &GrayImage) -> Frame {
    Frame::new(EDGE_WINDOW, DynamicImage::ImageLuma8(edges.clone()).to_rgb8())
}
