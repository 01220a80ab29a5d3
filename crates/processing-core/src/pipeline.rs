//! The per-tick pipeline and its driver.
//!
//! ```text
//! FrameSource ──► identity ──► background shift ──► detect ──► associate
//!                                                                 │
//! OverlayRenderer ◄── emit ◄── triangulate ◄── motion fit ◄───────┘
//! ```
//!
//! All mutable state lives in one [`TrackerContext`]. A tick runs to
//! completion before the next frame is pulled.

use tracelock_frame_model::color::ColorClass;
use tracelock_frame_model::frame::{FrameSource, FrameView};
use tracelock_frame_model::overlay::{DrawPrimitive, OverlayRenderer};

use crate::background::{BackgroundAnchor, ShiftEstimate};
use crate::blob_detect::BlobDetector;
use crate::config::TrackerConfig;
use crate::identity::{IdentityState, IdentityUpdate};
use crate::overlay::emit_primitives;
use crate::track::{TrackManager, TrackUpdate};
use crate::triangulate::{TargetEstimate, Triangulator};

/// Everything the pipeline carries from one tick to the next.
#[derive(Debug)]
pub struct TrackerContext {
    config: TrackerConfig,
    identity: IdentityState,
    anchor: BackgroundAnchor,
    detector: BlobDetector,
    tracks: TrackManager,
    triangulator: Triangulator,
    ticks: u64,
    had_target: bool,
}

impl TrackerContext {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            identity: IdentityState::new(&config.identity),
            anchor: BackgroundAnchor::new(),
            detector: BlobDetector::new(),
            tracks: TrackManager::new(),
            triangulator: Triangulator::new(),
            ticks: 0,
            had_target: false,
            config,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(TrackerConfig::default())
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn tracks(&self) -> &TrackManager {
        &self.tracks
    }

    pub fn own_color(&self) -> Option<ColorClass> {
        self.identity.own_color()
    }

    /// Ticks processed so far. Skipped frames are not counted.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

/// What one tick produced.
#[derive(Debug, Clone)]
pub struct TickOutput {
    pub primitives: Vec<DrawPrimitive>,
    pub target: Option<TargetEstimate>,
    pub shift: ShiftEstimate,
    pub identity: IdentityUpdate,
    pub own_color: Option<ColorClass>,
    pub detections: usize,
    pub trajectories: usize,
    pub association: TrackUpdate,
}

/// Run one tick. Returns `None` when the frame is empty and the tick was skipped.
pub fn process_tick(ctx: &mut TrackerContext, frame: &FrameView<'_>) -> Option<TickOutput> {
    if frame.is_empty() {
        tracing::trace!("Skipping empty frame");
        return None;
    }
    ctx.ticks += 1;
    let config = &ctx.config;

    let identity = ctx.identity.update(frame, &config.identity);
    if let IdentityUpdate::Changed { from, to } = identity {
        let discarded = ctx.tracks.clear();
        tracing::info!(
            from = from.map(ColorClass::name),
            to = to.name(),
            discarded,
            "Own color changed"
        );
    }
    let own_color = ctx.identity.own_color();

    let shift = ctx.anchor.estimate(frame, &config.compensator);
    match shift {
        ShiftEstimate::LockLost => tracing::debug!(tick = ctx.ticks, "Background lock lost"),
        ShiftEstimate::JumpRejected { dx, dy } => {
            tracing::debug!(tick = ctx.ticks, dx, dy, "Rejected background jump")
        }
        _ => {}
    }
    if let Some(delta) = shift.delta() {
        ctx.tracks.translate_all(delta);
    }

    let detections = ctx.detector.detect(frame, own_color, &config.detector);
    let association = ctx.tracks.update(detections, &config.track);
    let detection_count = detections.len();
    ctx.tracks.refresh_motion(&config.motion);

    let target = ctx.triangulator.solve(
        ctx.tracks.trajectories(),
        own_color,
        &config.motion,
        &config.triangulation,
    );
    match (ctx.had_target, &target) {
        (false, Some(t)) => tracing::debug!(
            x = t.position.x,
            y = t.position.y,
            support = t.support,
            "Target acquired"
        ),
        (true, None) => tracing::debug!(tick = ctx.ticks, "Target lost"),
        _ => {}
    }
    ctx.had_target = target.is_some();

    let mut primitives = Vec::new();
    emit_primitives(
        &mut primitives,
        ctx.tracks.trajectories(),
        target.as_ref(),
        frame.center(),
        &config.motion,
        &config.overlay,
    );

    Some(TickOutput {
        primitives,
        target,
        shift,
        identity,
        own_color,
        detections: detection_count,
        trajectories: ctx.tracks.len(),
        association,
    })
}

/// Pulls frames from a source and pushes each tick's primitives to a renderer.
pub struct TickDriver<S, R> {
    source: S,
    renderer: R,
    context: TrackerContext,
    last: Option<TickOutput>,
}

impl<S: FrameSource, R: OverlayRenderer> TickDriver<S, R> {
    pub fn new(source: S, renderer: R, config: TrackerConfig) -> Self {
        Self {
            source,
            renderer,
            context: TrackerContext::new(config),
            last: None,
        }
    }

    /// Run one tick. Returns `false` if no frame was available or it was empty.
    pub fn run_tick(&mut self) -> bool {
        let Some(frame) = self.source.acquire() else {
            return false;
        };
        let Some(output) = process_tick(&mut self.context, &frame) else {
            return false;
        };
        self.renderer.render(&output.primitives);
        self.last = Some(output);
        true
    }

    /// Output of the most recent tick that ran.
    pub fn last_output(&self) -> Option<&TickOutput> {
        self.last.as_ref()
    }

    pub fn context(&self) -> &TrackerContext {
        &self.context
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_parts(self) -> (S, R, TrackerContext) {
        (self.source, self.renderer, self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracelock_frame_model::color::Rgb;
    use tracelock_frame_model::frame::OwnedFrame;
    use tracelock_frame_model::geometry::Point2D;
    use tracelock_frame_model::overlay::RecordingRenderer;

    struct QueueSource {
        frames: Vec<OwnedFrame>,
        current: Option<OwnedFrame>,
    }

    impl FrameSource for QueueSource {
        fn acquire(&mut self) -> Option<FrameView<'_>> {
            if self.frames.is_empty() {
                return None;
            }
            self.current = Some(self.frames.remove(0));
            self.current.as_ref().map(OwnedFrame::view)
        }
    }

    #[test]
    fn test_empty_frame_is_skipped() {
        let mut ctx = TrackerContext::with_defaults();
        let view = FrameView::new(0, 0, &[], 0).unwrap();
        assert!(process_tick(&mut ctx, &view).is_none());
        assert_eq!(ctx.ticks(), 0);
    }

    #[test]
    fn test_single_blob_becomes_trajectory() {
        let mut frame = OwnedFrame::filled(800, 600, Rgb::new(205, 205, 205));
        frame.fill_circle(Point2D::new(150.0, 120.0), 10.0, ColorClass::Green.fingerprint());
        let mut ctx = TrackerContext::with_defaults();
        let out = process_tick(&mut ctx, &frame.view()).unwrap();

        assert_eq!(out.detections, 1);
        assert_eq!(out.trajectories, 1);
        assert!(out.target.is_none());
        assert!(out.primitives.is_empty());
    }

    #[test]
    fn test_driver_renders_only_ticks_that_ran() {
        let background = Rgb::new(205, 205, 205);
        let source = QueueSource {
            frames: vec![OwnedFrame::filled(0, 0, background), OwnedFrame::filled(320, 240, background)],
            current: None,
        };
        let mut driver = TickDriver::new(source, RecordingRenderer::default(), TrackerConfig::default());

        assert!(!driver.run_tick());
        assert!(driver.run_tick());
        assert!(!driver.run_tick());
        assert_eq!(driver.renderer().frames_rendered, 1);
        assert_eq!(driver.context().ticks(), 1);
    }
}
