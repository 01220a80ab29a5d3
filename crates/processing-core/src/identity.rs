//! Own-color identification.
//!
//! The local player's object always sits at the viewport center. Sampling a
//! small neighborhood there on a slow interval tells us which color class is
//! "ours", so the detector and triangulator can ignore it.

use tracelock_common::clock::IntervalGate;
use tracelock_frame_model::color::ColorClass;
use tracelock_frame_model::frame::FrameView;

use crate::config::IdentityConfig;

/// Believed own color plus the interval gate that paces re-checks.
#[derive(Debug, Clone)]
pub struct IdentityState {
    own_color: Option<ColorClass>,
    gate: IntervalGate,
}

/// Result of offering a frame to the identity classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityUpdate {
    /// The re-check interval has not elapsed.
    NotDue,
    /// Classified, but the believed color stays as it was.
    Unchanged,
    /// The believed color switched.
    Changed {
        from: Option<ColorClass>,
        to: ColorClass,
    },
}

impl IdentityState {
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            own_color: None,
            gate: IntervalGate::new(config.interval_ms),
        }
    }

    /// Currently believed own color.
    pub fn own_color(&self) -> Option<ColorClass> {
        self.own_color
    }

    /// Timestamp of the last classification attempt.
    pub fn last_check_ms(&self) -> Option<u64> {
        self.gate.last_open_ms()
    }

    /// Re-classify if the interval has elapsed at `frame.timestamp_ms`.
    ///
    /// Ties and sub-floor counts never overwrite the current belief.
    pub fn update(&mut self, frame: &FrameView<'_>, config: &IdentityConfig) -> IdentityUpdate {
        if !self.gate.should_open(frame.timestamp_ms) {
            return IdentityUpdate::NotDue;
        }

        match classify(frame, config) {
            Some(winner) if Some(winner) != self.own_color => {
                let from = self.own_color.replace(winner);
                IdentityUpdate::Changed { from, to: winner }
            }
            _ => IdentityUpdate::Unchanged,
        }
    }
}

/// Count center-neighborhood samples matching each class, indexed by
/// [`ColorClass::index`].
pub fn count_samples(frame: &FrameView<'_>, config: &IdentityConfig) -> [usize; 4] {
    let mut counts = [0usize; 4];
    let (cx, cy) = frame.center_pixel();
    let stride = config.stride.max(1);

    for y in (cy - config.radius..cy + config.radius).step_by(stride) {
        for x in (cx - config.radius..cx + config.radius).step_by(stride) {
            let Some(pixel) = frame.rgb_checked(x, y) else {
                continue;
            };
            for class in ColorClass::ALL {
                if pixel.manhattan(&class.fingerprint()) <= config.tolerance {
                    counts[class.index()] += 1;
                }
            }
        }
    }

    counts
}

/// The unique class with the most samples above the noise floor.
pub fn classify(frame: &FrameView<'_>, config: &IdentityConfig) -> Option<ColorClass> {
    let counts = count_samples(frame, config);
    let best = *counts.iter().max()?;
    if best <= config.noise_floor {
        return None;
    }
    let mut leaders = ColorClass::ALL
        .into_iter()
        .filter(|class| counts[class.index()] == best);
    let winner = leaders.next()?;
    if leaders.next().is_some() {
        return None;
    }
    Some(winner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracelock_frame_model::color::Rgb;
    use tracelock_frame_model::frame::OwnedFrame;
    use tracelock_frame_model::geometry::Point2D;

    const BACKGROUND: Rgb = Rgb::new(205, 205, 205);

    fn frame_with_center(color: Option<ColorClass>, timestamp_ms: u64) -> OwnedFrame {
        let mut frame = OwnedFrame::filled(400, 300, BACKGROUND);
        if let Some(class) = color {
            frame.fill_circle(Point2D::new(200.0, 150.0), 25.0, class.fingerprint());
        }
        frame.timestamp_ms = timestamp_ms;
        frame
    }

    #[test]
    fn test_classify_center_tank() {
        let frame = frame_with_center(Some(ColorClass::Blue), 0);
        assert_eq!(classify(&frame.view(), &IdentityConfig::default()), Some(ColorClass::Blue));
    }

    #[test]
    fn test_below_noise_floor_is_undecided() {
        let mut frame = OwnedFrame::filled(400, 300, BACKGROUND);
        // A 4x4 patch yields at most one stride-4 sample.
        for y in 150..154 {
            for x in 200..204 {
                frame.put(x, y, ColorClass::Red.fingerprint());
            }
        }
        assert_eq!(classify(&frame.view(), &IdentityConfig::default()), None);
    }

    #[test]
    fn test_tied_counts_are_undecided() {
        let mut frame = OwnedFrame::filled(400, 300, BACKGROUND);
        for y in 120..180 {
            // Four sample columns each side of the center.
            for x in (170..186).chain(214..230) {
                let class = if x < 200 { ColorClass::Red } else { ColorClass::Green };
                frame.put(x, y, class.fingerprint());
            }
        }
        let counts = count_samples(&frame.view(), &IdentityConfig::default());
        assert_eq!(counts[ColorClass::Red.index()], counts[ColorClass::Green.index()]);
        assert_eq!(classify(&frame.view(), &IdentityConfig::default()), None);
    }

    #[test]
    fn test_update_respects_interval() {
        let config = IdentityConfig::default();
        let mut state = IdentityState::new(&config);

        let red = frame_with_center(Some(ColorClass::Red), 0);
        assert_eq!(
            state.update(&red.view(), &config),
            IdentityUpdate::Changed {
                from: None,
                to: ColorClass::Red
            }
        );

        let blue_soon = frame_with_center(Some(ColorClass::Blue), 500);
        assert_eq!(state.update(&blue_soon.view(), &config), IdentityUpdate::NotDue);
        assert_eq!(state.own_color(), Some(ColorClass::Red));

        let blue_later = frame_with_center(Some(ColorClass::Blue), 2_500);
        assert_eq!(
            state.update(&blue_later.view(), &config),
            IdentityUpdate::Changed {
                from: Some(ColorClass::Red),
                to: ColorClass::Blue
            }
        );
    }

    #[test]
    fn test_same_winner_reports_unchanged() {
        let config = IdentityConfig::default();
        let mut state = IdentityState::new(&config);
        let green = frame_with_center(Some(ColorClass::Green), 0);
        state.update(&green.view(), &config);

        let again = frame_with_center(Some(ColorClass::Green), 5_000);
        assert_eq!(state.update(&again.view(), &config), IdentityUpdate::Unchanged);
        assert_eq!(state.last_check_ms(), Some(5_000));
    }

    #[test]
    fn test_empty_center_keeps_previous_belief() {
        let config = IdentityConfig::default();
        let mut state = IdentityState::new(&config);
        state.update(&frame_with_center(Some(ColorClass::Purple), 0).view(), &config);
        state.update(&frame_with_center(None, 3_000).view(), &config);
        assert_eq!(state.own_color(), Some(ColorClass::Purple));
    }
}
