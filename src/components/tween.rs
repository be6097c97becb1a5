//! Path tweens for platform motion.
//!
//! A [`PathTween`] interpolates a position along a polyline over a fixed
//! duration. Progress is eased with an [`Easing`] curve and mapped onto the
//! path by arc length, so a linear ease moves at constant speed across
//! segments of different lengths. [`LoopMode`] decides what happens when an
//! end of the path is reached.
//!
//! Tweens are plain values owned by the movement strategy that created them.
//! Dropping the value kills the tween; nothing else holds a handle to it.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Points closer than this are treated as the same path vertex.
pub const SAME_POINT_EPSILON: f32 = 1e-4;

/// Determines how a tween behaves when it reaches the end.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoopMode {
    /// Play once and stop.
    Once,
    /// Jump back to the beginning when finished.
    Restart,
    /// Reverse direction when reaching either end.
    Yoyo,
}

/// Easing functions for smooth interpolation.
///
/// These functions transform a linear `t` value (0.0 to 1.0) to create
/// different acceleration/deceleration curves.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
    /// Constant speed (no easing).
    #[default]
    Linear,
    /// Starts slow, accelerates (quadratic).
    QuadIn,
    /// Starts fast, decelerates (quadratic).
    QuadOut,
    /// Slow start and end (quadratic).
    QuadInOut,
    /// Starts slow, accelerates (cubic).
    CubicIn,
    /// Starts fast, decelerates (cubic).
    CubicOut,
    /// Slow start and end (cubic).
    CubicInOut,
}

impl Easing {
    /// Parse an easing name as written in config files (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "linear" => Some(Easing::Linear),
            "quadin" => Some(Easing::QuadIn),
            "quadout" => Some(Easing::QuadOut),
            "quadinout" => Some(Easing::QuadInOut),
            "cubicin" => Some(Easing::CubicIn),
            "cubicout" => Some(Easing::CubicOut),
            "cubicinout" => Some(Easing::CubicInOut),
            _ => None,
        }
    }
}

/// Apply an easing function to a normalized time value.
///
/// The input `t` is clamped to [0.0, 1.0] and transformed according to the
/// easing curve.
pub fn ease(e: Easing, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    match e {
        Easing::Linear => t,
        Easing::QuadIn => t * t,
        Easing::QuadOut => t * (2.0 - t),
        Easing::QuadInOut => {
            if t < 0.5 {
                2.0 * t * t
            } else {
                -1.0 + (4.0 - 2.0 * t) * t
            }
        }
        Easing::CubicIn => t * t * t,
        Easing::CubicOut => {
            let p = t - 1.0;
            p * p * p + 1.0
        }
        Easing::CubicInOut => {
            if t < 0.5 {
                4.0 * t * t * t
            } else {
                let p = 2.0 * t - 2.0;
                0.5 * p * p * p + 1.0
            }
        }
    }
}

/// Result of advancing a tween by one step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TweenStatus {
    /// Still in flight (or paused).
    Running,
    /// A looping tween reached an end and wrapped or reversed.
    CycleCompleted,
    /// A [`LoopMode::Once`] tween reached its end.
    Finished,
}

/// Polyline tween sampled by arc length.
#[derive(Clone, Debug)]
pub struct PathTween {
    points: SmallVec<[Vec2; 4]>,
    /// Distance along the path at each point; `cumulative[0] == 0`.
    cumulative: SmallVec<[f32; 4]>,
    duration: f32,
    easing: Easing,
    loop_mode: LoopMode,
    time: f32,
    forward: bool,
    playing: bool,
    finished: bool,
}

impl PathTween {
    /// Build a tween through `points` lasting `duration` seconds.
    ///
    /// Consecutive duplicate points are collapsed. An empty input yields a
    /// tween parked at the origin.
    pub fn new(points: impl IntoIterator<Item = Vec2>, duration: f32) -> Self {
        let mut path: SmallVec<[Vec2; 4]> = SmallVec::new();
        for p in points {
            if path
                .last()
                .is_none_or(|last| last.distance(p) > SAME_POINT_EPSILON)
            {
                path.push(p);
            }
        }
        if path.is_empty() {
            path.push(Vec2::ZERO);
        }
        let mut cumulative: SmallVec<[f32; 4]> = SmallVec::with_capacity(path.len());
        let mut total = 0.0;
        cumulative.push(0.0);
        for pair in path.windows(2) {
            total += pair[0].distance(pair[1]);
            cumulative.push(total);
        }
        PathTween {
            points: path,
            cumulative,
            duration: duration.max(0.0),
            easing: Easing::Linear,
            loop_mode: LoopMode::Once,
            time: 0.0,
            forward: true,
            playing: true,
            finished: false,
        }
    }

    /// Build a tween that starts at `start` and visits `points` at `speed`
    /// units per second. The duration is path length / speed.
    pub fn along(start: Vec2, points: &[Vec2], speed: f32) -> Self {
        let path = std::iter::once(start).chain(points.iter().copied());
        let mut tween = PathTween::new(path, 0.0);
        tween.duration = if speed > 0.0 {
            tween.length() / speed
        } else {
            0.0
        };
        tween
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_loop_mode(mut self, loop_mode: LoopMode) -> Self {
        self.loop_mode = loop_mode;
        self
    }

    /// Total arc length of the path.
    pub fn length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Final vertex of the path.
    pub fn end_point(&self) -> Vec2 {
        self.points.last().copied().unwrap_or(Vec2::ZERO)
    }

    pub fn is_playing(&self) -> bool {
        self.playing && !self.finished
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_forward(&self) -> bool {
        self.forward
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    /// Advance tween time and handle looping/completion.
    pub fn advance(&mut self, dt: f32) -> TweenStatus {
        if self.finished {
            return TweenStatus::Finished;
        }
        if !self.playing {
            return TweenStatus::Running;
        }
        if self.duration <= 0.0 {
            // Degenerate tweens complete on their first step.
            self.time = 0.0;
            return match self.loop_mode {
                LoopMode::Once => {
                    self.finished = true;
                    TweenStatus::Finished
                }
                LoopMode::Restart | LoopMode::Yoyo => TweenStatus::CycleCompleted,
            };
        }

        let dir = if self.forward { 1.0 } else { -1.0 };
        self.time += dt.max(0.0) * dir;

        let finished_forward = self.forward && self.time >= self.duration;
        let finished_backward = !self.forward && self.time <= 0.0;
        if !(finished_forward || finished_backward) {
            return TweenStatus::Running;
        }

        match self.loop_mode {
            LoopMode::Once => {
                self.time = self.time.clamp(0.0, self.duration);
                self.finished = true;
                TweenStatus::Finished
            }
            LoopMode::Restart => {
                self.time = if finished_forward { 0.0 } else { self.duration };
                TweenStatus::CycleCompleted
            }
            LoopMode::Yoyo => {
                self.forward = !self.forward;
                self.time = self.time.clamp(0.0, self.duration);
                TweenStatus::CycleCompleted
            }
        }
    }

    /// Eased progress in [0, 1].
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return if self.finished || self.time > 0.0 { 1.0 } else { 0.0 };
        }
        ease(self.easing, self.time / self.duration)
    }

    /// Current position on the path.
    pub fn position(&self) -> Vec2 {
        if self.duration <= 0.0 && self.finished {
            return self.end_point();
        }
        self.sample(self.progress())
    }

    /// Position at normalized arc-length fraction `t`.
    pub fn sample(&self, t: f32) -> Vec2 {
        let length = self.length();
        if self.points.len() == 1 || length <= 0.0 {
            return self.points[0];
        }
        let target = t.clamp(0.0, 1.0) * length;
        // index of the first vertex at or past the target distance
        let upper = self
            .cumulative
            .partition_point(|d| *d < target)
            .clamp(1, self.points.len() - 1);
        let seg_start = self.cumulative[upper - 1];
        let seg_len = self.cumulative[upper] - seg_start;
        let local_t = if seg_len > 0.0 {
            (target - seg_start) / seg_len
        } else {
            1.0
        };
        self.points[upper - 1].lerp(self.points[upper], local_t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn vec_approx_eq(a: Vec2, b: Vec2) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
    }

    const ALL_EASINGS: [Easing; 7] = [
        Easing::Linear,
        Easing::QuadIn,
        Easing::QuadOut,
        Easing::QuadInOut,
        Easing::CubicIn,
        Easing::CubicOut,
        Easing::CubicInOut,
    ];

    // ==================== EASING FUNCTION TESTS ====================

    #[test]
    fn test_ease_endpoints_and_clamping() {
        for easing in ALL_EASINGS {
            assert!(approx_eq(ease(easing, 0.0), 0.0), "{:?} at 0", easing);
            assert!(approx_eq(ease(easing, 1.0), 1.0), "{:?} at 1", easing);
            assert!(approx_eq(ease(easing, -0.5), 0.0), "{:?} below 0", easing);
            assert!(approx_eq(ease(easing, 1.5), 1.0), "{:?} above 1", easing);
        }
    }

    #[test]
    fn test_ease_known_values() {
        assert!(approx_eq(ease(Easing::QuadIn, 0.5), 0.25));
        assert!(approx_eq(ease(Easing::QuadOut, 0.5), 0.75));
        assert!(approx_eq(ease(Easing::CubicOut, 0.5), 0.875));
        assert!(approx_eq(ease(Easing::CubicInOut, 0.25), 0.0625));
    }

    #[test]
    fn test_ease_monotonicity() {
        for easing in ALL_EASINGS {
            let mut prev = ease(easing, 0.0);
            for i in 1..=100 {
                let curr = ease(easing, i as f32 / 100.0);
                assert!(curr >= prev - EPSILON, "{:?} not monotonic at {}", easing, i);
                prev = curr;
            }
        }
    }

    #[test]
    fn test_easing_from_name() {
        assert_eq!(Easing::from_name("QuadInOut"), Some(Easing::QuadInOut));
        assert_eq!(Easing::from_name(" linear "), Some(Easing::Linear));
        assert_eq!(Easing::from_name("bounce"), None);
    }

    // ==================== PATH TWEEN TESTS ====================

    #[test]
    fn test_along_prepends_start_and_uses_speed() {
        let tw = PathTween::along(Vec2::ZERO, &[Vec2::new(3.0, 4.0)], 5.0);
        assert_eq!(tw.points().len(), 2);
        assert!(approx_eq(tw.length(), 5.0));
        assert!(approx_eq(tw.duration(), 1.0));
    }

    #[test]
    fn test_along_skips_duplicate_start() {
        let tw = PathTween::along(Vec2::ZERO, &[Vec2::ZERO, Vec2::new(0.0, 2.0)], 1.0);
        assert_eq!(tw.points().len(), 2);
    }

    #[test]
    fn test_sample_is_arc_length_based() {
        // 1 unit right then 3 units up: halfway is 1 unit into the second leg
        let tw = PathTween::new(
            [Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(1.0, 3.0)],
            1.0,
        );
        assert!(vec_approx_eq(tw.sample(0.5), Vec2::new(1.0, 1.0)));
        assert!(vec_approx_eq(tw.sample(0.125), Vec2::new(0.5, 0.0)));
        assert!(vec_approx_eq(tw.sample(1.0), Vec2::new(1.0, 3.0)));
    }

    #[test]
    fn test_once_finishes_at_end() {
        let mut tw = PathTween::new([Vec2::ZERO, Vec2::new(2.0, 0.0)], 1.0);
        assert_eq!(tw.advance(0.5), TweenStatus::Running);
        assert!(vec_approx_eq(tw.position(), Vec2::new(1.0, 0.0)));
        assert_eq!(tw.advance(0.75), TweenStatus::Finished);
        assert!(vec_approx_eq(tw.position(), Vec2::new(2.0, 0.0)));
        assert!(!tw.is_playing());
    }

    #[test]
    fn test_pause_holds_position() {
        let mut tw = PathTween::new([Vec2::ZERO, Vec2::new(4.0, 0.0)], 1.0);
        tw.advance(0.25);
        tw.pause();
        for _ in 0..10 {
            assert_eq!(tw.advance(0.25), TweenStatus::Running);
        }
        assert!(vec_approx_eq(tw.position(), Vec2::new(1.0, 0.0)));
        tw.play();
        tw.advance(0.25);
        assert!(vec_approx_eq(tw.position(), Vec2::new(2.0, 0.0)));
    }

    #[test]
    fn test_yoyo_full_cycle_returns_to_start() {
        let start = Vec2::new(1.0, 1.0);
        let mut tw = PathTween::new([start, Vec2::new(5.0, 1.0)], 1.0)
            .with_loop_mode(LoopMode::Yoyo);
        let mut cycles = 0;
        while cycles < 2 {
            if tw.advance(0.1) == TweenStatus::CycleCompleted {
                cycles += 1;
            }
        }
        assert!(vec_approx_eq(tw.position(), start));
        assert!(tw.is_forward());
    }

    #[test]
    fn test_restart_wraps_to_beginning() {
        let mut tw = PathTween::new([Vec2::ZERO, Vec2::new(1.0, 0.0)], 1.0)
            .with_loop_mode(LoopMode::Restart);
        tw.advance(0.5);
        assert_eq!(tw.advance(0.6), TweenStatus::CycleCompleted);
        assert!(vec_approx_eq(tw.position(), Vec2::ZERO));
        assert!(tw.is_forward());
    }

    #[test]
    fn test_zero_length_once_finishes_immediately() {
        let mut tw = PathTween::along(Vec2::new(2.0, 2.0), &[Vec2::new(2.0, 2.0)], 3.0);
        assert_eq!(tw.advance(0.016), TweenStatus::Finished);
        assert!(vec_approx_eq(tw.position(), Vec2::new(2.0, 2.0)));
    }
}
