#![forbid(unsafe_code)]

//! Property animation timeline.
//!
//! Animations are scheduled against elements and stepped explicitly: the
//! host calls [`crate::dom::Document::advance`] with the elapsed frame time,
//! the timeline interpolates track values onto element styles, and finished
//! animations surface their completion callbacks to the caller.
//!
//! # Invariants
//!
//! - A completion callback fires at most once, on the first step where the
//!   animation reaches its duration.
//! - [`Timeline::stop`] discards an element's in-flight animations without
//!   firing their completions and without jumping to the end values.
//! - Track end values are written exactly on the completing step; easing
//!   overshoot never leaks into the final state.

use std::time::Duration;

use smallvec::SmallVec;

use crate::dom::ElementId;

/// A style property the timeline can animate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatedProp {
    Opacity,
    MarginTop,
}

/// Easing function applied to animation progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    /// Cosine ease-in-out; the host default.
    #[default]
    Swing,
}

impl Easing {
    /// Map linear progress in `[0, 1]` to eased progress.
    pub fn eval(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Swing => 0.5 - (std::f32::consts::PI * t).cos() / 2.0,
        }
    }
}

/// One animated property with optional explicit start value.
///
/// When `from` is `None` the current style value is captured at schedule
/// time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Track {
    pub prop: AnimatedProp,
    pub from: Option<f32>,
    pub to: f32,
}

/// Completion callback invoked after an animation finishes.
pub type Completion = Box<dyn FnOnce()>;

/// A scheduled animation: target element, tracks, timing, and an optional
/// completion callback.
pub struct AnimationSpec {
    pub(crate) target: ElementId,
    pub(crate) tracks: SmallVec<[Track; 2]>,
    pub(crate) duration: Duration,
    pub(crate) easing: Easing,
    pub(crate) on_complete: Option<Completion>,
}

impl AnimationSpec {
    /// Start building an animation for the given element.
    pub fn new(target: ElementId) -> Self {
        Self {
            target,
            tracks: SmallVec::new(),
            duration: Duration::ZERO,
            easing: Easing::default(),
            on_complete: None,
        }
    }

    /// Animate a property from its current value to `to`.
    pub fn track(mut self, prop: AnimatedProp, to: f32) -> Self {
        self.tracks.push(Track {
            prop,
            from: None,
            to,
        });
        self
    }

    /// Animate a property from an explicit start value to `to`.
    pub fn track_from(mut self, prop: AnimatedProp, from: f32, to: f32) -> Self {
        self.tracks.push(Track {
            prop,
            from: Some(from),
            to,
        });
        self
    }

    /// Set the animation duration.
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the easing function.
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Attach a completion callback.
    pub fn on_complete(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }
}

impl std::fmt::Debug for AnimationSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationSpec")
            .field("target", &self.target)
            .field("tracks", &self.tracks)
            .field("duration", &self.duration)
            .field("easing", &self.easing)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedTrack {
    pub(crate) prop: AnimatedProp,
    pub(crate) from: f32,
    pub(crate) to: f32,
}

struct Running {
    target: ElementId,
    tracks: SmallVec<[ResolvedTrack; 2]>,
    duration: Duration,
    elapsed: Duration,
    easing: Easing,
    on_complete: Option<Completion>,
}

/// An interpolated value to write back to an element style.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StyleWrite {
    pub(crate) target: ElementId,
    pub(crate) prop: AnimatedProp,
    pub(crate) value: f32,
}

/// Active animations, in schedule order.
#[derive(Default)]
pub(crate) struct Timeline {
    running: Vec<Running>,
}

impl Timeline {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn schedule(
        &mut self,
        target: ElementId,
        tracks: SmallVec<[ResolvedTrack; 2]>,
        duration: Duration,
        easing: Easing,
        on_complete: Option<Completion>,
    ) {
        self.running.push(Running {
            target,
            tracks,
            duration,
            elapsed: Duration::ZERO,
            easing,
            on_complete,
        });
    }

    /// Discard the element's animations; completions are dropped unfired and
    /// style values stay wherever the last step left them.
    pub(crate) fn stop(&mut self, target: ElementId) {
        self.running.retain(|r| r.target != target);
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.running.is_empty()
    }

    pub(crate) fn is_animating(&self, target: ElementId) -> bool {
        self.running.iter().any(|r| r.target == target)
    }

    /// Step every animation by `dt`. Returns the style writes to apply and
    /// the completion callbacks that came due, both in schedule order.
    pub(crate) fn advance(&mut self, dt: Duration) -> (Vec<StyleWrite>, Vec<Completion>) {
        let mut writes = Vec::new();
        let mut completions = Vec::new();

        for running in &mut self.running {
            running.elapsed = running.elapsed.saturating_add(dt);
            let done = running.elapsed >= running.duration;
            let progress = if running.duration.is_zero() {
                1.0
            } else {
                (running.elapsed.as_secs_f32() / running.duration.as_secs_f32()).min(1.0)
            };
            let eased = running.easing.eval(progress);

            for track in &running.tracks {
                let value = if done {
                    track.to
                } else {
                    track.from + (track.to - track.from) * eased
                };
                writes.push(StyleWrite {
                    target: running.target,
                    prop: track.prop,
                    value,
                });
            }

            if done && let Some(callback) = running.on_complete.take() {
                completions.push(callback);
            }
        }

        self.running.retain(|r| r.elapsed < r.duration);
        (writes, completions)
    }
}

impl std::fmt::Debug for Timeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timeline")
            .field("running", &self.running.len())
            .finish()
    }
}
