//! Open/close easing of the hinges plus the idle float and yaw of the whole card.
//!
//! Every frame the fold angle moves a fixed fraction of the remaining distance toward its
//! target, so it converges geometrically and can never overshoot.

use crate::config::CardFormat;
use crate::geometry::CardAssembly;
use crate::util::lerp;
use std::f32::consts::PI;

pub const BIFOLD_OPEN_ANGLE: f32 = 0.85 * PI;
pub const QUADFOLD_OPEN_ANGLE: f32 = 0.8 * PI;
pub const DEFAULT_SMOOTHING: f32 = 0.08;

const MIN_SMOOTHING: f32 = 0.001;
const MAX_SMOOTHING: f32 = 0.999;

const FLOAT_AMPLITUDE: f32 = 0.05;
const FLOAT_SPEED: f32 = 0.5;
const YAW_AMPLITUDE: f32 = 0.1;
const YAW_SPEED: f32 = 0.3;

/// Fold angle of a fully open card.
pub fn open_angle(format: CardFormat) -> f32 {
    match format {
        CardFormat::Single => 0.0,
        CardFormat::Bifold => BIFOLD_OPEN_ANGLE,
        CardFormat::Quadfold => QUADFOLD_OPEN_ANGLE,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldState {
    pub current_angle: f32,
    pub target_angle: f32,
    pub is_open: bool,
}

impl FoldState {
    pub const CLOSED: Self = Self {
        current_angle: 0.0,
        target_angle: 0.0,
        is_open: false,
    };
}

impl Default for FoldState {
    fn default() -> Self {
        Self::CLOSED
    }
}

/// Idle motion of the card group for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdleMotion {
    pub lift: f32,
    pub yaw: f32,
}

#[derive(Debug, Clone)]
pub struct FoldAnimator {
    state: FoldState,
    smoothing: f32,
    open_angle: f32,
    /// 1 while closed, eases to 0 while open.
    yaw_weight: f32,
}

impl FoldAnimator {
    pub fn new(format: CardFormat) -> Self {
        Self {
            state: FoldState::CLOSED,
            smoothing: DEFAULT_SMOOTHING,
            open_angle: open_angle(format),
            yaw_weight: 1.0,
        }
    }

    /// Smoothing is kept strictly inside (0, 1).
    pub fn with_smoothing(mut self, smoothing: f32) -> Self {
        self.set_smoothing(smoothing);
        self
    }

    pub fn set_smoothing(&mut self, smoothing: f32) {
        self.smoothing = if smoothing.is_finite() {
            smoothing.clamp(MIN_SMOOTHING, MAX_SMOOTHING)
        } else {
            DEFAULT_SMOOTHING
        };
    }

    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }

    pub fn state(&self) -> FoldState {
        self.state
    }

    pub fn is_inert(&self) -> bool {
        self.open_angle == 0.0
    }

    /// Flips between open and closed. Returns the new `is_open`. Single cards stay closed.
    pub fn toggle(&mut self) -> bool {
        let open = !self.state.is_open;
        self.retarget(open);
        self.state.is_open
    }

    /// Points the animation at the open or closed pose without touching the current angle.
    pub fn retarget(&mut self, open: bool) {
        if self.is_inert() {
            tracing::trace!("fold toggle ignored for a card without hinges");
            return;
        }
        self.state.is_open = open;
        self.state.target_angle = if open { self.open_angle } else { 0.0 };
    }

    /// Back to closed and at rest. Used when the card is rebuilt for another format.
    pub fn reset(&mut self, format: CardFormat) {
        self.state = FoldState::CLOSED;
        self.open_angle = open_angle(format);
        self.yaw_weight = 1.0;
    }

    pub fn is_settled(&self, tolerance: f32) -> bool {
        (self.state.target_angle - self.state.current_angle).abs() <= tolerance
    }

    /// Advances the fold angle by one frame and returns it.
    pub fn step(&mut self) -> f32 {
        self.state.current_angle = lerp(
            self.state.current_angle,
            self.state.target_angle,
            self.smoothing,
        );
        let yaw_target = if self.state.is_open { 0.0 } else { 1.0 };
        self.yaw_weight = lerp(self.yaw_weight, yaw_target, self.smoothing);
        self.state.current_angle
    }

    pub fn idle_motion(&self, elapsed: f32) -> IdleMotion {
        IdleMotion {
            lift: (elapsed * FLOAT_SPEED).sin() * FLOAT_AMPLITUDE,
            yaw: (elapsed * YAW_SPEED).sin() * YAW_AMPLITUDE * self.yaw_weight,
        }
    }

    /// One frame: step the fold, then write the spread pose, hinge rotations and card-group
    /// idle motion.
    pub fn update(&mut self, assembly: &mut CardAssembly, elapsed: f32) {
        let angle = self.step();
        let idle = self.idle_motion(elapsed);
        let card_group = assembly.card_group();
        let hinges: smallvec::SmallVec<[_; 2]> = assembly.hinges().iter().copied().collect();
        let spread = assembly.spread();
        let scene = assembly.scene_mut();

        if let Some(spread) = spread {
            if let Some(transform) = scene.transform_mut(spread.node) {
                transform.position.x = spread.position_x_for(angle);
                transform.rotation.y = spread.yaw_for(angle);
            }
        }

        for hinge in hinges {
            if let Some(transform) = scene.transform_mut(hinge.node) {
                transform.rotation.y = hinge.rotation_for(angle);
            }
        }
        if let Some(transform) = scene.transform_mut(card_group) {
            transform.position.y = idle.lift;
            transform.rotation.y = idle.yaw;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_geometrically_without_overshoot() {
        let mut animator = FoldAnimator::new(CardFormat::Bifold).with_smoothing(0.06);
        animator.toggle();
        let target = animator.state().target_angle;

        let mut previous = 0.0;
        for frame in 1..=60 {
            let angle = animator.step();
            assert!(angle > previous, "frame {frame} did not advance");
            assert!(angle < target);
            let expected_residual = target * 0.94f32.powi(frame);
            assert!(((target - angle) - expected_residual).abs() < 1e-4);
            previous = angle;
        }
    }

    #[test]
    fn default_smoothing_opens_within_one_percent_in_sixty_frames() {
        let mut animator = FoldAnimator::new(CardFormat::Bifold);
        animator.toggle();
        for _ in 0..60 {
            animator.step();
        }
        let state = animator.state();
        assert!((state.target_angle - state.current_angle) / state.target_angle < 0.01);
    }

    #[test]
    fn closing_mid_flight_reverses_without_a_jump() {
        let mut animator = FoldAnimator::new(CardFormat::Quadfold);
        animator.toggle();
        for _ in 0..10 {
            animator.step();
        }
        let before = animator.state().current_angle;
        animator.toggle();
        assert_eq!(animator.state().current_angle, before);

        let after = animator.step();
        assert!(after < before);
        assert!(before - after <= before * animator.smoothing() + 1e-6);
    }

    #[test]
    fn single_card_is_inert() {
        let mut animator = FoldAnimator::new(CardFormat::Single);
        assert!(!animator.toggle());
        animator.step();
        assert_eq!(animator.state(), FoldState::CLOSED);
    }

    #[test]
    fn smoothing_is_kept_inside_the_unit_interval() {
        assert_eq!(FoldAnimator::new(CardFormat::Bifold).with_smoothing(1.5).smoothing(), MAX_SMOOTHING);
        assert_eq!(FoldAnimator::new(CardFormat::Bifold).with_smoothing(0.0).smoothing(), MIN_SMOOTHING);
        assert_eq!(
            FoldAnimator::new(CardFormat::Bifold).with_smoothing(f32::NAN).smoothing(),
            DEFAULT_SMOOTHING
        );
    }

    #[test]
    fn yaw_fades_while_open() {
        let mut animator = FoldAnimator::new(CardFormat::Bifold);
        let elapsed = 5.0;
        let closed_yaw = animator.idle_motion(elapsed).yaw;
        animator.toggle();
        for _ in 0..200 {
            animator.step();
        }
        assert!(animator.idle_motion(elapsed).yaw.abs() < closed_yaw.abs() * 0.01);
        assert_eq!(animator.idle_motion(elapsed).lift, (2.5f32).sin() * 0.05);
    }

    #[test]
    fn reset_returns_to_closed_rest() {
        let mut animator = FoldAnimator::new(CardFormat::Bifold);
        animator.toggle();
        animator.step();
        animator.reset(CardFormat::Quadfold);
        assert_eq!(animator.state(), FoldState::CLOSED);
        animator.toggle();
        assert_eq!(animator.state().target_angle, QUADFOLD_OPEN_ANGLE);
        assert!(animator.is_settled(QUADFOLD_OPEN_ANGLE));
        assert!(!animator.is_settled(0.1));
    }
}
