//! The user-controlled transform shared between slider input and the main viewport.

use glamx::Vec2;
use std::cell::Cell;
use std::rc::Rc;

/// Translation the sliders start from. Rendering treats it as the origin.
pub const DEFAULT_TRANSLATION: Vec2 = Vec2::new(150.0, 100.0);

/// An angle stored as its sine and cosine.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rotation {
    /// Sine of the angle.
    pub sin: f32,
    /// Cosine of the angle.
    pub cos: f32,
}

impl Rotation {
    /// The zero angle.
    pub const IDENTITY: Rotation = Rotation { sin: 0.0, cos: 1.0 };

    /// Encodes an angle given in degrees.
    pub fn from_degrees(degrees: f32) -> Rotation {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Rotation { sin, cos }
    }

    /// The encoded angle, in radians within `(-π, π]`.
    #[inline]
    pub fn angle(&self) -> f32 {
        self.sin.atan2(self.cos)
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Rotation::IDENTITY
    }
}

/// Translation, rotation and scale applied on top of a model's own framing.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransformState {
    /// Screen-relative translation, in slider units.
    pub translation: Vec2,
    /// Rotation around the model's X axis.
    pub rotation: Rotation,
    /// Scale along X and Y.
    pub scale: Vec2,
}

impl Default for TransformState {
    fn default() -> Self {
        TransformState {
            translation: DEFAULT_TRANSLATION,
            rotation: Rotation::IDENTITY,
            scale: Vec2::ONE,
        }
    }
}

impl TransformState {
    /// Applies a slider event. Exactly one field changes.
    pub fn apply(&mut self, input: SliderInput) {
        match input {
            SliderInput::PositionX(x) => self.translation.x = x,
            SliderInput::PositionY(y) => self.translation.y = y,
            // The rotation slider runs clockwise.
            SliderInput::Rotation(v) => self.rotation = Rotation::from_degrees(360.0 - v),
            SliderInput::ScaleX(x) => self.scale.x = x,
            SliderInput::ScaleY(y) => self.scale.y = y,
        }
    }
}

/// A value-changed event from one of the transform sliders.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SliderInput {
    /// X position, `0..=canvas width`.
    PositionX(f32),
    /// Y position, `0..=canvas height`.
    PositionY(f32),
    /// Rotation in degrees, `0..=360`.
    Rotation(f32),
    /// X scale, `-5..=5` by steps of `0.01`.
    ScaleX(f32),
    /// Y scale, `-5..=5` by steps of `0.01`.
    ScaleY(f32),
}

impl SliderInput {
    /// Upper bound of the rotation slider.
    pub const ROTATION_MAX: f32 = 360.0;
    /// Bounds of the scale sliders.
    pub const SCALE_RANGE: (f32, f32) = (-5.0, 5.0);
    /// Step of the scale sliders.
    pub const SCALE_STEP: f32 = 0.01;
}

/// A [`TransformState`] shared by reference between the UI and a viewer.
///
/// Every write replaces the whole record at once, so a frame being rendered only
/// ever sees a complete state. This relies on the single-threaded event loop: a
/// multi-threaded host would need a lock around the cell.
#[derive(Clone, Debug, Default)]
pub struct SharedTransform(Rc<Cell<TransformState>>);

impl SharedTransform {
    /// Shares `state`.
    pub fn new(state: TransformState) -> Self {
        SharedTransform(Rc::new(Cell::new(state)))
    }

    /// A copy of the current state.
    #[inline]
    pub fn get(&self) -> TransformState {
        self.0.get()
    }

    /// Replaces the current state.
    #[inline]
    pub fn set(&self, state: TransformState) {
        self.0.set(state)
    }

    /// Applies a slider event.
    pub fn apply(&self, input: SliderInput) {
        let mut state = self.get();
        state.apply(input);
        self.set(state);
    }

    /// Resets to the default state.
    pub fn reset(&self) {
        self.set(TransformState::default())
    }

    /// `true` if both handles share the same state.
    pub fn ptr_eq(&self, other: &SharedTransform) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1.0e-5, "{} != {}", a, b);
    }

    #[test]
    fn rotation_slider_is_inverted() {
        let mut state = TransformState::default();

        state.apply(SliderInput::Rotation(90.0));
        // 360 - 90 = 270 degrees.
        assert_close(state.rotation.sin, -1.0);
        assert_close(state.rotation.cos, 0.0);

        state.apply(SliderInput::Rotation(30.0));
        assert_close(state.rotation.sin, 330.0f32.to_radians().sin());
        assert_close(state.rotation.cos, 330.0f32.to_radians().cos());
        assert_close(state.rotation.angle(), -30.0f32.to_radians());
    }

    #[test]
    fn rotation_slider_at_zero_is_the_identity() {
        let mut state = TransformState::default();
        state.apply(SliderInput::Rotation(0.0));
        assert_close(state.rotation.sin, 0.0);
        assert_close(state.rotation.cos, 1.0);
    }

    #[test]
    fn each_slider_changes_one_field() {
        let mut state = TransformState::default();
        state.apply(SliderInput::ScaleY(-2.5));
        assert_eq!(
            state,
            TransformState {
                scale: Vec2::new(1.0, -2.5),
                ..TransformState::default()
            }
        );

        state.apply(SliderInput::PositionX(10.0));
        assert_eq!(state.translation, Vec2::new(10.0, DEFAULT_TRANSLATION.y));
    }

    #[test]
    fn shared_handles_observe_writes() {
        let ui = SharedTransform::default();
        let viewer = ui.clone();
        ui.apply(SliderInput::ScaleX(3.0));
        assert_eq!(viewer.get().scale.x, 3.0);

        ui.reset();
        assert_eq!(viewer.get(), TransformState::default());
        assert!(ui.ptr_eq(&viewer));
        assert!(!ui.ptr_eq(&SharedTransform::default()));
    }
}
