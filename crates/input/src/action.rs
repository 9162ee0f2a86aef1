/// A high-level action produced by keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveForward,
    MoveBackward,
    StrafeLeft,
    StrafeRight,
    MoveUp,
    MoveDown,
    YawLeft,
    YawRight,
    PitchUp,
    PitchDown,
    /// Start or stop the automatic orbit around the scene.
    ToggleOrbit,
    /// Switch to the scene at this index.
    SelectScene(usize),
    /// Recompile the tracer shader from its source.
    ReloadShader,
    /// Show or hide the info overlay.
    ToggleOverlay,
    /// Put the camera back where the scene started it.
    ResetCamera,
    Quit,
}

impl Action {
    /// Whether the action applies every frame while its key is held.
    pub fn is_continuous(self) -> bool {
        matches!(
            self,
            Self::MoveForward
                | Self::MoveBackward
                | Self::StrafeLeft
                | Self::StrafeRight
                | Self::MoveUp
                | Self::MoveDown
                | Self::YawLeft
                | Self::YawRight
                | Self::PitchUp
                | Self::PitchDown
        )
    }
}
