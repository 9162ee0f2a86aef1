use crate::action::Action;
use std::collections::{HashMap, HashSet};
use winit::keyboard::KeyCode;

/// Key → action table.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: HashMap<KeyCode, Action>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let map = [
            (KeyCode::KeyW, Action::MoveForward),
            (KeyCode::KeyS, Action::MoveBackward),
            (KeyCode::KeyA, Action::StrafeLeft),
            (KeyCode::KeyD, Action::StrafeRight),
            (KeyCode::Space, Action::MoveUp),
            (KeyCode::ControlLeft, Action::MoveDown),
            (KeyCode::KeyQ, Action::YawLeft),
            (KeyCode::KeyE, Action::YawRight),
            (KeyCode::KeyR, Action::PitchUp),
            (KeyCode::KeyF, Action::PitchDown),
            (KeyCode::KeyO, Action::ToggleOrbit),
            (KeyCode::Digit1, Action::SelectScene(0)),
            (KeyCode::Digit2, Action::SelectScene(1)),
            (KeyCode::Digit3, Action::SelectScene(2)),
            (KeyCode::F1, Action::ToggleOverlay),
            (KeyCode::F5, Action::ReloadShader),
            (KeyCode::Home, Action::ResetCamera),
            (KeyCode::Escape, Action::Quit),
        ]
        .into_iter()
        .collect();
        Self { map }
    }
}

impl KeyBindings {
    pub fn get(&self, key: KeyCode) -> Option<Action> {
        self.map.get(&key).copied()
    }

    /// Rebind `key`, returning whatever it was bound to before.
    pub fn bind(&mut self, key: KeyCode, action: Action) -> Option<Action> {
        self.map.insert(key, action)
    }

    pub fn unbind(&mut self, key: KeyCode) -> Option<Action> {
        self.map.remove(&key)
    }
}

/// Held-key tracking on top of a binding table.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    bindings: KeyBindings,
    held: HashSet<KeyCode>,
}

impl InputState {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            held: HashSet::new(),
        }
    }

    /// Record a key press. Returns the one-shot action it triggers, if any.
    /// Auto-repeat presses of a held key trigger nothing.
    pub fn press(&mut self, key: KeyCode) -> Option<Action> {
        if !self.held.insert(key) {
            return None;
        }
        let action = self.bindings.get(key).filter(|a| !a.is_continuous());
        if let Some(action) = action {
            tracing::debug!(?key, ?action, "key action");
        }
        action
    }

    pub fn release(&mut self, key: KeyCode) {
        self.held.remove(&key);
    }

    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    /// Continuous actions whose keys are currently down.
    pub fn held_actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.held
            .iter()
            .filter_map(|&k| self.bindings.get(k))
            .filter(|a| a.is_continuous())
    }

    /// Forget all held keys, e.g. after the window loses focus.
    pub fn clear(&mut self) {
        self.held.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings() {
        let b = KeyBindings::default();
        assert_eq!(b.get(KeyCode::KeyW), Some(Action::MoveForward));
        assert_eq!(b.get(KeyCode::Digit2), Some(Action::SelectScene(1)));
        assert_eq!(b.get(KeyCode::F5), Some(Action::ReloadShader));
        assert_eq!(b.get(KeyCode::Escape), Some(Action::Quit));
        assert_eq!(b.get(KeyCode::KeyZ), None);
    }

    #[test]
    fn rebinding_replaces() {
        let mut b = KeyBindings::default();
        assert_eq!(b.bind(KeyCode::KeyW, Action::Quit), Some(Action::MoveForward));
        assert_eq!(b.get(KeyCode::KeyW), Some(Action::Quit));
        assert_eq!(b.unbind(KeyCode::KeyW), Some(Action::Quit));
        assert_eq!(b.get(KeyCode::KeyW), None);
    }

    #[test]
    fn press_fires_one_shot_once() {
        let mut input = InputState::default();
        assert_eq!(input.press(KeyCode::KeyO), Some(Action::ToggleOrbit));
        assert_eq!(input.press(KeyCode::KeyO), None);
        input.release(KeyCode::KeyO);
        assert_eq!(input.press(KeyCode::KeyO), Some(Action::ToggleOrbit));
    }

    #[test]
    fn held_movement_is_reported_until_release() {
        let mut input = InputState::default();
        assert_eq!(input.press(KeyCode::KeyW), None);
        input.press(KeyCode::KeyQ);
        let mut held: Vec<Action> = input.held_actions().collect();
        held.sort_by_key(|a| format!("{a:?}"));
        assert_eq!(held, vec![Action::MoveForward, Action::YawLeft]);

        input.release(KeyCode::KeyW);
        assert_eq!(input.held_actions().collect::<Vec<_>>(), vec![Action::YawLeft]);
        input.clear();
        assert_eq!(input.held_actions().count(), 0);
    }

    #[test]
    fn one_shot_keys_are_not_held_actions() {
        let mut input = InputState::default();
        input.press(KeyCode::F1);
        assert!(input.is_held(KeyCode::F1));
        assert_eq!(input.held_actions().count(), 0);
    }
}
