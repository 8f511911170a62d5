use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Escape,
    Backspace,
}

/// A pointer or keyboard event in canvas pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    Tap {
        sx: f64,
        sy: f64,
        #[serde(default)]
        shift: bool,
    },
    DoubleTap {
        sx: f64,
        sy: f64,
    },
    Move {
        sx: f64,
        sy: f64,
    },
    MoveExit,
    PanStart {
        sx: f64,
        sy: f64,
    },
    Pan {
        sx: f64,
        sy: f64,
    },
    PanEnd {
        sx: f64,
        sy: f64,
    },
    KeyUp {
        key: Key,
    },
}

impl UiEvent {
    /// Pointer position, for events that carry one.
    pub fn position(&self) -> Option<(f64, f64)> {
        match *self {
            UiEvent::Tap { sx, sy, .. }
            | UiEvent::DoubleTap { sx, sy }
            | UiEvent::Move { sx, sy }
            | UiEvent::PanStart { sx, sy }
            | UiEvent::Pan { sx, sy }
            | UiEvent::PanEnd { sx, sy } => Some((sx, sy)),
            UiEvent::MoveExit | UiEvent::KeyUp { .. } => None,
        }
    }

    /// Moves are broadcast to inspectors; every other event goes to the active gesture tool
    /// only.
    pub fn is_move(&self) -> bool {
        matches!(self, UiEvent::Move { .. } | UiEvent::MoveExit)
    }

    pub fn name(&self) -> &'static str {
        match self {
            UiEvent::Tap { .. } => "tap",
            UiEvent::DoubleTap { .. } => "double_tap",
            UiEvent::Move { .. } => "move",
            UiEvent::MoveExit => "move_exit",
            UiEvent::PanStart { .. } => "pan_start",
            UiEvent::Pan { .. } => "pan",
            UiEvent::PanEnd { .. } => "pan_end",
            UiEvent::KeyUp { .. } => "key_up",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_use_a_type_tag() {
        let events: Vec<UiEvent> = serde_json::from_str(
            r#"[
                {"type": "tap", "sx": 1, "sy": 2},
                {"type": "tap", "sx": 1, "sy": 2, "shift": true},
                {"type": "move_exit"},
                {"type": "key_up", "key": "backspace"}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            events,
            vec![
                UiEvent::Tap {
                    sx: 1.0,
                    sy: 2.0,
                    shift: false
                },
                UiEvent::Tap {
                    sx: 1.0,
                    sy: 2.0,
                    shift: true
                },
                UiEvent::MoveExit,
                UiEvent::KeyUp {
                    key: Key::Backspace
                },
            ]
        );
        assert_eq!(events[0].position(), Some((1.0, 2.0)));
        assert_eq!(events[3].position(), None);
        assert!(events[2].is_move());
    }
}
