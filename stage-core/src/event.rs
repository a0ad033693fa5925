//! Input events delivered from the renderer.

use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::style::selector_enum;

/// Category of an input event, as numbered on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum EventKind {
    /// Focus and visibility changes.
    Focus = 0,
    /// Pointer events.
    Mouse = 1,
    /// Key events.
    Keyboard = 2,
}

selector_enum! {
    /// Pointer event subtype.
    pub enum MouseEventType (default Click) {
        /// Button pressed and released.
        Click = 0 => "click",
        /// Two clicks in quick succession.
        DoubleClick = 1 => "dblclick",
        /// Button pressed.
        MouseDown = 2 => "mousedown",
        /// Pointer moved.
        MouseMove = 3 => "mousemove",
        /// Button released.
        MouseUp = 4 => "mouseup",
        /// Pointer entered the stage.
        MouseOver = 5 => "mouseover",
        /// Pointer left the stage.
        MouseOut = 6 => "mouseout",
    }
}

selector_enum! {
    /// Key event subtype.
    pub enum KeyboardEventType (default KeyDown) {
        /// Key pressed.
        KeyDown = 0 => "keydown",
        /// Character produced.
        KeyPress = 1 => "keypress",
        /// Key released.
        KeyUp = 2 => "keyup",
    }
}

selector_enum! {
    /// Focus event subtype.
    pub enum FocusEventType (default DocumentHidden) {
        /// The host document was hidden.
        DocumentHidden = 0 => "documentHidden",
        /// The host document became visible.
        DocumentVisible = 1 => "documentVisible",
        /// The host window lost focus.
        WindowBlur = 2 => "windowBlur",
        /// The host window gained focus.
        WindowFocus = 3 => "windowFocus",
    }
}

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyModifiers {
    /// Shift key pressed.
    pub shift: bool,
    /// Control key pressed.
    pub ctrl: bool,
    /// Alt/Option key pressed.
    pub alt: bool,
}

/// A pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseEvent {
    /// Subtype.
    pub kind: MouseEventType,
    /// Position in stage pixels.
    pub point: Point,
    /// Pressed button mask.
    pub buttons: i32,
    /// Active modifier keys.
    pub modifiers: KeyModifiers,
}

/// A key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardEvent {
    /// Subtype.
    pub kind: KeyboardEventType,
    /// Virtual key code.
    pub key_code: i32,
    /// Character code.
    pub char_code: i32,
    /// Key location on the keyboard.
    pub location: i32,
    /// Active modifier keys.
    pub modifiers: KeyModifiers,
}

/// A focus or visibility change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusEvent {
    /// Subtype.
    pub kind: FocusEventType,
}

/// All input events the stage can receive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InputEvent {
    /// Pointer event.
    Mouse(MouseEvent),
    /// Key event.
    Keyboard(KeyboardEvent),
    /// Focus event.
    Focus(FocusEvent),
}

impl InputEvent {
    /// The event's category.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Mouse(_) => EventKind::Mouse,
            Self::Keyboard(_) => EventKind::Keyboard,
            Self::Focus(_) => EventKind::Focus,
        }
    }

    /// Modifier keys, for pointer and key events.
    #[must_use]
    pub const fn modifiers(&self) -> Option<KeyModifiers> {
        match self {
            Self::Mouse(event) => Some(event.modifiers),
            Self::Keyboard(event) => Some(event.modifiers),
            Self::Focus(_) => None,
        }
    }
}
