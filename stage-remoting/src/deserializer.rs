//! Inbound input events.
//!
//! The renderer writes pointer, key and focus events with
//! [`EventSerializer`]; the player reads them back with [`read_event`].
//!
//! ```text
//!  MouseEvent     tag │ type │ x:f32 │ y:f32 │ buttons │ flags
//!  KeyboardEvent  tag │ type │ keyCode │ charCode │ location │ flags
//!  FocusEvent     tag │ type
//! ```

use kurbo::Point;
use stage_core::{
    FocusEvent, FocusEventType, InputEvent, KeyModifiers, KeyboardEvent, KeyboardEventType,
    MouseEvent, MouseEventType,
};

use crate::codec::{WireReader, WireWriter};
use crate::error::{RemotingError, RemotingResult};
use crate::wire::{KeyboardEventFlags, MessageTag};

/// Read one event from the input.
///
/// # Errors
///
/// Returns [`RemotingError::UnknownTag`] if the tag is not an event tag,
/// [`RemotingError::UnknownEventType`] for an undefined subtype, or
/// [`RemotingError::UnexpectedEof`] if the input ends inside the event.
pub fn read_event(input: &mut WireReader<'_>) -> RemotingResult<InputEvent> {
    let tag = input.read_int()?;
    match MessageTag::from_number(tag) {
        Some(MessageTag::MouseEvent) => read_mouse_event(input).map(InputEvent::Mouse),
        Some(MessageTag::KeyboardEvent) => read_keyboard_event(input).map(InputEvent::Keyboard),
        Some(MessageTag::FocusEvent) => read_focus_event(input).map(InputEvent::Focus),
        _ => {
            tracing::warn!("Unknown event tag: {tag}");
            Err(RemotingError::UnknownTag(tag))
        }
    }
}

/// Read every event in `bytes`.
///
/// # Errors
///
/// Fails on the first malformed event.
pub fn read_events(bytes: &[u8]) -> RemotingResult<Vec<InputEvent>> {
    let mut input = WireReader::new(bytes);
    let mut events = Vec::new();
    while !input.is_empty() {
        events.push(read_event(&mut input)?);
    }
    Ok(events)
}

fn read_focus_event(input: &mut WireReader<'_>) -> RemotingResult<FocusEvent> {
    let id = input.read_int()?;
    let kind = FocusEventType::from_number(id).ok_or(RemotingError::UnknownEventType { kind: "focus", id })?;
    Ok(FocusEvent { kind })
}

fn read_mouse_event(input: &mut WireReader<'_>) -> RemotingResult<MouseEvent> {
    let id = input.read_int()?;
    let kind = MouseEventType::from_number(id).ok_or(RemotingError::UnknownEventType { kind: "mouse", id })?;
    let x = input.read_float()?;
    let y = input.read_float()?;
    let buttons = input.read_int()?;
    let flags = input.read_int()?;
    Ok(MouseEvent {
        kind,
        point: Point::new(f64::from(x), f64::from(y)),
        buttons,
        modifiers: modifiers(flags),
    })
}

fn read_keyboard_event(input: &mut WireReader<'_>) -> RemotingResult<KeyboardEvent> {
    let id = input.read_int()?;
    let kind =
        KeyboardEventType::from_number(id).ok_or(RemotingError::UnknownEventType { kind: "keyboard", id })?;
    let key_code = input.read_int()?;
    let char_code = input.read_int()?;
    let location = input.read_int()?;
    let flags = input.read_int()?;
    Ok(KeyboardEvent {
        kind,
        key_code,
        char_code,
        location,
        modifiers: modifiers(flags),
    })
}

fn modifiers(flags: i32) -> KeyModifiers {
    let flags = KeyboardEventFlags::from_bits_truncate(flags);
    KeyModifiers {
        shift: flags.contains(KeyboardEventFlags::SHIFT_KEY),
        ctrl: flags.contains(KeyboardEventFlags::CTRL_KEY),
        alt: flags.contains(KeyboardEventFlags::ALT_KEY),
    }
}

fn flags(modifiers: KeyModifiers) -> KeyboardEventFlags {
    let mut flags = KeyboardEventFlags::empty();
    flags.set(KeyboardEventFlags::SHIFT_KEY, modifiers.shift);
    flags.set(KeyboardEventFlags::CTRL_KEY, modifiers.ctrl);
    flags.set(KeyboardEventFlags::ALT_KEY, modifiers.alt);
    flags
}

/// Renderer-side writer for input events.
#[derive(Debug, Clone, Default)]
pub struct EventSerializer {
    output: WireWriter,
}

impl EventSerializer {
    /// Create a writer with an empty output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        self.output.as_bytes()
    }

    /// Take the written bytes, leaving the writer empty.
    pub fn take(&mut self) -> Vec<u8> {
        self.output.take()
    }

    /// Write any event.
    pub fn write_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::Mouse(event) => self.write_mouse_event(event),
            InputEvent::Keyboard(event) => self.write_keyboard_event(event),
            InputEvent::Focus(event) => self.write_focus_event(event),
        }
    }

    /// Write a pointer event.
    #[allow(clippy::cast_possible_truncation)] // Wire floats are single precision
    pub fn write_mouse_event(&mut self, event: &MouseEvent) {
        self.output.write_int(MessageTag::MouseEvent.to_number());
        self.output.write_int(event.kind.to_number());
        self.output.write_float(event.point.x as f32);
        self.output.write_float(event.point.y as f32);
        self.output.write_int(event.buttons);
        self.output.write_int(flags(event.modifiers).bits());
    }

    /// Write a key event.
    pub fn write_keyboard_event(&mut self, event: &KeyboardEvent) {
        self.output.write_int(MessageTag::KeyboardEvent.to_number());
        self.output.write_int(event.kind.to_number());
        self.output.write_int(event.key_code);
        self.output.write_int(event.char_code);
        self.output.write_int(event.location);
        self.output.write_int(flags(event.modifiers).bits());
    }

    /// Write a focus event.
    pub fn write_focus_event(&mut self, event: &FocusEvent) {
        self.output.write_int(MessageTag::FocusEvent.to_number());
        self.output.write_int(event.kind.to_number());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    #[test]
    fn test_read_focus_event() {
        let bytes = words(&[302, 3]);
        let event = read_event(&mut WireReader::new(&bytes)).unwrap();
        assert_eq!(
            event,
            InputEvent::Focus(FocusEvent {
                kind: FocusEventType::WindowFocus
            })
        );
    }

    #[test]
    fn test_read_mouse_event_modifiers() {
        let mut bytes = words(&[300, 2]);
        bytes.extend_from_slice(&12.5f32.to_be_bytes());
        bytes.extend_from_slice(&(-4.0f32).to_be_bytes());
        bytes.extend(words(&[1, 0b101]));

        let InputEvent::Mouse(event) = read_event(&mut WireReader::new(&bytes)).unwrap() else {
            panic!("expected a mouse event");
        };
        assert_eq!(event.kind, MouseEventType::MouseDown);
        assert_eq!(event.point, Point::new(12.5, -4.0));
        assert_eq!(event.buttons, 1);
        assert!(event.modifiers.ctrl);
        assert!(!event.modifiers.alt);
        assert!(event.modifiers.shift);
    }

    #[test]
    fn test_read_keyboard_event() {
        let bytes = words(&[301, 1, 65, 97, 0, 2]);
        let InputEvent::Keyboard(event) = read_event(&mut WireReader::new(&bytes)).unwrap() else {
            panic!("expected a keyboard event");
        };
        assert_eq!(event.kind, KeyboardEventType::KeyPress);
        assert_eq!((event.key_code, event.char_code, event.location), (65, 97, 0));
        assert!(event.modifiers.alt);
    }

    #[test]
    fn test_unknown_tag_is_an_error() {
        let bytes = words(&[104, 0]);
        assert!(matches!(
            read_event(&mut WireReader::new(&bytes)),
            Err(RemotingError::UnknownTag(104))
        ));
    }

    #[test]
    fn test_unknown_subtype_is_an_error() {
        let bytes = words(&[302, 9]);
        assert!(matches!(
            read_event(&mut WireReader::new(&bytes)),
            Err(RemotingError::UnknownEventType { kind: "focus", id: 9 })
        ));
    }

    #[test]
    fn test_truncated_event() {
        let bytes = words(&[301, 0, 65]);
        assert!(matches!(
            read_event(&mut WireReader::new(&bytes)),
            Err(RemotingError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_serializer_output_reads_back() {
        let events = [
            InputEvent::Mouse(MouseEvent {
                kind: MouseEventType::MouseMove,
                point: Point::new(100.0, 50.25),
                buttons: 0,
                modifiers: KeyModifiers::default(),
            }),
            InputEvent::Keyboard(KeyboardEvent {
                kind: KeyboardEventType::KeyUp,
                key_code: 16,
                char_code: 0,
                location: 1,
                modifiers: KeyModifiers {
                    shift: true,
                    ctrl: true,
                    alt: false,
                },
            }),
            InputEvent::Focus(FocusEvent {
                kind: FocusEventType::DocumentHidden,
            }),
        ];
        let mut serializer = EventSerializer::new();
        for event in &events {
            serializer.write_event(event);
        }
        assert_eq!(read_events(serializer.output()).unwrap(), events);
    }
}
