// crates/kryon-core/src/events.rs

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Click,
    Press,
    Release,
    Hover,
    Focus,
    Blur,
    Change,
    Submit,
    Unknown(u8),
}

impl EventType {
    pub fn from_u8(id: u8) -> Self {
        match id {
            0x01 => EventType::Click,
            0x02 => EventType::Press,
            0x03 => EventType::Release,
            0x04 => EventType::Hover,
            0x05 => EventType::Focus,
            0x06 => EventType::Blur,
            0x07 => EventType::Change,
            0x08 => EventType::Submit,
            other => EventType::Unknown(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            EventType::Click => 0x01,
            EventType::Press => 0x02,
            EventType::Release => 0x03,
            EventType::Hover => 0x04,
            EventType::Focus => 0x05,
            EventType::Blur => 0x06,
            EventType::Change => 0x07,
            EventType::Submit => 0x08,
            EventType::Unknown(other) => other,
        }
    }

    /// Maps a source handler key such as `onClick` to its event type.
    pub fn from_handler_key(key: &str) -> Option<Self> {
        Some(match key {
            "onClick" => EventType::Click,
            "onPress" => EventType::Press,
            "onRelease" => EventType::Release,
            "onHover" => EventType::Hover,
            "onFocus" => EventType::Focus,
            "onBlur" => EventType::Blur,
            "onChange" => EventType::Change,
            "onSubmit" => EventType::Submit,
            _ => return None,
        })
    }
}

/// An event handler attached to an element: the callback is a string table index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventBinding {
    pub event_type: EventType,
    pub callback: u8,
}
