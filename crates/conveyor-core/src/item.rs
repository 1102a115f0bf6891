//! Queue items: a payload or the end-of-stream marker.
//!
//! The marker is a separate variant, never a reserved payload value, so `T`
//! stays unconstrained (`Option<_>`, `()` and empty strings are all valid
//! payloads).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Item<T> {
    Value(T),
    EndOfStream,
}

impl<T> Item<T> {
    pub fn is_value(&self) -> bool {
        matches!(self, Item::Value(_))
    }

    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Item::EndOfStream)
    }

    /// Payload, or `None` for the marker.
    pub fn into_value(self) -> Option<T> {
        match self {
            Item::Value(v) => Some(v),
            Item::EndOfStream => None,
        }
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            Item::Value(v) => Some(v),
            Item::EndOfStream => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Item<U> {
        match self {
            Item::Value(v) => Item::Value(f(v)),
            Item::EndOfStream => Item::EndOfStream,
        }
    }
}

impl<T> From<T> for Item<T> {
    fn from(value: T) -> Self {
        Item::Value(value)
    }
}
