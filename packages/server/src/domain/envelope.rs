//! Outbound envelopes, before wire encoding.
//!
//! Use cases describe *what* to deliver with an `Envelope`; the hub encodes
//! it once per broadcast.

use super::{
    entity::{Message, UserProfile},
    presence::RoomPresence,
    value_object::{MessageId, RoomName, Timestamp},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// A persisted message. The wire kind follows `Message::kind`.
    Message(Message),
    /// A message was hard-deleted by its sender.
    Deleted {
        message_id: MessageId,
        sender: UserProfile,
        room: RoomName,
        at: Timestamp,
    },
    /// Full replacement of a message's reaction aggregate.
    ReactionUpdate(Message),
    /// Access-filtered live presence, personalized per connection.
    RoomUpdate {
        rooms: Vec<RoomPresence>,
        at: Timestamp,
    },
    /// Sent once before a connection is closed for lack of access.
    AccessDenied,
}
