//! Domain layer: value objects, entities, the connection record and the
//! interfaces the hub and use cases depend on.

pub mod command;
pub mod connection;
pub mod entity;
pub mod envelope;
pub mod error;
pub mod presence;
pub mod pusher;
pub mod repository;
pub mod value_object;

pub use command::{InboundCommand, PostMessage, ReplyRequest};
pub use connection::{Connection, ConnectionIdentity, PusherChannel};
pub use entity::{
    MediaAttachment, MemberRole, Message, MessageKind, NewMessage, Reaction, ReactionAction,
    ReactionSummary, ReplySnapshot, Room, RoomMembership, RoomVisibility, UserProfile,
    summarize_reactions,
};
pub use envelope::Envelope;
pub use error::{MessagePushError, RepositoryError, ValueObjectError};
pub use presence::{RoomPresence, build_room_presence};
pub use pusher::MessagePusher;
pub use repository::{MessageRepository, RoomRepository};
pub use value_object::{ConnectionId, Emoji, MessageId, MessageText, RoomName, Timestamp, UserId};
