pub mod message;
pub mod room;

pub use message::InMemoryMessageRepository;
pub use room::InMemoryRoomRepository;
