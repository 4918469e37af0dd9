//! UseCase 層
//!
//! 受信した操作ごとのユースケースと、フレームの振り分け、在室状況の通知、
//! ハブから通知される入退室イベントの処理を提供する。

mod access;
mod connect_participant;
mod delete_message;
mod disconnect_participant;
mod dispatch_frame;
pub mod error;
mod membership;
mod presence;
mod react_to_message;
mod room_catalog;
mod send_message;

pub use access::AccessRevalidator;
pub use connect_participant::ConnectParticipantUseCase;
pub use delete_message::DeleteMessageUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use dispatch_frame::{DispatchOutcome, FrameDispatcher};
pub use error::{ConnectError, DeleteMessageError, PresenceError, ReactionError, SendMessageError};
pub use membership::MembershipUseCase;
pub use presence::PresenceNotifier;
pub use react_to_message::ReactToMessageUseCase;
pub use room_catalog::RoomCatalogUseCase;
pub use send_message::SendMessageUseCase;
