//! Dependency wiring.
//!
//! Must be called inside a Tokio runtime: the hub actor and the membership
//! event consumer are spawned here.

use std::sync::Arc;

use hiroba_shared::time::{Clock, SystemClock};

use crate::{
    config::ServerConfig,
    domain::{MessagePusher, MessageRepository, RoomRepository},
    hub::{Hub, HubConfig},
    infrastructure::repository::{InMemoryMessageRepository, InMemoryRoomRepository},
    ui::Server,
    usecase::{
        AccessRevalidator, ConnectParticipantUseCase, DeleteMessageUseCase,
        DisconnectParticipantUseCase, FrameDispatcher, MembershipUseCase, PresenceNotifier,
        ReactToMessageUseCase, RoomCatalogUseCase, SendMessageUseCase,
    },
};

/// A wired server, plus handles on its in-memory stores.
pub struct App {
    pub server: Server,
    pub rooms: Arc<InMemoryRoomRepository>,
    pub messages: Arc<InMemoryMessageRepository>,
}

/// Wire repositories, the hub and every use case into a `Server`.
pub fn build(config: &ServerConfig) -> App {
    // Initialize dependencies in order:
    // 1. Repository
    // 2. Hub (MessagePusher)
    // 3. UseCases
    // 4. Server

    // 1. Create Repository (in-memory database)
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let rooms = Arc::new(InMemoryRoomRepository::with_clock(Arc::clone(&clock)));
    let messages = Arc::new(InMemoryMessageRepository::with_clock(Arc::clone(&clock)));
    let room_repository: Arc<dyn RoomRepository> = rooms.clone();
    let message_repository: Arc<dyn MessageRepository> = messages.clone();

    // 2. Start the Hub
    let (hub, membership_events) = Hub::start(HubConfig {
        write_timeout: config.write_timeout(),
    });
    let message_pusher: Arc<dyn MessagePusher> = Arc::new(hub.clone());

    // 3. Create UseCases
    let presence = Arc::new(PresenceNotifier::new(
        room_repository.clone(),
        message_pusher.clone(),
        clock.clone(),
    ));
    let membership = Arc::new(MembershipUseCase::new(
        room_repository.clone(),
        message_repository.clone(),
        message_pusher.clone(),
        presence.clone(),
    ));
    tokio::spawn(membership.run(membership_events));

    let connect_participant_usecase = Arc::new(ConnectParticipantUseCase::new(
        room_repository.clone(),
        message_pusher.clone(),
    ));
    let disconnect_participant_usecase =
        Arc::new(DisconnectParticipantUseCase::new(message_pusher.clone()));
    let frame_dispatcher = Arc::new(FrameDispatcher::new(
        Arc::new(AccessRevalidator::new(room_repository.clone())),
        Arc::new(SendMessageUseCase::new(
            message_repository.clone(),
            message_pusher.clone(),
        )),
        Arc::new(DeleteMessageUseCase::new(
            message_repository.clone(),
            message_pusher.clone(),
            clock,
        )),
        Arc::new(ReactToMessageUseCase::new(
            message_repository.clone(),
            room_repository.clone(),
            message_pusher.clone(),
        )),
        presence,
        message_pusher.clone(),
    ));
    let room_catalog_usecase = Arc::new(RoomCatalogUseCase::new(
        room_repository,
        message_repository,
        message_pusher,
        config.history_limit,
    ));

    // 4. Create the server
    let server = Server::new(
        connect_participant_usecase,
        disconnect_participant_usecase,
        frame_dispatcher,
        room_catalog_usecase,
        hub,
    );

    App {
        server,
        rooms,
        messages,
    }
}
