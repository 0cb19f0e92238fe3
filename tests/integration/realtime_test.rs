//! Integration tests for client sessions against the server's connection
//! manager.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;

use dealerhub_client::transport::{Connector, Transport};
use dealerhub_client::{
    ConnectionError, ConnectionStatus, PlatformClass, SessionManager, SessionSnapshot,
    TransportProfile,
};
use dealerhub_core::config::client::ClientConfig;
use dealerhub_core::types::UserId;
use dealerhub_entity::user::UserRole;
use dealerhub_realtime::ConnectionManager;
use dealerhub_realtime::connection::ConnectionHandle;
use dealerhub_realtime::message::{
    ConnectedUser, InboundMessage, OutboundMessage, RealtimeEvent,
};

use crate::helpers::TestApp;

const WAIT: Duration = Duration::from_secs(5);

/// Connects straight to a [`ConnectionManager`], skipping the socket.
struct ManagerConnector {
    manager: Arc<ConnectionManager>,
}

struct ManagerTransport {
    manager: Arc<ConnectionManager>,
    handle: Arc<ConnectionHandle>,
    rx: mpsc::Receiver<OutboundMessage>,
}

#[async_trait]
impl Connector for ManagerConnector {
    async fn connect(
        &self,
        _profile: &TransportProfile,
    ) -> Result<Box<dyn Transport>, ConnectionError> {
        let (handle, rx) = self.manager.open(None);
        Ok(Box::new(ManagerTransport {
            manager: self.manager.clone(),
            handle,
            rx,
        }))
    }
}

#[async_trait]
impl Transport for ManagerTransport {
    async fn send(&mut self, message: &InboundMessage) -> Result<(), ConnectionError> {
        let raw = serde_json::to_string(message)
            .map_err(|e| ConnectionError::Protocol(e.to_string()))?;
        self.manager.handle_inbound(&self.handle.id, &raw).await;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<OutboundMessage, ConnectionError>> {
        self.rx.recv().await.map(Ok)
    }

    async fn close(&mut self) {
        self.manager.close(&self.handle.id).await;
    }
}

fn sessions(app: &TestApp, profile: TransportProfile) -> SessionManager {
    let connector = Arc::new(ManagerConnector {
        manager: app.state.realtime.connections.clone(),
    });
    SessionManager::new(connector, profile, &ClientConfig::default())
}

fn identity(user_id: UserId, username: &str, role: UserRole) -> ConnectedUser {
    ConnectedUser {
        user_id,
        username: username.to_string(),
        role,
    }
}

async fn wait_until(
    rx: &mut tokio::sync::watch::Receiver<SessionSnapshot>,
    f: impl FnMut(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    let snapshot = tokio::time::timeout(WAIT, rx.wait_for(f))
        .await
        .expect("timed out waiting for session state")
        .expect("session state dropped");
    SessionSnapshot::clone(&snapshot)
}

#[tokio::test]
async fn test_session_joins_rooms_and_receives_notifications() {
    let app = TestApp::new();
    let (bob, _) = app.user("bob", UserRole::Salesperson);
    let (mia, _) = app.user("mia", UserRole::Manager);

    let manager = sessions(&app, TransportProfile::for_class(PlatformClass::Desktop));
    let session = manager
        .connect(identity(mia, "mia", UserRole::Manager))
        .await;

    let mut state = session.watch();
    let snapshot = wait_until(&mut state, |s| {
        s.is_connected() && s.joined_rooms.contains("management")
    })
    .await;
    assert!(snapshot.joined_rooms.contains("dashboard"));
    assert!(snapshot.connected_users.iter().any(|u| u.user_id == mia));
    assert!(app.state.realtime.connections.is_user_connected(&mia));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _sub = session.subscribe(RealtimeEvent::NotificationCreated, move |event| {
        let _ = tx.send(event.data.clone());
        Ok(())
    });

    app.state
        .trigger
        .trigger(
            "vehicle.sold",
            json!({"username": "bob", "registration": "XY99ABC", "sale_price": 15000}),
            bob,
        )
        .await;

    let data = tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("no notification_created event")
        .expect("handler dropped");
    assert_eq!(data["title"], "Vehicle sold");
    assert_eq!(data["user_id"], json!(mia));
    assert!(session.cache().invalidation_count("notifications") >= 1);

    manager.logout().await;
    assert_eq!(session.status(), ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn test_room_broadcast_reaches_members_only() {
    let app = TestApp::new();
    let (mia, _) = app.user("mia", UserRole::Manager);
    let (sam, _) = app.user("sam", UserRole::Salesperson);

    let mia_sessions = sessions(&app, TransportProfile::for_class(PlatformClass::Desktop));
    let sam_sessions = sessions(&app, TransportProfile::for_class(PlatformClass::Mobile));
    let mia_session = mia_sessions
        .connect(identity(mia, "mia", UserRole::Manager))
        .await;
    let sam_session = sam_sessions
        .connect(identity(sam, "sam", UserRole::Salesperson))
        .await;

    wait_until(&mut mia_session.watch(), |s| {
        s.joined_rooms.contains("management")
    })
    .await;
    wait_until(&mut sam_session.watch(), |s| s.joined_rooms.contains("sales")).await;

    let (mia_tx, mut mia_rx) = mpsc::unbounded_channel();
    let _mia_sub = mia_session.subscribe(RealtimeEvent::AnalyticsUpdated, move |e| {
        let _ = mia_tx.send(e.room.clone());
        Ok(())
    });
    let (sam_tx, mut sam_rx) = mpsc::unbounded_channel::<Option<String>>();
    let _sam_sub = sam_session.subscribe(RealtimeEvent::AnalyticsUpdated, move |e| {
        let _ = sam_tx.send(e.room.clone());
        Ok(())
    });

    let reached = app.state.realtime.broadcaster.emit(
        RealtimeEvent::AnalyticsUpdated,
        json!({"period": "week"}),
        None,
        Some("management"),
    );
    assert_eq!(reached, 1);

    let room = tokio::time::timeout(WAIT, mia_rx.recv()).await.unwrap().unwrap();
    assert_eq!(room.as_deref(), Some("management"));
    assert!(
        tokio::time::timeout(Duration::from_millis(200), sam_rx.recv())
            .await
            .is_err()
    );

    mia_sessions.logout().await;
    sam_sessions.logout().await;
}

#[tokio::test]
async fn test_unknown_identity_ends_in_error() {
    let app = TestApp::new();
    let mut profile = TransportProfile::for_class(PlatformClass::Desktop);
    profile.max_attempts = 0;

    let manager = sessions(&app, profile);
    let session = manager
        .connect(identity(UserId::new(), "ghost", UserRole::Admin))
        .await;

    let snapshot = wait_until(&mut session.watch(), |s| {
        s.status == ConnectionStatus::Error
    })
    .await;
    assert!(matches!(
        snapshot.last_error,
        Some(ConnectionError::AuthenticationRejected(_))
    ));
    assert_eq!(app.state.realtime.connections.user_count(), 0);

    manager.logout().await;
}
