//! Response Fixtures
//!
//! Hand-authored homeserver payloads: the login credentials and the initial
//! sync snapshot the daydream UI tests render (room list, search, timeline).
//!
//! Every call builds a fresh value. Nothing here reads disk, the network or
//! any shared state.

use crate::network::FetchResponse;
use crate::result::{FakeApiError, FakeApiResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// User id the login fixture authenticates as
pub const FIXTURE_USER_ID: &str = "@carl:example.com";
/// Access token handed out by the login fixture
pub const FIXTURE_ACCESS_TOKEN: &str = "123456";
/// Device id handed out by the login fixture
pub const FIXTURE_DEVICE_ID: &str = "KCZFUCGSLZ";

/// The joined room every sync fixture contains
pub const JOINED_ROOM_ID: &str = "!726s6s6q:example.com";
/// The invited room every sync fixture contains
pub const INVITED_ROOM_ID: &str = "!696r7674:example.com";
/// Display name of the joined room's first hero
pub const ALICE_DISPLAY_NAME: &str = "Alice Margatroid";

const ALICE: &str = "@alice:example.com";
const BOB: &str = "@bob:example.com";
const SENDER: &str = "@example:example.org";
const EVENT_ID: &str = "$143273582443PhrSn:example.org";
const ORIGIN_SERVER_TS: u64 = 1432735824653;
const NEXT_BATCH: &str = "s72595_4483_1934";
const PREV_BATCH: &str = "t34-23535_0_0";

/// Result of a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Fully qualified user id
    pub user_id: String,
    /// Bearer token for subsequent calls
    pub access_token: String,
    /// Device the session is bound to
    pub device_id: String,
}

/// Age metadata attached to a delivered event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unsigned {
    /// Milliseconds since the event was sent
    pub age: u64,
}

/// A room event as delivered by sync.
///
/// Ids, sender and timestamps are optional because stripped invite state and
/// ephemeral events omit them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomEvent {
    /// Event payload
    pub content: Value,
    /// Event type, e.g. `m.room.member`
    #[serde(rename = "type")]
    pub kind: String,
    /// Event id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Room id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    /// Sender user id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// Server timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_server_ts: Option<u64>,
    /// Delivery metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsigned: Option<Unsigned>,
    /// State key, present on state events only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_key: Option<String>,
}

impl RoomEvent {
    /// Bare event with only a type and content
    #[must_use]
    pub fn new(kind: impl Into<String>, content: Value) -> Self {
        Self {
            content,
            kind: kind.into(),
            event_id: None,
            room_id: None,
            sender: None,
            origin_server_ts: None,
            unsigned: None,
            state_key: None,
        }
    }

    /// Set the state key
    #[must_use]
    pub fn with_state_key(mut self, state_key: impl Into<String>) -> Self {
        self.state_key = Some(state_key.into());
        self
    }

    /// Set the sender
    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Set the room id
    #[must_use]
    pub fn with_room_id(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }

    /// Mark as a delivered timeline event: id, room, sender, timestamp, age
    #[must_use]
    pub fn delivered(mut self, room_id: &str) -> Self {
        self.event_id = Some(EVENT_ID.to_string());
        self.room_id = Some(room_id.to_string());
        self.sender = Some(SENDER.to_string());
        self.origin_server_ts = Some(ORIGIN_SERVER_TS);
        self.unsigned = Some(Unsigned { age: 1234 });
        self
    }

    /// Whether this is a state event
    #[must_use]
    pub const fn is_state(&self) -> bool {
        self.state_key.is_some()
    }

    /// The display name of an `m.room.member` event
    #[must_use]
    pub fn member_display_name(&self) -> Option<&str> {
        if self.kind != "m.room.member" {
            return None;
        }
        self.content.get("displayname").and_then(Value::as_str)
    }
}

/// A list of events
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventList {
    /// Events in delivery order
    #[serde(default)]
    pub events: Vec<RoomEvent>,
}

impl EventList {
    /// Wrap events
    #[must_use]
    pub fn new(events: Vec<RoomEvent>) -> Self {
        Self { events }
    }
}

/// A room's timeline slice
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Timeline {
    /// Events in delivery order
    #[serde(default)]
    pub events: Vec<RoomEvent>,
    /// Whether earlier events were omitted
    #[serde(default)]
    pub limited: bool,
    /// Token to paginate backwards
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_batch: Option<String>,
}

/// Unread counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnreadNotifications {
    /// Highlighted unread events
    pub highlight_count: u64,
    /// All unread notifying events
    pub notification_count: u64,
}

/// Summary used to name rooms without an explicit name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoomSummary {
    /// Members used to compute the room name
    #[serde(rename = "m.heroes", default)]
    pub heroes: Vec<String>,
    /// Joined member count
    #[serde(rename = "m.joined_member_count", default)]
    pub joined_member_count: u64,
    /// Invited member count
    #[serde(rename = "m.invited_member_count", default)]
    pub invited_member_count: u64,
}

/// State of a room the user has joined
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JoinedRoom {
    /// Unread counters
    #[serde(default)]
    pub unread_notifications: UnreadNotifications,
    /// Naming summary
    #[serde(default)]
    pub summary: RoomSummary,
    /// State before the timeline
    #[serde(default)]
    pub state: EventList,
    /// Message timeline
    #[serde(default)]
    pub timeline: Timeline,
    /// Transient events (typing, receipts)
    #[serde(default)]
    pub ephemeral: EventList,
    /// Per-room account data (tags, client config)
    #[serde(default)]
    pub account_data: EventList,
}

impl JoinedRoom {
    /// Display name of a member, searching state then timeline
    #[must_use]
    pub fn member_display_name(&self, user_id: &str) -> Option<&str> {
        self.state
            .events
            .iter()
            .chain(&self.timeline.events)
            .filter(|event| event.state_key.as_deref() == Some(user_id))
            .find_map(RoomEvent::member_display_name)
    }

    /// Heroes resolved to display names, falling back to the user id
    #[must_use]
    pub fn hero_display_names(&self) -> Vec<&str> {
        self.summary
            .heroes
            .iter()
            .map(|hero| self.member_display_name(hero).unwrap_or(hero))
            .collect()
    }

    /// Room name computed from heroes
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.hero_display_names().as_slice() {
            [] => "Empty room".to_string(),
            [only] => (*only).to_string(),
            [init @ .., last] => format!("{} and {}", init.join(", "), last),
        }
    }

    /// Tags from `m.tag` account data
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        self.account_data
            .events
            .iter()
            .filter(|event| event.kind == "m.tag")
            .filter_map(|event| event.content.get("tags").and_then(Value::as_object))
            .flat_map(|tags| tags.keys().map(String::as_str))
            .collect()
    }
}

/// A room the user is invited to
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InvitedRoom {
    /// Stripped state shared with the invitee
    #[serde(default)]
    pub invite_state: EventList,
}

impl InvitedRoom {
    /// Name from the `m.room.name` invite state
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.invite_state
            .events
            .iter()
            .filter(|event| event.kind == "m.room.name")
            .find_map(|event| event.content.get("name").and_then(Value::as_str))
    }
}

/// A room the user has left
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LeftRoom {
    /// Final state
    #[serde(default)]
    pub state: EventList,
    /// Final timeline
    #[serde(default)]
    pub timeline: Timeline,
}

/// Rooms grouped by membership
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Rooms {
    /// Joined rooms
    #[serde(default)]
    pub join: BTreeMap<String, JoinedRoom>,
    /// Pending invites
    #[serde(default)]
    pub invite: BTreeMap<String, InvitedRoom>,
    /// Left rooms
    #[serde(default)]
    pub leave: BTreeMap<String, LeftRoom>,
}

/// Server state at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSnapshot {
    /// Token for the next incremental sync
    pub next_batch: String,
    /// Rooms by membership
    #[serde(default)]
    pub rooms: Rooms,
}

impl SyncSnapshot {
    /// Check that every joined room has state and timeline events
    pub fn validate(&self) -> FakeApiResult<()> {
        for (room_id, room) in &self.rooms.join {
            if room.timeline.events.is_empty() {
                return Err(FakeApiError::fixture(format!(
                    "joined room {room_id} has no timeline events"
                )));
            }
            if room.state.events.is_empty() {
                return Err(FakeApiError::fixture(format!(
                    "joined room {room_id} has no state events"
                )));
            }
        }
        Ok(())
    }

    /// Display names of all joined rooms, keyed by room id
    #[must_use]
    pub fn joined_room_names(&self) -> BTreeMap<&str, String> {
        self.rooms
            .join
            .iter()
            .map(|(id, room)| (id.as_str(), room.display_name()))
            .collect()
    }

    /// Joined rooms whose display name contains `query`, ignoring case
    #[must_use]
    pub fn search_rooms(&self, query: &str) -> Vec<&str> {
        let needle = query.to_lowercase();
        self.rooms
            .join
            .iter()
            .filter(|(_, room)| room.display_name().to_lowercase().contains(&needle))
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

// =============================================================================
// Fixture world
// =============================================================================

/// The credentials the login fixture returns
#[must_use]
pub fn credentials() -> Credentials {
    Credentials {
        user_id: FIXTURE_USER_ID.to_string(),
        access_token: FIXTURE_ACCESS_TOKEN.to_string(),
        device_id: FIXTURE_DEVICE_ID.to_string(),
    }
}

fn alice_member_event() -> RoomEvent {
    RoomEvent::new(
        "m.room.member",
        json!({
            "membership": "join",
            "avatar_url": "mxc://example.org/SEsfnsuifSDFSSEF",
            "displayname": ALICE_DISPLAY_NAME,
        }),
    )
    .delivered(JOINED_ROOM_ID)
    .with_state_key(ALICE)
}

fn text_message_event() -> RoomEvent {
    RoomEvent::new(
        "m.room.message",
        json!({
            "body": "This is an example text message",
            "msgtype": "m.text",
            "format": "org.matrix.custom.html",
            "formatted_body": "<b>This is an example text message</b>",
        }),
    )
    .delivered(JOINED_ROOM_ID)
}

fn joined_room() -> JoinedRoom {
    JoinedRoom {
        unread_notifications: UnreadNotifications::default(),
        summary: RoomSummary {
            heroes: vec![ALICE.to_string(), BOB.to_string()],
            joined_member_count: 2,
            invited_member_count: 0,
        },
        state: EventList::new(vec![alice_member_event()]),
        timeline: Timeline {
            events: vec![alice_member_event(), text_message_event()],
            limited: true,
            prev_batch: Some(PREV_BATCH.to_string()),
        },
        ephemeral: EventList::new(vec![RoomEvent::new(
            "m.typing",
            json!({ "user_ids": [ALICE, BOB] }),
        )
        .with_room_id(JOINED_ROOM_ID)]),
        account_data: EventList::new(vec![
            RoomEvent::new("m.tag", json!({ "tags": { "u.work": { "order": 0.9 } } })),
            RoomEvent::new(
                "org.example.custom.room.config",
                json!({ "custom_config_key": "custom_config_value" }),
            ),
        ]),
    }
}

fn invited_room() -> InvitedRoom {
    InvitedRoom {
        invite_state: EventList::new(vec![
            RoomEvent::new("m.room.name", json!({ "name": "My Room Name" }))
                .with_sender(ALICE)
                .with_state_key(""),
            RoomEvent::new("m.room.member", json!({ "membership": "invite" }))
                .with_sender(ALICE)
                .with_state_key(BOB),
        ]),
    }
}

/// The fixed world state the sync fixture returns
#[must_use]
pub fn sync_snapshot() -> SyncSnapshot {
    let mut rooms = Rooms::default();
    rooms.join.insert(JOINED_ROOM_ID.to_string(), joined_room());
    rooms
        .invite
        .insert(INVITED_ROOM_ID.to_string(), invited_room());

    SyncSnapshot {
        next_batch: NEXT_BATCH.to_string(),
        rooms,
    }
}

/// Login response for `requested_url`
pub fn login_fixture(requested_url: &str) -> FakeApiResult<FetchResponse> {
    FetchResponse::json(requested_url, 200, &credentials())
}

/// Sync response for `requested_url`
pub fn sync_fixture(requested_url: &str) -> FakeApiResult<FetchResponse> {
    let snapshot = sync_snapshot();
    snapshot.validate()?;
    FetchResponse::json(requested_url, 200, &snapshot)
}

/// Which fixture a request is answered with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureKind {
    /// Credentials
    Login,
    /// Initial sync snapshot
    Sync,
}

impl FixtureKind {
    /// Build the response for `requested_url`
    pub fn build(self, requested_url: &str) -> FakeApiResult<FetchResponse> {
        match self {
            Self::Login => login_fixture(requested_url),
            Self::Sync => sync_fixture(requested_url),
        }
    }

    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Sync => "sync",
        }
    }
}
