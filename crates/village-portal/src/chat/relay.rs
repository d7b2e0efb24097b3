use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::bot::BotResponder;
use super::presence::PresenceRegistry;
use crate::clock::Clock;
use crate::residents::ResidentId;

pub const BOT_SENDER: &str = "village-bot";
pub const MAX_BODY_CHARS: usize = 2000;
const MAX_ROOM_CHARS: usize = 64;
const CHANNEL_CAPACITY: usize = 64;

static MESSAGE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_message_id() -> String {
    let id = MESSAGE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("msg-{id:06}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub room: String,
    pub sender: String,
    pub recipient: Option<ResidentId>,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub from_bot: bool,
}

struct Room {
    sender: broadcast::Sender<ChatMessage>,
    history: VecDeque<ChatMessage>,
}

impl Room {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            history: VecDeque::new(),
        }
    }
}

/// Room fan-out with bounded history and an automatic reply when the addressee is offline.
pub struct ChatRelay<P, B> {
    presence: Arc<P>,
    bot: Arc<B>,
    clock: Arc<dyn Clock>,
    history_limit: usize,
    rooms: Mutex<HashMap<String, Room>>,
}

impl<P, B> ChatRelay<P, B>
where
    P: PresenceRegistry + 'static,
    B: BotResponder + 'static,
{
    pub fn new(
        presence: Arc<P>,
        bot: Arc<B>,
        clock: Arc<dyn Clock>,
        history_limit: usize,
    ) -> Self {
        Self {
            presence,
            bot,
            clock,
            history_limit: history_limit.max(1),
            rooms: Mutex::new(HashMap::new()),
        }
    }

    pub fn presence(&self) -> &P {
        self.presence.as_ref()
    }

    /// Deliver a message to the room and return everything that was delivered as a result.
    pub fn post(
        &self,
        room: &str,
        sender: &ResidentId,
        recipient: Option<ResidentId>,
        body: &str,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        let room = validate_room(room)?;
        let body = body.trim();
        if body.is_empty() {
            return Err(ChatError::EmptyBody);
        }
        if body.chars().count() > MAX_BODY_CHARS {
            return Err(ChatError::BodyTooLong {
                max: MAX_BODY_CHARS,
            });
        }

        let now = self.clock.now();
        let message = ChatMessage {
            id: next_message_id(),
            room: room.to_string(),
            sender: sender.0.clone(),
            recipient: recipient.clone(),
            body: body.to_string(),
            sent_at: now,
            from_bot: false,
        };
        let mut delivered = vec![message];

        if let Some(addressee) = recipient.filter(|addressee| !self.presence.is_online(addressee))
        {
            if let Some(reply) = self.bot.reply(body) {
                info!(room, addressee = %addressee, "recipient offline; bot replied");
                delivered.push(ChatMessage {
                    id: next_message_id(),
                    room: room.to_string(),
                    sender: BOT_SENDER.to_string(),
                    recipient: Some(sender.clone()),
                    body: reply,
                    sent_at: now,
                    from_bot: true,
                });
            }
        }

        let mut rooms = self.rooms();
        let entry = rooms.entry(room.to_string()).or_insert_with(Room::new);
        for message in &delivered {
            entry.history.push_back(message.clone());
            while entry.history.len() > self.history_limit {
                entry.history.pop_front();
            }
            // No subscribers is not an error; history still holds the message.
            if entry.sender.send(message.clone()).is_err() {
                debug!(room, "no live subscribers for room");
            }
        }

        Ok(delivered)
    }

    pub fn subscribe(&self, room: &str) -> Result<broadcast::Receiver<ChatMessage>, ChatError> {
        let room = validate_room(room)?;
        let mut rooms = self.rooms();
        Ok(rooms
            .entry(room.to_string())
            .or_insert_with(Room::new)
            .sender
            .subscribe())
    }

    /// Retained messages, oldest first.
    pub fn history(&self, room: &str) -> Result<Vec<ChatMessage>, ChatError> {
        let room = validate_room(room)?;
        Ok(self
            .rooms()
            .get(room)
            .map(|entry| entry.history.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<String, Room>> {
        match self.rooms.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn validate_room(room: &str) -> Result<&str, ChatError> {
    let room = room.trim();
    let valid = !room.is_empty()
        && room.len() <= MAX_ROOM_CHARS
        && room
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(room)
    } else {
        Err(ChatError::InvalidRoom(room.to_string()))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("message body must not be empty")]
    EmptyBody,
    #[error("message body must be at most {max} characters")]
    BodyTooLong { max: usize },
    #[error("room name '{0}' is invalid")]
    InvalidRoom(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::bot::KeywordBot;
    use crate::chat::presence::InMemoryPresence;
    use crate::test_support::{base_time, ManualClock};

    fn relay(limit: usize) -> ChatRelay<InMemoryPresence, KeywordBot> {
        ChatRelay::new(
            Arc::new(InMemoryPresence::default()),
            Arc::new(KeywordBot),
            ManualClock::at(base_time()),
            limit,
        )
    }

    fn id(raw: &str) -> ResidentId {
        ResidentId(raw.to_string())
    }

    #[test]
    fn bot_answers_when_the_officer_is_offline() {
        let relay = relay(50);

        let delivered = relay
            .post(
                "general",
                &id("res-000001"),
                Some(id("off-1")),
                "How long does the certificate take?",
            )
            .expect("post succeeds");

        assert_eq!(delivered.len(), 2);
        assert!(!delivered[0].from_bot);
        assert!(delivered[1].from_bot);
        assert_eq!(delivered[1].sender, BOT_SENDER);
        assert_eq!(delivered[1].recipient, Some(id("res-000001")));
    }

    #[test]
    fn no_bot_reply_when_the_officer_is_online() {
        let relay = relay(50);
        relay.presence().connect(&id("off-1"));

        let delivered = relay
            .post(
                "general",
                &id("res-000001"),
                Some(id("off-1")),
                "How long does the certificate take?",
            )
            .expect("post succeeds");

        assert_eq!(delivered.len(), 1);
    }

    #[test]
    fn no_bot_reply_without_a_recipient_or_a_match() {
        let relay = relay(50);

        let broadcast = relay
            .post("general", &id("res-000001"), None, "certificate question")
            .expect("post succeeds");
        let unmatched = relay
            .post("general", &id("res-000001"), Some(id("off-1")), "Ayubowan!")
            .expect("post succeeds");

        assert_eq!(broadcast.len(), 1);
        assert_eq!(unmatched.len(), 1);
    }

    #[test]
    fn history_is_bounded_and_oldest_first() {
        let relay = relay(3);
        for n in 1..=5 {
            relay
                .post("general", &id("res-000001"), None, &format!("message {n}"))
                .expect("post succeeds");
        }

        let bodies: Vec<String> = relay
            .history("general")
            .expect("history")
            .into_iter()
            .map(|message| message.body)
            .collect();
        assert_eq!(bodies, vec!["message 3", "message 4", "message 5"]);
        assert!(relay.history("quiet").expect("history").is_empty());
    }

    #[test]
    fn bodies_and_rooms_are_validated() {
        let relay = relay(50);
        let sender = id("res-000001");

        assert_eq!(
            relay.post("general", &sender, None, "   "),
            Err(ChatError::EmptyBody)
        );
        assert_eq!(
            relay.post("general", &sender, None, &"a".repeat(MAX_BODY_CHARS + 1)),
            Err(ChatError::BodyTooLong {
                max: MAX_BODY_CHARS
            })
        );
        assert!(matches!(
            relay.post("bad room!", &sender, None, "hello"),
            Err(ChatError::InvalidRoom(_))
        ));
    }

    #[tokio::test]
    async fn subscribers_receive_room_messages() {
        let relay = relay(50);
        let mut receiver = relay.subscribe("ward-3").expect("subscribe");

        relay
            .post("ward-3", &id("res-000001"), None, "Water supply restored")
            .expect("post succeeds");

        let message = receiver.recv().await.expect("message delivered");
        assert_eq!(message.body, "Water supply restored");
        assert_eq!(message.sent_at, base_time());
    }
}
