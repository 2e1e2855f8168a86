use serde::{Deserialize, Serialize};

/// Chat mode requested by the caller for an outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    /// Public chat, visible to everyone nearby
    Public,
    /// Friends chat channel
    FriendsChat,
    /// Main clan channel
    ClanMain,
    /// Guest clan channel
    ClanGuest,
    /// Group-ironman clan channel (delivered as ClanMain with the ironman clan type)
    ClanGim,
    /// Private message to a named target
    Private,
}

impl ChatMode {
    /// Integer value carried in the delivery payload.
    pub fn value(self) -> i32 {
        match self {
            ChatMode::Public => 0,
            ChatMode::FriendsChat => 1,
            ChatMode::ClanMain => 2,
            ChatMode::ClanGuest => 3,
            ChatMode::ClanGim => 4,
            ChatMode::Private => 5,
        }
    }

    /// Resolve the requested mode into the delivered mode and clan type.
    ///
    /// `ClanGim` is the only remap: it is delivered as `ClanMain` with
    /// `ClanType::Ironman`. Every other mode delivers as itself with
    /// `ClanType::Normal`. Pure mapping, no throttle interaction.
    pub fn resolve(self) -> (ChatMode, ClanType) {
        match self {
            ChatMode::ClanGim => (ChatMode::ClanMain, ClanType::Ironman),
            other => (other, ClanType::Normal),
        }
    }

    /// Short label used by the demo REPL and status output.
    pub fn label(self) -> &'static str {
        match self {
            ChatMode::Public => "public",
            ChatMode::FriendsChat => "friends",
            ChatMode::ClanMain => "clan",
            ChatMode::ClanGuest => "guest",
            ChatMode::ClanGim => "gim",
            ChatMode::Private => "private",
        }
    }

    /// Parse a user-supplied mode label (accepts short and full spellings).
    pub fn from_label(label: &str) -> Option<ChatMode> {
        match label.to_lowercase().as_str() {
            "public" => Some(ChatMode::Public),
            "friends" | "friends_chat" | "fc" => Some(ChatMode::FriendsChat),
            "clan" | "clan_main" => Some(ChatMode::ClanMain),
            "guest" | "clan_guest" => Some(ChatMode::ClanGuest),
            "gim" | "clan_gim" => Some(ChatMode::ClanGim),
            "private" | "pm" => Some(ChatMode::Private),
            _ => None,
        }
    }
}

/// Clan type derived from the chat mode, never supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClanType {
    Normal,
    Ironman,
}

impl ClanType {
    /// Integer value carried in the delivery payload.
    pub fn value(self) -> i32 {
        match self {
            ClanType::Normal => 0,
            ClanType::Ironman => 1,
        }
    }
}

/// Requests sent from the message service to the delivery client thread
#[derive(Debug, Clone)]
pub enum DeliveryRequest {
    /// Deliver a public-style message (public, friends, clan channels)
    Public {
        text: String,
        mode_value: i32,
        clan_value: i32,
    },
    /// Deliver a private message to a named target
    Private { target: String, text: String },
    /// Stop the client loop
    Shutdown,
}

/// Events emitted to observers (fire-and-forget, unordered relative to delivery)
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// A public-style message was handed to the engine
    SendAccepted {
        text: String,
        mode_value: i32,
        clan_value: i32,
    },
    /// A private message was recorded for input history
    PrivateSendRecorded { text: String },
    /// A private message was handed to the engine
    PrivateSendAccepted { text: String, target: String },
    /// A send was refused by the lockout
    SendLocked {
        target: Option<String>,
        locked_until: u64,
        private: bool,
    },
    /// The delivery engine reported a failure
    Error(String),
}
