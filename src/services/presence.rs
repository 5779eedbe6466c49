//! Presence registry: who is in a room, with stable labels and colors.
//!
//! DESIGN
//! ======
//! Each connection identity gets a display number the first time it announces
//! in a room. The identity → number map outlives disconnects so a resumed
//! identity keeps its label; it is purged only when the room empties. The
//! counter itself is never rewound, so a number is never handed out twice for
//! the lifetime of the room entry.
//!
//! Colors are a pure function of the identity (SHA-256 over the identity
//! string, reduced modulo a fixed palette), so every process derives the same
//! color without coordination.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::protocol::{ClientId, RoomUser};

/// Bright, distinguishable user colors.
pub const PALETTE: [&str; 10] = [
    "#FF5252", "#FF9800", "#FFEB3B", "#4CAF50", "#2196F3", "#673AB7", "#E91E63", "#00BCD4", "#009688", "#8BC34A",
];

/// Deterministic palette color for an identity string.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn color_for(identity: &str) -> &'static str {
    let digest = Sha256::digest(identity.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    let index = u64::from_be_bytes(head) % PALETTE.len() as u64;
    PALETTE[index as usize]
}

/// Accept a client-supplied color only when it is a `#rrggbb` hex string.
fn valid_color(color: &str) -> bool {
    color.len() == 7 && color.starts_with('#') && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Result of an announce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announced {
    pub user: RoomUser,
    /// First announce of this identity in the room's lifetime.
    pub is_new: bool,
}

#[derive(Debug, Clone)]
pub struct PresenceRegistry {
    users: Vec<RoomUser>,
    numbers: HashMap<ClientId, u32>,
    next_number: u32,
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { users: Vec::new(), numbers: HashMap::new(), next_number: 1 }
    }

    /// Upsert the connection into the active list. Idempotent per identity.
    pub fn announce(&mut self, client_id: ClientId, preferred_color: Option<&str>) -> Announced {
        let (number, is_new) = match self.numbers.get(&client_id) {
            Some(n) => (*n, false),
            None => {
                let n = self.next_number;
                self.next_number += 1;
                self.numbers.insert(client_id, n);
                (n, true)
            }
        };

        let color = preferred_color
            .filter(|c| valid_color(c))
            .map_or_else(|| color_for(&client_id.to_string()).to_owned(), str::to_owned);
        let user = RoomUser { id: client_id, name: format!("User {number}"), color };

        match self.users.iter_mut().find(|u| u.id == client_id) {
            Some(existing) => *existing = user.clone(),
            None => self.users.push(user.clone()),
        }

        Announced { user, is_new }
    }

    /// Drop the connection from the active list. The number mapping stays.
    pub fn remove(&mut self, client_id: ClientId) -> Option<RoomUser> {
        let index = self.users.iter().position(|u| u.id == client_id)?;
        Some(self.users.remove(index))
    }

    /// Forget every identity → number mapping. Called once the room is empty.
    pub fn purge(&mut self) {
        self.users.clear();
        self.numbers.clear();
    }

    #[must_use]
    pub fn users(&self) -> &[RoomUser] {
        &self.users
    }

    #[must_use]
    pub fn number_of(&self, client_id: ClientId) -> Option<u32> {
        self.numbers.get(&client_id).copied()
    }
}

#[cfg(test)]
#[path = "presence_test.rs"]
mod tests;
