//! Per-session channel buffers, newest session last.
use sampler_traits::Channel;

use crate::buffer::ChannelBuffer;

/// Data captured by one sweep or automatic sequence.
#[derive(Debug, Clone, Default)]
pub struct SessionEntry {
    pub thrust: ChannelBuffer,
    pub torque: ChannelBuffer,
    pub speed: ChannelBuffer,
}

impl SessionEntry {
    pub fn channel(&self, channel: Channel) -> &ChannelBuffer {
        match channel {
            Channel::Thrust => &self.thrust,
            Channel::Torque => &self.torque,
            Channel::Speed => &self.speed,
        }
    }

    pub fn channel_mut(&mut self, channel: Channel) -> &mut ChannelBuffer {
        match channel {
            Channel::Thrust => &mut self.thrust,
            Channel::Torque => &mut self.torque,
            Channel::Speed => &mut self.speed,
        }
    }

    /// Total samples across all channels.
    pub fn sample_count(&self) -> usize {
        Channel::ALL.iter().map(|c| self.channel(*c).len()).sum()
    }
}

/// Ordered list of sessions. The active session is always the newest one.
#[derive(Debug, Default)]
pub struct SessionStore {
    entries: Vec<SessionEntry>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new session and return its index.
    pub fn begin(&mut self) -> usize {
        self.entries.push(SessionEntry::default());
        self.entries.len() - 1
    }

    pub fn active_index(&self) -> Option<usize> {
        self.entries.len().checked_sub(1)
    }

    pub fn active(&self) -> Option<&SessionEntry> {
        self.entries.last()
    }

    pub fn active_mut(&mut self) -> Option<&mut SessionEntry> {
        self.entries.last_mut()
    }

    pub fn get(&self, index: usize) -> Option<&SessionEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
