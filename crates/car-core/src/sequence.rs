//! Request sequencing
//!
//! Every request channel carries a monotonically increasing sequence number.
//! Only the newest ticket of a channel is current; a completion holding an
//! older ticket was superseded and must be dropped, whatever order the
//! responses arrive in.

use std::fmt;

/// Independent request streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Default table key fetches
    Keys,
    /// Figures directory listings
    Images,
    /// Session loads
    Session,
}

impl Channel {
    const COUNT: usize = 3;

    #[inline]
    fn index(self) -> usize {
        match self {
            Self::Keys => 0,
            Self::Images => 1,
            Self::Session => 2,
        }
    }
}

/// Proof of which request a completion answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    channel: Channel,
    seq: u64,
}

impl Ticket {
    /// Channel this ticket belongs to
    #[inline]
    #[must_use]
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Sequence number within the channel
    #[inline]
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}#{}", self.channel, self.seq)
    }
}

/// Issues tickets and answers whether one is still current
#[derive(Debug, Clone, Default)]
pub struct RequestSequencer {
    latest: [u64; Channel::COUNT],
}

impl RequestSequencer {
    /// Create sequencer with no requests issued
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket, superseding every earlier ticket of the channel
    pub fn issue(&mut self, channel: Channel) -> Ticket {
        let slot = &mut self.latest[channel.index()];
        *slot += 1;
        Ticket {
            channel,
            seq: *slot,
        }
    }

    /// Supersede every outstanding ticket of the channel without issuing one
    pub fn cancel(&mut self, channel: Channel) {
        self.latest[channel.index()] += 1;
    }

    /// True when no newer ticket of the same channel exists
    #[inline]
    #[must_use]
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.latest[ticket.channel.index()] == ticket.seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn newest_ticket_wins() {
        let mut seq = RequestSequencer::new();
        let first = seq.issue(Channel::Keys);
        let second = seq.issue(Channel::Keys);

        assert!(!seq.is_current(&first));
        assert!(seq.is_current(&second));
        assert!(second.seq() > first.seq());
    }

    #[test]
    fn channels_are_independent() {
        let mut seq = RequestSequencer::new();
        let keys = seq.issue(Channel::Keys);
        let images = seq.issue(Channel::Images);
        seq.issue(Channel::Session);

        assert!(seq.is_current(&keys));
        assert!(seq.is_current(&images));
        assert_eq!(images.channel(), Channel::Images);
    }

    #[test]
    fn cancel_supersedes_outstanding() {
        let mut seq = RequestSequencer::new();
        let ticket = seq.issue(Channel::Images);
        seq.cancel(Channel::Images);
        assert!(!seq.is_current(&ticket));

        let next = seq.issue(Channel::Images);
        assert!(seq.is_current(&next));
    }

    #[test]
    fn display() {
        let mut seq = RequestSequencer::new();
        assert_eq!(seq.issue(Channel::Session).to_string(), "Session#1");
    }

    fn channel() -> impl Strategy<Value = Channel> {
        prop_oneof![Just(Channel::Keys), Just(Channel::Images), Just(Channel::Session)]
    }

    proptest! {
        #[test]
        fn prop_only_newest_ticket_is_current(
            steps in prop::collection::vec((channel(), any::<bool>()), 1..40)
        ) {
            let mut seq = RequestSequencer::new();
            let mut issued: Vec<Ticket> = Vec::new();
            for (channel, cancel) in steps {
                if cancel {
                    seq.cancel(channel);
                } else {
                    issued.push(seq.issue(channel));
                }
            }

            for channel in [Channel::Keys, Channel::Images, Channel::Session] {
                let current: Vec<&Ticket> = issued
                    .iter()
                    .filter(|t| t.channel() == channel && seq.is_current(t))
                    .collect();
                prop_assert!(current.len() <= 1);
                if let Some(ticket) = current.first() {
                    let newest = issued.iter().filter(|t| t.channel() == channel).map(Ticket::seq).max();
                    prop_assert_eq!(Some(ticket.seq()), newest);
                }
            }
        }
    }
}
