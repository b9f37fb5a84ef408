//! Cursor manager for a single shard.
//!
//! Owns the rotating position token the poll loop reads with. The manager
//! never self-heals an expired cursor: the poll loop observes the
//! distinguished failure, calls [`CursorManager::invalidate`], and the next
//! iteration re-initializes.

use tracing::{debug, info};

use crate::consumer::messages::{Cursor, IteratorType, Shard};
use crate::consumer::shard_stream::ShardStream;
use crate::errors::StreamError;

/// Result of adopting the cursor from a batch read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// A next cursor was adopted; reading continues.
    Active,
    /// The shard reported no next cursor: it has been permanently closed.
    /// This is shard exhaustion, not an error.
    Exhausted,
}

/// Tracks the current read position on one shard.
///
/// The poll loop is the only reader and writer of the held cursor; there is
/// no concurrent mutation.
pub struct CursorManager {
    shard: Shard,
    iterator_type: IteratorType,
    current: Option<Cursor>,
}

impl CursorManager {
    /// Create a manager for the given shard with no cursor held yet.
    pub fn new(shard: Shard, iterator_type: IteratorType) -> Self {
        Self {
            shard,
            iterator_type,
            current: None,
        }
    }

    /// Obtain a starting cursor from the stream using the configured
    /// iterator type.
    pub async fn initialize(&mut self, stream: &dyn ShardStream) -> Result<(), StreamError> {
        let cursor = stream.shard_iterator(&self.shard, self.iterator_type).await?;

        info!(
            shard_id = %self.shard.shard_id,
            iterator_type = self.iterator_type.as_str(),
            "Initialized shard cursor"
        );

        self.current = Some(cursor);
        Ok(())
    }

    /// The cursor the next read should use, if one is held.
    pub fn current(&self) -> Option<&Cursor> {
        self.current.as_ref()
    }

    /// Adopt the next cursor returned by a successful batch read.
    ///
    /// `None` signals that the shard has been permanently closed.
    pub fn advance(&mut self, next: Option<Cursor>) -> CursorState {
        match next {
            Some(cursor) => {
                self.current = Some(cursor);
                CursorState::Active
            }
            None => {
                debug!(shard_id = %self.shard.shard_id, "Shard reported no next cursor");
                self.current = None;
                CursorState::Exhausted
            }
        }
    }

    /// Drop the held cursor after the stream rejected it as expired.
    pub fn invalidate(&mut self) {
        self.current = None;
    }

    /// The shard this manager reads.
    pub fn shard(&self) -> &Shard {
        &self.shard
    }
}
