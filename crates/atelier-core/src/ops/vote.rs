//! Voting: the canonical two-step conditional-write flow.

use crate::{
    error::Error,
    model::VotePointer,
    obs::{self, MetricsEvent},
    store::{Db, contract::StorageBackend},
    types::{ArtId, UserId},
};

impl<B: StorageBackend> Db<B> {
    /// Cast one vote for an artwork. Returns the new vote count.
    ///
    /// The vote-pointer `put_if_absent` is the sole arbiter of
    /// one-vote-per-(user, artwork); only the winner issues the atomic
    /// counter add, so concurrent votes never lose increments. The vote
    /// index projection is refreshed afterward under a count re-check,
    /// which a racing later vote is allowed to win.
    pub fn cast_vote(&self, voter: &UserId, art: &ArtId) -> Result<u64, Error> {
        self.require_profile(voter)?;
        let mut artwork = self.require_artwork(art)?;

        let pointer = VotePointer {
            user_id: voter.clone(),
            art_id: *art,
            voted_at: self.now(),
        };
        self.put_vote_pointer_if_absent(&pointer)?;

        // The pointer won; the count must follow even if this call fails
        // midway, so a re-run of the projection refresh can repair it.
        artwork.votes = self.increment_votes(art)?;

        if self.refresh_vote_projection(&artwork).is_err() {
            obs::record(MetricsEvent::CascadeStepFailed {
                step: "vote_projection",
            });
        }

        Ok(artwork.votes)
    }
}
