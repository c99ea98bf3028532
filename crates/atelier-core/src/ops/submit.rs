//! Artwork submission.

use crate::{
    error::{Error, ErrorOrigin},
    model::{Artwork, SubmissionPointer},
    store::{Db, contract::StorageBackend},
    types::{ArtId, SeasonId, UserId},
};

impl<B: StorageBackend> Db<B> {
    /// Submit an artwork into a season.
    ///
    /// The submission-pointer `put_if_absent` enforces one submission per
    /// (user, season); the artwork write follows the pointer win. New
    /// artworks start unapproved with zero votes.
    pub fn submit_artwork(
        &self,
        user: &UserId,
        season: &SeasonId,
        art: ArtId,
        title: impl Into<String>,
    ) -> Result<Artwork, Error> {
        let profile = self.require_profile(user)?;
        if !profile.can_submit || profile.submission_quota == 0 {
            return Err(Error::authorization(format!(
                "user {user} is not allowed to submit"
            )));
        }

        let title = title.into();
        if title.trim().is_empty() {
            return Err(Error::validation(
                ErrorOrigin::Store,
                "artwork title must not be empty",
            ));
        }

        let target = self.require_season(season)?;
        if !target.is_active {
            return Err(Error::conflict(
                ErrorOrigin::Store,
                format!("season {season} is not accepting submissions"),
            ));
        }

        let submitted_at = self.now();

        // The pointer is the uniqueness arbiter; it must win first so a
        // losing racer never creates an artwork.
        self.put_submission_pointer_if_absent(&SubmissionPointer {
            user_id: user.clone(),
            season_id: *season,
            art_id: art,
            submitted_at,
        })?;

        let artwork = Artwork {
            art_id: art,
            user_id: user.clone(),
            season_id: *season,
            title,
            votes: 0,
            approved: false,
            submitted_at,
        };
        self.put_artwork_if_absent(&artwork)?;

        Ok(artwork)
    }
}
