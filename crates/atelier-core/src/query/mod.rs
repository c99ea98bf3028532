//! List-query planning over the artwork projections.
//!
//! A listing names a season and an ordering; the planner maps that to one
//! of the two secondary projections and a scan direction, verifies any
//! continuation cursor against the query's signature, and re-wraps the
//! backend resume position as an opaque token.

use crate::{
    cursor::{ContinuationSignature, decode_token, encode_token},
    error::Error,
    model::Artwork,
    obs::StoreOp,
    store::{
        Db,
        contract::{Index, ScanDirection, StorageBackend},
    },
    types::SeasonId,
};
use serde::Serialize;

/// Hard ceiling on page size; larger requests are clamped, not rejected.
pub const MAX_PAGE_SIZE: usize = 50;

/// Page size used when the caller asks for zero items.
pub const DEFAULT_PAGE_SIZE: usize = 20;

///
/// ArtOrder
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArtOrder {
    /// Newest submissions first.
    Recent,
    /// Highest vote count first, newest first within a count.
    MostVoted,
}

impl ArtOrder {
    /// Stable tag hashed into the continuation signature.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Recent => "recent",
            Self::MostVoted => "most_voted",
        }
    }

    const fn index(self) -> Index {
        match self {
            Self::Recent => Index::SubmittedAt,
            Self::MostVoted => Index::Votes,
        }
    }
}

///
/// Page
///

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,

    /// Opaque continuation token; absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl<B: StorageBackend> Db<B> {
    /// One page of a season's artworks in the requested order. An unknown
    /// season yields an empty page rather than an error; the projections
    /// simply have no entries for it.
    pub fn list_artworks(
        &self,
        season: &SeasonId,
        order: ArtOrder,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<Page<Artwork>, Error> {
        let limit = clamp_page_size(limit);
        let signature = ContinuationSignature::sign(season, order.tag());

        let start_after = cursor
            .map(|token| decode_token(token, &signature))
            .transpose()?;

        let pk = season.to_string();
        let page = self
            .call(StoreOp::QueryIndex, || {
                self.backend.query_index(
                    order.index(),
                    &pk,
                    ScanDirection::Descending,
                    limit,
                    start_after.as_ref(),
                )
            })
            .map_err(|err| Self::store_err(err, "artwork listing"))?;

        let items = page
            .items
            .iter()
            .map(|item| Artwork::try_from_item(item).map_err(Error::from))
            .collect::<Result<Vec<_>, _>>()?;

        let cursor = page
            .resume
            .as_ref()
            .map(|position| encode_token(&signature, position))
            .transpose()?;

        Ok(Page { items, cursor })
    }
}

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`, with zero meaning
/// "use the default".
#[must_use]
pub const fn clamp_page_size(requested: usize) -> usize {
    if requested == 0 {
        DEFAULT_PAGE_SIZE
    } else if requested > MAX_PAGE_SIZE {
        MAX_PAGE_SIZE
    } else {
        requested
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        store::{memory::MemoryBackend, retry::RetryPolicy},
        types::{ArtId, Timestamp, UserId},
    };
    use ulid::Ulid;

    fn db() -> Db<MemoryBackend> {
        Db::new(MemoryBackend::new()).with_retry(RetryPolicy::immediate())
    }

    fn season(n: u128) -> SeasonId {
        SeasonId::from_ulid(Ulid::from_parts(1_700_000_000_000, n))
    }

    fn seed(db: &Db<MemoryBackend>, season: &SeasonId, n: u128, votes: u64, at_millis: u64) {
        let artwork = Artwork {
            art_id: ArtId::from_ulid(Ulid::from_parts(1_700_000_100_000, n)),
            user_id: UserId::new("auth0|alice").expect("valid id"),
            season_id: *season,
            title: format!("Piece {n}"),
            votes,
            approved: true,
            submitted_at: Timestamp::from_unix_millis(at_millis),
        };
        db.put_artwork_if_absent(&artwork).expect("seed");
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(clamp_page_size(0), DEFAULT_PAGE_SIZE);
        assert_eq!(clamp_page_size(1), 1);
        assert_eq!(clamp_page_size(MAX_PAGE_SIZE), MAX_PAGE_SIZE);
        assert_eq!(clamp_page_size(MAX_PAGE_SIZE + 1), MAX_PAGE_SIZE);
        assert_eq!(clamp_page_size(usize::MAX), MAX_PAGE_SIZE);
    }

    #[test]
    fn most_voted_orders_numerically_not_lexically() {
        let db = db();
        let season = season(1);
        let base = 1_764_588_000_000;
        for (n, votes) in [(1, 3_u64), (2, 30), (3, 8), (4, 0)] {
            seed(&db, &season, n as u128, votes, base + n);
        }

        let page = db
            .list_artworks(&season, ArtOrder::MostVoted, 10, None)
            .expect("list");
        let counts: Vec<u64> = page.items.iter().map(|a| a.votes).collect();
        assert_eq!(counts, vec![30, 8, 3, 0]);
        assert!(page.cursor.is_none());
    }

    #[test]
    fn vote_ties_break_toward_the_newer_submission() {
        let db = db();
        let season = season(1);
        seed(&db, &season, 1, 5, 1_764_588_000_000);
        seed(&db, &season, 2, 5, 1_764_588_100_000);

        let page = db
            .list_artworks(&season, ArtOrder::MostVoted, 10, None)
            .expect("list");
        assert_eq!(
            page.items[0].submitted_at,
            Timestamp::from_unix_millis(1_764_588_100_000)
        );
    }

    #[test]
    fn recent_orders_newest_first() {
        let db = db();
        let season = season(1);
        seed(&db, &season, 1, 9, 1_764_588_000_000);
        seed(&db, &season, 2, 0, 1_764_588_200_000);
        seed(&db, &season, 3, 4, 1_764_588_100_000);

        let page = db
            .list_artworks(&season, ArtOrder::Recent, 10, None)
            .expect("list");
        let times: Vec<Timestamp> = page.items.iter().map(|a| a.submitted_at).collect();
        assert_eq!(
            times,
            vec![
                Timestamp::from_unix_millis(1_764_588_200_000),
                Timestamp::from_unix_millis(1_764_588_100_000),
                Timestamp::from_unix_millis(1_764_588_000_000),
            ]
        );
    }

    #[test]
    fn pagination_walks_the_whole_season_without_repeats() {
        let db = db();
        let season = season(1);
        for n in 0..7_u128 {
            #[allow(clippy::cast_possible_truncation)]
            seed(&db, &season, n, n as u64, 1_764_588_000_000 + n as u64);
        }

        let mut seen = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = db
                .list_artworks(&season, ArtOrder::MostVoted, 3, cursor.as_deref())
                .expect("list");
            seen.extend(page.items.iter().map(|a| a.votes));
            match page.cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        assert_eq!(seen, vec![6, 5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn a_cursor_from_another_ordering_is_rejected() {
        let db = db();
        let season = season(1);
        for n in 0..4_u128 {
            #[allow(clippy::cast_possible_truncation)]
            seed(&db, &season, n, n as u64, 1_764_588_000_000 + n as u64);
        }

        let page = db
            .list_artworks(&season, ArtOrder::MostVoted, 2, None)
            .expect("list");
        let token = page.cursor.expect("more pages exist");

        let err = db
            .list_artworks(&season, ArtOrder::Recent, 2, Some(&token))
            .expect_err("foreign cursor must fail closed");
        assert!(err.is_validation());
    }

    #[test]
    fn listings_are_scoped_to_one_season() {
        let db = db();
        let here = season(1);
        let there = season(2);
        seed(&db, &here, 1, 5, 1_764_588_000_000);
        seed(&db, &there, 2, 9, 1_764_588_000_001);

        let page = db
            .list_artworks(&here, ArtOrder::MostVoted, 10, None)
            .expect("list");
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].votes, 5);
    }

    #[test]
    fn an_unknown_season_lists_as_empty() {
        let db = db();
        let page = db
            .list_artworks(&season(42), ArtOrder::Recent, 10, None)
            .expect("list");
        assert!(page.items.is_empty());
        assert!(page.cursor.is_none());
    }
}
