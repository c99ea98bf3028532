//! Season lifecycle operations.

use crate::{
    error::{Error, ErrorOrigin},
    keyspace::{AuditSubject, season_key},
    model::{
        AdminAction, AdminActionKind, Season,
        season::ATTR_PAYMENT_REQUIRED,
    },
    external::classify_invocation,
    store::{
        Db,
        contract::{Condition, StorageBackend, Update},
        item::Attr,
        season::SeasonFilter,
    },
    types::{SeasonId, Timestamp, UserId},
};
use serde_json::Value;

impl<B: StorageBackend> Db<B> {
    /// Create a season. Names are unique case-insensitively across every
    /// season, active or not; new seasons always start inactive.
    pub fn create_season(
        &self,
        actor: &UserId,
        season_id: SeasonId,
        name: impl Into<String>,
        payment_required: bool,
        starts_at: Timestamp,
    ) -> Result<Season, Error> {
        self.require_admin(actor)?;

        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::validation(
                ErrorOrigin::Store,
                "season name must not be empty",
            ));
        }

        let lowered = name.to_lowercase();
        let clash = self
            .list_seasons(SeasonFilter::All)?
            .into_iter()
            .find(|season| season.name.to_lowercase() == lowered);
        if let Some(clash) = clash {
            return Err(Error::conflict(
                ErrorOrigin::Store,
                format!("season name {name:?} is already taken by {}", clash.season_id),
            ));
        }

        let season = Season {
            season_id,
            name: name.clone(),
            is_active: false,
            payment_required,
            starts_at,
        };
        self.put_season_if_absent(&season)?;

        self.append_admin_action(&AdminAction {
            subject: AuditSubject::Season,
            actor_id: actor.clone(),
            kind: AdminActionKind::SeasonCreated,
            old_value: None,
            new_value: Some(name),
            detail: Some(season_id.to_string()),
            at: self.now(),
            suffix: Some(format!("{}#{season_id}", AdminActionKind::SeasonCreated)),
        })?;

        Ok(season)
    }

    /// Flip a season's active flag. The flag lives in the sort key, so the
    /// transition is delete-old-key then put-new-key under the same season
    /// id, never an in-place mutation.
    pub fn set_season_active(
        &self,
        actor: &UserId,
        season_id: &SeasonId,
        active: bool,
    ) -> Result<Season, Error> {
        self.require_admin(actor)?;
        let mut season = self.require_season(season_id)?;

        if season.is_active == active {
            return Err(Error::conflict(
                ErrorOrigin::Store,
                format!("season {season_id} already has active={active}"),
            ));
        }

        self.guarded_delete(&season_key(season_id, season.is_active), "season")?;
        season.is_active = active;
        self.put_season_if_absent(&season)?;

        self.append_admin_action(&AdminAction {
            subject: AuditSubject::Season,
            actor_id: actor.clone(),
            kind: AdminActionKind::SeasonActivation,
            old_value: Some((!active).to_string()),
            new_value: Some(active.to_string()),
            detail: Some(season_id.to_string()),
            at: self.now(),
            suffix: Some(format!("{}#{season_id}", AdminActionKind::SeasonActivation)),
        })?;

        Ok(season)
    }

    /// Clear a season's payment-required flag, allowed only true→false.
    /// The flag is re-checked in the conditional write, so a concurrent
    /// payment loses with `Gone` instead of double-clearing.
    pub fn mark_season_paid(&self, actor: &UserId, season_id: &SeasonId) -> Result<Season, Error> {
        self.require_admin(actor)?;
        let mut season = self.require_season(season_id)?;

        if !season.payment_required {
            return Err(Error::conflict(
                ErrorOrigin::Store,
                format!("season {season_id} does not require payment"),
            ));
        }

        let update = Update::default()
            .set(ATTR_PAYMENT_REQUIRED, false)
            .condition(Condition::AttrEquals(ATTR_PAYMENT_REQUIRED, Attr::Bool(true)));
        self.guarded_update(&season_key(season_id, season.is_active), update, "season")?;

        self.append_admin_action(&AdminAction {
            subject: AuditSubject::Season,
            actor_id: actor.clone(),
            kind: AdminActionKind::SeasonPaid,
            old_value: Some(true.to_string()),
            new_value: Some(false.to_string()),
            detail: Some(season_id.to_string()),
            at: self.now(),
            suffix: Some(format!("{}#{season_id}", AdminActionKind::SeasonPaid)),
        })?;

        season.payment_required = false;
        Ok(season)
    }

    /// Hand a season to the lifecycle worker for rollover. The worker call
    /// is opaque; any non-200 status or an `errorMessage` field in the
    /// response payload fails the operation with a dependency error.
    pub fn request_season_rollover(
        &self,
        actor: &UserId,
        season_id: &SeasonId,
    ) -> Result<Value, Error> {
        self.require_admin(actor)?;
        self.require_season(season_id)?;

        let payload = serde_json::json!({ "season_id": season_id.to_string() });
        let invocation = self
            .lifecycle
            .invoke("season_rollover", &payload)
            .map_err(|err| Error::dependency(ErrorOrigin::Lifecycle, err.to_string()))?;

        classify_invocation(invocation)
    }
}
