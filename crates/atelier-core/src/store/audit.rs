use crate::{
    error::Error,
    keyspace::{AuditSubject, admin_action_prefix},
    model::AdminAction,
    obs::StoreOp,
    store::{
        Db,
        contract::{Condition, StorageBackend},
    },
};

impl<B: StorageBackend> Db<B> {
    /// Append one audit record. The write is unconditional: audit entries
    /// are keyed by subject and millisecond timestamp plus a caller suffix,
    /// and a same-millisecond overwrite is preferred over losing the
    /// mutation that already happened.
    pub(crate) fn append_admin_action(&self, action: &AdminAction) -> Result<(), Error> {
        let item = action.to_item()?;
        self.call(StoreOp::Put, || {
            self.backend.put(item.clone(), Condition::None)
        })
        .map_err(|err| Self::store_err(err, "admin action"))
    }

    /// Audit trail of one subject, oldest first. The sort key embeds the
    /// encoded timestamp, so partition order is chronological order.
    pub fn admin_actions(&self, subject: &AuditSubject) -> Result<Vec<AdminAction>, Error> {
        let pk = subject.partition();
        let items = self
            .call(StoreOp::QueryPrefix, || {
                self.backend.query_prefix(&pk, admin_action_prefix())
            })
            .map_err(|err| Self::store_err(err, "admin action list"))?;

        items
            .iter()
            .map(|item| AdminAction::try_from_item(item).map_err(Error::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::AdminActionKind,
        store::{memory::MemoryBackend, retry::RetryPolicy},
        types::{Timestamp, UserId},
    };

    fn db() -> Db<MemoryBackend> {
        Db::new(MemoryBackend::new()).with_retry(RetryPolicy::immediate())
    }

    fn action(at_millis: u64, kind: AdminActionKind) -> AdminAction {
        AdminAction {
            subject: AuditSubject::User(UserId::new("auth0|bob").expect("valid id")),
            actor_id: UserId::new("auth0|admin").expect("valid id"),
            kind,
            old_value: None,
            new_value: None,
            detail: None,
            at: Timestamp::from_unix_millis(at_millis),
            suffix: None,
        }
    }

    #[test]
    fn trail_comes_back_oldest_first() {
        let db = db();
        db.append_admin_action(&action(2_000, AdminActionKind::BanChanged))
            .expect("append");
        db.append_admin_action(&action(1_000, AdminActionKind::RoleChanged))
            .expect("append");

        let trail = db
            .admin_actions(&AuditSubject::User(
                UserId::new("auth0|bob").expect("valid id"),
            ))
            .expect("list");
        assert_eq!(
            trail.iter().map(|a| a.kind).collect::<Vec<_>>(),
            vec![AdminActionKind::RoleChanged, AdminActionKind::BanChanged]
        );
    }

    #[test]
    fn same_millisecond_entries_survive_via_suffixes() {
        let db = db();
        let mut first = action(1_000, AdminActionKind::RoleChanged);
        first.suffix = Some("role_changed".to_string());
        let mut second = action(1_000, AdminActionKind::BanChanged);
        second.suffix = Some("ban_changed".to_string());

        db.append_admin_action(&first).expect("append");
        db.append_admin_action(&second).expect("append");

        let trail = db
            .admin_actions(&AuditSubject::User(
                UserId::new("auth0|bob").expect("valid id"),
            ))
            .expect("list");
        assert_eq!(trail.len(), 2);
    }
}
