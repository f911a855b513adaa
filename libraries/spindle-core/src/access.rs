//! Ownership guard
//!
//! Every record has exactly one owner, fixed at creation. A record is visible
//! and mutable to its owner and to elevated actors; everyone else gets
//! [`SpindleError::Forbidden`]. A missing record is the caller's `NotFound`,
//! never folded into this check.

use crate::error::{Result, SpindleError};
use crate::types::{Album, Bookmark, Genre, History, Review, Role, User, UserId};

/// The authenticated caller, resolved upstream from credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_elevated()
    }
}

/// A record with a single immutable owner
pub trait Owned {
    /// Human-readable record kind for error messages
    const KIND: &'static str;

    fn owner(&self) -> &UserId;
}

/// True iff the actor owns the record or holds an elevated role
pub fn allows<R: Owned + ?Sized>(record: &R, actor: &Actor) -> bool {
    record.owner() == &actor.id || actor.role.is_elevated()
}

/// Pass the record through if [`allows`], otherwise `Forbidden`
pub fn authorize<R: Owned>(record: R, actor: &Actor) -> Result<R> {
    if allows(&record, actor) {
        Ok(record)
    } else {
        Err(SpindleError::forbidden(format!(
            "Not allowed! This {} does not belong to you",
            R::KIND
        )))
    }
}

/// Gate for routes reserved to a set of roles
pub fn require_role(actor: &Actor, roles: &[Role]) -> Result<()> {
    if roles.contains(&actor.role) {
        Ok(())
    } else {
        Err(SpindleError::forbidden(
            "You do not have permission to perform this action",
        ))
    }
}

impl Owned for Album {
    const KIND: &'static str = "album";

    fn owner(&self) -> &UserId {
        &self.user
    }
}

impl Owned for Review {
    const KIND: &'static str = "review";

    fn owner(&self) -> &UserId {
        &self.user
    }
}

impl Owned for Genre {
    const KIND: &'static str = "genre";

    fn owner(&self) -> &UserId {
        &self.user
    }
}

impl Owned for Bookmark {
    const KIND: &'static str = "bookmark";

    fn owner(&self) -> &UserId {
        &self.user
    }
}

impl Owned for History {
    const KIND: &'static str = "history";

    fn owner(&self) -> &UserId {
        &self.user
    }
}

/// A user account is owned by itself
impl Owned for User {
    const KIND: &'static str = "account";

    fn owner(&self) -> &UserId {
        &self.id
    }
}
