use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ordering::Scoped;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Open role slot on a game that umpires apply to.
    PostId
);
record_id!(LeagueId);
record_id!(DivisionId);
record_id!(RoleId);
record_id!(UserId);

/// An umpire's application to a post. Position 0 is casted, the rest are backups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub post: PostId,
    pub user: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl Scoped for Application {
    type Scope = PostId;
    const KIND: &'static str = "application";
    const COLLECTION: &'static str = "applications";
    const SCOPE_COLLECTION: &'static str = "posts";

    fn scope_key(&self) -> PostId {
        self.post
    }
}

/// Competitive division inside a league, ordered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Division {
    pub league: LeagueId,
    pub title: String,
    /// Roster-sync identifier; 0 when the division was created locally.
    #[serde(default)]
    pub ts_id: i64,
}

impl Scoped for Division {
    type Scope = LeagueId;
    const KIND: &'static str = "division";
    const COLLECTION: &'static str = "divisions";
    const SCOPE_COLLECTION: &'static str = "leagues";

    fn scope_key(&self) -> LeagueId {
        self.league
    }
}

/// Officiating role (plate, base, ...) offered within a division.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub division: DivisionId,
    pub title: String,
}

impl Scoped for Role {
    type Scope = DivisionId;
    const KIND: &'static str = "role";
    const COLLECTION: &'static str = "roles";
    const SCOPE_COLLECTION: &'static str = "divisions";

    fn scope_key(&self) -> DivisionId {
        self.division
    }
}

/// Umpire skill level, ranked within its league.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub league: LeagueId,
    pub title: String,
    /// Roles an umpire at this level may apply for.
    #[serde(default)]
    pub visibilities: Vec<RoleId>,
}

impl Scoped for Level {
    type Scope = LeagueId;
    const KIND: &'static str = "level";
    const COLLECTION: &'static str = "levels";
    const SCOPE_COLLECTION: &'static str = "leagues";

    fn scope_key(&self) -> LeagueId {
        self.league
    }
}
