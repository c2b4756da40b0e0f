//! Team roster model.
//!
//! The roster is fixed input: an ordered list of members plus the pair of
//! senior leaders who must never share a working shift. Roster order is
//! significant, it breaks ties in key-holder selection.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::validation::validate_roster;

/// Gender category used by the one-male-per-shift rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

/// A team member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Stable short code.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Gender category.
    pub gender: Gender,
    /// Whether the member can lead a shift (and hold the key).
    pub is_leader: bool,
}

impl Member {
    /// Creates a non-leader member whose name equals its id.
    pub fn new(id: impl Into<String>, gender: Gender) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            gender,
            is_leader: false,
        }
    }

    /// Creates a leader.
    pub fn leader(id: impl Into<String>, gender: Gender) -> Self {
        Self::new(id, gender).as_leader()
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Marks the member as a leader.
    pub fn as_leader(mut self) -> Self {
        self.is_leader = true;
        self
    }

    #[inline]
    pub fn is_male(&self) -> bool {
        self.gender == Gender::Male
    }
}

/// Validated, ordered team definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Roster {
    members: Vec<Member>,
    exclusive_pair: (String, String),
}

impl Roster {
    /// Builds a roster.
    ///
    /// `exclusive_pair` names the two leaders who may not work the same
    /// shift on the same day.
    ///
    /// # Errors
    /// [`ScheduleError::InvalidRoster`] when members are empty or duplicated,
    /// or the pair does not name two distinct leaders of this roster.
    pub fn new(members: Vec<Member>, exclusive_pair: (&str, &str)) -> Result<Self> {
        validate_roster(&members, exclusive_pair).map_err(ScheduleError::InvalidRoster)?;
        Ok(Self {
            members,
            exclusive_pair: (exclusive_pair.0.to_string(), exclusive_pair.1.to_string()),
        })
    }

    /// The five-person team the rules were tuned for.
    ///
    /// Three leaders (CIF, SSL male; SJL female) and two non-leaders
    /// (SCB1 male, SCB2 female). CIF and SSL are mutually exclusive.
    pub fn standard() -> Self {
        Self {
            members: vec![
                Member::leader("CIF", Gender::Male),
                Member::leader("SSL", Gender::Male),
                Member::leader("SJL", Gender::Female),
                Member::new("SCB1", Gender::Male).with_name("SCB 1"),
                Member::new("SCB2", Gender::Female).with_name("SCB 2"),
            ],
            exclusive_pair: ("CIF".to_string(), "SSL".to_string()),
        }
    }

    /// Members in roster order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Member ids in roster order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.id.as_str())
    }

    /// Looks up a member.
    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Whether the roster contains `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.member(id).is_some()
    }

    /// Leaders in roster order; the members eligible to hold the key.
    pub fn key_eligible(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.is_leader)
    }

    /// The two mutually exclusive leaders.
    pub fn exclusive_pair(&self) -> (&str, &str) {
        (&self.exclusive_pair.0, &self.exclusive_pair.1)
    }

    /// The exclusive partner of `id`, if `id` is one of the pair.
    pub fn rival_of(&self, id: &str) -> Option<&str> {
        let (a, b) = self.exclusive_pair();
        if id == a {
            Some(b)
        } else if id == b {
            Some(a)
        } else {
            None
        }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false for a validated roster.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Resolves `id` against the roster.
    pub(crate) fn require(&self, id: &str) -> Result<&Member> {
        self.member(id)
            .ok_or_else(|| ScheduleError::UnknownMember(id.to_string()))
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::standard()
    }
}
