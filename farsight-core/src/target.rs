//! Target kinds, sets of kinds and accepted detections

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr};

/// A category of object the node can search for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    RedBall,
    BlueBall,
}

impl TargetKind {
    pub const ALL: [TargetKind; 2] = [TargetKind::RedBall, TargetKind::BlueBall];

    /// Class identifier reported on the data channel
    pub fn id(self) -> u32 {
        match self {
            TargetKind::RedBall => 1,
            TargetKind::BlueBall => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TargetKind::RedBall => "red_ball",
            TargetKind::BlueBall => "blue_ball",
        }
    }

    fn index(self) -> usize {
        match self {
            TargetKind::RedBall => 0,
            TargetKind::BlueBall => 1,
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Finite set of [`TargetKind`]s.
///
/// The empty set matches nothing; [`TargetSet::all`] matches every kind.
/// Serialized as the list of member kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<TargetKind>", into = "Vec<TargetKind>")]
pub struct TargetSet {
    members: [bool; TargetKind::ALL.len()],
}

impl TargetSet {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self { members: [true; TargetKind::ALL.len()] }
    }

    pub fn only(kind: TargetKind) -> Self {
        let mut set = Self::none();
        set.insert(kind);
        set
    }

    pub fn insert(&mut self, kind: TargetKind) {
        self.members[kind.index()] = true;
    }

    pub fn remove(&mut self, kind: TargetKind) {
        self.members[kind.index()] = false;
    }

    pub fn contains(&self, kind: TargetKind) -> bool {
        self.members[kind.index()]
    }

    pub fn is_empty(&self) -> bool {
        !self.members.iter().any(|member| *member)
    }

    pub fn is_all(&self) -> bool {
        self.members.iter().all(|member| *member)
    }

    pub fn union(&self, other: &TargetSet) -> TargetSet {
        let mut out = *self;
        for (mine, theirs) in out.members.iter_mut().zip(other.members.iter()) {
            *mine |= *theirs;
        }
        out
    }

    pub fn intersection(&self, other: &TargetSet) -> TargetSet {
        let mut out = *self;
        for (mine, theirs) in out.members.iter_mut().zip(other.members.iter()) {
            *mine &= *theirs;
        }
        out
    }

    pub fn intersects(&self, other: &TargetSet) -> bool {
        !self.intersection(other).is_empty()
    }

    /// True if every member of `other` is also in `self`
    pub fn is_superset(&self, other: &TargetSet) -> bool {
        self.intersection(other) == *other
    }

    pub fn iter(&self) -> impl Iterator<Item = TargetKind> + '_ {
        TargetKind::ALL.into_iter().filter(move |kind| self.contains(*kind))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }
}

impl From<TargetKind> for TargetSet {
    fn from(kind: TargetKind) -> Self {
        TargetSet::only(kind)
    }
}

impl FromIterator<TargetKind> for TargetSet {
    fn from_iter<I: IntoIterator<Item = TargetKind>>(iter: I) -> Self {
        let mut set = TargetSet::none();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl From<Vec<TargetKind>> for TargetSet {
    fn from(kinds: Vec<TargetKind>) -> Self {
        kinds.into_iter().collect()
    }
}

impl From<TargetSet> for Vec<TargetKind> {
    fn from(set: TargetSet) -> Self {
        set.iter().collect()
    }
}

impl BitOr for TargetSet {
    type Output = TargetSet;

    fn bitor(self, rhs: TargetSet) -> TargetSet {
        self.union(&rhs)
    }
}

impl BitAnd for TargetSet {
    type Output = TargetSet;

    fn bitand(self, rhs: TargetSet) -> TargetSet {
        self.intersection(&rhs)
    }
}

impl fmt::Display for TargetSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        if self.is_all() {
            return f.write_str("all");
        }
        let names: Vec<&str> = self.iter().map(TargetKind::name).collect();
        f.write_str(&names.join("+"))
    }
}

/// An accepted, scored and localized target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub kind: TargetKind,
    /// Scene units, inferred from apparent height
    pub distance: f64,
    /// Degrees from the optical axis, positive to the right
    pub angle: f64,
    pub score: f64,
}
