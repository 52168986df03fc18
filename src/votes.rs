use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

/// Direction of a single user's vote on a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Up,
    Down,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Up => "up",
            VoteType::Down => "down",
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(VoteType::Up),
            "down" => Ok(VoteType::Down),
            other => Err(ApiError::InvalidVoteType(other.to_string())),
        }
    }
}

/// The single ledger write a vote produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerWrite {
    Insert(VoteType),
    Update(VoteType),
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub write: LedgerWrite,
    pub upvotes_delta: i32,
    pub downvotes_delta: i32,
}

impl Transition {
    /// The user's vote once this transition has been applied.
    pub fn next_state(&self) -> Option<VoteType> {
        match self.write {
            LedgerWrite::Insert(vote) | LedgerWrite::Update(vote) => Some(vote),
            LedgerWrite::Delete => None,
        }
    }
}

fn delta(vote: VoteType, sign: i32) -> (i32, i32) {
    match vote {
        VoteType::Up => (sign, 0),
        VoteType::Down => (0, sign),
    }
}

/// Maps the user's current vote and the requested one to a ledger write and
/// counter deltas. Repeating a vote removes it, the opposite vote moves one
/// unit between the counters.
pub fn transition(current: Option<VoteType>, requested: VoteType) -> Transition {
    let (write, (up, down)) = match current {
        None => (LedgerWrite::Insert(requested), delta(requested, 1)),
        Some(held) if held == requested => (LedgerWrite::Delete, delta(held, -1)),
        Some(held) => {
            let (up_out, down_out) = delta(held, -1);
            let (up_in, down_in) = delta(requested, 1);
            (
                LedgerWrite::Update(requested),
                (up_out + up_in, down_out + down_in),
            )
        }
    };

    Transition {
        write,
        upvotes_delta: up,
        downvotes_delta: down,
    }
}

/// Denormalized counters held on a suggestion row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub upvotes: i32,
    pub downvotes: i32,
}

impl Counters {
    pub fn apply(self, t: &Transition) -> Counters {
        Counters {
            upvotes: self.upvotes + t.upvotes_delta,
            downvotes: self.downvotes + t.downvotes_delta,
        }
    }
}
