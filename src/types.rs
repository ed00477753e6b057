//! Common types used throughout the battle service

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for participants
pub type ParticipantId = u64;

/// Correlation token shared by both result rows of one battle
pub type BattleId = String;

/// Rating every new participant starts with
pub const DEFAULT_RATING: i32 = 1500;

/// Avatar assigned to participants that never picked one
pub const DEFAULT_AVATAR: &str = "👤";

/// Wire id of the synthetic practice opponent
pub const PRACTICE_OPPONENT_ID: &str = "ai";

/// Display name of the synthetic practice opponent
pub const PRACTICE_OPPONENT_NAME: &str = "AI Opponent";

/// Avatar of the synthetic practice opponent
pub const PRACTICE_OPPONENT_AVATAR: &str = "🤖";

/// Kind of battle a participant asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleMode {
    Quick,
    Ranked,
}

impl BattleMode {
    /// Number of questions when the request does not override it
    pub fn default_question_count(self) -> u32 {
        match self {
            BattleMode::Quick => 5,
            BattleMode::Ranked => 10,
        }
    }

    /// Per-question time limit when the request does not override it
    pub fn default_time_limit_seconds(self) -> u32 {
        match self {
            BattleMode::Quick => 15,
            BattleMode::Ranked => 20,
        }
    }

    /// Prefix of the battle id tokens issued for this mode
    pub fn battle_id_prefix(self) -> &'static str {
        match self {
            BattleMode::Quick => "battle",
            BattleMode::Ranked => "ranked",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BattleMode::Quick => "quick",
            BattleMode::Ranked => "ranked",
        }
    }
}

impl std::fmt::Display for BattleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rated participant as seen by the battle core.
///
/// The record is owned by the identity subsystem; the battle core only reads
/// it and adjusts `rating`, `wins` and `losses`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub username: String,
    pub avatar: String,
    pub rating: i32,
    pub wins: u32,
    pub losses: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Participant {
    /// Create a fresh participant at the default rating
    pub fn new(id: ParticipantId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            avatar: DEFAULT_AVATAR.to_string(),
            rating: DEFAULT_RATING,
            wins: 0,
            losses: 0,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_rating(mut self, rating: i32) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = avatar.into();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Ephemeral description of the battle being set up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRequest {
    pub requester_id: ParticipantId,
    pub mode: BattleMode,
    pub question_count: u32,
    pub time_limit_seconds: u32,
}

impl MatchRequest {
    /// Request with the mode's default question count and time limit
    pub fn new(requester_id: ParticipantId, mode: BattleMode) -> Self {
        Self {
            requester_id,
            mode,
            question_count: mode.default_question_count(),
            time_limit_seconds: mode.default_time_limit_seconds(),
        }
    }

    pub fn with_question_count(mut self, question_count: u32) -> Self {
        self.question_count = question_count;
        self
    }

    pub fn with_time_limit(mut self, time_limit_seconds: u32) -> Self {
        self.time_limit_seconds = time_limit_seconds;
        self
    }
}

/// The opponent handed out by matchmaking.
///
/// Rating math only ever looks at [`Opponent::rating`], so a practice
/// opponent and a real one are interchangeable for previews.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "OpponentView")]
pub enum Opponent {
    RealParticipant {
        id: ParticipantId,
        username: String,
        avatar: String,
        rating: i32,
    },
    SyntheticPractice {
        rating: i32,
    },
}

impl Opponent {
    pub fn from_participant(participant: &Participant) -> Self {
        Opponent::RealParticipant {
            id: participant.id,
            username: participant.username.clone(),
            avatar: participant.avatar.clone(),
            rating: participant.rating,
        }
    }

    pub fn rating(&self) -> i32 {
        match self {
            Opponent::RealParticipant { rating, .. } => *rating,
            Opponent::SyntheticPractice { rating } => *rating,
        }
    }

    /// Participant id, `None` for the practice opponent
    pub fn participant_id(&self) -> Option<ParticipantId> {
        match self {
            Opponent::RealParticipant { id, .. } => Some(*id),
            Opponent::SyntheticPractice { .. } => None,
        }
    }

    pub fn is_practice(&self) -> bool {
        matches!(self, Opponent::SyntheticPractice { .. })
    }
}

/// Wire id of an opponent: a participant id or the practice marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OpponentRef {
    Participant(ParticipantId),
    Practice(String),
}

/// JSON shape of an opponent: `{id, username, avatar, rating}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentView {
    pub id: OpponentRef,
    pub username: String,
    pub avatar: String,
    pub rating: i32,
}

impl From<Opponent> for OpponentView {
    fn from(opponent: Opponent) -> Self {
        match opponent {
            Opponent::RealParticipant {
                id,
                username,
                avatar,
                rating,
            } => Self {
                id: OpponentRef::Participant(id),
                username,
                avatar,
                rating,
            },
            Opponent::SyntheticPractice { rating } => Self {
                id: OpponentRef::Practice(PRACTICE_OPPONENT_ID.to_string()),
                username: PRACTICE_OPPONENT_NAME.to_string(),
                avatar: PRACTICE_OPPONENT_AVATAR.to_string(),
                rating,
            },
        }
    }
}

/// Lifecycle hint returned to the client with an assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Starting,
    WaitingForOpponent,
}

/// What the requester would gain or lose in a ranked battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingChangePreview {
    /// Signed change if the requester wins (always positive)
    pub win: i32,
    /// Signed change if the requester loses (always negative)
    pub loss: i32,
}

/// Opponent assignment produced by the matchmaker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchAssignment {
    pub battle_id: BattleId,
    pub mode: BattleMode,
    pub questions: u32,
    pub time_limit: u32,
    pub opponent: Opponent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_change_preview: Option<RatingChangePreview>,
    pub status: MatchStatus,
}

/// A completed battle from one participant's perspective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleResult {
    pub battle_id: BattleId,
    pub user_id: ParticipantId,
    pub opponent_id: Option<ParticipantId>,
    pub mode: BattleMode,
    pub score: i64,
    pub questions_correct: i32,
    pub total_questions: i32,
    pub is_winner: bool,
    /// Signed rating change applied to `user_id`, 0 for quick battles
    pub rating_change: i32,
    pub recorded_at: DateTime<Utc>,
}

/// Everything a participant reports when their side of a battle is over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSubmission {
    pub battle_id: BattleId,
    pub user_id: ParticipantId,
    pub opponent_id: Option<ParticipantId>,
    pub mode: BattleMode,
    pub score: i64,
    pub questions_correct: i32,
    pub total_questions: i32,
    pub is_winner: bool,
    /// Used when the opponent cannot be resolved locally
    pub opponent_rating_hint: i32,
}

/// Time window a leaderboard is computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardPeriod {
    #[default]
    All,
    Week,
    Month,
}

impl LeaderboardPeriod {
    /// Length of the activity window, `None` for all-time
    pub fn window(self) -> Option<Duration> {
        match self {
            LeaderboardPeriod::All => None,
            LeaderboardPeriod::Week => Some(Duration::days(7)),
            LeaderboardPeriod::Month => Some(Duration::days(30)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LeaderboardPeriod::All => "all",
            LeaderboardPeriod::Week => "week",
            LeaderboardPeriod::Month => "month",
        }
    }
}

impl std::str::FromStr for LeaderboardPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(LeaderboardPeriod::All),
            "week" => Ok(LeaderboardPeriod::Week),
            "month" => Ok(LeaderboardPeriod::Month),
            other => Err(format!("Unknown leaderboard period: {}", other)),
        }
    }
}

/// One row of the leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    #[serde(skip)]
    pub participant_id: ParticipantId,
    pub username: String,
    pub avatar: String,
    pub rating: i32,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
}

/// Leaderboard page plus the caller's position in the full ordering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub current_user_rank: Option<u32>,
    pub total_players: usize,
}

/// Battle totals for dashboards
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleStats {
    pub total: usize,
    pub today: usize,
    pub by_mode: ModeCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeCounts {
    pub quick: usize,
    pub ranked: usize,
}
