//! Declarative worker profile.
//!
//! # Design
//! - One YAML document replaces the per-deployment launch scripts: account,
//!   notification subscriptions, betting policy and the watch-list.
//! - Parsing is strict (unknown fields and unknown enum values are rejected by
//!   serde); semantic checks run afterwards and name the offending field.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// Complete launch configuration for the worker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerProfile {
    /// Account the worker signs in as.
    pub username: String,
    /// Order in which streamers are prioritised.
    #[serde(default)]
    pub priority: Vec<Priority>,
    /// Claim pending drops on startup.
    #[serde(default = "default_true")]
    pub claim_drops_startup: bool,
    /// Notification channels and their event subscriptions.
    #[serde(default)]
    pub notifications: Vec<NotificationChannel>,
    /// Settings applied to every streamer unless overridden.
    #[serde(default)]
    pub streamer_defaults: StreamerSettings,
    /// Watch-list.
    pub streamers: Vec<StreamerEntry>,
}

/// Streamer selection priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Keep watch streaks alive first.
    Streak,
    /// Prefer streams with active drops.
    Drops,
    /// Follow watch-list order.
    Order,
    /// Prefer subscribed channels.
    Subscribed,
    /// Prefer channels with the fewest points.
    PointsAscending,
    /// Prefer channels with the most points.
    PointsDescending,
}

/// Notification delivery channel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Telegram bot.
    Telegram,
    /// Discord webhook.
    Discord,
    /// Generic HTTP webhook.
    Webhook,
    /// Matrix room.
    Matrix,
    /// Pushover application.
    Pushover,
    /// Gotify server.
    Gotify,
}

/// Worker event that a channel can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum EventKind {
    StreamerOnline,
    StreamerOffline,
    GainForRaid,
    GainForClaim,
    GainForWatch,
    GainForWatchStreak,
    BetWin,
    BetLose,
    BetRefund,
    BetFilters,
    BetGeneral,
    BetFailed,
    BetStart,
    BonusClaim,
    MomentClaim,
    JoinRaid,
    DropClaim,
    DropStatus,
    ChatMention,
}

/// One notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationChannel {
    /// Channel type.
    pub kind: ChannelKind,
    /// Events delivered through this channel.
    pub events: Vec<EventKind>,
    /// Deliver silently where the channel supports it.
    #[serde(default)]
    pub disable_notification: bool,
}

/// Chat presence policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum ChatPresence {
    Always,
    Never,
    #[default]
    Online,
    Offline,
}

/// Per-streamer behaviour. Unset fields inherit from the profile defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamerSettings {
    /// Place predictions.
    #[serde(default)]
    pub make_predictions: Option<bool>,
    /// Follow raids.
    #[serde(default)]
    pub follow_raid: Option<bool>,
    /// Claim drops.
    #[serde(default)]
    pub claim_drops: Option<bool>,
    /// Maintain watch streaks.
    #[serde(default)]
    pub watch_streak: Option<bool>,
    /// Chat presence.
    #[serde(default)]
    pub chat: Option<ChatPresence>,
    /// Betting policy.
    #[serde(default)]
    pub bet: Option<BetSettings>,
}

impl StreamerSettings {
    /// Overlay `self` on top of `defaults`, field by field.
    #[must_use]
    pub fn merged_over(&self, defaults: &Self) -> Self {
        Self {
            make_predictions: self.make_predictions.or(defaults.make_predictions),
            follow_raid: self.follow_raid.or(defaults.follow_raid),
            claim_drops: self.claim_drops.or(defaults.claim_drops),
            watch_streak: self.watch_streak.or(defaults.watch_streak),
            chat: self.chat.or(defaults.chat),
            bet: self.bet.clone().or_else(|| defaults.bet.clone()),
        }
    }
}

/// Prediction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Strategy {
    MostVoted,
    HighOdds,
    Percentage,
    SmartMoney,
    #[default]
    Smart,
}

/// Reference point for the bet delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum DelayMode {
    FromStart,
    #[default]
    FromEnd,
    Percentage,
}

/// Outcome statistic used by a bet filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum OutcomeKey {
    PercentageUsers,
    OddsPercentage,
    Odds,
    TopPoints,
    TotalUsers,
    TotalPoints,
    DecisionUsers,
    DecisionPoints,
}

/// Comparison used by a bet filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Condition {
    Gt,
    Lt,
    Gte,
    Lte,
}

/// Skip a bet unless the outcome statistic satisfies the condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterCondition {
    /// Statistic to compare.
    pub by: OutcomeKey,
    /// Comparison operator.
    #[serde(rename = "where")]
    pub condition: Condition,
    /// Threshold.
    pub value: u64,
}

/// Betting policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BetSettings {
    /// Prediction strategy.
    #[serde(default)]
    pub strategy: Strategy,
    /// Share of the balance to wager, in percent.
    pub percentage: u8,
    /// Minimum gap between outcomes for the smart strategy, in percent.
    #[serde(default = "default_percentage_gap")]
    pub percentage_gap: u8,
    /// Upper bound on a single wager.
    pub max_points: u64,
    /// Do not bet below this balance.
    #[serde(default)]
    pub minimum_points: u64,
    /// Never wager more than the current top bet.
    #[serde(default)]
    pub stealth_mode: bool,
    /// Delay reference point.
    #[serde(default)]
    pub delay_mode: DelayMode,
    /// Delay amount (seconds, or percent with [`DelayMode::Percentage`]).
    #[serde(default = "default_delay")]
    pub delay: u32,
    /// Optional outcome filter.
    #[serde(default)]
    pub filter_condition: Option<FilterCondition>,
}

/// Watch-list entry: a bare name or a name with overrides.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StreamerEntry {
    /// Streamer using the profile defaults.
    Name(String),
    /// Streamer with overrides.
    Configured {
        /// Channel name.
        name: String,
        /// Overrides applied over the defaults.
        #[serde(default)]
        settings: StreamerSettings,
    },
}

impl StreamerEntry {
    /// Channel name of the entry.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Configured { name, .. } => name,
        }
    }

    /// Effective settings for this streamer.
    #[must_use]
    pub fn effective_settings(&self, defaults: &StreamerSettings) -> StreamerSettings {
        match self {
            Self::Name(_) => defaults.clone(),
            Self::Configured { settings, .. } => settings.merged_over(defaults),
        }
    }
}

const fn default_true() -> bool {
    true
}

const fn default_percentage_gap() -> u8 {
    20
}

const fn default_delay() -> u32 {
    6
}

impl WorkerProfile {
    /// Read, parse and validate a profile from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ProfileRead`], [`ConfigError::ProfileParse`] or
    /// [`ConfigError::Profile`] when the file is unreadable, malformed or
    /// semantically invalid.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::ProfileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let profile: Self =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::ProfileParse {
                path: path.to_path_buf(),
                source,
            })?;
        profile.validate()?;
        Ok(profile)
    }

    /// Check semantic constraints that the schema cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Profile`] naming the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.username.trim().is_empty() {
            return Err(invalid("username", "empty", None));
        }
        if self.streamers.is_empty() {
            return Err(invalid("streamers", "empty", None));
        }

        let mut seen_priorities = HashSet::new();
        for priority in &self.priority {
            if !seen_priorities.insert(priority) {
                return Err(invalid(
                    "priority",
                    "duplicate",
                    Some(format!("{priority:?}")),
                ));
            }
        }

        for (index, channel) in self.notifications.iter().enumerate() {
            if channel.events.is_empty() {
                return Err(invalid(
                    format!("notifications[{index}].events"),
                    "empty",
                    None,
                ));
            }
        }

        validate_settings("streamer_defaults", &self.streamer_defaults)?;

        let mut seen_streamers = HashSet::new();
        for (index, entry) in self.streamers.iter().enumerate() {
            let name = entry.name().trim();
            if name.is_empty() {
                return Err(invalid(format!("streamers[{index}].name"), "empty", None));
            }
            if !seen_streamers.insert(name.to_ascii_lowercase()) {
                return Err(invalid(
                    format!("streamers[{index}].name"),
                    "duplicate",
                    Some(name.to_string()),
                ));
            }
            if let StreamerEntry::Configured { settings, .. } = entry {
                validate_settings(&format!("streamers[{index}].settings"), settings)?;
            }
        }
        Ok(())
    }

    /// Names on the watch-list, in order.
    pub fn streamer_names(&self) -> impl Iterator<Item = &str> {
        self.streamers.iter().map(StreamerEntry::name)
    }
}

fn validate_settings(prefix: &str, settings: &StreamerSettings) -> ConfigResult<()> {
    let Some(bet) = &settings.bet else {
        return Ok(());
    };
    if bet.percentage > 100 {
        return Err(invalid(
            format!("{prefix}.bet.percentage"),
            "out_of_range",
            Some(bet.percentage.to_string()),
        ));
    }
    if bet.percentage_gap > 100 {
        return Err(invalid(
            format!("{prefix}.bet.percentage_gap"),
            "out_of_range",
            Some(bet.percentage_gap.to_string()),
        ));
    }
    if matches!(bet.delay_mode, DelayMode::Percentage) && bet.delay > 100 {
        return Err(invalid(
            format!("{prefix}.bet.delay"),
            "out_of_range",
            Some(bet.delay.to_string()),
        ));
    }
    if bet.max_points == 0 {
        return Err(invalid(format!("{prefix}.bet.max_points"), "zero", None));
    }
    Ok(())
}

fn invalid(field: impl Into<String>, reason: &'static str, value: Option<String>) -> ConfigError {
    ConfigError::Profile {
        field: field.into(),
        reason,
        value,
    }
}
