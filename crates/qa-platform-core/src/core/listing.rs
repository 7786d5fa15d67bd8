// crates/qa-platform-core/src/core/listing.rs
// ============================================================================
// Module: QA Platform Listing Plans
// Description: Closed set of listing variants and their filter/sort plans.
// Purpose: Replace name-keyed query dispatch with statically defined plans.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every question listing endpoint maps to one [`QuestionListing`] variant.
//! A variant resolves, together with the request's period and tag filter, to
//! a [`QuestionQuery`]: the exact filter, window and sort a store executes.
//! Message search and question comments have their own plans.
//!
//! All orderings end with identifier ascending so pages are deterministic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::QuestionId;
use crate::core::identifiers::UserId;
use crate::core::model::QuestionView;
use crate::core::time::Timestamp;
use crate::core::validation::TagFilter;
use crate::core::validation::ValidationError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Length of the WEEK window in days.
pub const WEEK_DAYS: i64 = 7;
/// Length of the MONTH window in days.
pub const MONTH_DAYS: i64 = 30;

// ============================================================================
// SECTION: Period
// ============================================================================

/// Creation-time window requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Period {
    /// No time restriction.
    #[default]
    All,
    /// Created within the trailing week.
    Week,
    /// Created within the trailing month.
    Month,
}

impl Period {
    /// Returns the earliest creation time admitted at `now`, if any.
    #[must_use]
    pub const fn window_start(self, now: Timestamp) -> Option<Timestamp> {
        match self {
            Self::All => None,
            Self::Week => Some(now.minus_days(WEEK_DAYS)),
            Self::Month => Some(now.minus_days(MONTH_DAYS)),
        }
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ALL" => Ok(Self::All),
            "WEEK" => Ok(Self::Week),
            "MONTH" => Ok(Self::Month),
            _ => Err(ValidationError::invalid("period", "expected one of ALL, WEEK, MONTH")),
        }
    }
}

// ============================================================================
// SECTION: Question Listings
// ============================================================================

/// Sort key for question listings (ties always broken by id ascending).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSort {
    /// Identifier ascending.
    IdAsc,
    /// Composite score (votes + answers + views) descending.
    PopularityDesc,
    /// Creation time descending.
    NewestFirst,
    /// Author reputation descending.
    ReputationDesc,
    /// Distinct view count descending.
    ViewCountDesc,
    /// Vote sum descending.
    VotesDesc,
}

impl QuestionSort {
    /// Orders two question views under this sort.
    #[must_use]
    pub fn compare(self, left: &QuestionView, right: &QuestionView) -> Ordering {
        let primary = match self {
            Self::IdAsc => Ordering::Equal,
            Self::PopularityDesc => right.popularity_score().cmp(&left.popularity_score()),
            Self::NewestFirst => right.persist_date_time.cmp(&left.persist_date_time),
            Self::ReputationDesc => right.author_reputation.cmp(&left.author_reputation),
            Self::ViewCountDesc => right.view_count.cmp(&left.view_count),
            Self::VotesDesc => right.count_valuable.cmp(&left.count_valuable),
        };
        primary.then_with(|| left.id.cmp(&right.id))
    }
}

/// Time window rule of a listing variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRule {
    /// Use the period supplied by the caller.
    FromRequest,
    /// Ignore the caller's period and use a fixed one.
    Fixed(Period),
}

/// Closed set of question listing variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionListing {
    /// Questions matching the tag filter, id ascending.
    WithTags,
    /// Composite score descending.
    ByVotesAnswersViews,
    /// Composite score descending, created this week.
    MostPopularWeek,
    /// Questions without answers.
    NoAnswer,
    /// Newest first.
    NewestFirst,
    /// Composite score descending, created this month.
    ByVotesAnswersViewsMonth,
    /// Author reputation descending.
    ByReputation,
    /// View count descending.
    ByViewCount,
    /// Vote sum descending.
    ByVotes,
}

impl QuestionListing {
    /// All variants, in endpoint order.
    pub const ALL: [Self; 9] = [
        Self::WithTags,
        Self::ByVotesAnswersViews,
        Self::MostPopularWeek,
        Self::NoAnswer,
        Self::NewestFirst,
        Self::ByVotesAnswersViewsMonth,
        Self::ByReputation,
        Self::ByViewCount,
        Self::ByVotes,
    ];

    /// Returns the stable label used in logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::WithTags => "with_tags",
            Self::ByVotesAnswersViews => "by_votes_answers_views",
            Self::MostPopularWeek => "most_popular_week",
            Self::NoAnswer => "no_answer",
            Self::NewestFirst => "newest_first",
            Self::ByVotesAnswersViewsMonth => "by_votes_answers_views_month",
            Self::ByReputation => "by_reputation",
            Self::ByViewCount => "by_view_count",
            Self::ByVotes => "by_votes",
        }
    }

    /// Returns the sort key.
    #[must_use]
    pub const fn sort(self) -> QuestionSort {
        match self {
            Self::WithTags | Self::NoAnswer => QuestionSort::IdAsc,
            Self::ByVotesAnswersViews | Self::MostPopularWeek | Self::ByVotesAnswersViewsMonth => {
                QuestionSort::PopularityDesc
            }
            Self::NewestFirst => QuestionSort::NewestFirst,
            Self::ByReputation => QuestionSort::ReputationDesc,
            Self::ByViewCount => QuestionSort::ViewCountDesc,
            Self::ByVotes => QuestionSort::VotesDesc,
        }
    }

    /// Returns the window rule.
    #[must_use]
    pub const fn window(self) -> WindowRule {
        match self {
            Self::MostPopularWeek => WindowRule::Fixed(Period::Week),
            Self::ByVotesAnswersViewsMonth => WindowRule::Fixed(Period::Month),
            Self::ByReputation | Self::ByViewCount | Self::ByVotes => WindowRule::Fixed(Period::All),
            Self::WithTags
            | Self::ByVotesAnswersViews
            | Self::NoAnswer
            | Self::NewestFirst => WindowRule::FromRequest,
        }
    }

    /// Returns true when the endpoint takes a `period` parameter.
    ///
    /// Fixed week and month windows still accept and validate `period` but
    /// ignore its value; see [`QuestionListing::window`].
    #[must_use]
    pub const fn accepts_period(self) -> bool {
        matches!(self.window(), WindowRule::FromRequest)
            || matches!(self, Self::MostPopularWeek | Self::ByVotesAnswersViewsMonth)
    }

    /// Returns true when only unanswered questions qualify.
    #[must_use]
    pub const fn unanswered_only(self) -> bool {
        matches!(self, Self::NoAnswer)
    }

    /// Resolves the executable plan for a request at time `now`.
    #[must_use]
    pub fn plan(
        self,
        tags: TagFilter,
        period: Period,
        requester: UserId,
        now: Timestamp,
    ) -> QuestionQuery {
        let effective = match self.window() {
            WindowRule::FromRequest => period,
            WindowRule::Fixed(fixed) => fixed,
        };
        QuestionQuery {
            listing: self,
            tags,
            created_after: effective.window_start(now),
            unanswered_only: self.unanswered_only(),
            sort: self.sort(),
            requester,
        }
    }
}

/// Executable question listing plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionQuery {
    /// Originating variant.
    pub listing: QuestionListing,
    /// Tag filter.
    pub tags: TagFilter,
    /// Inclusive lower bound on creation time.
    pub created_after: Option<Timestamp>,
    /// Restrict to questions with no answers.
    pub unanswered_only: bool,
    /// Sort key.
    pub sort: QuestionSort,
    /// Requester used for per-user flags.
    pub requester: UserId,
}

impl QuestionQuery {
    /// Returns true when `view` (with its tags) satisfies the filters.
    #[must_use]
    pub fn admits(&self, view: &QuestionView) -> bool {
        if let Some(start) = self.created_after
            && view.persist_date_time < start
        {
            return false;
        }
        if self.unanswered_only && view.count_answer > 0 {
            return false;
        }
        let tag_ids: Vec<_> = view.list_tag_dto.iter().map(|tag| tag.id).collect();
        self.tags.matches(&tag_ids)
    }
}

// ============================================================================
// SECTION: Message and Comment Plans
// ============================================================================

/// Global chat full-text search plan (messages ordered by id ascending).
///
/// Matching is a substring test after [`fold_case`], so `%` and `_` are
/// ordinary characters and every backend folds case the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalChatMessageSearch {
    /// Case-folded search needle.
    needle: String,
}

impl GlobalChatMessageSearch {
    /// Builds a search plan from raw text.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the text is blank.
    pub fn new(text: &str) -> Result<Self, ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::invalid("text", "must not be blank"));
        }
        Ok(Self {
            needle: fold_case(text),
        })
    }

    /// Returns the lower-cased needle.
    #[must_use]
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Returns true when `text` contains the needle, ignoring case.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        fold_case(text).contains(&self.needle)
    }
}

/// Folds text for case-insensitive message search.
///
/// Uses full Unicode lowercasing, so Cyrillic and accented letters fold too.
/// Stores that search in SQL must apply this same function to message text.
#[must_use]
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Question comments listing plan (comments ordered by id ascending).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionComments {
    /// Commented question.
    pub question_id: QuestionId,
}
