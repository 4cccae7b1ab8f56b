//! Per-app short-form feed heuristics.
//!
//! Each monitored app maps to an [`AppProfile`] carrying its own heuristic.
//! Adding an app means adding a profile (in code or in `config.toml`), not a
//! new branch in the classifier.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const INSTAGRAM: &str = "com.instagram.android";
pub const YOUTUBE: &str = "com.google.android.youtube";
pub const TIKTOK: &str = "com.zhiliaoapp.musically";

/// How to decide whether an app's current screen is its short-form feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedHeuristic {
    /// Scan node attributes for any of these substrings (case-insensitive).
    /// Order matters only for which keyword gets reported on a match.
    Keywords { keywords: Vec<String> },
    /// The whole app is a short-form feed; no structural check is made.
    AlwaysInFeed,
}

impl FeedHeuristic {
    /// Keyword heuristic with all keywords lowercased and empty ones dropped.
    pub fn keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        FeedHeuristic::Keywords {
            keywords: normalize_keywords(keywords),
        }
    }
}

/// A monitored application and its feed heuristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppProfile {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub heuristic: FeedHeuristic,
}

impl AppProfile {
    pub fn new(id: impl Into<String>, label: impl Into<String>, heuristic: FeedHeuristic) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            heuristic,
        }
    }

    /// Instagram Reels: clips viewer and reel feed markers.
    pub fn instagram() -> Self {
        Self::new(
            INSTAGRAM,
            "Instagram Reels",
            FeedHeuristic::keywords([
                "clips_viewer_clips_tab",
                "reel_viewer",
                "ClipsViewerFragment",
                "clips_tab",
                "reels_tab",
                "reel_feed",
                "clips_",
                "reel_",
            ]),
        )
    }

    /// YouTube Shorts: shorts player and reel watch markers.
    pub fn youtube() -> Self {
        Self::new(
            YOUTUBE,
            "YouTube Shorts",
            FeedHeuristic::keywords([
                "shorts",
                "reel_",
                "shorty",
                "short_player",
                "shorts_player",
                "reel_player",
                "/shorts/",
                "reel_watch_fragment",
                "reel_recycler",
            ]),
        )
    }

    /// TikTok is treated as a feed whenever it is in the foreground.
    pub fn tiktok() -> Self {
        Self::new(TIKTOK, "TikTok", FeedHeuristic::AlwaysInFeed)
    }
}

/// The set of monitored apps, keyed by app identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredApps {
    profiles: HashMap<String, AppProfile>,
}

impl MonitoredApps {
    /// Build from profiles. Keywords are normalized; a later profile with the
    /// same id replaces an earlier one.
    pub fn new(profiles: impl IntoIterator<Item = AppProfile>) -> Self {
        let profiles = profiles
            .into_iter()
            .map(|mut profile| {
                if let FeedHeuristic::Keywords { keywords } = &profile.heuristic {
                    profile.heuristic = FeedHeuristic::keywords(keywords);
                }
                (profile.id.clone(), profile)
            })
            .collect();
        Self { profiles }
    }

    pub fn contains(&self, app_id: &str) -> bool {
        self.profiles.contains_key(app_id)
    }

    pub fn get(&self, app_id: &str) -> Option<&AppProfile> {
        self.profiles.get(app_id)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// App identifiers, sorted for stable output.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for MonitoredApps {
    fn default() -> Self {
        Self::new(default_profiles())
    }
}

/// Built-in profiles for the three monitored apps.
pub fn default_profiles() -> Vec<AppProfile> {
    vec![
        AppProfile::instagram(),
        AppProfile::youtube(),
        AppProfile::tiktok(),
    ]
}

fn normalize_keywords<I, S>(keywords: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keywords
        .into_iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}
