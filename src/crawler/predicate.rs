//! Discovery predicates deciding which connections are worth keeping

use crate::config::DiscoveryConfig;
use crate::remote::AccountProfile;

/// Caller-supplied filter applied to every discovered connection
pub trait DiscoveryPredicate: Send + Sync {
    fn matches(&self, profile: &AccountProfile) -> bool;
}

impl<F> DiscoveryPredicate for F
where
    F: Fn(&AccountProfile) -> bool + Send + Sync,
{
    fn matches(&self, profile: &AccountProfile) -> bool {
        self(profile)
    }
}

/// Matches profiles whose free-text location mentions one of the keywords
///
/// Matching is a case-insensitive substring test, so "peru" matches
/// "Lima, PERU" and "perú" matches "Cusco - Perú". A profile without a
/// location never matches.
#[derive(Debug, Clone)]
pub struct LocationPredicate {
    keywords: Vec<String>,
    skip_protected: bool,
}

impl LocationPredicate {
    pub fn new<S: AsRef<str>>(keywords: &[S], skip_protected: bool) -> Self {
        let keywords = keywords
            .iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self {
            keywords,
            skip_protected,
        }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new(&config.location_keywords, config.skip_protected)
    }
}

impl DiscoveryPredicate for LocationPredicate {
    fn matches(&self, profile: &AccountProfile) -> bool {
        if self.skip_protected && profile.is_protected() {
            return false;
        }

        let Some(location) = profile.location.as_deref() else {
            return false;
        };
        let location = location.to_lowercase();

        self.keywords.iter().any(|k| location.contains(k.as_str()))
    }
}
