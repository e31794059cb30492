//! Cache keys: (city, segment, graph variant)

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::metrics::MetricKind;

/// A city or segment filter, or everything
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    All,
    Named(String),
}

impl Scope {
    pub fn named(name: impl Into<String>) -> Self {
        Scope::Named(name.into())
    }

    /// `"all"` (any case) selects everything
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("all") {
            Scope::All
        } else {
            Scope::Named(value.to_string())
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Scope::All => true,
            Scope::Named(name) => name == value,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Scope::All => None,
            Scope::Named(name) => Some(name),
        }
    }

    /// Filesystem-safe form: lowercase alphanumerics joined by single dashes
    pub fn slug(&self) -> String {
        let name = match self {
            Scope::All => return "all".to_string(),
            Scope::Named(name) => name,
        };

        let mut slug = String::with_capacity(name.len());
        for ch in name.chars() {
            if ch.is_alphanumeric() {
                slug.extend(ch.to_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        while slug.ends_with('-') {
            slug.pop();
        }

        if slug.is_empty() {
            "unnamed".to_string()
        } else {
            slug
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => f.write_str("all"),
            Scope::Named(name) => f.write_str(name),
        }
    }
}

/// The graph shapes the rebuild produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GraphVariant {
    /// Venues joined by one edge labeled with a genre they share
    VenueSharedGenre,
    /// Venues joined by an edge weighted by the number of genres they share
    VenueGenreOverlap,
    /// Artists joined to the genres they perform
    ArtistGenre,
    /// Venues joined to the genres they host
    VenueGenre,
}

impl GraphVariant {
    pub const ALL: [GraphVariant; 4] = [
        GraphVariant::VenueSharedGenre,
        GraphVariant::VenueGenreOverlap,
        GraphVariant::ArtistGenre,
        GraphVariant::VenueGenre,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GraphVariant::VenueSharedGenre => "venue-shared-genre",
            GraphVariant::VenueGenreOverlap => "venue-genre-overlap",
            GraphVariant::ArtistGenre => "artist-genre",
            GraphVariant::VenueGenre => "venue-genre",
        }
    }

    /// Whether the variant gets one entry per segment, or only `all`
    pub fn is_segmented(&self) -> bool {
        matches!(self, GraphVariant::ArtistGenre | GraphVariant::VenueGenre)
    }

    /// Metric artifacts the rebuild stores for this variant
    pub fn metric_kinds(&self) -> &'static [MetricKind] {
        match self {
            GraphVariant::VenueSharedGenre => &[MetricKind::DegreeCentrality],
            GraphVariant::VenueGenreOverlap => &[
                MetricKind::DegreeCentrality,
                MetricKind::Clustering,
                MetricKind::EdgeWeights,
                MetricKind::Communities,
            ],
            GraphVariant::ArtistGenre => &[
                MetricKind::DegreeCentrality,
                MetricKind::GenreCentrality,
                MetricKind::BridgeNodes,
            ],
            GraphVariant::VenueGenre => &[MetricKind::DegreeCentrality, MetricKind::GenreCentrality],
        }
    }
}

impl fmt::Display for GraphVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub city: Scope,
    pub segment: Scope,
    pub variant: GraphVariant,
}

impl CacheKey {
    pub fn new(city: Scope, segment: Scope, variant: GraphVariant) -> Self {
        Self {
            city,
            segment,
            variant,
        }
    }

    /// Entry location relative to the store root
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.variant.as_str())
            .join(self.city.slug())
            .join(self.segment.slug())
    }
}

/// `<variant>/<city-slug>/<segment-slug>`
impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.variant,
            self.city.slug(),
            self.segment.slug()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_lowercase_and_dashed() {
        assert_eq!(Scope::named("Ft Lauderdale").slug(), "ft-lauderdale");
        assert_eq!(Scope::named("  Arts & Theatre ").slug(), "arts-theatre");
        assert_eq!(Scope::All.slug(), "all");
        assert_eq!(Scope::named("???").slug(), "unnamed");
    }

    #[test]
    fn key_string_is_deterministic() {
        let key = CacheKey::new(
            Scope::named("Las Vegas"),
            Scope::All,
            GraphVariant::VenueGenreOverlap,
        );
        assert_eq!(key.to_string(), "venue-genre-overlap/las-vegas/all");
        assert_eq!(
            key.relative_path(),
            PathBuf::from("venue-genre-overlap").join("las-vegas").join("all")
        );
    }

    #[test]
    fn parse_recognizes_all() {
        assert_eq!(Scope::parse("ALL"), Scope::All);
        assert_eq!(Scope::parse("Music"), Scope::named("Music"));
        assert!(Scope::All.matches("anything"));
        assert!(!Scope::named("Music").matches("Sports"));
    }

    #[test]
    fn only_bipartite_variants_are_segmented() {
        let segmented: Vec<_> = GraphVariant::ALL
            .iter()
            .filter(|v| v.is_segmented())
            .collect();
        assert_eq!(segmented, vec![&GraphVariant::ArtistGenre, &GraphVariant::VenueGenre]);
    }
}
