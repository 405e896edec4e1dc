//! Order id resolution
//!
//! The order id is the only access token: whoever holds the tracking link
//! can follow the order.

use url::Url;

/// Source of the order id for a session
pub trait OrderIdResolver: Send + Sync {
    /// The id, or `None` when the source carries none
    fn resolve(&self) -> Option<String>;
}

impl<F> OrderIdResolver for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn resolve(&self) -> Option<String> {
        self()
    }
}

/// An id known up front
#[derive(Debug, Clone)]
pub struct ExplicitId(pub String);

impl OrderIdResolver for ExplicitId {
    fn resolve(&self) -> Option<String> {
        non_empty(&self.0)
    }
}

/// Resolves the id from a tracking link
///
/// Checked in order, first non-empty wins: explicit id, URL fragment,
/// `id` query parameter, path segment following `track`.
#[derive(Debug, Clone, Default)]
pub struct LocationResolver {
    explicit: Option<String>,
    location: Option<String>,
}

impl LocationResolver {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            explicit: None,
            location: Some(location.into()),
        }
    }

    pub fn with_explicit(mut self, id: impl Into<String>) -> Self {
        self.explicit = Some(id.into());
        self
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn from_location(&self) -> Option<String> {
        let url = Url::parse(self.location.as_deref()?).ok()?;

        if let Some(id) = url.fragment().and_then(non_empty) {
            return Some(id);
        }

        if let Some(id) = url
            .query_pairs()
            .find(|(key, _)| key == "id")
            .and_then(|(_, value)| non_empty(&value))
        {
            return Some(id);
        }

        let mut segments = url.path_segments()?;
        segments.find(|segment| *segment == "track")?;
        segments.next().and_then(non_empty)
    }
}

impl OrderIdResolver for LocationResolver {
    fn resolve(&self) -> Option<String> {
        self.explicit
            .as_deref()
            .and_then(non_empty)
            .or_else(|| self.from_location())
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_wins() {
        let resolver = LocationResolver::new("https://t.example/track/9#8?id=7").with_explicit("1");
        assert_eq!(resolver.resolve().as_deref(), Some("1"));
    }

    #[test]
    fn test_fragment_before_query() {
        let resolver = LocationResolver::new("https://t.example/track/9?id=7#8");
        assert_eq!(resolver.resolve().as_deref(), Some("8"));
    }

    #[test]
    fn test_query_before_path() {
        let resolver = LocationResolver::new("https://t.example/track/9?id=7");
        assert_eq!(resolver.resolve().as_deref(), Some("7"));
    }

    #[test]
    fn test_path_after_track() {
        let resolver = LocationResolver::new("https://t.example/app/track/9/");
        assert_eq!(resolver.resolve().as_deref(), Some("9"));
    }

    #[test]
    fn test_empty_sources_are_skipped() {
        let resolver = LocationResolver::new("https://t.example/track/?id=#").with_explicit("  ");
        assert_eq!(resolver.resolve(), None);
        assert_eq!(LocationResolver::new("https://t.example/").resolve(), None);
        assert_eq!(LocationResolver::new("not a url").resolve(), None);
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = || Some("55".to_string());
        assert_eq!(resolver.resolve().as_deref(), Some("55"));
        assert_eq!(ExplicitId(String::new()).resolve(), None);
    }
}
