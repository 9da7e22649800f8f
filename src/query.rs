//! OData query options: `$expand`, `$levels`, `$skip`, `$top`.

use std::fmt;

/// Which references `$expand` follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandSymbol {
    /// `*`: every hyperlink, subordinate or not.
    All,
    /// `~`: hyperlinks under `Links` only.
    Links,
    /// `.`: subordinate hyperlinks only.
    Subordinate,
}

impl ExpandSymbol {
    /// The symbol as it appears in the query string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "*",
            Self::Links => "~",
            Self::Subordinate => ".",
        }
    }

    fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "*" => Some(Self::All),
            "~" => Some(Self::Links),
            "." => Some(Self::Subordinate),
            _ => None,
        }
    }
}

impl fmt::Display for ExpandSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single query option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOption {
    /// Expand references with the given symbol.
    Expand(ExpandSymbol),
    /// Expand this many levels deep.
    ExpandLevel(u32),
    /// Apply expansion to collection requests only.
    ExpandOnlyCollection,
    /// Skip the first `n` members.
    Skip(u64),
    /// Return at most `n` members.
    Top(u64),
}

/// `$expand=<symbol>`.
pub fn with_expand(symbol: ExpandSymbol) -> QueryOption {
    QueryOption::Expand(symbol)
}

/// `($levels=<n>)` qualifier of `$expand`.
pub fn with_expand_level(levels: u32) -> QueryOption {
    QueryOption::ExpandLevel(levels)
}

/// Restrict expansion to collection requests.
pub fn with_expand_only_collection() -> QueryOption {
    QueryOption::ExpandOnlyCollection
}

/// `$skip=<n>`.
pub fn with_skip(n: u64) -> QueryOption {
    QueryOption::Skip(n)
}

/// `$top=<n>`.
pub fn with_top(n: u64) -> QueryOption {
    QueryOption::Top(n)
}

/// The accumulated effect of a list of [`QueryOption`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Expansion symbol.
    pub expand: Option<ExpandSymbol>,
    /// Expansion depth.
    pub levels: Option<u32>,
    /// Expansion is meant for collections only.
    pub only_collection: bool,
    /// `$skip`.
    pub skip: Option<u64>,
    /// `$top`.
    pub top: Option<u64>,
}

impl Query {
    /// Fold `options` in order; later options override earlier ones.
    pub fn from_options(options: &[QueryOption]) -> Self {
        let mut query = Self::default();
        for option in options {
            match *option {
                QueryOption::Expand(symbol) => query.expand = Some(symbol),
                QueryOption::ExpandLevel(levels) => query.levels = Some(levels),
                QueryOption::ExpandOnlyCollection => query.only_collection = true,
                QueryOption::Skip(n) => query.skip = Some(n),
                QueryOption::Top(n) => query.top = Some(n),
            }
        }
        query
    }

    fn render(&self, with_expansion: bool) -> String {
        let mut parts = Vec::new();
        match (self.expand.filter(|_| with_expansion), self.levels) {
            (Some(symbol), Some(levels)) => parts.push(format!("$expand={symbol}($levels={levels})")),
            (Some(symbol), None) => parts.push(format!("$expand={symbol}")),
            (None, _) => {}
        }
        if let Some(skip) = self.skip {
            parts.push(format!("$skip={skip}"));
        }
        if let Some(top) = self.top {
            parts.push(format!("$top={top}"));
        }
        parts.join("&")
    }
}

/// Append `options` to a singleton resource URL.
///
/// Expansion is dropped when [`with_expand_only_collection`] is present.
pub fn build_query(url: &str, options: &[QueryOption]) -> String {
    let query = Query::from_options(options);
    append(url, &query.render(!query.only_collection))
}

/// Append `options` to a collection URL.
///
/// Expansion is applied only when [`with_expand_only_collection`] is present.
pub fn build_query_for_collection(url: &str, options: &[QueryOption]) -> String {
    let query = Query::from_options(options);
    append(url, &query.render(query.only_collection))
}

/// Split a URL into its path and the query options it carries.
///
/// Unknown parameters are ignored.
pub fn parse_query(url: &str) -> (&str, Query) {
    let Some((path, raw)) = url.split_once('?') else {
        return (url, Query::default());
    };

    let mut query = Query::default();
    for pair in raw.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        match key {
            "$expand" => {
                let (symbol, levels) = match value.split_once("($levels=") {
                    Some((symbol, rest)) => (symbol, rest.strip_suffix(')')),
                    None => (value, None),
                };
                query.expand = ExpandSymbol::parse(symbol);
                query.levels = levels.and_then(|l| l.parse().ok());
            }
            "$skip" => query.skip = value.parse().ok(),
            "$top" => query.top = value.parse().ok(),
            _ => {}
        }
    }
    (path, query)
}

fn append(url: &str, rendered: &str) -> String {
    if rendered.is_empty() {
        return url.to_owned();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{rendered}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYSTEMS: &str = "/redfish/v1/Systems";

    #[test]
    fn no_options_leaves_url_unchanged() {
        assert_eq!(build_query(SYSTEMS, &[]), SYSTEMS);
        assert_eq!(build_query_for_collection(SYSTEMS, &[]), SYSTEMS);
    }

    #[test]
    fn expand_with_levels_and_paging() {
        let url = build_query(
            SYSTEMS,
            &[
                with_expand(ExpandSymbol::All),
                with_expand_level(2),
                with_skip(4),
                with_top(2),
            ],
        );
        assert_eq!(url, "/redfish/v1/Systems?$expand=*($levels=2)&$skip=4&$top=2");
    }

    #[test]
    fn paging_only() {
        let url = build_query_for_collection(SYSTEMS, &[with_top(5), with_skip(10)]);
        assert_eq!(url, "/redfish/v1/Systems?$skip=10&$top=5");
    }

    #[test]
    fn only_collection_splits_expansion() {
        let options = [with_expand(ExpandSymbol::Subordinate), with_expand_only_collection()];
        assert_eq!(build_query(SYSTEMS, &options), SYSTEMS);
        assert_eq!(
            build_query_for_collection(SYSTEMS, &options),
            "/redfish/v1/Systems?$expand=."
        );
        assert_eq!(
            build_query_for_collection(SYSTEMS, &[with_expand(ExpandSymbol::Links)]),
            SYSTEMS
        );
    }

    #[test]
    fn existing_query_string_is_extended() {
        assert_eq!(
            build_query("/redfish/v1/Systems?foo=bar", &[with_top(1)]),
            "/redfish/v1/Systems?foo=bar&$top=1"
        );
    }

    #[test]
    fn parse_recovers_options_in_any_order() {
        let forward = [with_expand(ExpandSymbol::Links), with_expand_level(3), with_top(7)];
        let reverse = [with_top(7), with_expand_level(3), with_expand(ExpandSymbol::Links)];
        for options in [forward, reverse] {
            let url = build_query(SYSTEMS, &options);
            let (path, query) = parse_query(&url);
            assert_eq!(path, SYSTEMS);
            assert_eq!(query, Query::from_options(&options));
        }
    }
}
