//! Media queries for responsive scopes.
//!
//! Grammar (subset of CSS media queries):
//!   query-list := query ("," query)*
//!   query      := ["not" | "only"] (media-type ["and" feature]* | feature ["and" feature]*)
//!   media-type := "all" | "screen" | "print"
//!   feature    := "(" name [":" value] ")"
//!
//! Supported features: width/height with min-/max- prefixes (px or em),
//! orientation, prefers-reduced-motion, prefers-color-scheme. Queries are
//! parsed once at scope construction and re-evaluated whenever the host
//! supplies a new [`MediaEnvironment`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnimError;

const EM_PX: f32 = 16.0;

/// Host-provided viewport/preferences snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaEnvironment {
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub reduced_motion: bool,
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default)]
    pub print: bool,
}

impl Default for MediaEnvironment {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
            reduced_motion: false,
            dark_mode: false,
            print: false,
        }
    }
}

impl MediaEnvironment {
    pub fn with_size(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Bound {
    Min,
    Max,
    Exact,
}

#[derive(Clone, Debug, PartialEq)]
enum Feature {
    Width(Bound, f32),
    Height(Bound, f32),
    Landscape(bool),
    ReducedMotion(bool),
    Dark(bool),
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum MediaType {
    All,
    Screen,
    Print,
}

#[derive(Clone, Debug, PartialEq)]
struct Query {
    negated: bool,
    media_type: MediaType,
    features: Vec<Feature>,
}

/// Parsed media query list; matches when any comma-separated query matches.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaQuery {
    source: String,
    queries: Vec<Query>,
}

impl MediaQuery {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, env: &MediaEnvironment) -> bool {
        self.queries.iter().any(|q| q.matches(env))
    }
}

impl Query {
    fn matches(&self, env: &MediaEnvironment) -> bool {
        let type_ok = match self.media_type {
            MediaType::All => true,
            MediaType::Screen => !env.print,
            MediaType::Print => env.print,
        };
        let result = type_ok && self.features.iter().all(|f| f.matches(env));
        result != self.negated
    }
}

impl Feature {
    fn matches(&self, env: &MediaEnvironment) -> bool {
        let cmp = |bound: Bound, actual: f32, v: f32| match bound {
            Bound::Min => actual >= v,
            Bound::Max => actual <= v,
            Bound::Exact => actual == v,
        };
        match self {
            Feature::Width(b, v) => cmp(*b, env.width, *v),
            Feature::Height(b, v) => cmp(*b, env.height, *v),
            Feature::Landscape(l) => (env.width > env.height) == *l,
            Feature::ReducedMotion(r) => env.reduced_motion == *r,
            Feature::Dark(d) => env.dark_mode == *d,
        }
    }
}

fn err(query: &str, reason: impl Into<String>) -> AnimError {
    AnimError::InvalidMediaQuery {
        query: query.to_string(),
        reason: reason.into(),
    }
}

fn parse_length(query: &str, raw: &str) -> Result<f32, AnimError> {
    let raw = raw.trim();
    let (num, scale) = if let Some(n) = raw.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = raw.strip_suffix("em") {
        (n, EM_PX)
    } else if raw == "0" {
        (raw, 1.0)
    } else {
        return Err(err(query, format!("length '{raw}' needs a px or em unit")));
    };
    let v: f32 = num
        .trim()
        .parse()
        .map_err(|_| err(query, format!("malformed length '{raw}'")))?;
    Ok(v * scale)
}

fn parse_feature(query: &str, body: &str) -> Result<Feature, AnimError> {
    let (name, value) = match body.split_once(':') {
        Some((n, v)) => (n.trim(), Some(v.trim())),
        None => (body.trim(), None),
    };
    let value = value.ok_or_else(|| err(query, format!("feature '{name}' needs a value")))?;
    let (bound, base) = if let Some(b) = name.strip_prefix("min-") {
        (Bound::Min, b)
    } else if let Some(b) = name.strip_prefix("max-") {
        (Bound::Max, b)
    } else {
        (Bound::Exact, name)
    };
    match (bound, base) {
        (_, "width") => Ok(Feature::Width(bound, parse_length(query, value)?)),
        (_, "height") => Ok(Feature::Height(bound, parse_length(query, value)?)),
        (Bound::Exact, "orientation") => match value {
            "landscape" => Ok(Feature::Landscape(true)),
            "portrait" => Ok(Feature::Landscape(false)),
            other => Err(err(query, format!("unknown orientation '{other}'"))),
        },
        (Bound::Exact, "prefers-reduced-motion") => match value {
            "reduce" => Ok(Feature::ReducedMotion(true)),
            "no-preference" => Ok(Feature::ReducedMotion(false)),
            other => Err(err(query, format!("unknown motion preference '{other}'"))),
        },
        (Bound::Exact, "prefers-color-scheme") => match value {
            "dark" => Ok(Feature::Dark(true)),
            "light" => Ok(Feature::Dark(false)),
            other => Err(err(query, format!("unknown color scheme '{other}'"))),
        },
        _ => Err(err(query, format!("unsupported feature '{name}'"))),
    }
}

/// Split a single query into "and"-separated terms, keeping parentheses intact.
fn split_terms(query: &str, q: &str) -> Result<Vec<String>, AnimError> {
    let mut terms = Vec::new();
    let mut rest = q.trim();
    while !rest.is_empty() {
        if let Some(inner) = rest.strip_prefix('(') {
            let close = inner
                .find(')')
                .ok_or_else(|| err(query, "unbalanced parenthesis"))?;
            terms.push(format!("({})", &inner[..close]));
            rest = inner[close + 1..].trim_start();
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            terms.push(rest[..end].to_string());
            rest = rest[end..].trim_start();
        }
    }
    Ok(terms)
}

fn parse_query(source: &str, q: &str) -> Result<Query, AnimError> {
    let terms = split_terms(source, q)?;
    if terms.is_empty() {
        return Err(err(source, "empty query"));
    }
    let mut iter = terms.iter().map(String::as_str).peekable();
    let mut negated = false;
    match iter.peek() {
        Some(&"not") => {
            negated = true;
            iter.next();
        }
        Some(&"only") => {
            iter.next();
        }
        _ => {}
    }
    let mut media_type = MediaType::All;
    let mut features = Vec::new();
    let mut expect_feature = true;
    if let Some(&t) = iter.peek() {
        let typed = match t {
            "all" => Some(MediaType::All),
            "screen" => Some(MediaType::Screen),
            "print" => Some(MediaType::Print),
            _ => None,
        };
        if let Some(mt) = typed {
            media_type = mt;
            iter.next();
            expect_feature = false;
        }
    }
    for term in iter {
        if term == "and" {
            if expect_feature {
                return Err(err(source, "misplaced 'and'"));
            }
            expect_feature = true;
            continue;
        }
        let body = term
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .ok_or_else(|| err(source, format!("unexpected token '{term}'")))?;
        if !expect_feature {
            return Err(err(source, "features must be joined with 'and'"));
        }
        features.push(parse_feature(source, body)?);
        expect_feature = false;
    }
    if expect_feature && (negated || !features.is_empty()) {
        return Err(err(source, "query ends with 'and' or is missing a feature"));
    }
    if expect_feature && features.is_empty() {
        return Err(err(source, "empty query"));
    }
    Ok(Query {
        negated,
        media_type,
        features,
    })
}

impl FromStr for MediaQuery {
    type Err = AnimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(err(s, "empty query"));
        }
        let queries = s
            .split(',')
            .map(|q| parse_query(s, q))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MediaQuery {
            source: s.to_string(),
            queries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(s: &str) -> MediaQuery {
        s.parse().unwrap()
    }

    #[test]
    fn min_width_breakpoint() {
        let mq = q("(min-width: 600px)");
        assert!(!mq.matches(&MediaEnvironment::with_size(599.0, 800.0)));
        assert!(mq.matches(&MediaEnvironment::with_size(600.0, 800.0)));
    }

    #[test]
    fn and_lists_and_comma_alternatives() {
        let mq = q("screen and (min-width: 40em) and (orientation: landscape), print");
        assert!(mq.matches(&MediaEnvironment::with_size(1024.0, 768.0)));
        assert!(!mq.matches(&MediaEnvironment::with_size(500.0, 768.0)));
        let printing = MediaEnvironment {
            print: true,
            ..MediaEnvironment::with_size(10.0, 10.0)
        };
        assert!(mq.matches(&printing));
    }

    #[test]
    fn negation_and_preferences() {
        let mq = q("not all and (prefers-reduced-motion: reduce)");
        let mut env = MediaEnvironment::default();
        assert!(mq.matches(&env));
        env.reduced_motion = true;
        assert!(!mq.matches(&env));
        assert!(q("(prefers-color-scheme: dark)").matches(&MediaEnvironment {
            dark_mode: true,
            ..env
        }));
    }

    #[test]
    fn malformed_queries_fail() {
        for bad in [
            "",
            "(min-width 600px)",
            "(min-width: 600)",
            "(min-width: 600px",
            "(width: 1px) (height: 1px)",
            "screen and",
            "(hover: hover)",
            "tv",
        ] {
            assert!(
                matches!(bad.parse::<MediaQuery>(), Err(AnimError::InvalidMediaQuery { .. })),
                "{bad:?} should be rejected"
            );
        }
    }
}
