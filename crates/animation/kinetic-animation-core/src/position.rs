//! Timeline position expressions.
//!
//! Grammar:
//!   number               absolute ms from timeline start ("500" is accepted too)
//!   "+=" N | "-=" N      relative to the current timeline end
//!   "<"  [op N]          end of the previous entry
//!   "<<" [op N]          start of the previous entry
//!   label [op N]         a label set with `TimelineMut::label`
//!   (omitted)            current timeline end
//!   op := "+=" | "-="
//!
//! Resolution only reads entries that were already added.

use hashbrown::HashMap;

use crate::error::AnimError;

/// Position argument of `TimelineMut::add`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Position {
    /// Append at the current timeline end.
    #[default]
    End,
    At(f64),
    Expr(String),
}

impl From<f64> for Position {
    fn from(v: f64) -> Self {
        Position::At(v)
    }
}

impl From<i32> for Position {
    fn from(v: i32) -> Self {
        Position::At(v as f64)
    }
}

impl From<&str> for Position {
    fn from(s: &str) -> Self {
        Position::Expr(s.to_string())
    }
}

impl From<String> for Position {
    fn from(s: String) -> Self {
        Position::Expr(s)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Anchor {
    Zero,
    TimelineEnd,
    PrevStart,
    PrevEnd,
    Label(String),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ParsedPosition {
    pub anchor: Anchor,
    pub offset: f64,
}

/// Resolved span of an already-added entry.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EntrySpan {
    pub start: f64,
    pub end: f64,
}

/// Everything a position may refer to.
pub(crate) struct PositionContext<'a> {
    pub previous: Option<EntrySpan>,
    pub timeline_end: f64,
    pub labels: &'a HashMap<String, f64>,
}

fn invalid(expr: &str, reason: &str) -> AnimError {
    AnimError::InvalidPosition {
        expr: expr.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_offset(expr: &str, rest: &str) -> Result<f64, AnimError> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Ok(0.0);
    }
    let (sign, num) = if let Some(n) = rest.strip_prefix("+=") {
        (1.0, n)
    } else if let Some(n) = rest.strip_prefix("-=") {
        (-1.0, n)
    } else {
        return Err(invalid(expr, "expected '+=' or '-=' offset"));
    };
    let v: f64 = num
        .trim()
        .parse()
        .map_err(|_| invalid(expr, "offset is not a number"))?;
    if !v.is_finite() {
        return Err(invalid(expr, "offset must be finite"));
    }
    Ok(sign * v)
}

impl Position {
    pub(crate) fn parse(&self) -> Result<ParsedPosition, AnimError> {
        let expr = match self {
            Position::End => {
                return Ok(ParsedPosition {
                    anchor: Anchor::TimelineEnd,
                    offset: 0.0,
                })
            }
            Position::At(v) => {
                if !v.is_finite() {
                    return Err(invalid(&v.to_string(), "position must be finite"));
                }
                return Ok(ParsedPosition {
                    anchor: Anchor::Zero,
                    offset: *v,
                });
            }
            Position::Expr(s) => s.as_str(),
        };
        let s = expr.trim();
        if s.is_empty() {
            return Err(invalid(expr, "empty position"));
        }
        if let Ok(v) = s.parse::<f64>() {
            if v.is_finite() {
                return Ok(ParsedPosition {
                    anchor: Anchor::Zero,
                    offset: v,
                });
            }
        }
        if let Some(rest) = s.strip_prefix("<<") {
            return Ok(ParsedPosition {
                anchor: Anchor::PrevStart,
                offset: parse_offset(expr, rest)?,
            });
        }
        if let Some(rest) = s.strip_prefix('<') {
            return Ok(ParsedPosition {
                anchor: Anchor::PrevEnd,
                offset: parse_offset(expr, rest)?,
            });
        }
        if s.starts_with("+=") || s.starts_with("-=") {
            return Ok(ParsedPosition {
                anchor: Anchor::TimelineEnd,
                offset: parse_offset(expr, s)?,
            });
        }
        let label_end = s
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(s.len());
        // "-" is allowed inside labels but would swallow a "-=" offset.
        let label_end = s.find("-=").map_or(label_end, |i| i.min(label_end));
        let label = &s[..label_end];
        if label.is_empty() || !label.starts_with(|c: char| c.is_alphabetic() || c == '_') {
            return Err(invalid(expr, "expected a number, '<', '<<', '+=', '-=' or a label"));
        }
        Ok(ParsedPosition {
            anchor: Anchor::Label(label.to_string()),
            offset: parse_offset(expr, &s[label_end..])?,
        })
    }
}

impl ParsedPosition {
    /// Resolve to an absolute start time; may be negative (caller clamps).
    pub(crate) fn resolve(&self, ctx: &PositionContext<'_>) -> Result<f64, AnimError> {
        let base = match &self.anchor {
            Anchor::Zero => 0.0,
            Anchor::TimelineEnd => ctx.timeline_end,
            Anchor::PrevStart => ctx.previous.map(|p| p.start).unwrap_or(0.0),
            Anchor::PrevEnd => ctx.previous.map(|p| p.end).unwrap_or(0.0),
            Anchor::Label(name) => *ctx
                .labels
                .get(name)
                .ok_or_else(|| AnimError::UnknownLabel(name.clone()))?,
        };
        Ok(base + self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(
        pos: impl Into<Position>,
        prev: Option<EntrySpan>,
        end: f64,
    ) -> Result<f64, AnimError> {
        let mut labels = HashMap::new();
        labels.insert("outro".to_string(), 4000.0);
        let ctx = PositionContext {
            previous: prev,
            timeline_end: end,
            labels: &labels,
        };
        pos.into().parse()?.resolve(&ctx)
    }

    const PREV: Option<EntrySpan> = Some(EntrySpan {
        start: 200.0,
        end: 1700.0,
    });

    #[test]
    fn absolute_and_timeline_relative() {
        assert_eq!(resolve(0, PREV, 3000.0).unwrap(), 0.0);
        assert_eq!(resolve("750", PREV, 3000.0).unwrap(), 750.0);
        assert_eq!(resolve(Position::End, PREV, 3000.0).unwrap(), 3000.0);
        assert_eq!(resolve("+=250", PREV, 3000.0).unwrap(), 3250.0);
        assert_eq!(resolve("-=500", PREV, 3000.0).unwrap(), 2500.0);
    }

    #[test]
    fn previous_entry_anchors() {
        assert_eq!(resolve("<", PREV, 3000.0).unwrap(), 1700.0);
        assert_eq!(resolve("<-=1000", PREV, 3000.0).unwrap(), 700.0);
        assert_eq!(resolve("<<", PREV, 3000.0).unwrap(), 200.0);
        assert_eq!(resolve("<<+=500", PREV, 3000.0).unwrap(), 700.0);
        assert_eq!(resolve(" << -= 50 ", PREV, 3000.0).unwrap(), 150.0);
        assert_eq!(resolve("<+=10", None, 0.0).unwrap(), 10.0);
    }

    #[test]
    fn labels_with_offsets() {
        assert_eq!(resolve("outro", PREV, 0.0).unwrap(), 4000.0);
        assert_eq!(resolve("outro-=1200", PREV, 0.0).unwrap(), 2800.0);
        assert!(matches!(
            resolve("intro", PREV, 0.0),
            Err(AnimError::UnknownLabel(l)) if l == "intro"
        ));
    }

    #[test]
    fn malformed_expressions_fail() {
        for bad in ["", "<*=2", "<+=abc", "<<+", "+=", "=5", "12px", "<+=inf"] {
            assert!(
                matches!(resolve(bad, PREV, 0.0), Err(AnimError::InvalidPosition { .. })),
                "{bad:?} should be rejected"
            );
        }
        assert!(resolve(f64::NAN, PREV, 0.0).is_err());
    }
}
