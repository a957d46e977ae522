//! Easing functions for tweens.
//!
//! Every curve is defined once as its "in" form; `out`, `inOut` and `outIn`
//! are derived from it. Names follow the `inOutQuad` / `outExpo` convention
//! used by authored animation components.

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnimError;
use crate::interp::bezier_ease_t;

/// Base curve shapes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Curve {
    Quad,
    Cubic,
    Quart,
    Quint,
    Sine,
    Expo,
    Circ,
    Back,
    Elastic,
    Bounce,
    /// `t^p`
    Power(f32),
}

/// How a curve is applied over the [0,1] domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EaseMode {
    In,
    Out,
    InOut,
    OutIn,
}

/// Easing function type
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Ease {
    Linear,
    Curve { curve: Curve, mode: EaseMode },
    CubicBezier(f32, f32, f32, f32),
    /// Jump in `n` equal steps, holding each value until the next step.
    Steps(u32),
}

impl Default for Ease {
    fn default() -> Self {
        Ease::Curve {
            curve: Curve::Quad,
            mode: EaseMode::Out,
        }
    }
}

impl Curve {
    fn ease_in(self, t: f32) -> f32 {
        match self {
            Curve::Quad => t * t,
            Curve::Cubic => t * t * t,
            Curve::Quart => t * t * t * t,
            Curve::Quint => t * t * t * t * t,
            Curve::Sine => 1.0 - (t * PI / 2.0).cos(),
            Curve::Expo => {
                if t == 0.0 {
                    0.0
                } else {
                    2f32.powf(10.0 * t - 10.0)
                }
            }
            Curve::Circ => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            Curve::Back => {
                const C1: f32 = 1.70158;
                const C3: f32 = C1 + 1.0;
                C3 * t * t * t - C1 * t * t
            }
            Curve::Elastic => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    let c4 = (2.0 * PI) / 3.0;
                    -(2f32.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * c4).sin()
                }
            }
            Curve::Bounce => 1.0 - bounce_out(1.0 - t),
            Curve::Power(p) => t.powf(p),
        }
    }
}

fn bounce_out(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;
    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

impl Ease {
    /// Apply the easing function to a progress value.
    ///
    /// Progress is clamped to [0,1]; the endpoints map to exactly 0 and 1.
    /// Back and Elastic curves overshoot in between.
    pub fn apply(&self, t: f32) -> f32 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match *self {
            Ease::Linear => t,
            Ease::Curve { curve, mode } => match mode {
                EaseMode::In => curve.ease_in(t),
                EaseMode::Out => 1.0 - curve.ease_in(1.0 - t),
                EaseMode::InOut => {
                    if t < 0.5 {
                        curve.ease_in(t * 2.0) / 2.0
                    } else {
                        1.0 - curve.ease_in(-2.0 * t + 2.0) / 2.0
                    }
                }
                EaseMode::OutIn => {
                    if t < 0.5 {
                        (1.0 - curve.ease_in(1.0 - 2.0 * t)) / 2.0
                    } else {
                        (curve.ease_in(2.0 * t - 1.0) + 1.0) / 2.0
                    }
                }
            },
            Ease::CubicBezier(x1, y1, x2, y2) => bezier_ease_t(t, x1, y1, x2, y2),
            Ease::Steps(n) => {
                let n = n.max(1) as f32;
                (t * n).floor() / n
            }
        }
    }
}

fn parse_args(name: &str, inner: &str) -> Result<Vec<f32>, AnimError> {
    inner
        .split(',')
        .map(|a| {
            a.trim()
                .parse::<f32>()
                .map_err(|_| AnimError::UnknownEase(name.to_string()))
        })
        .collect()
}

fn parse_curve(name: &str) -> Option<Curve> {
    Some(match name {
        "Quad" => Curve::Quad,
        "Cubic" => Curve::Cubic,
        "Quart" => Curve::Quart,
        "Quint" => Curve::Quint,
        "Sine" => Curve::Sine,
        "Expo" => Curve::Expo,
        "Circ" => Curve::Circ,
        "Back" => Curve::Back,
        "Elastic" => Curve::Elastic,
        "Bounce" => Curve::Bounce,
        _ => return None,
    })
}

impl FromStr for Ease {
    type Err = AnimError;

    /// Accepts `linear`, `inOutQuad`-style names, bare `in`/`out`/`inOut`/`outIn`
    /// (power 1.675), `out(3)` power eases, `cubicBezier(x1,y1,x2,y2)` and `steps(n)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let unknown = || AnimError::UnknownEase(s.to_string());
        if s == "linear" || s == "none" {
            return Ok(Ease::Linear);
        }
        let (head, args) = match s.find('(') {
            Some(open) => {
                let inner = s[open + 1..].strip_suffix(')').ok_or_else(unknown)?;
                (&s[..open], Some(parse_args(s, inner)?))
            }
            None => (s, None),
        };
        match (head, args.as_deref()) {
            ("cubicBezier", Some([x1, y1, x2, y2])) => {
                return Ok(Ease::CubicBezier(*x1, *y1, *x2, *y2))
            }
            ("steps", Some([n])) if *n >= 1.0 => return Ok(Ease::Steps(*n as u32)),
            ("cubicBezier", _) | ("steps", _) => return Err(unknown()),
            _ => {}
        }
        // Longest prefixes first so "inOut" wins over "in".
        let (mode, rest) = [
            ("inOut", EaseMode::InOut),
            ("outIn", EaseMode::OutIn),
            ("in", EaseMode::In),
            ("out", EaseMode::Out),
        ]
        .into_iter()
        .find_map(|(prefix, mode)| head.strip_prefix(prefix).map(|rest| (mode, rest)))
        .ok_or_else(unknown)?;
        let curve = match (rest, args.as_deref()) {
            ("", None) => Curve::Power(1.675),
            ("", Some([p])) => Curve::Power(*p),
            (name, None) => parse_curve(name).ok_or_else(unknown)?,
            _ => return Err(unknown()),
        };
        Ok(Ease::Curve { curve, mode })
    }
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ease::Linear => write!(f, "linear"),
            Ease::CubicBezier(a, b, c, d) => write!(f, "cubicBezier({a},{b},{c},{d})"),
            Ease::Steps(n) => write!(f, "steps({n})"),
            Ease::Curve { curve, mode } => {
                let prefix = match mode {
                    EaseMode::In => "in",
                    EaseMode::Out => "out",
                    EaseMode::InOut => "inOut",
                    EaseMode::OutIn => "outIn",
                };
                match curve {
                    Curve::Power(p) => write!(f, "{prefix}({p})"),
                    other => write!(f, "{prefix}{other:?}"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_named() -> Vec<Ease> {
        let mut out = vec![Ease::Linear, Ease::Steps(4), Ease::CubicBezier(0.4, 0.0, 0.2, 1.0)];
        for curve in [
            Curve::Quad,
            Curve::Cubic,
            Curve::Quart,
            Curve::Quint,
            Curve::Sine,
            Curve::Expo,
            Curve::Circ,
            Curve::Back,
            Curve::Elastic,
            Curve::Bounce,
            Curve::Power(2.5),
        ] {
            for mode in [EaseMode::In, EaseMode::Out, EaseMode::InOut, EaseMode::OutIn] {
                out.push(Ease::Curve { curve, mode });
            }
        }
        out
    }

    #[test]
    fn endpoints_are_exact_for_every_ease() {
        for ease in all_named() {
            assert_eq!(ease.apply(0.0), 0.0, "{ease}");
            assert_eq!(ease.apply(1.0), 1.0, "{ease}");
            assert_eq!(ease.apply(-0.5), 0.0, "{ease}");
            assert_eq!(ease.apply(1.5), 1.0, "{ease}");
        }
    }

    #[test]
    fn parses_component_names() {
        assert_eq!(
            "inOutQuad".parse::<Ease>().unwrap(),
            Ease::Curve {
                curve: Curve::Quad,
                mode: EaseMode::InOut
            }
        );
        assert_eq!(
            "outExpo".parse::<Ease>().unwrap(),
            Ease::Curve {
                curve: Curve::Expo,
                mode: EaseMode::Out
            }
        );
        assert_eq!(
            "out(3)".parse::<Ease>().unwrap(),
            Ease::Curve {
                curve: Curve::Power(3.0),
                mode: EaseMode::Out
            }
        );
        assert_eq!("steps(5)".parse::<Ease>().unwrap(), Ease::Steps(5));
        assert_eq!("linear".parse::<Ease>().unwrap(), Ease::Linear);
    }

    #[test]
    fn display_round_trips_through_parse() {
        for ease in all_named() {
            let text = ease.to_string();
            assert_eq!(text.parse::<Ease>().unwrap(), ease, "{text}");
        }
    }

    #[test]
    fn rejects_unknown_names() {
        assert!(matches!("inOutWobble".parse::<Ease>(), Err(AnimError::UnknownEase(_))));
        assert!("cubicBezier(1,2)".parse::<Ease>().is_err());
        assert!("steps(0)".parse::<Ease>().is_err());
        assert!("".parse::<Ease>().is_err());
    }

    #[test]
    fn back_overshoots_and_in_out_quad_is_symmetric() {
        let back = "inBack".parse::<Ease>().unwrap();
        assert!(back.apply(0.2) < 0.0);
        let q = "inOutQuad".parse::<Ease>().unwrap();
        assert!((q.apply(0.5) - 0.5).abs() < 1e-6);
        assert!((q.apply(0.25) + q.apply(0.75) - 1.0).abs() < 1e-6);
    }
}
