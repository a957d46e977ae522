//! Property maps passed to `TimelineMut::add`.
//!
//! A [`Properties`] value lists the animated properties plus optional per-call
//! timing overrides. Any of them can be a per-target closure evaluated once for
//! each resolved target with its index, which is how staggered reveals are
//! authored.

use std::fmt;
use std::rc::Rc;

use crate::easing::Ease;
use crate::error::AnimError;
use crate::targets::TargetHandle;
use crate::value::RawValue;

/// A literal or a per-target closure `(target, index) -> T`.
pub enum Param<T> {
    Fixed(T),
    PerTarget(Rc<dyn Fn(&TargetHandle, usize) -> T>),
}

impl<T: Clone> Param<T> {
    pub fn per_target(f: impl Fn(&TargetHandle, usize) -> T + 'static) -> Self {
        Param::PerTarget(Rc::new(f))
    }

    pub fn eval(&self, target: &TargetHandle, index: usize) -> T {
        match self {
            Param::Fixed(v) => v.clone(),
            Param::PerTarget(f) => f(target, index),
        }
    }
}

impl<T: Clone> Clone for Param<T> {
    fn clone(&self) -> Self {
        match self {
            Param::Fixed(v) => Param::Fixed(v.clone()),
            Param::PerTarget(f) => Param::PerTarget(Rc::clone(f)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Param<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Fixed(v) => f.debug_tuple("Fixed").field(v).finish(),
            Param::PerTarget(_) => f.write_str("PerTarget(..)"),
        }
    }
}

impl From<f64> for Param<f64> {
    fn from(v: f64) -> Self {
        Param::Fixed(v)
    }
}

impl From<i32> for Param<f64> {
    fn from(v: i32) -> Self {
        Param::Fixed(v as f64)
    }
}

/// `start + step * index` for each target.
pub fn stagger(step: f64, start: f64) -> Param<f64> {
    Param::per_target(move |_, i| start + step * i as f64)
}

/// Authored from/to pair. A missing `from` inherits the last value animated on
/// the same target/property.
#[derive(Clone, Debug, PartialEq)]
pub struct PropValue {
    pub from: Option<RawValue>,
    pub to: RawValue,
}

impl PropValue {
    pub fn from_to(from: impl Into<RawValue>, to: impl Into<RawValue>) -> Self {
        Self {
            from: Some(from.into()),
            to: to.into(),
        }
    }

    pub fn to(to: impl Into<RawValue>) -> Self {
        Self {
            from: None,
            to: to.into(),
        }
    }
}

/// Ease given by name (parsed when the call is authored) or as a value.
#[derive(Clone, Debug, PartialEq)]
pub enum EaseSpec {
    Named(String),
    Ease(Ease),
}

impl EaseSpec {
    pub fn resolve(&self) -> Result<Ease, AnimError> {
        match self {
            EaseSpec::Named(name) => name.parse(),
            EaseSpec::Ease(e) => Ok(*e),
        }
    }
}

impl From<&str> for EaseSpec {
    fn from(s: &str) -> Self {
        EaseSpec::Named(s.to_string())
    }
}

impl From<Ease> for EaseSpec {
    fn from(e: Ease) -> Self {
        EaseSpec::Ease(e)
    }
}

/// Property map for one `add` call.
#[derive(Clone, Debug, Default)]
pub struct Properties {
    pub(crate) props: Vec<(String, Param<PropValue>)>,
    pub(crate) duration: Option<Param<f64>>,
    pub(crate) delay: Option<Param<f64>>,
    pub(crate) ease: Option<EaseSpec>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Animate `name` between literal values.
    pub fn prop(mut self, name: &str, value: PropValue) -> Self {
        self.props.push((name.to_string(), Param::Fixed(value)));
        self
    }

    /// Shorthand for `prop(name, PropValue::from_to(from, to))`.
    pub fn from_to(self, name: &str, from: impl Into<RawValue>, to: impl Into<RawValue>) -> Self {
        self.prop(name, PropValue::from_to(from, to))
    }

    /// Animate `name` with values computed per target.
    pub fn prop_with(
        mut self,
        name: &str,
        f: impl Fn(&TargetHandle, usize) -> PropValue + 'static,
    ) -> Self {
        self.props.push((name.to_string(), Param::per_target(f)));
        self
    }

    pub fn duration(mut self, ms: impl Into<Param<f64>>) -> Self {
        self.duration = Some(ms.into());
        self
    }

    pub fn delay(mut self, ms: impl Into<Param<f64>>) -> Self {
        self.delay = Some(ms.into());
        self
    }

    pub fn delay_with(mut self, f: impl Fn(&TargetHandle, usize) -> f64 + 'static) -> Self {
        self.delay = Some(Param::per_target(f));
        self
    }

    pub fn ease(mut self, ease: impl Into<EaseSpec>) -> Self {
        self.ease = Some(ease.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}
