//! Dynamic setter protocol
//!
//! Free-form options are string maps whose keys name a setting of a foreign
//! settings object. Each key becomes a setter name (`set` + Capitalized key)
//! that is looked up in the object's setter table. The value is coerced to
//! the setter's parameter shape. Anything that does not fit is skipped.

use indexmap::IndexMap;
use std::fmt;

pub use ephemeral_db_macros::DynamicSettings;

/// A value handed to a setter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Text(String),
    List(Vec<String>),
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(value: Vec<String>) -> Self {
        OptionValue::List(value)
    }
}

/// A single-argument mutator, by parameter shape
pub enum Setter<T: ?Sized> {
    Text(fn(&mut T, String)),
    Flag(fn(&mut T, bool)),
    List(fn(&mut T, Vec<String>)),
    /// Parses the text itself and reports whether it could
    Parsed(fn(&mut T, &str) -> bool),
}

impl<T: ?Sized> Setter<T> {
    /// Coerce `value` to this setter's shape and invoke it
    ///
    /// Returns false when the value does not fit, leaving `target` untouched.
    pub fn invoke(&self, target: &mut T, value: &OptionValue) -> bool {
        match (self, value) {
            (Setter::Text(set), OptionValue::Text(text)) => {
                set(target, text.clone());
                true
            }
            (Setter::Flag(set), OptionValue::Text(text)) => {
                set(target, parse_flag(text));
                true
            }
            (Setter::List(set), OptionValue::List(items)) => {
                set(target, items.clone());
                true
            }
            (Setter::Parsed(set), OptionValue::Text(text)) => set(target, text),
            _ => false,
        }
    }

    fn shape(&self) -> &'static str {
        match self {
            Setter::Text(_) => "text",
            Setter::Flag(_) => "flag",
            Setter::List(_) => "list",
            Setter::Parsed(_) => "parsed",
        }
    }
}

impl<T: ?Sized> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Setter::{}", self.shape())
    }
}

/// `"true"` in any case is true, everything else false
pub fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// Name-indexed setters of one settings type
///
/// A name may carry several setters; the first that accepts a value wins.
pub struct SetterTable<T: ?Sized> {
    setters: IndexMap<String, Vec<Setter<T>>>,
}

impl<T: ?Sized> Default for SetterTable<T> {
    fn default() -> Self {
        Self {
            setters: IndexMap::new(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for SetterTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.setters.iter()).finish()
    }
}

impl<T: ?Sized> SetterTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, name: &str, setter: Setter<T>) -> Self {
        self.setters.entry(name.to_string()).or_default().push(setter);
        self
    }

    pub fn text(self, name: &str, set: fn(&mut T, String)) -> Self {
        self.register(name, Setter::Text(set))
    }

    pub fn flag(self, name: &str, set: fn(&mut T, bool)) -> Self {
        self.register(name, Setter::Flag(set))
    }

    pub fn list(self, name: &str, set: fn(&mut T, Vec<String>)) -> Self {
        self.register(name, Setter::List(set))
    }

    pub fn parsed(self, name: &str, set: fn(&mut T, &str) -> bool) -> Self {
        self.register(name, Setter::Parsed(set))
    }

    /// Setter names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.setters.keys().map(String::as_str)
    }

    /// Invoke the first setter called `name` that accepts `value`
    pub fn apply(&self, target: &mut T, name: &str, value: &OptionValue) -> bool {
        self.setters
            .get(name)
            .map(|candidates| candidates.iter().any(|setter| setter.invoke(target, value)))
            .unwrap_or(false)
    }
}

/// A foreign settings object that accepts setters by name
pub trait DynamicSettings {
    /// Invoke the setter called `setter` with `value`
    ///
    /// Returns false when no setter of that name accepts the value.
    fn apply_setter(&mut self, setter: &str, value: &OptionValue) -> bool;
}

/// Setter name for an option: `set` + option name with its first character upper-cased
pub fn setter_name_for(option: &str) -> Option<String> {
    let option = option.trim();
    let mut chars = option.chars();
    let first = chars.next()?;
    Some(format!("set{}{}", first.to_uppercase(), chars.as_str()))
}

/// Apply a free-form option map, skipping whatever the target does not take
///
/// Returns how many options were applied.
pub fn apply_setter_map<T>(target: &mut T, options: &IndexMap<String, String>) -> usize
where
    T: DynamicSettings + ?Sized,
{
    let mut applied = 0;
    for (option, value) in options {
        let Some(setter) = setter_name_for(option) else {
            continue;
        };
        if target.apply_setter(&setter, &OptionValue::Text(value.clone())) {
            applied += 1;
        } else {
            tracing::trace!(
                option = %option,
                setter = %setter,
                "Skipped option without a matching setter"
            );
        }
    }
    applied
}
