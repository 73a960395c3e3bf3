//! Parse `key=value` arguments and numeric literals into bindings.
//!
//! Values may be decimal literals, `a/b` fractions, comma-separated lists,
//! nested `[[a,b],[c,d]]` tables, or one of the unknown markers `-`,
//! `None`, `?` and the empty string.

use tracing::debug;

use crate::types::{Bindings, Formula, FormulaError};

/// Literals that mark a variable as unknown.
pub const UNKNOWN_MARKERS: &[&str] = &["-", "none", "?", ""];

/// Parse a single numeric literal. Returns `Ok(None)` for unknown markers.
pub fn parse_value(text: &str) -> Result<Option<f64>, FormulaError> {
    let text = text.trim();
    if UNKNOWN_MARKERS.contains(&text.to_lowercase().as_str()) {
        return Ok(None);
    }
    if let Some((num, den)) = text.split_once('/') {
        let num = parse_number(num)?;
        let den = parse_number(den)?;
        if den == 0.0 {
            return Err(FormulaError::Parse(format!(
                "invalid fraction '{text}': division by zero"
            )));
        }
        return Ok(Some(num / den));
    }
    parse_number(text).map(Some)
}

/// Parse a comma-separated list, optionally wrapped in `[...]`.
pub fn parse_list(text: &str) -> Result<Vec<f64>, FormulaError> {
    let inner = text.trim().trim_start_matches('[').trim_end_matches(']');
    inner
        .split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            parse_value(s)?.ok_or_else(|| {
                FormulaError::Parse(format!("unknown marker '{s}' is not allowed in a list"))
            })
        })
        .collect()
}

/// Parse a table literal such as `[[10,20],[30,40]]`.
pub fn parse_table(text: &str) -> Result<Vec<Vec<f64>>, FormulaError> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let inner = compact
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| FormulaError::Parse(format!("invalid table '{text}': expected [[..],[..]]")))?;

    let mut rows = Vec::new();
    let mut rest = inner;
    while !rest.is_empty() {
        let body = rest
            .strip_prefix('[')
            .ok_or_else(|| FormulaError::Parse(format!("invalid table '{text}': expected '['")))?;
        let end = body
            .find(']')
            .ok_or_else(|| FormulaError::Parse(format!("invalid table '{text}': unclosed row")))?;
        rows.push(parse_list(&body[..end])?);
        rest = body[end + 1..].trim_start_matches(',');
    }
    if rows.is_empty() {
        return Err(FormulaError::Parse(format!("invalid table '{text}': no rows")));
    }
    Ok(rows)
}

/// Parse a boolean flag value.
pub fn parse_flag(text: &str) -> Result<bool, FormulaError> {
    match text.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "ja" | "y" => Ok(true),
        "false" | "0" | "no" | "nein" | "n" => Ok(false),
        other => Err(FormulaError::Parse(format!("invalid flag value '{other}'"))),
    }
}

/// Split `key=value`.
pub fn parse_assignment(arg: &str) -> Result<(String, String), FormulaError> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(FormulaError::Parse(format!(
            "invalid argument '{arg}': expected key=value"
        ))),
    }
}

/// A looked-up numeric argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Entry {
    /// Key not given.
    Missing,
    /// Key given with an unknown marker.
    Unknown,
    Value(f64),
}

impl Entry {
    pub fn value(self) -> Option<f64> {
        match self {
            Entry::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Whether the key appeared on the command line at all.
    pub fn is_given(self) -> bool {
        !matches!(self, Entry::Missing)
    }
}

/// Parsed `key=value` arguments, consumed key by key.
///
/// Each `take_*` call removes the matching entries; [`Assignments::finish`]
/// rejects whatever is left so misspelled keys do not pass silently.
#[derive(Debug, Clone, Default)]
pub struct Assignments {
    entries: Vec<(String, String)>,
}

impl Assignments {
    pub fn parse<I, S>(args: I) -> Result<Self, FormulaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = args
            .into_iter()
            .map(|a| parse_assignment(a.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Remove and return the raw value of the last entry whose key matches
    /// any alias, ignoring case.
    pub fn take(&mut self, aliases: &[&str]) -> Option<String> {
        self.take_where(|key| {
            let key = key.to_lowercase();
            aliases.iter().any(|a| a.to_lowercase() == key)
        })
    }

    /// Like [`Assignments::take`] but case-sensitive, for keys such as
    /// `N` (population) versus `n` (sample).
    pub fn take_exact(&mut self, aliases: &[&str]) -> Option<String> {
        self.take_where(|key| aliases.contains(&key))
    }

    /// Take a numeric entry.
    pub fn number(&mut self, aliases: &[&str]) -> Result<Entry, FormulaError> {
        let raw = self.take(aliases);
        to_entry(aliases, raw)
    }

    /// Case-sensitive [`Assignments::number`].
    pub fn number_exact(&mut self, aliases: &[&str]) -> Result<Entry, FormulaError> {
        let raw = self.take_exact(aliases);
        to_entry(aliases, raw)
    }

    /// Take a list entry.
    pub fn list(&mut self, aliases: &[&str]) -> Result<Option<Vec<f64>>, FormulaError> {
        self.take(aliases).map(|raw| parse_list(&raw)).transpose()
    }

    /// Take a table entry.
    pub fn table(&mut self, aliases: &[&str]) -> Result<Option<Vec<Vec<f64>>>, FormulaError> {
        self.take(aliases).map(|raw| parse_table(&raw)).transpose()
    }

    /// Take a boolean entry.
    pub fn flag(&mut self, aliases: &[&str]) -> Result<Option<bool>, FormulaError> {
        self.take(aliases).map(|raw| parse_flag(&raw)).transpose()
    }

    /// Bind every variable of `formulas` found among the arguments, by
    /// canonical name or alias. Variables shared between formulas are
    /// bound once.
    pub fn bind_formulas(
        &mut self,
        formulas: &[&Formula],
        bindings: &mut Bindings,
    ) -> Result<(), FormulaError> {
        for formula in formulas {
            for var in &formula.variables {
                if bindings.mentions(var.name) {
                    continue;
                }
                let mut keys = vec![var.name];
                keys.extend_from_slice(var.aliases);
                match self.number(&keys)? {
                    Entry::Missing => {}
                    Entry::Unknown => bindings.unknown(var.name),
                    Entry::Value(v) => bindings.bind(var.name, v),
                }
            }
        }
        debug!(bound = bindings.len(), "bound arguments");
        Ok(())
    }

    /// Fail on any entry nobody consumed.
    pub fn finish(self) -> Result<(), FormulaError> {
        match self.entries.into_iter().next() {
            Some((key, _)) => Err(FormulaError::UnknownKey(key)),
            None => Ok(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn take_where(&mut self, matches: impl Fn(&str) -> bool) -> Option<String> {
        let mut found = None;
        self.entries.retain(|(key, value)| {
            if matches(key) {
                found = Some(value.clone());
                false
            } else {
                true
            }
        });
        found
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn to_entry(aliases: &[&str], raw: Option<String>) -> Result<Entry, FormulaError> {
    let Some(raw) = raw else {
        return Ok(Entry::Missing);
    };
    let key = aliases.first().copied().unwrap_or("value");
    match parse_value(&raw) {
        Ok(Some(v)) => Ok(Entry::Value(v)),
        Ok(None) => Ok(Entry::Unknown),
        Err(FormulaError::Parse(msg)) => Err(FormulaError::Parse(format!("{key}={raw}: {msg}"))),
        Err(e) => Err(e),
    }
}

fn parse_number(text: &str) -> Result<f64, FormulaError> {
    let text = text.trim();
    let value: f64 = text
        .parse()
        .map_err(|_| FormulaError::Parse(format!("invalid number '{text}'")))?;
    if !value.is_finite() {
        return Err(FormulaError::Parse(format!("invalid number '{text}'")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FormulaRegistry;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_value_forms() {
        assert_eq!(parse_value("1.5").unwrap(), Some(1.5));
        assert_eq!(parse_value(" 3/4 ").unwrap(), Some(0.75));
        assert_eq!(parse_value("-2").unwrap(), Some(-2.0));
        assert_eq!(parse_value("-").unwrap(), None);
        assert_eq!(parse_value("None").unwrap(), None);
        assert_eq!(parse_value("?").unwrap(), None);
        assert_eq!(parse_value("").unwrap(), None);
    }

    #[test]
    fn parse_value_errors() {
        assert!(matches!(parse_value("abc"), Err(FormulaError::Parse(_))));
        assert!(matches!(parse_value("1/0"), Err(FormulaError::Parse(_))));
        assert!(matches!(parse_value("1/2/3"), Err(FormulaError::Parse(_))));
        assert!(matches!(parse_value("inf"), Err(FormulaError::Parse(_))));
    }

    #[test]
    fn parse_list_and_table() {
        assert_eq!(parse_list("1,2, 3").unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(parse_list("[1/2;4]").unwrap(), vec![0.5, 4.0]);
        assert!(parse_list("1,-,3").is_err());
        assert_eq!(
            parse_table("[[10, 20], [30, 40]]").unwrap(),
            vec![vec![10.0, 20.0], vec![30.0, 40.0]]
        );
        assert!(parse_table("10,20").is_err());
        assert!(parse_table("[[1,2],[3,4]").is_err());
    }

    #[test]
    fn parse_flags() {
        assert!(parse_flag("ja").unwrap());
        assert!(!parse_flag("False").unwrap());
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn assignment_requires_equals() {
        assert_eq!(parse_assignment("k=3").unwrap(), ("k".into(), "3".into()));
        assert!(parse_assignment("k").is_err());
        assert!(parse_assignment("=3").is_err());
    }

    #[test]
    fn take_is_case_insensitive_and_exact_is_not() {
        let mut a = Assignments::parse(["N=20", "n=5", "M=12"]).unwrap();
        assert_eq!(a.number_exact(&["N"]).unwrap(), Entry::Value(20.0));
        assert_eq!(a.number_exact(&["n"]).unwrap(), Entry::Value(5.0));
        assert_eq!(a.number(&["m"]).unwrap(), Entry::Value(12.0));
        assert!(a.finish().is_ok());
    }

    #[test]
    fn leftover_keys_are_rejected() {
        let mut a = Assignments::parse(["k=3", "bogus=1"]).unwrap();
        a.number(&["k"]).unwrap();
        assert_eq!(a.finish().unwrap_err(), FormulaError::UnknownKey("bogus".into()));
    }

    #[test]
    fn bind_formulas_uses_aliases_once() {
        let reg = FormulaRegistry::builtin();
        let system = reg.system(&["variance", "z-score"]).unwrap();
        let mut a = Assignments::parse(["std=15", "mean=100", "x=-", "z=2"]).unwrap();
        let mut b = Bindings::new();
        a.bind_formulas(&system, &mut b).unwrap();
        a.finish().unwrap();
        assert_eq!(b.get("sigma"), Some(15.0));
        assert_eq!(b.get("mu"), Some(100.0));
        assert!(b.mentions("x") && !b.is_bound("x"));
        assert_eq!(b.get("z"), Some(2.0));
    }

    #[test]
    fn parse_error_names_the_key() {
        let mut a = Assignments::parse(["p=abc"]).unwrap();
        let err = a.number(&["p"]).unwrap_err();
        assert_eq!(err, FormulaError::Parse("p=abc: invalid number 'abc'".into()));
    }
}
