//! A module for validating and expanding a single cron field. Every accepted token is reduced
//! to the concrete values it denotes, or to its list items when it is a comma list.

use core::fmt::{self, Display, Formatter};
use core::iter::StepBy;
use core::num::NonZeroU32;
use core::ops::RangeInclusive;
use core::str::FromStr;
use std::borrow::Cow;

use nom::{
    branch::alt,
    bytes::complete::is_not,
    character::complete::{char, digit1},
    combinator::{all_consuming, map, map_opt, map_res, opt},
    multi::many1,
    sequence::{preceded, tuple},
    IResult,
};
use once_cell::sync::Lazy;
use thiserror::Error;
use tracing::{debug, trace};

static MONTHS: Lazy<Vec<(String, u32)>> = Lazy::new(|| {
    let mut month = chrono::Month::January;
    let mut entries = Vec::with_capacity(12);
    for _ in 0..12 {
        entries.push((abbreviate(month.name()), month.number_from_month()));
        month = month.succ();
    }
    entries
});

static WEEKDAYS: Lazy<Vec<(String, u32)>> = Lazy::new(|| {
    let mut weekday = chrono::Weekday::Sun;
    let mut entries = Vec::with_capacity(7);
    for _ in 0..7 {
        entries.push((abbreviate(&weekday.to_string()), weekday.num_days_from_sunday()));
        weekday = weekday.succ();
    }
    entries
});

fn abbreviate(name: &str) -> String {
    name.chars().take(3).collect::<String>().to_lowercase()
}

/// A table of symbolic names a field accepts in place of numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Names {
    /// `jan` through `dec`, 1-12
    Months,
    /// `sun` through `sat`, 0-6
    Weekdays,
}

impl Names {
    /// Returns every lowercase abbreviation paired with its value, in calendar order
    pub fn entries(self) -> &'static [(String, u32)] {
        match self {
            Names::Months => MONTHS.as_slice(),
            Names::Weekdays => WEEKDAYS.as_slice(),
        }
    }

    /// Looks up a lowercase abbreviation
    pub fn lookup(self, name: &str) -> Option<u32> {
        self.entries()
            .iter()
            .find(|(key, _)| key == name)
            .map(|&(_, value)| value)
    }
}

/// Replaces symbolic names in a token with their numeric values.
///
/// Nothing happens unless the token starts with a letter. The token is then lowercased and every
/// run of letters that is exactly a name in the table is replaced. Runs that aren't names are
/// kept, so `sunmon` stays as it is and fails to parse later instead of turning into `01`.
pub fn substitute(raw: &str, names: Names) -> Cow<'_, str> {
    if !raw.chars().next().map_or(false, char::is_alphabetic) {
        return Cow::Borrowed(raw);
    }

    let lowered = raw.to_lowercase();
    let mut substituted = String::with_capacity(lowered.len());
    let mut rest = lowered.as_str();
    while let Some(c) = rest.chars().next() {
        let len = if c.is_alphabetic() {
            rest.find(|c: char| !c.is_alphabetic())
                .unwrap_or(rest.len())
        } else {
            c.len_utf8()
        };
        let (head, tail) = rest.split_at(len);
        match names.lookup(head) {
            Some(value) => substituted.push_str(&value.to_string()),
            None => substituted.push_str(head),
        }
        rest = tail;
    }

    trace!(raw, %substituted, "substituted symbolic names");
    Cow::Owned(substituted)
}

/// The inclusive bounds of a field and the names it accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    /// The first value of the field
    pub lower: u32,
    /// The last value of the field
    pub upper: u32,
    /// Symbolic names substituted before parsing, if any
    pub names: Option<Names>,
}

/// The configuration of one positional field in a cron expression.
///
/// A field with [`Bounds`] validates and expands its token. A field without them (the command)
/// keeps its token verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    label: &'static str,
    bounds: Option<Bounds>,
}

impl Field {
    /// Creates a field that validates and expands its token
    pub const fn bounded(
        label: &'static str,
        lower: u32,
        upper: u32,
        names: Option<Names>,
    ) -> Self {
        Self {
            label,
            bounds: Some(Bounds {
                lower,
                upper,
                names,
            }),
        }
    }

    /// Creates a field that keeps its token as written
    pub const fn passthrough(label: &'static str) -> Self {
        Self {
            label,
            bounds: None,
        }
    }

    /// The label printed in front of the field's expansion
    #[inline]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// The bounds of the field, or `None` for a passthrough field
    #[inline]
    pub fn bounds(&self) -> Option<&Bounds> {
        self.bounds.as_ref()
    }

    /// Validates a raw token against this field and expands it.
    ///
    /// # Example
    /// ```
    /// use cronexpand::parse::{Field, Names};
    ///
    /// let dow = Field::bounded("day of week", 0, 6, Some(Names::Weekdays));
    /// let value = dow.expand("MON-FRI").expect("Valid field");
    ///
    /// assert_eq!("1 2 3 4 5", value.expanded().to_string());
    /// ```
    pub fn expand(&self, raw: &str) -> Result<FieldValue, InvalidFieldError> {
        let expanded = match &self.bounds {
            None => Expanded::Verbatim(vec![raw.to_owned()]),
            Some(bounds) => {
                let token = match bounds.names {
                    Some(names) => substitute(raw, names),
                    None => Cow::Borrowed(raw),
                };
                let expr = token
                    .parse::<FieldExpr>()
                    .map_err(|ExprParseError(())| InvalidFieldError {
                        field_label: self.label,
                        raw_value: raw.to_owned(),
                    })?;
                expr.expand(bounds)
            }
        };

        debug!(field = self.label, raw, %expanded, "expanded field");

        Ok(FieldValue {
            field: *self,
            raw: raw.to_owned(),
            expanded,
        })
    }
}

/// An error returned when a token doesn't match the field grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed, invalid value: {raw_value} for '{field_label}'")]
pub struct InvalidFieldError {
    /// The label of the field the token was given for
    pub field_label: &'static str,
    /// The token as it was written
    pub raw_value: String,
}

/// A token paired with its expansion for a given field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    field: Field,
    raw: String,
    expanded: Expanded,
}

impl FieldValue {
    /// The field this value was expanded for
    #[inline]
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// The label of the field this value was expanded for
    #[inline]
    pub fn label(&self) -> &'static str {
        self.field.label()
    }

    /// The token as it was written
    #[inline]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The expansion of the token
    #[inline]
    pub fn expanded(&self) -> &Expanded {
        &self.expanded
    }
}

/// The values a field token denotes.
///
/// Displays as its values or items separated by single spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expanded {
    /// Every `step`-th value from `start` through `end`. Empty if `start` is after `end`.
    Sequence {
        /// The first value
        start: u32,
        /// The inclusive end of the sequence
        end: u32,
        /// The distance between values
        step: NonZeroU32,
    },
    /// No values, from a `?`
    Blank,
    /// Items kept exactly as they were written
    Verbatim(Vec<String>),
}

/// An iterator over the values of a sequence
pub type Values = StepBy<RangeInclusive<u32>>;

impl Expanded {
    /// Iterates over the values of this expansion, or returns `None` for verbatim items.
    pub fn values(&self) -> Option<Values> {
        match *self {
            Expanded::Sequence { start, end, step } => Some(sequence(start, end, step)),
            // an empty sequence
            Expanded::Blank => Some(sequence(1, 0, NonZeroU32::MIN)),
            Expanded::Verbatim(_) => None,
        }
    }
}

fn sequence(start: u32, end: u32, step: NonZeroU32) -> Values {
    // a u32 always fits in a usize on the targets we build for
    (start..=end).step_by(step.get() as usize)
}

impl Display for Expanded {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Expanded::Verbatim(items) => write_joined(f, items),
            other => match other.values() {
                Some(values) => write_joined(f, values),
                None => Ok(()),
            },
        }
    }
}

fn write_joined<I>(f: &mut Formatter, items: I) -> fmt::Result
where
    I: IntoIterator,
    I::Item: Display,
{
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        item.fmt(f)?;
    }
    Ok(())
}

/// The start of a step expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStart {
    /// A '*' character. The step covers the whole field.
    All,
    /// One value. The step runs from it to the end of the field.
    From(u32),
    /// A '-' range. The step runs from its start through its end.
    Range(u32, u32),
}

/// A parsed field token
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FieldExpr {
    /// A '*' character
    All,
    /// A '?' character
    Blank,
    /// One value
    One(u32),
    /// A '-' character
    Range(u32, u32),
    /// A '/' character
    Step {
        /// Where the step starts
        start: StepStart,
        /// The step value
        step: NonZeroU32,
    },
    /// A ',' character. The items are kept as written and never expanded.
    List(Vec<String>),
}

impl FieldExpr {
    /// Expands the expression inside the given bounds.
    ///
    /// Only '*' and a step's open end read the bounds. Values written in the token are never
    /// checked against them.
    pub fn expand(&self, bounds: &Bounds) -> Expanded {
        const ONE: NonZeroU32 = NonZeroU32::MIN;

        match self {
            FieldExpr::All => Expanded::Sequence {
                start: bounds.lower,
                end: bounds.upper,
                step: ONE,
            },
            FieldExpr::Blank => Expanded::Blank,
            FieldExpr::One(value) => Expanded::Sequence {
                start: *value,
                end: *value,
                step: ONE,
            },
            FieldExpr::Range(start, end) => Expanded::Sequence {
                start: *start,
                end: *end,
                step: ONE,
            },
            FieldExpr::Step { start, step } => {
                let (start, end) = match *start {
                    StepStart::All => (bounds.lower, bounds.upper),
                    StepStart::From(value) => (value, bounds.upper),
                    StepStart::Range(start, end) => (start, end),
                };
                Expanded::Sequence {
                    start,
                    end,
                    step: *step,
                }
            }
            FieldExpr::List(items) => Expanded::Verbatim(items.clone()),
        }
    }
}

/// An error indicating that a field token failed to parse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to parse field expression")]
pub struct ExprParseError(());

#[inline]
fn number(input: &str) -> IResult<&str, u32> {
    // numerals too large for a u32 fail here
    map_res(digit1, |s: &str| s.parse::<u32>())(input)
}

#[inline]
fn step_value(input: &str) -> IResult<&str, NonZeroU32> {
    map_opt(number, NonZeroU32::new)(input)
}

/// A parser for one '*', value, range, or step expression
fn item(input: &str) -> IResult<&str, FieldExpr> {
    let star = opt(char('*'))(input)?;
    if star.1.is_some() {
        let (input, step) = opt(preceded(char('/'), step_value))(star.0)?;
        let expr = match step {
            Some(step) => FieldExpr::Step {
                start: StepStart::All,
                step,
            },
            None => FieldExpr::All,
        };
        return Ok((input, expr));
    }

    let (input, start) = number(input)?;
    let (input, end) = opt(preceded(char('-'), number))(input)?;
    let (input, step) = opt(preceded(char('/'), step_value))(input)?;

    let expr = match (end, step) {
        (None, None) => FieldExpr::One(start),
        (Some(end), None) => FieldExpr::Range(start, end),
        (None, Some(step)) => FieldExpr::Step {
            start: StepStart::From(start),
            step,
        },
        (Some(end), Some(step)) => FieldExpr::Step {
            start: StepStart::Range(start, end),
            step,
        },
    };
    Ok((input, expr))
}

/// A parser for two or more comma separated items. Items are kept as written and only have to
/// be non-empty.
fn list(input: &str) -> IResult<&str, FieldExpr> {
    map(
        tuple((is_not(","), many1(preceded(char(','), is_not(","))))),
        |(first, tail): (&str, Vec<&str>)| {
            FieldExpr::List(
                core::iter::once(first)
                    .chain(tail)
                    .map(String::from)
                    .collect(),
            )
        },
    )(input)
}

fn field_expr(input: &str) -> IResult<&str, FieldExpr> {
    alt((list, map(char('?'), |_| FieldExpr::Blank), item))(input)
}

impl FromStr for FieldExpr {
    type Err = ExprParseError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, expr) = all_consuming(field_expr)(s).map_err(|_| ExprParseError(()))?;

        Ok(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Field = Field::bounded("minute", 0, 59, None);
    const DAY_OF_MONTH: Field = Field::bounded("day of month", 1, 31, None);
    const MONTH: Field = Field::bounded("month", 1, 12, Some(Names::Months));
    const DAY_OF_WEEK: Field = Field::bounded("day of week", 0, 6, Some(Names::Weekdays));

    fn expand(field: Field, raw: &str) -> String {
        field
            .expand(raw)
            .expect("Valid field token")
            .expanded()
            .to_string()
    }

    fn step(value: u32) -> NonZeroU32 {
        NonZeroU32::new(value).unwrap()
    }

    mod grammar {
        use super::*;

        #[test]
        fn all() {
            assert_eq!("*".parse::<FieldExpr>(), Ok(FieldExpr::All))
        }

        #[test]
        fn blank() {
            assert_eq!("?".parse::<FieldExpr>(), Ok(FieldExpr::Blank))
        }

        #[test]
        fn one_value() {
            assert_eq!("15".parse::<FieldExpr>(), Ok(FieldExpr::One(15)))
        }

        #[test]
        fn range() {
            assert_eq!("0-30".parse::<FieldExpr>(), Ok(FieldExpr::Range(0, 30)))
        }

        #[test]
        fn steps() {
            assert_eq!(
                "*/15".parse::<FieldExpr>(),
                Ok(FieldExpr::Step {
                    start: StepStart::All,
                    step: step(15)
                })
            );
            assert_eq!(
                "10/15".parse::<FieldExpr>(),
                Ok(FieldExpr::Step {
                    start: StepStart::From(10),
                    step: step(15)
                })
            );
            assert_eq!(
                "0-30/5".parse::<FieldExpr>(),
                Ok(FieldExpr::Step {
                    start: StepStart::Range(0, 30),
                    step: step(5)
                })
            );
        }

        #[test]
        fn list_keeps_items_as_written() {
            assert_eq!(
                "1-5,7,*/2".parse::<FieldExpr>(),
                Ok(FieldExpr::List(vec![
                    "1-5".to_owned(),
                    "7".to_owned(),
                    "*/2".to_owned()
                ]))
            )
        }

        #[test]
        fn list_items_are_not_validated() {
            assert_eq!(
                "1,?".parse::<FieldExpr>(),
                Ok(FieldExpr::List(vec!["1".to_owned(), "?".to_owned()]))
            );
            assert_eq!(
                "1,60/0".parse::<FieldExpr>(),
                Ok(FieldExpr::List(vec!["1".to_owned(), "60/0".to_owned()]))
            );
            assert_eq!(
                "?,1".parse::<FieldExpr>(),
                Ok(FieldExpr::List(vec!["?".to_owned(), "1".to_owned()]))
            );
        }

        #[test]
        fn rejects_junk() {
            for token in &[
                "", "a", "*a", "1-", "-1", "1--2", "1/", "/5", "*-30", "1,", ",1", "1,,2", ",",
                "??", "1-2-3", "1/2/3", " 1", "1 ", "0x10",
            ] {
                assert!(
                    token.parse::<FieldExpr>().is_err(),
                    "{:?} should not parse",
                    token
                );
            }
        }

        #[test]
        fn zero_step_is_rejected() {
            assert!("*/0".parse::<FieldExpr>().is_err());
            assert!("5/0".parse::<FieldExpr>().is_err());
            assert!("0-30/0".parse::<FieldExpr>().is_err());
        }

        #[test]
        fn overflowing_numbers_are_rejected() {
            assert!("4294967296".parse::<FieldExpr>().is_err());
            assert_eq!("4294967295".parse::<FieldExpr>(), Ok(FieldExpr::One(u32::MAX)));
        }
    }

    mod expansion {
        use super::*;

        #[test]
        fn all_covers_the_bounds() {
            let all = (0..=59).map(|v| v.to_string()).collect::<Vec<_>>().join(" ");
            assert_eq!(expand(MINUTE, "*"), all);
            assert_eq!(expand(DAY_OF_MONTH, "*").split(' ').next(), Some("1"));
            assert_eq!(expand(MONTH, "*"), "1 2 3 4 5 6 7 8 9 10 11 12");
            assert_eq!(expand(DAY_OF_WEEK, "*"), "0 1 2 3 4 5 6");
        }

        #[test]
        fn blank_is_empty() {
            assert_eq!(expand(DAY_OF_MONTH, "?"), "");
            assert_eq!(
                DAY_OF_MONTH.expand("?").unwrap().expanded().values().unwrap().count(),
                0
            );
        }

        #[test]
        fn one_value_is_not_bounds_checked() {
            assert_eq!(expand(MINUTE, "0"), "0");
            assert_eq!(expand(MINUTE, "99"), "99");
            assert_eq!(expand(DAY_OF_MONTH, "0"), "0");
        }

        #[test]
        fn ranges_are_ascending_only() {
            assert_eq!(expand(MINUTE, "3-7"), "3 4 5 6 7");
            assert_eq!(expand(MINUTE, "7-7"), "7");
            assert_eq!(expand(MINUTE, "50-10"), "");
        }

        #[test]
        fn star_step_starts_at_lower_bound() {
            assert_eq!(expand(MINUTE, "*/15"), "0 15 30 45");
            assert_eq!(expand(DAY_OF_MONTH, "*/10"), "1 11 21 31");
        }

        #[test]
        fn value_step_runs_to_upper_bound() {
            assert_eq!(expand(MINUTE, "10/15"), "10 25 40 55");
            assert_eq!(expand(MINUTE, "59/15"), "59");
            assert_eq!(expand(MINUTE, "60/15"), "");
        }

        #[test]
        fn range_step_is_capped_at_range_end() {
            assert_eq!(expand(MINUTE, "0-30/5"), "0 5 10 15 20 25 30");
            assert_eq!(expand(MINUTE, "1-30/7"), "1 8 15 22 29");
            assert_eq!(expand(MINUTE, "30-0/5"), "");
        }

        #[test]
        fn large_step_yields_start_only() {
            assert_eq!(expand(MINUTE, "*/1000"), "0");
        }

        #[test]
        fn unvalidated_list_items_render_verbatim() {
            assert_eq!(expand(MINUTE, "1,?"), "1 ?");
            assert_eq!(expand(MINUTE, "1,60/0"), "1 60/0");
            assert_eq!(expand(DAY_OF_WEEK, "mon,?"), "1 ?");
            assert_eq!(expand(DAY_OF_WEEK, "MON,fri-sat"), "1 5-6");
        }

        #[test]
        fn lists_are_not_expanded() {
            assert_eq!(expand(DAY_OF_MONTH, "1,15"), "1 15");
            assert_eq!(expand(MINUTE, "1-5,7"), "1-5 7");
            assert!(MINUTE.expand("1-5,7").unwrap().expanded().values().is_none());
        }

        #[test]
        fn sequence_values() {
            let value = MINUTE.expand("0-30/10").unwrap();
            assert_eq!(
                value.expanded().values().unwrap().collect::<Vec<_>>(),
                vec![0, 10, 20, 30]
            );
        }
    }

    mod names {
        use super::*;

        #[test]
        fn tables_follow_the_calendar() {
            let months = Names::Months
                .entries()
                .iter()
                .map(|(name, _)| name.as_str())
                .collect::<Vec<_>>();
            assert_eq!(
                months,
                vec![
                    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov",
                    "dec"
                ]
            );
            assert_eq!(Names::Months.lookup("dec"), Some(12));
            assert_eq!(Names::Weekdays.lookup("sun"), Some(0));
            assert_eq!(Names::Weekdays.lookup("sat"), Some(6));
            assert_eq!(Names::Weekdays.lookup("mon"), Some(1));
            assert_eq!(Names::Weekdays.lookup("monday"), None);
        }

        #[test]
        fn case_insensitive() {
            assert_eq!(expand(DAY_OF_WEEK, "MON-FRI"), "1 2 3 4 5");
            assert_eq!(expand(DAY_OF_WEEK, "mon-fri"), "1 2 3 4 5");
            assert_eq!(expand(DAY_OF_WEEK, "Mon-Fri"), "1 2 3 4 5");
            assert_eq!(expand(MONTH, "APR-SEP"), "4 5 6 7 8 9");
            assert_eq!(expand(MONTH, "Feb"), "2");
        }

        #[test]
        fn substituted_steps_and_lists() {
            assert_eq!(expand(MONTH, "jan/3"), "1 4 7 10");
            assert_eq!(expand(DAY_OF_WEEK, "sun,sat"), "0 6");
        }

        #[test]
        fn only_when_first_character_is_a_letter() {
            assert_eq!(substitute("1-fri", Names::Weekdays), "1-fri");
            assert!(DAY_OF_WEEK.expand("1-fri").is_err());
            assert_eq!(substitute("mon-5", Names::Weekdays), "1-5");
        }

        #[test]
        fn only_whole_names_are_replaced() {
            assert_eq!(substitute("sunmon", Names::Weekdays), "sunmon");
            assert!(DAY_OF_WEEK.expand("sunmon").is_err());
            assert!(MONTH.expand("june").is_err());
        }

        #[test]
        fn fields_without_names_reject_words() {
            let err = MINUTE.expand("jan").unwrap_err();
            assert_eq!(err.raw_value, "jan");
        }
    }

    mod fields {
        use super::*;

        #[test]
        fn passthrough_keeps_the_token() {
            let command = Field::passthrough("command");
            let value = command.expand("/usr/bin/find").unwrap();
            assert_eq!(value.expanded().to_string(), "/usr/bin/find");
            assert_eq!(value.raw(), "/usr/bin/find");
            assert_eq!(command.bounds(), None);
            // anything goes, even an empty token
            assert_eq!(command.expand("").unwrap().expanded().to_string(), "");
        }

        #[test]
        fn invalid_field_reports_label_and_raw_value() {
            let err = DAY_OF_WEEK.expand("a").unwrap_err();
            assert_eq!(
                err,
                InvalidFieldError {
                    field_label: "day of week",
                    raw_value: "a".to_owned()
                }
            );
            assert_eq!(err.to_string(), "Failed, invalid value: a for 'day of week'");
        }

        #[test]
        fn error_keeps_the_token_as_written() {
            let err = DAY_OF_WEEK.expand("MON-Funday").unwrap_err();
            assert_eq!(err.raw_value, "MON-Funday");
        }

        #[test]
        fn value_remembers_its_field() {
            let value = MONTH.expand("*").unwrap();
            assert_eq!(value.label(), "month");
            assert_eq!(value.field().bounds().map(|b| (b.lower, b.upper)), Some((1, 12)));
        }
    }
}
