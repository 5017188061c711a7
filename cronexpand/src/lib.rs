//! A cron expression expander. Parses a five field cron expression followed by a command and
//! lists the concrete values every field matches.
//!
//! ```
//! use cronexpand::Schedule;
//!
//! let schedule: Schedule = "*/15 0 1,15 * 1-5 /usr/bin/find".parse().expect("Valid expression");
//!
//! assert_eq!(schedule.minutes().expanded().to_string(), "0 15 30 45");
//! assert_eq!(schedule.command(), "/usr/bin/find");
//! ```

pub mod parse;
mod report;

use core::fmt::{self, Display, Formatter};
use core::str::FromStr;

use thiserror::Error;
use tracing::debug;

pub use self::parse::{Expanded, Field, FieldValue, InvalidFieldError, Names};
pub use self::report::{Report, COLUMN_WIDTH};

/// The number of space separated tokens in an expression: five time fields and a command
pub const FIELD_COUNT: usize = 6;

/// An example expression included in usage errors
pub const USAGE_EXAMPLE: &str = "e.g. \"*/15 0 1,15 * 1-5 /usr/bin/find\"";

/// The fields of an expression, in the order they're written
pub static FIELDS: [Field; FIELD_COUNT] = [
    Field::bounded("minute", 0, 59, None),
    Field::bounded("hour", 0, 23, None),
    Field::bounded("day of month", 1, 31, None),
    Field::bounded("month", 1, 12, Some(Names::Months)),
    Field::bounded("day of week", 0, 6, Some(Names::Weekdays)),
    Field::passthrough("command"),
];

/// An error returned if an expression can't be turned into a [`Schedule`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ScheduleError {
    /// No expression was given at all
    #[error("Failed, please provide a cron argument {example}", example = USAGE_EXAMPLE)]
    MissingArgument,
    /// The expression didn't split into exactly [`FIELD_COUNT`] tokens
    #[error("Failed, please provide {expected} cron arguments {example}", example = USAGE_EXAMPLE)]
    WrongArgumentCount {
        /// The required number of tokens
        expected: usize,
        /// The number of tokens found
        found: usize,
    },
    /// A field token failed to parse
    #[error(transparent)]
    InvalidField(#[from] InvalidFieldError),
}

/// A fully expanded cron expression.
///
/// A schedule only exists if every field in the expression is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    // always FIELD_COUNT values, in FIELDS order
    fields: Vec<FieldValue>,
}

impl Schedule {
    /// Parses an expression, splitting it on single spaces.
    ///
    /// Repeated spaces are not collapsed, so `"0  0 * * * cmd"` has an empty second token and
    /// seven tokens in total. The first invalid field stops the parse.
    pub fn parse(expression: &str) -> Result<Self, ScheduleError> {
        let tokens = expression.split(' ').collect::<Vec<_>>();
        if tokens.len() != FIELD_COUNT {
            debug!(found = tokens.len(), "wrong number of tokens");
            return Err(ScheduleError::WrongArgumentCount {
                expected: FIELD_COUNT,
                found: tokens.len(),
            });
        }

        let fields = FIELDS
            .iter()
            .zip(tokens)
            .map(|(field, token)| field.expand(token))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { fields })
    }

    /// Every field value, in the order they were written
    #[inline]
    pub fn fields(&self) -> &[FieldValue] {
        &self.fields
    }

    /// The minute field, 0-59
    #[inline]
    pub fn minutes(&self) -> &FieldValue {
        &self.fields[0]
    }

    /// The hour field, 0-23
    #[inline]
    pub fn hours(&self) -> &FieldValue {
        &self.fields[1]
    }

    /// The day of the month field, 1-31
    #[inline]
    pub fn days_of_month(&self) -> &FieldValue {
        &self.fields[2]
    }

    /// The month field, 1-12
    #[inline]
    pub fn months(&self) -> &FieldValue {
        &self.fields[3]
    }

    /// The day of the week field, 0-6 (Sun-Sat)
    #[inline]
    pub fn days_of_week(&self) -> &FieldValue {
        &self.fields[4]
    }

    /// The command, exactly as written
    #[inline]
    pub fn command(&self) -> &str {
        self.fields[5].raw()
    }

    /// Returns a formatter that lays the schedule out as one labeled line per field
    pub fn report(&self) -> Report<'_> {
        Report::new(self)
    }
}

impl FromStr for Schedule {
    type Err = ScheduleError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for Schedule {
    #[inline]
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.report().fmt(f)
    }
}
