use crate::parse::FieldValue;
use crate::Schedule;
use core::fmt::{self, Display, Formatter};

/// The width labels are padded to in a report
pub const COLUMN_WIDTH: usize = 14;

/// A formatter for displaying a schedule as one labeled line per field.
///
/// Each line is the field label padded to the column width followed by the field's expansion.
/// Lines are separated by `\n` with no trailing newline.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    schedule: &'a Schedule,
}

impl<'a> Report<'a> {
    pub(crate) fn new(schedule: &'a Schedule) -> Self {
        Self { schedule }
    }
}

impl<'a> Display for Report<'a> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for (i, value) in self.schedule.fields().iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            row(value).fmt(f)?;
        }
        Ok(())
    }
}

// labels longer than the column are written in full
fn row(value: &FieldValue) -> impl Display + '_ {
    display(move |f| {
        write!(
            f,
            "{:<width$}{}",
            value.label(),
            value.expanded(),
            width = COLUMN_WIDTH
        )
    })
}

struct Displayer<F>(pub F);
impl<F> Display for Displayer<F>
where
    F: Fn(&mut Formatter) -> fmt::Result,
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.0(f)
    }
}

fn display<F>(f: F) -> Displayer<F>
where
    F: Fn(&mut Formatter) -> fmt::Result,
{
    Displayer(f)
}
