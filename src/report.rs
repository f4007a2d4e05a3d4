/*!
Rendering of CLI failures.

`main` returns `Result<(), Report>`, and the `Debug` impl the runtime
prints on error is repurposed to render every link in the source chain.
A parse failure then names the offending clause line instead of only the
outermost "Failed to parse CNF".
*/

use std::error::Error as StdError;
use std::fmt;

/// Boxed error that prints its whole source chain.
pub struct Report {
    error: Box<dyn StdError>,
}

impl Report {
    /// The causes below the outermost error, outermost first.
    fn causes(&self) -> Vec<&(dyn StdError + '_)> {
        let mut causes = Vec::new();
        let mut current = self.error.source();
        while let Some(error) = current {
            causes.push(error);
            current = error.source();
        }
        causes
    }
}

impl fmt::Debug for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        for (depth, cause) in self.causes().into_iter().enumerate() {
            if depth == 0 {
                write!(f, "\n\nCaused by:")?;
            }
            write!(f, "\n  {}: {}", depth, cause)?;
        }

        Ok(())
    }
}

impl<E: Into<Box<dyn StdError>>> From<E> for Report {
    fn from(error: E) -> Self {
        Report {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[derive(Debug, Snafu)]
    enum TestError {
        #[snafu(display("outer failure"))]
        Outer { source: std::num::ParseIntError },
    }

    #[test]
    fn debug_output_includes_the_source_chain() {
        let error: Result<i32, TestError> = "nan".parse::<i32>().context(Outer);
        let report = Report::from(error.unwrap_err());

        let rendered = format!("{:?}", report);
        assert!(rendered.starts_with("outer failure"));
        assert!(rendered.contains("Caused by:"));
        assert!(rendered.contains("0: invalid digit"));
    }

    #[test]
    fn debug_output_without_a_source_is_a_single_line() {
        let report = Report::from("flat message");
        assert_eq!(format!("{:?}", report), "flat message");
    }
}
