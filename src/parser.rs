/*!
DIMACS CNF reader.
*/

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::formula::{Clause, Cnf, Literal, Variable, VariableParseError};
use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Failed to open CNF file '{}'", path.display()))]
    OpenFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("I/O error occurred while reading CNF input"))]
    ReadInput { source: std::io::Error },
    #[snafu(display("Failed to parse line '{}' as clause", line))]
    MalformedClause { line: String },
    #[snafu(display("Invalid variable found in clause '{}'", line))]
    MalformedVariable {
        line: String,
        source: VariableParseError,
    },
    #[snafu(display("Variable {} exceeds the declared count of {}", variable, declared))]
    VariableOutOfRange { variable: Variable, declared: usize },
    #[snafu(display("Problem line 'p cnf <num_variables> <num_clauses>' is not found"))]
    MissingProblemDefinition,
    #[snafu(display("Malformed problem line '{}'", line))]
    MalformedProblemDefinition { line: String },
    #[snafu(display(
        "The number of clauses ({}) does not match the clauses number in the problem definition ({})",
        found,
        expected,
    ))]
    ClauseCountMismatch { expected: usize, found: usize },
}

fn parse_problem_line(line: &str) -> Result<(usize, usize), Error> {
    let fields = line.split_whitespace().collect::<Vec<_>>();

    // We only support CNF DIMACS format
    ensure!(
        fields.len() == 4 && fields[0] == "p" && fields[1] == "cnf",
        MalformedProblemDefinition {
            line: line.to_owned(),
        }
    );

    match (fields[2].parse::<usize>(), fields[3].parse::<usize>()) {
        (Ok(num_variables), Ok(num_clauses)) => Ok((num_variables, num_clauses)),
        _ => MalformedProblemDefinition {
            line: line.to_owned(),
        }
        .fail(),
    }
}

/// Parse a line to a clause
fn parse_clause_line(line: &str, num_variables: usize) -> Result<Clause, Error> {
    let fields = line.split_whitespace().collect::<Vec<_>>();

    ensure!(
        fields.last() == Some(&"0"),
        MalformedClause {
            line: line.to_owned(),
        }
    );

    let mut literals = Vec::with_capacity(fields.len() - 1);
    for s in &fields[..fields.len() - 1] {
        let literal = s.parse::<Literal>().with_context(|| MalformedVariable {
            line: line.to_owned(),
        })?;
        ensure!(
            literal.index() < num_variables,
            VariableOutOfRange {
                variable: literal.variable(),
                declared: num_variables,
            }
        );
        literals.push(literal);
    }

    Ok(Clause::new(literals))
}

/// Parses a CNF formula from DIMACS text.
///
/// Comment (`c`) and blank lines are skipped. The `p cnf` problem line is
/// required and its clause count is checked against the clauses actually
/// read, counting ingested empty and tautological clauses the formula
/// does not store.
pub fn parse_reader(reader: impl BufRead) -> Result<Cnf, Error> {
    let mut lines = reader.lines();

    let (num_variables, num_clauses) = loop {
        let line = match lines.next() {
            Some(line) => line.context(ReadInput)?,
            None => return MissingProblemDefinition.fail(),
        };
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('c') {
            // empty line, comment
            continue;
        }

        ensure!(trimmed.starts_with('p'), MissingProblemDefinition);
        break parse_problem_line(trimmed)?;
    };

    let mut cnf = Cnf::new(num_variables);

    for line in lines {
        let line = line.context(ReadInput)?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('c') {
            continue;
        }
        cnf.add_clause(parse_clause_line(trimmed, num_variables)?);
    }

    let found = cnf.clauses().len() + cnf.empty_clause_count() + cnf.tautology_count();
    ensure!(
        found == num_clauses,
        ClauseCountMismatch {
            expected: num_clauses,
            found,
        }
    );

    Ok(cnf)
}

/// Parses a CNF formula from a file
pub fn parse_file(path: impl AsRef<Path>) -> Result<Cnf, Error> {
    let path = path.as_ref();
    let file = File::open(path).context(OpenFile {
        path: path.to_owned(),
    })?;
    parse_reader(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str) -> Result<Cnf, Error> {
        parse_reader(Cursor::new(text))
    }

    #[test]
    fn parses_comments_header_and_clauses() {
        let cnf = parse("c a comment\n\np cnf 3 2\n1 -2 0\nc mid comment\n2 3 0\n").unwrap();
        assert_eq!(cnf.num_variables(), 3);
        assert_eq!(cnf.clauses().len(), 2);
    }

    #[test]
    fn counts_empty_and_tautological_clauses() {
        let cnf = parse("p cnf 2 3\n0\n1 -1 0\n1 2 0\n").unwrap();
        assert_eq!(cnf.clauses().len(), 1);
        assert_eq!(cnf.empty_clause_count(), 1);
        assert_eq!(cnf.tautology_count(), 1);
    }

    #[test]
    fn missing_problem_line() {
        assert!(matches!(
            parse("c only comments\n"),
            Err(Error::MissingProblemDefinition)
        ));
    }

    #[test]
    fn malformed_problem_line() {
        assert!(matches!(
            parse("p cnf three 2\n"),
            Err(Error::MalformedProblemDefinition { .. })
        ));
        assert!(matches!(
            parse("p dnf 3 2\n"),
            Err(Error::MalformedProblemDefinition { .. })
        ));
    }

    #[test]
    fn clause_without_terminator() {
        assert!(matches!(
            parse("p cnf 2 1\n1 2\n"),
            Err(Error::MalformedClause { .. })
        ));
    }

    #[test]
    fn variable_beyond_declared_count() {
        assert!(matches!(
            parse("p cnf 2 1\n1 3 0\n"),
            Err(Error::VariableOutOfRange { declared: 2, .. })
        ));
    }

    #[test]
    fn clause_count_mismatch() {
        assert!(matches!(
            parse("p cnf 2 2\n1 2 0\n"),
            Err(Error::ClauseCountMismatch {
                expected: 2,
                found: 1,
            })
        ));
    }
}
