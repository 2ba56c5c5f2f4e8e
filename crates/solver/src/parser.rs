use std::collections::BTreeMap;
use std::io::BufRead;

use microflow_smtlib::Symbol;

use crate::error::SolverError;
use crate::result::{Interval, IntervalResult};

/// Parse a dReal response into an `IntervalResult`.
///
/// Expected output format:
/// - `unsat`: unsatisfiable, nothing else is read
/// - `Solution:` followed by one interval line per variable, terminated by a
///   line exactly `sat`:
///
/// ```text
/// Solution:
/// ch0.width : [ ENFORCED ] = [0.0001, 0.00010001]
/// sat
/// ```
///
/// Any other first line is returned as `SolverReported`.
pub fn parse_response<R: BufRead>(reader: R) -> Result<IntervalResult, SolverError> {
    let mut lines = reader.lines();
    let mut next_line = move || -> Result<Option<String>, SolverError> {
        match lines.next() {
            None => Ok(None),
            Some(Ok(line)) => {
                tracing::trace!(line = %line, "solver output");
                Ok(Some(clean(&line).to_string()))
            }
            Some(Err(e)) => Err(SolverError::ProcessError(format!(
                "Failed to read solver output: {e}"
            ))),
        }
    };

    let Some(first) = next_line()? else {
        return Err(SolverError::ParseError(
            "end of output before result header".to_string(),
        ));
    };

    match first.as_str() {
        "unsat" => Ok(IntervalResult::unsatisfiable()),
        "Solution:" => {
            let mut intervals = BTreeMap::new();
            loop {
                let Some(line) = next_line()? else {
                    return Err(SolverError::ParseError(
                        "end of output before `sat`".to_string(),
                    ));
                };
                if line == "sat" {
                    break;
                }
                let (symbol, interval) = parse_interval_line(&line)?;
                intervals.insert(symbol, interval);
            }
            Ok(IntervalResult::satisfiable(intervals))
        }
        _ => Err(SolverError::SolverReported(first)),
    }
}

/// Parse `<symbol> : [ ... ] = [ <lower>, <upper> ]`.
pub fn parse_interval_line(line: &str) -> Result<(Symbol, Interval), SolverError> {
    let fail = || SolverError::ParseError(line.to_string());
    let line = clean(line);

    // ':' never occurs in a symbol, so the first one ends the name.
    let (name, rest) = line.split_once(':').ok_or_else(fail)?;
    let symbol = Symbol::new(name.trim()).map_err(|_| fail())?;

    let (annotation, bounds) = rest.rsplit_once('=').ok_or_else(fail)?;
    let annotation = annotation.trim();
    if !(annotation.starts_with('[') && annotation.ends_with(']')) {
        return Err(fail());
    }

    let bounds = bounds
        .trim()
        .strip_prefix('[')
        .and_then(|b| b.strip_suffix(']'))
        .ok_or_else(fail)?;
    let (lower, upper) = bounds.split_once(',').ok_or_else(fail)?;
    let lower = parse_bound(lower).ok_or_else(fail)?;
    let upper = parse_bound(upper).ok_or_else(fail)?;

    let interval = Interval::new(lower, upper).ok_or_else(fail)?;
    Ok((symbol, interval))
}

fn parse_bound(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Trim the carriage return and surrounding spaces.
fn clean(line: &str) -> &str {
    line.trim_end_matches('\r').trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<IntervalResult, SolverError> {
        parse_response(text.as_bytes())
    }

    #[test]
    fn parse_unsat() {
        let result = parse("unsat\n").unwrap();
        assert!(!result.is_satisfiable());
        assert!(result.is_empty());
    }

    #[test]
    fn parse_solution_block() {
        let result = parse("Solution:\nx : [*] = [1.0, 2.0]\nsat\n").unwrap();
        assert!(result.is_satisfiable());
        let iv = result.get("x").unwrap();
        assert_eq!((iv.lower(), iv.upper()), (1.0, 2.0));
    }

    #[test]
    fn parse_multiple_intervals_with_crlf() {
        let text = "Solution:\r\n  ch0.width : [ ENFORCED ] = [ 1e-4, 1.5e-4 ]\r\nn1.in.pressure : [ ] = [-2, -1]\r\nsat\r\n";
        let result = parse(text).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.get("ch0.width").unwrap().upper(), 1.5e-4);
        assert_eq!(result.get("n1.in.pressure").unwrap().lower(), -2.0);
    }

    #[test]
    fn parse_empty_solution() {
        let result = parse("Solution:\nsat\n").unwrap();
        assert!(result.is_satisfiable());
        assert!(result.is_empty());
    }

    #[test]
    fn parse_infinite_bounds() {
        let result = parse("Solution:\nx : [*] = [-inf, inf]\nsat\n").unwrap();
        let iv = result.get("x").unwrap();
        assert!(iv.lower().is_infinite() && iv.upper().is_infinite());
    }

    #[test]
    fn unexpected_first_line_is_reported() {
        assert_eq!(
            parse("Error: unknown symbol foo\n"),
            Err(SolverError::SolverReported(
                "Error: unknown symbol foo".to_string()
            ))
        );
        assert_eq!(
            parse("delta-sat with delta = 0.001\n"),
            Err(SolverError::SolverReported(
                "delta-sat with delta = 0.001".to_string()
            ))
        );
    }

    #[test]
    fn malformed_interval_line() {
        assert_eq!(
            parse("Solution:\nx = 1.0\nsat\n"),
            Err(SolverError::ParseError("x = 1.0".to_string()))
        );
    }

    #[test]
    fn missing_terminator_is_parse_error() {
        assert!(matches!(
            parse("Solution:\nx : [*] = [1.0, 2.0]\n"),
            Err(SolverError::ParseError(_))
        ));
        assert!(matches!(parse(""), Err(SolverError::ParseError(_))));
    }

    #[test]
    fn interval_line_rejections() {
        for line in [
            "x : [*] = [2.0, 1.0]",
            "x : [*] = [NaN, 1.0]",
            "x : [*] = [1.0 2.0]",
            "x : [*] = 1.0, 2.0",
            "x : * = [1.0, 2.0]",
            "1x : [*] = [1.0, 2.0]",
            " : [*] = [1.0, 2.0]",
            "x : [*] = [one, 2.0]",
        ] {
            assert_eq!(
                parse_interval_line(line),
                Err(SolverError::ParseError(line.to_string())),
                "{line:?} should be rejected"
            );
        }
    }

    #[test]
    fn interval_line_symbol() {
        let (symbol, interval) = parse_interval_line("j.v_output : [*] = [3, 4]").unwrap();
        assert_eq!(symbol.as_str(), "j.v_output");
        assert_eq!(interval.midpoint(), 3.5);
    }
}
