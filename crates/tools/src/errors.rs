use std::fmt::Display;

#[derive(Debug, PartialEq)]
pub struct CodeErr(String);

impl Display for CodeErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Splits a source text into owned lines for later context rendering.
pub fn source_lines(source: &str) -> Vec<String> {
    source.lines().map(str::to_owned).collect()
}

// Every layer error (lexer, parser, interpreter) goes through here to get
// the final error shown to the user: the faulty line number plus a small
// snippet of the code with a caret underline.
pub trait ReportCodeErr {
    fn to_glob_err(&self, lines: &[String], line: u64) -> CodeErr
    where
        Self: Display,
    {
        let snippet = context_snippet(lines, line);

        if snippet.is_empty() {
            CodeErr(format!("Line {}: {}", line, self))
        } else {
            CodeErr(format!("Line {}: {}\n{}", line, self, snippet))
        }
    }
}

// Lines are 1 based. We show the neighbour lines when they exist and
// underline the whole faulty one.
fn context_snippet(lines: &[String], line: u64) -> String {
    if line == 0 || line as usize > lines.len() {
        return String::new();
    }

    let idx = line as usize - 1;
    let width = format!("{}", line + 1).len();
    let mut out = String::new();

    if idx > 0 {
        out.push_str(&format!("  {:>width$} | {}\n", line - 1, lines[idx - 1]));
    }

    out.push_str(&format!("  {:>width$} | {}\n", line, lines[idx]));
    out.push_str(&format!(
        "  {:>width$} | {}\n",
        "",
        "^".repeat(lines[idx].len().max(1))
    ));

    if idx + 1 < lines.len() {
        out.push_str(&format!("  {:>width$} | {}", line + 1, lines[idx + 1]));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    enum DummyErr {
        #[error("something went wrong")]
        Oops,
    }

    impl ReportCodeErr for DummyErr {}

    #[test]
    fn glob_err_carries_line_and_snippet() {
        let lines = source_lines("DECLARE x : INTEGER\nx <- 5\nOUTPUT x");
        let err = DummyErr::Oops.to_glob_err(&lines, 2);
        let text = format!("{}", err);

        assert!(text.starts_with("Line 2: something went wrong"));
        assert!(text.contains("1 | DECLARE x : INTEGER"));
        assert!(text.contains("2 | x <- 5"));
        assert!(text.contains("^^^^^^"));
        assert!(text.contains("3 | OUTPUT x"));
    }

    #[test]
    fn out_of_range_line_still_renders() {
        let lines = source_lines("OUTPUT 1");
        let err = DummyErr::Oops.to_glob_err(&lines, 40);
        assert_eq!(format!("{}", err), "Line 40: something went wrong");
    }
}
