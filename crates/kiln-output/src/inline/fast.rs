//! Text-splice id inlining.
//!
//! A dependency-map reference is the reserved name followed by a bracketed
//! base-10 integer. Tabs and spaces may appear inside the brackets; newlines,
//! parentheses and comments may not. Each reference is replaced by the id
//! padded with trailing spaces to the width of the reference, so every
//! line and column after it stays where it was and the source map is still
//! valid.

use std::path::Path;

use regex::Regex;

use crate::error::{OutputError, Result};

fn reference_pattern(reserved_name: &str) -> std::result::Result<Regex, regex::Error> {
    const WS: &str = "[\t ]*";
    Regex::new(&format!(
        r"{}{WS}\[{WS}([0-9]+){WS}\]",
        regex::escape(reserved_name)
    ))
}

/// Replace every `reserved_name[N]` in `code` with `dependency_ids[N]`.
pub(crate) fn inline_ids(
    path: &Path,
    code: &str,
    reserved_name: &str,
    dependency_ids: &[u32],
) -> Result<String> {
    let pattern =
        reference_pattern(reserved_name).map_err(|err| OutputError::parse(path, err.to_string()))?;

    let mut out = String::with_capacity(code.len());
    let mut last = 0;

    for caps in pattern.captures_iter(code) {
        let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        let out_of_range = |index| OutputError::DependencyIndexOutOfRange {
            path: path.to_path_buf(),
            index,
            len: dependency_ids.len(),
        };
        let index: usize = digits
            .as_str()
            .parse()
            .map_err(|_| out_of_range(usize::MAX))?;
        let id = dependency_ids
            .get(index)
            .ok_or_else(|| out_of_range(index))?
            .to_string();

        let width = whole.len();
        if id.len() > width {
            return Err(OutputError::IdOverflow {
                path: path.to_path_buf(),
                additional: id.len() - width,
            });
        }

        out.push_str(&code[last..whole.start()]);
        out.push_str(&format!("{id:<width$}"));
        last = whole.end();
    }

    out.push_str(&code[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = "/app/a.js";

    #[test]
    fn test_ids_are_padded_to_reference_width() {
        let code = "var a = req(_$$[0]), b = req(_$$[1]), c = req(_$$[2]);";
        let out = inline_ids(Path::new(PATH), code, "_$$", &[3, 27, 104]).unwrap();

        assert_eq!(
            out,
            "var a = req(3     ), b = req(27    ), c = req(104   );"
        );
        assert_eq!(out.len(), code.len());
    }

    #[test]
    fn test_interior_whitespace_is_tolerated() {
        let code = "req(dm[ 1\t]); req(dm [0])";
        let out = inline_ids(Path::new(PATH), code, "dm", &[5, 6]).unwrap();
        assert_eq!(out, "req(6      ); req(5     )");
    }

    #[test]
    fn test_newline_breaks_a_reference() {
        let code = "req(dm[\n0])";
        let out = inline_ids(Path::new(PATH), code, "dm", &[5]).unwrap();
        assert_eq!(out, code);
    }

    #[test]
    fn test_regex_metacharacters_in_name_are_literal() {
        let code = "x.y[0] + xzy[0]";
        let out = inline_ids(Path::new(PATH), code, "x.y", &[9]).unwrap();
        assert_eq!(out, "9      + xzy[0]");
    }

    #[test]
    fn test_overflow_reports_missing_width() {
        let code = "req(d[0])";
        let err = inline_ids(Path::new(PATH), code, "d", &[12345]).unwrap_err();
        match err {
            OutputError::IdOverflow { additional, .. } => assert_eq!(additional, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_index_past_dependency_list() {
        let err = inline_ids(Path::new(PATH), "d[3]", "d", &[1]).unwrap_err();
        assert!(matches!(
            err,
            OutputError::DependencyIndexOutOfRange { index: 3, len: 1, .. }
        ));
    }
}
