// ============================================================
// Layer 4 — Numeric List Parser
// ============================================================
// The per-position feature columns arrive as stringified lists:
//
//   "[0.51, 0.49, 0.47, ...]"
//
// Parsing steps:
//   1. Trim surrounding whitespace
//   2. Strip '[' and ']' from both ends
//   3. Split on ','
//   4. Trim and parse every token as f32
//   5. Check the number of values against the sequence length
//
// "nan" parses like any other float; the dataset builder's NaN
// scan is what reports it.

use crate::domain::error::ParseError;

pub fn parse_numeric_list(literal: &str, expected_len: usize) -> Result<Vec<f32>, ParseError> {
    let body = literal.trim().trim_matches(|c| c == '[' || c == ']');

    let values = body
        .split(',')
        .enumerate()
        .map(|(position, token)| {
            let token = token.trim();
            token.parse::<f32>().map_err(|_| ParseError::NonNumeric {
                position,
                token: token.to_string(),
            })
        })
        .collect::<Result<Vec<f32>, ParseError>>()?;

    if values.len() != expected_len {
        return Err(ParseError::Length {
            expected: expected_len,
            found: values.len(),
        });
    }
    Ok(values)
}
