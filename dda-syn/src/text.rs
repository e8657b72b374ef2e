//! Circuits given as text.
//!
//! The text format has the same grammar as the macro input, with `#`
//! comments that extend to the end of the line. Comments are blanked
//! rather than removed so that every token keeps its line and column.
//! Consequently raw identifiers (`r#loop`) cannot be written in text;
//! keywords are accepted as plain names instead.

use crate::ast::Circuit;

/// Replace every comment by spaces.
#[must_use]
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        match line.find('#') {
            Some(start) => {
                let (code, comment) = line.split_at(start);
                out.push_str(code);
                out.extend(comment.chars().map(|c| if c == '\r' { c } else { ' ' }));
            }
            None => out.push_str(line),
        }
    }
    out
}

/// Parse a circuit from text.
///
/// # Errors
/// If the text is not a sequence of definitions.
pub fn parse_text(text: &str) -> syn::Result<Circuit> {
    let stripped = strip_comments(text);
    let circuit: Circuit = syn::parse_str(&stripped)?;
    tracing::debug!(definitions = circuit.defs.len(), "circuit parsed");
    Ok(circuit)
}
