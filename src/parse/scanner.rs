//! Span extraction from narrated text.
//!
//! Directive text arrives as free prose with bracket directives
//! embedded anywhere in it. The scanner pulls out the top-level
//! `[...]` spans (nested brackets stay inside their span) and leaves
//! the prose for the rendering layer. It also repairs one habitual
//! upstream mistake: several directives run together in a single
//! bracket, separated by semicolons.

/// Extract top-level bracket spans, brackets included.
///
/// Unbalanced closers are ignored; an unclosed opener discards its
/// partial span. Nothing outside a span is ever reported.
#[must_use]
pub fn top_level_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, c) in text.char_indices() {
        match c {
            '[' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            ']' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        spans.push(&text[start..=i]);
                    }
                }
            }
            _ => {}
        }
    }

    spans
}

/// Split a run-on span into bracketed segments.
///
/// A span holding two or more semicolons is several directives
/// jammed into one bracket, e.g. `[a: damaged 1; b: damaged 2;]`.
/// Each segment is re-bracketed. Spans with at most one semicolon
/// pass through untouched (a single trailing `;` is mark-directive
/// syntax).
#[must_use]
pub fn split_run_on(span: &str) -> Vec<String> {
    if span.matches(';').count() <= 1 {
        return vec![span.to_string()];
    }

    span.split(';')
        .map(str::trim)
        .filter(|seg| !seg.is_empty() && *seg != "[" && *seg != "]")
        .map(|seg| {
            let mut fixed = String::new();
            if !seg.starts_with('[') {
                fixed.push('[');
            }
            fixed.push_str(seg);
            if !seg.ends_with(']') {
                fixed.push(']');
            }
            fixed
        })
        .collect()
}
