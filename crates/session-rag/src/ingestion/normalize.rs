//! Deterministic text cleaning applied before chunk storage and embedding

/// Clean extracted text.
///
/// Line endings are unified to `\n`, interior whitespace runs collapse to a
/// single space, control characters other than newlines are dropped, runs of
/// blank lines collapse to one, and the result carries no leading or
/// trailing whitespace. Idempotent, and the output is never longer than the
/// input.
pub fn clean(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut out = String::with_capacity(unified.len());
    let mut pending_blank = false;
    let mut started = false;

    for line in unified.split('\n') {
        let cleaned = clean_line(line);

        if cleaned.is_empty() {
            if started {
                pending_blank = true;
            }
            continue;
        }

        if started {
            out.push('\n');
            if pending_blank {
                out.push('\n');
            }
        }
        out.push_str(&cleaned);
        pending_blank = false;
        started = true;
    }

    out
}

/// Collapse whitespace runs within one line and drop control characters.
fn clean_line(line: &str) -> String {
    let mut cleaned = String::with_capacity(line.len());
    let mut in_space = false;

    for c in line.chars() {
        if c.is_whitespace() {
            in_space = true;
        } else if c.is_control() {
            // dropped entirely; newlines never reach here
        } else {
            if in_space && !cleaned.is_empty() {
                cleaned.push(' ');
            }
            in_space = false;
            cleaned.push(c);
        }
    }

    cleaned
}
