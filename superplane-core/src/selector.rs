//! Numbered interactive selection over a list of candidates.

use crate::error::{CliError, CliResult};
use crate::render::Renderer;
use std::io::{self, BufRead};

/// How one candidate is listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorRow {
    pub label: String,
    pub id: String,
    pub current: bool,
}

/// Prompts for one of `candidates` and returns it.
///
/// `noun` names the candidate kind in the prompt and in errors ("context",
/// "canvas"). The listing marks the current candidate with `*`, then a single
/// line is read from `input` and parsed as a 1-based index. Nothing is
/// persisted here; callers store the selection themselves.
pub fn select<T, F>(
    renderer: &mut Renderer,
    input: &mut dyn BufRead,
    noun: &str,
    candidates: Vec<T>,
    describe: F,
) -> CliResult<T>
where
    F: Fn(&T) -> SelectorRow,
{
    if !renderer.is_text() {
        return Err(CliError::unsupported(format!(
            "interactive {} selection requires text output",
            noun
        )));
    }

    if candidates.is_empty() {
        return Err(CliError::not_found(format!("no {} available to select", noun)));
    }

    let rows: Vec<SelectorRow> = candidates.iter().map(describe).collect();
    renderer.render_text(|out| {
        for (index, row) in rows.iter().enumerate() {
            let mark = if row.current { "*" } else { " " };
            writeln!(out, "{} {}. {} ({})", mark, index + 1, row.label, row.id)?;
        }
        write!(out, "Select a {} number: ", noun)
    })?;

    let index = read_selection(input, noun, candidates.len())?;
    tracing::debug!(noun, index, "interactive selection");

    let mut candidates = candidates;
    Ok(candidates.swap_remove(index - 1))
}

/// Reads one line and validates it as an index in `1..=count`.
fn read_selection(input: &mut dyn BufRead, noun: &str, count: usize) -> CliResult<usize> {
    let context = format!("failed to read selected {}", noun);

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .map_err(|e| CliError::io(context.clone(), e))?;
    if read == 0 {
        return Err(CliError::io(
            context,
            io::Error::new(io::ErrorKind::UnexpectedEof, "end of input"),
        ));
    }

    let trimmed = line.trim();
    let selected: i64 = trimmed.parse().map_err(|_| {
        CliError::validation(format!("invalid {} selection {:?}", noun, trimmed))
    })?;

    if selected < 1 || selected > count as i64 {
        return Err(CliError::range(format!(
            "{} selection must be between 1 and {}",
            noun, count
        )));
    }

    Ok(selected as usize)
}
