//! Action and state-diff logging for reducers
//!
//! Created by [`ReducerExt::debug`](crate::reducer::ReducerExt::debug).
//! Output goes through `tracing` at `DEBUG` level on the
//! `composable_store::debug` target, and is skipped entirely when that level
//! is disabled.

use crate::effect::Effect;
use crate::reducer::Reducer;
use std::fmt;

/// A reducer that logs each action and how it changed the state
#[derive(Debug, Clone)]
pub struct DebugReducer<R> {
    reducer: R,
    prefix: String,
}

impl<R> DebugReducer<R> {
    pub(crate) const fn new(reducer: R, prefix: String) -> Self {
        Self { reducer, prefix }
    }
}

impl<R> Reducer for DebugReducer<R>
where
    R: Reducer,
    R::State: fmt::Debug,
    R::Action: fmt::Debug,
{
    type State = R::State;
    type Action = R::Action;
    type Environment = R::Environment;

    fn reduce(&self, state: &mut R::State, action: R::Action, env: &R::Environment) -> Effect<R::Action> {
        if !tracing::enabled!(target: "composable_store::debug", tracing::Level::DEBUG) {
            return self.reducer.reduce(state, action, env);
        }

        let received = format!("{action:#?}");
        let before = format!("{state:#?}");
        let effect = self.reducer.reduce(state, action, env);
        let after = format!("{state:#?}");
        let changes = diff_lines(&before, &after).unwrap_or_else(|| "(No state changes)".to_string());

        tracing::debug!(
            target: "composable_store::debug",
            prefix = %self.prefix,
            "received action:\n{}\n{}",
            indent(&received),
            indent(&changes),
        );
        effect
    }
}

fn indent(text: &str) -> String {
    text.lines().map(|line| format!("  {line}")).collect::<Vec<_>>().join("\n")
}

/// Line diff of two renderings, `None` when they are identical
///
/// Unchanged lines are prefixed with two spaces, removed lines with `- `
/// and added lines with `+ `.
#[must_use]
pub fn diff_lines(before: &str, after: &str) -> Option<String> {
    if before == after {
        return None;
    }
    let old: Vec<&str> = before.lines().collect();
    let new: Vec<&str> = after.lines().collect();

    // lcs[i][j] = longest common subsequence of old[i..] and new[j..]
    let mut lcs = vec![vec![0_usize; new.len() + 1]; old.len() + 1];
    for i in (0..old.len()).rev() {
        for j in (0..new.len()).rev() {
            lcs[i][j] = if old[i] == new[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut lines = Vec::with_capacity(old.len().max(new.len()));
    let (mut i, mut j) = (0, 0);
    while i < old.len() && j < new.len() {
        if old[i] == new[j] {
            lines.push(format!("  {}", old[i]));
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            lines.push(format!("- {}", old[i]));
            i += 1;
        } else {
            lines.push(format!("+ {}", new[j]));
            j += 1;
        }
    }
    lines.extend(old[i..].iter().map(|line| format!("- {line}")));
    lines.extend(new[j..].iter().map(|line| format!("+ {line}")));
    Some(lines.join("\n"))
}
