use tracing::debug;

use crate::error::RewriteError;
use crate::markers::Token;
use crate::model::{RewriteStep, Rewritten, StepOutcome, StepReport};

/// Runs rewrite steps in order over an owned copy of the document.
pub(crate) struct StepRunner {
    text: String,
    steps: Vec<StepReport>,
}

impl StepRunner {
    pub(crate) fn new(template: &str) -> Self {
        Self {
            text: template.to_string(),
            steps: Vec::new(),
        }
    }

    /// A step returns `Ok(None)` when its construct is absent.
    pub(crate) fn apply<F>(&mut self, step: RewriteStep, f: F) -> Result<(), RewriteError>
    where
        F: FnOnce(&str) -> Result<Option<String>, RewriteError>,
    {
        let outcome = match f(&self.text)? {
            Some(next) => {
                self.text = next;
                StepOutcome::Transformed
            }
            None => StepOutcome::Skipped,
        };
        debug!(%step, ?outcome, "rewrite step");
        self.steps.push(StepReport { step, outcome });
        Ok(())
    }

    pub(crate) fn finish(self) -> Rewritten {
        Rewritten {
            text: self.text,
            steps: self.steps,
        }
    }
}

/// Copies `source` with the spans of the selected tokens replaced.
///
/// Returns `None` when `replace` selects nothing.
pub(crate) fn splice_tokens<F>(source: &str, tokens: &[Token], mut replace: F) -> Option<String>
where
    F: FnMut(&Token) -> Option<String>,
{
    let mut out = String::with_capacity(source.len());
    let mut changed = false;
    for token in tokens {
        match replace(token) {
            Some(replacement) => {
                out.push_str(&replacement);
                changed = true;
            }
            None => out.push_str(token.raw(source)),
        }
    }
    changed.then_some(out)
}
