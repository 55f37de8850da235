//! Sequence and alternatives resolution.
//!
//! A [`Batch`] carries one or more candidate interpretations of an utterance. The [`Resolver`]
//! decides which one runs:
//!
//! - a single alternative runs immediately;
//! - several alternatives are published to the session for disambiguation and wait for
//!   [`Resolver::select`] (or a follow-up batch holding only `Use` / `Cancel`).
//!
//! While an alternative runs, each command is checked against the [`ChainPolicy`]. Once a
//! command breaks the chain, nothing after it runs locally: the queued commands were planned
//! against the old buffer. The transcripts of the unfinished work (the current sequence when
//! commands remain in it, then every later sequence) are joined and handed back to the
//! recognizer through [`Recognizer::resubmit`], which re-plans them against the edited buffer.
//!
//! ```text
//! Idle ──single──▶ Executing ──▶ Idle
//!   │                  │
//!   │                  └─break─▶ ChainBroken ──resubmit──▶ Idle
//!   └─several─▶ AwaitingDisambiguation ──select──▶ Executing
//! ```

use crate::command::{Alternative, Batch, Command};
use crate::dispatcher::{CommandOutcome, DispatchError, Dispatcher};
use crate::host::EditorHost;
use crate::state::AlternativeView;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

/// Resolver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolverState {
    /// Nothing pending.
    #[default]
    Idle,
    /// Several alternatives are shown and wait for a choice.
    AwaitingDisambiguation,
    /// An alternative is running.
    Executing,
    /// A chain break is being resubmitted.
    ChainBroken,
}

/// Decides whether the commands queued after a command keep running locally.
#[derive(Debug, Clone, Copy)]
pub struct ChainPolicy(fn(&Command) -> bool);

impl ChainPolicy {
    /// Policy backed by `continues`, which returns `true` for commands that keep the chain.
    pub fn new(continues: fn(&Command) -> bool) -> Self {
        Self(continues)
    }

    /// Whether `command` keeps the chain going.
    pub fn continues_chain(&self, command: &Command) -> bool {
        (self.0)(command)
    }
}

impl Default for ChainPolicy {
    /// Only whole-buffer replacements (`Diff`) keep the chain.
    fn default() -> Self {
        Self(Command::is_text_replacement)
    }
}

/// Failure reported by a [`Recognizer`].
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ResubmitError(pub String);

/// The recognizer side of a session.
#[async_trait]
pub trait Recognizer: Send {
    /// Ask the recognizer to process `text` again; `chain` marks a chain-break resubmission.
    async fn resubmit(&mut self, text: &str, chain: bool) -> Result<(), ResubmitError>;
}

/// Resolver errors.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("no selectable alternative number {0}")]
    /// The requested alternative number does not name a valid alternative.
    NoSuchAlternative(usize),

    #[error(transparent)]
    /// A command failed.
    Dispatch(#[from] DispatchError),

    #[error("resubmission failed: {0}")]
    /// Handing a broken chain back to the recognizer failed.
    Resubmit(#[from] ResubmitError),
}

/// What handling a batch produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchOutcome {
    /// Last data-carrying outcome of the executed commands.
    pub response: Option<CommandOutcome>,
    /// Text handed back to the recognizer after a chain break.
    pub resubmitted: Option<String>,
    /// The batch was parked for disambiguation instead of running.
    pub awaiting: bool,
}

impl BatchOutcome {
    /// JSON payload for the batch reply, `None` when nothing carried data.
    pub fn payload(&self) -> Option<serde_json::Value> {
        self.response.as_ref().and_then(CommandOutcome::to_payload)
    }
}

/// Routes batches to the dispatcher.
pub struct Resolver<H> {
    dispatcher: Dispatcher<H>,
    policy: ChainPolicy,
    state: ResolverState,
    pending: Vec<Alternative>,
}

impl<H: EditorHost> Resolver<H> {
    /// Resolver with the default chain policy.
    pub fn new(dispatcher: Dispatcher<H>) -> Self {
        Self::with_policy(dispatcher, ChainPolicy::default())
    }

    /// Resolver with a custom chain policy.
    pub fn with_policy(dispatcher: Dispatcher<H>, policy: ChainPolicy) -> Self {
        Self {
            dispatcher,
            policy,
            state: ResolverState::Idle,
            pending: Vec::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> ResolverState {
        self.state
    }

    /// Alternatives waiting for a choice.
    pub fn pending(&self) -> &[Alternative] {
        &self.pending
    }

    /// The dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher<H> {
        &self.dispatcher
    }

    /// Mutable access to the dispatcher.
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher<H> {
        &mut self.dispatcher
    }

    /// Handle one batch from the recognizer.
    pub async fn handle_batch<R>(
        &mut self,
        batch: Batch,
        recognizer: &mut R,
    ) -> Result<BatchOutcome, ResolverError>
    where
        R: Recognizer + ?Sized,
    {
        if self.state == ResolverState::AwaitingDisambiguation {
            match sole_command(&batch) {
                Some(Command::Use { index }) => {
                    return self.select(index.unwrap_or(1), recognizer).await;
                }
                Some(Command::Cancel) => {
                    self.cancel();
                    return Ok(BatchOutcome::default());
                }
                _ => {}
            }
        }

        let mut alternatives = batch.alternatives;
        match alternatives.len() {
            0 => {
                debug!("empty batch");
                Ok(BatchOutcome::default())
            }
            1 => {
                self.clear_pending();
                let alternative = alternatives.remove(0);
                self.run(alternative, recognizer).await
            }
            count => {
                debug!(count, "awaiting disambiguation");
                let views = AlternativeView::from_alternatives(&alternatives);
                self.dispatcher.session_mut().show_alternatives(views);
                self.pending = alternatives;
                self.state = ResolverState::AwaitingDisambiguation;
                Ok(BatchOutcome {
                    awaiting: true,
                    ..BatchOutcome::default()
                })
            }
        }
    }

    /// Run the `number`-th (1-based) selectable pending alternative.
    pub async fn select<R>(
        &mut self,
        number: usize,
        recognizer: &mut R,
    ) -> Result<BatchOutcome, ResolverError>
    where
        R: Recognizer + ?Sized,
    {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, alternative)| !alternative.is_invalid())
            .nth(number.wrapping_sub(1))
            .map(|(index, _)| index)
            .ok_or(ResolverError::NoSuchAlternative(number))?;

        let alternative = self.pending.swap_remove(index);
        self.clear_pending();
        self.run(alternative, recognizer).await
    }

    /// Drop pending alternatives.
    pub fn cancel(&mut self) {
        debug!("disambiguation cancelled");
        self.clear_pending();
    }

    fn clear_pending(&mut self) {
        self.pending.clear();
        self.dispatcher.session_mut().clear_alternatives();
        self.state = ResolverState::Idle;
    }

    async fn run<R>(
        &mut self,
        alternative: Alternative,
        recognizer: &mut R,
    ) -> Result<BatchOutcome, ResolverError>
    where
        R: Recognizer + ?Sized,
    {
        self.state = ResolverState::Executing;
        let result = self.run_sequences(alternative, recognizer).await;
        self.state = ResolverState::Idle;
        result
    }

    async fn run_sequences<R>(
        &mut self,
        alternative: Alternative,
        recognizer: &mut R,
    ) -> Result<BatchOutcome, ResolverError>
    where
        R: Recognizer + ?Sized,
    {
        let mut outcome = BatchOutcome::default();
        let mut sequences = alternative.sequences.into_iter();

        while let Some(sequence) = sequences.next() {
            let mut commands = sequence.commands.iter();
            let mut broken = false;
            for command in commands.by_ref() {
                match self.dispatcher.execute(command).await? {
                    CommandOutcome::Done => {}
                    data => outcome.response = Some(data),
                }
                if !self.policy.continues_chain(command) {
                    broken = true;
                    break;
                }
            }
            if !broken {
                continue;
            }

            let unfinished = commands.next().is_some().then_some(sequence.transcript);
            let rest: Vec<String> = unfinished
                .into_iter()
                .chain(sequences.by_ref().map(|sequence| sequence.transcript))
                .collect();
            if !rest.is_empty() {
                self.state = ResolverState::ChainBroken;
                let text = rest.join(" ");
                info!(text = %text, "chain broken, resubmitting remaining commands");
                recognizer.resubmit(&text, true).await?;
                outcome.resubmitted = Some(text);
            }
            break;
        }

        Ok(outcome)
    }
}

fn sole_command(batch: &Batch) -> Option<&Command> {
    match batch.alternatives.as_slice() {
        [alternative] => match alternative.sequences.as_slice() {
            [sequence] => match sequence.commands.as_slice() {
                [command] => Some(command),
                _ => None,
            },
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandSequence;

    #[test]
    fn test_default_policy_only_continues_on_diff() {
        let policy = ChainPolicy::default();
        assert!(policy.continues_chain(&Command::Diff {
            source: String::new(),
            cursor: 0
        }));
        assert!(!policy.continues_chain(&Command::Undo));
        assert!(!policy.continues_chain(&Command::Paste {
            cursor: None,
            direction: None
        }));
    }

    #[test]
    fn test_sole_command() {
        let batch = Batch::single(CommandSequence::new(
            "use two",
            vec![Command::Use { index: Some(2) }],
        ));
        assert_eq!(sole_command(&batch), Some(&Command::Use { index: Some(2) }));

        let batch = Batch::single(CommandSequence::new("x", vec![Command::Undo, Command::Redo]));
        assert_eq!(sole_command(&batch), None);
    }
}
