/// Decision block reconstruction.
///
/// A script writes a decision as a flat stream:
///
/// ```text
/// [Decision(options="A;B;C", values="1;2;3")]
/// [Predicate(references="1")]
/// ...lines for A...
/// [Predicate(references="2;3")]
/// ...lines shared by B and C...
/// [Predicate(references="1;2;3")]
/// ```
///
/// [`DecisionBuilder`] decodes that stream into an option → branch map.
/// It tracks which options are currently active and buffers commands until
/// the next predicate hands the buffer to them.

use thiserror::Error;

use crate::schema::command::{Command, Decision};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    #[error("predicate reference `{0}` is not a positive integer")]
    InvalidReference(String),
    #[error("predicate reference {reference} is out of range for {options} options")]
    ReferenceOutOfRange { reference: usize, options: usize },
    #[error("decision declares {options} options but {values} values")]
    LengthMismatch { options: usize, values: usize },
}

/// Result of feeding a predicate to the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pivot {
    /// The predicate selected a new set of active options.
    Branch,
    /// The predicate referenced every value; the block is finished.
    Close,
}

#[derive(Debug, Clone)]
pub struct DecisionBuilder {
    options: Vec<String>,
    values: Vec<String>,
    /// Indices into `options`. `None` until the first branch predicate.
    active: Option<Vec<usize>>,
    buffer: Vec<Command>,
    bodies: Vec<Option<Vec<Command>>>,
    closed: bool,
}

impl DecisionBuilder {
    pub fn new(options: Vec<String>, values: Vec<String>) -> Result<Self, DecisionError> {
        if options.len() != values.len() {
            return Err(DecisionError::LengthMismatch {
                options: options.len(),
                values: values.len(),
            });
        }
        let bodies = vec![None; options.len()];
        Ok(Self {
            options,
            values,
            active: None,
            buffer: Vec::new(),
            bodies,
            closed: false,
        })
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Labels of the options the buffered commands currently belong to.
    pub fn active_options(&self) -> Vec<&str> {
        self.active
            .iter()
            .flatten()
            .map(|&i| self.options[i].as_str())
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Append a command to the current branch.
    pub fn push(&mut self, command: Command) {
        self.buffer.push(command);
    }

    /// Whether `references` is exactly the decision's value list.
    pub fn closes_on(&self, references: &[&str]) -> bool {
        references.len() == self.values.len()
            && references
                .iter()
                .zip(&self.values)
                .all(|(reference, value)| *reference == value.as_str())
    }

    /// Feed a predicate's reference list.
    pub fn pivot(&mut self, references: &[&str]) -> Result<Pivot, DecisionError> {
        if self.closes_on(references) {
            self.close();
            return Ok(Pivot::Close);
        }

        let next = self.resolve(references)?;
        match self.active.take() {
            None => {
                if !self.buffer.is_empty() {
                    tracing::warn!(
                        commands = self.buffer.len(),
                        "commands before the first predicate join the first branch"
                    );
                }
            }
            Some(previous) => {
                let mut body = Vec::with_capacity(self.buffer.len() + 1);
                body.push(Command::ShowDialog);
                body.append(&mut self.buffer);
                self.assign(&previous, body);
            }
        }
        tracing::debug!(active = ?next, "decision branch");
        self.active = Some(next);
        Ok(Pivot::Branch)
    }

    /// The finished decision, with options in declaration order. Options no
    /// predicate ever selected get a single no-op body.
    pub fn into_decision(self) -> Decision {
        let mut decision = Decision::new();
        for (option, body) in self.options.into_iter().zip(self.bodies) {
            decision.insert(option, body.unwrap_or_else(|| vec![Command::NoOperation]));
        }
        decision
    }

    fn close(&mut self) {
        let buffer = std::mem::take(&mut self.buffer);
        match self.active.take() {
            Some(active) => self.assign(&active, buffer),
            None if buffer.is_empty() => {}
            None => {
                tracing::warn!(
                    commands = buffer.len(),
                    "decision closed without branch predicates; all options share one body"
                );
                let all: Vec<usize> = (0..self.options.len()).collect();
                self.assign(&all, buffer);
            }
        }
        self.closed = true;
    }

    fn assign(&mut self, indices: &[usize], body: Vec<Command>) {
        let body = if body.is_empty() {
            vec![Command::NoOperation]
        } else {
            body
        };
        for &i in indices {
            self.bodies[i] = Some(body.clone());
        }
    }

    /// Map 1-based references to option indices.
    fn resolve(&self, references: &[&str]) -> Result<Vec<usize>, DecisionError> {
        references
            .iter()
            .map(|reference| {
                let trimmed = reference.trim();
                let index: usize = trimmed
                    .parse()
                    .ok()
                    .filter(|&n| n > 0)
                    .ok_or_else(|| DecisionError::InvalidReference(reference.to_string()))?;
                if index > self.options.len() {
                    return Err(DecisionError::ReferenceOutOfRange {
                        reference: index,
                        options: self.options.len(),
                    });
                }
                Ok(index - 1)
            })
            .collect()
    }
}
