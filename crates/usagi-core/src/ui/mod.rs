//! Progress-notification sink for the pipeline.
//!
//! The orchestrator reports stage boundaries through this interface and
//! never reads anything back from it. Implementations live with the
//! caller (the CLI provides a console sink); [`NullUi`] is for tests and
//! embedding.

/// Handle for an in-flight step, resolved exactly once.
pub trait StepHandle: Send {
    /// Mark the step as succeeded, optionally replacing its title.
    fn succeed(self: Box<Self>, message: Option<&str>);
    /// Mark the step as failed, optionally replacing its title.
    fn fail(self: Box<Self>, message: Option<&str>);
}

/// Observer for pipeline progress. Notified, never queried.
pub trait Ui: Send + Sync {
    /// Emit a plain progress line.
    fn log(&self, line: &str);
    /// Announce a new section of work.
    fn section(&self, title: &str);
    /// Begin a named step; the returned handle is resolved with
    /// `succeed` or `fail` when the step ends.
    fn step(&self, title: &str) -> Box<dyn StepHandle>;
}

/// A sink that discards everything.
#[derive(Debug, Default)]
pub struct NullUi;

struct NullStep;

impl StepHandle for NullStep {
    fn succeed(self: Box<Self>, _message: Option<&str>) {}
    fn fail(self: Box<Self>, _message: Option<&str>) {}
}

impl Ui for NullUi {
    fn log(&self, _line: &str) {}
    fn section(&self, _title: &str) {}
    fn step(&self, _title: &str) -> Box<dyn StepHandle> {
        Box::new(NullStep)
    }
}
