//! Terminal implementation of the progress sink.
//!
//! Sections and step outcomes go to stdout with small status markers;
//! nothing here is machine-parsed, the report file is the real output.

use usagi_core::ui::{StepHandle, Ui};

/// Stdout-backed UI.
pub struct ConsoleUi;

struct ConsoleStep {
    title: String,
}

impl StepHandle for ConsoleStep {
    fn succeed(self: Box<Self>, message: Option<&str>) {
        match message {
            Some(msg) => println!("  [ok] {} - {msg}", self.title),
            None => println!("  [ok] {}", self.title),
        }
    }

    fn fail(self: Box<Self>, message: Option<&str>) {
        match message {
            Some(msg) => println!("  [ng] {} - {msg}", self.title),
            None => println!("  [ng] {}", self.title),
        }
    }
}

impl Ui for ConsoleUi {
    fn log(&self, line: &str) {
        println!("  {line}");
    }

    fn section(&self, title: &str) {
        println!();
        println!("== {title}");
    }

    fn step(&self, title: &str) -> Box<dyn StepHandle> {
        println!("  ... {title}");
        Box::new(ConsoleStep {
            title: title.to_string(),
        })
    }
}
