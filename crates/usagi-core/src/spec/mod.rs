//! Instruction-document parsing.
//!
//! An instruction document is markdown with optional YAML front-matter:
//!
//! ```text
//! ---
//! project: my-app
//! agents:
//!   - name: 社長うさぎ
//!     role: planner
//! ---
//! ## 目的
//! ...
//! ```
//!
//! Parsing never fails on missing structure: every field has a schema
//! default and the body sections are optional. The only hard error is a
//! front-matter field with the wrong shape (e.g. an unknown agent role).

use serde::Deserialize;
use thiserror::Error;

/// Default project name when the front-matter does not provide one.
pub const DEFAULT_PROJECT: &str = "usagi-project";

/// Heading synonyms recognized for each extracted section.
const OBJECTIVE_HEADINGS: &[&str] = &["目的", "Objective"];
const CONTEXT_HEADINGS: &[&str] = &["背景", "Context"];
const TASK_HEADINGS: &[&str] = &["やること", "Tasks"];
const CONSTRAINT_HEADINGS: &[&str] = &["制約", "Constraints"];

/// Errors from parsing an instruction document.
///
/// Missing structure is never an error; only a present front-matter field
/// with an invalid shape is rejected.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("invalid front-matter: {0}")]
    Frontmatter(#[from] serde_yaml::Error),
}

/// Role an agent plays in the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Planner,
    #[default]
    Coder,
    Reviewer,
}

/// A named agent from the front-matter roster.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Agent {
    pub name: String,
    #[serde(default)]
    pub role: AgentRole,
}

/// Normalized representation of an instruction document.
///
/// Immutable after parse; every field is filled, either from the document
/// or from schema defaults, and `agents` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specification {
    pub project: String,
    pub objective: String,
    pub context: String,
    pub tasks: Vec<String>,
    pub constraints: Vec<String>,
    pub agents: Vec<Agent>,
}

/// The fixed three-agent roster used when the front-matter names none.
pub fn default_agents() -> Vec<Agent> {
    vec![
        Agent {
            name: "社長うさぎ".to_string(),
            role: AgentRole::Planner,
        },
        Agent {
            name: "実装うさぎ".to_string(),
            role: AgentRole::Coder,
        },
        Agent {
            name: "監査うさぎ".to_string(),
            role: AgentRole::Reviewer,
        },
    ]
}

/// Front-matter fields we recognize. Unknown keys are ignored; body
/// extraction always overrides the same-named fields, so only `project`
/// and `agents` are read from here.
#[derive(Debug, Default, Deserialize)]
struct Frontmatter {
    #[serde(default)]
    project: Option<String>,
    #[serde(default)]
    agents: Option<Vec<Agent>>,
}

/// Parse an instruction document into a [`Specification`].
///
/// Degrades to defaults for anything absent or unrecognized; returns
/// [`SpecError::Frontmatter`] only when a present front-matter field has
/// the wrong shape.
pub fn parse_spec_markdown(document: &str) -> Result<Specification, SpecError> {
    let (front_block, body) = split_frontmatter(document);

    let front: Frontmatter = match front_block {
        Some(block) => serde_yaml::from_str::<Option<Frontmatter>>(block)?.unwrap_or_default(),
        None => Frontmatter::default(),
    };

    let agents = front
        .agents
        .filter(|a| !a.is_empty())
        .unwrap_or_else(default_agents);

    Ok(Specification {
        project: front.project.unwrap_or_else(|| DEFAULT_PROJECT.to_string()),
        objective: section_text(body, OBJECTIVE_HEADINGS),
        context: section_text(body, CONTEXT_HEADINGS),
        tasks: section_bullets(body, TASK_HEADINGS),
        constraints: section_bullets(body, CONSTRAINT_HEADINGS),
        agents,
    })
}

/// Split off a leading front-matter block delimited by `---` lines.
///
/// Returns `(front_matter, body)`. If the document does not start with a
/// complete delimited block, the whole document is the body.
fn split_frontmatter(document: &str) -> (Option<&str>, &str) {
    let Some(rest) = document.strip_prefix("---\n") else {
        return (None, document);
    };
    match rest.find("\n---\n") {
        Some(end) => (Some(&rest[..end]), &rest[end + "\n---\n".len()..]),
        None => (None, document),
    }
}

/// Parse a line as an ATX heading: 1-6 `#` characters followed by a
/// non-empty title. Returns `(level, trimmed_title)`.
fn heading_line(line: &str) -> Option<(usize, &str)> {
    let level = line.bytes().take_while(|b| *b == b'#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let title = line[level..].trim();
    if title.is_empty() {
        return None;
    }
    Some((level, title))
}

/// Case-insensitive comparison of a heading title against a synonym set.
fn title_matches(title: &str, names: &[&str]) -> bool {
    names
        .iter()
        .any(|name| title.to_lowercase() == name.to_lowercase())
}

/// Extract a named section's body text.
///
/// Scans for the first heading whose title matches one of `names`, then
/// collects lines until a heading of equal or shallower level (or end of
/// document). The collected block is trimmed of surrounding blank lines.
fn section_text(body: &str, names: &[&str]) -> String {
    let lines: Vec<&str> = body.lines().collect();

    let mut start = None;
    let mut level = 0;
    for (i, line) in lines.iter().enumerate() {
        if let Some((lvl, title)) = heading_line(line) {
            if title_matches(title, names) {
                start = Some(i + 1);
                level = lvl;
                break;
            }
        }
    }
    let Some(start) = start else {
        return String::new();
    };

    let mut out: Vec<&str> = Vec::new();
    for line in &lines[start..] {
        if let Some((lvl, _)) = heading_line(line) {
            if lvl <= level {
                break;
            }
        }
        out.push(line);
    }
    out.join("\n").trim().to_string()
}

/// Extract only the bullet items of a named section.
///
/// Lines starting with `-` or `*` followed by whitespace yield one entry
/// each, with the marker and surrounding whitespace stripped. Non-bullet
/// lines inside the section are ignored.
fn section_bullets(body: &str, names: &[&str]) -> Vec<String> {
    section_text(body, names)
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            let rest = line.strip_prefix('-').or_else(|| line.strip_prefix('*'))?;
            if rest.starts_with(char::is_whitespace) {
                Some(rest.trim().to_string())
            } else {
                None
            }
        })
        .collect()
}
