//! Final report composition.
//!
//! A pure function over the run's outputs; the only non-determinism is
//! the timestamp, captured at composition time.

use std::path::Path;

use chrono::{SecondsFormat, Utc};

use crate::spec::Specification;

/// Placeholders for empty fields.
const NO_OBJECTIVE: &str = "(未記載)";
const NO_ITEMS: &str = "(なし)";
const NO_PLAN: &str = "(空)";

/// Compose the final markdown report.
///
/// Sections, in order: title, metadata, objective, extracted tasks,
/// plan, action log, notes. Empty fields render as literal placeholders.
pub fn compose_report(
    spec: &Specification,
    workdir: &Path,
    plan: &str,
    actions: &[String],
    notes: &[String],
) -> String {
    let composed_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    let objective = if spec.objective.is_empty() {
        NO_OBJECTIVE
    } else {
        &spec.objective
    };

    let tasks = if spec.tasks.is_empty() {
        NO_ITEMS.to_string()
    } else {
        spec.tasks
            .iter()
            .map(|t| format!("- {t}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let plan = if plan.is_empty() { NO_PLAN } else { plan };

    let action_log = if actions.is_empty() {
        NO_ITEMS.to_string()
    } else {
        actions
            .iter()
            .map(|a| format!("- {a}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "# うさぎさん株式会社レポート\n\n\
         - 開始: {composed_at}\n\
         - project: {project}\n\
         - workdir: {workdir}\n\n\
         ## 目的\n\n\
         {objective}\n\n\
         ## 依頼内容(抽出)\n\n\
         {tasks}\n\n\
         ## 社長うさぎの計画\n\n\
         {plan}\n\n\
         ## 実行ログ\n\n\
         {action_log}\n\n\
         ## メモ\n\n\
         {notes}\n",
        project = spec.project,
        workdir = workdir.display(),
        notes = notes.join("\n\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::parse_spec_markdown;
    use std::path::PathBuf;

    fn sample_spec() -> Specification {
        parse_spec_markdown(
            "---\nproject: carrot\n---\n## 目的\n\n早くする\n\n## Tasks\n\n- one\n- two\n",
        )
        .expect("sample spec should parse")
    }

    #[test]
    fn report_contains_all_sections_in_order() {
        let spec = sample_spec();
        let report = compose_report(
            &spec,
            &PathBuf::from("/work"),
            "PLAN",
            &["did a thing".to_string()],
            &["note".to_string()],
        );

        let sections = [
            "# うさぎさん株式会社レポート",
            "## 目的",
            "## 依頼内容(抽出)",
            "## 社長うさぎの計画",
            "## 実行ログ",
            "## メモ",
        ];
        let mut last = 0;
        for section in sections {
            let pos = report
                .find(section)
                .unwrap_or_else(|| panic!("report missing section {section}"));
            assert!(pos >= last, "section {section} out of order");
            last = pos;
        }

        assert!(report.contains("- project: carrot"));
        assert!(report.contains("- workdir: /work"));
        assert!(report.contains("- one"));
        assert!(report.contains("- did a thing"));
    }

    #[test]
    fn empty_fields_render_placeholders() {
        let spec = parse_spec_markdown("").expect("should parse");
        let report = compose_report(&spec, &PathBuf::from("/w"), "", &[], &[]);
        assert!(report.contains("(未記載)"), "objective placeholder");
        assert!(report.contains("(なし)"), "tasks/actions placeholder");
        assert!(report.contains("(空)"), "plan placeholder");
    }

    #[test]
    fn notes_are_joined_with_blank_lines() {
        let spec = sample_spec();
        let report = compose_report(
            &spec,
            &PathBuf::from("/w"),
            "p",
            &[],
            &["first".to_string(), "second".to_string()],
        );
        assert!(report.contains("first\n\nsecond"));
    }

    #[test]
    fn same_inputs_differ_only_in_timestamp_line() {
        let spec = sample_spec();
        let actions = vec!["a".to_string()];
        let notes = vec!["n".to_string()];

        let first = compose_report(&spec, &PathBuf::from("/w"), "plan", &actions, &notes);
        let second = compose_report(&spec, &PathBuf::from("/w"), "plan", &actions, &notes);

        let strip = |r: &str| {
            r.lines()
                .filter(|l| !l.starts_with("- 開始: "))
                .collect::<Vec<_>>()
                .join("\n")
        };
        assert_eq!(strip(&first), strip(&second));

        let differing: Vec<_> = first
            .lines()
            .zip(second.lines())
            .filter(|(a, b)| a != b)
            .collect();
        for (a, _) in &differing {
            assert!(
                a.starts_with("- 開始: "),
                "only the timestamp line may differ, found: {a}"
            );
        }
    }
}
