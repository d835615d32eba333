//! Deterministic offline generators.
//!
//! Substituted for the generation API in offline and dry-run modes so
//! the pipeline is exercisable without a credential or network. Both
//! outputs are pure functions of the parsed [`Specification`].

use crate::spec::Specification;

/// Template-fill a plan: 方針 / 作業ステップ / リスク / 完了条件.
///
/// Steps are numbered from `spec.tasks`; an empty task list yields a
/// single fallback step.
pub fn plan(spec: &Specification) -> String {
    let steps = if spec.tasks.is_empty() {
        "1. 指示書に基づいてREADMEを作成".to_string()
    } else {
        spec.tasks
            .iter()
            .enumerate()
            .map(|(i, task)| format!("{}. {task}", i + 1))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "## 方針\n\n\
         - まずは最小の成果物を作り、動くことを確認してから拡張します。\n\n\
         ## 作業ステップ\n\n\
         {steps}\n\n\
         ## リスク\n\n\
         - OpenAI APIキー未設定/権限不足\n\
         - unified diff が適用できない差分が生成される可能性\n\n\
         ## 完了条件\n\n\
         - 指示されたファイルが作成され、簡易チェックが通ること\n"
    )
}

/// Minimal unified diff that always creates exactly one file, a README
/// naming the project. Independent of everything in the spec except
/// `project`.
pub fn patch(spec: &Specification) -> String {
    let title = format!("# {}", spec.project);
    let body = "これは \"うさぎさん株式会社(usagi)\" のオフラインモードで生成されたサンプルです。";

    [
        "diff --git a/README.md b/README.md",
        "new file mode 100644",
        "index 0000000..1111111",
        "--- /dev/null",
        "+++ b/README.md",
        "@@ -0,0 +1,3 @@",
        &format!("+{title}"),
        "+",
        &format!("+{body}"),
        "",
    ]
    .join("\n")
}
