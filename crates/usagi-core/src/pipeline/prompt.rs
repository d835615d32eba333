//! Prompt construction for the two generation stages.
//!
//! Pure string assembly, no I/O. The plan prompt embeds the extracted
//! specification; the patch prompt embeds the plan and pins the output
//! contract to unified-diff format.

use crate::spec::Specification;

/// Build the plan-generation prompt from a specification.
pub fn plan_prompt(spec: &Specification) -> String {
    let mut prompt = String::with_capacity(512);

    prompt.push_str("あなたは「うさぎさん株式会社」の社長うさぎです。\n\n");

    prompt.push_str("目的:\n");
    prompt.push_str(&spec.objective);
    prompt.push_str("\n\n");

    prompt.push_str("背景:\n");
    prompt.push_str(&spec.context);
    prompt.push_str("\n\n");

    prompt.push_str("やること(箇条書き):\n");
    for task in &spec.tasks {
        prompt.push_str(&format!("- {task}\n"));
    }
    prompt.push('\n');

    prompt.push_str("制約:\n");
    for constraint in &spec.constraints {
        prompt.push_str(&format!("- {constraint}\n"));
    }
    prompt.push('\n');

    prompt.push_str("出力: 実行計画をMarkdownで。セクション: 方針 / 作業ステップ / リスク / 完了条件。");

    prompt
}

/// Build the patch-generation prompt from the plan.
///
/// The response contract requires unified-diff output creating at least
/// a README at the project root.
pub fn patch_prompt(spec: &Specification, plan: &str) -> String {
    let mut prompt = String::with_capacity(512 + plan.len());

    prompt.push_str("あなたは「うさぎさん株式会社」の実装うさぎです。\n\n");
    prompt.push_str("次の計画に沿って、最小構成の成果物を作ってください。\n\n");

    prompt.push_str("計画:\n");
    prompt.push_str(plan);
    prompt.push_str("\n\n");

    prompt.push_str("要件:\n");
    prompt.push_str("- 変更は \"Unified diff\" 形式で出力してください（git diffと同様）。\n");
    prompt.push_str("- ルートに README.md を必ず作る。\n");
    prompt.push_str("- 可能なら動くサンプル(簡単なCLIやスクリプト)も含める。\n");
    prompt.push_str("- 文章は日本語。\n\n");

    prompt.push_str(&format!("プロジェクト名: {}\n", spec.project));

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::parse_spec_markdown;

    fn sample_spec() -> Specification {
        parse_spec_markdown(
            "---\nproject: carrot-cli\n---\n\
             ## 目的\n\nCLIを作る\n\n\
             ## 背景\n\n手作業が多い\n\n\
             ## やること\n\n- コマンドを定義\n- READMEを書く\n\n\
             ## 制約\n\n- 依存は最小限\n",
        )
        .expect("sample spec should parse")
    }

    #[test]
    fn plan_prompt_embeds_all_spec_fields() {
        let prompt = plan_prompt(&sample_spec());
        assert!(prompt.contains("CLIを作る"));
        assert!(prompt.contains("手作業が多い"));
        assert!(prompt.contains("- コマンドを定義"));
        assert!(prompt.contains("- READMEを書く"));
        assert!(prompt.contains("- 依存は最小限"));
        assert!(prompt.contains("方針 / 作業ステップ / リスク / 完了条件"));
    }

    #[test]
    fn patch_prompt_embeds_plan_and_project() {
        let prompt = patch_prompt(&sample_spec(), "THE-PLAN");
        assert!(prompt.contains("THE-PLAN"));
        assert!(prompt.contains("プロジェクト名: carrot-cli"));
    }

    #[test]
    fn patch_prompt_pins_unified_diff_and_readme() {
        let prompt = patch_prompt(&sample_spec(), "plan");
        assert!(prompt.contains("Unified diff"));
        assert!(prompt.contains("README.md を必ず作る"));
    }
}
