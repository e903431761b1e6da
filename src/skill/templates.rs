//! Built-in bundle content: the manifest and the entry point scripts.

use std::fmt::Write;

pub(super) struct ManifestFields<'a> {
    pub slug: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub overview: Option<&'a str>,
    pub entry_point: &'a str,
    pub behavior: Option<&'a str>,
}

/// Renders `SKILL.md`: front matter plus a short usage guide.
pub(super) fn manifest(fields: &ManifestFields<'_>) -> String {
    let mut out = format!(
        "---\nname: {}\ndescription: {}\n---\n\n# {} Skill\n\n## Overview\n\n{}\n\n",
        fields.slug,
        single_line(fields.description),
        fields.name,
        fields.overview.unwrap_or(fields.description),
    );
    let _ = write!(
        out,
        "## Usage\n\nRun `scripts/{}` with the input as its arguments.\n\n",
        fields.entry_point
    );
    let _ = write!(
        out,
        "## Resources\n\n### scripts/\n\n- `{}`: {}\n\n### references/\n\n- `provenance.toml`: build record for this bundle.\n",
        fields.entry_point,
        fields.behavior.unwrap_or("entry point"),
    );
    out
}

/// Recipe entry point: dish name in, JSON with ingredients and steps out.
pub(super) fn recipe_script() -> String {
    r##"#!/bin/sh
# Prints the ingredients and cooking steps for a dish as JSON.
# Usage: main.sh <dish>

dish="$*"
[ -n "$dish" ] || dish="番茄炒蛋"
dish=$(printf '%s' "$dish" | sed 's/\\/\\\\/g; s/"/\\"/g')

case "$dish" in
    番茄炒蛋)
        ingredients='"番茄 2 个", "鸡蛋 3 个", "盐、糖、葱花适量", "食用油"'
        steps='"番茄洗净切块，鸡蛋打散加少许盐。", "锅热油，先炒蛋至凝固盛出。", "再下番茄炒出汁，加盐、糖调味。", "倒入鸡蛋翻炒，撒葱花即可。"'
        ;;
    红烧肉)
        ingredients='"五花肉 500g", "冰糖、生抽、老抽、料酒", "葱姜、八角"'
        steps='"五花肉切块焯水去血沫。", "锅少油炒糖色，下肉块翻炒上色。", "加生抽、老抽、料酒、葱姜八角，加水没过肉。", "大火烧开转小火炖约 1 小时，收汁即可。"'
        ;;
    *)
        ingredients="\"根据「$dish」准备主料、辅料、调味料\""
        steps='"准备食材", "预处理", "烹饪", "装盘"'
        ;;
esac

printf '{\n  "dish": "%s",\n  "ingredients": [%s],\n  "steps": [%s]\n}\n' "$dish" "$ingredients" "$steps"
"##
    .to_string()
}

/// Generic entry point: does nothing but report success.
pub(super) fn generic_script(slug: &str) -> String {
    format!("#!/bin/sh\n# Entry point for the {slug} skill.\necho OK\n")
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
