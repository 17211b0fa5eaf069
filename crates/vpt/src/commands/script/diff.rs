use itertools::Itertools;
use owo_colors::OwoColorize;
use similar::{ChangeTag, TextDiff};
use std::fmt::Display;

/// Line diff of two scripts, highlighting the changed parts of each line
pub struct ScriptDiff {
    lines: Vec<String>,
}

impl ScriptDiff {
    pub fn new(old: &str, new: &str) -> ScriptDiff {
        let diff = TextDiff::from_lines(old, new);

        let lines = diff
            .grouped_ops(3)
            .iter()
            .flat_map(|group| {
                let header = group
                    .first()
                    .map(|op| format!("@@ line {} @@", op.old_range().start + 1).blue().to_string());
                let changes = group
                    .iter()
                    .flat_map(|op| diff.iter_inline_changes(op))
                    .map(|change| {
                        let sign = match change.tag() {
                            ChangeTag::Delete => "-",
                            ChangeTag::Insert => "+",
                            ChangeTag::Equal => " ",
                        };
                        let mut line = String::from(sign);
                        for (emphasized, value) in change.iter_strings_lossy() {
                            let value = value.trim_end_matches(['\r', '\n']);
                            let styled = match (change.tag(), emphasized) {
                                (ChangeTag::Insert, true) => value.green().underline().to_string(),
                                (ChangeTag::Insert, false) => value.green().to_string(),
                                (ChangeTag::Delete, true) => value.red().underline().to_string(),
                                (ChangeTag::Delete, false) => value.red().to_string(),
                                (ChangeTag::Equal, _) => value.dimmed().to_string(),
                            };
                            line.push_str(&styled);
                        }
                        line
                    })
                    .collect::<Vec<_>>();
                header.into_iter().chain(changes)
            })
            .collect();

        ScriptDiff { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Display for ScriptDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.lines.iter().join("\n"))
    }
}
