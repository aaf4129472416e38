use crate::diagnostics::Diagnostic;
use crate::error::ParseError;
use crate::extract::Action;
use crate::extract::Extractor;
use crate::extract::ExtractorLimits;
use crate::normalize::normalize;
use crate::step::synthesize;
use crate::step::Step;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub steps: Vec<Step>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Extraction and synthesis as one call. Only structurally invalid input
/// fails; malformed individual actions become diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser {
    extractor: Extractor,
}

impl Parser {
    pub fn new(limits: ExtractorLimits) -> Self {
        Self {
            extractor: Extractor::new(limits),
        }
    }

    pub fn parse(&self, raw: &str) -> Result<ParseOutcome, ParseError> {
        let extraction = self.extractor.extract(raw)?;
        let synthesis = synthesize(&extraction.actions, 1);

        let mut diagnostics = extraction.diagnostics;
        diagnostics.extend(synthesis.diagnostics);
        tracing::debug!(
            actions = extraction.actions.len(),
            steps = synthesis.steps.len(),
            skipped = diagnostics.len(),
            "parsed action log"
        );

        Ok(ParseOutcome {
            steps: synthesis.steps,
            diagnostics,
        })
    }

    /// Extracted actions with normalized bodies, without building steps.
    pub fn raw_actions(&self, raw: &str) -> Result<Vec<Action>, ParseError> {
        let extraction = self.extractor.extract(raw)?;
        Ok(extraction
            .actions
            .into_iter()
            .map(|action| Action {
                body: normalize(&action.body),
                ..action
            })
            .collect())
    }
}

pub fn parse_actions_to_steps(raw: &str) -> Result<ParseOutcome, ParseError> {
    Parser::default().parse(raw)
}

pub fn extract_raw_actions(raw: &str) -> Result<Vec<Action>, ParseError> {
    Parser::default().raw_actions(raw)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::diagnostics::DiagnosticCode;
    use crate::step::StepKind;
    use crate::step::StepStatus;
    use crate::tree::apply_steps;
    use crate::tree::mark_batch_applied;
    use crate::tree::CompletionPolicy;
    use crate::tree::FileNode;

    const SCENARIO: &str = r#"<agentAction type="file" filePath="index.html">&lt;h1&gt;Hi&lt;/h1&gt;</agentAction><agentAction type="shell">npm install react</agentAction>"#;

    #[test]
    fn end_to_end_scenario() {
        let outcome = parse_actions_to_steps(SCENARIO).expect("parse");
        assert_eq!(outcome.steps.len(), 2);

        let file = &outcome.steps[0];
        assert_eq!(file.id, 1);
        assert_eq!(file.kind, StepKind::CreateFile);
        assert_eq!(file.path.as_deref(), Some("index.html"));
        assert_eq!(file.code.as_deref(), Some("<h1>Hi</h1>"));

        let shell = &outcome.steps[1];
        assert_eq!(shell.id, 2);
        assert_eq!(shell.kind, StepKind::RunScript);
        assert_eq!(shell.title, "Install react");
        assert_eq!(shell.code.as_deref(), Some("npm install react"));

        let update = apply_steps(&[], &outcome.steps).expect("apply");
        assert_eq!(
            update.tree,
            vec![FileNode::file("index.html", "/index.html", "<h1>Hi</h1>")]
        );
        assert_eq!(update.applied, BTreeSet::from([1]));

        let mut steps = outcome.steps;
        mark_batch_applied(&mut steps, &update.applied, CompletionPolicy::WholeBatch);
        assert!(steps.iter().all(|step| step.status == StepStatus::Completed));
    }

    #[test]
    fn file_action_without_path_yields_no_steps() {
        let outcome =
            parse_actions_to_steps(r#"<agentAction type="file">no path</agentAction>"#)
                .expect("parse");
        assert!(outcome.steps.is_empty());
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].code, DiagnosticCode::MissingFilePath);
    }

    #[test]
    fn empty_input_is_a_structural_failure() {
        assert_eq!(parse_actions_to_steps(""), Err(ParseError::EmptyInput));
    }

    #[test]
    fn each_parse_restarts_ids_at_one() {
        let first = parse_actions_to_steps(SCENARIO).expect("first");
        let second =
            parse_actions_to_steps(r#"<agentAction type="shell">git init</agentAction>"#)
                .expect("second");
        assert_eq!(first.steps.last().map(|step| step.id), Some(2));
        assert_eq!(second.steps[0].id, 1);
    }

    #[test]
    fn n_blocks_yield_n_steps_in_order() {
        let raw: String = (0..5)
            .map(|idx| {
                format!(r#"text {idx} <agentAction type="file" filePath="f{idx}.txt">{idx}</agentAction>"#)
            })
            .collect();
        let outcome = parse_actions_to_steps(&raw).expect("parse");
        let paths: Vec<&str> = outcome
            .steps
            .iter()
            .filter_map(|step| step.path.as_deref())
            .collect();
        assert_eq!(paths, vec!["f0.txt", "f1.txt", "f2.txt", "f3.txt", "f4.txt"]);
        let ids: Vec<u64> = outcome.steps.iter().map(|step| step.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn raw_actions_have_normalized_bodies() {
        let actions = extract_raw_actions(SCENARIO).expect("extract");
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].body, "<h1>Hi</h1>");
        assert_eq!(actions[1].kind, "shell");
    }
}
