//! Parses the decision reply into a tool call or a final answer.
//!
//! The reply is scanned line by line from the top. Each line is trimmed of
//! whitespace and stray backticks; the first one starting with
//! `FUNCTION_CALL:` or `FINAL_ANSWER:` decides, and anything after it is
//! ignored.

use reckon_core::error::DecisionError;
use reckon_core::tool::{FunctionCall, ToolRegistry};
use serde::{Deserialize, Serialize};

pub const FUNCTION_CALL_MARKER: &str = "FUNCTION_CALL:";
pub const FINAL_ANSWER_MARKER: &str = "FINAL_ANSWER:";

/// Terminal answer text, verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalAnswer {
    pub value: String,
}

/// Exactly one of the two things a reply may ask for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    FunctionCall(FunctionCall),
    FinalAnswer(FinalAnswer),
}

pub fn parse(text: &str, tools: &ToolRegistry) -> Result<Decision, DecisionError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DecisionError::EmptyResponse);
    }

    for line in text.lines() {
        let line = line.trim().trim_matches('`').trim();

        if let Some(rest) = line.strip_prefix(FUNCTION_CALL_MARKER) {
            return parse_function_call(rest, tools).map(Decision::FunctionCall);
        }
        if let Some(rest) = line.strip_prefix(FINAL_ANSWER_MARKER) {
            let value = rest.trim();
            if value.is_empty() {
                return Err(DecisionError::EmptyFinalAnswer);
            }
            return Ok(Decision::FinalAnswer(FinalAnswer {
                value: value.to_string(),
            }));
        }
    }

    Err(DecisionError::NoMarker)
}

fn parse_function_call(rest: &str, tools: &ToolRegistry) -> Result<FunctionCall, DecisionError> {
    let mut tokens = rest.split('|').map(str::trim);
    let name = tokens.next().unwrap_or_default();
    if name.is_empty() {
        return Err(DecisionError::MissingFunctionName);
    }
    if !tools.contains(name) {
        return Err(DecisionError::UnknownTool(name.to_string()));
    }
    Ok(FunctionCall::new(name, tokens.map(String::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reckon_core::args::{ArgKind, ArgValue, Param};
    use reckon_core::error::ToolError;
    use reckon_core::tool::Tool;
    use reckon_core::value::ToolValue;

    struct Named(&'static str);

    const AB: &[Param] = &[Param::new("a", ArgKind::Number), Param::new("b", ArgKind::Number)];

    #[async_trait]
    impl Tool for Named {
        fn name(&self) -> &str { self.0 }
        fn description(&self) -> &str { "test tool" }
        fn params(&self) -> &[Param] { AB }
        async fn execute(&self, _args: Vec<ArgValue>) -> Result<ToolValue, ToolError> {
            Ok(ToolValue::Int(0))
        }
    }

    fn registry() -> ToolRegistry {
        let mut r = ToolRegistry::new();
        r.register(Box::new(Named("add")));
        r.register(Box::new(Named("send_email")));
        r
    }

    #[test]
    fn function_call_with_args() {
        let d = parse("FUNCTION_CALL: add|2|3", &registry()).unwrap();
        assert_eq!(d, Decision::FunctionCall(FunctionCall::new("add", vec!["2".into(), "3".into()])));
    }

    #[test]
    fn tokens_are_trimmed() {
        let d = parse("FUNCTION_CALL:  add | 2 |  3 ", &registry()).unwrap();
        assert_eq!(d, Decision::FunctionCall(FunctionCall::new("add", vec!["2".into(), "3".into()])));
    }

    #[test]
    fn final_answer_is_verbatim() {
        let d = parse("FINAL_ANSWER: 42", &registry()).unwrap();
        assert_eq!(d, Decision::FinalAnswer(FinalAnswer { value: "42".into() }));

        let d = parse("FINAL_ANSWER: [ALL TASKS COMPLETED]", &registry()).unwrap();
        assert_eq!(d, Decision::FinalAnswer(FinalAnswer { value: "[ALL TASKS COMPLETED]".into() }));
    }

    #[test]
    fn garbage_has_no_marker() {
        assert_eq!(parse("garbage", &registry()), Err(DecisionError::NoMarker));
    }

    #[test]
    fn empty_reply() {
        assert_eq!(parse("  \n ", &registry()), Err(DecisionError::EmptyResponse));
    }

    #[test]
    fn first_marker_wins() {
        let text = "FINAL_ANSWER: done\nFUNCTION_CALL: add|1|2";
        assert_eq!(
            parse(text, &registry()).unwrap(),
            Decision::FinalAnswer(FinalAnswer { value: "done".into() })
        );

        let text = "FUNCTION_CALL: add|1|2\nFINAL_ANSWER: done";
        assert!(matches!(parse(text, &registry()).unwrap(), Decision::FunctionCall(_)));
    }

    #[test]
    fn preamble_and_backticks_are_skipped() {
        let text = "Reasoning: arithmetic\n```\nFUNCTION_CALL: add|1|2\n```";
        assert!(matches!(parse(text, &registry()).unwrap(), Decision::FunctionCall(_)));

        let text = "`FINAL_ANSWER: 7`";
        assert_eq!(
            parse(text, &registry()).unwrap(),
            Decision::FinalAnswer(FinalAnswer { value: "7".into() })
        );
    }

    #[test]
    fn unknown_tool_is_rejected() {
        assert_eq!(
            parse("FUNCTION_CALL: draw_rectangle|1|2", &registry()),
            Err(DecisionError::UnknownTool("draw_rectangle".into()))
        );
    }

    #[test]
    fn missing_name_is_rejected() {
        assert_eq!(
            parse("FUNCTION_CALL: |1|2", &registry()),
            Err(DecisionError::MissingFunctionName)
        );
        assert_eq!(parse("FUNCTION_CALL:", &registry()), Err(DecisionError::MissingFunctionName));
    }

    #[test]
    fn bare_final_answer_is_rejected() {
        assert_eq!(parse("FINAL_ANSWER:", &registry()), Err(DecisionError::EmptyFinalAnswer));
        assert_eq!(parse("FINAL_ANSWER:   ", &registry()), Err(DecisionError::EmptyFinalAnswer));
        assert_eq!(parse("`FINAL_ANSWER:`", &registry()), Err(DecisionError::EmptyFinalAnswer));
    }

    #[test]
    fn markers_are_case_sensitive() {
        assert_eq!(parse("final_answer: 1", &registry()), Err(DecisionError::NoMarker));
    }

    #[test]
    fn empty_argument_tokens_are_kept() {
        let d = parse("FUNCTION_CALL: send_email|", &registry()).unwrap();
        assert_eq!(d, Decision::FunctionCall(FunctionCall::new("send_email", vec!["".into()])));
    }
}
