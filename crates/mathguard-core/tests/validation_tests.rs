use mathguard_core::{
    DelimiterTable, ErrorKind, KatexEngine, NoOpEngine, RenderEngine, RenderError,
    RenderOptions, Segment, StrategyDisagreement, Validator, compare_strategies, is_valid,
    segment, validate, validate_segmented,
};
use std::sync::Mutex;

#[test]
fn test_valid_inline_math() {
    let result = validate(r"This is valid LaTeX: \(x = \frac{a}{b}\)", &KatexEngine);
    assert!(result.is_valid);
    assert!(result.errors.is_empty());
}

#[test]
fn test_unbalanced_fraction() {
    let text = r"\(x = \frac{a{b}\)";
    let result = validate(text, &KatexEngine);
    assert!(!result.is_valid);
    assert_eq!(result.errors.len(), 1);

    let error = &result.errors[0];
    assert_eq!(error.kind, ErrorKind::EngineSyntaxError);
    assert_eq!(error.position, 0);
    assert_eq!(error.length, text.len());
    assert!(error.message.starts_with("Invalid LaTeX syntax: "));
}

#[test]
fn test_currency_is_not_math() {
    assert!(is_valid("The price is $5 and tax is $2", &KatexEngine));
}

#[test]
fn test_display_math() {
    let text = r"Display math: \[E = mc^2\]";
    assert!(is_valid(text, &KatexEngine));

    let segments = segment(text, DelimiterTable::shared()).unwrap();
    assert!(matches!(
        segments[1],
        Segment::MathSpan {
            display_mode: true,
            ..
        }
    ));
}

#[test]
fn test_unclosed_inline_math() {
    let text = r"Start \(x + y and nothing closes it";
    let result = validate(text, &KatexEngine);
    assert!(!result.is_valid);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, ErrorKind::UnclosedDelimiter);
    assert_eq!(result.errors[0].position, 6);
}

#[test]
fn test_document_with_several_constructs() {
    let text = "\\section{Results}\n\
                We show \\(a^2 + b^2 = c^2\\) and\n\
                \\begin{align}x &= 1 \\\\ y &= 2\\end{align}\n\
                \\begin{itemize}\\item one \\item two\\end{itemize}\n\
                \\textbf{done}";
    let result = validate(text, &KatexEngine);

    // Environment bodies are rendered on their own: alignment needs its environment and
    // list items are not math.
    let excerpts: Vec<_> = result.errors.iter().map(|e| e.excerpt.as_str()).collect();
    assert_eq!(
        excerpts,
        vec![
            r"\begin{align}x &= 1 \\ y &= 2\end{align}",
            r"\begin{itemize}\item one \item two\end{itemize}",
        ]
    );
    assert_eq!(result.errors[0].position, text.find(r"\begin{align}").unwrap());
    assert_eq!(result.errors[1].position, text.find(r"\begin{itemize}").unwrap());
    assert!(
        result.errors[1]
            .message
            .contains(r"Undefined control sequence: \item"),
        "{}",
        result.errors[1].message
    );
}

/// Records what reaches the engine, accepting everything.
#[derive(Debug, Default)]
struct RecordingEngine {
    calls: Mutex<Vec<String>>,
}

impl RenderEngine for RecordingEngine {
    fn render(&self, math: &str, _options: &RenderOptions<'_>) -> Result<(), RenderError> {
        self.calls.lock().unwrap().push(math.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

#[test]
fn test_strategies_render_environments_differently() {
    let text = r"\begin{align}a &= b\end{align}";

    let engine = RecordingEngine::default();
    validate(text, &engine);
    assert_eq!(*engine.calls.lock().unwrap(), vec!["a &= b"]);

    let engine = RecordingEngine::default();
    validate_segmented(text, &engine);
    assert_eq!(*engine.calls.lock().unwrap(), vec![text]);

    // KaTeX rejects both, for different reasons.
    let comparison = compare_strategies(text, &KatexEngine);
    assert!(comparison.direct.errors[0].message.contains("got '&'"));
    assert!(
        comparison.segmented.errors[0]
            .message
            .contains("{align} can be used only in display mode.")
    );
}

#[test]
fn test_strategies_disagree_on_environment_bodies() {
    // Rows only make sense inside the environment.
    let text = r"f(x) = \begin{cases}0 & x < 0 \\ 1 & x \ge 0\end{cases}";
    let comparison = compare_strategies(text, &KatexEngine);
    assert!(!comparison.direct.is_valid);
    assert!(comparison.segmented.is_valid);
    assert!(!comparison.verdicts_agree());
    assert!(matches!(
        comparison.disagreements()[..],
        [StrategyDisagreement::DirectOnly { .. }]
    ));

    // A body that is fine on its own, in an environment KaTeX only allows in display
    // mode.
    let text = r"\begin{equation}E = mc^2\end{equation}";
    let comparison = compare_strategies(text, &KatexEngine);
    assert!(comparison.direct.is_valid);
    assert!(!comparison.segmented.is_valid);
}

#[test]
fn test_errors_are_ordered() {
    let text = r"\(x^^\) ok \(\frac{1}\) ok \(";
    let result = validate(text, &KatexEngine);
    let kinds: Vec<_> = result.errors.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ErrorKind::EngineSyntaxError,
            ErrorKind::EngineSyntaxError,
            ErrorKind::UnclosedDelimiter,
        ]
    );
    let positions: Vec<_> = result.errors.iter().map(|e| e.position).collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn test_strategies_agree_on_well_formed_input() {
    for text in [
        r"plain text",
        r"\(x\) and \[y^2\] and \frac{1}{2}",
        r"\begin{matrix}E = mc^2\end{matrix}",
        r"\item a \item b",
    ] {
        let comparison = compare_strategies(text, &KatexEngine);
        assert!(comparison.verdicts_agree(), "{text}");
        assert!(comparison.is_consistent(), "{text}");
    }
}

#[test]
fn test_strategies_agree_on_engine_errors() {
    let text = r"first \(x^2^3\) then \[\frac{a}\]";
    let comparison = compare_strategies(text, &KatexEngine);
    assert_eq!(comparison.direct.errors.len(), 2);
    assert!(comparison.is_consistent());
    assert_eq!(comparison.direct, comparison.segmented);
}

#[test]
fn test_segmented_strategy_misses_unclosed_delimiter() {
    let comparison = compare_strategies(r"broken \(x", &KatexEngine);
    assert!(!comparison.direct.is_valid);
    assert!(comparison.segmented.is_valid);
    assert!(!comparison.verdicts_agree());
}

#[test]
fn test_segmented_strategy_stops_at_unclosed_delimiter() {
    // The direct scan resumes inside the unclosed `\textbf{` and finds the bad span.
    let text = r"\textbf{ \(x^^\)";
    let direct = validate(text, &KatexEngine);
    assert_eq!(direct.errors.len(), 2);
    assert_eq!(direct.errors[1].position, 9);

    let segmented = validate_segmented(text, &KatexEngine);
    assert!(segmented.is_valid);
}

#[derive(Debug)]
struct RejectEverything;

impl RenderEngine for RejectEverything {
    fn render(&self, math: &str, _options: &RenderOptions<'_>) -> Result<(), RenderError> {
        Err(RenderError::new(format!("rejected {math:?}")))
    }

    fn name(&self) -> &'static str {
        "reject"
    }
}

#[test]
fn test_every_span_reaches_the_engine() {
    let result = validate(r"\(a\) \[b\] \textit{c} \item d", &RejectEverything);
    let messages: Vec<_> = result.errors.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            r#"Invalid LaTeX syntax: rejected "a""#,
            r#"Invalid LaTeX syntax: rejected "b""#,
            r#"Invalid LaTeX syntax: rejected "c""#,
        ]
    );
}

#[test]
fn test_deeply_nested_braces_are_an_engine_error() {
    let n = 10_000;
    let text = format!(r"\({}{}\)", "{".repeat(n), "}".repeat(n));
    let result = validate(&text, &KatexEngine);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, ErrorKind::EngineSyntaxError);
    assert!(result.errors[0].message.contains("Too many nested groups"));
}

#[test]
fn test_noop_engine_reports_only_delimiters() {
    let validator = Validator::new(&NoOpEngine);
    assert!(validator.is_valid(r"\(}}}\)"));
    assert!(!validator.is_valid(r"\(}}}"));
}
