use crate::cancel::CancellationToken;
use crate::cop::{Cop, CopConfig};
use crate::correction::{Correction, CorrectionSet};
use crate::diagnostic::Diagnostic;
use crate::parse::parse_source;
use crate::parse::source::SourceFile;

/// An expected offense parsed from a fixture annotation.
#[derive(Debug, Clone)]
pub struct ExpectedOffense {
    pub line: usize,
    pub column: usize,
    pub cop_name: String,
    pub message: String,
}

struct RawAnnotation {
    column: usize,
    cop_name: String,
    message: String,
}

/// Try to parse an annotation line.
///
/// Annotation format: optional leading whitespace, then one or more `^` characters,
/// then a space, then `CopName: Message`.
///
/// The column of the offense is one past the byte position of the first `^`
/// in the line, matching the 1-indexed columns diagnostics carry.
///
/// Rejects lines that merely contain `^` (e.g. C# XOR `x ^ y`):
/// - The `^` must be the first non-whitespace character
/// - Must be followed by ` CopName: message` where `CopName` is a single
///   capitalised alphanumeric word
fn try_parse_annotation(line: &str) -> Option<RawAnnotation> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with('^') {
        return None;
    }

    let caret_count = trimmed.bytes().take_while(|&b| b == b'^').count();
    let after_carets = &trimmed[caret_count..];
    if !after_carets.starts_with(' ') {
        return None;
    }

    let rest = after_carets[1..].trim_end();
    let colon_space = rest.find(": ")?;
    let cop_name = &rest[..colon_space];
    let message = &rest[colon_space + 2..];

    if !cop_name.starts_with(|c: char| c.is_ascii_uppercase())
        || !cop_name.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }

    let column = line.len() - trimmed.len() + 1;

    Some(RawAnnotation {
        column,
        cop_name: cop_name.to_string(),
        message: message.to_string(),
    })
}

/// Parse fixture content into clean source bytes and expected offenses.
///
/// Annotation lines (lines starting with `^^^` markers after optional whitespace)
/// are stripped from the source. Line numbers in expected offenses refer to the
/// clean source (1-indexed).
///
/// # Convention
///
/// Annotations must appear *after* the source line they reference. The annotated
/// line number is the count of source lines seen so far (i.e., the previous
/// non-annotation line).
///
/// # Panics
///
/// Panics if an annotation appears before any source line, which would produce
/// an invalid line number of 0.
pub fn parse_fixture(raw: &[u8]) -> (Vec<u8>, Vec<ExpectedOffense>) {
    let text = std::str::from_utf8(raw).expect("fixture must be valid UTF-8");
    let elements: Vec<&str> = text.split('\n').collect();

    let mut source_lines: Vec<&str> = Vec::new();
    let mut expected: Vec<ExpectedOffense> = Vec::new();

    for (raw_idx, element) in elements.iter().enumerate() {
        if let Some(annotation) = try_parse_annotation(element) {
            assert!(
                !source_lines.is_empty(),
                "Annotation on raw line {} appears before any source line. \
                 Annotations must follow the source line they reference.\n\
                 Line: {:?}",
                raw_idx + 1,
                element,
            );
            let source_line_number = source_lines.len();
            expected.push(ExpectedOffense {
                line: source_line_number,
                column: annotation.column,
                cop_name: annotation.cop_name,
                message: annotation.message,
            });
        } else {
            source_lines.push(element);
        }
    }

    let clean = source_lines.join("\n");
    (clean.into_bytes(), expected)
}

fn check(
    cop: &dyn Cop,
    source: &SourceFile,
    config: &CopConfig,
    corrections: Option<&mut Vec<Correction>>,
) -> Vec<Diagnostic> {
    let text = source.as_str().expect("test source must be valid UTF-8");
    let tokens = parse_source(text).expect("test source must tokenize");
    let mut diagnostics = Vec::new();
    cop.check_tokens(
        source,
        &tokens,
        config,
        &mut diagnostics,
        corrections,
        &CancellationToken::new(),
    )
    .expect("fresh cancellation token never fires");
    diagnostics
}

/// Run a cop on raw source bytes and return the diagnostics.
///
/// Use this for custom assertions where the standard `assert_cop_offenses`
/// helpers don't fit (e.g., checking severity or the `corrected` flag).
pub fn run_cop(cop: &dyn Cop, source_bytes: &[u8]) -> Vec<Diagnostic> {
    run_cop_with_config(cop, source_bytes, CopConfig::default())
}

/// Run a cop on raw source bytes with a specific config and return diagnostics.
pub fn run_cop_with_config(
    cop: &dyn Cop,
    source_bytes: &[u8],
    config: CopConfig,
) -> Vec<Diagnostic> {
    let source = SourceFile::from_bytes("test.cs", source_bytes.to_vec());
    check(cop, &source, &config, None)
}

/// Run a cop with autocorrect enabled, returning diagnostics and the raw edits.
pub fn run_cop_autocorrect(cop: &dyn Cop, source_bytes: &[u8]) -> (Vec<Diagnostic>, Vec<Correction>) {
    let source = SourceFile::from_bytes("test.cs", source_bytes.to_vec());
    let mut corrections = Vec::new();
    let diagnostics = check(cop, &source, &CopConfig::default(), Some(&mut corrections));
    (diagnostics, corrections)
}

/// Run a cop on fixture bytes (with annotations) and assert offenses match.
pub fn assert_cop_offenses(cop: &dyn Cop, fixture_bytes: &[u8]) {
    assert_cop_offenses_with_config(cop, fixture_bytes, CopConfig::default());
}

/// Run a cop on fixture bytes with a specific config and assert offenses match.
///
/// Both expected and actual diagnostics are sorted by (line, column) before
/// comparison, so annotation order in the fixture doesn't need to match the
/// cop's emission order. Ties keep their relative order.
pub fn assert_cop_offenses_with_config(cop: &dyn Cop, fixture_bytes: &[u8], config: CopConfig) {
    let (clean_source, mut expected) = parse_fixture(fixture_bytes);
    let source = SourceFile::from_bytes("test.cs", clean_source);
    let mut diagnostics = check(cop, &source, &config, None);

    expected.sort_by_key(|e| (e.line, e.column));
    diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    assert_eq!(
        diagnostics.len(),
        expected.len(),
        "Expected {} offense(s) but got {}.\nExpected:\n{}\nActual:\n{}",
        expected.len(),
        diagnostics.len(),
        format_expected(&expected),
        format_diagnostics(&diagnostics),
    );

    for (i, (diag, exp)) in diagnostics.iter().zip(expected.iter()).enumerate() {
        assert_eq!(
            diag.location.line, exp.line,
            "Offense #{}: line mismatch (expected {} got {})\n  expected: {}:{} {}: {}\n  actual:   {d}",
            i + 1, exp.line, diag.location.line,
            exp.line, exp.column, exp.cop_name, exp.message,
            d = diag,
        );
        assert_eq!(
            diag.location.column, exp.column,
            "Offense #{}: column mismatch (expected {} got {})\n  expected: {}:{} {}: {}\n  actual:   {d}",
            i + 1, exp.column, diag.location.column,
            exp.line, exp.column, exp.cop_name, exp.message,
            d = diag,
        );
        assert_eq!(
            diag.cop_name, exp.cop_name,
            "Offense #{}: cop name mismatch\n  expected: {}\n  actual:   {}",
            i + 1, exp.cop_name, diag.cop_name,
        );
        assert_eq!(
            diag.message, exp.message,
            "Offense #{}: message mismatch for {}\n  expected: {:?}\n  actual:   {:?}",
            i + 1, exp.cop_name, exp.message, diag.message,
        );
    }
}

/// Assert a cop produces no offenses on the given source bytes.
pub fn assert_cop_no_offenses(cop: &dyn Cop, source_bytes: &[u8]) {
    assert_cop_no_offenses_with_config(cop, source_bytes, CopConfig::default());
}

/// Assert a cop produces no offenses on the given source bytes with a specific config.
pub fn assert_cop_no_offenses_with_config(cop: &dyn Cop, source_bytes: &[u8], config: CopConfig) {
    let diagnostics = run_cop_with_config(cop, source_bytes, config);

    assert!(
        diagnostics.is_empty(),
        "Expected no offenses but got {}:\n{}",
        diagnostics.len(),
        format_diagnostics(&diagnostics),
    );
}

/// Autocorrect the annotated fixture and compare against the expected output.
pub fn assert_cop_autocorrect(cop: &dyn Cop, fixture_bytes: &[u8], corrected_bytes: &[u8]) {
    let (clean_source, _) = parse_fixture(fixture_bytes);
    let (_, corrections) = run_cop_autocorrect(cop, &clean_source);
    let set = CorrectionSet::from_vec(corrections).expect("cop edits must not overlap");
    let actual = set.apply(&clean_source);
    assert_eq!(
        String::from_utf8_lossy(&actual),
        String::from_utf8_lossy(corrected_bytes),
        "autocorrected output does not match corrected fixture",
    );
    assert_cop_no_offenses(cop, &actual);
}

fn format_expected(expected: &[ExpectedOffense]) -> String {
    expected
        .iter()
        .map(|e| format!("  {}:{} {}: {}", e.line, e.column, e.cop_name, e.message))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("  {d}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Generate the standard fixture tests for a cop.
///
/// Reads `offense.cs`, `no_offense.cs` and `corrected.cs` from
/// `tests/fixtures/<path>/`.
#[macro_export]
macro_rules! cop_fixture_tests {
    ($cop:expr, $path:literal) => {
        #[test]
        fn offense_fixture() {
            $crate::testutil::assert_cop_offenses(
                &$cop,
                include_bytes!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/tests/fixtures/",
                    $path,
                    "/offense.cs"
                )),
            );
        }

        #[test]
        fn no_offense_fixture() {
            $crate::testutil::assert_cop_no_offenses(
                &$cop,
                include_bytes!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/tests/fixtures/",
                    $path,
                    "/no_offense.cs"
                )),
            );
        }

        #[test]
        fn autocorrect_fixture() {
            $crate::testutil::assert_cop_autocorrect(
                &$cop,
                include_bytes!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/tests/fixtures/",
                    $path,
                    "/offense.cs"
                )),
                include_bytes!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/tests/fixtures/",
                    $path,
                    "/corrected.cs"
                )),
            );
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cop::spacing::comma_spacing::CommaSpacing;

    // ---- Annotation parser unit tests ----

    #[test]
    fn parse_annotation_with_carets() {
        let ann = try_parse_annotation("     ^ CommaSpacing: some message").unwrap();
        assert_eq!(ann.column, 6);
        assert_eq!(ann.cop_name, "CommaSpacing");
        assert_eq!(ann.message, "some message");
    }

    #[test]
    fn parse_annotation_at_column_one() {
        let ann = try_parse_annotation("^^^ Bar: msg").unwrap();
        assert_eq!(ann.column, 1);
        assert_eq!(ann.cop_name, "Bar");
        assert_eq!(ann.message, "msg");
    }

    #[test]
    fn parse_annotation_message_with_special_chars() {
        let ann = try_parse_annotation("^ Foo: Use `bar` instead of 'baz'.").unwrap();
        assert_eq!(ann.message, "Use `bar` instead of 'baz'.");
    }

    // ---- False-positive rejection tests ----

    #[test]
    fn rejects_non_annotation_lines() {
        assert!(try_parse_annotation("int x = 1;").is_none());
        assert!(try_parse_annotation("// just a comment").is_none());
        assert!(try_parse_annotation("").is_none());
        assert!(try_parse_annotation("   ").is_none());
    }

    #[test]
    fn rejects_xor_operator() {
        assert!(try_parse_annotation("x ^ y").is_none());
        assert!(try_parse_annotation("var r = a ^ b;").is_none());
        assert!(try_parse_annotation("^ b;").is_none());
    }

    #[test]
    fn rejects_carets_without_cop_name() {
        assert!(try_parse_annotation("^^^ no cop here").is_none());
        assert!(try_parse_annotation("^^^ lower: case").is_none());
        assert!(try_parse_annotation("^^^ Has Space: msg").is_none());
    }

    #[test]
    fn rejects_carets_without_space_after() {
        assert!(try_parse_annotation("^^^Foo: msg").is_none());
    }

    #[test]
    fn rejects_carets_without_colon_space() {
        assert!(try_parse_annotation("^^^ Foo msg").is_none());
        assert!(try_parse_annotation("^^^ Foo:msg").is_none());
    }

    // ---- parse_fixture tests ----

    #[test]
    fn parse_fixture_strips_annotations() {
        let raw = b"f(a,b);\n   ^ CommaSpacing: msg\ng();\n";
        let (clean, expected) = parse_fixture(raw);
        assert_eq!(clean, b"f(a,b);\ng();\n");
        assert_eq!(expected.len(), 1);
        assert_eq!(expected[0].line, 1);
        assert_eq!(expected[0].column, 4);
        assert_eq!(expected[0].cop_name, "CommaSpacing");
        assert_eq!(expected[0].message, "msg");
    }

    #[test]
    fn parse_fixture_multiple_annotations_same_line() {
        let raw = b"line1\n^ A: m1\n  ^ C: m2\nline2\n";
        let (clean, expected) = parse_fixture(raw);
        assert_eq!(clean, b"line1\nline2\n");
        assert_eq!(expected.len(), 2);
        assert_eq!(expected[0].line, 1);
        assert_eq!(expected[0].column, 1);
        assert_eq!(expected[1].line, 1);
        assert_eq!(expected[1].column, 3);
    }

    #[test]
    fn parse_fixture_no_annotations() {
        let raw = b"f(a, b);\n";
        let (clean, expected) = parse_fixture(raw);
        assert_eq!(clean, b"f(a, b);\n");
        assert!(expected.is_empty());
    }

    #[test]
    fn parse_fixture_no_trailing_newline() {
        let raw = b"f(a,b);\n   ^ A: m";
        let (clean, expected) = parse_fixture(raw);
        assert_eq!(clean, b"f(a,b);");
        assert_eq!(expected.len(), 1);
        assert_eq!(expected[0].line, 1);
    }

    #[test]
    fn parse_fixture_preserves_trailing_whitespace_in_source() {
        let raw = b"f(a ,   \n    ^ CommaSpacing: msg\n";
        let (clean, expected) = parse_fixture(raw);
        assert_eq!(clean, b"f(a ,   \n");
        assert_eq!(expected[0].column, 5);
    }

    #[test]
    #[should_panic(expected = "Annotation on raw line 1 appears before any source line")]
    fn parse_fixture_annotation_before_source_panics() {
        let raw = b"^ A: should panic\nx = 1;\n";
        parse_fixture(raw);
    }

    // ---- run_cop helper tests ----

    #[test]
    fn run_cop_returns_diagnostics() {
        let diags = run_cop(&CommaSpacing, b"f(a,b);\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].location.line, 1);
        assert_eq!(diags[0].location.column, 4);
        assert_eq!(diags[0].path, "test.cs");
        assert_eq!(diags[0].cop_name, "CommaSpacing");
    }

    #[test]
    fn run_cop_no_offenses_returns_empty() {
        assert!(run_cop(&CommaSpacing, b"f(a, b);\n").is_empty());
    }

    #[test]
    fn assert_helpers_accept_matching_fixture() {
        let fixture = b"f(a ,b);\n    ^ CommaSpacing: Commas must not be preceded by a space.\n    ^ CommaSpacing: Commas must be followed by a space.\n";
        assert_cop_offenses(&CommaSpacing, fixture);
        assert_cop_autocorrect(&CommaSpacing, fixture, b"f(a, b);\n");
    }

    #[test]
    #[should_panic(expected = "Expected 1 offense(s) but got 0")]
    fn assert_cop_offenses_reports_missing() {
        let fixture = b"f(a, b);\n   ^ CommaSpacing: Commas must be followed by a space.\n";
        assert_cop_offenses(&CommaSpacing, fixture);
    }
}
