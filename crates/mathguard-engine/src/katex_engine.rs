use crate::{MacroMap, RenderEngine, RenderError, RenderOptions};
use ::katex::macros::MacroDefinition;
use ::katex::{KatexContext, ParseError, Settings, render_to_string};
use log::trace;
use once_cell::sync::Lazy;

/// Shared KaTeX context (functions, symbols, environments). Built once per process.
static KATEX: Lazy<KatexContext> = Lazy::new(KatexContext::default);

/// Deepest nesting of groups, `\left`..`\right` and `\begin`..`\end` handed to KaTeX.
///
/// KaTeX parses recursively; deeper input is rejected before it reaches the parser.
pub const MAX_NESTING: usize = 512;

/// Spans nested deeper than this are rendered on a separately allocated stack.
const SHALLOW_NESTING: usize = 32;
const RED_ZONE: usize = 256 * 1024;
const RENDER_STACK: usize = 64 * 1024 * 1024;

/// Renders with KaTeX and reports its parse errors.
///
/// Every call builds fresh [`Settings`] with `throw_on_error` set, the caller's display
/// mode and the caller's macros, so no definition leaks from one span to the next.
#[derive(Debug, Default, Clone, Copy)]
pub struct KatexEngine;

impl RenderEngine for KatexEngine {
    fn render(&self, math: &str, options: &RenderOptions<'_>) -> Result<(), RenderError> {
        trace!(
            "katex engine: {} bytes, display={}",
            math.len(),
            options.display_mode
        );

        let depth = match walk_nesting(math, MAX_NESTING) {
            Ok(depth) => depth,
            Err(position) => {
                return Err(RenderError {
                    message: format!(
                        "Too many nested groups (more than {MAX_NESTING}) at position {}",
                        position + 1
                    ),
                    position: Some(position),
                });
            }
        };

        let settings = settings(options);
        let render = || render_to_string(&KATEX, math, &settings);
        let rendered = if depth > SHALLOW_NESTING {
            stacker::grow(RENDER_STACK, render)
        } else {
            stacker::maybe_grow(RED_ZONE, RENDER_STACK, render)
        };

        rendered.map(drop).map_err(|error| RenderError::from(&error))
    }

    fn name(&self) -> &'static str {
        "katex"
    }
}

impl From<&ParseError> for RenderError {
    fn from(error: &ParseError) -> Self {
        Self {
            message: error.to_string(),
            position: error.position(),
        }
    }
}

fn settings(options: &RenderOptions<'_>) -> Settings {
    let builder = Settings::builder()
        .display_mode(options.display_mode)
        .throw_on_error(true);
    match options.macros {
        Some(macros) => builder.macros(katex_macros(macros)).build(),
        None => builder.build(),
    }
}

fn katex_macros(macros: &MacroMap) -> ::katex::macro_expander::MacroMap {
    macros
        .iter()
        .map(|(name, body)| {
            let name = if name.starts_with('\\') {
                name.clone()
            } else {
                format!("\\{name}")
            };
            (name, MacroDefinition::String(body.clone()))
        })
        .collect()
}

/// Deepest nesting in `math`, counting braces, `\left` and `\begin`.
///
/// Escaped braces (`\{`, `\}`) do not count. Unbalanced closers never take the depth
/// below zero.
///
/// ```
/// use mathguard_engine::nesting_depth;
///
/// assert_eq!(nesting_depth("x"), 0);
/// assert_eq!(nesting_depth(r"\frac{a}{b^{2}}"), 2);
/// assert_eq!(nesting_depth(r"\left( \{x\} \right)"), 1);
/// ```
pub fn nesting_depth(math: &str) -> usize {
    walk_nesting(math, usize::MAX).unwrap_or(usize::MAX)
}

/// Returns the deepest nesting, or the byte offset where it first exceeds `limit`.
fn walk_nesting(math: &str, limit: usize) -> Result<usize, usize> {
    let bytes = math.as_bytes();
    let mut depth = 0usize;
    let mut deepest = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        let opened = match bytes[i] {
            b'{' => Some(true),
            b'}' => Some(false),
            b'\\' => {
                let word_len = bytes[i + 1..]
                    .iter()
                    .take_while(|byte| byte.is_ascii_alphabetic())
                    .count();
                let word = &bytes[i + 1..i + 1 + word_len];
                let at = i;
                // Control symbols (`\{`, `\\`) skip exactly one more byte.
                i += 1 + word_len.max(1);
                match word {
                    b"left" | b"begin" => {
                        depth += 1;
                        if depth > limit {
                            return Err(at);
                        }
                        deepest = deepest.max(depth);
                    }
                    b"right" | b"end" => depth = depth.saturating_sub(1),
                    _ => {}
                }
                continue;
            }
            _ => None,
        };

        match opened {
            Some(true) => {
                depth += 1;
                if depth > limit {
                    return Err(i);
                }
                deepest = deepest.max(depth);
            }
            Some(false) => depth = depth.saturating_sub(1),
            None => {}
        }
        i += 1;
    }

    Ok(deepest)
}
