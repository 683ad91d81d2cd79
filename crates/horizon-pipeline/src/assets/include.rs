//! `#include` substitution for fragment sources.
//!
//! `#include <path>` (angle brackets, quotes and a trailing `;` are optional)
//! is replaced by the text of the referenced file. Resolution is a single
//! level: included text is not scanned again. A missing include drops the
//! directive and logs a warning.

use super::{AssetSource, SHADER_EXTENSION};

const DIRECTIVE: &str = "#include";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Directive<'a> {
    /// Exact text to substitute, from `#include` to the end of the line.
    text: &'a str,
    argument: &'a str,
}

fn find_directives(code: &str) -> Vec<Directive<'_>> {
    let mut found = Vec::new();
    for line in code.lines() {
        let mut rest = line;
        while let Some(pos) = rest.find(DIRECTIVE) {
            let tail = &rest[pos + DIRECTIVE.len()..];
            let argument = tail.trim_start();
            if argument.len() < tail.len() && !argument.is_empty() {
                found.push(Directive {
                    text: &rest[pos..],
                    argument,
                });
                break;
            }
            rest = tail;
        }
    }
    found
}

/// Maps an include argument to a path under the shader root.
///
/// `../x` and `/x` resolve to `x`; a bare `x` stays relative to the root.
/// The shader extension is appended when missing.
pub fn resolve_include_path(argument: &str) -> String {
    let cleaned: String = argument
        .trim()
        .chars()
        .filter(|c| !matches!(c, ';' | '<' | '>' | '"' | '\''))
        .collect();
    let cleaned = cleaned.trim();

    let mut path = cleaned;
    while let Some(stripped) = path.strip_prefix("../") {
        path = stripped;
    }
    let path = path.trim_start_matches('/');

    if path.ends_with(SHADER_EXTENSION) {
        path.to_string()
    } else {
        format!("{path}{SHADER_EXTENSION}")
    }
}

/// Replaces every include directive in `code` with the fetched file.
pub async fn process_includes<S: AssetSource + ?Sized>(source: &S, code: &str) -> String {
    let directives = find_directives(code);
    if directives.is_empty() {
        return code.to_string();
    }

    let mut out = code.to_string();
    for directive in directives {
        let path = resolve_include_path(directive.argument);
        let replacement = match source.fetch(&path).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("could not load include `{path}`: {e}");
                String::new()
            }
        };
        out = out.replacen(directive.text, &replacement, 1);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssets;

    #[test]
    fn include_paths_resolve_under_root() {
        assert_eq!(resolve_include_path("../includes/perlin;"), "includes/perlin.wgsl");
        assert_eq!(resolve_include_path(" includes/perlin.wgsl "), "includes/perlin.wgsl");
        assert_eq!(resolve_include_path("<includes/remap>"), "includes/remap.wgsl");
        assert_eq!(resolve_include_path("\"/includes/remap\""), "includes/remap.wgsl");
    }

    #[test]
    fn directive_needs_an_argument() {
        assert!(find_directives("#include\nfn f() {}").is_empty());
        assert!(find_directives("#includes/x").is_empty());

        let found = find_directives("a\n  #include   ../x;\nb");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "#include   ../x;");
        assert_eq!(found[0].argument, "../x;");
    }

    #[test]
    fn missing_include_is_dropped() {
        let assets = MemoryAssets::new();
        let out = pollster::block_on(process_includes(&assets, "#include ../gone\nfn f() {}"));
        assert_eq!(out, "\nfn f() {}");
    }

    #[test]
    fn included_text_is_not_rescanned() {
        let mut assets = MemoryAssets::new();
        assets.insert("a.wgsl", "#include b\nfn a() {}");
        assets.insert("b.wgsl", "fn b() {}");

        let out = pollster::block_on(process_includes(&assets, "#include a\nfn main() {}"));
        assert_eq!(out, "#include b\nfn a() {}\nfn main() {}");
    }
}
