//! Line-level module checks
//!
//! The sandbox has no module loader, so import and export declarations are
//! rejected before any parsing happens. These checks look at line starts only
//! and do not care whether the rest of the text is well-formed.

use once_cell::sync::Lazy;
use regex::Regex;

static IMPORT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*import\b").expect("import pattern compiles"));

static EXPORT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*export\b").expect("export pattern compiles"));

/// Module construct that the boundary cannot execute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ModuleConstruct {
    /// `import ...`
    Import,
    /// `export ...`
    Export,
}

impl ModuleConstruct {
    fn keyword(self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Export => "export",
        }
    }

    fn hint(self, entry_symbol: &str) -> String {
        match self {
            Self::Import => {
                "React, ReactDOM and the hooks are provided as globals; remove the import"
                    .to_string()
            }
            Self::Export => format!("declare a top-level function named {entry_symbol} instead"),
        }
    }
}

/// First module-level declaration found, in rule order (imports before exports)
pub(crate) fn find_module_construct(source: &str) -> Option<(ModuleConstruct, usize)> {
    [(ModuleConstruct::Import, &*IMPORT_LINE), (ModuleConstruct::Export, &*EXPORT_LINE)]
        .into_iter()
        .find_map(|(construct, pattern)| {
            pattern
                .find(source)
                .map(|m| (construct, line_of(source, m.start())))
        })
}

/// Reason string for a rejected module construct
pub(crate) fn module_reason(construct: ModuleConstruct, line: usize, entry_symbol: &str) -> String {
    format!(
        "{} statements are not allowed (line {line}): {}",
        construct.keyword(),
        construct.hint(entry_symbol)
    )
}

fn line_of(source: &str, offset: usize) -> usize {
    source[..offset].matches('\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_leading_import() {
        let src = "import React from 'react';\nfunction App() {}";
        assert_eq!(find_module_construct(src), Some((ModuleConstruct::Import, 1)));
    }

    #[test]
    fn finds_indented_export() {
        let src = "function App() {}\n\n    export default App;";
        assert_eq!(find_module_construct(src), Some((ModuleConstruct::Export, 3)));
    }

    #[test]
    fn import_wins_over_earlier_export() {
        let src = "export const a = 1;\nimport b from 'b';";
        assert_eq!(find_module_construct(src), Some((ModuleConstruct::Import, 2)));
    }

    #[test]
    fn identifiers_with_keyword_prefix_pass() {
        let src = "const important = 1;\nconst exported = important;\nimportant;";
        assert_eq!(find_module_construct(src), None);
    }

    #[test]
    fn keyword_mid_line_passes() {
        let src = "const label = 'import data'; // export later";
        assert_eq!(find_module_construct(src), None);
    }

    #[test]
    fn reason_names_the_construct() {
        let reason = module_reason(ModuleConstruct::Export, 7, "App");
        assert!(reason.starts_with("export statements are not allowed (line 7)"));
        assert!(reason.contains("function named App"));
    }
}
