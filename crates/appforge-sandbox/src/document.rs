//! Sandbox host document synthesis
//!
//! Builds a complete HTML document that runs one validated artifact. The
//! document is rebuilt from scratch for every mount; nothing from a previous
//! generation is reused.
//!
//! Execution order inside the boundary:
//! 1. boot payload (generation, entry symbol, artifact text as a JSON string)
//! 2. global traps: `window.onerror` (suppresses default surfacing) and
//!    `unhandledrejection`
//! 3. runtime scripts: React, ReactDOM, Babel standalone, Tailwind
//! 4. boot: READY, then compile and evaluate the artifact inside try/catch,
//!    then mount the entry symbol inside an error boundary with a mount probe
//!    that emits RENDERED once the tree commits

use crate::config::RuntimeAssets;
use crate::error::SandboxError;
use crate::html::{escape_html, script_json};
use appforge_artifact::CodeArtifact;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt::Write;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier pattern compiles")
});

/// Runtime installed in every boundary; reads `window.__APPFORGE_BOOT__`
const BOUNDARY_RUNTIME: &str = r#"(function () {
  'use strict';
  var cfg = window.__APPFORGE_BOOT__;
  var pass = { failed: false, rendered: false, seen: typeof WeakSet === 'function' ? new WeakSet() : null };

  function post(type, extra) {
    var message = { type: type, generation: cfg.generation };
    if (extra) {
      for (var key in extra) { message[key] = extra[key]; }
    }
    try { window.parent.postMessage(message, '*'); } catch (ignored) {}
  }

  function describe(error) {
    if (error && typeof error === 'object') {
      return { message: String(error.message || error), stack: error.stack ? String(error.stack) : null };
    }
    return { message: String(error), stack: null };
  }

  function report(error) {
    if (error && typeof error === 'object' && pass.seen) {
      if (pass.seen.has(error)) { return; }
      pass.seen.add(error);
    }
    pass.failed = true;
    var detail = describe(error);
    var payload = { message: detail.message };
    if (detail.stack) { payload.stack = detail.stack; }
    post('ERROR', payload);
  }

  function fallback(error) {
    var root = document.getElementById('root');
    if (!root || root.childNodes.length > 0) { return; }
    var box = document.createElement('div');
    box.setAttribute('data-testid', 'runtime-error');
    box.setAttribute('style', 'margin:16px;padding:16px;border:1px solid #fca5a5;border-radius:6px;background:#fef2f2;color:#b91c1c;font-family:sans-serif');
    box.textContent = 'Runtime Error: ' + describe(error).message;
    root.appendChild(box);
  }

  window.onerror = function (message, source, line, column, error) {
    var cause = error || message;
    report(cause);
    fallback(cause);
    return true;
  };

  window.addEventListener('unhandledrejection', function (event) {
    report(event.reason);
  });

  function mount(Entry) {
    var React = window.React;
    var h = React.createElement;

    class ErrorBoundary extends React.Component {
      constructor(props) {
        super(props);
        this.state = { error: null };
      }
      static getDerivedStateFromError(error) {
        return { error: error };
      }
      componentDidCatch(error) {
        report(error);
      }
      render() {
        if (this.state.error) {
          return h('div', {
            'data-testid': 'runtime-error',
            className: 'm-4 p-4 rounded border border-red-300 bg-red-50 text-red-700'
          }, 'Runtime Error: ' + describe(this.state.error).message);
        }
        return this.props.children;
      }
    }

    function MountProbe() {
      React.useEffect(function () {
        var timer = setTimeout(function () {
          if (!pass.failed && !pass.rendered) {
            pass.rendered = true;
            post('RENDERED');
          }
        }, 0);
        return function () { clearTimeout(timer); };
      }, []);
      return null;
    }

    try {
      var root = window.ReactDOM.createRoot(document.getElementById('root'));
      root.render(h(ErrorBoundary, null, h(Entry), h(MountProbe)));
    } catch (error) {
      report(error);
      fallback(error);
    }
  }

  function boot() {
    if (!window.React || !window.ReactDOM || !window.Babel) {
      var missing = new Error('Runtime failed to load (React, ReactDOM or Babel is missing)');
      report(missing);
      fallback(missing);
      return;
    }
    post('READY');

    var Entry;
    try {
      var compiled = window.Babel.transform(cfg.source, {
        presets: ['react'],
        sourceType: 'script',
        filename: 'app.jsx'
      }).code;
      Entry = new Function(compiled + '\n;return typeof ' + cfg.entry + " === 'function' ? " + cfg.entry + ' : undefined;')();
      if (typeof Entry !== 'function') {
        throw new ReferenceError(cfg.entry + ' is not declared as a top-level function');
      }
    } catch (error) {
      report(error);
      fallback(error);
      return;
    }
    mount(Entry);
  }

  window.__appforge = { boot: boot, report: report };
})();"#;

#[derive(Serialize)]
struct BootPayload<'a> {
    generation: u64,
    entry: &'a str,
    hash: String,
    source: &'a str,
}

/// Synthesizes sandbox documents for validated artifacts
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    assets: RuntimeAssets,
    entry_symbol: String,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self {
            assets: RuntimeAssets::default(),
            entry_symbol: "App".to_string(),
        }
    }
}

impl DocumentBuilder {
    /// Create a builder
    ///
    /// # Errors
    /// Returns [`SandboxError::InvalidEntrySymbol`] unless `entry_symbol` is a plain identifier
    pub fn new(assets: RuntimeAssets, entry_symbol: impl Into<String>) -> Result<Self, SandboxError> {
        let entry_symbol = entry_symbol.into();
        if !IDENTIFIER.is_match(&entry_symbol) {
            return Err(SandboxError::InvalidEntrySymbol(entry_symbol));
        }
        Ok(Self {
            assets,
            entry_symbol,
        })
    }

    /// Entry symbol the boundary mounts
    #[inline]
    #[must_use]
    pub fn entry_symbol(&self) -> &str {
        &self.entry_symbol
    }

    /// Policy placed in the document's CSP meta tag
    #[must_use]
    pub fn content_security_policy(&self) -> String {
        let origins = self.assets.origins().join(" ");
        format!(
            "default-src 'none'; script-src 'unsafe-inline' 'unsafe-eval' {origins}; \
             style-src 'unsafe-inline' {origins}; img-src data: blob: https:; \
             font-src data: https:; connect-src 'none'; base-uri 'none'; form-action 'none'"
        )
    }

    /// Build the document for `artifact` at `generation`
    ///
    /// # Errors
    /// - [`SandboxError::NotValid`] unless the artifact passed validation
    /// - [`SandboxError::Encode`] if the payload cannot be serialized
    pub fn build(
        &self,
        artifact: &CodeArtifact,
        title: &str,
        generation: u64,
    ) -> Result<String, SandboxError> {
        if !artifact.is_valid() {
            return Err(SandboxError::NotValid {
                hash: artifact.hash(),
                state: artifact.state().clone(),
            });
        }

        let payload = script_json(&BootPayload {
            generation,
            entry: &self.entry_symbol,
            hash: artifact.hash().to_string(),
            source: artifact.source(),
        })?;

        let mut doc = String::with_capacity(artifact.source().len() + BOUNDARY_RUNTIME.len() + 2048);
        let _ = write!(
            doc,
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n\
             <meta charset=\"UTF-8\" />\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\" />\n\
             <meta http-equiv=\"Content-Security-Policy\" content=\"{csp}\" />\n\
             <meta name=\"appforge-generation\" content=\"{generation}\" />\n\
             <title>{title}</title>\n\
             <script>window.__APPFORGE_BOOT__ = {payload};</script>\n\
             <script>\n{runtime}\n</script>\n",
            csp = escape_html(&self.content_security_policy()),
            title = escape_html(title),
            runtime = BOUNDARY_RUNTIME,
        );

        let assets = &self.assets;
        for (url, crossorigin) in [
            (&assets.react_url, true),
            (&assets.react_dom_url, true),
            (&assets.babel_url, false),
            (&assets.tailwind_url, false),
        ] {
            let _ = writeln!(
                doc,
                "<script{} src=\"{}\"></script>",
                if crossorigin { " crossorigin" } else { "" },
                escape_html(url)
            );
        }

        doc.push_str(
            "</head>\n<body>\n<div id=\"root\"></div>\n\
             <script>window.__appforge.boot();</script>\n</body>\n</html>\n",
        );
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appforge_artifact::ValidationState;

    fn valid(source: &str) -> CodeArtifact {
        CodeArtifact::candidate(source, 1)
            .unwrap()
            .record_verdict(ValidationState::Valid)
            .unwrap()
    }

    #[test]
    fn traps_precede_runtime_and_boot() {
        let doc = DocumentBuilder::default()
            .build(&valid("function App() { return null; }"), "Demo", 1)
            .unwrap();
        let onerror = doc.find("window.onerror").unwrap();
        let rejection = doc.find("unhandledrejection").unwrap();
        let react = doc.find("react.production.min.js").unwrap();
        let boot = doc.find("window.__appforge.boot();").unwrap();
        assert!(onerror < react && rejection < react);
        assert!(react < boot);
    }

    #[test]
    fn invalid_artifact_is_refused() {
        let artifact = CodeArtifact::candidate("import x from 'y';", 1)
            .unwrap()
            .record_verdict(ValidationState::Invalid("import".into()))
            .unwrap();
        let err = DocumentBuilder::default().build(&artifact, "x", 1).unwrap_err();
        assert!(matches!(err, SandboxError::NotValid { .. }));

        let unchecked = CodeArtifact::candidate("function App() {}", 1).unwrap();
        assert!(DocumentBuilder::default().build(&unchecked, "x", 1).is_err());
    }

    #[test]
    fn script_close_in_artifact_is_neutralized() {
        let src = "function App() { return <p>{'</script><script>alert(1)</script>'}</p>; }";
        let doc = DocumentBuilder::default().build(&valid(src), "x", 1).unwrap();
        assert!(!doc.contains("alert(1)</script>"));
        assert!(doc.contains("\\u003c/script>"));
    }

    #[test]
    fn title_is_escaped() {
        let doc = DocumentBuilder::default()
            .build(&valid("function App() {}"), "<img src=x onerror=alert(1)>", 1)
            .unwrap();
        assert!(doc.contains("<title>&lt;img src=x onerror=alert(1)&gt;</title>"));
    }

    #[test]
    fn generation_is_embedded() {
        let builder = DocumentBuilder::default();
        let artifact = valid("function App() {}");
        let first = builder.build(&artifact, "x", 1).unwrap();
        let second = builder.build(&artifact, "x", 2).unwrap();
        assert!(first.contains("\"generation\":1,"));
        assert!(second.contains("\"generation\":2,"));
        assert_ne!(first, second);
    }

    #[test]
    fn csp_pins_runtime_hosts() {
        let csp = DocumentBuilder::default().content_security_policy();
        assert!(csp.starts_with("default-src 'none'; script-src 'unsafe-inline' 'unsafe-eval' https://unpkg.com https://cdn.tailwindcss.com;"));
        assert!(csp.contains("connect-src 'none'"));
    }

    #[test]
    fn entry_symbol_must_be_identifier() {
        assert!(DocumentBuilder::new(RuntimeAssets::default(), "Main").is_ok());
        assert!(matches!(
            DocumentBuilder::new(RuntimeAssets::default(), "App; alert(1)"),
            Err(SandboxError::InvalidEntrySymbol(_))
        ));
    }
}
