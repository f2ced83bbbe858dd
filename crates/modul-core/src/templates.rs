//! Template registry shared by the prompt builder and the HTML exporter.
//!
//! Templates are kept in YAML files with the layout:
//!
//! ```yaml
//! version: "1.0"
//! templates:
//!   name:
//!     description: ...
//!     template: "Handlebars {{text}}"
//! ```
//!
//! Helpers registered on every renderer:
//! - join: join an array with a separator
//! - default: fallback when a value is empty
//! - eq: block equality comparison
//! - inc: 1-based numbering inside `{{#each}}`

use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext, Renderable,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Top-level templates file structure
#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesFile {
    pub version: String,
    pub templates: HashMap<String, Template>,
}

/// A single template definition
#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    pub description: String,
    pub template: String,
    #[serde(default)]
    pub example: Option<Value>,
}

impl TemplatesFile {
    /// Load templates from a YAML file
    pub fn load(path: &str) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read templates file: {}", e))?;
        Self::from_yaml(&content)
    }

    /// Parse templates from YAML content
    pub fn from_yaml(yaml: &str) -> Result<Self, String> {
        serde_yaml::from_str(yaml).map_err(|e| format!("Failed to parse templates YAML: {}", e))
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn list_templates(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// How rendered values are escaped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeMode {
    /// Plain text, used for prompts
    None,
    /// HTML entity escaping, used for export markup
    Html,
}

/// Compiled renderer with registered helpers
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
    templates: TemplatesFile,
}

impl TemplateRenderer {
    pub fn new(templates: TemplatesFile, escape: EscapeMode) -> Result<Self, String> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        match escape {
            EscapeMode::None => handlebars.register_escape_fn(handlebars::no_escape),
            EscapeMode::Html => handlebars.register_escape_fn(handlebars::html_escape),
        }

        handlebars.register_helper("join", Box::new(JoinHelper));
        handlebars.register_helper("default", Box::new(DefaultHelper));
        handlebars.register_helper("eq", Box::new(EqHelper));
        handlebars.register_helper("inc", Box::new(IncHelper));

        for (name, template) in &templates.templates {
            handlebars
                .register_template_string(name, &template.template)
                .map_err(|e| format!("Template '{}' does not compile: {}", name, e))?;
        }

        Ok(TemplateRenderer { handlebars, templates })
    }

    pub fn from_yaml(yaml: &str, escape: EscapeMode) -> Result<Self, String> {
        Self::new(TemplatesFile::from_yaml(yaml)?, escape)
    }

    /// Render a named template with data
    pub fn render(&self, template_name: &str, data: &Value) -> Result<String, String> {
        self.handlebars
            .render(template_name, data)
            .map_err(|e| format!("Render error in '{}': {}", template_name, e))
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }

    pub fn list_templates(&self) -> Vec<&str> {
        self.templates.list_templates()
    }
}

// ============================================================================
// Custom Helpers
// ============================================================================

/// Join an array with a separator (default ", ")
struct JoinHelper;

impl HelperDef for JoinHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let separator = h.param(1).and_then(|v| v.value().as_str()).unwrap_or(", ");

        if let Some(arr) = h.param(0).and_then(|v| v.value().as_array()) {
            let strings: Vec<String> = arr
                .iter()
                .map(|v| v.as_str().map(String::from).unwrap_or_else(|| v.to_string()))
                .collect();
            out.write(&strings.join(separator))?;
        }
        Ok(())
    }
}

/// `{{default value "fallback"}}`: fallback for null, empty strings and empty arrays
struct DefaultHelper;

impl HelperDef for DefaultHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let fallback = h.param(1).and_then(|v| v.value().as_str()).unwrap_or("");
        let rendered = match h.param(0).map(|v| v.value()) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => fallback.to_string(),
        };
        out.write(&rendered)?;
        Ok(())
    }
}

/// Block equality comparison: `{{#eq a "b"}}...{{else}}...{{/eq}}`
struct EqHelper;

impl HelperDef for EqHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let equal = match (h.param(0), h.param(1)) {
            (Some(l), Some(r)) => l.value() == r.value(),
            _ => false,
        };

        if equal {
            if let Some(template) = h.template() {
                template.render(r, ctx, rc, out)?;
            }
        } else if let Some(template) = h.inverse() {
            template.render(r, ctx, rc, out)?;
        }
        Ok(())
    }
}

/// `{{inc @index}}` → index + 1
struct IncHelper;

impl HelperDef for IncHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let n = h.param(0).and_then(|v| v.value().as_u64()).unwrap_or(0);
        out.write(&(n + 1).to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const YAML: &str = r#"
version: "1.0"
templates:
  list:
    description: Numbered list
    template: "{{#each items}}{{inc @index}}. {{this}}\n{{/each}}"
  fallback:
    description: Default helper
    template: "{{default name \"-\"}} <{{tag}}>"
  joined:
    description: Join helper
    template: "{{join items \" / \"}}"
"#;

    #[test]
    fn test_templates_file_parses() {
        let file = TemplatesFile::from_yaml(YAML).unwrap();
        assert_eq!(file.list_templates(), vec!["fallback", "joined", "list"]);
        assert!(TemplatesFile::from_yaml("templates: 3").is_err());
    }

    #[test]
    fn test_inc_numbers_from_one() {
        let renderer = TemplateRenderer::from_yaml(YAML, EscapeMode::None).unwrap();
        let out = renderer.render("list", &json!({"items": ["a", "b"]})).unwrap();
        assert_eq!(out, "1. a\n2. b\n");
    }

    #[test]
    fn test_escape_modes() {
        let plain = TemplateRenderer::from_yaml(YAML, EscapeMode::None).unwrap();
        let html = TemplateRenderer::from_yaml(YAML, EscapeMode::Html).unwrap();
        let data = json!({"name": "", "tag": "a&b"});

        assert_eq!(plain.render("fallback", &data).unwrap(), "- <a&b>");
        assert_eq!(html.render("fallback", &data).unwrap(), "- <a&amp;b>");
    }

    #[test]
    fn test_join_helper() {
        let renderer = TemplateRenderer::from_yaml(YAML, EscapeMode::None).unwrap();
        let out = renderer.render("joined", &json!({"items": ["x", 2]})).unwrap();
        assert_eq!(out, "x / 2");
    }
}
