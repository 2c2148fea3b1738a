//! Theme engine
//!
//! This module provides template rendering using Tera.
//! Features:
//! - Built-in templates compiled into the binary
//! - Per-template overrides loaded from a directory
//! - Standard template variables (current user, request path, year)
//! - Plain HTML fallback when an error page itself cannot be rendered

use anyhow::{Context, Result};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context as TeraContext, Tera};

use crate::models::User;

mod error;

pub use error::ThemeError;

/// Templates shipped with the binary, in load order
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../../templates/base.html")),
    (
        "includes/comment_form.html",
        include_str!("../../templates/includes/comment_form.html"),
    ),
    (
        "includes/form_errors.html",
        include_str!("../../templates/includes/form_errors.html"),
    ),
    ("home.html", include_str!("../../templates/home.html")),
    ("detail.html", include_str!("../../templates/detail.html")),
    (
        "comment_edit.html",
        include_str!("../../templates/comment_edit.html"),
    ),
    (
        "comment_delete.html",
        include_str!("../../templates/comment_delete.html"),
    ),
    ("login.html", include_str!("../../templates/login.html")),
    ("logout.html", include_str!("../../templates/logout.html")),
    ("signup.html", include_str!("../../templates/signup.html")),
    ("404.html", include_str!("../../templates/404.html")),
    ("500.html", include_str!("../../templates/500.html")),
];

/// Theme engine for rendering templates
pub struct ThemeEngine {
    /// Tera template engine instance
    tera: Tera,
    /// Directory whose `.html` files replace built-in templates of the same name
    override_path: Option<PathBuf>,
}

impl ThemeEngine {
    /// Create a theme engine from the built-in templates, then apply any
    /// overrides found under `override_path`.
    pub fn new(override_path: Option<&Path>) -> Result<Self> {
        let override_path = override_path.map(Path::to_path_buf);
        let tera = load_templates(override_path.as_deref())?;

        tracing::debug!(
            "Theme engine ready with {} templates",
            tera.get_template_names().count()
        );

        Ok(Self {
            tera,
            override_path,
        })
    }

    /// Theme engine with only the built-in templates
    pub fn builtin() -> Result<Self> {
        Self::new(None)
    }

    /// Re-read the override directory
    pub fn reload_templates(&mut self) -> Result<()> {
        self.tera = load_templates(self.override_path.as_deref())?;
        Ok(())
    }

    /// Render a template with context
    ///
    /// # Arguments
    /// * `template` - Template name (e.g., "home.html", "detail.html")
    /// * `context` - Tera context with template variables
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String> {
        self.tera.render(template, context).map_err(|e| {
            let mut error_msg = format!("Failed to render '{}': {}", template, e);
            let mut source = e.source();
            while let Some(s) = source {
                error_msg.push_str(&format!("\n  Caused by: {}", s));
                source = s.source();
            }
            ThemeError::TemplateError(error_msg).into()
        })
    }

    /// Render a page whose fields become the top-level template variables,
    /// with the standard variables added alongside.
    pub fn render_page<T: Serialize>(
        &self,
        template: &str,
        page: &T,
        standard_vars: &StandardTemplateVars,
    ) -> Result<String> {
        let mut context = TeraContext::from_serialize(page)
            .map_err(|e| ThemeError::TemplateError(format!("Invalid page context: {}", e)))?;
        standard_vars.apply(&mut context);

        self.render(template, &context)
    }

    /// Render a template, falling back to a plain HTML page on error.
    ///
    /// Used for error pages, which must always produce a body.
    pub fn render_with_fallback(&self, template: &str, context: &TeraContext) -> String {
        match self.render(template, context) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(
                    "Failed to render template '{}': {}, returning simple HTML page",
                    template,
                    e
                );
                Self::simple_error_page(template)
            }
        }
    }

    /// Last-resort page when a template cannot be rendered
    fn simple_error_page(template: &str) -> String {
        let title = match template {
            "404.html" => "Страница не найдена",
            _ => "Ошибка сервера",
        };
        format!(
            r#"<!DOCTYPE html>
<html lang="ru">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
</head>
<body>
    <h1>{title}</h1>
    <p><a href="/">На главную</a></p>
</body>
</html>"#
        )
    }

    /// Whether a template with this name is loaded
    pub fn has_template(&self, template: &str) -> bool {
        self.tera.get_template_names().any(|name| name == template)
    }

    pub fn override_path(&self) -> Option<&Path> {
        self.override_path.as_deref()
    }
}

/// Built-in templates with overrides applied on top
fn load_templates(override_path: Option<&Path>) -> Result<Tera> {
    let mut templates: Vec<(String, String)> = BUILTIN_TEMPLATES
        .iter()
        .map(|(name, content)| (name.to_string(), content.to_string()))
        .collect();

    if let Some(path) = override_path {
        if !path.is_dir() {
            return Err(ThemeError::NotFound(path.display().to_string()).into());
        }

        let mut overrides = Vec::new();
        collect_templates_from_dir(path, path, &mut overrides)?;
        for (name, content) in overrides {
            tracing::info!("Using template override: {}", name);
            match templates.iter_mut().find(|(existing, _)| *existing == name) {
                Some(slot) => slot.1 = content,
                None => templates.push((name, content)),
            }
        }
    }

    let mut tera = Tera::default();
    tera.add_raw_templates(templates)
        .map_err(|e| ThemeError::TemplateError(format!("Failed to load templates: {}", e)))?;

    Ok(tera)
}

/// Collect `.html` files below `current_path`, named relative to `base_path`
fn collect_templates_from_dir(
    base_path: &Path,
    current_path: &Path,
    templates: &mut Vec<(String, String)>,
) -> Result<()> {
    for entry in fs::read_dir(current_path)
        .with_context(|| format!("Failed to read template directory: {:?}", current_path))?
    {
        let path = entry?.path();

        if path.is_dir() {
            collect_templates_from_dir(base_path, &path, templates)?;
        } else if path.extension().is_some_and(|ext| ext == "html") {
            let relative_path = path.strip_prefix(base_path).map_err(|_| {
                ThemeError::TemplateError("Failed to get relative path".to_string())
            })?;

            // Forward slashes regardless of platform
            let template_name = relative_path.to_string_lossy().replace('\\', "/");

            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read template: {:?}", path))?;

            templates.push((template_name, content));
        }
    }

    Ok(())
}

/// Variables available to every template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardTemplateVars {
    /// Current logged-in user (optional)
    pub current_user: Option<CurrentUser>,
    /// Current request path
    pub request_path: String,
    /// Current year (for the footer)
    pub year: i32,
}

/// Current user information for templates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

impl StandardTemplateVars {
    pub fn new(request_path: impl Into<String>) -> Self {
        Self {
            current_user: None,
            request_path: request_path.into(),
            year: chrono::Utc::now().year(),
        }
    }

    pub fn with_user(mut self, user: Option<&User>) -> Self {
        self.current_user = user.map(CurrentUser::from);
        self
    }

    /// Insert the variables into a Tera context
    pub fn apply(&self, context: &mut TeraContext) {
        context.insert("current_user", &self.current_user);
        context.insert("request_path", &self.request_path);
        context.insert("year", &self.year);
    }
}
