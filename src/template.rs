//! Rendering of the systemd unit from its template.
//!
//! Templates use `{{NAME}}` tokens. The accepted names are exactly the
//! variants of [`Placeholder`], and each variant maps onto one field of
//! [`UnitValues`], so adding a placeholder without a value fails to compile
//! and a template using an unknown placeholder fails to render.
use std::{fs, path::Path, str::FromStr, sync::OnceLock};

use regex::{Captures, Regex};
use strum_macros::{AsRefStr, EnumIter, EnumString};

use crate::config::Config;
use crate::error::TemplateError;

/// Placeholder names understood by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Placeholder {
    User,
    Workdir,
    Envfile,
    Python,
    Script,
}

impl Placeholder {
    /// The literal token as it appears in a template, e.g. `{{USER}}`.
    pub fn token(&self) -> String {
        format!("{{{{{}}}}}", self.as_ref())
    }
}

/// Values substituted into the unit template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitValues {
    pub user: String,
    pub workdir: String,
    pub envfile: String,
    pub python: String,
    pub script: String,
}

impl UnitValues {
    /// Collects the values for `config`.
    pub fn from_config(config: &Config) -> Self {
        let runtime = &config.runtime;
        Self {
            user: runtime.invoking_user.clone(),
            workdir: runtime.repo_root.display().to_string(),
            envfile: config.identity.env_file_path.display().to_string(),
            python: runtime.interpreter_path.display().to_string(),
            script: runtime.entrypoint_path.display().to_string(),
        }
    }

    /// Value bound to `placeholder`.
    pub fn value(&self, placeholder: Placeholder) -> &str {
        match placeholder {
            Placeholder::User => &self.user,
            Placeholder::Workdir => &self.workdir,
            Placeholder::Envfile => &self.envfile,
            Placeholder::Python => &self.python,
            Placeholder::Script => &self.script,
        }
    }
}

/// Rendered unit file text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDescriptor(String);

impl UnitDescriptor {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{(.*?)\}\}").expect("placeholder pattern is valid")
    })
}

/// Names of every `{{NAME}}` token in `text`, in order of appearance.
pub fn placeholders(text: &str) -> Vec<String> {
    token_pattern()
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Fails on the first token that is not a known [`Placeholder`].
pub fn validate(text: &str) -> Result<(), TemplateError> {
    match placeholders(text)
        .into_iter()
        .find(|name| Placeholder::from_str(name).is_err())
    {
        Some(name) => Err(TemplateError::UnknownPlaceholder { name }),
        None => Ok(()),
    }
}

/// Validates `template` and replaces every placeholder token literally.
///
/// Substitution is a single pass over the template, so tokens that appear
/// inside a substituted value are left as they are.
pub fn render_str(template: &str, values: &UnitValues) -> Result<UnitDescriptor, TemplateError> {
    validate(template)?;

    let rendered = token_pattern().replace_all(template, |caps: &Captures| {
        match Placeholder::from_str(&caps[1]) {
            Ok(placeholder) => values.value(placeholder).to_string(),
            Err(_) => caps[0].to_string(),
        }
    });
    Ok(UnitDescriptor(rendered.into_owned()))
}

/// Reads the template at `path` and renders it.
pub fn render(path: &Path, values: &UnitValues) -> Result<UnitDescriptor, TemplateError> {
    let template = fs::read_to_string(path).map_err(|source| TemplateError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    render_str(&template, values)
}
