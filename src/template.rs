use handlebars::Handlebars;
use thiserror::Error;

use crate::panel::RenderContext;

const TEMPLATE_NAME: &str = "panel";

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("failed to compile template: {0}")]
    Compile(#[from] Box<handlebars::TemplateError>),

    #[error("failed to render template: {0}")]
    Render(#[from] Box<handlebars::RenderError>),
}

/// A compiled template: render context in, markup out.
pub type RenderFn = Box<dyn Fn(&RenderContext<'_>) -> Result<String, TemplateError>>;

/// Compile `template` into a render function.
///
/// The render context is exposed to the template as `ids` (the identity of the
/// current activation) and `data` (the store payload). Output is HTML-escaped
/// unless the template uses triple braces.
pub fn compile(template: &str) -> Result<RenderFn, TemplateError> {
    let mut registry = Handlebars::new();
    registry
        .register_template_string(TEMPLATE_NAME, template)
        .map_err(Box::new)?;

    Ok(Box::new(move |ctx: &RenderContext<'_>| {
        registry
            .render(TEMPLATE_NAME, ctx)
            .map_err(|e| TemplateError::Render(Box::new(e)))
    }))
}
