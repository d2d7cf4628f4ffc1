//! HTML presentation over embedded Handlebars templates.
//!
//! Templates are compiled into the binary with `include_str!` and registered
//! once at startup; a registration failure is a packaging bug and aborts
//! startup rather than surfacing per-request.

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::ReportResult;

pub struct Presenter {
    handlebars: Handlebars<'static>,
}

const TEMPLATES: &[(&str, &str)] = &[
    ("index", include_str!("../templates/index.hbs")),
    ("tagging", include_str!("../templates/tagging.hbs")),
    ("tls", include_str!("../templates/tls.hbs")),
    ("lb_types", include_str!("../templates/lb_types.hbs")),
    ("database", include_str!("../templates/database.hbs")),
    ("kms", include_str!("../templates/kms.hbs")),
    ("asg_dimensions", include_str!("../templates/asg_dimensions.hbs")),
    ("asg_empty", include_str!("../templates/asg_empty.hbs")),
    ("details", include_str!("../templates/details.hbs")),
    ("policies", include_str!("../templates/policies.hbs")),
    ("policy", include_str!("../templates/policy.hbs")),
    ("not_found", include_str!("../templates/not_found.hbs")),
];

const PARTIALS: &[(&str, &str)] = &[
    ("page_head", include_str!("../templates/partials/page_head.hbs")),
    ("page_foot", include_str!("../templates/partials/page_foot.hbs")),
    ("pagination", include_str!("../templates/partials/pagination.hbs")),
];

impl Presenter {
    pub fn new() -> anyhow::Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_helper("urlencode", Box::new(urlencode_helper));
        for (name, source) in PARTIALS {
            handlebars.register_partial(name, source)?;
        }
        for (name, source) in TEMPLATES {
            handlebars.register_template_string(name, source)?;
        }
        Ok(Self { handlebars })
    }

    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> ReportResult<String> {
        Ok(self.handlebars.render(template, data)?)
    }
}

// ============================================================================
// Handlebars helpers
// ============================================================================

/// Percent-encode a value for use inside a query string.
fn urlencode_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let raw = h
        .param(0)
        .map(|p| p.value().clone())
        .unwrap_or_default();
    let text = match raw {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    };
    out.write(&urlencoding::encode(&text))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn all_templates_register() {
        assert!(Presenter::new().is_ok());
    }

    #[test]
    fn urlencode_helper_escapes_link_parameters() {
        let presenter = Presenter::new().unwrap();
        let html = presenter
            .render("policies", &json!({ "title": "Policies", "policies": ["tag policy"] }))
            .unwrap();
        assert!(html.contains("/policies/tag%20policy"));
    }

    #[test]
    fn renders_the_not_found_page() {
        let presenter = Presenter::new().unwrap();
        let html = presenter
            .render("not_found", &json!({ "title": "Not Found", "path": "/policies/nope" }))
            .unwrap();
        assert!(html.contains("/policies/nope"));
    }
}
