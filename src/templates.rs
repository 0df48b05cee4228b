//! Handlebars templates compiled into the binary.

use crate::error::Result;
use handlebars::Handlebars;

const TEMPLATES: &[(&str, &str)] = &[
    ("layout", include_str!("templates/layout.hbs")),
    ("login", include_str!("templates/login.hbs")),
    ("notice", include_str!("templates/notice.hbs")),
    ("pages/overview", include_str!("templates/pages/overview.hbs")),
    ("pages/live", include_str!("templates/pages/live.hbs")),
    ("pages/analytics", include_str!("templates/pages/analytics.hbs")),
    ("pages/predictions", include_str!("templates/pages/predictions.hbs")),
    ("pages/regions", include_str!("templates/pages/regions.hbs")),
    ("pages/feedback", include_str!("templates/pages/feedback.hbs")),
];

/// Register every template under its name
///
/// Strict mode stays off: optional keys such as `notice` are simply absent
/// from the data when there is nothing to show.
pub fn build_templates() -> Result<Handlebars<'static>> {
    let mut handlebars = Handlebars::new();
    for (name, source) in TEMPLATES {
        handlebars.register_template_string(name, *source)?;
    }
    Ok(handlebars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn all_templates_compile() {
        let handlebars = build_templates().unwrap();
        for (name, _) in TEMPLATES {
            assert!(handlebars.has_template(name), "missing {}", name);
        }
    }

    #[test]
    fn svg_is_not_escaped_but_text_is() {
        let handlebars = build_templates().unwrap();
        let html = handlebars
            .render(
                "pages/analytics",
                &json!({ "heatmap": "<svg></svg>", "anomaly_chart": "", "summary": [
                    { "anomaly": "<b>", "count": 1, "min": "0", "mean": "0", "max": "0" }
                ] }),
            )
            .unwrap();
        assert!(html.contains("<svg></svg>"));
        assert!(html.contains("&lt;b&gt;"));
    }

    #[test]
    fn login_switches_between_modes() {
        let handlebars = build_templates().unwrap();
        let login = handlebars.render("login", &json!({})).unwrap();
        assert!(login.contains("value=\"login\""));
        let register = handlebars.render("login", &json!({ "register": true })).unwrap();
        assert!(register.contains("value=\"register\""));
    }
}
