use super::document::TemplateDocument;
use super::helpers::register_helpers;
use super::store::TemplateStore;
use super::{RenderedTemplate, Section};
use crate::error::{ParseCause, TemplateError};
use handlebars::{Context, Handlebars};
use serde::Serialize;

/// Resolves a template by name and renders its subject, plain-text and HTML
/// sections against one data value.
///
/// Nothing is cached: each call loads and parses the document again.
#[derive(Debug, Clone)]
pub struct TemplateRenderer<S> {
    store: S,
}

impl<S: TemplateStore> TemplateRenderer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Render `subject`, `plainBody` and `htmlBody`, in that order.
    ///
    /// The first failing section aborts the render; later sections are not
    /// attempted.
    pub async fn render<D>(&self, template: &str, data: &D) -> Result<RenderedTemplate, TemplateError>
    where
        D: Serialize + ?Sized,
    {
        let source = self.store.load(template).await?;
        let document = TemplateDocument::parse(template, &source)?;
        let mut handlebars = compile(&document)?;
        let context = Context::from(serde_json::to_value(data)?);

        tracing::debug!(template, "Rendering template sections");

        let subject = render_section(&handlebars, &document, Section::Subject, &context)?;
        let plain_body = render_section(&handlebars, &document, Section::PlainBody, &context)?;
        handlebars.register_escape_fn(handlebars::html_escape);
        let html_body = render_section(&handlebars, &document, Section::HtmlBody, &context)?;

        Ok(RenderedTemplate {
            subject: subject.trim().to_string(),
            plain_body,
            html_body,
        })
    }
}

/// Register every section of the document, failing on the first syntax error.
fn compile(document: &TemplateDocument) -> Result<Handlebars<'static>, TemplateError> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars.register_escape_fn(handlebars::no_escape);
    register_helpers(&mut handlebars);

    for (name, body) in document.sections() {
        handlebars
            .register_template_string(name, body)
            .map_err(|e| TemplateError::Parse {
                template: document.name().to_string(),
                cause: ParseCause::Syntax {
                    section: name.to_string(),
                    source: e,
                },
            })?;
    }

    Ok(handlebars)
}

fn render_section(
    handlebars: &Handlebars<'_>,
    document: &TemplateDocument,
    section: Section,
    context: &Context,
) -> Result<String, TemplateError> {
    if !handlebars.has_template(section.name()) {
        return Err(TemplateError::SectionMissing {
            template: document.name().to_string(),
            section,
        });
    }

    handlebars
        .render_with_context(section.name(), context)
        .map_err(|e| {
            tracing::debug!(template = document.name(), %section, error = %e, "Section failed to render");
            TemplateError::Render {
                template: document.name().to_string(),
                section,
                source: e,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::MemoryTemplateStore;
    use serde_json::json;

    const WELCOME: &str = r#"
{{#*inline "subject"}}Welcome, {{Name}}{{/inline}}
{{#*inline "plainBody"}}Hi {{Name}}, thanks for joining.{{/inline}}
{{#*inline "htmlBody"}}<p>Hi {{Name}}</p>{{/inline}}
"#;

    fn renderer(name: &str, source: &str) -> TemplateRenderer<MemoryTemplateStore> {
        TemplateRenderer::new(MemoryTemplateStore::new().with_template(name, source))
    }

    #[tokio::test]
    async fn test_render_welcome() {
        let rendered = renderer("welcome", WELCOME)
            .render("welcome", &json!({"Name": "Ana"}))
            .await
            .unwrap();

        assert_eq!(
            rendered,
            RenderedTemplate {
                subject: "Welcome, Ana".to_string(),
                plain_body: "Hi Ana, thanks for joining.".to_string(),
                html_body: "<p>Hi Ana</p>".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_render_typed_data() {
        #[derive(Serialize)]
        struct Welcome<'a> {
            #[serde(rename = "Name")]
            name: &'a str,
        }

        let rendered = renderer("welcome", WELCOME)
            .render("welcome", &Welcome { name: "Ana" })
            .await
            .unwrap();
        assert_eq!(rendered.subject, "Welcome, Ana");
    }

    #[tokio::test]
    async fn test_render_is_repeatable() {
        let renderer = renderer("welcome", WELCOME);
        let data = json!({"Name": "Ana"});

        let first = renderer.render("welcome", &data).await.unwrap();
        let second = renderer.render("welcome", &data).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_template_not_found() {
        let err = renderer("welcome", WELCOME)
            .render("goodbye", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(name) if name == "goodbye"));
    }

    #[tokio::test]
    async fn test_html_section_failure_is_tagged() {
        let source = r#"
{{#*inline "subject"}}Welcome, {{Name}}{{/inline}}
{{#*inline "plainBody"}}Hi {{Name}}{{/inline}}
{{#*inline "htmlBody"}}<p>{{Missing}}</p>{{/inline}}
"#;
        let err = renderer("welcome", source)
            .render("welcome", &json!({"Name": "Ana"}))
            .await
            .unwrap_err();

        assert!(matches!(err, TemplateError::Render { .. }));
        assert_eq!(err.section(), Some(Section::HtmlBody));
    }

    #[tokio::test]
    async fn test_earliest_failing_section_wins() {
        let source = r#"
{{#*inline "subject"}}{{NoSubject}}{{/inline}}
{{#*inline "plainBody"}}{{NoPlain}}{{/inline}}
"#;
        let err = renderer("broken", source)
            .render("broken", &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.section(), Some(Section::Subject));
    }

    #[tokio::test]
    async fn test_missing_section() {
        let source = r#"
{{#*inline "subject"}}Hello{{/inline}}
{{#*inline "htmlBody"}}<p>Hello</p>{{/inline}}
"#;
        let err = renderer("partial", source)
            .render("partial", &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TemplateError::SectionMissing {
                section: Section::PlainBody,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_syntax_error_aborts_before_rendering() {
        let source = r#"
{{#*inline "subject"}}{{Missing}}{{/inline}}
{{#*inline "htmlBody"}}{{#if Name}}<p>mismatched{{/each}}{{/inline}}
"#;
        let err = renderer("broken", source)
            .render("broken", &json!({}))
            .await
            .unwrap_err();

        match err {
            TemplateError::Parse { template, cause } => {
                assert_eq!(template, "broken");
                assert!(matches!(cause, ParseCause::Syntax { section, .. } if section == "htmlBody"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_html_is_escaped_only_in_html_body() {
        let source = r#"
{{#*inline "subject"}}{{Name}}{{/inline}}
{{#*inline "plainBody"}}{{Name}}{{/inline}}
{{#*inline "htmlBody"}}{{Name}} {{{Name}}}{{/inline}}
"#;
        let rendered = renderer("escape", source)
            .render("escape", &json!({"Name": "Tom & Jerry"}))
            .await
            .unwrap();

        assert_eq!(rendered.subject, "Tom & Jerry");
        assert_eq!(rendered.plain_body, "Tom & Jerry");
        assert_eq!(rendered.html_body, "Tom &amp; Jerry Tom & Jerry");
    }

    #[tokio::test]
    async fn test_shared_partials_and_loops() {
        let source = r#"
{{#*inline "footer"}}-- The {{Team}} team{{/inline}}
{{#*inline "subject"}}
  Your {{upper Plan}} receipt
{{/inline}}
{{#*inline "plainBody"}}{{#each Items}}{{this}};{{/each}} {{> footer}}{{/inline}}
{{#*inline "htmlBody"}}{{#if Items}}<ul>{{#each Items}}<li>{{this}}</li>{{/each}}</ul>{{/if}}{{/inline}}
"#;
        let rendered = renderer("receipt", source)
            .render(
                "receipt",
                &json!({"Plan": "pro", "Team": "Postbox", "Items": ["a", "b"]}),
            )
            .await
            .unwrap();

        assert_eq!(rendered.subject, "Your PRO receipt");
        assert_eq!(rendered.plain_body, "a;b; -- The Postbox team");
        assert_eq!(rendered.html_body, "<ul><li>a</li><li>b</li></ul>");
    }
}
