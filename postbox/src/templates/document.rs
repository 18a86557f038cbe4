use crate::error::{ParseCause, TemplateError};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?s)\{\{~?!--.*?--~?\}\}|\{\{~?!.*?\}\}"#,
        r#"|(?P<open>\{\{~?#\*inline\s+"(?P<name>[^"]+)"\s*(?P<open_trim>~)?\}\})"#,
        r#"|(?P<close>\{\{(?P<close_trim>~)?/inline\s*~?\}\})"#,
    ))
    .expect("section token pattern is valid")
});

/// A template source split into its named sections.
///
/// Sections are declared with Handlebars inline-partial tags:
///
/// ```text
/// {{#*inline "subject"}}Welcome, {{Name}}{{/inline}}
/// {{#*inline "plainBody"}}
/// Hi {{Name}}, thanks for joining.
/// {{/inline}}
/// ```
///
/// Text between sections and top-level comments are ignored. Inline partials
/// nested inside a section stay part of that section's source. A `~` on the
/// inner side of a section tag trims whitespace from that end of the body.
#[derive(Debug, Clone)]
pub struct TemplateDocument {
    name: String,
    sections: BTreeMap<String, String>,
}

impl TemplateDocument {
    pub fn parse(name: &str, source: &str) -> Result<Self, TemplateError> {
        let parse_error = |cause| TemplateError::Parse {
            template: name.to_string(),
            cause,
        };

        let mut sections = BTreeMap::new();
        let mut open: Option<OpenSection> = None;

        for caps in TOKEN.captures_iter(source) {
            let Some(token) = caps.get(0) else {
                continue;
            };
            let opening = caps.name("name").map(|m| m.as_str());
            if opening.is_none() && caps.name("close").is_none() {
                // comment
                continue;
            }

            match open.as_mut() {
                None => match opening {
                    Some(section) => {
                        let trim_start = caps.name("open_trim").is_some();
                        let start = if trim_start {
                            token.end()
                        } else {
                            skip_line_break(source, token.end())
                        };
                        open = Some(OpenSection {
                            name: section.to_string(),
                            start,
                            depth: 1,
                            trim_start,
                        });
                    }
                    None => return Err(parse_error(ParseCause::UnexpectedClose(token.start()))),
                },
                Some(section) => {
                    if opening.is_some() {
                        section.depth += 1;
                        continue;
                    }
                    section.depth -= 1;
                    if section.depth > 0 {
                        continue;
                    }

                    let mut body = &source[section.start..token.start()];
                    if section.trim_start {
                        body = body.trim_start();
                    }
                    if caps.name("close_trim").is_some() {
                        body = body.trim_end();
                    }
                    let body = body.to_string();
                    let name = std::mem::take(&mut section.name);
                    open = None;

                    if sections.contains_key(&name) {
                        return Err(parse_error(ParseCause::DuplicateSection(name)));
                    }
                    sections.insert(name, body);
                }
            }
        }

        if let Some(section) = open {
            return Err(parse_error(ParseCause::UnterminatedSection(section.name)));
        }

        Ok(Self {
            name: name.to_string(),
            sections,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn section(&self, section: &str) -> Option<&str> {
        self.sections.get(section).map(String::as_str)
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sections
            .iter()
            .map(|(name, body)| (name.as_str(), body.as_str()))
    }
}

struct OpenSection {
    name: String,
    start: usize,
    depth: usize,
    trim_start: bool,
}

fn skip_line_break(source: &str, at: usize) -> usize {
    let rest = &source[at..];
    if rest.starts_with("\r\n") {
        at + 2
    } else if rest.starts_with('\n') {
        at + 1
    } else {
        at
    }
}
