//! The interactive explorer page served to browsers.

use crate::convert;
use crate::graphql;
use crate::json_ext::Value;

/// The state the explorer page opens with.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExplorerPage<'a> {
    /// The operation text, if the request carried one.
    pub query: Option<&'a str>,
    /// The variables of the request.
    pub variables: Option<&'a graphql::Object>,
    /// The operation name of the request.
    pub operation_name: Option<&'a str>,
    /// The execution result, absent when there was nothing to execute.
    pub result: Option<&'a Value>,
}

/// Renders the explorer page.
pub trait ExplorerRenderer: Send + Sync + 'static {
    /// Render the full HTML document.
    fn render(&self, page: &ExplorerPage<'_>) -> String;
}

/// GraphiQL, loaded from a CDN and prefilled with the request.
#[derive(Clone, Copy, Debug, Default)]
pub struct GraphiQL;

impl ExplorerRenderer for GraphiQL {
    fn render(&self, page: &ExplorerPage<'_>) -> String {
        const TEMPLATE: &str = include_str!("../templates/graphiql.html");

        let variables = page.variables.map(|variables| {
            pretty(&convert::engine_to_host(graphql::Value::Object(
                variables.clone(),
            )))
        });
        let result = page.result.map(pretty);

        fill(TEMPLATE, |placeholder| match placeholder {
            "QUERY" => Some(script_string(page.query)),
            "VARIABLES" => Some(script_string(variables.as_deref())),
            "OPERATION_NAME" => Some(script_string(page.operation_name)),
            "RESULT" => Some(script_string(result.as_deref())),
            _ => None,
        })
    }
}

/// Replace every `{{NAME}}` of `template` in a single pass.
///
/// Substituted text is never scanned again. Unknown placeholders are kept.
fn fill(template: &str, value: impl Fn(&str) -> Option<String>) -> String {
    let mut filled = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        filled.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after
            .find("}}")
            .and_then(|end| value(&after[..end]).map(|text| (end, text)))
        {
            Some((end, text)) => {
                filled.push_str(&text);
                rest = &after[end + 2..];
            }
            None => {
                filled.push_str("{{");
                rest = after;
            }
        }
    }
    filled.push_str(rest);
    filled
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// A JavaScript string literal (or `null`) that is safe to inline in a `<script>` element.
fn script_string(text: Option<&str>) -> String {
    serde_json::to_string(&text)
        .unwrap_or_else(|_| "null".to_string())
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

#[cfg(test)]
mod tests {
    use serde_json_bytes::json;

    use super::*;

    #[test]
    fn prefills_the_page() {
        let variables = graphql::Object::from([("id".to_string(), graphql::Value::Int(1))]);
        let result = json!({ "data": { "hello": "world" } });
        let html = GraphiQL.render(&ExplorerPage {
            query: Some("{ hello }"),
            variables: Some(&variables),
            operation_name: Some("Hello"),
            result: Some(&result),
        });
        assert!(html.contains(r#"query: "{ hello }","#));
        assert!(html.contains(r#"operationName: "Hello","#));
        assert!(html.contains(r#"variables: "{\n  \"id\": 1\n}","#));
        assert!(html.contains(r#"\"hello\": \"world\""#));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn empty_page() {
        let html = GraphiQL.render(&ExplorerPage::default());
        assert!(html.contains("query: null,"));
        assert!(html.contains("var initialResult = null;"));
    }

    #[test]
    fn script_is_not_closed_early() {
        let html = GraphiQL.render(&ExplorerPage {
            query: Some("</script><script>alert(1)</script>"),
            ..Default::default()
        });
        assert!(!html.contains("</script><script>alert"));
        assert!(html.contains(
            r#"query: "\u003c/script\u003e\u003cscript\u003ealert(1)\u003c/script\u003e","#
        ));
    }

    #[test]
    fn placeholders_in_values_stay_text() {
        let html = GraphiQL.render(&ExplorerPage {
            query: Some("{{OPERATION_NAME}}"),
            operation_name: Some("+alert(document.domain)+"),
            ..Default::default()
        });
        assert!(html.contains(r#"query: "{{OPERATION_NAME}}","#));
        assert!(html.contains(r#"operationName: "+alert(document.domain)+","#));
        assert!(!html.contains(r#""+alert(document.domain)+"""#));
    }

    #[test]
    fn fill_keeps_unknown_placeholders() {
        let filled = fill("a {{X}} b {{Y}} {{unterminated", |name| {
            (name == "X").then(|| "{{Y}}".to_string())
        });
        assert_eq!(filled, "a {{Y}} b {{Y}} {{unterminated");
    }
}
