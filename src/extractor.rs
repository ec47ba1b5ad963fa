//! Pulls the project list out of the dashboard markup.
//!
//! The page embeds its data as JSON in the `data-props` attribute of a
//! single hydration root:
//!
//! ```html
//! <div id="workers/WorkerProjectsTable-hybrid-root"
//!      data-props='{"dashboardMerchTargeting":{"projects":[{"id":"101","name":"..."}]}}'>
//! ```
//!
//! Structural absence (no container, no attribute, broken JSON) is a
//! [`ParseFailure`]. Absent inner keys are read as an empty list.

use scraper::{Html, Selector};
use serde::Deserialize;
use std::sync::OnceLock;

use crate::error::ParseFailure;

const CONTAINER_SELECTOR: &str = r#"div[id="workers/WorkerProjectsTable-hybrid-root"]"#;
const PROPS_ATTR: &str = "data-props";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub name: String,
}

pub type ParseResult = Result<Vec<Project>, ParseFailure>;

#[derive(Debug, Deserialize)]
struct Props {
    #[serde(rename = "dashboardMerchTargeting", default)]
    targeting: Option<Targeting>,
}

#[derive(Debug, Deserialize)]
struct Targeting {
    #[serde(default)]
    projects: Option<Vec<RawProject>>,
}

#[derive(Debug, Deserialize)]
struct RawProject {
    id: RawId,
    name: String,
}

/// Ids show up as strings in current markup; older payloads used numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawProject> for Project {
    fn from(raw: RawProject) -> Self {
        let id = match raw.id {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        };
        Project { id, name: raw.name }
    }
}

fn container_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse(CONTAINER_SELECTOR).expect("container selector is valid"))
}

pub fn extract(markup: &str) -> ParseResult {
    let document = Html::parse_document(markup);
    let container = document
        .select(container_selector())
        .next()
        .ok_or(ParseFailure::ContainerMissing)?;
    let raw_props = container
        .value()
        .attr(PROPS_ATTR)
        .ok_or(ParseFailure::PropsMissing)?;

    decode_props(raw_props)
}

fn decode_props(raw: &str) -> ParseResult {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| ParseFailure::MalformedProps(e.to_string()))?;
    if !value.is_object() {
        return Err(ParseFailure::UnexpectedShape(
            "data-props is not a JSON object".into(),
        ));
    }

    let props: Props =
        serde_json::from_value(value).map_err(|e| ParseFailure::UnexpectedShape(e.to_string()))?;
    let projects = props
        .targeting
        .and_then(|t| t.projects)
        .unwrap_or_default();

    Ok(projects.into_iter().map(Project::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(props: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html><head><title>Projects</title></head>
<body>
  <nav>Dashboard</nav>
  <div id="workers/WorkerProjectsTable-hybrid-root" data-props='{props}'></div>
</body></html>"#
        )
    }

    #[test]
    fn extracts_projects() {
        let html = page(
            r#"{"dashboardMerchTargeting":{"projects":[{"id":"101","name":"Rate chatbot replies","pay":"$20/hr"},{"id":"205","name":"Code review"}]}}"#,
        );

        let projects = extract(&html).unwrap();
        assert_eq!(
            projects,
            vec![
                Project { id: "101".into(), name: "Rate chatbot replies".into() },
                Project { id: "205".into(), name: "Code review".into() },
            ]
        );
    }

    #[test]
    fn entity_encoded_props_are_decoded() {
        let html = r#"<div id="workers/WorkerProjectsTable-hybrid-root" data-props="{&quot;dashboardMerchTargeting&quot;:{&quot;projects&quot;:[{&quot;id&quot;:&quot;7&quot;,&quot;name&quot;:&quot;Q&amp;A&quot;}]}}"></div>"#;

        let projects = extract(html).unwrap();
        assert_eq!(projects, vec![Project { id: "7".into(), name: "Q&A".into() }]);
    }

    #[test]
    fn integer_ids_become_strings() {
        let html = page(r#"{"dashboardMerchTargeting":{"projects":[{"id":42,"name":"Audio"}]}}"#);

        assert_eq!(extract(&html).unwrap()[0].id, "42");
    }

    #[test]
    fn ids_beyond_i64_and_fractional_ids_are_kept() {
        let html = page(
            r#"{"dashboardMerchTargeting":{"projects":[{"id":18446744073709551615,"name":"Big"},{"id":3.5,"name":"Odd"}]}}"#,
        );

        let ids: Vec<String> = extract(&html).unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["18446744073709551615", "3.5"]);
    }

    #[test]
    fn missing_container_is_failure() {
        let html = "<html><body><form action=\"/login\">Sign in</form></body></html>";

        assert_eq!(extract(html), Err(ParseFailure::ContainerMissing));
    }

    #[test]
    fn empty_document_is_failure() {
        assert_eq!(extract(""), Err(ParseFailure::ContainerMissing));
    }

    #[test]
    fn container_with_other_tag_is_not_matched() {
        let html = r#"<span id="workers/WorkerProjectsTable-hybrid-root" data-props='{}'></span>"#;

        assert_eq!(extract(html), Err(ParseFailure::ContainerMissing));
    }

    #[test]
    fn missing_props_attribute_is_failure() {
        let html = r#"<div id="workers/WorkerProjectsTable-hybrid-root"></div>"#;

        assert_eq!(extract(html), Err(ParseFailure::PropsMissing));
    }

    #[test]
    fn malformed_json_is_failure() {
        let html = page(r#"{"dashboardMerchTargeting": {"projects": ["#);

        assert!(matches!(extract(&html), Err(ParseFailure::MalformedProps(_))));
    }

    #[test]
    fn non_object_props_is_failure() {
        let html = page(r#"[1, 2, 3]"#);

        assert!(matches!(extract(&html), Err(ParseFailure::UnexpectedShape(_))));
    }

    #[test]
    fn absent_inner_keys_mean_no_projects() {
        assert_eq!(extract(&page("{}")), Ok(vec![]));
        assert_eq!(extract(&page(r#"{"dashboardMerchTargeting":{}}"#)), Ok(vec![]));
        assert_eq!(
            extract(&page(r#"{"dashboardMerchTargeting":{"projects":null}}"#)),
            Ok(vec![])
        );
        assert_eq!(
            extract(&page(r#"{"dashboardMerchTargeting":{"projects":[]}}"#)),
            Ok(vec![])
        );
    }

    #[test]
    fn wrong_projects_type_is_failure() {
        let html = page(r#"{"dashboardMerchTargeting":{"projects":"none"}}"#);

        assert!(matches!(extract(&html), Err(ParseFailure::UnexpectedShape(_))));
    }

    #[test]
    fn entry_without_id_rejects_page() {
        let html = page(
            r#"{"dashboardMerchTargeting":{"projects":[{"id":"1","name":"A"},{"name":"B"}]}}"#,
        );

        assert!(matches!(extract(&html), Err(ParseFailure::UnexpectedShape(_))));
    }

    #[test]
    fn duplicate_ids_are_kept() {
        let html = page(
            r#"{"dashboardMerchTargeting":{"projects":[{"id":"1","name":"A"},{"id":"1","name":"A v2"}]}}"#,
        );

        assert_eq!(extract(&html).unwrap().len(), 2);
    }
}
