/// Declarative node metadata
///
/// Describes the node to the host UI: identity, credentials it requires,
/// its single `resource` dropdown, and the method names the host may invoke.
/// Serialized in the camelCase shape the host expects.

use crate::credentials::CREDENTIAL_NAME;
use serde::Serialize;
use serde_json::{json, Value};

/// Credential test method name registered by the node
pub const CREDENTIAL_TEST_METHOD: &str = "testApiConnectionTest";
/// Load-options method backing the `resource` dropdown
pub const LOAD_OPTIONS_METHOD: &str = "getApp";
/// List-search method returning agents with integer ids
pub const LIST_SEARCH_METHOD: &str = "agentsSearch";
/// Parameter holding the selected assignee id
pub const RESOURCE_PARAMETER: &str = "resource";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescription {
    pub display_name: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub group: Vec<&'static str>,
    pub version: u32,
    pub subtitle: &'static str,
    pub description: &'static str,
    pub defaults: NodeDefaults,
    pub inputs: Vec<&'static str>,
    pub outputs: Vec<&'static str>,
    pub credentials: Vec<NodeCredentialRef>,
    pub properties: Vec<NodeProperty>,
    pub methods: NodeMethods,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeDefaults {
    pub name: &'static str,
}

/// Reference to a credential type the node needs
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeCredentialRef {
    pub name: &'static str,
    pub required: bool,
    pub tested_by: &'static str,
}

/// Method names grouped the way the host dispatches them
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMethods {
    pub credential_test: Vec<&'static str>,
    pub load_options: Vec<&'static str>,
    pub list_search: Vec<&'static str>,
}

/// A single UI field, shared by node parameters and credential fields
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProperty {
    pub display_name: &'static str,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_options: Option<PropertyTypeOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub no_data_expression: bool,
    pub default: Value,
}

impl NodeProperty {
    pub fn new(display_name: &'static str, name: &'static str, kind: PropertyKind, default: Value) -> Self {
        Self {
            display_name,
            name,
            kind,
            type_options: None,
            description: None,
            no_data_expression: false,
            default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKind {
    String,
    Number,
    Options,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyTypeOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_options_method: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<bool>,
}

/// Build the node description served to the host
pub fn node_description() -> NodeDescription {
    NodeDescription {
        display_name: "Test Node",
        name: "Test",
        icon: "file:test.svg",
        group: vec!["transform"],
        version: 1,
        subtitle: "",
        description: "Test node thooi",
        defaults: NodeDefaults {
            name: "Xin chao",
        },
        inputs: vec!["main"],
        outputs: vec!["main"],
        credentials: vec![NodeCredentialRef {
            name: CREDENTIAL_NAME,
            required: true,
            tested_by: CREDENTIAL_TEST_METHOD,
        }],
        properties: vec![NodeProperty {
            type_options: Some(PropertyTypeOptions {
                load_options_method: Some(LOAD_OPTIONS_METHOD),
                ..Default::default()
            }),
            description: Some("Gán nhà cung cấp"),
            no_data_expression: true,
            ..NodeProperty::new("Nhà cung cấp", RESOURCE_PARAMETER, PropertyKind::Options, json!(""))
        }],
        methods: NodeMethods {
            credential_test: vec![CREDENTIAL_TEST_METHOD],
            load_options: vec![LOAD_OPTIONS_METHOD],
            list_search: vec![LIST_SEARCH_METHOD],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_dropdown_is_backed_by_get_app() {
        let desc = serde_json::to_value(node_description()).unwrap();
        let resource = &desc["properties"][0];
        assert_eq!(resource["name"], "resource");
        assert_eq!(resource["type"], "options");
        assert_eq!(resource["typeOptions"]["loadOptionsMethod"], "getApp");
        assert_eq!(resource["noDataExpression"], true);
        assert_eq!(resource["default"], "");
    }

    #[test]
    fn credential_is_required_and_tested() {
        let desc = serde_json::to_value(node_description()).unwrap();
        assert_eq!(desc["credentials"][0]["name"], "testApi");
        assert_eq!(desc["credentials"][0]["required"], true);
        assert_eq!(desc["credentials"][0]["testedBy"], "testApiConnectionTest");
        assert_eq!(desc["inputs"], json!(["main"]));
    }

    #[test]
    fn host_facing_strings_match_the_published_node() {
        let desc = serde_json::to_value(node_description()).unwrap();
        assert_eq!(desc["description"], "Test node thooi");
        assert_eq!(desc["defaults"]["name"], "Xin chao");
        assert_eq!(desc["properties"][0]["displayName"], "Nhà cung cấp");
        assert_eq!(desc["properties"][0]["description"], "Gán nhà cung cấp");
    }
}
