//! Serde model of the rule XML document.
//!
//! Attributes use quick-xml's `@` prefix. The same structs carry `schemars`
//! annotations so the parsed document can be checked against a generated
//! JSON Schema before it is compiled.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Root `<configuration>` element.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename = "configuration")]
pub struct RuleDocument {
    /// Transaction code aliases (`COUT` → `Withdrawal`).
    #[serde(rename = "transactionList", default, skip_serializing_if = "Option::is_none")]
    pub transaction_list: Option<TransactionList>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<RuleSet>,

    /// TID-list section of older documents.
    #[serde(
        rename = "customerJournalParsing",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub legacy: Option<LegacyParsing>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct TransactionList {
    #[serde(rename = "transaction", default)]
    pub entries: Vec<AliasEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct AliasEntry {
    #[schemars(length(min = 1))]
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct RuleSet {
    #[serde(rename = "rule", default)]
    pub rules: Vec<RuleSpec>,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct RuleSpec {
    #[serde(rename = "@type")]
    #[schemars(length(min = 1))]
    pub transaction_type: String,

    /// `customer` or `ui`.
    #[serde(rename = "@journal")]
    #[schemars(length(min = 1))]
    pub journal: String,

    #[schemars(length(min = 1))]
    pub start: String,

    #[schemars(length(min = 1))]
    pub end: String,

    #[serde(rename = "field", default)]
    pub fields: Vec<FieldSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<OutcomeSpec>,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct FieldSpec {
    #[serde(rename = "@name")]
    #[schemars(length(min = 1))]
    pub name: String,

    #[serde(rename = "@pattern")]
    #[schemars(length(min = 1))]
    pub pattern: String,

    /// Map the captured value through the transaction aliases.
    #[serde(rename = "@translate", default)]
    pub translate: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct OutcomeSpec {
    #[serde(rename = "@success", default, skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,

    #[serde(rename = "@failure", default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// `<customerJournalParsing>`: comma-separated TID lists.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct LegacyParsing {
    #[schemars(length(min = 1))]
    pub starttransaction: String,

    #[schemars(length(min = 1))]
    pub endtransaction: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chainingtransaction: Option<String>,
}

impl LegacyParsing {
    fn split(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|tid| !tid.is_empty())
            .map(String::from)
            .collect()
    }

    /// Start and chaining TIDs; either opens a transaction.
    #[must_use]
    pub fn start_tids(&self) -> Vec<String> {
        let mut tids = Self::split(&self.starttransaction);
        if let Some(chain) = &self.chainingtransaction {
            tids.extend(Self::split(chain));
        }
        tids
    }

    #[must_use]
    pub fn end_tids(&self) -> Vec<String> {
        Self::split(&self.endtransaction)
    }
}

impl RuleDocument {
    /// Parse the XML text of a rule document.
    pub fn from_xml(text: &str) -> Result<Self, quick_xml::DeError> {
        quick_xml::de::from_str(text)
    }
}
