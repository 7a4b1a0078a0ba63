//! # Rule Kinds
//!
//! Every recognized tag name maps to one [`RuleKind`]. Kinds carry their
//! parameters and know their intrinsic [`Stability`] and the scopes in
//! which they may appear.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dvgen_tags::Scope;

use crate::rule::Rule;

/// Maturity level of a rule kind. Ordered `Alpha < Beta < Stable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stability {
    Alpha,
    Beta,
    Stable,
}

impl fmt::Display for Stability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Alpha => "alpha",
            Self::Beta => "beta",
            Self::Stable => "stable",
        })
    }
}

/// String formats understood by `+k8s:format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    #[serde(rename = "k8s-ip")]
    Ip,
    #[serde(rename = "k8s-uuid")]
    Uuid,
    #[serde(rename = "k8s-short-name")]
    ShortName,
    #[serde(rename = "k8s-long-name")]
    LongName,
    #[serde(rename = "k8s-label-key")]
    LabelKey,
    #[serde(rename = "k8s-label-value")]
    LabelValue,
}

impl Format {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ip => "k8s-ip",
            Self::Uuid => "k8s-uuid",
            Self::ShortName => "k8s-short-name",
            Self::LongName => "k8s-long-name",
            Self::LabelKey => "k8s-label-key",
            Self::LabelValue => "k8s-label-value",
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "k8s-ip" => Ok(Self::Ip),
            "k8s-uuid" => Ok(Self::Uuid),
            "k8s-short-name" => Ok(Self::ShortName),
            "k8s-long-name" => Ok(Self::LongName),
            "k8s-label-key" => Ok(Self::LabelKey),
            "k8s-label-value" => Ok(Self::LabelValue),
            other => Err(format!("unknown format '{other}'")),
        }
    }
}

/// Transition restrictions of `+k8s:update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateOp {
    /// An unset field may not become set.
    NoSet,
    /// A set field may not become unset.
    NoUnset,
    /// A set field may not change to a different set value.
    NoModify,
}

impl FromStr for UpdateOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NoSet" => Ok(Self::NoSet),
            "NoUnset" => Ok(Self::NoUnset),
            "NoModify" => Ok(Self::NoModify),
            other => Err(format!("unknown update constraint '{other}'")),
        }
    }
}

/// `+k8s:listType` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    Atomic,
    Set,
    Map,
}

impl FromStr for ListType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "atomic" => Ok(Self::Atomic),
            "set" => Ok(Self::Set),
            "map" => Ok(Self::Map),
            other => Err(format!("unknown list type '{other}'")),
        }
    }
}

/// `+k8s:unique` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UniqueMode {
    Set,
    Map,
}

impl FromStr for UniqueMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "set" => Ok(Self::Set),
            "map" => Ok(Self::Map),
            other => Err(format!("unknown uniqueness mode '{other}'")),
        }
    }
}

/// Key-field values selecting one list item for `+k8s:item`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSelector {
    /// `(json field name, expected value)` in declaration order.
    pub keys: Vec<(String, Value)>,
}

impl ItemSelector {
    /// Whether `item` carries every selector value.
    pub fn matches(&self, item: &Value) -> bool {
        self.keys
            .iter()
            .all(|(field, expected)| item.get(field) == Some(expected))
    }

    /// The identity-key rendering, e.g. `type=Approved,stage=2`.
    pub fn identity(&self) -> String {
        render_identity(self.keys.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

/// Render `k1=v1,k2=v2`. Strings render without quotes.
pub fn render_identity<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a Value)>) -> String {
    pairs
        .into_iter()
        .map(|(k, v)| match v {
            Value::String(s) => format!("{k}={s}"),
            other => format!("{k}={other}"),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// One constant of an enum type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumMember {
    /// Declared constant name.
    pub name: String,
    pub value: String,
    /// Rules built from the constant's tags. Each resolves, when active, to
    /// an `EnumExclude` rule.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclusions: Vec<Rule>,
}

/// What a rule checks. Parameters travel with the kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "params", rename_all = "camelCase")]
pub enum RuleKind {
    Required,
    Optional,
    Forbidden,
    Immutable,
    UpdateConstraint(UpdateOp),
    Minimum(i64),
    MaxLength(usize),
    MaxItems(usize),
    MaxProperties(usize),
    Format(Format),
    Enum(Vec<EnumMember>),
    EnumExclude,
    Unique(UniqueMode),
    ListIdentity(ListType),
    ListMapKey(String),
    CustomUnique,
    UnionMember { union: String, member: String },
    UnionDiscriminator { union: String },
    ZeroOrOneOfMember { group: String, member: String },
    Item(ItemSelector),
    /// JSON name of the selected field.
    Subfield(String),
    EachVal,
    EachKey,
    Neq(Value),
    Opaque,
    DeclarativeNative,
    ConditionalWrapper,
}

impl RuleKind {
    /// The tag name this kind is written as.
    pub fn tag_name(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Optional => "optional",
            Self::Forbidden => "forbidden",
            Self::Immutable => "immutable",
            Self::UpdateConstraint(_) => "update",
            Self::Minimum(_) => "minimum",
            Self::MaxLength(_) => "maxLength",
            Self::MaxItems(_) => "maxItems",
            Self::MaxProperties(_) => "maxProperties",
            Self::Format(_) => "format",
            Self::Enum(_) => "enum",
            Self::EnumExclude => "enumExclude",
            Self::Unique(_) => "unique",
            Self::ListIdentity(_) => "listType",
            Self::ListMapKey(_) => "listMapKey",
            Self::CustomUnique => "customUnique",
            Self::UnionMember { .. } => "unionMember",
            Self::UnionDiscriminator { .. } => "unionDiscriminator",
            Self::ZeroOrOneOfMember { .. } => "zeroOrOneOfMember",
            Self::Item(_) => "item",
            Self::Subfield(_) => "subfield",
            Self::EachVal => "eachVal",
            Self::EachKey => "eachKey",
            Self::Neq(_) => "neq",
            Self::Opaque => "opaqueType",
            Self::DeclarativeNative => "declarativeValidationNative",
            Self::ConditionalWrapper => "ifEnabled",
        }
    }

    /// Intrinsic maturity of the kind.
    pub fn stability(&self) -> Stability {
        match self {
            Self::UpdateConstraint(_) | Self::CustomUnique => Stability::Alpha,
            Self::Immutable
            | Self::MaxProperties(_)
            | Self::Neq(_)
            | Self::EnumExclude
            | Self::UnionMember { .. }
            | Self::UnionDiscriminator { .. }
            | Self::ZeroOrOneOfMember { .. }
            | Self::ConditionalWrapper => Stability::Beta,
            _ => Stability::Stable,
        }
    }

    /// Kinds evaluated in the short-circuit phase.
    pub fn is_short_circuit(&self) -> bool {
        matches!(
            self,
            Self::Required
                | Self::Optional
                | Self::Forbidden
                | Self::Immutable
                | Self::UpdateConstraint(_)
        )
    }

    /// List metadata consumed at compile time.
    pub fn is_list_metadata(&self) -> bool {
        matches!(
            self,
            Self::ListIdentity(_) | Self::ListMapKey(_) | Self::Unique(_) | Self::CustomUnique
        )
    }

    /// Union and zero-or-one-of markers, consumed at compile time.
    pub fn is_union_marker(&self) -> bool {
        matches!(
            self,
            Self::UnionMember { .. } | Self::UnionDiscriminator { .. } | Self::ZeroOrOneOfMember { .. }
        )
    }

    /// Kinds that wrap exactly one child rule.
    pub fn is_composed(&self) -> bool {
        matches!(
            self,
            Self::Item(_) | Self::Subfield(_) | Self::EachVal | Self::EachKey | Self::ConditionalWrapper
        )
    }
}

/// Scopes in which a tag name may appear, or `None` for unknown names.
pub fn valid_scopes(tag_name: &str) -> Option<&'static [Scope]> {
    use Scope::*;
    let scopes: &'static [Scope] = match tag_name {
        "required" | "optional" | "forbidden" | "opaqueType" | "declarativeValidationNative" => {
            &[Field]
        }
        "immutable" | "update" => &[Field, ListValue, MapValue],
        "minimum" | "maxLength" | "format" | "neq" => &[Field, Type, ListValue, MapKey, MapValue],
        "maxItems" | "maxProperties" | "listType" | "listMapKey" | "unique" | "customUnique"
        | "eachVal" | "item" | "subfield" | "eachKey" => &[Field, Type, ListValue, MapValue],
        "enum" => &[Type],
        "enumExclude" => &[Const],
        "unionMember" | "unionDiscriminator" | "zeroOrOneOfMember" => &[Field, ListValue],
        "ifEnabled" | "ifDisabled" => &[Field, Type, ListValue, MapKey, MapValue, Const],
        _ => return None,
    };
    Some(scopes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stability_table() {
        assert_eq!(RuleKind::Required.stability(), Stability::Stable);
        assert_eq!(RuleKind::MaxItems(3).stability(), Stability::Stable);
        assert_eq!(RuleKind::Immutable.stability(), Stability::Beta);
        assert_eq!(RuleKind::MaxProperties(0).stability(), Stability::Beta);
        assert_eq!(RuleKind::ConditionalWrapper.stability(), Stability::Beta);
        assert_eq!(
            RuleKind::UpdateConstraint(UpdateOp::NoSet).stability(),
            Stability::Alpha
        );
        assert_eq!(RuleKind::CustomUnique.stability(), Stability::Alpha);
        assert!(Stability::Alpha < Stability::Beta && Stability::Beta < Stability::Stable);
    }

    #[test]
    fn scope_table() {
        assert_eq!(valid_scopes("required"), Some(&[Scope::Field][..]));
        assert!(valid_scopes("enum").unwrap().contains(&Scope::Type));
        assert!(!valid_scopes("enum").unwrap().contains(&Scope::Field));
        assert!(valid_scopes("enumExclude").unwrap().contains(&Scope::Const));
        assert!(valid_scopes("bogus").is_none());
    }

    #[test]
    fn format_names_round_trip() {
        for f in [
            Format::Ip,
            Format::Uuid,
            Format::ShortName,
            Format::LongName,
            Format::LabelKey,
            Format::LabelValue,
        ] {
            assert_eq!(f.name().parse::<Format>().unwrap(), f);
        }
        assert!("k8s-bogus".parse::<Format>().is_err());
    }

    #[test]
    fn selector_matching_and_identity() {
        let sel = ItemSelector {
            keys: vec![("type".into(), json!("Approved")), ("stage".into(), json!(2))],
        };
        assert!(sel.matches(&json!({"type": "Approved", "stage": 2, "x": 1})));
        assert!(!sel.matches(&json!({"type": "Approved", "stage": 3})));
        assert_eq!(sel.identity(), "type=Approved,stage=2");
    }

    #[test]
    fn kind_serializes_with_params() {
        let json = serde_json::to_value(RuleKind::MaxLength(16)).unwrap();
        assert_eq!(json, json!({"kind": "maxLength", "params": 16}));
        let json = serde_json::to_value(RuleKind::Required).unwrap();
        assert_eq!(json, json!({"kind": "required"}));
    }
}
