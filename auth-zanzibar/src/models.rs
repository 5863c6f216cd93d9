use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ZanzibarError;

/// Object id of the single object in the `system` namespace
pub const SYSTEM_OBJECT_ID: &str = "global";

/// Subject id meaning "any authenticated user"
pub const WILDCARD_SUBJECT: &str = "*";

/// Kind of protected resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    Post,
    Comment,
    Category,
    /// Platform-wide override roles, always addressed as `system:global`
    System,
    Question,
    Answer,
}

impl Namespace {
    pub const ALL: [Namespace; 6] = [
        Namespace::Post,
        Namespace::Comment,
        Namespace::Category,
        Namespace::System,
        Namespace::Question,
        Namespace::Answer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
            Self::Category => "category",
            Self::System => "system",
            Self::Question => "question",
            Self::Answer => "answer",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = ZanzibarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ns| ns.as_str() == s)
            .ok_or_else(|| ZanzibarError::Validation(format!("Unknown namespace: {s}")))
    }
}

/// Named permission level. Declaration order runs strongest first within each
/// family, which is also the order used when listing implying relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Owner,
    Editor,
    Viewer,
    Admin,
    Moderator,
    Member,
}

impl Relation {
    pub const ALL: [Relation; 6] = [
        Relation::Owner,
        Relation::Editor,
        Relation::Viewer,
        Relation::Admin,
        Relation::Moderator,
        Relation::Member,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
            Self::Admin => "admin",
            Self::Moderator => "moderator",
            Self::Member => "member",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relation {
    type Err = ZanzibarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|rel| rel.as_str() == s)
            .ok_or_else(|| ZanzibarError::Validation(format!("Unknown relation: {s}")))
    }
}

/// Kind of subject a tuple binds.
///
/// Only `User` is evaluated by the checker; `Group` and `UserSet` can be
/// stored and revoked but never grant anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    User,
    Group,
    UserSet,
}

impl SubjectType {
    pub const ALL: [SubjectType; 3] = [SubjectType::User, SubjectType::Group, SubjectType::UserSet];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
            Self::UserSet => "user_set",
        }
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubjectType {
    type Err = ZanzibarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| ZanzibarError::Validation(format!("Unknown subject type: {s}")))
    }
}

/// The five fields that identify a tuple; at most one tuple exists per key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TupleKey {
    pub namespace: Namespace,
    pub object_id: String,
    pub relation: Relation,
    pub subject_type: SubjectType,
    pub subject_id: String,
}

impl fmt::Display for TupleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}#{}@{}:{}",
            self.namespace, self.object_id, self.relation, self.subject_type, self.subject_id
        )
    }
}

/// A single access grant: subject has relation on a namespaced object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationTuple {
    pub namespace: Namespace,
    pub object_id: String,
    pub relation: Relation,
    pub subject_type: SubjectType,
    pub subject_id: String,
    pub created_at: DateTime<Utc>,
}

impl RelationTuple {
    pub fn new(
        namespace: Namespace,
        object_id: &str,
        relation: Relation,
        subject_type: SubjectType,
        subject_id: &str,
    ) -> Self {
        Self {
            namespace,
            object_id: object_id.to_string(),
            relation,
            subject_type,
            subject_id: subject_id.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Tuple granting `relation` to a single user
    pub fn user(namespace: Namespace, object_id: &str, relation: Relation, user_id: &str) -> Self {
        Self::new(namespace, object_id, relation, SubjectType::User, user_id)
    }

    pub fn key(&self) -> TupleKey {
        TupleKey {
            namespace: self.namespace,
            object_id: self.object_id.clone(),
            relation: self.relation,
            subject_type: self.subject_type,
            subject_id: self.subject_id.clone(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.subject_type == SubjectType::User && self.subject_id == WILDCARD_SUBJECT
    }
}

impl fmt::Display for RelationTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Exact-match conjunction over the tuple fields; `None` matches anything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TupleFilter {
    pub namespace: Option<Namespace>,
    pub object_id: Option<String>,
    pub relation: Option<Relation>,
    pub subject_type: Option<SubjectType>,
    pub subject_id: Option<String>,
}

impl TupleFilter {
    /// Every tuple on one object
    pub fn object(namespace: Namespace, object_id: &str) -> Self {
        Self {
            namespace: Some(namespace),
            object_id: Some(object_id.to_string()),
            ..Self::default()
        }
    }

    /// Every tuple held by one subject
    pub fn for_subject(subject_type: SubjectType, subject_id: &str) -> Self {
        Self::default().subject(subject_type, subject_id)
    }

    /// Matches exactly one key
    pub fn exact(
        namespace: Namespace,
        object_id: &str,
        relation: Relation,
        subject_type: SubjectType,
        subject_id: &str,
    ) -> Self {
        Self::object(namespace, object_id)
            .relation(relation)
            .subject(subject_type, subject_id)
    }

    pub fn namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = Some(namespace);
        self
    }

    pub fn relation(mut self, relation: Relation) -> Self {
        self.relation = Some(relation);
        self
    }

    pub fn subject(mut self, subject_type: SubjectType, subject_id: &str) -> Self {
        self.subject_type = Some(subject_type);
        self.subject_id = Some(subject_id.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.namespace.is_none()
            && self.object_id.is_none()
            && self.relation.is_none()
            && self.subject_type.is_none()
            && self.subject_id.is_none()
    }

    /// The key this filter pins down, if every field is set
    pub fn as_key(&self) -> Option<TupleKey> {
        Some(TupleKey {
            namespace: self.namespace?,
            object_id: self.object_id.clone()?,
            relation: self.relation?,
            subject_type: self.subject_type?,
            subject_id: self.subject_id.clone()?,
        })
    }

    pub fn matches(&self, tuple: &RelationTuple) -> bool {
        self.namespace.map_or(true, |ns| ns == tuple.namespace)
            && self.object_id.as_deref().map_or(true, |id| id == tuple.object_id)
            && self.relation.map_or(true, |rel| rel == tuple.relation)
            && self.subject_type.map_or(true, |st| st == tuple.subject_type)
            && self.subject_id.as_deref().map_or(true, |id| id == tuple.subject_id)
    }
}

impl From<&TupleKey> for TupleFilter {
    fn from(key: &TupleKey) -> Self {
        Self::exact(
            key.namespace,
            &key.object_id,
            key.relation,
            key.subject_type,
            &key.subject_id,
        )
    }
}

/// Result of a grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "tuple", rename_all = "snake_case")]
pub enum GrantOutcome {
    Created(RelationTuple),
    /// The identical tuple was already present; nothing was written
    AlreadyExists,
}

impl GrantOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    pub fn tuple(&self) -> Option<&RelationTuple> {
        match self {
            Self::Created(tuple) => Some(tuple),
            Self::AlreadyExists => None,
        }
    }
}

/// Authorization check request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRequest {
    pub user_id: String,
    pub namespace: Namespace,
    pub object_id: String,
    pub relation: Relation,
}

impl CheckRequest {
    pub fn new(user_id: &str, namespace: Namespace, object_id: &str, relation: Relation) -> Self {
        Self {
            user_id: user_id.to_string(),
            namespace,
            object_id: object_id.to_string(),
            relation,
        }
    }
}

/// Which rule decided a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "via", rename_all = "snake_case")]
pub enum CheckReason {
    /// Exact tuple held by the user
    Direct,
    /// A stronger relation that implies the requested one
    Inherited(Relation),
    /// User holds `system:global#admin`
    SystemAdmin,
    /// User holds `system:global#moderator` and moderator/admin was requested
    SystemModerator,
    /// Public grant to `*`
    Wildcard,
    Denied,
}

impl fmt::Display for CheckReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("direct"),
            Self::Inherited(via) => write!(f, "inherited via {via}"),
            Self::SystemAdmin => f.write_str("system admin"),
            Self::SystemModerator => f.write_str("system moderator"),
            Self::Wildcard => f.write_str("wildcard"),
            Self::Denied => f.write_str("denied"),
        }
    }
}

/// Authorization check response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDecision {
    pub allowed: bool,
    pub reason: CheckReason,
}

impl CheckDecision {
    pub fn allow(reason: CheckReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    pub fn deny() -> Self {
        Self {
            allowed: false,
            reason: CheckReason::Denied,
        }
    }
}

/// Platform role of a user, materialized as a tuple on `system:global`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemRole {
    /// No system tuple
    User,
    Moderator,
    Admin,
}

impl SystemRole {
    pub fn relation(self) -> Option<Relation> {
        match self {
            Self::User => None,
            Self::Moderator => Some(Relation::Moderator),
            Self::Admin => Some(Relation::Admin),
        }
    }
}

impl fmt::Display for SystemRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Moderator => f.write_str("moderator"),
            Self::Admin => f.write_str("admin"),
        }
    }
}

impl FromStr for SystemRole {
    type Err = ZanzibarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            other => Err(ZanzibarError::Validation(format!("Unknown system role: {other}"))),
        }
    }
}
