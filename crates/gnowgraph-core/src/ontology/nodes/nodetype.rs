//! Nodetype: the publishable unit, and its type specializations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ontology::{DataType, Nid, NodeClass};

// =============================================================================
// PUBLICATION
// =============================================================================

/// Publication status of a Nodetype or Gbobject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Draft,
    Hidden,
    #[default]
    Published,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Hidden => write!(f, "hidden"),
            Self::Published => write!(f, "published"),
        }
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" | "0" => Ok(Self::Draft),
            "hidden" | "1" => Ok(Self::Hidden),
            "published" | "2" => Ok(Self::Published),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

/// Far-future sentinel used as the default end of publication.
pub fn default_end_publication() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2042, 3, 15)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Lifecycle fields shared by every publishable record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    #[serde(default)]
    pub status: Status,
    pub creation_date: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    pub start_publication: DateTime<Utc>,
    #[serde(default = "default_end_publication")]
    pub end_publication: DateTime<Utc>,
}

impl Publication {
    /// Publication created at `now`, published immediately until the sentinel.
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            status: Status::Published,
            creation_date: now,
            last_update: now,
            start_publication: now,
            end_publication: default_end_publication(),
        }
    }

    /// Whether `now` lies within `[start_publication, end_publication)`.
    pub fn is_actual(&self, now: DateTime<Utc>) -> bool {
        self.start_publication <= now && now < self.end_publication
    }

    /// Actual and published.
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        self.is_actual(now) && self.status == Status::Published
    }
}

impl Default for Publication {
    fn default() -> Self {
        Self::starting_at(Utc::now())
    }
}

// =============================================================================
// NODETYPE
// =============================================================================

/// A publishable type node.
///
/// Slugs are unique per creation date. `parent` forms an acyclic tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nodetype {
    pub slug: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub parent: Option<Nid>,
    /// Metatypes this nodetype is a member of
    #[serde(default)]
    pub metatypes: Vec<Nid>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub sites: Vec<String>,
    /// Symmetric "related" links to other nodetypes
    #[serde(default)]
    pub related: Vec<Nid>,
    #[serde(default)]
    pub publication: Publication,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_true")]
    pub comment_enabled: bool,
    #[serde(default = "default_true")]
    pub pingback_enabled: bool,
    #[serde(default)]
    pub login_required: bool,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub specialization: TypeSpecialization,
}

pub(crate) fn default_true() -> bool {
    true
}

impl Nodetype {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            content: String::new(),
            excerpt: String::new(),
            tags: Vec::new(),
            parent: None,
            metatypes: Vec::new(),
            authors: Vec::new(),
            sites: Vec::new(),
            related: Vec::new(),
            publication: Publication::default(),
            featured: false,
            comment_enabled: true,
            pingback_enabled: true,
            login_required: false,
            password: None,
            template: None,
            specialization: TypeSpecialization::Plain,
        }
    }

    /// An Objecttype with the given slug.
    pub fn objecttype(slug: impl Into<String>) -> Self {
        Self::new(slug).with_specialization(TypeSpecialization::Objecttype)
    }

    pub fn relationtype(slug: impl Into<String>, spec: RelationtypeSpec) -> Self {
        Self::new(slug).with_specialization(TypeSpecialization::Relationtype(spec))
    }

    pub fn attributetype(slug: impl Into<String>, spec: AttributetypeSpec) -> Self {
        Self::new(slug).with_specialization(TypeSpecialization::Attributetype(spec))
    }

    pub fn with_specialization(mut self, specialization: TypeSpecialization) -> Self {
        self.specialization = specialization;
        self
    }

    pub fn with_parent(mut self, parent: Nid) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_metatypes(mut self, metatypes: impl IntoIterator<Item = Nid>) -> Self {
        self.metatypes = metatypes.into_iter().collect();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = excerpt.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sites<I, S>(mut self, sites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sites = sites.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_related(mut self, related: impl IntoIterator<Item = Nid>) -> Self {
        self.related = related.into_iter().collect();
        self
    }

    pub fn with_publication(mut self, publication: Publication) -> Self {
        self.publication = publication;
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.publication.status = status;
        self
    }

    pub fn with_creation_date(mut self, date: DateTime<Utc>) -> Self {
        self.publication.creation_date = date;
        self.publication.last_update = date;
        self
    }

    pub fn with_start_publication(mut self, date: DateTime<Utc>) -> Self {
        self.publication.start_publication = date;
        self
    }

    pub fn with_end_publication(mut self, date: DateTime<Utc>) -> Self {
        self.publication.end_publication = date;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Tags rendered as a comma-delimited string.
    pub fn tags_string(&self) -> String {
        self.tags.join(", ")
    }
}

// =============================================================================
// SPECIALIZATIONS
// =============================================================================

/// Type-specific payload of a Nodetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypeSpecialization {
    #[default]
    Plain,
    Objecttype,
    Relationtype(RelationtypeSpec),
    Attributetype(AttributetypeSpec),
    Processtype(ProcesstypeSpec),
    Systemtype(SystemtypeSpec),
}

impl TypeSpecialization {
    pub fn class(&self) -> NodeClass {
        match self {
            Self::Plain => NodeClass::Nodetype,
            Self::Objecttype => NodeClass::Objecttype,
            Self::Relationtype(_) => NodeClass::Relationtype,
            Self::Attributetype(_) => NodeClass::Attributetype,
            // Processtypes are edge types between states.
            Self::Processtype(_) => NodeClass::Edgetype,
            Self::Systemtype(_) => NodeClass::Systemtype,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Plain => "Nodetype",
            Self::Objecttype => "Objecttype",
            Self::Relationtype(_) => "Relationtype",
            Self::Attributetype(_) => "Attributetype",
            Self::Processtype(_) => "Processtype",
            Self::Systemtype(_) => "Systemtype",
        }
    }

    pub fn references(&self) -> Vec<Nid> {
        match self {
            Self::Plain | Self::Objecttype => Vec::new(),
            Self::Relationtype(rt) => vec![rt.left_subjecttype, rt.right_subjecttype],
            Self::Attributetype(at) => {
                let mut refs = vec![at.subjecttype];
                refs.extend(&at.validators);
                refs
            }
            Self::Processtype(pt) => pt
                .changing_attributetypes
                .iter()
                .chain(&pt.changing_relationtypes)
                .copied()
                .collect(),
            Self::Systemtype(st) => st
                .nodetypes
                .iter()
                .chain(&st.relationtypes)
                .chain(&st.attributetypes)
                .chain(&st.metatypes)
                .chain(&st.processtypes)
                .copied()
                .collect(),
        }
    }
}

/// Definition of a binary relation between two subject types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationtypeSpec {
    /// Name used when subject and object are swapped
    pub inverse: String,
    /// Domain: any node
    pub left_subjecttype: Nid,
    #[serde(default)]
    pub left_applicable: NodeClass,
    #[serde(default)]
    pub left_cardinality: Option<u32>,
    /// Range: any node
    pub right_subjecttype: Nid,
    #[serde(default)]
    pub right_applicable: NodeClass,
    #[serde(default)]
    pub right_cardinality: Option<u32>,
    #[serde(default)]
    pub is_symmetrical: Option<bool>,
    #[serde(default)]
    pub is_reflexive: Option<bool>,
    #[serde(default)]
    pub is_transitive: Option<bool>,
}

impl RelationtypeSpec {
    pub fn new(inverse: impl Into<String>, left: Nid, right: Nid) -> Self {
        Self {
            inverse: inverse.into(),
            left_subjecttype: left,
            left_applicable: NodeClass::default(),
            left_cardinality: None,
            right_subjecttype: right,
            right_applicable: NodeClass::default(),
            right_cardinality: None,
            is_symmetrical: None,
            is_reflexive: None,
            is_transitive: None,
        }
    }

    pub fn with_applicable(mut self, left: NodeClass, right: NodeClass) -> Self {
        self.left_applicable = left;
        self.right_applicable = right;
        self
    }

    pub fn with_cardinality(mut self, left: Option<u32>, right: Option<u32>) -> Self {
        self.left_cardinality = left;
        self.right_cardinality = right;
        self
    }

    pub fn symmetrical(mut self, value: bool) -> Self {
        self.is_symmetrical = Some(value);
        self
    }

    pub fn reflexive(mut self, value: bool) -> Self {
        self.is_reflexive = Some(value);
        self
    }

    pub fn transitive(mut self, value: bool) -> Self {
        self.is_transitive = Some(value);
        self
    }
}

/// Definition of an attribute applying to a subject type.
///
/// Apart from `subjecttype`, `applicable` and `data_type`, every field is
/// optional field-configuration metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributetypeSpec {
    pub subjecttype: Nid,
    #[serde(default)]
    pub applicable: NodeClass,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default)]
    pub verbose_name: Option<String>,
    #[serde(default)]
    pub null: Option<bool>,
    #[serde(default)]
    pub blank: Option<bool>,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub max_digits: Option<u32>,
    #[serde(default)]
    pub decimal_places: Option<u32>,
    #[serde(default)]
    pub auto_now: Option<bool>,
    #[serde(default)]
    pub auto_now_add: Option<bool>,
    #[serde(default)]
    pub upload_to: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub verify_exists: Option<bool>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub unique: Option<bool>,
    /// Other attributetypes acting as validators
    #[serde(default)]
    pub validators: Vec<Nid>,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub editable: Option<bool>,
}

impl AttributetypeSpec {
    pub fn new(subjecttype: Nid, data_type: DataType) -> Self {
        Self {
            subjecttype,
            applicable: NodeClass::default(),
            data_type,
            verbose_name: None,
            null: None,
            blank: None,
            help_text: None,
            max_digits: None,
            decimal_places: None,
            auto_now: None,
            auto_now_add: None,
            upload_to: None,
            path: None,
            verify_exists: None,
            min_length: None,
            required: None,
            label: None,
            unique: None,
            validators: Vec::new(),
            default: None,
            editable: None,
        }
    }

    pub fn with_applicable(mut self, applicable: NodeClass) -> Self {
        self.applicable = applicable;
        self
    }

    pub fn with_digits(mut self, max_digits: u32, decimal_places: u32) -> Self {
        self.max_digits = Some(max_digits);
        self.decimal_places = Some(decimal_places);
        self
    }

    pub fn with_min_length(mut self, min_length: u32) -> Self {
        self.min_length = Some(min_length);
        self
    }

    pub fn with_validators(mut self, validators: impl IntoIterator<Item = Nid>) -> Self {
        self.validators = validators.into_iter().collect();
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = Some(unique);
        self
    }
}

/// A process type: the attribute and relation types whose values change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProcesstypeSpec {
    #[serde(default)]
    pub changing_attributetypes: Vec<Nid>,
    #[serde(default)]
    pub changing_relationtypes: Vec<Nid>,
}

/// A system type: the sets of types a system of this type may contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SystemtypeSpec {
    #[serde(default)]
    pub nodetypes: Vec<Nid>,
    #[serde(default)]
    pub relationtypes: Vec<Nid>,
    #[serde(default)]
    pub attributetypes: Vec<Nid>,
    #[serde(default)]
    pub metatypes: Vec<Nid>,
    #[serde(default)]
    pub processtypes: Vec<Nid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_default_end_publication() {
        assert_eq!(
            default_end_publication().to_rfc3339(),
            "2042-03-15T00:00:00+00:00"
        );
    }

    #[test]
    fn test_visibility_window_is_half_open() {
        let now = Utc::now();
        let mut publication = Publication::starting_at(now);
        publication.end_publication = now + Duration::days(1);

        assert!(publication.is_visible(now));
        assert!(!publication.is_visible(now - Duration::seconds(1)));
        assert!(!publication.is_visible(now + Duration::days(1)));

        publication.status = Status::Draft;
        assert!(publication.is_actual(now));
        assert!(!publication.is_visible(now));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Draft".parse::<Status>().unwrap(), Status::Draft);
        assert_eq!("2".parse::<Status>().unwrap(), Status::Published);
        assert!("archived".parse::<Status>().is_err());
    }
}
