//! Canonical document model.
//!
//! The document is built incrementally: handlers return an [`Entry`] that
//! [`Document::merge`] folds in under its [`DocKey`] (list keys extend,
//! scalar keys replace). Empty values are dropped in exactly one place,
//! [`Document::to_json`], so handlers never need to filter them.

use crate::contribution::Role;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level keys of the canonical document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocKey {
    Title,
    Language,
    IdentifiedBy,
    DocumentType,
    Subjects,
    Contribution,
    ProvisionActivity,
    PartOf,
    Abstracts,
    Files,
    Notes,
    Series,
    Classification,
    EditionStatement,
    Dissertation,
    OtherEdition,
    Collections,
    Subdivisions,
    Organisation,
    UsageAndAccessPolicy,
    Extent,
    OtherMaterialCharacteristics,
    Formats,
    AdditionalMaterials,
    ContentNote,
    OaStatus,
}

impl DocKey {
    /// JSON key of the canonical document.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocKey::Title => "title",
            DocKey::Language => "language",
            DocKey::IdentifiedBy => "identifiedBy",
            DocKey::DocumentType => "documentType",
            DocKey::Subjects => "subjects",
            DocKey::Contribution => "contribution",
            DocKey::ProvisionActivity => "provisionActivity",
            DocKey::PartOf => "partOf",
            DocKey::Abstracts => "abstracts",
            DocKey::Files => "files",
            DocKey::Notes => "notes",
            DocKey::Series => "series",
            DocKey::Classification => "classification",
            DocKey::EditionStatement => "editionStatement",
            DocKey::Dissertation => "dissertation",
            DocKey::OtherEdition => "otherEdition",
            DocKey::Collections => "collections",
            DocKey::Subdivisions => "subdivisions",
            DocKey::Organisation => "organisation",
            DocKey::UsageAndAccessPolicy => "usageAndAccessPolicy",
            DocKey::Extent => "extent",
            DocKey::OtherMaterialCharacteristics => "otherMaterialCharacteristics",
            DocKey::Formats => "formats",
            DocKey::AdditionalMaterials => "additionalMaterials",
            DocKey::ContentNote => "contentNote",
            DocKey::OaStatus => "oa_status",
        }
    }
}

impl std::fmt::Display for DocKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value with an optional language or `lang-script` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub value: String,
    pub language: Option<String>,
}

impl Label {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: None,
        }
    }

    pub fn with_language(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: Some(language.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Title {
    #[serde(rename = "type")]
    pub kind: TitleType,
    pub main_title: Vec<Label>,
    pub subtitle: Vec<Label>,
    pub part: Vec<TitlePart>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum TitleType {
    #[default]
    #[serde(rename = "bf:Title")]
    Title,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitlePart {
    pub part_number: Vec<Label>,
    pub part_name: Vec<Label>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    #[serde(rename = "type")]
    pub kind: LanguageType,
    pub value: String,
}

impl Language {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            kind: LanguageType::Language,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LanguageType {
    #[serde(rename = "bf:Language")]
    Language,
}

/// Identifier types, serialized with their `bf:` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentifierType {
    #[serde(rename = "bf:AudioIssueNumber")]
    AudioIssueNumber,
    #[serde(rename = "bf:Doi")]
    Doi,
    #[serde(rename = "bf:Ean")]
    Ean,
    #[serde(rename = "bf:Gtin14Number")]
    Gtin14Number,
    #[serde(rename = "bf:Identifier")]
    Identifier,
    #[serde(rename = "bf:Isan")]
    Isan,
    #[serde(rename = "bf:Isbn")]
    Isbn,
    #[serde(rename = "bf:Ismn")]
    Ismn,
    #[serde(rename = "bf:Isrc")]
    Isrc,
    #[serde(rename = "bf:Issn")]
    Issn,
    #[serde(rename = "bf:IssnL")]
    IssnL,
    #[serde(rename = "bf:Istc")]
    Istc,
    #[serde(rename = "bf:Local")]
    Local,
    #[serde(rename = "bf:MatrixNumber")]
    MatrixNumber,
    #[serde(rename = "bf:MusicDistributorNumber")]
    MusicDistributorNumber,
    #[serde(rename = "bf:MusicPlate")]
    MusicPlate,
    #[serde(rename = "bf:MusicPublisherNumber")]
    MusicPublisherNumber,
    #[serde(rename = "bf:PublisherNumber")]
    PublisherNumber,
    #[serde(rename = "bf:ReportNumber")]
    ReportNumber,
    #[serde(rename = "bf:Strn")]
    Strn,
    #[serde(rename = "bf:Upc")]
    Upc,
    #[serde(rename = "uri")]
    Uri,
    #[serde(rename = "bf:Urn")]
    Urn,
    #[serde(rename = "bf:VideoRecordingNumber")]
    VideoRecordingNumber,
    #[serde(rename = "pmid")]
    Pmid,
}

/// A typed, optionally sourced identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    #[serde(rename = "type")]
    pub kind: IdentifierType,
    pub value: String,
    pub source: Option<String>,
    pub qualifier: Option<String>,
    pub status: Option<String>,
    pub acquisition_terms: Option<String>,
    pub note: Option<String>,
}

impl Identifier {
    pub fn new(kind: IdentifierType, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            source: None,
            qualifier: None,
            status: None,
            acquisition_terms: None,
            note: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_qualifier(mut self, qualifier: Option<String>) -> Self {
        self.qualifier = qualifier;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub label: SubjectLabel,
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectLabel {
    pub language: Option<String>,
    pub value: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AgentType {
    #[serde(rename = "bf:Person")]
    Person,
    #[serde(rename = "bf:Organization")]
    Organization,
    #[serde(rename = "bf:Meeting")]
    Meeting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    #[serde(rename = "type")]
    pub kind: AgentType,
    #[serde(rename = "preferred_name")]
    pub preferred_name: String,
    #[serde(rename = "date_of_birth")]
    pub date_of_birth: Option<String>,
    #[serde(rename = "date_of_death")]
    pub date_of_death: Option<String>,
    pub place: Option<String>,
    pub date: Option<String>,
    pub number: Option<String>,
    pub identified_by: Option<Identifier>,
}

impl Agent {
    pub fn new(kind: AgentType, preferred_name: impl Into<String>) -> Self {
        Self {
            kind,
            preferred_name: preferred_name.into(),
            date_of_birth: None,
            date_of_death: None,
            place: None,
            date: None,
            number: None,
            identified_by: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub agent: Agent,
    pub role: Vec<Role>,
    pub affiliation: Option<String>,
    pub controlled_affiliation: Vec<String>,
}

impl Contribution {
    pub fn new(agent: Agent, role: Role) -> Self {
        Self {
            agent,
            role: vec![role],
            affiliation: None,
            controlled_affiliation: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvisionType {
    #[serde(rename = "bf:Publication")]
    Publication,
    #[serde(rename = "bf:Production")]
    Production,
    #[serde(rename = "bf:Distribution")]
    Distribution,
    #[serde(rename = "bf:Manufacture")]
    Manufacture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementType {
    #[serde(rename = "bf:Place")]
    Place,
    #[serde(rename = "bf:Agent")]
    Agent,
    Date,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    #[serde(rename = "type")]
    pub kind: StatementType,
    pub label: Vec<Label>,
}

impl Statement {
    pub fn new(kind: StatementType, label: Vec<Label>) -> Self {
        Self { kind, label }
    }

    pub fn single(kind: StatementType, value: impl Into<String>) -> Self {
        Self::new(kind, vec![Label::new(value)])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(rename = "type")]
    pub kind: StatementType,
    pub canton: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionActivity {
    #[serde(rename = "type")]
    pub kind: ProvisionType,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub note: Option<String>,
    pub place: Vec<Place>,
    pub statement: Vec<Statement>,
}

impl ProvisionActivity {
    pub fn new(kind: ProvisionType) -> Self {
        Self {
            kind,
            start_date: None,
            end_date: None,
            note: None,
            place: Vec::new(),
            statement: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostPublication {
    pub statement: Option<String>,
    pub start_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostDocument {
    pub title: Option<String>,
    pub contribution: Vec<String>,
    pub publication: Option<HostPublication>,
    pub identified_by: Vec<Identifier>,
}

/// Host item a document is part of.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartOf {
    pub numbering_year: Option<String>,
    pub numbering_volume: Option<String>,
    pub numbering_issue: Option<String>,
    pub numbering_pages: Option<String>,
    pub document: HostDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub key: Option<String>,
    pub url: String,
    pub label: Option<String>,
    pub order: u32,
    pub mime_type: Option<String>,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub number: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ClassificationType {
    #[serde(rename = "bf:ClassificationUdc")]
    Udc,
    #[serde(rename = "bf:ClassificationDdc")]
    Ddc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    #[serde(rename = "type")]
    pub kind: ClassificationType,
    pub classification_portion: String,
    pub assigner: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditionStatement {
    pub edition_designation: Vec<Label>,
    pub responsibility: Vec<Label>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dissertation {
    pub degree: Option<String>,
    pub granting_institution: Option<String>,
    pub date: Option<String>,
    #[serde(rename = "jury_note")]
    pub jury_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectronicLocator {
    pub electronic_locator: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherEdition {
    pub document: ElectronicLocator,
    pub public_note: String,
}

/// JSON reference to another record (`{"$ref": url}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "$ref")]
    pub href: String,
}

impl Reference {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsagePolicy {
    pub label: Option<String>,
    pub license: String,
}

/// A handler result, tagged with the document key it is merged under.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Title(Vec<Title>),
    Language(Vec<Language>),
    IdentifiedBy(Vec<Identifier>),
    DocumentType(String),
    Subjects(Vec<Subject>),
    Contribution(Vec<Contribution>),
    ProvisionActivity(Vec<ProvisionActivity>),
    PartOf(Vec<PartOf>),
    Abstracts(Vec<Label>),
    Files(Vec<FileEntry>),
    Notes(Vec<String>),
    Series(Vec<Series>),
    Classification(Vec<Classification>),
    EditionStatement(EditionStatement),
    Dissertation(Dissertation),
    OtherEdition(Vec<OtherEdition>),
    Collections(Vec<Reference>),
    Subdivisions(Vec<Reference>),
    Organisation(Vec<Reference>),
    UsageAndAccessPolicy(UsagePolicy),
    Extent(String),
    OtherMaterialCharacteristics(String),
    Formats(Vec<String>),
    AdditionalMaterials(String),
    ContentNote(Vec<String>),
    OaStatus(String),
}

impl Entry {
    pub fn key(&self) -> DocKey {
        match self {
            Entry::Title(_) => DocKey::Title,
            Entry::Language(_) => DocKey::Language,
            Entry::IdentifiedBy(_) => DocKey::IdentifiedBy,
            Entry::DocumentType(_) => DocKey::DocumentType,
            Entry::Subjects(_) => DocKey::Subjects,
            Entry::Contribution(_) => DocKey::Contribution,
            Entry::ProvisionActivity(_) => DocKey::ProvisionActivity,
            Entry::PartOf(_) => DocKey::PartOf,
            Entry::Abstracts(_) => DocKey::Abstracts,
            Entry::Files(_) => DocKey::Files,
            Entry::Notes(_) => DocKey::Notes,
            Entry::Series(_) => DocKey::Series,
            Entry::Classification(_) => DocKey::Classification,
            Entry::EditionStatement(_) => DocKey::EditionStatement,
            Entry::Dissertation(_) => DocKey::Dissertation,
            Entry::OtherEdition(_) => DocKey::OtherEdition,
            Entry::Collections(_) => DocKey::Collections,
            Entry::Subdivisions(_) => DocKey::Subdivisions,
            Entry::Organisation(_) => DocKey::Organisation,
            Entry::UsageAndAccessPolicy(_) => DocKey::UsageAndAccessPolicy,
            Entry::Extent(_) => DocKey::Extent,
            Entry::OtherMaterialCharacteristics(_) => DocKey::OtherMaterialCharacteristics,
            Entry::Formats(_) => DocKey::Formats,
            Entry::AdditionalMaterials(_) => DocKey::AdditionalMaterials,
            Entry::ContentNote(_) => DocKey::ContentNote,
            Entry::OaStatus(_) => DocKey::OaStatus,
        }
    }
}

/// The canonical document produced by every dialect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub document_type: Option<String>,
    pub title: Vec<Title>,
    pub language: Vec<Language>,
    pub identified_by: Vec<Identifier>,
    pub contribution: Vec<Contribution>,
    pub provision_activity: Vec<ProvisionActivity>,
    pub edition_statement: Option<EditionStatement>,
    pub extent: Option<String>,
    pub other_material_characteristics: Option<String>,
    pub formats: Vec<String>,
    pub additional_materials: Option<String>,
    pub series: Vec<Series>,
    pub notes: Vec<String>,
    pub content_note: Vec<String>,
    pub abstracts: Vec<Label>,
    pub subjects: Vec<Subject>,
    pub classification: Vec<Classification>,
    pub dissertation: Option<Dissertation>,
    pub part_of: Vec<PartOf>,
    pub other_edition: Vec<OtherEdition>,
    pub files: Vec<FileEntry>,
    pub usage_and_access_policy: Option<UsagePolicy>,
    pub organisation: Vec<Reference>,
    pub subdivisions: Vec<Reference>,
    pub collections: Vec<Reference>,
    #[serde(rename = "oa_status")]
    pub oa_status: Option<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a handler result into the document.
    pub fn merge(&mut self, entry: Entry) {
        match entry {
            Entry::Title(v) => self.title.extend(v),
            Entry::Language(v) => self.language.extend(v),
            Entry::IdentifiedBy(v) => self.identified_by.extend(v),
            Entry::DocumentType(v) => self.document_type = Some(v),
            Entry::Subjects(v) => self.subjects.extend(v),
            Entry::Contribution(v) => self.contribution.extend(v),
            Entry::ProvisionActivity(v) => self.provision_activity.extend(v),
            Entry::PartOf(v) => self.part_of.extend(v),
            Entry::Abstracts(v) => self.abstracts.extend(v),
            Entry::Files(v) => self.files.extend(v),
            Entry::Notes(v) => self.notes.extend(v),
            Entry::Series(v) => self.series.extend(v),
            Entry::Classification(v) => self.classification.extend(v),
            Entry::EditionStatement(v) => self.edition_statement = Some(v),
            Entry::Dissertation(v) => self.dissertation = Some(v),
            Entry::OtherEdition(v) => self.other_edition.extend(v),
            Entry::Collections(v) => self.collections.extend(v),
            Entry::Subdivisions(v) => self.subdivisions.extend(v),
            Entry::Organisation(v) => self.organisation.extend(v),
            Entry::UsageAndAccessPolicy(v) => self.usage_and_access_policy = Some(v),
            Entry::Extent(v) => self.extent = Some(v),
            Entry::OtherMaterialCharacteristics(v) => {
                self.other_material_characteristics = Some(v)
            }
            Entry::Formats(v) => self.formats.extend(v),
            Entry::AdditionalMaterials(v) => self.additional_materials = Some(v),
            Entry::ContentNote(v) => self.content_note.extend(v),
            Entry::OaStatus(v) => self.oa_status = Some(v),
        }
    }

    /// Serializes the document, dropping every empty value.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        prune(&mut value);
        Ok(value)
    }

    /// Compact JSON text of [`Document::to_json`].
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_json()?)
    }

    /// The first Publication entry, if any.
    pub fn publication(&self) -> Option<&ProvisionActivity> {
        self.provision_activity
            .iter()
            .find(|p| p.kind == ProvisionType::Publication)
    }
}

/// Removes nulls, blank strings, empty arrays and empty objects, bottom-up.
///
/// Numbers and booleans are always kept, so a file `order` of `0` survives.
/// Returns true when `value` itself is empty afterwards.
pub(crate) fn prune(value: &mut Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => {
            items.retain_mut(|item| !prune(item));
            items.is_empty()
        }
        Value::Object(map) => {
            map.retain(|_, item| !prune(item));
            map.is_empty()
        }
        Value::Bool(_) | Value::Number(_) => false,
    }
}
